pub mod ast;
pub mod ast_printer;
pub mod class;
pub mod environment;
pub mod error;
pub mod function;
pub mod interpreter;
pub mod parser;
pub mod resolver;
pub mod scanner;
pub mod stack;
pub mod token;
pub mod value;

use log::info;

use error::LoxError;
use interpreter::Interpreter;
use parser::Parser;
use resolver::Resolver;
use scanner::Scanner;

/// Runs `source` through every phase against `interpreter`.
///
/// Lexical and syntax errors are reported together; resolution only runs on a
/// clean parse, and nothing executes unless every static phase succeeded.  A
/// runtime error comes back as a one‑element list.
pub fn run_source(source: &str, interpreter: &mut Interpreter) -> Result<(), Vec<LoxError>> {
    let (tokens, mut errors) = Scanner::new(source).scan_tokens();

    let mut parser = Parser::with_id_base(&tokens, interpreter.expr_id_base());
    let parsed = parser.parse();
    interpreter.reserve_expr_ids(parser.next_id());

    let statements = match parsed {
        Ok(statements) => statements,
        Err(parse_errors) => {
            errors.extend(parse_errors);
            return Err(errors);
        }
    };

    if !errors.is_empty() {
        return Err(errors);
    }

    let locals = Resolver::new().resolve(&statements)?;
    interpreter.resolve_locals(locals);

    info!("Static phases clean; executing");

    interpreter.interpret(&statements).map_err(|e| vec![e])
}
