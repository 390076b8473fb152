use std::fs::File;
use std::io::{self, BufReader, Read, Write};
use std::path::PathBuf;
use std::process::ExitCode;

use anyhow::{Context, Result};
use clap::Parser as ClapParser;
use clap::Subcommand;
use env_logger::Builder;
use log::{debug, info};

use rox::ast_printer::AstPrinter;
use rox::error::LoxError;
use rox::interpreter::Interpreter;
use rox::parser::Parser;
use rox::scanner::Scanner;
use rox::token::Token;

/// Exit code for lexical, syntax and resolution errors.
const EXIT_STATIC_ERROR: u8 = 65;

/// Exit code for runtime errors.
const EXIT_RUNTIME_ERROR: u8 = 70;

#[derive(ClapParser, Debug)]
#[command(version, about = "Rox language interpreter", long_about = None)]
pub struct Cli {
    #[command(subcommand)]
    commands: Commands,

    /// Enable logging to rox.log
    #[arg(long, global = true)]
    log: bool,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Tokenizes a file (or stdin), printing each token
    Tokenize {
        filename: Option<PathBuf>,

        /// Emit the token list as JSON
        #[arg(long)]
        json: bool,
    },

    /// Parses a file (or stdin) and prints each statement's syntax tree
    Parse { filename: Option<PathBuf> },

    /// Runs a file (or stdin) as a program
    Run { filename: Option<PathBuf> },
}

/// Reads the whole source, from `filename` or stdin.
fn read_source(filename: Option<PathBuf>) -> Result<String> {
    let mut buf = Vec::new();

    match filename {
        Some(filename) => {
            info!("Reading file: {:?}", filename);
            let file =
                File::open(&filename).context(format!("Failed to open file {:?}", filename))?;
            BufReader::new(file)
                .read_to_end(&mut buf)
                .context(format!("Failed to read file {:?}", filename))?;
        }
        None => {
            info!("Reading stdin");
            io::stdin()
                .read_to_end(&mut buf)
                .context("Failed to read stdin")?;
        }
    }

    info!("Read {} bytes", buf.len());

    let text = String::from_utf8(buf).map_err(LoxError::from)?;

    Ok(text)
}

fn init_logger() -> Result<()> {
    let log_file = File::create("rox.log").context("Failed to create rox.log")?;

    Builder::new()
        .format(|buf, record| {
            let module = record
                .module_path()
                .unwrap_or("<unnamed>")
                .strip_prefix("rox::")
                .unwrap_or(record.module_path().unwrap_or("<unnamed>"));
            writeln!(
                buf,
                "[{}:{}] - {}",
                module,
                record.line().unwrap_or(0),
                record.args()
            )
        })
        .target(env_logger::Target::Pipe(Box::new(log_file)))
        .filter(None, log::LevelFilter::Debug) // Default to Debug, override with RUST_LOG
        .parse_env("RUST_LOG")
        .init();

    info!("Logger initialized, writing to rox.log");
    Ok(())
}

fn report(errors: &[LoxError]) {
    for e in errors {
        debug!("Diagnostic: {:?}", e);
        eprintln!("{}", e);
    }
}

fn tokenize(source: &str, json: bool) -> Result<ExitCode> {
    let (tokens, errors): (Vec<Token>, Vec<LoxError>) = Scanner::new(source).scan_tokens();

    report(&errors);

    if json {
        println!("{}", serde_json::to_string_pretty(&tokens)?);
    } else {
        for token in &tokens {
            println!("{}", token);
        }
    }

    if errors.is_empty() {
        Ok(ExitCode::SUCCESS)
    } else {
        Ok(ExitCode::from(EXIT_STATIC_ERROR))
    }
}

fn parse(source: &str) -> Result<ExitCode> {
    let (tokens, errors) = Scanner::new(source).scan_tokens();
    report(&errors);

    match Parser::new(&tokens).parse() {
        Ok(statements) if errors.is_empty() => {
            for stmt in &statements {
                println!("{}", AstPrinter::print_stmt(stmt));
            }
            Ok(ExitCode::SUCCESS)
        }
        Ok(_) => Ok(ExitCode::from(EXIT_STATIC_ERROR)),
        Err(parse_errors) => {
            report(&parse_errors);
            Ok(ExitCode::from(EXIT_STATIC_ERROR))
        }
    }
}

fn run(source: &str) -> Result<ExitCode> {
    let mut interpreter = Interpreter::new();

    match rox::run_source(source, &mut interpreter) {
        Ok(()) => {
            info!("Program executed successfully");
            Ok(ExitCode::SUCCESS)
        }
        Err(errors) => {
            report(&errors);

            if errors.iter().any(LoxError::is_static) {
                Ok(ExitCode::from(EXIT_STATIC_ERROR))
            } else {
                Ok(ExitCode::from(EXIT_RUNTIME_ERROR))
            }
        }
    }
}

fn main() -> Result<ExitCode> {
    let args: Cli = Cli::parse();

    if args.log {
        init_logger()?;
    } else {
        env_logger::Builder::new()
            .filter_level(log::LevelFilter::Off)
            .init();
    }

    info!("CLI arguments: {:?}", args);

    match args.commands {
        Commands::Tokenize { filename, json } => tokenize(&read_source(filename)?, json),
        Commands::Parse { filename } => parse(&read_source(filename)?),
        Commands::Run { filename } => run(&read_source(filename)?),
    }
}
