#[cfg(test)]
mod parser_tests {
    use rox::ast::{Expr, Stmt};
    use rox::ast_printer::AstPrinter;
    use rox::error::LoxError;
    use rox::parser::Parser;
    use rox::scanner::Scanner;

    fn parse(source: &str) -> Result<Vec<Stmt>, Vec<LoxError>> {
        let (tokens, errors) = Scanner::new(source).scan_tokens();
        assert!(errors.is_empty(), "unexpected lex errors: {:?}", errors);

        Parser::new(&tokens).parse()
    }

    fn printed(source: &str) -> Vec<String> {
        parse(source)
            .expect("program should parse")
            .iter()
            .map(AstPrinter::print_stmt)
            .collect()
    }

    #[test]
    fn test_precedence_ladder() {
        assert_eq!(
            printed("print 1 + 2 * 3 == 7 and !false or nil;"),
            vec!["(print (or (and (== (+ 1.0 (* 2.0 3.0)) 7.0) (! false)) nil))"]
        );
    }

    #[test]
    fn test_binary_operators_are_left_associative() {
        assert_eq!(printed("8 - 4 - 2;"), vec!["(; (- (- 8.0 4.0) 2.0))"]);
    }

    #[test]
    fn test_assignment_is_right_associative() {
        assert_eq!(printed("a = b = 3;"), vec!["(; (= a (= b 3.0)))"]);
    }

    #[test]
    fn test_chained_calls_and_properties() {
        assert_eq!(
            printed("a.b(1)(2).c = 3;"),
            vec!["(; (= (. (call (call (. a b) 1.0) 2.0) c) 3.0))"]
        );
    }

    #[test]
    fn test_for_loop_is_lowered_to_while() {
        assert_eq!(
            printed("for (var i = 0; i < 2; i = i + 1) print i;"),
            vec!["(block (var i 0.0) (while (< i 2.0) (block (print i) (; (= i (+ i 1.0))))))"]
        );
    }

    #[test]
    fn test_for_loop_without_clauses() {
        assert_eq!(printed("for (;;) print 1;"), vec!["(while true (print 1.0))"]);
    }

    #[test]
    fn test_class_with_methods() {
        assert_eq!(
            printed("class C { init(x) { this.x = x; } get() { return this.x; } }"),
            vec![
                "(class C (fun init (x) (; (= (. this x) x))) (fun get () (return (. this x))))"
            ]
        );
    }

    #[test]
    fn test_zero_parameter_function() {
        assert_eq!(printed("fun f() {}"), vec!["(fun f ())"]);
    }

    #[test]
    fn test_expression_ids_are_distinct() {
        let statements = parse("a; a;").unwrap();

        let ids: Vec<_> = statements
            .iter()
            .map(|stmt| match stmt {
                Stmt::Expression(Expr::Variable { id, .. }) => *id,
                other => panic!("unexpected statement {:?}", other),
            })
            .collect();

        assert_ne!(ids[0], ids[1]);
    }

    #[test]
    fn test_recovers_and_reports_multiple_errors() {
        let errors = parse("var = 1;\nprint 2;\nvar x = ;\nprint 3;").unwrap_err();

        assert_eq!(errors.len(), 2);
        assert_eq!(errors[0].line(), 1);
        assert_eq!(errors[1].line(), 3);
        assert_eq!(
            errors[1].to_string(),
            "[line 3] Error at ';': Expected expression."
        );
    }

    #[test]
    fn test_invalid_assignment_target_is_not_fatal() {
        let errors = parse("1 + 2 = 3;\nprint (;").unwrap_err();

        assert_eq!(errors.len(), 2);
        assert_eq!(errors[0].message(), "Invalid assignment target.");
        assert_eq!(errors[1].line(), 2);
    }

    #[test]
    fn test_missing_semicolon_at_end() {
        let errors = parse("print 1").unwrap_err();

        assert_eq!(
            errors[0].to_string(),
            "[line 1] Error at end: Expected ';' after value."
        );
    }

    #[test]
    fn test_too_many_arguments_is_reported() {
        let args: Vec<String> = (0..256).map(|i| i.to_string()).collect();
        let source = format!("f({});", args.join(", "));

        let errors = parse(&source).unwrap_err();

        assert_eq!(errors.len(), 1);
        assert_eq!(errors[0].message(), "Can't have more than 255 arguments.");
    }

    #[test]
    fn test_too_many_parameters_is_reported() {
        let params: Vec<String> = (0..256).map(|i| format!("p{i}")).collect();
        let source = format!("fun f({}) {{}}", params.join(", "));

        let errors = parse(&source).unwrap_err();

        assert_eq!(errors.len(), 1);
        assert_eq!(errors[0].message(), "Can't have more than 255 parameters.");
        assert_eq!(
            errors[0].to_string(),
            "[line 1] Error at 'p255': Can't have more than 255 parameters."
        );
    }

    #[test]
    fn test_token_slice_without_eof_is_rejected() {
        let errors = Parser::new(&[]).parse().unwrap_err();

        assert_eq!(errors.len(), 1);
        assert_eq!(errors[0].message(), "Expected end of input.");
    }

    #[test]
    fn test_super_has_no_grammar() {
        let errors = parse("super.x;").unwrap_err();

        assert_eq!(errors[0].message(), "Expected expression.");
    }
}
