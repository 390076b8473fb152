#[cfg(test)]
mod interpreter_tests {
    use std::cell::RefCell;
    use std::io::{self, Write};
    use std::rc::Rc;

    use rox::error::LoxError;
    use rox::interpreter::Interpreter;
    use rox::run_source;

    /// `print` sink the test can read back after the run.
    #[derive(Clone, Default)]
    struct SharedBuffer(Rc<RefCell<Vec<u8>>>);

    impl Write for SharedBuffer {
        fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
            self.0.borrow_mut().extend_from_slice(buf);
            Ok(buf.len())
        }

        fn flush(&mut self) -> io::Result<()> {
            Ok(())
        }
    }

    impl SharedBuffer {
        fn lines(&self) -> Vec<String> {
            String::from_utf8_lossy(&self.0.borrow())
                .lines()
                .map(str::to_owned)
                .collect()
        }
    }

    /// Runs `source` on a fresh interpreter; returns printed lines and the
    /// outcome.
    fn run(source: &str) -> (Vec<String>, Result<(), Vec<LoxError>>) {
        let buffer = SharedBuffer::default();
        let mut interpreter = Interpreter::with_output(Box::new(buffer.clone()));

        let result = run_source(source, &mut interpreter);

        (buffer.lines(), result)
    }

    fn output(source: &str) -> Vec<String> {
        let (lines, result) = run(source);

        if let Err(errors) = result {
            panic!("program failed: {:?}", errors);
        }

        lines
    }

    fn runtime_error(source: &str) -> (Vec<String>, LoxError) {
        let (lines, result) = run(source);

        let mut errors = result.expect_err("program should fail");
        assert_eq!(errors.len(), 1, "expected a single runtime error");

        let error = errors.remove(0);
        assert!(!error.is_static(), "expected a runtime error, got {}", error);

        (lines, error)
    }

    // ── values and operators ─────────────────────────────────────────────

    #[test]
    fn test_print_formats() {
        assert_eq!(
            output(
                "print nil; print true; print 3; print 2.5; print \"hi\"; print -0.25; print 10 / 4;"
            ),
            vec!["nil", "true", "3", "2.5", "hi", "-0.25", "2.5"]
        );
    }

    #[test]
    fn test_arithmetic_and_comparison() {
        assert_eq!(
            output("print 1 + 2 * 3; print (1 + 2) * 3; print 1 < 2; print 2 <= 1; print 3 > 2; print 3 >= 4;"),
            vec!["7", "9", "true", "false", "true", "false"]
        );
    }

    #[test]
    fn test_string_concatenation() {
        assert_eq!(output("print \"foo\" + \"bar\";"), vec!["foobar"]);
    }

    #[test]
    fn test_equality() {
        assert_eq!(
            output(
                "print nil == nil; print nil == false; print 1 == 1; print \"a\" == \"a\"; print 1 == \"1\"; print 1 != 2;"
            ),
            vec!["true", "false", "true", "true", "false", "true"]
        );
    }

    #[test]
    fn test_truthiness() {
        assert_eq!(
            output("print !nil; print !0; print !\"\"; print !!false;"),
            vec!["true", "false", "false", "false"]
        );
    }

    #[test]
    fn test_logical_operators_return_deciding_operand() {
        assert_eq!(
            output("print nil or \"yes\"; print 0 or 1; print nil and 1; print 1 and 2;"),
            vec!["yes", "0", "nil", "2"]
        );
    }

    #[test]
    fn test_logical_operators_short_circuit() {
        assert_eq!(
            output(
                "var hit = false; fun touch() { hit = true; return true; }
                 print true or touch(); print false and touch(); print hit;"
            ),
            vec!["true", "false", "false"]
        );
    }

    #[test]
    fn test_division_by_zero_is_ieee() {
        assert_eq!(
            output("print 1 / 0; print -1 / 0;"),
            vec!["Infinity", "-Infinity"]
        );
    }

    #[test]
    fn test_nan_equals_itself() {
        assert_eq!(
            output("var n = 0 / 0; print n; print n == n; print n != n;"),
            vec!["NaN", "true", "false"]
        );
    }

    // ── type errors ──────────────────────────────────────────────────────

    #[test]
    fn test_mixed_plus_is_a_type_error() {
        let (lines, error) = runtime_error("print 1 + \"a\";");

        assert!(lines.is_empty());
        assert_eq!(error.message(), "Operands must be two numbers or two strings.");
        assert_eq!(error.line(), 1);
    }

    #[test]
    fn test_negating_a_string_is_a_type_error() {
        let (_, error) = runtime_error("print -\"a\";");

        assert_eq!(error.message(), "Operand must be a number.");
    }

    #[test]
    fn test_comparison_requires_numbers() {
        let (_, error) = runtime_error("print \"a\" < \"b\";");

        assert_eq!(error.message(), "Operands must be numbers.");
    }

    #[test]
    fn test_output_before_runtime_error_is_kept() {
        let (lines, error) = runtime_error("print 1;\nprint 2;\nprint nil * 2;\nprint 4;");

        assert_eq!(lines, vec!["1", "2"]);
        assert_eq!(error.line(), 3);
        assert_eq!(error.to_string(), "Operands must be numbers.\n[line 3]");
    }

    // ── variables and scope ──────────────────────────────────────────────

    #[test]
    fn test_block_scoping() {
        assert_eq!(
            output("var a = 1; { var a = 2; print a; } print a;"),
            vec!["2", "1"]
        );
    }

    #[test]
    fn test_assignment_reaches_enclosing_scope() {
        assert_eq!(
            output("var a = 1; { a = 2; { a = a + 1; } } print a;"),
            vec!["3"]
        );
    }

    #[test]
    fn test_uninitialized_variable_is_nil() {
        assert_eq!(output("var a; print a;"), vec!["nil"]);
    }

    #[test]
    fn test_undefined_variable() {
        let (_, error) = runtime_error("print missing;");

        assert_eq!(error.message(), "Undefined variable 'missing'.");
    }

    #[test]
    fn test_assign_to_undefined_variable() {
        let (_, error) = runtime_error("missing = 1;");

        assert_eq!(error.message(), "Undefined variable 'missing'.");
    }

    #[test]
    fn test_closure_sees_declaration_scope_not_later_shadow() {
        assert_eq!(
            output(
                "var a = \"global\";
                 {
                   fun show() { print a; }
                   show();
                   var a = \"block\";
                   show();
                 }"
            ),
            vec!["global", "global"]
        );
    }

    // ── control flow ─────────────────────────────────────────────────────

    #[test]
    fn test_if_else() {
        assert_eq!(
            output("if (1 > 2) print \"then\"; else print \"else\"; if (nil) print \"no\";"),
            vec!["else"]
        );
    }

    #[test]
    fn test_while_loop() {
        assert_eq!(
            output("var i = 0; while (i < 3) { print i; i = i + 1; }"),
            vec!["0", "1", "2"]
        );
    }

    #[test]
    fn test_for_loop() {
        assert_eq!(
            output("for (var i = 0; i < 3; i = i + 1) print i;"),
            vec!["0", "1", "2"]
        );
    }

    #[test]
    fn test_for_loop_closures_share_the_loop_variable() {
        assert_eq!(
            output(
                "var f;
                 for (var i = 0; i < 2; i = i + 1) { fun g() { print i; } f = g; }
                 f();"
            ),
            vec!["2"]
        );
    }

    // ── functions ────────────────────────────────────────────────────────

    #[test]
    fn test_closure_counter() {
        assert_eq!(
            output(
                "fun counter(){ var i=0; fun inc(){ i=i+1; return i; } return inc; }
                 var c=counter(); print c(); print c();"
            ),
            vec!["1", "2"]
        );
    }

    #[test]
    fn test_independent_counters() {
        assert_eq!(
            output(
                "fun counter(){ var i=0; fun inc(){ i=i+1; return i; } return inc; }
                 var a=counter(); var b=counter(); print a(); print a(); print b();"
            ),
            vec!["1", "2", "1"]
        );
    }

    #[test]
    fn test_recursion() {
        assert_eq!(
            output("fun fib(n) { if (n < 2) return n; return fib(n - 1) + fib(n - 2); } print fib(15);"),
            vec!["610"]
        );
    }

    #[test]
    fn test_return_unwinds_only_to_the_call() {
        assert_eq!(
            output(
                "fun find() { var i = 0; while (true) { { if (i == 3) return i; } i = i + 1; } }
                 print find(); print \"after\";"
            ),
            vec!["3", "after"]
        );
    }

    #[test]
    fn test_function_without_return_yields_nil() {
        assert_eq!(output("fun f() {} print f();"), vec!["nil"]);
    }

    #[test]
    fn test_function_display() {
        assert_eq!(
            output("fun f() {} print f; print clock;"),
            vec!["<fn f>", "<native fn>"]
        );
    }

    #[test]
    fn test_clock_returns_a_number() {
        assert_eq!(output("print clock() > 0;"), vec!["true"]);
    }

    #[test]
    fn test_arity_mismatch_does_not_run_body() {
        let (lines, error) = runtime_error(
            "fun add(a, b) { print \"ran\"; return a + b; }
             add(1);",
        );

        assert!(lines.is_empty());
        assert_eq!(error.message(), "Expected 2 arguments but got 1.");

        let (lines, error) = runtime_error("fun add(a, b) { print \"ran\"; } add(1, 2, 3);");

        assert!(lines.is_empty());
        assert_eq!(error.message(), "Expected 2 arguments but got 3.");
    }

    #[test]
    fn test_calling_a_non_callable() {
        let (_, error) = runtime_error("\"text\"();");

        assert_eq!(error.message(), "Can only call functions and classes.");
    }

    #[test]
    fn test_unbounded_recursion_is_a_stack_overflow() {
        let (_, error) = runtime_error("fun f() { f(); }\nf();");

        assert!(matches!(error, LoxError::StackOverflow { line: 1 }));
        assert_eq!(error.message(), "Stack overflow.");
    }

    #[test]
    fn test_deep_recursion_within_limit() {
        assert_eq!(
            output("fun down(n) { if (n == 0) return 0; return down(n - 1); } print down(1000);"),
            vec!["0"]
        );
    }

    #[test]
    fn test_deep_recursion_through_nested_arguments() {
        let source = format!(
            "fun f(n) {{ if (n == 0) return 0; return f({}n - 1{}); }} print f(4000);",
            "(".repeat(40),
            ")".repeat(40)
        );

        assert_eq!(output(&source), vec!["0"]);
    }

    #[test]
    fn test_deeply_nested_expression() {
        let source = format!("print {}1{};", "(".repeat(5000), ")".repeat(5000));

        assert_eq!(output(&source), vec!["1"]);
    }

    #[test]
    fn test_deeply_nested_blocks_and_unary() {
        let source = format!(
            "{}print {}1;{}",
            "{ ".repeat(2000),
            "-".repeat(3000),
            " }".repeat(2000)
        );

        assert_eq!(output(&source), vec!["1"]);
    }

    #[test]
    fn test_interpreter_is_usable_after_runtime_error() {
        let buffer = SharedBuffer::default();
        let mut interpreter = Interpreter::with_output(Box::new(buffer.clone()));

        assert!(run_source("var a = 1; { var b = 2; b(); }", &mut interpreter).is_err());
        assert!(run_source("{ var c = 3; print a + c; }", &mut interpreter).is_ok());

        assert_eq!(buffer.lines(), vec!["4"]);
    }

    // ── classes ──────────────────────────────────────────────────────────

    #[test]
    fn test_instances_have_independent_fields() {
        assert_eq!(
            output(
                "class C { init(x){ this.x = x; } get(){ return this.x; } }
                 print C(3).get(); print C(9).get();"
            ),
            vec!["3", "9"]
        );
    }

    #[test]
    fn test_class_and_instance_display() {
        assert_eq!(
            output("class Bagel {} print Bagel; print Bagel();"),
            vec!["Bagel", "Bagel instance"]
        );
    }

    #[test]
    fn test_fields_are_created_on_assignment() {
        assert_eq!(
            output("class Box {} var b = Box(); b.content = 1; b.content = b.content + 1; print b.content;"),
            vec!["2"]
        );
    }

    #[test]
    fn test_bound_method_remembers_instance() {
        assert_eq!(
            output(
                "class Person { init(n) { this.name = n; } say() { print this.name; } }
                 var m = Person(\"jane\").say;
                 var p = Person(\"bill\");
                 p.say = m;
                 p.say();"
            ),
            vec!["jane"]
        );
    }

    #[test]
    fn test_this_in_nested_closure() {
        assert_eq!(
            output(
                "class Thing { getCallback() { fun cb() { print this; } return cb; } }
                 Thing().getCallback()();"
            ),
            vec!["Thing instance"]
        );
    }

    #[test]
    fn test_initializer_returns_instance() {
        assert_eq!(
            output(
                "class Foo { init() { this.n = 1; return; } }
                 var foo = Foo();
                 print foo.init() == foo;
                 print foo.n;"
            ),
            vec!["true", "1"]
        );
    }

    #[test]
    fn test_class_arity_comes_from_init() {
        let (_, error) = runtime_error("class P { init(a, b) {} } P(1);");

        assert_eq!(error.message(), "Expected 2 arguments but got 1.");

        let (_, error) = runtime_error("class Q {} Q(1);");

        assert_eq!(error.message(), "Expected 0 arguments but got 1.");
    }

    #[test]
    fn test_undefined_property() {
        let (_, error) = runtime_error("class C {} C().nothing;");

        assert_eq!(error.message(), "Undefined property 'nothing'.");
    }

    #[test]
    fn test_property_access_on_non_instance() {
        let (_, error) = runtime_error("var s = \"str\"; print s.length;");

        assert_eq!(error.message(), "Only instances have properties.");

        let (_, error) = runtime_error("var n = 1; n.x = 2;");

        assert_eq!(error.message(), "Only instances have fields.");
    }

    #[test]
    fn test_methods_can_recurse_through_the_class_name() {
        assert_eq!(
            output(
                "class Math { fact(n) { if (n <= 1) return 1; return n * Math().fact(n - 1); } }
                 print Math().fact(5);"
            ),
            vec!["120"]
        );
    }

    // ── static diagnostics stop execution ────────────────────────────────

    #[test]
    fn test_static_errors_prevent_execution() {
        let (lines, result) = run("print \"before\";\n{ var a = a; }");

        assert!(lines.is_empty());

        let errors = result.unwrap_err();
        assert_eq!(errors.len(), 1);
        assert!(errors[0].is_static());
        assert_eq!(errors[0].line(), 2);
    }

    #[test]
    fn test_lex_and_parse_errors_reported_together() {
        let (lines, result) = run("print @;\nprint 1");

        assert!(lines.is_empty());

        let errors = result.unwrap_err();
        assert!(errors.iter().all(LoxError::is_static));
        assert_eq!(errors[0].message(), "Unexpected character: @");
        assert!(errors.len() >= 2);
    }
}
