#[cfg(test)]
mod interpreter_tests {
    use std::cell::RefCell;
    use std::io::{self, Write};
    use std::rc::Rc;

    use loxide::lox::{Lox, RunError};

    /// Shared in-memory sink so a test can keep reading what the session
    /// printed.
    #[derive(Clone, Default)]
    struct Sink(Rc<RefCell<Vec<u8>>>);

    impl Write for Sink {
        fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
            self.0.borrow_mut().extend_from_slice(buf);
            Ok(buf.len())
        }

        fn flush(&mut self) -> io::Result<()> {
            Ok(())
        }
    }

    impl Sink {
        fn contents(&self) -> String {
            String::from_utf8(self.0.borrow().clone()).unwrap()
        }
    }

    fn capture(source: &str) -> (Result<(), RunError>, String) {
        let sink = Sink::default();
        let mut lox = Lox::with_output(Box::new(sink.clone()));

        let result = lox.run(source);

        (result, sink.contents())
    }

    fn run_ok(source: &str) -> String {
        let (result, output) = capture(source);

        if let Err(e) = result {
            panic!("expected success, got {:?}\noutput so far:\n{}", e, output);
        }

        output
    }

    fn runtime_error(source: &str) -> String {
        let (result, _) = capture(source);

        match result {
            Err(RunError::Runtime(e)) => e.to_string(),
            other => panic!("expected runtime error, got {:?}", other.err()),
        }
    }

    fn static_errors(source: &str) -> Vec<String> {
        let (result, _) = capture(source);

        match result {
            Err(RunError::Static(errors)) => errors.iter().map(|e| e.to_string()).collect(),
            other => panic!("expected static errors, got {:?}", other.err()),
        }
    }

    // ─────────────────────────── expressions ───────────────────────────

    #[test]
    fn test_arithmetic_and_number_display() {
        assert_eq!(run_ok("print 1 + 2;"), "3\n");
        assert_eq!(run_ok("print 10 / 4;"), "2.5\n");
        assert_eq!(run_ok("print -(3 * 2);"), "-6\n");
        assert_eq!(run_ok("print 3.14;"), "3.14\n");
    }

    #[test]
    fn test_number_display_beyond_i64_range() {
        // integral values past i64 still print their exact decimal digits
        assert_eq!(
            run_ok("print 100000000000000000000;"),
            "100000000000000000000\n"
        );
        assert_eq!(
            run_ok("print -100000000000000000000;"),
            "-100000000000000000000\n"
        );
    }

    #[test]
    fn test_plus_concatenates_and_coerces() {
        assert_eq!(run_ok("print \"a\" + \"b\";"), "ab\n");
        assert_eq!(run_ok("print \"x\" + 1;"), "x1\n");
        assert_eq!(run_ok("print 2 + \"nd\";"), "2nd\n");
        assert_eq!(run_ok("print \"v\" + 1.5;"), "v1.5\n");
    }

    #[test]
    fn test_plus_rejects_other_mixes() {
        assert!(runtime_error("print true + 1;").contains("Operands must be numbers or strings."));
    }

    #[test]
    fn test_arithmetic_type_errors() {
        assert!(runtime_error("print \"a\" - \"b\";").contains("Operands must be numbers."));
        assert!(runtime_error("print -\"a\";").contains("Operand must be a number."));
        assert!(runtime_error("print 1 < \"2\";").contains("Operands must be numbers."));
    }

    #[test]
    fn test_division_by_zero() {
        let message = runtime_error("print 1 / 0;");

        assert!(message.contains("Division by zero."));
        assert!(message.contains("[line 1]"));
    }

    #[test]
    fn test_truthiness_and_equality() {
        assert_eq!(run_ok("print !nil;"), "true\n");
        assert_eq!(run_ok("print !false;"), "true\n");
        assert_eq!(run_ok("print !0;"), "false\n");
        assert_eq!(run_ok("print !\"\";"), "false\n");
        assert_eq!(run_ok("print 1 == 1;"), "true\n");
        assert_eq!(run_ok("print 1 == \"1\";"), "false\n");
        assert_eq!(run_ok("print nil == nil;"), "true\n");
    }

    #[test]
    fn test_logical_operators_return_operands() {
        assert_eq!(run_ok("print \"hi\" or 2;"), "hi\n");
        assert_eq!(run_ok("print nil or \"yes\";"), "yes\n");
        assert_eq!(run_ok("print nil and boom();"), "nil\n"); // rhs never evaluated
        assert_eq!(run_ok("print true and 3;"), "3\n");
    }

    // ──────────────────────── variables and scope ───────────────────────

    #[test]
    fn test_var_without_initializer_is_nil() {
        assert_eq!(run_ok("var a; print a;"), "nil\n");
    }

    #[test]
    fn test_shadowing_and_block_scope() {
        let source = r#"
            var a = "outer";
            {
                var a = "inner";
                print a;
            }
            print a;
        "#;

        assert_eq!(run_ok(source), "inner\nouter\n");
    }

    #[test]
    fn test_nested_shadowing_across_three_depths() {
        let source = r#"
            var a = "global a";
            var b = "global b";
            var c = "global c";
            {
                var a = "outer a";
                var b = "outer b";
                {
                    var a = "inner a";
                    print a;
                    print b;
                    print c;
                }
                print a;
                print b;
                print c;
            }
            print a;
            print b;
            print c;
        "#;

        assert_eq!(
            run_ok(source),
            "inner a\nouter b\nglobal c\n\
             outer a\nouter b\nglobal c\n\
             global a\nglobal b\nglobal c\n"
        );
    }

    #[test]
    fn test_assignment_is_an_expression() {
        assert_eq!(run_ok("var a = 1; print a = 2;"), "2\n");
    }

    #[test]
    fn test_undefined_variable_is_runtime_error() {
        assert!(runtime_error("print ghost;").contains("Undefined variable 'ghost'."));
        assert!(runtime_error("ghost = 1;").contains("Undefined variable 'ghost'."));
    }

    #[test]
    fn test_closure_captures_definition_environment() {
        // the classic scoping program: a closure resolved against the scope
        // where it was defined keeps printing the same binding even after a
        // shadowing declaration appears
        let source = r#"
            var a = "global";
            {
                fun showA() {
                    print a;
                }

                showA();
                var a = "block";
                showA();
            }
        "#;

        assert_eq!(run_ok(source), "global\nglobal\n");
    }

    #[test]
    fn test_counter_closure_keeps_private_state() {
        let source = r#"
            fun makeCounter() {
                var i = 0;
                fun count() {
                    i = i + 1;
                    print i;
                }
                return count;
            }

            var counter = makeCounter();
            counter();
            counter();
        "#;

        assert_eq!(run_ok(source), "1\n2\n");
    }

    // ─────────────────────── control flow and loops ──────────────────────

    #[test]
    fn test_if_else() {
        assert_eq!(run_ok("if (1 < 2) print \"yes\"; else print \"no\";"), "yes\n");
        assert_eq!(run_ok("if (nil) print \"yes\"; else print \"no\";"), "no\n");
    }

    #[test]
    fn test_while_and_break() {
        let source = r#"
            var i = 0;
            while (true) {
                if (i == 3) break;
                print i;
                i = i + 1;
            }
            print "done";
        "#;

        assert_eq!(run_ok(source), "0\n1\n2\ndone\n");
    }

    #[test]
    fn test_for_loop() {
        assert_eq!(
            run_ok("for (var i = 0; i < 3; i = i + 1) print i;"),
            "0\n1\n2\n"
        );
    }

    #[test]
    fn test_break_only_exits_innermost_loop() {
        let source = r#"
            for (var i = 0; i < 2; i = i + 1) {
                for (var j = 0; j < 5; j = j + 1) {
                    if (j == 1) break;
                    print i + j;
                }
            }
        "#;

        assert_eq!(run_ok(source), "0\n1\n");
    }

    // ───────────────────────────── functions ─────────────────────────────

    #[test]
    fn test_function_declaration_and_call() {
        let source = r#"
            fun add(a, b) {
                return a + b;
            }

            print add;
            print add(1, 2);
        "#;

        assert_eq!(run_ok(source), "<fn add>\n3\n");
    }

    #[test]
    fn test_function_without_return_yields_nil() {
        assert_eq!(run_ok("fun f() {} print f();"), "nil\n");
    }

    #[test]
    fn test_return_unwinds_through_a_loop() {
        let source = r#"
            fun firstOver(limit) {
                for (var i = 0; ; i = i + 1) {
                    if (i > limit) return i;
                }
            }

            print firstOver(2);
        "#;

        assert_eq!(run_ok(source), "3\n");
    }

    #[test]
    fn test_recursion() {
        let source = r#"
            fun fib(n) {
                if (n < 2) return n;
                return fib(n - 1) + fib(n - 2);
            }

            print fib(10);
        "#;

        assert_eq!(run_ok(source), "55\n");
    }

    #[test]
    fn test_arity_mismatch() {
        assert!(
            runtime_error("fun f(a, b) {} f(1);").contains("Expected 2 arguments but got 1.")
        );
    }

    #[test]
    fn test_only_functions_and_classes_are_callable() {
        assert!(runtime_error("\"text\"();").contains("Can only call functions and classes."));
    }

    #[test]
    fn test_clock_native_is_a_number() {
        assert_eq!(run_ok("print clock() >= 0;"), "true\n");
    }

    // ────────────────────────────── classes ──────────────────────────────

    #[test]
    fn test_fields_and_methods() {
        let source = r#"
            class Bag {
                describe() {
                    return "holds " + this.item;
                }
            }

            var bag = Bag();
            bag.item = "keys";
            print bag;
            print bag.describe();
        "#;

        assert_eq!(run_ok(source), "Bag instance\nholds keys\n");
    }

    #[test]
    fn test_init_constructor() {
        let source = r#"
            class Point {
                init(x, y) {
                    this.x = x;
                    this.y = y;
                }
            }

            var p = Point(3, 4);
            print p.x + p.y;
        "#;

        assert_eq!(run_ok(source), "7\n");
    }

    #[test]
    fn test_early_return_from_init_yields_instance() {
        let source = r#"
            class Door {
                init(locked) {
                    if (locked) return;
                    this.open = true;
                }
            }

            print Door(true);
        "#;

        assert_eq!(run_ok(source), "Door instance\n");
    }

    #[test]
    fn test_bound_method_remembers_its_instance() {
        let source = r#"
            class Greeter {
                init(name) { this.name = name; }
                greet() { print "hi " + this.name; }
            }

            var m = Greeter("ada").greet;
            m();
        "#;

        assert_eq!(run_ok(source), "hi ada\n");
    }

    #[test]
    fn test_inheritance_and_super() {
        let source = r#"
            class Doughnut {
                cook() {
                    print "fry";
                }
            }

            class BostonCream < Doughnut {
                cook() {
                    super.cook();
                    print "glaze";
                }
            }

            BostonCream().cook();
        "#;

        assert_eq!(run_ok(source), "fry\nglaze\n");
    }

    #[test]
    fn test_inherited_method_without_override() {
        let source = r#"
            class A { hello() { print "A"; } }
            class B < A { }
            B().hello();
        "#;

        assert_eq!(run_ok(source), "A\n");
    }

    #[test]
    fn test_superclass_must_be_a_class() {
        assert!(
            runtime_error("var NotAClass = 1; class B < NotAClass { }")
                .contains("Superclass must be a class.")
        );
    }

    #[test]
    fn test_undefined_property() {
        assert!(
            runtime_error("class C {} print C().missing;")
                .contains("Undefined property 'missing'.")
        );
    }

    #[test]
    fn test_properties_only_on_instances() {
        assert!(runtime_error("print 1.x;").contains("Only instances have properties."));
        assert!(runtime_error("1.x = 2;").contains("Only instances have fields."));
    }

    // ──────────────────────── static error surface ────────────────────────

    #[test]
    fn test_resolver_rejects_top_level_return() {
        let errors = static_errors("return 1;");

        assert_eq!(errors.len(), 1);
        assert!(errors[0].contains("Cannot return from top-level code."));
    }

    #[test]
    fn test_resolver_rejects_break_outside_loop() {
        assert!(static_errors("break;")[0].contains("Cannot use 'break' outside of a loop."));

        // a function body resets the loop context
        let errors =
            static_errors("while (true) { fun f() { break; } }");
        assert!(errors[0].contains("Cannot use 'break' outside of a loop."));
    }

    #[test]
    fn test_resolver_rejects_duplicate_declaration() {
        let errors = static_errors("{ var a = 1; var a = 2; }");

        assert!(errors[0].contains("already declared in this scope"));
    }

    #[test]
    fn test_resolver_rejects_self_read_in_initializer() {
        let errors = static_errors("{ var a = a; }");

        assert!(errors[0].contains("Cannot read local variable in its own initializer."));
    }

    #[test]
    fn test_resolver_rejects_this_and_super_misuse() {
        assert!(static_errors("print this;")[0].contains("Cannot use 'this' outside of a class."));
        assert!(
            static_errors("fun f() { return super.x; }")[0]
                .contains("Cannot use 'super' outside of a class.")
        );
        assert!(
            static_errors("class A { f() { return super.f; } }")[0]
                .contains("Cannot use 'super' in a class with no superclass.")
        );
    }

    #[test]
    fn test_resolver_rejects_self_inheritance() {
        assert!(
            static_errors("class Ouro < Ouro { }")[0]
                .contains("A class cannot inherit from itself.")
        );
    }

    #[test]
    fn test_resolver_rejects_value_return_from_init() {
        let errors = static_errors("class C { init() { return 1; } }");

        assert!(errors[0].contains("Cannot return a value from an initializer."));
    }

    #[test]
    fn test_all_static_errors_reported_together() {
        // one lex error, one parse error, one resolve error
        let errors = static_errors("var x = $ 1;\nvar = 2;\nbreak;");

        assert_eq!(errors.len(), 3);
    }

    // ─────────────────────────── session model ───────────────────────────

    #[test]
    fn test_session_keeps_state_and_survives_runtime_errors() {
        let sink = Sink::default();
        let mut lox = Lox::with_output(Box::new(sink.clone()));

        lox.run("var total = 0;").unwrap();
        lox.run("fun bump(n) { total = total + n; }").unwrap();
        lox.run("bump(5);").unwrap();

        assert!(matches!(lox.run("bump();"), Err(RunError::Runtime(_))));

        lox.run("print total;").unwrap();
        assert_eq!(sink.contents(), "5\n");
    }

    #[test]
    fn test_session_resolves_each_line_independently() {
        let sink = Sink::default();
        let mut lox = Lox::with_output(Box::new(sink.clone()));

        // same variable text on two lines: the ids must not collide
        lox.run("var a = 1; { var a = 2; print a; }").unwrap();
        lox.run("{ var a = 3; print a; }").unwrap();
        lox.run("print a;").unwrap();

        assert_eq!(sink.contents(), "2\n3\n1\n");
    }
}
