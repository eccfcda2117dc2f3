#[cfg(test)]
mod parser_tests {
    use loxide::ast::Ast;
    use loxide::parser::*;
    use loxide::scanner::Scanner;
    use loxide::token::Token;

    fn tokens(source: &str) -> Vec<Token> {
        let (tokens, errors) = Scanner::new(source.as_bytes()).scan_all();
        assert!(errors.is_empty(), "scan errors: {:?}", errors);
        tokens
    }

    fn parse_program(source: &str) -> (Vec<Stmt>, Vec<loxide::error::LoxError>) {
        let toks = tokens(source);
        let mut parser = Parser::new(&toks, 0);
        parser.parse()
    }

    fn parse_expr_string(source: &str) -> String {
        let toks = tokens(source);
        let mut parser = Parser::new(&toks, 0);
        let expr = parser.parse_expression().expect("expression should parse");
        Ast.print(&expr)
    }

    #[test]
    fn test_parser_01_precedence() {
        // unary binds tighter than factor, factor tighter than term
        assert_eq!(parse_expr_string("-123 * (45.67)"), "(* (- 123.0) (group 45.67))");
        assert_eq!(parse_expr_string("1 + 2 * 3"), "(+ 1.0 (* 2.0 3.0))");
        assert_eq!(parse_expr_string("1 < 2 == true"), "(== (< 1.0 2.0) true)");
    }

    #[test]
    fn test_parser_02_logical_operators_are_left_associative() {
        assert_eq!(parse_expr_string("a or b and c"), "(or a (and b c))");
        assert_eq!(parse_expr_string("a or b or c"), "(or (or a b) c)");
    }

    #[test]
    fn test_parser_03_assignment_is_right_associative() {
        assert_eq!(parse_expr_string("a = b = 1"), "(= a (= b 1.0))");
    }

    #[test]
    fn test_parser_04_invalid_assignment_target() {
        let toks = tokens("1 = 2;");
        let mut parser = Parser::new(&toks, 0);
        let (_, errors) = parser.parse();

        assert_eq!(errors.len(), 1);
        assert!(errors[0].to_string().contains("Invalid assignment target."));
    }

    #[test]
    fn test_parser_05_call_and_property_chains() {
        assert_eq!(parse_expr_string("f(1)(2)"), "(call (call f 1.0) 2.0)");
        assert_eq!(parse_expr_string("a.b.c"), "(. c (. b a))");
        assert_eq!(
            parse_expr_string("a.b = 1"),
            "(set b a 1.0)"
        );
    }

    #[test]
    fn test_parser_06_for_desugars_to_while() {
        let (statements, errors) = parse_program("for (var i = 0; i < 3; i = i + 1) print i;");

        assert!(errors.is_empty());
        assert_eq!(statements.len(), 1);

        // { var i; while (cond) { body; incr; } }
        let Stmt::Block(outer) = &statements[0] else {
            panic!("expected desugared block, got {:?}", statements[0]);
        };

        assert!(matches!(outer[0], Stmt::Var { .. }));

        let Stmt::While { body, .. } = &outer[1] else {
            panic!("expected while, got {:?}", outer[1]);
        };

        let Stmt::Block(inner) = body.as_ref() else {
            panic!("expected while body block");
        };

        assert!(matches!(inner[0], Stmt::Print(_)));
        assert!(matches!(inner[1], Stmt::Expression(Expr::Assign { .. })));
    }

    #[test]
    fn test_parser_07_for_with_empty_clauses() {
        let (statements, errors) = parse_program("for (;;) break;");

        assert!(errors.is_empty());

        let Stmt::Block(outer) = &statements[0] else {
            panic!("expected block");
        };

        // absent condition becomes the literal true
        let Stmt::While { condition, .. } = &outer[1] else {
            panic!("expected while");
        };

        assert_eq!(*condition, Expr::Literal(LiteralValue::True));
    }

    #[test]
    fn test_parser_08_error_recovery_reports_every_error() {
        let (statements, errors) = parse_program("var = 1;\nprint 2;\nvar y 3;\nprint 4;");

        // both bad declarations reported, both prints survived
        assert_eq!(errors.len(), 2);

        let prints = statements
            .iter()
            .filter(|s| matches!(s, Stmt::Print(_)))
            .count();
        assert_eq!(prints, 2);
    }

    #[test]
    fn test_parser_09_parameter_limit() {
        let source = "fun f(p1, p2, p3, p4, p5, p6, p7, p8, p9) { }";
        let (_, errors) = parse_program(source);

        assert_eq!(errors.len(), 1);
        assert!(errors[0]
            .to_string()
            .contains(&format!("Cannot have more than {} parameters.", MAX_PARAMETERS)));
    }

    #[test]
    fn test_parser_10_argument_limit() {
        let source = "f(1, 2, 3, 4, 5, 6, 7, 8, 9);";
        let (_, errors) = parse_program(source);

        assert_eq!(errors.len(), 1);
        assert!(errors[0].to_string().contains("Cannot have more than"));
    }

    #[test]
    fn test_parser_11_class_with_superclass_and_methods() {
        let (statements, errors) =
            parse_program("class B < A { init(x) { this.x = x; } go() { return super.go; } }");

        assert!(errors.is_empty());

        let Stmt::Class {
            name,
            superclass,
            methods,
        } = &statements[0]
        else {
            panic!("expected class declaration");
        };

        assert_eq!(name.lexeme, "B");
        assert!(matches!(superclass, Some(Expr::Variable { .. })));
        assert_eq!(methods.len(), 2);
        assert!(matches!(&methods[0], Stmt::Fun { name, .. } if name.lexeme == "init"));
    }

    #[test]
    fn test_parser_12_reference_ids_are_unique_and_threaded() {
        let toks = tokens("a; a; a;");
        let mut parser = Parser::new(&toks, 10);
        let (statements, errors) = parser.parse();

        assert!(errors.is_empty());

        let ids: Vec<usize> = statements
            .iter()
            .filter_map(|s| match s {
                Stmt::Expression(Expr::Variable { id, .. }) => Some(*id),
                _ => None,
            })
            .collect();

        assert_eq!(ids, vec![10, 11, 12]);
        assert_eq!(parser.next_id(), 13);
    }

    #[test]
    fn test_parser_13_error_at_end_location() {
        let (_, errors) = parse_program("print 1");

        assert_eq!(errors.len(), 1);
        assert!(errors[0].to_string().contains(" at end"));
    }
}
