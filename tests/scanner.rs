#[cfg(test)]
mod scanner_tests {
    use loxide::scanner::*;
    use loxide::token::*;

    fn assert_token_sequence(source: &str, expected: &[(TokenType, &str)]) {
        let scanner = Scanner::new(source.as_bytes());
        let tokens: Vec<_> = scanner.filter_map(Result::ok).collect();

        assert_eq!(tokens.len(), expected.len());

        for (actual, (expected_type, expected_lexeme)) in tokens.iter().zip(expected.iter()) {
            assert_eq!(actual.token_type, *expected_type);
            assert_eq!(actual.lexeme, *expected_lexeme);
        }
    }

    #[test]
    fn test_scanner_01_symbols() {
        assert_token_sequence(
            "({*.,+*})",
            &[
                (TokenType::LEFT_PAREN, "("),
                (TokenType::LEFT_BRACE, "{"),
                (TokenType::STAR, "*"),
                (TokenType::DOT, "."),
                (TokenType::COMMA, ","),
                (TokenType::PLUS, "+"),
                (TokenType::STAR, "*"),
                (TokenType::RIGHT_BRACE, "}"),
                (TokenType::RIGHT_PAREN, ")"),
                (TokenType::EOF, ""),
            ],
        );
    }

    #[test]
    fn test_scanner_02_operators() {
        assert_token_sequence(
            "! != = == < <= > >=",
            &[
                (TokenType::BANG, "!"),
                (TokenType::BANG_EQUAL, "!="),
                (TokenType::EQUAL, "="),
                (TokenType::EQUAL_EQUAL, "=="),
                (TokenType::LESS, "<"),
                (TokenType::LESS_EQUAL, "<="),
                (TokenType::GREATER, ">"),
                (TokenType::GREATER_EQUAL, ">="),
                (TokenType::EOF, ""),
            ],
        );
    }

    #[test]
    fn test_scanner_03_keywords_and_identifiers() {
        assert_token_sequence(
            "var x = while_not_keyword; break super",
            &[
                (TokenType::VAR, "var"),
                (TokenType::IDENTIFIER, "x"),
                (TokenType::EQUAL, "="),
                (TokenType::IDENTIFIER, "while_not_keyword"),
                (TokenType::SEMICOLON, ";"),
                (TokenType::BREAK, "break"),
                (TokenType::SUPER, "super"),
                (TokenType::EOF, ""),
            ],
        );
    }

    #[test]
    fn test_scanner_04_number_literals() {
        let (tokens, errors) = Scanner::new(b"12 3.14 7.".as_ref()).scan_all();

        assert!(errors.is_empty());

        // "7." is the number 7 followed by a DOT: no trailing-dot numbers
        assert_eq!(tokens[0].token_type, TokenType::NUMBER(12.0));
        assert_eq!(tokens[1].token_type, TokenType::NUMBER(3.14));
        assert_eq!(tokens[2].token_type, TokenType::NUMBER(7.0));
        assert_eq!(tokens[3].token_type, TokenType::DOT);
        assert_eq!(tokens[4].token_type, TokenType::EOF);

        match &tokens[1].token_type {
            TokenType::NUMBER(n) => assert_eq!(*n, 3.14),
            other => panic!("expected NUMBER, got {:?}", other),
        }
    }

    #[test]
    fn test_scanner_05_string_literal_spans_lines() {
        let (tokens, errors) = Scanner::new(b"\"ab\ncd\" x".as_ref()).scan_all();

        assert!(errors.is_empty());

        match &tokens[0].token_type {
            TokenType::STRING(s) => assert_eq!(s, "ab\ncd"),
            other => panic!("expected STRING, got {:?}", other),
        }

        // the newline inside the literal still advances the line counter
        assert_eq!(tokens[1].lexeme, "x");
        assert_eq!(tokens[1].line, 2);
    }

    #[test]
    fn test_scanner_06_unterminated_string() {
        let (tokens, errors) = Scanner::new(b"\"never closed".as_ref()).scan_all();

        assert_eq!(errors.len(), 1);
        assert!(errors[0].to_string().contains("Unterminated string."));

        // EOF is still emitted after the error
        assert_eq!(tokens.last().unwrap().token_type, TokenType::EOF);
    }

    #[test]
    fn test_scanner_07_line_comment_skipped() {
        assert_token_sequence(
            "a // the rest vanishes ()\nb",
            &[
                (TokenType::IDENTIFIER, "a"),
                (TokenType::IDENTIFIER, "b"),
                (TokenType::EOF, ""),
            ],
        );
    }

    #[test]
    fn test_scanner_08_block_comments_nest() {
        assert_token_sequence(
            "a /* outer /* inner */ still comment */ b",
            &[
                (TokenType::IDENTIFIER, "a"),
                (TokenType::IDENTIFIER, "b"),
                (TokenType::EOF, ""),
            ],
        );
    }

    #[test]
    fn test_scanner_09_unterminated_block_comment_consumes_rest() {
        // no error: the comment simply swallows the remaining input
        assert_token_sequence(
            "a /* never closed ...",
            &[(TokenType::IDENTIFIER, "a"), (TokenType::EOF, "")],
        );
    }

    #[test]
    fn test_scanner_10_unexpected_characters_are_errors_not_fatal() {
        let (tokens, errors) = Scanner::new(b",.$(#".as_ref()).scan_all();

        assert_eq!(errors.len(), 2);

        for err in &errors {
            assert!(err.to_string().contains("Unexpected character"));
        }

        // scanning continued past both bad bytes
        assert_eq!(tokens[0].token_type, TokenType::COMMA);
        assert_eq!(tokens[1].token_type, TokenType::DOT);
        assert_eq!(tokens[2].token_type, TokenType::LEFT_PAREN);
        assert_eq!(tokens[3].token_type, TokenType::EOF);
    }

    #[test]
    fn test_scanner_11_line_numbers() {
        let (tokens, errors) = Scanner::new(b"a\nb\n\nc".as_ref()).scan_all();

        assert!(errors.is_empty());
        assert_eq!(tokens[0].line, 1);
        assert_eq!(tokens[1].line, 2);
        assert_eq!(tokens[2].line, 4);
    }

    #[test]
    fn test_scanner_12_integral_number_beyond_i64_range() {
        let (tokens, errors) = Scanner::new(b"100000000000000000000".as_ref()).scan_all();

        assert!(errors.is_empty());
        assert_eq!(
            tokens[0].to_string(),
            "NUMBER 100000000000000000000 100000000000000000000.0"
        );
    }

    #[test]
    fn test_scanner_13_non_ascii_unexpected_character() {
        let (tokens, errors) = Scanner::new("é x".as_bytes()).scan_all();

        // one diagnostic for the character, not one per byte
        assert_eq!(errors.len(), 1);
        assert!(errors[0].to_string().contains("Unexpected character: é"));

        assert_eq!(tokens[0].lexeme, "x");
        assert_eq!(tokens[1].token_type, TokenType::EOF);
    }

    #[test]
    fn test_scanner_14_invalid_utf8_in_string_literal() {
        let (tokens, errors) = Scanner::new(b"\"\xFFabc\" x".as_ref()).scan_all();

        assert_eq!(errors.len(), 1);
        assert!(errors[0]
            .to_string()
            .contains("String literal is not valid UTF-8."));

        // scanning resumes after the closing quote
        assert_eq!(tokens[0].lexeme, "x");
        assert_eq!(tokens[1].token_type, TokenType::EOF);
    }
}
