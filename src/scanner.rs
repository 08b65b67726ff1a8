// ABOUTME: Scanner: turns a source string into a token stream terminated by EOF

use crate::error::ScanError;
use crate::token::{keyword_kind, Literal, Token, TokenKind};

pub struct Scanner {
    source: Vec<char>,
    start: usize,
    current: usize,
    line: usize,
    tokens: Vec<Token>,
}

impl Scanner {
    pub fn new(source: &str) -> Self {
        Scanner {
            source: source.chars().collect(),
            start: 0,
            current: 0,
            line: 1,
            tokens: Vec::new(),
        }
    }

    /// Scans the whole source, returning tokens terminated by a single `EOF`,
    /// or the first scan error encountered (scanning is fatal to the run).
    pub fn scan_tokens(mut self) -> Result<Vec<Token>, ScanError> {
        while !self.is_at_end() {
            self.start = self.current;
            self.scan_token()?;
        }

        self.tokens
            .push(Token::new(TokenKind::Eof, "", Literal::None, self.line));
        Ok(self.tokens)
    }

    fn scan_token(&mut self) -> Result<(), ScanError> {
        let c = self.advance();
        use TokenKind::*;
        match c {
            '(' => self.add_token(LeftParen),
            ')' => self.add_token(RightParen),
            '{' => self.add_token(LeftBrace),
            '}' => self.add_token(RightBrace),
            ',' => self.add_token(Comma),
            '.' => self.add_token(Dot),
            '-' => self.add_token(Minus),
            '+' => self.add_token(Plus),
            ';' => self.add_token(Semicolon),
            '*' => self.add_token(Star),

            '!' => {
                let kind = if self.match_next('=') { BangEqual } else { Bang };
                self.add_token(kind);
            }
            '=' => {
                let kind = if self.match_next('=') {
                    EqualEqual
                } else {
                    Equal
                };
                self.add_token(kind);
            }
            '<' => {
                let kind = if self.match_next('=') { LessEqual } else { Less };
                self.add_token(kind);
            }
            '>' => {
                let kind = if self.match_next('=') {
                    GreaterEqual
                } else {
                    Greater
                };
                self.add_token(kind);
            }

            '/' => {
                if self.match_next('/') {
                    while self.peek() != '\n' && !self.is_at_end() {
                        self.advance();
                    }
                } else {
                    self.add_token(Slash);
                }
            }

            ' ' | '\t' | '\r' => {}
            '\n' => self.line += 1,

            '"' => self.scan_string()?,

            c if c.is_ascii_digit() => self.scan_number(),
            c if c.is_ascii_alphabetic() => self.scan_identifier(),

            other => {
                return Err(ScanError::new(
                    self.line,
                    format!("unexpected token: {other}"),
                ))
            }
        }
        Ok(())
    }

    fn scan_string(&mut self) -> Result<(), ScanError> {
        while self.peek() != '"' && !self.is_at_end() {
            if self.peek() == '\n' {
                self.line += 1;
            }
            self.advance();
        }

        if self.is_at_end() {
            return Err(ScanError::new(self.line, "unterminated string"));
        }

        // the closing quote
        self.advance();

        let value: String = self.source[self.start + 1..self.current - 1].iter().collect();
        self.add_token_with_literal(TokenKind::String, Literal::String(value));
        Ok(())
    }

    fn scan_number(&mut self) {
        while self.peek().is_ascii_digit() {
            self.advance();
        }

        if self.peek() == '.' && self.peek_next().is_ascii_digit() {
            self.advance(); // consume the '.'
            while self.peek().is_ascii_digit() {
                self.advance();
            }
        }

        let text: String = self.source[self.start..self.current].iter().collect();
        let value: f64 = text.parse().expect("scanner guarantees valid digits");
        self.add_token_with_literal(TokenKind::Number, Literal::Number(value));
    }

    fn scan_identifier(&mut self) {
        while self.peek().is_ascii_alphanumeric() {
            self.advance();
        }

        let text: String = self.source[self.start..self.current].iter().collect();
        let kind = keyword_kind(&text).unwrap_or(TokenKind::Identifier);
        self.add_token(kind);
    }

    fn is_at_end(&self) -> bool {
        self.current >= self.source.len()
    }

    fn advance(&mut self) -> char {
        let c = self.source[self.current];
        self.current += 1;
        c
    }

    fn peek(&self) -> char {
        if self.is_at_end() {
            '\0'
        } else {
            self.source[self.current]
        }
    }

    fn peek_next(&self) -> char {
        if self.current + 1 >= self.source.len() {
            '\0'
        } else {
            self.source[self.current + 1]
        }
    }

    fn match_next(&mut self, expected: char) -> bool {
        if self.is_at_end() || self.source[self.current] != expected {
            return false;
        }
        self.current += 1;
        true
    }

    fn add_token(&mut self, kind: TokenKind) {
        self.add_token_with_literal(kind, Literal::None);
    }

    fn add_token_with_literal(&mut self, kind: TokenKind, literal: Literal) {
        let lexeme: String = self.source[self.start..self.current].iter().collect();
        self.tokens.push(Token::new(kind, lexeme, literal, self.line));
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn kinds(src: &str) -> Vec<TokenKind> {
        Scanner::new(src)
            .scan_tokens()
            .unwrap()
            .into_iter()
            .map(|t| t.kind)
            .collect()
    }

    #[test]
    fn test_single_char_tokens() {
        use TokenKind::*;
        assert_eq!(
            kinds("(){},.-+;*"),
            vec![
                LeftParen, RightParen, LeftBrace, RightBrace, Comma, Dot, Minus, Plus, Semicolon,
                Star, Eof
            ]
        );
    }

    #[test]
    fn test_two_char_operators() {
        use TokenKind::*;
        assert_eq!(
            kinds("!= == <= >= ! = < >"),
            vec![
                BangEqual, EqualEqual, LessEqual, GreaterEqual, Bang, Equal, Less, Greater, Eof
            ]
        );
    }

    #[test]
    fn test_line_comment_emits_no_token() {
        use TokenKind::*;
        assert_eq!(kinds("// a comment\n1"), vec![Number, Eof]);
    }

    #[test]
    fn test_ends_with_exactly_one_eof() {
        let tokens = Scanner::new("1 + 2").scan_tokens().unwrap();
        assert_eq!(tokens.last().unwrap().kind, TokenKind::Eof);
        assert_eq!(tokens.iter().filter(|t| t.kind == TokenKind::Eof).count(), 1);
    }

    #[test]
    fn test_string_literal() {
        let tokens = Scanner::new("\"hello\"").scan_tokens().unwrap();
        match &tokens[0].literal {
            Literal::String(s) => assert_eq!(s, "hello"),
            other => panic!("expected string literal, got {other:?}"),
        }
        assert_eq!(tokens[0].lexeme, "\"hello\"");
    }

    #[test]
    fn test_unterminated_string_is_error() {
        let err = Scanner::new("\"oops").scan_tokens().unwrap_err();
        assert_eq!(err.line, 1);
    }

    #[test]
    fn test_string_spanning_lines_increments_line_counter() {
        let tokens = Scanner::new("\"a\nb\"\nidentifier").scan_tokens().unwrap();
        // the identifier after the multi-line string should be on line 3
        let ident = tokens.iter().find(|t| t.kind == TokenKind::Identifier).unwrap();
        assert_eq!(ident.line, 3);
    }

    #[test]
    fn test_number_literal_forms() {
        let tokens = Scanner::new("123 1.5").scan_tokens().unwrap();
        assert!(matches!(tokens[0].literal, Literal::Number(n) if n == 123.0));
        assert!(matches!(tokens[1].literal, Literal::Number(n) if n == 1.5));
    }

    #[test]
    fn test_trailing_dot_without_fraction_not_consumed() {
        // "1." should scan as NUMBER(1) then DOT, not NUMBER(1.)
        let tokens = Scanner::new("1.").scan_tokens().unwrap();
        assert_eq!(tokens[0].kind, TokenKind::Number);
        assert_eq!(tokens[1].kind, TokenKind::Dot);
    }

    #[test]
    fn test_keywords_vs_identifiers() {
        use TokenKind::*;
        assert_eq!(kinds("and class else false fun for"), vec![And, Class, Else, False, Fun, For, Eof]);
        assert_eq!(kinds("foobar"), vec![Identifier, Eof]);
    }

    #[test]
    fn test_line_tracking_across_newlines() {
        let tokens = Scanner::new("1\n2\n3").scan_tokens().unwrap();
        let lines: Vec<usize> = tokens.iter().map(|t| t.line).collect();
        assert_eq!(lines, vec![1, 2, 3, 3]);
    }

    #[test]
    fn test_unexpected_character_is_error() {
        let err = Scanner::new("@").scan_tokens().unwrap_err();
        assert!(err.message.contains('@'));
    }

    #[test]
    fn test_every_token_has_line_at_least_one() {
        let tokens = Scanner::new("var a = 1;\nprint a;").scan_tokens().unwrap();
        assert!(tokens.iter().all(|t| t.line >= 1));
    }
}
