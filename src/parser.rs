// ABOUTME: Recursive-descent parser: turns a token stream into a statement tree

use crate::ast::{Expr, Stmt};
use crate::error::ParseError;
use crate::token::{Literal, Token, TokenKind};

pub struct Parser {
    tokens: Vec<Token>,
    current: usize,
    errors: Vec<ParseError>,
}

type ExprResult = Result<Expr, ParseError>;
type StmtResult = Result<Stmt, ParseError>;

impl Parser {
    pub fn new(tokens: Vec<Token>) -> Self {
        Parser {
            tokens,
            current: 0,
            errors: Vec::new(),
        }
    }

    /// Parses the whole token stream into a sequence of top-level statements.
    /// On any grammar violation, synchronizes to the next statement boundary
    /// and keeps parsing so a single run can surface multiple syntax errors;
    /// if any were collected, returns them all instead of a partial AST.
    pub fn parse(mut self) -> Result<Vec<Stmt>, Vec<ParseError>> {
        let mut statements = Vec::new();

        while !self.is_at_end() {
            match self.declaration() {
                Ok(stmt) => statements.push(stmt),
                Err(err) => {
                    self.errors.push(err);
                    self.synchronize();
                }
            }
        }

        if self.errors.is_empty() {
            Ok(statements)
        } else {
            Err(self.errors)
        }
    }

    // ---- declarations ----

    fn declaration(&mut self) -> StmtResult {
        if self.match_kind(&[TokenKind::Fun]) {
            return self.fun_declaration("function");
        }
        if self.match_kind(&[TokenKind::Var]) {
            return self.var_declaration();
        }
        self.statement()
    }

    fn fun_declaration(&mut self, kind: &str) -> StmtResult {
        let name = self.consume(TokenKind::Identifier, &format!("expected {kind} name"))?;

        self.consume(
            TokenKind::LeftParen,
            &format!("expected '(' after {kind} name"),
        )?;
        let mut params = Vec::new();
        if !self.check(TokenKind::RightParen) {
            loop {
                params.push(self.consume(TokenKind::Identifier, "expected parameter name")?);
                if !self.match_kind(&[TokenKind::Comma]) {
                    break;
                }
            }
        }
        self.consume(TokenKind::RightParen, "expected ')' after parameters")?;

        self.consume(
            TokenKind::LeftBrace,
            &format!("expected '{{' before {kind} body"),
        )?;
        let body = self.block()?;

        Ok(Stmt::Fun { name, params, body })
    }

    fn var_declaration(&mut self) -> StmtResult {
        let name = self.consume(TokenKind::Identifier, "expected variable name")?;

        let initializer = if self.match_kind(&[TokenKind::Equal]) {
            Some(self.expression()?)
        } else {
            None
        };

        self.consume(TokenKind::Semicolon, "expected ';' after variable declaration")?;
        Ok(Stmt::VarDecl { name, initializer })
    }

    // ---- statements ----

    fn statement(&mut self) -> StmtResult {
        if self.match_kind(&[TokenKind::For]) {
            return self.for_statement();
        }
        if self.match_kind(&[TokenKind::If]) {
            return self.if_statement();
        }
        if self.match_kind(&[TokenKind::Print]) {
            return self.print_statement();
        }
        if self.match_kind(&[TokenKind::Return]) {
            return self.return_statement();
        }
        if self.match_kind(&[TokenKind::While]) {
            return self.while_statement();
        }
        if self.match_kind(&[TokenKind::LeftBrace]) {
            return Ok(Stmt::Block(self.block()?));
        }
        self.expr_statement()
    }

    fn print_statement(&mut self) -> StmtResult {
        let value = self.expression()?;
        self.consume(TokenKind::Semicolon, "expected ';' after value")?;
        Ok(Stmt::Print(value))
    }

    fn return_statement(&mut self) -> StmtResult {
        let keyword = self.previous().clone();
        let value = if self.check(TokenKind::Semicolon) {
            None
        } else {
            Some(self.expression()?)
        };
        self.consume(TokenKind::Semicolon, "expected ';' after return value")?;
        Ok(Stmt::Return { keyword, value })
    }

    fn while_statement(&mut self) -> StmtResult {
        self.consume(TokenKind::LeftParen, "expected '(' after 'while'")?;
        let cond = self.expression()?;
        self.consume(TokenKind::RightParen, "expected ')' after condition")?;
        let body = Box::new(self.statement()?);
        Ok(Stmt::While { cond, body })
    }

    /// Desugars `for (init; cond; incr) body` into the equivalent
    /// `{ init; while (cond) { body; incr; } }` (§4.2).
    fn for_statement(&mut self) -> StmtResult {
        self.consume(TokenKind::LeftParen, "expected '(' after 'for'")?;

        let initializer = if self.match_kind(&[TokenKind::Semicolon]) {
            None
        } else if self.match_kind(&[TokenKind::Var]) {
            Some(self.var_declaration()?)
        } else {
            Some(self.expr_statement()?)
        };

        let condition = if self.check(TokenKind::Semicolon) {
            None
        } else {
            Some(self.expression()?)
        };
        self.consume(TokenKind::Semicolon, "expected ';' after loop condition")?;

        let increment = if self.check(TokenKind::RightParen) {
            None
        } else {
            Some(self.expression()?)
        };
        self.consume(TokenKind::RightParen, "expected ')' after for clauses")?;

        let mut body = self.statement()?;

        if let Some(increment) = increment {
            body = Stmt::Block(vec![body, Stmt::Expr(increment)]);
        }

        let condition = condition.unwrap_or(Expr::Literal(Token::new(
            TokenKind::True,
            "true",
            Literal::None,
            0,
        )));
        body = Stmt::While {
            cond: condition,
            body: Box::new(body),
        };

        if let Some(initializer) = initializer {
            body = Stmt::Block(vec![initializer, body]);
        }

        Ok(body)
    }

    fn if_statement(&mut self) -> StmtResult {
        self.consume(TokenKind::LeftParen, "expected '(' after 'if'")?;
        let cond = self.expression()?;
        self.consume(TokenKind::RightParen, "expected ')' after if condition")?;

        let then_branch = Box::new(self.statement()?);
        let else_branch = if self.match_kind(&[TokenKind::Else]) {
            Some(Box::new(self.statement()?))
        } else {
            None
        };

        Ok(Stmt::If {
            cond,
            then_branch,
            else_branch,
        })
    }

    fn block(&mut self) -> Result<Vec<Stmt>, ParseError> {
        let mut statements = Vec::new();

        while !self.check(TokenKind::RightBrace) && !self.is_at_end() {
            statements.push(self.declaration()?);
        }

        self.consume(TokenKind::RightBrace, "expected '}' after block")?;
        Ok(statements)
    }

    fn expr_statement(&mut self) -> StmtResult {
        let expr = self.expression()?;
        self.consume(TokenKind::Semicolon, "expected ';' after expression")?;
        Ok(Stmt::Expr(expr))
    }

    // ---- expressions, low to high precedence ----

    fn expression(&mut self) -> ExprResult {
        self.assignment()
    }

    fn assignment(&mut self) -> ExprResult {
        let expr = self.or()?;

        if self.match_kind(&[TokenKind::Equal]) {
            let equals = self.previous().clone();
            let value = self.assignment()?;

            if let Expr::Variable(name) = expr {
                return Ok(Expr::Assign {
                    name,
                    value: Box::new(value),
                });
            }

            return Err(ParseError::new(
                equals.line,
                equals.lexeme,
                "invalid assignment target",
            ));
        }

        Ok(expr)
    }

    fn or(&mut self) -> ExprResult {
        let mut expr = self.and()?;
        while self.match_kind(&[TokenKind::Or]) {
            let op = self.previous().clone();
            let right = self.and()?;
            expr = Expr::Logical {
                left: Box::new(expr),
                op,
                right: Box::new(right),
            };
        }
        Ok(expr)
    }

    fn and(&mut self) -> ExprResult {
        let mut expr = self.equality()?;
        while self.match_kind(&[TokenKind::And]) {
            let op = self.previous().clone();
            let right = self.equality()?;
            expr = Expr::Logical {
                left: Box::new(expr),
                op,
                right: Box::new(right),
            };
        }
        Ok(expr)
    }

    fn equality(&mut self) -> ExprResult {
        self.binary_left_assoc(
            Self::comparison,
            &[TokenKind::BangEqual, TokenKind::EqualEqual],
        )
    }

    fn comparison(&mut self) -> ExprResult {
        self.binary_left_assoc(
            Self::term,
            &[
                TokenKind::Greater,
                TokenKind::GreaterEqual,
                TokenKind::Less,
                TokenKind::LessEqual,
            ],
        )
    }

    fn term(&mut self) -> ExprResult {
        self.binary_left_assoc(Self::factor, &[TokenKind::Minus, TokenKind::Plus])
    }

    fn factor(&mut self) -> ExprResult {
        self.binary_left_assoc(Self::unary, &[TokenKind::Slash, TokenKind::Star])
    }

    fn binary_left_assoc(
        &mut self,
        next: fn(&mut Self) -> ExprResult,
        kinds: &[TokenKind],
    ) -> ExprResult {
        let mut expr = next(self)?;
        while self.match_kind(kinds) {
            let op = self.previous().clone();
            let right = next(self)?;
            expr = Expr::Binary {
                left: Box::new(expr),
                op,
                right: Box::new(right),
            };
        }
        Ok(expr)
    }

    fn unary(&mut self) -> ExprResult {
        if self.match_kind(&[TokenKind::Bang, TokenKind::Minus]) {
            let op = self.previous().clone();
            let right = self.unary()?;
            return Ok(Expr::Unary {
                op,
                right: Box::new(right),
            });
        }
        self.call()
    }

    fn call(&mut self) -> ExprResult {
        let mut expr = self.primary()?;

        loop {
            if self.match_kind(&[TokenKind::LeftParen]) {
                expr = self.finish_call(expr)?;
            } else {
                break;
            }
        }

        Ok(expr)
    }

    fn finish_call(&mut self, callee: Expr) -> ExprResult {
        let mut args = Vec::new();
        if !self.check(TokenKind::RightParen) {
            loop {
                args.push(self.expression()?);
                if !self.match_kind(&[TokenKind::Comma]) {
                    break;
                }
            }
        }

        let paren = self.consume(TokenKind::RightParen, "expected ')' after arguments")?;

        Ok(Expr::Call {
            callee: Box::new(callee),
            paren,
            args,
        })
    }

    fn primary(&mut self) -> ExprResult {
        use TokenKind::*;

        if self.match_kind(&[False, True, Nil, Number, String]) {
            return Ok(Expr::Literal(self.previous().clone()));
        }

        if self.match_kind(&[Identifier]) {
            return Ok(Expr::Variable(self.previous().clone()));
        }

        if self.match_kind(&[LeftParen]) {
            let expr = self.expression()?;
            self.consume(RightParen, "expected ')' after expression")?;
            return Ok(Expr::Grouping(Box::new(expr)));
        }

        let tok = self.peek().clone();
        Err(ParseError::new(tok.line, tok.lexeme, "expected expression"))
    }

    // ---- token stream primitives ----

    fn match_kind(&mut self, kinds: &[TokenKind]) -> bool {
        for kind in kinds {
            if self.check(*kind) {
                self.advance();
                return true;
            }
        }
        false
    }

    fn consume(&mut self, kind: TokenKind, message: &str) -> Result<Token, ParseError> {
        if self.check(kind) {
            return Ok(self.advance().clone());
        }
        let tok = self.peek().clone();
        Err(ParseError::new(tok.line, tok.lexeme, message))
    }

    fn check(&self, kind: TokenKind) -> bool {
        self.peek().kind == kind
    }

    fn advance(&mut self) -> &Token {
        if !self.is_at_end() {
            self.current += 1;
        }
        self.previous()
    }

    fn is_at_end(&self) -> bool {
        self.peek().kind == TokenKind::Eof
    }

    fn peek(&self) -> &Token {
        &self.tokens[self.current]
    }

    fn previous(&self) -> &Token {
        &self.tokens[self.current - 1]
    }

    /// Discards tokens up to the next statement boundary after a syntax
    /// error, so parsing can resume and collect further errors.
    fn synchronize(&mut self) {
        self.advance();

        while !self.is_at_end() {
            if self.previous().kind == TokenKind::Semicolon {
                return;
            }

            match self.peek().kind {
                TokenKind::Class
                | TokenKind::Fun
                | TokenKind::Var
                | TokenKind::For
                | TokenKind::If
                | TokenKind::While
                | TokenKind::Print
                | TokenKind::Return => return,
                _ => {
                    self.advance();
                }
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::scanner::Scanner;

    fn parse(src: &str) -> Result<Vec<Stmt>, Vec<ParseError>> {
        let tokens = Scanner::new(src).scan_tokens().unwrap();
        Parser::new(tokens).parse()
    }

    #[test]
    fn test_parses_single_expression_statement() {
        let stmts = parse("1 + 2;").unwrap();
        assert_eq!(stmts.len(), 1);
        assert!(matches!(stmts[0], Stmt::Expr(Expr::Binary { .. })));
    }

    #[test]
    fn test_precedence_multiplication_before_addition() {
        let stmts = parse("2 + 3 * 4;").unwrap();
        match &stmts[0] {
            Stmt::Expr(Expr::Binary { left, op, right }) => {
                assert_eq!(op.kind, TokenKind::Plus);
                assert!(matches!(**left, Expr::Literal(_)));
                assert!(matches!(**right, Expr::Binary { .. }));
            }
            other => panic!("unexpected ast: {other:?}"),
        }
    }

    #[test]
    fn test_determinism_same_source_twice() {
        let src = "var a = 1; if (a == 1) { print a; } else { print 0; }";
        let first = format!("{:?}", parse(src).unwrap());
        let second = format!("{:?}", parse(src).unwrap());
        assert_eq!(first, second);
    }

    #[test]
    fn test_invalid_assignment_target_is_error() {
        let errs = parse("1 = 2;").unwrap_err();
        assert!(errs[0].message.contains("invalid assignment target"));
    }

    #[test]
    fn test_assignment_is_right_associative() {
        let stmts = parse("a = b = 3;").unwrap();
        match &stmts[0] {
            Stmt::Expr(Expr::Assign { name, value }) => {
                assert_eq!(name.lexeme, "a");
                assert!(matches!(**value, Expr::Assign { .. }));
            }
            other => panic!("unexpected ast: {other:?}"),
        }
    }

    #[test]
    fn test_for_desugars_to_block_while() {
        let stmts = parse("for (var i = 0; i < 3; i = i + 1) print i;").unwrap();
        match &stmts[0] {
            Stmt::Block(inner) => {
                assert!(matches!(inner[0], Stmt::VarDecl { .. }));
                assert!(matches!(inner[1], Stmt::While { .. }));
            }
            other => panic!("expected desugared block, got {other:?}"),
        }
    }

    #[test]
    fn test_for_missing_condition_defaults_true() {
        let stmts = parse("for (;;) print 1;").unwrap();
        match &stmts[0] {
            Stmt::While { cond, .. } => {
                assert!(matches!(cond, Expr::Literal(tok) if tok.kind == TokenKind::True));
            }
            other => panic!("expected while with literal true, got {other:?}"),
        }
    }

    #[test]
    fn test_call_parsing_chains() {
        let stmts = parse("f()();").unwrap();
        match &stmts[0] {
            Stmt::Expr(Expr::Call { callee, .. }) => {
                assert!(matches!(**callee, Expr::Call { .. }));
            }
            other => panic!("unexpected ast: {other:?}"),
        }
    }

    #[test]
    fn test_multiple_syntax_errors_collected() {
        let errs = parse("var ;\nvar ;").unwrap_err();
        assert_eq!(errs.len(), 2);
    }

    #[test]
    fn test_fun_declaration_params_and_body() {
        let stmts = parse("fun add(a, b) { return a + b; }").unwrap();
        match &stmts[0] {
            Stmt::Fun { name, params, body } => {
                assert_eq!(name.lexeme, "add");
                assert_eq!(params.len(), 2);
                assert_eq!(body.len(), 1);
            }
            other => panic!("unexpected ast: {other:?}"),
        }
    }
}
