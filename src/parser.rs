use std::rc::Rc;

use tracing::debug;

use crate::ast::{Expr, FunctionDecl, LiteralValue, Stmt};
use crate::diag::SyntaxError;
use crate::token::{Literal, Token, TokenKind};

/// Maximum number of arguments in a call and of parameters in a function declaration.
pub const MAX_ARGS: usize = 255;

/// Maximum nesting of expressions, statements and blocks.
pub const MAX_NESTING: usize = 128;

type ParseResult<T> = Result<T, SyntaxError>;

/// Recursive-descent parser.
///
/// Pulls tokens from any token iterator, one at a time.  Syntax errors are collected rather
/// than returned so that a single run reports every malformed statement.
#[derive(Debug)]
pub struct Parser<I: Iterator<Item = Token>> {
    tokens: I,
    current: Token,
    previous: Token,
    errors: Vec<SyntaxError>,
    // Number of enclosing function bodies.
    function_depth: usize,
    // Number of enclosing expressions, statements and blocks being parsed.
    nesting: usize,
}

impl<I: Iterator<Item = Token>> Parser<I> {
    pub fn new<T: IntoIterator<IntoIter = I>>(tokens: T) -> Parser<I> {
        let mut parser = Parser {
            tokens: tokens.into_iter(),
            // we haven't pulled anything yet
            current: Token::new(TokenKind::Eof, "", 1),
            previous: Token::new(TokenKind::Eof, "", 1),
            errors: vec![],
            function_depth: 0,
            nesting: 0,
        };
        parser.current = parser.next_grammar_token();
        parser
    }

    /// Parse a whole program.  Returns the statements that parsed successfully together with
    /// every syntax error encountered.
    pub fn parse_program(mut self) -> (Vec<Stmt>, Vec<SyntaxError>) {
        let mut prg = vec![];
        while !self.is_at_end() {
            if let Some(stmt) = self.declaration() {
                prg.push(stmt);
            }
        }
        (prg, self.errors)
    }

    /// Parse a single expression.  Used by tools that only deal with expressions.
    pub fn parse_expression(mut self) -> Result<Expr, Vec<SyntaxError>> {
        let expr = self.expression();
        if expr.is_ok() && !self.is_at_end() {
            self.error_at_current("Expect end of expression.");
        }
        match expr {
            Ok(expr) if self.errors.is_empty() => Ok(expr),
            Ok(_) => Err(self.errors),
            Err(e) => {
                self.errors.push(e);
                Err(self.errors)
            }
        }
    }

    fn declaration(&mut self) -> Option<Stmt> {
        let stmt = match self.current.kind {
            TokenKind::Var => {
                self.advance();
                self.var_decl()
            }
            TokenKind::Fun => {
                self.advance();
                self.fun_decl()
            }
            _ => self.statement(),
        };
        match stmt {
            Ok(stmt) => Some(stmt),
            Err(e) => {
                debug!(line = e.token.line, "syntax error, synchronizing: {}", e.message);
                self.errors.push(e);
                self.synchronize();
                None
            }
        }
    }

    /// Parse variable declaration.
    /// `var` has been consumed.
    fn var_decl(&mut self) -> ParseResult<Stmt> {
        let name = self.consume(TokenKind::Identifier, "Expect variable name.")?;
        let init = if self.matches(TokenKind::Equal) {
            self.expression()?
        } else {
            Expr::nil()
        };
        self.consume(
            TokenKind::Semicolon,
            "Expect ';' after variable declaration.",
        )?;
        Ok(Stmt::Var(name, init))
    }

    /// Parse function declaration.
    /// `fun` has been consumed.
    fn fun_decl(&mut self) -> ParseResult<Stmt> {
        let name = self.consume(TokenKind::Identifier, "Expect function name.")?;
        self.consume(TokenKind::LeftParen, "Expect '(' after function name.")?;
        let mut params = vec![];
        if !self.check(TokenKind::RightParen) {
            loop {
                if params.len() >= MAX_ARGS {
                    self.error_at_current("Can't have more than 255 parameters.");
                }
                params.push(self.consume(TokenKind::Identifier, "Expect parameter name.")?);
                if !self.matches(TokenKind::Comma) {
                    break;
                }
            }
        }
        self.consume(TokenKind::RightParen, "Expect ')' after parameters.")?;
        self.consume(TokenKind::LeftBrace, "Expect '{' before function body.")?;

        self.function_depth += 1;
        let body = self.block();
        self.function_depth -= 1;

        Ok(Stmt::Function(Rc::new(FunctionDecl {
            name,
            params,
            body: body?,
        })))
    }

    fn statement(&mut self) -> ParseResult<Stmt> {
        self.nest()?;
        let stmt = self.unnested_statement();
        self.nesting -= 1;
        stmt
    }

    fn unnested_statement(&mut self) -> ParseResult<Stmt> {
        match self.current.kind {
            TokenKind::Print => {
                self.advance();
                let keyword = self.previous.clone();
                let expr = self.expression()?;
                self.consume(TokenKind::Semicolon, "Expect ';' after value.")?;
                Ok(Stmt::Print(keyword, expr))
            }
            TokenKind::LeftBrace => {
                self.advance();
                Ok(Stmt::Block(self.block()?))
            }
            TokenKind::If => {
                self.advance();
                self.if_stmt()
            }
            TokenKind::While => {
                self.advance();
                self.consume(TokenKind::LeftParen, "Expect '(' after 'while'.")?;
                let cond = self.expression()?;
                self.consume(TokenKind::RightParen, "Expect ')' after condition.")?;
                let body = Box::new(self.statement()?);
                Ok(Stmt::While(cond, body))
            }
            TokenKind::For => {
                self.advance();
                self.for_stmt()
            }
            TokenKind::Return => {
                self.advance();
                self.return_stmt()
            }
            _ => {
                let expr = self.expression()?;
                self.consume(TokenKind::Semicolon, "Expect ';' after expression.")?;
                Ok(Stmt::Expression(expr))
            }
        }
    }

    fn if_stmt(&mut self) -> ParseResult<Stmt> {
        self.consume(TokenKind::LeftParen, "Expect '(' after 'if'.")?;
        let cond = self.expression()?;
        self.consume(TokenKind::RightParen, "Expect ')' after if condition.")?;
        let then_branch = Box::new(self.statement()?);
        let else_branch = if self.matches(TokenKind::Else) {
            Some(Box::new(self.statement()?))
        } else {
            None
        };
        Ok(Stmt::If(cond, then_branch, else_branch))
    }

    /// Desugar `for (init; cond; incr) body` into
    /// `{ init; while (cond) { body; incr; } }`.
    fn for_stmt(&mut self) -> ParseResult<Stmt> {
        self.consume(TokenKind::LeftParen, "Expect '(' after 'for'.")?;
        let init = match self.current.kind {
            TokenKind::Semicolon => {
                self.advance();
                None
            }
            TokenKind::Var => {
                self.advance();
                Some(self.var_decl()?)
            }
            _ => {
                let expr = self.expression()?;
                self.consume(TokenKind::Semicolon, "Expect ';' after expression.")?;
                Some(Stmt::Expression(expr))
            }
        };

        let cond = if self.check(TokenKind::Semicolon) {
            Expr::Literal(LiteralValue::Bool(true))
        } else {
            self.expression()?
        };
        self.consume(TokenKind::Semicolon, "Expect ';' after loop condition.")?;

        let incr = if self.check(TokenKind::RightParen) {
            None
        } else {
            Some(self.expression()?)
        };
        self.consume(TokenKind::RightParen, "Expect ')' after for clauses.")?;

        let mut body = self.statement()?;
        if let Some(incr) = incr {
            body = Stmt::Block(vec![body, Stmt::Expression(incr)]);
        }
        let mut stmt = Stmt::While(cond, Box::new(body));
        if let Some(init) = init {
            stmt = Stmt::Block(vec![init, stmt]);
        }
        Ok(stmt)
    }

    /// `return` has been consumed.
    fn return_stmt(&mut self) -> ParseResult<Stmt> {
        let keyword = self.previous.clone();
        if self.function_depth == 0 {
            self.errors.push(SyntaxError::new(
                keyword.clone(),
                "Can't return from top-level code.",
            ));
        }
        let value = if self.check(TokenKind::Semicolon) {
            Expr::nil()
        } else {
            self.expression()?
        };
        self.consume(TokenKind::Semicolon, "Expect ';' after return value.")?;
        Ok(Stmt::Return(keyword, value))
    }

    /// Parse statements up to the closing brace.
    /// `{` has been consumed.
    fn block(&mut self) -> ParseResult<Vec<Stmt>> {
        self.nest()?;
        let stmts = self.block_contents();
        self.nesting -= 1;
        stmts
    }

    fn block_contents(&mut self) -> ParseResult<Vec<Stmt>> {
        let mut stmts = vec![];
        while !self.check(TokenKind::RightBrace) && !self.is_at_end() {
            if let Some(stmt) = self.declaration() {
                stmts.push(stmt);
            }
        }
        self.consume(TokenKind::RightBrace, "Expect '}' after block.")?;
        Ok(stmts)
    }

    fn expression(&mut self) -> ParseResult<Expr> {
        self.nest()?;
        let expr = self.assignment();
        self.nesting -= 1;
        expr
    }

    fn assignment(&mut self) -> ParseResult<Expr> {
        let lhs = self.or()?;
        if !self.check(TokenKind::Equal) {
            return Ok(lhs);
        }
        // Reported before moving past `=` so that errors stay in source order.
        if !matches!(lhs, Expr::Variable(_)) {
            self.error_at_current("Invalid assignment target.");
        }
        self.advance();
        let rhs = self.expression()?;
        match lhs {
            Expr::Variable(name) => Ok(Expr::Assign(name, Box::new(rhs))),
            lhs => Ok(lhs),
        }
    }

    fn or(&mut self) -> ParseResult<Expr> {
        let mut expr = self.and()?;
        while self.matches(TokenKind::Or) {
            let op = self.previous.clone();
            expr = Expr::logical(expr, op, self.and()?);
        }
        Ok(expr)
    }

    fn and(&mut self) -> ParseResult<Expr> {
        let mut expr = self.equality()?;
        while self.matches(TokenKind::And) {
            let op = self.previous.clone();
            expr = Expr::logical(expr, op, self.equality()?);
        }
        Ok(expr)
    }

    fn equality(&mut self) -> ParseResult<Expr> {
        let mut expr = self.comparison()?;
        while self.matches_any(&[TokenKind::BangEqual, TokenKind::EqualEqual]) {
            let op = self.previous.clone();
            expr = Expr::binary(expr, op, self.comparison()?);
        }
        Ok(expr)
    }

    fn comparison(&mut self) -> ParseResult<Expr> {
        let mut expr = self.term()?;
        while self.matches_any(&[
            TokenKind::Greater,
            TokenKind::GreaterEqual,
            TokenKind::Less,
            TokenKind::LessEqual,
        ]) {
            let op = self.previous.clone();
            expr = Expr::binary(expr, op, self.term()?);
        }
        Ok(expr)
    }

    fn term(&mut self) -> ParseResult<Expr> {
        let mut expr = self.factor()?;
        while self.matches_any(&[TokenKind::Plus, TokenKind::Minus]) {
            let op = self.previous.clone();
            expr = Expr::binary(expr, op, self.factor()?);
        }
        Ok(expr)
    }

    fn factor(&mut self) -> ParseResult<Expr> {
        let mut expr = self.unary()?;
        while self.matches_any(&[TokenKind::Star, TokenKind::Slash]) {
            let op = self.previous.clone();
            expr = Expr::binary(expr, op, self.unary()?);
        }
        Ok(expr)
    }

    fn unary(&mut self) -> ParseResult<Expr> {
        if self.matches_any(&[TokenKind::Bang, TokenKind::Minus]) {
            let op = self.previous.clone();
            self.nest()?;
            let operand = self.unary();
            self.nesting -= 1;
            return Ok(Expr::Unary(op, Box::new(operand?)));
        }
        self.call()
    }

    fn call(&mut self) -> ParseResult<Expr> {
        let mut expr = self.primary()?;
        while self.matches(TokenKind::LeftParen) {
            expr = self.finish_call(expr)?;
        }
        Ok(expr)
    }

    /// `(` has been consumed.
    fn finish_call(&mut self, callee: Expr) -> ParseResult<Expr> {
        let mut args = vec![];
        if !self.check(TokenKind::RightParen) {
            loop {
                if args.len() >= MAX_ARGS {
                    self.error_at_current("Can't have more than 255 arguments.");
                }
                args.push(self.expression()?);
                if !self.matches(TokenKind::Comma) {
                    break;
                }
            }
        }
        let paren = self.consume(TokenKind::RightParen, "Expect ')' after arguments.")?;
        Ok(Expr::Call(Box::new(callee), paren, args))
    }

    fn primary(&mut self) -> ParseResult<Expr> {
        let value = match self.current.kind {
            TokenKind::False => LiteralValue::Bool(false),
            TokenKind::True => LiteralValue::Bool(true),
            TokenKind::Nil => LiteralValue::Nil,
            TokenKind::Number | TokenKind::String => match self.current.literal.clone() {
                Some(Literal::Number(n)) => LiteralValue::Number(n),
                Some(Literal::Str(s)) => LiteralValue::Str(s),
                None => return Err(self.error_at_current_token("Expect expression.")),
            },
            TokenKind::Identifier => {
                self.advance();
                return Ok(Expr::Variable(self.previous.clone()));
            }
            TokenKind::LeftParen => {
                self.advance();
                let expr = self.expression()?;
                self.consume(TokenKind::RightParen, "Expect ')' after expression.")?;
                return Ok(Expr::Grouping(Box::new(expr)));
            }
            _ => return Err(self.error_at_current_token("Expect expression.")),
        };
        self.advance();
        Ok(Expr::Literal(value))
    }

    /// Skip tokens until something that looks like the start of the next statement.
    fn synchronize(&mut self) {
        self.advance();
        while !self.is_at_end() {
            if self.previous.kind == TokenKind::Semicolon || self.current.kind.starts_statement()
            {
                return;
            }
            self.advance();
        }
    }

    /// Move to the next grammar token.  Stays on `Eof` once it has been reached.
    fn advance(&mut self) {
        if self.is_at_end() {
            return;
        }
        let next = self.next_grammar_token();
        self.previous = std::mem::replace(&mut self.current, next);
    }

    /// Pull tokens until one the grammar knows about.  Invalid tokens are recorded as errors.
    fn next_grammar_token(&mut self) -> Token {
        loop {
            let token = match self.tokens.next() {
                Some(token) => token,
                None => return Token::new(TokenKind::Eof, "", self.current.line),
            };
            match token.kind {
                TokenKind::Invalid(e) => {
                    let message = e.to_string();
                    self.errors.push(SyntaxError::new(token, message));
                }
                _ => return token,
            }
        }
    }

    fn is_at_end(&self) -> bool {
        self.current.kind == TokenKind::Eof
    }

    fn check(&self, kind: TokenKind) -> bool {
        self.current.kind == kind
    }

    fn matches(&mut self, kind: TokenKind) -> bool {
        if self.check(kind) {
            self.advance();
            true
        } else {
            false
        }
    }

    fn matches_any(&mut self, kinds: &[TokenKind]) -> bool {
        if kinds.contains(&self.current.kind) {
            self.advance();
            true
        } else {
            false
        }
    }

    fn consume(&mut self, kind: TokenKind, message: &str) -> ParseResult<Token> {
        if self.check(kind) {
            self.advance();
            Ok(self.previous.clone())
        } else {
            Err(self.error_at_current_token(message))
        }
    }

    /// Enter one more level of nesting.  The caller leaves it by decrementing `nesting`.
    fn nest(&mut self) -> ParseResult<()> {
        if self.nesting >= MAX_NESTING {
            return Err(self.error_at_current_token("Too much nesting."));
        }
        self.nesting += 1;
        Ok(())
    }

    fn error_at_current_token(&self, message: &str) -> SyntaxError {
        SyntaxError::new(self.current.clone(), message)
    }

    fn error_at_current(&mut self, message: &str) {
        let e = self.error_at_current_token(message);
        self.errors.push(e);
    }
}
