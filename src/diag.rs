use std::fmt;

use thiserror::Error;

use crate::token::{Line, Token, TokenKind};

/// Lexical or grammatical error.  Carries the offending token.
#[derive(Debug, Error, PartialEq, Clone)]
#[error("{}", Report::new(.token, .message))]
pub struct SyntaxError {
    pub token: Token,
    pub message: String,
}

impl SyntaxError {
    pub fn new(token: Token, message: impl Into<String>) -> SyntaxError {
        SyntaxError {
            token,
            message: message.into(),
        }
    }
}

/// Error description handed to whoever prints diagnostics.
#[derive(Debug, PartialEq, Eq, Clone)]
pub struct Report {
    pub line: Line,
    /// Either "at end" or "at 'lexeme'".
    pub location: String,
    pub message: String,
}

impl Report {
    pub fn new(token: &Token, message: &str) -> Report {
        let location = match token.kind {
            TokenKind::Eof => "at end".to_string(),
            _ => format!("at '{}'", token.lexeme),
        };
        Report {
            line: token.line,
            location,
            message: message.to_string(),
        }
    }
}

impl fmt::Display for Report {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "[line {}] Error {}: {}",
            self.line, self.location, self.message
        )
    }
}

impl From<&SyntaxError> for Report {
    fn from(e: &SyntaxError) -> Report {
        Report::new(&e.token, &e.message)
    }
}
