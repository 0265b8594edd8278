use std::rc::Rc;

use crate::token::Token;

/// Constant appearing in source code.
#[derive(Debug, PartialEq, Clone)]
pub enum LiteralValue {
    Nil,
    Bool(bool),
    Number(f64),
    Str(String),
}

#[derive(Debug, PartialEq, Clone)]
pub enum Expr {
    Literal(LiteralValue),
    Grouping(Box<Expr>),
    Unary(Token, Box<Expr>),
    Binary(Box<Expr>, Token, Box<Expr>),
    /// Short-circuiting `and` / `or`.
    Logical(Box<Expr>, Token, Box<Expr>),
    Variable(Token),
    Assign(Token, Box<Expr>),
    /// Callee, closing parenthesis (for error locations) and arguments.
    Call(Box<Expr>, Token, Vec<Expr>),
}

#[derive(Debug, PartialEq, Clone)]
pub enum Stmt {
    Expression(Expr),
    Print(Token, Expr),
    Var(Token, Expr),
    Block(Vec<Stmt>),
    If(Expr, Box<Stmt>, Option<Box<Stmt>>),
    While(Expr, Box<Stmt>),
    // Shared with the function values created when the declaration runs.
    Function(Rc<FunctionDecl>),
    Return(Token, Expr),
}

#[derive(Debug, PartialEq)]
pub struct FunctionDecl {
    pub name: Token,
    pub params: Vec<Token>,
    pub body: Vec<Stmt>,
}

impl Expr {
    pub fn nil() -> Expr {
        Expr::Literal(LiteralValue::Nil)
    }

    pub fn binary(lhs: Expr, op: Token, rhs: Expr) -> Expr {
        Expr::Binary(Box::new(lhs), op, Box::new(rhs))
    }

    pub fn logical(lhs: Expr, op: Token, rhs: Expr) -> Expr {
        Expr::Logical(Box::new(lhs), op, Box::new(rhs))
    }
}
