use std::fmt;
use std::rc::Rc;

use crate::ast::FunctionDecl;
use crate::eval::RuntimeErrorKind;

/// Result of evaluating an expression.
#[derive(Debug, PartialEq, Clone)]
pub enum Value {
    Nil,
    Bool(bool),
    Number(f64),
    Str(Rc<str>),
    Callable(Callable),
}

impl Value {
    /// `nil` and `false` are falsy, everything else (including `0` and `""`) is truthy.
    pub fn is_truthy(&self) -> bool {
        !matches!(self, Value::Nil | Value::Bool(false))
    }
}

impl fmt::Display for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Value::Nil => write!(f, "nil"),
            Value::Bool(b) => write!(f, "{}", b),
            // Integral floats are shown without a fractional part.
            Value::Number(n) => write!(f, "{}", n),
            Value::Str(s) => write!(f, "{}", s),
            Value::Callable(c) => write!(f, "{}", c),
        }
    }
}

impl From<&str> for Value {
    fn from(s: &str) -> Value {
        Value::Str(Rc::from(s))
    }
}

pub type NativeFn = fn(&[Value]) -> Result<Value, RuntimeErrorKind>;

/// Function implemented in Rust.
#[derive(Clone, Copy)]
pub struct NativeFunction {
    pub name: &'static str,
    pub arity: usize,
    pub body: NativeFn,
}

/// Anything that can appear on the left of a call expression.
#[derive(Clone)]
pub enum Callable {
    Native(NativeFunction),
    User(Rc<FunctionDecl>),
}

impl Callable {
    pub fn arity(&self) -> usize {
        match self {
            Callable::Native(f) => f.arity,
            Callable::User(decl) => decl.params.len(),
        }
    }

    pub fn name(&self) -> &str {
        match self {
            Callable::Native(f) => f.name,
            Callable::User(decl) => &decl.name.lexeme,
        }
    }
}

impl fmt::Debug for Callable {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let kind = match self {
            Callable::Native(_) => "Native",
            Callable::User(_) => "User",
        };
        f.debug_struct("Callable")
            .field("kind", &kind)
            .field("name", &self.name())
            .field("arity", &self.arity())
            .finish()
    }
}

/// A callable is only equal to itself.
impl PartialEq for Callable {
    fn eq(&self, other: &Self) -> bool {
        match (self, other) {
            (Callable::Native(l), Callable::Native(r)) => l.name == r.name,
            (Callable::User(l), Callable::User(r)) => Rc::ptr_eq(l, r),
            _ => false,
        }
    }
}

impl fmt::Display for Callable {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Callable::Native(func) => write!(f, "<native fn {}>", func.name),
            Callable::User(decl) => write!(f, "<fn {}>", decl.name.lexeme),
        }
    }
}
