use std::io;
use std::io::prelude::*;
use std::rc::Rc;

use thiserror::Error;
use tracing::trace;

use crate::ast::{Expr, LiteralValue, Stmt};
use crate::diag::Report;
use crate::env::Environment;
use crate::token::{Token, TokenKind};
use crate::value::{Callable, Value};

/// Error raised while evaluating.  Carries the token the error is attributed to.
#[derive(Debug, Error)]
#[error("{}", Report::new(.token, &.kind.to_string()))]
pub struct RuntimeError {
    pub token: Token,
    #[source]
    pub kind: RuntimeErrorKind,
}

impl RuntimeError {
    pub fn new(token: Token, kind: RuntimeErrorKind) -> RuntimeError {
        RuntimeError { token, kind }
    }
}

#[derive(Debug, Error)]
pub enum RuntimeErrorKind {
    #[error("operand must be a number.")]
    OperandMustBeNumber,
    #[error("operands must be numbers.")]
    OperandsMustBeNumbers,
    #[error("Operands must be two numbers or two strings.")]
    OperandsMustBeNumbersOrStrings,
    #[error("Undefined variable '{0}'.")]
    UndefinedVariable(String),
    #[error("Can only call functions and classes")]
    NotCallable,
    #[error("Expected {expected} arguments but got {got}.")]
    Arity { expected: usize, got: usize },
    /// Failure reported by a native function.
    #[error("{0}")]
    Native(String),
    #[error("Stack overflow.")]
    StackOverflow,
    /// Operator token that has no meaning in the expression holding it.
    #[error("Invalid operator '{0}'.")]
    InvalidOperator(String),
    #[error("I/O error: {0}")]
    Io(#[from] io::Error),
}

/// Maximum number of nested calls to user functions.
///
/// Every Lox call recurses on the native stack.  Unoptimized builds need roughly 16 KiB of
/// stack per call, so callers expecting deep recursion should evaluate on a thread with a
/// large enough stack, as the `treelox` binary does.
pub const MAX_CALL_DEPTH: usize = 1024;

/// How a statement completed.
#[derive(Debug, PartialEq)]
pub enum Flow {
    Normal,
    /// A `return` is unwinding the current call.
    Return(Value),
}

/// Tree-walking evaluator.  Writes `print` output to `output` and keeps bindings in `env`.
#[derive(Debug)]
pub struct Evaluator<'a, W: Write> {
    output: &'a mut W,
    env: &'a mut Environment,
    // Active calls to user functions.
    depth: usize,
}

impl<'a, W: Write> Evaluator<'a, W> {
    pub fn new(output: &'a mut W, env: &'a mut Environment) -> Evaluator<'a, W> {
        Evaluator {
            output,
            env,
            depth: 0,
        }
    }

    /// Execute top-level statements in order, stopping at the first error.
    pub fn execute_all(&mut self, stmts: &[Stmt]) -> Result<(), RuntimeError> {
        for stmt in stmts {
            self.execute(stmt)?;
        }
        Ok(())
    }

    /// Execute statements in the current frame until one of them returns.
    fn execute_block(&mut self, stmts: &[Stmt]) -> Result<Flow, RuntimeError> {
        for stmt in stmts {
            if let Flow::Return(v) = self.execute(stmt)? {
                return Ok(Flow::Return(v));
            }
        }
        Ok(Flow::Normal)
    }

    /// Run `f` in a fresh frame nested in the current one.  The frame is popped on every exit
    /// path.
    fn in_new_frame<T>(
        &mut self,
        f: impl FnOnce(&mut Self) -> Result<T, RuntimeError>,
    ) -> Result<T, RuntimeError> {
        self.env.push_frame();
        let res = f(self);
        self.env.pop_frame();
        res
    }

    pub fn execute(&mut self, stmt: &Stmt) -> Result<Flow, RuntimeError> {
        match stmt {
            Stmt::Expression(e) => {
                self.evaluate(e)?;
            }
            Stmt::Print(keyword, e) => {
                let v = self.evaluate(e)?;
                writeln!(self.output, "{}", v)
                    .map_err(|e| RuntimeError::new(keyword.clone(), e.into()))?;
            }
            Stmt::Var(name, init) => {
                let v = self.evaluate(init)?;
                self.env.define(&name.lexeme, v);
            }
            Stmt::Function(decl) => {
                self.env.define(
                    &decl.name.lexeme,
                    Value::Callable(Callable::User(Rc::clone(decl))),
                );
            }
            Stmt::Block(stmts) => {
                return self.in_new_frame(|ev| ev.execute_block(stmts));
            }
            Stmt::If(cond, then_branch, else_branch) => {
                if self.evaluate(cond)?.is_truthy() {
                    return self.execute(then_branch);
                } else if let Some(else_branch) = else_branch {
                    return self.execute(else_branch);
                }
            }
            Stmt::While(cond, body) => {
                while self.evaluate(cond)?.is_truthy() {
                    if let Flow::Return(v) = self.execute(body)? {
                        return Ok(Flow::Return(v));
                    }
                }
            }
            Stmt::Return(_, e) => {
                return Ok(Flow::Return(self.evaluate(e)?));
            }
        };
        Ok(Flow::Normal)
    }

    pub fn evaluate(&mut self, expr: &Expr) -> Result<Value, RuntimeError> {
        match expr {
            Expr::Literal(lit) => Ok(match lit {
                LiteralValue::Nil => Value::Nil,
                LiteralValue::Bool(b) => Value::Bool(*b),
                LiteralValue::Number(n) => Value::Number(*n),
                LiteralValue::Str(s) => Value::from(s.as_str()),
            }),
            Expr::Grouping(e) => self.evaluate(e),
            Expr::Variable(name) => self.env.get(name),
            Expr::Assign(name, rhs) => {
                let v = self.evaluate(rhs)?;
                self.env.assign(name, v.clone())?;
                Ok(v)
            }
            Expr::Unary(op, operand) => {
                let v = self.evaluate(operand)?;
                match (op.kind, v) {
                    (TokenKind::Bang, v) => Ok(Value::Bool(!v.is_truthy())),
                    (TokenKind::Minus, Value::Number(n)) => Ok(Value::Number(-n)),
                    (TokenKind::Minus, _) => Err(RuntimeError::new(
                        op.clone(),
                        RuntimeErrorKind::OperandMustBeNumber,
                    )),
                    _ => Err(invalid_operator(op)),
                }
            }
            Expr::Logical(lhs, op, rhs) => {
                let l = self.evaluate(lhs)?;
                let decided = match op.kind {
                    TokenKind::Or => l.is_truthy(),
                    TokenKind::And => !l.is_truthy(),
                    _ => return Err(invalid_operator(op)),
                };
                if decided {
                    Ok(l)
                } else {
                    self.evaluate(rhs)
                }
            }
            Expr::Binary(lhs, op, rhs) => {
                let l = self.evaluate(lhs)?;
                let r = self.evaluate(rhs)?;
                binary(op, l, r)
            }
            Expr::Call(callee, paren, args) => self.call_expr(callee, paren, args),
        }
    }

    fn call_expr(
        &mut self,
        callee: &Expr,
        paren: &Token,
        args: &[Expr],
    ) -> Result<Value, RuntimeError> {
        let callee = self.evaluate(callee)?;
        let args = args
            .iter()
            .map(|a| self.evaluate(a))
            .collect::<Result<Vec<Value>, RuntimeError>>()?;
        match callee {
            Value::Callable(f) => self.call(&f, paren, args),
            _ => Err(RuntimeError::new(
                paren.clone(),
                RuntimeErrorKind::NotCallable,
            )),
        }
    }

    /// Invoke `f`.  User functions run in a frame nested in the caller's current frame.
    fn call(
        &mut self,
        f: &Callable,
        paren: &Token,
        args: Vec<Value>,
    ) -> Result<Value, RuntimeError> {
        trace!(callee = f.name(), args = args.len(), depth = self.depth, "call");
        if args.len() != f.arity() {
            return Err(RuntimeError::new(
                paren.clone(),
                RuntimeErrorKind::Arity {
                    expected: f.arity(),
                    got: args.len(),
                },
            ));
        }
        match f {
            Callable::Native(native) => {
                (native.body)(&args).map_err(|kind| RuntimeError::new(paren.clone(), kind))
            }
            Callable::User(decl) => {
                if self.depth >= MAX_CALL_DEPTH {
                    return Err(RuntimeError::new(
                        paren.clone(),
                        RuntimeErrorKind::StackOverflow,
                    ));
                }
                self.depth += 1;
                self.env.push_frame();
                for (param, arg) in decl.params.iter().zip(args) {
                    self.env.define(&param.lexeme, arg);
                }
                let flow = self.execute_block(&decl.body);
                self.env.pop_frame();
                self.depth -= 1;
                match flow? {
                    Flow::Return(v) => Ok(v),
                    Flow::Normal => Ok(Value::Nil),
                }
            }
        }
    }
}

fn binary(op: &Token, l: Value, r: Value) -> Result<Value, RuntimeError> {
    let res = match op.kind {
        TokenKind::EqualEqual => Value::Bool(l == r),
        TokenKind::BangEqual => Value::Bool(l != r),
        TokenKind::Plus => match (l, r) {
            (Value::Number(l), Value::Number(r)) => Value::Number(l + r),
            (Value::Str(l), Value::Str(r)) => Value::from(format!("{}{}", l, r).as_str()),
            _ => {
                return Err(RuntimeError::new(
                    op.clone(),
                    RuntimeErrorKind::OperandsMustBeNumbersOrStrings,
                ))
            }
        },
        TokenKind::Minus
        | TokenKind::Star
        | TokenKind::Slash
        | TokenKind::Greater
        | TokenKind::GreaterEqual
        | TokenKind::Less
        | TokenKind::LessEqual => {
            let (l, r) = match (l, r) {
                (Value::Number(l), Value::Number(r)) => (l, r),
                _ => {
                    return Err(RuntimeError::new(
                        op.clone(),
                        RuntimeErrorKind::OperandsMustBeNumbers,
                    ))
                }
            };
            match op.kind {
                TokenKind::Minus => Value::Number(l - r),
                TokenKind::Star => Value::Number(l * r),
                // IEEE semantics: dividing by zero yields an infinity or NaN.
                TokenKind::Slash => Value::Number(l / r),
                TokenKind::Greater => Value::Bool(l > r),
                TokenKind::GreaterEqual => Value::Bool(l >= r),
                TokenKind::Less => Value::Bool(l < r),
                TokenKind::LessEqual => Value::Bool(l <= r),
                _ => return Err(invalid_operator(op)),
            }
        }
        _ => return Err(invalid_operator(op)),
    };
    Ok(res)
}

fn invalid_operator(op: &Token) -> RuntimeError {
    RuntimeError::new(
        op.clone(),
        RuntimeErrorKind::InvalidOperator(op.lexeme.clone()),
    )
}
