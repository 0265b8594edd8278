//! Render syntax trees as text.
//!
//! [`sexpr`] and [`stmt_sexpr`] produce a fully parenthesized prefix notation meant for humans
//! debugging the parser.  [`source`] produces Lox source text that parses back into the same
//! expression.

use crate::ast::{Expr, LiteralValue, Stmt};

pub fn sexpr(expr: &Expr) -> String {
    match expr {
        Expr::Literal(lit) => literal(lit),
        Expr::Grouping(e) => parenthesize("group", &[&**e]),
        Expr::Unary(op, e) => parenthesize(&op.lexeme, &[&**e]),
        Expr::Binary(l, op, r) | Expr::Logical(l, op, r) => {
            parenthesize(&op.lexeme, &[&**l, &**r])
        }
        Expr::Variable(name) => name.lexeme.clone(),
        Expr::Assign(name, value) => format!("(= {} {})", name.lexeme, sexpr(value)),
        Expr::Call(callee, _, args) => {
            let mut out = format!("(call {}", sexpr(callee));
            for arg in args {
                out.push(' ');
                out.push_str(&sexpr(arg));
            }
            out.push(')');
            out
        }
    }
}

pub fn stmt_sexpr(stmt: &Stmt) -> String {
    match stmt {
        Stmt::Expression(e) => format!("(; {})", sexpr(e)),
        Stmt::Print(_, e) => format!("(print {})", sexpr(e)),
        Stmt::Var(name, init) => format!("(var {} {})", name.lexeme, sexpr(init)),
        Stmt::Block(stmts) => {
            let mut out = "(block".to_string();
            for s in stmts {
                out.push(' ');
                out.push_str(&stmt_sexpr(s));
            }
            out.push(')');
            out
        }
        Stmt::If(cond, then_branch, else_branch) => {
            let mut out = format!("(if {} {}", sexpr(cond), stmt_sexpr(then_branch));
            if let Some(else_branch) = else_branch {
                out.push(' ');
                out.push_str(&stmt_sexpr(else_branch));
            }
            out.push(')');
            out
        }
        Stmt::While(cond, body) => format!("(while {} {})", sexpr(cond), stmt_sexpr(body)),
        Stmt::Function(decl) => {
            let params = decl
                .params
                .iter()
                .map(|p| p.lexeme.as_str())
                .collect::<Vec<_>>()
                .join(" ");
            let mut out = format!("(fun {} ({})", decl.name.lexeme, params);
            for s in &decl.body {
                out.push(' ');
                out.push_str(&stmt_sexpr(s));
            }
            out.push(')');
            out
        }
        Stmt::Return(_, e) => format!("(return {})", sexpr(e)),
    }
}

/// Lox source for `expr`.  Operator spacing is normalized; grouping parentheses are kept.
pub fn source(expr: &Expr) -> String {
    let mut out = String::new();
    write_source(&mut out, expr);
    out
}

fn write_source(out: &mut String, expr: &Expr) {
    match expr {
        Expr::Literal(lit) => out.push_str(&literal_source(lit)),
        Expr::Grouping(e) => {
            out.push('(');
            write_source(out, e);
            out.push(')');
        }
        Expr::Unary(op, e) => {
            out.push_str(&op.lexeme);
            // `- -a` rather than `--a`.
            if matches!(**e, Expr::Unary(..)) {
                out.push(' ');
            }
            write_source(out, e);
        }
        Expr::Binary(l, op, r) | Expr::Logical(l, op, r) => {
            write_source(out, l);
            out.push(' ');
            out.push_str(&op.lexeme);
            out.push(' ');
            write_source(out, r);
        }
        Expr::Variable(name) => out.push_str(&name.lexeme),
        Expr::Assign(name, value) => {
            out.push_str(&name.lexeme);
            out.push_str(" = ");
            write_source(out, value);
        }
        Expr::Call(callee, _, args) => {
            write_source(out, callee);
            out.push('(');
            for (i, arg) in args.iter().enumerate() {
                if i > 0 {
                    out.push_str(", ");
                }
                write_source(out, arg);
            }
            out.push(')');
        }
    }
}

fn literal(lit: &LiteralValue) -> String {
    match lit {
        LiteralValue::Nil => "nil".to_string(),
        LiteralValue::Bool(b) => b.to_string(),
        LiteralValue::Number(n) => n.to_string(),
        LiteralValue::Str(s) => s.clone(),
    }
}

fn literal_source(lit: &LiteralValue) -> String {
    match lit {
        LiteralValue::Str(s) => format!("\"{}\"", s),
        // `Display` for floats never uses an exponent, so numbers scan back unchanged.
        lit => literal(lit),
    }
}

fn parenthesize(name: &str, exprs: &[&Expr]) -> String {
    let mut out = format!("({}", name);
    for e in exprs {
        out.push(' ');
        out.push_str(&sexpr(e));
    }
    out.push(')');
    out
}
