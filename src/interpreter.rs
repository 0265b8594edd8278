//! API to control the interpreter.

use std::io::prelude::*;

use thiserror::Error;
use tracing::debug;

use crate::ast::Stmt;
use crate::diag::{Report, SyntaxError};
use crate::env::Environment;
use crate::eval::{Evaluator, RuntimeError};
use crate::parser::Parser;
use crate::scanner::Scanner;
use crate::token::Token;

/// Turn `source` into a lazy sequence of tokens terminated by `Eof`.
pub fn scan(source: &str) -> Scanner<'_> {
    Scanner::new(source)
}

/// Parse a token sequence.  Returns every statement that parsed together with every lexical
/// and syntax error found.
pub fn parse<T: IntoIterator<Item = Token>>(tokens: T) -> (Vec<Stmt>, Vec<SyntaxError>) {
    Parser::new(tokens).parse_program()
}

/// Execute `stmts` against `env`, writing `print` output to `output`.  Stops at the first
/// runtime error; effects of the statements before it are kept.
pub fn evaluate<W: Write>(
    stmts: &[Stmt],
    env: &mut Environment,
    output: &mut W,
) -> Result<(), RuntimeError> {
    Evaluator::new(output, env).execute_all(stmts)
}

/// Tree-walk interpreter.
///
/// # Example
///
/// Invoke the interpreter a first time to define a function then additional times to call this
/// function:
///
/// ```
/// # use treelox::interpreter::{Interpreter, LoxError};
///
/// let mut output: Vec<u8> = Vec::new();
/// let mut interp = Interpreter::new(&mut output);
///
/// let func_def = r#"
///     fun max(x, y) {
///         if (x > y) {
///             return x;
///         } else {
///             return y;
///         }
///     }
/// "#;
/// interp.run(func_def)?;
///
/// interp.run("print max(10, 20);")?;
/// interp.run("print max(5, 4);")?;
///
/// assert_eq!(output, b"20\n5\n");
/// # Ok::<(), LoxError>(())
/// ```
#[derive(Debug)]
pub struct Interpreter<'t, W: Write> {
    output: &'t mut W,
    env: Environment,
}

/// Errors the interpreter can raise.
#[derive(Debug, Error)]
pub enum LoxError {
    /// Errors found during lexical or syntactic analysis.  Nothing was executed.
    #[error("{}", display_all(.0))]
    Syntax(Vec<SyntaxError>),

    /// Error occurring during evaluation.
    #[error(transparent)]
    Runtime(#[from] RuntimeError),
}

impl LoxError {
    /// One report per underlying error, in source order.
    pub fn reports(&self) -> Vec<Report> {
        match self {
            LoxError::Syntax(errors) => errors.iter().map(Report::from).collect(),
            LoxError::Runtime(e) => vec![Report::new(&e.token, &e.kind.to_string())],
        }
    }
}

fn display_all(errors: &[SyntaxError]) -> String {
    errors
        .iter()
        .map(|e| e.to_string())
        .collect::<Vec<_>>()
        .join("\n")
}

impl<'t, W: Write> Interpreter<'t, W> {
    pub fn new(output: &'t mut W) -> Interpreter<'t, W> {
        Interpreter {
            output,
            env: Environment::global(),
        }
    }

    /// Scan, parse and evaluate `source` in this session.  Nothing is evaluated if there are
    /// syntax errors.  Bindings survive across calls.
    pub fn run(&mut self, source: &str) -> Result<(), LoxError> {
        let (prg, errors) = parse(scan(source));
        debug!(
            statements = prg.len(),
            errors = errors.len(),
            "parsed input"
        );
        if !errors.is_empty() {
            return Err(LoxError::Syntax(errors));
        }
        evaluate(&prg, &mut self.env, &mut *self.output)?;
        Ok(())
    }

    pub fn environment(&self) -> &Environment {
        &self.env
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::eval::RuntimeErrorKind;
    use crate::token::TokenKind;
    use crate::value::Value;
    use pretty_assertions::assert_eq;

    fn interpret(input: &str) -> Result<String, LoxError> {
        let mut raw_output: Vec<u8> = Vec::new();
        let mut interp = Interpreter::new(&mut raw_output);
        interp.run(input)?;
        let output = String::from_utf8(raw_output).expect("cannot convert output to string");
        Ok(output)
    }

    #[test]
    fn scan_ends_with_single_eof() {
        let kinds = scan("print 1;")
            .map(|t| t.kind)
            .collect::<Vec<_>>();
        assert_eq!(
            kinds,
            vec![
                TokenKind::Print,
                TokenKind::Number,
                TokenKind::Semicolon,
                TokenKind::Eof
            ]
        );
    }

    #[test]
    fn pipeline_functions_compose() -> Result<(), RuntimeError> {
        let mut env = Environment::global();
        let mut out: Vec<u8> = Vec::new();
        let (prg, errors) = parse(scan("var a = 1;"));
        assert!(errors.is_empty());
        evaluate(&prg, &mut env, &mut out)?;
        let (prg, _) = parse(scan("print a + 1;"));
        evaluate(&prg, &mut env, &mut out)?;
        assert_eq!(out, b"2\n");
        Ok(())
    }

    #[test]
    fn print_expr() -> Result<(), LoxError> {
        assert_eq!(interpret("print 3*2;")?, "6\n");
        Ok(())
    }

    #[test]
    fn init_set_get_var() -> Result<(), LoxError> {
        assert_eq!(interpret("var foo=42; foo=24; print foo;")?, "24\n");
        Ok(())
    }

    #[test]
    fn shadowing_does_not_leak_out_of_blocks() -> Result<(), LoxError> {
        let mut raw_output: Vec<u8> = Vec::new();
        let mut interp = Interpreter::new(&mut raw_output);
        interp.run("var x = 1; { var x = 2; x = x + 1; print x; }")?;
        assert_eq!(interp.environment().lookup("x"), Some(&Value::Number(1.0)));
        interp.run("{ x = x + 1; } print x;")?;
        assert_eq!(raw_output, b"3\n2\n");
        Ok(())
    }

    #[test]
    fn declare_and_call_fn_with_local_var() -> Result<(), LoxError> {
        let prg = r#"
            var v = 24;
            fun f() {
                var v = 42;
                print v;
            }
            f();
            print v;
        "#;
        assert_eq!(interpret(prg)?, "42\n24\n");
        Ok(())
    }

    #[test]
    fn declare_and_call_fn_with_return_stmts() -> Result<(), LoxError> {
        let prg = r#"
            fun max(x, y) {
                if (x > y) {
                    return x;
                } else {
                    return y;
                }
                print 666; // can't happen
            }
            print max(10, 20);
        "#;
        assert_eq!(interpret(prg)?, "20\n");
        Ok(())
    }

    #[test]
    fn string_program() -> Result<(), LoxError> {
        let prg = r#"
            var greeting = "Hello";
            fun greet(who) {
                return greeting + ", " + who + "!";
            }
            print greet("world");
        "#;
        assert_eq!(interpret(prg)?, "Hello, world!\n");
        Ok(())
    }

    #[test]
    fn syntax_errors_prevent_evaluation() {
        let mut raw_output: Vec<u8> = Vec::new();
        let mut interp = Interpreter::new(&mut raw_output);
        match interp.run("print 1; print ;\nvar x = ;") {
            Err(e @ LoxError::Syntax(_)) => {
                assert_eq!(
                    e.to_string(),
                    "[line 1] Error at ';': Expect expression.\n\
                     [line 2] Error at ';': Expect expression."
                );
                assert_eq!(e.reports().len(), 2);
            }
            r => panic!("unexpected output: {:?}", r),
        }
        assert!(raw_output.is_empty());
    }

    #[test]
    fn runtime_error_keeps_earlier_bindings() {
        let mut raw_output: Vec<u8> = Vec::new();
        let mut interp = Interpreter::new(&mut raw_output);
        match interp.run("var a = 1;\nprint a + nil;") {
            Err(LoxError::Runtime(RuntimeError {
                kind: RuntimeErrorKind::OperandsMustBeNumbersOrStrings,
                token,
            })) => assert_eq!(token.line, 2),
            r => panic!("unexpected output: {:?}", r),
        }
        assert_eq!(interp.environment().lookup("a"), Some(&Value::Number(1.0)));
    }

    #[test]
    fn session_survives_errors() -> Result<(), LoxError> {
        let mut raw_output: Vec<u8> = Vec::new();
        let mut interp = Interpreter::new(&mut raw_output);
        interp.run("var count = 1;")?;
        assert!(interp.run("count = count + undefined;").is_err());
        assert!(interp.run("count = ;").is_err());
        interp.run("count = count + 1; print count;")?;
        assert_eq!(raw_output, b"2\n");
        Ok(())
    }

    #[test]
    fn runtime_error_report() {
        match interpret("fun f(a, b) {}\nf(1);") {
            Err(e @ LoxError::Runtime(_)) => assert_eq!(
                e.reports(),
                vec![Report {
                    line: 2,
                    location: "at ')'".to_string(),
                    message: "Expected 2 arguments but got 1.".to_string(),
                }]
            ),
            r => panic!("unexpected output: {:?}", r),
        }
    }

    #[test]
    fn counter_loop_with_natives() -> Result<(), LoxError> {
        let prg = r#"
            var start = clock();
            var total = 0;
            for (var i = 1; i <= 4; i = i + 1) {
                total = total + sqrt(i * i);
            }
            print total;
            print clock() >= start;
        "#;
        assert_eq!(interpret(prg)?, "10\ntrue\n");
        Ok(())
    }

    #[test]
    fn session_survives_stack_overflow() {
        let run = || -> Result<String, LoxError> {
            let mut raw_output: Vec<u8> = Vec::new();
            let mut interp = Interpreter::new(&mut raw_output);
            interp.run("var calls = 0; fun f() { calls = calls + 1; return f(); }")?;
            match interp.run("f();") {
                Err(LoxError::Runtime(RuntimeError {
                    kind: RuntimeErrorKind::StackOverflow,
                    ..
                })) => (),
                r => panic!("unexpected output: {:?}", r),
            }
            interp.run("print calls;")?;
            Ok(String::from_utf8(raw_output).expect("cannot convert output to string"))
        };
        let output = std::thread::Builder::new()
            .stack_size(64 * 1024 * 1024)
            .spawn(move || run().map_err(|e| e.to_string()))
            .expect("cannot spawn test thread")
            .join()
            .expect("test thread panicked");
        assert_eq!(output, Ok(format!("{}\n", crate::eval::MAX_CALL_DEPTH)));
    }
}
