//! Lox interpreter command-line.
//!
//! When called without argument it drops into an interactive read-evaluate-print loop.
//!
//! When called with arguments, it interprets the corresponding files in a single interpreter
//! session (so code and data sharing is possible).
//!
//! `treelox --ast FILE` prints the syntax tree of each statement of FILE instead of running it.
//!
//! Set `RUST_LOG` (e.g. `RUST_LOG=treelox=debug`) to trace the interpreter on stderr.

use std::env;
use std::fs;
use std::io;
use std::process::ExitCode;
use std::thread;

use anyhow::{self, Context};
use rustyline::error::ReadlineError;
use rustyline::DefaultEditor;

use treelox::interpreter::{Interpreter, LoxError};
use treelox::printer;

const EX_OK: u8 = 0;
const EX_USAGE: u8 = 64;
const EX_DATAERR: u8 = 65;
const EX_SOFTWARE: u8 = 70;
const EX_IOERR: u8 = 74;

// Lox calls recurse on the native stack; leave room for the deepest allowed call chain.
const STACK_SIZE: usize = 256 * 1024 * 1024;

fn main() -> Result<ExitCode, anyhow::Error> {
    init_tracing();

    let args = env::args().skip(1).collect::<Vec<_>>();
    let status = thread::Builder::new()
        .name("interpreter".to_string())
        .stack_size(STACK_SIZE)
        .spawn(move || dispatch(&args))
        .context("failed to start interpreter thread")?
        .join()
        .map_err(|_| anyhow::anyhow!("interpreter thread panicked"))??;
    Ok(ExitCode::from(status))
}

fn dispatch(args: &[String]) -> Result<u8, anyhow::Error> {
    match args {
        [] => {
            run_prompt()?;
            Ok(EX_OK)
        }
        [flag, path] if flag == "--ast" => Ok(print_ast(path)),
        [flag, ..] if flag.starts_with('-') => {
            eprintln!("usage: treelox [--ast FILE | FILE...]");
            Ok(EX_USAGE)
        }
        paths => Ok(run_all_files(paths)),
    }
}

/// Log to stderr, only when `RUST_LOG` is set.
fn init_tracing() {
    use tracing_subscriber::{fmt, prelude::*, EnvFilter};

    if env::var("RUST_LOG").is_ok() {
        tracing_subscriber::registry()
            .with(fmt::layer().with_writer(io::stderr).with_target(true))
            .with(EnvFilter::from_default_env())
            .init();
    }
}

fn read_source(path: &str) -> Result<String, anyhow::Error> {
    fs::read_to_string(path).with_context(|| format!("failed to read {}", path))
}

fn run_all_files(paths: &[String]) -> u8 {
    let mut interp_stdout = io::stdout();
    let mut interp = Interpreter::new(&mut interp_stdout);

    for p in paths {
        let source = match read_source(p) {
            Ok(source) => source,
            Err(e) => {
                eprintln!("{:#}", e);
                return EX_IOERR;
            }
        };
        if let Err(e) = interp.run(&source) {
            eprintln!("{}", e);
            return exit_status(&e);
        }
    }

    EX_OK
}

/// Exit status reporting `e` to the shell.
fn exit_status(e: &LoxError) -> u8 {
    match e {
        LoxError::Syntax(_) => EX_DATAERR,
        LoxError::Runtime(_) => EX_SOFTWARE,
    }
}

fn print_ast(path: &str) -> u8 {
    let source = match read_source(path) {
        Ok(source) => source,
        Err(e) => {
            eprintln!("{:#}", e);
            return EX_IOERR;
        }
    };
    let (prg, errors) = treelox::parse(treelox::scan(&source));
    for stmt in &prg {
        println!("{}", printer::stmt_sexpr(stmt));
    }
    if errors.is_empty() {
        EX_OK
    } else {
        let e = LoxError::Syntax(errors);
        eprintln!("{}", e);
        exit_status(&e)
    }
}

fn run_prompt() -> Result<(), anyhow::Error> {
    let mut editor = DefaultEditor::new().context("failed to start line editor")?;
    let mut interp_stdout = io::stdout();
    let mut interp = Interpreter::new(&mut interp_stdout);

    loop {
        let line = match editor.readline("> ") {
            Ok(line) => line,
            Err(ReadlineError::Interrupted | ReadlineError::Eof) => break,
            Err(e) => return Err(e.into()),
        };
        let input = line.trim();
        if input.is_empty() {
            continue;
        }
        if input == "quit" {
            break;
        }
        // History is best effort.
        let _ = editor.add_history_entry(input);

        if let Err(e) = interp.run(input) {
            eprintln!("{}", e);
        }
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn first_error(source: &str) -> LoxError {
        let mut out: Vec<u8> = Vec::new();
        let mut interp = Interpreter::new(&mut out);
        match interp.run(source) {
            Err(e) => e,
            Ok(()) => panic!("unexpected success for {:?}", source),
        }
    }

    #[test]
    fn syntax_errors_exit_with_data_error() {
        assert_eq!(exit_status(&first_error("print ;")), 65);
        assert_eq!(exit_status(&first_error("var x = @;")), 65);
    }

    #[test]
    fn runtime_errors_exit_with_software_error() {
        assert_eq!(exit_status(&first_error("print -nil;")), 70);
        assert_eq!(exit_status(&first_error("undefined();")), 70);
    }

    #[test]
    fn unreadable_file_is_an_io_error() {
        assert!(read_source("/nonexistent/treelox/input.lox").is_err());
        assert_eq!(print_ast("/nonexistent/treelox/input.lox"), EX_IOERR);
        assert_eq!(run_all_files(&["/nonexistent/treelox/input.lox".to_string()]), EX_IOERR);
    }

    #[test]
    fn flags_other_than_ast_are_usage_errors() -> Result<(), anyhow::Error> {
        let args = vec!["--bogus".to_string()];
        assert_eq!(dispatch(&args)?, EX_USAGE);
        Ok(())
    }
}
