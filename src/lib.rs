//! Tree-walking interpreter for the Lox language.
//!
//! See [Crafting Interpreters](https://craftinginterpreters.com/).
//!
//! Source text goes through three stages: [`scan`] turns it into tokens, [`parse`] builds
//! statements while collecting every syntax error, and [`evaluate`] executes the statements
//! against an [`env::Environment`].  [`Interpreter`] chains the three over a session whose
//! bindings persist between inputs.
//!
//! # Examples
//!
//! See [`crate::interpreter::Interpreter`].
//!
//! # Limitations
//!
//! - No classes, closures or static resolution pass.
//! - Functions see the variables of their caller rather than those of their declaration site.
//! - Calls recurse on the native stack.  Evaluation stops with "Stack overflow." past
//!   [`eval::MAX_CALL_DEPTH`] nested calls; reaching that depth in unoptimized builds needs a
//!   thread with a large stack.

#![warn(rust_2018_idioms)]
#![warn(missing_debug_implementations)]

pub mod ast;
pub mod diag;
pub mod env;
pub mod eval;
pub mod interpreter;
pub mod natives;
pub mod parser;
pub mod printer;
pub mod scanner;
pub mod token;
pub mod value;

pub use interpreter::{evaluate, parse, scan, Interpreter, LoxError};
