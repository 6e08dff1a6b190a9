//! `rox`: a tree‑walking interpreter for Lox, extended with mixin classes,
//! getters, static methods, lambdas, `break` / `continue`, the `?:`
//! operator and a handful of file natives.
//!
//! Pipeline: [`scanner`] → [`parser`] → [`resolver`] → [`interpreter`].

pub mod ast;
pub mod ast_printer;
pub mod class;
pub mod environment;
pub mod error;
pub mod interpreter;
pub mod natives;
pub mod parser;
pub mod resolver;
pub mod scanner;
pub mod token;
pub mod value;
