//! Error types and error handling for the interpreter.
//!
//! This module defines the three error families raised while running a
//! program:
//!
//! - Syntax errors produced by the lexer and parser (fatal to parsing)
//! - Semantic errors collected by the type checker (never stop analysis)
//! - Runtime errors raised by the interpreter (fatal to the running program)
//!
//! All of them implement [`errors::Diagnostic`] so they can be rendered with
//! the same source excerpt formatter.

pub mod errors;

#[cfg(test)]
mod tests;
