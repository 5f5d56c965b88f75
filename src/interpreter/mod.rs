//! Tree-walking interpreter.
//!
//! Executes a program that passed semantic analysis, using the annotations
//! for the few decisions that depend on static types: converting Ints
//! stored into Float slots, string concatenation, and telling methods
//! apart from attributes.

pub mod environment;
pub mod expr;
pub mod interpreter;
pub mod stdlib;
pub mod stmt;
pub mod value;
