use std::fmt::Display;

use thiserror::Error;

use crate::{Position, Span};

/// Common interface of every error family, used by [`crate::render_error`].
pub trait Diagnostic {
    fn get_error_name(&self) -> &str;
    fn get_tip(&self) -> ErrorTip;
    fn get_position(&self) -> &Position;
}

pub enum ErrorTip {
    None,
    Suggestion(String),
}

impl Display for ErrorTip {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ErrorTip::None => write!(f, ""),
            ErrorTip::Suggestion(suggestion) => write!(f, "{}", suggestion),
        }
    }
}

// SYNTAX

#[derive(Debug, Clone)]
pub struct Error {
    internal_error: ErrorImpl,
    position: Position,
}

impl Error {
    pub fn new(error_impl: ErrorImpl, position: Position) -> Self {
        Error {
            internal_error: error_impl,
            position,
        }
    }

    pub fn kind(&self) -> &ErrorImpl {
        &self.internal_error
    }
}

impl Diagnostic for Error {
    fn get_position(&self) -> &Position {
        &self.position
    }

    fn get_error_name(&self) -> &str {
        match &self.internal_error {
            ErrorImpl::UnrecognisedToken { .. } => "UnrecognisedToken",
            ErrorImpl::UnexpectedToken { .. } => "UnexpectedToken",
            ErrorImpl::UnexpectedTokenDetailed { .. } => "UnexpectedTokenDetailed",
            ErrorImpl::NumberParseError { .. } => "NumberParseError",
        }
    }

    fn get_tip(&self) -> ErrorTip {
        match &self.internal_error {
            ErrorImpl::UnrecognisedToken { .. } => ErrorTip::None,
            ErrorImpl::UnexpectedToken { token } => {
                ErrorTip::Suggestion(format!("Unexpected token: `{}`", token))
            }
            ErrorImpl::UnexpectedTokenDetailed { token, message } => {
                ErrorTip::Suggestion(format!("Unexpected token: `{}`, {}", token, message))
            }
            ErrorImpl::NumberParseError { token } => ErrorTip::Suggestion(format!(
                "Invalid number: `{}`, is it above the integer limit?",
                token
            )),
        }
    }
}

impl Display for Error {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.internal_error)
    }
}

impl std::error::Error for Error {}

#[derive(Error, Debug, Clone, PartialEq)]
pub enum ErrorImpl {
    #[error("unrecognised token: {token:?}")]
    UnrecognisedToken { token: String },
    #[error("unexpected token: {token:?}")]
    UnexpectedToken { token: String },
    #[error("unexpected token ({message}): {token:?}")]
    UnexpectedTokenDetailed { token: String, message: String },
    #[error("error parsing number: {token:?}")]
    NumberParseError { token: String },
}

// SEMANTIC

/// An error found by the type checker. These are collected, never thrown.
#[derive(Debug, Clone, PartialEq)]
pub struct SemanticError {
    kind: SemanticErrorKind,
    span: Span,
}

impl SemanticError {
    pub fn new(kind: SemanticErrorKind, span: Span) -> Self {
        SemanticError { kind, span }
    }

    pub fn kind(&self) -> &SemanticErrorKind {
        &self.kind
    }

    pub fn span(&self) -> &Span {
        &self.span
    }

    pub fn message(&self) -> String {
        self.kind.to_string()
    }
}

impl Diagnostic for SemanticError {
    fn get_position(&self) -> &Position {
        &self.span.start
    }

    fn get_error_name(&self) -> &str {
        match &self.kind {
            SemanticErrorKind::DuplicateDeclaration { .. } => "DuplicateDeclaration",
            SemanticErrorKind::UnresolvedReference { .. } => "UnresolvedReference",
            SemanticErrorKind::UsedBeforeDeclaration { .. } => "UsedBeforeDeclaration",
            SemanticErrorKind::TypeMismatch { .. } => "TypeMismatch",
            SemanticErrorKind::IncomparableTypes { .. } => "IncomparableTypes",
            SemanticErrorKind::InvalidLvalue => "InvalidLvalue",
            SemanticErrorKind::MissingReturn { .. } => "MissingReturn",
            SemanticErrorKind::WrongAccessOperator { .. } => "WrongAccessOperator",
        }
    }

    fn get_tip(&self) -> ErrorTip {
        match &self.kind {
            SemanticErrorKind::WrongAccessOperator { access: MemberAccess::Field, member, .. } => {
                ErrorTip::Suggestion(format!("box members are accessed with `#`, try `#{}`", member))
            }
            SemanticErrorKind::WrongAccessOperator { access: MemberAccess::BoxMember, member, .. } => {
                ErrorTip::Suggestion(format!("`#` only applies to boxes, try `.{}`", member))
            }
            SemanticErrorKind::UsedBeforeDeclaration { name } => {
                ErrorTip::Suggestion(format!("move the declaration of `{}` before its use", name))
            }
            kind => ErrorTip::Suggestion(kind.to_string()),
        }
    }
}

impl Display for SemanticError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.kind)
    }
}

impl std::error::Error for SemanticError {}

#[derive(Error, Debug, Clone, PartialEq)]
pub enum SemanticErrorKind {
    #[error("Declaration of `{name}` conflicts with an earlier declaration in the same scope")]
    DuplicateDeclaration { name: String },
    #[error("Could not resolve: {what}")]
    UnresolvedReference { what: String },
    #[error("Variable used before declaration: {name}")]
    UsedBeforeDeclaration { name: String },
    #[error("{message}")]
    TypeMismatch { message: String },
    #[error("Trying to compare incomparable types {left} and {right}")]
    IncomparableTypes { left: String, right: String },
    #[error("Trying to assign a value to a non-compatible lvalue.")]
    InvalidLvalue,
    #[error("Missing return in function `{function}`")]
    MissingReturn { function: String },
    #[error("Trying to access a {access} on an expression of type {ty}")]
    WrongAccessOperator { member: String, ty: String, access: MemberAccess },
}

/// The access operator used on a member: `.` for fields, `#` for box members.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MemberAccess {
    Field,
    BoxMember,
}

impl Display for MemberAccess {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            MemberAccess::Field => write!(f, "field"),
            MemberAccess::BoxMember => write!(f, "box member"),
        }
    }
}

impl SemanticErrorKind {
    pub fn mismatch(message: impl Into<String>) -> Self {
        SemanticErrorKind::TypeMismatch {
            message: message.into(),
        }
    }
}

// RUNTIME

/// An error raised while executing a program. Terminates interpretation.
#[derive(Debug, Clone, PartialEq)]
pub struct RuntimeError {
    kind: RuntimeErrorKind,
    span: Span,
}

impl RuntimeError {
    pub fn new(kind: RuntimeErrorKind, span: Span) -> Self {
        RuntimeError { kind, span }
    }

    pub fn internal(message: impl Into<String>, span: Span) -> Self {
        RuntimeError::new(RuntimeErrorKind::Internal(message.into()), span)
    }

    pub fn kind(&self) -> &RuntimeErrorKind {
        &self.kind
    }

    pub fn span(&self) -> &Span {
        &self.span
    }
}

impl Diagnostic for RuntimeError {
    fn get_position(&self) -> &Position {
        &self.span.start
    }

    fn get_error_name(&self) -> &str {
        match &self.kind {
            RuntimeErrorKind::NullReference { .. } => "NullReference",
            RuntimeErrorKind::IndexOutOfBounds { .. } => "IndexOutOfBounds",
            RuntimeErrorKind::DivisionByZero => "DivisionByZero",
            RuntimeErrorKind::UninitialisedVariable { .. } => "UninitialisedVariable",
            RuntimeErrorKind::Internal(_) => "InterpreterError",
        }
    }

    fn get_tip(&self) -> ErrorTip {
        match &self.kind {
            RuntimeErrorKind::Internal(_) => ErrorTip::Suggestion(format!(
                "{} (this should have been rejected by the type checker)",
                self.kind
            )),
            kind => ErrorTip::Suggestion(kind.to_string()),
        }
    }
}

impl Display for RuntimeError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.kind)
    }
}

impl std::error::Error for RuntimeError {}

#[derive(Error, Debug, Clone, PartialEq)]
pub enum RuntimeErrorKind {
    #[error("null reference while {action}")]
    NullReference { action: String },
    #[error("index {index} out of bounds for array of length {length}")]
    IndexOutOfBounds { index: i64, length: usize },
    #[error("division by zero")]
    DivisionByZero,
    #[error("variable `{name}` used before its declaration was executed")]
    UninitialisedVariable { name: String },
    #[error("interpreter invariant violated: {0}")]
    Internal(String),
}

// PIPELINE

/// Any failure of the whole source-to-value pipeline.
#[derive(Error, Debug, Clone)]
pub enum ProgramError {
    #[error("syntax error: {0}")]
    Syntax(#[from] Error),
    #[error("{} semantic error(s)", .0.len())]
    Semantic(Vec<SemanticError>),
    #[error("runtime error: {0}")]
    Runtime(#[from] RuntimeError),
}

impl ProgramError {
    /// Every diagnostic carried by this error, in source order.
    pub fn diagnostics(&self) -> Vec<&dyn Diagnostic> {
        match self {
            ProgramError::Syntax(error) => vec![error as &dyn Diagnostic],
            ProgramError::Semantic(errors) => {
                errors.iter().map(|e| e as &dyn Diagnostic).collect()
            }
            ProgramError::Runtime(error) => vec![error as &dyn Diagnostic],
        }
    }
}
