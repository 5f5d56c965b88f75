//! Unit tests for error handling.
//!
//! This module contains tests for error types and error reporting.

use crate::errors::errors::{
    Diagnostic, Error, ErrorImpl, ErrorTip, MemberAccess, ProgramError, RuntimeError, RuntimeErrorKind,
    SemanticError, SemanticErrorKind,
};
use crate::{Position, Span};
use std::rc::Rc;

fn span_at(start: u32, end: u32) -> Span {
    let file = Rc::new("test.sigh".to_string());
    Span {
        start: Position(start, file.clone()),
        end: Position(end, file),
    }
}

#[test]
fn test_error_creation() {
    let error = Error::new(
        ErrorImpl::UnrecognisedToken {
            token: "@".to_string(),
        },
        Position(10, Rc::new("test.sigh".to_string())),
    );

    assert_eq!(error.get_error_name(), "UnrecognisedToken");
    assert!(matches!(error.get_tip(), ErrorTip::None));
}

#[test]
fn test_error_position() {
    let pos = Position(42, Rc::new("test.sigh".to_string()));
    let error = Error::new(
        ErrorImpl::UnexpectedToken {
            token: "identifier".to_string(),
        },
        pos.clone(),
    );

    assert_eq!(error.get_position().0, 42);
    assert_eq!(error.get_tip().to_string(), "Unexpected token: `identifier`");
}

#[test]
fn test_number_parse_error_tip() {
    let error = Error::new(
        ErrorImpl::NumberParseError {
            token: "99999999999999999999".to_string(),
        },
        Position(0, Rc::new("test.sigh".to_string())),
    );

    assert_eq!(error.get_error_name(), "NumberParseError");
    assert!(error.get_tip().to_string().contains("above the integer limit"));
}

#[test]
fn test_semantic_error_messages() {
    let error = SemanticError::new(
        SemanticErrorKind::UnresolvedReference {
            what: "Car#fly".to_string(),
        },
        span_at(3, 10),
    );
    assert_eq!(error.message(), "Could not resolve: Car#fly");
    assert_eq!(error.get_error_name(), "UnresolvedReference");
    assert_eq!(error.get_position().0, 3);

    let error = SemanticError::new(
        SemanticErrorKind::IncomparableTypes {
            left: "Bool".to_string(),
            right: "Int".to_string(),
        },
        span_at(0, 9),
    );
    assert_eq!(error.message(), "Trying to compare incomparable types Bool and Int");

    let error = SemanticError::new(SemanticErrorKind::InvalidLvalue, span_at(0, 5));
    assert_eq!(error.message(), "Trying to assign a value to a non-compatible lvalue.");
}

#[test]
fn test_wrong_access_operator_suggests_the_other_one() {
    let error = SemanticError::new(
        SemanticErrorKind::WrongAccessOperator {
            member: "v".to_string(),
            ty: "BadBox".to_string(),
            access: MemberAccess::Field,
        },
        span_at(0, 3),
    );
    assert_eq!(error.message(), "Trying to access a field on an expression of type BadBox");
    assert_eq!(error.get_tip().to_string(), "box members are accessed with `#`, try `#v`");

    let error = SemanticError::new(
        SemanticErrorKind::WrongAccessOperator {
            member: "x".to_string(),
            ty: "P".to_string(),
            access: MemberAccess::BoxMember,
        },
        span_at(0, 3),
    );
    assert_eq!(error.message(), "Trying to access a box member on an expression of type P");
    assert_eq!(error.get_tip().to_string(), "`#` only applies to boxes, try `.x`");
}

#[test]
fn test_runtime_error_names() {
    let error = RuntimeError::new(RuntimeErrorKind::DivisionByZero, span_at(0, 5));
    assert_eq!(error.get_error_name(), "DivisionByZero");
    assert_eq!(error.to_string(), "division by zero");

    let error = RuntimeError::new(
        RuntimeErrorKind::IndexOutOfBounds { index: 3, length: 1 },
        span_at(0, 4),
    );
    assert_eq!(error.to_string(), "index 3 out of bounds for array of length 1");

    let error = RuntimeError::new(
        RuntimeErrorKind::UninitialisedVariable { name: "x".to_string() },
        span_at(0, 1),
    );
    assert_eq!(error.get_error_name(), "UninitialisedVariable");
    assert_eq!(error.to_string(), "variable `x` used before its declaration was executed");

    let error = RuntimeError::internal("undefined name `x`", span_at(0, 1));
    assert_eq!(error.get_error_name(), "InterpreterError");
    assert!(error.get_tip().to_string().contains("rejected by the type checker"));
}

#[test]
fn test_program_error_diagnostics() {
    let errors = vec![
        SemanticError::new(SemanticErrorKind::InvalidLvalue, span_at(0, 1)),
        SemanticError::new(SemanticErrorKind::mismatch("Trying to negate type: Int"), span_at(4, 6)),
    ];
    let error = ProgramError::Semantic(errors);

    assert_eq!(error.to_string(), "2 semantic error(s)");
    let diagnostics = error.diagnostics();
    let names: Vec<&str> = diagnostics.iter().map(|d| d.get_error_name()).collect();
    assert_eq!(names, ["InvalidLvalue", "TypeMismatch"]);

    let error = ProgramError::from(RuntimeError::new(RuntimeErrorKind::DivisionByZero, span_at(0, 1)));
    assert_eq!(error.to_string(), "runtime error: division by zero");
}
