use std::fmt::Display;

use crate::Span;

use super::ast::{Expr, NodeId};

// LITERALS

/// Integer Expression
#[derive(Debug, Clone)]
pub struct IntExpr {
    pub id: NodeId,
    pub value: i64,
    pub span: Span,
}

/// Float Expression
#[derive(Debug, Clone)]
pub struct FloatExpr {
    pub id: NodeId,
    pub value: f64,
    pub span: Span,
}

/// String Expression
/// Represents a string literal, escapes already processed by the lexer.
#[derive(Debug, Clone)]
pub struct StringExpr {
    pub id: NodeId,
    pub value: String,
    pub span: Span,
}

#[derive(Debug, Clone)]
pub struct BoolExpr {
    pub id: NodeId,
    pub value: bool,
    pub span: Span,
}

#[derive(Debug, Clone)]
pub struct NullExpr {
    pub id: NodeId,
    pub span: Span,
}

/// Symbol Expression
/// Represents an identifier in the AST. This includes functions and type names.
#[derive(Debug, Clone)]
pub struct SymbolExpr {
    pub id: NodeId,
    pub value: String,
    pub span: Span,
}

/// Array literal, `[a, b, c]`.
#[derive(Debug, Clone)]
pub struct ArrayExpr {
    pub id: NodeId,
    pub elements: Vec<Expr>,
    pub span: Span,
}

#[derive(Debug, Clone)]
pub struct ParenExpr {
    pub id: NodeId,
    pub inner: Box<Expr>,
    pub span: Span,
}

// OPERATORS

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PrefixOperator {
    Not,
    Negate,
}

impl Display for PrefixOperator {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            PrefixOperator::Not => write!(f, "!"),
            PrefixOperator::Negate => write!(f, "-"),
        }
    }
}

/// Prefix Expression
/// Represents a prefix operation in the AST, e.g. `!x` or `-x`.
#[derive(Debug, Clone)]
pub struct PrefixExpr {
    pub id: NodeId,
    pub operator: PrefixOperator,
    pub right_expr: Box<Expr>,
    pub span: Span,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BinaryOperator {
    Add,
    Subtract,
    Multiply,
    Divide,
    Remainder,
    Equal,
    NotEqual,
    Less,
    LessEqual,
    Greater,
    GreaterEqual,
    And,
    Or,
}

impl BinaryOperator {
    pub fn is_arithmetic(&self) -> bool {
        matches!(
            self,
            BinaryOperator::Add
                | BinaryOperator::Subtract
                | BinaryOperator::Multiply
                | BinaryOperator::Divide
                | BinaryOperator::Remainder
        )
    }

    pub fn is_relational(&self) -> bool {
        matches!(
            self,
            BinaryOperator::Less
                | BinaryOperator::LessEqual
                | BinaryOperator::Greater
                | BinaryOperator::GreaterEqual
        )
    }

    pub fn is_equality(&self) -> bool {
        matches!(self, BinaryOperator::Equal | BinaryOperator::NotEqual)
    }

    pub fn is_logical(&self) -> bool {
        matches!(self, BinaryOperator::And | BinaryOperator::Or)
    }

    /// Verb used in diagnostics: "Trying to <verb> Int with Bool".
    pub fn verb(&self) -> &'static str {
        match self {
            BinaryOperator::Add => "add",
            BinaryOperator::Subtract => "subtract",
            BinaryOperator::Multiply => "multiply",
            BinaryOperator::Divide => "divide",
            BinaryOperator::Remainder => "remainder",
            BinaryOperator::Equal | BinaryOperator::NotEqual => "compare",
            BinaryOperator::Less
            | BinaryOperator::LessEqual
            | BinaryOperator::Greater
            | BinaryOperator::GreaterEqual => "compare",
            BinaryOperator::And | BinaryOperator::Or => "combine",
        }
    }
}

impl Display for BinaryOperator {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let symbol = match self {
            BinaryOperator::Add => "+",
            BinaryOperator::Subtract => "-",
            BinaryOperator::Multiply => "*",
            BinaryOperator::Divide => "/",
            BinaryOperator::Remainder => "%",
            BinaryOperator::Equal => "==",
            BinaryOperator::NotEqual => "!=",
            BinaryOperator::Less => "<",
            BinaryOperator::LessEqual => "<=",
            BinaryOperator::Greater => ">",
            BinaryOperator::GreaterEqual => ">=",
            BinaryOperator::And => "&&",
            BinaryOperator::Or => "||",
        };
        write!(f, "{}", symbol)
    }
}

/// Binary Expression
/// Represents a binary operation in the AST.
#[derive(Debug, Clone)]
pub struct BinaryExpr {
    pub id: NodeId,
    pub left: Box<Expr>,
    pub operator: BinaryOperator,
    pub right: Box<Expr>,
    pub span: Span,
}

/// Assignment Expression
/// `assignee = value`, evaluates to the assigned value.
#[derive(Debug, Clone)]
pub struct AssignmentExpr {
    pub id: NodeId,
    pub assignee: Box<Expr>,
    pub value: Box<Expr>,
    pub span: Span,
}

// ACCESS AND CALLS

/// Call Expression
/// Represents a function, method or constructor call in the AST.
#[derive(Debug, Clone)]
pub struct CallExpr {
    pub id: NodeId,
    pub callee: Box<Expr>,
    pub arguments: Vec<Expr>,
    pub span: Span,
}

/// `array[index]`
#[derive(Debug, Clone)]
pub struct IndexExpr {
    pub id: NodeId,
    pub array: Box<Expr>,
    pub index: Box<Expr>,
    pub span: Span,
}

/// `receiver.field`, struct fields and the `length` of arrays.
#[derive(Debug, Clone)]
pub struct FieldAccessExpr {
    pub id: NodeId,
    pub receiver: Box<Expr>,
    pub field: String,
    pub span: Span,
}

/// `receiver#member`, box attributes and methods.
#[derive(Debug, Clone)]
pub struct BoxAccessExpr {
    pub id: NodeId,
    pub receiver: Box<Expr>,
    pub member: String,
    pub span: Span,
}

/// `$Name`, the positional constructor of a struct. Called like a function.
#[derive(Debug, Clone)]
pub struct ConstructorExpr {
    pub id: NodeId,
    pub name: String,
    pub span: Span,
}

/// `create Name()`
#[derive(Debug, Clone)]
pub struct CreateExpr {
    pub id: NodeId,
    pub name: String,
    pub span: Span,
}
