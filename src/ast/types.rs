use crate::Span;

use super::ast::{NodeId, TypeNode};

/// Symbol Type
/// A named type: a builtin (`Int`, `String`, ...) or a struct/box name.
#[derive(Debug, Clone)]
pub struct SymbolType {
    pub id: NodeId,
    pub name: String,
    pub span: Span,
}

/// Array Type
/// `T[]`
#[derive(Debug, Clone)]
pub struct ArrayType {
    pub id: NodeId,
    pub underlying: Box<TypeNode>,
    pub span: Span,
}
