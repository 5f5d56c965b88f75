use std::fmt::Display;

use crate::Span;

use super::{
    expressions::{
        ArrayExpr, AssignmentExpr, BinaryExpr, BoolExpr, BoxAccessExpr, CallExpr, ConstructorExpr,
        CreateExpr, FieldAccessExpr, FloatExpr, IndexExpr, IntExpr, NullExpr, ParenExpr,
        PrefixExpr, StringExpr, SymbolExpr,
    },
    statements::{
        BlockStmt, BoxDeclStmt, ExpressionStmt, FnDeclStmt, IfStmt, ReturnStmt, StructDeclStmt,
        VarDeclStmt, WhileStmt,
    },
    types::{ArrayType, SymbolType},
};

/// Stable identity of a syntax node.
///
/// Every node, including type annotations, parameters and members, gets a
/// unique id from the parser. Semantic facts are keyed by it.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct NodeId(pub u32);

impl Display for NodeId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "#{}", self.0)
    }
}

/// The root of a parsed program. Top-level statements behave like a block
/// whose `return` ends the program.
pub type Program = BlockStmt;

/// Statement Types
#[derive(Debug, Clone)]
pub enum Stmt {
    Block(BlockStmt),
    Expression(ExpressionStmt),
    VarDecl(VarDeclStmt),
    FnDecl(FnDeclStmt),
    StructDecl(StructDeclStmt),
    BoxDecl(BoxDeclStmt),
    If(IfStmt),
    While(WhileStmt),
    Return(ReturnStmt),
}

impl Stmt {
    pub fn id(&self) -> NodeId {
        match self {
            Stmt::Block(s) => s.id,
            Stmt::Expression(s) => s.id,
            Stmt::VarDecl(s) => s.id,
            Stmt::FnDecl(s) => s.id,
            Stmt::StructDecl(s) => s.id,
            Stmt::BoxDecl(s) => s.id,
            Stmt::If(s) => s.id,
            Stmt::While(s) => s.id,
            Stmt::Return(s) => s.id,
        }
    }

    pub fn get_span(&self) -> &Span {
        match self {
            Stmt::Block(s) => &s.span,
            Stmt::Expression(s) => &s.span,
            Stmt::VarDecl(s) => &s.span,
            Stmt::FnDecl(s) => &s.span,
            Stmt::StructDecl(s) => &s.span,
            Stmt::BoxDecl(s) => &s.span,
            Stmt::If(s) => &s.span,
            Stmt::While(s) => &s.span,
            Stmt::Return(s) => &s.span,
        }
    }

    /// Whether the statement declares something that is visible before its
    /// textual position (functions, structs and boxes).
    pub fn is_hoisted(&self) -> bool {
        matches!(self, Stmt::FnDecl(_) | Stmt::StructDecl(_) | Stmt::BoxDecl(_))
    }
}

/// Expression Types
#[derive(Debug, Clone)]
pub enum Expr {
    Int(IntExpr),
    Float(FloatExpr),
    String(StringExpr),
    Bool(BoolExpr),
    Null(NullExpr),
    Symbol(SymbolExpr),
    Array(ArrayExpr),
    Paren(ParenExpr),
    Prefix(PrefixExpr),
    Binary(BinaryExpr),
    Assignment(AssignmentExpr),
    Call(CallExpr),
    Index(IndexExpr),
    FieldAccess(FieldAccessExpr),
    BoxAccess(BoxAccessExpr),
    Constructor(ConstructorExpr),
    Create(CreateExpr),
}

impl Expr {
    pub fn id(&self) -> NodeId {
        match self {
            Expr::Int(e) => e.id,
            Expr::Float(e) => e.id,
            Expr::String(e) => e.id,
            Expr::Bool(e) => e.id,
            Expr::Null(e) => e.id,
            Expr::Symbol(e) => e.id,
            Expr::Array(e) => e.id,
            Expr::Paren(e) => e.id,
            Expr::Prefix(e) => e.id,
            Expr::Binary(e) => e.id,
            Expr::Assignment(e) => e.id,
            Expr::Call(e) => e.id,
            Expr::Index(e) => e.id,
            Expr::FieldAccess(e) => e.id,
            Expr::BoxAccess(e) => e.id,
            Expr::Constructor(e) => e.id,
            Expr::Create(e) => e.id,
        }
    }

    pub fn get_span(&self) -> &Span {
        match self {
            Expr::Int(e) => &e.span,
            Expr::Float(e) => &e.span,
            Expr::String(e) => &e.span,
            Expr::Bool(e) => &e.span,
            Expr::Null(e) => &e.span,
            Expr::Symbol(e) => &e.span,
            Expr::Array(e) => &e.span,
            Expr::Paren(e) => &e.span,
            Expr::Prefix(e) => &e.span,
            Expr::Binary(e) => &e.span,
            Expr::Assignment(e) => &e.span,
            Expr::Call(e) => &e.span,
            Expr::Index(e) => &e.span,
            Expr::FieldAccess(e) => &e.span,
            Expr::BoxAccess(e) => &e.span,
            Expr::Constructor(e) => &e.span,
            Expr::Create(e) => &e.span,
        }
    }

    /// Strips any number of enclosing parentheses.
    pub fn unparenthesized(&self) -> &Expr {
        match self {
            Expr::Paren(paren) => paren.inner.unparenthesized(),
            other => other,
        }
    }
}

/// Type annotation as written in the source (`Int`, `P[]`, ...).
#[derive(Debug, Clone)]
pub enum TypeNode {
    Symbol(SymbolType),
    Array(ArrayType),
}

impl TypeNode {
    pub fn id(&self) -> NodeId {
        match self {
            TypeNode::Symbol(t) => t.id,
            TypeNode::Array(t) => t.id,
        }
    }

    pub fn get_span(&self) -> &Span {
        match self {
            TypeNode::Symbol(t) => &t.span,
            TypeNode::Array(t) => &t.span,
        }
    }
}

impl Display for TypeNode {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            TypeNode::Symbol(t) => write!(f, "{}", t.name),
            TypeNode::Array(t) => write!(f, "{}[]", t.underlying),
        }
    }
}
