use std::slice::Iter;

use crate::Span;

use super::ast::{Expr, NodeId, Stmt, TypeNode};

#[derive(Debug, Clone)]
pub struct BlockStmt {
    pub id: NodeId,
    pub body: Vec<Stmt>,
    pub span: Span,
}

impl BlockStmt {
    pub fn iter(&self) -> Iter<'_, Stmt> {
        self.body.iter()
    }
}

#[derive(Debug, Clone)]
pub struct ExpressionStmt {
    pub id: NodeId,
    pub expression: Expr,
    pub span: Span,
}

/// `var name (: type)? (= value)?`, at least one of the two is present.
#[derive(Debug, Clone)]
pub struct VarDeclStmt {
    pub id: NodeId,
    pub identifier: String,
    pub explicit_type: Option<TypeNode>,
    pub assigned_value: Option<Expr>,
    pub span: Span,
}

#[derive(Debug, Clone)]
pub struct Parameter {
    pub id: NodeId,
    pub name: String,
    pub ty: TypeNode,
    pub span: Span,
}

/// Function declaration. Box methods share this shape.
#[derive(Debug, Clone)]
pub struct FnDeclStmt {
    pub id: NodeId,
    pub identifier: String,
    pub parameters: Vec<Parameter>,
    /// `None` means Void.
    pub return_type: Option<TypeNode>,
    pub body: BlockStmt,
    pub span: Span,
}

#[derive(Debug, Clone)]
pub struct FieldDecl {
    pub id: NodeId,
    pub name: String,
    pub ty: TypeNode,
    pub span: Span,
}

#[derive(Debug, Clone)]
pub struct StructDeclStmt {
    pub id: NodeId,
    pub name: String,
    pub fields: Vec<FieldDecl>,
    pub span: Span,
}

#[derive(Debug, Clone)]
pub struct AttributeDecl {
    pub id: NodeId,
    pub name: String,
    pub ty: TypeNode,
    pub span: Span,
}

#[derive(Debug, Clone)]
pub enum BoxMember {
    Attribute(AttributeDecl),
    Method(FnDeclStmt),
}

impl BoxMember {
    pub fn name(&self) -> &str {
        match self {
            BoxMember::Attribute(attribute) => &attribute.name,
            BoxMember::Method(method) => &method.identifier,
        }
    }

    pub fn id(&self) -> NodeId {
        match self {
            BoxMember::Attribute(attribute) => attribute.id,
            BoxMember::Method(method) => method.id,
        }
    }
}

#[derive(Debug, Clone)]
pub struct BoxDeclStmt {
    pub id: NodeId,
    pub name: String,
    pub members: Vec<BoxMember>,
    pub span: Span,
}

impl BoxDeclStmt {
    pub fn attributes(&self) -> impl Iterator<Item = &AttributeDecl> {
        self.members.iter().filter_map(|member| match member {
            BoxMember::Attribute(attribute) => Some(attribute),
            BoxMember::Method(_) => None,
        })
    }

    pub fn methods(&self) -> impl Iterator<Item = &FnDeclStmt> {
        self.members.iter().filter_map(|member| match member {
            BoxMember::Method(method) => Some(method),
            BoxMember::Attribute(_) => None,
        })
    }
}

#[derive(Debug, Clone)]
pub struct IfStmt {
    pub id: NodeId,
    pub condition: Expr,
    pub then_body: Box<Stmt>,
    pub else_body: Option<Box<Stmt>>,
    pub span: Span,
}

#[derive(Debug, Clone)]
pub struct WhileStmt {
    pub id: NodeId,
    pub condition: Expr,
    pub body: Box<Stmt>,
    pub span: Span,
}

#[derive(Debug, Clone)]
pub struct ReturnStmt {
    pub id: NodeId,
    pub value: Option<Expr>,
    pub span: Span,
}
