use std::collections::HashMap;

use crate::{ast::ast::NodeId, errors::errors::SemanticErrorKind, Span};

use super::types::{NamedType, Type};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct ScopeId(pub usize);

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct DeclId(pub usize);

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ScopeKind {
    /// Holds the builtin types and functions, parent of the root scope.
    Builtin,
    Root,
    Block,
    Function,
    Struct,
    Box,
}

impl ScopeKind {
    /// In a sequential scope a variable is only visible after its declaration.
    pub fn is_sequential(&self) -> bool {
        matches!(self, ScopeKind::Root | ScopeKind::Block | ScopeKind::Function)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BuiltinFunction {
    Print,
}

impl BuiltinFunction {
    pub fn name(&self) -> &'static str {
        match self {
            BuiltinFunction::Print => "print",
        }
    }

    pub fn signature(&self) -> Type {
        match self {
            BuiltinFunction::Print => Type::function(vec![Type::String], Type::String),
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum DeclKind {
    Variable,
    Parameter,
    Function,
    Struct,
    Box,
    Field,
    Attribute,
    Method,
    BuiltinType(Type),
    BuiltinFunction(BuiltinFunction),
}

impl DeclKind {
    /// Whether a reference to the declaration denotes a type rather than a value.
    pub fn is_type(&self) -> bool {
        matches!(self, DeclKind::Struct | DeclKind::Box | DeclKind::BuiltinType(_))
    }
}

#[derive(Debug, Clone)]
pub struct Declaration {
    pub name: String,
    pub kind: DeclKind,
    /// Declaring node, `None` for builtins.
    pub node: Option<NodeId>,
    pub scope: ScopeId,
    /// Source offset from which the declaration can be referenced in a
    /// sequential scope. Hoisted declarations use 0.
    pub visible_from: u32,
    pub span: Span,
}

impl Declaration {
    /// The nominal type declared by a struct or box declaration.
    pub fn named_type(&self) -> Option<Type> {
        let decl = self.node?;
        let named = NamedType {
            name: self.name.clone(),
            decl,
        };

        match self.kind {
            DeclKind::Struct => Some(Type::Struct(named)),
            DeclKind::Box => Some(Type::Box(named)),
            _ => None,
        }
    }
}

#[derive(Debug, Clone)]
pub struct Scope {
    pub kind: ScopeKind,
    pub parent: Option<ScopeId>,
    names: HashMap<String, DeclId>,
    order: Vec<DeclId>,
}

/// Arena of every scope and declaration of a program.
#[derive(Debug, Clone)]
pub struct SymbolTable {
    scopes: Vec<Scope>,
    decls: Vec<Declaration>,
    /// Member scope of each struct and box declaration node.
    members: HashMap<NodeId, ScopeId>,
    builtin: ScopeId,
}

impl Default for SymbolTable {
    fn default() -> Self {
        Self::new()
    }
}

impl SymbolTable {
    pub fn new() -> Self {
        let mut table = SymbolTable {
            scopes: Vec::new(),
            decls: Vec::new(),
            members: HashMap::new(),
            builtin: ScopeId(0),
        };

        let builtin = table.push_scope(ScopeKind::Builtin, None);
        table.builtin = builtin;

        let builtin_types = [
            ("Int", Type::Int),
            ("Float", Type::Float),
            ("Bool", Type::Bool),
            ("String", Type::String),
            ("Void", Type::Void),
            ("Type", Type::Type),
        ];
        for (name, ty) in builtin_types {
            table.declare_builtin(name, DeclKind::BuiltinType(ty));
        }

        let print = BuiltinFunction::Print;
        table.declare_builtin(print.name(), DeclKind::BuiltinFunction(print));

        table
    }

    fn declare_builtin(&mut self, name: &str, kind: DeclKind) {
        // Builtin names are distinct, this cannot clash
        let _ = self.declare(self.builtin, name, kind, None, 0, Span::null());
    }

    pub fn builtin_scope(&self) -> ScopeId {
        self.builtin
    }

    pub fn push_scope(&mut self, kind: ScopeKind, parent: Option<ScopeId>) -> ScopeId {
        let id = ScopeId(self.scopes.len());
        self.scopes.push(Scope {
            kind,
            parent,
            names: HashMap::new(),
            order: Vec::new(),
        });
        id
    }

    pub fn scope(&self, id: ScopeId) -> &Scope {
        &self.scopes[id.0]
    }

    pub fn decl(&self, id: DeclId) -> &Declaration {
        &self.decls[id.0]
    }

    /// Adds a declaration to `scope`, failing if the name is already taken
    /// in that exact scope.
    pub fn declare(
        &mut self,
        scope: ScopeId,
        name: &str,
        kind: DeclKind,
        node: Option<NodeId>,
        visible_from: u32,
        span: Span,
    ) -> Result<DeclId, SemanticErrorKind> {
        if self.scopes[scope.0].names.contains_key(name) {
            return Err(SemanticErrorKind::DuplicateDeclaration {
                name: name.to_string(),
            });
        }

        let id = DeclId(self.decls.len());
        self.decls.push(Declaration {
            name: name.to_string(),
            kind,
            node,
            scope,
            visible_from,
            span,
        });

        let target = &mut self.scopes[scope.0];
        target.names.insert(name.to_string(), id);
        target.order.push(id);

        Ok(id)
    }

    /// Finds the declaration `name` refers to when used at offset `from`
    /// inside `scope`.
    ///
    /// A variable declared later in a sequential scope is skipped so that an
    /// outer binding of the same name can still be found. When only such
    /// skipped declarations exist the reference is a use before declaration.
    pub fn lookup(&self, scope: ScopeId, name: &str, from: u32) -> Result<DeclId, SemanticErrorKind> {
        let mut skipped = false;
        let mut current = Some(scope);

        while let Some(id) = current {
            let scope = &self.scopes[id.0];
            if let Some(&decl) = scope.names.get(name) {
                if scope.kind.is_sequential() && self.decls[decl.0].visible_from > from {
                    skipped = true;
                } else {
                    return Ok(decl);
                }
            }
            current = scope.parent;
        }

        if skipped {
            Err(SemanticErrorKind::UsedBeforeDeclaration {
                name: name.to_string(),
            })
        } else {
            Err(SemanticErrorKind::UnresolvedReference {
                what: name.to_string(),
            })
        }
    }

    pub fn set_members(&mut self, owner: NodeId, scope: ScopeId) {
        self.members.insert(owner, scope);
    }

    /// Members of a struct or box declaration, in declaration order.
    pub fn members(&self, owner: NodeId) -> Vec<&Declaration> {
        match self.members.get(&owner) {
            Some(scope) => self.scopes[scope.0].order.iter().map(|id| &self.decls[id.0]).collect(),
            None => Vec::new(),
        }
    }

    pub fn lookup_member(&self, owner: NodeId, name: &str) -> Option<DeclId> {
        let scope = self.members.get(&owner)?;
        self.scopes[scope.0].names.get(name).copied()
    }
}
