use std::{fmt::Display, hash::Hash, rc::Rc};

use crate::ast::ast::NodeId;

/// Handle to a user declared struct or box type.
///
/// Named types are nominal: two handles are equal iff they point to the
/// same declaration, whatever their names or members.
#[derive(Debug, Clone, Eq)]
pub struct NamedType {
    pub name: String,
    pub decl: NodeId,
}

impl PartialEq for NamedType {
    fn eq(&self, other: &Self) -> bool {
        self.decl == other.decl
    }
}

impl Hash for NamedType {
    fn hash<H: std::hash::Hasher>(&self, state: &mut H) {
        self.decl.hash(state);
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct FunctionType {
    pub params: Vec<Type>,
    pub ret: Type,
}

/// Static type of an expression or declaration.
///
/// Struct and box members are not carried here: they live in the member
/// scope of the declaration the handle points to.
#[derive(Debug, Clone, PartialEq)]
pub enum Type {
    Int,
    Float,
    Bool,
    String,
    Void,
    /// Type of `null`, assignable to every reference type.
    Null,
    /// Type of type-valued expressions (`S` where `struct S {}`).
    Type,
    Array(Box<Type>),
    Struct(NamedType),
    Box(NamedType),
    Function(Rc<FunctionType>),
}

impl Type {
    pub fn array_of(component: Type) -> Type {
        Type::Array(Box::new(component))
    }

    pub fn function(params: Vec<Type>, ret: Type) -> Type {
        Type::Function(Rc::new(FunctionType { params, ret }))
    }

    pub fn is_numeric(&self) -> bool {
        matches!(self, Type::Int | Type::Float)
    }

    /// Types whose values may be `null`.
    pub fn is_reference(&self) -> bool {
        matches!(
            self,
            Type::String
                | Type::Null
                | Type::Type
                | Type::Array(_)
                | Type::Struct(_)
                | Type::Box(_)
                | Type::Function(_)
        )
    }

    /// Whether a value of type `self` can be stored in a slot of type `target`.
    pub fn is_assignable_to(&self, target: &Type) -> bool {
        if self == target {
            return true;
        }

        match (self, target) {
            (Type::Int, Type::Float) => true,
            (Type::Null, target) => target.is_reference(),
            _ => false,
        }
    }

    /// Whether `==` and `!=` are defined between the two types.
    pub fn is_comparable_with(&self, other: &Type) -> bool {
        self == other
            || (self.is_numeric() && other.is_numeric())
            || (*self == Type::Null && other.is_reference())
            || (*other == Type::Null && self.is_reference())
    }

    /// Smallest type both `self` and `other` are assignable to, used for the
    /// element type of array literals.
    pub fn common_supertype(&self, other: &Type) -> Option<Type> {
        if self.is_assignable_to(other) {
            Some(other.clone())
        } else if other.is_assignable_to(self) {
            Some(self.clone())
        } else {
            None
        }
    }

    pub fn component(&self) -> Option<&Type> {
        match self {
            Type::Array(component) => Some(component),
            _ => None,
        }
    }
}

impl Display for Type {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Type::Int => write!(f, "Int"),
            Type::Float => write!(f, "Float"),
            Type::Bool => write!(f, "Bool"),
            Type::String => write!(f, "String"),
            Type::Void => write!(f, "Void"),
            Type::Null => write!(f, "Null"),
            Type::Type => write!(f, "Type"),
            Type::Array(component) => write!(f, "{}[]", component),
            Type::Struct(named) | Type::Box(named) => write!(f, "{}", named.name),
            Type::Function(function) => {
                let params: Vec<String> = function.params.iter().map(|p| p.to_string()).collect();
                write!(f, "({}) -> {}", params.join(", "), function.ret)
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn named(name: &str, decl: u32) -> NamedType {
        NamedType {
            name: name.to_string(),
            decl: NodeId(decl),
        }
    }

    #[test]
    fn test_named_types_are_nominal() {
        assert_eq!(Type::Struct(named("P", 3)), Type::Struct(named("Q", 3)));
        assert_ne!(Type::Struct(named("P", 3)), Type::Struct(named("P", 4)));
        assert_ne!(Type::Struct(named("P", 3)), Type::Box(named("P", 3)));
    }

    #[test]
    fn test_arrays_are_structural() {
        assert_eq!(Type::array_of(Type::Int), Type::array_of(Type::Int));
        assert!(!Type::array_of(Type::Int).is_assignable_to(&Type::array_of(Type::Float)));
    }

    #[test]
    fn test_assignability() {
        assert!(Type::Int.is_assignable_to(&Type::Float));
        assert!(!Type::Float.is_assignable_to(&Type::Int));
        assert!(Type::Null.is_assignable_to(&Type::String));
        assert!(Type::Null.is_assignable_to(&Type::array_of(Type::Int)));
        assert!(Type::Null.is_assignable_to(&Type::Box(named("B", 1))));
        assert!(!Type::Null.is_assignable_to(&Type::Int));
        assert!(!Type::Bool.is_assignable_to(&Type::Void));
    }

    #[test]
    fn test_comparability() {
        assert!(Type::Int.is_comparable_with(&Type::Float));
        assert!(Type::Null.is_comparable_with(&Type::Struct(named("P", 1))));
        assert!(Type::String.is_comparable_with(&Type::Null));
        assert!(!Type::Bool.is_comparable_with(&Type::Int));
        assert!(!Type::Null.is_comparable_with(&Type::Bool));
    }

    #[test]
    fn test_common_supertype() {
        assert_eq!(Type::Int.common_supertype(&Type::Float), Some(Type::Float));
        assert_eq!(Type::Float.common_supertype(&Type::Int), Some(Type::Float));
        assert_eq!(Type::Null.common_supertype(&Type::String), Some(Type::String));
        assert_eq!(Type::Int.common_supertype(&Type::String), None);
    }

    #[test]
    fn test_display() {
        assert_eq!(Type::array_of(Type::array_of(Type::Int)).to_string(), "Int[][]");
        assert_eq!(Type::Box(named("Car", 1)).to_string(), "Car");
        assert_eq!(
            Type::function(vec![Type::Int, Type::String], Type::Void).to_string(),
            "(Int, String) -> Void"
        );
    }
}
