use std::{cell::RefCell, collections::HashMap, fmt::Display, rc::Rc};

use crate::{
    ast::{ast::NodeId, statements::FnDeclStmt},
    type_checker::{scope::BuiltinFunction, types::Type},
};

use super::environment::Environment;

/// A runtime value.
///
/// Arrays, structs, boxes and callables are shared: copying the value copies
/// the reference, and equality on them is identity.
#[derive(Debug, Clone)]
pub enum Value {
    Int(i64),
    Float(f64),
    Bool(bool),
    String(String),
    Null,
    /// Result of calling a function without a return value.
    Void,
    /// Fixed length once created, elements are mutable.
    Array(Rc<RefCell<Vec<Value>>>),
    Struct(Rc<StructInstance>),
    /// A box instance is the frame holding its attributes, see
    /// [`Environment::instance`].
    Box(Rc<Environment>),
    Function(Rc<Closure>),
    BoundMethod(Rc<BoundMethod>),
    /// `$Name`, called to allocate a struct.
    Constructor(Rc<StructDef>),
    Builtin(BuiltinFunction),
    Type(Rc<TypeValue>),
}

#[derive(Debug)]
pub struct Closure {
    pub decl: Rc<FnDeclStmt>,
    /// Environment the function was declared in.
    pub env: Rc<Environment>,
}

#[derive(Debug)]
pub struct BoundMethod {
    pub receiver: Rc<Environment>,
    pub method: Rc<FnDeclStmt>,
}

#[derive(Debug)]
pub struct StructDef {
    pub name: String,
    pub fields: Vec<String>,
    pub types: Vec<Type>,
}

impl StructDef {
    pub fn field_index(&self, name: &str) -> Option<usize> {
        self.fields.iter().position(|field| field == name)
    }
}

#[derive(Debug)]
pub struct StructInstance {
    pub def: Rc<StructDef>,
    pub fields: RefCell<Vec<Value>>,
}

#[derive(Debug)]
pub struct BoxClass {
    pub name: String,
    /// In declaration order.
    pub attributes: Vec<BoxAttribute>,
    pub methods: HashMap<String, Rc<FnDeclStmt>>,
    /// Environment the box was declared in, parent of every instance frame.
    pub env: Rc<Environment>,
}

#[derive(Debug)]
pub struct BoxAttribute {
    pub name: String,
    pub decl: NodeId,
    pub ty: Type,
}

/// Value of an expression naming a type.
#[derive(Debug)]
pub enum TypeValue {
    Builtin(Type),
    Struct(Rc<StructDef>),
    Box(Rc<BoxClass>),
}

impl TypeValue {
    pub fn name(&self) -> String {
        match self {
            TypeValue::Builtin(ty) => ty.to_string(),
            TypeValue::Struct(def) => def.name.clone(),
            TypeValue::Box(class) => class.name.clone(),
        }
    }
}

impl Value {
    /// Initial value of a slot of type `ty` that was not explicitly set.
    pub fn default_for(ty: &Type) -> Value {
        match ty {
            Type::Int => Value::Int(0),
            Type::Float => Value::Float(0.0),
            Type::Bool => Value::Bool(false),
            Type::String => Value::String(String::new()),
            Type::Array(_) => Value::Array(Rc::new(RefCell::new(Vec::new()))),
            _ => Value::Null,
        }
    }

    /// Converts an Int stored into a slot of type Float.
    pub fn coerce(self, ty: Option<&Type>) -> Value {
        match (self, ty) {
            (Value::Int(value), Some(Type::Float)) => Value::Float(value as f64),
            (value, _) => value,
        }
    }

    pub fn type_name(&self) -> &'static str {
        match self {
            Value::Int(_) => "Int",
            Value::Float(_) => "Float",
            Value::Bool(_) => "Bool",
            Value::String(_) => "String",
            Value::Null => "Null",
            Value::Void => "Void",
            Value::Array(_) => "array",
            Value::Struct(_) => "struct",
            Value::Box(_) => "box",
            Value::Function(_) | Value::BoundMethod(_) | Value::Constructor(_) | Value::Builtin(_) => "function",
            Value::Type(_) => "Type",
        }
    }

    pub fn is_null(&self) -> bool {
        matches!(self, Value::Null)
    }

    /// `==` semantics: numbers by value across Int and Float, strings by
    /// content, everything else by identity.
    pub fn equals(&self, other: &Value) -> bool {
        match (self, other) {
            (Value::Int(a), Value::Int(b)) => a == b,
            (Value::Float(a), Value::Float(b)) => a == b,
            (Value::Int(a), Value::Float(b)) | (Value::Float(b), Value::Int(a)) => (*a as f64) == *b,
            (Value::Bool(a), Value::Bool(b)) => a == b,
            (Value::String(a), Value::String(b)) => a == b,
            (Value::Null, Value::Null) | (Value::Void, Value::Void) => true,
            (Value::Array(a), Value::Array(b)) => Rc::ptr_eq(a, b),
            (Value::Struct(a), Value::Struct(b)) => Rc::ptr_eq(a, b),
            (Value::Box(a), Value::Box(b)) => Rc::ptr_eq(a, b),
            (Value::Function(a), Value::Function(b)) => Rc::ptr_eq(a, b),
            (Value::BoundMethod(a), Value::BoundMethod(b)) => {
                Rc::ptr_eq(&a.receiver, &b.receiver) && Rc::ptr_eq(&a.method, &b.method)
            }
            (Value::Constructor(a), Value::Constructor(b)) => Rc::ptr_eq(a, b),
            (Value::Builtin(a), Value::Builtin(b)) => a == b,
            (Value::Type(a), Value::Type(b)) => match (a.as_ref(), b.as_ref()) {
                (TypeValue::Builtin(a), TypeValue::Builtin(b)) => a == b,
                _ => Rc::ptr_eq(a, b),
            },
            _ => false,
        }
    }
}

fn write_list<T>(
    f: &mut std::fmt::Formatter<'_>,
    items: impl Iterator<Item = T>,
    mut write_item: impl FnMut(&mut std::fmt::Formatter<'_>, T) -> std::fmt::Result,
) -> std::fmt::Result {
    for (i, item) in items.enumerate() {
        if i > 0 {
            write!(f, ", ")?;
        }
        write_item(f, item)?;
    }
    Ok(())
}

/// Text form used by string concatenation and `print`.
impl Display for Value {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Value::Int(value) => write!(f, "{}", value),
            // shortest round-trip form: `3.0`, `1.5`, `1e300`, `inf`
            Value::Float(value) => write!(f, "{:?}", value),
            Value::Bool(value) => write!(f, "{}", value),
            Value::String(value) => write!(f, "{}", value),
            Value::Null => write!(f, "null"),
            Value::Void => write!(f, "void"),
            Value::Array(elements) => {
                write!(f, "[")?;
                write_list(f, elements.borrow().iter(), |f, element| write!(f, "{}", element))?;
                write!(f, "]")
            }
            Value::Struct(instance) => {
                let fields = instance.fields.borrow();
                if fields.is_empty() {
                    return write!(f, "{} {{}}", instance.def.name);
                }
                write!(f, "{} {{ ", instance.def.name)?;
                write_list(f, instance.def.fields.iter().zip(fields.iter()), |f, (name, value)| {
                    write!(f, "{}: {}", name, value)
                })?;
                write!(f, " }}")
            }
            Value::Box(instance) => {
                let Some(class) = instance.class() else {
                    return write!(f, "<box>");
                };
                if class.attributes.is_empty() {
                    return write!(f, "{} {{}}", class.name);
                }
                write!(f, "{} {{ ", class.name)?;
                write_list(f, class.attributes.iter(), |f, attribute| {
                    let value = instance.get_local(&attribute.name).unwrap_or(Value::Null);
                    write!(f, "{}: {}", attribute.name, value)
                })?;
                write!(f, " }}")
            }
            Value::Function(closure) => write!(f, "<fun {}>", closure.decl.identifier),
            Value::BoundMethod(bound) => match bound.receiver.class() {
                Some(class) => write!(f, "<meth {}#{}>", class.name, bound.method.identifier),
                None => write!(f, "<meth {}>", bound.method.identifier),
            },
            Value::Constructor(def) => write!(f, "<fun ${}>", def.name),
            Value::Builtin(builtin) => write!(f, "<fun {}>", builtin.name()),
            Value::Type(ty) => write!(f, "{}", ty.name()),
        }
    }
}
