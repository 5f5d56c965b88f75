use std::{cell::RefCell, collections::HashMap, fmt::Debug, rc::Rc};

use crate::ast::ast::NodeId;

use super::value::{BoxClass, Value};

/// A name bound in a frame, tagged with the declaration it was bound for.
/// Builtins have no declaring node.
#[derive(Debug, Clone)]
struct Binding {
    decl: Option<NodeId>,
    /// `None` until the declaring `var` has run.
    value: Option<Value>,
}

/// Why a name could not be read or written.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SlotError {
    Unbound,
    Uninitialised,
}

/// One frame of the runtime scope chain.
///
/// Box instances are frames too: their values are the attributes and their
/// parent is the environment the box was declared in, so a method body
/// sees its locals, then the attributes of its receiver, then the lexical
/// scope of the box.
///
/// Names are looked up together with the declaration the resolver bound them
/// to. A frame binding the same name for another declaration is skipped, so
/// a block variable that is not declared yet never hides an outer one.
pub struct Environment {
    values: RefCell<HashMap<String, Binding>>,
    parent: Option<Rc<Environment>>,
    /// Set on box instance frames.
    class: Option<Rc<BoxClass>>,
}

impl Environment {
    pub fn new(parent: Option<Rc<Environment>>) -> Rc<Self> {
        Rc::new(Environment {
            values: RefCell::new(HashMap::new()),
            parent,
            class: None,
        })
    }

    pub fn child(parent: &Rc<Environment>) -> Rc<Self> {
        Environment::new(Some(parent.clone()))
    }

    /// Allocates a box instance with every attribute set to its default.
    pub fn instance(class: Rc<BoxClass>) -> Rc<Self> {
        let values = class
            .attributes
            .iter()
            .map(|attribute| {
                let binding = Binding {
                    decl: Some(attribute.decl),
                    value: Some(Value::default_for(&attribute.ty)),
                };
                (attribute.name.clone(), binding)
            })
            .collect();

        Rc::new(Environment {
            values: RefCell::new(values),
            parent: Some(class.env.clone()),
            class: Some(class),
        })
    }

    pub fn class(&self) -> Option<&Rc<BoxClass>> {
        self.class.as_ref()
    }

    /// Reserves a slot for a variable of this frame whose `var` has not run.
    pub fn reserve(&self, name: &str, decl: NodeId) {
        let binding = Binding {
            decl: Some(decl),
            value: None,
        };
        self.values.borrow_mut().insert(name.to_string(), binding);
    }

    /// Binds `name` in this frame, replacing any previous binding here.
    pub fn define(&self, name: &str, decl: Option<NodeId>, value: Value) {
        let binding = Binding {
            decl,
            value: Some(value),
        };
        self.values.borrow_mut().insert(name.to_string(), binding);
    }

    pub fn get(&self, name: &str, decl: Option<NodeId>) -> Result<Value, SlotError> {
        if let Some(binding) = self.values.borrow().get(name) {
            if binding.decl == decl {
                return binding.value.clone().ok_or(SlotError::Uninitialised);
            }
        }
        match &self.parent {
            Some(parent) => parent.get(name, decl),
            None => Err(SlotError::Unbound),
        }
    }

    /// Value of a member of this frame, whatever declared it.
    pub fn get_local(&self, name: &str) -> Option<Value> {
        self.values.borrow().get(name).and_then(|binding| binding.value.clone())
    }

    /// Updates the binding of `name` made for `decl`.
    pub fn assign(&self, name: &str, decl: Option<NodeId>, value: Value) -> Result<(), SlotError> {
        if let Some(binding) = self.values.borrow_mut().get_mut(name) {
            if binding.decl == decl {
                return match &mut binding.value {
                    Some(slot) => {
                        *slot = value;
                        Ok(())
                    }
                    None => Err(SlotError::Uninitialised),
                };
            }
        }
        match &self.parent {
            Some(parent) => parent.assign(name, decl, value),
            None => Err(SlotError::Unbound),
        }
    }

    pub fn assign_local(&self, name: &str, value: Value) -> bool {
        match self.values.borrow_mut().get_mut(name) {
            Some(Binding { value: Some(slot), .. }) => {
                *slot = value;
                true
            }
            _ => false,
        }
    }

    /// The innermost box instance frame of the chain, the receiver of the
    /// method being executed.
    pub fn receiver(self: &Rc<Self>) -> Option<Rc<Environment>> {
        let mut current = Some(self.clone());
        while let Some(env) = current {
            if env.class.is_some() {
                return Some(env);
            }
            current = env.parent.clone();
        }
        None
    }
}

// Frames are cyclic through closures, only list the names bound here.
impl Debug for Environment {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let values = self.values.borrow();
        let mut names: Vec<&String> = values.keys().collect();
        names.sort();

        f.debug_struct("Environment")
            .field("names", &names)
            .field("class", &self.class.as_ref().map(|class| &class.name))
            .field("has_parent", &self.parent.is_some())
            .finish()
    }
}
