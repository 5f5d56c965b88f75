//! Main interpreter module.
//!
//! Holds the [`Interpreter`] state: the current environment, the output
//! sink `print` writes to, and the analysis results used to convert values
//! stored into Float slots.

use std::{
    cell::RefCell,
    collections::HashMap,
    io::{self, Write},
    rc::Rc,
};

use tracing::{debug, trace};

use crate::{
    ast::{
        ast::{NodeId, Program},
        statements::{BoxDeclStmt, FnDeclStmt, StructDeclStmt},
    },
    errors::errors::RuntimeError,
    type_checker::{
        type_checker::Annotations,
        types::Type,
    },
    Span,
};

use super::{
    environment::Environment,
    stdlib::builtin_environment,
    stmt::{exec_block, Completion},
    value::{BoxAttribute, BoxClass, Closure, StructDef, StructInstance, TypeValue, Value},
};

pub struct Interpreter<'a, W: Write> {
    program: &'a Program,
    pub annotations: &'a Annotations,
    /// Where `print` writes.
    pub out: W,
    /// Environment statements are currently executed in.
    pub env: Rc<Environment>,
    /// Function and method declarations shared by every closure created
    /// from them.
    declarations: HashMap<NodeId, Rc<FnDeclStmt>>,
}

impl<'a, W: Write> Interpreter<'a, W> {
    pub fn new(program: &'a Program, annotations: &'a Annotations, out: W) -> Self {
        Interpreter {
            program,
            annotations,
            out,
            env: builtin_environment(),
            declarations: HashMap::new(),
        }
    }

    /// Executes the program. The value of a top-level `return` is the
    /// result, a program that runs to completion yields Void.
    #[tracing::instrument(skip_all)]
    pub fn run(&mut self) -> Result<Value, RuntimeError> {
        let program = self.program;
        let root = Environment::child(&self.env);

        let completion = self.with_env(root, |interpreter| {
            super::stmt::exec_statements(interpreter, &program.body)
        })?;

        let result = match completion {
            Completion::Return(value) => value,
            Completion::Normal => Value::Void,
        };
        debug!(result = %result, "program finished");
        Ok(result)
    }

    /// Runs `f` with `env` as the current environment, restoring the
    /// previous one afterwards whatever the outcome.
    pub fn with_env<T>(&mut self, env: Rc<Environment>, f: impl FnOnce(&mut Self) -> T) -> T {
        let previous = std::mem::replace(&mut self.env, env);
        let result = f(self);
        self.env = previous;
        result
    }

    pub fn decl_type(&self, node: NodeId) -> Option<&'a Type> {
        self.annotations.decl_type(node)
    }

    pub fn type_of(&self, node: NodeId) -> Option<&'a Type> {
        self.annotations.type_of(node)
    }

    fn shared_declaration(&mut self, decl: &FnDeclStmt) -> Rc<FnDeclStmt> {
        self.declarations
            .entry(decl.id)
            .or_insert_with(|| Rc::new(decl.clone()))
            .clone()
    }

    /// Binds a function declared in the current environment.
    pub fn define_function(&mut self, decl: &FnDeclStmt) {
        let closure = Closure {
            decl: self.shared_declaration(decl),
            env: self.env.clone(),
        };
        self.env.define(&decl.identifier, Some(decl.id), Value::Function(Rc::new(closure)));
    }

    pub fn define_struct(&mut self, decl: &StructDeclStmt) {
        let def = StructDef {
            name: decl.name.clone(),
            fields: decl.fields.iter().map(|field| field.name.clone()).collect(),
            types: decl
                .fields
                .iter()
                .map(|field| self.decl_type(field.id).cloned().unwrap_or(Type::Null))
                .collect(),
        };
        let value = Value::Type(Rc::new(TypeValue::Struct(Rc::new(def))));
        self.env.define(&decl.name, Some(decl.id), value);
    }

    pub fn define_box(&mut self, decl: &BoxDeclStmt) {
        let attributes = decl
            .attributes()
            .map(|attribute| BoxAttribute {
                name: attribute.name.clone(),
                decl: attribute.id,
                ty: self.decl_type(attribute.id).cloned().unwrap_or(Type::Null),
            })
            .collect();
        let methods = decl
            .methods()
            .map(|method| (method.identifier.clone(), self.shared_declaration(method)))
            .collect();

        let class = BoxClass {
            name: decl.name.clone(),
            attributes,
            methods,
            env: self.env.clone(),
        };
        let value = Value::Type(Rc::new(TypeValue::Box(Rc::new(class))));
        self.env.define(&decl.name, Some(decl.id), value);
    }

    /// Calls a function or method. `env` is the environment the parameters
    /// frame is pushed onto: the closure environment for functions, the
    /// receiver frame for methods.
    pub fn call_function(
        &mut self,
        decl: &Rc<FnDeclStmt>,
        env: &Rc<Environment>,
        arguments: Vec<Value>,
        span: &Span,
    ) -> Result<Value, RuntimeError> {
        trace!(function = %decl.identifier, arguments = arguments.len(), "call");

        if decl.parameters.len() != arguments.len() {
            return Err(RuntimeError::internal(
                format!("`{}` called with {} arguments", decl.identifier, arguments.len()),
                span.clone(),
            ));
        }

        let frame = Environment::child(env);
        for (parameter, argument) in decl.parameters.iter().zip(arguments) {
            let value = argument.coerce(self.decl_type(parameter.id));
            frame.define(&parameter.name, Some(parameter.id), value);
        }

        let completion = self.with_env(frame, |interpreter| exec_block(interpreter, &decl.body))?;

        let value = match completion {
            Completion::Return(value) => value,
            Completion::Normal => Value::Void,
        };
        let return_type = match self.decl_type(decl.id) {
            Some(Type::Function(function)) => Some(&function.ret),
            _ => None,
        };
        Ok(value.coerce(return_type))
    }

    pub fn construct(&mut self, def: &Rc<StructDef>, arguments: Vec<Value>) -> Value {
        let fields = arguments
            .into_iter()
            .zip(&def.types)
            .map(|(value, ty)| value.coerce(Some(ty)))
            .collect();

        Value::Struct(Rc::new(StructInstance {
            def: def.clone(),
            fields: RefCell::new(fields),
        }))
    }

    /// Writes one line of program output.
    pub fn print_line(&mut self, line: &str, span: &Span) -> Result<(), RuntimeError> {
        writeln!(self.out, "{}", line)
            .and_then(|_| self.out.flush())
            .map_err(|error| RuntimeError::internal(format!("could not write output: {}", error), span.clone()))
    }
}

/// Executes a checked program, printing to stdout.
pub fn interpret(program: &Program, annotations: &Annotations) -> Result<Value, RuntimeError> {
    let mut interpreter = Interpreter::new(program, annotations, io::stdout());
    interpreter.run()
}
