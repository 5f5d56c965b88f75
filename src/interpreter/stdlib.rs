//! Builtin bindings.
//!
//! The builtin environment is the outermost frame of every program. It
//! binds the primitive type names, so `Int` can be used as a value of type
//! `Type`, and the native functions.

use std::{io::Write, rc::Rc};

use crate::{
    errors::errors::RuntimeError,
    type_checker::{scope::BuiltinFunction, types::Type},
    Span,
};

use super::{
    environment::Environment,
    interpreter::Interpreter,
    value::{TypeValue, Value},
};

/// Creates the frame holding the builtin types and functions.
pub fn builtin_environment() -> Rc<Environment> {
    let env = Environment::new(None);

    for ty in [Type::Int, Type::Float, Type::Bool, Type::String, Type::Void, Type::Type] {
        env.define(&ty.to_string(), None, Value::Type(Rc::new(TypeValue::Builtin(ty))));
    }
    env.define(BuiltinFunction::Print.name(), None, Value::Builtin(BuiltinFunction::Print));

    env
}

/// Calls a native function.
///
/// `print` writes its argument followed by a newline and returns it.
pub fn call_builtin<W: Write>(
    interpreter: &mut Interpreter<'_, W>,
    builtin: BuiltinFunction,
    arguments: Vec<Value>,
    span: &Span,
) -> Result<Value, RuntimeError> {
    match builtin {
        BuiltinFunction::Print => {
            let [argument]: [Value; 1] = arguments.try_into().map_err(|arguments: Vec<Value>| {
                RuntimeError::internal(
                    format!("`print` called with {} arguments", arguments.len()),
                    span.clone(),
                )
            })?;

            interpreter.print_line(&argument.to_string(), span)?;
            Ok(argument)
        }
    }
}
