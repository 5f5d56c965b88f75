use std::{cell::RefCell, io::Write, rc::Rc};

use crate::{
    ast::{
        ast::{Expr, NodeId},
        expressions::{
            ArrayExpr, AssignmentExpr, BinaryExpr, BinaryOperator, BoxAccessExpr, CallExpr,
            FieldAccessExpr, IndexExpr, PrefixExpr, PrefixOperator, SymbolExpr,
        },
    },
    errors::errors::{RuntimeError, RuntimeErrorKind},
    type_checker::{scope::DeclKind, types::Type},
    Span,
};

use super::{
    environment::{Environment, SlotError},
    interpreter::Interpreter,
    stdlib::call_builtin,
    value::{BoundMethod, TypeValue, Value},
};

fn null_reference(action: impl Into<String>, span: &Span) -> RuntimeError {
    RuntimeError::new(
        RuntimeErrorKind::NullReference {
            action: action.into(),
        },
        span.clone(),
    )
}

pub fn eval_expression<W: Write>(
    interpreter: &mut Interpreter<'_, W>,
    expression: &Expr,
) -> Result<Value, RuntimeError> {
    match expression {
        Expr::Int(e) => Ok(Value::Int(e.value)),
        Expr::Float(e) => Ok(Value::Float(e.value)),
        Expr::String(e) => Ok(Value::String(e.value.clone())),
        Expr::Bool(e) => Ok(Value::Bool(e.value)),
        Expr::Null(_) => Ok(Value::Null),
        Expr::Symbol(e) => eval_symbol(interpreter, e),
        Expr::Array(e) => eval_array(interpreter, e),
        Expr::Paren(e) => eval_expression(interpreter, &e.inner),
        Expr::Prefix(e) => eval_prefix(interpreter, e),
        Expr::Binary(e) => eval_binary(interpreter, e),
        Expr::Assignment(e) => eval_assignment(interpreter, e),
        Expr::Call(e) => eval_call(interpreter, e),
        Expr::Index(e) => eval_index(interpreter, e),
        Expr::FieldAccess(e) => eval_field_access(interpreter, e),
        Expr::BoxAccess(e) => eval_box_access(interpreter, e),
        Expr::Constructor(e) => match lookup_type(interpreter, e.id, &e.name, &e.span)?.as_ref() {
            TypeValue::Struct(def) => Ok(Value::Constructor(def.clone())),
            _ => Err(RuntimeError::internal(format!("`{}` is not a struct", e.name), e.span.clone())),
        },
        Expr::Create(e) => match lookup_type(interpreter, e.id, &e.name, &e.span)?.as_ref() {
            TypeValue::Box(class) => Ok(Value::Box(Environment::instance(class.clone()))),
            _ => Err(RuntimeError::internal(format!("`{}` is not a box", e.name), e.span.clone())),
        },
    }
}

/// Evaluates an expression checked to be a Bool.
pub fn eval_condition<W: Write>(
    interpreter: &mut Interpreter<'_, W>,
    expression: &Expr,
) -> Result<bool, RuntimeError> {
    match eval_expression(interpreter, expression)? {
        Value::Bool(value) => Ok(value),
        other => Err(RuntimeError::internal(
            format!("expected a Bool, got {}", other.type_name()),
            expression.get_span().clone(),
        )),
    }
}

/// Declaring node of the name referenced at `node`, `None` for builtins.
fn resolved_decl<W: Write>(
    interpreter: &Interpreter<'_, W>,
    node: NodeId,
    name: &str,
    span: &Span,
) -> Result<Option<NodeId>, RuntimeError> {
    interpreter
        .annotations
        .decl_of(node)
        .map(|decl| decl.node)
        .ok_or_else(|| RuntimeError::internal(format!("unresolved name `{}`", name), span.clone()))
}

fn slot_error(error: SlotError, name: &str, span: &Span) -> RuntimeError {
    match error {
        SlotError::Uninitialised => RuntimeError::new(
            RuntimeErrorKind::UninitialisedVariable {
                name: name.to_string(),
            },
            span.clone(),
        ),
        SlotError::Unbound => RuntimeError::internal(format!("undefined name `{}`", name), span.clone()),
    }
}

fn lookup_type<W: Write>(
    interpreter: &Interpreter<'_, W>,
    node: NodeId,
    name: &str,
    span: &Span,
) -> Result<Rc<TypeValue>, RuntimeError> {
    let decl = resolved_decl(interpreter, node, name, span)?;
    match interpreter.env.get(name, decl) {
        Ok(Value::Type(ty)) => Ok(ty),
        Ok(_) => Err(RuntimeError::internal(format!("`{}` is not a type", name), span.clone())),
        Err(error) => Err(slot_error(error, name, span)),
    }
}

fn bind_method(receiver: &Rc<Environment>, name: &str, span: &Span) -> Result<Value, RuntimeError> {
    let method = receiver
        .class()
        .and_then(|class| class.methods.get(name))
        .ok_or_else(|| RuntimeError::internal(format!("no method `{}` on receiver", name), span.clone()))?;

    Ok(Value::BoundMethod(Rc::new(BoundMethod {
        receiver: receiver.clone(),
        method: method.clone(),
    })))
}

fn is_method<W: Write>(interpreter: &Interpreter<'_, W>, node: NodeId) -> bool {
    matches!(
        interpreter.annotations.decl_of(node).map(|decl| &decl.kind),
        Some(DeclKind::Method)
    )
}

fn eval_symbol<W: Write>(
    interpreter: &mut Interpreter<'_, W>,
    symbol: &SymbolExpr,
) -> Result<Value, RuntimeError> {
    // a method named from inside its box is bound to the current receiver
    if is_method(interpreter, symbol.id) {
        let receiver = interpreter.env.receiver().ok_or_else(|| {
            RuntimeError::internal(format!("method `{}` used outside of a box", symbol.value), symbol.span.clone())
        })?;
        return bind_method(&receiver, &symbol.value, &symbol.span);
    }

    let decl = resolved_decl(interpreter, symbol.id, &symbol.value, &symbol.span)?;
    interpreter
        .env
        .get(&symbol.value, decl)
        .map_err(|error| slot_error(error, &symbol.value, &symbol.span))
}

fn eval_array<W: Write>(
    interpreter: &mut Interpreter<'_, W>,
    array: &ArrayExpr,
) -> Result<Value, RuntimeError> {
    let component = match interpreter.type_of(array.id) {
        Some(Type::Array(component)) => Some(&**component),
        _ => None,
    };

    let mut elements = Vec::with_capacity(array.elements.len());
    for element in &array.elements {
        elements.push(eval_expression(interpreter, element)?.coerce(component));
    }

    Ok(Value::Array(Rc::new(RefCell::new(elements))))
}

fn eval_prefix<W: Write>(
    interpreter: &mut Interpreter<'_, W>,
    prefix: &PrefixExpr,
) -> Result<Value, RuntimeError> {
    let operand = eval_expression(interpreter, &prefix.right_expr)?;

    match (prefix.operator, operand) {
        (PrefixOperator::Not, Value::Bool(value)) => Ok(Value::Bool(!value)),
        (PrefixOperator::Negate, Value::Int(value)) => Ok(Value::Int(value.wrapping_neg())),
        (PrefixOperator::Negate, Value::Float(value)) => Ok(Value::Float(-value)),
        (operator, other) => Err(RuntimeError::internal(
            format!("cannot apply `{}` to {}", operator, other.type_name()),
            prefix.span.clone(),
        )),
    }
}

fn eval_binary<W: Write>(
    interpreter: &mut Interpreter<'_, W>,
    binary: &BinaryExpr,
) -> Result<Value, RuntimeError> {
    match binary.operator {
        BinaryOperator::And => {
            let value = eval_condition(interpreter, &binary.left)? && eval_condition(interpreter, &binary.right)?;
            return Ok(Value::Bool(value));
        }
        BinaryOperator::Or => {
            let value = eval_condition(interpreter, &binary.left)? || eval_condition(interpreter, &binary.right)?;
            return Ok(Value::Bool(value));
        }
        _ => {}
    }

    let left = eval_expression(interpreter, &binary.left)?;
    let right = eval_expression(interpreter, &binary.right)?;

    if binary.operator == BinaryOperator::Add && interpreter.type_of(binary.id) == Some(&Type::String) {
        return Ok(Value::String(format!("{}{}", left, right)));
    }

    match binary.operator {
        BinaryOperator::Equal => Ok(Value::Bool(left.equals(&right))),
        BinaryOperator::NotEqual => Ok(Value::Bool(!left.equals(&right))),
        operator => match (left, right) {
            (Value::Int(a), Value::Int(b)) => int_binary(operator, a, b, &binary.span),
            (Value::Int(a), Value::Float(b)) => float_binary(operator, a as f64, b, &binary.span),
            (Value::Float(a), Value::Int(b)) => float_binary(operator, a, b as f64, &binary.span),
            (Value::Float(a), Value::Float(b)) => float_binary(operator, a, b, &binary.span),
            (left, right) => Err(RuntimeError::internal(
                format!("cannot {} {} with {}", operator.verb(), left.type_name(), right.type_name()),
                binary.span.clone(),
            )),
        },
    }
}

/// Integer arithmetic wraps on overflow.
fn int_binary(operator: BinaryOperator, a: i64, b: i64, span: &Span) -> Result<Value, RuntimeError> {
    let value = match operator {
        BinaryOperator::Add => Value::Int(a.wrapping_add(b)),
        BinaryOperator::Subtract => Value::Int(a.wrapping_sub(b)),
        BinaryOperator::Multiply => Value::Int(a.wrapping_mul(b)),
        BinaryOperator::Divide | BinaryOperator::Remainder if b == 0 => {
            return Err(RuntimeError::new(RuntimeErrorKind::DivisionByZero, span.clone()))
        }
        BinaryOperator::Divide => Value::Int(a.wrapping_div(b)),
        BinaryOperator::Remainder => Value::Int(a.wrapping_rem(b)),
        BinaryOperator::Less => Value::Bool(a < b),
        BinaryOperator::LessEqual => Value::Bool(a <= b),
        BinaryOperator::Greater => Value::Bool(a > b),
        BinaryOperator::GreaterEqual => Value::Bool(a >= b),
        operator => {
            return Err(RuntimeError::internal(
                format!("`{}` is not an arithmetic operator", operator),
                span.clone(),
            ))
        }
    };
    Ok(value)
}

fn float_binary(operator: BinaryOperator, a: f64, b: f64, span: &Span) -> Result<Value, RuntimeError> {
    let value = match operator {
        BinaryOperator::Add => Value::Float(a + b),
        BinaryOperator::Subtract => Value::Float(a - b),
        BinaryOperator::Multiply => Value::Float(a * b),
        BinaryOperator::Divide => Value::Float(a / b),
        BinaryOperator::Remainder => Value::Float(a % b),
        BinaryOperator::Less => Value::Bool(a < b),
        BinaryOperator::LessEqual => Value::Bool(a <= b),
        BinaryOperator::Greater => Value::Bool(a > b),
        BinaryOperator::GreaterEqual => Value::Bool(a >= b),
        operator => {
            return Err(RuntimeError::internal(
                format!("`{}` is not an arithmetic operator", operator),
                span.clone(),
            ))
        }
    };
    Ok(value)
}

fn expect_index(value: Value, length: usize, span: &Span) -> Result<usize, RuntimeError> {
    let Value::Int(index) = value else {
        return Err(RuntimeError::internal(
            format!("array index is a {}", value.type_name()),
            span.clone(),
        ));
    };

    if index < 0 || index as usize >= length {
        return Err(RuntimeError::new(
            RuntimeErrorKind::IndexOutOfBounds { index, length },
            span.clone(),
        ));
    }
    Ok(index as usize)
}

fn expect_array(
    value: Value,
    action: &str,
    span: &Span,
) -> Result<Rc<RefCell<Vec<Value>>>, RuntimeError> {
    match value {
        Value::Array(elements) => Ok(elements),
        Value::Null => Err(null_reference(action, span)),
        other => Err(RuntimeError::internal(
            format!("{} a {}", action, other.type_name()),
            span.clone(),
        )),
    }
}

fn eval_assignment<W: Write>(
    interpreter: &mut Interpreter<'_, W>,
    assignment: &AssignmentExpr,
) -> Result<Value, RuntimeError> {
    let ty = interpreter.type_of(assignment.id);

    match assignment.assignee.unparenthesized() {
        Expr::Symbol(symbol) => {
            let decl = resolved_decl(interpreter, symbol.id, &symbol.value, &symbol.span)?;
            let value = eval_expression(interpreter, &assignment.value)?.coerce(ty);
            interpreter
                .env
                .assign(&symbol.value, decl, value.clone())
                .map_err(|error| slot_error(error, &symbol.value, &symbol.span))?;
            Ok(value)
        }
        Expr::Index(index) => {
            let array = eval_expression(interpreter, &index.array)?;
            let position = eval_expression(interpreter, &index.index)?;
            let value = eval_expression(interpreter, &assignment.value)?.coerce(ty);

            let elements = expect_array(array, "assigning into an array", &index.span)?;
            let slot = expect_index(position, elements.borrow().len(), &index.span)?;
            elements.borrow_mut()[slot] = value.clone();
            Ok(value)
        }
        Expr::FieldAccess(access) => {
            let receiver = eval_expression(interpreter, &access.receiver)?;
            let value = eval_expression(interpreter, &assignment.value)?.coerce(ty);

            match receiver {
                Value::Struct(instance) => {
                    let slot = instance.def.field_index(&access.field).ok_or_else(|| {
                        RuntimeError::internal(format!("no field `{}`", access.field), access.span.clone())
                    })?;
                    instance.fields.borrow_mut()[slot] = value.clone();
                    Ok(value)
                }
                Value::Null => Err(null_reference(format!("assigning field `{}`", access.field), &access.span)),
                other => Err(RuntimeError::internal(
                    format!("cannot assign a field of a {}", other.type_name()),
                    access.span.clone(),
                )),
            }
        }
        Expr::BoxAccess(access) => {
            let receiver = eval_expression(interpreter, &access.receiver)?;
            let value = eval_expression(interpreter, &assignment.value)?.coerce(ty);

            match receiver {
                Value::Box(instance) if instance.assign_local(&access.member, value.clone()) => Ok(value),
                Value::Null => Err(null_reference(format!("assigning attribute `{}`", access.member), &access.span)),
                _ => Err(RuntimeError::internal(
                    format!("no attribute `{}` to assign", access.member),
                    access.span.clone(),
                )),
            }
        }
        other => Err(RuntimeError::internal("invalid assignment target", other.get_span().clone())),
    }
}

fn eval_call<W: Write>(
    interpreter: &mut Interpreter<'_, W>,
    call: &CallExpr,
) -> Result<Value, RuntimeError> {
    let callee = eval_expression(interpreter, &call.callee)?;

    let mut arguments = Vec::with_capacity(call.arguments.len());
    for argument in &call.arguments {
        arguments.push(eval_expression(interpreter, argument)?);
    }

    match callee {
        Value::Function(closure) => interpreter.call_function(&closure.decl, &closure.env, arguments, &call.span),
        Value::BoundMethod(bound) => interpreter.call_function(&bound.method, &bound.receiver, arguments, &call.span),
        Value::Constructor(def) => Ok(interpreter.construct(&def, arguments)),
        Value::Builtin(builtin) => call_builtin(interpreter, builtin, arguments, &call.span),
        Value::Null => Err(null_reference("calling a function", &call.span)),
        other => Err(RuntimeError::internal(
            format!("cannot call a {}", other.type_name()),
            call.span.clone(),
        )),
    }
}

fn eval_index<W: Write>(
    interpreter: &mut Interpreter<'_, W>,
    index: &IndexExpr,
) -> Result<Value, RuntimeError> {
    let array = eval_expression(interpreter, &index.array)?;
    let position = eval_expression(interpreter, &index.index)?;

    let elements = expect_array(array, "indexing an array", &index.span)?;
    let elements = elements.borrow();
    let slot = expect_index(position, elements.len(), &index.span)?;
    Ok(elements[slot].clone())
}

fn eval_field_access<W: Write>(
    interpreter: &mut Interpreter<'_, W>,
    access: &FieldAccessExpr,
) -> Result<Value, RuntimeError> {
    let receiver = eval_expression(interpreter, &access.receiver)?;

    match receiver {
        Value::Array(elements) if access.field == "length" => Ok(Value::Int(elements.borrow().len() as i64)),
        Value::Struct(instance) => {
            let slot = instance.def.field_index(&access.field).ok_or_else(|| {
                RuntimeError::internal(format!("no field `{}`", access.field), access.span.clone())
            })?;
            let value = instance.fields.borrow()[slot].clone();
            Ok(value)
        }
        Value::Null => Err(null_reference(format!("accessing field `{}`", access.field), &access.span)),
        other => Err(RuntimeError::internal(
            format!("no field `{}` on a {}", access.field, other.type_name()),
            access.span.clone(),
        )),
    }
}

fn eval_box_access<W: Write>(
    interpreter: &mut Interpreter<'_, W>,
    access: &BoxAccessExpr,
) -> Result<Value, RuntimeError> {
    let receiver = eval_expression(interpreter, &access.receiver)?;

    match receiver {
        Value::Box(instance) if is_method(interpreter, access.id) => {
            bind_method(&instance, &access.member, &access.span)
        }
        Value::Box(instance) => instance.get_local(&access.member).ok_or_else(|| {
            RuntimeError::internal(format!("no attribute `{}`", access.member), access.span.clone())
        }),
        Value::Null => Err(null_reference(format!("accessing box member `{}`", access.member), &access.span)),
        other => Err(RuntimeError::internal(
            format!("no box member `{}` on a {}", access.member, other.type_name()),
            access.span.clone(),
        )),
    }
}
