use std::io::Write;

use crate::{
    ast::{
        ast::Stmt,
        statements::{BlockStmt, IfStmt, VarDeclStmt, WhileStmt},
    },
    errors::errors::RuntimeError,
};

use super::{
    environment::Environment,
    expr::{eval_condition, eval_expression},
    interpreter::Interpreter,
    value::Value,
};

/// How a statement finished.
#[derive(Debug, Clone)]
pub enum Completion {
    Normal,
    /// A `return` unwinding to the nearest call, or to the root.
    Return(Value),
}

/// Executes statements in the current environment, after binding the
/// functions, structs and boxes they declare and reserving a slot for each
/// of their variables.
pub fn exec_statements<W: Write>(
    interpreter: &mut Interpreter<'_, W>,
    statements: &[Stmt],
) -> Result<Completion, RuntimeError> {
    for stmt in statements {
        match stmt {
            Stmt::FnDecl(decl) => interpreter.define_function(decl),
            Stmt::StructDecl(decl) => interpreter.define_struct(decl),
            Stmt::BoxDecl(decl) => interpreter.define_box(decl),
            Stmt::VarDecl(decl) => interpreter.env.reserve(&decl.identifier, decl.id),
            _ => {}
        }
    }

    for stmt in statements {
        if let Completion::Return(value) = exec_statement(interpreter, stmt)? {
            return Ok(Completion::Return(value));
        }
    }

    Ok(Completion::Normal)
}

pub fn exec_block<W: Write>(
    interpreter: &mut Interpreter<'_, W>,
    block: &BlockStmt,
) -> Result<Completion, RuntimeError> {
    let env = Environment::child(&interpreter.env);
    interpreter.with_env(env, |interpreter| exec_statements(interpreter, &block.body))
}

pub fn exec_statement<W: Write>(
    interpreter: &mut Interpreter<'_, W>,
    statement: &Stmt,
) -> Result<Completion, RuntimeError> {
    match statement {
        Stmt::Block(block) => exec_block(interpreter, block),
        Stmt::Expression(stmt) => {
            eval_expression(interpreter, &stmt.expression)?;
            Ok(Completion::Normal)
        }
        Stmt::VarDecl(decl) => exec_var_decl(interpreter, decl),
        // bound when the enclosing block was entered
        Stmt::FnDecl(_) | Stmt::StructDecl(_) | Stmt::BoxDecl(_) => Ok(Completion::Normal),
        Stmt::If(stmt) => exec_if(interpreter, stmt),
        Stmt::While(stmt) => exec_while(interpreter, stmt),
        Stmt::Return(stmt) => {
            let value = match &stmt.value {
                Some(value) => eval_expression(interpreter, value)?,
                None => Value::Void,
            };
            Ok(Completion::Return(value))
        }
    }
}

fn exec_var_decl<W: Write>(
    interpreter: &mut Interpreter<'_, W>,
    decl: &VarDeclStmt,
) -> Result<Completion, RuntimeError> {
    let ty = interpreter.decl_type(decl.id);

    let value = match &decl.assigned_value {
        Some(value) => eval_expression(interpreter, value)?.coerce(ty),
        None => ty.map_or(Value::Null, Value::default_for),
    };

    interpreter.env.define(&decl.identifier, Some(decl.id), value);
    Ok(Completion::Normal)
}

fn exec_if<W: Write>(
    interpreter: &mut Interpreter<'_, W>,
    stmt: &IfStmt,
) -> Result<Completion, RuntimeError> {
    if eval_condition(interpreter, &stmt.condition)? {
        exec_body(interpreter, &stmt.then_body)
    } else if let Some(else_body) = &stmt.else_body {
        exec_body(interpreter, else_body)
    } else {
        Ok(Completion::Normal)
    }
}

fn exec_while<W: Write>(
    interpreter: &mut Interpreter<'_, W>,
    stmt: &WhileStmt,
) -> Result<Completion, RuntimeError> {
    while eval_condition(interpreter, &stmt.condition)? {
        if let Completion::Return(value) = exec_body(interpreter, &stmt.body)? {
            return Ok(Completion::Return(value));
        }
    }

    Ok(Completion::Normal)
}

/// Runs a branch or loop body. A body that is not a block still gets a
/// frame of its own.
fn exec_body<W: Write>(
    interpreter: &mut Interpreter<'_, W>,
    body: &Stmt,
) -> Result<Completion, RuntimeError> {
    match body {
        Stmt::Block(block) => exec_block(interpreter, block),
        stmt => {
            let env = Environment::child(&interpreter.env);
            interpreter.with_env(env, |interpreter| exec_statements(interpreter, std::slice::from_ref(stmt)))
        }
    }
}
