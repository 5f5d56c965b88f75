//! Unit tests for the parser module.
//!
//! This module contains tests for parsing various language constructs including:
//! - Variable, function, struct and box declarations
//! - Expressions and operator precedence
//! - Control flow statements
//! - Syntax errors

use std::rc::Rc;

use crate::{
    ast::{
        ast::{Expr, Program, Stmt, TypeNode},
        expressions::{BinaryOperator, PrefixOperator},
        statements::BoxMember,
    },
    errors::errors::{Error, ErrorImpl},
    lexer::lexer::tokenize,
};

use super::parser::parse;

fn parse_source(source: &str) -> Result<Program, Error> {
    let tokens = tokenize(source.to_string(), Some("test.sigh".to_string())).unwrap();
    parse(tokens, Rc::new("test.sigh".to_string()))
}

fn parse_ok(source: &str) -> Program {
    match parse_source(source) {
        Ok(program) => program,
        Err(error) => panic!("failed to parse {:?}: {}", source, error),
    }
}

/// The expression of the single `return` statement in `source`.
fn returned_expr(source: &str) -> Expr {
    let program = parse_ok(source);
    match program.body.into_iter().last() {
        Some(Stmt::Return(ret)) => ret.value.expect("return without value"),
        other => panic!("expected a return statement, got {:?}", other),
    }
}

#[test]
fn test_parse_variable_declaration() {
    let program = parse_ok("var x: Int = 42");
    let Stmt::VarDecl(decl) = &program.body[0] else {
        panic!("expected a variable declaration");
    };

    assert_eq!(decl.identifier, "x");
    assert!(matches!(&decl.explicit_type, Some(TypeNode::Symbol(t)) if t.name == "Int"));
    assert!(matches!(&decl.assigned_value, Some(Expr::Int(i)) if i.value == 42));
}

#[test]
fn test_parse_variable_declaration_forms() {
    assert!(parse_source("var x = 1").is_ok());
    assert!(parse_source("var x: Int[][]").is_ok());
    assert!(parse_source("var x").is_err());
}

#[test]
fn test_parse_array_type() {
    let program = parse_ok("var grid: Int[][] = []");
    let Stmt::VarDecl(decl) = &program.body[0] else {
        panic!("expected a variable declaration");
    };

    assert_eq!(decl.explicit_type.as_ref().unwrap().to_string(), "Int[][]");
}

#[test]
fn test_parse_function_declaration() {
    let program = parse_ok("fun add(a: Int, b: Int): Int { return a + b }");
    let Stmt::FnDecl(function) = &program.body[0] else {
        panic!("expected a function declaration");
    };

    assert_eq!(function.identifier, "add");
    assert_eq!(function.parameters.len(), 2);
    assert_eq!(function.parameters[1].name, "b");
    assert!(function.return_type.is_some());
    assert_eq!(function.body.body.len(), 1);
}

#[test]
fn test_parse_void_function() {
    let program = parse_ok("fun f() {} ; f()");
    let Stmt::FnDecl(function) = &program.body[0] else {
        panic!("expected a function declaration");
    };

    assert!(function.return_type.is_none());
    assert!(function.parameters.is_empty());
    assert!(matches!(program.body[1], Stmt::Expression(_)));
}

#[test]
fn test_parse_struct_declaration() {
    let program = parse_ok("struct P { var x: Int; var y: Int }\nstruct Pair { var a: Int var b: Int }\nstruct S{}");
    let Stmt::StructDecl(point) = &program.body[0] else {
        panic!("expected a struct declaration");
    };

    assert_eq!(point.name, "P");
    assert_eq!(point.fields.iter().map(|f| f.name.as_str()).collect::<Vec<_>>(), ["x", "y"]);
    assert!(matches!(&program.body[2], Stmt::StructDecl(s) if s.fields.is_empty()));
}

#[test]
fn test_parse_box_declaration() {
    let source = "box Car {\n  meth get(): Int { return speed }\n  attr speed: Int\n}";
    let program = parse_ok(source);
    let Stmt::BoxDecl(car) = &program.body[0] else {
        panic!("expected a box declaration");
    };

    assert_eq!(car.name, "Car");
    assert!(matches!(&car.members[0], BoxMember::Method(m) if m.identifier == "get"));
    assert!(matches!(&car.members[1], BoxMember::Attribute(a) if a.name == "speed"));
    assert_eq!(car.attributes().count(), 1);
    assert_eq!(car.methods().count(), 1);
}

#[test]
fn test_parse_box_rejects_var_members() {
    assert!(parse_source("box Car { var speed: Int }").is_err());
}

#[test]
fn test_operator_precedence() {
    let expr = returned_expr("return 1 + 2 * 3");
    let Expr::Binary(add) = expr else {
        panic!("expected a binary expression");
    };

    assert_eq!(add.operator, BinaryOperator::Add);
    assert!(matches!(*add.right, Expr::Binary(ref mul) if mul.operator == BinaryOperator::Multiply));
}

#[test]
fn test_left_associativity() {
    let Expr::Binary(sub) = returned_expr("return 7 - 2 - 1") else {
        panic!("expected a binary expression");
    };

    assert!(matches!(*sub.left, Expr::Binary(_)));
    assert!(matches!(*sub.right, Expr::Int(ref i) if i.value == 1));
}

#[test]
fn test_logical_precedence() {
    let Expr::Binary(or) = returned_expr("return a || b && c == d") else {
        panic!("expected a binary expression");
    };

    assert_eq!(or.operator, BinaryOperator::Or);
    let Expr::Binary(and) = *or.right else {
        panic!("expected &&");
    };
    assert_eq!(and.operator, BinaryOperator::And);
    assert!(matches!(*and.right, Expr::Binary(ref eq) if eq.operator == BinaryOperator::Equal));
}

#[test]
fn test_prefix_binds_tighter_than_binary() {
    let Expr::Binary(eq) = returned_expr("return !a == b") else {
        panic!("expected a binary expression");
    };

    assert!(matches!(*eq.left, Expr::Prefix(ref p) if p.operator == PrefixOperator::Not));
}

#[test]
fn test_assignment_is_right_associative() {
    let Expr::Assignment(outer) = returned_expr("return a = b = 3") else {
        panic!("expected an assignment");
    };

    assert!(matches!(*outer.assignee, Expr::Symbol(ref s) if s.value == "a"));
    assert!(matches!(*outer.value, Expr::Assignment(_)));
}

#[test]
fn test_literals() {
    assert!(matches!(returned_expr("return 42"), Expr::Int(_)));
    assert!(matches!(returned_expr("return 4.5"), Expr::Float(ref f) if f.value == 4.5));
    assert!(matches!(returned_expr("return \"hi\""), Expr::String(ref s) if s.value == "hi"));
    assert!(matches!(returned_expr("return true"), Expr::Bool(ref b) if b.value));
    assert!(matches!(returned_expr("return null"), Expr::Null(_)));
    assert!(matches!(returned_expr("return [1, 2, 3]"), Expr::Array(ref a) if a.elements.len() == 3));
    assert!(matches!(returned_expr("return []"), Expr::Array(ref a) if a.elements.is_empty()));
}

#[test]
fn test_postfix_chain() {
    // ((boxes[1])#value)
    let Expr::BoxAccess(access) = returned_expr("return boxes[1]#value") else {
        panic!("expected a box access");
    };
    assert_eq!(access.member, "value");
    assert!(matches!(*access.receiver, Expr::Index(_)));

    let Expr::FieldAccess(field) = returned_expr("return $P(1, 2).y") else {
        panic!("expected a field access");
    };
    assert_eq!(field.field, "y");
    let Expr::Call(call) = *field.receiver else {
        panic!("expected a constructor call");
    };
    assert!(matches!(*call.callee, Expr::Constructor(ref c) if c.name == "P"));
    assert_eq!(call.arguments.len(), 2);
}

#[test]
fn test_method_call() {
    let Expr::Call(call) = returned_expr("return car#get(1)") else {
        panic!("expected a call");
    };

    assert!(matches!(*call.callee, Expr::BoxAccess(ref b) if b.member == "get"));
}

#[test]
fn test_create_expression() {
    assert!(matches!(returned_expr("return create Car()"), Expr::Create(ref c) if c.name == "Car"));
    assert!(parse_source("return create Car").is_err());
}

#[test]
fn test_parse_if_else_chain() {
    let program = parse_ok("if (false) return 1 else if (true) return 2 else return 3");
    let Stmt::If(outer) = &program.body[0] else {
        panic!("expected an if statement");
    };

    assert!(matches!(outer.else_body.as_deref(), Some(Stmt::If(_))));
}

#[test]
fn test_parse_if_with_semicolon_before_else() {
    let program = parse_ok("if (true) return 1; else return 2");
    assert!(matches!(&program.body[0], Stmt::If(i) if i.else_body.is_some()));
}

#[test]
fn test_parse_while_loop() {
    let program = parse_ok("var i: Int = 0; while (i < 3) { print(\"\" + i); i = i + 1 }");
    let Stmt::While(while_stmt) = &program.body[1] else {
        panic!("expected a while statement");
    };

    assert!(matches!(*while_stmt.body, Stmt::Block(ref b) if b.body.len() == 2));
}

#[test]
fn test_optional_semicolons() {
    let with = parse_ok("var x: Int = 1; x = 2; return x");
    let without = parse_ok("var x: Int = 1\nx = 2\nreturn x");

    assert_eq!(with.body.len(), 3);
    assert_eq!(without.body.len(), 3);
}

#[test]
fn test_bare_return() {
    let program = parse_ok("return");
    assert!(matches!(&program.body[0], Stmt::Return(r) if r.value.is_none()));
}

#[test]
fn test_node_ids_are_unique() {
    let program = parse_ok("var x: Int = 1 + 2; return x");
    let Stmt::VarDecl(decl) = &program.body[0] else {
        panic!("expected a variable declaration");
    };
    let Some(Expr::Binary(binary)) = &decl.assigned_value else {
        panic!("expected a binary initializer");
    };

    let ids = [
        program.id,
        decl.id,
        binary.id,
        binary.left.id(),
        binary.right.id(),
        decl.explicit_type.as_ref().unwrap().id(),
        program.body[1].id(),
    ];
    for (i, a) in ids.iter().enumerate() {
        for b in &ids[i + 1..] {
            assert_ne!(a, b);
        }
    }
}

#[test]
fn test_spans() {
    let program = parse_ok("var x = 1\nreturn x + 20");
    let Stmt::Return(ret) = &program.body[1] else {
        panic!("expected a return");
    };

    assert_eq!(ret.span.start.0, 10);
    assert_eq!(ret.span.end.0, 23);
    assert_eq!(ret.value.as_ref().unwrap().get_span().start.0, 17);
}

#[test]
fn test_unexpected_token() {
    let error = parse_source("return )").unwrap_err();
    assert!(matches!(error.kind(), ErrorImpl::UnexpectedToken { token } if token == ")"));
}

#[test]
fn test_unclosed_block() {
    assert!(parse_source("{ var x = 1").is_err());
    assert!(parse_source("fun f( { }").is_err());
}

#[test]
fn test_number_too_large() {
    let error = parse_source("return 99999999999999999999").unwrap_err();
    assert!(matches!(error.kind(), ErrorImpl::NumberParseError { .. }));
}
