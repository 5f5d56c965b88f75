//! Unit tests for the type checker.
//!
//! Programs are parsed from source and resolved; tests assert either on the
//! computed types or on the messages of the collected errors.

use std::rc::Rc;

use crate::{
    ast::ast::{Expr, Program, Stmt},
    errors::errors::{SemanticError, SemanticErrorKind},
    lexer::lexer::tokenize,
    parser::parser::parse,
};

use super::{
    scope::DeclKind,
    type_checker::{resolve, Annotations},
    types::Type,
};

fn check(source: &str) -> (Program, Result<Annotations, Vec<SemanticError>>) {
    let tokens = tokenize(source.to_string(), Some("test.sigh".to_string())).unwrap();
    let program = parse(tokens, Rc::new("test.sigh".to_string())).unwrap();
    let result = resolve(&program);
    (program, result)
}

fn assert_ok(source: &str) -> (Program, Annotations) {
    match check(source) {
        (program, Ok(annotations)) => (program, annotations),
        (_, Err(errors)) => {
            let messages: Vec<String> = errors.iter().map(|e| e.message()).collect();
            panic!("expected {:?} to check, got {:?}", source, messages)
        }
    }
}

fn errors_of(source: &str) -> Vec<SemanticError> {
    match check(source) {
        (_, Ok(_)) => panic!("expected {:?} to be rejected", source),
        (_, Err(errors)) => errors,
    }
}

fn assert_error(source: &str, message: &str) {
    let errors = errors_of(source);
    assert!(
        errors.iter().any(|e| e.message().contains(message)),
        "expected an error containing {:?} for {:?}, got {:?}",
        message,
        source,
        errors.iter().map(|e| e.message()).collect::<Vec<_>>()
    );
}

/// Type of the value of the last `return` statement of the program.
fn returned_type(source: &str) -> Type {
    let (program, annotations) = assert_ok(source);
    let value = match program.body.last() {
        Some(Stmt::Return(ret)) => ret.value.as_ref().map(Expr::id),
        _ => None,
    };
    let value = value.expect("program must end with `return <expr>`");
    annotations.type_of(value).cloned().expect("returned expression has no type")
}

#[test]
fn test_literal_types() {
    assert_eq!(returned_type("return 1"), Type::Int);
    assert_eq!(returned_type("return 1.5"), Type::Float);
    assert_eq!(returned_type("return \"s\""), Type::String);
    assert_eq!(returned_type("return false"), Type::Bool);
    assert_eq!(returned_type("return null"), Type::Null);
    assert_eq!(returned_type("return [1, 2]"), Type::array_of(Type::Int));
}

#[test]
fn test_arithmetic_types() {
    assert_eq!(returned_type("return 1 + 2"), Type::Int);
    assert_eq!(returned_type("return 1 + 2.0"), Type::Float);
    assert_eq!(returned_type("return 7 % 2"), Type::Int);
    assert_eq!(returned_type("return -(3.0)"), Type::Float);
    assert_eq!(returned_type("return [1, 2.0]"), Type::array_of(Type::Float));
}

#[test]
fn test_string_concatenation() {
    assert_eq!(returned_type("return \"a\" + 1"), Type::String);
    assert_eq!(returned_type("return [1] + \"a\""), Type::String);
    assert_eq!(returned_type("struct S {} return \"\" + S"), Type::String);
}

#[test]
fn test_comparisons() {
    assert_eq!(returned_type("return 1 < 2.0"), Type::Bool);
    assert_eq!(returned_type("return 1 == 1.0"), Type::Bool);
    assert_eq!(returned_type("return null == \"a\""), Type::Bool);
    assert_eq!(returned_type("return !(true && false)"), Type::Bool);
}

#[test]
fn test_arithmetic_errors() {
    assert_error("return 1 + true", "Trying to add Int with Bool");
    assert_error("return 1 + [1]", "Trying to add Int with Int[]");
    assert_error("return \"a\" * 1", "Trying to multiply String with Int");
    assert_error("return -true", "Trying to negate a non-numeric type: Bool");
    assert_error("return !1", "Trying to negate type: Int");
}

#[test]
fn test_logic_and_comparison_errors() {
    assert_error("return 1 && true", "Attempting to perform binary logic on non-boolean type: Int");
    assert_error("return true < 1", "Attempting to perform arithmetic comparison on non-numeric type: Bool");
    assert_error("return true == 1", "Trying to compare incomparable types Bool and Int");
    assert_error("return null == 1", "Trying to compare incomparable types Null and Int");
}

#[test]
fn test_unresolved_reference() {
    let errors = errors_of("return x");
    assert_eq!(errors.len(), 1);
    assert_eq!(errors[0].message(), "Could not resolve: x");
    assert!(matches!(errors[0].kind(), SemanticErrorKind::UnresolvedReference { .. }));
}

#[test]
fn test_used_before_declaration() {
    let errors = errors_of("return x + 1; var x: Int = 2");
    assert_eq!(errors.len(), 1);
    assert_eq!(errors[0].message(), "Variable used before declaration: x");
}

#[test]
fn test_variable_does_not_see_itself() {
    assert_error("var x: Int = x + 1", "Variable used before declaration: x");
    // the outer binding is used instead
    assert_ok("var x: Int = 1; { var x: Int = x + 1 }");
}

#[test]
fn test_shadowing_in_nested_block() {
    // the inner `x` is a String only after its declaration
    assert_ok("var x: Int = 1\n{ print(\"\" + (x + 1)); var x: String = \"s\"; print(x) }\nprint(\"\" + x)");
    assert_error("var x: Int = 1\n{ var x: String = \"s\"; print(\"\" + (x + 1)); x = 2 }", "Trying to assign a value of type Int");
}

#[test]
fn test_duplicate_declaration() {
    let errors = errors_of("var x: Int = 1; var x: Int = 2");
    assert!(matches!(
        errors[0].kind(),
        SemanticErrorKind::DuplicateDeclaration { name } if name == "x"
    ));
    assert_error("fun f() {} fun f() {}", "conflicts with an earlier declaration");
    assert_error("fun f(a: Int, a: Int) {}", "conflicts with an earlier declaration");
}

#[test]
fn test_forward_references_to_functions_and_types() {
    assert_ok("return f()\nfun f(): Int { return 1 }");
    assert_ok("var p: P = $P(1)\nstruct P { var x: Int }");
    assert_ok("var c: Car = create Car()\nbox Car { attr speed: Int }");
    assert_ok("fun even(n: Int): Bool { if (n == 0) return true else return odd(n - 1) }\nfun odd(n: Int): Bool { if (n == 0) return false else return even(n - 1) }");
}

#[test]
fn test_var_declaration_forms() {
    assert_ok("var x: Float = 1");
    assert_ok("var s: String = null; var a: Int[] = null");
    assert_ok("var x: Int");
    assert_eq!(returned_type("var x = 2.5; return x"), Type::Float);
    assert_error("var x = null", "Cannot infer the type of variable `x` from a Null initializer");
    assert_error("fun f() {} var x = f()", "Cannot infer the type of variable `x` from a Void initializer");
    assert_error("var x: Int = 1.5", "incompatible initializer type provided for variable `x`: expected Int but got Float");
}

#[test]
fn test_incompatible_box_initializer() {
    assert_error(
        "box GoodBox { attr v: Int }\nbox BadBox { attr v: Int }\nvar goodBox: BadBox = create GoodBox()",
        "incompatible initializer type provided for variable `goodBox`: expected BadBox but got GoodBox",
    );
}

#[test]
fn test_empty_array_takes_type_from_context() {
    assert_ok("var a: Int[] = []");
    assert_ok("var a: Int[][] = [[], [1]]");
    assert_ok("var a: String[] = [\"x\"]; a = []");
    assert_ok("fun f(a: Int[]): Int { return 0 } return f([])");
    assert_ok("fun g(): Float[] { return [] }");
}

#[test]
fn test_empty_array_without_context() {
    assert_error("var a = []", "Cannot infer the type of an empty array literal");
    assert_error("return []", "Cannot infer the type of an empty array literal");
    assert_error("var x: Int = []", "Trying to use an empty array literal where Int is expected");
}

#[test]
fn test_array_errors() {
    assert_error("var a: Int[] = [1]; return a[true]", "Indexing an array using a non-Int-valued expression");
    assert_error("var a: Int = 1; return a[0]", "Trying to index a non-array expression of type Int");
    assert_error("return [1, \"a\"]", "Could not find common supertype in array literal: Int and String");
}

#[test]
fn test_array_length() {
    assert_eq!(returned_type("var a: Int[] = [1]; return a.length"), Type::Int);
    assert_error("var a: Int[] = [1]; a.length = 2", "Trying to assign a value to a non-compatible lvalue.");
    assert_error("var a: Int[] = [1]; return a.size", "Trying to access field size on an expression of type Int[]");
}

#[test]
fn test_assignments() {
    assert_eq!(returned_type("var x: Float = 1.0; return x = 2"), Type::Float);
    assert_ok("var a: Int[] = [1]; a[0] = 3");
    assert_ok("struct P { var x: Int } var p: P = $P(1); p.x = 4");
    assert_error("var x: Int = 1; x = \"s\"", "Trying to assign a value of type String to a non-compatible lvalue of type Int.");
    assert_error("fun f() {} f = null", "Trying to assign a value to a non-compatible lvalue.");
    assert_error("struct S {} S = null", "Trying to assign a value to a non-compatible lvalue.");
    assert_error("1 = 2", "Trying to assign a value to a non-compatible lvalue.");
}

#[test]
fn test_calls() {
    assert_eq!(returned_type("fun add(a: Int, b: Int): Int { return a + b } return add(1, 2)"), Type::Int);
    assert_eq!(returned_type("return print(\"hi\")"), Type::String);
    assert_error("fun f(a: Int) {} f()", "wrong number of arguments, expected 1 but got 0");
    assert_error("var x: Int = 1; x()", "Trying to call a non-function expression of type Int");
    assert_error("print(1)", "argument 0: expected String but got Int");
}

#[test]
fn test_argument_errors_are_all_reported() {
    let errors = errors_of("fun f(s: String, i: Int) {}\nf(1, true)");
    let messages: Vec<String> = errors.iter().map(|e| e.message()).collect();
    assert_eq!(
        messages,
        ["argument 0: expected String but got Int", "argument 1: expected Int but got Bool"]
    );
}

#[test]
fn test_int_argument_for_float_parameter() {
    assert_ok("fun half(x: Float): Float { return x / 2 } return half(3)");
}

#[test]
fn test_conditions_must_be_bool() {
    assert_error("if (1) return 1", "If statement with a non-boolean condition of type: Int");
    assert_error("while (1) {}", "While statement with a non-boolean condition of type: Int");
}

#[test]
fn test_return_checks() {
    assert_error("fun f(): Int {}", "Missing return in function");
    assert_error("fun f(): Int { if (true) return 1 }", "Missing return in function `f`");
    assert_error("fun f(): String { return true }", "Incompatible return type, expected String but got Bool");
    assert_error("fun f() { return 1 }", "Incompatible return type, expected Void but got Int");
    assert_error("fun f(): Int { return }", "Return without value in a function returning Int");
    assert_ok("fun f(): Int { if (true) return 1 else return 2 }");
    assert_ok("fun f(): Int { { return 1 } }");
    assert_ok("fun f() { return }");
    assert_ok("fun f(): Void {}");
}

#[test]
fn test_structs() {
    assert_eq!(
        returned_type("struct P { var x: Int; var y: Float } return $P(1, 2).y"),
        Type::Float
    );
    assert_error("struct P { var x: Int; var y: Int } return $P(1, 2).z", "Trying to access missing field z on struct P");
    assert_error("struct P { var x: Int } return $P(\"a\")", "argument 0: expected Int but got String");
    assert_error("box B {} return $B()", "`B` does not name a struct");
    assert_error("struct P { var x: Int } var p: P = $P(1); return p#x", "Trying to access a box member on an expression of type P");
}

#[test]
fn test_structs_are_nominal() {
    assert_error(
        "struct A { var x: Int } struct B { var x: Int } var b: B = $A(1)",
        "expected B but got A",
    );
}

#[test]
fn test_box_members() {
    let source = "box Car {\n  attr speed: Int\n  meth get(): Int { return speed }\n}\nvar c: Car = create Car()\nreturn c#get() + c#speed";
    assert_eq!(returned_type(source), Type::Int);

    assert_error("box Car { attr speed: Int } var c: Car = create Car(); return c#fly", "Could not resolve: Car#fly");
    assert_error("box BadBox { attr v: Int } var b: BadBox = create BadBox(); return b.v", "Trying to access a field on an expression of type BadBox");
    assert_error("struct S {} return create S()", "`S` does not name a box");
}

#[test]
fn test_attribute_used_before_its_declaration() {
    assert_ok("box Car {\n  meth speed_up() { speed = speed + 1 }\n  attr speed: Int\n}");
}

#[test]
fn test_attributes_are_invisible_outside_the_box() {
    assert_error("box Car { attr speed: Int } return speed", "Could not resolve: speed");
}

#[test]
fn test_method_is_not_an_lvalue() {
    assert_error(
        "box Wheels { attr size: Int meth get_size(): Int { return size } }\nvar wheels: Wheels = create Wheels()\nwheels#get_size = 3",
        "Trying to assign a value to a non-compatible lvalue.",
    );
}

#[test]
fn test_box_access_records_declaration() {
    let (program, annotations) = assert_ok("box Car { attr speed: Int } var c: Car = create Car(); return c#speed");
    let Some(Stmt::Return(ret)) = program.body.last() else {
        panic!("expected a return");
    };
    let decl = annotations.decl_of(ret.value.as_ref().unwrap().id()).unwrap();
    assert_eq!(decl.name, "speed");
    assert_eq!(decl.kind, DeclKind::Attribute);
}

#[test]
fn test_type_values() {
    assert_eq!(returned_type("var t: Type = Int; return t"), Type::Type);
    assert_error("var x: print = 1", "`print` does not name a type");
    assert_error("var x: Foo = 1", "Could not resolve: Foo");
}

#[test]
fn test_errors_do_not_cascade() {
    let errors = errors_of("var x = y\nreturn x + 1");
    assert_eq!(errors.len(), 1);
    assert_eq!(errors[0].message(), "Could not resolve: y");
}

#[test]
fn test_errors_are_sorted_by_position() {
    let errors = errors_of("fun f(): String { return g }\nvar x: Int = true\nreturn z");
    let starts: Vec<u32> = errors.iter().map(|e| e.span().start.0).collect();
    let mut sorted = starts.clone();
    sorted.sort();

    assert_eq!(errors.len(), 3);
    assert_eq!(starts, sorted);
    assert_eq!(errors[2].message(), "Could not resolve: z");
}

#[test]
fn test_declaration_in_unbraced_body_is_local_to_it() {
    assert_error("if (false) var x: Int = 1\nreturn x", "Could not resolve: x");
    assert_error("return f()\nif (false) fun f(): Int { return 1 }", "Could not resolve: f");
    assert_error("var i: Int = 0\nwhile (i > 0) var y: Int = i\nreturn y", "Could not resolve: y");
    assert_ok("if (true) var x: Int = 1 else var x: String = \"a\"\nvar x: Bool = true");
}

#[test]
fn test_hoisted_function_may_read_later_variables() {
    assert_ok("var r: Int = f()\nvar x: Int = 1\nfun f(): Int { return x }\nreturn r");
    let source = "var x: Int = 1\n{ var r: Int = f(); var x: Int = 2; fun f(): Int { return x }; return r }";
    let (program, annotations) = assert_ok(source);

    // the `x` read by `f` is the block's, not the outer one
    let Some(Stmt::Block(block)) = program.body.last() else {
        panic!("expected a block");
    };
    let Some(Stmt::FnDecl(function)) = block.body.get(2) else {
        panic!("expected a function");
    };
    let Some(Stmt::Return(ret)) = function.body.body.first() else {
        panic!("expected a return");
    };
    let Some(Stmt::VarDecl(inner)) = block.body.get(1) else {
        panic!("expected a variable");
    };
    let decl = annotations.decl_of(ret.value.as_ref().unwrap().id()).unwrap();
    assert_eq!(decl.node, Some(inner.id));
}
