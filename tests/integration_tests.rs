//! Integration tests for the whole pipeline.
//!
//! These tests run complete programs from source code through tokenization,
//! parsing, semantic analysis and interpretation, and check the printed
//! output, the result value or the reported diagnostics.

use sigh::{errors::errors::ProgramError, render_error, run_source};

fn run(source: &str) -> (String, String) {
    let mut out = Vec::new();
    let value = match run_source(source, "main.sigh", &mut out) {
        Ok(value) => value,
        Err(error) => panic!("program failed: {}", error),
    };
    (value.to_string(), String::from_utf8(out).unwrap())
}

fn failure(source: &str) -> ProgramError {
    match run_source(source, "main.sigh", Vec::new()) {
        Ok(value) => panic!("expected the program to fail, it returned {}", value),
        Err(error) => error,
    }
}

#[test]
fn test_run_sorting_program() {
    let source = r#"
fun sort(a: Int[]) {
    var i: Int = 1
    while (i < a.length) {
        var j: Int = i
        while (j > 0 && a[j - 1] > a[j]) {
            var tmp: Int = a[j]
            a[j] = a[j - 1]
            a[j - 1] = tmp
            j = j - 1
        }
        i = i + 1
    }
}

var values: Int[] = [5, 3, 9, 1, 4]
sort(values)
print("" + values)
return values[0]
"#;
    let (value, output) = run(source);
    assert_eq!(output, "[1, 3, 4, 5, 9]\n");
    assert_eq!(value, "1");
}

#[test]
fn test_run_struct_program() {
    let source = r#"
struct Point {
    var x: Float
    var y: Float
}

fun add(a: Point, b: Point): Point {
    return $Point(a.x + b.x, a.y + b.y)
}

var p: Point = add($Point(1, 2), $Point(0.5, 0.5))
print("" + p)
return p.x
"#;
    let (value, output) = run(source);
    assert_eq!(output, "Point { x: 1.5, y: 2.5 }\n");
    assert_eq!(value, "1.5");
}

#[test]
fn test_run_box_program() {
    let source = r#"
box Account {
    attr balance: Int
    attr owner: String

    meth deposit(amount: Int) {
        balance = balance + amount
    }

    meth withdraw(amount: Int): Bool {
        if (amount > balance) return false
        balance = balance - amount
        return true
    }

    meth describe(): String {
        return owner + ": " + balance
    }
}

var account: Account = create Account()
account#owner = "papers"
account#deposit(10)
if (!account#withdraw(25)) print("refused")
account#withdraw(4)
print(account#describe())
return account#balance
"#;
    let (value, output) = run(source);
    assert_eq!(output, "refused\npapers: 6\n");
    assert_eq!(value, "6");
}

#[test]
fn test_run_mutual_recursion() {
    let source = r#"
return "" + even(10) + " " + odd(7)

fun even(n: Int): Bool {
    if (n == 0) return true
    return odd(n - 1)
}

fun odd(n: Int): Bool {
    if (n == 0) return false
    return even(n - 1)
}
"#;
    assert_eq!(run(source).0, "true true");
}

#[test]
fn test_syntax_error_is_reported() {
    let error = failure("var x: Int = @");
    assert!(matches!(error, ProgramError::Syntax(_)));
}

#[test]
fn test_semantic_errors_are_all_reported() {
    let source = "var x: Int = true\nprint(1)\nreturn y";
    let ProgramError::Semantic(errors) = failure(source) else {
        panic!("expected semantic errors");
    };

    let messages: Vec<String> = errors.iter().map(|e| e.message()).collect();
    assert_eq!(
        messages,
        [
            "incompatible initializer type provided for variable `x`: expected Int but got Bool",
            "argument 0: expected String but got Int",
            "Could not resolve: y",
        ]
    );
}

#[test]
fn test_program_with_semantic_errors_does_not_run() {
    let mut out = Vec::new();
    let result = run_source("print(\"hello\")\nreturn 1 + true", "main.sigh", &mut out);

    assert!(matches!(result, Err(ProgramError::Semantic(_))));
    assert!(out.is_empty());
}

#[test]
fn test_runtime_error_is_rendered_with_source_line() {
    let source = "var a: Int[] = [1, 2]\nreturn a[5]";
    let error = failure(source);
    assert!(matches!(error, ProgramError::Runtime(_)));

    let diagnostics = error.diagnostics();
    let rendered = render_error(diagnostics[0], source);
    assert!(rendered.starts_with("Error: IndexOutOfBounds"));
    assert!(rendered.contains("-> main.sigh"));
    assert!(rendered.contains("2 | return a[5]"));
}

#[test]
fn test_semantic_error_is_rendered_with_tip() {
    let source = "box BadBox { attr v: Int }\nvar b: BadBox = create BadBox()\nreturn b.v";
    let error = failure(source);

    let diagnostics = error.diagnostics();
    let rendered = render_error(diagnostics[0], source);
    assert!(rendered.starts_with("Error: WrongAccessOperator (box members are accessed with `#`, try `#v`)"));
    assert!(rendered.contains("3 | return b.v"));
}

#[test]
fn test_declaration_in_unbraced_branch_is_rejected_before_running() {
    for source in [
        "if (false) var x: Int = 1\nreturn x",
        "return f()\nif (false) fun f(): Int { return 1 }",
    ] {
        assert!(matches!(failure(source), ProgramError::Semantic(_)), "{:?}", source);
    }
}

#[test]
fn test_variable_read_before_its_declaration_ran_is_a_runtime_error() {
    let source = "var r: Int = f()\nvar x: Int = 1\nfun f(): Int { return x }\nreturn r";
    let error = failure(source);

    let diagnostics = error.diagnostics();
    let rendered = render_error(diagnostics[0], source);
    assert!(rendered.starts_with("Error: UninitialisedVariable"));
    assert!(rendered.contains("3 | fun f(): Int { return x }"));
}
