#![allow(clippy::module_inception)]

use std::{io::Write, rc::Rc};

use crate::{
    errors::errors::{Diagnostic, ErrorTip, ProgramError},
    interpreter::{interpreter::Interpreter, value::Value},
};

pub mod ast;
pub mod errors;
pub mod interpreter;
pub mod lexer;
pub mod macros;
pub mod parser;
pub mod type_checker;

extern crate regex;

#[derive(Debug, Clone, PartialEq)]
pub struct Position(pub u32, pub Rc<String>);

impl Position {
    pub fn null() -> Self {
        Position(0, Rc::new(String::from("<null>")))
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct Span {
    pub start: Position,
    pub end: Position,
}

impl Span {
    pub fn null() -> Self {
        Span {
            start: Position::null(),
            end: Position::null(),
        }
    }

    /// Smallest span covering both `self` and `other`.
    pub fn to(&self, other: &Span) -> Span {
        Span {
            start: self.start.clone(),
            end: other.end.clone(),
        }
    }
}

/// Returns the 1-based line number, the text of that line and the offset of
/// `position` inside the line.
pub fn get_line_at_position(content: &str, position: u32) -> Option<(usize, String, usize)> {
    let pos = (position as usize).min(content.len().saturating_sub(1));

    let mut start = 0;
    let mut line_number = 1;

    for line in content.split_inclusive('\n') {
        let end = start + line.len();

        if (start..end).contains(&pos) {
            let line_pos = pos - start;
            return Some((line_number, line.to_string(), line_pos));
        }

        start = end;
        line_number += 1;
    }

    None
}

#[cfg(test)]
mod tests {
    use std::rc::Rc;

    use crate::{
        errors::errors::{Error, ErrorImpl},
        Position,
    };

    const SOURCE: &str = "Hello, world!\nfoo\nbar\nTesting { }\n";

    #[test]
    fn test_get_line_at_position() {
        let (line_number, line, line_pos) = super::get_line_at_position(SOURCE, 10).unwrap();
        assert_eq!(line_number, 1);
        assert_eq!(line, "Hello, world!\n");
        assert_eq!(line_pos, 10);

        let (line_number, line, line_pos) = super::get_line_at_position(SOURCE, 30).unwrap();
        assert_eq!(line_number, 4);
        assert_eq!(line, "Testing { }\n");
        assert_eq!(line_pos, 8);
    }

    #[test]
    fn test_render_error_points_at_column() {
        let error = Error::new(
            ErrorImpl::UnrecognisedToken {
                token: String::from("@"),
            },
            Position(18, Rc::new(String::from("test.sigh"))),
        );
        let rendered = super::render_error(&error, "var x = 1\nvar y = @\n");

        assert!(rendered.starts_with("Error: UnrecognisedToken\n-> test.sigh\n"));
        assert!(rendered.contains("2 | var y = @"));
        assert!(rendered.ends_with("--------^\n"));
    }
}

/// Formats a diagnostic with the offending source line:
///
/// ```text
/// Error: TypeMismatch (Trying to add Int with Bool)
/// -> main.sigh
///   |
/// 2 | return 2 + true
///   | -------^
/// ```
pub fn render_error(error: &dyn Diagnostic, source: &str) -> String {
    let position = error.get_position();
    let mut out = String::new();

    if let ErrorTip::None = error.get_tip() {
        out.push_str(&format!("Error: {}\n", error.get_error_name()));
    } else {
        out.push_str(&format!(
            "Error: {} ({})\n",
            error.get_error_name(),
            error.get_tip()
        ));
    }
    out.push_str(&format!("-> {}\n", position.1));

    let Some((line, line_text, line_pos)) = get_line_at_position(source, position.0) else {
        return out;
    };

    let line_string = line.to_string();
    let padding = line_string.len() + 2;

    out.push_str(&format!("{:>padding$}\n", "|"));

    let (line_text_removed, removed_whitespace) = remove_starting_whitespace(&line_text);
    out.push_str(&format!("{} | {}\n", line_string, line_text_removed.trim_end()));

    let arrows = line_pos.saturating_sub(removed_whitespace) + 1;
    out.push_str(&format!("{:>padding$} {:->arrows$}\n", "|", "^"));
    out
}

fn remove_starting_whitespace(string: &str) -> (String, usize) {
    let mut start = 0;
    for c in string.chars() {
        if c == ' ' || c == '\t' {
            start += 1;
        } else {
            break;
        }
    }

    (String::from(&string[start..]), start)
}

/// Runs the whole pipeline on `source`: tokenize, parse, resolve and
/// interpret, writing program output to `out`.
pub fn run_source<W: Write>(source: &str, file: &str, out: W) -> Result<Value, ProgramError> {
    let tokens = lexer::lexer::tokenize(String::from(source), Some(String::from(file)))?;
    let program = parser::parser::parse(tokens, Rc::new(String::from(file)))?;
    let annotations = type_checker::type_checker::resolve(&program).map_err(ProgramError::Semantic)?;

    let mut interpreter = Interpreter::new(&program, &annotations, out);
    Ok(interpreter.run()?)
}
