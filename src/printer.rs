//! Rendering of values and syntax trees back into list syntax.

use std::fmt;

use crate::ast::{GeneratedOp, Node, NumberType, Value};

/// Literal shown for the callable placeholder
pub const CALLABLE_LITERAL: &str = "#<callable>";

/// Render a value for display.
pub fn print(value: &Value) -> String {
    value.to_string()
}

/// Decimal text for a number: integral values print without a fractional
/// part, infinities as `Infinity`/`-Infinity`.
pub(crate) fn format_number(n: NumberType) -> String {
    if n.is_nan() {
        "NaN".to_owned()
    } else if n.is_infinite() {
        let text = if n > 0.0 { "Infinity" } else { "-Infinity" };
        text.to_owned()
    } else if n == 0.0 {
        // -0 prints as 0
        "0".to_owned()
    } else {
        format!("{n}")
    }
}

fn write_list<T: fmt::Display>(f: &mut fmt::Formatter<'_>, elements: &[T]) -> fmt::Result {
    write!(f, "(")?;
    for (i, elem) in elements.iter().enumerate() {
        if i > 0 {
            write!(f, " ")?;
        }
        write!(f, "{elem}")?;
    }
    write!(f, ")")
}

impl fmt::Display for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Value::Number(n) => write!(f, "{}", format_number(*n)),
            Value::Str(s) => write!(f, "{s}"),
            Value::List(elements) => write_list(f, elements),
            Value::Callable => write!(f, "{CALLABLE_LITERAL}"),
        }
    }
}

impl fmt::Display for Node {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Node::Number(n) => write!(f, "{}", format_number(*n)),
            Node::Str(s) | Node::Symbol(s) => write!(f, "{s}"),
            Node::List(elements) => write_list(f, elements),
            Node::Generated(GeneratedOp::Assign(name)) => write!(f, "#<def {name}>"),
        }
    }
}
