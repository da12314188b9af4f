//! Syntax tree and runtime value types.
//!
//! [`Node`] is what the parser produces and the macro expander rewrites:
//! numerals, quoted strings and symbols are classified when the token is
//! lexed, lists nest exactly as the input is parenthesized, and
//! [`Node::Generated`] carries callables synthesized by macros. [`Value`] is
//! what the evaluator produces. The two are kept apart so that a raw symbol
//! can never leak out of evaluation and a callable can never be stored as
//! data.
//!
//! Strings keep their surrounding quote characters in both types, so
//! `"ab"` evaluates to a value that prints as `"ab"`.
//!
//! Helper functions [`sym`], [`node`], [`val`] and [`nil`] keep tree and
//! value construction short in code and tests.

use crate::EvalError;

/// Type alias for number values in interpreter
pub type NumberType = f64;

/// Callables synthesized by macro expansion.
#[derive(Debug, Clone, PartialEq)]
pub enum GeneratedOp {
    /// Store the single evaluated argument under the captured name
    Assign(String),
}

/// Syntax tree node
#[derive(Debug, Clone, PartialEq)]
pub enum Node {
    Number(NumberType),
    /// Quoted string, quote characters included
    Str(String),
    Symbol(String),
    List(Vec<Node>),
    Generated(GeneratedOp),
}

/// Evaluation result
#[derive(Debug, Clone, PartialEq)]
pub enum Value {
    Number(NumberType),
    /// Quoted string, quote characters included
    Str(String),
    List(Vec<Value>),
    /// Placeholder produced when a symbol bound to a callable is evaluated
    /// as data. Callables are not first-class values.
    Callable,
}

impl Value {
    /// Build a string value from its unquoted content
    pub fn string(content: impl AsRef<str>) -> Self {
        Value::Str(format!("\"{}\"", content.as_ref()))
    }

    /// Content of a string value with one leading and one trailing quote
    /// character removed
    pub fn str_content(&self) -> Option<&str> {
        match self {
            Value::Str(s) => Some(strip_quotes(s)),
            _ => None,
        }
    }

    /// Short type name used in error messages
    pub fn type_name(&self) -> &'static str {
        match self {
            Value::Number(_) => "number",
            Value::Str(_) => "string",
            Value::List(_) => "list",
            Value::Callable => "callable",
        }
    }

    /// Check if a value represents the empty list
    pub fn is_nil(&self) -> bool {
        matches!(self, Value::List(list) if list.is_empty())
    }
}

/// Remove one leading and one trailing character from a quoted atom.
pub(crate) fn strip_quotes(s: &str) -> &str {
    let mut chars = s.chars();
    chars.next();
    chars.next_back();
    chars.as_str()
}

// From trait implementations for Value - enables .into() conversion
impl From<&str> for Value {
    fn from(s: &str) -> Self {
        Value::string(s)
    }
}

impl From<String> for Value {
    fn from(s: String) -> Self {
        Value::string(s)
    }
}

macro_rules! impl_from_number {
    ($num_type:ty) => {
        impl From<$num_type> for Value {
            fn from(n: $num_type) -> Self {
                Value::Number(n as NumberType)
            }
        }

        impl From<$num_type> for Node {
            fn from(n: $num_type) -> Self {
                Node::Number(n as NumberType)
            }
        }
    };
}

impl_from_number!(i32);
impl_from_number!(i64);
impl_from_number!(u32);
impl_from_number!(f32);
impl_from_number!(NumberType);

impl<T: Into<Value>> From<Vec<T>> for Value {
    fn from(v: Vec<T>) -> Self {
        Value::List(v.into_iter().map(Into::into).collect())
    }
}

impl<T: Into<Value>, const N: usize> From<[T; N]> for Value {
    fn from(arr: [T; N]) -> Self {
        Value::List(arr.into_iter().map(Into::into).collect())
    }
}

impl<T: Into<Node>> From<Vec<T>> for Node {
    fn from(v: Vec<T>) -> Self {
        Node::List(v.into_iter().map(Into::into).collect())
    }
}

impl<T: Into<Node>, const N: usize> From<[T; N]> for Node {
    fn from(arr: [T; N]) -> Self {
        Node::List(arr.into_iter().map(Into::into).collect())
    }
}

// Fallible conversion from `Value` back into a Rust number.
impl TryFrom<Value> for NumberType {
    type Error = EvalError;

    fn try_from(value: Value) -> Result<NumberType, EvalError> {
        if let Value::Number(n) = value {
            Ok(n)
        } else {
            Err(EvalError::TypeMismatch(format!(
                "expected number, found {}",
                value.type_name()
            )))
        }
    }
}

/// Helper for creating symbol nodes
pub fn sym<S: AsRef<str>>(name: S) -> Node {
    Node::Symbol(name.as_ref().to_owned())
}

/// Helper for creating syntax nodes from numbers and (nested) lists of nodes
pub fn node<T: Into<Node>>(value: T) -> Node {
    value.into()
}

/// Helper for creating quoted string nodes from unquoted content
pub fn str_node<S: AsRef<str>>(content: S) -> Node {
    Node::Str(format!("\"{}\"", content.as_ref()))
}

/// Helper for creating values
pub fn val<T: Into<Value>>(value: T) -> Value {
    value.into()
}

/// Helper for creating the empty list value
pub fn nil() -> Value {
    Value::List(vec![])
}
