//! Built-in operations registry.
//!
//! Every builtin is an ordinary function over evaluated arguments, paired
//! with the [`Arity`] checked before it runs:
//!
//! ```scheme
//! (+ 1 2 3)          ; 6, numbers fold left
//! (+ "ab" "cd")      ; "abcd", strings concatenate when the first is a string
//! (- 10 3 1)         ; 7, only the first two operands are used
//! (* 2 3 4)          ; 24
//! (/ 9 2)            ; 4.5
//! (head (1 2 3))     ; 1
//! (tail (1 2 3))     ; (2 3)
//! (last (1 2 3))     ; 3
//! (front (1 2 3))    ; (1 2)
//! ```
//!
//! Assignment is not a builtin: `(def name value)` is rewritten by the
//! `def` macro into a generated operation the evaluator dispatches on.
//!
//! ## Adding New Operations
//!
//! 1. **Implement the function** with typed parameters from
//!    [`crate::intooperation`] (`NumberType`, `Value`, `&str`, `ValueIter`,
//!    `NumIter`, `StringIter`)
//! 2. **Add it to BUILTIN_OPS** with its identifier and arity
//! 3. **Add tests** covering arity and type errors

use crate::EvalError;
use crate::ast::{NumberType, Value, strip_quotes};
use crate::intooperation::{IntoOperation, IntoVariadicOperation, NumIter, OperationFn, ValueIter};
use std::collections::HashMap;
use std::fmt;
use std::sync::{Arc, LazyLock};

/// Accepted argument counts for a callable
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Arity {
    Exact(usize),
    AtLeast(usize),
    Any,
}

impl Arity {
    pub fn validate(&self, got: usize) -> Result<(), EvalError> {
        let ok = match self {
            Arity::Exact(n) => got == *n,
            Arity::AtLeast(n) => got >= *n,
            Arity::Any => true,
        };
        if ok {
            Ok(())
        } else {
            Err(EvalError::arity_error(*self, got))
        }
    }
}

impl fmt::Display for Arity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Arity::Exact(n) => write!(f, "exactly {n}"),
            Arity::AtLeast(n) => write!(f, "at least {n}"),
            Arity::Any => write!(f, "any number of"),
        }
    }
}

/// Definition of a built-in operation
#[derive(Clone)]
pub struct BuiltinOp {
    pub id: &'static str,
    pub arity: Arity,
    func: Arc<OperationFn>,
}

impl fmt::Debug for BuiltinOp {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("BuiltinOp")
            .field("id", &self.id)
            .field("arity", &self.arity)
            .finish_non_exhaustive()
    }
}

impl PartialEq for BuiltinOp {
    fn eq(&self, other: &Self) -> bool {
        self.id == other.id
    }
}

impl BuiltinOp {
    /// Validate arity, then apply the operation to evaluated arguments
    pub fn call(&self, args: Vec<Value>) -> Result<Value, EvalError> {
        self.arity
            .validate(args.len())
            .and_then(|()| (self.func)(args))
            .map_err(|err| err.for_op(self.id))
    }
}

//
// Builtin Function Implementations
//

fn builtin_add(args: ValueIter<'_>) -> Result<Value, EvalError> {
    let mut args = args.peekable();
    let concatenate = matches!(args.peek(), Some(Value::Str(_)));
    if concatenate {
        let mut content = String::new();
        for arg in args {
            match arg {
                Value::Str(s) => content.push_str(strip_quotes(s)),
                other => {
                    return Err(EvalError::TypeMismatch(format!(
                        "'+' cannot append a {} to a string",
                        other.type_name()
                    )));
                }
            }
        }
        Ok(Value::string(content))
    } else {
        let mut sum = 0 as NumberType;
        for arg in args {
            match arg {
                Value::Number(n) => sum += *n,
                other => {
                    return Err(EvalError::TypeMismatch(format!(
                        "'+' cannot add a {} to a number",
                        other.type_name()
                    )));
                }
            }
        }
        Ok(Value::Number(sum))
    }
}

// Operands after the second are accepted but not used
fn builtin_sub(a: NumberType, b: NumberType, _ignored: ValueIter<'_>) -> NumberType {
    a - b
}

// IEEE division: a zero divisor gives an infinity or NaN
fn builtin_div(a: NumberType, b: NumberType, _ignored: ValueIter<'_>) -> NumberType {
    a / b
}

fn builtin_mul(args: NumIter<'_>) -> NumberType {
    args.fold(1 as NumberType, |product, n| product * n)
}

fn builtin_head(mut list: ValueIter<'_>) -> Result<Value, EvalError> {
    match list.next() {
        Some(first) => Ok(first.clone()),
        None => Err(EvalError::EmptyList("head".into())),
    }
}

fn builtin_tail(list: ValueIter<'_>) -> Value {
    Value::List(list.skip(1).cloned().collect())
}

fn builtin_last(list: ValueIter<'_>) -> Result<Value, EvalError> {
    list.last()
        .cloned()
        .ok_or_else(|| EvalError::EmptyList("last".into()))
}

fn builtin_front(list: ValueIter<'_>) -> Value {
    let keep = list.len().saturating_sub(1);
    Value::List(list.take(keep).cloned().collect())
}

/// Global registry of all built-in operations, built once on first use.
static BUILTIN_OPS: LazyLock<Vec<BuiltinOp>> = LazyLock::new(|| {
    fn builtin_fixed<Args, F>(f: F) -> Arc<OperationFn>
    where
        F: IntoOperation<Args>,
    {
        <F as IntoOperation<Args>>::into_operation(f)
    }

    fn builtin_variadic<Args, F>(f: F) -> Arc<OperationFn>
    where
        F: IntoVariadicOperation<Args>,
    {
        <F as IntoVariadicOperation<Args>>::into_variadic_operation(f)
    }

    vec![
        // Arithmetic operations
        BuiltinOp {
            id: "+",
            arity: Arity::AtLeast(2),
            func: builtin_variadic::<(ValueIter<'static>,), _>(builtin_add),
        },
        BuiltinOp {
            id: "-",
            arity: Arity::AtLeast(2),
            func: builtin_variadic::<(NumberType, NumberType, ValueIter<'static>), _>(
                builtin_sub,
            ),
        },
        BuiltinOp {
            id: "*",
            arity: Arity::AtLeast(2),
            func: builtin_variadic::<(NumIter<'static>,), _>(builtin_mul),
        },
        BuiltinOp {
            id: "/",
            arity: Arity::AtLeast(2),
            func: builtin_variadic::<(NumberType, NumberType, ValueIter<'static>), _>(
                builtin_div,
            ),
        },
        // List operations
        BuiltinOp {
            id: "head",
            arity: Arity::Exact(1),
            func: builtin_fixed::<(ValueIter<'static>,), _>(builtin_head),
        },
        BuiltinOp {
            id: "tail",
            arity: Arity::Exact(1),
            func: builtin_fixed::<(ValueIter<'static>,), _>(builtin_tail),
        },
        BuiltinOp {
            id: "last",
            arity: Arity::Exact(1),
            func: builtin_fixed::<(ValueIter<'static>,), _>(builtin_last),
        },
        BuiltinOp {
            id: "front",
            arity: Arity::Exact(1),
            func: builtin_fixed::<(ValueIter<'static>,), _>(builtin_front),
        },
    ]
});

static BUILTIN_INDEX: LazyLock<HashMap<&'static str, &'static BuiltinOp>> =
    LazyLock::new(|| BUILTIN_OPS.iter().map(|op| (op.id, op)).collect());

/// Get all builtin operations
pub fn get_builtin_ops() -> &'static [BuiltinOp] {
    BUILTIN_OPS.as_slice()
}

/// Find a builtin operation by its identifier
pub fn find_builtin(id: &str) -> Option<&'static BuiltinOp> {
    BUILTIN_INDEX.get(id).copied()
}

#[cfg(test)]
#[expect(clippy::unwrap_used)] // test code OK
mod tests {
    use super::*;
    use crate::ast::{nil, val};

    /// Expected outcome of a builtin call
    #[derive(Debug)]
    enum CallResult {
        Returns(Value),
        WrongArity,
        WrongType,
        Fails(EvalError),
    }
    use CallResult::*;

    fn returns<T: Into<Value>>(value: T) -> CallResult {
        Returns(val(value))
    }

    fn call_builtin(name: &str, args: &[Value]) -> Result<Value, EvalError> {
        find_builtin(name).unwrap().call(args.to_vec())
    }

    #[test]
    fn test_builtin_ops_registry() {
        let names: Vec<&str> = get_builtin_ops().iter().map(|op| op.id).collect();
        assert_eq!(
            names,
            vec!["+", "-", "*", "/", "head", "tail", "last", "front"]
        );

        let head = find_builtin("head").unwrap();
        assert_eq!(head.arity, Arity::Exact(1));
        assert!(std::ptr::eq(head, &get_builtin_ops()[4]));

        // Assignment is provided by the def macro, not the registry
        assert!(find_builtin("def").is_none());
        assert!(find_builtin("car").is_none());
    }

    #[test]
    fn test_builtin_function_implementations() {
        let test_cases = vec![
            // ===== + =====
            ("+", vec![val(1), val(2)], returns(3)),
            ("+", vec![val(1), val(2), val(3)], returns(6)),
            ("+", vec![val(0.5), val(0.25)], returns(0.75)),
            ("+", vec![val("ab"), val("cd")], returns("abcd")),
            ("+", vec![val("a"), val(""), val("b")], returns("ab")),
            (
                "+",
                vec![Value::Str("'x'".into()), val("y")],
                returns("xy"),
            ),
            ("+", vec![val(1)], WrongArity),
            ("+", vec![], WrongArity),
            ("+", vec![val("a"), val(1)], WrongType),
            ("+", vec![val(1), val("a")], WrongType),
            ("+", vec![nil(), val(1)], WrongType),
            // ===== - =====
            ("-", vec![val(10), val(3)], returns(7)),
            ("-", vec![val(10), val(3), val(1)], returns(7)),
            // Ignored operands are not type checked
            ("-", vec![val(10), val(3), val("x")], returns(7)),
            ("-", vec![val(10)], WrongArity),
            ("-", vec![val("a"), val(1)], WrongType),
            // ===== * =====
            ("*", vec![val(2), val(3), val(4)], returns(24)),
            ("*", vec![val(2), val(0.5)], returns(1)),
            ("*", vec![val(2)], WrongArity),
            ("*", vec![val(2), val("3")], WrongType),
            // ===== / =====
            ("/", vec![val(9), val(2)], returns(4.5)),
            ("/", vec![val(8), val(2), val(2)], returns(4)),
            ("/", vec![val(1), val(0)], returns(f64::INFINITY)),
            ("/", vec![val(-1), val(0)], returns(f64::NEG_INFINITY)),
            ("/", vec![val(1)], WrongArity),
            // ===== list operations =====
            ("head", vec![val([1, 2, 3])], returns(1)),
            ("tail", vec![val([1, 2, 3])], returns([2, 3])),
            ("last", vec![val([1, 2, 3])], returns(3)),
            ("front", vec![val([1, 2, 3])], returns([1, 2])),
            ("head", vec![val([val("a")])], returns("a")),
            ("tail", vec![val([7])], Returns(nil())),
            ("front", vec![val([7])], Returns(nil())),
            ("tail", vec![nil()], Returns(nil())),
            ("front", vec![nil()], Returns(nil())),
            (
                "head",
                vec![nil()],
                Fails(EvalError::EmptyList("head".into())),
            ),
            (
                "last",
                vec![nil()],
                Fails(EvalError::EmptyList("last".into())),
            ),
            ("head", vec![val([1]), val([2])], WrongArity),
            ("tail", vec![], WrongArity),
            ("head", vec![val(1)], WrongType),
            ("last", vec![val("abc")], WrongType),
            ("front", vec![Value::Callable], WrongType),
        ];

        for (i, (name, args, expected)) in test_cases.iter().enumerate() {
            let test_id = format!("Builtin test #{} ({name})", i + 1);
            match (call_builtin(name, args), expected) {
                (Ok(actual), Returns(expected)) => {
                    assert_eq!(&actual, expected, "{test_id}");
                }
                (Err(EvalError::ArityMismatch { op, .. }), WrongArity) => {
                    assert_eq!(op.as_deref(), Some(*name), "{test_id}: op name");
                }
                (Err(EvalError::TypeMismatch(_)), WrongType) => {}
                (Err(actual), Fails(expected)) => assert_eq!(&actual, expected, "{test_id}"),
                (actual, expected) => panic!("{test_id}: expected {expected:?}, got {actual:?}"),
            }
        }
    }

    #[test]
    fn test_zero_divided_by_zero_is_nan() {
        let result = call_builtin("/", &[val(0), val(0)]).unwrap();
        assert!(matches!(result, Value::Number(n) if n.is_nan()));
    }

    #[test]
    fn test_arity_validation() {
        use super::Arity::*;

        assert!(Exact(1).validate(1).is_ok());
        assert!(Exact(1).validate(0).is_err());
        assert!(Exact(1).validate(2).is_err());
        assert!(AtLeast(2).validate(2).is_ok());
        assert!(AtLeast(2).validate(5).is_ok());
        assert!(AtLeast(2).validate(1).is_err());
        assert!(Any.validate(0).is_ok());
        assert!(Any.validate(100).is_ok());

        assert_eq!(
            AtLeast(2).validate(1),
            Err(EvalError::ArityMismatch {
                op: None,
                expected: AtLeast(2),
                got: 1
            })
        );
        assert_eq!(Exact(3).to_string(), "exactly 3");
        assert_eq!(AtLeast(2).to_string(), "at least 2");
        assert_eq!(Any.to_string(), "any number of");
    }
}
