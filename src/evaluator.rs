use crate::EvalError;
use crate::ast::{GeneratedOp, Node, Value};
use crate::builtinops::{Arity, BuiltinOp};
use crate::environment::{Binding, Environment};
use crate::intooperation::OperationFn;
use std::sync::Arc;

/// What the head of a list resolved to
enum Callee<'n> {
    Assign(&'n str),
    Builtin(&'static BuiltinOp),
    External(Arc<OperationFn>),
}

/// Evaluate an expanded syntax tree (public API)
pub fn eval(expr: &Node, env: &mut Environment) -> Result<Value, EvalError> {
    eval_with_depth_tracking(expr, env, 0)
}

/// Evaluate with depth tracking to prevent stack overflow
fn eval_with_depth_tracking(
    expr: &Node,
    env: &mut Environment,
    depth: usize,
) -> Result<Value, EvalError> {
    match expr {
        Node::Number(n) => Ok(Value::Number(*n)),
        Node::Str(s) => Ok(Value::Str(s.clone())),
        Node::Symbol(name) => lookup(name, env),
        Node::Generated(op) => Err(EvalError::UncallableHead(op_name(op))),
        Node::List(elements) => {
            if depth >= env.max_depth() {
                return Err(EvalError::DepthExceeded(env.max_depth()));
            }
            eval_list(elements, env, depth)
        }
    }
}

fn op_name(op: &GeneratedOp) -> String {
    Node::Generated(op.clone()).to_string()
}

/// A symbol in value position: builtins evaluate to the opaque callable
/// placeholder, anything else bound evaluates to its value.
fn lookup(name: &str, env: &Environment) -> Result<Value, EvalError> {
    match env.get(name) {
        Some(Binding::Builtin(_)) => Ok(Value::Callable),
        Some(Binding::Value(value)) => Ok(value.clone()),
        None => Err(EvalError::UnboundSymbol(name.to_owned())),
    }
}

/// Resolution order: generated operation, builtin, external resolver
fn resolve_head<'n>(head: &'n Node, env: &Environment) -> Option<Callee<'n>> {
    match head {
        Node::Generated(GeneratedOp::Assign(name)) => Some(Callee::Assign(name)),
        Node::Symbol(name) => {
            if let Some(Binding::Builtin(op)) = env.get(name) {
                log::trace!("{name} resolved to builtin");
                return Some(Callee::Builtin(*op));
            }
            let external = env.resolve_external(name)?;
            log::trace!("{name} resolved externally");
            Some(Callee::External(external))
        }
        _ => None,
    }
}

fn eval_args(args: &[Node], env: &mut Environment, depth: usize) -> Result<Vec<Value>, EvalError> {
    args.iter()
        .map(|arg| eval_with_depth_tracking(arg, env, depth + 1))
        .collect()
}

/// Evaluate a list: apply a callable head, otherwise build a list from the
/// value of every element.
fn eval_list(elements: &[Node], env: &mut Environment, depth: usize) -> Result<Value, EvalError> {
    let [head, arg_exprs @ ..] = elements else {
        return Ok(Value::List(Vec::new()));
    };

    let Some(callee) = resolve_head(head, env) else {
        return eval_args(elements, env, depth).map(Value::List);
    };

    match callee {
        Callee::Assign(name) => {
            let [value_expr] = arg_exprs else {
                return Err(EvalError::ArityMismatch {
                    op: Some("def".to_owned()),
                    expected: Arity::Exact(2),
                    got: arg_exprs.len() + 1,
                });
            };
            let value = eval_with_depth_tracking(value_expr, env, depth + 1)?;
            env.define(name, value.clone());
            Ok(value)
        }
        Callee::Builtin(op) => {
            let args = eval_args(arg_exprs, env, depth)?;
            op.call(args)
        }
        Callee::External(func) => {
            let args = eval_args(arg_exprs, env, depth)?;
            func(args)
        }
    }
}
