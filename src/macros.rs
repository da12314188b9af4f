//! Post-order macro expansion.
//!
//! Every list element is expanded first. Then, if the list's head is a
//! symbol naming a registered macro, the whole list is replaced by the
//! macro's rewrite of its tail. The rewrite is not scanned again for macro
//! heads.

use crate::MacroError;
use crate::ast::{GeneratedOp, Node};
use crate::environment::Environment;

/// A macro rewrites the tail of a list (every element after the head) into
/// the elements of a new list.
pub type MacroFn = fn(Vec<Node>) -> Result<Vec<Node>, MacroError>;

/// `(def name valueExpr)` becomes `(<assign name> valueExpr)`
pub(crate) fn def_macro(tail: Vec<Node>) -> Result<Vec<Node>, MacroError> {
    let [name, value] =
        <[Node; 2]>::try_from(tail).map_err(|tail| MacroError::arity("def", 2, tail.len()))?;

    match name {
        Node::Symbol(name) => Ok(vec![Node::Generated(GeneratedOp::Assign(name)), value]),
        other => Err(MacroError::invalid_shape(
            "def",
            format!("def requires a symbol as its first argument, found {other}"),
        )),
    }
}

/// Expand a single syntax tree.
pub fn expand(node: Node, env: &Environment) -> Result<Node, MacroError> {
    expand_with_depth_tracking(node, env, 0)
}

/// Expand every top-level expression, in order.
pub fn expand_all(nodes: Vec<Node>, env: &Environment) -> Result<Vec<Node>, MacroError> {
    nodes.into_iter().map(|node| expand(node, env)).collect()
}

fn expand_with_depth_tracking(
    node: Node,
    env: &Environment,
    depth: usize,
) -> Result<Node, MacroError> {
    let Node::List(elements) = node else {
        return Ok(node);
    };

    if depth >= env.max_depth() {
        return Err(MacroError::depth_exceeded(env.max_depth()));
    }

    let mut elements = elements
        .into_iter()
        .map(|element| expand_with_depth_tracking(element, env, depth + 1))
        .collect::<Result<Vec<_>, _>>()?;

    let rewrite = match elements.first() {
        Some(Node::Symbol(name)) => env.find_macro(name),
        _ => None,
    };

    match rewrite {
        Some(rewrite) => {
            let tail = elements.split_off(1);
            let expanded = rewrite(tail)?;
            log::trace!("expanded macro {}", elements[0]);
            Ok(Node::List(expanded))
        }
        None => Ok(Node::List(elements)),
    }
}

#[cfg(test)]
#[expect(clippy::unwrap_used)] // test code OK
mod tests {
    use super::*;
    use crate::MacroErrorKind;
    use crate::ast::{node, sym};
    use crate::parser::parse_str;

    fn assign(name: &str) -> Node {
        Node::Generated(GeneratedOp::Assign(name.to_owned()))
    }

    fn expand_source(input: &str, env: &Environment) -> Result<Vec<Node>, MacroError> {
        expand_all(parse_str(input).unwrap(), env)
    }

    #[test]
    fn test_expansion_data_driven() {
        let env = Environment::new();
        let test_cases: Vec<(&str, Result<Vec<Node>, MacroError>)> = vec![
            // Nothing to expand
            ("42", Ok(vec![node(42)])),
            ("(+ 1 2)", Ok(vec![node([sym("+"), node(1), node(2)])])),
            ("()", Ok(vec![Node::List(vec![])])),
            // def becomes a generated assignment
            ("(def x 5)", Ok(vec![node([assign("x"), node(5)])])),
            (
                "(def x (+ 1 2))",
                Ok(vec![node([
                    assign("x"),
                    node([sym("+"), node(1), node(2)]),
                ])]),
            ),
            // Nested forms are expanded before their parent
            (
                "(+ (def a 1) (def b 2))",
                Ok(vec![node([
                    sym("+"),
                    node([assign("a"), node(1)]),
                    node([assign("b"), node(2)]),
                ])]),
            ),
            (
                "(def x (def y 3))",
                Ok(vec![node([assign("x"), node([assign("y"), node(3)])])]),
            ),
            // Only list heads are macro positions
            ("def", Ok(vec![sym("def")])),
            ("(x def)", Ok(vec![node([sym("x"), sym("def")])])),
            // Multiple top-level forms
            (
                "(def x 1) x",
                Ok(vec![node([assign("x"), node(1)]), sym("x")]),
            ),
        ];

        for (i, (input, expected)) in test_cases.iter().enumerate() {
            assert_eq!(
                &expand_source(input, &env),
                expected,
                "Expansion test #{} ({input})",
                i + 1
            );
        }
    }

    #[test]
    fn test_def_shape_errors() {
        let env = Environment::new();
        let cases = vec![
            ("(def)", MacroErrorKind::ArityMismatch { expected: 2, got: 0 }),
            ("(def x)", MacroErrorKind::ArityMismatch { expected: 2, got: 1 }),
            (
                "(def x 1 2)",
                MacroErrorKind::ArityMismatch { expected: 2, got: 3 },
            ),
            ("(def 1 2)", MacroErrorKind::InvalidShape),
            ("(def \"x\" 2)", MacroErrorKind::InvalidShape),
            ("(def (x) 2)", MacroErrorKind::InvalidShape),
            // Nested arity errors surface before any evaluation
            ("(+ 1 (def y))", MacroErrorKind::ArityMismatch { expected: 2, got: 1 }),
        ];

        for (i, (input, kind)) in cases.iter().enumerate() {
            let err = expand_source(input, &env).unwrap_err();
            assert_eq!(&err.kind, kind, "case #{} ({input})", i + 1);
            assert_eq!(err.name, "def");
        }
    }

    #[test]
    fn test_output_is_not_rescanned() {
        fn wrap_in_def(tail: Vec<Node>) -> Result<Vec<Node>, MacroError> {
            let mut out = vec![sym("def")];
            out.extend(tail);
            Ok(out)
        }

        let mut env = Environment::new();
        env.register_macro("wrap", wrap_in_def);

        // The generated (def ...) list is left alone
        let expanded = expand_source("(wrap z 1)", &env).unwrap();
        assert_eq!(expanded, vec![node([sym("def"), sym("z"), node(1)])]);
    }

    #[test]
    fn test_custom_macro_rewrites_tail() {
        fn swap(tail: Vec<Node>) -> Result<Vec<Node>, MacroError> {
            let [op, a, b] =
                <[Node; 3]>::try_from(tail).map_err(|t| MacroError::arity("swap", 3, t.len()))?;
            Ok(vec![op, b, a])
        }

        let mut env = Environment::new();
        env.register_macro("swap", swap);

        let expanded = expand_source("(swap - 1 10)", &env).unwrap();
        assert_eq!(expanded, vec![node([sym("-"), node(10), node(1)])]);

        let err = expand_source("(swap -)", &env).unwrap_err();
        assert_eq!(err.name, "swap");
    }

    #[test]
    fn test_expansion_depth_limit() {
        let env = Environment::new().with_max_depth(8);
        let input = format!("{}1{}", "(".repeat(9), ")".repeat(9));
        let err = expand_source(&input, &env).unwrap_err();
        assert_eq!(err.kind, MacroErrorKind::DepthExceeded);

        let input = format!("{}1{}", "(".repeat(8), ")".repeat(8));
        assert!(expand_source(&input, &env).is_ok());
    }
}
