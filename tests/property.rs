#![expect(clippy::unwrap_used)] // test code OK

use parenlang::lexer::tokenize;
use parenlang::{Environment, execute};
use proptest::prelude::*;

fn execute_fresh(input: &str) -> String {
    execute(input, &mut Environment::new())
}

/// Nested arithmetic over small integers, rendered as source text
fn arithmetic_expr() -> impl Strategy<Value = String> {
    let leaf = (-50i32..50).prop_map(|n| n.to_string());
    leaf.prop_recursive(4, 32, 4, |inner| {
        (
            prop::sample::select(vec!["+", "-", "*"]),
            prop::collection::vec(inner, 2..4),
        )
            .prop_map(|(op, args)| format!("({op} {})", args.join(" ")))
    })
}

proptest! {
    #[test]
    fn test_execute_is_idempotent_on_fresh_env(source in arithmetic_expr()) {
        prop_assert_eq!(execute_fresh(&source), execute_fresh(&source));
    }

    #[test]
    fn test_addition_matches_integer_sum(a in -1000i64..1000, b in -1000i64..1000, c in -1000i64..1000) {
        let result = execute_fresh(&format!("(+ {a} {b} {c})"));
        prop_assert_eq!(result, (a + b + c).to_string());
    }

    #[test]
    fn test_addition_commutative(a in -1000i64..1000, b in -1000i64..1000) {
        prop_assert_eq!(
            execute_fresh(&format!("(+ {a} {b})")),
            execute_fresh(&format!("(+ {b} {a})"))
        );
    }

    #[test]
    fn test_multiplication_commutative(a in -100i64..100, b in -100i64..100) {
        let expected = (a * b).to_string();
        prop_assert_eq!(execute_fresh(&format!("(* {a} {b})")), expected.clone());
        prop_assert_eq!(execute_fresh(&format!("(* {b} {a})")), expected);
    }

    #[test]
    fn test_subtraction_uses_first_two(a in -100i64..100, b in -100i64..100, rest in prop::collection::vec(-100i64..100, 0..4)) {
        let rest: Vec<String> = rest.iter().map(ToString::to_string).collect();
        let source = format!("(- {a} {b} {})", rest.join(" "));
        prop_assert_eq!(execute_fresh(&source), (a - b).to_string());
    }

    #[test]
    fn test_definition_visible_in_later_run(name in "[a-z]{1,8}", n in -1000i64..1000) {
        prop_assume!(!["head", "tail", "last", "front", "def"].contains(&name.as_str()));
        let mut env = Environment::new();
        execute(&format!("(def {name} {n})"), &mut env);
        prop_assert_eq!(execute(&name, &mut env), n.to_string());
    }

    #[test]
    fn test_words_tokenize_unchanged(words in prop::collection::vec("[a-z+*/-]{1,6}", 0..8)) {
        let source = words.join(" ");
        let tokens = tokenize(&source).unwrap();
        let texts: Vec<&str> = tokens.iter().map(|t| t.text).collect();
        prop_assert_eq!(texts, words.iter().map(String::as_str).collect::<Vec<_>>());
    }

    #[test]
    fn test_execute_never_panics(source in "[()+*/ 0-9a-z\"'-]{0,48}") {
        let rendered = execute_fresh(&source);
        prop_assert!(!rendered.is_empty());
    }
}
