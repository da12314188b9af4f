use crate::MAX_EVAL_DEPTH;
use crate::ast::Value;
use crate::builtinops::{BuiltinOp, get_builtin_ops};
use crate::intooperation::OperationFn;
use crate::macros::{MacroFn, def_macro};
use std::collections::HashMap;
use std::fmt;
use std::sync::Arc;

/// What a symbol is bound to in an [`Environment`]
#[derive(Debug, Clone, PartialEq)]
pub enum Binding {
    Builtin(&'static BuiltinOp),
    Value(Value),
}

/// Fallback lookup for callables the environment does not bind itself.
///
/// The evaluator consults the resolver only after generated operations and
/// builtins, and only for a symbol in head position.
pub trait ExternalResolver {
    fn resolve(&self, name: &str) -> Option<Arc<OperationFn>>;
}

/// Symbol table, macro table and external resolver shared by every stage
/// of a run. Definitions persist across runs on the same environment.
pub struct Environment {
    bindings: HashMap<String, Binding>,
    macros: HashMap<String, MacroFn>,
    resolver: Option<Box<dyn ExternalResolver>>,
    max_depth: usize,
}

impl fmt::Debug for Environment {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut macros: Vec<&str> = self.macros.keys().map(String::as_str).collect();
        macros.sort_unstable();
        f.debug_struct("Environment")
            .field("bindings", &self.bindings.len())
            .field("macros", &macros)
            .field("resolver", &self.resolver.is_some())
            .field("max_depth", &self.max_depth)
            .finish()
    }
}

impl Default for Environment {
    fn default() -> Self {
        Self::new()
    }
}

impl Environment {
    /// Environment with every builtin bound and the `def` macro registered
    pub fn new() -> Self {
        let mut env = Self::empty();
        for op in get_builtin_ops() {
            env.bindings.insert(op.id.to_owned(), Binding::Builtin(op));
        }
        env.register_macro("def", def_macro);
        env
    }

    /// Environment with no bindings and no macros
    pub fn empty() -> Self {
        Environment {
            bindings: HashMap::new(),
            macros: HashMap::new(),
            resolver: None,
            max_depth: MAX_EVAL_DEPTH,
        }
    }

    /// Bind `name` to `value`, replacing any previous binding (builtins
    /// included).
    pub fn define(&mut self, name: impl Into<String>, value: Value) {
        let name = name.into();
        log::debug!("define {name} = {value}");
        self.bindings.insert(name, Binding::Value(value));
    }

    pub fn get(&self, name: &str) -> Option<&Binding> {
        self.bindings.get(name)
    }

    pub fn register_macro(&mut self, name: &str, rewrite: MacroFn) {
        self.macros.insert(name.to_owned(), rewrite);
    }

    pub fn find_macro(&self, name: &str) -> Option<MacroFn> {
        self.macros.get(name).copied()
    }

    /// Install the resolver consulted for unbound head symbols, replacing
    /// any previous one.
    pub fn set_resolver(&mut self, resolver: impl ExternalResolver + 'static) {
        self.resolver = Some(Box::new(resolver));
    }

    pub fn resolve_external(&self, name: &str) -> Option<Arc<OperationFn>> {
        self.resolver.as_ref()?.resolve(name)
    }

    /// Nesting limit shared by macro expansion and evaluation
    pub fn max_depth(&self) -> usize {
        self.max_depth
    }

    pub fn with_max_depth(mut self, max_depth: usize) -> Self {
        self.max_depth = max_depth;
        self
    }

    /// All bindings as (name, binding) pairs sorted by name
    pub fn bindings(&self) -> Vec<(String, Binding)> {
        let mut result: Vec<_> = self
            .bindings
            .iter()
            .map(|(name, binding)| (name.clone(), binding.clone()))
            .collect();
        result.sort_by(|a, b| a.0.cmp(&b.0));
        result
    }
}

#[cfg(test)]
#[expect(clippy::unwrap_used)] // test code OK
mod tests {
    use super::*;
    use crate::ast::val;
    use crate::intooperation::IntoOperation;

    struct Fixed;

    impl ExternalResolver for Fixed {
        fn resolve(&self, name: &str) -> Option<Arc<OperationFn>> {
            (name == "seven").then(|| IntoOperation::<()>::into_operation(|| 7))
        }
    }

    #[test]
    fn test_new_binds_builtins_and_def() {
        let env = Environment::new();
        for name in ["+", "-", "*", "/", "head", "tail", "last", "front"] {
            assert!(
                matches!(env.get(name), Some(Binding::Builtin(op)) if op.id == name),
                "{name} should be bound to its builtin"
            );
        }
        assert!(env.find_macro("def").is_some());
        assert!(env.get("def").is_none());
        assert_eq!(env.max_depth(), MAX_EVAL_DEPTH);

        let empty = Environment::empty();
        assert!(empty.get("+").is_none());
        assert!(empty.find_macro("def").is_none());
        assert!(empty.bindings().is_empty());
    }

    #[test]
    fn test_define_overwrites() {
        let mut env = Environment::new();
        env.define("x", val(1));
        env.define("x", val(2));
        assert_eq!(env.get("x"), Some(&Binding::Value(val(2))));

        // Builtin names can be rebound
        env.define("+", val(5));
        assert_eq!(env.get("+"), Some(&Binding::Value(val(5))));
    }

    #[test]
    fn test_bindings_sorted() {
        let mut env = Environment::empty();
        env.define("b", val(2));
        env.define("a", val("x"));
        let names: Vec<String> = env.bindings().into_iter().map(|(n, _)| n).collect();
        assert_eq!(names, vec!["a", "b"]);
    }

    #[test]
    fn test_resolver() {
        let mut env = Environment::new();
        assert!(env.resolve_external("seven").is_none());

        env.set_resolver(Fixed);
        let seven = env.resolve_external("seven").unwrap();
        assert_eq!(seven(vec![]).unwrap(), val(7));
        assert!(env.resolve_external("eight").is_none());
    }

    #[test]
    fn test_debug_summary() {
        let env = Environment::new().with_max_depth(12);
        let text = format!("{env:?}");
        assert!(text.contains("max_depth: 12"));
        assert!(text.contains("\"def\""));
    }
}
