//! Host functions exposed to programs through an [`ExternalResolver`].
//!
//! A [`HostNamespace`] is a plain name to function table. Install it on an
//! environment and its functions become callable by name in head position:
//!
//! ```
//! use parenlang::{Environment, HostNamespace, execute};
//!
//! let mut host = HostNamespace::new();
//! host.register_operation::<_, (f64,)>("square", |n: f64| n * n);
//!
//! let mut env = Environment::new();
//! env.set_resolver(host);
//! assert_eq!(execute("(square 12)", &mut env), "144");
//! ```

use crate::EvalError;
use crate::ast::Value;
use crate::builtinops::Arity;
use crate::environment::ExternalResolver;
use crate::intooperation::{IntoOperation, IntoVariadicOperation, OperationFn};
use std::collections::HashMap;
use std::fmt;
use std::sync::Arc;

#[derive(Clone, Default)]
pub struct HostNamespace {
    functions: HashMap<String, Arc<OperationFn>>,
}

impl fmt::Debug for HostNamespace {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("HostNamespace")
            .field("functions", &self.names())
            .finish()
    }
}

impl HostNamespace {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a function that works on the raw argument slice.
    ///
    /// This is the low-level API. Prefer [`HostNamespace::register_operation`]
    /// unless the function genuinely needs to inspect arbitrary values.
    ///
    /// ```
    /// use parenlang::{EvalError, HostNamespace, Value};
    ///
    /// fn count(args: &[Value]) -> Result<Value, EvalError> {
    ///     Ok(Value::Number(args.len() as f64))
    /// }
    ///
    /// let mut host = HostNamespace::new();
    /// host.register_function("count", count);
    /// ```
    pub fn register_function(&mut self, name: &str, func: fn(&[Value]) -> Result<Value, EvalError>) {
        let wrapped: Arc<OperationFn> = Arc::new(move |args: Vec<Value>| func(&args));
        self.insert(name, wrapped);
    }

    /// Register a strongly-typed Rust function with automatic argument
    /// extraction and result conversion.
    ///
    /// Supported parameter types:
    /// - `f64` (number)
    /// - `&str` (string content without its quotes)
    /// - `Value` (owned access to the raw value)
    /// - `ValueIter<'_>`, `NumIter<'_>`, `StringIter<'_>` (elements of a
    ///   list argument)
    ///
    /// The function may return any `R: Into<Value>` or
    /// `Result<R, EvalError>`. Arity is enforced from the signature and
    /// conversion failures surface as `TypeMismatch`. The argument tuple
    /// is named at the call site: `register_operation::<_, (f64, &str)>`.
    pub fn register_operation<F, Args>(&mut self, name: &str, func: F)
    where
        F: IntoOperation<Args> + 'static,
    {
        self.insert(name, func.into_operation());
    }

    /// Register a function whose last parameter collects the remaining
    /// arguments, e.g. `fn(NumIter<'_>) -> f64` or
    /// `fn(&str, StringIter<'_>) -> Value`.
    ///
    /// The total argument count is checked against `arity` before the
    /// function runs.
    pub fn register_variadic_operation<F, Args>(&mut self, name: &str, arity: Arity, func: F)
    where
        F: IntoVariadicOperation<Args> + 'static,
    {
        let inner = func.into_variadic_operation();
        let wrapped: Arc<OperationFn> = Arc::new(move |args: Vec<Value>| {
            arity.validate(args.len())?;
            inner(args)
        });
        self.insert(name, wrapped);
    }

    /// Registered names, sorted
    pub fn names(&self) -> Vec<&str> {
        let mut names: Vec<&str> = self.functions.keys().map(String::as_str).collect();
        names.sort_unstable();
        names
    }

    fn insert(&mut self, name: &str, func: Arc<OperationFn>) {
        log::debug!("registered host function {name}");
        self.functions.insert(name.to_owned(), func);
    }
}

impl ExternalResolver for HostNamespace {
    fn resolve(&self, name: &str) -> Option<Arc<OperationFn>> {
        self.functions.get(name).cloned()
    }
}
