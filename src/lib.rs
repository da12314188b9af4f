//! parenlang - a small parenthesized list-language interpreter
//!
//! This crate turns source text of a minimal list-structured language into
//! evaluated results through a four-stage pipeline:
//!
//! ```text
//! text -> lexer -> tokens -> parser -> syntax tree -> macro expander
//!      -> expanded tree -> evaluator -> value -> printer -> display string
//! ```
//!
//! ```scheme
//! (+ 1 2 3)              ; 6
//! (* 2 (- 10 3))         ; 14
//! (+ "ab" "cd")          ; "abcd"
//! (def x (+ 1 2))        ; binds x to 3, returns 3
//! (tail (1 2 3))         ; (2 3) - a list with a non-callable head is data
//! ```
//!
//! ## Entry points
//!
//! - [`run`] returns a typed [`Result<Value, Error>`] for embedders.
//! - [`execute`] renders the result (or a stage-tagged error such as
//!   `"Parse Error: ..."`) as a display string, and never fails.
//!
//! Both take an explicit [`Environment`], which owns the symbol table, the
//! macro table and an optional [`ExternalResolver`] for host functions.
//! Definitions made by one run stay visible to later runs that share the
//! same environment.
//!
//! ## Modules
//!
//! - `lexer`: character scanner producing classified tokens
//! - `parser`: stack-based token to syntax tree conversion
//! - `macros`: post-order macro expansion (`def`)
//! - `environment`: symbol table, macro table and external resolution
//! - `builtinops`: arity-checked builtin registry
//! - `intooperation`: adapters from typed Rust functions to operations
//! - `host`: [`HostNamespace`], a ready-made external resolver
//! - `evaluator`: head dispatch and argument evaluation
//! - `printer`: value rendering

use std::fmt;

use crate::builtinops::Arity;

/// Maximum list nesting for parsing, macro expansion and evaluation.
/// Deeper nesting reports an error instead of overflowing the stack.
pub const MAX_EVAL_DEPTH: usize = 256;

/// Categorizes the different kinds of lexing errors.
#[derive(Debug, PartialEq, Clone)]
pub enum LexErrorKind {
    /// Input ended inside a quoted string
    UnterminatedString,
}

/// A structured error describing a lexing failure.
#[derive(Debug, PartialEq, Clone)]
pub struct LexError {
    pub kind: LexErrorKind,
    pub message: String,
    /// Byte offset in the input where the offending token starts
    pub offset: usize,
    /// Context snippet from the input around the offset (max 40 chars)
    pub context: Option<String>,
}

impl LexError {
    /// Create a LexError with context extracted from input at a given offset
    pub fn with_context(
        kind: LexErrorKind,
        message: impl Into<String>,
        input: &str,
        offset: usize,
    ) -> Self {
        const MAX_CONTEXT: usize = 40;

        let mut context_start = offset.saturating_sub(10).min(input.len());
        while !input.is_char_boundary(context_start) {
            context_start -= 1;
        }
        let context_str: String = input
            .get(context_start..)
            .unwrap_or_default()
            .chars()
            .take(MAX_CONTEXT)
            .collect();

        let mut display_context = String::new();
        if context_start > 0 {
            display_context.push_str("[...]");
        }
        display_context.push_str(&context_str);
        if context_start + context_str.len() < input.len() {
            display_context.push_str("[...]");
        }

        // Keep the snippet on one line
        let display_context = display_context.replace('\n', "\\n").replace('\r', "");

        LexError {
            kind,
            message: message.into(),
            offset,
            context: Some(display_context),
        }
    }
}

impl fmt::Display for LexError {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, "{} at offset {}", self.message, self.offset)?;
        if let Some(context) = &self.context {
            write!(f, " near '{context}'")?;
        }
        Ok(())
    }
}

/// Categorizes the different kinds of parsing errors.
#[derive(Debug, PartialEq, Clone)]
pub enum ParseErrorKind {
    /// A `)` with no enclosing `(`
    UnbalancedClose,
    /// Input ended while at least one list was still open
    UnterminatedList,
    /// List nesting exceeded the depth limit
    TooDeeplyNested,
}

/// A structured error describing a parsing failure.
#[derive(Debug, PartialEq, Clone)]
pub struct ParseError {
    pub kind: ParseErrorKind,
    pub message: String,
    /// The problematic token, if identifiable
    pub found: Option<String>,
}

impl ParseError {
    pub fn new(kind: ParseErrorKind, message: impl Into<String>, found: Option<String>) -> Self {
        ParseError {
            kind,
            message: message.into(),
            found,
        }
    }
}

impl fmt::Display for ParseError {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, "{}", self.message)?;
        if let Some(found) = &self.found {
            write!(f, " (found '{found}')")?;
        }
        Ok(())
    }
}

/// Categorizes the different kinds of macro expansion errors.
#[derive(Debug, PartialEq, Clone)]
pub enum MacroErrorKind {
    /// The macro received the wrong number of tail elements
    ArityMismatch { expected: usize, got: usize },
    /// The tail elements have the wrong shape (e.g. a non-symbol name)
    InvalidShape,
    /// Expansion recursed past the environment's depth limit
    DepthExceeded,
}

/// A structured error describing a failed macro rewrite.
#[derive(Debug, PartialEq, Clone)]
pub struct MacroError {
    pub kind: MacroErrorKind,
    /// Name of the macro being expanded
    pub name: String,
    pub message: String,
}

impl MacroError {
    pub fn arity(name: &str, expected: usize, got: usize) -> Self {
        MacroError {
            kind: MacroErrorKind::ArityMismatch { expected, got },
            name: name.to_owned(),
            message: format!("{name} requires exactly {expected} arguments, got {got}"),
        }
    }

    pub fn invalid_shape(name: &str, message: impl Into<String>) -> Self {
        MacroError {
            kind: MacroErrorKind::InvalidShape,
            name: name.to_owned(),
            message: message.into(),
        }
    }

    pub(crate) fn depth_exceeded(max: usize) -> Self {
        MacroError {
            kind: MacroErrorKind::DepthExceeded,
            name: String::new(),
            message: format!("Expansion depth limit exceeded (max: {max})"),
        }
    }
}

impl fmt::Display for MacroError {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, "{}", self.message)
    }
}

/// Errors raised while evaluating an expanded syntax tree.
#[derive(Debug, Clone, PartialEq)]
pub enum EvalError {
    UnboundSymbol(String),
    ArityMismatch {
        /// Name of the callable, when known at the point of failure
        op: Option<String>,
        expected: Arity,
        got: usize,
    },
    TypeMismatch(String),
    UncallableHead(String),
    EmptyList(String),
    DepthExceeded(usize),
    /// Failure reported by an externally resolved host function
    Host(String),
}

impl EvalError {
    /// Create an ArityMismatch without a callable name
    pub fn arity_error(expected: Arity, got: usize) -> Self {
        EvalError::ArityMismatch {
            op: None,
            expected,
            got,
        }
    }

    /// Attach the callable name to an arity error that lacks one
    pub(crate) fn for_op(self, name: &str) -> Self {
        match self {
            EvalError::ArityMismatch {
                op: None,
                expected,
                got,
            } => EvalError::ArityMismatch {
                op: Some(name.to_owned()),
                expected,
                got,
            },
            other => other,
        }
    }
}

impl fmt::Display for EvalError {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self {
            EvalError::UnboundSymbol(name) => write!(f, "Unbound symbol: {name}"),
            EvalError::ArityMismatch { op, expected, got } => match op {
                Some(op) => write!(f, "'{op}' expects {expected} arguments, got {got}"),
                None => write!(f, "function expects {expected} arguments, got {got}"),
            },
            EvalError::TypeMismatch(msg) => write!(f, "Type mismatch: {msg}"),
            EvalError::UncallableHead(expr) => write!(f, "Cannot call {expr} here"),
            EvalError::EmptyList(op) => write!(f, "'{op}' of an empty list"),
            EvalError::DepthExceeded(max) => {
                write!(f, "Evaluation depth limit exceeded (max: {max})")
            }
            EvalError::Host(msg) => write!(f, "{msg}"),
        }
    }
}

/// The pipeline stage an [`Error`] originated from.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Stage {
    Lex,
    Parse,
    MacroExpansion,
    Evaluation,
    Output,
}

impl fmt::Display for Stage {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        let name = match self {
            Stage::Lex => "Lex",
            Stage::Parse => "Parse",
            Stage::MacroExpansion => "Macro Expansion",
            Stage::Evaluation => "Evaluation",
            Stage::Output => "Output",
        };
        write!(f, "{name}")
    }
}

/// Error types for the interpreter, one variant per pipeline stage
#[derive(Debug, Clone, PartialEq)]
pub enum Error {
    LexError(LexError),
    ParseError(ParseError),
    MacroError(MacroError),
    EvalError(EvalError),
    OutputError(String),
}

impl Error {
    pub fn stage(&self) -> Stage {
        match self {
            Error::LexError(_) => Stage::Lex,
            Error::ParseError(_) => Stage::Parse,
            Error::MacroError(_) => Stage::MacroExpansion,
            Error::EvalError(_) => Stage::Evaluation,
            Error::OutputError(_) => Stage::Output,
        }
    }
}

impl fmt::Display for Error {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, "{} Error: ", self.stage())?;
        match self {
            Error::LexError(e) => write!(f, "{e}"),
            Error::ParseError(e) => write!(f, "{e}"),
            Error::MacroError(e) => write!(f, "{e}"),
            Error::EvalError(e) => write!(f, "{e}"),
            Error::OutputError(msg) => write!(f, "{msg}"),
        }
    }
}

impl std::error::Error for Error {}

impl From<LexError> for Error {
    fn from(e: LexError) -> Self {
        Error::LexError(e)
    }
}

impl From<ParseError> for Error {
    fn from(e: ParseError) -> Self {
        Error::ParseError(e)
    }
}

impl From<MacroError> for Error {
    fn from(e: MacroError) -> Self {
        Error::MacroError(e)
    }
}

impl From<EvalError> for Error {
    fn from(e: EvalError) -> Self {
        Error::EvalError(e)
    }
}

pub mod ast;
pub mod builtinops;
pub mod environment;
pub mod evaluator;
pub mod host;
pub mod intooperation;
pub mod lexer;
pub mod macros;
pub mod parser;
pub mod printer;

pub use ast::{Node, Value};
pub use environment::{Environment, ExternalResolver};
pub use host::HostNamespace;
pub use lexer::LexConfig;

/// Run every stage of the pipeline and return the value of the last
/// top-level expression.
///
/// Earlier top-level expressions are evaluated in order for their effect on
/// `env` only. A failure in any stage stops the run; no later stage sees a
/// partial result.
pub fn run(input: &str, env: &mut Environment) -> Result<Value, Error> {
    run_with_config(input, env, LexConfig::default())
}

/// Same as [`run`], with explicit lexer settings.
pub fn run_with_config(
    input: &str,
    env: &mut Environment,
    config: LexConfig,
) -> Result<Value, Error> {
    let tokens = lexer::tokenize_with_config(input, config)?;
    log::debug!("lexed {} tokens", tokens.len());

    let forms = parser::parse_with_max_depth(&tokens, env.max_depth())?;
    log::debug!("parsed {} top-level expressions", forms.len());

    let expanded = macros::expand_all(forms, env)?;
    log::debug!("expanded {} top-level expressions", expanded.len());

    let mut last = None;
    for form in &expanded {
        last = Some(evaluator::eval(form, env)?);
    }

    last.ok_or_else(|| Error::OutputError("program contains no expressions".to_owned()))
}

/// Run the pipeline and render the outcome as a display string.
///
/// Success renders the last value in list syntax; failure renders as
/// `"<Stage> Error: <message>"`.
pub fn execute(input: &str, env: &mut Environment) -> String {
    match run(input, env) {
        Ok(value) => printer::print(&value),
        Err(err) => {
            log::debug!("pipeline failed in {} stage", err.stage());
            err.to_string()
        }
    }
}
