//! Evaluation and setup errors.
//!
//! An [`EvalError`] is raised where a problem is detected and then annotated
//! by every enclosing evaluation level with the location of the call node at
//! that level, so the final error carries a trail from the failure site out
//! to the document root, innermost first.

use std::fmt;

use thiserror::Error;

use crate::reader::ParseError;
use crate::tree::Node;

/// What went wrong, independent of where.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ErrorKind {
    #[error("variable name '{0}' already exists in this context")]
    DuplicateBinding(String),

    #[error("variable '{0}' not found")]
    UndefinedVariable(String),

    #[error("function/macro '{0}' not found")]
    UnknownCallee(String),

    #[error("{function}: {message}")]
    Arity { function: String, message: String },

    #[error("index out of bounds ({index}, size {size})")]
    IndexOutOfBounds { index: i64, size: usize },

    #[error("key '{0}' not found")]
    KeyNotFound(String),

    #[error("include is not supported")]
    IncludeUnsupported,

    #[error("cannot include '{path}': {message}")]
    IncludeFailed { path: String, message: String },

    #[error("given index '{0}' is not valid")]
    MalformedIndex(String),

    #[error("'{0}' is not an integer")]
    NotAnInteger(String),

    #[error("parse error in '{file}': {source}")]
    Parse { file: String, source: ParseError },

    #[error("evaluation depth limit exceeded (max: {0})")]
    RecursionLimit(usize),
}

/// One level of the location trail.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TraceFrame {
    pub file: String,
    pub line: usize,
    pub column: usize,
    /// The offending call node's value.
    pub text: String,
}

impl fmt::Display for TraceFrame {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:{}:{}: {}", self.file, self.line, self.column, self.text)
    }
}

/// A failed evaluation pass.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EvalError {
    pub kind: ErrorKind,
    /// Call sites, innermost first.
    pub trail: Vec<TraceFrame>,
}

impl EvalError {
    pub fn new(kind: ErrorKind) -> Self {
        Self { kind, trail: Vec::new() }
    }

    /// Shorthand for [`ErrorKind::Arity`].
    pub fn arity(function: &str, message: impl Into<String>) -> Self {
        Self::new(ErrorKind::Arity {
            function: function.to_owned(),
            message: message.into(),
        })
    }

    /// Append the location of `node` (read from `file`) to the trail.
    pub fn at(mut self, file: &str, node: &Node) -> Self {
        self.trail.push(TraceFrame {
            file: file.to_owned(),
            line: node.location.line,
            column: node.location.column,
            text: node.value.clone(),
        });
        self
    }
}

impl From<ErrorKind> for EvalError {
    fn from(kind: ErrorKind) -> Self {
        Self::new(kind)
    }
}

impl fmt::Display for EvalError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.kind)?;
        if !self.trail.is_empty() {
            f.write_str(" at:")?;
        }
        for frame in &self.trail {
            write!(f, "\n  {frame}")?;
        }
        Ok(())
    }
}

impl std::error::Error for EvalError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        Some(&self.kind)
    }
}

pub type EvalResult<T> = Result<T, EvalError>;

/// Interpreter construction failures.  These indicate a defect in the
/// interpreter's own setup, never a problem with a user document.
#[derive(Debug, Error)]
pub enum InitError {
    #[error("function '{0}' is already registered")]
    DuplicateFunction(String),

    #[error("standard library failed to load: {0}")]
    Bootstrap(#[source] EvalError),
}

// ── Tests ─────────────────────────────────────────────────────────────────────
