//! Native function registry.
//!
//! Natives receive the call node's children *unevaluated* and decide for
//! themselves what to evaluate; that is what lets `if`/`and`/`or` stay lazy.

use std::collections::HashMap;
use std::fmt;
use std::rc::Rc;

use super::interp::Interpreter;
use crate::error::{EvalResult, InitError};
use crate::tree::{Forest, Node};

/// A host-implemented operation: raw arguments in, forest out.
pub type NativeFn = Rc<dyn Fn(&mut Interpreter, &[Node]) -> EvalResult<Forest>>;

/// Name → native operation.  Filled during interpreter construction and
/// read-only afterwards.
#[derive(Default)]
pub struct FunctionRegistry {
    functions: HashMap<String, NativeFn>,
}

impl fmt::Debug for FunctionRegistry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut names: Vec<&str> = self.functions.keys().map(String::as_str).collect();
        names.sort_unstable();
        f.debug_struct("FunctionRegistry").field("functions", &names).finish()
    }
}

impl FunctionRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a native.  Registering a name twice is a setup defect.
    pub fn register<F>(&mut self, name: &str, op: F) -> Result<(), InitError>
    where
        F: Fn(&mut Interpreter, &[Node]) -> EvalResult<Forest> + 'static,
    {
        if self.functions.contains_key(name) {
            return Err(InitError::DuplicateFunction(name.to_owned()));
        }
        self.functions.insert(name.to_owned(), Rc::new(op));
        Ok(())
    }

    /// The operation registered under `name`, cloned out so the caller can
    /// invoke it while holding `&mut Interpreter`.
    pub fn lookup(&self, name: &str) -> Option<NativeFn> {
        self.functions.get(name).cloned()
    }

    pub(crate) fn len(&self) -> usize {
        self.functions.len()
    }
}

// ── Tests ─────────────────────────────────────────────────────────────────────
