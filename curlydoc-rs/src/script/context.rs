//! Lexical environments.
//!
//! Contexts live in an arena indexed by [`ContextId`].  The arena doubles as
//! the active context stack: a context is created by pushing and destroyed
//! by popping, and every parent link points strictly downwards.  A context
//! that is still reachable as somebody's parent is therefore always below
//! that somebody on the stack and outlives it, so handles never dangle while
//! they are in use.

use std::collections::HashMap;

use crate::error::ErrorKind;
use crate::tree::Forest;

/// Handle to a context in a [`ContextStack`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct ContextId(usize);

#[derive(Debug, Default)]
struct Context {
    parent: Option<ContextId>,
    bindings: HashMap<String, Forest>,
}

/// Result of [`ContextStack::try_find`].
#[derive(Debug, Clone, Copy)]
pub struct Lookup<'a> {
    /// The bound value, if any context in the chain has the name.
    pub value: Option<&'a Forest>,
    /// The context the value was found in, or the root when not found.
    /// Macro expansion chains its new scope onto this context.
    pub context: ContextId,
}

/// The chain of scopes of one interpreter.
#[derive(Debug)]
pub struct ContextStack {
    contexts: Vec<Context>,
}

impl Default for ContextStack {
    fn default() -> Self {
        Self::new()
    }
}

impl ContextStack {
    /// A stack holding only the (empty) global context.
    pub fn new() -> Self {
        Self {
            contexts: vec![Context::default()],
        }
    }

    pub fn root(&self) -> ContextId {
        ContextId(0)
    }

    /// The innermost active context.
    pub fn top(&self) -> ContextId {
        ContextId(self.contexts.len() - 1)
    }

    /// Number of active contexts, root included.
    pub(crate) fn len(&self) -> usize {
        self.contexts.len()
    }

    /// Push a new, empty context.  Its parent is `parent` when given (macro
    /// closures), otherwise the current top.
    pub fn push(&mut self, parent: Option<ContextId>) -> ContextId {
        let parent = parent.unwrap_or_else(|| self.top());
        debug_assert!(parent.0 < self.contexts.len(), "stale context handle");
        self.contexts.push(Context {
            parent: Some(parent),
            bindings: HashMap::new(),
        });
        self.top()
    }

    /// Pop back to `len` contexts (never below the root).
    pub fn truncate(&mut self, len: usize) {
        self.contexts.truncate(len.max(1));
    }

    /// Bind `name` in `ctx`.  Shadowing a parent's binding is fine; binding a
    /// name twice in the same context is not, and leaves the context as it was.
    pub fn add(
        &mut self,
        ctx: ContextId,
        name: impl Into<String>,
        value: Forest,
    ) -> Result<(), ErrorKind> {
        let bindings = &mut self.contexts[ctx.0].bindings;
        let name = name.into();
        if bindings.contains_key(&name) {
            return Err(ErrorKind::DuplicateBinding(name));
        }
        bindings.insert(name, value);
        Ok(())
    }

    /// Search `from` and then its ancestors for `name`.
    pub fn try_find(&self, from: ContextId, name: &str) -> Lookup<'_> {
        let mut cur = Some(from);
        while let Some(id) = cur {
            let ctx = &self.contexts[id.0];
            if let Some(value) = ctx.bindings.get(name) {
                return Lookup {
                    value: Some(value),
                    context: id,
                };
            }
            cur = ctx.parent;
        }
        Lookup {
            value: None,
            context: self.root(),
        }
    }

    /// Like [`try_find`](Self::try_find), but a missing name is an error.
    pub fn find(&self, from: ContextId, name: &str) -> Result<&Forest, ErrorKind> {
        self.try_find(from, name)
            .value
            .ok_or_else(|| ErrorKind::UndefinedVariable(name.to_owned()))
    }
}

// ── Tests ─────────────────────────────────────────────────────────────────────
