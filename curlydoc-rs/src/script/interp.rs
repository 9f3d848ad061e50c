//! The evaluator.
//!
//! [`Interpreter::eval`] rewrites a forest left to right.  Literals pass
//! through.  A call node is looked up as a macro first (innermost context
//! outwards) and only then as a native function.
//!
//! Every push onto one of the interpreter's stacks (contexts, control
//! records, file names) is paired with a pop on every exit path, errors
//! included, so a failure never leaves stale scopes behind.

use tracing::{debug, trace};

use super::builtins;
use super::context::{ContextId, ContextStack};
use super::control::ControlStack;
use super::include::{resolve_path, FileLoader};
use super::registry::FunctionRegistry;
use super::stdlib;
use crate::config::Config;
use crate::error::{ErrorKind, EvalResult, InitError};
use crate::reader;
use crate::tree::{Forest, Node};

/// Name bound to a macro's evaluated arguments inside its body.
pub const ARGS_NAME: &str = "@";

// ── Interpreter ───────────────────────────────────────────────────────────────

/// A document evaluator.  One interpreter runs one evaluation pass at a time.
#[derive(Debug)]
pub struct Interpreter {
    contexts: ContextStack,
    control: ControlStack,
    /// Currently open source files; the last one is being evaluated.
    files: Vec<String>,
    functions: FunctionRegistry,
    file_loader: Option<FileLoaderSlot>,
    config: Config,
    /// Current nesting of `eval` calls.
    depth: usize,
    /// Context count right after construction (root + standard library).
    baseline: usize,
}

/// Wrapper so the interpreter can stay `Debug`.
struct FileLoaderSlot(FileLoader);

impl std::fmt::Debug for FileLoaderSlot {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str("FileLoader")
    }
}

impl Interpreter {
    /// An interpreter with the default configuration and the standard library.
    pub fn new() -> Result<Self, InitError> {
        Self::with_config(Config::default())
    }

    pub fn with_config(config: Config) -> Result<Self, InitError> {
        Self::with_natives(config, |_| Ok(()))
    }

    /// Like [`with_config`](Self::with_config), with host-provided natives
    /// registered after the built-ins.  Reusing a built-in name fails with
    /// [`InitError::DuplicateFunction`].
    pub fn with_natives<F>(config: Config, extra: F) -> Result<Self, InitError>
    where
        F: FnOnce(&mut FunctionRegistry) -> Result<(), InitError>,
    {
        let mut functions = FunctionRegistry::new();
        builtins::register_all(&mut functions)?;
        extra(&mut functions)?;

        let mut interp = Interpreter {
            contexts: ContextStack::new(),
            control: ControlStack::new(),
            files: vec![config.root_file_name().to_owned()],
            functions,
            file_loader: None,
            config,
            depth: 0,
            baseline: 1,
        };
        if interp.config.stdlib {
            stdlib::install(&mut interp).map_err(InitError::Bootstrap)?;
        }
        interp.baseline = interp.contexts.len();
        debug!(
            natives = interp.functions.len(),
            contexts = interp.baseline,
            "interpreter ready"
        );
        Ok(interp)
    }

    /// Enable `include`.
    pub fn set_file_loader(&mut self, loader: FileLoader) {
        self.file_loader = Some(FileLoaderSlot(loader));
    }

    /// Builder-style [`set_file_loader`](Self::set_file_loader).
    pub fn with_file_loader(mut self, loader: FileLoader) -> Self {
        self.set_file_loader(loader);
        self
    }

    pub fn config(&self) -> &Config {
        &self.config
    }

    pub fn contexts(&self) -> &ContextStack {
        &self.contexts
    }

    pub fn contexts_mut(&mut self) -> &mut ContextStack {
        &mut self.contexts
    }

    pub fn control(&self) -> &ControlStack {
        &self.control
    }

    pub fn control_mut(&mut self) -> &mut ControlStack {
        &mut self.control
    }

    /// The open source files, outermost first.
    pub fn file_stack(&self) -> &[String] {
        &self.files
    }

    /// The file currently being evaluated.
    pub fn current_file(&self) -> &str {
        self.files
            .last()
            .map(String::as_str)
            .unwrap_or_else(|| self.config.root_file_name())
    }

    /// Forget everything defined by earlier passes, keeping the standard
    /// library.
    pub fn reset(&mut self) {
        self.contexts.truncate(self.baseline);
        self.control = ControlStack::new();
        self.files.truncate(1);
        self.depth = 0;
    }

    // ── Evaluation ────────────────────────────────────────────────────────────

    /// Evaluate `forest`.  Scopes opened during the call are closed again.
    pub fn eval(&mut self, forest: &[Node]) -> EvalResult<Forest> {
        self.eval_with(forest, false)
    }

    /// Evaluate `forest`, keeping scopes opened at this level (e.g. by
    /// `defs`) visible afterwards.  Used for whole documents and includes.
    pub fn eval_preserving(&mut self, forest: &[Node]) -> EvalResult<Forest> {
        self.eval_with(forest, true)
    }

    /// Parse and evaluate a complete document.  Top-level definitions stay
    /// visible to later passes until [`reset`](Self::reset).
    pub fn eval_source(&mut self, src: &str) -> EvalResult<Forest> {
        let forest = reader::parse(src).map_err(|source| ErrorKind::Parse {
            file: self.current_file().to_owned(),
            source,
        })?;
        self.eval_preserving(&forest)
    }

    /// Evaluate with explicit control over scope preservation.
    pub fn eval_with(&mut self, forest: &[Node], preserve_vars: bool) -> EvalResult<Forest> {
        if self.depth >= self.config.max_depth {
            return Err(ErrorKind::RecursionLimit(self.config.max_depth).into());
        }
        let mark = self.contexts.len();
        self.depth += 1;
        let result = self.eval_nodes(forest);
        self.depth -= 1;
        if !preserve_vars || result.is_err() {
            self.contexts.truncate(mark);
        }
        result
    }

    fn eval_nodes(&mut self, forest: &[Node]) -> EvalResult<Forest> {
        let mut out = Forest::with_capacity(forest.len());
        for node in forest {
            if node.is_literal() {
                out.push(node.clone());
                continue;
            }
            match self.eval_call(node) {
                Ok(produced) => out.extend(produced),
                Err(e) => return Err(e.at(self.current_file(), node)),
            }
        }
        Ok(out)
    }

    fn eval_call(&mut self, call: &Node) -> EvalResult<Forest> {
        let found = self.contexts.try_find(self.contexts.top(), &call.value);
        let mut produced = match found.value {
            Some(body) => {
                let body = body.clone();
                let definition = found.context;
                self.expand_macro(call, definition, &body)?
            }
            None => {
                let op = self
                    .functions
                    .lookup(&call.value)
                    .ok_or_else(|| ErrorKind::UnknownCallee(call.value.clone()))?;
                op(self, &call.children)?
            }
        };
        if let Some(first) = produced.first_mut() {
            first.space_before = call.space_before;
        }
        Ok(produced)
    }

    /// Arguments are evaluated in the caller's scope; the body runs in a new
    /// scope chained onto the macro's *definition* context, under its own
    /// control record so a chain inside the body leaves the caller's alone.
    fn expand_macro(
        &mut self,
        call: &Node,
        definition: ContextId,
        body: &[Node],
    ) -> EvalResult<Forest> {
        let args = self.eval(&call.children)?;
        trace!(name = %call.value, args = args.len(), "expanding macro");
        self.with_context(Some(definition), |interp, ctx| {
            interp.contexts.add(ctx, ARGS_NAME, args)?;
            interp.with_record(|interp| interp.eval(body))
        })
    }

    // ── Scoped helpers for natives ────────────────────────────────────────────

    /// Run `f` in a fresh context (parent: `parent`, or the current top).
    /// The context and anything pushed above it are gone when this returns.
    pub fn with_context<T, F>(&mut self, parent: Option<ContextId>, f: F) -> EvalResult<T>
    where
        F: FnOnce(&mut Self, ContextId) -> EvalResult<T>,
    {
        let mark = self.contexts.len();
        let ctx = self.contexts.push(parent);
        let result = f(self, ctx);
        self.contexts.truncate(mark);
        result
    }

    /// Run `f` under a fresh control record.
    pub fn with_record<T, F>(&mut self, f: F) -> EvalResult<T>
    where
        F: FnOnce(&mut Self) -> EvalResult<T>,
    {
        self.control.push();
        let result = f(self);
        self.control.pop();
        result
    }

    /// Evaluate `forest` under a fresh control record and report whether it
    /// produced anything.
    pub fn truth_of(&mut self, forest: &[Node]) -> EvalResult<bool> {
        self.with_record(|interp| interp.eval(forest))
            .map(|out| !out.is_empty())
    }

    /// Include `target`, resolved against the current file.  The included
    /// document's top-level definitions remain visible to the includer.
    pub fn include(&mut self, target: &str) -> EvalResult<Forest> {
        let loader = match &self.file_loader {
            Some(FileLoaderSlot(loader)) => loader.clone(),
            None => return Err(ErrorKind::IncludeUnsupported.into()),
        };
        let path = resolve_path(self.current_file(), target);
        debug!(%path, depth = self.files.len(), "including");

        self.files.push(path.clone());
        let result = self.include_resolved(&loader, &path);
        self.files.pop();
        result
    }

    fn include_resolved(&mut self, loader: &FileLoader, path: &str) -> EvalResult<Forest> {
        let src = loader(path).map_err(|message| ErrorKind::IncludeFailed {
            path: path.to_owned(),
            message,
        })?;
        let forest = reader::parse(&src).map_err(|source| ErrorKind::Parse {
            file: path.to_owned(),
            source,
        })?;
        self.eval_preserving(&forest)
    }

    /// Evaluate `forest` with `file` on top of the file-name stack.
    pub(crate) fn eval_in_file(&mut self, file: &str, forest: &[Node]) -> EvalResult<Forest> {
        self.files.push(file.to_owned());
        let result = self.eval_preserving(forest);
        self.files.pop();
        result
    }
}

// ── Tests ─────────────────────────────────────────────────────────────────────
