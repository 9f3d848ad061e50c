//! Interpreter configuration.

/// Default nesting limit for [`Config::max_depth`].
pub const DEFAULT_MAX_DEPTH: usize = 1000;

/// File name used for diagnostics when no root file is given.
pub const DEFAULT_ROOT_FILE: &str = "<input>";

/// Construction-time options for an [`Interpreter`](crate::script::Interpreter).
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Config {
    /// Maximum nesting of evaluation levels before a pass fails with
    /// [`ErrorKind::RecursionLimit`](crate::error::ErrorKind::RecursionLimit).
    pub max_depth: usize,
    /// Install the embedded standard library at construction.
    pub stdlib: bool,
    /// Name of the top-level document; bottom of the file-name stack.
    /// Relative `include` paths resolve against its directory.
    pub root_file: Option<String>,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            max_depth: DEFAULT_MAX_DEPTH,
            stdlib: true,
            root_file: None,
        }
    }
}

impl Config {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_max_depth(mut self, max_depth: usize) -> Self {
        self.max_depth = max_depth;
        self
    }

    pub fn with_stdlib(mut self, stdlib: bool) -> Self {
        self.stdlib = stdlib;
        self
    }

    pub fn with_root_file(mut self, root_file: impl Into<String>) -> Self {
        self.root_file = Some(root_file.into());
        self
    }

    /// The name diagnostics use for the top-level document.
    pub fn root_file_name(&self) -> &str {
        self.root_file.as_deref().unwrap_or(DEFAULT_ROOT_FILE)
    }
}

// ── Tests ─────────────────────────────────────────────────────────────────────
