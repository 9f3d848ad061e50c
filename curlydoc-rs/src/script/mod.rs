//! Document evaluation.
//!
//! A tree-rewriting interpreter for curlydoc sources, covering:
//!
//! - Lexically scoped definitions (`defs`, `$`) and macros with closures
//! - Conditional chains: `if` … `and`/`or` … `then` … `else`
//! - Iteration (`for`) and structural access (`at`, `get`, `slice`, `map`, …)
//! - `include` through a host-supplied [`FileLoader`]
//! - A standard library written in the document language
//!
//! # Quick start
//!
//! ```rust
//! use curlydoc::script::Interpreter;
//! use curlydoc::tree::write_forest;
//!
//! let mut interp = Interpreter::new().unwrap();
//! let out = interp.eval_source("defs{who{world}} p{hello $ {who}}").unwrap();
//! assert_eq!(write_forest(&out), "p{hello world}");
//! ```

pub mod builtins;
pub mod context;
pub mod control;
pub mod include;
pub mod interp;
pub mod registry;
pub mod stdlib;

// Re-exports for convenience.
pub use context::{ContextId, ContextStack};
pub use control::{ControlRecord, ControlStack};
pub use include::{fs_loader, memory_loader, FileLoader};
pub use interp::Interpreter;
pub use registry::{FunctionRegistry, NativeFn};
