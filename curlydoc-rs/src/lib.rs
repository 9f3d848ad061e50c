//! curlydoc: a tree-structured document markup and macro language.
//!
//! A document is a forest of brace-delimited nodes (`p{Hello b{world}}`).
//! [`reader`] turns source text into a [`Forest`], [`script`] evaluates
//! macros and built-ins down to plain markup, and [`html`] renders the
//! result.

pub mod cli;
pub mod config;
pub mod error;
pub mod html;
pub mod reader;
pub mod script;
pub mod tree;

pub use config::Config;
pub use error::{ErrorKind, EvalError, EvalResult, InitError, TraceFrame};
pub use html::{to_html, HtmlTranslator, RenderError, Translator};
pub use reader::{parse, ParseError};
pub use script::Interpreter;
pub use tree::{write_forest, Forest, Location, Node};
