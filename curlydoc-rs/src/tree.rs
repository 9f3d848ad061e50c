//! Node / forest model.
//!
//! A document is a forest of labelled nodes.  A node without children is a
//! *literal* and evaluates to itself; a node with children is a *call* whose
//! value names the macro or native function and whose children are the
//! arguments.
//!
//! Nodes are plain values: evaluation never mutates a forest it was handed,
//! it builds a new one.

use std::fmt;

/// An ordered sequence of nodes.  Order is reading order / argument order.
pub type Forest = Vec<Node>;

// ── Location ──────────────────────────────────────────────────────────────────

/// Source position of a node (1-based).  Used only for diagnostics.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct Location {
    pub line: usize,
    pub column: usize,
}

impl Location {
    pub fn new(line: usize, column: usize) -> Self {
        Self { line, column }
    }
}

impl fmt::Display for Location {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:{}", self.line, self.column)
    }
}

// ── Node ──────────────────────────────────────────────────────────────────────

/// A labelled tree element.
#[derive(Debug, Clone, Default)]
pub struct Node {
    /// The token: a word for literals, the callee name for calls.
    pub value: String,
    /// Arguments / body.  Empty for literals.
    pub children: Forest,
    /// Where the node was read from.
    pub location: Location,
    /// Whitespace preceded this node in its source list.  Renderers use it
    /// to reproduce inter-word spacing.
    pub space_before: bool,
}

impl Node {
    /// A childless node.
    pub fn leaf(value: impl Into<String>) -> Self {
        Self {
            value: value.into(),
            ..Self::default()
        }
    }

    /// A node with children.
    pub fn call(value: impl Into<String>, children: Forest) -> Self {
        Self {
            value: value.into(),
            children,
            ..Self::default()
        }
    }

    /// Builder-style location setter.
    pub fn at(mut self, location: Location) -> Self {
        self.location = location;
        self
    }

    /// Builder-style whitespace flag setter.
    pub fn spaced(mut self, space_before: bool) -> Self {
        self.space_before = space_before;
        self
    }

    /// `true` if the node has no children.
    pub fn is_literal(&self) -> bool {
        self.children.is_empty()
    }
}

/// Structural equality: value and children only.  Location and spacing are
/// presentation metadata.
impl PartialEq for Node {
    fn eq(&self, other: &Self) -> bool {
        self.value == other.value && self.children == other.children
    }
}

impl Eq for Node {}

// ── Formatting ────────────────────────────────────────────────────────────────

/// `true` if `word` can be written without quotes.
fn is_bare_word(word: &str) -> bool {
    !word.is_empty()
        && !word.starts_with("//")
        && !word.starts_with("/*")
        && !word
            .chars()
            .any(|c| c.is_whitespace() || matches!(c, '{' | '}' | '"' | '\\'))
}

fn write_word(f: &mut fmt::Formatter<'_>, word: &str) -> fmt::Result {
    if is_bare_word(word) {
        return f.write_str(word);
    }
    f.write_str("\"")?;
    for c in word.chars() {
        match c {
            '"' => f.write_str("\\\"")?,
            '\\' => f.write_str("\\\\")?,
            '\n' => f.write_str("\\n")?,
            '\t' => f.write_str("\\t")?,
            '\r' => f.write_str("\\r")?,
            c => write!(f, "{c}")?,
        }
    }
    f.write_str("\"")
}

/// Prints the node in reader syntax, e.g. `b{"hello world"}`.
impl fmt::Display for Node {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        // Anonymous nodes print as `""{..}` so a bare brace group cannot
        // attach to the preceding word when read back.
        write_word(f, &self.value)?;
        if !self.children.is_empty() {
            f.write_str("{")?;
            fmt_forest(f, &self.children)?;
            f.write_str("}")?;
        }
        Ok(())
    }
}

fn fmt_forest(f: &mut fmt::Formatter<'_>, forest: &[Node]) -> fmt::Result {
    for (i, node) in forest.iter().enumerate() {
        if i > 0 {
            f.write_str(" ")?;
        }
        write!(f, "{node}")?;
    }
    Ok(())
}

/// Render a whole forest in reader syntax, nodes separated by single spaces.
pub fn write_forest(forest: &[Node]) -> String {
    struct Wrap<'a>(&'a [Node]);
    impl fmt::Display for Wrap<'_> {
        fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
            fmt_forest(f, self.0)
        }
    }
    Wrap(forest).to_string()
}

/// Shorthand for building test and library forests from words.
pub fn words<I, S>(items: I) -> Forest
where
    I: IntoIterator<Item = S>,
    S: Into<String>,
{
    items.into_iter().map(Node::leaf).collect()
}

// ── Tests ─────────────────────────────────────────────────────────────────────
