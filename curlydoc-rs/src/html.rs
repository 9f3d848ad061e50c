//! Rendering evaluated documents.
//!
//! [`Translator`] walks a fully evaluated forest and dispatches on the
//! markup vocabulary; [`HtmlTranslator`] is the HTML backend used by
//! `cud2html`.
//!
//! Vocabulary:
//!
//! | tag              | meaning                                        |
//! |------------------|------------------------------------------------|
//! | `p`              | paragraph                                      |
//! | `b` `i` `u` `s`  | bold, italic, underline, strikethrough         |
//! | `m`              | monospace                                      |
//! | `h1` … `h6`      | headings                                       |
//! | `ins`            | inserted text                                  |
//! | `image`          | `image{prm{url{..} alt{..}} caption...}`       |
//! | `table`          | `table{ {{cell}{cell}} {{cell}{cell}} }`       |
//! | `list`           | `list{ {item} {item} }`                        |
//!
//! Anonymous (`""`) nodes outside tables and lists just group their content.

use aho_corasick::AhoCorasick;
use thiserror::Error;

use crate::tree::Node;

// ── Errors ────────────────────────────────────────────────────────────────────

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum RenderError {
    #[error("{line}:{column}: unknown tag '{tag}'")]
    UnknownTag {
        tag: String,
        line: usize,
        column: usize,
    },

    #[error("{line}:{column}: malformed '{tag}': {message}")]
    Malformed {
        tag: String,
        line: usize,
        column: usize,
        message: String,
    },
}

impl RenderError {
    fn unknown(node: &Node) -> Self {
        RenderError::UnknownTag {
            tag: node.value.clone(),
            line: node.location.line,
            column: node.location.column,
        }
    }

    fn malformed(node: &Node, message: impl Into<String>) -> Self {
        RenderError::Malformed {
            tag: node.value.clone(),
            line: node.location.line,
            column: node.location.column,
            message: message.into(),
        }
    }
}

// ── Structured arguments ──────────────────────────────────────────────────────

/// The `prm{..}` record of an `image`.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ImageParams {
    pub url: String,
    pub alt: String,
}

impl ImageParams {
    /// Split `image`'s children into its parameters and the caption.
    fn from_node(node: &Node) -> Result<(Self, &[Node]), RenderError> {
        let (prm, caption) = match node.children.split_first() {
            Some((first, rest)) if first.value == "prm" && !first.is_literal() => (first, rest),
            _ => return Err(RenderError::malformed(node, "expected a leading prm{..} record")),
        };
        let field = |key: &str| {
            prm.children
                .iter()
                .find(|n| n.value == key)
                .map(|n| join_words(&n.children))
        };
        let url = field("url").ok_or_else(|| RenderError::malformed(node, "missing url"))?;
        Ok((
            ImageParams {
                url,
                alt: field("alt").unwrap_or_default(),
            },
            caption,
        ))
    }
}

fn join_words(forest: &[Node]) -> String {
    forest
        .iter()
        .map(|n| n.value.as_str())
        .collect::<Vec<_>>()
        .join(" ")
}

/// Children of an anonymous group node, or an error naming `parent`.
fn group<'a>(parent: &Node, node: &'a Node, what: &str) -> Result<&'a [Node], RenderError> {
    if node.value.is_empty() {
        Ok(&node.children)
    } else {
        Err(RenderError::malformed(
            parent,
            format!("{what} must be a {{..}} group, found '{}'", node.value),
        ))
    }
}

/// Rows of cells.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Table<'a> {
    pub rows: Vec<Vec<&'a [Node]>>,
}

impl<'a> Table<'a> {
    fn from_node(node: &'a Node) -> Result<Self, RenderError> {
        let rows = node
            .children
            .iter()
            .map(|row| -> Result<Vec<&'a [Node]>, RenderError> {
                group(node, row, "a table row")?
                    .iter()
                    .map(|cell| group(node, cell, "a table cell"))
                    .collect()
            })
            .collect::<Result<Vec<_>, _>>()?;
        Ok(Table { rows })
    }
}

/// Items of a bulleted list.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct List<'a> {
    pub items: Vec<&'a [Node]>,
}

impl<'a> List<'a> {
    fn from_node(node: &'a Node) -> Result<Self, RenderError> {
        let items = node
            .children
            .iter()
            .map(|item| group(node, item, "a list item"))
            .collect::<Result<Vec<_>, _>>()?;
        Ok(List { items })
    }
}

// ── Translator ────────────────────────────────────────────────────────────────

/// Tags laid out on their own line; no inter-word space is emitted before
/// them.
fn is_block(node: &Node) -> bool {
    !node.is_literal()
        && matches!(
            node.value.as_str(),
            "p" | "h1" | "h2" | "h3" | "h4" | "h5" | "h6" | "table" | "list"
        )
}

fn heading_level(tag: &str) -> Option<u8> {
    match tag.strip_prefix('h')?.parse::<u8>() {
        Ok(level @ 1..=6) => Some(level),
        _ => None,
    }
}

/// A backend for evaluated documents.  Implementors provide one hook per
/// vocabulary element; [`translate`](Translator::translate) does the
/// dispatching.
pub trait Translator {
    fn on_word(&mut self, word: &str);
    fn on_space(&mut self);

    fn on_paragraph(&mut self, content: &[Node]) -> Result<(), RenderError>;
    fn on_bold(&mut self, content: &[Node]) -> Result<(), RenderError>;
    fn on_italic(&mut self, content: &[Node]) -> Result<(), RenderError>;
    fn on_underline(&mut self, content: &[Node]) -> Result<(), RenderError>;
    fn on_strikethrough(&mut self, content: &[Node]) -> Result<(), RenderError>;
    fn on_monospace(&mut self, content: &[Node]) -> Result<(), RenderError>;
    /// `level` is 1 to 6.
    fn on_heading(&mut self, level: u8, content: &[Node]) -> Result<(), RenderError>;
    fn on_ins(&mut self, content: &[Node]) -> Result<(), RenderError>;
    fn on_image(&mut self, params: &ImageParams, caption: &[Node]) -> Result<(), RenderError>;
    fn on_table(&mut self, table: &Table<'_>) -> Result<(), RenderError>;
    fn on_list(&mut self, list: &List<'_>) -> Result<(), RenderError>;

    /// Render `forest`, reproducing source spacing between inline nodes.
    fn translate(&mut self, forest: &[Node]) -> Result<(), RenderError> {
        for (i, node) in forest.iter().enumerate() {
            if i > 0 && node.space_before && !is_block(node) {
                self.on_space();
            }
            self.translate_node(node)?;
        }
        Ok(())
    }

    fn translate_node(&mut self, node: &Node) -> Result<(), RenderError> {
        if node.is_literal() {
            self.on_word(&node.value);
            return Ok(());
        }
        let content = node.children.as_slice();
        match node.value.as_str() {
            "" => self.translate(content),
            "p" => self.on_paragraph(content),
            "b" => self.on_bold(content),
            "i" => self.on_italic(content),
            "u" => self.on_underline(content),
            "s" => self.on_strikethrough(content),
            "m" => self.on_monospace(content),
            "ins" => self.on_ins(content),
            "image" => {
                let (params, caption) = ImageParams::from_node(node)?;
                self.on_image(&params, caption)
            }
            "table" => self.on_table(&Table::from_node(node)?),
            "list" => self.on_list(&List::from_node(node)?),
            tag => match heading_level(tag) {
                Some(level) => self.on_heading(level, content),
                None => Err(RenderError::unknown(node)),
            },
        }
    }
}

// ── HTML ──────────────────────────────────────────────────────────────────────

const HTML_SPECIAL: [&str; 4] = ["&", "<", ">", "\""];
const HTML_ESCAPED: [&str; 4] = ["&amp;", "&lt;", "&gt;", "&quot;"];

/// Writes HTML into an in-memory buffer.
#[derive(Debug, Clone)]
pub struct HtmlTranslator {
    out: String,
    escaper: AhoCorasick,
}

impl Default for HtmlTranslator {
    fn default() -> Self {
        Self::new()
    }
}

impl HtmlTranslator {
    pub fn new() -> Self {
        Self {
            out: String::new(),
            escaper: AhoCorasick::new(HTML_SPECIAL),
        }
    }

    pub fn as_str(&self) -> &str {
        &self.out
    }

    pub fn into_string(self) -> String {
        self.out
    }

    fn escape(&self, text: &str) -> String {
        self.escaper.replace_all(text, &HTML_ESCAPED)
    }

    /// Block elements start on a fresh line, except at the very beginning.
    fn open_block(&mut self) {
        if !self.out.is_empty() {
            self.out.push('\n');
        }
    }

    fn element(&mut self, tag: &str, content: &[Node]) -> Result<(), RenderError> {
        self.out.push('<');
        self.out.push_str(tag);
        self.out.push('>');
        self.translate(content)?;
        self.out.push_str("</");
        self.out.push_str(tag);
        self.out.push('>');
        Ok(())
    }
}

impl Translator for HtmlTranslator {
    fn on_word(&mut self, word: &str) {
        let escaped = self.escape(word);
        self.out.push_str(&escaped);
    }

    fn on_space(&mut self) {
        self.out.push(' ');
    }

    fn on_paragraph(&mut self, content: &[Node]) -> Result<(), RenderError> {
        self.open_block();
        self.element("p", content)
    }

    fn on_bold(&mut self, content: &[Node]) -> Result<(), RenderError> {
        self.element("b", content)
    }

    fn on_italic(&mut self, content: &[Node]) -> Result<(), RenderError> {
        self.element("i", content)
    }

    fn on_underline(&mut self, content: &[Node]) -> Result<(), RenderError> {
        self.element("u", content)
    }

    fn on_strikethrough(&mut self, content: &[Node]) -> Result<(), RenderError> {
        self.element("s", content)
    }

    fn on_monospace(&mut self, content: &[Node]) -> Result<(), RenderError> {
        self.element("code", content)
    }

    fn on_heading(&mut self, level: u8, content: &[Node]) -> Result<(), RenderError> {
        self.open_block();
        self.element(&format!("h{level}"), content)
    }

    fn on_ins(&mut self, content: &[Node]) -> Result<(), RenderError> {
        self.element("ins", content)
    }

    fn on_image(&mut self, params: &ImageParams, caption: &[Node]) -> Result<(), RenderError> {
        let img = format!(
            "<img src=\"{}\" alt=\"{}\"/>",
            self.escape(&params.url),
            self.escape(&params.alt)
        );
        if caption.is_empty() {
            self.out.push_str(&img);
            return Ok(());
        }
        self.out.push_str("<figure>");
        self.out.push_str(&img);
        self.element("figcaption", caption)?;
        self.out.push_str("</figure>");
        Ok(())
    }

    fn on_table(&mut self, table: &Table<'_>) -> Result<(), RenderError> {
        self.open_block();
        self.out.push_str("<table>");
        for row in &table.rows {
            self.out.push_str("\n<tr>");
            for cell in row {
                self.element("td", cell)?;
            }
            self.out.push_str("</tr>");
        }
        self.out.push_str("\n</table>");
        Ok(())
    }

    fn on_list(&mut self, list: &List<'_>) -> Result<(), RenderError> {
        self.open_block();
        self.out.push_str("<ul>");
        for item in &list.items {
            self.out.push('\n');
            self.element("li", item)?;
        }
        self.out.push_str("\n</ul>");
        Ok(())
    }
}

/// Render an evaluated forest as an HTML fragment.
pub fn to_html(forest: &[Node]) -> Result<String, RenderError> {
    let mut tr = HtmlTranslator::new();
    tr.translate(forest)?;
    Ok(tr.into_string())
}

// ── Tests ─────────────────────────────────────────────────────────────────────
