//! Reader for the brace-tree source syntax.
//!
//! ```text
//! p{Hello b{brave} "new world"!}   // line comment
//! /* block comment */ table{ {{a}{b}} {{1}{2}} }
//! ```
//!
//! - Words are runs of anything except whitespace, `{`, `}` and `"`.
//! - `"..."` is a quoted word (`\"`, `\\`, `\n`, `\t`, `\r` escapes).
//! - `{..}` becomes the children of the word right before it (whitespace
//!   allowed in between) unless that word already has a brace group, in
//!   which case it becomes an anonymous node with an empty value.
//! - Comments are only recognised where a token could start.

use std::iter::Peekable;
use std::str::Chars;

use thiserror::Error;

use crate::tree::{Forest, Location, Node};

/// Deepest brace nesting the reader accepts.
pub const MAX_NESTING: usize = 1024;

/// A syntax error in reader input.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("{line}:{column}: {message}")]
pub struct ParseError {
    pub line: usize,
    pub column: usize,
    pub message: String,
}

impl ParseError {
    fn new(at: Location, message: impl Into<String>) -> Self {
        Self {
            line: at.line,
            column: at.column,
            message: message.into(),
        }
    }
}

/// Parse a complete source text into a forest.
pub fn parse(src: &str) -> Result<Forest, ParseError> {
    let mut reader = Reader {
        chars: src.chars().peekable(),
        line: 1,
        column: 1,
        nesting: 0,
    };
    let forest = reader.parse_list(None)?;
    Ok(forest)
}

// ── Reader ────────────────────────────────────────────────────────────────────

struct Reader<'a> {
    chars: Peekable<Chars<'a>>,
    line: usize,
    column: usize,
    /// Open `{` groups around the current position.
    nesting: usize,
}

impl Reader<'_> {
    fn here(&self) -> Location {
        Location::new(self.line, self.column)
    }

    fn bump(&mut self) -> Option<char> {
        let c = self.chars.next()?;
        if c == '\n' {
            self.line += 1;
            self.column = 1;
        } else {
            self.column += 1;
        }
        Some(c)
    }

    /// Look one character past the next one without consuming anything.
    fn peek2(&self) -> Option<char> {
        let mut it = self.chars.clone();
        it.next();
        it.next()
    }

    /// Skip whitespace and comments.  Returns `true` if anything was skipped.
    fn skip_blank(&mut self) -> Result<bool, ParseError> {
        let mut skipped = false;
        loop {
            match self.chars.peek().copied() {
                Some(c) if c.is_whitespace() => {
                    self.bump();
                }
                Some('/') if self.peek2() == Some('/') => {
                    while let Some(c) = self.bump() {
                        if c == '\n' {
                            break;
                        }
                    }
                }
                Some('/') if self.peek2() == Some('*') => {
                    let start = self.here();
                    self.bump();
                    self.bump();
                    let mut closed = false;
                    while let Some(c) = self.bump() {
                        if c == '*' && self.chars.peek() == Some(&'/') {
                            self.bump();
                            closed = true;
                            break;
                        }
                    }
                    if !closed {
                        return Err(ParseError::new(start, "unterminated block comment"));
                    }
                }
                _ => return Ok(skipped),
            }
            skipped = true;
        }
    }

    /// Parse nodes until the matching `}` (when `open` is `Some`) or end of
    /// input (top level).
    fn parse_list(&mut self, open: Option<Location>) -> Result<Forest, ParseError> {
        let mut forest = Forest::new();
        // Whether the last node may still receive a brace group.
        let mut attachable = false;

        loop {
            let space_before = self.skip_blank()?;
            let at = self.here();
            match self.chars.peek().copied() {
                None => {
                    return match open {
                        Some(loc) => Err(ParseError::new(loc, "unterminated '{'")),
                        None => Ok(forest),
                    };
                }
                Some('}') => {
                    if open.is_none() {
                        return Err(ParseError::new(at, "unexpected '}'"));
                    }
                    self.bump();
                    return Ok(forest);
                }
                Some('{') => {
                    if self.nesting >= MAX_NESTING {
                        return Err(ParseError::new(
                            at,
                            format!("braces nested deeper than {MAX_NESTING}"),
                        ));
                    }
                    self.bump();
                    self.nesting += 1;
                    let children = self.parse_list(Some(at));
                    self.nesting -= 1;
                    let children = children?;
                    match (attachable, forest.last_mut()) {
                        (true, Some(last)) => last.children = children,
                        _ => forest.push(Node::call("", children).at(at).spaced(space_before)),
                    }
                    attachable = false;
                }
                Some('"') => {
                    let word = self.quoted()?;
                    forest.push(Node::leaf(word).at(at).spaced(space_before));
                    attachable = true;
                }
                Some(_) => {
                    let word = self.word();
                    forest.push(Node::leaf(word).at(at).spaced(space_before));
                    attachable = true;
                }
            }
        }
    }

    fn word(&mut self) -> String {
        let mut word = String::new();
        while let Some(&c) = self.chars.peek() {
            if c.is_whitespace() || matches!(c, '{' | '}' | '"') {
                break;
            }
            word.push(c);
            self.bump();
        }
        word
    }

    fn quoted(&mut self) -> Result<String, ParseError> {
        let start = self.here();
        self.bump(); // opening quote
        let mut word = String::new();
        loop {
            match self.bump() {
                None => return Err(ParseError::new(start, "unterminated string")),
                Some('"') => return Ok(word),
                Some('\\') => {
                    let at = self.here();
                    match self.bump() {
                        Some('n') => word.push('\n'),
                        Some('t') => word.push('\t'),
                        Some('r') => word.push('\r'),
                        Some(c @ ('"' | '\\')) => word.push(c),
                        Some(c) => {
                            return Err(ParseError::new(at, format!("unknown escape '\\{c}'")));
                        }
                        None => return Err(ParseError::new(start, "unterminated string")),
                    }
                }
                Some(c) => word.push(c),
            }
        }
    }
}

// ── Tests ─────────────────────────────────────────────────────────────────────
