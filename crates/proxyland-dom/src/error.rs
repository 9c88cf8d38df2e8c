#![forbid(unsafe_code)]

//! Errors from selector parsing, markup parsing and tree edits.

use std::fmt;

/// Why a selector failed to parse.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SelectorErrorKind {
    /// The selector (or one group of it) is empty.
    Empty,
    UnexpectedChar(char),
    UnexpectedEnd,
    /// `#`, `.` or `[` not followed by a name.
    ExpectedIdent,
    UnterminatedString,
}

/// A selector parse failure at a character offset.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SelectorError {
    pub position: usize,
    pub kind: SelectorErrorKind,
}

impl SelectorError {
    pub(crate) fn new(position: usize, kind: SelectorErrorKind) -> Self {
        Self { position, kind }
    }
}

impl fmt::Display for SelectorError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let at = self.position;
        match &self.kind {
            SelectorErrorKind::Empty => write!(f, "empty selector at {at}"),
            SelectorErrorKind::UnexpectedChar(c) => write!(f, "unexpected '{c}' at {at}"),
            SelectorErrorKind::UnexpectedEnd => write!(f, "unexpected end of selector at {at}"),
            SelectorErrorKind::ExpectedIdent => write!(f, "expected a name at {at}"),
            SelectorErrorKind::UnterminatedString => {
                write!(f, "unterminated string starting at {at}")
            }
        }
    }
}

impl std::error::Error for SelectorError {}

/// Why markup failed to parse.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum MarkupErrorKind {
    UnexpectedEnd,
    UnexpectedChar(char),
    InvalidTagName,
    MismatchedTag { expected: String, found: String },
    UnexpectedCloseTag(String),
    UnclosedTag(String),
    UnterminatedComment,
}

/// A markup parse failure at a character offset.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MarkupError {
    pub position: usize,
    pub kind: MarkupErrorKind,
}

impl MarkupError {
    pub(crate) fn new(position: usize, kind: MarkupErrorKind) -> Self {
        Self { position, kind }
    }
}

impl fmt::Display for MarkupError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let at = self.position;
        match &self.kind {
            MarkupErrorKind::UnexpectedEnd => write!(f, "unexpected end of markup at {at}"),
            MarkupErrorKind::UnexpectedChar(c) => write!(f, "unexpected '{c}' at {at}"),
            MarkupErrorKind::InvalidTagName => write!(f, "invalid tag name at {at}"),
            MarkupErrorKind::MismatchedTag { expected, found } => {
                write!(f, "expected </{expected}> but found </{found}> at {at}")
            }
            MarkupErrorKind::UnexpectedCloseTag(tag) => {
                write!(f, "unexpected </{tag}> at {at}")
            }
            MarkupErrorKind::UnclosedTag(tag) => write!(f, "unclosed <{tag}> at end of markup"),
            MarkupErrorKind::UnterminatedComment => {
                write!(f, "unterminated comment starting at {at}")
            }
        }
    }
}

impl std::error::Error for MarkupError {}

/// Errors from editing a document tree.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DomError {
    /// The edit would make a node its own ancestor.
    HierarchyRequest,
    Markup(MarkupError),
}

impl fmt::Display for DomError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::HierarchyRequest => f.write_str("node cannot be inserted into its own subtree"),
            Self::Markup(err) => write!(f, "markup error: {err}"),
        }
    }
}

impl std::error::Error for DomError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            Self::HierarchyRequest => None,
            Self::Markup(err) => Some(err),
        }
    }
}

impl From<MarkupError> for DomError {
    fn from(err: MarkupError) -> Self {
        Self::Markup(err)
    }
}
