//! Error types for loading and mutating documents.

use crate::core::lexer::TokenKind;
use crate::core::scanner::Position;
use crate::dom::NodeId;
use thiserror::Error;

/// Status code for a successful load
pub const STATUS_OK: i32 = 0;
/// Status code when the source could not be read or decoded
pub const STATUS_UNREADABLE: i32 = -1;
/// Status code for a malformed document
pub const STATUS_MALFORMED: i32 = -2;

/// Errors that abandon a document load.
///
/// A failed load never yields a tree; any partially built state is dropped.
#[derive(Debug, Error)]
pub enum ParseError {
    /// The byte source failed.
    #[error("source unreadable: {0}")]
    Io(#[from] std::io::Error),

    /// A token was not valid UTF-8.
    #[error("invalid UTF-8 at {position}")]
    InvalidUtf8 { position: Position },

    /// The document does not open with a tag.
    #[error("missing root element: found {found} at {position}")]
    MissingRoot { found: TokenKind, position: Position },

    /// Bad tag or attribute syntax.
    #[error("expected {expected}, found {found} at {position}")]
    UnexpectedToken {
        expected: &'static str,
        found: TokenKind,
        position: Position,
    },

    /// Input ended in the middle of a tag or quoted value.
    #[error("unexpected end of input, expected {expected} at {position}")]
    UnexpectedEof {
        expected: &'static str,
        position: Position,
    },

    /// A tag or text run follows the closed root element.
    #[error("content not allowed after root element at {position}")]
    ContentAfterRoot { position: Position },

    /// A closing tag with no element left open.
    #[error("unexpected end tag </{name}> without matching start tag at {position}")]
    UnexpectedCloseTag { name: String, position: Position },

    /// Strict mode: closing tag name differs from the open element.
    #[error("tag mismatch: <{expected}> closed with </{found}> at {position}")]
    TagMismatch {
        expected: String,
        found: String,
        position: Position,
    },

    /// Strict mode: input ended with elements still open.
    #[error("unclosed tag: <{name}> at end of input ({position})")]
    UnclosedTag { name: String, position: Position },

    /// Tree refused a mutation while building.
    #[error(transparent)]
    Tree(#[from] TreeError),
}

impl ParseError {
    /// Integer status: `STATUS_UNREADABLE` or `STATUS_MALFORMED`
    pub fn status(&self) -> i32 {
        match self {
            ParseError::Io(_) | ParseError::InvalidUtf8 { .. } => STATUS_UNREADABLE,
            _ => STATUS_MALFORMED,
        }
    }

    /// Source position the error was detected at, if any
    pub fn position(&self) -> Option<Position> {
        match self {
            ParseError::InvalidUtf8 { position }
            | ParseError::MissingRoot { position, .. }
            | ParseError::UnexpectedToken { position, .. }
            | ParseError::UnexpectedEof { position, .. }
            | ParseError::ContentAfterRoot { position }
            | ParseError::UnexpectedCloseTag { position, .. }
            | ParseError::TagMismatch { position, .. }
            | ParseError::UnclosedTag { position, .. } => Some(*position),
            ParseError::Io(_) | ParseError::Tree(_) => None,
        }
    }
}

/// Integer status of a load result: `STATUS_OK` on success
pub fn status_of<T>(result: &Result<T, ParseError>) -> i32 {
    match result {
        Ok(_) => STATUS_OK,
        Err(e) => e.status(),
    }
}

/// Refused tree mutations. The tree is left untouched.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
pub enum TreeError {
    /// The addressed node does not exist (never allocated or tombstoned).
    #[error("node {0} does not exist")]
    MissingNode(NodeId),

    /// Text nodes cannot hold children.
    #[error("node {0} is a text node and cannot hold children")]
    TextParent(NodeId),

    /// The document root can never be moved or deleted.
    #[error("the document root cannot be moved or deleted")]
    RootImmovable,

    /// The move would nest a node under itself or one of its descendants.
    #[error("moving node {node} under node {new_parent} would create a cycle")]
    Cycle { node: NodeId, new_parent: NodeId },
}
