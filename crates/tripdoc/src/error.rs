//! Error types for schema construction, editing, encoding, parsing and
//! validation.

use thiserror::Error;

use crate::model::NodeType;

/// Error raised while building a schema or constructing nodes against it.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum SchemaError {
    #[error("unknown node type {name:?}")]
    UnknownNodeType { name: String },

    #[error("unknown mark type {name:?}")]
    UnknownMarkType { name: String },

    #[error("{node_type} is not part of this schema")]
    MissingNodeType { node_type: NodeType },

    #[error("invalid content expression {expr:?}: {reason}")]
    InvalidContentExpr { expr: String, reason: &'static str },

    #[error("content of {node_type} does not match {expr:?} (child {index})")]
    ContentMismatch {
        node_type: NodeType,
        expr: String,
        index: usize,
    },

    #[error("attribute {attr:?} is not declared on {node_type}")]
    UnknownAttribute { node_type: NodeType, attr: String },

    #[error("attribute {attr:?} is not declared on mark {mark}")]
    UnknownMarkAttribute { mark: &'static str, attr: String },

    #[error("text nodes must not be empty")]
    EmptyText,

    #[error("marks are only allowed on text nodes, found on {node_type}")]
    MarksOnNonText { node_type: NodeType },
}

/// Error raised when a step, transaction or editor command cannot be applied.
///
/// A failed transaction leaves the document and selection untouched.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum CommandError {
    #[error("no node starts at position {pos}")]
    NoNodeAt { pos: usize },

    #[error("position {pos} is outside the document (content size {size})")]
    OutOfRange { pos: usize, size: usize },

    #[error("range {from}..{to} does not span siblings of a single parent")]
    InvalidRange { from: usize, to: usize },

    #[error("expected {expected} at position {pos}, found {found}")]
    UnexpectedNode {
        pos: usize,
        expected: NodeType,
        found: NodeType,
    },

    #[error("gallery at position {pos} has no cell with index {index}")]
    MissingCell { pos: usize, index: i64 },

    #[error("dispatch nested deeper than {max} levels")]
    DispatchTooDeep { max: usize },

    #[error(transparent)]
    Schema(#[from] SchemaError),
}

/// Error during JSON decoding of a document.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum DecodeError {
    #[error("malformed JSON: {0}")]
    Json(String),

    #[error("root node is {found:?}, expected \"doc\"")]
    NotADocument { found: String },

    #[error("text node without text")]
    MissingText,

    #[error("node nesting exceeds maximum depth {max}")]
    TooDeep { max: usize },

    #[error("document has more than {max} nodes")]
    TooManyNodes { max: usize },

    #[error("text length {len} exceeds maximum {max}")]
    TextTooLong { len: usize, max: usize },

    #[error(transparent)]
    Schema(#[from] SchemaError),
}

impl From<serde_json::Error> for DecodeError {
    fn from(err: serde_json::Error) -> Self {
        DecodeError::Json(err.to_string())
    }
}

/// Error while reading a document from HTML.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum ParseError {
    #[error("invalid parse rule selector {selector:?}: {reason}")]
    InvalidSelector { selector: String, reason: String },

    #[error("element nesting exceeds maximum depth {max}")]
    TooDeep { max: usize },

    #[error("document has more than {max} nodes")]
    TooManyNodes { max: usize },

    #[error("text length {len} exceeds maximum {max}")]
    TextTooLong { len: usize, max: usize },

    #[error(transparent)]
    Schema(#[from] SchemaError),
}

/// Error during JSON or HTML encoding.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum EncodeError {
    #[error("JSON serialization failed: {0}")]
    Json(String),

    #[error("{node_type} has no spec in this schema")]
    MissingSpec { node_type: NodeType },

    #[error("mark {mark} has no spec in this schema")]
    MissingMarkSpec { mark: &'static str },
}

impl From<serde_json::Error> for EncodeError {
    fn from(err: serde_json::Error) -> Self {
        EncodeError::Json(err.to_string())
    }
}

/// Error found by whole-document validation.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum ValidationError {
    #[error("root node is {found}, expected doc")]
    NotADocument { found: NodeType },

    #[error("invalid node at position {pos}: {source}")]
    InvalidNode { pos: usize, source: SchemaError },
}
