//! Content expressions: which children a node type accepts.
//!
//! Supports the subset of the editor's expression syntax the itinerary
//! schema uses: a whitespace-separated sequence of terms, each a node type
//! name or group name with an optional `?`, `*` or `+` suffix.
//!
//! ```text
//! block+              one or more block nodes
//! inline*             any inline content
//! image?              at most one image
//! paragraph block*    a paragraph, then any blocks
//! ```

use std::sync::Arc;

use crate::error::SchemaError;
use crate::model::{Node, NodeGroup, NodeType};

/// What a single term matches.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NodeMatch {
    Type(NodeType),
    Group(NodeGroup),
}

/// Repetition of a term.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Repeat {
    One,
    Optional,
    ZeroOrMore,
    OneOrMore,
}

impl Repeat {
    fn min(self) -> usize {
        match self {
            Repeat::One | Repeat::OneOrMore => 1,
            Repeat::Optional | Repeat::ZeroOrMore => 0,
        }
    }

    fn max(self) -> usize {
        match self {
            Repeat::One | Repeat::Optional => 1,
            Repeat::ZeroOrMore | Repeat::OneOrMore => usize::MAX,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ContentTerm {
    pub matcher: NodeMatch,
    pub repeat: Repeat,
}

/// A parsed content expression. The empty expression accepts no children.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct ContentExpr {
    source: String,
    terms: Vec<ContentTerm>,
}

impl ContentExpr {
    /// Parses an expression such as `"paragraph block*"`.
    pub fn parse(source: &str) -> Result<Self, SchemaError> {
        let invalid = |reason| SchemaError::InvalidContentExpr {
            expr: source.to_string(),
            reason,
        };

        let mut terms = Vec::new();
        for token in source.split_whitespace() {
            let (name, repeat) = match token.as_bytes()[token.len() - 1] {
                b'?' => (&token[..token.len() - 1], Repeat::Optional),
                b'*' => (&token[..token.len() - 1], Repeat::ZeroOrMore),
                b'+' => (&token[..token.len() - 1], Repeat::OneOrMore),
                _ => (token, Repeat::One),
            };
            if name.is_empty() {
                return Err(invalid("repetition without a name"));
            }
            let matcher = if let Some(group) = NodeGroup::from_name(name) {
                NodeMatch::Group(group)
            } else if let Some(node_type) = NodeType::from_name(name) {
                NodeMatch::Type(node_type)
            } else {
                return Err(invalid("unknown node type or group"));
            };
            terms.push(ContentTerm { matcher, repeat });
        }

        Ok(Self {
            source: source.to_string(),
            terms,
        })
    }

    pub fn source(&self) -> &str {
        &self.source
    }

    pub fn terms(&self) -> &[ContentTerm] {
        &self.terms
    }

    /// Returns true if some term accepts inline nodes.
    pub fn accepts_inline(&self) -> bool {
        self.terms
            .iter()
            .any(|t| t.matcher == NodeMatch::Group(NodeGroup::Inline))
    }

    /// Returns true if the expression accepts no children at all.
    pub fn is_empty(&self) -> bool {
        self.terms.is_empty()
    }

    /// Matches children greedily, term by term.
    ///
    /// `group_of` reports the group of a node type in the current schema.
    /// On mismatch, returns the index of the first child that could not be
    /// placed (or the child count when required content is missing).
    pub fn match_children<G>(&self, children: &[Arc<Node>], group_of: G) -> Result<(), usize>
    where
        G: Fn(NodeType) -> Option<NodeGroup>,
    {
        let matches = |term: &ContentTerm, node: &Node| match term.matcher {
            NodeMatch::Type(t) => node.node_type() == t,
            NodeMatch::Group(g) => group_of(node.node_type()) == Some(g),
        };

        let mut index = 0;
        for term in &self.terms {
            let mut count = 0;
            while count < term.repeat.max()
                && index < children.len()
                && matches(term, &children[index])
            {
                count += 1;
                index += 1;
            }
            if count < term.repeat.min() {
                return Err(index);
            }
        }

        if index < children.len() {
            Err(index)
        } else {
            Ok(())
        }
    }
}
