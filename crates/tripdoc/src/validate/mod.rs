//! Whole-document validation.
//!
//! Nodes built through [`Schema`] are valid by construction. This module
//! re-checks complete trees, for documents assembled against a different
//! schema or handed over by a host: every node type must be known, every
//! attribute declared, every content expression satisfied and marks may only
//! appear on text.

use crate::error::{SchemaError, ValidationError};
use crate::model::{Node, NodeType};
use crate::schema::Schema;

/// Validates a document against `schema`, reporting the first violation with
/// the position of the offending node.
pub fn validate_doc(schema: &Schema, doc: &Node) -> Result<(), ValidationError> {
    if doc.node_type() != NodeType::Doc {
        return Err(ValidationError::NotADocument {
            found: doc.node_type(),
        });
    }
    // The document itself sits before position 0; report its problems there.
    validate_node(schema, doc).map_err(|source| ValidationError::InvalidNode { pos: 0, source })?;

    let mut result = Ok(());
    doc.descendants(|node, pos| {
        if result.is_err() {
            return false;
        }
        if let Err(source) = validate_node(schema, node) {
            result = Err(ValidationError::InvalidNode { pos, source });
            return false;
        }
        true
    });
    result
}

/// Checks one node, without descending.
pub fn validate_node(schema: &Schema, node: &Node) -> Result<(), SchemaError> {
    let node_type = node.node_type();
    let Some(spec) = schema.spec(node_type) else {
        return Err(SchemaError::MissingNodeType { node_type });
    };

    for name in node.attrs().keys() {
        if spec.attr_spec(name).is_none() {
            return Err(SchemaError::UnknownAttribute {
                node_type,
                attr: name.clone(),
            });
        }
    }

    if node.is_text() {
        if node.text().is_none_or(str::is_empty) {
            return Err(SchemaError::EmptyText);
        }
        for mark in node.marks() {
            let Some(mark_spec) = schema.mark_spec(mark.mark_type) else {
                return Err(SchemaError::UnknownMarkType {
                    name: mark.mark_type.name().to_string(),
                });
            };
            for name in mark.attrs.keys() {
                if !mark_spec.attrs.iter().any(|a| &a.name == name) {
                    return Err(SchemaError::UnknownMarkAttribute {
                        mark: mark.mark_type.name(),
                        attr: name.clone(),
                    });
                }
            }
        }
        return Ok(());
    }

    if !node.marks().is_empty() {
        return Err(SchemaError::MarksOnNonText { node_type });
    }
    schema.check_content(node_type, node.content())
}
