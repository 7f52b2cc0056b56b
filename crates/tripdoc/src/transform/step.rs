//! Atomic document changes.

use std::sync::Arc;

use crate::error::CommandError;
use crate::model::{AttrValue, Node};
use crate::schema::Schema;

/// An atomic change to a document (positions relative to the document
/// content).
#[derive(Debug, Clone, PartialEq)]
pub enum Step {
    /// Sets one attribute of the non-text node starting at `pos`.
    SetNodeAttr {
        pos: usize,
        attr: String,
        value: AttrValue,
    },
    /// Replaces the children between two boundaries of the same parent.
    Replace {
        from: usize,
        to: usize,
        content: Vec<Node>,
    },
}

impl Step {
    /// Applies the step, returning the new document.
    ///
    /// The result is checked against `schema`: attributes must be declared
    /// and replaced content must satisfy the parent's content expression.
    pub fn apply(&self, schema: &Schema, doc: &Node) -> Result<Node, CommandError> {
        match self {
            Step::SetNodeAttr { pos, attr, value } => {
                let path = doc.path_to(*pos).ok_or(CommandError::NoNodeAt { pos: *pos })?;
                let target = doc
                    .node_at_path(&path)
                    .ok_or(CommandError::NoNodeAt { pos: *pos })?;
                schema.attr_spec(target.node_type(), attr)?;
                let updated = target.with_attr(attr, value.clone());
                Ok(doc.replace_at_path(&path, updated))
            }
            Step::Replace { from, to, content } => {
                let (from, to) = (*from, *to);
                let size = doc.content_size();
                if to > size {
                    return Err(CommandError::OutOfRange { pos: to, size });
                }
                if from > to {
                    return Err(CommandError::InvalidRange { from, to });
                }

                let invalid = CommandError::InvalidRange { from, to };
                let (parent_path, start) = doc.resolve_boundary(from).ok_or(invalid.clone())?;
                let (end_path, end) = doc.resolve_boundary(to).ok_or(invalid.clone())?;
                if parent_path != end_path {
                    return Err(invalid);
                }
                let parent = doc.node_at_path(&parent_path).ok_or(invalid)?;

                let mut children: Vec<Arc<Node>> = Vec::with_capacity(
                    parent.child_count() - (end - start) + content.len(),
                );
                children.extend_from_slice(&parent.content()[..start]);
                children.extend(content.iter().cloned().map(Arc::new));
                children.extend_from_slice(&parent.content()[end..]);

                schema.check_content(parent.node_type(), &children)?;
                let updated = parent.with_content(children);
                Ok(doc.replace_at_path(&parent_path, updated))
            }
        }
    }

    /// Maps a position in the document before this step to the document
    /// after it. Positions inside a replaced range move to its end.
    pub fn map(&self, pos: usize) -> usize {
        match self {
            Step::SetNodeAttr { .. } => pos,
            Step::Replace { from, to, content } => {
                let inserted: usize = content.iter().map(Node::node_size).sum();
                if pos < *from {
                    pos
                } else if pos >= *to {
                    pos - (to - from) + inserted
                } else {
                    from + inserted
                }
            }
        }
    }

    /// Returns true if the step can change the document's structure.
    pub fn is_structural(&self) -> bool {
        matches!(self, Step::Replace { .. })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::SchemaError;
    use crate::model::{attrs, Attrs, NodeType};
    use crate::schema::default_schema;

    fn image(schema: &Schema, src: &str) -> Node {
        schema.node(NodeType::Image, attrs([("src", src)]), vec![]).unwrap()
    }

    fn paragraph(schema: &Schema, text: &str) -> Node {
        let text = schema.text(text, vec![]).unwrap();
        schema.node(NodeType::Paragraph, Attrs::new(), vec![text]).unwrap()
    }

    /// doc(image @0, paragraph("hi") @1..5, image @5)
    fn sample(schema: &Schema) -> Node {
        schema
            .node(
                NodeType::Doc,
                Attrs::new(),
                vec![image(schema, "a"), paragraph(schema, "hi"), image(schema, "b")],
            )
            .unwrap()
    }

    #[test]
    fn test_set_node_attr() {
        let schema = default_schema();
        let doc = sample(&schema);
        let step = Step::SetNodeAttr {
            pos: 5,
            attr: "group".into(),
            value: "group-1".into(),
        };
        let updated = step.apply(&schema, &doc).unwrap();
        assert_eq!(updated.node_at(5).unwrap().attr("group"), Some(&AttrValue::from("group-1")));
        assert_eq!(updated.node_at(0).unwrap().attr("group"), Some(&AttrValue::Null));
    }

    #[test]
    fn test_set_node_attr_errors() {
        let schema = default_schema();
        let doc = sample(&schema);

        let inside_text = Step::SetNodeAttr {
            pos: 2,
            attr: "group".into(),
            value: "g".into(),
        };
        assert_eq!(inside_text.apply(&schema, &doc), Err(CommandError::NoNodeAt { pos: 2 }));

        let undeclared = Step::SetNodeAttr {
            pos: 1,
            attr: "group".into(),
            value: "g".into(),
        };
        assert!(matches!(
            undeclared.apply(&schema, &doc),
            Err(CommandError::Schema(SchemaError::UnknownAttribute { .. }))
        ));
    }

    #[test]
    fn test_replace_inserts_and_deletes() {
        let schema = default_schema();
        let doc = sample(&schema);

        let insert = Step::Replace {
            from: 1,
            to: 1,
            content: vec![image(&schema, "new")],
        };
        let inserted = insert.apply(&schema, &doc).unwrap();
        assert_eq!(inserted.child_count(), 4);
        assert_eq!(inserted.node_at(1).unwrap().attr("src"), Some(&AttrValue::from("new")));

        let delete = Step::Replace {
            from: 1,
            to: 5,
            content: vec![],
        };
        let deleted = delete.apply(&schema, &doc).unwrap();
        assert_eq!(deleted.child_count(), 2);
        assert_eq!(deleted.content_size(), 2);
    }

    #[test]
    fn test_replace_rejects_bad_ranges() {
        let schema = default_schema();
        let doc = sample(&schema);

        let across_parents = Step::Replace {
            from: 2,
            to: 5,
            content: vec![],
        };
        assert_eq!(
            across_parents.apply(&schema, &doc),
            Err(CommandError::InvalidRange { from: 2, to: 5 })
        );

        let out_of_range = Step::Replace {
            from: 0,
            to: 99,
            content: vec![],
        };
        assert!(matches!(
            out_of_range.apply(&schema, &doc),
            Err(CommandError::OutOfRange { pos: 99, .. })
        ));

        // Emptying the document violates `block+`.
        let everything = Step::Replace {
            from: 0,
            to: 6,
            content: vec![],
        };
        assert!(matches!(
            everything.apply(&schema, &doc),
            Err(CommandError::Schema(SchemaError::ContentMismatch { .. }))
        ));
    }

    #[test]
    fn test_map() {
        let schema = default_schema();
        let insert = Step::Replace {
            from: 1,
            to: 1,
            content: vec![image(&schema, "x"), image(&schema, "y")],
        };
        assert_eq!(insert.map(0), 0);
        assert_eq!(insert.map(1), 3);
        assert_eq!(insert.map(5), 7);

        let delete = Step::Replace {
            from: 1,
            to: 5,
            content: vec![],
        };
        assert_eq!(delete.map(3), 1);
        assert_eq!(delete.map(6), 2);
    }
}
