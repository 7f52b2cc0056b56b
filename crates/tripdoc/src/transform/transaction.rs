//! Transactions: ordered steps plus an optional selection change.
//!
//! # Example
//!
//! ```rust
//! use tripdoc::transform::{Selection, Transaction};
//!
//! let tr = Transaction::new()
//!     .set_node_attr(4, "group", "group-1")
//!     .select(Selection::cursor(0));
//! assert!(tr.doc_changed());
//! ```

use crate::error::CommandError;
use crate::model::{AttrValue, Node};
use crate::schema::Schema;
use crate::transform::Step;

/// A text-range selection, `from <= to`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct Selection {
    pub from: usize,
    pub to: usize,
}

impl Selection {
    /// A collapsed selection (cursor).
    pub fn cursor(pos: usize) -> Self {
        Self { from: pos, to: pos }
    }

    /// A range selection; the ends may be given in either order.
    pub fn range(a: usize, b: usize) -> Self {
        Self {
            from: a.min(b),
            to: a.max(b),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.from == self.to
    }

    fn clamp(self, max: usize) -> Self {
        Self {
            from: self.from.min(max),
            to: self.to.min(max),
        }
    }
}

/// A batch of steps applied atomically, with an optional new selection.
///
/// Steps apply in order; each step's positions refer to the document produced
/// by the steps before it.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct Transaction {
    steps: Vec<Step>,
    selection: Option<Selection>,
}

impl Transaction {
    pub fn new() -> Self {
        Self::default()
    }

    /// Adds a step.
    pub fn step(mut self, step: Step) -> Self {
        self.steps.push(step);
        self
    }

    /// Adds a [`Step::SetNodeAttr`].
    pub fn set_node_attr(mut self, pos: usize, attr: impl Into<String>, value: impl Into<AttrValue>) -> Self {
        self.steps.push(Step::SetNodeAttr {
            pos,
            attr: attr.into(),
            value: value.into(),
        });
        self
    }

    /// Adds a [`Step::Replace`].
    pub fn replace(mut self, from: usize, to: usize, content: Vec<Node>) -> Self {
        self.steps.push(Step::Replace { from, to, content });
        self
    }

    /// Inserts nodes at a boundary.
    pub fn insert(self, pos: usize, content: Vec<Node>) -> Self {
        self.replace(pos, pos, content)
    }

    /// Deletes the children between two boundaries.
    pub fn delete(self, from: usize, to: usize) -> Self {
        self.replace(from, to, Vec::new())
    }

    /// Sets the selection after the steps (in final document coordinates).
    pub fn select(mut self, selection: Selection) -> Self {
        self.selection = Some(selection);
        self
    }

    pub fn steps(&self) -> &[Step] {
        &self.steps
    }

    pub fn selection(&self) -> Option<Selection> {
        self.selection
    }

    /// Returns true if the transaction changes the document (as opposed to
    /// only moving the selection).
    pub fn doc_changed(&self) -> bool {
        !self.steps.is_empty()
    }

    /// Returns true if the transaction does nothing at all.
    pub fn is_empty(&self) -> bool {
        self.steps.is_empty() && self.selection.is_none()
    }

    /// Applies every step, then computes the new selection: the explicit one
    /// if set, otherwise `selection` mapped through the steps. Either is
    /// clamped to the new document.
    pub fn apply(
        &self,
        schema: &Schema,
        doc: &Node,
        selection: Selection,
    ) -> Result<(Node, Selection), CommandError> {
        let mut current = doc.clone();
        let mut mapped = selection;
        for step in &self.steps {
            current = step.apply(schema, &current)?;
            mapped = Selection {
                from: step.map(mapped.from),
                to: step.map(mapped.to),
            };
        }
        let selection = self.selection.unwrap_or(mapped).clamp(current.content_size());
        Ok((current, selection))
    }
}
