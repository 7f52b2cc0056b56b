//! Editor runtime: document state, command API and change notifications.
//!
//! The editor owns an immutable document snapshot (`Arc<Node>`), the
//! selection and a list of [`DocumentObserver`]s. Every dispatched
//! transaction is applied atomically and then announced to each observer in
//! registration order, on the calling thread. Observers may dispatch further
//! transactions from inside a notification; those are applied immediately and
//! announced (to every observer, including the one that dispatched them)
//! before control returns.
//!
//! Observers are shared through `Rc` and keep their state in `Cell`s, so an
//! editor belongs to a single thread.

use std::rc::Rc;
use std::sync::Arc;

use serde::Deserialize;
use tracing::trace;

use crate::error::{CommandError, ValidationError};
use crate::limits::MAX_DISPATCH_DEPTH;
use crate::model::{AttrValue, Attrs, Node, NodeType};
use crate::schema::Schema;
use crate::transform::{Selection, Transaction};
use crate::validate::validate_doc;

/// Runtime options.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(default)]
pub struct EditorOptions {
    /// Bound on transactions dispatched from inside notifications.
    pub max_dispatch_depth: usize,
}

impl Default for EditorOptions {
    fn default() -> Self {
        Self {
            max_dispatch_depth: MAX_DISPATCH_DEPTH,
        }
    }
}

/// Notification delivered after a transaction has been applied.
#[derive(Debug)]
pub struct ChangeEvent<'a> {
    /// The transaction that was applied.
    pub transaction: &'a Transaction,
    /// The document after the transaction.
    pub doc: Arc<Node>,
    /// The document before the transaction.
    pub doc_before: Arc<Node>,
    pub selection: Selection,
    /// Document version after the transaction.
    pub version: u64,
}

impl ChangeEvent<'_> {
    /// Returns true if the document content changed (false for selection-only
    /// transactions).
    pub fn doc_changed(&self) -> bool {
        self.transaction.doc_changed()
    }
}

/// Receives change notifications from an [`Editor`].
pub trait DocumentObserver {
    /// Called after every dispatched transaction. `editor` is the live editor
    /// and may be used to issue further commands.
    fn on_document_changed(&self, event: &ChangeEvent<'_>, editor: &mut Editor);
}

/// An editing session over one document.
pub struct Editor {
    schema: Arc<Schema>,
    doc: Arc<Node>,
    selection: Selection,
    version: u64,
    depth: usize,
    observers: Vec<Rc<dyn DocumentObserver>>,
    options: EditorOptions,
}

impl Editor {
    /// Creates an editor over `doc`, which must be valid for `schema`.
    pub fn new(schema: Arc<Schema>, doc: Node) -> Result<Self, ValidationError> {
        Self::with_options(schema, doc, EditorOptions::default())
    }

    pub fn with_options(
        schema: Arc<Schema>,
        doc: Node,
        options: EditorOptions,
    ) -> Result<Self, ValidationError> {
        validate_doc(&schema, &doc)?;
        Ok(Self {
            schema,
            doc: Arc::new(doc),
            selection: Selection::default(),
            version: 0,
            depth: 0,
            observers: Vec::new(),
            options,
        })
    }

    pub fn schema(&self) -> &Arc<Schema> {
        &self.schema
    }

    /// Current document snapshot.
    pub fn doc(&self) -> Arc<Node> {
        Arc::clone(&self.doc)
    }

    pub fn selection(&self) -> Selection {
        self.selection
    }

    /// Number of content-changing transactions applied so far.
    pub fn version(&self) -> u64 {
        self.version
    }

    /// Registers an observer. Observers are notified in registration order.
    pub fn add_observer(&mut self, observer: Rc<dyn DocumentObserver>) {
        self.observers.push(observer);
    }

    /// Removes a previously registered observer (compared by pointer).
    pub fn remove_observer(&mut self, observer: &Rc<dyn DocumentObserver>) {
        self.observers.retain(|o| !Rc::ptr_eq(o, observer));
    }

    /// Applies a transaction and notifies observers.
    ///
    /// On error nothing changes and nobody is notified.
    pub fn dispatch(&mut self, tr: Transaction) -> Result<(), CommandError> {
        if self.depth >= self.options.max_dispatch_depth {
            return Err(CommandError::DispatchTooDeep {
                max: self.options.max_dispatch_depth,
            });
        }

        let (doc, selection) = tr.apply(&self.schema, &self.doc, self.selection)?;
        let doc_before = Arc::clone(&self.doc);
        if tr.doc_changed() {
            self.doc = Arc::new(doc);
            self.version += 1;
        }
        self.selection = selection;

        trace!(
            version = self.version,
            steps = tr.steps().len(),
            doc_changed = tr.doc_changed(),
            depth = self.depth,
            "dispatched transaction"
        );

        let event = ChangeEvent {
            transaction: &tr,
            doc: Arc::clone(&self.doc),
            doc_before,
            selection,
            version: self.version,
        };
        let observers = self.observers.clone();
        self.depth += 1;
        for observer in &observers {
            observer.on_document_changed(&event, self);
        }
        self.depth -= 1;
        Ok(())
    }

    // =========================================================================
    // Commands
    // =========================================================================

    /// Moves the cursor. Does not change the document.
    pub fn set_text_selection(&mut self, pos: usize) -> Result<(), CommandError> {
        self.set_selection(Selection::cursor(pos))
    }

    pub fn set_selection(&mut self, selection: Selection) -> Result<(), CommandError> {
        let size = self.doc.content_size();
        if selection.to > size {
            return Err(CommandError::OutOfRange {
                pos: selection.to,
                size,
            });
        }
        self.dispatch(Transaction::new().select(selection))
    }

    /// Sets one attribute of the node starting at `pos`.
    pub fn set_node_attr(
        &mut self,
        pos: usize,
        attr: &str,
        value: impl Into<AttrValue>,
    ) -> Result<(), CommandError> {
        self.dispatch(Transaction::new().set_node_attr(pos, attr, value))
    }

    /// Sets `attrs` on every node of `node_type` touched by the selection (or
    /// starting at a collapsed cursor). Returns the number of nodes updated.
    pub fn update_attributes(&mut self, node_type: NodeType, attrs: Attrs) -> Result<usize, CommandError> {
        let Selection { from, to } = self.selection;
        let mut positions = Vec::new();
        if let Some(node) = self.doc.node_at(from) {
            if node.node_type() == node_type && self.doc.path_to(from).is_some() {
                positions.push(from);
            }
        }
        self.doc.nodes_between(from, to, |node, pos| {
            if node.node_type() == node_type && !positions.contains(&pos) {
                positions.push(pos);
            }
            true
        });

        if positions.is_empty() || attrs.is_empty() {
            return Ok(0);
        }
        let count = positions.len();
        let mut tr = Transaction::new();
        for pos in positions {
            for (name, value) in &attrs {
                tr = tr.set_node_attr(pos, name.clone(), value.clone());
            }
        }
        self.dispatch(tr)?;
        Ok(count)
    }

    /// Inserts `node` at the selection and places the cursor after it.
    ///
    /// If the selection start is not a boundary between children (for example
    /// a cursor inside text) the node goes after the top-level block that
    /// contains it. Returns the insertion position.
    pub fn insert_content(&mut self, node: Node) -> Result<usize, CommandError> {
        let pos = self.insertion_point(self.selection.from);
        let size = node.node_size();
        self.dispatch(
            Transaction::new()
                .insert(pos, vec![node])
                .select(Selection::cursor(pos + size)),
        )?;
        Ok(pos)
    }

    /// Replaces the children between `from` and `to` with `node`.
    pub fn replace_range_with(&mut self, from: usize, to: usize, node: Node) -> Result<(), CommandError> {
        let size = node.node_size();
        self.dispatch(
            Transaction::new()
                .replace(from, to, vec![node])
                .select(Selection::cursor(from + size)),
        )
    }

    /// Replaces the selection with `node`, falling back to
    /// [`insert_content`](Self::insert_content) when the selection does not
    /// span siblings of one parent.
    pub fn replace_selection_with(&mut self, node: Node) -> Result<usize, CommandError> {
        let Selection { from, to } = self.selection;
        let same_parent = match (self.doc.resolve_boundary(from), self.doc.resolve_boundary(to)) {
            (Some((a, _)), Some((b, _))) => a == b,
            _ => false,
        };
        if same_parent && !self.selection.is_empty() {
            self.replace_range_with(from, to, node)?;
            Ok(from)
        } else {
            self.insert_content(node)
        }
    }

    /// Deletes the children between two boundaries.
    pub fn delete_range(&mut self, from: usize, to: usize) -> Result<(), CommandError> {
        self.dispatch(Transaction::new().delete(from, to))
    }

    fn insertion_point(&self, pos: usize) -> usize {
        if self.doc.resolve_boundary(pos).is_some() {
            return pos;
        }
        let mut offset = 0;
        for child in self.doc.content() {
            offset += child.node_size();
            if pos < offset {
                return offset;
            }
        }
        offset
    }
}

impl std::fmt::Debug for Editor {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Editor")
            .field("doc", &self.doc)
            .field("selection", &self.selection)
            .field("version", &self.version)
            .field("observers", &self.observers.len())
            .finish_non_exhaustive()
    }
}
