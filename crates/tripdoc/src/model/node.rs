//! Positioned document nodes.
//!
//! Positions follow the ProseMirror convention:
//! - the document's content starts at position 0;
//! - a text node occupies one position per UTF-16 code unit;
//! - any other leaf occupies exactly one position;
//! - a non-leaf node occupies its content size plus two (opening and closing
//!   token), and its content starts one position after the node itself.
//!
//! Nodes are immutable. Children are shared through `Arc`, so replacing a node
//! deep in the tree only copies the child vectors along its path.

use std::sync::Arc;

use crate::model::{AttrValue, Attrs, MarkType, NodeType};

/// A mark (inline formatting) on a text node.
#[derive(Debug, Clone, PartialEq)]
pub struct Mark {
    pub mark_type: MarkType,
    pub attrs: Attrs,
}

/// A node in the document tree.
///
/// Construct nodes through [`Schema`](crate::schema::Schema), which fills
/// default attributes and checks content rules.
#[derive(Debug, Clone, PartialEq)]
pub struct Node {
    node_type: NodeType,
    attrs: Attrs,
    content: Vec<Arc<Node>>,
    text: Option<String>,
    marks: Vec<Mark>,
    size: usize,
}

impl Node {
    /// Assembles a node without schema checks. The caller has validated the
    /// parts.
    pub(crate) fn from_parts(
        node_type: NodeType,
        attrs: Attrs,
        content: Vec<Arc<Node>>,
        text: Option<String>,
        marks: Vec<Mark>,
    ) -> Self {
        let size = compute_size(node_type, &content, text.as_deref());
        Self {
            node_type,
            attrs,
            content,
            text,
            marks,
            size,
        }
    }

    pub fn node_type(&self) -> NodeType {
        self.node_type
    }

    pub fn attrs(&self) -> &Attrs {
        &self.attrs
    }

    /// Returns an attribute value, if present.
    pub fn attr(&self, name: &str) -> Option<&AttrValue> {
        self.attrs.get(name)
    }

    pub fn content(&self) -> &[Arc<Node>] {
        &self.content
    }

    pub fn child(&self, index: usize) -> Option<&Node> {
        self.content.get(index).map(Arc::as_ref)
    }

    pub fn child_count(&self) -> usize {
        self.content.len()
    }

    pub fn text(&self) -> Option<&str> {
        self.text.as_deref()
    }

    pub fn marks(&self) -> &[Mark] {
        &self.marks
    }

    pub fn is_text(&self) -> bool {
        self.node_type == NodeType::Text
    }

    pub fn is_leaf(&self) -> bool {
        self.node_type.is_leaf()
    }

    /// Size of this node in positions.
    pub fn node_size(&self) -> usize {
        self.size
    }

    /// Size of this node's content (0 for leaves).
    pub fn content_size(&self) -> usize {
        if self.is_leaf() { 0 } else { self.size - 2 }
    }

    /// Concatenated text of all descendant text nodes.
    pub fn text_content(&self) -> String {
        let mut out = String::new();
        self.collect_text(&mut out);
        out
    }

    fn collect_text(&self, out: &mut String) {
        if let Some(text) = &self.text {
            out.push_str(text);
        }
        for child in &self.content {
            child.collect_text(out);
        }
    }

    /// Visits every descendant depth first, in document order, with its
    /// position relative to the start of this node's content.
    ///
    /// The callback returns whether to descend into the visited node.
    pub fn descendants<F>(&self, mut f: F)
    where
        F: FnMut(&Node, usize) -> bool,
    {
        self.walk(0, &mut f);
    }

    fn walk<F>(&self, start: usize, f: &mut F)
    where
        F: FnMut(&Node, usize) -> bool,
    {
        let mut pos = start;
        for child in &self.content {
            if f(child, pos) && !child.content.is_empty() {
                child.walk(pos + 1, f);
            }
            pos += child.size;
        }
    }

    /// Visits nodes overlapping the range `from..to` (relative to this node's
    /// content), descending when the callback returns true.
    ///
    /// A node is visited when it starts before `to` and ends after `from`, so a
    /// collapsed range only reaches nodes that strictly contain it.
    pub fn nodes_between<F>(&self, from: usize, to: usize, mut f: F)
    where
        F: FnMut(&Node, usize) -> bool,
    {
        self.walk_between(from, to, 0, &mut f);
    }

    fn walk_between<F>(&self, from: usize, to: usize, base: usize, f: &mut F)
    where
        F: FnMut(&Node, usize) -> bool,
    {
        let mut pos = 0;
        for child in &self.content {
            if pos >= to {
                break;
            }
            let end = pos + child.size;
            if end > from && f(child, base + pos) && !child.content.is_empty() {
                let start = pos + 1;
                child.walk_between(
                    from.saturating_sub(start),
                    (to - start).min(child.content_size()),
                    base + start,
                    f,
                );
            }
            pos = end;
        }
    }

    /// Returns the node starting at `pos`, or the text node containing it.
    pub fn node_at(&self, pos: usize) -> Option<&Node> {
        self.locate(pos).map(|(_, node)| node)
    }

    /// Returns the child-index path to the non-text node starting at `pos`.
    pub fn path_to(&self, pos: usize) -> Option<Vec<usize>> {
        match self.locate(pos) {
            Some((path, node)) if !node.is_text() => Some(path),
            _ => None,
        }
    }

    fn locate(&self, pos: usize) -> Option<(Vec<usize>, &Node)> {
        let mut path = Vec::new();
        let mut node = self;
        let mut pos = pos;
        loop {
            let (index, offset) = node.find_index(pos)?;
            let child = node.content[index].as_ref();
            path.push(index);
            if offset == pos || child.is_text() {
                return Some((path, child));
            }
            if child.is_leaf() {
                return None;
            }
            pos -= offset + 1;
            node = child;
        }
    }

    /// Finds the child covering `pos`: its index and start offset.
    fn find_index(&self, pos: usize) -> Option<(usize, usize)> {
        let mut offset = 0;
        for (index, child) in self.content.iter().enumerate() {
            let end = offset + child.size;
            if pos < end {
                return Some((index, offset));
            }
            offset = end;
        }
        None
    }

    /// Resolves `pos` to a gap between children: the path of the parent and the
    /// index of the child that follows the gap.
    ///
    /// Returns `None` for positions inside text or outside the node.
    pub fn resolve_boundary(&self, pos: usize) -> Option<(Vec<usize>, usize)> {
        let mut path = Vec::new();
        let mut node = self;
        let mut pos = pos;
        loop {
            let mut offset = 0;
            let mut inside = None;
            for (index, child) in node.content.iter().enumerate() {
                if pos == offset {
                    return Some((path, index));
                }
                let end = offset + child.size;
                if pos < end {
                    inside = Some((index, offset));
                    break;
                }
                offset = end;
            }
            let Some((index, offset)) = inside else {
                return (pos == offset).then(|| (path, node.content.len()));
            };
            let child = node.content[index].as_ref();
            if child.is_leaf() {
                return None;
            }
            path.push(index);
            pos -= offset + 1;
            node = child;
        }
    }

    /// Follows a child-index path. The empty path is this node.
    pub fn node_at_path(&self, path: &[usize]) -> Option<&Node> {
        let mut node = self;
        for &index in path {
            node = node.content.get(index)?.as_ref();
        }
        Some(node)
    }

    /// Absolute start position of the content of the node at `path`.
    pub fn content_start(&self, path: &[usize]) -> Option<usize> {
        let mut node = self;
        let mut start = 0;
        for &index in path {
            let offset: usize = node.content.get(..index)?.iter().map(|c| c.size).sum();
            node = node.content.get(index)?.as_ref();
            start += offset + 1;
        }
        Some(start)
    }

    /// Returns a copy of this tree with the node at `path` replaced.
    pub(crate) fn replace_at_path(&self, path: &[usize], replacement: Node) -> Node {
        match path.split_first() {
            None => replacement,
            Some((&index, rest)) => {
                let mut content = self.content.clone();
                content[index] = Arc::new(content[index].replace_at_path(rest, replacement));
                self.with_content(content)
            }
        }
    }

    /// Returns a copy with one attribute replaced.
    pub(crate) fn with_attr(&self, name: &str, value: AttrValue) -> Node {
        let mut attrs = self.attrs.clone();
        attrs.insert(name.to_string(), value);
        Node {
            attrs,
            ..self.clone()
        }
    }

    /// Returns a copy with new children.
    pub(crate) fn with_content(&self, content: Vec<Arc<Node>>) -> Node {
        Node::from_parts(
            self.node_type,
            self.attrs.clone(),
            content,
            self.text.clone(),
            self.marks.clone(),
        )
    }
}

fn compute_size(node_type: NodeType, content: &[Arc<Node>], text: Option<&str>) -> usize {
    if node_type == NodeType::Text {
        text.map_or(0, |t| t.encode_utf16().count())
    } else if node_type.is_leaf() {
        1
    } else {
        content.iter().map(|c| c.size).sum::<usize>() + 2
    }
}
