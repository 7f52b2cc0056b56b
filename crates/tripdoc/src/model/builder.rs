//! Builder API for ergonomic document construction.
//!
//! Provides a fluent interface for assembling itinerary documents. Errors are
//! collected and reported once, by `build()`.
//!
//! # Example
//!
//! ```rust
//! use tripdoc::model::DocBuilder;
//! use tripdoc::extensions::GalleryLayout;
//! use tripdoc::schema::default_schema;
//!
//! let schema = default_schema();
//! let doc = DocBuilder::new(&schema)
//!     .heading(1, "Lisbon in a day")
//!     .paragraph(|p| p.text("Start with ").bold("pastéis de nata"))
//!     .image("tram.jpg")
//!     .image("alfama.jpg")
//!     .gallery(GalleryLayout::Double, &["belem.jpg", "lx-factory.jpg"])
//!     .build()
//!     .unwrap();
//! assert_eq!(doc.child_count(), 5);
//! ```

use crate::error::SchemaError;
use crate::extensions::gallery::{gallery_node, GalleryLayout};
use crate::model::{attrs, AttrValue, Attrs, MarkType, Node, NodeType};
use crate::schema::Schema;

/// Builder for a `doc` node.
#[derive(Debug)]
pub struct DocBuilder<'s> {
    schema: &'s Schema,
    content: Vec<Node>,
    error: Option<SchemaError>,
}

impl<'s> DocBuilder<'s> {
    pub fn new(schema: &'s Schema) -> Self {
        Self {
            schema,
            content: Vec::new(),
            error: None,
        }
    }

    fn push(mut self, node: Result<Node, SchemaError>) -> Self {
        match node {
            Ok(node) => self.content.push(node),
            Err(err) => {
                self.error.get_or_insert(err);
            }
        }
        self
    }

    /// Appends an already built node.
    pub fn node(self, node: Node) -> Self {
        self.push(Ok(node))
    }

    /// Appends a heading with plain text.
    pub fn heading(self, level: i64, text: &str) -> Self {
        let schema = self.schema;
        let node = schema.text(text, Vec::new()).and_then(|t| {
            schema.node(NodeType::Heading, attrs([("level", level)]), vec![t])
        });
        self.push(node)
    }

    /// Appends a paragraph built from inline content.
    pub fn paragraph<F>(self, f: F) -> Self
    where
        F: FnOnce(InlineBuilder<'s>) -> InlineBuilder<'s>,
    {
        let inline = f(InlineBuilder::new(self.schema));
        let schema = self.schema;
        let node = inline
            .finish()
            .and_then(|content| schema.node(NodeType::Paragraph, Attrs::new(), content));
        self.push(node)
    }

    /// Appends an image.
    pub fn image(self, src: &str) -> Self {
        self.image_with(attrs([("src", src)]))
    }

    /// Appends an image with arbitrary attributes (`src`, `alt`, `title`,
    /// `group`).
    pub fn image_with(self, attrs: Attrs) -> Self {
        let node = self.schema.node(NodeType::Image, attrs, Vec::new());
        self.push(node)
    }

    /// Appends a gallery; `srcs[i]` fills cell `i`.
    pub fn gallery(self, layout: GalleryLayout, srcs: &[&str]) -> Self {
        let node = gallery_node(self.schema, layout, srcs);
        self.push(node)
    }

    /// Appends an embedded iframe.
    pub fn iframe(self, src: &str) -> Self {
        let node = self
            .schema
            .node(NodeType::Iframe, attrs([("src", src)]), Vec::new());
        self.push(node)
    }

    /// Appends a photo gallery with the given image URLs.
    pub fn photo_gallery(self, images: &[&str]) -> Self {
        let list = AttrValue::List(images.iter().map(|&s| AttrValue::from(s)).collect());
        let node = self
            .schema
            .node(NodeType::PhotoGallery, attrs([("images", list)]), Vec::new());
        self.push(node)
    }

    /// Appends a bullet list with one plain paragraph per item.
    pub fn bullet_list(self, items: &[&str]) -> Self {
        let schema = self.schema;
        let node = items
            .iter()
            .map(|item| {
                let text = schema.text(*item, Vec::new())?;
                let para = schema.node(NodeType::Paragraph, Attrs::new(), vec![text])?;
                schema.node(NodeType::ListItem, Attrs::new(), vec![para])
            })
            .collect::<Result<Vec<_>, _>>()
            .and_then(|list_items| schema.node(NodeType::BulletList, Attrs::new(), list_items));
        self.push(node)
    }

    /// Builds the document, returning the first error encountered.
    pub fn build(self) -> Result<Node, SchemaError> {
        if let Some(err) = self.error {
            return Err(err);
        }
        self.schema.node(NodeType::Doc, Attrs::new(), self.content)
    }
}

/// Builder for inline content (text runs with marks, hard breaks).
#[derive(Debug)]
pub struct InlineBuilder<'s> {
    schema: &'s Schema,
    content: Vec<Node>,
    error: Option<SchemaError>,
}

impl<'s> InlineBuilder<'s> {
    pub fn new(schema: &'s Schema) -> Self {
        Self {
            schema,
            content: Vec::new(),
            error: None,
        }
    }

    fn push(mut self, node: Result<Node, SchemaError>) -> Self {
        match node {
            Ok(node) => self.content.push(node),
            Err(err) => {
                self.error.get_or_insert(err);
            }
        }
        self
    }

    fn marked(self, text: &str, marks: &[(MarkType, Attrs)]) -> Self {
        let schema = self.schema;
        let node = marks
            .iter()
            .map(|(t, a)| schema.mark(*t, a.clone()))
            .collect::<Result<Vec<_>, _>>()
            .and_then(|marks| schema.text(text, marks));
        self.push(node)
    }

    pub fn text(self, text: &str) -> Self {
        self.marked(text, &[])
    }

    pub fn bold(self, text: &str) -> Self {
        self.marked(text, &[(MarkType::Bold, Attrs::new())])
    }

    pub fn italic(self, text: &str) -> Self {
        self.marked(text, &[(MarkType::Italic, Attrs::new())])
    }

    /// A link, rendered with the link mark's default `target` and `rel`.
    pub fn link(self, text: &str, href: &str) -> Self {
        self.marked(text, &[(MarkType::Link, attrs([("href", href)]))])
    }

    pub fn hard_break(self) -> Self {
        let node = self.schema.node(NodeType::HardBreak, Attrs::new(), Vec::new());
        self.push(node)
    }

    /// Returns the collected nodes or the first error.
    pub fn finish(self) -> Result<Vec<Node>, SchemaError> {
        match self.error {
            Some(err) => Err(err),
            None => Ok(self.content),
        }
    }
}
