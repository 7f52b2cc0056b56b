//! tripdoc: positioned rich-text documents for travel itineraries.
//!
//! This crate models the documents of an itinerary editor (paragraphs,
//! headings, lists, images, galleries, embedded videos and photo layouts) with
//! ProseMirror-compatible positions, and keeps a derived `group` attribute on
//! images that sit next to each other.
//!
//! # Quick Start
//!
//! ```rust
//! use std::rc::Rc;
//! use tripdoc::{DocBuilder, Editor, ImageGroup, default_schema, to_html};
//!
//! let schema = default_schema();
//! let doc = DocBuilder::new(&schema)
//!     .heading(1, "Lisbon")
//!     .image("tram.jpg")
//!     .image("alfama.jpg")
//!     .build()
//!     .unwrap();
//!
//! let mut editor = Editor::new(schema.clone(), doc).unwrap();
//! editor.add_observer(Rc::new(ImageGroup::default()));
//!
//! // Any content change triggers a grouping pass.
//! editor.set_node_attr(8, "alt", "Tram 28").unwrap();
//!
//! let html = to_html(&schema, &editor.doc()).unwrap();
//! assert!(html.contains("data-group=\"group-"));
//! ```
//!
//! # Modules
//!
//! - [`model`]: Nodes, marks, attributes and positions
//! - [`schema`]: Node specs, content expressions and DOM renderers
//! - [`transform`]: Steps, transactions and selections
//! - [`editor`]: Editing session, commands and change observers
//! - [`extensions`]: Node types and behaviour per feature, including the
//!   image grouper
//! - [`codec`]: ProseMirror JSON
//! - [`render`]: HTML output
//! - [`parse`]: HTML input
//! - [`validate`]: Whole-document validation
//! - [`error`]: Error types
//! - [`limits`]: Decoding and dispatch limits
//!
//! # Positions
//!
//! Positions count from the start of the document's content. Text counts one
//! per UTF-16 code unit, any other leaf counts one, and a node with content
//! counts its content plus one for each of its boundaries.

pub mod codec;
pub mod editor;
pub mod error;
pub mod extensions;
pub mod limits;
pub mod model;
pub mod parse;
pub mod render;
pub mod schema;
pub mod transform;
pub mod validate;

// Re-export commonly used types at crate root
pub use codec::{decode_doc, encode_doc};
pub use editor::{ChangeEvent, DocumentObserver, Editor, EditorOptions};
pub use error::{CommandError, DecodeError, EncodeError, ParseError, SchemaError, ValidationError};
pub use extensions::{
    Extension, GalleryCommands, GalleryLayout, GroupStats, IframeCommands, ImageGroup,
    ImageGroupOptions, PhotoGalleryCommands,
};
pub use model::{attrs, AttrValue, Attrs, DocBuilder, Mark, MarkType, Node, NodeType};
pub use parse::from_html;
pub use render::to_html;
pub use schema::{default_schema, Schema};
pub use transform::{Selection, Step, Transaction};
pub use validate::validate_doc;

/// Crate version.
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
