//! Data model types for itinerary documents.
//!
//! This module contains the core types for representing documents:
//! - Node and mark type tags
//! - Attribute values
//! - Positioned, immutable nodes
//! - Builders (ergonomic construction)

pub mod attrs;
pub mod builder;
pub mod node;
pub mod types;

pub use attrs::{attrs, AttrValue, Attrs};
pub use builder::{DocBuilder, InlineBuilder};
pub use node::{Mark, Node};
pub use types::{MarkType, NodeGroup, NodeType};
