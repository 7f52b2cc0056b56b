//! Schema extensions: node types, marks and behaviour bundled per feature.
//!
//! An [`Extension`] contributes to a [`SchemaBuilder`]. Extensions that also
//! react to edits (the image grouper) implement
//! [`DocumentObserver`](crate::editor::DocumentObserver) and are registered on
//! an [`Editor`](crate::editor::Editor) separately. Editor commands an
//! extension adds are provided through extension traits on `Editor`.

pub mod base;
pub mod gallery;
pub mod iframe;
pub mod image_group;
pub mod photo_gallery;

use crate::schema::SchemaBuilder;

pub use base::Core;
pub use gallery::{Gallery, GalleryCommands, GalleryLayout};
pub use iframe::{Iframe, IframeCommands, IframeOptions};
pub use image_group::{
    GroupStats, IdMinter, ImageGroup, ImageGroupOptions, ImageVisit, RunTracker, ScanGuard,
    ScanToken, SequentialIds, TimeOrderedIds,
};
pub use photo_gallery::{PhotoGallery, PhotoGalleryCommands};

/// A unit of schema configuration.
pub trait Extension {
    /// Name used in logs.
    fn name(&self) -> &'static str;

    /// Adds node specs, mark specs or global attributes.
    fn extend_schema(&self, schema: &mut SchemaBuilder);
}
