//! Photo layouts: a draggable block holding a list of image URLs.

use crate::editor::Editor;
use crate::error::CommandError;
use crate::extensions::Extension;
use crate::model::{attrs, AttrValue, NodeGroup, NodeType};
use crate::schema::{AttrSpec, DomSpec, NodeSpec, SchemaBuilder};

/// The `photoGallery` node type.
#[derive(Debug, Clone, Copy, Default)]
pub struct PhotoGallery;

impl Extension for PhotoGallery {
    fn name(&self) -> &'static str {
        "photoGallery"
    }

    fn extend_schema(&self, schema: &mut SchemaBuilder) {
        schema.node(
            NodeSpec::new(NodeType::PhotoGallery, |_, attrs| DomSpec::element("photo-gallery", attrs))
                .group(NodeGroup::Block)
                .atom()
                .draggable()
                .parse_html("photo-gallery")
                .attr(
                    AttrSpec::new("images", AttrValue::List(Vec::new()))
                        .rendered_with(|v| match v {
                            AttrValue::Null => Vec::new(),
                            other => vec![("data-images".to_string(), other.to_string())],
                        })
                        .parsed_from("data-images"),
                ),
        );
    }
}

pub trait PhotoGalleryCommands {
    /// Inserts an empty photo gallery at the selection. Returns its position.
    fn set_photo_gallery(&mut self) -> Result<usize, CommandError>;
}

impl PhotoGalleryCommands for Editor {
    fn set_photo_gallery(&mut self) -> Result<usize, CommandError> {
        let node = self.schema().node(
            NodeType::PhotoGallery,
            attrs([("images", AttrValue::List(Vec::new()))]),
            Vec::new(),
        )?;
        self.insert_content(node)
    }
}
