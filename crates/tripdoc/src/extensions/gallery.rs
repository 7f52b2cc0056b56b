//! Image galleries: a grid of indexed cells holding at most one image each.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::editor::Editor;
use crate::error::{CommandError, SchemaError};
use crate::extensions::Extension;
use crate::model::{attrs, AttrValue, Node, NodeGroup, NodeType};
use crate::schema::{html_attrs, merge_attributes, AttrSpec, DomSpec, NodeSpec, Schema, SchemaBuilder};

/// Gallery layouts, named by their number of cells.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum GalleryLayout {
    #[default]
    Single,
    Double,
    Triple,
    Quad,
}

impl GalleryLayout {
    pub const ALL: [GalleryLayout; 4] = [Self::Single, Self::Double, Self::Triple, Self::Quad];

    pub fn name(self) -> &'static str {
        match self {
            Self::Single => "single",
            Self::Double => "double",
            Self::Triple => "triple",
            Self::Quad => "quad",
        }
    }

    pub fn cell_count(self) -> usize {
        match self {
            Self::Single => 1,
            Self::Double => 2,
            Self::Triple => 3,
            Self::Quad => 4,
        }
    }
}

impl fmt::Display for GalleryLayout {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl FromStr for GalleryLayout {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::ALL
            .into_iter()
            .find(|l| l.name() == s)
            .ok_or_else(|| format!("unknown gallery layout {s:?}"))
    }
}

/// Builds a gallery with `layout.cell_count()` cells indexed from 0; cell `i`
/// holds an image with `srcs[i]` if given. Extra sources are ignored.
pub fn gallery_node(schema: &Schema, layout: GalleryLayout, srcs: &[&str]) -> Result<Node, SchemaError> {
    let cells = (0..layout.cell_count())
        .map(|index| {
            let content = match srcs.get(index) {
                Some(src) => vec![schema.node(NodeType::Image, attrs([("src", *src)]), Vec::new())?],
                None => Vec::new(),
            };
            schema.node(NodeType::GalleryCell, attrs([("index", index as i64)]), content)
        })
        .collect::<Result<Vec<_>, _>>()?;
    schema.node(NodeType::Gallery, attrs([("layout", layout.name())]), cells)
}

/// The `gallery` and `galleryCell` node types.
#[derive(Debug, Clone, Copy, Default)]
pub struct Gallery;

impl Extension for Gallery {
    fn name(&self) -> &'static str {
        "gallery"
    }

    fn extend_schema(&self, schema: &mut SchemaBuilder) {
        schema
            .node(
                NodeSpec::new(NodeType::Gallery, |_, attrs| {
                    let fixed = html_attrs([("data-type", "gallery"), ("class", "gallery-container")]);
                    DomSpec::element("div", merge_attributes(attrs, fixed)).hole()
                })
                .group(NodeGroup::Block)
                .content("galleryCell+")
                .parse_html(r#"div[data-type="gallery"]"#)
                .attr(
                    AttrSpec::new("layout", GalleryLayout::Single.name())
                        .rendered_with(|v| data_attr("data-layout", v))
                        .parsed_from("data-layout"),
                ),
            )
            .node(
                NodeSpec::new(NodeType::GalleryCell, |_, attrs| {
                    let fixed = html_attrs([("data-type", "gallery-cell"), ("class", "gallery-cell")]);
                    DomSpec::element("div", merge_attributes(attrs, fixed)).hole()
                })
                .group(NodeGroup::Block)
                .content("image?")
                .parse_html(r#"div[data-type="gallery-cell"]"#)
                .attr(
                    AttrSpec::new("index", 0_i64)
                        .rendered_with(|v| data_attr("data-index", v))
                        .parsed_from("data-index"),
                ),
            );
    }
}

fn data_attr(name: &str, value: &AttrValue) -> Vec<(String, String)> {
    if value.is_null() {
        Vec::new()
    } else {
        vec![(name.to_string(), value.to_string())]
    }
}

/// Gallery commands on [`Editor`].
pub trait GalleryCommands {
    /// Inserts an empty gallery at the selection. Returns its position.
    fn add_gallery(&mut self, layout: GalleryLayout) -> Result<usize, CommandError>;

    /// Puts an image into the cell with `index` of the gallery starting at
    /// `gallery_pos`, replacing any image already there.
    fn add_image_to_gallery(&mut self, gallery_pos: usize, src: &str, index: i64) -> Result<(), CommandError>;
}

impl GalleryCommands for Editor {
    fn add_gallery(&mut self, layout: GalleryLayout) -> Result<usize, CommandError> {
        let gallery = gallery_node(self.schema(), layout, &[])?;
        self.insert_content(gallery)
    }

    fn add_image_to_gallery(&mut self, gallery_pos: usize, src: &str, index: i64) -> Result<(), CommandError> {
        let doc = self.doc();
        let gallery = doc
            .path_to(gallery_pos)
            .and_then(|path| doc.node_at_path(&path))
            .ok_or(CommandError::NoNodeAt { pos: gallery_pos })?;
        if gallery.node_type() != NodeType::Gallery {
            return Err(CommandError::UnexpectedNode {
                pos: gallery_pos,
                expected: NodeType::Gallery,
                found: gallery.node_type(),
            });
        }

        let mut cell_pos = gallery_pos + 1;
        let mut target = None;
        for cell in gallery.content() {
            if cell.attr("index").and_then(AttrValue::as_i64) == Some(index) {
                target = Some((cell_pos + 1, cell_pos + 1 + cell.content_size()));
                break;
            }
            cell_pos += cell.node_size();
        }
        let (from, to) = target.ok_or(CommandError::MissingCell {
            pos: gallery_pos,
            index,
        })?;

        let image = self
            .schema()
            .node(NodeType::Image, attrs([("src", src)]), Vec::new())?;
        self.replace_range_with(from, to, image)
    }
}
