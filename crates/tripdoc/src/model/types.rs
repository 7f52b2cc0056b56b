//! Node and mark type tags.

use std::fmt;

/// Every node type an itinerary document can contain.
///
/// The JSON and schema names follow the editor's camelCase convention
/// (`galleryCell`, `photoGallery`, ...).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum NodeType {
    Doc,
    Paragraph,
    Heading,
    BulletList,
    OrderedList,
    ListItem,
    Text,
    HardBreak,
    Image,
    Gallery,
    GalleryCell,
    Iframe,
    PhotoGallery,
}

impl NodeType {
    pub const ALL: [NodeType; 13] = [
        NodeType::Doc,
        NodeType::Paragraph,
        NodeType::Heading,
        NodeType::BulletList,
        NodeType::OrderedList,
        NodeType::ListItem,
        NodeType::Text,
        NodeType::HardBreak,
        NodeType::Image,
        NodeType::Gallery,
        NodeType::GalleryCell,
        NodeType::Iframe,
        NodeType::PhotoGallery,
    ];

    /// Returns the schema/JSON name.
    pub fn name(self) -> &'static str {
        match self {
            NodeType::Doc => "doc",
            NodeType::Paragraph => "paragraph",
            NodeType::Heading => "heading",
            NodeType::BulletList => "bulletList",
            NodeType::OrderedList => "orderedList",
            NodeType::ListItem => "listItem",
            NodeType::Text => "text",
            NodeType::HardBreak => "hardBreak",
            NodeType::Image => "image",
            NodeType::Gallery => "gallery",
            NodeType::GalleryCell => "galleryCell",
            NodeType::Iframe => "iframe",
            NodeType::PhotoGallery => "photoGallery",
        }
    }

    /// Looks up a node type by its schema/JSON name.
    pub fn from_name(name: &str) -> Option<NodeType> {
        NodeType::ALL.into_iter().find(|t| t.name() == name)
    }

    /// Leaf types never hold content. Text is a leaf whose size is its length.
    pub fn is_leaf(self) -> bool {
        matches!(
            self,
            NodeType::Text
                | NodeType::HardBreak
                | NodeType::Image
                | NodeType::Iframe
                | NodeType::PhotoGallery
        )
    }
}

impl fmt::Display for NodeType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// Content groups referenced by content expressions.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum NodeGroup {
    Block,
    Inline,
}

impl NodeGroup {
    pub fn name(self) -> &'static str {
        match self {
            NodeGroup::Block => "block",
            NodeGroup::Inline => "inline",
        }
    }

    pub fn from_name(name: &str) -> Option<NodeGroup> {
        match name {
            "block" => Some(NodeGroup::Block),
            "inline" => Some(NodeGroup::Inline),
            _ => None,
        }
    }
}

/// Inline formatting applied to text nodes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum MarkType {
    Bold,
    Italic,
    Link,
}

impl MarkType {
    pub const ALL: [MarkType; 3] = [MarkType::Bold, MarkType::Italic, MarkType::Link];

    pub fn name(self) -> &'static str {
        match self {
            MarkType::Bold => "bold",
            MarkType::Italic => "italic",
            MarkType::Link => "link",
        }
    }

    pub fn from_name(name: &str) -> Option<MarkType> {
        match name {
            "bold" => Some(MarkType::Bold),
            "italic" => Some(MarkType::Italic),
            "link" => Some(MarkType::Link),
            _ => None,
        }
    }
}
