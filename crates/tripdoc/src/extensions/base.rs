//! Core nodes and marks: document, paragraphs, headings, lists, text, hard
//! breaks and images.

use crate::extensions::Extension;
use crate::model::{AttrValue, MarkType, NodeGroup, NodeType};
use crate::schema::{AttrSpec, DomSpec, MarkSpec, NodeSpec, ParseRule, SchemaBuilder};

/// Default `target` of links.
pub const LINK_TARGET: &str = "_blank";

/// Default `rel` of links.
pub const LINK_REL: &str = "noopener noreferrer nofollow";

/// The base schema every itinerary document needs.
#[derive(Debug, Clone, Copy, Default)]
pub struct Core;

impl Extension for Core {
    fn name(&self) -> &'static str {
        "core"
    }

    fn extend_schema(&self, schema: &mut SchemaBuilder) {
        let heading = (1..=6_i64).fold(
            NodeSpec::new(NodeType::Heading, |node, attrs| {
                let level = node
                    .attr("level")
                    .and_then(AttrValue::as_i64)
                    .unwrap_or(1)
                    .clamp(1, 6);
                DomSpec::element(format!("h{level}"), attrs).hole()
            })
            .group(NodeGroup::Block)
            .content("inline*")
            .attr(AttrSpec::new("level", 1_i64).rendered_with(|_| Vec::new())),
            |spec, level| spec.parse_html(ParseRule::new(format!("h{level}")).with_attr("level", level)),
        );

        schema
            .node(NodeSpec::new(NodeType::Doc, |_, _| DomSpec::Hole).content("block+"))
            .node(
                NodeSpec::new(NodeType::Paragraph, |_, attrs| DomSpec::element("p", attrs).hole())
                    .group(NodeGroup::Block)
                    .content("inline*")
                    .parse_html("p"),
            )
            .node(heading)
            .node(
                NodeSpec::new(NodeType::BulletList, |_, attrs| DomSpec::element("ul", attrs).hole())
                    .group(NodeGroup::Block)
                    .content("listItem+")
                    .parse_html("ul"),
            )
            .node(
                NodeSpec::new(NodeType::OrderedList, |_, attrs| DomSpec::element("ol", attrs).hole())
                    .group(NodeGroup::Block)
                    .content("listItem+")
                    .parse_html("ol"),
            )
            .node(
                NodeSpec::new(NodeType::ListItem, |_, attrs| DomSpec::element("li", attrs).hole())
                    .content("paragraph block*")
                    .parse_html("li"),
            )
            .node(NodeSpec::new(NodeType::Text, |_, _| DomSpec::Hole).group(NodeGroup::Inline))
            .node(
                NodeSpec::new(NodeType::HardBreak, |_, attrs| DomSpec::element("br", attrs))
                    .group(NodeGroup::Inline)
                    .parse_html("br"),
            )
            .node(
                NodeSpec::new(NodeType::Image, |_, attrs| DomSpec::element("img", attrs))
                    .group(NodeGroup::Block)
                    .draggable()
                    .parse_html("img[src]")
                    .attr(AttrSpec::new("src", AttrValue::Null))
                    .attr(AttrSpec::new("alt", AttrValue::Null))
                    .attr(AttrSpec::new("title", AttrValue::Null)),
            );

        schema
            .mark(
                MarkSpec::new(MarkType::Bold, |_, attrs| DomSpec::element("strong", attrs).hole())
                    .parse_html("strong")
                    .parse_html("b"),
            )
            .mark(
                MarkSpec::new(MarkType::Italic, |_, attrs| DomSpec::element("em", attrs).hole())
                    .parse_html("em")
                    .parse_html("i"),
            )
            .mark(
                MarkSpec::new(MarkType::Link, |_, attrs| DomSpec::element("a", attrs).hole())
                    .parse_html("a[href]")
                    .attr(AttrSpec::new("href", AttrValue::Null))
                    .attr(AttrSpec::new("target", LINK_TARGET))
                    .attr(AttrSpec::new("rel", LINK_REL)),
            );
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::{attrs, Attrs};
    use crate::schema::Schema;

    #[test]
    fn test_core_schema() {
        let schema = Schema::builder().with(&Core).build().unwrap();
        assert!(schema.contains(NodeType::Image));
        assert!(schema.spec(NodeType::Image).unwrap().draggable);
        assert_eq!(schema.group_of(NodeType::Text), Some(NodeGroup::Inline));
        assert_eq!(schema.group_of(NodeType::ListItem), None);
    }

    #[test]
    fn test_heading_level_is_not_rendered() {
        let schema = Schema::builder().with(&Core).build().unwrap();
        let text = schema.text("Day 2", vec![]).unwrap();
        let heading = schema
            .node(NodeType::Heading, attrs([("level", 9_i64)]), vec![text])
            .unwrap();
        assert!(schema.render_attrs(&heading).is_empty());

        let spec = schema.spec(NodeType::Heading).unwrap();
        match (spec.to_dom)(&heading, Vec::new()) {
            DomSpec::Element { tag, .. } => assert_eq!(tag, "h6"),
            other => panic!("unexpected {other:?}"),
        }
    }

    #[test]
    fn test_link_defaults() {
        let schema = Schema::builder().with(&Core).build().unwrap();
        let link = schema
            .mark(MarkType::Link, attrs([("href", "https://example.com")]))
            .unwrap();
        assert_eq!(
            schema.render_mark_attrs(&link),
            vec![
                ("href".to_string(), "https://example.com".to_string()),
                ("target".to_string(), LINK_TARGET.to_string()),
                ("rel".to_string(), LINK_REL.to_string()),
            ]
        );
        assert!(schema.mark(MarkType::Bold, Attrs::new()).unwrap().attrs.is_empty());
    }
}
