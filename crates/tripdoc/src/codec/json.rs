//! ProseMirror JSON encoding and decoding.
//!
//! A node is `{"type", "attrs", "content", "text", "marks"}` with every field
//! but `type` optional. Decoding goes through the schema: attribute defaults
//! are filled, undeclared attributes dropped and content expressions checked.

use serde::{Deserialize, Serialize};

use crate::error::{DecodeError, EncodeError, SchemaError};
use crate::limits::{MAX_DEPTH, MAX_NODES, MAX_TEXT_LEN};
use crate::model::{Attrs, Mark, MarkType, Node, NodeType};
use crate::schema::Schema;

/// Wire form of a node.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct JsonNode {
    #[serde(rename = "type")]
    pub node_type: String,
    #[serde(default, skip_serializing_if = "Attrs::is_empty")]
    pub attrs: Attrs,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub content: Vec<JsonNode>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub text: Option<String>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub marks: Vec<JsonMark>,
}

/// Wire form of a mark.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct JsonMark {
    #[serde(rename = "type")]
    pub mark_type: String,
    #[serde(default, skip_serializing_if = "Attrs::is_empty")]
    pub attrs: Attrs,
}

impl From<&Node> for JsonNode {
    fn from(node: &Node) -> Self {
        JsonNode {
            node_type: node.node_type().name().to_string(),
            attrs: node.attrs().clone(),
            content: node.content().iter().map(|c| JsonNode::from(c.as_ref())).collect(),
            text: node.text().map(str::to_owned),
            marks: node.marks().iter().map(JsonMark::from).collect(),
        }
    }
}

impl From<&Mark> for JsonMark {
    fn from(mark: &Mark) -> Self {
        JsonMark {
            mark_type: mark.mark_type.name().to_string(),
            attrs: mark.attrs.clone(),
        }
    }
}

/// Decodes a document; the root must be a `doc` node.
pub fn decode_doc(schema: &Schema, input: &str) -> Result<Node, DecodeError> {
    let json: JsonNode = serde_json::from_str(input)?;
    if json.node_type != NodeType::Doc.name() {
        return Err(DecodeError::NotADocument {
            found: json.node_type,
        });
    }
    Decoder::new(schema).node(json, 0)
}

/// Decodes a node of any type (for clipboard fragments and tests).
pub fn decode_node(schema: &Schema, input: &str) -> Result<Node, DecodeError> {
    let json: JsonNode = serde_json::from_str(input)?;
    Decoder::new(schema).node(json, 0)
}

/// Encodes a node as compact JSON.
pub fn encode_doc(node: &Node) -> Result<String, EncodeError> {
    Ok(serde_json::to_string(&JsonNode::from(node))?)
}

/// Encodes a node as indented JSON.
pub fn encode_doc_pretty(node: &Node) -> Result<String, EncodeError> {
    Ok(serde_json::to_string_pretty(&JsonNode::from(node))?)
}

/// Encodes a node as a JSON value, for embedding in larger payloads.
pub fn encode_value(node: &Node) -> Result<serde_json::Value, EncodeError> {
    Ok(serde_json::to_value(JsonNode::from(node))?)
}

struct Decoder<'a> {
    schema: &'a Schema,
    nodes: usize,
}

impl<'a> Decoder<'a> {
    fn new(schema: &'a Schema) -> Self {
        Self { schema, nodes: 0 }
    }

    fn node(&mut self, json: JsonNode, depth: usize) -> Result<Node, DecodeError> {
        if depth > MAX_DEPTH {
            return Err(DecodeError::TooDeep { max: MAX_DEPTH });
        }
        self.nodes += 1;
        if self.nodes > MAX_NODES {
            return Err(DecodeError::TooManyNodes { max: MAX_NODES });
        }

        let node_type = NodeType::from_name(&json.node_type)
            .ok_or(SchemaError::UnknownNodeType { name: json.node_type })?;

        if node_type == NodeType::Text {
            let text = json.text.ok_or(DecodeError::MissingText)?;
            if text.len() > MAX_TEXT_LEN {
                return Err(DecodeError::TextTooLong {
                    len: text.len(),
                    max: MAX_TEXT_LEN,
                });
            }
            let marks = json
                .marks
                .into_iter()
                .map(|m| self.mark(m))
                .collect::<Result<Vec<_>, _>>()?;
            return Ok(self.schema.text(text, marks)?);
        }

        let content = json
            .content
            .into_iter()
            .map(|child| self.node(child, depth + 1))
            .collect::<Result<Vec<_>, _>>()?;
        Ok(self.schema.node(node_type, json.attrs, content)?)
    }

    fn mark(&self, json: JsonMark) -> Result<Mark, DecodeError> {
        let mark_type = MarkType::from_name(&json.mark_type)
            .ok_or(SchemaError::UnknownMarkType { name: json.mark_type })?;
        Ok(self.schema.mark(mark_type, json.attrs)?)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::extensions::GalleryLayout;
    use crate::model::{AttrValue, DocBuilder};
    use crate::schema::default_schema;

    #[test]
    fn test_roundtrip_itinerary() {
        let schema = default_schema();
        let doc = DocBuilder::new(&schema)
            .heading(1, "Kyoto")
            .paragraph(|p| p.text("See ").link("Fushimi Inari", "https://inari.jp").italic(" early"))
            .image("torii.jpg")
            .gallery(GalleryLayout::Double, &["a.jpg"])
            .iframe("https://www.youtube.com/embed/abc")
            .photo_gallery(&["p.jpg"])
            .build()
            .unwrap();

        let json = encode_doc(&doc).unwrap();
        assert_eq!(decode_doc(&schema, &json).unwrap(), doc);
        let pretty = encode_doc_pretty(&doc).unwrap();
        assert_eq!(decode_doc(&schema, &pretty).unwrap(), doc);
    }

    #[test]
    fn test_decode_browser_output() {
        let schema = default_schema();
        let input = r#"{
            "type": "doc",
            "content": [
                {"type": "image", "attrs": {"src": "a.jpg", "group": "group-1"}},
                {"type": "paragraph", "content": [
                    {"type": "text", "text": "Lunch", "marks": [{"type": "bold"}]}
                ]},
                {"type": "paragraph"}
            ]
        }"#;
        let doc = decode_doc(&schema, input).unwrap();
        assert_eq!(doc.child_count(), 3);
        let image = doc.child(0).unwrap();
        assert_eq!(image.attr("group"), Some(&AttrValue::from("group-1")));
        assert_eq!(image.attr("alt"), Some(&AttrValue::Null));
        assert_eq!(doc.content_size(), 1 + 7 + 2);
    }

    #[test]
    fn test_encode_shape() {
        let schema = default_schema();
        let doc = DocBuilder::new(&schema).image("a.jpg").build().unwrap();
        let value = encode_value(&doc).unwrap();
        assert_eq!(value["type"], "doc");
        assert_eq!(value["content"][0]["attrs"]["src"], "a.jpg");
        assert!(value["content"][0]["attrs"]["group"].is_null());
        assert!(value.get("text").is_none());
    }

    #[test]
    fn test_decode_errors() {
        let schema = default_schema();
        assert!(matches!(decode_doc(&schema, "{"), Err(DecodeError::Json(_))));
        assert_eq!(
            decode_doc(&schema, r#"{"type": "paragraph"}"#),
            Err(DecodeError::NotADocument {
                found: "paragraph".to_string()
            })
        );
        assert_eq!(
            decode_doc(&schema, r#"{"type": "doc", "content": [{"type": "video"}]}"#),
            Err(DecodeError::Schema(SchemaError::UnknownNodeType {
                name: "video".to_string()
            }))
        );
        assert_eq!(
            decode_node(&schema, r#"{"type": "text"}"#),
            Err(DecodeError::MissingText)
        );
        assert!(matches!(
            decode_doc(&schema, r#"{"type": "doc", "content": []}"#),
            Err(DecodeError::Schema(SchemaError::ContentMismatch { .. }))
        ));
        assert!(matches!(
            decode_node(&schema, r#"{"type": "text", "text": "x", "marks": [{"type": "underline"}]}"#),
            Err(DecodeError::Schema(SchemaError::UnknownMarkType { .. }))
        ));
    }

    #[test]
    fn test_depth_limit() {
        let schema = default_schema();
        let mut input = r#"{"type": "paragraph", "content": [{"type": "text", "text": "deep"}]}"#.to_string();
        for _ in 0..=MAX_DEPTH {
            input = format!(r#"{{"type": "listItem", "content": [{input}]}}"#);
        }
        assert_eq!(
            decode_node(&schema, &input),
            Err(DecodeError::TooDeep { max: MAX_DEPTH })
        );
    }
}
