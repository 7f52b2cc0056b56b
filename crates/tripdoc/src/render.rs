//! HTML serialization.
//!
//! Nodes render through their spec's DOM renderer, marks wrap text from the
//! outermost mark inwards, and all text and attribute values are escaped.

use html_escape::{encode_double_quoted_attribute, encode_text};

use crate::error::EncodeError;
use crate::model::Node;
use crate::schema::{DomSpec, Schema};

/// Elements written without a closing tag.
const VOID_ELEMENTS: &[&str] = &["br", "img", "hr", "input", "source"];

/// Renders a node (usually a `doc`) to an HTML string.
pub fn to_html(schema: &Schema, node: &Node) -> Result<String, EncodeError> {
    let mut out = String::new();
    write_node(schema, node, &mut out)?;
    Ok(out)
}

fn write_node(schema: &Schema, node: &Node, out: &mut String) -> Result<(), EncodeError> {
    let spec = schema.spec(node.node_type()).ok_or(EncodeError::MissingSpec {
        node_type: node.node_type(),
    })?;

    if let Some(text) = node.text() {
        return write_marked(schema, node, 0, text, out);
    }

    let dom = (spec.to_dom)(node, schema.render_attrs(node));
    write_dom(&dom, out, &mut |out| {
        for child in node.content() {
            write_node(schema, child, out)?;
        }
        Ok(())
    })
}

fn write_marked(schema: &Schema, node: &Node, index: usize, text: &str, out: &mut String) -> Result<(), EncodeError> {
    let Some(mark) = node.marks().get(index) else {
        out.push_str(&encode_text(text));
        return Ok(());
    };
    let spec = schema.mark_spec(mark.mark_type).ok_or(EncodeError::MissingMarkSpec {
        mark: mark.mark_type.name(),
    })?;
    let dom = (spec.to_dom)(mark, schema.render_mark_attrs(mark));
    write_dom(&dom, out, &mut |out| write_marked(schema, node, index + 1, text, out))
}

type Fill<'a> = dyn FnMut(&mut String) -> Result<(), EncodeError> + 'a;

fn write_dom(dom: &DomSpec, out: &mut String, fill: &mut Fill<'_>) -> Result<(), EncodeError> {
    match dom {
        DomSpec::Hole => fill(out),
        DomSpec::Text(text) => {
            out.push_str(&encode_text(text));
            Ok(())
        }
        DomSpec::Element { tag, attrs, children } => {
            out.push('<');
            out.push_str(tag);
            for (name, value) in attrs {
                out.push(' ');
                out.push_str(name);
                out.push_str("=\"");
                out.push_str(&encode_double_quoted_attribute(value));
                out.push('"');
            }
            out.push('>');
            if VOID_ELEMENTS.contains(&tag.as_str()) {
                return Ok(());
            }
            for child in children {
                write_dom(child, out, fill)?;
            }
            out.push_str("</");
            out.push_str(tag);
            out.push('>');
            Ok(())
        }
    }
}
