//! HTML input.
//!
//! [`from_html`] reads an HTML fragment, such as the output of
//! [`to_html`](crate::render::to_html) or a pasted clipboard, back into a
//! document. Elements are matched against the parse rules of the schema's
//! node specs, then its mark specs, in declaration order. An element matching
//! neither is transparent: its children are read in its place.
//!
//! Whitespace collapses the way a browser renders it. Inline content found
//! where blocks are expected is wrapped in paragraphs, and a block found
//! inside a paragraph or heading splits it.

use std::mem;

use scraper::node::Node as DomNode;
use scraper::{ElementRef, Html, Selector};

use crate::error::{ParseError, SchemaError};
use crate::limits::{MAX_DEPTH, MAX_NODES, MAX_TEXT_LEN};
use crate::model::{Attrs, Mark, MarkType, Node, NodeGroup, NodeType};
use crate::schema::{AttrSpec, ContentExpr, ParseRule, Schema};

/// Elements whose content is never document text.
const IGNORED_ELEMENTS: &[&str] = &["script", "style", "template", "noscript"];

/// Parses an HTML fragment into a `doc` node.
pub fn from_html(schema: &Schema, html: &str) -> Result<Node, ParseError> {
    let fragment = Html::parse_fragment(html);
    let mut parser = Parser::new(schema)?;
    let pieces = parser.children(fragment.root_element(), &[], 0)?;
    parser.container(NodeType::Doc, Attrs::new(), pieces)
}

struct Rule<T> {
    selector: Selector,
    target: T,
    attrs: Attrs,
}

impl<T> Rule<T> {
    fn compile(target: T, rule: &ParseRule) -> Result<Self, ParseError> {
        let selector = Selector::parse(&rule.selector).map_err(|err| ParseError::InvalidSelector {
            selector: rule.selector.clone(),
            reason: err.to_string(),
        })?;
        Ok(Self {
            selector,
            target,
            attrs: rule.attrs.clone(),
        })
    }
}

/// Parsed content before it is checked against a parent.
enum Piece {
    Text(String, Vec<Mark>),
    Node(Node),
}

struct Parser<'s> {
    schema: &'s Schema,
    nodes: Vec<Rule<NodeType>>,
    marks: Vec<Rule<MarkType>>,
    count: usize,
}

impl<'s> Parser<'s> {
    fn new(schema: &'s Schema) -> Result<Self, ParseError> {
        let mut nodes = Vec::new();
        for spec in schema.node_specs() {
            for rule in &spec.parse_rules {
                nodes.push(Rule::compile(spec.node_type, rule)?);
            }
        }
        let mut marks = Vec::new();
        for spec in schema.mark_specs() {
            for rule in &spec.parse_rules {
                marks.push(Rule::compile(spec.mark_type, rule)?);
            }
        }
        Ok(Self {
            schema,
            nodes,
            marks,
            count: 0,
        })
    }

    fn count(&mut self) -> Result<(), ParseError> {
        self.count += 1;
        if self.count > MAX_NODES {
            return Err(ParseError::TooManyNodes { max: MAX_NODES });
        }
        Ok(())
    }

    fn is_inline(&self, node: &Node) -> bool {
        self.schema.group_of(node.node_type()) == Some(NodeGroup::Inline)
    }

    fn children(&mut self, parent: ElementRef<'_>, marks: &[Mark], depth: usize) -> Result<Vec<Piece>, ParseError> {
        if depth > MAX_DEPTH {
            return Err(ParseError::TooDeep { max: MAX_DEPTH });
        }
        let mut pieces = Vec::new();
        for child in parent.children() {
            match child.value() {
                DomNode::Text(text) => {
                    let text = collapse_whitespace(&text.text);
                    if !text.is_empty() {
                        pieces.push(Piece::Text(text, marks.to_vec()));
                    }
                }
                DomNode::Element(_) => {
                    if let Some(element) = ElementRef::wrap(child) {
                        self.element(element, marks, depth + 1, &mut pieces)?;
                    }
                }
                _ => {}
            }
        }
        Ok(pieces)
    }

    fn element(
        &mut self,
        element: ElementRef<'_>,
        marks: &[Mark],
        depth: usize,
        out: &mut Vec<Piece>,
    ) -> Result<(), ParseError> {
        if IGNORED_ELEMENTS.contains(&element.value().name()) {
            return Ok(());
        }

        let node_rule = self
            .nodes
            .iter()
            .find(|r| r.selector.matches(&element))
            .map(|r| (r.target, r.attrs.clone()));
        if let Some((node_type, fixed)) = node_rule {
            let nodes = self.node(element, node_type, fixed, marks, depth)?;
            out.extend(nodes.into_iter().map(Piece::Node));
            return Ok(());
        }

        let mark_rule = self
            .marks
            .iter()
            .find(|r| r.selector.matches(&element))
            .map(|r| (r.target, r.attrs.clone()));
        let pieces = match mark_rule {
            Some((mark_type, fixed)) => {
                let spec = self.schema.mark_spec(mark_type).ok_or_else(|| SchemaError::UnknownMarkType {
                    name: mark_type.name().to_string(),
                })?;
                let mut attrs = parse_attrs(&spec.attrs, element);
                attrs.extend(fixed);
                let mark = self.schema.mark(mark_type, attrs)?;

                let mut inner = marks.to_vec();
                if !inner.iter().any(|m| m.mark_type == mark_type) {
                    inner.push(mark);
                }
                self.children(element, &inner, depth)?
            }
            None => self.children(element, marks, depth)?,
        };
        out.extend(pieces);
        Ok(())
    }

    /// Reads one matched element. A textblock split by blocks yields several
    /// nodes.
    fn node(
        &mut self,
        element: ElementRef<'_>,
        node_type: NodeType,
        fixed: Attrs,
        marks: &[Mark],
        depth: usize,
    ) -> Result<Vec<Node>, ParseError> {
        let schema = self.schema;
        let spec = schema.spec(node_type).ok_or(SchemaError::MissingNodeType { node_type })?;
        let mut attrs = parse_attrs(&spec.attrs, element);
        attrs.extend(fixed);

        if node_type.is_leaf() {
            self.count()?;
            return Ok(vec![schema.node(node_type, attrs, Vec::new())?]);
        }

        let textblock = schema
            .content_expr(node_type)
            .is_some_and(ContentExpr::accepts_inline);
        if textblock {
            let pieces = self.children(element, marks, depth)?;
            self.textblock(node_type, attrs, pieces)
        } else {
            let pieces = self.children(element, &[], depth)?;
            Ok(vec![self.container(node_type, attrs, pieces)?])
        }
    }

    fn textblock(&mut self, node_type: NodeType, attrs: Attrs, pieces: Vec<Piece>) -> Result<Vec<Node>, ParseError> {
        let mut out = Vec::new();
        let mut run = Vec::new();
        for piece in pieces {
            match piece {
                Piece::Node(node) if !self.is_inline(&node) => {
                    let inline = self.inline_nodes(mem::take(&mut run))?;
                    if !inline.is_empty() {
                        self.count()?;
                        out.push(self.schema.node(node_type, attrs.clone(), inline)?);
                    }
                    out.push(node);
                }
                other => run.push(other),
            }
        }
        let inline = self.inline_nodes(run)?;
        if !inline.is_empty() || out.is_empty() {
            self.count()?;
            out.push(self.schema.node(node_type, attrs, inline)?);
        }
        Ok(out)
    }

    fn container(&mut self, node_type: NodeType, attrs: Attrs, pieces: Vec<Piece>) -> Result<Node, ParseError> {
        let mut content = Vec::new();
        let mut run = Vec::new();
        for piece in pieces {
            match piece {
                Piece::Node(node) if !self.is_inline(&node) => {
                    self.wrap_run(mem::take(&mut run), &mut content)?;
                    content.push(node);
                }
                other => run.push(other),
            }
        }
        self.wrap_run(run, &mut content)?;

        let schema = self.schema;
        let needs_content = schema
            .content_expr(node_type)
            .is_some_and(|expr| expr.match_children(&[], |t| schema.group_of(t)).is_err());
        if content.is_empty() && needs_content {
            self.count()?;
            content.push(schema.node(NodeType::Paragraph, Attrs::new(), Vec::new())?);
        }

        self.count()?;
        Ok(schema.node(node_type, attrs, content)?)
    }

    /// Wraps loose inline content in a paragraph. Whitespace-only runs are
    /// dropped.
    fn wrap_run(&mut self, run: Vec<Piece>, content: &mut Vec<Node>) -> Result<(), ParseError> {
        let inline = self.inline_nodes(run)?;
        if inline.is_empty() {
            return Ok(());
        }
        self.count()?;
        content.push(self.schema.node(NodeType::Paragraph, Attrs::new(), inline)?);
        Ok(())
    }

    /// Joins adjacent text with equal marks, trims the run's ends and builds
    /// the nodes.
    fn inline_nodes(&mut self, run: Vec<Piece>) -> Result<Vec<Node>, ParseError> {
        let mut merged: Vec<Piece> = Vec::new();
        for piece in run {
            let (mut text, marks) = match piece {
                Piece::Text(text, marks) => (text, marks),
                node => {
                    merged.push(node);
                    continue;
                }
            };
            if let Some(Piece::Text(prev, prev_marks)) = merged.last_mut() {
                if prev.ends_with(' ') && text.starts_with(' ') {
                    text.remove(0);
                }
                if *prev_marks == marks {
                    prev.push_str(&text);
                    continue;
                }
            }
            if !text.is_empty() {
                merged.push(Piece::Text(text, marks));
            }
        }

        while let Some(Piece::Text(text, _)) = merged.first_mut() {
            let start = text.len() - text.trim_start().len();
            text.drain(..start);
            if !text.is_empty() {
                break;
            }
            merged.remove(0);
        }
        while let Some(Piece::Text(text, _)) = merged.last_mut() {
            text.truncate(text.trim_end().len());
            if !text.is_empty() {
                break;
            }
            merged.pop();
        }

        let mut nodes = Vec::with_capacity(merged.len());
        for piece in merged {
            match piece {
                Piece::Text(text, marks) => {
                    if text.len() > MAX_TEXT_LEN {
                        return Err(ParseError::TextTooLong {
                            len: text.len(),
                            max: MAX_TEXT_LEN,
                        });
                    }
                    self.count()?;
                    nodes.push(self.schema.text(text, marks)?);
                }
                Piece::Node(node) => nodes.push(node),
            }
        }
        Ok(nodes)
    }
}

fn parse_attrs(specs: &[AttrSpec], element: ElementRef<'_>) -> Attrs {
    specs
        .iter()
        .filter_map(|a| a.parse(element.value()).map(|v| (a.name.clone(), v)))
        .collect()
}

/// Collapses runs of HTML whitespace into one space.
fn collapse_whitespace(text: &str) -> String {
    let mut out = String::with_capacity(text.len());
    let mut in_space = false;
    for c in text.chars() {
        if matches!(c, ' ' | '\t' | '\n' | '\r' | '\x0c') {
            if !in_space {
                out.push(' ');
            }
            in_space = true;
        } else {
            out.push(c);
            in_space = false;
        }
    }
    out
}

#[cfg(test)]
mod tests {
    use std::rc::Rc;

    use super::*;
    use crate::editor::Editor;
    use crate::extensions::{Core, GalleryLayout, Iframe, IframeOptions, ImageGroup};
    use crate::model::{attrs, AttrValue, DocBuilder};
    use crate::render::to_html;
    use crate::schema::{default_schema, DomSpec, NodeSpec};

    #[test]
    fn test_rendered_itinerary_reads_back() {
        let schema = default_schema();
        let doc = DocBuilder::new(&schema)
            .heading(2, "Day <1> in Porto")
            .paragraph(|p| {
                p.text("Eat at ")
                    .link("Tasca & Co", "https://t.example/?a=1&b=2")
                    .text(", then ")
                    .hard_break()
                    .bold("walk")
            })
            .image("a.jpg")
            .image_with(attrs([("src", "b.jpg"), ("alt", "Ribeira"), ("group", "group-1")]))
            .gallery(GalleryLayout::Triple, &["g0.jpg", "g1.jpg"])
            .iframe("https://www.youtube.com/embed/abc")
            .photo_gallery(&["p0.jpg", "p1.jpg"])
            .bullet_list(&["Tickets", "Water"])
            .build()
            .unwrap();

        let html = to_html(&schema, &doc).unwrap();
        assert_eq!(from_html(&schema, &html).unwrap(), doc);
    }

    #[test]
    fn test_grouped_html_stays_grouped() {
        let schema = default_schema();
        let doc = DocBuilder::new(&schema)
            .image("a.jpg")
            .image("b.jpg")
            .image("c.jpg")
            .build()
            .unwrap();
        let mut editor = Editor::new(schema.clone(), doc).unwrap();
        editor.add_observer(Rc::new(ImageGroup::default()));
        editor.set_node_attr(0, "alt", "x").unwrap();
        let html = to_html(&schema, &editor.doc()).unwrap();

        let parsed = from_html(&schema, &html).unwrap();
        assert_eq!(&parsed, editor.doc().as_ref());

        let mut reopened = Editor::new(schema, parsed).unwrap();
        let grouper = Rc::new(ImageGroup::default());
        reopened.add_observer(grouper.clone());
        grouper.regroup(&mut reopened);
        assert_eq!(grouper.stats().writes, 0);
        assert_eq!(grouper.stats().skipped_writes, 2);
    }

    #[test]
    fn test_browser_html() {
        let schema = default_schema();
        let html = "<h1>Lisbon</h1>\n\
                    <p>  Day   one <b>tram</b><i>28</i> </p>\n\
                    <div class=\"wrapper\"><img src=\"a.jpg\" data-group=\"g\"><img src=\"b.jpg\"></div>\n\
                    Loose text\n\
                    <ul><li>Tickets</li></ul>\n\
                    <script>alert(1)</script><!-- note -->";
        let expected = DocBuilder::new(&schema)
            .heading(1, "Lisbon")
            .paragraph(|p| p.text("Day one ").bold("tram").italic("28"))
            .image_with(attrs([("src", "a.jpg"), ("group", "g")]))
            .image("b.jpg")
            .paragraph(|p| p.text("Loose text"))
            .bullet_list(&["Tickets"])
            .build()
            .unwrap();
        assert_eq!(from_html(&schema, html).unwrap(), expected);
    }

    #[test]
    fn test_block_splits_paragraph() {
        let schema = default_schema();
        let parsed = from_html(&schema, "<p>Before<img src=\"a.jpg\">After</p>").unwrap();
        let expected = DocBuilder::new(&schema)
            .paragraph(|p| p.text("Before"))
            .image("a.jpg")
            .paragraph(|p| p.text("After"))
            .build()
            .unwrap();
        assert_eq!(parsed, expected);
    }

    #[test]
    fn test_empty_input() {
        let schema = default_schema();
        let doc = from_html(&schema, "  \n ").unwrap();
        assert_eq!(doc.child_count(), 1);
        assert_eq!(doc.child(0).unwrap().node_type(), NodeType::Paragraph);
        assert_eq!(doc.content_size(), 2);
    }

    #[test]
    fn test_allowfullscreen_comes_from_options() {
        let options = IframeOptions {
            allow_fullscreen: false,
            ..IframeOptions::default()
        };
        let schema = Schema::builder()
            .with(&Core)
            .with(&Iframe::new(options))
            .build()
            .unwrap();
        let doc = from_html(&schema, "<iframe src=\"https://v.example\" allowfullscreen=\"true\"></iframe>").unwrap();
        let frame = doc.child(0).unwrap();
        assert_eq!(frame.node_type(), NodeType::Iframe);
        assert_eq!(frame.attr("allowfullscreen"), Some(&AttrValue::Bool(false)));
        assert_eq!(frame.attr("frameborder"), Some(&AttrValue::Int(0)));
    }

    #[test]
    fn test_unknown_extension_elements_are_transparent() {
        // Without the gallery extension, gallery markup only yields its images.
        let schema = Schema::builder().with(&Core).build().unwrap();
        let html = "<div data-type=\"gallery\" data-layout=\"double\">\
                    <div data-type=\"gallery-cell\" data-index=\"0\"><img src=\"a.jpg\"></div></div>";
        let doc = from_html(&schema, html).unwrap();
        assert_eq!(doc.child_count(), 1);
        assert_eq!(doc.child(0).unwrap().node_type(), NodeType::Image);
    }

    #[test]
    fn test_too_deep() {
        let schema = default_schema();
        let html = format!("{}x", "<span>".repeat(MAX_DEPTH + 2));
        assert_eq!(
            from_html(&schema, &html),
            Err(ParseError::TooDeep { max: MAX_DEPTH })
        );
    }

    #[test]
    fn test_invalid_selector() {
        let mut builder = Schema::builder().with(&Core);
        builder.node(
            NodeSpec::new(NodeType::Paragraph, |_, attrs| DomSpec::element("p", attrs).hole())
                .group(NodeGroup::Block)
                .content("inline*")
                .parse_html("p["),
        );
        let schema = builder.build().unwrap();
        assert!(matches!(
            from_html(&schema, "<p>x</p>"),
            Err(ParseError::InvalidSelector { .. })
        ));
    }
}
