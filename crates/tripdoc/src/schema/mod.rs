//! Schema: node and mark specs, attribute defaults and content rules.
//!
//! A schema is assembled from [`Extension`]s. Each extension contributes node
//! specs, mark specs and global attributes (attributes added to node types
//! declared elsewhere, such as the image `group` attribute). Nodes are then
//! constructed through the schema, which fills default attributes, drops
//! undeclared ones and checks content expressions.
//!
//! Specs also carry [`ParseRule`]s: CSS selectors telling the HTML parser
//! which elements produce which node or mark.

pub mod content;
pub mod dom;

use std::fmt;
use std::sync::Arc;

use lazy_static::lazy_static;
use rustc_hash::FxHashMap;
use scraper::node::Element;

use crate::error::SchemaError;
use crate::extensions::{Core, Extension, Gallery, ImageGroup, Iframe, PhotoGallery};
use crate::model::{AttrValue, Attrs, Mark, MarkType, Node, NodeGroup, NodeType};

pub use content::{ContentExpr, ContentTerm, NodeMatch, Repeat};
pub use dom::{html_attrs, merge_attributes, set_attribute, DomSpec, HtmlAttrs};

/// Renders a node, given its already-rendered attributes.
pub type ToDom = Arc<dyn Fn(&Node, HtmlAttrs) -> DomSpec + Send + Sync>;

/// Renders a mark around a hole, given its already-rendered attributes.
pub type MarkToDom = Arc<dyn Fn(&Mark, HtmlAttrs) -> DomSpec + Send + Sync>;

/// Renders one attribute value to HTML attributes.
pub type RenderAttr = Arc<dyn Fn(&AttrValue) -> HtmlAttrs + Send + Sync>;

/// Reads one attribute value from a parsed HTML element. `None` leaves the
/// default in place.
pub type ParseAttr = Arc<dyn Fn(&Element) -> Option<AttrValue> + Send + Sync>;

/// Matches HTML elements to a node or mark type.
#[derive(Debug, Clone, PartialEq)]
pub struct ParseRule {
    /// CSS selector, for example `div[data-type="gallery"]`.
    pub selector: String,
    /// Attributes set by the rule itself. They win over parsed values.
    pub attrs: Attrs,
}

impl ParseRule {
    pub fn new(selector: impl Into<String>) -> Self {
        Self {
            selector: selector.into(),
            attrs: Attrs::new(),
        }
    }

    pub fn with_attr(mut self, name: impl Into<String>, value: impl Into<AttrValue>) -> Self {
        self.attrs.insert(name.into(), value.into());
        self
    }
}

impl From<&str> for ParseRule {
    fn from(selector: &str) -> Self {
        Self::new(selector)
    }
}

/// A declared attribute with its default value.
#[derive(Clone)]
pub struct AttrSpec {
    pub name: String,
    pub default: AttrValue,
    /// Custom renderer. Without one, the attribute renders as `name="value"`
    /// and is omitted when null.
    pub render: Option<RenderAttr>,
    /// Custom parser. Without one, the value is read from the HTML attribute
    /// of the same name.
    pub parse: Option<ParseAttr>,
}

impl AttrSpec {
    pub fn new(name: impl Into<String>, default: impl Into<AttrValue>) -> Self {
        Self {
            name: name.into(),
            default: default.into(),
            render: None,
            parse: None,
        }
    }

    /// Sets a custom renderer.
    pub fn rendered_with<F>(mut self, render: F) -> Self
    where
        F: Fn(&AttrValue) -> HtmlAttrs + Send + Sync + 'static,
    {
        self.render = Some(Arc::new(render));
        self
    }

    /// Sets a custom parser.
    pub fn parsed_with<F>(mut self, parse: F) -> Self
    where
        F: Fn(&Element) -> Option<AttrValue> + Send + Sync + 'static,
    {
        self.parse = Some(Arc::new(parse));
        self
    }

    /// Reads the value from the HTML attribute `html_name` instead.
    pub fn parsed_from(self, html_name: impl Into<String>) -> Self {
        let html_name = html_name.into();
        let default = self.default.clone();
        self.parsed_with(move |element| {
            element
                .attr(&html_name)
                .map(|raw| AttrValue::from_html(raw, &default))
        })
    }

    /// Parses this attribute from an element.
    pub fn parse(&self, element: &Element) -> Option<AttrValue> {
        match &self.parse {
            Some(parse) => parse(element),
            None => element
                .attr(&self.name)
                .map(|raw| AttrValue::from_html(raw, &self.default)),
        }
    }

    /// Renders a value of this attribute.
    pub fn render(&self, value: &AttrValue) -> HtmlAttrs {
        match &self.render {
            Some(render) => render(value),
            None if value.is_null() => HtmlAttrs::new(),
            None => vec![(self.name.clone(), value.to_string())],
        }
    }
}

impl fmt::Debug for AttrSpec {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("AttrSpec")
            .field("name", &self.name)
            .field("default", &self.default)
            .field("custom_render", &self.render.is_some())
            .field("custom_parse", &self.parse.is_some())
            .finish()
    }
}

/// Declaration of a node type.
#[derive(Clone)]
pub struct NodeSpec {
    pub node_type: NodeType,
    pub group: Option<NodeGroup>,
    /// Content expression source, see [`ContentExpr`].
    pub content: String,
    /// Atom nodes are edited as a single unit.
    pub atom: bool,
    pub draggable: bool,
    pub attrs: Vec<AttrSpec>,
    pub to_dom: ToDom,
    pub parse_rules: Vec<ParseRule>,
}

impl NodeSpec {
    pub fn new<F>(node_type: NodeType, to_dom: F) -> Self
    where
        F: Fn(&Node, HtmlAttrs) -> DomSpec + Send + Sync + 'static,
    {
        Self {
            node_type,
            group: None,
            content: String::new(),
            atom: false,
            draggable: false,
            attrs: Vec::new(),
            to_dom: Arc::new(to_dom),
            parse_rules: Vec::new(),
        }
    }

    /// Adds an HTML parse rule.
    pub fn parse_html(mut self, rule: impl Into<ParseRule>) -> Self {
        self.parse_rules.push(rule.into());
        self
    }

    pub fn group(mut self, group: NodeGroup) -> Self {
        self.group = Some(group);
        self
    }

    pub fn content(mut self, expr: impl Into<String>) -> Self {
        self.content = expr.into();
        self
    }

    pub fn atom(mut self) -> Self {
        self.atom = true;
        self
    }

    pub fn draggable(mut self) -> Self {
        self.draggable = true;
        self
    }

    pub fn attr(mut self, attr: AttrSpec) -> Self {
        self.attrs.push(attr);
        self
    }

    pub fn attr_spec(&self, name: &str) -> Option<&AttrSpec> {
        self.attrs.iter().find(|a| a.name == name)
    }
}

impl fmt::Debug for NodeSpec {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("NodeSpec")
            .field("node_type", &self.node_type)
            .field("group", &self.group)
            .field("content", &self.content)
            .field("atom", &self.atom)
            .field("draggable", &self.draggable)
            .field("attrs", &self.attrs)
            .field("parse_rules", &self.parse_rules)
            .finish_non_exhaustive()
    }
}

/// Declaration of a mark type.
#[derive(Clone)]
pub struct MarkSpec {
    pub mark_type: MarkType,
    pub attrs: Vec<AttrSpec>,
    pub to_dom: MarkToDom,
    pub parse_rules: Vec<ParseRule>,
}

impl MarkSpec {
    pub fn new<F>(mark_type: MarkType, to_dom: F) -> Self
    where
        F: Fn(&Mark, HtmlAttrs) -> DomSpec + Send + Sync + 'static,
    {
        Self {
            mark_type,
            attrs: Vec::new(),
            to_dom: Arc::new(to_dom),
            parse_rules: Vec::new(),
        }
    }

    pub fn attr(mut self, attr: AttrSpec) -> Self {
        self.attrs.push(attr);
        self
    }

    pub fn parse_html(mut self, rule: impl Into<ParseRule>) -> Self {
        self.parse_rules.push(rule.into());
        self
    }
}

impl fmt::Debug for MarkSpec {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("MarkSpec")
            .field("mark_type", &self.mark_type)
            .field("attrs", &self.attrs)
            .field("parse_rules", &self.parse_rules)
            .finish_non_exhaustive()
    }
}

/// An attribute an extension adds to node types it does not declare.
#[derive(Debug, Clone)]
pub struct GlobalAttribute {
    pub types: Vec<NodeType>,
    pub attr: AttrSpec,
}

#[derive(Debug, Clone)]
struct NodeEntry {
    spec: NodeSpec,
    content: ContentExpr,
}

/// A compiled schema.
#[derive(Debug, Clone)]
pub struct Schema {
    nodes: FxHashMap<NodeType, NodeEntry>,
    marks: FxHashMap<MarkType, MarkSpec>,
}

lazy_static! {
    static ref ITINERARY_SCHEMA: Arc<Schema> = Arc::new(
        Schema::itinerary().expect("built-in itinerary schema is well formed")
    );
}

/// Returns the shared itinerary schema with every built-in extension.
pub fn default_schema() -> Arc<Schema> {
    Arc::clone(&ITINERARY_SCHEMA)
}

impl Schema {
    pub fn builder() -> SchemaBuilder {
        SchemaBuilder::default()
    }

    /// Builds the itinerary schema: core nodes and marks, gallery, iframe,
    /// photo gallery and the image `group` attribute, all with default
    /// options.
    pub fn itinerary() -> Result<Schema, SchemaError> {
        Schema::builder()
            .with(&Core)
            .with(&Gallery)
            .with(&Iframe::default())
            .with(&PhotoGallery)
            .with(&ImageGroup::default())
            .build()
    }

    pub fn contains(&self, node_type: NodeType) -> bool {
        self.nodes.contains_key(&node_type)
    }

    pub fn spec(&self, node_type: NodeType) -> Option<&NodeSpec> {
        self.nodes.get(&node_type).map(|e| &e.spec)
    }

    pub fn mark_spec(&self, mark_type: MarkType) -> Option<&MarkSpec> {
        self.marks.get(&mark_type)
    }

    /// Node specs in [`NodeType::ALL`] order.
    pub fn node_specs(&self) -> impl Iterator<Item = &NodeSpec> {
        NodeType::ALL.into_iter().filter_map(|t| self.spec(t))
    }

    /// Mark specs in [`MarkType::ALL`] order.
    pub fn mark_specs(&self) -> impl Iterator<Item = &MarkSpec> {
        MarkType::ALL.into_iter().filter_map(|t| self.mark_spec(t))
    }

    pub fn content_expr(&self, node_type: NodeType) -> Option<&ContentExpr> {
        self.nodes.get(&node_type).map(|e| &e.content)
    }

    pub fn group_of(&self, node_type: NodeType) -> Option<NodeGroup> {
        self.nodes.get(&node_type).and_then(|e| e.spec.group)
    }

    fn entry(&self, node_type: NodeType) -> Result<&NodeEntry, SchemaError> {
        self.nodes
            .get(&node_type)
            .ok_or(SchemaError::MissingNodeType { node_type })
    }

    /// Returns the declaration of attribute `name` on `node_type`.
    pub fn attr_spec(&self, node_type: NodeType, name: &str) -> Result<&AttrSpec, SchemaError> {
        self.entry(node_type)?
            .spec
            .attr_spec(name)
            .ok_or_else(|| SchemaError::UnknownAttribute {
                node_type,
                attr: name.to_string(),
            })
    }

    /// Fills defaults for every declared attribute and drops undeclared ones.
    pub fn compute_attrs(&self, node_type: NodeType, mut given: Attrs) -> Result<Attrs, SchemaError> {
        let entry = self.entry(node_type)?;
        Ok(entry
            .spec
            .attrs
            .iter()
            .map(|a| {
                let value = given.remove(&a.name).unwrap_or_else(|| a.default.clone());
                (a.name.clone(), value)
            })
            .collect())
    }

    /// Checks `children` against the content expression of `node_type`.
    pub fn check_content(&self, node_type: NodeType, children: &[Arc<Node>]) -> Result<(), SchemaError> {
        let entry = self.entry(node_type)?;
        for child in children {
            if !self.contains(child.node_type()) {
                return Err(SchemaError::MissingNodeType {
                    node_type: child.node_type(),
                });
            }
        }
        entry
            .content
            .match_children(children, |t| self.group_of(t))
            .map_err(|index| SchemaError::ContentMismatch {
                node_type,
                expr: entry.content.source().to_string(),
                index,
            })
    }

    /// Creates a non-text node.
    pub fn node(&self, node_type: NodeType, attrs: Attrs, content: Vec<Node>) -> Result<Node, SchemaError> {
        self.node_from_shared(node_type, attrs, content.into_iter().map(Arc::new).collect())
    }

    pub(crate) fn node_from_shared(
        &self,
        node_type: NodeType,
        attrs: Attrs,
        content: Vec<Arc<Node>>,
    ) -> Result<Node, SchemaError> {
        if node_type == NodeType::Text {
            return Err(SchemaError::EmptyText);
        }
        let attrs = self.compute_attrs(node_type, attrs)?;
        self.check_content(node_type, &content)?;
        Ok(Node::from_parts(node_type, attrs, content, None, Vec::new()))
    }

    /// Creates a text node.
    pub fn text(&self, text: impl Into<String>, marks: Vec<Mark>) -> Result<Node, SchemaError> {
        let text = text.into();
        if text.is_empty() {
            return Err(SchemaError::EmptyText);
        }
        self.entry(NodeType::Text)?;
        for mark in &marks {
            if !self.marks.contains_key(&mark.mark_type) {
                return Err(SchemaError::UnknownMarkType {
                    name: mark.mark_type.name().to_string(),
                });
            }
        }
        Ok(Node::from_parts(NodeType::Text, Attrs::new(), Vec::new(), Some(text), marks))
    }

    /// Creates a mark, filling declared defaults.
    pub fn mark(&self, mark_type: MarkType, mut given: Attrs) -> Result<Mark, SchemaError> {
        let spec = self
            .marks
            .get(&mark_type)
            .ok_or_else(|| SchemaError::UnknownMarkType {
                name: mark_type.name().to_string(),
            })?;
        let attrs = spec
            .attrs
            .iter()
            .map(|a| {
                let value = given.remove(&a.name).unwrap_or_else(|| a.default.clone());
                (a.name.clone(), value)
            })
            .collect();
        Ok(Mark { mark_type, attrs })
    }

    /// Renders a node's attributes in declaration order.
    pub fn render_attrs(&self, node: &Node) -> HtmlAttrs {
        let Some(spec) = self.spec(node.node_type()) else {
            return HtmlAttrs::new();
        };
        render_declared(&spec.attrs, node.attrs())
    }

    /// Renders a mark's attributes in declaration order.
    pub fn render_mark_attrs(&self, mark: &Mark) -> HtmlAttrs {
        let Some(spec) = self.mark_spec(mark.mark_type) else {
            return HtmlAttrs::new();
        };
        render_declared(&spec.attrs, &mark.attrs)
    }
}

fn render_declared(specs: &[AttrSpec], values: &Attrs) -> HtmlAttrs {
    specs
        .iter()
        .flat_map(|a| a.render(values.get(&a.name).unwrap_or(&a.default)))
        .collect()
}

/// Collects extension contributions and compiles them into a [`Schema`].
#[derive(Debug, Default)]
pub struct SchemaBuilder {
    nodes: Vec<NodeSpec>,
    marks: Vec<MarkSpec>,
    globals: Vec<GlobalAttribute>,
}

impl SchemaBuilder {
    /// Applies an extension.
    pub fn with(mut self, extension: &dyn Extension) -> Self {
        extension.extend_schema(&mut self);
        self
    }

    /// Adds (or replaces) a node spec.
    pub fn node(&mut self, spec: NodeSpec) -> &mut Self {
        self.nodes.retain(|n| n.node_type != spec.node_type);
        self.nodes.push(spec);
        self
    }

    /// Adds (or replaces) a mark spec.
    pub fn mark(&mut self, spec: MarkSpec) -> &mut Self {
        self.marks.retain(|m| m.mark_type != spec.mark_type);
        self.marks.push(spec);
        self
    }

    pub fn global_attribute(&mut self, attr: GlobalAttribute) -> &mut Self {
        self.globals.push(attr);
        self
    }

    /// Compiles content expressions and attaches global attributes.
    ///
    /// Global attributes for node types the schema lacks are ignored; a global
    /// attribute with the name of a declared one replaces it.
    pub fn build(self) -> Result<Schema, SchemaError> {
        let mut nodes = FxHashMap::default();
        for spec in self.nodes {
            let content = ContentExpr::parse(&spec.content)?;
            if spec.node_type.is_leaf() != content.is_empty() {
                return Err(SchemaError::InvalidContentExpr {
                    expr: spec.content.clone(),
                    reason: "leaf types take no content and other types require some",
                });
            }
            nodes.insert(spec.node_type, NodeEntry { spec, content });
        }

        if !nodes.contains_key(&NodeType::Doc) {
            return Err(SchemaError::MissingNodeType {
                node_type: NodeType::Doc,
            });
        }

        for global in self.globals {
            for node_type in &global.types {
                let Some(entry) = nodes.get_mut(node_type) else {
                    continue;
                };
                let attrs = &mut entry.spec.attrs;
                match attrs.iter().position(|a| a.name == global.attr.name) {
                    Some(index) => attrs[index] = global.attr.clone(),
                    None => attrs.push(global.attr.clone()),
                }
            }
        }

        let marks = self.marks.into_iter().map(|m| (m.mark_type, m)).collect();
        Ok(Schema { nodes, marks })
    }
}
