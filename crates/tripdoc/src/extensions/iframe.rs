//! Embedded iframes (YouTube, TikTok and other players).

use serde::Deserialize;

use crate::editor::Editor;
use crate::error::CommandError;
use crate::extensions::Extension;
use crate::model::{attrs, AttrValue, NodeGroup, NodeType};
use crate::schema::{merge_attributes, set_attribute, AttrSpec, DomSpec, HtmlAttrs, NodeSpec, SchemaBuilder};

const WRAPPER_CLASS: &str = "flex flex-wrap justify-center gap-4 my-4 ";
const YOUTUBE_CLASS: &str = "w-full max-w-[560px] aspect-video";
const TIKTOK_CLASS: &str = "max-w-[280px] aspect-[9/16]";
const FRAME_CLASS: &str = "w-full h-full rounded-lg";

/// Options of the [`Iframe`] extension.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(default)]
pub struct IframeOptions {
    /// Default of the `allowfullscreen` attribute.
    pub allow_fullscreen: bool,
    /// Extra attributes on the rendered `iframe` element. Its `class` is
    /// always replaced by the frame class.
    pub html_attributes: HtmlAttrs,
}

impl Default for IframeOptions {
    fn default() -> Self {
        Self {
            allow_fullscreen: true,
            html_attributes: vec![("class".to_string(), "w-full aspect-video rounded-lg my-4".to_string())],
        }
    }
}

/// The `iframe` node type.
#[derive(Debug, Clone, Default)]
pub struct Iframe {
    pub options: IframeOptions,
}

impl Iframe {
    pub fn new(options: IframeOptions) -> Self {
        Self { options }
    }
}

/// Wrapper class for an embed URL: 16:9 for YouTube, 9:16 for TikTok.
pub fn wrapper_class(src: &str) -> String {
    let mut class = WRAPPER_CLASS.to_string();
    if src.contains("youtube.com") {
        class.push_str(YOUTUBE_CLASS);
    } else if src.contains("tiktok.com") {
        class.push_str(TIKTOK_CLASS);
    }
    class
}

impl Extension for Iframe {
    fn name(&self) -> &'static str {
        "iframe"
    }

    fn extend_schema(&self, schema: &mut SchemaBuilder) {
        let extra = self.options.html_attributes.clone();
        let allow_fullscreen = self.options.allow_fullscreen;
        schema.node(
            NodeSpec::new(NodeType::Iframe, move |node, attrs| {
                let src = node.attr("src").and_then(AttrValue::as_str).unwrap_or_default();
                let mut frame = merge_attributes(extra.clone(), attrs);
                set_attribute(&mut frame, "class", FRAME_CLASS);
                DomSpec::element("div", vec![("class".to_string(), wrapper_class(src))])
                    .child(DomSpec::element("iframe", frame))
            })
            .group(NodeGroup::Block)
            .atom()
            .parse_html("iframe")
            .attr(AttrSpec::new("src", AttrValue::Null))
            .attr(AttrSpec::new("frameborder", 0_i64))
            .attr(
                AttrSpec::new("allowfullscreen", self.options.allow_fullscreen).rendered_with(|v| {
                    if v.is_truthy() {
                        vec![("allowfullscreen".to_string(), "true".to_string())]
                    } else {
                        Vec::new()
                    }
                })
                .parsed_with(move |_| Some(allow_fullscreen.into())),
            ),
        );
    }
}

/// Iframe commands on [`Editor`].
pub trait IframeCommands {
    /// Replaces the selection with an iframe showing `src`. Returns the
    /// position of the new node.
    fn set_iframe(&mut self, src: &str) -> Result<usize, CommandError>;
}

impl IframeCommands for Editor {
    fn set_iframe(&mut self, src: &str) -> Result<usize, CommandError> {
        let node = self
            .schema()
            .node(NodeType::Iframe, attrs([("src", src)]), Vec::new())?;
        self.replace_selection_with(node)
    }
}
