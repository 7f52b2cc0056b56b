//! DOM output specs: how a node or mark is rendered to HTML.

/// HTML attributes in output order.
pub type HtmlAttrs = Vec<(String, String)>;

/// A rendered DOM structure. [`DomSpec::Hole`] marks where the node's
/// content (or, for marks, the marked text) goes.
#[derive(Debug, Clone, PartialEq)]
pub enum DomSpec {
    Element {
        tag: String,
        attrs: HtmlAttrs,
        children: Vec<DomSpec>,
    },
    Text(String),
    Hole,
}

impl DomSpec {
    pub fn element(tag: impl Into<String>, attrs: HtmlAttrs) -> Self {
        DomSpec::Element {
            tag: tag.into(),
            attrs,
            children: Vec::new(),
        }
    }

    /// Appends a child. No-op on text and holes.
    pub fn child(mut self, child: DomSpec) -> Self {
        if let DomSpec::Element { children, .. } = &mut self {
            children.push(child);
        }
        self
    }

    /// Appends a content hole.
    pub fn hole(self) -> Self {
        self.child(DomSpec::Hole)
    }
}

/// Merges `extra` into `base`: `class` values are joined with a space, `style`
/// values with `"; "`, anything else is overwritten.
pub fn merge_attributes(mut base: HtmlAttrs, extra: HtmlAttrs) -> HtmlAttrs {
    for (name, value) in extra {
        let Some(index) = base.iter().position(|(n, _)| *n == name) else {
            base.push((name, value));
            continue;
        };
        let existing = &mut base[index].1;
        let separator = match name.as_str() {
            "class" => Some(" "),
            "style" => Some("; "),
            _ => None,
        };
        match separator {
            Some(sep) if !existing.is_empty() => {
                existing.push_str(sep);
                existing.push_str(&value);
            }
            _ => *existing = value,
        }
    }
    base
}

/// Sets one attribute, replacing any existing value.
pub fn set_attribute(attrs: &mut HtmlAttrs, name: &str, value: impl Into<String>) {
    let value = value.into();
    match attrs.iter().position(|(n, _)| n == name) {
        Some(index) => attrs[index].1 = value,
        None => attrs.push((name.to_string(), value)),
    }
}

/// Shorthand for building attribute lists from string pairs.
pub fn html_attrs<const N: usize>(pairs: [(&str, &str); N]) -> HtmlAttrs {
    pairs
        .into_iter()
        .map(|(k, v)| (k.to_string(), v.to_string()))
        .collect()
}
