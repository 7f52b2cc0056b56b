//! Attribute values stored on nodes and marks.

use std::collections::BTreeMap;
use std::fmt;

use serde::{Deserialize, Serialize};

/// Attribute map of a node or mark, ordered by name.
pub type Attrs = BTreeMap<String, AttrValue>;

/// A JSON-shaped attribute value.
///
/// Serialized untagged, so `{"src": "a.jpg", "group": null}` maps directly.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(untagged)]
pub enum AttrValue {
    #[default]
    Null,
    Bool(bool),
    Int(i64),
    Float(f64),
    Str(String),
    List(Vec<AttrValue>),
}

impl AttrValue {
    pub fn is_null(&self) -> bool {
        matches!(self, AttrValue::Null)
    }

    pub fn as_str(&self) -> Option<&str> {
        match self {
            AttrValue::Str(s) => Some(s),
            _ => None,
        }
    }

    pub fn as_bool(&self) -> Option<bool> {
        match self {
            AttrValue::Bool(b) => Some(*b),
            _ => None,
        }
    }

    pub fn as_i64(&self) -> Option<i64> {
        match self {
            AttrValue::Int(v) => Some(*v),
            _ => None,
        }
    }

    pub fn as_list(&self) -> Option<&[AttrValue]> {
        match self {
            AttrValue::List(items) => Some(items),
            _ => None,
        }
    }

    /// Reads an HTML attribute value, shaped like `default`: integers,
    /// floats and booleans are parsed, lists are read as JSON. Values that do
    /// not parse stay strings.
    pub fn from_html(raw: &str, default: &AttrValue) -> AttrValue {
        let parsed = match default {
            AttrValue::Int(_) => raw.trim().parse().ok().map(AttrValue::Int),
            AttrValue::Float(_) => raw.trim().parse().ok().map(AttrValue::Float),
            AttrValue::Bool(_) => Some(AttrValue::Bool(raw != "false")),
            AttrValue::List(_) => serde_json::from_str(raw).ok(),
            AttrValue::Null | AttrValue::Str(_) => None,
        };
        parsed.unwrap_or_else(|| AttrValue::from(raw))
    }

    /// Truthiness as the rendering layer sees it: null, false, zero and the
    /// empty string are falsy.
    pub fn is_truthy(&self) -> bool {
        match self {
            AttrValue::Null => false,
            AttrValue::Bool(b) => *b,
            AttrValue::Int(v) => *v != 0,
            AttrValue::Float(v) => *v != 0.0 && !v.is_nan(),
            AttrValue::Str(s) => !s.is_empty(),
            AttrValue::List(_) => true,
        }
    }
}

impl fmt::Display for AttrValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            AttrValue::Null => Ok(()),
            AttrValue::Bool(b) => write!(f, "{b}"),
            AttrValue::Int(v) => write!(f, "{v}"),
            AttrValue::Float(v) => write!(f, "{v}"),
            AttrValue::Str(s) => f.write_str(s),
            AttrValue::List(_) => {
                let json = serde_json::to_string(self).map_err(|_| fmt::Error)?;
                f.write_str(&json)
            }
        }
    }
}

impl From<&str> for AttrValue {
    fn from(s: &str) -> Self {
        AttrValue::Str(s.to_string())
    }
}

impl From<String> for AttrValue {
    fn from(s: String) -> Self {
        AttrValue::Str(s)
    }
}

impl From<bool> for AttrValue {
    fn from(b: bool) -> Self {
        AttrValue::Bool(b)
    }
}

impl From<i64> for AttrValue {
    fn from(v: i64) -> Self {
        AttrValue::Int(v)
    }
}

impl From<f64> for AttrValue {
    fn from(v: f64) -> Self {
        AttrValue::Float(v)
    }
}

impl From<Vec<AttrValue>> for AttrValue {
    fn from(items: Vec<AttrValue>) -> Self {
        AttrValue::List(items)
    }
}

impl<T: Into<AttrValue>> From<Option<T>> for AttrValue {
    fn from(v: Option<T>) -> Self {
        v.map_or(AttrValue::Null, Into::into)
    }
}

/// Builds an [`Attrs`] map from `(name, value)` pairs.
pub fn attrs<K, V>(pairs: impl IntoIterator<Item = (K, V)>) -> Attrs
where
    K: Into<String>,
    V: Into<AttrValue>,
{
    pairs
        .into_iter()
        .map(|(k, v)| (k.into(), v.into()))
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_untagged_json() {
        let parsed: Attrs =
            serde_json::from_str(r#"{"src":"a.jpg","group":null,"index":2,"images":["x"]}"#)
                .unwrap();
        assert_eq!(parsed["src"], AttrValue::Str("a.jpg".into()));
        assert_eq!(parsed["group"], AttrValue::Null);
        assert_eq!(parsed["index"], AttrValue::Int(2));
        assert_eq!(
            parsed["images"],
            AttrValue::List(vec![AttrValue::Str("x".into())])
        );

        let json = serde_json::to_string(&parsed).unwrap();
        assert_eq!(json, r#"{"group":null,"images":["x"],"index":2,"src":"a.jpg"}"#);
    }

    #[test]
    fn test_truthiness() {
        assert!(!AttrValue::Null.is_truthy());
        assert!(!AttrValue::from("").is_truthy());
        assert!(AttrValue::from("group-1").is_truthy());
        assert!(!AttrValue::Int(0).is_truthy());
    }

    #[test]
    fn test_display() {
        assert_eq!(AttrValue::from("x").to_string(), "x");
        assert_eq!(AttrValue::Int(0).to_string(), "0");
        assert_eq!(
            AttrValue::List(vec!["a".into(), "b".into()]).to_string(),
            r#"["a","b"]"#
        );
    }

    #[test]
    fn test_from_html_follows_default_shape() {
        let int = AttrValue::Int(0);
        assert_eq!(AttrValue::from_html("3", &int), AttrValue::Int(3));
        assert_eq!(AttrValue::from_html("wide", &int), AttrValue::from("wide"));
        assert_eq!(AttrValue::from_html("false", &AttrValue::Bool(true)), AttrValue::Bool(false));
        assert_eq!(AttrValue::from_html("", &AttrValue::Bool(false)), AttrValue::Bool(true));
        assert_eq!(
            AttrValue::from_html(r#"["a.jpg"]"#, &AttrValue::List(vec![])),
            AttrValue::List(vec!["a.jpg".into()])
        );
        // Strings are never coerced.
        assert_eq!(AttrValue::from_html("2024", &AttrValue::Null), AttrValue::from("2024"));
    }
}
