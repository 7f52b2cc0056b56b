//! Document serialization.
//!
//! Documents are exchanged as ProseMirror JSON, the format the browser editor
//! saves and loads.

pub mod json;

pub use json::{decode_doc, decode_node, encode_doc, encode_doc_pretty, encode_value, JsonMark, JsonNode};
