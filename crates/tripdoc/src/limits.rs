//! Limits applied when decoding untrusted documents and dispatching edits.

/// Maximum node nesting depth accepted by the JSON decoder.
pub const MAX_DEPTH: usize = 48;

/// Maximum number of nodes in a decoded document.
pub const MAX_NODES: usize = 500_000;

/// Maximum length of a single text node, in bytes.
pub const MAX_TEXT_LEN: usize = 1 << 20;

/// Default bound on nested dispatches (observers dispatching from inside a
/// notification).
pub const MAX_DISPATCH_DEPTH: usize = 32;

/// Maximum grouping passes per notification. A pass restarts when another
/// observer changes the document while its writes are being dispatched.
pub const MAX_GROUPING_PASSES: usize = 8;
