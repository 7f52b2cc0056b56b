//! Image adjacency grouping.
//!
//! [`ImageGroup`] keeps a derived `group` attribute on images: whenever two
//! images sit next to each other in document order (the later one starts
//! exactly where the earlier one ends) they are given a shared group
//! identifier, so the rendering layer can lay a run of images out together.
//!
//! The grouper is an editor observer. On every content change it scans the
//! new document once, in document order, looking only at images:
//!
//! - the first adjacent pair of a run fixes the run's identifier, reusing the
//!   one already on the pair's later image when no earlier run claimed it and
//!   minting a fresh one otherwise;
//! - every adjacent pair writes the identifier to its later image (and, with
//!   [`ImageGroupOptions::tag_run_head`], the run's first image too);
//! - a non-adjacent image ends the run.
//!
//! Writes go through [`Editor::set_node_attr`] one at a time and produce
//! their own notifications, which the [`ScanGuard`] suppresses. Writes whose
//! value is already in place are skipped, so a grouped document stays put.
//! A rejected write is logged and counted, and the scan moves on.
//!
//! The scan always reads the editor's live document. A notification whose
//! version is older than the editor's is skipped: the newer change was
//! announced from inside the same dispatch and already grouped. If another
//! observer changes the document while the grouper's writes are being
//! dispatched, the pass is abandoned and restarted on the new document.

use std::cell::Cell;
use std::fmt;

use rustc_hash::FxHashSet;
use serde::Deserialize;
use tracing::{debug, warn};
use uuid::Uuid;

use crate::editor::{ChangeEvent, DocumentObserver, Editor};
use crate::extensions::Extension;
use crate::limits::MAX_GROUPING_PASSES;
use crate::model::{AttrValue, NodeType};
use crate::schema::{AttrSpec, GlobalAttribute, SchemaBuilder};

/// Options of the [`ImageGroup`] extension.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(default)]
pub struct ImageGroupOptions {
    /// Image attribute holding the group identifier.
    pub attribute: String,
    /// Also write the identifier to the first image of each run. Off by
    /// default: only the later image of each adjacent pair is written.
    pub tag_run_head: bool,
}

impl Default for ImageGroupOptions {
    fn default() -> Self {
        Self {
            attribute: "group".to_string(),
            tag_run_head: false,
        }
    }
}

// =============================================================================
// Identifiers
// =============================================================================

/// Source of fresh group identifiers.
pub trait IdMinter {
    fn mint(&self) -> String;
}

/// Mints `group-<uuid v7>` identifiers: unique within the process and
/// ordered by creation time.
#[derive(Debug, Clone, Copy, Default)]
pub struct TimeOrderedIds;

impl IdMinter for TimeOrderedIds {
    fn mint(&self) -> String {
        format!("group-{}", Uuid::now_v7())
    }
}

/// Mints `<prefix>-1`, `<prefix>-2`, ...
#[derive(Debug)]
pub struct SequentialIds {
    prefix: String,
    next: Cell<u64>,
}

impl SequentialIds {
    pub fn new(prefix: impl Into<String>) -> Self {
        Self {
            prefix: prefix.into(),
            next: Cell::new(1),
        }
    }
}

impl IdMinter for SequentialIds {
    fn mint(&self) -> String {
        let n = self.next.get();
        self.next.set(n + 1);
        format!("{}-{n}", self.prefix)
    }
}

// =============================================================================
// Re-entrancy guard
// =============================================================================

/// Marks a scan in progress. Notifications that arrive while it is held come
/// from the scan's own writes and are ignored.
#[derive(Debug, Default)]
pub struct ScanGuard {
    active: Cell<bool>,
}

impl ScanGuard {
    pub fn new() -> Self {
        Self::default()
    }

    /// Starts a scan, or returns `None` if one is already running. The scan
    /// ends when the token is dropped, including during unwinding.
    pub fn begin_scan(&self) -> Option<ScanToken<'_>> {
        if self.active.replace(true) {
            return None;
        }
        Some(ScanToken { guard: self })
    }

    pub fn is_active(&self) -> bool {
        self.active.get()
    }
}

/// A running scan; see [`ScanGuard::begin_scan`].
#[derive(Debug)]
pub struct ScanToken<'a> {
    guard: &'a ScanGuard,
}

impl Drop for ScanToken<'_> {
    fn drop(&mut self) {
        self.guard.active.set(false);
    }
}

// =============================================================================
// Run detection
// =============================================================================

/// An image met during a scan.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ImageVisit {
    pub pos: usize,
    pub size: usize,
    /// Current group identifier, if the attribute holds a string.
    pub group: Option<String>,
}

/// A pending `group` write.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GroupWrite {
    pub pos: usize,
    pub group: String,
}

/// How a run obtained its identifier.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RunStart {
    Reused,
    Minted,
}

/// What one image contributed to the scan.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Observation {
    /// The image is adjacent to the previous one.
    pub adjacent: bool,
    /// Set on the first adjacent pair of a run.
    pub run_start: Option<RunStart>,
    pub writes: Vec<GroupWrite>,
    /// Writes dropped because the value was already in place.
    pub skipped: usize,
}

/// Single-pass run detector. Feed it images in document order.
#[derive(Debug, Default)]
pub struct RunTracker {
    prev: Option<ImageVisit>,
    current: Option<String>,
    claimed: FxHashSet<String>,
    tag_run_head: bool,
}

impl RunTracker {
    pub fn new(tag_run_head: bool) -> Self {
        Self {
            tag_run_head,
            ..Self::default()
        }
    }

    /// Returns true if `next` starts exactly where `prev` ends. Overflowing
    /// positions are not adjacent.
    pub fn is_adjacent(prev: &ImageVisit, next: &ImageVisit) -> bool {
        prev.pos.checked_add(prev.size) == Some(next.pos)
    }

    pub fn observe(&mut self, visit: ImageVisit, minter: &dyn IdMinter) -> Observation {
        let mut observation = Observation::default();
        let Some(prev) = self.prev.take() else {
            self.prev = Some(visit);
            return observation;
        };
        if !Self::is_adjacent(&prev, &visit) {
            self.current = None;
            self.prev = Some(visit);
            return observation;
        }
        observation.adjacent = true;

        let id = match &self.current {
            Some(id) => id.clone(),
            None => {
                let (id, start) = self.start_run(&visit, minter);
                observation.run_start = Some(start);
                if self.tag_run_head {
                    self.push_write(&mut observation, &prev, &id);
                }
                id
            }
        };
        self.push_write(&mut observation, &visit, &id);
        self.current = Some(id);
        self.prev = Some(visit);
        observation
    }

    fn start_run(&mut self, first: &ImageVisit, minter: &dyn IdMinter) -> (String, RunStart) {
        if let Some(existing) = &first.group {
            if !existing.is_empty() && self.claimed.insert(existing.clone()) {
                return (existing.clone(), RunStart::Reused);
            }
        }
        let mut id = minter.mint();
        let mut attempt = 1;
        while self.claimed.contains(&id) {
            id = format!("{id}-{attempt}");
            attempt += 1;
        }
        self.claimed.insert(id.clone());
        (id, RunStart::Minted)
    }

    fn push_write(&self, observation: &mut Observation, image: &ImageVisit, id: &str) {
        if image.group.as_deref() == Some(id) {
            observation.skipped += 1;
        } else {
            observation.writes.push(GroupWrite {
                pos: image.pos,
                group: id.to_string(),
            });
        }
    }
}

// =============================================================================
// Observer
// =============================================================================

/// Counters describing what the grouper has done.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct GroupStats {
    pub notifications: u64,
    /// Notifications without a content change.
    pub skipped_unchanged: u64,
    /// Notifications ignored because a scan was running.
    pub suppressed: u64,
    /// Notifications for a document version that was already superseded.
    pub stale: u64,
    /// Grouping passes run (restarted passes count again).
    pub scans: u64,
    /// Passes abandoned because the document changed underneath them.
    pub interrupted: u64,
    pub images_visited: u64,
    pub adjacent_pairs: u64,
    pub ids_minted: u64,
    pub ids_reused: u64,
    pub writes: u64,
    pub skipped_writes: u64,
    pub failed_writes: u64,
}

/// Maintains the `group` attribute of adjacent images.
///
/// Add it to the schema (it contributes the attribute) and register it on
/// the editor:
///
/// ```rust
/// use std::rc::Rc;
/// use tripdoc::editor::Editor;
/// use tripdoc::extensions::{ImageGroup, ImageGroupOptions, SequentialIds};
/// use tripdoc::model::{AttrValue, DocBuilder};
/// use tripdoc::schema::default_schema;
///
/// let schema = default_schema();
/// let doc = DocBuilder::new(&schema).image("a.jpg").image("b.jpg").build().unwrap();
/// let mut editor = Editor::new(schema, doc).unwrap();
/// let grouper = Rc::new(ImageGroup::with_minter(
///     ImageGroupOptions::default(),
///     SequentialIds::new("group"),
/// ));
/// editor.add_observer(grouper.clone());
///
/// editor.set_node_attr(0, "alt", "Tram 28").unwrap();
/// assert_eq!(editor.doc().node_at(1).unwrap().attr("group"), Some(&AttrValue::from("group-1")));
/// assert_eq!(grouper.stats().writes, 1);
/// ```
pub struct ImageGroup {
    options: ImageGroupOptions,
    guard: ScanGuard,
    minter: Box<dyn IdMinter>,
    stats: Cell<GroupStats>,
}

impl ImageGroup {
    pub fn new(options: ImageGroupOptions) -> Self {
        Self::with_minter(options, TimeOrderedIds)
    }

    pub fn with_minter(options: ImageGroupOptions, minter: impl IdMinter + 'static) -> Self {
        Self {
            options,
            guard: ScanGuard::new(),
            minter: Box::new(minter),
            stats: Cell::new(GroupStats::default()),
        }
    }

    pub fn options(&self) -> &ImageGroupOptions {
        &self.options
    }

    pub fn stats(&self) -> GroupStats {
        self.stats.get()
    }

    pub fn reset_stats(&self) {
        self.stats.set(GroupStats::default());
    }

    fn bump(&self, f: impl FnOnce(&mut GroupStats)) {
        let mut stats = self.stats.get();
        f(&mut stats);
        self.stats.set(stats);
    }

    /// Groups the editor's current document, as if it had just changed.
    pub fn regroup(&self, editor: &mut Editor) {
        let Some(_token) = self.guard.begin_scan() else {
            self.bump(|s| s.suppressed += 1);
            return;
        };
        let before = self.stats();

        let mut settled = false;
        for _ in 0..MAX_GROUPING_PASSES {
            if self.pass(editor) {
                settled = true;
                break;
            }
            self.bump(|s| s.interrupted += 1);
            debug!(version = editor.version(), "document changed during grouping, rescanning");
        }
        if !settled {
            warn!(
                passes = MAX_GROUPING_PASSES,
                "document kept changing during grouping, giving up"
            );
        }

        let after = self.stats();
        debug!(
            passes = after.scans - before.scans,
            images = after.images_visited - before.images_visited,
            writes = after.writes - before.writes,
            skipped = after.skipped_writes - before.skipped_writes,
            failed = after.failed_writes - before.failed_writes,
            "image grouping finished"
        );
    }

    /// Runs one pass over the live document. Returns false if the document
    /// changed by anything other than this pass's own writes, which leaves
    /// the remaining positions stale.
    fn pass(&self, editor: &mut Editor) -> bool {
        self.bump(|s| s.scans += 1);
        let doc = editor.doc();
        let mut expected = editor.version();
        let mut interrupted = false;

        let attr = self.options.attribute.as_str();
        let mut tracker = RunTracker::new(self.options.tag_run_head);
        doc.descendants(|node, pos| {
            if interrupted {
                return false;
            }
            if node.node_type() != NodeType::Image {
                return true;
            }
            let visit = ImageVisit {
                pos,
                size: node.node_size(),
                group: node.attr(attr).and_then(AttrValue::as_str).map(str::to_owned),
            };
            let observation = tracker.observe(visit, self.minter.as_ref());
            self.bump(|s| {
                s.images_visited += 1;
                s.adjacent_pairs += u64::from(observation.adjacent);
                s.skipped_writes += observation.skipped as u64;
                match observation.run_start {
                    Some(RunStart::Minted) => s.ids_minted += 1,
                    Some(RunStart::Reused) => s.ids_reused += 1,
                    None => {}
                }
            });

            for write in observation.writes {
                debug!(pos = write.pos, group = %write.group, "grouping adjacent image");
                match editor.set_node_attr(write.pos, attr, write.group) {
                    Ok(()) => {
                        expected += 1;
                        self.bump(|s| s.writes += 1);
                    }
                    Err(err) => {
                        warn!(pos = write.pos, error = %err, "failed to set image group");
                        self.bump(|s| s.failed_writes += 1);
                    }
                }
                if editor.version() != expected {
                    interrupted = true;
                    break;
                }
            }
            false
        });
        !interrupted
    }
}

impl Default for ImageGroup {
    fn default() -> Self {
        Self::new(ImageGroupOptions::default())
    }
}

impl fmt::Debug for ImageGroup {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ImageGroup")
            .field("options", &self.options)
            .field("scanning", &self.guard.is_active())
            .field("stats", &self.stats.get())
            .finish_non_exhaustive()
    }
}

impl DocumentObserver for ImageGroup {
    fn on_document_changed(&self, event: &ChangeEvent<'_>, editor: &mut Editor) {
        self.bump(|s| s.notifications += 1);
        if self.guard.is_active() {
            self.bump(|s| s.suppressed += 1);
            return;
        }
        if !event.doc_changed() {
            self.bump(|s| s.skipped_unchanged += 1);
            return;
        }
        if event.version != editor.version() {
            // A newer change was announced from inside this dispatch and has
            // already been grouped.
            self.bump(|s| s.stale += 1);
            return;
        }
        self.regroup(editor);
    }
}

impl Extension for ImageGroup {
    fn name(&self) -> &'static str {
        "imageGroup"
    }

    fn extend_schema(&self, schema: &mut SchemaBuilder) {
        let data_name = format!("data-{}", self.options.attribute);
        let render_name = data_name.clone();
        let attr = AttrSpec::new(self.options.attribute.clone(), AttrValue::Null)
            .rendered_with(move |v| {
                if v.is_truthy() {
                    vec![(render_name.clone(), v.to_string())]
                } else {
                    Vec::new()
                }
            })
            .parsed_from(data_name);
        schema.global_attribute(GlobalAttribute {
            types: vec![NodeType::Image],
            attr,
        });
    }
}

#[cfg(test)]
mod tests {
    use std::panic::{catch_unwind, AssertUnwindSafe};
    use std::rc::Rc;
    use std::sync::Arc;

    use proptest::prelude::*;
    use rustc_hash::FxHashMap;

    use super::*;
    use crate::extensions::{Core, GalleryLayout};
    use crate::model::{DocBuilder, Node};
    use crate::schema::{default_schema, Schema};
    use crate::transform::Transaction;

    fn visit(pos: usize, size: usize, group: Option<&str>) -> ImageVisit {
        ImageVisit {
            pos,
            size,
            group: group.map(str::to_owned),
        }
    }

    fn pass(visits: &[ImageVisit], tag_run_head: bool, minter: &dyn IdMinter) -> Vec<GroupWrite> {
        let mut tracker = RunTracker::new(tag_run_head);
        visits
            .iter()
            .flat_map(|v| tracker.observe(v.clone(), minter).writes)
            .collect()
    }

    fn grouped_editor(schema: Arc<Schema>, options: ImageGroupOptions) -> (Editor, Rc<ImageGroup>) {
        // Images at 0, 1, 2; paragraph 3..6; images at 6, 7.
        let doc = DocBuilder::new(&schema)
            .image("a.jpg")
            .image("b.jpg")
            .image("c.jpg")
            .paragraph(|p| p.text("x"))
            .image("d.jpg")
            .image("e.jpg")
            .build()
            .unwrap();
        let mut editor = Editor::new(schema, doc).unwrap();
        let grouper = Rc::new(ImageGroup::with_minter(options, SequentialIds::new("group")));
        editor.add_observer(grouper.clone());
        (editor, grouper)
    }

    fn group_at(editor: &Editor, pos: usize) -> Option<String> {
        editor
            .doc()
            .node_at(pos)
            .and_then(|n| n.attr("group"))
            .and_then(AttrValue::as_str)
            .map(str::to_owned)
    }

    #[test]
    fn test_example_document() {
        // [A @0 size 10, B @10 size 5, paragraph @15 size 20, C @35 size 8]
        let minter = SequentialIds::new("group");
        let visits = [visit(0, 10, None), visit(10, 5, None), visit(35, 8, None)];
        let writes = pass(&visits, false, &minter);
        assert_eq!(
            writes,
            vec![GroupWrite {
                pos: 10,
                group: "group-1".to_string()
            }]
        );

        let grouped = [visit(0, 10, None), visit(10, 5, Some("group-1")), visit(35, 8, None)];
        assert!(pass(&grouped, false, &minter).is_empty());
    }

    #[test]
    fn test_overflowing_positions_are_not_adjacent() {
        let minter = SequentialIds::new("g");
        let visits = [visit(usize::MAX, 2, None), visit(1, 1, None)];
        assert!(pass(&visits, false, &minter).is_empty());
    }

    #[test]
    fn test_scan_guard() {
        let guard = ScanGuard::new();
        let token = guard.begin_scan().unwrap();
        assert!(guard.is_active());
        assert!(guard.begin_scan().is_none());
        drop(token);
        assert!(!guard.is_active());

        let result = catch_unwind(AssertUnwindSafe(|| {
            let _token = guard.begin_scan();
            panic!("scan failed");
        }));
        assert!(result.is_err());
        assert!(!guard.is_active());
    }

    #[test]
    fn test_runs_get_distinct_ids() {
        let (mut editor, grouper) = grouped_editor(default_schema(), ImageGroupOptions::default());
        editor.set_node_attr(0, "alt", "first").unwrap();

        // Only the later image of each pair is written.
        assert_eq!(group_at(&editor, 0), None);
        assert_eq!(group_at(&editor, 1).as_deref(), Some("group-1"));
        assert_eq!(group_at(&editor, 2).as_deref(), Some("group-1"));
        assert_eq!(group_at(&editor, 6), None);
        assert_eq!(group_at(&editor, 7).as_deref(), Some("group-2"));

        let stats = grouper.stats();
        assert_eq!(stats.scans, 1);
        assert_eq!(stats.writes, 3);
        assert_eq!(stats.ids_minted, 2);
        assert_eq!(stats.adjacent_pairs, 3);
        assert_eq!(stats.images_visited, 5);
    }

    #[test]
    fn test_own_writes_do_not_rescan() {
        let (mut editor, grouper) = grouped_editor(default_schema(), ImageGroupOptions::default());
        editor.set_node_attr(0, "alt", "first").unwrap();

        let stats = grouper.stats();
        assert_eq!(stats.notifications, 4);
        assert_eq!(stats.suppressed, 3);
        assert_eq!(stats.scans, 1);
        assert_eq!(editor.version(), 4);
    }

    #[test]
    fn test_grouped_document_is_stable() {
        let (mut editor, grouper) = grouped_editor(default_schema(), ImageGroupOptions::default());
        editor.set_node_attr(0, "alt", "first").unwrap();
        let version = editor.version();

        editor.set_node_attr(6, "alt", "second").unwrap();
        let stats = grouper.stats();
        assert_eq!(stats.scans, 2);
        assert_eq!(stats.writes, 3);
        assert_eq!(stats.skipped_writes, 3);
        assert_eq!(stats.ids_reused, 2);
        assert_eq!(editor.version(), version + 1);
    }

    #[test]
    fn test_selection_change_is_ignored() {
        let (mut editor, grouper) = grouped_editor(default_schema(), ImageGroupOptions::default());
        editor.set_text_selection(4).unwrap();

        let stats = grouper.stats();
        assert_eq!(stats.notifications, 1);
        assert_eq!(stats.skipped_unchanged, 1);
        assert_eq!(stats.scans, 0);
        assert_eq!(stats.images_visited, 0);
        assert_eq!(stats.writes, 0);
    }

    #[test]
    fn test_merging_runs_keeps_first_id() {
        let (mut editor, _grouper) = grouped_editor(default_schema(), ImageGroupOptions::default());
        editor.set_node_attr(0, "alt", "first").unwrap();

        editor.delete_range(3, 6).unwrap();
        // Images now at 0..5, one run.
        for pos in 1..5 {
            assert_eq!(group_at(&editor, pos).as_deref(), Some("group-1"), "pos {pos}");
        }
        assert_eq!(group_at(&editor, 0), None);
    }

    /// Deletes a range once, when the change with `version` is announced.
    struct DeleteOnVersion {
        version: u64,
        range: (usize, usize),
        done: Cell<bool>,
    }

    impl DeleteOnVersion {
        fn new(version: u64, from: usize, to: usize) -> Rc<Self> {
            Rc::new(Self {
                version,
                range: (from, to),
                done: Cell::new(false),
            })
        }
    }

    impl DocumentObserver for DeleteOnVersion {
        fn on_document_changed(&self, event: &ChangeEvent<'_>, editor: &mut Editor) {
            if event.version == self.version && !self.done.replace(true) {
                editor.delete_range(self.range.0, self.range.1).unwrap();
            }
        }
    }

    fn split_runs_doc(schema: &Schema) -> Node {
        // Images at 0, 1; paragraph 2..5; images at 5, 6.
        DocBuilder::new(schema)
            .image("a.jpg")
            .image("b.jpg")
            .paragraph(|p| p.text("x"))
            .image("c.jpg")
            .image("d.jpg")
            .build()
            .unwrap()
    }

    #[test]
    fn test_earlier_observer_edit_is_grouped_once() {
        let schema = default_schema();
        let mut editor = Editor::new(schema.clone(), split_runs_doc(&schema)).unwrap();
        editor.add_observer(DeleteOnVersion::new(1, 2, 5));
        let grouper = Rc::new(ImageGroup::with_minter(
            ImageGroupOptions::default(),
            SequentialIds::new("group"),
        ));
        editor.add_observer(grouper.clone());

        editor.set_node_attr(0, "alt", "x").unwrap();

        // The paragraph is gone and the four images form one run.
        assert_eq!(group_at(&editor, 0), None);
        for pos in 1..4 {
            assert_eq!(group_at(&editor, pos).as_deref(), Some("group-1"), "pos {pos}");
        }
        let stats = grouper.stats();
        assert_eq!(stats.stale, 1);
        assert_eq!(stats.scans, 1);
        assert_eq!(stats.writes, 3);
        assert_eq!(stats.failed_writes, 0);
    }

    #[test]
    fn test_later_observer_edit_restarts_pass() {
        let schema = default_schema();
        let mut editor = Editor::new(schema.clone(), split_runs_doc(&schema)).unwrap();
        let grouper = Rc::new(ImageGroup::with_minter(
            ImageGroupOptions::default(),
            SequentialIds::new("group"),
        ));
        editor.add_observer(grouper.clone());
        // Reacts to the grouper's first write (version 2).
        editor.add_observer(DeleteOnVersion::new(2, 2, 5));

        editor.set_node_attr(0, "alt", "x").unwrap();

        assert_eq!(group_at(&editor, 0), None);
        for pos in 1..4 {
            assert_eq!(group_at(&editor, pos).as_deref(), Some("group-1"), "pos {pos}");
        }
        let stats = grouper.stats();
        assert_eq!(stats.interrupted, 1);
        assert_eq!(stats.scans, 2);
        assert_eq!(stats.ids_minted, 1);
        assert_eq!(stats.ids_reused, 1);
        assert_eq!(stats.failed_writes, 0);
    }

    #[test]
    fn test_shared_stale_id_is_not_reused_twice() {
        let schema = default_schema();
        let stale = |src: &str| crate::model::attrs([("src", src), ("group", "copied")]);
        let doc = DocBuilder::new(&schema)
            .image("a.jpg")
            .image_with(stale("b.jpg"))
            .paragraph(|p| p.text("x"))
            .image("c.jpg")
            .image_with(stale("d.jpg"))
            .build()
            .unwrap();
        let mut editor = Editor::new(schema, doc).unwrap();
        let grouper = Rc::new(ImageGroup::with_minter(
            ImageGroupOptions::default(),
            SequentialIds::new("group"),
        ));
        editor.add_observer(grouper.clone());
        grouper.regroup(&mut editor);

        assert_eq!(group_at(&editor, 1).as_deref(), Some("copied"));
        assert_eq!(group_at(&editor, 6).as_deref(), Some("group-1"));
        let stats = grouper.stats();
        assert_eq!((stats.ids_reused, stats.ids_minted), (1, 1));
    }

    #[test]
    fn test_tag_run_head() {
        let options = ImageGroupOptions {
            tag_run_head: true,
            ..ImageGroupOptions::default()
        };
        let (mut editor, grouper) = grouped_editor(default_schema(), options);
        editor.set_node_attr(0, "alt", "first").unwrap();

        for pos in [0, 1, 2] {
            assert_eq!(group_at(&editor, pos).as_deref(), Some("group-1"));
        }
        assert_eq!(group_at(&editor, 6).as_deref(), Some("group-2"));
        assert_eq!(group_at(&editor, 7).as_deref(), Some("group-2"));
        assert_eq!(grouper.stats().writes, 5);
    }

    #[test]
    fn test_rejected_writes_are_swallowed() {
        // Without the extension in the schema, images have no group attribute.
        let schema = Arc::new(Schema::builder().with(&Core).build().unwrap());
        let (mut editor, grouper) = grouped_editor(schema, ImageGroupOptions::default());
        let before = editor.doc();

        grouper.regroup(&mut editor);

        let stats = grouper.stats();
        assert_eq!(stats.failed_writes, 3);
        assert_eq!(stats.writes, 0);
        assert_eq!(stats.images_visited, 5);
        assert_eq!(editor.doc(), before);
    }

    #[test]
    fn test_gallery_cells_are_not_adjacent() {
        let schema = default_schema();
        let doc = DocBuilder::new(&schema)
            .image("before.jpg")
            .gallery(GalleryLayout::Double, &["a.jpg", "b.jpg"])
            .build()
            .unwrap();
        let mut editor = Editor::new(schema, doc).unwrap();
        let grouper = Rc::new(ImageGroup::default());
        editor.add_observer(grouper.clone());

        editor
            .dispatch(Transaction::new().set_node_attr(0, "alt", "x"))
            .unwrap();
        let stats = grouper.stats();
        assert_eq!(stats.images_visited, 3);
        assert_eq!(stats.adjacent_pairs, 0);
        assert_eq!(stats.writes, 0);
    }

    #[test]
    fn test_time_ordered_ids() {
        let a = TimeOrderedIds.mint();
        let b = TimeOrderedIds.mint();
        assert!(a.starts_with("group-"));
        assert_ne!(a, b);
    }

    #[test]
    fn test_group_renders_as_data_attribute() {
        let schema = default_schema();
        let grouped = schema
            .node(
                NodeType::Image,
                crate::model::attrs([("src", "a.jpg"), ("group", "group-1")]),
                vec![],
            )
            .unwrap();
        let rendered = schema.render_attrs(&grouped);
        assert!(rendered.contains(&("data-group".to_string(), "group-1".to_string())));

        let plain = schema
            .node(NodeType::Image, crate::model::attrs([("src", "b.jpg")]), vec![])
            .unwrap();
        assert!(!schema.render_attrs(&plain).iter().any(|(k, _)| k == "data-group"));
    }

    #[test]
    fn test_options_from_json() {
        let options: ImageGroupOptions = serde_json::from_str(r#"{"tag_run_head": true}"#).unwrap();
        assert_eq!(options.attribute, "group");
        assert!(options.tag_run_head);
    }

    /// Lays out items (true = image of size 1, false = paragraph of size 3)
    /// with their current groups.
    fn layout(items: &[(bool, Option<u8>)]) -> Vec<ImageVisit> {
        let mut pos = 0;
        let mut visits = Vec::new();
        for (is_image, group) in items {
            if *is_image {
                visits.push(visit(pos, 1, group.map(|g| format!("old-{g}")).as_deref()));
                pos += 1;
            } else {
                pos += 3;
            }
        }
        visits
    }

    fn apply(visits: &mut [ImageVisit], writes: Vec<GroupWrite>) {
        let index: FxHashMap<usize, usize> = visits.iter().enumerate().map(|(i, v)| (v.pos, i)).collect();
        for write in writes {
            visits[index[&write.pos]].group = Some(write.group);
        }
    }

    /// Splits visits into maximal runs of adjacent images.
    fn runs(visits: &[ImageVisit]) -> Vec<&[ImageVisit]> {
        let mut runs = Vec::new();
        let mut start = 0;
        for i in 1..=visits.len() {
            if i == visits.len() || !RunTracker::is_adjacent(&visits[i - 1], &visits[i]) {
                runs.push(&visits[start..i]);
                start = i;
            }
        }
        runs
    }

    proptest! {
        #[test]
        fn runs_share_one_distinct_id(
            items in prop::collection::vec((any::<bool>(), prop::option::of(0u8..3)), 0..40),
            tag_run_head in any::<bool>(),
        ) {
            let mut visits = layout(&items);
            let writes = pass(&visits, tag_run_head, &SequentialIds::new("fresh"));
            apply(&mut visits, writes);

            let mut seen = FxHashSet::default();
            for run in runs(&visits).into_iter().filter(|r| r.len() > 1) {
                let written = if tag_run_head { run } else { &run[1..] };
                let id = written[0].group.clone();
                prop_assert!(id.is_some());
                for image in written {
                    prop_assert_eq!(&image.group, &id);
                }
                prop_assert!(seen.insert(id));
            }
        }

        #[test]
        fn second_pass_writes_nothing(
            items in prop::collection::vec((any::<bool>(), prop::option::of(0u8..3)), 0..40),
            tag_run_head in any::<bool>(),
        ) {
            let minter = SequentialIds::new("fresh");
            let mut visits = layout(&items);
            let writes = pass(&visits, tag_run_head, &minter);
            apply(&mut visits, writes);
            prop_assert!(pass(&visits, tag_run_head, &minter).is_empty());
        }

        #[test]
        fn lone_images_are_untouched(
            items in prop::collection::vec((any::<bool>(), prop::option::of(0u8..3)), 0..40),
        ) {
            let before = layout(&items);
            let mut after = before.clone();
            let writes = pass(&after, false, &SequentialIds::new("fresh"));
            apply(&mut after, writes);
            for (run_before, run_after) in runs(&before).into_iter().zip(runs(&after)) {
                prop_assert_eq!(&run_before[0], &run_after[0]);
            }
        }
    }
}
