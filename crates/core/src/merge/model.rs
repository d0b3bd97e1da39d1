//! The merge computation context.
//!
//! A [`MergeModel`] owns the four documents of one merge session for
//! analysis purposes:
//! 1. **Seeding** -- when asked, fills the result document with a three-way
//!    merge of base/ours/theirs, conflict-marked where the merge is not clean.
//! 2. **Change analysis** -- computes per-side changed regions with a raw and
//!    a projected diff provider.
//! 3. **Conflict tracking** -- scans the result for conflict-marker blocks,
//!    exposes resolution operations and a "has unresolved conflicts" watch
//!    channel kept fresh while the result document changes.
//!
//! Returning from [`MergeModel::initialize`] is the readiness signal: a model
//! handed out has already seeded and analyzed its documents.

use std::fmt;
use std::sync::Arc;

use tokio::sync::watch;
use tokio::task::JoinHandle;
use tracing::{debug, info, warn};
use uuid::Uuid;

use crate::doc::{Document, LanguageId};
use crate::errors::MergeError;

use super::diff::{DiffProvider, DiffRegion};

// ---------------------------------------------------------------------------
// Options
// ---------------------------------------------------------------------------

/// Side labels written into conflict markers and shown by frontends.
#[derive(Debug, Clone)]
pub struct MergeLabels {
    pub ours: String,
    pub theirs: String,
}

impl Default for MergeLabels {
    fn default() -> Self {
        Self {
            ours: "ours".to_string(),
            theirs: "theirs".to_string(),
        }
    }
}

/// Conflict marker style: plain markers, or `diff3` with a base section.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ConflictStyle {
    #[default]
    Merge,
    Diff3,
}

#[derive(Debug, Clone, Default)]
pub struct MergeModelOptions {
    /// Replace the result document's text with the seeded three-way merge.
    /// Scratch-mode factories set this; workspace mode edits the file as-is.
    pub reset_result: bool,
    pub labels: MergeLabels,
    pub conflict_style: ConflictStyle,
}

/// One of the two incoming sides.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MergeSide {
    Ours,
    Theirs,
}

impl fmt::Display for MergeSide {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            MergeSide::Ours => f.write_str("ours"),
            MergeSide::Theirs => f.write_str("theirs"),
        }
    }
}

// ---------------------------------------------------------------------------
// Conflict regions
// ---------------------------------------------------------------------------

/// A conflict-marker block in the result document. Line numbers are 1-based
/// and inclusive, spanning the opening through the closing marker line.
#[derive(Debug, Clone)]
pub struct ConflictRegion {
    pub start_line: usize,
    pub end_line: usize,
    pub ours: Vec<String>,
    pub theirs: Vec<String>,
    /// Present only for `diff3`-style markers.
    pub base: Option<Vec<String>>,
}

/// How to resolve one conflict region.
#[derive(Debug, Clone)]
pub enum Resolution {
    Ours,
    Theirs,
    /// Ours first, then theirs.
    Both,
    Custom(String),
}

impl fmt::Display for Resolution {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Resolution::Ours => f.write_str("ours"),
            Resolution::Theirs => f.write_str("theirs"),
            Resolution::Both => f.write_str("both"),
            Resolution::Custom(_) => f.write_str("custom"),
        }
    }
}

/// Changed regions one side introduced relative to base.
#[derive(Debug, Clone, Default)]
pub struct SideChanges {
    /// Raw line-diff regions.
    pub regions: Vec<DiffRegion>,
    /// Regions that survive the whitespace-normalizing projection.
    pub projected: Vec<DiffRegion>,
}

impl SideChanges {
    pub fn is_unchanged(&self) -> bool {
        self.regions.is_empty()
    }

    /// The side changed the text, but only in ways the projection erases
    /// (indentation, spacing, blank lines).
    pub fn formatting_only(&self) -> bool {
        !self.regions.is_empty() && self.projected.is_empty()
    }
}

// ---------------------------------------------------------------------------
// Model
// ---------------------------------------------------------------------------

/// The merge computation context for one session.
pub struct MergeModel {
    id: Uuid,
    base: Arc<Document>,
    ours: Arc<Document>,
    theirs: Arc<Document>,
    result: Arc<Document>,
    labels: MergeLabels,
    ours_changes: SideChanges,
    theirs_changes: SideChanges,
    unresolved_tx: watch::Sender<bool>,
    rescanner: JoinHandle<()>,
}

impl MergeModel {
    /// Builds and readies a merge model:
    ///
    /// 1. Seeds the result document with the three-way merge when
    ///    `options.reset_result` is set.
    /// 2. Computes per-side change regions against base with both providers.
    /// 3. Scans the result for conflict blocks and starts the rescanner that
    ///    keeps the unresolved flag fresh while the result changes.
    pub async fn initialize(
        base: Arc<Document>,
        ours: Arc<Document>,
        theirs: Arc<Document>,
        result: Arc<Document>,
        options: MergeModelOptions,
        diff: Arc<dyn DiffProvider>,
        projected_diff: Arc<dyn DiffProvider>,
    ) -> Result<Arc<Self>, MergeError> {
        let id = Uuid::new_v4();

        if options.reset_result {
            let seed = seed_merge(
                &base.text(),
                &ours.text(),
                &theirs.text(),
                &options.labels,
                options.conflict_style,
            );
            debug!(model = %id, clean = seed.clean, "seeded result document");
            result.set_text(seed.text);
        }

        let base_text = base.text();
        let ours_changes = side_changes(&base_text, &ours.text(), &*diff, &*projected_diff);
        let theirs_changes = side_changes(&base_text, &theirs.text(), &*diff, &*projected_diff);

        let unresolved = match scan_conflicts(&result.text()) {
            Ok(regions) => !regions.is_empty(),
            Err(e) => {
                warn!(model = %id, error = %e, "result document has malformed conflict markers");
                true
            }
        };
        let (unresolved_tx, _) = watch::channel(unresolved);

        let rescanner = spawn_rescanner(id, &result, unresolved_tx.clone());

        info!(
            model = %id,
            unresolved,
            ours_regions = ours_changes.regions.len(),
            theirs_regions = theirs_changes.regions.len(),
            "merge model ready"
        );

        Ok(Arc::new(Self {
            id,
            base,
            ours,
            theirs,
            result,
            labels: options.labels,
            ours_changes,
            theirs_changes,
            unresolved_tx,
            rescanner,
        }))
    }

    pub fn id(&self) -> Uuid {
        self.id
    }

    pub fn base(&self) -> &Arc<Document> {
        &self.base
    }

    pub fn ours(&self) -> &Arc<Document> {
        &self.ours
    }

    pub fn theirs(&self) -> &Arc<Document> {
        &self.theirs
    }

    /// The document holding the composed result (the scratch document in
    /// scratch mode, the real target in workspace mode).
    pub fn result(&self) -> &Arc<Document> {
        &self.result
    }

    pub fn labels(&self) -> &MergeLabels {
        &self.labels
    }

    pub fn changes(&self, side: MergeSide) -> &SideChanges {
        match side {
            MergeSide::Ours => &self.ours_changes,
            MergeSide::Theirs => &self.theirs_changes,
        }
    }

    /// The composed textual value as it stands right now.
    pub fn result_text(&self) -> Arc<str> {
        self.result.text()
    }

    pub fn set_language(&self, language: LanguageId) {
        self.result.set_language(language);
    }

    /// Current conflict regions in the result document.
    pub fn conflicts(&self) -> Result<Vec<ConflictRegion>, MergeError> {
        scan_conflicts(&self.result.text())
    }

    pub fn has_unresolved_conflicts(&self) -> bool {
        *self.unresolved_tx.borrow()
    }

    /// Subscribes to the unresolved flag. The receiver has already seen the
    /// current value.
    pub fn unresolved_changes(&self) -> watch::Receiver<bool> {
        self.unresolved_tx.subscribe()
    }

    /// Replaces conflict region `index` with the chosen resolution and
    /// updates the unresolved flag.
    pub fn resolve(&self, index: usize, resolution: Resolution) -> Result<(), MergeError> {
        let text = self.result.text();
        let regions = scan_conflicts(&text)?;
        let region = regions
            .get(index)
            .ok_or(MergeError::ConflictNotFound(index))?;

        let replacement: Vec<String> = match &resolution {
            Resolution::Ours => region.ours.clone(),
            Resolution::Theirs => region.theirs.clone(),
            Resolution::Both => region
                .ours
                .iter()
                .chain(region.theirs.iter())
                .cloned()
                .collect(),
            Resolution::Custom(text) => text.lines().map(str::to_string).collect(),
        };

        let lines: Vec<&str> = text.lines().collect();
        let mut out: Vec<String> = Vec::with_capacity(lines.len());
        out.extend(lines[..region.start_line - 1].iter().map(|s| s.to_string()));
        out.extend(replacement);
        out.extend(lines[region.end_line..].iter().map(|s| s.to_string()));
        let mut new_text = out.join("\n");
        if text.ends_with('\n') && !new_text.is_empty() {
            new_text.push('\n');
        }

        info!(model = %self.id, conflict = index, resolution = %resolution, "conflict resolved");
        self.result.set_text(new_text);
        self.refresh_unresolved();
        Ok(())
    }

    fn refresh_unresolved(&self) {
        // Malformed markers count as unresolved.
        let unresolved = match scan_conflicts(&self.result.text()) {
            Ok(regions) => !regions.is_empty(),
            Err(_) => true,
        };
        self.unresolved_tx.send_if_modified(|u| {
            if *u != unresolved {
                *u = unresolved;
                true
            } else {
                false
            }
        });
    }
}

impl Drop for MergeModel {
    fn drop(&mut self) {
        self.rescanner.abort();
    }
}

impl fmt::Debug for MergeModel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("MergeModel")
            .field("id", &self.id)
            .field("result", self.result.uri())
            .finish()
    }
}

fn side_changes(
    base: &str,
    side: &str,
    diff: &dyn DiffProvider,
    projected: &dyn DiffProvider,
) -> SideChanges {
    SideChanges {
        regions: diff.compute(base, side),
        projected: projected.compute(base, side),
    }
}

fn spawn_rescanner(
    id: Uuid,
    result: &Arc<Document>,
    tx: watch::Sender<bool>,
) -> JoinHandle<()> {
    let mut rx = result.subscribe();
    tokio::spawn(async move {
        while rx.changed().await.is_ok() {
            let text = rx.borrow_and_update().text.clone();
            let unresolved = match scan_conflicts(&text) {
                Ok(regions) => !regions.is_empty(),
                Err(e) => {
                    warn!(model = %id, error = %e, "conflict rescan found malformed markers");
                    true
                }
            };
            tx.send_if_modified(|u| {
                if *u != unresolved {
                    *u = unresolved;
                    true
                } else {
                    false
                }
            });
        }
    })
}

// ---------------------------------------------------------------------------
// Seeding
// ---------------------------------------------------------------------------

struct SeedMerge {
    text: String,
    clean: bool,
}

/// Three-way merge of `base`, `ours`, `theirs`.
///
/// Clean fast paths first, then both patch directions via `diffy`; when
/// neither applies cleanly, conflict-marked output is generated.
fn seed_merge(
    base: &str,
    ours: &str,
    theirs: &str,
    labels: &MergeLabels,
    style: ConflictStyle,
) -> SeedMerge {
    if ours == base {
        return SeedMerge {
            text: theirs.to_string(),
            clean: true,
        };
    }
    if theirs == base {
        return SeedMerge {
            text: ours.to_string(),
            clean: true,
        };
    }
    if ours == theirs {
        return SeedMerge {
            text: ours.to_string(),
            clean: true,
        };
    }

    let patch_theirs = diffy::create_patch(base, theirs);
    if let Ok(merged) = diffy::apply(ours, &patch_theirs) {
        return SeedMerge {
            text: merged,
            clean: true,
        };
    }

    let patch_ours = diffy::create_patch(base, ours);
    if let Ok(merged) = diffy::apply(theirs, &patch_ours) {
        return SeedMerge {
            text: merged,
            clean: true,
        };
    }

    SeedMerge {
        text: conflict_markup(base, ours, theirs, labels, style),
        clean: false,
    }
}

/// Generates conflict-marker output for a merge that cannot be automated,
/// by line-wise comparison of the two sides.
fn conflict_markup(
    base: &str,
    ours: &str,
    theirs: &str,
    labels: &MergeLabels,
    style: ConflictStyle,
) -> String {
    let base_lines: Vec<&str> = base.lines().collect();
    let ours_lines: Vec<&str> = ours.lines().collect();
    let theirs_lines: Vec<&str> = theirs.lines().collect();

    let mut output: Vec<String> = Vec::new();
    let max_len = ours_lines
        .len()
        .max(theirs_lines.len())
        .max(base_lines.len());

    let mut i = 0;
    while i < max_len {
        let ours_line = ours_lines.get(i).copied();
        let theirs_line = theirs_lines.get(i).copied();

        match (ours_line, theirs_line) {
            (Some(o), Some(t)) if o == t => {
                output.push(o.to_string());
                i += 1;
            }
            (Some(o), Some(t)) => {
                // Collect the extent of the contiguous differing block.
                let mut ours_block = vec![o.to_string()];
                let mut theirs_block = vec![t.to_string()];
                let mut j = i + 1;
                while j < max_len {
                    let ol = ours_lines.get(j).copied();
                    let tl = theirs_lines.get(j).copied();
                    if ol == tl {
                        break;
                    }
                    if let Some(o2) = ol {
                        ours_block.push(o2.to_string());
                    }
                    if let Some(t2) = tl {
                        theirs_block.push(t2.to_string());
                    }
                    j += 1;
                }

                output.push(format!("<<<<<<< {}", labels.ours));
                output.extend(ours_block);
                if style == ConflictStyle::Diff3 {
                    output.push("||||||| base".to_string());
                    for k in i..j {
                        if let Some(b) = base_lines.get(k) {
                            output.push(b.to_string());
                        }
                    }
                }
                output.push("=======".to_string());
                output.extend(theirs_block);
                output.push(format!(">>>>>>> {}", labels.theirs));

                i = j;
            }
            (Some(o), None) => {
                output.push(o.to_string());
                i += 1;
            }
            (None, Some(t)) => {
                output.push(t.to_string());
                i += 1;
            }
            (None, None) => {
                i += 1;
            }
        }
    }

    let mut text = output.join("\n");
    if ours.ends_with('\n') || theirs.ends_with('\n') {
        text.push('\n');
    }
    text
}

// ---------------------------------------------------------------------------
// Conflict scanning
// ---------------------------------------------------------------------------

enum Section {
    Ours,
    Base,
    Theirs,
}

struct OpenRegion {
    start_line: usize,
    section: Section,
    ours: Vec<String>,
    base: Option<Vec<String>>,
    theirs: Vec<String>,
}

/// Parses conflict-marker blocks out of `text`.
///
/// Marker-looking lines outside an open block are treated as plain content
/// (a `=======` heading underline in Markdown must not start a conflict);
/// inside a block the structure is enforced.
fn scan_conflicts(text: &str) -> Result<Vec<ConflictRegion>, MergeError> {
    let mut regions = Vec::new();
    let mut open: Option<OpenRegion> = None;

    for (idx, line) in text.lines().enumerate() {
        let line_no = idx + 1;

        if line.starts_with("<<<<<<<") {
            if let Some(r) = &open {
                return Err(MergeError::MalformedMarkers {
                    line: line_no,
                    detail: format!("conflict starting at line {} is still open", r.start_line),
                });
            }
            open = Some(OpenRegion {
                start_line: line_no,
                section: Section::Ours,
                ours: Vec::new(),
                base: None,
                theirs: Vec::new(),
            });
        } else if line.starts_with("|||||||") && open.is_some() {
            if let Some(r) = &mut open {
                match r.section {
                    Section::Ours => {
                        r.section = Section::Base;
                        r.base = Some(Vec::new());
                    }
                    _ => {
                        return Err(MergeError::MalformedMarkers {
                            line: line_no,
                            detail: "unexpected base divider".to_string(),
                        });
                    }
                }
            }
        } else if line.starts_with("=======") && open.is_some() {
            if let Some(r) = &mut open {
                match r.section {
                    Section::Ours | Section::Base => r.section = Section::Theirs,
                    Section::Theirs => {
                        return Err(MergeError::MalformedMarkers {
                            line: line_no,
                            detail: "duplicate separator".to_string(),
                        });
                    }
                }
            }
        } else if line.starts_with(">>>>>>>") && open.is_some() {
            if let Some(r) = open.take() {
                match r.section {
                    Section::Theirs => regions.push(ConflictRegion {
                        start_line: r.start_line,
                        end_line: line_no,
                        ours: r.ours,
                        theirs: r.theirs,
                        base: r.base,
                    }),
                    _ => {
                        return Err(MergeError::MalformedMarkers {
                            line: line_no,
                            detail: "conflict closed before its separator".to_string(),
                        });
                    }
                }
            }
        } else if let Some(r) = &mut open {
            match r.section {
                Section::Ours => r.ours.push(line.to_string()),
                Section::Base => {
                    if let Some(base) = &mut r.base {
                        base.push(line.to_string());
                    }
                }
                Section::Theirs => r.theirs.push(line.to_string()),
            }
        }
    }

    if let Some(r) = open {
        return Err(MergeError::MalformedMarkers {
            line: r.start_line,
            detail: "unterminated conflict block".to_string(),
        });
    }

    Ok(regions)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::doc::DocUri;
    use crate::merge::diff::{LineDiffProvider, ProjectedDiffProvider};

    fn doc(path: &str, text: &str) -> Arc<Document> {
        Document::with_detected_language(DocUri::file(path), text)
    }

    async fn model_for(
        base: &str,
        ours: &str,
        theirs: &str,
        options: MergeModelOptions,
    ) -> Arc<MergeModel> {
        MergeModel::initialize(
            doc("/m/base.rs", base),
            doc("/m/ours.rs", ours),
            doc("/m/theirs.rs", theirs),
            doc("/m/result.rs", ""),
            options,
            Arc::new(LineDiffProvider),
            Arc::new(ProjectedDiffProvider::new()),
        )
        .await
        .unwrap()
    }

    fn reset() -> MergeModelOptions {
        MergeModelOptions {
            reset_result: true,
            ..Default::default()
        }
    }

    #[tokio::test]
    async fn test_clean_seed_when_one_side_unchanged() {
        let base = "a\nb\nc\n";
        let ours = "a\nB\nc\n";
        let model = model_for(base, ours, base, reset()).await;
        assert_eq!(&*model.result_text(), ours);
        assert!(!model.has_unresolved_conflicts());
        assert!(model.conflicts().unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_clean_seed_of_non_overlapping_changes() {
        let base = "l1\nl2\nl3\nl4\nl5\nl6\nl7\nl8\n";
        let ours = "L1\nl2\nl3\nl4\nl5\nl6\nl7\nl8\n";
        let theirs = "l1\nl2\nl3\nl4\nl5\nl6\nl7\nL8\n";
        let model = model_for(base, ours, theirs, reset()).await;
        assert!(!model.has_unresolved_conflicts());
        let text = model.result_text();
        assert!(text.contains("L1") && text.contains("L8"));
    }

    #[tokio::test]
    async fn test_conflicting_seed_produces_marked_regions() {
        let base = "a\nmiddle\nz\n";
        let ours = "a\nours version\nz\n";
        let theirs = "a\ntheirs version\nz\n";
        let model = model_for(base, ours, theirs, reset()).await;

        assert!(model.has_unresolved_conflicts());
        let conflicts = model.conflicts().unwrap();
        assert_eq!(conflicts.len(), 1);
        assert_eq!(conflicts[0].ours, vec!["ours version".to_string()]);
        assert_eq!(conflicts[0].theirs, vec!["theirs version".to_string()]);
        assert!(conflicts[0].base.is_none());
    }

    #[tokio::test]
    async fn test_diff3_style_captures_base_section() {
        let options = MergeModelOptions {
            reset_result: true,
            conflict_style: ConflictStyle::Diff3,
            ..Default::default()
        };
        let model = model_for("a\nold\nz\n", "a\nours\nz\n", "a\ntheirs\nz\n", options).await;
        let conflicts = model.conflicts().unwrap();
        assert_eq!(conflicts[0].base, Some(vec!["old".to_string()]));
    }

    #[tokio::test]
    async fn test_custom_labels_in_markers() {
        let options = MergeModelOptions {
            reset_result: true,
            labels: MergeLabels {
                ours: "local".to_string(),
                theirs: "remote".to_string(),
            },
            ..Default::default()
        };
        let model = model_for("a\nx\nz\n", "a\no\nz\n", "a\nt\nz\n", options).await;
        let text = model.result_text();
        assert!(text.contains("<<<<<<< local"));
        assert!(text.contains(">>>>>>> remote"));
    }

    #[tokio::test]
    async fn test_resolve_ours_clears_unresolved_flag() {
        let model = model_for("a\nmid\nz\n", "a\nours\nz\n", "a\ntheirs\nz\n", reset()).await;
        model.resolve(0, Resolution::Ours).unwrap();

        let text = model.result_text();
        assert!(text.contains("ours"));
        assert!(!text.contains("<<<<<<<"));
        assert!(!model.has_unresolved_conflicts());
    }

    #[tokio::test]
    async fn test_resolve_both_keeps_ours_then_theirs() {
        let model = model_for("a\nmid\nz\n", "a\nours\nz\n", "a\ntheirs\nz\n", reset()).await;
        model.resolve(0, Resolution::Both).unwrap();

        let text = model.result_text();
        let ours_at = text.find("ours").unwrap();
        let theirs_at = text.find("theirs").unwrap();
        assert!(ours_at < theirs_at);
    }

    #[tokio::test]
    async fn test_resolve_custom_splices_given_text() {
        let model = model_for("a\nmid\nz\n", "a\nours\nz\n", "a\ntheirs\nz\n", reset()).await;
        model
            .resolve(0, Resolution::Custom("hand written\nresolution".to_string()))
            .unwrap();

        let text = model.result_text();
        assert!(text.contains("hand written\nresolution"));
        assert!(!model.has_unresolved_conflicts());
    }

    #[tokio::test]
    async fn test_resolve_out_of_range_index_fails() {
        let model = model_for("a\nmid\nz\n", "a\nours\nz\n", "a\ntheirs\nz\n", reset()).await;
        let err = model.resolve(5, Resolution::Ours).unwrap_err();
        assert!(matches!(err, MergeError::ConflictNotFound(5)));
    }

    #[tokio::test]
    async fn test_rescanner_observes_external_edits() {
        let model = model_for("a\nmid\nz\n", "a\nours\nz\n", "a\ntheirs\nz\n", reset()).await;
        assert!(model.has_unresolved_conflicts());

        let mut rx = model.unresolved_changes();
        model.result().set_text("a\nhand merged\nz\n");
        rx.changed().await.unwrap();
        assert!(!*rx.borrow());
        assert!(!model.has_unresolved_conflicts());
    }

    #[tokio::test]
    async fn test_side_changes_and_formatting_only() {
        let base = "fn f() {\n    let x = 1;\n}\n";
        let ours = "fn f() {\n\tlet  x = 1;\n}\n";
        let theirs = "fn f() {\n    let x = 2;\n}\n";
        let model = model_for(base, ours, theirs, MergeModelOptions::default()).await;

        assert!(model.changes(MergeSide::Ours).formatting_only());
        assert!(!model.changes(MergeSide::Theirs).formatting_only());
        assert!(!model.changes(MergeSide::Theirs).is_unchanged());
    }

    #[tokio::test]
    async fn test_set_language_applies_to_result() {
        let model = model_for("a\n", "b\n", "c\n", reset()).await;
        model.set_language(LanguageId::new("rust"));
        assert_eq!(model.result().language().as_str(), "rust");
    }

    #[test]
    fn test_scan_ignores_marker_lookalikes_outside_blocks() {
        let text = "Title\n=======\nbody\n";
        assert!(scan_conflicts(text).unwrap().is_empty());
    }

    #[test]
    fn test_scan_rejects_unterminated_block() {
        let text = "a\n<<<<<<< ours\nx\n=======\ny\n";
        let err = scan_conflicts(text).unwrap_err();
        assert!(matches!(err, MergeError::MalformedMarkers { line: 2, .. }));
    }

    #[test]
    fn test_scan_multiple_regions_with_positions() {
        let text = "\
k1
<<<<<<< ours
o1
=======
t1
>>>>>>> theirs
k2
<<<<<<< ours
o2
=======
t2
>>>>>>> theirs
";
        let regions = scan_conflicts(text).unwrap();
        assert_eq!(regions.len(), 2);
        assert_eq!((regions[0].start_line, regions[0].end_line), (2, 6));
        assert_eq!((regions[1].start_line, regions[1].end_line), (8, 12));
    }
}
