//! Line diff providers.
//!
//! [`LineDiffProvider`] reports changed line regions between two texts by
//! walking `diffy` patch hunks. [`ProjectedDiffProvider`] runs the same diff
//! over a whitespace-normalized projection of both texts and remaps the
//! resulting regions back to original line numbers, so reformat-only edits
//! produce no regions.

use diffy::Line;

// ---------------------------------------------------------------------------
// Regions
// ---------------------------------------------------------------------------

/// A half-open 1-based line range. `start == end` means an empty range
/// anchored before `start`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct LineRange {
    pub start: usize,
    pub end: usize,
}

impl LineRange {
    pub fn new(start: usize, end: usize) -> Self {
        Self { start, end }
    }

    pub fn empty_at(line: usize) -> Self {
        Self { start: line, end: line }
    }

    pub fn len(&self) -> usize {
        self.end.saturating_sub(self.start)
    }

    pub fn is_empty(&self) -> bool {
        self.end <= self.start
    }
}

/// One changed region: the original lines it replaces and the modified lines
/// replacing them. Either side may be empty (pure insertion or deletion).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DiffRegion {
    pub original: LineRange,
    pub modified: LineRange,
}

/// Computes changed line regions between an original and a modified text.
pub trait DiffProvider: Send + Sync {
    fn compute(&self, original: &str, modified: &str) -> Vec<DiffRegion>;
}

// ---------------------------------------------------------------------------
// Raw line diff
// ---------------------------------------------------------------------------

/// Plain line-level diff over the verbatim texts.
pub struct LineDiffProvider;

impl DiffProvider for LineDiffProvider {
    fn compute(&self, original: &str, modified: &str) -> Vec<DiffRegion> {
        let patch = diffy::create_patch(original, modified);
        let mut regions = Vec::new();

        for hunk in patch.hunks() {
            // An empty side (no lines at all) yields a 0-start range in
            // unified-diff convention; everything here is 1-based.
            let mut old_line = hunk.old_range().start().max(1);
            let mut new_line = hunk.new_range().start().max(1);
            // (original start, modified start) of the run being built
            let mut open: Option<(usize, usize)> = None;

            for line in hunk.lines() {
                match line {
                    Line::Context(_) => {
                        if let Some((o, m)) = open.take() {
                            regions.push(DiffRegion {
                                original: LineRange::new(o, old_line),
                                modified: LineRange::new(m, new_line),
                            });
                        }
                        old_line += 1;
                        new_line += 1;
                    }
                    Line::Delete(_) => {
                        open.get_or_insert((old_line, new_line));
                        old_line += 1;
                    }
                    Line::Insert(_) => {
                        open.get_or_insert((old_line, new_line));
                        new_line += 1;
                    }
                }
            }
            if let Some((o, m)) = open {
                regions.push(DiffRegion {
                    original: LineRange::new(o, old_line),
                    modified: LineRange::new(m, new_line),
                });
            }
        }

        regions
    }
}

// ---------------------------------------------------------------------------
// Projected diff
// ---------------------------------------------------------------------------

/// Diffs whitespace-normalized projections of both texts and remaps regions
/// to original line numbers. Blank lines are dropped from the projection,
/// other lines are trimmed and internal whitespace runs collapsed.
pub struct ProjectedDiffProvider {
    inner: LineDiffProvider,
}

impl ProjectedDiffProvider {
    pub fn new() -> Self {
        Self {
            inner: LineDiffProvider,
        }
    }
}

impl Default for ProjectedDiffProvider {
    fn default() -> Self {
        Self::new()
    }
}

/// Projection output: the normalized text plus, for each projected line, the
/// 1-based original line number it came from.
fn project(text: &str) -> (String, Vec<usize>) {
    let mut out = String::new();
    let mut map = Vec::new();
    for (idx, line) in text.lines().enumerate() {
        let normalized = normalize_line(line);
        if normalized.is_empty() {
            continue;
        }
        out.push_str(&normalized);
        out.push('\n');
        map.push(idx + 1);
    }
    (out, map)
}

fn normalize_line(line: &str) -> String {
    let mut out = String::with_capacity(line.len());
    let mut in_gap = false;
    for c in line.trim().chars() {
        if c.is_whitespace() {
            in_gap = true;
        } else {
            if in_gap && !out.is_empty() {
                out.push(' ');
            }
            in_gap = false;
            out.push(c);
        }
    }
    out
}

/// Maps a projected-line range back to original line numbers. An empty range
/// stays empty, anchored at the original position of its projected anchor.
fn remap(range: LineRange, map: &[usize], original_lines: usize) -> LineRange {
    let anchor = |projected: usize| -> usize {
        if projected == 0 {
            1
        } else if projected - 1 < map.len() {
            map[projected - 1]
        } else {
            original_lines + 1
        }
    };

    if range.is_empty() {
        LineRange::empty_at(anchor(range.start))
    } else {
        let start = anchor(range.start);
        let end = map[range.end - 2] + 1;
        LineRange::new(start, end)
    }
}

impl DiffProvider for ProjectedDiffProvider {
    fn compute(&self, original: &str, modified: &str) -> Vec<DiffRegion> {
        let (orig_projected, orig_map) = project(original);
        let (mod_projected, mod_map) = project(modified);
        let orig_lines = original.lines().count();
        let mod_lines = modified.lines().count();

        self.inner
            .compute(&orig_projected, &mod_projected)
            .into_iter()
            .map(|r| DiffRegion {
                original: remap(r.original, &orig_map, orig_lines),
                modified: remap(r.modified, &mod_map, mod_lines),
            })
            .collect()
    }
}
