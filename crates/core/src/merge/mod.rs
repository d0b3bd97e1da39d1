//! Merge computation: line diffs, three-way seeding, and conflict tracking.
//!
//! The merge subsystem is responsible for:
//! 1. **Diffing** -- changed line regions between texts, raw and projected.
//! 2. **Seeding** -- three-way merge output for scratch result documents.
//! 3. **Conflicts** -- scanning, resolving, and observing conflict regions.

pub mod diff;
pub mod model;

pub use diff::{DiffProvider, DiffRegion, LineDiffProvider, LineRange, ProjectedDiffProvider};
pub use model::{
    ConflictRegion, ConflictStyle, MergeLabels, MergeModel, MergeModelOptions, MergeSide,
    Resolution, SideChanges,
};
