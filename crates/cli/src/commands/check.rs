//! Non-interactive conflict probe.

use std::process::ExitCode;
use std::sync::Arc;

use anyhow::{Context, Result};
use tracing::debug;

use mergedesk_core::config::AppConfig;
use mergedesk_core::doc::{DocUri, Document, DocumentProvider, DocumentStore};
use mergedesk_core::merge::{
    LineDiffProvider, MergeModel, MergeModelOptions, MergeSide, ProjectedDiffProvider,
    SideChanges,
};

use crate::style;

pub async fn run(config: &AppConfig, base: &str, ours: &str, theirs: &str) -> Result<ExitCode> {
    let store = DocumentStore::new();
    let base_uri = DocUri::parse(base)?;
    let ours_uri = DocUri::parse(ours)?;
    let theirs_uri = DocUri::parse(theirs)?;

    debug!(base = %base_uri, ours = %ours_uri, theirs = %theirs_uri, "running merge check");

    let (base_doc, ours_doc, theirs_doc) = tokio::try_join!(
        store.resolve(&base_uri),
        store.resolve(&ours_uri),
        store.resolve(&theirs_uri),
    )
    .context("failed to resolve input documents")?;

    // The probe seeds into a throwaway scratch document; nothing is written.
    let scratch = Document::new(
        DocUri::scratch_of(&base_uri),
        "",
        base_doc.document().language(),
    );
    let model = MergeModel::initialize(
        Arc::clone(base_doc.document()),
        Arc::clone(ours_doc.document()),
        Arc::clone(theirs_doc.document()),
        scratch,
        MergeModelOptions {
            reset_result: true,
            labels: config.merge.labels(),
            conflict_style: config.merge.conflict_style(),
        },
        Arc::new(LineDiffProvider),
        Arc::new(ProjectedDiffProvider::new()),
    )
    .await?;

    let labels = config.merge.labels();
    println!(
        "{}: {}",
        style::ours(&labels.ours),
        describe(model.changes(MergeSide::Ours))
    );
    println!(
        "{}: {}",
        style::theirs(&labels.theirs),
        describe(model.changes(MergeSide::Theirs))
    );

    if model.has_unresolved_conflicts() {
        let count = model.conflicts()?.len();
        println!(
            "{}",
            style::error(&format!(
                "Merge has {count} conflict{}",
                if count == 1 { "" } else { "s" }
            ))
        );
        Ok(ExitCode::from(1))
    } else {
        println!("{}", style::success("Merge is clean"));
        Ok(ExitCode::SUCCESS)
    }
}

fn describe(changes: &SideChanges) -> String {
    if changes.is_unchanged() {
        "no changes".to_string()
    } else if changes.formatting_only() {
        format!(
            "{} changed region{} (formatting only)",
            changes.regions.len(),
            if changes.regions.len() == 1 { "" } else { "s" }
        )
    } else {
        format!(
            "{} changed region{}",
            changes.regions.len(),
            if changes.regions.len() == 1 { "" } else { "s" }
        )
    }
}
