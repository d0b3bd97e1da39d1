//! Interactive merge sessions.

use std::process::ExitCode;
use std::sync::Arc;

use anyhow::{Context, Result};
use comfy_table::{presets::UTF8_FULL, Cell, ContentArrangement, Table};
use dialoguer::theme::ColorfulTheme;
use dialoguer::{Editor, Select};
use tracing::debug;

use mergedesk_core::backups::BackupStore;
use mergedesk_core::config::AppConfig;
use mergedesk_core::dialog::DialogService;
use mergedesk_core::doc::{DocUri, DocumentProvider, DocumentStore};
use mergedesk_core::files::{FileService, LocalFileService};
use mergedesk_core::merge::{ConflictRegion, MergeLabels, MergeSide, Resolution, SideChanges};
use mergedesk_core::session::{
    CloseDecision, MergeSession, ScratchSessionFactory, SessionArgs, SessionEvent,
    SessionFactory, SessionHandle, SideDescriptor, WorkspaceSessionFactory,
};

use crate::dialogs::TerminalDialogs;
use crate::style;

pub struct MergeOpts {
    pub base: String,
    pub ours: String,
    pub theirs: String,
    pub output: String,
    pub in_place: bool,
    pub ours_label: Option<String>,
    pub theirs_label: Option<String>,
}

pub async fn run(config: &AppConfig, opts: MergeOpts) -> Result<ExitCode> {
    let labels = MergeLabels {
        ours: opts
            .ours_label
            .clone()
            .unwrap_or_else(|| config.merge.ours_label.clone()),
        theirs: opts
            .theirs_label
            .clone()
            .unwrap_or_else(|| config.merge.theirs_label.clone()),
    };

    let args = SessionArgs {
        base: DocUri::parse(&opts.base)?,
        ours: SideDescriptor::new(DocUri::parse(&opts.ours)?).with_title(labels.ours.clone()),
        theirs: SideDescriptor::new(DocUri::parse(&opts.theirs)?).with_title(labels.theirs.clone()),
        result: DocUri::parse(&opts.output)?,
    };

    debug!(base = %args.base, result = %args.result, in_place = opts.in_place, "starting merge session");

    let documents = Arc::new(DocumentStore::new());
    let files = Arc::new(LocalFileService::new());
    let dialogs: Arc<dyn DialogService> = Arc::new(TerminalDialogs);

    // In-place mode requires the target to be open and tracked before the
    // factory runs; the handle stays alive for the whole session.
    let mut _target_handle = None;
    let factory: Arc<dyn SessionFactory> = if opts.in_place {
        let handle = documents
            .resolve(&args.result)
            .await
            .context("failed to open target file")?;
        files
            .track(Arc::clone(handle.document()))
            .context("failed to track target file")?;
        _target_handle = Some(handle);
        Arc::new(WorkspaceSessionFactory::new(
            Arc::clone(&documents) as Arc<dyn DocumentProvider>,
            Arc::clone(&files) as Arc<dyn FileService>,
            labels.clone(),
            config.merge.conflict_style(),
        ))
    } else {
        Arc::new(ScratchSessionFactory::new(
            Arc::clone(&documents) as Arc<dyn DocumentProvider>,
            Arc::clone(&files) as Arc<dyn FileService>,
            Arc::clone(&dialogs),
            labels.clone(),
            config.merge.conflict_style(),
        ))
    };

    let handle = SessionHandle::new(factory, args.clone());
    let session = handle
        .resolve()
        .await
        .context("failed to start merge session")?;

    print_summary(&labels, &session);
    resolve_conflicts_interactively(&session, &labels)?;
    finish(config, &args, &session).await
}

// ---------------------------------------------------------------------------
// Interactive resolution
// ---------------------------------------------------------------------------

fn resolve_conflicts_interactively(
    session: &Arc<dyn MergeSession>,
    labels: &MergeLabels,
) -> Result<()> {
    loop {
        let conflicts = session
            .merge_model()
            .conflicts()
            .context("result document has malformed conflict markers")?;
        if conflicts.is_empty() {
            println!();
            println!("{}", style::success("No conflicts remaining"));
            return Ok(());
        }

        print_conflict_table(&conflicts, labels);

        let mut items: Vec<String> = conflicts
            .iter()
            .enumerate()
            .map(|(i, c)| format!("Conflict {} (lines {}-{})", i + 1, c.start_line, c.end_line))
            .collect();
        items.push("Finish (keep remaining conflicts)".to_string());

        let pick = Select::with_theme(&ColorfulTheme::default())
            .with_prompt("Resolve which conflict?")
            .items(&items)
            .default(0)
            .interact_opt()?;
        let Some(pick) = pick else {
            return Ok(());
        };
        if pick == conflicts.len() {
            return Ok(());
        }

        resolve_one(session, labels, &conflicts[pick], pick)?;
    }
}

fn resolve_one(
    session: &Arc<dyn MergeSession>,
    labels: &MergeLabels,
    region: &ConflictRegion,
    index: usize,
) -> Result<()> {
    println!();
    println!("{}", style::ours(&labels.ours));
    for line in &region.ours {
        println!("  {line}");
    }
    println!("{}", style::theirs(&labels.theirs));
    for line in &region.theirs {
        println!("  {line}");
    }

    let actions = [
        format!("Use {}", labels.ours),
        format!("Use {}", labels.theirs),
        "Use both".to_string(),
        "Edit".to_string(),
        "Skip".to_string(),
    ];
    let choice = Select::with_theme(&ColorfulTheme::default())
        .items(&actions)
        .default(0)
        .interact_opt()?;

    let model = session.merge_model();
    match choice {
        Some(0) => model.resolve(index, Resolution::Ours)?,
        Some(1) => model.resolve(index, Resolution::Theirs)?,
        Some(2) => model.resolve(index, Resolution::Both)?,
        Some(3) => {
            let mut initial = region.ours.join("\n");
            if !region.theirs.is_empty() {
                initial.push('\n');
                initial.push_str(&region.theirs.join("\n"));
            }
            if let Some(text) = Editor::new().edit(&initial)? {
                model.resolve(index, Resolution::Custom(text))?;
            }
        }
        _ => {}
    }
    Ok(())
}

// ---------------------------------------------------------------------------
// Close flow
// ---------------------------------------------------------------------------

async fn finish(
    config: &AppConfig,
    args: &SessionArgs,
    session: &Arc<dyn MergeSession>,
) -> Result<ExitCode> {
    if !session.should_confirm_close() {
        // Workspace mode: the host-level machinery is this CLI itself, and
        // the user already chose to merge in place.
        session.save().await.context("failed to save merge result")?;
        println!();
        println!(
            "{}",
            style::success(&format!("Merge result saved to {}", args.result.path()))
        );
        return Ok(ExitCode::SUCCESS);
    }

    // Scratch mode: offer to accept; save() emits a close request once the
    // user confirms.
    let mut events = session.events();
    session.save().await?;
    if matches!(events.try_recv(), Ok(SessionEvent::CloseRequested)) {
        println!();
        println!(
            "{}",
            style::success(&format!("Merge result written to {}", args.result.path()))
        );
        return Ok(ExitCode::SUCCESS);
    }

    // Declined: run the close confirmation. Capture the scratch state first
    // so a discard can still be backed up.
    let was_dirty = session.is_dirty();
    let scratch_text = session.merge_model().result_text();
    let sessions = vec![Arc::clone(session)];
    match session.confirm_close(&sessions).await? {
        CloseDecision::Save => {
            println!();
            if was_dirty {
                println!(
                    "{}",
                    style::success(&format!("Merge result written to {}", args.result.path()))
                );
            } else {
                println!("{}", style::dim("Session closed, nothing to save"));
            }
            Ok(ExitCode::SUCCESS)
        }
        CloseDecision::Discard => {
            println!();
            println!("{}", style::warn("Merge result discarded"));
            if was_dirty {
                write_backup(config, &args.result, &scratch_text).await?;
            }
            Ok(ExitCode::SUCCESS)
        }
        CloseDecision::Cancel => {
            println!();
            println!("{}", style::warn("Merge aborted, target file untouched"));
            if was_dirty {
                write_backup(config, &args.result, &scratch_text).await?;
            }
            Ok(ExitCode::FAILURE)
        }
    }
}

async fn write_backup(config: &AppConfig, target: &DocUri, text: &str) -> Result<()> {
    let root = match &config.storage.merges_dir {
        Some(dir) => dir.clone(),
        None => BackupStore::default_root()?,
    };
    let entry = BackupStore::new(root)
        .save(target, text)
        .await
        .context("failed to write scratch backup")?;
    println!(
        "{}",
        style::dim(&format!("Scratch state backed up to {}", entry.path.display()))
    );
    Ok(())
}

// ---------------------------------------------------------------------------
// Rendering
// ---------------------------------------------------------------------------

fn print_summary(labels: &MergeLabels, session: &Arc<dyn MergeSession>) {
    let model = session.merge_model();
    println!();
    println!("{}", style::header("Merge session"));
    println!(
        "  {}: {}",
        style::ours(&labels.ours),
        describe_changes(model.changes(MergeSide::Ours))
    );
    println!(
        "  {}: {}",
        style::theirs(&labels.theirs),
        describe_changes(model.changes(MergeSide::Theirs))
    );
}

fn describe_changes(changes: &SideChanges) -> String {
    if changes.is_unchanged() {
        "no changes".to_string()
    } else if changes.formatting_only() {
        format!("{} changed regions (formatting only)", changes.regions.len())
    } else {
        format!("{} changed regions", changes.regions.len())
    }
}

fn print_conflict_table(conflicts: &[ConflictRegion], labels: &MergeLabels) {
    println!();
    println!(
        "{}",
        style::header(&format!("Unresolved conflicts ({})", conflicts.len()))
    );

    let mut table = Table::new();
    table.load_preset(UTF8_FULL);
    table.set_content_arrangement(ContentArrangement::Dynamic);
    table.set_header(vec![
        "#",
        "Lines",
        labels.ours.as_str(),
        labels.theirs.as_str(),
    ]);

    for (i, c) in conflicts.iter().enumerate() {
        table.add_row(vec![
            Cell::new(i + 1),
            Cell::new(format!("{}-{}", c.start_line, c.end_line)),
            Cell::new(preview(&c.ours)),
            Cell::new(preview(&c.theirs)),
        ]);
    }

    println!("{table}");
}

fn preview(lines: &[String]) -> String {
    match lines.first() {
        None => "(empty)".to_string(),
        Some(first) if lines.len() == 1 => first.clone(),
        Some(first) => format!("{} … (+{} lines)", first, lines.len() - 1),
    }
}
