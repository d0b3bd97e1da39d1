//! Scratch backup management.

use std::process::ExitCode;

use anyhow::{Context, Result};
use chrono::Duration;
use comfy_table::{presets::UTF8_FULL, Cell, ContentArrangement, Table};

use mergedesk_core::backups::BackupStore;
use mergedesk_core::config::AppConfig;

use crate::style;

fn open_store(config: &AppConfig) -> Result<BackupStore> {
    let root = match &config.storage.merges_dir {
        Some(dir) => dir.clone(),
        None => BackupStore::default_root()?,
    };
    Ok(BackupStore::new(root))
}

pub async fn run_list(config: &AppConfig) -> Result<ExitCode> {
    let store = open_store(config)?;
    let entries = store.list().await.context("failed to list backups")?;

    if entries.is_empty() {
        println!();
        println!("{}", style::success("No scratch backups"));
        println!();
        return Ok(ExitCode::SUCCESS);
    }

    println!();
    println!(
        "{}",
        style::header(&format!("Scratch backups ({})", entries.len()))
    );
    println!();

    let mut table = Table::new();
    table.load_preset(UTF8_FULL);
    table.set_content_arrangement(ContentArrangement::Dynamic);
    table.set_header(vec!["Target", "Saved (UTC)", "Backup"]);

    for entry in &entries {
        table.add_row(vec![
            Cell::new(&entry.target),
            Cell::new(entry.saved_at.format("%Y-%m-%d %H:%M").to_string()),
            Cell::new(entry.path.display().to_string()),
        ]);
    }

    println!("{table}");
    println!();
    Ok(ExitCode::SUCCESS)
}

pub async fn run_prune(config: &AppConfig, days: Option<u32>) -> Result<ExitCode> {
    let store = open_store(config)?;
    let days = days.unwrap_or(config.storage.prune_after_days);
    let removed = store
        .prune(Duration::days(i64::from(days)))
        .await
        .context("failed to prune backups")?;

    if removed == 0 {
        println!("{}", style::dim(&format!("No backups older than {days} days")));
    } else {
        println!(
            "{}",
            style::success(&format!(
                "Removed {removed} backup{} older than {days} days",
                if removed == 1 { "" } else { "s" }
            ))
        );
    }
    Ok(ExitCode::SUCCESS)
}
