//! Configuration file generation.

use std::path::PathBuf;
use std::process::ExitCode;

use anyhow::{bail, Context, Result};

use mergedesk_core::config::{sample_config, AppConfig};

use crate::style;

pub fn run(output: Option<PathBuf>, force: bool) -> Result<ExitCode> {
    let path = match output {
        Some(path) => path,
        None => AppConfig::default_path().context("no user config directory on this platform")?,
    };

    if path.exists() && !force {
        bail!(
            "config file already exists at {} (use --force to overwrite)",
            path.display()
        );
    }

    if let Some(parent) = path.parent() {
        std::fs::create_dir_all(parent)
            .with_context(|| format!("failed to create {}", parent.display()))?;
    }
    std::fs::write(&path, sample_config()).context("failed to write config file")?;

    println!(
        "{}",
        style::success(&format!("Wrote default config to {}", path.display()))
    );
    Ok(ExitCode::SUCCESS)
}
