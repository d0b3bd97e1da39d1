//! The scratch backup store.
//!
//! A [`BackupStore`] gives every merge target a deterministic location under
//! a user-data `merges` directory, so the scratch state of a discarded or
//! abandoned session survives process restarts. The location is derived from
//! a one-way hash of the target path; a JSON sidecar next to each backup
//! records where it came from and when it was written.

use std::path::{Path, PathBuf};

use chrono::{DateTime, Duration, Utc};
use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};
use tracing::{debug, info, warn};

use crate::doc::DocUri;
use crate::errors::BackupError;

/// Length of the hex digest prefix used as the backup file stem.
const STEM_LEN: usize = 16;

const SIDECAR_SUFFIX: &str = ".meta.json";

/// One saved scratch snapshot.
#[derive(Debug, Clone)]
pub struct BackupEntry {
    /// The merge target this backup shadows.
    pub target: String,
    pub saved_at: DateTime<Utc>,
    /// The backup's content file.
    pub path: PathBuf,
}

#[derive(Debug, Serialize, Deserialize)]
struct Sidecar {
    target: String,
    saved_at: DateTime<Utc>,
}

/// Persists scratch snapshots under deterministic per-target paths.
pub struct BackupStore {
    root: PathBuf,
}

impl BackupStore {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    /// The platform default root: `<user data dir>/mergedesk/merges`.
    pub fn default_root() -> Result<PathBuf, BackupError> {
        let data = dirs::data_dir().ok_or(BackupError::NoDataDir)?;
        Ok(data.join("mergedesk").join("merges"))
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    /// The deterministic backup location for `target`: the first 16 hex
    /// characters of the SHA-256 of the target path, with the target's
    /// extension preserved so editors keep their language detection.
    pub fn backup_path(&self, target: &DocUri) -> PathBuf {
        let digest = Sha256::digest(target.path().as_bytes());
        let stem = &hex::encode(digest)[..STEM_LEN];
        let name = match target.extension() {
            Some(ext) => format!("{stem}.{ext}"),
            None => stem.to_string(),
        };
        self.root.join(name)
    }

    fn sidecar_path(&self, backup: &Path) -> PathBuf {
        let stem = backup
            .file_stem()
            .and_then(|s| s.to_str())
            .unwrap_or_default();
        self.root.join(format!("{stem}{SIDECAR_SUFFIX}"))
    }

    /// Writes `text` as the backup for `target`, replacing any previous
    /// backup of the same target.
    pub async fn save(&self, target: &DocUri, text: &str) -> Result<BackupEntry, BackupError> {
        tokio::fs::create_dir_all(&self.root).await?;

        let path = self.backup_path(target);
        tokio::fs::write(&path, text.as_bytes()).await?;

        let sidecar = Sidecar {
            target: target.path().to_string(),
            saved_at: Utc::now(),
        };
        let json = serde_json::to_string_pretty(&sidecar)
            .map_err(|e| BackupError::ParseError {
                path: path.display().to_string(),
                detail: e.to_string(),
            })?;
        tokio::fs::write(self.sidecar_path(&path), json).await?;

        info!(target = %target, path = %path.display(), "scratch backup saved");
        Ok(BackupEntry {
            target: sidecar.target,
            saved_at: sidecar.saved_at,
            path,
        })
    }

    /// Reads the backup content for `target`, if one exists.
    pub async fn load(&self, target: &DocUri) -> Result<Option<String>, BackupError> {
        let path = self.backup_path(target);
        match tokio::fs::read_to_string(&path).await {
            Ok(text) => Ok(Some(text)),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(None),
            Err(e) => Err(e.into()),
        }
    }

    /// All backups, newest first. Sidecars that fail to parse are skipped
    /// with a warning rather than failing the whole listing.
    pub async fn list(&self) -> Result<Vec<BackupEntry>, BackupError> {
        let mut entries = Vec::new();
        let mut dir = match tokio::fs::read_dir(&self.root).await {
            Ok(dir) => dir,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(entries),
            Err(e) => return Err(e.into()),
        };

        while let Some(item) = dir.next_entry().await? {
            let sidecar_path = item.path();
            let Some(name) = sidecar_path.file_name().and_then(|n| n.to_str()) else {
                continue;
            };
            let Some(stem) = name.strip_suffix(SIDECAR_SUFFIX) else {
                continue;
            };

            let json = tokio::fs::read_to_string(&sidecar_path).await?;
            let sidecar: Sidecar = match serde_json::from_str(&json) {
                Ok(sidecar) => sidecar,
                Err(e) => {
                    warn!(path = %sidecar_path.display(), error = %e, "skipping unreadable backup sidecar");
                    continue;
                }
            };

            let path = self.content_path_for_stem(stem, &sidecar.target);
            entries.push(BackupEntry {
                target: sidecar.target,
                saved_at: sidecar.saved_at,
                path,
            });
        }

        entries.sort_by(|a, b| b.saved_at.cmp(&a.saved_at));
        Ok(entries)
    }

    /// Removes backups older than `max_age`. Returns how many were removed.
    pub async fn prune(&self, max_age: Duration) -> Result<usize, BackupError> {
        let cutoff = Utc::now() - max_age;
        let mut removed = 0;

        for entry in self.list().await? {
            if entry.saved_at >= cutoff {
                continue;
            }
            if let Err(e) = tokio::fs::remove_file(&entry.path).await {
                if e.kind() != std::io::ErrorKind::NotFound {
                    return Err(e.into());
                }
            }
            tokio::fs::remove_file(self.sidecar_path(&entry.path)).await?;
            debug!(target = %entry.target, "pruned backup");
            removed += 1;
        }

        if removed > 0 {
            info!(removed, "backup prune complete");
        }
        Ok(removed)
    }

    /// Reconstructs the content path for a sidecar stem: the stem plus the
    /// target's extension, matching what `backup_path` produced.
    fn content_path_for_stem(&self, stem: &str, target: &str) -> PathBuf {
        let name = match Path::new(target).extension().and_then(|e| e.to_str()) {
            Some(ext) => format!("{stem}.{ext}"),
            None => stem.to_string(),
        };
        self.root.join(name)
    }
}
