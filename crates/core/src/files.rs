//! File persistence and tracking.
//!
//! [`FileService`] is the seam sessions use to persist and restore documents
//! and to find the host's tracked-file records. [`TrackedFile`] is one such
//! record: it carries the file's dirty/save-error state and its own
//! save/revert operations. [`LocalFileService`] implements both over the
//! local filesystem.

use std::collections::HashMap;
use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use tokio::sync::{broadcast, watch};
use tokio::task::JoinHandle;
use tracing::{debug, info};

use crate::doc::{DocUri, Document, VersionId};
use crate::errors::FileError;

// ---------------------------------------------------------------------------
// Traits
// ---------------------------------------------------------------------------

/// Dirty/save-error state of one tracked file.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct FileState {
    pub dirty: bool,
    pub save_failed: bool,
}

impl FileState {
    /// Changes not safely on disk: dirty, or a save attempt failed.
    pub fn is_unsaved(&self) -> bool {
        self.dirty || self.save_failed
    }
}

/// A live record for a file open in the host's file tracking.
#[async_trait]
pub trait TrackedFile: Send + Sync {
    fn uri(&self) -> &DocUri;

    fn document(&self) -> &Arc<Document>;

    /// The record's state channel. The receiver has already seen the
    /// current value.
    fn state(&self) -> watch::Receiver<FileState>;

    async fn save(&self) -> Result<(), FileError>;

    /// Reloads the file from disk, discarding unsaved changes.
    async fn revert(&self) -> Result<(), FileError>;
}

/// Persistence and tracked-file registry.
#[async_trait]
pub trait FileService: Send + Sync {
    /// Writes the document's current text to its backing file.
    async fn persist(&self, document: &Document) -> Result<(), FileError>;

    /// Reloads the document's text from its backing file, discarding
    /// unsaved content.
    async fn restore(&self, document: &Document) -> Result<(), FileError>;

    /// The tracked record for `uri`, if the host has one.
    fn lookup(&self, uri: &DocUri) -> Option<Arc<dyn TrackedFile>>;

    /// Notification stream of records as they become tracked.
    fn subscribe_tracked(&self) -> broadcast::Receiver<Arc<dyn TrackedFile>>;
}

// ---------------------------------------------------------------------------
// Local implementation
// ---------------------------------------------------------------------------

const TRACKED_CHANNEL_CAPACITY: usize = 16;

/// Filesystem-backed [`FileService`].
pub struct LocalFileService {
    tracked: Mutex<HashMap<DocUri, Arc<LocalTrackedFile>>>,
    tracked_tx: broadcast::Sender<Arc<dyn TrackedFile>>,
}

impl LocalFileService {
    pub fn new() -> Self {
        let (tracked_tx, _) = broadcast::channel(TRACKED_CHANNEL_CAPACITY);
        Self {
            tracked: Mutex::new(HashMap::new()),
            tracked_tx,
        }
    }

    /// Registers `document` as a tracked file and announces it on the
    /// tracked stream. Re-tracking a uri returns the existing record.
    pub fn track(&self, document: Arc<Document>) -> Result<Arc<dyn TrackedFile>, FileError> {
        if !document.uri().is_file() {
            return Err(FileError::NotPersistable(document.uri().to_string()));
        }

        let record = {
            let mut tracked = self.tracked.lock().unwrap_or_else(|e| e.into_inner());
            if let Some(existing) = tracked.get(document.uri()) {
                return Ok(existing.clone());
            }
            let record = LocalTrackedFile::spawn(document);
            tracked.insert(record.uri().clone(), record.clone());
            record
        };

        info!(uri = %record.uri(), "file tracked");
        let _ = self.tracked_tx.send(record.clone());
        Ok(record)
    }

    fn tracked_record(&self, uri: &DocUri) -> Option<Arc<LocalTrackedFile>> {
        let tracked = self.tracked.lock().unwrap_or_else(|e| e.into_inner());
        tracked.get(uri).cloned()
    }
}

impl Default for LocalFileService {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl FileService for LocalFileService {
    async fn persist(&self, document: &Document) -> Result<(), FileError> {
        let uri = document.uri();
        if !uri.is_file() {
            return Err(FileError::NotPersistable(uri.to_string()));
        }

        let text = document.text();
        tokio::fs::write(uri.path(), text.as_bytes())
            .await
            .map_err(|e| FileError::SaveFailed {
                path: uri.path().to_string(),
                detail: e.to_string(),
            })?;
        debug!(uri = %uri, bytes = text.len(), "document persisted");

        if let Some(record) = self.tracked_record(uri) {
            record.mark_saved();
        }
        Ok(())
    }

    async fn restore(&self, document: &Document) -> Result<(), FileError> {
        let uri = document.uri();
        if !uri.is_file() {
            return Err(FileError::NotPersistable(uri.to_string()));
        }

        let text = tokio::fs::read_to_string(uri.path())
            .await
            .map_err(|e| FileError::RevertFailed {
                path: uri.path().to_string(),
                detail: e.to_string(),
            })?;
        document.set_text(text);
        debug!(uri = %uri, "document restored from disk");

        if let Some(record) = self.tracked_record(uri) {
            record.mark_saved();
        }
        Ok(())
    }

    fn lookup(&self, uri: &DocUri) -> Option<Arc<dyn TrackedFile>> {
        self.tracked_record(uri).map(|r| r as Arc<dyn TrackedFile>)
    }

    fn subscribe_tracked(&self) -> broadcast::Receiver<Arc<dyn TrackedFile>> {
        self.tracked_tx.subscribe()
    }
}

// ---------------------------------------------------------------------------
// Local tracked records
// ---------------------------------------------------------------------------

struct LocalTrackedFile {
    document: Arc<Document>,
    saved_version: Arc<Mutex<VersionId>>,
    state_tx: watch::Sender<FileState>,
    watcher: JoinHandle<()>,
}

impl LocalTrackedFile {
    fn spawn(document: Arc<Document>) -> Arc<Self> {
        let saved_version = Arc::new(Mutex::new(document.version()));
        let (state_tx, _) = watch::channel(FileState::default());

        // Keeps `dirty` equal to "document version moved past the saved
        // version". The saved-version lock is taken while computing so
        // save/revert updates are never interleaved with a stale read.
        let mut doc_rx = document.subscribe();
        let saved = Arc::clone(&saved_version);
        let tx = state_tx.clone();
        let watcher = tokio::spawn(async move {
            while doc_rx.changed().await.is_ok() {
                let version = doc_rx.borrow_and_update().version;
                let dirty = {
                    let saved = saved.lock().unwrap_or_else(|e| e.into_inner());
                    version != *saved
                };
                tx.send_if_modified(|s| {
                    if s.dirty != dirty {
                        s.dirty = dirty;
                        true
                    } else {
                        false
                    }
                });
            }
        });

        Arc::new(Self {
            document,
            saved_version,
            state_tx,
            watcher,
        })
    }

    /// Records the document's current version as saved and clears both
    /// state flags accordingly.
    fn mark_saved(&self) {
        let version = {
            let mut saved = self
                .saved_version
                .lock()
                .unwrap_or_else(|e| e.into_inner());
            *saved = self.document.version();
            *saved
        };
        let dirty = self.document.version() != version;
        self.state_tx.send_if_modified(|s| {
            let changed = s.dirty != dirty || s.save_failed;
            s.dirty = dirty;
            s.save_failed = false;
            changed
        });
    }

    fn mark_save_failed(&self) {
        self.state_tx.send_if_modified(|s| {
            if s.save_failed {
                false
            } else {
                s.save_failed = true;
                true
            }
        });
    }
}

impl Drop for LocalTrackedFile {
    fn drop(&mut self) {
        self.watcher.abort();
    }
}

#[async_trait]
impl TrackedFile for LocalTrackedFile {
    fn uri(&self) -> &DocUri {
        self.document.uri()
    }

    fn document(&self) -> &Arc<Document> {
        &self.document
    }

    fn state(&self) -> watch::Receiver<FileState> {
        self.state_tx.subscribe()
    }

    async fn save(&self) -> Result<(), FileError> {
        let uri = self.document.uri();
        let text = self.document.text();
        match tokio::fs::write(uri.path(), text.as_bytes()).await {
            Ok(()) => {
                self.mark_saved();
                info!(uri = %uri, "tracked file saved");
                Ok(())
            }
            Err(e) => {
                self.mark_save_failed();
                Err(FileError::SaveFailed {
                    path: uri.path().to_string(),
                    detail: e.to_string(),
                })
            }
        }
    }

    async fn revert(&self) -> Result<(), FileError> {
        let uri = self.document.uri();
        let text = tokio::fs::read_to_string(uri.path())
            .await
            .map_err(|e| FileError::RevertFailed {
                path: uri.path().to_string(),
                detail: e.to_string(),
            })?;

        {
            let mut saved = self
                .saved_version
                .lock()
                .unwrap_or_else(|e| e.into_inner());
            *saved = self.document.set_text(text);
        }
        self.state_tx.send_modify(|s| {
            s.dirty = false;
            s.save_failed = false;
        });
        info!(uri = %uri, "tracked file reverted");
        Ok(())
    }
}
