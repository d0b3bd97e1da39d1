//! Workspace-mode sessions.
//!
//! The merge is composed directly in the real target document. The host's
//! file tracking already knows the file, so the session delegates to its
//! tracked record: dirty state mirrors the record's dirty/save-error signal,
//! save and accept persist the record, revert reloads it, and close
//! confirmation is a pass-through to the host's own machinery.

use std::sync::Arc;

use async_trait::async_trait;
use tokio::sync::{broadcast, watch};
use tokio::task::JoinHandle;
use tracing::{debug, info};
use uuid::Uuid;

use crate::doc::{DocUri, DocumentProvider};
use crate::errors::SessionError;
use crate::files::{FileService, TrackedFile};
use crate::merge::{
    ConflictStyle, LineDiffProvider, MergeLabels, MergeModel, MergeModelOptions,
    ProjectedDiffProvider,
};

use super::input_data::{resolve_inputs, ResolvedInputs, ResolvedSide, SessionArgs};
use super::model::{CloseDecision, MergeSession, SessionEvent, SessionFactory};

const EVENT_CHANNEL_CAPACITY: usize = 16;

// ---------------------------------------------------------------------------
// Factory
// ---------------------------------------------------------------------------

/// Builds [`WorkspaceSession`]s.
pub struct WorkspaceSessionFactory {
    documents: Arc<dyn DocumentProvider>,
    files: Arc<dyn FileService>,
    labels: MergeLabels,
    conflict_style: ConflictStyle,
}

impl WorkspaceSessionFactory {
    pub fn new(
        documents: Arc<dyn DocumentProvider>,
        files: Arc<dyn FileService>,
        labels: MergeLabels,
        conflict_style: ConflictStyle,
    ) -> Self {
        Self {
            documents,
            files,
            labels,
            conflict_style,
        }
    }
}

/// Finds the tracked record for `uri` without ever waiting.
///
/// Subscribing happens before the registry check, so a record tracked
/// between the two cannot be lost; pending notifications are drained
/// afterwards to catch a record announced but not yet visible to `lookup`.
/// A record that is simply absent is a caller precondition violation.
fn find_tracked_record(
    files: &Arc<dyn FileService>,
    uri: &DocUri,
) -> Result<Arc<dyn TrackedFile>, SessionError> {
    let mut pending = files.subscribe_tracked();

    if let Some(record) = files.lookup(uri) {
        return Ok(record);
    }

    loop {
        match pending.try_recv() {
            Ok(record) if record.uri() == uri => return Ok(record),
            Ok(_) => continue,
            Err(broadcast::error::TryRecvError::Lagged(_)) => {
                // Missed announcements are still visible in the registry.
                if let Some(record) = files.lookup(uri) {
                    return Ok(record);
                }
            }
            Err(_) => break,
        }
    }

    Err(SessionError::TrackedFileMissing {
        uri: uri.to_string(),
    })
}

#[async_trait]
impl SessionFactory for WorkspaceSessionFactory {
    /// Builds a workspace session:
    ///
    /// 1. Resolves base, ours, theirs, and result concurrently; any failure
    ///    releases the handles already acquired.
    /// 2. Locates the tracked record for the result path, failing with an
    ///    invariant error if the host never tracked it.
    /// 3. Initializes the merge model over the result document as-is
    ///    (no seeding; the file's current content is the working state).
    async fn create(&self, args: &SessionArgs) -> Result<Arc<dyn MergeSession>, SessionError> {
        let inputs = resolve_inputs(&self.documents, args).await?;

        let record = find_tracked_record(&self.files, &args.result)?;

        let model = MergeModel::initialize(
            Arc::clone(inputs.base.document()),
            Arc::clone(inputs.ours.document()),
            Arc::clone(inputs.theirs.document()),
            Arc::clone(inputs.result.document()),
            MergeModelOptions {
                reset_result: false,
                labels: self.labels.clone(),
                conflict_style: self.conflict_style,
            },
            Arc::new(LineDiffProvider),
            Arc::new(ProjectedDiffProvider::new()),
        )
        .await?;

        Ok(WorkspaceSession::spawn(model, record, inputs))
    }
}

// ---------------------------------------------------------------------------
// Session
// ---------------------------------------------------------------------------

/// A merge session editing the target file through its tracked record.
pub struct WorkspaceSession {
    id: Uuid,
    model: Arc<MergeModel>,
    record: Arc<dyn TrackedFile>,
    inputs: ResolvedInputs,
    dirty_tx: watch::Sender<bool>,
    events_tx: broadcast::Sender<SessionEvent>,
    dirty_watcher: JoinHandle<()>,
}

impl WorkspaceSession {
    fn spawn(
        model: Arc<MergeModel>,
        record: Arc<dyn TrackedFile>,
        inputs: ResolvedInputs,
    ) -> Arc<Self> {
        let id = Uuid::new_v4();
        let mut state_rx = record.state();
        let (dirty_tx, _) = watch::channel(state_rx.borrow().is_unsaved());
        let (events_tx, _) = broadcast::channel(EVENT_CHANNEL_CAPACITY);

        let tx = dirty_tx.clone();
        let dirty_watcher = tokio::spawn(async move {
            while state_rx.changed().await.is_ok() {
                let dirty = state_rx.borrow_and_update().is_unsaved();
                tx.send_if_modified(|d| {
                    if *d != dirty {
                        *d = dirty;
                        true
                    } else {
                        false
                    }
                });
            }
        });

        info!(session = %id, result = %record.uri(), "workspace session started");

        Arc::new(Self {
            id,
            model,
            record,
            inputs,
            dirty_tx,
            events_tx,
            dirty_watcher,
        })
    }

    pub fn id(&self) -> Uuid {
        self.id
    }

    /// The tracked record this session delegates to.
    pub fn record(&self) -> &Arc<dyn TrackedFile> {
        &self.record
    }

    /// Presentation metadata for the incoming sides.
    pub fn sides(&self) -> (&ResolvedSide, &ResolvedSide) {
        (&self.inputs.ours, &self.inputs.theirs)
    }
}

impl Drop for WorkspaceSession {
    fn drop(&mut self) {
        self.dirty_watcher.abort();
        debug!(session = %self.id, "workspace session dropped");
    }
}

#[async_trait]
impl MergeSession for WorkspaceSession {
    fn merge_model(&self) -> &Arc<MergeModel> {
        &self.model
    }

    /// Mirrors the tracked record exactly; no independent version tracking.
    fn is_dirty(&self) -> bool {
        self.record.state().borrow().is_unsaved()
    }

    fn dirty_changes(&self) -> watch::Receiver<bool> {
        self.dirty_tx.subscribe()
    }

    fn events(&self) -> broadcast::Receiver<SessionEvent> {
        self.events_tx.subscribe()
    }

    async fn accept(&self) -> Result<(), SessionError> {
        self.record.save().await?;
        info!(session = %self.id, uri = %self.record.uri(), "workspace result saved");
        Ok(())
    }

    async fn save(&self) -> Result<(), SessionError> {
        self.record.save().await?;
        Ok(())
    }

    async fn revert(&self) -> Result<(), SessionError> {
        self.record.revert().await?;
        Ok(())
    }

    async fn discard(&self) -> Result<(), SessionError> {
        self.record.revert().await?;
        Ok(())
    }

    /// Always false: the host's own dirty tracking and save prompts cover
    /// workspace files.
    fn should_confirm_close(&self) -> bool {
        false
    }

    /// Pass-through: the host-level mechanism decides, never this session.
    async fn confirm_close(
        &self,
        _sessions: &[Arc<dyn MergeSession>],
    ) -> Result<CloseDecision, SessionError> {
        Ok(CloseDecision::Save)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::doc::Document;
    use crate::files::LocalFileService;

    #[tokio::test]
    async fn test_find_tracked_record_hits_registry() {
        let dir = tempfile::tempdir().unwrap();
        let uri = DocUri::file(dir.path().join("r.txt").to_string_lossy().to_string());
        let service = Arc::new(LocalFileService::new());
        service
            .track(Document::with_detected_language(uri.clone(), "x"))
            .unwrap();

        let files: Arc<dyn FileService> = service;
        let record = find_tracked_record(&files, &uri).unwrap();
        assert_eq!(record.uri(), &uri);
    }

    #[tokio::test]
    async fn test_find_tracked_record_missing_fails_without_waiting() {
        let files: Arc<dyn FileService> = Arc::new(LocalFileService::new());
        let err = match find_tracked_record(&files, &DocUri::file("/never/tracked.rs")) {
            Ok(_) => panic!("lookup must fail for an untracked uri"),
            Err(e) => e,
        };
        assert!(matches!(err, SessionError::TrackedFileMissing { .. }));
    }
}
