//! Scratch-mode sessions.
//!
//! The merge is composed in an in-memory scratch document, decoupled from
//! the target file until explicitly accepted:
//! 1. The factory resolves all four documents concurrently and seeds a
//!    scratch document with the three-way merge.
//! 2. Edits land in the scratch document only; dirty means "the scratch
//!    version moved past the last save point".
//! 3. `accept()` writes the composed text into the real result document,
//!    persists it, and finishes the session. Nothing else ever touches the
//!    target file.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use async_trait::async_trait;
use futures::future::try_join_all;
use tokio::sync::{broadcast, watch};
use tokio::task::JoinHandle;
use tracing::{debug, info};
use uuid::Uuid;

use crate::dialog::{DialogRequest, DialogService, Severity};
use crate::doc::{DocUri, Document, DocumentProvider, VersionId};
use crate::errors::SessionError;
use crate::files::FileService;
use crate::merge::{
    ConflictStyle, LineDiffProvider, MergeLabels, MergeModel, MergeModelOptions,
    ProjectedDiffProvider,
};

use super::input_data::{resolve_inputs, ResolvedInputs, SessionArgs};
use super::model::{CloseDecision, MergeSession, SessionEvent, SessionFactory};

const EVENT_CHANNEL_CAPACITY: usize = 16;

// ---------------------------------------------------------------------------
// Factory
// ---------------------------------------------------------------------------

/// Builds [`ScratchSession`]s.
pub struct ScratchSessionFactory {
    documents: Arc<dyn DocumentProvider>,
    files: Arc<dyn FileService>,
    dialogs: Arc<dyn DialogService>,
    labels: MergeLabels,
    conflict_style: ConflictStyle,
}

impl ScratchSessionFactory {
    pub fn new(
        documents: Arc<dyn DocumentProvider>,
        files: Arc<dyn FileService>,
        dialogs: Arc<dyn DialogService>,
        labels: MergeLabels,
        conflict_style: ConflictStyle,
    ) -> Self {
        Self {
            documents,
            files,
            dialogs,
            labels,
            conflict_style,
        }
    }
}

#[async_trait]
impl SessionFactory for ScratchSessionFactory {
    /// Builds a scratch session:
    ///
    /// 1. Resolves base, ours, theirs, and result concurrently; any failure
    ///    releases the handles already acquired.
    /// 2. Creates an empty scratch document under the scratch scheme,
    ///    sharing the result document's language.
    /// 3. Initializes the merge model over the scratch document with
    ///    `reset_result`, so it is seeded with the three-way merge.
    /// 4. Wires the session, which owns every handle from here on.
    async fn create(&self, args: &SessionArgs) -> Result<Arc<dyn MergeSession>, SessionError> {
        let inputs = resolve_inputs(&self.documents, args).await?;

        let scratch = Document::new(
            DocUri::scratch_of(&args.result),
            "",
            inputs.result.document().language(),
        );

        let model = MergeModel::initialize(
            Arc::clone(inputs.base.document()),
            Arc::clone(inputs.ours.document()),
            Arc::clone(inputs.theirs.document()),
            Arc::clone(&scratch),
            MergeModelOptions {
                reset_result: true,
                labels: self.labels.clone(),
                conflict_style: self.conflict_style,
            },
            Arc::new(LineDiffProvider),
            Arc::new(ProjectedDiffProvider::new()),
        )
        .await?;

        Ok(ScratchSession::spawn(
            model,
            scratch,
            inputs,
            Arc::clone(&self.files),
            Arc::clone(&self.dialogs),
        ))
    }
}

// ---------------------------------------------------------------------------
// Session
// ---------------------------------------------------------------------------

/// A merge session editing an in-memory scratch document.
pub struct ScratchSession {
    id: Uuid,
    model: Arc<MergeModel>,
    scratch: Arc<Document>,
    inputs: ResolvedInputs,
    files: Arc<dyn FileService>,
    dialogs: Arc<dyn DialogService>,
    save_point_tx: watch::Sender<VersionId>,
    finished: AtomicBool,
    dirty_tx: watch::Sender<bool>,
    events_tx: broadcast::Sender<SessionEvent>,
    dirty_watcher: JoinHandle<()>,
}

impl ScratchSession {
    fn spawn(
        model: Arc<MergeModel>,
        scratch: Arc<Document>,
        inputs: ResolvedInputs,
        files: Arc<dyn FileService>,
        dialogs: Arc<dyn DialogService>,
    ) -> Arc<Self> {
        let id = Uuid::new_v4();
        // The save point starts at the post-seed version: a fresh session is
        // not dirty.
        let (save_point_tx, mut save_point_rx) = watch::channel(scratch.version());
        let (dirty_tx, _) = watch::channel(false);
        let (events_tx, _) = broadcast::channel(EVENT_CHANNEL_CAPACITY);

        let mut scratch_rx = scratch.subscribe();
        let tx = dirty_tx.clone();
        let dirty_watcher = tokio::spawn(async move {
            loop {
                tokio::select! {
                    changed = scratch_rx.changed() => {
                        if changed.is_err() {
                            break;
                        }
                    }
                    changed = save_point_rx.changed() => {
                        if changed.is_err() {
                            break;
                        }
                    }
                }
                let dirty =
                    scratch_rx.borrow_and_update().version != *save_point_rx.borrow_and_update();
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

        info!(session = %id, result = %inputs.result.document().uri(), "scratch session started");

        Arc::new(Self {
            id,
            model,
            scratch,
            inputs,
            files,
            dialogs,
            save_point_tx,
            finished: AtomicBool::new(false),
            dirty_tx,
            events_tx,
            dirty_watcher,
        })
    }

    pub fn id(&self) -> Uuid {
        self.id
    }

    pub fn is_finished(&self) -> bool {
        self.finished.load(Ordering::SeqCst)
    }
}

impl Drop for ScratchSession {
    fn drop(&mut self) {
        self.dirty_watcher.abort();
        debug!(session = %self.id, "scratch session dropped");
    }
}

#[async_trait]
impl MergeSession for ScratchSession {
    fn merge_model(&self) -> &Arc<MergeModel> {
        &self.model
    }

    fn is_dirty(&self) -> bool {
        self.scratch.version() != *self.save_point_tx.borrow()
    }

    fn dirty_changes(&self) -> watch::Receiver<bool> {
        self.dirty_tx.subscribe()
    }

    fn events(&self) -> broadcast::Receiver<SessionEvent> {
        self.events_tx.subscribe()
    }

    /// Writes the composed merge text into the real result document,
    /// persists it, records the save point, and finishes the session.
    /// Silently ignored once finished.
    async fn accept(&self) -> Result<(), SessionError> {
        if self.is_finished() {
            debug!(session = %self.id, "accept after finish ignored");
            return Ok(());
        }

        let text = self.model.result_text();
        let result_doc = self.inputs.result.document();
        result_doc.set_text(text.to_string());
        self.files.persist(result_doc).await?;

        self.save_point_tx.send_replace(self.scratch.version());
        self.finished.store(true, Ordering::SeqCst);
        info!(session = %self.id, uri = %result_doc.uri(), "merge result accepted");
        Ok(())
    }

    /// The scratch document is never itself persisted: `save` instead asks
    /// whether to accept the merge result, and on confirmation accepts and
    /// requests the close of editors bound to the result. No-op once
    /// finished; cancellation does nothing.
    async fn save(&self) -> Result<(), SessionError> {
        if self.is_finished() {
            debug!(session = %self.id, "save after finish ignored");
            return Ok(());
        }

        let request = DialogRequest::confirmation(
            Severity::Info,
            "Do you want to accept the merge result?",
            "Accept Merge",
        )
        .with_detail("This writes the merge result to the target file and closes the merge editor.");
        let cancel = request.cancel_index;

        let choice = self.dialogs.show(request).await?;
        if choice == cancel {
            debug!(session = %self.id, "save cancelled by user");
            return Ok(());
        }

        self.accept().await?;
        let _ = self.events_tx.send(SessionEvent::CloseRequested);
        Ok(())
    }

    /// Nothing to revert: the scratch document was never saved.
    async fn revert(&self) -> Result<(), SessionError> {
        debug!(session = %self.id, "revert ignored for scratch session");
        Ok(())
    }

    /// Restores the real result document from disk, resets the save point,
    /// and finishes the session.
    async fn discard(&self) -> Result<(), SessionError> {
        if self.is_finished() {
            debug!(session = %self.id, "discard after finish ignored");
            return Ok(());
        }

        self.files.restore(self.inputs.result.document()).await?;
        self.save_point_tx.send_replace(self.scratch.version());
        self.finished.store(true, Ordering::SeqCst);
        info!(session = %self.id, "scratch session discarded");
        Ok(())
    }

    /// Always true: closing a scratch session silently would lose its state.
    fn should_confirm_close(&self) -> bool {
        true
    }

    /// Resolves what to do with `sessions` being closed together.
    ///
    /// With no dirty session the close is a save-nothing pass-through and no
    /// dialog is shown. Otherwise a three-choice dialog decides: accept all,
    /// discard all (both dispatched concurrently across the whole set), or
    /// cancel the close.
    async fn confirm_close(
        &self,
        sessions: &[Arc<dyn MergeSession>],
    ) -> Result<CloseDecision, SessionError> {
        let dirty_count = sessions.iter().filter(|s| s.is_dirty()).count();
        if dirty_count == 0 {
            return Ok(CloseDecision::Save);
        }

        // Accept-all writes every session's result, so a clean-but-still-
        // conflicted session also puts markers on disk.
        let with_conflicts = sessions
            .iter()
            .any(|s| s.merge_model().has_unresolved_conflicts());
        let request = close_confirmation(dirty_count, with_conflicts);
        let choice = self.dialogs.show(request).await?;

        match choice {
            0 => {
                try_join_all(sessions.iter().map(|s| s.accept())).await?;
                info!(session = %self.id, count = sessions.len(), "close confirmed: accepted all");
                Ok(CloseDecision::Save)
            }
            1 => {
                try_join_all(sessions.iter().map(|s| s.discard())).await?;
                info!(session = %self.id, count = sessions.len(), "close confirmed: discarded all");
                Ok(CloseDecision::Discard)
            }
            _ => {
                debug!(session = %self.id, "close cancelled by user");
                Ok(CloseDecision::Cancel)
            }
        }
    }
}

/// The three-choice close dialog, pluralized by dirty-session count and
/// labelling "Save With Conflicts" when any session in the closing set still
/// has unresolved conflict regions.
fn close_confirmation(dirty_count: usize, with_conflicts: bool) -> DialogRequest {
    let message = if dirty_count == 1 {
        "Do you want to save the changes you made to the merge result?".to_string()
    } else {
        format!("Do you want to save the changes you made to {dirty_count} merge results?")
    };
    let save_label = if with_conflicts {
        "Save With Conflicts"
    } else {
        "Save"
    };
    DialogRequest {
        severity: Severity::Warning,
        message,
        actions: vec![
            save_label.to_string(),
            "Don't Save".to_string(),
            "Cancel".to_string(),
        ],
        cancel_index: 2,
        detail: Some("Your changes will be lost if you don't save them.".to_string()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_close_confirmation_singular_and_plural() {
        let one = close_confirmation(1, false);
        assert!(one.message.contains("the merge result"));
        assert_eq!(one.actions[0], "Save");
        assert_eq!(one.cancel_index, 2);

        let three = close_confirmation(3, false);
        assert!(three.message.contains("3 merge results"));
    }

    #[test]
    fn test_close_confirmation_flags_conflicts() {
        let req = close_confirmation(2, true);
        assert_eq!(req.actions[0], "Save With Conflicts");
        assert_eq!(req.actions[1], "Don't Save");
        assert_eq!(req.actions[2], "Cancel");
    }
}
