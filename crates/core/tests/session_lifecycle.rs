//! End-to-end tests for merge session lifecycle.
//!
//! These tests exercise the real factories and sessions with:
//! - Real files in temp directories, resolved through `DocumentStore`
//! - A real `LocalFileService` for persistence and tracking
//! - Test doubles only at the user-facing seams: a scripted dialog service,
//!   and a handle-counting document provider for release accounting.

use std::collections::{HashMap, VecDeque};
use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use tempfile::TempDir;

use mergedesk_core::dialog::{DialogError, DialogRequest, DialogService};
use mergedesk_core::doc::{DocUri, Document, DocumentHandle, DocumentProvider, DocumentStore};
use mergedesk_core::errors::{DocumentError, SessionError};
use mergedesk_core::files::{FileService, LocalFileService};
use mergedesk_core::merge::{ConflictStyle, MergeLabels, Resolution};
use mergedesk_core::session::{
    CloseDecision, MergeSession, ScratchSessionFactory, SessionArgs, SessionChange,
    SessionEvent, SessionFactory, SessionHandle, WorkspaceSessionFactory,
};

// ===========================================================================
// Test doubles
// ===========================================================================

/// Dialog service that replays scripted choices and records every request.
struct ScriptedDialogs {
    responses: Mutex<VecDeque<usize>>,
    shown: Mutex<Vec<DialogRequest>>,
}

impl ScriptedDialogs {
    fn new(responses: impl IntoIterator<Item = usize>) -> Arc<Self> {
        Arc::new(Self {
            responses: Mutex::new(responses.into_iter().collect()),
            shown: Mutex::new(Vec::new()),
        })
    }

    fn shown_count(&self) -> usize {
        self.shown.lock().unwrap().len()
    }

    fn last_shown(&self) -> Option<DialogRequest> {
        self.shown.lock().unwrap().last().cloned()
    }
}

#[async_trait]
impl DialogService for ScriptedDialogs {
    async fn show(&self, request: DialogRequest) -> Result<usize, DialogError> {
        self.shown.lock().unwrap().push(request);
        self.responses
            .lock()
            .unwrap()
            .pop_front()
            .ok_or_else(|| DialogError::Backend("no scripted response left".into()))
    }
}

/// Document provider counting handle releases, with one optional failing uri.
struct CountingProvider {
    texts: HashMap<DocUri, String>,
    fail_on: Option<DocUri>,
    resolved: Arc<Mutex<Vec<DocUri>>>,
    released: Arc<Mutex<Vec<DocUri>>>,
}

impl CountingProvider {
    fn new(texts: impl IntoIterator<Item = (DocUri, &'static str)>, fail_on: Option<DocUri>) -> Self {
        Self {
            texts: texts
                .into_iter()
                .map(|(uri, text)| (uri, text.to_string()))
                .collect(),
            fail_on,
            resolved: Arc::new(Mutex::new(Vec::new())),
            released: Arc::new(Mutex::new(Vec::new())),
        }
    }
}

#[async_trait]
impl DocumentProvider for CountingProvider {
    async fn resolve(&self, uri: &DocUri) -> Result<DocumentHandle, DocumentError> {
        if self.fail_on.as_ref() == Some(uri) {
            return Err(DocumentError::NotFound(uri.to_string()));
        }
        let text = self
            .texts
            .get(uri)
            .ok_or_else(|| DocumentError::NotFound(uri.to_string()))?
            .clone();

        self.resolved.lock().unwrap().push(uri.clone());
        let document = Document::with_detected_language(uri.clone(), text);
        let released = Arc::clone(&self.released);
        let released_uri = uri.clone();
        Ok(DocumentHandle::new(document, move || {
            released.lock().unwrap().push(released_uri);
        }))
    }
}

// ===========================================================================
// Helpers
// ===========================================================================

fn write_file(dir: &TempDir, name: &str, text: &str) -> DocUri {
    let path = dir.path().join(name);
    std::fs::write(&path, text).unwrap();
    DocUri::file(path.to_string_lossy().to_string())
}

/// One scratch-mode setup over real temp files.
struct Scenario {
    _dir: TempDir,
    dialogs: Arc<ScriptedDialogs>,
    factory: Arc<dyn SessionFactory>,
    args: SessionArgs,
}

/// Builds a scratch factory over four files named with `prefix`. The base
/// text is also the initial result-file content.
fn scratch_scenario(
    base: &str,
    ours: &str,
    theirs: &str,
    responses: impl IntoIterator<Item = usize>,
) -> Scenario {
    let dir = tempfile::tempdir().unwrap();
    let args = SessionArgs::from_uris(
        write_file(&dir, "base.txt", base),
        write_file(&dir, "ours.txt", ours),
        write_file(&dir, "theirs.txt", theirs),
        write_file(&dir, "result.txt", base),
    );

    let documents: Arc<dyn DocumentProvider> = Arc::new(DocumentStore::new());
    let dialogs = ScriptedDialogs::new(responses);
    let factory = Arc::new(ScratchSessionFactory::new(
        documents,
        Arc::new(LocalFileService::new()),
        Arc::clone(&dialogs) as Arc<dyn DialogService>,
        MergeLabels::default(),
        ConflictStyle::Merge,
    ));

    Scenario {
        _dir: dir,
        dialogs,
        factory,
        args,
    }
}

const CONFLICTING: (&str, &str, &str) = ("a\nmid\nz\n", "a\nours line\nz\n", "a\ntheirs line\nz\n");

fn conflicting_scenario(responses: impl IntoIterator<Item = usize>) -> Scenario {
    scratch_scenario(CONFLICTING.0, CONFLICTING.1, CONFLICTING.2, responses)
}

// ===========================================================================
// Scratch session dirty lifecycle
// ===========================================================================

#[tokio::test]
async fn scratch_session_starts_clean_becomes_dirty_and_accept_cleans() {
    let scenario = conflicting_scenario([]);
    let session = scenario.factory.create(&scenario.args).await.unwrap();

    assert!(!session.is_dirty(), "fresh session must not be dirty");

    session.merge_model().resolve(0, Resolution::Ours).unwrap();
    assert!(session.is_dirty(), "edit must dirty the session");

    session.accept().await.unwrap();
    assert!(!session.is_dirty(), "accept must clear dirtiness");
}

#[tokio::test]
async fn scratch_dirty_watch_reports_each_flip() {
    let scenario = conflicting_scenario([]);
    let session = scenario.factory.create(&scenario.args).await.unwrap();

    let mut dirty = session.dirty_changes();
    assert!(!*dirty.borrow_and_update(), "baseline is clean");

    session.merge_model().result().set_text("edited\n");
    dirty.changed().await.unwrap();
    assert!(*dirty.borrow_and_update());

    session.accept().await.unwrap();
    dirty.changed().await.unwrap();
    assert!(!*dirty.borrow_and_update());
}

#[tokio::test]
async fn scratch_accept_after_finish_is_a_silent_noop() {
    let scenario = conflicting_scenario([]);
    let session = scenario.factory.create(&scenario.args).await.unwrap();
    session.merge_model().resolve(0, Resolution::Theirs).unwrap();
    session.accept().await.unwrap();

    let on_disk = std::fs::read_to_string(scenario.args.result.path()).unwrap();

    // Mutating after finish then calling accept again must not rewrite.
    session.merge_model().result().set_text("late edit\n");
    session.accept().await.unwrap();
    let after = std::fs::read_to_string(scenario.args.result.path()).unwrap();
    assert_eq!(after, on_disk, "second accept must not touch the file");
}

#[tokio::test]
async fn scratch_revert_is_a_noop() {
    let scenario = conflicting_scenario([]);
    let session = scenario.factory.create(&scenario.args).await.unwrap();
    session.merge_model().result().set_text("edited\n");

    session.revert().await.unwrap();
    assert!(session.is_dirty(), "revert must not change scratch state");
    assert_eq!(&*session.merge_model().result_text(), "edited\n");
}

// ===========================================================================
// Accept round-trip
// ===========================================================================

#[tokio::test]
async fn accept_writes_composed_text_to_result_file() {
    let scenario = conflicting_scenario([]);
    let session = scenario.factory.create(&scenario.args).await.unwrap();

    session
        .merge_model()
        .resolve(0, Resolution::Custom("hand merged".into()))
        .unwrap();
    let composed = session.merge_model().result_text();
    session.accept().await.unwrap();

    let on_disk = std::fs::read_to_string(scenario.args.result.path()).unwrap();
    assert_eq!(on_disk, &*composed);
    assert_eq!(on_disk, "a\nhand merged\nz\n");
}

// ===========================================================================
// Save flow (dialog-gated accept)
// ===========================================================================

#[tokio::test]
async fn save_confirmed_accepts_and_requests_close() {
    let scenario = conflicting_scenario([0]);
    let session = scenario.factory.create(&scenario.args).await.unwrap();
    session.merge_model().resolve(0, Resolution::Ours).unwrap();
    let mut events = session.events();

    session.save().await.unwrap();

    assert_eq!(scenario.dialogs.shown_count(), 1);
    assert!(!session.is_dirty(), "confirmed save accepts");
    let on_disk = std::fs::read_to_string(scenario.args.result.path()).unwrap();
    assert!(on_disk.contains("ours line"));

    assert_eq!(events.recv().await.unwrap(), SessionEvent::CloseRequested);
}

#[tokio::test]
async fn save_cancelled_changes_nothing() {
    let scenario = conflicting_scenario([1]);
    let session = scenario.factory.create(&scenario.args).await.unwrap();
    session.merge_model().resolve(0, Resolution::Ours).unwrap();

    session.save().await.unwrap();

    assert_eq!(scenario.dialogs.shown_count(), 1);
    assert!(session.is_dirty(), "cancelled save must not accept");
    let on_disk = std::fs::read_to_string(scenario.args.result.path()).unwrap();
    assert_eq!(on_disk, CONFLICTING.0, "result file untouched");
}

// ===========================================================================
// Close confirmation
// ===========================================================================

#[tokio::test]
async fn confirm_close_with_no_dirty_sessions_skips_the_dialog() {
    let scenario = conflicting_scenario([]);
    let first = scenario.factory.create(&scenario.args).await.unwrap();

    let other_scenario = conflicting_scenario([]);
    let second = other_scenario.factory.create(&other_scenario.args).await.unwrap();

    let sessions = vec![Arc::clone(&first), second];
    let decision = first.confirm_close(&sessions).await.unwrap();

    assert_eq!(decision, CloseDecision::Save);
    assert_eq!(scenario.dialogs.shown_count(), 0, "no dialog for clean close");
}

#[tokio::test]
async fn confirm_close_cancel_leaves_sessions_dirty() {
    let scenario = conflicting_scenario([2]);
    let session = scenario.factory.create(&scenario.args).await.unwrap();
    session.merge_model().result().set_text("dirty edit\n");

    let sessions = vec![Arc::clone(&session)];
    let decision = session.confirm_close(&sessions).await.unwrap();

    assert_eq!(decision, CloseDecision::Cancel);
    assert!(session.is_dirty(), "cancel must leave dirty state unchanged");
    assert_eq!(&*session.merge_model().result_text(), "dirty edit\n");
}

#[tokio::test]
async fn confirm_close_dont_save_discards_every_session() {
    let scenario = conflicting_scenario([1]);
    let first = scenario.factory.create(&scenario.args).await.unwrap();
    first.merge_model().result().set_text("first edit\n");

    let other_scenario = conflicting_scenario([]);
    let second = other_scenario.factory.create(&other_scenario.args).await.unwrap();
    second.merge_model().result().set_text("second edit\n");

    let sessions = vec![Arc::clone(&first), Arc::clone(&second)];
    let decision = first.confirm_close(&sessions).await.unwrap();

    assert_eq!(decision, CloseDecision::Discard);
    assert!(!first.is_dirty());
    assert!(!second.is_dirty());

    // Neither result file gained the unsaved edits.
    let first_disk = std::fs::read_to_string(scenario.args.result.path()).unwrap();
    let second_disk = std::fs::read_to_string(other_scenario.args.result.path()).unwrap();
    assert_eq!(first_disk, CONFLICTING.0);
    assert_eq!(second_disk, CONFLICTING.0);
}

#[tokio::test]
async fn confirm_close_save_accepts_every_session() {
    let scenario = conflicting_scenario([0]);
    let first = scenario.factory.create(&scenario.args).await.unwrap();
    first.merge_model().resolve(0, Resolution::Ours).unwrap();

    let other_scenario = conflicting_scenario([]);
    let second = other_scenario.factory.create(&other_scenario.args).await.unwrap();
    second.merge_model().resolve(0, Resolution::Theirs).unwrap();

    let sessions = vec![Arc::clone(&first), Arc::clone(&second)];
    let decision = first.confirm_close(&sessions).await.unwrap();

    assert_eq!(decision, CloseDecision::Save);
    let first_disk = std::fs::read_to_string(scenario.args.result.path()).unwrap();
    let second_disk = std::fs::read_to_string(other_scenario.args.result.path()).unwrap();
    assert!(first_disk.contains("ours line"));
    assert!(second_disk.contains("theirs line"));
}

#[tokio::test]
async fn confirm_close_dialog_text_reflects_count_and_conflicts() {
    let scenario = conflicting_scenario([2]);
    let session = scenario.factory.create(&scenario.args).await.unwrap();
    // Still conflicted (markers seeded) and now dirty on top.
    session.merge_model().result().set_text(format!(
        "{}extra\n",
        session.merge_model().result_text()
    ));
    assert!(session.merge_model().has_unresolved_conflicts());

    let sessions = vec![Arc::clone(&session)];
    session.confirm_close(&sessions).await.unwrap();

    let request = scenario.dialogs.last_shown().unwrap();
    assert_eq!(request.actions[0], "Save With Conflicts");
    assert!(request.message.contains("the merge result"));
}

#[tokio::test]
async fn confirm_close_flags_conflicts_from_clean_sessions_too() {
    // Dirty session with its conflict fully resolved.
    let scenario = conflicting_scenario([2]);
    let dirty = scenario.factory.create(&scenario.args).await.unwrap();
    dirty.merge_model().resolve(0, Resolution::Ours).unwrap();
    assert!(!dirty.merge_model().has_unresolved_conflicts());

    // Untouched session: not dirty, but its seeded markers are still there
    // and accept-all would write them to disk.
    let other_scenario = conflicting_scenario([]);
    let conflicted = other_scenario.factory.create(&other_scenario.args).await.unwrap();
    assert!(!conflicted.is_dirty());
    assert!(conflicted.merge_model().has_unresolved_conflicts());

    let sessions = vec![Arc::clone(&dirty), Arc::clone(&conflicted)];
    dirty.confirm_close(&sessions).await.unwrap();

    let request = scenario.dialogs.last_shown().unwrap();
    assert_eq!(request.actions[0], "Save With Conflicts");
}

// ===========================================================================
// Factory failure accounting
// ===========================================================================

#[tokio::test]
async fn failed_resolution_releases_every_acquired_handle() {
    let base = DocUri::file("/m/base.txt");
    let ours = DocUri::file("/m/ours.txt");
    let theirs = DocUri::file("/m/theirs.txt");
    let result = DocUri::file("/m/result.txt");

    let provider = CountingProvider::new(
        [
            (base.clone(), "base\n"),
            (ours.clone(), "ours\n"),
            (theirs.clone(), "theirs\n"),
        ],
        Some(result.clone()),
    );
    let resolved = Arc::clone(&provider.resolved);
    let released = Arc::clone(&provider.released);

    let factory = ScratchSessionFactory::new(
        Arc::new(provider),
        Arc::new(LocalFileService::new()),
        ScriptedDialogs::new([]),
        MergeLabels::default(),
        ConflictStyle::Merge,
    );

    let args = SessionArgs::from_uris(base, ours, theirs, result);
    let err = match factory.create(&args).await {
        Ok(_) => panic!("construction must fail when one resolution fails"),
        Err(e) => e,
    };
    assert!(matches!(err, SessionError::Resolution(_)));

    let mut resolved = resolved.lock().unwrap().clone();
    let mut released = released.lock().unwrap().clone();
    resolved.sort();
    released.sort();
    assert_eq!(
        resolved, released,
        "every successfully resolved handle must be released"
    );
}

// ===========================================================================
// Workspace sessions
// ===========================================================================

struct WorkspaceScenario {
    _dir: TempDir,
    _result_handle: DocumentHandle,
    files: Arc<LocalFileService>,
    factory: WorkspaceSessionFactory,
    args: SessionArgs,
    result_doc: Arc<Document>,
}

/// Workspace setup: the result file is opened in the shared document store
/// and tracked by the file service, as a host would have done.
fn workspace_scenario(track_result: bool) -> WorkspaceScenario {
    let dir = tempfile::tempdir().unwrap();
    let args = SessionArgs::from_uris(
        write_file(&dir, "base.txt", "a\nmid\nz\n"),
        write_file(&dir, "ours.txt", "a\nours line\nz\n"),
        write_file(&dir, "theirs.txt", "a\ntheirs line\nz\n"),
        write_file(&dir, "result.txt", "a\nworking state\nz\n"),
    );

    let store = DocumentStore::new();
    let files = Arc::new(LocalFileService::new());

    // The host opens the result file and hands the same document to file
    // tracking, so edits and dirty state are observed on one document.
    let result_handle = store.open(
        args.result.clone(),
        std::fs::read_to_string(args.result.path()).unwrap(),
    );
    let result_doc = Arc::clone(result_handle.document());
    if track_result {
        files.track(Arc::clone(&result_doc)).unwrap();
    }

    let factory = WorkspaceSessionFactory::new(
        Arc::new(store),
        Arc::clone(&files) as Arc<dyn FileService>,
        MergeLabels::default(),
        ConflictStyle::Merge,
    );

    WorkspaceScenario {
        _dir: dir,
        _result_handle: result_handle,
        files,
        factory,
        args,
        result_doc,
    }
}

#[tokio::test]
async fn workspace_dirty_mirrors_tracked_record() {
    let scenario = workspace_scenario(true);
    let session = scenario.factory.create(&scenario.args).await.unwrap();
    let record = scenario.files.lookup(&scenario.args.result).unwrap();

    assert!(!session.is_dirty());
    assert_eq!(session.is_dirty(), record.state().borrow().is_unsaved());

    let mut dirty = session.dirty_changes();
    scenario.result_doc.set_text("edited in workspace\n");
    dirty.changed().await.unwrap();
    assert!(session.is_dirty());
    assert_eq!(session.is_dirty(), record.state().borrow().is_unsaved());

    session.save().await.unwrap();
    assert!(!session.is_dirty());
    assert_eq!(session.is_dirty(), record.state().borrow().is_unsaved());
}

#[tokio::test]
async fn workspace_does_not_reseed_the_result_document() {
    let scenario = workspace_scenario(true);
    let session = scenario.factory.create(&scenario.args).await.unwrap();
    assert_eq!(
        &*session.merge_model().result_text(),
        "a\nworking state\nz\n",
        "workspace mode must keep the file's current content"
    );
}

#[tokio::test]
async fn workspace_accept_persists_and_revert_reloads() {
    let scenario = workspace_scenario(true);
    let session = scenario.factory.create(&scenario.args).await.unwrap();

    scenario.result_doc.set_text("saved through record\n");
    session.accept().await.unwrap();
    let on_disk = std::fs::read_to_string(scenario.args.result.path()).unwrap();
    assert_eq!(on_disk, "saved through record\n");

    scenario.result_doc.set_text("unsaved\n");
    session.revert().await.unwrap();
    assert_eq!(&*scenario.result_doc.text(), "saved through record\n");
}

#[tokio::test]
async fn workspace_close_confirmation_is_a_passthrough() {
    let scenario = workspace_scenario(true);
    let session = scenario.factory.create(&scenario.args).await.unwrap();

    assert!(!session.should_confirm_close());
    let sessions = vec![Arc::clone(&session)];
    assert_eq!(
        session.confirm_close(&sessions).await.unwrap(),
        CloseDecision::Save
    );
}

#[tokio::test]
async fn workspace_factory_without_tracked_record_fails_fast() {
    let scenario = workspace_scenario(false);
    let err = match scenario.factory.create(&scenario.args).await {
        Ok(_) => panic!("construction must fail without a tracked record"),
        Err(e) => e,
    };
    assert!(matches!(err, SessionError::TrackedFileMissing { .. }));
}

// ===========================================================================
// Session handle
// ===========================================================================

#[tokio::test]
async fn handle_resolves_lazily_and_caches() {
    let scenario = conflicting_scenario([]);
    let handle = SessionHandle::new(Arc::clone(&scenario.factory), scenario.args.clone());

    assert!(handle.session().is_none());
    assert!(!handle.is_dirty(), "unresolved handle reports clean");

    let first = handle.resolve().await.unwrap();
    let second = handle.resolve().await.unwrap();
    assert!(Arc::ptr_eq(&first, &second), "resolve must cache the session");
}

#[tokio::test]
async fn handle_retries_after_failed_construction() {
    let dir = tempfile::tempdir().unwrap();
    let missing = dir.path().join("base.txt");
    let args = SessionArgs::from_uris(
        DocUri::file(missing.to_string_lossy().to_string()),
        write_file(&dir, "ours.txt", "o\n"),
        write_file(&dir, "theirs.txt", "t\n"),
        write_file(&dir, "result.txt", "r\n"),
    );
    let factory: Arc<dyn SessionFactory> = Arc::new(ScratchSessionFactory::new(
        Arc::new(DocumentStore::new()),
        Arc::new(LocalFileService::new()),
        ScriptedDialogs::new([]),
        MergeLabels::default(),
        ConflictStyle::Merge,
    ));
    let handle = SessionHandle::new(factory, args);

    assert!(handle.resolve().await.is_err());
    assert!(handle.session().is_none(), "failure caches nothing");

    std::fs::write(&missing, "b\n").unwrap();
    assert!(handle.resolve().await.is_ok(), "next resolve retries");
}

#[tokio::test]
async fn handle_emits_no_baseline_event_and_one_per_flip() {
    let scenario = conflicting_scenario([]);
    let handle = SessionHandle::new(Arc::clone(&scenario.factory), scenario.args.clone());
    let mut changes = handle.changes();

    let session = handle.resolve().await.unwrap();
    // Give the forwarder a chance to emit a (wrong) baseline event.
    tokio::task::yield_now().await;
    assert!(
        matches!(changes.try_recv(), Err(tokio::sync::broadcast::error::TryRecvError::Empty)),
        "baseline must not produce an event"
    );

    session.merge_model().result().set_text("edit\n");
    assert_eq!(changes.recv().await.unwrap(), SessionChange::DirtyChanged(true));

    session.accept().await.unwrap();
    assert_eq!(changes.recv().await.unwrap(), SessionChange::DirtyChanged(false));
}

#[tokio::test]
async fn handle_forwards_close_requests() {
    let scenario = conflicting_scenario([0]);
    let handle = SessionHandle::new(Arc::clone(&scenario.factory), scenario.args.clone());
    let session = handle.resolve().await.unwrap();
    session.merge_model().resolve(0, Resolution::Ours).unwrap();

    let mut changes = handle.changes();
    handle.save().await.unwrap();

    // Dirty flips from accept and the close request interleave; order
    // between the two streams is not fixed.
    let mut saw_close = false;
    while let Ok(Ok(change)) =
        tokio::time::timeout(std::time::Duration::from_secs(2), changes.recv()).await
    {
        if change == SessionChange::CloseRequested {
            saw_close = true;
            break;
        }
    }
    assert!(saw_close, "save must forward the close request");
}
