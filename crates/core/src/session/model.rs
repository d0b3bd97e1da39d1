//! The session trait and its close-confirmation vocabulary.
//!
//! [`MergeSession`] is the capability surface hosts drive: dirty state,
//! save/revert/accept/discard, and the close-confirmation flow. Two
//! implementations exist, selected by the factory at construction time --
//! [`crate::session::ScratchSession`] and
//! [`crate::session::WorkspaceSession`].

use std::fmt;
use std::sync::Arc;

use async_trait::async_trait;
use tokio::sync::{broadcast, watch};

use crate::errors::SessionError;
use crate::merge::MergeModel;

use super::input_data::SessionArgs;

/// Outcome of a close confirmation.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CloseDecision {
    /// Proceed with the close, saving/accepting as needed.
    Save,
    /// Proceed with the close, dropping unsaved changes.
    Discard,
    /// Abort the close.
    Cancel,
}

impl fmt::Display for CloseDecision {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            CloseDecision::Save => f.write_str("save"),
            CloseDecision::Discard => f.write_str("discard"),
            CloseDecision::Cancel => f.write_str("cancel"),
        }
    }
}

/// Lifecycle events a session emits towards its host.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SessionEvent {
    /// The session asks the host to close all editors bound to its result.
    CloseRequested,
}

/// One in-progress three-way merge editing session.
#[async_trait]
pub trait MergeSession: Send + Sync {
    /// The merge computation context owned by this session.
    fn merge_model(&self) -> &Arc<MergeModel>;

    fn is_dirty(&self) -> bool;

    /// Derived dirty flag. The receiver has already seen the current value,
    /// so only subsequent flips wake it.
    fn dirty_changes(&self) -> watch::Receiver<bool>;

    /// Host-facing lifecycle events.
    fn events(&self) -> broadcast::Receiver<SessionEvent>;

    async fn save(&self) -> Result<(), SessionError>;

    async fn revert(&self) -> Result<(), SessionError>;

    /// Writes the composed merge result through to the target.
    async fn accept(&self) -> Result<(), SessionError>;

    /// Drops unsaved changes and resets to the last persisted state. Close
    /// confirmation uses this for "Don't Save".
    async fn discard(&self) -> Result<(), SessionError>;

    fn should_confirm_close(&self) -> bool;

    /// Confirms closing `sessions` (a set normally including this one) and
    /// carries out the chosen batch operation.
    async fn confirm_close(
        &self,
        sessions: &[Arc<dyn MergeSession>],
    ) -> Result<CloseDecision, SessionError>;
}

/// Builds sessions from [`SessionArgs`].
#[async_trait]
pub trait SessionFactory: Send + Sync {
    async fn create(&self, args: &SessionArgs) -> Result<Arc<dyn MergeSession>, SessionError>;
}
