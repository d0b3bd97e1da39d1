//! The editor-input wrapper around a session.
//!
//! A [`SessionHandle`] is what a host embeds: it holds the factory and the
//! arguments, constructs the session lazily on first [`SessionHandle::resolve`],
//! and forwards the session's dirty flips and lifecycle events on one
//! [`SessionChange`] stream. The forwarders subscribe only after construction
//! completes, so the baseline dirty value never produces an event.

use std::sync::Arc;

use tokio::sync::{broadcast, Mutex, OnceCell};
use tokio::task::JoinHandle;
use tracing::debug;

use crate::errors::SessionError;

use super::input_data::SessionArgs;
use super::model::{CloseDecision, MergeSession, SessionEvent, SessionFactory};

const CHANGE_CHANNEL_CAPACITY: usize = 32;

/// Changes a resolved session reports towards the host.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SessionChange {
    /// The session's dirty flag flipped to the carried value.
    DirtyChanged(bool),
    /// The session asks the host to close all editors bound to its result.
    CloseRequested,
}

/// Lazily-resolved host-side handle on one merge session.
pub struct SessionHandle {
    factory: Arc<dyn SessionFactory>,
    args: SessionArgs,
    session: OnceCell<Arc<dyn MergeSession>>,
    changes_tx: broadcast::Sender<SessionChange>,
    forwarders: Mutex<Vec<JoinHandle<()>>>,
}

impl SessionHandle {
    pub fn new(factory: Arc<dyn SessionFactory>, args: SessionArgs) -> Self {
        let (changes_tx, _) = broadcast::channel(CHANGE_CHANNEL_CAPACITY);
        Self {
            factory,
            args,
            session: OnceCell::new(),
            changes_tx,
            forwarders: Mutex::new(Vec::new()),
        }
    }

    pub fn args(&self) -> &SessionArgs {
        &self.args
    }

    /// Constructs the session on first call and caches it; later calls
    /// return the cached instance. A failed construction caches nothing, so
    /// the next call retries.
    pub async fn resolve(&self) -> Result<Arc<dyn MergeSession>, SessionError> {
        let session = self
            .session
            .get_or_try_init(|| async {
                let session = self.factory.create(&self.args).await?;
                self.start_forwarders(&session).await;
                Ok::<_, SessionError>(session)
            })
            .await?;
        Ok(Arc::clone(session))
    }

    /// The resolved session, if `resolve` has succeeded.
    pub fn session(&self) -> Option<&Arc<dyn MergeSession>> {
        self.session.get()
    }

    /// Subscribes to session changes. Events only flow once the session is
    /// resolved; the baseline dirty value is never reported.
    pub fn changes(&self) -> broadcast::Receiver<SessionChange> {
        self.changes_tx.subscribe()
    }

    /// False until the session is resolved.
    pub fn is_dirty(&self) -> bool {
        self.session.get().is_some_and(|s| s.is_dirty())
    }

    pub async fn save(&self) -> Result<(), SessionError> {
        self.resolve().await?.save().await
    }

    pub async fn revert(&self) -> Result<(), SessionError> {
        self.resolve().await?.revert().await
    }

    pub fn should_confirm_close(&self) -> bool {
        self.session
            .get()
            .is_some_and(|s| s.should_confirm_close())
    }

    pub async fn confirm_close(
        &self,
        sessions: &[Arc<dyn MergeSession>],
    ) -> Result<CloseDecision, SessionError> {
        self.resolve().await?.confirm_close(sessions).await
    }

    /// Spawns the dirty and event forwarders. Called exactly once, after the
    /// session exists, so the fresh watch receiver has already seen the
    /// current dirty value and only subsequent flips are forwarded.
    async fn start_forwarders(&self, session: &Arc<dyn MergeSession>) {
        let mut dirty_rx = session.dirty_changes();
        let tx = self.changes_tx.clone();
        let dirty_forwarder = tokio::spawn(async move {
            while dirty_rx.changed().await.is_ok() {
                let dirty = *dirty_rx.borrow_and_update();
                let _ = tx.send(SessionChange::DirtyChanged(dirty));
            }
        });

        let mut events_rx = session.events();
        let tx = self.changes_tx.clone();
        let event_forwarder = tokio::spawn(async move {
            loop {
                match events_rx.recv().await {
                    Ok(SessionEvent::CloseRequested) => {
                        let _ = tx.send(SessionChange::CloseRequested);
                    }
                    Err(broadcast::error::RecvError::Lagged(_)) => continue,
                    Err(broadcast::error::RecvError::Closed) => break,
                }
            }
        });

        let mut forwarders = self.forwarders.lock().await;
        forwarders.push(dirty_forwarder);
        forwarders.push(event_forwarder);
        debug!("session handle forwarders started");
    }
}

impl Drop for SessionHandle {
    fn drop(&mut self) {
        // get_mut needs no lock: drop has exclusive access.
        for task in self.forwarders.get_mut().drain(..) {
            task.abort();
        }
    }
}
