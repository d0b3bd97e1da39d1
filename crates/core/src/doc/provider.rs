//! Document resolution: reference-counted handles over live documents.
//!
//! A [`DocumentProvider`] turns a [`DocUri`] into a live [`DocumentHandle`].
//! Handles release their reference when dropped; the concrete
//! [`DocumentStore`] evicts a document once its last handle is gone.

use std::collections::HashMap;
use std::fmt;
use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use tracing::debug;

use crate::errors::DocumentError;

use super::document::Document;
use super::uri::DocUri;

// ---------------------------------------------------------------------------
// Provider trait and handles
// ---------------------------------------------------------------------------

/// Resolves content identifiers into live document handles.
#[async_trait]
pub trait DocumentProvider: Send + Sync {
    /// Resolves `uri` into a reference-counted handle.
    ///
    /// A resolution future dropped before completion must not leave the
    /// reference count raised; implementations take the reference only when
    /// returning a handle.
    async fn resolve(&self, uri: &DocUri) -> Result<DocumentHandle, DocumentError>;
}

/// A reference-counted lease on a live document. Dropping the handle
/// releases the reference.
pub struct DocumentHandle {
    document: Arc<Document>,
    release: Option<Box<dyn FnOnce() + Send + Sync>>,
}

impl DocumentHandle {
    pub fn new(document: Arc<Document>, release: impl FnOnce() + Send + Sync + 'static) -> Self {
        Self {
            document,
            release: Some(Box::new(release)),
        }
    }

    pub fn document(&self) -> &Arc<Document> {
        &self.document
    }
}

impl Drop for DocumentHandle {
    fn drop(&mut self) {
        if let Some(release) = self.release.take() {
            release();
        }
    }
}

impl fmt::Debug for DocumentHandle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("DocumentHandle")
            .field("uri", self.document.uri())
            .finish()
    }
}

// ---------------------------------------------------------------------------
// In-memory store
// ---------------------------------------------------------------------------

struct StoreEntry {
    document: Arc<Document>,
    refs: usize,
}

/// The default provider: an in-memory registry with lazy disk loading for
/// `file` uris. Scratch uris resolve only if previously opened.
#[derive(Clone)]
pub struct DocumentStore {
    entries: Arc<Mutex<HashMap<DocUri, StoreEntry>>>,
}

impl DocumentStore {
    pub fn new() -> Self {
        Self {
            entries: Arc::new(Mutex::new(HashMap::new())),
        }
    }

    /// Registers an in-memory document under `uri` and returns the host's
    /// own handle to it. Re-opening an already-open uri replaces its text.
    pub fn open(&self, uri: DocUri, text: impl Into<String>) -> DocumentHandle {
        let mut entries = self.entries.lock().unwrap_or_else(|e| e.into_inner());
        let entry = entries.entry(uri.clone()).or_insert_with(|| StoreEntry {
            document: Document::with_detected_language(uri.clone(), String::new()),
            refs: 0,
        });
        entry.document.set_text(text);
        entry.refs += 1;
        let document = Arc::clone(&entry.document);
        drop(entries);
        self.handle(uri, document)
    }

    /// Number of live references to `uri`, if it is in the registry.
    pub fn ref_count(&self, uri: &DocUri) -> Option<usize> {
        let entries = self.entries.lock().unwrap_or_else(|e| e.into_inner());
        entries.get(uri).map(|e| e.refs)
    }

    fn handle(&self, uri: DocUri, document: Arc<Document>) -> DocumentHandle {
        let entries = Arc::clone(&self.entries);
        DocumentHandle::new(document, move || release(&entries, &uri))
    }

    fn try_acquire(&self, uri: &DocUri) -> Option<DocumentHandle> {
        let mut entries = self.entries.lock().unwrap_or_else(|e| e.into_inner());
        let entry = entries.get_mut(uri)?;
        entry.refs += 1;
        let document = Arc::clone(&entry.document);
        drop(entries);
        Some(self.handle(uri.clone(), document))
    }

    /// Inserts freshly-loaded text unless another resolution won the race,
    /// in which case the existing document is shared and `text` discarded.
    fn acquire_or_insert(&self, uri: &DocUri, text: String) -> DocumentHandle {
        let mut entries = self.entries.lock().unwrap_or_else(|e| e.into_inner());
        let entry = entries.entry(uri.clone()).or_insert_with(|| StoreEntry {
            document: Document::with_detected_language(uri.clone(), text),
            refs: 0,
        });
        entry.refs += 1;
        let document = Arc::clone(&entry.document);
        drop(entries);
        self.handle(uri.clone(), document)
    }
}

impl Default for DocumentStore {
    fn default() -> Self {
        Self::new()
    }
}

fn release(entries: &Mutex<HashMap<DocUri, StoreEntry>>, uri: &DocUri) {
    let mut entries = entries.lock().unwrap_or_else(|e| e.into_inner());
    let Some(entry) = entries.get_mut(uri) else {
        return;
    };
    entry.refs = entry.refs.saturating_sub(1);
    if entry.refs == 0 {
        entries.remove(uri);
        debug!(uri = %uri, "document evicted");
    }
}

#[async_trait]
impl DocumentProvider for DocumentStore {
    async fn resolve(&self, uri: &DocUri) -> Result<DocumentHandle, DocumentError> {
        if let Some(handle) = self.try_acquire(uri) {
            return Ok(handle);
        }
        if !uri.is_file() {
            return Err(DocumentError::NotFound(uri.to_string()));
        }

        let text = tokio::fs::read_to_string(uri.path()).await.map_err(|e| {
            if e.kind() == std::io::ErrorKind::NotFound {
                DocumentError::NotFound(uri.to_string())
            } else {
                DocumentError::IoError(e)
            }
        })?;
        debug!(uri = %uri, bytes = text.len(), "document loaded from disk");
        Ok(self.acquire_or_insert(uri, text))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    #[tokio::test]
    async fn test_open_then_resolve_shares_one_document() {
        let store = DocumentStore::new();
        let uri = DocUri::file("/virtual/a.rs");
        let opened = store.open(uri.clone(), "fn main() {}");

        let resolved = store.resolve(&uri).await.unwrap();
        assert!(Arc::ptr_eq(opened.document(), resolved.document()));
        assert_eq!(store.ref_count(&uri), Some(2));
    }

    #[tokio::test]
    async fn test_release_evicts_at_zero_references() {
        let store = DocumentStore::new();
        let uri = DocUri::file("/virtual/b.rs");
        let first = store.open(uri.clone(), "x");
        let second = store.resolve(&uri).await.unwrap();

        drop(first);
        assert_eq!(store.ref_count(&uri), Some(1), "one handle still live");
        drop(second);
        assert_eq!(store.ref_count(&uri), None, "entry evicted at zero refs");
    }

    #[tokio::test]
    async fn test_resolve_unopened_scratch_fails() {
        let store = DocumentStore::new();
        let scratch = DocUri::scratch_of(&DocUri::file("/virtual/c.rs"));
        let err = store.resolve(&scratch).await.unwrap_err();
        assert!(matches!(err, DocumentError::NotFound(_)));
    }

    #[tokio::test]
    async fn test_resolve_loads_file_from_disk() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("input.md");
        let mut f = std::fs::File::create(&path).unwrap();
        writeln!(f, "# hello").unwrap();

        let store = DocumentStore::new();
        let uri = DocUri::file(path.to_string_lossy().to_string());
        let handle = store.resolve(&uri).await.unwrap();
        assert_eq!(&*handle.document().text(), "# hello\n");
        assert_eq!(handle.document().language().as_str(), "markdown");
    }

    #[tokio::test]
    async fn test_resolve_missing_file_reports_not_found() {
        let store = DocumentStore::new();
        let uri = DocUri::file("/definitely/not/here.txt");
        let err = store.resolve(&uri).await.unwrap_err();
        assert!(matches!(err, DocumentError::NotFound(_)));
    }
}
