//! Documents and document resolution.
//!
//! The document subsystem provides:
//! 1. **Identity** -- scheme-qualified uris separating real files from scratch documents.
//! 2. **Content** -- live text documents with version stamps and change notifications.
//! 3. **Resolution** -- reference-counted handles acquired through a provider.

pub mod document;
pub mod provider;
pub mod uri;

pub use document::{Document, LanguageId, Snapshot, VersionId};
pub use provider::{DocumentHandle, DocumentProvider, DocumentStore};
pub use uri::{DocUri, SCHEME_FILE, SCHEME_SCRATCH};
