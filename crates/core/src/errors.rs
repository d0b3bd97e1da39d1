//! Error types for the MergeDesk core library.
//!
//! Each subsystem has its own error type derived with `thiserror`, and a
//! top-level [`CoreError`] enum unifies them all for callers that want a
//! single error type.

use thiserror::Error;

// ---------------------------------------------------------------------------
// Top-level error
// ---------------------------------------------------------------------------

/// Unified error type for the entire core library.
#[derive(Debug, Error)]
pub enum CoreError {
    #[error(transparent)]
    Document(#[from] DocumentError),

    #[error(transparent)]
    Merge(#[from] MergeError),

    #[error(transparent)]
    Session(#[from] SessionError),

    #[error(transparent)]
    File(#[from] FileError),

    #[error(transparent)]
    Dialog(#[from] DialogError),

    #[error(transparent)]
    Backup(#[from] BackupError),

    #[error(transparent)]
    Config(#[from] ConfigError),
}

// ---------------------------------------------------------------------------
// Document errors
// ---------------------------------------------------------------------------

/// Errors from document identifiers and document resolution.
#[derive(Debug, Error)]
pub enum DocumentError {
    /// The identifier could not be parsed.
    #[error("invalid document uri '{input}': {detail}")]
    InvalidUri {
        input: String,
        detail: String,
    },

    /// No document exists for the identifier and none can be loaded.
    #[error("document not found: {0}")]
    NotFound(String),

    /// Generic I/O error while loading document content.
    #[error("document I/O error: {0}")]
    IoError(#[from] std::io::Error),
}

// ---------------------------------------------------------------------------
// Merge model errors
// ---------------------------------------------------------------------------

/// Errors from the merge computation context.
#[derive(Debug, Error)]
pub enum MergeError {
    /// The requested conflict index does not exist (already resolved or
    /// out of range).
    #[error("conflict {0} not found")]
    ConflictNotFound(usize),

    /// The result document contains conflict markers that do not form
    /// complete blocks.
    #[error("malformed conflict markers at line {line}: {detail}")]
    MalformedMarkers {
        line: usize,
        detail: String,
    },
}

// ---------------------------------------------------------------------------
// Session errors
// ---------------------------------------------------------------------------

/// Errors from merge session construction and lifecycle operations.
#[derive(Debug, Error)]
pub enum SessionError {
    /// One of the four document resolutions failed during factory
    /// construction. Handles acquired before the failure are released.
    #[error("session document resolution failed: {0}")]
    Resolution(#[from] DocumentError),

    /// Workspace-mode construction found no tracked record for the result.
    /// A precondition violation by the caller, never retried.
    #[error("no tracked file record for '{uri}': the result document must be open in the host's file tracking before a workspace merge begins")]
    TrackedFileMissing {
        uri: String,
    },

    /// Underlying merge model error.
    #[error("session merge error: {0}")]
    Merge(#[from] MergeError),

    /// Underlying persistence error during accept/save/revert/discard.
    #[error("session file error: {0}")]
    File(#[from] FileError),

    /// The dialog backend failed while confirming an operation.
    #[error("session dialog error: {0}")]
    Dialog(#[from] DialogError),
}

// ---------------------------------------------------------------------------
// File service errors
// ---------------------------------------------------------------------------

/// Errors from file persistence and tracking.
#[derive(Debug, Error)]
pub enum FileError {
    /// The document is not addressable on disk (e.g. a scratch document).
    #[error("cannot persist non-file document: {0}")]
    NotPersistable(String),

    /// Writing the file failed.
    #[error("save failed for '{path}': {detail}")]
    SaveFailed {
        path: String,
        detail: String,
    },

    /// Reloading the file from disk failed.
    #[error("revert failed for '{path}': {detail}")]
    RevertFailed {
        path: String,
        detail: String,
    },

    /// Generic I/O wrapper.
    #[error("file I/O error: {0}")]
    IoError(#[from] std::io::Error),
}

// ---------------------------------------------------------------------------
// Dialog errors
// ---------------------------------------------------------------------------

/// Errors from the dialog presentation backend.
///
/// User cancellation is never an error: `DialogService::show` reports it as
/// the request's cancel index.
#[derive(Debug, Error)]
pub enum DialogError {
    /// The backend could not present the dialog (e.g. no terminal).
    #[error("dialog backend error: {0}")]
    Backend(String),
}

// ---------------------------------------------------------------------------
// Backup store errors
// ---------------------------------------------------------------------------

/// Errors from the scratch backup store.
#[derive(Debug, Error)]
pub enum BackupError {
    /// No user data directory is available on this platform.
    #[error("no user data directory available for the merges store")]
    NoDataDir,

    /// A backup sidecar could not be parsed.
    #[error("backup metadata parse error at '{path}': {detail}")]
    ParseError {
        path: String,
        detail: String,
    },

    /// Generic I/O wrapper.
    #[error("backup I/O error: {0}")]
    IoError(#[from] std::io::Error),
}

// ---------------------------------------------------------------------------
// Configuration errors
// ---------------------------------------------------------------------------

/// Errors from configuration loading and validation.
#[derive(Debug, Error)]
pub enum ConfigError {
    /// Config file not found.
    #[error("configuration file not found: {0}")]
    FileNotFound(String),

    /// TOML parse error.
    #[error("configuration parse error: {0}")]
    ParseError(String),

    /// A config value is invalid.
    #[error("invalid configuration value for '{field}': {detail}")]
    InvalidValue {
        field: String,
        detail: String,
    },

    /// Generic I/O error reading the config file.
    #[error("configuration I/O error: {0}")]
    IoError(#[from] std::io::Error),
}
