//! MergeDesk core library.
//!
//! This crate provides the foundational components for three-way merge
//! session management: document identity and resolution, line diffing and
//! merge computation, file persistence and tracking, the two session
//! variants with their factories, the host-facing session handle, scratch
//! backups, and configuration.

pub mod backups;
pub mod config;
pub mod dialog;
pub mod doc;
pub mod errors;
pub mod files;
pub mod merge;
pub mod session;

// Re-exports for convenience.
pub use backups::BackupStore;
pub use config::AppConfig;
pub use errors::CoreError;
pub use session::{MergeSession, SessionArgs, SessionHandle};
