//! Subcommand implementations.

pub mod backups;
pub mod check;
pub mod init;
pub mod merge;
