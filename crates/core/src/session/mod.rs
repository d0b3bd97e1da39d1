//! Merge editing sessions.
//!
//! The session subsystem provides:
//! 1. **Arguments** -- the four document locations and their resolution.
//! 2. **The session trait** -- dirty state, save/revert/accept/discard, and
//!    the close-confirmation flow.
//! 3. **Two variants** -- scratch sessions composing into an in-memory
//!    document, workspace sessions editing the target file directly.
//! 4. **The handle** -- the lazily-resolving wrapper hosts embed.

pub mod handle;
pub mod input_data;
pub mod model;
pub mod scratch;
pub mod workspace;

pub use handle::{SessionChange, SessionHandle};
pub use input_data::{ResolvedSide, SessionArgs, SideDescriptor};
pub use model::{CloseDecision, MergeSession, SessionEvent, SessionFactory};
pub use scratch::{ScratchSession, ScratchSessionFactory};
pub use workspace::{WorkspaceSession, WorkspaceSessionFactory};
