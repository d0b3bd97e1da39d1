//! Session arguments and resolved inputs.

use std::sync::Arc;

use crate::doc::{DocUri, Document, DocumentHandle, DocumentProvider};
use crate::errors::SessionError;

/// The four document locations of one merge session. Immutable once built.
#[derive(Debug, Clone)]
pub struct SessionArgs {
    pub base: DocUri,
    pub ours: SideDescriptor,
    pub theirs: SideDescriptor,
    pub result: DocUri,
}

impl SessionArgs {
    /// Args with bare side descriptors (no titles or details).
    pub fn from_uris(base: DocUri, ours: DocUri, theirs: DocUri, result: DocUri) -> Self {
        Self {
            base,
            ours: SideDescriptor::new(ours),
            theirs: SideDescriptor::new(theirs),
            result,
        }
    }
}

/// Descriptor for one incoming side: its location plus presentation
/// metadata. Immutable; one per side per session.
#[derive(Debug, Clone)]
pub struct SideDescriptor {
    pub uri: DocUri,
    pub title: Option<String>,
    pub description: Option<String>,
    pub detail: Option<String>,
}

impl SideDescriptor {
    pub fn new(uri: DocUri) -> Self {
        Self {
            uri,
            title: None,
            description: None,
            detail: None,
        }
    }

    pub fn with_title(mut self, title: impl Into<String>) -> Self {
        self.title = Some(title.into());
        self
    }

    pub fn with_description(mut self, description: impl Into<String>) -> Self {
        self.description = Some(description.into());
        self
    }

    pub fn with_detail(mut self, detail: impl Into<String>) -> Self {
        self.detail = Some(detail.into());
        self
    }
}

/// A side descriptor resolved into a live handle. Owned by the session for
/// its duration; the handle's reference is released when the session drops.
#[derive(Debug)]
pub struct ResolvedSide {
    pub handle: DocumentHandle,
    pub title: Option<String>,
    pub description: Option<String>,
    pub detail: Option<String>,
}

impl ResolvedSide {
    pub fn document(&self) -> &Arc<Document> {
        self.handle.document()
    }
}

/// All four documents of a session, resolved. Dropping this releases every
/// handle.
#[derive(Debug)]
pub(crate) struct ResolvedInputs {
    pub base: DocumentHandle,
    pub ours: ResolvedSide,
    pub theirs: ResolvedSide,
    pub result: DocumentHandle,
}

/// Resolves all four documents concurrently. The first failure cancels the
/// remaining resolutions and drops any completed handles, releasing their
/// references before the error surfaces.
pub(crate) async fn resolve_inputs(
    provider: &Arc<dyn DocumentProvider>,
    args: &SessionArgs,
) -> Result<ResolvedInputs, SessionError> {
    let (base, ours, theirs, result) = tokio::try_join!(
        provider.resolve(&args.base),
        provider.resolve(&args.ours.uri),
        provider.resolve(&args.theirs.uri),
        provider.resolve(&args.result),
    )?;

    Ok(ResolvedInputs {
        base,
        ours: ResolvedSide {
            handle: ours,
            title: args.ours.title.clone(),
            description: args.ours.description.clone(),
            detail: args.ours.detail.clone(),
        },
        theirs: ResolvedSide {
            handle: theirs,
            title: args.theirs.title.clone(),
            description: args.theirs.description.clone(),
            detail: args.theirs.detail.clone(),
        },
        result,
    })
}
