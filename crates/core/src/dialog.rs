//! Dialog presentation seam.
//!
//! Sessions never render anything themselves: confirmation flows build a
//! [`DialogRequest`] and hand it to the injected [`DialogService`]. User
//! cancellation is a normal outcome reported as the request's cancel index,
//! never an error; [`crate::errors::DialogError`] is reserved for backend
//! failures such as a missing terminal.

use async_trait::async_trait;

pub use crate::errors::DialogError;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Severity {
    Info,
    Warning,
    Error,
}

/// One dialog to present: a message, the action labels in display order,
/// and which action index means "cancelled".
#[derive(Debug, Clone)]
pub struct DialogRequest {
    pub severity: Severity,
    pub message: String,
    pub actions: Vec<String>,
    pub cancel_index: usize,
    pub detail: Option<String>,
}

impl DialogRequest {
    /// A two-action confirmation: the given label, then "Cancel".
    pub fn confirmation(
        severity: Severity,
        message: impl Into<String>,
        confirm_label: impl Into<String>,
    ) -> Self {
        Self {
            severity,
            message: message.into(),
            actions: vec![confirm_label.into(), "Cancel".to_string()],
            cancel_index: 1,
            detail: None,
        }
    }

    pub fn with_detail(mut self, detail: impl Into<String>) -> Self {
        self.detail = Some(detail.into());
        self
    }

    pub fn is_cancel(&self, choice: usize) -> bool {
        choice == self.cancel_index
    }
}

/// Presents dialogs to the user.
#[async_trait]
pub trait DialogService: Send + Sync {
    /// Shows the dialog and returns the chosen action index. Cancellation
    /// (Esc, closed prompt) is returned as `request.cancel_index`.
    async fn show(&self, request: DialogRequest) -> Result<usize, DialogError>;
}
