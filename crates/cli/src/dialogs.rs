//! Terminal frontend for the core dialog seam.

use async_trait::async_trait;
use dialoguer::theme::ColorfulTheme;
use dialoguer::Select;

use mergedesk_core::dialog::{DialogRequest, DialogService, Severity};
use mergedesk_core::errors::DialogError;

use crate::style;

/// Presents [`DialogRequest`]s as dialoguer select prompts. Esc or an
/// aborted prompt maps to the request's cancel index.
pub struct TerminalDialogs;

#[async_trait]
impl DialogService for TerminalDialogs {
    async fn show(&self, request: DialogRequest) -> Result<usize, DialogError> {
        // dialoguer blocks on the terminal; keep it off the runtime threads.
        tokio::task::spawn_blocking(move || {
            let message = match request.severity {
                Severity::Info => style::header(&request.message),
                Severity::Warning => style::warn(&request.message),
                Severity::Error => style::error(&request.message),
            };
            println!();
            println!("{message}");
            if let Some(detail) = &request.detail {
                println!("{}", style::dim(detail));
            }

            let choice = Select::with_theme(&ColorfulTheme::default())
                .items(&request.actions)
                .default(0)
                .interact_opt()
                .map_err(|e| DialogError::Backend(e.to_string()))?;

            Ok(choice.unwrap_or(request.cancel_index))
        })
        .await
        .map_err(|e| DialogError::Backend(e.to_string()))?
    }
}
