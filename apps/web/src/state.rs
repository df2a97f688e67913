use std::sync::Arc;

use axum::body::Bytes;
use sentiscope_core::{AnalysisOutcome, Analyzer, ErrorCategory, SentiscopeError, SessionStore};

/// Shared by every handler.
pub struct AppState {
    pub analyzer: Analyzer,
    pub sessions: SessionStore<PageState>,
}

/// What one browser session sees.
#[derive(Clone, Default)]
pub struct PageState {
    pub outcome: Option<Arc<AnalysisOutcome>>,
    pub video: Option<UploadedVideo>,
    pub flash: Option<Flash>,
}

#[derive(Clone)]
pub struct UploadedVideo {
    pub file_name: String,
    pub mime_type: &'static str,
    pub bytes: Bytes,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FlashKind {
    Success,
    Error,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Flash {
    pub kind: FlashKind,
    pub message: String,
}

impl Flash {
    pub fn success(message: impl Into<String>) -> Self {
        Self {
            kind: FlashKind::Success,
            message: message.into(),
        }
    }

    pub fn error(message: impl Into<String>) -> Self {
        Self {
            kind: FlashKind::Error,
            message: message.into(),
        }
    }

    /// User-facing message for a failed run, worded by error category.
    pub fn from_error(err: &SentiscopeError) -> Self {
        let message = match err.category() {
            ErrorCategory::Permission => {
                let detail = match err {
                    SentiscopeError::PermissionDenied { reason } => reason.clone(),
                    other => other.to_string(),
                };
                format!("Permission denied: {detail}. Please check your API key and permissions.")
            }
            ErrorCategory::Value => format!("Error: {err}"),
            ErrorCategory::Unexpected => format!("An unexpected error occurred: {err}"),
        };
        Self::error(message)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn permission_errors_ask_for_key_check() {
        let flash = Flash::from_error(&SentiscopeError::PermissionDenied {
            reason: "API key not valid".into(),
        });
        assert_eq!(flash.kind, FlashKind::Error);
        assert_eq!(
            flash.message,
            "Permission denied: API key not valid. Please check your API key and permissions."
        );
    }

    #[test]
    fn value_and_unexpected_errors_are_prefixed() {
        let timeout = Flash::from_error(&SentiscopeError::ProcessingTimeout {
            file: "files/abc".into(),
            attempts: 3,
            elapsed_secs: 15,
        });
        assert!(timeout.message.starts_with("Error: Video processing timed out"));

        let api = Flash::from_error(&SentiscopeError::Api {
            status: 500,
            message: "backend".into(),
        });
        assert_eq!(
            api.message,
            "An unexpected error occurred: API returned 500: backend"
        );
    }
}
