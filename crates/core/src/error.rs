use thiserror::Error;

#[derive(Error, Debug)]
pub enum SentiscopeError {
    #[error("Video processing failed for {file}: {state}")]
    ProcessingFailed { file: String, state: String },

    #[error("Video processing timed out for {file} after {attempts} checks ({elapsed_secs}s)")]
    ProcessingTimeout {
        file: String,
        attempts: u32,
        elapsed_secs: u64,
    },

    #[error("Permission denied: {reason}")]
    PermissionDenied { reason: String },

    #[error("API returned {status}: {message}")]
    Api { status: u16, message: String },

    #[error("Connection failed: {0}")]
    Connection(#[source] reqwest::Error),

    #[error("API request failed: {0}")]
    Http(#[source] reqwest::Error),

    #[error("Invalid API response: {reason}")]
    InvalidApiResponse { reason: String },

    #[error("Missing API key: {env_var} environment variable is not set")]
    MissingApiKey { env_var: String },

    #[error("Unsupported upload: {reason}")]
    UnsupportedUpload { reason: String },

    #[error("IO error: {0}")]
    IoError(#[from] std::io::Error),

    #[error("JSON parse error: {0}")]
    JsonError(#[from] serde_json::Error),
}

/// How a failure is presented to the user.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorCategory {
    Permission,
    Value,
    Unexpected,
}

impl SentiscopeError {
    pub fn category(&self) -> ErrorCategory {
        match self {
            SentiscopeError::PermissionDenied { .. } | SentiscopeError::MissingApiKey { .. } => {
                ErrorCategory::Permission
            }
            SentiscopeError::ProcessingFailed { .. }
            | SentiscopeError::ProcessingTimeout { .. }
            | SentiscopeError::UnsupportedUpload { .. } => ErrorCategory::Value,
            _ => ErrorCategory::Unexpected,
        }
    }

    /// Only connection-level failures are worth another attempt.
    pub fn is_retryable(&self) -> bool {
        matches!(self, SentiscopeError::Connection(_))
    }
}

impl From<reqwest::Error> for SentiscopeError {
    fn from(err: reqwest::Error) -> Self {
        if err.is_connect() || err.is_timeout() {
            SentiscopeError::Connection(err)
        } else {
            SentiscopeError::Http(err)
        }
    }
}

pub type Result<T> = std::result::Result<T, SentiscopeError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn categories_follow_the_three_ui_buckets() {
        let denied = SentiscopeError::PermissionDenied {
            reason: "API key not valid".into(),
        };
        assert_eq!(denied.category(), ErrorCategory::Permission);

        let failed = SentiscopeError::ProcessingFailed {
            file: "files/abc".into(),
            state: "FAILED".into(),
        };
        assert_eq!(failed.category(), ErrorCategory::Value);
        assert_eq!(
            failed.to_string(),
            "Video processing failed for files/abc: FAILED"
        );

        let quota = SentiscopeError::Api {
            status: 429,
            message: "quota exceeded".into(),
        };
        assert_eq!(quota.category(), ErrorCategory::Unexpected);
        assert!(!quota.is_retryable());
    }
}
