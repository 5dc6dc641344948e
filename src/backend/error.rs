//! Error types for backend operations.

use crate::services::validation::ValidationErrors;

/// Result type for backend operations.
pub type BackendResult<T> = Result<T, BackendError>;

/// Error type shared by every backend trait.
///
/// There is no retry or backoff at this layer: a failed request surfaces its
/// error to the store, which records the message and leaves its items
/// untouched. The caller decides whether to retry.
#[derive(Debug, thiserror::Error)]
pub enum BackendError {
    /// The backend could not be reached (connect, timeout, body read).
    #[error("{0}")]
    Network(String),

    /// The backend answered with a non-2xx status. `message` is already
    /// normalized for display.
    #[error("{message}")]
    Api { status: u16, message: String },

    /// 401/403 on an authenticated request.
    #[error("unauthorized (HTTP {status})")]
    Unauthorized { status: u16 },

    /// Client-side validation rejected the payload before it was sent.
    #[error(transparent)]
    Validation(#[from] ValidationErrors),
}

impl BackendError {
    /// Build an `Api` error with the normalized message for a response body.
    ///
    /// Message priority mirrors what the dashboard surfaces: the backend's
    /// `message` field, else its `detail` field, else the fallback.
    pub fn api(status: u16, body: &str, fallback: &str) -> Self {
        BackendError::Api {
            status,
            message: normalize_message(body, fallback),
        }
    }
}

/// Extract a human-readable message from an error response body.
pub(crate) fn normalize_message(body: &str, fallback: &str) -> String {
    if let Ok(value) = serde_json::from_str::<serde_json::Value>(body) {
        for key in ["message", "detail"] {
            if let Some(msg) = value.get(key).and_then(|m| m.as_str()) {
                if !msg.is_empty() {
                    return msg.to_string();
                }
            }
        }
    }
    fallback.to_string()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn prefers_message_over_detail() {
        let body = r#"{"message": "Donor already exists", "detail": "409"}"#;
        assert_eq!(normalize_message(body, "fallback"), "Donor already exists");
    }

    #[test]
    fn falls_back_to_detail() {
        let body = r#"{"detail": "Not found"}"#;
        assert_eq!(normalize_message(body, "fallback"), "Not found");
    }

    #[test]
    fn falls_back_to_static_message() {
        assert_eq!(normalize_message("not json", "Failed to fetch donors"), "Failed to fetch donors");
        assert_eq!(normalize_message(r#"{"message": ""}"#, "fb"), "fb");
    }

    #[test]
    fn api_error_displays_normalized_message() {
        let err = BackendError::api(422, r#"{"detail": "age out of range"}"#, "Failed");
        assert_eq!(err.to_string(), "age out of range");
    }
}
