//! Rendering errors including I/O operations.

use thiserror::Error;
use universify_ssr_core::{ApiError, SsrCoreError};

/// Rendering errors including I/O operations.
#[derive(Error, Debug)]
pub enum SsrError {
    #[error("Core error: {0}")]
    Core(#[from] SsrCoreError),

    #[error("Data loader for {route} failed: {reason}")]
    DataFetch { route: String, reason: String },

    #[error("Render failed: {0}")]
    Render(String),

    #[error("HTTP request failed: {0}")]
    Fetch(#[from] reqwest::Error),

    #[error("Server returned {status} for {url}")]
    Status { status: u16, url: String },

    #[error("Invalid JSON from {url}: {reason}")]
    InvalidJson { url: String, reason: String },

    #[error("Invalid URL: {0}")]
    InvalidUrl(String),

    #[error("API error: {0}")]
    Api(#[from] ApiError),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

pub type Result<T> = std::result::Result<T, SsrError>;

/// Sanitize error messages for client-facing responses.
///
/// Hides internal details while providing useful feedback.
pub fn sanitize_error(error: &SsrError) -> String {
    match error {
        // Safe to expose
        SsrError::Status { status, .. } => format!("Upstream returned {status}"),
        SsrError::DataFetch { route, .. } => format!("Failed to load data for {route}"),
        // Hide internal details
        SsrError::Core(_) => "Internal configuration error".to_string(),
        SsrError::Render(_) => "Render failed".to_string(),
        SsrError::Fetch(_) | SsrError::InvalidUrl(_) => "Service temporarily unavailable".to_string(),
        SsrError::InvalidJson { .. } => "Invalid response from upstream".to_string(),
        SsrError::Api(_) => "Request failed".to_string(),
        SsrError::Io(_) => "Internal configuration error".to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_sanitize_hides_render_details() {
        let error = SsrError::Render("panic at src/secret.rs:42".to_string());
        assert_eq!(sanitize_error(&error), "Render failed");
    }

    #[test]
    fn test_sanitize_data_fetch_names_route_only() {
        let error = SsrError::DataFetch {
            route: "/docs".to_string(),
            reason: "password authentication failed".to_string(),
        };
        let message = sanitize_error(&error);
        assert_eq!(message, "Failed to load data for /docs");
        assert!(!message.contains("password"));
    }

    #[test]
    fn test_core_error_converts() {
        let error: SsrError = SsrCoreError::MissingPlaceholder.into();
        assert!(matches!(error, SsrError::Core(SsrCoreError::MissingPlaceholder)));
        assert_eq!(sanitize_error(&error), "Internal configuration error");
    }
}
