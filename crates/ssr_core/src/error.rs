//! Core rendering error types (pure - no I/O variants).

use thiserror::Error;

use crate::lifecycle::RequestPhase;

/// Default maximum size for the inlined bootstrap script (5MB).
pub const MAX_BOOTSTRAP_SIZE: usize = 5 * 1024 * 1024;

/// Marker separating the head and footer fragments of an HTML shell.
pub const ELEMENT_PLACEHOLDER: &str = "<!-- element -->";

/// Core rendering errors (pure - no I/O variants).
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum SsrCoreError {
    #[error("HTML shell has no {ELEMENT_PLACEHOLDER} placeholder")]
    MissingPlaceholder,

    #[error("HTML shell has {count} {ELEMENT_PLACEHOLDER} placeholders, expected exactly one")]
    MultiplePlaceholders { count: usize },

    #[error("Invalid request phase transition: {from} -> {to}")]
    InvalidTransition {
        from: RequestPhase,
        to: RequestPhase,
    },

    #[error("Route context was already sent and can no longer be modified")]
    ContextSealed,

    #[error("Route data was already set")]
    DataAlreadySet,

    #[error("Serialization failed: {0}")]
    Serialization(String),

    #[error("Bootstrap too large: {size} bytes (max: {max} bytes)")]
    PayloadTooLarge { size: usize, max: usize },

    #[error("Invalid route path {path:?}: must start with '/'")]
    InvalidRoutePath { path: String },

    #[error("Invalid config: {0}")]
    InvalidConfig(String),
}

pub type Result<T> = std::result::Result<T, SsrCoreError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_multiple_placeholders_display() {
        let error = SsrCoreError::MultiplePlaceholders { count: 2 };
        assert_eq!(
            error.to_string(),
            "HTML shell has 2 <!-- element --> placeholders, expected exactly one"
        );
    }

    #[test]
    fn test_invalid_transition_display() {
        let error = SsrCoreError::InvalidTransition {
            from: RequestPhase::Sent,
            to: RequestPhase::Rendering,
        };
        assert_eq!(
            error.to_string(),
            "Invalid request phase transition: sent -> rendering"
        );
    }
}
