//! Rendering configuration with validation.

use serde::{Deserialize, Serialize};

use crate::error::{Result, SsrCoreError, MAX_BOOTSTRAP_SIZE};
use crate::lifecycle::DataFailurePolicy;
use crate::payload::PayloadMode;

/// Configuration shared by every render of an application (validated).
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SsrConfig {
    /// Serve payloads as pre-generated `index.json` files.
    pub static_payload: bool,
    /// What to do when a route's data loader fails.
    pub data_failure_policy: DataFailurePolicy,
    /// Maximum size of the inlined bootstrap script in bytes.
    pub max_bootstrap_size: usize,
}

impl SsrConfig {
    /// Create and validate config.
    pub fn new(
        static_payload: bool,
        data_failure_policy: DataFailurePolicy,
        max_bootstrap_size: usize,
    ) -> Result<Self> {
        if max_bootstrap_size == 0 {
            return Err(SsrCoreError::InvalidConfig(
                "max bootstrap size must be positive".to_string(),
            ));
        }

        Ok(Self {
            static_payload,
            data_failure_policy,
            max_bootstrap_size,
        })
    }

    /// Create with defaults (dynamic payloads, expose data errors, 5MB bootstrap).
    pub fn with_defaults() -> Self {
        Self {
            static_payload: false,
            data_failure_policy: DataFailurePolicy::default(),
            max_bootstrap_size: MAX_BOOTSTRAP_SIZE,
        }
    }

    pub fn payload_mode(&self) -> PayloadMode {
        PayloadMode::from_flag(self.static_payload)
    }
}

impl Default for SsrConfig {
    fn default() -> Self {
        Self::with_defaults()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_config_valid() {
        let config = SsrConfig::new(true, DataFailurePolicy::Abort, 1024).unwrap();
        assert!(config.static_payload);
        assert_eq!(config.data_failure_policy, DataFailurePolicy::Abort);
        assert_eq!(config.max_bootstrap_size, 1024);
        assert_eq!(config.payload_mode(), PayloadMode::Static);
    }

    #[test]
    fn test_config_zero_bootstrap_size() {
        let result = SsrConfig::new(false, DataFailurePolicy::default(), 0);
        assert!(matches!(result, Err(SsrCoreError::InvalidConfig(_))));
    }

    #[test]
    fn test_config_with_defaults() {
        let config = SsrConfig::with_defaults();
        assert!(!config.static_payload);
        assert_eq!(config.data_failure_policy, DataFailurePolicy::ExposeError);
        assert_eq!(config.max_bootstrap_size, MAX_BOOTSTRAP_SIZE);
        assert_eq!(config.payload_mode(), PayloadMode::Dynamic);
    }
}
