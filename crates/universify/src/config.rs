use std::{env, path::PathBuf, time::Duration};

use universify_ssr::{DataFailurePolicy, SsrConfig, MAX_BOOTSTRAP_SIZE};

/// Application configuration loaded from environment variables.
#[derive(Debug, Clone)]
pub struct Config {
    /// Path to the HTML shell (default: the embedded shell)
    pub shell_path: Option<PathBuf>,
    /// Serve payloads as pre-generated `index.json` files (default: false)
    pub static_payload: bool,
    /// What to do when a route data loader fails (default: expose-error)
    pub data_failure_policy: DataFailurePolicy,
    /// Request timeout in seconds (default: 10)
    pub request_timeout_secs: u64,
}

impl Config {
    /// Load configuration from environment variables.
    ///
    /// Environment variables:
    /// - `UNIVERSIFY_SHELL` - HTML shell path (default: embedded shell)
    /// - `UNIVERSIFY_STATIC_PAYLOAD` - `true`/`1` for static payloads (default: false)
    /// - `UNIVERSIFY_DATA_POLICY` - `render-degraded`, `expose-error` or `abort`
    ///   (default: expose-error)
    /// - `UNIVERSIFY_REQUEST_TIMEOUT_SECS` - Request timeout in seconds (default: 10)
    pub fn from_env() -> Self {
        Self::from_lookup(|key| env::var(key).ok())
    }

    fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Self {
        Self {
            shell_path: lookup("UNIVERSIFY_SHELL")
                .filter(|v| !v.is_empty())
                .map(PathBuf::from),
            static_payload: lookup("UNIVERSIFY_STATIC_PAYLOAD")
                .map(|v| parse_flag(&v))
                .unwrap_or(false),
            data_failure_policy: lookup("UNIVERSIFY_DATA_POLICY")
                .and_then(|v| v.parse().ok())
                .unwrap_or_default(),
            request_timeout_secs: lookup("UNIVERSIFY_REQUEST_TIMEOUT_SECS")
                .and_then(|v| v.parse().ok())
                .unwrap_or(10),
        }
    }

    /// Get the request timeout as a Duration.
    pub fn request_timeout(&self) -> Duration {
        Duration::from_secs(self.request_timeout_secs)
    }

    /// Validated rendering configuration.
    pub fn ssr_config(&self) -> universify_ssr::Result<SsrConfig> {
        Ok(SsrConfig::new(
            self.static_payload,
            self.data_failure_policy,
            MAX_BOOTSTRAP_SIZE,
        )?)
    }
}

impl Default for Config {
    fn default() -> Self {
        Self::from_env()
    }
}

fn parse_flag(value: &str) -> bool {
    matches!(
        value.trim().to_ascii_lowercase().as_str(),
        "1" | "true" | "yes" | "on"
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn config_from(vars: &[(&str, &str)]) -> Config {
        let vars: HashMap<String, String> = vars
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        Config::from_lookup(|key| vars.get(key).cloned())
    }

    #[test]
    fn test_default_values() {
        let config = config_from(&[]);

        assert_eq!(config.shell_path, None);
        assert!(!config.static_payload);
        assert_eq!(config.data_failure_policy, DataFailurePolicy::ExposeError);
        assert_eq!(config.request_timeout(), Duration::from_secs(10));
    }

    #[test]
    fn test_values_from_environment() {
        let config = config_from(&[
            ("UNIVERSIFY_SHELL", "web/index.html"),
            ("UNIVERSIFY_STATIC_PAYLOAD", "TRUE"),
            ("UNIVERSIFY_DATA_POLICY", "abort"),
            ("UNIVERSIFY_REQUEST_TIMEOUT_SECS", "30"),
        ]);

        assert_eq!(config.shell_path, Some(PathBuf::from("web/index.html")));
        assert!(config.static_payload);
        assert_eq!(config.data_failure_policy, DataFailurePolicy::Abort);
        assert_eq!(config.request_timeout_secs, 30);
    }

    #[test]
    fn test_invalid_values_fall_back_to_defaults() {
        let config = config_from(&[
            ("UNIVERSIFY_SHELL", ""),
            ("UNIVERSIFY_DATA_POLICY", "retry"),
            ("UNIVERSIFY_REQUEST_TIMEOUT_SECS", "soon"),
        ]);

        assert_eq!(config.shell_path, None);
        assert_eq!(config.data_failure_policy, DataFailurePolicy::ExposeError);
        assert_eq!(config.request_timeout_secs, 10);
    }

    #[test]
    fn test_ssr_config() {
        let config = config_from(&[("UNIVERSIFY_STATIC_PAYLOAD", "1")]);
        let ssr = config.ssr_config().unwrap();

        assert!(ssr.static_payload);
        assert_eq!(ssr.max_bootstrap_size, MAX_BOOTSTRAP_SIZE);
    }
}
