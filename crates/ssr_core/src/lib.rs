//! Pure universal rendering logic - no I/O, no async runtime, no side effects.
//!
//! This crate provides:
//! - HTML shell compilation into head/footer templates
//! - Hydration bootstrap script generation
//! - Page head rendering
//! - Payload and data endpoint paths
//! - The request lifecycle state machine
//! - The isomorphic state bridge shared by server and client code
//!
//! # Example
//!
//! ```
//! use universify_ssr_core::{hydration_script, ShellTemplates, SsrConfig};
//!
//! let shell = "<html><head><!-- hydration --></head><body><!-- element --></body></html>";
//! let templates = ShellTemplates::compile(shell).unwrap();
//!
//! let config = SsrConfig::with_defaults();
//! let hydration = hydration_script(
//!     &serde_json::json!({ "path": "/" }),
//!     &serde_json::json!([]),
//!     config.max_bootstrap_size,
//! )
//! .unwrap();
//!
//! let head = templates
//!     .select(false)
//!     .head
//!     .render(&serde_json::json!({ "hydration": hydration }));
//! assert!(head.contains("window.route"));
//! ```

mod api;
mod config;
mod error;
mod head;
mod hydration;
mod lifecycle;
mod payload;
mod state;
mod template;

pub use api::{ApiError, ApiFactory, ApiHandle, ApiManifest, ResolvedCall};
pub use config::SsrConfig;
pub use error::{Result, SsrCoreError, ELEMENT_PLACEHOLDER, MAX_BOOTSTRAP_SIZE};
pub use head::{escape_html, Attributes, HeadMeta};
pub use hydration::{extract_bootstrap, hydration_script, serialize_for_script, Bootstrap};
pub use lifecycle::{DataFailurePolicy, RequestPhase};
pub use payload::{data_path, payload_path, PayloadMode, DATA_PREFIX, PAYLOAD_PREFIX};
pub use state::{
    ClientBridge, IsomorphicBridge, IsomorphicState, PageGlobals, ServerBridge, StateError,
    StateSource, GET_DATA, GET_PAYLOAD,
};
pub use template::{strip_module_scripts, CompiledTemplate, ShellTemplates, TemplatePair};
