//! Payload and data endpoint paths.

use serde::{Deserialize, Serialize};

/// Prefix of the dynamic payload endpoint.
pub const PAYLOAD_PREFIX: &str = "/-/payload";

/// Prefix of the route data endpoint.
pub const DATA_PREFIX: &str = "/-/data";

/// Where page payloads are served from.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum PayloadMode {
    /// Served by the payload endpoint of the running server.
    #[default]
    Dynamic,
    /// Pre-generated `index.json` files next to static HTML pages.
    Static,
}

impl PayloadMode {
    pub fn from_flag(static_payload: bool) -> Self {
        if static_payload {
            Self::Static
        } else {
            Self::Dynamic
        }
    }
}

/// URL of the JSON payload for a page.
///
/// Static mode derives it from the document path: a trailing `/` gets `index`
/// appended first, so `/docs/` maps to `/docs/index/index.json` while `/docs`
/// maps to `/docs/index.json`. Exported sites rely on this layout.
pub fn payload_path(mode: PayloadMode, document_path: &str, route_path: &str) -> String {
    match mode {
        PayloadMode::Static => {
            let mut pathname = document_path.to_string();
            if pathname.ends_with('/') {
                pathname.push_str("index");
            }
            format!("{}/index.json", pathname.replacen(".html", "", 1))
        }
        PayloadMode::Dynamic => format!("{PAYLOAD_PREFIX}{route_path}"),
    }
}

/// URL of the data endpoint for a route.
pub fn data_path(route_path: &str) -> String {
    format!("{DATA_PREFIX}{route_path}")
}
