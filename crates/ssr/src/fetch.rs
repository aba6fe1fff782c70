//! Client-side payload and data retrieval.
//!
//! After the first render, navigations fetch route payloads over HTTP. In
//! dynamic mode they come from the payload endpoint; exported sites serve
//! pre-generated `index.json` files next to each page.

use serde_json::Value;
use universify_ssr_core::{
    data_path, payload_path, ClientBridge, IsomorphicBridge, PayloadMode, StateError, GET_PAYLOAD,
};
use url::Url;

use crate::error::{Result, SsrError};

/// Fetches JSON payloads relative to a base URL.
#[derive(Debug, Clone)]
pub struct PayloadFetcher {
    client: reqwest::Client,
    base_url: Url,
    mode: PayloadMode,
}

impl PayloadFetcher {
    pub fn new(base_url: &str, mode: PayloadMode) -> Result<Self> {
        let base_url =
            Url::parse(base_url).map_err(|e| SsrError::InvalidUrl(format!("{base_url}: {e}")))?;

        Ok(Self {
            client: reqwest::Client::new(),
            base_url,
            mode,
        })
    }

    pub fn mode(&self) -> PayloadMode {
        self.mode
    }

    /// GET `path` and decode the body as JSON.
    pub async fn fetch_json(&self, path: &str) -> Result<Value> {
        let url = join_under(&self.base_url, path)
            .map_err(|e| SsrError::InvalidUrl(format!("{path}: {e}")))?;

        tracing::debug!(url = %url, "Fetching JSON");

        let response = self.client.get(url.clone()).send().await?;
        let status = response.status();
        if !status.is_success() {
            return Err(SsrError::Status {
                status: status.as_u16(),
                url: url.to_string(),
            });
        }

        let text = response.text().await?;
        serde_json::from_str(&text).map_err(|e| SsrError::InvalidJson {
            url: url.to_string(),
            reason: e.to_string(),
        })
    }

    /// Payload for `route_path`, requested from `document_path`.
    pub async fn fetch_payload(&self, route_path: &str, document_path: &str) -> Result<Value> {
        self.fetch_json(&payload_path(self.mode, document_path, route_path))
            .await
    }

    /// Route data from the data endpoint.
    pub async fn fetch_data(&self, route_path: &str) -> Result<Value> {
        self.fetch_json(&data_path(route_path)).await
    }
}

/// Resolve `path` below `base`, keeping any path prefix the base carries.
///
/// `Url::join` replaces the whole base path when `path` is absolute, so
/// `http://host/app` + `/-/data/docs` would lose `/app`.
pub(crate) fn join_under(base: &Url, path: &str) -> std::result::Result<Url, url::ParseError> {
    let mut base = base.clone();
    if !base.path().ends_with('/') {
        let dir = format!("{}/", base.path());
        base.set_path(&dir);
    }
    base.join(&format!("./{}", path.trim_start_matches('/')))
}

/// Fetch the payload for `route_path` into the bridge.
///
/// Failures are logged and recorded under `getPayload` so the page can render
/// its error state; nothing is thrown into the render.
pub async fn load_payload(
    bridge: &mut ClientBridge,
    fetcher: &PayloadFetcher,
    route_path: &str,
) -> Option<Value> {
    let document_path = bridge.globals().location.clone();

    match fetcher.fetch_payload(route_path, &document_path).await {
        Ok(payload) => {
            bridge.set_payload(payload.clone());
            Some(payload)
        }
        Err(e) => {
            tracing::warn!(route = %route_path, error = %e, "Payload fetch failed");
            bridge.record_error(GET_PAYLOAD, StateError::from_error(GET_PAYLOAD, &e));
            None
        }
    }
}
