//! HTTP implementation of the page API handle.

use std::sync::Arc;

use async_trait::async_trait;
use reqwest::Method;
use serde_json::Value;
use universify_ssr_core::{ApiError, ApiFactory, ApiHandle, ApiManifest};
use url::Url;

use crate::fetch::join_under;

/// Performs manifest operations as HTTP requests against `base_url`.
#[derive(Debug, Clone)]
pub struct HttpApi {
    client: reqwest::Client,
    base_url: Url,
    manifest: ApiManifest,
    prefix: String,
}

impl HttpApi {
    pub fn new(base_url: Url, manifest: ApiManifest, prefix: impl Into<String>) -> Self {
        Self {
            client: reqwest::Client::new(),
            base_url,
            manifest,
            prefix: prefix.into(),
        }
    }
}

#[async_trait]
impl ApiHandle for HttpApi {
    async fn call(&self, operation: &str, args: Value) -> Result<Value, ApiError> {
        let call = self.manifest.resolve(&self.prefix, operation, &args)?;

        let method = Method::from_bytes(call.method.as_bytes()).map_err(|_| {
            ApiError::InvalidSpec {
                operation: operation.to_string(),
                spec: call.method.clone(),
            }
        })?;
        let url = join_under(&self.base_url, &call.path)
            .map_err(|e| ApiError::Transport(e.to_string()))?;

        tracing::debug!(operation, method = %method, url = %url, "Calling API");

        let mut request = self.client.request(method, url.clone());
        if !call.query.is_empty() {
            request = request.query(&call.query);
        }
        if let Some(body) = &call.body {
            request = request.json(body);
        }

        let response = request
            .send()
            .await
            .map_err(|e| ApiError::Transport(e.to_string()))?;
        let status = response.status();
        if !status.is_success() {
            return Err(ApiError::Status {
                status: status.as_u16(),
                url: url.to_string(),
            });
        }

        let text = response
            .text()
            .await
            .map_err(|e| ApiError::Transport(e.to_string()))?;
        if text.trim().is_empty() {
            return Ok(Value::Null);
        }
        serde_json::from_str(&text).map_err(|e| ApiError::InvalidJson(e.to_string()))
    }
}

/// Creates [`HttpApi`] handles against a fixed base URL.
#[derive(Debug, Clone)]
pub struct HttpApiFactory {
    base_url: Url,
}

impl HttpApiFactory {
    pub fn new(base_url: Url) -> Self {
        Self { base_url }
    }
}

impl ApiFactory for HttpApiFactory {
    fn create(&self, manifest: &ApiManifest, prefix: &str) -> Arc<dyn ApiHandle> {
        Arc::new(HttpApi::new(self.base_url.clone(), manifest.clone(), prefix))
    }
}
