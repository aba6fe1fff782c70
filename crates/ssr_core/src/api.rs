//! Request-issuing API handle.
//!
//! Pages reach the backend through named operations declared in an
//! [`ApiManifest`] (`"getPost": "GET /posts/:id"`). The manifest resolves a
//! call into a method, a path and the remaining arguments; an [`ApiHandle`]
//! implementation performs it.

use std::collections::BTreeMap;
use std::fmt;
use std::sync::Arc;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use thiserror::Error;

/// Errors raised while resolving or performing an API call.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ApiError {
    #[error("Unknown API operation: {0}")]
    UnknownOperation(String),

    #[error("Invalid API spec for {operation}: {spec:?}")]
    InvalidSpec { operation: String, spec: String },

    #[error("Missing parameter {param:?} for {operation}")]
    MissingParam { operation: String, param: String },

    #[error("API request failed: {0}")]
    Transport(String),

    #[error("API returned {status} for {url}")]
    Status { status: u16, url: String },

    #[error("Invalid JSON response: {0}")]
    InvalidJson(String),
}

/// Performs named API operations.
#[async_trait]
pub trait ApiHandle: Send + Sync + fmt::Debug {
    /// Call `operation` with JSON arguments and return the JSON response.
    async fn call(&self, operation: &str, args: Value) -> Result<Value, ApiError>;
}

/// Builds API handles for a manifest and path prefix.
pub trait ApiFactory: Send + Sync {
    fn create(&self, manifest: &ApiManifest, prefix: &str) -> Arc<dyn ApiHandle>;
}

/// A call resolved against the manifest, ready to be sent.
#[derive(Debug, Clone, PartialEq)]
pub struct ResolvedCall {
    pub method: String,
    pub path: String,
    pub query: Vec<(String, String)>,
    pub body: Option<Value>,
}

/// Operation name to `"METHOD /path/:param"` mapping.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ApiManifest(BTreeMap<String, String>);

impl ApiManifest {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn operation(mut self, name: impl Into<String>, spec: impl Into<String>) -> Self {
        self.0.insert(name.into(), spec.into());
        self
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn operations(&self) -> impl Iterator<Item = &str> {
        self.0.keys().map(String::as_str)
    }

    /// Resolve `operation` into a concrete request.
    ///
    /// `:param` path segments are filled from the matching keys of `args`.
    /// Leftover keys become the query string for `GET` and the JSON body otherwise.
    pub fn resolve(
        &self,
        prefix: &str,
        operation: &str,
        args: &Value,
    ) -> Result<ResolvedCall, ApiError> {
        let spec = self
            .0
            .get(operation)
            .ok_or_else(|| ApiError::UnknownOperation(operation.to_string()))?;

        let (method, template) =
            spec.trim()
                .split_once(' ')
                .ok_or_else(|| ApiError::InvalidSpec {
                    operation: operation.to_string(),
                    spec: spec.clone(),
                })?;
        let method = method.to_ascii_uppercase();

        let mut rest: Map<String, Value> = args.as_object().cloned().unwrap_or_default();

        let mut segments = Vec::new();
        for segment in template.trim().split('/') {
            match segment.strip_prefix(':') {
                Some(param) => {
                    let value = rest.remove(param).ok_or_else(|| ApiError::MissingParam {
                        operation: operation.to_string(),
                        param: param.to_string(),
                    })?;
                    segments.push(scalar_to_string(&value));
                }
                None => segments.push(segment.to_string()),
            }
        }
        let path = format!("{prefix}{}", segments.join("/"));

        let (query, body) = if method == "GET" {
            let query = rest
                .iter()
                .map(|(key, value)| (key.clone(), scalar_to_string(value)))
                .collect();
            (query, None)
        } else if rest.is_empty() {
            (Vec::new(), None)
        } else {
            (Vec::new(), Some(Value::Object(rest)))
        };

        Ok(ResolvedCall {
            method,
            path,
            query,
            body,
        })
    }
}

fn scalar_to_string(value: &Value) -> String {
    match value {
        Value::String(s) => s.clone(),
        other => other.to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn manifest() -> ApiManifest {
        ApiManifest::new()
            .operation("getPost", "GET /posts/:id")
            .operation("createPost", "post /posts")
            .operation("broken", "GET")
    }

    #[test]
    fn test_resolve_fills_path_params() {
        let call = manifest()
            .resolve("", "getPost", &json!({"id": 7, "expand": "author"}))
            .unwrap();
        assert_eq!(call.method, "GET");
        assert_eq!(call.path, "/posts/7");
        assert_eq!(call.query, vec![("expand".to_string(), "author".to_string())]);
        assert_eq!(call.body, None);
    }

    #[test]
    fn test_resolve_body_for_non_get() {
        let call = manifest()
            .resolve("/api", "createPost", &json!({"title": "Hi"}))
            .unwrap();
        assert_eq!(call.method, "POST");
        assert_eq!(call.path, "/api/posts");
        assert_eq!(call.body, Some(json!({"title": "Hi"})));
    }

    #[test]
    fn test_resolve_missing_param() {
        let result = manifest().resolve("", "getPost", &Value::Null);
        assert_eq!(
            result,
            Err(ApiError::MissingParam {
                operation: "getPost".to_string(),
                param: "id".to_string(),
            })
        );
    }

    #[test]
    fn test_resolve_unknown_and_invalid() {
        assert_eq!(
            manifest().resolve("", "nope", &Value::Null),
            Err(ApiError::UnknownOperation("nope".to_string()))
        );
        assert!(matches!(
            manifest().resolve("", "broken", &Value::Null),
            Err(ApiError::InvalidSpec { .. })
        ));
    }

    #[test]
    fn test_manifest_serializes_as_map() {
        let value = serde_json::to_value(ApiManifest::new().operation("ping", "GET /ping")).unwrap();
        assert_eq!(value, json!({"ping": "GET /ping"}));
    }
}
