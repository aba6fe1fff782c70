//! Route definitions and the renderer seam.

use std::fmt;
use std::future::Future;
use std::sync::Arc;

use async_trait::async_trait;
use axum::response::Response;
use futures_util::{future::BoxFuture, FutureExt};
use serde::Serialize;
use serde_json::Value;
use universify_ssr_core::{HeadMeta, SsrCoreError};

use crate::context::RouteContext;
use crate::error::{Result, SsrError};
use crate::stream::RenderBody;

/// Zero-argument async loader for route data or payloads.
pub type DataLoader = Arc<dyn Fn() -> BoxFuture<'static, anyhow::Result<Value>> + Send + Sync>;

/// Turns a failure into the response sent instead of the page.
pub type ErrorHandler = Arc<dyn Fn(&SsrError, &RouteContext) -> Response + Send + Sync>;

/// Renders a route context into page markup.
///
/// The component model lives behind this trait; the renderer may adjust the
/// context's head metadata and response head before returning the body.
#[async_trait]
pub trait Renderer: Send + Sync {
    async fn render(&self, context: &mut RouteContext) -> Result<RenderBody>;
}

/// A page route.
#[derive(Clone)]
pub struct Route {
    /// Axum path pattern, e.g. `/posts/{id}`.
    pub path: String,
    pub get_data: Option<DataLoader>,
    pub get_payload: Option<DataLoader>,
    /// Render without hydration (no client scripts, no bootstrap).
    pub server_only: bool,
    /// Stream the body as soon as the shell is ready.
    pub streaming: bool,
    pub head: HeadMeta,
    pub error_handler: Option<ErrorHandler>,
}

impl Route {
    pub fn new(path: impl Into<String>) -> Result<Self> {
        let path = path.into();
        if !path.starts_with('/') {
            return Err(SsrCoreError::InvalidRoutePath { path }.into());
        }

        Ok(Self {
            path,
            get_data: None,
            get_payload: None,
            server_only: false,
            streaming: false,
            head: HeadMeta::default(),
            error_handler: None,
        })
    }

    /// Load route data before rendering; also served at `/-/data{path}`.
    pub fn data_loader<F, Fut>(mut self, loader: F) -> Self
    where
        F: Fn() -> Fut + Send + Sync + 'static,
        Fut: Future<Output = anyhow::Result<Value>> + Send + 'static,
    {
        self.get_data = Some(Arc::new(move || loader().boxed()));
        self
    }

    /// Serve a payload at `/-/payload{path}`.
    pub fn payload_loader<F, Fut>(mut self, loader: F) -> Self
    where
        F: Fn() -> Fut + Send + Sync + 'static,
        Fut: Future<Output = anyhow::Result<Value>> + Send + 'static,
    {
        self.get_payload = Some(Arc::new(move || loader().boxed()));
        self
    }

    pub fn server_only(mut self, server_only: bool) -> Self {
        self.server_only = server_only;
        self
    }

    pub fn streaming(mut self, streaming: bool) -> Self {
        self.streaming = streaming;
        self
    }

    pub fn head(mut self, head: HeadMeta) -> Self {
        self.head = head;
        self
    }

    pub fn error_handler<F>(mut self, handler: F) -> Self
    where
        F: Fn(&SsrError, &RouteContext) -> Response + Send + Sync + 'static,
    {
        self.error_handler = Some(Arc::new(handler));
        self
    }

    /// Client-visible description of the route.
    pub fn info(&self) -> RouteInfo {
        RouteInfo {
            path: self.path.clone(),
            server_only: self.server_only,
            streaming: self.streaming,
            has_data: self.get_data.is_some(),
            has_payload: self.get_payload.is_some(),
        }
    }
}

impl fmt::Debug for Route {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Route")
            .field("path", &self.path)
            .field("get_data", &self.get_data.is_some())
            .field("get_payload", &self.get_payload.is_some())
            .field("server_only", &self.server_only)
            .field("streaming", &self.streaming)
            .field("head", &self.head)
            .finish()
    }
}

/// Route entry as inlined into `window.routes`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct RouteInfo {
    pub path: String,
    pub server_only: bool,
    pub streaming: bool,
    pub has_data: bool,
    pub has_payload: bool,
}

/// The application's routes, in registration order.
#[derive(Debug, Clone, Default)]
pub struct RouteTable {
    routes: Vec<Arc<Route>>,
}

impl RouteTable {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_route(mut self, route: Route) -> Self {
        self.routes.push(Arc::new(route));
        self
    }

    pub fn iter(&self) -> impl Iterator<Item = &Arc<Route>> {
        self.routes.iter()
    }

    pub fn len(&self) -> usize {
        self.routes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.routes.is_empty()
    }

    pub fn find(&self, path: &str) -> Option<&Arc<Route>> {
        self.routes.iter().find(|route| route.path == path)
    }

    /// Serializable view of every route.
    pub fn to_json(&self) -> Vec<RouteInfo> {
        self.routes.iter().map(|route| route.info()).collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_route_requires_leading_slash() {
        let result = Route::new("docs");
        assert!(matches!(
            result,
            Err(SsrError::Core(SsrCoreError::InvalidRoutePath { .. }))
        ));
    }

    #[test]
    fn test_route_info() {
        let route = Route::new("/docs")
            .unwrap()
            .data_loader(|| async { Ok(json!({"n": 1})) })
            .streaming(true);

        assert_eq!(
            route.info(),
            RouteInfo {
                path: "/docs".to_string(),
                server_only: false,
                streaming: true,
                has_data: true,
                has_payload: false,
            }
        );
    }

    #[tokio::test]
    async fn test_data_loader_is_callable() {
        let route = Route::new("/docs")
            .unwrap()
            .data_loader(|| async { Ok(json!({"n": 1})) });
        let loader = route.get_data.unwrap();
        assert_eq!(loader().await.unwrap(), json!({"n": 1}));
    }

    #[test]
    fn test_route_table_json() {
        let table = RouteTable::new()
            .with_route(Route::new("/").unwrap())
            .with_route(Route::new("/about").unwrap().server_only(true));

        assert_eq!(table.len(), 2);
        assert!(table.find("/about").is_some());
        assert!(table.find("/missing").is_none());

        let value = serde_json::to_value(table.to_json()).unwrap();
        assert_eq!(
            value,
            json!([
                {"path": "/", "serverOnly": false, "streaming": false, "hasData": false, "hasPayload": false},
                {"path": "/about", "serverOnly": true, "streaming": false, "hasData": false, "hasPayload": false},
            ])
        );
    }
}
