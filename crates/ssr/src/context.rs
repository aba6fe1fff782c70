//! Per-request route context.
//!
//! Created when a request matches a route and dropped once the response is
//! handed to the transport. Tracks the request lifecycle so data is loaded at
//! most once, before rendering, and nothing changes after the response is sent.

use std::collections::BTreeMap;
use std::sync::Arc;

use axum::http::{request::Parts, HeaderMap, StatusCode};
use serde::Serialize;
use serde_json::Value;
use universify_ssr_core::{
    ApiHandle, ApiManifest, DataFailurePolicy, HeadMeta, RequestPhase, ServerBridge, SsrCoreError,
    StateError, StateSource, GET_DATA, GET_PAYLOAD,
};
use uuid::Uuid;

use crate::error::{Result, SsrError};
use crate::route::{Renderer, Route};
use crate::scope::SsrScope;

/// Unique identifier for a request, used for tracing and logging.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct RequestId(Uuid);

impl RequestId {
    pub fn new() -> Self {
        Self(Uuid::new_v4())
    }

    /// Reuse a valid `x-request-id` header, or generate a new id.
    pub fn from_headers(headers: &HeaderMap) -> Self {
        headers
            .get("x-request-id")
            .and_then(|v| v.to_str().ok())
            .and_then(|s| Uuid::parse_str(s).ok())
            .map(Self)
            .unwrap_or_default()
    }
}

impl Default for RequestId {
    fn default() -> Self {
        Self::new()
    }
}

impl std::fmt::Display for RequestId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Outgoing status and headers, filled in before the first byte is sent.
#[derive(Debug, Clone)]
pub struct ResponseHead {
    pub status: StatusCode,
    pub headers: HeaderMap,
}

impl Default for ResponseHead {
    fn default() -> Self {
        Self {
            status: StatusCode::OK,
            headers: HeaderMap::new(),
        }
    }
}

/// Context view inlined into the page as `window.route`.
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ClientRouteView<'a> {
    pub url: String,
    pub path: &'a str,
    pub data: Option<&'a Value>,
    pub head: &'a HeadMeta,
    pub server_only: bool,
    pub streaming: bool,
    pub errors: &'a BTreeMap<String, StateError>,
    pub payload: Option<&'a Value>,
    pub global: Option<&'a Value>,
    /// Payloads are pre-generated `index.json` files.
    pub static_payload: bool,
    /// Operations the client API handle may call.
    pub api: &'a ApiManifest,
}

/// State of one request from route match to response.
pub struct RouteContext {
    scope: Arc<SsrScope>,
    request: Parts,
    response: ResponseHead,
    route: Arc<Route>,
    client: Arc<dyn Renderer>,
    request_id: RequestId,
    phase: RequestPhase,
    data: Option<Value>,
    error: Option<StateError>,
    errors: BTreeMap<String, StateError>,
    payload: Option<Value>,
    global: Option<Value>,
    pub head: HeadMeta,
    pub server_only: bool,
    pub streaming: bool,
}

impl RouteContext {
    pub fn new(scope: Arc<SsrScope>, request: Parts, route: Arc<Route>) -> Self {
        let request_id = RequestId::from_headers(&request.headers);
        let client = Arc::clone(&scope.renderer);
        let global = scope.global.clone();

        Self {
            head: route.head.clone(),
            server_only: route.server_only,
            streaming: route.streaming,
            scope,
            request,
            response: ResponseHead::default(),
            route,
            client,
            request_id,
            phase: RequestPhase::Created,
            data: None,
            error: None,
            errors: BTreeMap::new(),
            payload: None,
            global,
        }
    }

    pub fn scope(&self) -> &Arc<SsrScope> {
        &self.scope
    }

    pub fn request(&self) -> &Parts {
        &self.request
    }

    pub fn response(&self) -> &ResponseHead {
        &self.response
    }

    /// Response head, writable until the response is sent.
    pub fn response_mut(&mut self) -> Result<&mut ResponseHead> {
        self.ensure_open()?;
        Ok(&mut self.response)
    }

    pub fn route(&self) -> &Arc<Route> {
        &self.route
    }

    /// The renderer serving this request.
    pub fn client(&self) -> &Arc<dyn Renderer> {
        &self.client
    }

    pub fn request_id(&self) -> RequestId {
        self.request_id
    }

    pub fn phase(&self) -> RequestPhase {
        self.phase
    }

    pub fn data(&self) -> Option<&Value> {
        self.data.as_ref()
    }

    /// Set route data. Allowed once, and only before rendering starts.
    pub fn set_data(&mut self, data: Value) -> Result<()> {
        self.ensure_open()?;
        if !matches!(self.phase, RequestPhase::Created | RequestPhase::DataFetching) {
            return Err(SsrCoreError::InvalidTransition {
                from: self.phase,
                to: RequestPhase::DataFetching,
            }
            .into());
        }
        if self.data.is_some() {
            return Err(SsrCoreError::DataAlreadySet.into());
        }
        self.data = Some(data);
        Ok(())
    }

    pub fn set_payload(&mut self, payload: Value) -> Result<()> {
        self.ensure_open()?;
        self.payload = Some(payload);
        Ok(())
    }

    /// Record a failed operation so page code can render a degraded state.
    pub fn record_error(&mut self, operation: impl Into<String>, error: StateError) -> Result<()> {
        self.ensure_open()?;
        self.errors.insert(operation.into(), error.clone());
        self.error = Some(error);
        Ok(())
    }

    /// Run the route's data loader, if it has one.
    ///
    /// Completes before rendering may begin. Failures are logged and then
    /// handled according to `policy`; only [`DataFailurePolicy::Abort`]
    /// returns an error.
    pub async fn fetch_data(&mut self, policy: DataFailurePolicy) -> Result<()> {
        let Some(loader) = self.route.get_data.clone() else {
            return Ok(());
        };

        self.phase = self.phase.transition(RequestPhase::DataFetching)?;

        match loader().await {
            Ok(data) => self.set_data(data),
            Err(e) => {
                tracing::error!(
                    route = %self.route.path,
                    request_id = %self.request_id,
                    error = %e,
                    ?policy,
                    "Data loader failed"
                );

                match policy {
                    DataFailurePolicy::RenderDegraded => Ok(()),
                    DataFailurePolicy::ExposeError => {
                        self.record_error(GET_DATA, StateError::from_error(GET_DATA, &e))
                    }
                    DataFailurePolicy::Abort => Err(SsrError::DataFetch {
                        route: self.route.path.clone(),
                        reason: e.to_string(),
                    }),
                }
            }
        }
    }

    /// Run the route's payload loader, if it has one, so the first render
    /// ships the payload inline.
    ///
    /// Failures are logged and recorded under `getPayload`; they never fail
    /// the request.
    pub async fn fetch_payload(&mut self) -> Result<()> {
        let Some(loader) = self.route.get_payload.clone() else {
            return Ok(());
        };

        match loader().await {
            Ok(payload) => self.set_payload(payload),
            Err(e) => {
                tracing::warn!(
                    route = %self.route.path,
                    request_id = %self.request_id,
                    error = %e,
                    "Payload loader failed"
                );
                self.record_error(GET_PAYLOAD, StateError::from_error(GET_PAYLOAD, &e))
            }
        }
    }

    pub fn begin_render(&mut self) -> Result<()> {
        self.phase = self.phase.transition(RequestPhase::Rendering)?;
        Ok(())
    }

    /// Seal the context; every later mutation fails.
    pub fn mark_sent(&mut self) -> Result<()> {
        self.phase = self.phase.transition(RequestPhase::Sent)?;
        Ok(())
    }

    /// The context as shipped to the client.
    pub fn client_view(&self) -> ClientRouteView<'_> {
        ClientRouteView {
            url: self.request.uri.to_string(),
            path: &self.route.path,
            data: self.data.as_ref(),
            head: &self.head,
            server_only: self.server_only,
            streaming: self.streaming,
            errors: &self.errors,
            payload: self.payload.as_ref(),
            global: self.global.as_ref(),
            static_payload: self.scope.config.static_payload,
            api: &self.scope.api_manifest,
        }
    }

    /// [`client_view`](Self::client_view) as a JSON value.
    pub fn to_client_json(&self) -> Result<Value> {
        serde_json::to_value(self.client_view())
            .map_err(|e| SsrCoreError::Serialization(e.to_string()).into())
    }

    /// Isomorphic state bridge over this request.
    pub fn bridge(&self) -> ServerBridge<'_, Self> {
        ServerBridge::new(self)
    }

    fn ensure_open(&self) -> Result<()> {
        if self.phase.is_open() {
            Ok(())
        } else {
            Err(SsrCoreError::ContextSealed.into())
        }
    }
}

impl StateSource for RouteContext {
    fn error(&self) -> Option<&StateError> {
        self.error.as_ref()
    }

    fn errors(&self) -> &BTreeMap<String, StateError> {
        &self.errors
    }

    fn payload(&self) -> Option<&Value> {
        self.payload.as_ref()
    }

    fn global(&self) -> Option<&Value> {
        self.global.as_ref()
    }

    fn data(&self) -> Option<&Value> {
        self.data.as_ref()
    }

    fn api(&self) -> Option<Arc<dyn ApiHandle>> {
        self.scope.api.clone()
    }
}

#[cfg(test)]
pub(crate) mod tests {
    use super::*;
    use crate::route::RouteTable;
    use crate::stream::RenderBody;
    use async_trait::async_trait;
    use axum::http::Request;
    use serde_json::json;
    use universify_ssr_core::{IsomorphicBridge, SsrConfig};

    pub(crate) struct StaticRenderer(pub &'static str);

    #[async_trait]
    impl Renderer for StaticRenderer {
        async fn render(&self, _context: &mut RouteContext) -> Result<RenderBody> {
            Ok(RenderBody::html(self.0))
        }
    }

    pub(crate) const SHELL: &str = "<html><head><!-- head --><!-- hydration --></head><body><!-- element --></body></html>";

    pub(crate) fn scope_with(routes: RouteTable, config: SsrConfig) -> Arc<SsrScope> {
        Arc::new(
            SsrScope::new(SHELL, routes, Arc::new(StaticRenderer("<p>hi</p>")), config).unwrap(),
        )
    }

    pub(crate) fn context_for(route: Route, uri: &str) -> RouteContext {
        let routes = RouteTable::new().with_route(route);
        let scope = scope_with(routes, SsrConfig::with_defaults());
        let route = Arc::clone(scope.routes.iter().next().unwrap());
        let (parts, _) = Request::builder().uri(uri).body(()).unwrap().into_parts();
        RouteContext::new(scope, parts, route)
    }

    #[tokio::test]
    async fn test_fetch_data_sets_data_once() {
        let route = Route::new("/docs")
            .unwrap()
            .data_loader(|| async { Ok(json!({"title": "Docs"})) });
        let mut ctx = context_for(route, "/docs");

        ctx.fetch_data(DataFailurePolicy::ExposeError).await.unwrap();
        assert_eq!(ctx.phase(), RequestPhase::DataFetching);
        assert_eq!(ctx.data(), Some(&json!({"title": "Docs"})));

        let again = ctx.set_data(json!("other"));
        assert!(matches!(again, Err(SsrError::Core(SsrCoreError::DataAlreadySet))));
    }

    #[tokio::test]
    async fn test_without_loader_phase_stays_created() {
        let mut ctx = context_for(Route::new("/").unwrap(), "/");
        ctx.fetch_data(DataFailurePolicy::Abort).await.unwrap();
        assert_eq!(ctx.phase(), RequestPhase::Created);
        ctx.begin_render().unwrap();
        assert_eq!(ctx.phase(), RequestPhase::Rendering);
    }

    fn failing_route() -> Route {
        Route::new("/docs")
            .unwrap()
            .data_loader(|| async { Err(anyhow::anyhow!("database down")) })
    }

    #[tokio::test]
    async fn test_failed_loader_render_degraded() {
        let mut ctx = context_for(failing_route(), "/docs");
        ctx.fetch_data(DataFailurePolicy::RenderDegraded).await.unwrap();

        assert!(ctx.data().is_none());
        assert!(ctx.errors().is_empty());
        ctx.begin_render().unwrap();
    }

    #[tokio::test]
    async fn test_failed_loader_expose_error() {
        let mut ctx = context_for(failing_route(), "/docs");
        ctx.fetch_data(DataFailurePolicy::ExposeError).await.unwrap();

        assert!(ctx.data().is_none());
        assert_eq!(
            ctx.errors().get(GET_DATA),
            Some(&StateError::new(GET_DATA, "database down"))
        );

        let mut bridge = ctx.bridge();
        assert_eq!(bridge.use_data(), None);
        assert!(bridge.use_isomorphic().error.is_some());
    }

    #[tokio::test]
    async fn test_failed_loader_abort() {
        let mut ctx = context_for(failing_route(), "/docs");
        let result = ctx.fetch_data(DataFailurePolicy::Abort).await;

        assert!(matches!(result, Err(SsrError::DataFetch { .. })));
        assert!(ctx.data().is_none());
    }

    #[tokio::test]
    async fn test_fetch_payload_inlines_payload() {
        let route = Route::new("/docs")
            .unwrap()
            .payload_loader(|| async { Ok(json!({"toc": ["a"]})) });
        let mut ctx = context_for(route, "/docs");

        ctx.fetch_payload().await.unwrap();
        assert_eq!(ctx.client_view().payload, Some(&json!({"toc": ["a"]})));
        assert_eq!(ctx.bridge().use_payload(), Some(json!({"toc": ["a"]})));
    }

    #[tokio::test]
    async fn test_fetch_payload_failure_is_recorded() {
        let route = Route::new("/docs")
            .unwrap()
            .payload_loader(|| async { Err(anyhow::anyhow!("cms offline")) });
        let mut ctx = context_for(route, "/docs");

        ctx.fetch_payload().await.unwrap();
        assert_eq!(
            ctx.errors().get(GET_PAYLOAD),
            Some(&StateError::new(GET_PAYLOAD, "cms offline"))
        );
        assert_eq!(ctx.bridge().use_payload(), None);
    }

    #[tokio::test]
    async fn test_data_cannot_be_set_while_rendering() {
        let mut ctx = context_for(Route::new("/").unwrap(), "/");
        ctx.begin_render().unwrap();
        assert!(ctx.set_data(json!(1)).is_err());
        assert!(ctx.data().is_none());
    }

    #[test]
    fn test_sent_context_is_sealed() {
        let mut ctx = context_for(Route::new("/").unwrap(), "/");
        ctx.begin_render().unwrap();
        ctx.mark_sent().unwrap();

        assert!(matches!(
            ctx.record_error("x", StateError::new("x", "y")),
            Err(SsrError::Core(SsrCoreError::ContextSealed))
        ));
        assert!(ctx.response_mut().is_err());
        assert!(ctx.set_payload(json!(1)).is_err());
        assert!(ctx.mark_sent().is_err());
    }

    #[test]
    fn test_client_view_serializes_camel_case() {
        let mut ctx = context_for(Route::new("/docs").unwrap().server_only(true), "/docs?page=2");
        ctx.set_data(json!({"n": 1})).unwrap();

        let value = serde_json::to_value(ctx.client_view()).unwrap();
        assert_eq!(value["url"], "/docs?page=2");
        assert_eq!(value["path"], "/docs");
        assert_eq!(value["data"], json!({"n": 1}));
        assert_eq!(value["serverOnly"], true);
        assert_eq!(value["streaming"], false);
        assert_eq!(value["errors"], json!({}));
        assert_eq!(value["staticPayload"], false);
        assert_eq!(value["api"], json!({}));
    }

    #[test]
    fn test_request_id_from_header() {
        let mut headers = HeaderMap::new();
        let id = "550e8400-e29b-41d4-a716-446655440000";
        headers.insert("x-request-id", id.parse().unwrap());
        assert_eq!(RequestId::from_headers(&headers).to_string(), id);

        headers.insert("x-request-id", "not-a-uuid".parse().unwrap());
        Uuid::parse_str(&RequestId::from_headers(&headers).to_string()).expect("Should be valid UUID");
    }
}
