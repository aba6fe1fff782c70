//! Application-wide rendering scope.

use std::fmt;
use std::sync::Arc;

use axum::{
    http::StatusCode,
    response::{Html, IntoResponse, Response},
};
use serde_json::Value;
use universify_ssr_core::{escape_html, ApiHandle, ApiManifest, SsrConfig};

use crate::context::RouteContext;
use crate::error::{sanitize_error, Result, SsrError};
use crate::html::HtmlFunction;
use crate::route::{ErrorHandler, Renderer, RouteTable};

/// Everything shared by the requests of one application: the compiled
/// shell, the route table, the renderer and the server-side API handle.
pub struct SsrScope {
    pub config: SsrConfig,
    pub html: HtmlFunction,
    pub routes: RouteTable,
    pub renderer: Arc<dyn Renderer>,
    /// Value exposed to pages as `global`.
    pub global: Option<Value>,
    /// Server-side API handle exposed to pages as `api`.
    pub api: Option<Arc<dyn ApiHandle>>,
    /// Operations inlined into pages for the client API handle.
    pub api_manifest: ApiManifest,
    /// Used by routes without their own error handler.
    pub error_handler: ErrorHandler,
}

impl SsrScope {
    /// Compile the shell and assemble the scope.
    pub fn new(
        shell: &str,
        routes: RouteTable,
        renderer: Arc<dyn Renderer>,
        config: SsrConfig,
    ) -> Result<Self> {
        let html = HtmlFunction::new(shell, &config)?;

        tracing::info!(
            routes = routes.len(),
            static_payload = config.static_payload,
            data_failure_policy = ?config.data_failure_policy,
            "Rendering scope initialized"
        );

        Ok(Self {
            config,
            html,
            routes,
            renderer,
            global: None,
            api: None,
            api_manifest: ApiManifest::new(),
            error_handler: Arc::new(default_error_page),
        })
    }

    pub fn with_global(mut self, global: Value) -> Self {
        self.global = Some(global);
        self
    }

    pub fn with_api(mut self, api: Arc<dyn ApiHandle>) -> Self {
        self.api = Some(api);
        self
    }

    pub fn with_api_manifest(mut self, manifest: ApiManifest) -> Self {
        self.api_manifest = manifest;
        self
    }

    pub fn with_error_handler<F>(mut self, handler: F) -> Self
    where
        F: Fn(&SsrError, &RouteContext) -> Response + Send + Sync + 'static,
    {
        self.error_handler = Arc::new(handler);
        self
    }

    /// Error handler for a context: the route's own, else the scope default.
    pub fn error_handler_for(&self, context: &RouteContext) -> ErrorHandler {
        context
            .route()
            .error_handler
            .clone()
            .unwrap_or_else(|| Arc::clone(&self.error_handler))
    }
}

impl fmt::Debug for SsrScope {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SsrScope")
            .field("config", &self.config)
            .field("routes", &self.routes)
            .field("global", &self.global)
            .field("api_manifest", &self.api_manifest)
            .finish_non_exhaustive()
    }
}

/// Minimal error page with a sanitized message.
pub fn default_error_page(error: &SsrError, _context: &RouteContext) -> Response {
    let status = match error {
        SsrError::Status { status, .. } => {
            StatusCode::from_u16(*status).unwrap_or(StatusCode::BAD_GATEWAY)
        }
        _ => StatusCode::INTERNAL_SERVER_ERROR,
    };

    let message = escape_html(&sanitize_error(error));
    (
        status,
        Html(format!(
            "<!DOCTYPE html>\n<html>\n<head><title>Error</title></head>\n<body>\n<h1>Something went wrong</h1>\n<p>{message}</p>\n</body>\n</html>"
        )),
    )
        .into_response()
}
