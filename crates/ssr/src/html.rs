//! Page response assembly.
//!
//! [`HtmlFunction`] owns the compiled shell. For each render it picks the
//! hydrated or server-only templates, fills the head with page tags and the
//! bootstrap script, and streams `head + body + footer` as an HTML response.

use std::path::Path;

use axum::{
    body::Body,
    http::{header, HeaderValue},
    response::Response,
};
use serde_json::Value;
use universify_ssr_core::{hydration_script, ShellTemplates, SsrConfig};

use crate::context::RouteContext;
use crate::error::Result;
use crate::route::RouteTable;
use crate::stream::{generate_html_stream, HtmlParts, RenderBody, StreamMode};

/// Content type of rendered pages.
pub const HTML_CONTENT_TYPE: &str = "text/html; charset=utf-8";

/// Read an HTML shell from disk.
pub async fn load_shell(path: impl AsRef<Path>) -> Result<String> {
    let path = path.as_ref();
    let shell = tokio::fs::read_to_string(path).await?;
    tracing::debug!(path = %path.display(), bytes = shell.len(), "Loaded HTML shell");
    Ok(shell)
}

/// Compiled shell plus the settings needed to render pages with it.
#[derive(Debug, Clone)]
pub struct HtmlFunction {
    templates: ShellTemplates,
    max_bootstrap_size: usize,
}

impl HtmlFunction {
    /// Compile the shell. Malformed shells fail here, at startup.
    pub fn new(source: &str, config: &SsrConfig) -> Result<Self> {
        Ok(Self {
            templates: ShellTemplates::compile(source)?,
            max_bootstrap_size: config.max_bootstrap_size,
        })
    }

    /// Bootstrap script for a context; empty for server-only pages.
    pub fn hydration(&self, routes: &RouteTable, context: &RouteContext) -> Result<String> {
        if context.server_only {
            return Ok(String::new());
        }
        Ok(hydration_script(
            &context.client_view(),
            &routes.to_json(),
            self.max_bootstrap_size,
        )?)
    }

    /// Render head and footer text and attach the body.
    pub fn parts(
        &self,
        routes: &RouteTable,
        context: &RouteContext,
        body: Option<RenderBody>,
    ) -> Result<HtmlParts> {
        let pair = self.templates.select(context.server_only);

        let mut template_context = context.to_client_json()?;
        let footer = pair.footer.render(&template_context);

        if let Value::Object(fields) = &mut template_context {
            fields.insert("head".to_string(), Value::String(context.head.render()));
            fields.insert(
                "hydration".to_string(),
                Value::String(self.hydration(routes, context)?),
            );
        }
        let head = pair.head.render(&template_context);

        Ok(HtmlParts { head, body, footer })
    }

    /// Build the streaming HTML response for a rendered context.
    pub fn respond(
        &self,
        routes: &RouteTable,
        context: &RouteContext,
        body: Option<RenderBody>,
    ) -> Result<Response> {
        let parts = self.parts(routes, context, body)?;
        let stream = generate_html_stream(parts, StreamMode::from_streaming(context.streaming));

        let head = context.response();
        let mut response = Response::new(Body::from_stream(stream));
        *response.status_mut() = head.status;
        response.headers_mut().extend(head.headers.clone());
        response.headers_mut().insert(
            header::CONTENT_TYPE,
            HeaderValue::from_static(HTML_CONTENT_TYPE),
        );

        Ok(response)
    }
}
