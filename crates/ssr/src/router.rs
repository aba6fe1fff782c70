//! Route registration.
//!
//! Every route gets its page handler, plus JSON endpoints for whichever
//! loaders it declares:
//!
//! - `GET {path}` - the rendered page
//! - `GET /-/data{path}` - the data loader result
//! - `GET /-/payload{path}` - the payload loader result

use std::sync::Arc;

use axum::{
    extract::Request,
    http::StatusCode,
    response::{IntoResponse, Response},
    routing::get,
    Json, Router,
};
use universify_ssr_core::{data_path, payload_path, PayloadMode};

use crate::context::RouteContext;
use crate::error::SsrError;
use crate::route::{DataLoader, Route};
use crate::scope::SsrScope;

/// Build the router for every route in the scope.
pub fn create_router(scope: Arc<SsrScope>) -> Router {
    let mut router = Router::new();

    for route in scope.routes.iter() {
        if let Some(loader) = route.get_data.clone() {
            router = router.route(
                &data_path(&route.path),
                get(loader_handler(loader, route.path.clone())),
            );
        }

        if let Some(loader) = route.get_payload.clone() {
            router = router.route(
                &payload_path(PayloadMode::Dynamic, &route.path, &route.path),
                get(loader_handler(loader, route.path.clone())),
            );
        }

        let page_scope = Arc::clone(&scope);
        let page_route = Arc::clone(route);
        router = router.route(
            &route.path,
            get(move |request: Request| {
                render_route(Arc::clone(&page_scope), Arc::clone(&page_route), request)
            }),
        );

        tracing::debug!(
            path = %route.path,
            data = route.get_data.is_some(),
            payload = route.get_payload.is_some(),
            "Route registered"
        );
    }

    router
}

fn loader_handler(
    loader: DataLoader,
    path: String,
) -> impl Fn() -> futures_util::future::BoxFuture<'static, Response> + Clone + Send + Sync + 'static
{
    use futures_util::FutureExt;

    move || {
        let loader = Arc::clone(&loader);
        let path = path.clone();
        async move {
            match loader().await {
                Ok(value) => Json(value).into_response(),
                Err(e) => {
                    tracing::error!(route = %path, error = %e, "Loader endpoint failed");
                    (
                        StatusCode::INTERNAL_SERVER_ERROR,
                        Json(serde_json::json!({ "error": format!("Failed to load {path}") })),
                    )
                        .into_response()
                }
            }
        }
        .boxed()
    }
}

/// Serve one page request.
///
/// Data and payload loading finish before rendering starts. Failures before the first
/// byte go to the route's error handler; failures while streaming abort the
/// response body.
pub async fn render_route(scope: Arc<SsrScope>, route: Arc<Route>, request: Request) -> Response {
    let (parts, _body) = request.into_parts();
    let mut context = RouteContext::new(Arc::clone(&scope), parts, route);

    tracing::debug!(
        route = %context.route().path,
        request_id = %context.request_id(),
        "Rendering route"
    );

    match render_context(&scope, &mut context).await {
        Ok(response) => {
            seal(&mut context);
            response
        }
        Err(e) => {
            tracing::error!(
                route = %context.route().path,
                request_id = %context.request_id(),
                error = %e,
                "Route render failed"
            );
            let handler = scope.error_handler_for(&context);
            let response = handler(&e, &context);
            seal(&mut context);
            response
        }
    }
}

async fn render_context(scope: &SsrScope, context: &mut RouteContext) -> Result<Response, SsrError> {
    context.fetch_data(scope.config.data_failure_policy).await?;
    context.fetch_payload().await?;
    context.begin_render()?;

    let renderer = Arc::clone(context.client());
    let body = renderer.render(context).await?;

    scope.html.respond(&scope.routes, context, Some(body))
}

fn seal(context: &mut RouteContext) {
    if let Err(e) = context.mark_sent() {
        tracing::warn!(error = %e, "Route context was already sealed");
    }
}
