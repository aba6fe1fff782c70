use std::{sync::Arc, time::Duration};

use axum::{http::StatusCode, routing::get, Extension, Router};
use tower_http::{timeout::TimeoutLayer, trace::TraceLayer};
use universify_ssr::{create_router, SsrScope};

use crate::handlers::{get_post, healthz, livez};

/// Create the application router with all routes and middleware.
pub fn create_app(scope: Arc<SsrScope>, request_timeout: Duration) -> Router {
    let api_routes = Router::new().route("/posts/{id}", get(get_post));

    create_router(Arc::clone(&scope))
        .route("/livez", get(livez))
        .route("/healthz", get(healthz))
        .nest("/api", api_routes)
        .layer(Extension(scope))
        .layer(TraceLayer::new_for_http())
        .layer(TimeoutLayer::with_status_code(
            StatusCode::REQUEST_TIMEOUT,
            request_timeout,
        ))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::demo::{self, DemoRenderer};
    use axum::{
        body::Body,
        http::{header, Request, StatusCode},
    };
    use http_body_util::BodyExt;
    use serde_json::{json, Value};
    use tower::ServiceExt;
    use universify_ssr::{extract_bootstrap, DataFailurePolicy, SsrConfig, GET_DATA};

    const SHELL: &str = include_str!("../index.html");

    fn app_with(policy: DataFailurePolicy) -> Router {
        let config = SsrConfig {
            data_failure_policy: policy,
            ..SsrConfig::with_defaults()
        };
        let scope = SsrScope::new(
            SHELL,
            demo::routes().unwrap(),
            Arc::new(DemoRenderer),
            config,
        )
        .unwrap()
        .with_global(json!({"appName": "Demo"}));

        create_app(Arc::new(scope), Duration::from_secs(10))
    }

    fn app() -> Router {
        app_with(DataFailurePolicy::ExposeError)
    }

    async fn get(app: Router, uri: &str) -> (StatusCode, String) {
        let response = app
            .oneshot(Request::builder().uri(uri).body(Body::empty()).unwrap())
            .await
            .unwrap();
        let status = response.status();
        let body = response.into_body().collect().await.unwrap().to_bytes();
        (status, String::from_utf8(body.to_vec()).unwrap())
    }

    #[tokio::test]
    async fn test_livez() {
        let (status, _) = get(app(), "/livez").await;
        assert_eq!(status, StatusCode::OK);
    }

    #[tokio::test]
    async fn test_healthz_lists_routes() {
        let (status, body) = get(app(), "/healthz").await;
        assert_eq!(status, StatusCode::OK);

        let json: Value = serde_json::from_str(&body).unwrap();
        assert_eq!(json["routes"].as_array().unwrap().len(), 4);
        assert_eq!(json["config"]["dataFailurePolicy"], "expose-error");
    }

    #[tokio::test]
    async fn test_index_page_is_hydrated() {
        let response = app()
            .oneshot(Request::builder().uri("/").body(Body::empty()).unwrap())
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::OK);
        assert_eq!(
            response.headers().get(header::CONTENT_TYPE).unwrap(),
            "text/html; charset=utf-8"
        );

        let body = response.into_body().collect().await.unwrap().to_bytes();
        let html = String::from_utf8(body.to_vec()).unwrap();

        assert!(html.contains("<title>Universify | Demo</title>"));
        assert!(html.contains("<a href=\"/docs\">/docs</a>"));
        assert!(html.contains("<script type=\"module\""));

        let bootstrap = extract_bootstrap(&html).unwrap().unwrap();
        assert_eq!(bootstrap.route["global"], json!({"appName": "Demo"}));
    }

    #[tokio::test]
    async fn test_docs_page_streams_all_sections_in_order() {
        let (status, html) = get(app(), "/docs").await;
        assert_eq!(status, StatusCode::OK);

        let shells = html.find("<h2>Shells</h2>").unwrap();
        let payloads = html.find("<h2>Payloads</h2>").unwrap();
        assert!(shells < payloads);
        assert!(payloads < html.find("</html>").unwrap());
    }

    #[tokio::test]
    async fn test_about_page_is_server_only() {
        let (status, html) = get(app(), "/about").await;
        assert_eq!(status, StatusCode::OK);
        assert!(html.contains("Rendered on the server only."));
        assert!(!html.contains("window.route"));
        assert!(!html.contains("<script"));
    }

    #[tokio::test]
    async fn test_status_page_exposes_data_failure() {
        let (status, html) = get(app(), "/status").await;
        assert_eq!(status, StatusCode::OK);
        assert!(html.contains("Could not load this page"));

        let bootstrap = extract_bootstrap(&html).unwrap().unwrap();
        assert_eq!(
            bootstrap.route["errors"][GET_DATA]["message"],
            "status backend unreachable"
        );
    }

    #[tokio::test]
    async fn test_status_page_aborts_under_abort_policy() {
        let (status, html) = get(app_with(DataFailurePolicy::Abort), "/status").await;
        assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
        assert!(html.contains("Failed to load data for /status"));
    }

    #[tokio::test]
    async fn test_payload_endpoint() {
        let (status, body) = get(app(), "/-/payload/docs").await;
        assert_eq!(status, StatusCode::OK);

        let json: Value = serde_json::from_str(&body).unwrap();
        assert_eq!(json["toc"][0], "shells");
    }

    #[tokio::test]
    async fn test_api_post() {
        let (status, body) = get(app(), "/api/posts/1").await;
        assert_eq!(status, StatusCode::OK);

        let json: Value = serde_json::from_str(&body).unwrap();
        assert_eq!(json, json!({"id": 1, "title": "Streaming the shell"}));
    }

    #[tokio::test]
    async fn test_api_missing_post() {
        let (status, _) = get(app(), "/api/posts/99").await;
        assert_eq!(status, StatusCode::NOT_FOUND);
    }

    #[tokio::test]
    async fn test_unknown_route() {
        let (status, _) = get(app(), "/missing").await;
        assert_eq!(status, StatusCode::NOT_FOUND);
    }
}
