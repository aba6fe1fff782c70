//! Non-page endpoints.
//!
//! - `/livez` - Basic liveness probe (immediate 200, no checks)
//! - `/healthz` - Rendering scope summary
//! - `/api/posts/{id}` - Sample backend for the page API handle

use std::sync::Arc;

use axum::{extract::Path, http::StatusCode, Extension, Json};
use serde::Serialize;
use serde_json::{json, Value};
use universify_ssr::SsrScope;

use crate::error::AppError;

/// GET /livez - Basic liveness probe.
#[axum::debug_handler]
pub async fn livez() -> StatusCode {
    StatusCode::OK
}

/// GET /healthz - Route count and rendering settings.
#[axum::debug_handler]
pub async fn healthz(Extension(scope): Extension<Arc<SsrScope>>) -> Json<Value> {
    Json(json!({
        "routes": scope.routes.to_json(),
        "config": scope.config,
    }))
}

#[derive(Debug, Clone, Serialize)]
pub struct Post {
    pub id: u32,
    pub title: String,
}

/// GET /api/posts/{id} - Look up a sample post.
#[axum::debug_handler]
pub async fn get_post(Path(id): Path<u32>) -> Result<Json<Post>, AppError> {
    let title = match id {
        1 => "Streaming the shell",
        2 => "Hydrating without refetching",
        _ => return Err(AppError::not_found(format!("Post {id} not found"))),
    };

    Ok(Json(Post {
        id,
        title: title.to_string(),
    }))
}
