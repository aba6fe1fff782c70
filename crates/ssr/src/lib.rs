//! Streaming universal rendering - Imperative Shell.
//!
//! This crate performs the I/O around the pure logic in
//! `universify_ssr_core`: it runs route data loaders, drives the renderer,
//! streams `head + body + footer` responses through axum, and fetches
//! payloads and API calls over HTTP on the client side.
//!
//! # Architecture
//!
//! - **Functional Core** (`universify_ssr_core`): templates, hydration script,
//!   lifecycle, payload paths, isomorphic state
//! - **Imperative Shell** (this crate): request contexts, streaming, routing,
//!   HTTP fetching
//!
//! # Example
//!
//! ```ignore
//! use std::sync::Arc;
//! use universify_ssr::{create_router, Route, RouteTable, SsrConfig, SsrScope};
//!
//! let routes = RouteTable::new().with_route(
//!     Route::new("/docs")?.data_loader(|| async { Ok(serde_json::json!({"title": "Docs"})) }),
//! );
//!
//! // Compile the shell once at startup (fails on a malformed shell)
//! let scope = SsrScope::new(SHELL, routes, Arc::new(MyRenderer), SsrConfig::with_defaults())?;
//!
//! let app = create_router(Arc::new(scope));
//! ```

mod api;
mod context;
mod error;
mod fetch;
mod html;
mod route;
mod router;
mod scope;
mod stream;

// Re-export core types for convenience
pub use universify_ssr_core::{
    escape_html, extract_bootstrap, ApiError, ApiFactory, ApiHandle, ApiManifest, Bootstrap,
    ClientBridge, DataFailurePolicy, HeadMeta, IsomorphicBridge, IsomorphicState, PageGlobals,
    PayloadMode, RequestPhase, SsrConfig, SsrCoreError, StateError, GET_DATA, GET_PAYLOAD,
    MAX_BOOTSTRAP_SIZE,
};

// Export shell types
pub use api::{HttpApi, HttpApiFactory};
pub use context::{ClientRouteView, RequestId, ResponseHead, RouteContext};
pub use error::{sanitize_error, Result, SsrError};
pub use fetch::{load_payload, PayloadFetcher};
pub use html::{load_shell, HtmlFunction, HTML_CONTENT_TYPE};
pub use route::{DataLoader, ErrorHandler, Renderer, Route, RouteInfo, RouteTable};
pub use router::{create_router, render_route};
pub use scope::{default_error_page, SsrScope};
pub use stream::{generate_html_stream, ChunkStream, HtmlParts, RenderBody, StreamMode};
