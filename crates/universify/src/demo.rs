//! Demo pages and the renderer that draws them.

use std::time::Duration;

use async_trait::async_trait;
use bytes::Bytes;
use serde_json::{json, Value};
use universify_ssr::{
    escape_html, HeadMeta, IsomorphicBridge, RenderBody, Renderer, Route, RouteContext,
    RouteTable, SsrError,
};

/// Delay between streamed documentation sections.
const SECTION_DELAY: Duration = Duration::from_millis(25);

/// Routes served by the demo server.
pub fn routes() -> universify_ssr::Result<RouteTable> {
    Ok(RouteTable::new()
        .with_route(
            Route::new("/")?
                .head(HeadMeta::new().meta("description", "Streaming universal rendering"))
                .data_loader(|| async {
                    Ok(json!({
                        "title": "Universify",
                        "pages": ["/docs", "/about", "/status"],
                    }))
                }),
        )
        .with_route(
            Route::new("/docs")?
                .streaming(true)
                .data_loader(|| async {
                    Ok(json!({
                        "title": "Docs",
                        "sections": ["Shells", "Streaming", "Hydration", "Payloads"],
                    }))
                })
                .payload_loader(|| async {
                    Ok(json!({ "toc": ["shells", "streaming", "hydration", "payloads"] }))
                }),
        )
        .with_route(Route::new("/about")?.server_only(true))
        .with_route(
            Route::new("/status")?
                .data_loader(|| async { Err(anyhow::anyhow!("status backend unreachable")) }),
        ))
}

/// Renders the demo pages from route data.
#[derive(Debug, Default)]
pub struct DemoRenderer;

#[async_trait]
impl Renderer for DemoRenderer {
    async fn render(&self, context: &mut RouteContext) -> universify_ssr::Result<RenderBody> {
        let (data, error, global) = {
            let mut bridge = context.bridge();
            let data = bridge.use_data();
            let state = bridge.use_isomorphic();
            (data, state.error.clone(), state.global.clone())
        };

        let title = data
            .as_ref()
            .and_then(|d| d["title"].as_str())
            .unwrap_or(context.route().path.as_str())
            .to_string();
        let app_name = global
            .as_ref()
            .and_then(|g| g["appName"].as_str())
            .unwrap_or("universify")
            .to_string();
        context.head = std::mem::take(&mut context.head).title(format!("{title} | {app_name}"));

        if let Some(error) = error {
            return Ok(RenderBody::html(format!(
                "<h1>{}</h1><p class=\"error\">Could not load this page: {}</p>",
                escape_html(&title),
                escape_html(&error.message)
            )));
        }

        let header = format!("<h1>{}</h1>", escape_html(&title));
        match context.route().path.as_str() {
            "/docs" => Ok(sections(header, strings(data.as_ref(), "sections"))),
            "/about" => Ok(RenderBody::html(format!(
                "{header}<p>Rendered on the server only.</p>"
            ))),
            _ => {
                let links: String = strings(data.as_ref(), "pages")
                    .iter()
                    .map(|page| {
                        let page = escape_html(page);
                        format!("<li><a href=\"{page}\">{page}</a></li>")
                    })
                    .collect();
                Ok(RenderBody::html(format!("{header}<ul>{links}</ul>")))
            }
        }
    }
}

fn strings(data: Option<&Value>, key: &str) -> Vec<String> {
    data.and_then(|d| d[key].as_array())
        .map(|items| {
            items
                .iter()
                .filter_map(|item| item.as_str().map(str::to_string))
                .collect()
        })
        .unwrap_or_default()
}

/// Header first, then one chunk per section.
fn sections(header: String, sections: Vec<String>) -> RenderBody {
    RenderBody::stream(async_stream::stream! {
        yield Ok::<_, SsrError>(Bytes::from(header));
        for section in sections {
            tokio::time::sleep(SECTION_DELAY).await;
            yield Ok(Bytes::from(format!("<section><h2>{}</h2></section>", escape_html(&section))));
        }
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_routes() {
        let routes = routes().unwrap();

        assert_eq!(routes.len(), 4);
        assert!(routes.find("/docs").unwrap().streaming);
        assert!(routes.find("/about").unwrap().server_only);
        assert!(routes.find("/docs").unwrap().get_payload.is_some());
    }

    #[test]
    fn test_strings_skips_non_strings() {
        let data = json!({"pages": ["/a", 1, "/b"]});
        assert_eq!(strings(Some(&data), "pages"), vec!["/a", "/b"]);
        assert!(strings(None, "pages").is_empty());
    }
}
