//! Hydration bootstrap script generation.
//!
//! The server inlines the current route context and the route table into the
//! page so the client can resume without re-fetching what it already has.
//! Values go through [`serialize_for_script`], which emits JSON that cannot
//! terminate the surrounding `<script>` element.

use serde::Serialize;
use serde_json::Value;

use crate::error::{Result, SsrCoreError};

const ROUTE_BINDING: &str = "window.route = ";
const ROUTES_BINDING: &str = "window.routes = ";

/// Serialize a value as JSON that is safe to embed inside a `<script>` block.
///
/// `<`, `>` and `&` only occur inside JSON strings, so replacing them with
/// unicode escapes keeps the output valid JSON and valid JavaScript.
pub fn serialize_for_script<T: Serialize>(value: &T) -> Result<String> {
    let json =
        serde_json::to_string(value).map_err(|e| SsrCoreError::Serialization(e.to_string()))?;

    let mut out = String::with_capacity(json.len());
    for c in json.chars() {
        match c {
            '<' => out.push_str("\\u003C"),
            '>' => out.push_str("\\u003E"),
            '&' => out.push_str("\\u0026"),
            '\u{2028}' => out.push_str("\\u2028"),
            '\u{2029}' => out.push_str("\\u2029"),
            c => out.push(c),
        }
    }
    Ok(out)
}

/// Build the `<script>` block assigning `window.route` and `window.routes`.
///
/// Fails with `PayloadTooLarge` when the script exceeds `max_size` bytes.
pub fn hydration_script<R, T>(route: &R, routes: &T, max_size: usize) -> Result<String>
where
    R: Serialize,
    T: Serialize,
{
    let route = serialize_for_script(route)?;
    let routes = serialize_for_script(routes)?;

    let script = format!("<script>\n{ROUTE_BINDING}{route}\n{ROUTES_BINDING}{routes}\n</script>");

    if script.len() > max_size {
        return Err(SsrCoreError::PayloadTooLarge {
            size: script.len(),
            max: max_size,
        });
    }

    Ok(script)
}

/// Values read back from a rendered page's bootstrap script.
#[derive(Debug, Clone, PartialEq)]
pub struct Bootstrap {
    pub route: Value,
    pub routes: Value,
}

/// Extract the bootstrap values from rendered HTML.
///
/// Returns `Ok(None)` for pages without a bootstrap script (server-only pages).
pub fn extract_bootstrap(html: &str) -> Result<Option<Bootstrap>> {
    let mut route = None;
    let mut routes = None;

    for line in html.lines() {
        let line = line.trim_start();
        if let Some(json) = line.strip_prefix(ROUTES_BINDING) {
            routes = Some(parse(json)?);
        } else if let Some(json) = line.strip_prefix(ROUTE_BINDING) {
            route = Some(parse(json)?);
        }
        if route.is_some() && routes.is_some() {
            break;
        }
    }

    Ok(match (route, routes) {
        (Some(route), Some(routes)) => Some(Bootstrap { route, routes }),
        _ => None,
    })
}

fn parse(json: &str) -> Result<Value> {
    serde_json::from_str(json.trim()).map_err(|e| SsrCoreError::Serialization(e.to_string()))
}
