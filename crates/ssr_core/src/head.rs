//! Page-level `<head>` elements.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

/// Attributes of a single `<meta>` or `<link>` element.
pub type Attributes = BTreeMap<String, String>;

/// Head metadata declared by a route.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct HeadMeta {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub title: Option<String>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub meta: Vec<Attributes>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub link: Vec<Attributes>,
}

impl HeadMeta {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn title(mut self, title: impl Into<String>) -> Self {
        self.title = Some(title.into());
        self
    }

    /// Add a `<meta name=.. content=..>` element.
    pub fn meta(mut self, name: impl Into<String>, content: impl Into<String>) -> Self {
        self.meta.push(Attributes::from([
            ("name".to_string(), name.into()),
            ("content".to_string(), content.into()),
        ]));
        self
    }

    /// Add a `<link rel=.. href=..>` element.
    pub fn link(mut self, rel: impl Into<String>, href: impl Into<String>) -> Self {
        self.link.push(Attributes::from([
            ("rel".to_string(), rel.into()),
            ("href".to_string(), href.into()),
        ]));
        self
    }

    /// Render the elements, one per line. Text and attribute values are escaped.
    pub fn render(&self) -> String {
        let mut lines = Vec::new();

        if let Some(title) = &self.title {
            lines.push(format!("<title>{}</title>", escape_html(title)));
        }
        for attrs in &self.meta {
            lines.push(format!("<meta{}>", render_attributes(attrs)));
        }
        for attrs in &self.link {
            lines.push(format!("<link{}>", render_attributes(attrs)));
        }

        lines.join("\n")
    }
}

/// Attributes with names outside `[A-Za-z0-9_:.-]` are dropped.
fn render_attributes(attrs: &Attributes) -> String {
    attrs
        .iter()
        .filter(|(name, _)| is_attribute_name(name))
        .map(|(name, value)| format!(" {}=\"{}\"", name, escape_html(value)))
        .collect()
}

fn is_attribute_name(name: &str) -> bool {
    !name.is_empty()
        && name
            .chars()
            .all(|c| c.is_ascii_alphanumeric() || matches!(c, '-' | '_' | ':' | '.'))
}

/// Escape text for HTML content and double-quoted attribute values.
pub fn escape_html(input: &str) -> String {
    let mut out = String::with_capacity(input.len());
    for c in input.chars() {
        match c {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            '"' => out.push_str("&quot;"),
            '\'' => out.push_str("&#x27;"),
            c => out.push(c),
        }
    }
    out
}
