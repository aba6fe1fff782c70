//! HTML shell compilation.
//!
//! The shell is split at its single `<!-- element -->` placeholder into a head
//! and a footer fragment. Each fragment becomes a [`CompiledTemplate`] that
//! replaces `<!-- name -->` comments with values looked up in a context.
//! Two variants are produced: one from the source as-is (hydrated pages) and
//! one with module scripts removed (server-only pages, no client code runs).

use std::borrow::Cow;
use std::sync::LazyLock;

use regex::Regex;
use serde::Serialize;
use serde_json::Value;

use crate::error::{Result, SsrCoreError, ELEMENT_PLACEHOLDER};

static INTERPOLATION: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"<!--\s*([A-Za-z_$][\w$]*(?:\.[A-Za-z_$][\w$]*)*)\s*-->")
        .expect("interpolation pattern is valid")
});

static MODULE_SCRIPT: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r#"(?s)<script[^>]+type="module"[^>]*>.*?</script>"#)
        .expect("module script pattern is valid")
});

#[derive(Debug, Clone, PartialEq, Eq)]
enum Segment {
    Literal(String),
    /// Dotted lookup path, e.g. `["head"]` or `["route", "path"]`.
    Slot(Vec<String>),
}

/// An immutable template: literal text interleaved with interpolation slots.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CompiledTemplate {
    segments: Vec<Segment>,
}

impl CompiledTemplate {
    /// Compile a fragment. Comments that are not plain identifiers are kept as text.
    pub fn compile(source: &str) -> Self {
        let mut segments = Vec::new();
        let mut last = 0;

        for captures in INTERPOLATION.captures_iter(source) {
            let (Some(whole), Some(name)) = (captures.get(0), captures.get(1)) else {
                continue;
            };
            if whole.start() > last {
                segments.push(Segment::Literal(source[last..whole.start()].to_string()));
            }
            segments.push(Segment::Slot(
                name.as_str().split('.').map(str::to_string).collect(),
            ));
            last = whole.end();
        }

        if last < source.len() {
            segments.push(Segment::Literal(source[last..].to_string()));
        }

        Self { segments }
    }

    /// Render against a JSON context.
    ///
    /// Strings are inserted raw, numbers and booleans as their JSON text.
    /// Missing values, `null`, arrays and objects render as nothing.
    pub fn render(&self, context: &Value) -> String {
        let mut out = String::new();
        for segment in &self.segments {
            match segment {
                Segment::Literal(text) => out.push_str(text),
                Segment::Slot(path) => {
                    if let Some(value) = lookup(context, path) {
                        push_value(&mut out, value);
                    }
                }
            }
        }
        out
    }

    /// Render against any serializable context.
    pub fn render_with<T: Serialize>(&self, context: &T) -> Result<String> {
        let value = serde_json::to_value(context)
            .map_err(|e| SsrCoreError::Serialization(e.to_string()))?;
        Ok(self.render(&value))
    }

    /// Names of the interpolation slots, in order of appearance.
    pub fn slots(&self) -> Vec<String> {
        self.segments
            .iter()
            .filter_map(|segment| match segment {
                Segment::Slot(path) => Some(path.join(".")),
                Segment::Literal(_) => None,
            })
            .collect()
    }
}

fn lookup<'a>(context: &'a Value, path: &[String]) -> Option<&'a Value> {
    path.iter().try_fold(context, |value, key| value.get(key))
}

fn push_value(out: &mut String, value: &Value) {
    match value {
        Value::String(s) => out.push_str(s),
        Value::Number(n) => out.push_str(&n.to_string()),
        Value::Bool(b) => out.push_str(if *b { "true" } else { "false" }),
        Value::Null | Value::Array(_) | Value::Object(_) => {}
    }
}

/// Head and footer templates of one shell variant.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TemplatePair {
    pub head: CompiledTemplate,
    pub footer: CompiledTemplate,
}

impl TemplatePair {
    fn compile(source: &str) -> Result<Self> {
        let (head, footer) = split_shell(source)?;
        Ok(Self {
            head: CompiledTemplate::compile(head),
            footer: CompiledTemplate::compile(footer),
        })
    }
}

/// All four templates of an HTML shell (head/footer x hydrated/server-only).
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ShellTemplates {
    hydrated: TemplatePair,
    server_only: TemplatePair,
}

impl ShellTemplates {
    /// Compile a shell. Fails unless it contains exactly one placeholder.
    pub fn compile(source: &str) -> Result<Self> {
        let hydrated = TemplatePair::compile(source)?;
        let server_only = TemplatePair::compile(&strip_module_scripts(source))?;
        Ok(Self {
            hydrated,
            server_only,
        })
    }

    /// Templates for a page, picked by its `server_only` flag.
    pub fn select(&self, server_only: bool) -> &TemplatePair {
        if server_only {
            &self.server_only
        } else {
            &self.hydrated
        }
    }
}

/// Remove `<script type="module">` elements. Only meant for trusted shell sources.
pub fn strip_module_scripts(source: &str) -> Cow<'_, str> {
    MODULE_SCRIPT.replace_all(source, "")
}

fn split_shell(source: &str) -> Result<(&str, &str)> {
    match source.matches(ELEMENT_PLACEHOLDER).count() {
        0 => Err(SsrCoreError::MissingPlaceholder),
        1 => source
            .split_once(ELEMENT_PLACEHOLDER)
            .ok_or(SsrCoreError::MissingPlaceholder),
        count => Err(SsrCoreError::MultiplePlaceholders { count }),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    const SHELL: &str = r#"<!DOCTYPE html>
<html>
<head>
<!-- head -->
<!-- hydration -->
<script type="module" src="/client.js"></script>
</head>
<body>
<main><!-- element --></main>
<footer><!-- lang --> <!-- not a slot --></footer>
</body>
</html>"#;

    #[test]
    fn test_compile_is_deterministic() {
        let first = ShellTemplates::compile(SHELL).unwrap();
        let second = ShellTemplates::compile(SHELL).unwrap();
        let ctx = json!({"head": "<title>x</title>", "hydration": "<script></script>", "lang": "en"});

        for server_only in [false, true] {
            let a = first.select(server_only);
            let b = second.select(server_only);
            assert_eq!(a.head.render(&ctx), b.head.render(&ctx));
            assert_eq!(a.footer.render(&ctx), b.footer.render(&ctx));
        }
        assert_eq!(first, second);
    }

    #[test]
    fn test_split_at_placeholder() {
        let templates = ShellTemplates::compile(SHELL).unwrap();
        let pair = templates.select(false);
        let head = pair.head.render(&json!({}));
        let footer = pair.footer.render(&json!({}));

        assert!(head.ends_with("<main>"));
        assert!(footer.starts_with("</main>"));
        assert!(!head.contains("element"));
    }

    #[test]
    fn test_server_only_strips_module_scripts() {
        let templates = ShellTemplates::compile(SHELL).unwrap();
        let hydrated = templates.select(false).head.render(&json!({}));
        let server_only = templates.select(true).head.render(&json!({}));

        assert!(hydrated.contains(r#"<script type="module" src="/client.js"></script>"#));
        assert!(!server_only.contains("type=\"module\""));
    }

    #[test]
    fn test_server_only_strips_multiline_inline_module_scripts() {
        let shell = "<head><script type=\"module\">\nimport './a.js'\n</script><script>var classic = 1;</script></head><!-- element -->";
        let templates = ShellTemplates::compile(shell).unwrap();
        let server_only = templates.select(true).head.render(&json!({}));

        assert_eq!(server_only, "<head><script>var classic = 1;</script></head>");
    }

    #[test]
    fn test_missing_placeholder_fails_at_compile_time() {
        let result = ShellTemplates::compile("<html><body></body></html>");
        assert_eq!(result, Err(SsrCoreError::MissingPlaceholder));
    }

    #[test]
    fn test_multiple_placeholders_fail_at_compile_time() {
        let result = ShellTemplates::compile("<!-- element --><!-- element -->");
        assert_eq!(result, Err(SsrCoreError::MultiplePlaceholders { count: 2 }));
    }

    #[test]
    fn test_interpolation_values() {
        let template = CompiledTemplate::compile(
            "<!-- title -->|<!--count-->|<!-- flag -->|<!-- missing -->|<!-- nested.name -->|<!-- list -->",
        );
        let rendered = template.render(&json!({
            "title": "<b>raw</b>",
            "count": 3,
            "flag": true,
            "nested": {"name": "deep"},
            "list": [1, 2],
        }));
        assert_eq!(rendered, "<b>raw</b>|3|true||deep|");
    }

    #[test]
    fn test_plain_comments_are_kept() {
        let template = CompiledTemplate::compile("<!-- keep me --><!-- slot -->");
        assert_eq!(template.slots(), vec!["slot".to_string()]);
        assert_eq!(template.render(&json!({"slot": "x"})), "<!-- keep me -->x");
    }

    #[test]
    fn test_render_with_serializable_context() {
        #[derive(Serialize)]
        struct Ctx {
            lang: &'static str,
        }
        let template = CompiledTemplate::compile(r#"<html lang="<!-- lang -->">"#);
        assert_eq!(
            template.render_with(&Ctx { lang: "es" }).unwrap(),
            r#"<html lang="es">"#
        );
    }

    #[test]
    fn test_strip_module_scripts_keeps_classic_scripts() {
        let source = r#"<script>window.x = 1</script><script type="module" src="/a.js"></script>"#;
        assert_eq!(strip_module_scripts(source), "<script>window.x = 1</script>");
    }
}
