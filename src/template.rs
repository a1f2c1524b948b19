//! Template rendering seam
//!
//! Destination path strings and non-binary file contents are rendered
//! through a [`TemplateEngine`] whenever a context is supplied. The default
//! [`PlaceholderEngine`] substitutes `<key>` placeholders from the context;
//! callers can install any engine behind the trait.

use crate::types::TemplateContext;
use serde_json::Value;

/// Delimiter settings for placeholder expansion.
#[derive(Debug, Clone)]
pub struct TemplateSettings {
    pub open: String,
    pub close: String,
}

impl Default for TemplateSettings {
    fn default() -> Self {
        TemplateSettings {
            open: "<".to_string(),
            close: ">".to_string(),
        }
    }
}

/// Expands placeholders in a string given a context.
pub trait TemplateEngine: Send + Sync {
    /// Render `text` with `context`. Implementations decide how to treat
    /// unknown placeholders; the error string is surfaced as
    /// [`crate::EditorError::Template`].
    fn render(
        &self,
        text: &str,
        context: &TemplateContext,
        settings: &TemplateSettings,
    ) -> Result<String, String>;
}

/// Default engine: `<key>` placeholders, dotted keys traverse nested
/// objects, unknown placeholders are left verbatim.
#[derive(Debug, Default)]
pub struct PlaceholderEngine;

impl PlaceholderEngine {
    fn lookup<'a>(context: &'a TemplateContext, key: &str) -> Option<&'a Value> {
        let mut parts = key.split('.');
        let mut current = context.get(parts.next()?)?;
        for part in parts {
            current = current.as_object()?.get(part)?;
        }
        Some(current)
    }

    fn value_to_string(value: &Value) -> String {
        match value {
            Value::String(text) => text.clone(),
            other => other.to_string(),
        }
    }

    fn is_key(candidate: &str) -> bool {
        !candidate.is_empty()
            && candidate
                .chars()
                .all(|c| c.is_alphanumeric() || matches!(c, '_' | '.' | '-'))
    }
}

impl TemplateEngine for PlaceholderEngine {
    fn render(
        &self,
        text: &str,
        context: &TemplateContext,
        settings: &TemplateSettings,
    ) -> Result<String, String> {
        let open = settings.open.as_str();
        let close = settings.close.as_str();
        if open.is_empty() || close.is_empty() {
            return Err("template delimiters must be non-empty".to_string());
        }

        let mut out = String::with_capacity(text.len());
        let mut rest = text;
        while let Some(start) = rest.find(open) {
            out.push_str(&rest[..start]);
            let after_open = &rest[start + open.len()..];
            match after_open.find(close) {
                Some(end) if Self::is_key(&after_open[..end]) => {
                    let key = &after_open[..end];
                    match Self::lookup(context, key) {
                        Some(value) => out.push_str(&Self::value_to_string(value)),
                        // Unknown keys pass through untouched.
                        None => {
                            out.push_str(open);
                            out.push_str(key);
                            out.push_str(close);
                        }
                    }
                    rest = &after_open[end + close.len()..];
                }
                _ => {
                    out.push_str(open);
                    rest = after_open;
                }
            }
        }
        out.push_str(rest);
        Ok(out)
    }
}
