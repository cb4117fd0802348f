use std::collections::HashMap;
use std::sync::Arc;

use serde_json::json;
use tera::{Context, Tera};

use crate::assets::AssetLoader;
use crate::layout::Page;
use crate::models::config::AppConfig;
use crate::models::page::PosterSize;

/// Error type for markup production
#[derive(Debug, thiserror::Error)]
pub enum MarkupError {
    #[error("Template error: {0}")]
    Tera(#[from] tera::Error),

    #[error("Theme not found: {0}")]
    ThemeNotFound(String),

    #[error("Failed to read theme template: {0}")]
    TemplateRead(String),
}

/// Turns a planned page into engine-ready markup.
///
/// Themes are data, not code: the renderer picks a template and palette
/// by name and the core never branches on the theme. Implementations
/// must be cheap to call; the expensive work happens in the engine.
pub trait MarkupRenderer: Send + Sync {
    fn render_markup(
        &self,
        page: &Page,
        theme: &str,
        size: PosterSize,
    ) -> Result<String, MarkupError>;

    /// Used by the pipeline to reject unknown themes before any engine
    /// work starts.
    fn has_theme(&self, name: &str) -> bool;
}

/// Tera-backed markup producer rendering SVG poster templates.
pub struct TeraMarkup {
    assets: Arc<AssetLoader>,
    config: Arc<AppConfig>,
}

impl TeraMarkup {
    pub fn new(assets: Arc<AssetLoader>, config: Arc<AppConfig>) -> Self {
        tracing::info!(themes = config.themes.len(), "Markup renderer initialized");
        Self { assets, config }
    }

    /// Register custom Tera filters
    fn register_filters(tera: &mut Tera) {
        // wrap filter: word-aware line wrapping, one array element per line
        tera.register_filter(
            "wrap",
            |value: &tera::Value, args: &HashMap<String, tera::Value>| {
                let s = tera::try_get_value!("wrap", "value", String, value);
                let width = args
                    .get("width")
                    .and_then(|v| v.as_u64())
                    .unwrap_or(34)
                    .max(1) as usize;

                let lines = wrap_words(&s, width)
                    .into_iter()
                    .map(tera::Value::String)
                    .collect();
                Ok(tera::Value::Array(lines))
            },
        );

        // truncate filter with custom length
        tera.register_filter(
            "truncate",
            |value: &tera::Value, args: &HashMap<String, tera::Value>| {
                let s = tera::try_get_value!("truncate", "value", String, value);
                let len = args.get("length").and_then(|v| v.as_u64()).unwrap_or(50) as usize;

                if s.chars().count() <= len {
                    Ok(tera::Value::String(s))
                } else if len <= 3 {
                    // The ellipsis alone would exceed the cap.
                    Ok(tera::Value::String(".".repeat(len)))
                } else {
                    let truncated = s.chars().take(len - 3).collect::<String>() + "...";
                    Ok(tera::Value::String(truncated))
                }
            },
        );

        // format_time filter
        tera.register_filter(
            "format_time",
            |value: &tera::Value, args: &HashMap<String, tera::Value>| {
                let ts = tera::try_get_value!("format_time", "value", i64, value);
                let fmt = args
                    .get("format")
                    .and_then(|v| v.as_str())
                    .unwrap_or("%H:%M");

                use chrono::{TimeZone, Utc};
                if let Some(dt) = Utc.timestamp_opt(ts, 0).single() {
                    Ok(tera::Value::String(dt.format(fmt).to_string()))
                } else {
                    Ok(tera::Value::String("--:--".to_string()))
                }
            },
        );
    }

    /// Context handed to every theme template. `layout.chars_per_line`
    /// is the same constant the pagination estimator costs with, so a
    /// theme that wraps via the `wrap` filter stays in step with the
    /// line budget.
    fn build_context(&self, page: &Page, theme_name: &str, size: PosterSize) -> serde_json::Value {
        let palette = self
            .config
            .get_theme(theme_name)
            .map(|t| t.palette.clone())
            .unwrap_or_default();

        json!({
            "theme": theme_name,
            "size": { "width": size.width, "height": size.height },
            "layout": { "chars_per_line": self.config.layout.chars_per_line },
            "palette": palette,
            "page": {
                "index": page.index,
                "total": page.total,
                "days": page.day_groups.iter().map(|group| json!({
                    "name": group.day.display_name(),
                    "short": group.day.short_name(),
                    "entries": group.entries.iter().map(|entry| json!({
                        "label": entry.label,
                        "time": entry.starts_at.format("%H:%M").to_string(),
                        "epoch": entry.starts_at.timestamp(),
                    })).collect::<Vec<_>>(),
                })).collect::<Vec<_>>(),
            },
        })
    }
}

impl MarkupRenderer for TeraMarkup {
    /// Templates are always loaded fresh through the asset loader so
    /// on-disk themes stay live-editable.
    fn render_markup(
        &self,
        page: &Page,
        theme: &str,
        size: PosterSize,
    ) -> Result<String, MarkupError> {
        let theme_config = self
            .config
            .get_theme(theme)
            .ok_or_else(|| MarkupError::ThemeNotFound(theme.to_string()))?;

        let template_content = self
            .assets
            .read_theme_string(&theme_config.template)
            .map_err(|e| MarkupError::TemplateRead(e.to_string()))?;

        let template_name = theme_config.template.to_str().unwrap_or("theme");
        let mut tera = Tera::default();
        tera.add_raw_template(template_name, &template_content)?;
        Self::register_filters(&mut tera);

        let data = self.build_context(page, theme, size);
        let context = Context::from_serialize(&data)?;
        let svg = tera.render(template_name, &context)?;

        Ok(svg)
    }

    fn has_theme(&self, name: &str) -> bool {
        self.config.get_theme(name).is_some()
    }
}

/// Greedy word wrap at `width` characters. Words longer than a full
/// line are hard-broken. Blank input yields a single blank line, the
/// same one line the estimator charges for it.
fn wrap_words(text: &str, width: usize) -> Vec<String> {
    let mut lines: Vec<String> = Vec::new();
    let mut current = String::new();
    let mut current_len = 0usize;

    for word in text.split_whitespace() {
        let mut word = word.to_string();
        let mut word_len = word.chars().count();

        if current_len > 0 && current_len + 1 + word_len > width {
            lines.push(std::mem::take(&mut current));
            current_len = 0;
        }

        while word_len > width {
            let chunk: String = word.chars().take(width).collect();
            word = word.chars().skip(width).collect();
            word_len = word.chars().count();
            lines.push(chunk);
        }

        if current_len > 0 {
            current.push(' ');
            current_len += 1;
        }
        current.push_str(&word);
        current_len += word_len;
    }

    if current_len > 0 || lines.is_empty() {
        lines.push(current);
    }

    lines
}
