use crate::assets::AssetLoader;
use crate::error::ValidationError;
use crate::models::page::PosterSize;
use serde::Deserialize;
use std::collections::HashMap;
use std::path::PathBuf;
use std::time::Duration;

/// Application configuration loaded from config.yaml
#[derive(Debug, Deserialize, Clone)]
pub struct AppConfig {
    /// Line-budget constants shared by the estimator and the themes
    #[serde(default)]
    pub layout: LayoutOptions,

    /// Engine limits and timing
    #[serde(default)]
    pub render: RenderOptions,

    /// Canvas used when a request does not specify dimensions
    #[serde(default)]
    pub poster: PosterDefaults,

    /// Theme applied when a request does not name one
    #[serde(default = "default_theme")]
    pub default_theme: String,

    /// Theme definitions (template + palette)
    #[serde(default)]
    pub themes: HashMap<String, ThemeConfig>,
}

fn default_theme() -> String {
    "classic".to_string()
}

/// Pagination constants. These are tuning knobs: the estimator has no
/// knowledge of font metrics, so chars_per_line must match the wrap
/// width the themes actually use (the template context carries it for
/// exactly that reason).
#[derive(Debug, Deserialize, Clone, Copy, PartialEq, Eq)]
pub struct LayoutOptions {
    /// Line budget per poster page
    #[serde(default = "default_max_lines")]
    pub max_lines_per_page: u32,

    /// Lines charged for each day heading
    #[serde(default = "default_header_cost")]
    pub day_header_cost: u32,

    /// Wrap width used to estimate how many lines a label occupies
    #[serde(default = "default_chars_per_line")]
    pub chars_per_line: u32,
}

fn default_max_lines() -> u32 {
    32
}

fn default_header_cost() -> u32 {
    2
}

fn default_chars_per_line() -> u32 {
    34
}

impl LayoutOptions {
    pub fn validate(&self) -> Result<(), ValidationError> {
        if self.max_lines_per_page == 0 {
            return Err(ValidationError::BadLayout("max_lines_per_page must be positive"));
        }
        if self.chars_per_line == 0 {
            return Err(ValidationError::BadLayout("chars_per_line must be positive"));
        }
        Ok(())
    }
}

impl Default for LayoutOptions {
    fn default() -> Self {
        Self {
            max_lines_per_page: default_max_lines(),
            day_header_cost: default_header_cost(),
            chars_per_line: default_chars_per_line(),
        }
    }
}

/// Engine-side limits
#[derive(Debug, Deserialize, Clone, Copy, PartialEq, Eq)]
pub struct RenderOptions {
    /// Bounded pause between content load and capture, giving the
    /// engine time to settle fonts. Never an open-ended idle wait.
    #[serde(default = "default_settle_ms")]
    pub settle_delay_ms: u64,

    /// Largest accepted canvas width
    #[serde(default = "default_max_dimension")]
    pub max_width: u32,

    /// Largest accepted canvas height
    #[serde(default = "default_max_dimension")]
    pub max_height: u32,
}

fn default_settle_ms() -> u64 {
    150
}

fn default_max_dimension() -> u32 {
    4096
}

impl RenderOptions {
    pub fn settle(&self) -> Duration {
        Duration::from_millis(self.settle_delay_ms)
    }
}

impl Default for RenderOptions {
    fn default() -> Self {
        Self {
            settle_delay_ms: default_settle_ms(),
            max_width: default_max_dimension(),
            max_height: default_max_dimension(),
        }
    }
}

/// Default poster canvas (portrait social format)
#[derive(Debug, Deserialize, Clone, Copy, PartialEq, Eq)]
pub struct PosterDefaults {
    #[serde(default = "default_poster_width")]
    pub width: u32,

    #[serde(default = "default_poster_height")]
    pub height: u32,
}

fn default_poster_width() -> u32 {
    1080
}

fn default_poster_height() -> u32 {
    1350
}

impl PosterDefaults {
    pub fn size(&self) -> PosterSize {
        PosterSize {
            width: self.width,
            height: self.height,
        }
    }
}

impl Default for PosterDefaults {
    fn default() -> Self {
        Self {
            width: default_poster_width(),
            height: default_poster_height(),
        }
    }
}

/// Configuration for a theme (SVG template + free-form palette)
#[derive(Debug, Deserialize, Clone)]
pub struct ThemeConfig {
    /// Path to the Tera SVG template (relative to themes/ directory)
    pub template: PathBuf,

    /// Colors, font names and similar knobs handed to the template
    #[serde(default)]
    pub palette: HashMap<String, String>,
}

impl AppConfig {
    /// Load configuration from AssetLoader (embedded or external)
    pub fn load_from_assets(loader: &AssetLoader) -> Self {
        match loader.read_config_string() {
            Ok(content) => match serde_yaml::from_str::<Self>(&content) {
                Ok(config) => {
                    tracing::info!(
                        themes = config.themes.len(),
                        default_theme = %config.default_theme,
                        "Loaded configuration"
                    );
                    config
                }
                Err(e) => {
                    tracing::warn!(%e, "Failed to parse config, using defaults");
                    Self::default()
                }
            },
            Err(e) => {
                tracing::warn!(%e, "Failed to read config, using defaults");
                Self::default()
            }
        }
    }

    pub fn get_theme(&self, name: &str) -> Option<&ThemeConfig> {
        self.themes.get(name)
    }

    /// Theme name for a request, falling back to the configured default
    pub fn theme_or_default(&self, requested: Option<&str>) -> String {
        requested
            .map(str::to_string)
            .unwrap_or_else(|| self.default_theme.clone())
    }
}

impl Default for AppConfig {
    fn default() -> Self {
        let mut themes = HashMap::new();
        for name in ["classic", "noir", "chalk"] {
            themes.insert(
                name.to_string(),
                ThemeConfig {
                    template: PathBuf::from(format!("{name}.svg")),
                    palette: HashMap::new(),
                },
            );
        }

        Self {
            layout: LayoutOptions::default(),
            render: RenderOptions::default(),
            poster: PosterDefaults::default(),
            default_theme: "classic".to_string(),
            themes,
        }
    }
}
