use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

use crate::error::ValidationError;
use crate::models::config::RenderOptions;

/// Output canvas for one poster page. The capture surface is created at
/// exactly these dimensions (scale factor 1), so the PNG always matches
/// the requested size regardless of how much markup overflows.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
pub struct PosterSize {
    pub width: u32,
    pub height: u32,
}

impl PosterSize {
    /// Portrait social-feed format: 1080x1350
    pub const SOCIAL_PORTRAIT: Self = Self {
        width: 1080,
        height: 1350,
    };

    /// Validate caller-supplied dimensions against the configured caps.
    pub fn from_dimensions(
        width: u32,
        height: u32,
        limits: &RenderOptions,
    ) -> Result<Self, ValidationError> {
        if width == 0 || height == 0 || width > limits.max_width || height > limits.max_height {
            return Err(ValidationError::UnsupportedDimensions { width, height });
        }
        Ok(Self { width, height })
    }
}

impl Default for PosterSize {
    fn default() -> Self {
        Self::SOCIAL_PORTRAIT
    }
}

/// Finished render of one poster page.
#[derive(Debug, Clone)]
pub struct RenderedPage {
    pub page_index: u32,
    pub page_total: u32,
    pub width: u32,
    pub height: u32,
    pub png_bytes: Vec<u8>,
}
