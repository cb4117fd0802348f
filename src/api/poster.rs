use axum::{
    body::Bytes,
    extract::{Query, State},
    http::{header, StatusCode},
    response::{IntoResponse, Json, Response},
};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use utoipa::ToSchema;

use crate::error::{ApiError, ValidationError};
use crate::models::{AppConfig, ScheduleEntry};
use crate::services::PosterPipeline;

/// Error response for poster endpoints
#[derive(Debug, Serialize, ToSchema)]
pub struct PosterErrorResponse {
    /// Status code
    pub status: u16,
    /// Error message
    pub error: String,
}

/// Request body for poster rendering
#[derive(Debug, Deserialize, ToSchema)]
pub struct PosterRequest {
    /// Schedule entries, ordered by start instant
    pub entries: Vec<ScheduleEntry>,
    /// Theme name (falls back to the configured default)
    #[serde(default)]
    pub theme: Option<String>,
    /// Poster width in pixels (falls back to the configured default)
    #[serde(default)]
    pub width: Option<u32>,
    /// Poster height in pixels (falls back to the configured default)
    #[serde(default)]
    pub height: Option<u32>,
}

/// One rendered poster page
#[derive(Debug, Serialize, ToSchema)]
pub struct PosterPage {
    /// 1-based page number
    pub page_index: u32,
    /// Total number of pages in the poster
    pub page_total: u32,
    /// Page width in pixels
    pub width: u32,
    /// Page height in pixels
    pub height: u32,
    /// PNG image data, base64-encoded (standard alphabet, padded)
    pub png_base64: String,
}

/// Response from the poster rendering endpoint
#[derive(Debug, Serialize, ToSchema)]
pub struct PosterResponse {
    /// Theme the poster was rendered with
    pub theme: String,
    /// Page width in pixels
    pub width: u32,
    /// Page height in pixels
    pub height: u32,
    /// Total number of pages
    pub page_total: u32,
    /// All rendered pages, in order
    pub pages: Vec<PosterPage>,
}

/// Query parameters for the single-image endpoint
#[derive(Debug, Deserialize)]
pub struct PosterImageQuery {
    /// 1-based page number (default: 1)
    #[serde(default)]
    pub page: Option<u32>,
}

/// Render a schedule into poster pages
///
/// Validates the schedule, paginates it, and renders every page through the
/// engine. Pages are returned base64-encoded so one request yields the whole
/// poster.
#[utoipa::path(
    post,
    path = "/api/posters",
    request_body = PosterRequest,
    responses(
        (status = 200, description = "Poster rendered", body = PosterResponse),
        (status = 422, description = "Invalid schedule or options", body = PosterErrorResponse),
        (status = 502, description = "Rendering failed", body = PosterErrorResponse),
    ),
    tag = "Posters"
)]
pub async fn handle_render_poster(
    State(config): State<Arc<AppConfig>>,
    State(pipeline): State<Arc<PosterPipeline>>,
    Json(request): Json<PosterRequest>,
) -> Result<Json<PosterResponse>, ApiError> {
    use base64::{engine::general_purpose::STANDARD as BASE64, Engine as _};

    let theme = config.theme_or_default(request.theme.as_deref());

    tracing::info!(
        entries = request.entries.len(),
        theme = %theme,
        "Poster render request received"
    );

    let rendered = pipeline
        .render_schedule(request.entries, Some(&theme), request.width, request.height)
        .await?;

    let first = rendered
        .first()
        .ok_or_else(|| ApiError::Internal("Rendering produced no pages".to_string()))?;
    let width = first.width;
    let height = first.height;
    let page_total = first.page_total;

    let pages = rendered
        .into_iter()
        .map(|page| PosterPage {
            page_index: page.page_index,
            page_total: page.page_total,
            width: page.width,
            height: page.height,
            png_base64: BASE64.encode(&page.png_bytes),
        })
        .collect();

    Ok(Json(PosterResponse {
        theme,
        width,
        height,
        page_total,
        pages,
    }))
}

/// Render a schedule and return one page as a raw PNG
///
/// Same pipeline as the JSON endpoint, but returns the selected page as
/// binary image data for direct embedding.
#[utoipa::path(
    post,
    path = "/api/posters/image",
    request_body = PosterRequest,
    responses(
        (status = 200, description = "PNG image", content_type = "image/png"),
        (status = 422, description = "Invalid schedule, options, or page number", body = PosterErrorResponse),
        (status = 502, description = "Rendering failed", body = PosterErrorResponse),
    ),
    params(
        ("page" = Option<u32>, Query, description = "1-based page number (default: 1)"),
    ),
    tag = "Posters"
)]
pub async fn handle_poster_image(
    State(config): State<Arc<AppConfig>>,
    State(pipeline): State<Arc<PosterPipeline>>,
    Query(query): Query<PosterImageQuery>,
    Json(request): Json<PosterRequest>,
) -> Result<Response, ApiError> {
    let theme = config.theme_or_default(request.theme.as_deref());
    let page_number = query.page.unwrap_or(1);

    tracing::info!(
        entries = request.entries.len(),
        theme = %theme,
        page = page_number,
        "Poster image request received"
    );

    let rendered = pipeline
        .render_schedule(request.entries, Some(&theme), request.width, request.height)
        .await?;

    let total = rendered.len() as u32;
    let page = page_number
        .checked_sub(1)
        .and_then(|i| rendered.into_iter().nth(i as usize))
        .ok_or(ValidationError::PageOutOfRange {
            page: page_number,
            total,
        })?;

    tracing::info!(
        page = page.page_index,
        total = page.page_total,
        size_bytes = page.png_bytes.len(),
        "Poster page rendered"
    );

    Ok((
        StatusCode::OK,
        [
            (header::CONTENT_TYPE, "image/png".to_string()),
            (header::CONTENT_LENGTH, page.png_bytes.len().to_string()),
        ],
        Bytes::from(page.png_bytes),
    )
        .into_response())
}
