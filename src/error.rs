use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde_json::json;
use thiserror::Error;

use crate::rendering::engine::EngineError;

/// Input rejection raised before any engine work starts.
///
/// Validation failures never touch the rendering engine and never
/// invalidate a live engine handle.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum ValidationError {
    #[error("Schedule has no entries")]
    NoEntries,

    #[error("Entries out of order at position {position}: start instants and sort keys must not decrease")]
    EntriesOutOfOrder { position: usize },

    #[error("Unknown theme: {0}")]
    UnknownTheme(String),

    #[error("Unsupported dimensions: {width}x{height}")]
    UnsupportedDimensions { width: u32, height: u32 },

    #[error("Invalid layout constants: {0}")]
    BadLayout(&'static str),

    #[error("Page {page} out of range (poster has {total} pages)")]
    PageOutOfRange { page: u32, total: u32 },
}

/// Which stage of the render path gave out. Diagnostic only: logs and
/// tests may inspect it, but callers receive the same collapsed failure
/// regardless of the kind, and every engine-path kind invalidates the
/// cached engine handle.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RenderFailureKind {
    Launch,
    ContentLoad,
    Capture,
    EngineCrash,
    QueueClosed,
}

/// Opaque failure of a render job.
///
/// The display form deliberately does not reveal which stage failed;
/// the stage and detail go to the server log instead.
#[derive(Debug, Error)]
#[error("Rendering failed")]
pub struct RenderFailure {
    kind: RenderFailureKind,
    detail: String,
}

impl RenderFailure {
    pub fn launch(detail: impl Into<String>) -> Self {
        Self {
            kind: RenderFailureKind::Launch,
            detail: detail.into(),
        }
    }

    pub fn content_load(detail: impl Into<String>) -> Self {
        Self {
            kind: RenderFailureKind::ContentLoad,
            detail: detail.into(),
        }
    }

    pub fn capture(detail: impl Into<String>) -> Self {
        Self {
            kind: RenderFailureKind::Capture,
            detail: detail.into(),
        }
    }

    pub fn engine_crash(detail: impl Into<String>) -> Self {
        Self {
            kind: RenderFailureKind::EngineCrash,
            detail: detail.into(),
        }
    }

    pub fn queue_closed() -> Self {
        Self {
            kind: RenderFailureKind::QueueClosed,
            detail: "render queue is shut down".to_string(),
        }
    }

    /// Classify an engine error raised at a given stage. A dead engine
    /// channel is always a crash, whatever the stage.
    pub fn from_engine(stage: RenderFailureKind, err: EngineError) -> Self {
        let kind = match err {
            EngineError::Disconnected => RenderFailureKind::EngineCrash,
            _ => stage,
        };
        Self {
            kind,
            detail: err.to_string(),
        }
    }

    pub fn kind(&self) -> RenderFailureKind {
        self.kind
    }

    pub(crate) fn detail(&self) -> &str {
        &self.detail
    }
}

#[derive(Debug, Error)]
pub enum ApiError {
    #[error("{0}")]
    Validation(#[from] ValidationError),

    #[error("{0}")]
    Render(#[from] RenderFailure),

    #[error("Internal error: {0}")]
    Internal(String),
}

impl From<crate::services::pipeline::PipelineError> for ApiError {
    fn from(e: crate::services::pipeline::PipelineError) -> Self {
        use crate::services::pipeline::PipelineError;
        match e {
            PipelineError::Validation(v) => ApiError::Validation(v),
            PipelineError::Render(r) => ApiError::Render(r),
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let (status, message) = match &self {
            ApiError::Validation(_) => (StatusCode::UNPROCESSABLE_ENTITY, self.to_string()),
            ApiError::Render(_) => (StatusCode::BAD_GATEWAY, self.to_string()),
            ApiError::Internal(_) => (StatusCode::INTERNAL_SERVER_ERROR, self.to_string()),
        };

        let body = Json(json!({
            "status": status.as_u16(),
            "error": message,
        }));

        (status, body).into_response()
    }
}
