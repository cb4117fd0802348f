use std::sync::Arc;

use futures_util::future::join_all;

use crate::error::{RenderFailure, ValidationError};
use crate::layout::paginate;
use crate::models::config::AppConfig;
use crate::models::page::{PosterSize, RenderedPage};
use crate::models::schedule::{group_by_day, validate_entries, ScheduleEntry};
use crate::services::markup::MarkupRenderer;
use crate::services::queue::RenderQueue;

/// Error type for the poster pipeline
#[derive(Debug, thiserror::Error)]
pub enum PipelineError {
    #[error("Validation error: {0}")]
    Validation(#[from] ValidationError),

    #[error("Render error: {0}")]
    Render(#[from] RenderFailure),
}

/// Orchestrates the full flow: validate the schedule, plan pages,
/// submit them to the render queue, collect the finished posters.
///
/// All validation happens up front, before anything reaches the
/// engine; once jobs are queued the only failures left are render
/// failures.
pub struct PosterPipeline {
    config: Arc<AppConfig>,
    markup: Arc<dyn MarkupRenderer>,
    queue: Arc<RenderQueue>,
}

impl PosterPipeline {
    pub fn new(
        config: Arc<AppConfig>,
        markup: Arc<dyn MarkupRenderer>,
        queue: Arc<RenderQueue>,
    ) -> Self {
        Self {
            config,
            markup,
            queue,
        }
    }

    /// Render a whole schedule into poster pages.
    ///
    /// Pages are submitted to the queue up front; the queue serializes
    /// execution FIFO and results come back in page order. The first
    /// page failure fails the request.
    pub async fn render_schedule(
        &self,
        entries: Vec<ScheduleEntry>,
        theme: Option<&str>,
        width: Option<u32>,
        height: Option<u32>,
    ) -> Result<Vec<RenderedPage>, PipelineError> {
        let theme = self.config.theme_or_default(theme);
        if !self.markup.has_theme(&theme) {
            return Err(ValidationError::UnknownTheme(theme).into());
        }

        let defaults = self.config.poster;
        let size = PosterSize::from_dimensions(
            width.unwrap_or(defaults.width),
            height.unwrap_or(defaults.height),
            &self.config.render,
        )?;

        validate_entries(&entries)?;
        self.config.layout.validate()?;

        let groups = group_by_day(entries);
        let pages = paginate(groups, &self.config.layout);
        tracing::debug!(
            pages = pages.len(),
            theme = %theme,
            width = size.width,
            height = size.height,
            "Schedule paginated"
        );

        let submissions = pages
            .into_iter()
            .map(|page| self.queue.submit(page, theme.clone(), size));
        let results = join_all(submissions).await;

        let mut rendered = Vec::with_capacity(results.len());
        for result in results {
            rendered.push(result?);
        }

        tracing::info!(pages = rendered.len(), theme = %theme, "Poster rendered");
        Ok(rendered)
    }

    /// Drain the queue and tear the engine down. For process exit.
    pub async fn shutdown(&self) {
        self.queue.shutdown().await;
    }
}
