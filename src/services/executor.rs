use std::sync::Arc;
use std::time::Duration;

use tokio::sync::Mutex;

use crate::error::{RenderFailure, RenderFailureKind};
use crate::models::page::RenderedPage;
use crate::rendering::engine::{EngineHandle, EngineSurface, RenderEngine};
use crate::services::markup::MarkupRenderer;
use crate::services::queue::RenderJob;

struct EngineSlot {
    handle: Option<Arc<dyn EngineHandle>>,
    /// Counts successful launches. Lets invalidation recognize a
    /// handle that was already replaced, and gives tests a window into
    /// relaunch behavior.
    generation: u64,
}

/// Drives single render jobs against the singleton engine handle.
///
/// The slot mutex is the whole lifecycle story: `None` is
/// uninitialized, holding the lock across `launch()` is "launching"
/// (concurrent callers park and then find the cached handle, so
/// exactly one launch happens), `Some` is ready, and `take()` is
/// invalidated. A failed launch caches nothing and the next job simply
/// tries again; there are no automatic retry loops.
///
/// The executor assumes callers already serialize jobs. That is the
/// queue's contract, and nothing else in the crate should call
/// [`RenderExecutor::render`] directly.
pub struct RenderExecutor {
    engine: Arc<dyn RenderEngine>,
    markup: Arc<dyn MarkupRenderer>,
    settle: Duration,
    slot: Mutex<EngineSlot>,
}

impl RenderExecutor {
    pub fn new(
        engine: Arc<dyn RenderEngine>,
        markup: Arc<dyn MarkupRenderer>,
        settle: Duration,
    ) -> Self {
        Self {
            engine,
            markup,
            settle,
            slot: Mutex::new(EngineSlot {
                handle: None,
                generation: 0,
            }),
        }
    }

    /// Number of successful engine launches so far.
    pub async fn engine_generation(&self) -> u64 {
        self.slot.lock().await.generation
    }

    /// Run one job through the full sequence: obtain handle, open a
    /// job-scoped surface, load markup, settle, capture. Any failure
    /// on the engine path invalidates the cached handle so the next
    /// job starts from a fresh launch.
    pub async fn render(&self, job: &RenderJob) -> Result<RenderedPage, RenderFailure> {
        let (handle, generation) = self.obtain_handle().await?;

        tracing::debug!(
            job = job.id,
            page = job.page.index,
            of = job.page.total,
            generation,
            "Render started"
        );

        match self.render_on(handle.as_ref(), job).await {
            Ok(png_bytes) => Ok(RenderedPage {
                page_index: job.page.index,
                page_total: job.page.total,
                width: job.size.width,
                height: job.size.height,
                png_bytes,
            }),
            Err(failure) => {
                tracing::error!(
                    job = job.id,
                    kind = ?failure.kind(),
                    detail = failure.detail(),
                    "Render failed"
                );
                self.invalidate(generation).await;
                Err(failure)
            }
        }
    }

    /// Graceful engine teardown for process shutdown. Close errors are
    /// logged and swallowed.
    pub async fn shutdown(&self) {
        let handle = self.slot.lock().await.handle.take();
        if let Some(handle) = handle {
            tracing::info!("Closing rendering engine");
            if let Err(e) = handle.close().await {
                tracing::warn!(error = %e, "Engine close reported an error");
            }
        }
    }

    async fn obtain_handle(&self) -> Result<(Arc<dyn EngineHandle>, u64), RenderFailure> {
        let mut slot = self.slot.lock().await;
        if let Some(handle) = &slot.handle {
            return Ok((handle.clone(), slot.generation));
        }

        // The lock is held across the launch on purpose: that is the
        // single-flight guarantee.
        tracing::info!(generation = slot.generation + 1, "Launching rendering engine");
        match self.engine.launch().await {
            Ok(handle) => {
                let handle: Arc<dyn EngineHandle> = Arc::from(handle);
                slot.generation += 1;
                slot.handle = Some(handle.clone());
                Ok((handle, slot.generation))
            }
            Err(e) => {
                tracing::error!(error = %e, "Engine launch failed");
                Err(RenderFailure::from_engine(RenderFailureKind::Launch, e))
            }
        }
    }

    async fn render_on(
        &self,
        handle: &dyn EngineHandle,
        job: &RenderJob,
    ) -> Result<Vec<u8>, RenderFailure> {
        let mut surface = handle
            .create_surface(job.size.width, job.size.height)
            .await
            .map_err(|e| RenderFailure::from_engine(RenderFailureKind::ContentLoad, e))?;

        let result = self.drive(surface.as_mut(), job).await;

        // Release on every exit path. Teardown trouble is logged and
        // never outranks the job result.
        if let Err(e) = surface.close().await {
            tracing::warn!(job = job.id, error = %e, "Surface close reported an error");
        }

        result
    }

    async fn drive(
        &self,
        surface: &mut dyn EngineSurface,
        job: &RenderJob,
    ) -> Result<Vec<u8>, RenderFailure> {
        let svg = self
            .markup
            .render_markup(&job.page, &job.theme, job.size)
            .map_err(|e| RenderFailure::content_load(e.to_string()))?;

        surface
            .load_markup(svg)
            .await
            .map_err(|e| RenderFailure::from_engine(RenderFailureKind::ContentLoad, e))?;

        // Bounded settle after the content-ready signal, giving the
        // engine time to finish fonts. Never an open-ended idle wait.
        if !self.settle.is_zero() {
            tokio::time::sleep(self.settle).await;
        }

        surface
            .capture()
            .await
            .map_err(|e| RenderFailure::from_engine(RenderFailureKind::Capture, e))
    }

    /// Drop the cached handle after a failure, unless a relaunch
    /// already replaced it. The dead handle still gets a best-effort
    /// close so engine-side resources are not stranded.
    async fn invalidate(&self, generation: u64) {
        let handle = {
            let mut slot = self.slot.lock().await;
            if slot.generation != generation {
                return;
            }
            slot.handle.take()
        };

        if let Some(handle) = handle {
            tracing::warn!(generation, "Invalidating engine handle after failure");
            if let Err(e) = handle.close().await {
                tracing::warn!(error = %e, "Teardown of failed engine reported an error");
            }
        }
    }
}
