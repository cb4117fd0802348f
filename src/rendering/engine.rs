use async_trait::async_trait;
use thiserror::Error;

/// Errors raised by the rendering engine. `Disconnected` means the
/// engine session died underneath us (the crash signal); everything
/// else is stage-specific.
#[derive(Debug, Error)]
pub enum EngineError {
    #[error("Engine launch failed: {0}")]
    Launch(String),

    #[error("Surface error: {0}")]
    Surface(String),

    #[error("Markup rejected: {0}")]
    Markup(String),

    #[error("Capture failed: {0}")]
    Capture(String),

    #[error("Engine disconnected")]
    Disconnected,
}

/// Factory for engine sessions.
///
/// Launching is the expensive part of the engine's life cycle, so the
/// executor caches one launched handle and reuses it until a failure
/// invalidates it.
#[async_trait]
pub trait RenderEngine: Send + Sync {
    async fn launch(&self) -> Result<Box<dyn EngineHandle>, EngineError>;
}

/// One live engine session.
///
/// A handle performs no locking of its own: serializing render work is
/// the queue's job, and a handle shared by mistake will happily
/// interleave surface operations.
#[async_trait]
pub trait EngineHandle: Send + Sync {
    /// Open a drawing target of exactly `width` x `height` pixels for
    /// one render job.
    async fn create_surface(
        &self,
        width: u32,
        height: u32,
    ) -> Result<Box<dyn EngineSurface>, EngineError>;

    /// Graceful session teardown. Callers log failures and move on;
    /// teardown trouble never outranks a job result.
    async fn close(&self) -> Result<(), EngineError>;
}

/// A drawing target scoped to a single render job.
#[async_trait]
pub trait EngineSurface: Send {
    /// Hand SVG markup to the engine. Resolves once the content is
    /// parsed and ready to draw, which is the content-ready signal the
    /// executor waits on before its settle delay.
    async fn load_markup(&mut self, svg: String) -> Result<(), EngineError>;

    /// Rasterize the loaded content and return PNG bytes clipped to
    /// exactly the surface rect at scale factor 1.
    async fn capture(&mut self) -> Result<Vec<u8>, EngineError>;

    /// Release the surface. Safe to call twice.
    async fn close(&mut self) -> Result<(), EngineError>;
}
