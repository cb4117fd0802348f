//! Scripted rendering engine for integration tests.
//!
//! Implements the engine traits over shared counters so tests can
//! observe launches, surface lifecycles, and overlap, and can inject
//! failures at each stage.

use async_trait::async_trait;
use std::sync::atomic::{AtomicBool, AtomicU64, AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use affiche::rendering::{EngineError, EngineHandle, EngineSurface, RenderEngine};

/// Counters and failure switches shared between a test and its engine.
#[derive(Default)]
pub struct EngineStats {
    pub launches: AtomicUsize,
    pub handles_closed: AtomicUsize,
    pub surfaces_created: AtomicUsize,
    pub surfaces_closed: AtomicUsize,
    /// Jobs currently between load_markup and capture/close
    in_flight: AtomicUsize,
    /// High-water mark of in_flight; 1 means jobs never overlapped
    pub max_in_flight: AtomicUsize,
    /// Markup strings in the order the engine received them
    pub loaded: Mutex<Vec<String>>,
    pub fail_next_launch: AtomicBool,
    pub fail_next_load: AtomicBool,
    pub fail_next_capture: AtomicBool,
    /// Widens the load window so overlapping jobs would be observable
    pub load_delay_ms: AtomicU64,
}

impl EngineStats {
    pub fn launches(&self) -> usize {
        self.launches.load(Ordering::SeqCst)
    }

    pub fn surfaces_created(&self) -> usize {
        self.surfaces_created.load(Ordering::SeqCst)
    }

    pub fn surfaces_closed(&self) -> usize {
        self.surfaces_closed.load(Ordering::SeqCst)
    }

    pub fn handles_closed(&self) -> usize {
        self.handles_closed.load(Ordering::SeqCst)
    }

    pub fn max_in_flight(&self) -> usize {
        self.max_in_flight.load(Ordering::SeqCst)
    }

    pub fn loaded_markup(&self) -> Vec<String> {
        self.loaded.lock().unwrap().clone()
    }

    pub fn fail_next_launch(&self) {
        self.fail_next_launch.store(true, Ordering::SeqCst);
    }

    pub fn fail_next_load(&self) {
        self.fail_next_load.store(true, Ordering::SeqCst);
    }

    pub fn fail_next_capture(&self) {
        self.fail_next_capture.store(true, Ordering::SeqCst);
    }

    pub fn set_load_delay(&self, delay: Duration) {
        self.load_delay_ms
            .store(delay.as_millis() as u64, Ordering::SeqCst);
    }
}

/// Engine whose sessions record everything they do into [`EngineStats`].
pub struct MockEngine {
    stats: Arc<EngineStats>,
}

impl MockEngine {
    pub fn new() -> Self {
        Self {
            stats: Arc::new(EngineStats::default()),
        }
    }

    pub fn stats(&self) -> Arc<EngineStats> {
        self.stats.clone()
    }
}

impl Default for MockEngine {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl RenderEngine for MockEngine {
    async fn launch(&self) -> Result<Box<dyn EngineHandle>, EngineError> {
        if self.stats.fail_next_launch.swap(false, Ordering::SeqCst) {
            return Err(EngineError::Launch("scripted launch failure".to_string()));
        }
        self.stats.launches.fetch_add(1, Ordering::SeqCst);
        Ok(Box::new(MockHandle {
            stats: self.stats.clone(),
        }))
    }
}

struct MockHandle {
    stats: Arc<EngineStats>,
}

#[async_trait]
impl EngineHandle for MockHandle {
    async fn create_surface(
        &self,
        width: u32,
        height: u32,
    ) -> Result<Box<dyn EngineSurface>, EngineError> {
        self.stats.surfaces_created.fetch_add(1, Ordering::SeqCst);
        Ok(Box::new(MockSurface {
            stats: self.stats.clone(),
            width,
            height,
            counted: false,
            closed: false,
        }))
    }

    async fn close(&self) -> Result<(), EngineError> {
        self.stats.handles_closed.fetch_add(1, Ordering::SeqCst);
        Ok(())
    }
}

struct MockSurface {
    stats: Arc<EngineStats>,
    width: u32,
    height: u32,
    /// Whether this surface currently counts toward in_flight
    counted: bool,
    closed: bool,
}

impl MockSurface {
    fn enter(&mut self) {
        let current = self.stats.in_flight.fetch_add(1, Ordering::SeqCst) + 1;
        self.stats.max_in_flight.fetch_max(current, Ordering::SeqCst);
        self.counted = true;
    }

    fn leave(&mut self) {
        if self.counted {
            self.stats.in_flight.fetch_sub(1, Ordering::SeqCst);
            self.counted = false;
        }
    }
}

#[async_trait]
impl EngineSurface for MockSurface {
    async fn load_markup(&mut self, svg: String) -> Result<(), EngineError> {
        self.enter();

        let delay = self.stats.load_delay_ms.load(Ordering::SeqCst);
        if delay > 0 {
            tokio::time::sleep(Duration::from_millis(delay)).await;
        }

        if self.stats.fail_next_load.swap(false, Ordering::SeqCst) {
            self.leave();
            return Err(EngineError::Markup("scripted load failure".to_string()));
        }

        self.stats.loaded.lock().unwrap().push(svg);
        Ok(())
    }

    async fn capture(&mut self) -> Result<Vec<u8>, EngineError> {
        if self.stats.fail_next_capture.swap(false, Ordering::SeqCst) {
            self.leave();
            return Err(EngineError::Capture("scripted capture failure".to_string()));
        }

        let bytes = encode_blank_png(self.width, self.height);
        self.leave();
        Ok(bytes)
    }

    async fn close(&mut self) -> Result<(), EngineError> {
        self.leave();
        if !self.closed {
            self.closed = true;
            self.stats.surfaces_closed.fetch_add(1, Ordering::SeqCst);
        }
        Ok(())
    }
}

/// A real PNG of the surface size, so response bodies decode properly.
fn encode_blank_png(width: u32, height: u32) -> Vec<u8> {
    let mut out = Vec::new();
    {
        let mut encoder = png::Encoder::new(&mut out, width, height);
        encoder.set_color(png::ColorType::Rgba);
        encoder.set_depth(png::BitDepth::Eight);
        let mut writer = encoder.write_header().expect("PNG header");
        let data = vec![255u8; (width * height * 4) as usize];
        writer.write_image_data(&data).expect("PNG data");
    }
    out
}
