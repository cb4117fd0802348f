pub mod engine;
pub mod raster;

pub use engine::{EngineError, EngineHandle, EngineSurface, RenderEngine};
pub use raster::RasterEngine;
