pub mod executor;
pub mod markup;
pub mod pipeline;
pub mod queue;

pub use executor::RenderExecutor;
pub use markup::{MarkupError, MarkupRenderer, TeraMarkup};
pub use pipeline::{PipelineError, PosterPipeline};
pub use queue::{RenderJob, RenderQueue};
