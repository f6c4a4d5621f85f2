// pixbatch/src/processors/mod.rs
pub mod batch;
pub mod dimensions;
mod encoder;
mod loader;
mod metadata;
mod resizer;

pub use batch::{BatchPipeline, CancelFlag, PipelineState, ProcessingGate, RunHandle, RunReport};
pub use dimensions::{find_sample_image, DimensionPreview, DimensionResolver, SampleImage};
pub use encoder::{embeds_dpi, Encoder};
pub use loader::{LoadedImage, Loader};
pub use metadata::MetadataProcessor;
pub use resizer::{ResizePlan, Resizer};

pub mod prelude {
    pub use super::{BatchPipeline, DimensionResolver, Encoder, Loader, MetadataProcessor, Resizer};
}
