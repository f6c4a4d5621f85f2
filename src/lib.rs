mod cli;
pub mod core;
pub mod events;
pub mod processors;
mod utils;

pub use cli::{Cli, Commands, FilterArg, ModeArg, ResizeArgs};
pub use crate::core::{
    validate_config, AspectRatio, BatchError, Changes, ConfigError, Configuration, Dimensions,
    FileResult, FileStatus, ImageFile, ImageProcessor, OutputFormat, ResizeFields, ResizeFilter,
    ResizeMode, Result, RunSettings, TargetFormat,
};
pub use events::{CollectingSink, Event, EventCategory, EventSink};
pub use processors::{
    find_sample_image, BatchPipeline, CancelFlag, DimensionPreview, DimensionResolver,
    Loader, MetadataProcessor, PipelineState, ProcessingGate, RunHandle, RunReport,
};
pub use utils::{
    calculate_aspect_ratio, format_dimensions, format_file_size, is_supported_format,
    output_path_for, SUPPORTED_EXTENSIONS,
};

pub mod prelude {
    pub use crate::{
        BatchPipeline, CancelFlag, Configuration, DimensionResolver, EventSink, FileResult,
        ResizeMode, RunReport,
    };
}

// Re-export commonly used types
pub use image::DynamicImage;
