// pixbatch/src/core/processor.rs
use super::{
    BatchError, Changes, Dimensions, FileResult, FileStatus, ImageFile, OutputFormat, ResizeFields,
    Result, RunSettings, TargetFormat,
};
use crate::events::{emit, EventCategory, EventSink};
use crate::processors::{Encoder, Loader, ResizePlan, Resizer};
use crate::utils::{get_file_extension, output_path_for};
use image::{ColorType, DynamicImage};
use std::path::PathBuf;

/// Transform engine: decode, resize, convert and save one file.
pub struct ImageProcessor {
    output_dir: PathBuf,
    format: Option<TargetFormat>,
    dpi: Option<u32>,
    resize: ResizeFields,
    loader: Loader,
    resizer: Resizer,
    encoder: Encoder,
}

struct Transformed {
    new_size: Dimensions,
    changes: Changes,
}

impl ImageProcessor {
    pub fn new(settings: &RunSettings) -> Self {
        Self {
            output_dir: settings.output_dir.clone(),
            format: settings.format,
            dpi: settings.dpi,
            resize: settings.resize,
            loader: Loader::new(),
            resizer: Resizer::new(settings.filter),
            encoder: Encoder::new(settings.dpi),
        }
    }

    /// Always yields a result; failures become `FileStatus::Failed` plus an
    /// `error` event and no output file.
    pub fn process(&self, file: &ImageFile, sink: &mut dyn EventSink) -> FileResult {
        let mut original_size = None;

        match self.transform(file, sink, &mut original_size) {
            Ok(Transformed { new_size, changes }) => {
                emit(sink, EventCategory::Success, "Image processed successfully");
                FileResult {
                    filename: file.filename.clone(),
                    original_size,
                    new_size: Some(new_size),
                    changes,
                    status: FileStatus::Completed,
                }
            }
            Err(e) => {
                let reason = e.to_string();
                emit(sink, EventCategory::Error, format!("Failed to process: {}", reason));
                FileResult {
                    filename: file.filename.clone(),
                    original_size,
                    new_size: None,
                    changes: Changes::default(),
                    status: FileStatus::Failed(reason),
                }
            }
        }
    }

    fn transform(
        &self,
        file: &ImageFile,
        sink: &mut dyn EventSink,
        original_size: &mut Option<Dimensions>,
    ) -> Result<Transformed> {
        let loaded = self.loader.load(&file.path)?;
        let source_size = loaded.dimensions();
        *original_size = Some(source_size);
        emit(
            sink,
            EventCategory::Open,
            format!(
                "Opened image - Size: {}, Mode: {:?}, Format: {}",
                source_size,
                loaded.image.color(),
                loaded.format_name()
            ),
        );

        let mut changes = Changes::default();
        if let Some(dpi) = self.dpi {
            changes.dpi = Some(dpi);
            emit(sink, EventCategory::Dpi, format!("Setting DPI to {}", dpi));
        }

        let plan = ResizePlan::for_fields(&self.resize, source_size);
        let mut image = self.resizer.apply(loaded.image, &plan)?;
        if let (Some(description), Some(message)) = (plan.change_description(), plan.event_message())
        {
            changes.size = Some(description);
            emit(sink, EventCategory::Resize, message);
        }

        match self.format {
            Some(target) => {
                let output_format = target.output_format();
                emit(
                    sink,
                    EventCategory::Format,
                    format!("Converting to {}", output_format),
                );

                if output_format.is_jpeg_family() && image.color() != ColorType::Rgb8 {
                    let from = image.color();
                    image = DynamicImage::ImageRgb8(image.to_rgb8());
                    emit(
                        sink,
                        EventCategory::Convert,
                        format!("Converted image mode from {:?} to Rgb8 for JPEG", from),
                    );
                }

                let output_path = output_path_for(&file.path, &self.output_dir, Some(target))
                    .ok_or_else(|| invalid_name(file))?;
                emit(
                    sink,
                    EventCategory::Save,
                    format!("Saving as {} to {}", output_format, output_path.display()),
                );
                self.encoder.save(&image, &output_path, output_format)?;
                changes.format = Some(output_format.canonical_name().to_string());
            }
            None => {
                let output_format = get_file_extension(&file.path)
                    .and_then(|ext| OutputFormat::from_extension(&ext))
                    .ok_or_else(|| {
                        BatchError::InvalidParameter(format!(
                            "Cannot determine encoder for {}",
                            file.filename
                        ))
                    })?;
                let output_path = output_path_for(&file.path, &self.output_dir, None)
                    .ok_or_else(|| invalid_name(file))?;
                emit(
                    sink,
                    EventCategory::Save,
                    format!("Saving with original format to {}", output_path.display()),
                );
                self.encoder.save(&image, &output_path, output_format)?;
            }
        }

        let new_size = Dimensions::new(image.width(), image.height());
        emit(sink, EventCategory::NewSize, new_size.to_string());

        Ok(Transformed { new_size, changes })
    }
}

fn invalid_name(file: &ImageFile) -> BatchError {
    BatchError::InvalidParameter(format!("Invalid file name: {}", file.path.display()))
}
