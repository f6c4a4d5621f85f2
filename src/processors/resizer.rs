// pixbatch/src/processors/resizer.rs
use crate::core::{AspectRatio, BatchError, Dimensions, ResizeFields, ResizeFilter, Result};
use crate::processors::dimensions::{aspect_ratio_target, percentage_target};
use crate::processors::loader::MAX_DIMENSION;
use image::{imageops::FilterType, DynamicImage};

// Upper bound on the resampled pixel buffer. A failed allocation aborts the
// process, so oversized targets must be refused before resampling.
const MAX_TARGET_BYTES: u64 = 1 << 30;

/// Resize decided for one file.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum ResizePlan {
    Exact(Dimensions),
    Percentage { percentage: f64, target: Dimensions },
    AspectRatio { ratio: AspectRatio, target: Dimensions },
    Keep,
}

impl ResizePlan {
    /// Picks the first populated field group: width+height, then
    /// percentage, then aspect ratio. Re-derived for every file.
    pub fn for_fields(fields: &ResizeFields, source: Dimensions) -> Self {
        if let (Some(width), Some(height)) = (fields.width, fields.height) {
            ResizePlan::Exact(Dimensions::new(width, height))
        } else if let Some(percentage) = fields.percentage {
            ResizePlan::Percentage {
                percentage,
                target: percentage_target(source, percentage),
            }
        } else if let Some(ratio) = fields.aspect_ratio {
            ResizePlan::AspectRatio {
                ratio,
                target: aspect_ratio_target(source, ratio),
            }
        } else {
            ResizePlan::Keep
        }
    }

    pub fn target(&self) -> Option<Dimensions> {
        match self {
            ResizePlan::Exact(target)
            | ResizePlan::Percentage { target, .. }
            | ResizePlan::AspectRatio { target, .. } => Some(*target),
            ResizePlan::Keep => None,
        }
    }

    /// Value recorded under the `size` change.
    pub fn change_description(&self) -> Option<String> {
        match self {
            ResizePlan::Exact(target) => Some(target.to_string()),
            ResizePlan::Percentage { percentage, target } => {
                Some(format!("{}% -> {}", percentage, target))
            }
            ResizePlan::AspectRatio { ratio, target } => {
                Some(format!("aspect {} -> {}", ratio, target))
            }
            ResizePlan::Keep => None,
        }
    }

    pub fn event_message(&self) -> Option<String> {
        match self {
            ResizePlan::Exact(target) => Some(format!("Resized to {}", target)),
            ResizePlan::Percentage { percentage, target } => {
                Some(format!("Scaled by {}% -> {}", percentage, target))
            }
            ResizePlan::AspectRatio { ratio, target } => {
                Some(format!("Applied aspect ratio {} -> {}", ratio, target))
            }
            ResizePlan::Keep => None,
        }
    }
}

pub struct Resizer {
    filter: ResizeFilter,
}

impl Resizer {
    pub fn new(filter: ResizeFilter) -> Self {
        Self { filter }
    }

    /// Applies `plan` without preserving aspect; stretching is expected.
    pub fn apply(&self, image: DynamicImage, plan: &ResizePlan) -> Result<DynamicImage> {
        let Some(target) = plan.target() else {
            return Ok(image);
        };

        if target.has_zero_side() {
            return Err(BatchError::InvalidParameter(format!(
                "Resize target {} has a zero dimension",
                target
            )));
        }

        if target.width == image.width() && target.height == image.height() {
            log::debug!("Image dimensions unchanged, skipping resample");
            return Ok(image);
        }

        if target.width > MAX_DIMENSION || target.height > MAX_DIMENSION {
            return Err(BatchError::InvalidParameter(format!(
                "Resize target {} exceeds maximum {}x{}",
                target, MAX_DIMENSION, MAX_DIMENSION
            )));
        }

        let bytes = u64::from(target.width)
            * u64::from(target.height)
            * u64::from(image.color().bytes_per_pixel());
        if bytes > MAX_TARGET_BYTES {
            return Err(BatchError::InvalidParameter(format!(
                "Resize target {} needs {} bytes, limit is {}",
                target, bytes, MAX_TARGET_BYTES
            )));
        }

        log::debug!(
            "Resizing image from {}x{} to {}",
            image.width(),
            image.height(),
            target
        );

        Ok(image.resize_exact(target.width, target.height, self.get_filter_type()))
    }

    fn get_filter_type(&self) -> FilterType {
        match self.filter {
            ResizeFilter::Nearest => FilterType::Nearest,
            ResizeFilter::Bilinear => FilterType::Triangle,
            ResizeFilter::Bicubic => FilterType::CatmullRom,
            ResizeFilter::Lanczos3 => FilterType::Lanczos3,
        }
    }
}
