// pixbatch/src/core/mod.rs
pub mod config;
pub mod processor;

use std::fmt;
use std::path::PathBuf;
use std::str::FromStr;
use thiserror::Error;

pub use config::{validate_config, Configuration, ResizeFields, RunSettings};
pub use processor::ImageProcessor;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ResizeMode {
    #[default]
    Manual,
    AspectRatio,
    Percentage,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ResizeFilter {
    Nearest,
    Bilinear,
    #[default]
    Bicubic,
    Lanczos3,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct Dimensions {
    pub width: u32,
    pub height: u32,
}

impl Dimensions {
    pub fn new(width: u32, height: u32) -> Self {
        Self { width, height }
    }

    pub fn has_zero_side(&self) -> bool {
        self.width == 0 || self.height == 0
    }
}

impl fmt::Display for Dimensions {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}x{}", self.width, self.height)
    }
}

impl From<(u32, u32)> for Dimensions {
    fn from((width, height): (u32, u32)) -> Self {
        Self { width, height }
    }
}

/// `A:B` pair used by the aspect-ratio resize mode.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct AspectRatio {
    pub width: u32,
    pub height: u32,
}

impl fmt::Display for AspectRatio {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:{}", self.width, self.height)
    }
}

/// Output format the operator asked for.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TargetFormat {
    Jpeg,
    Png,
    Tiff,
    WebP,
}

impl TargetFormat {
    pub fn output_format(self) -> OutputFormat {
        match self {
            TargetFormat::Jpeg => OutputFormat::Jpeg,
            TargetFormat::Png => OutputFormat::Png,
            TargetFormat::Tiff => OutputFormat::Tiff,
            TargetFormat::WebP => OutputFormat::WebP,
        }
    }

    pub fn extension(self) -> &'static str {
        match self {
            TargetFormat::Jpeg => "jpg",
            TargetFormat::Png => "png",
            TargetFormat::Tiff => "tif",
            TargetFormat::WebP => "webp",
        }
    }
}

impl FromStr for TargetFormat {
    type Err = ();

    fn from_str(token: &str) -> std::result::Result<Self, Self::Err> {
        match token.trim().to_uppercase().as_str() {
            "JPG" | "JPEG" => Ok(TargetFormat::Jpeg),
            "PNG" => Ok(TargetFormat::Png),
            "TIF" | "TIFF" => Ok(TargetFormat::Tiff),
            "WEBP" => Ok(TargetFormat::WebP),
            _ => Err(()),
        }
    }
}

/// Encoder actually used to write a file, including the formats that can only
/// be reached by keeping the source encoding.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OutputFormat {
    Jpeg,
    Png,
    Tiff,
    WebP,
    Gif,
    Bmp,
}

impl OutputFormat {
    pub fn from_extension(ext: &str) -> Option<Self> {
        match ext.to_lowercase().as_str() {
            "jpg" | "jpeg" => Some(OutputFormat::Jpeg),
            "png" => Some(OutputFormat::Png),
            "tif" | "tiff" => Some(OutputFormat::Tiff),
            "webp" => Some(OutputFormat::WebP),
            "gif" => Some(OutputFormat::Gif),
            "bmp" => Some(OutputFormat::Bmp),
            _ => None,
        }
    }

    /// Canonical encoder name, as recorded in a result's changes.
    pub fn canonical_name(self) -> &'static str {
        match self {
            OutputFormat::Jpeg => "JPEG",
            OutputFormat::Png => "PNG",
            OutputFormat::Tiff => "TIFF",
            OutputFormat::WebP => "WEBP",
            OutputFormat::Gif => "GIF",
            OutputFormat::Bmp => "BMP",
        }
    }

    pub fn is_jpeg_family(self) -> bool {
        self == OutputFormat::Jpeg
    }
}

impl fmt::Display for OutputFormat {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.canonical_name())
    }
}

/// Transforms applied to one file, keyed `dpi`, `size` and `format`.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Changes {
    pub dpi: Option<u32>,
    pub size: Option<String>,
    pub format: Option<String>,
}

impl Changes {
    pub fn is_empty(&self) -> bool {
        self.dpi.is_none() && self.size.is_none() && self.format.is_none()
    }

    /// Entries in the order the transforms are applied.
    pub fn entries(&self) -> Vec<(&'static str, String)> {
        let mut entries = Vec::new();
        if let Some(dpi) = self.dpi {
            entries.push(("dpi", dpi.to_string()));
        }
        if let Some(size) = &self.size {
            entries.push(("size", size.clone()));
        }
        if let Some(format) = &self.format {
            entries.push(("format", format.clone()));
        }
        entries
    }
}

impl fmt::Display for Changes {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let rendered: Vec<String> = self
            .entries()
            .into_iter()
            .map(|(key, value)| format!("{}: {}", key, value))
            .collect();
        f.write_str(&rendered.join(", "))
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FileStatus {
    Completed,
    Failed(String),
}

impl FileStatus {
    pub fn is_completed(&self) -> bool {
        matches!(self, FileStatus::Completed)
    }
}

impl fmt::Display for FileStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            FileStatus::Completed => f.write_str("Completed"),
            FileStatus::Failed(reason) => write!(f, "Failed: {}", reason),
        }
    }
}

/// An input discovered in the top level of the input directory.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ImageFile {
    pub path: PathBuf,
    pub filename: String,
}

impl ImageFile {
    pub fn new(path: PathBuf) -> Self {
        let filename = path
            .file_name()
            .map(|name| name.to_string_lossy().into_owned())
            .unwrap_or_else(|| path.display().to_string());
        Self { path, filename }
    }
}

/// Outcome for one input file. Never mutated once the pipeline records it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FileResult {
    pub filename: String,
    pub original_size: Option<Dimensions>,
    pub new_size: Option<Dimensions>,
    pub changes: Changes,
    pub status: FileStatus,
}

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ConfigError {
    #[error("Input folder is required")]
    InputMissing,

    #[error("Input folder does not exist: {0}")]
    InputNotFound(String),

    #[error("Input path is not a folder: {0}")]
    InputNotDirectory(String),

    #[error("Output folder is required")]
    OutputMissing,

    #[error("Cannot create output folder: {0}")]
    OutputCreate(String),

    #[error("Output path is not a folder: {0}")]
    OutputNotDirectory(String),

    #[error("Invalid DPI value: '{0}'. Must be a positive integer")]
    InvalidDpi(String),

    #[error("Invalid width value: '{0}'. Must be a positive integer")]
    InvalidWidth(String),

    #[error("Invalid height value: '{0}'. Must be a positive integer")]
    InvalidHeight(String),

    #[error("Invalid percentage value: '{0}'. Must be a positive number")]
    InvalidPercentage(String),

    #[error("Invalid aspect ratio format: '{0}'. Must be in format 'width:height' (e.g., 16:9)")]
    AspectRatioFormat(String),

    #[error("Invalid aspect ratio value: '{0}'. Must be two positive integers separated by ':'")]
    AspectRatioValue(String),

    #[error("Please enter a percentage value for resize")]
    PercentageRequired,

    #[error("Please enter an aspect ratio (e.g., 16:9)")]
    AspectRatioRequired,

    #[error("Unsupported output format: '{0}'. Must be one of JPG, JPEG, PNG, TIF, WEBP")]
    UnsupportedFormat(String),
}

#[derive(Error, Debug)]
pub enum BatchError {
    #[error("{0}")]
    Config(#[from] ConfigError),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Image error: {0}")]
    Image(#[from] image::ImageError),

    #[error("PNG encoding error: {0}")]
    PngEncoding(#[from] png::EncodingError),

    #[error("TIFF error: {0}")]
    Tiff(#[from] tiff::TiffError),

    #[error("Invalid parameter: {0}")]
    InvalidParameter(String),

    #[error("Processing error: {0}")]
    Processing(String),

    #[error("A batch run is already in progress")]
    AlreadyRunning,
}

pub type Result<T> = std::result::Result<T, BatchError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn target_format_tokens_are_case_insensitive() {
        assert_eq!("jpg".parse::<TargetFormat>(), Ok(TargetFormat::Jpeg));
        assert_eq!("JPEG".parse::<TargetFormat>(), Ok(TargetFormat::Jpeg));
        assert_eq!("Tif".parse::<TargetFormat>(), Ok(TargetFormat::Tiff));
        assert_eq!("TIFF".parse::<TargetFormat>(), Ok(TargetFormat::Tiff));
        assert_eq!("webp".parse::<TargetFormat>(), Ok(TargetFormat::WebP));
        assert!("gif".parse::<TargetFormat>().is_err());
    }

    #[test]
    fn target_format_maps_to_encoder_and_extension() {
        assert_eq!(TargetFormat::Jpeg.output_format().canonical_name(), "JPEG");
        assert_eq!(TargetFormat::Jpeg.extension(), "jpg");
        assert_eq!(TargetFormat::Tiff.output_format().canonical_name(), "TIFF");
        assert_eq!(TargetFormat::Tiff.extension(), "tif");
        assert_eq!(TargetFormat::WebP.extension(), "webp");
    }

    #[test]
    fn changes_render_in_transform_order() {
        let changes = Changes {
            dpi: Some(300),
            size: Some("50% -> 500x250".to_string()),
            format: Some("PNG".to_string()),
        };
        assert_eq!(
            changes.to_string(),
            "dpi: 300, size: 50% -> 500x250, format: PNG"
        );
        assert!(Changes::default().is_empty());
    }
}
