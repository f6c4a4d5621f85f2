// pixbatch/src/processors/loader.rs
use crate::core::{BatchError, Dimensions, ImageFile, Result};
use crate::utils::is_supported_format;
use image::{DynamicImage, GenericImageView, ImageFormat, ImageReader};
use std::path::Path;
use walkdir::WalkDir;

pub(crate) const MAX_DIMENSION: u32 = 100_000;

/// A decoded image together with the container format it was read from.
pub struct LoadedImage {
    pub image: DynamicImage,
    pub format: Option<ImageFormat>,
}

impl LoadedImage {
    pub fn dimensions(&self) -> Dimensions {
        self.image.dimensions().into()
    }

    pub fn format_name(&self) -> String {
        self.format
            .map(|f| format!("{:?}", f).to_uppercase())
            .unwrap_or_else(|| "UNKNOWN".to_string())
    }
}

#[derive(Clone, Default)]
pub struct Loader;

impl Loader {
    pub fn new() -> Self {
        Self
    }

    pub fn load(&self, path: &Path) -> Result<LoadedImage> {
        log::debug!("Loading image from: {}", path.display());

        self.validate_path(path)?;

        let reader = ImageReader::open(path)?.with_guessed_format()?;
        let format = reader.format();
        let image = reader.decode().map_err(|e| {
            BatchError::Processing(format!("Failed to decode image: {}", e))
        })?;

        let (width, height) = image.dimensions();
        if width > MAX_DIMENSION || height > MAX_DIMENSION {
            return Err(BatchError::Processing(format!(
                "Image dimensions {}x{} exceed maximum {}x{}",
                width, height, MAX_DIMENSION, MAX_DIMENSION
            )));
        }

        log::debug!(
            "Loaded image: {}x{} pixels, color: {:?}, format: {:?}",
            width,
            height,
            image.color(),
            format
        );

        Ok(LoadedImage { image, format })
    }

    /// Reads only the header to get the pixel size.
    pub fn probe_dimensions(&self, path: &Path) -> Result<Dimensions> {
        let reader = ImageReader::open(path)?.with_guessed_format()?;
        let (width, height) = reader.into_dimensions()?;
        Ok(Dimensions::new(width, height))
    }

    /// Top-level files of `dir` with a supported extension, in the order the
    /// directory lists them.
    pub fn scan_directory(&self, dir: &Path) -> Result<Vec<ImageFile>> {
        let walker = WalkDir::new(dir).min_depth(1).max_depth(1).follow_links(true);

        let mut files = Vec::new();
        for entry in walker {
            let entry = entry.map_err(|e| BatchError::Io(e.into()))?;
            if entry.file_type().is_file() && is_supported_format(entry.path()) {
                files.push(ImageFile::new(entry.into_path()));
            }
        }

        Ok(files)
    }

    fn validate_path(&self, path: &Path) -> Result<()> {
        if !path.exists() {
            return Err(BatchError::InvalidParameter(format!(
                "File does not exist: {}",
                path.display()
            )));
        }

        let metadata = path.metadata()?;
        if metadata.len() == 0 {
            return Err(BatchError::InvalidParameter(format!(
                "File is empty: {}",
                path.display()
            )));
        }

        Ok(())
    }
}
