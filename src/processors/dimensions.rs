// pixbatch/src/processors/dimensions.rs
use crate::core::config::{parse_aspect_ratio, parse_positive_int, parse_positive_real};
use crate::core::{AspectRatio, Configuration, Dimensions, ImageFile, ResizeMode};
use crate::processors::Loader;
use crate::utils::is_supported_format;
use std::fmt;
use std::path::Path;
use walkdir::WalkDir;

/// What the resolver can say about the target size before a run.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DimensionPreview {
    Target(Dimensions),
    /// Value is valid but no sample image is available yet.
    Pending,
    Invalid,
    /// Nothing entered for the active mode.
    Unset,
}

impl fmt::Display for DimensionPreview {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            DimensionPreview::Target(dimensions) => write!(f, "{}", dimensions),
            DimensionPreview::Pending => f.write_str("Will be calculated"),
            DimensionPreview::Invalid => f.write_str("Invalid"),
            DimensionPreview::Unset => f.write_str("Not set"),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SampleImage {
    pub file: ImageFile,
    pub dimensions: Dimensions,
}

/// First supported file in `dir` whose header can be read. Unreadable
/// candidates are skipped; the scan stops at the first hit.
pub fn find_sample_image(dir: &Path) -> Option<SampleImage> {
    let loader = Loader::new();
    WalkDir::new(dir)
        .min_depth(1)
        .max_depth(1)
        .follow_links(true)
        .into_iter()
        .filter_map(|entry| entry.ok())
        .filter(|entry| entry.file_type().is_file() && is_supported_format(entry.path()))
        .find_map(|entry| match loader.probe_dimensions(entry.path()) {
            Ok(dimensions) => Some(SampleImage {
                file: ImageFile::new(entry.into_path()),
                dimensions,
            }),
            Err(e) => {
                log::debug!("Skipping sample candidate {}: {}", entry.path().display(), e);
                None
            }
        })
}

/// `(trunc(w*p/100), trunc(h*p/100))`.
pub fn percentage_target(source: Dimensions, percentage: f64) -> Dimensions {
    Dimensions::new(
        scale_truncated(source.width, percentage),
        scale_truncated(source.height, percentage),
    )
}

/// Width is kept from the source; height becomes `trunc(w*B/A)`.
pub fn aspect_ratio_target(source: Dimensions, ratio: AspectRatio) -> Dimensions {
    let height = u64::from(source.width) * u64::from(ratio.height) / u64::from(ratio.width);
    Dimensions::new(source.width, height.min(u64::from(u32::MAX)) as u32)
}

fn scale_truncated(side: u32, percentage: f64) -> u32 {
    // `as` truncates toward zero and saturates
    (f64::from(side) * percentage / 100.0) as u32
}

pub struct DimensionResolver;

impl DimensionResolver {
    /// Resolves the target for the active mode against an optional sample
    /// size. Pure: never touches the filesystem.
    pub fn resolve(config: &Configuration, sample: Option<Dimensions>) -> DimensionPreview {
        match config.resize_mode {
            ResizeMode::Manual => resolve_manual(&config.width, &config.height),
            ResizeMode::Percentage => {
                let text = config.percentage.trim();
                if text.is_empty() {
                    return DimensionPreview::Unset;
                }
                match (parse_positive_real(text), sample) {
                    (None, _) => DimensionPreview::Invalid,
                    (Some(_), None) => DimensionPreview::Pending,
                    (Some(p), Some(dims)) => DimensionPreview::Target(percentage_target(dims, p)),
                }
            }
            ResizeMode::AspectRatio => {
                let text = config.aspect_ratio.trim();
                if text.is_empty() {
                    return DimensionPreview::Unset;
                }
                match (parse_aspect_ratio(text), sample) {
                    (Err(_), _) => DimensionPreview::Invalid,
                    (Ok(_), None) => DimensionPreview::Pending,
                    (Ok(ratio), Some(dims)) => {
                        DimensionPreview::Target(aspect_ratio_target(dims, ratio))
                    }
                }
            }
        }
    }

    /// Live preview: samples the input directory when the mode needs it.
    pub fn preview(config: &Configuration) -> DimensionPreview {
        let sample = match config.resize_mode {
            ResizeMode::Manual => None,
            _ if config.input_dir.is_dir() => {
                find_sample_image(&config.input_dir).map(|sample| sample.dimensions)
            }
            _ => None,
        };
        Self::resolve(config, sample)
    }
}

fn resolve_manual(width: &str, height: &str) -> DimensionPreview {
    let (width, height) = (width.trim(), height.trim());
    if width.is_empty() && height.is_empty() {
        return DimensionPreview::Unset;
    }

    let parsed_width = (!width.is_empty()).then(|| parse_positive_int(width));
    let parsed_height = (!height.is_empty()).then(|| parse_positive_int(height));
    match (parsed_width, parsed_height) {
        (Some(None), _) | (_, Some(None)) => DimensionPreview::Invalid,
        (Some(Some(w)), Some(Some(h))) => DimensionPreview::Target(Dimensions::new(w, h)),
        // a single side does not trigger a resize
        _ => DimensionPreview::Unset,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    fn with_mode(mode: ResizeMode) -> Configuration {
        Configuration {
            resize_mode: mode,
            ..Default::default()
        }
    }

    #[test]
    fn percentage_truncates() {
        assert_eq!(
            percentage_target(Dimensions::new(1000, 500), 50.0),
            Dimensions::new(500, 250)
        );
        assert_eq!(
            percentage_target(Dimensions::new(333, 101), 33.3),
            Dimensions::new(110, 33)
        );
        assert_eq!(
            percentage_target(Dimensions::new(99, 99), 150.0),
            Dimensions::new(148, 148)
        );
    }

    #[test]
    fn aspect_ratio_keeps_width() {
        let ratio = AspectRatio { width: 16, height: 9 };
        assert_eq!(
            aspect_ratio_target(Dimensions::new(1920, 1080), ratio),
            Dimensions::new(1920, 1080)
        );
        assert_eq!(
            aspect_ratio_target(Dimensions::new(1920, 1200), ratio),
            Dimensions::new(1920, 1080)
        );
        assert_eq!(
            aspect_ratio_target(Dimensions::new(100, 100), AspectRatio { width: 3, height: 2 }),
            Dimensions::new(100, 66)
        );
    }

    #[test]
    fn percentage_preview_states() {
        let mut config = with_mode(ResizeMode::Percentage);
        assert_eq!(DimensionResolver::resolve(&config, None), DimensionPreview::Unset);

        config.percentage = "abc".to_string();
        assert_eq!(DimensionResolver::resolve(&config, None), DimensionPreview::Invalid);

        config.percentage = "50".to_string();
        assert_eq!(DimensionResolver::resolve(&config, None), DimensionPreview::Pending);
        assert_eq!(
            DimensionResolver::resolve(&config, Some(Dimensions::new(1000, 500))),
            DimensionPreview::Target(Dimensions::new(500, 250))
        );
    }

    #[test]
    fn aspect_preview_states() {
        let mut config = with_mode(ResizeMode::AspectRatio);
        config.aspect_ratio = "16-9".to_string();
        assert_eq!(DimensionResolver::resolve(&config, None), DimensionPreview::Invalid);

        config.aspect_ratio = "16:9".to_string();
        assert_eq!(DimensionResolver::resolve(&config, None), DimensionPreview::Pending);
        assert_eq!(
            DimensionResolver::resolve(&config, Some(Dimensions::new(1920, 1200))),
            DimensionPreview::Target(Dimensions::new(1920, 1080))
        );
    }

    #[test]
    fn manual_preview_uses_fields_directly() {
        let mut config = with_mode(ResizeMode::Manual);
        assert_eq!(DimensionResolver::resolve(&config, None), DimensionPreview::Unset);

        config.width = "640".to_string();
        assert_eq!(DimensionResolver::resolve(&config, None), DimensionPreview::Unset);

        config.height = "480".to_string();
        assert_eq!(
            DimensionResolver::resolve(&config, Some(Dimensions::new(1, 1))),
            DimensionPreview::Target(Dimensions::new(640, 480))
        );

        config.height = "0".to_string();
        assert_eq!(DimensionResolver::resolve(&config, None), DimensionPreview::Invalid);
    }

    #[test]
    fn sample_search_skips_undecodable_files() {
        let dir = TempDir::new().unwrap();
        std::fs::write(dir.path().join("broken.png"), b"garbage").unwrap();
        std::fs::write(dir.path().join("readme.txt"), b"text").unwrap();
        image::RgbImage::new(30, 20).save(dir.path().join("good.png")).unwrap();

        let sample = find_sample_image(dir.path()).unwrap();
        assert_eq!(sample.file.filename, "good.png");
        assert_eq!(sample.dimensions, Dimensions::new(30, 20));
    }

    #[test]
    fn preview_samples_input_directory() {
        let dir = TempDir::new().unwrap();
        image::RgbImage::new(200, 100).save(dir.path().join("one.png")).unwrap();

        let config = Configuration {
            input_dir: dir.path().to_path_buf(),
            resize_mode: ResizeMode::Percentage,
            percentage: "25".to_string(),
            ..Default::default()
        };
        assert_eq!(
            DimensionResolver::preview(&config),
            DimensionPreview::Target(Dimensions::new(50, 25))
        );
    }
}
