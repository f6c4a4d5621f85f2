// pixbatch/src/utils/mod.rs
use crate::core::{Dimensions, TargetFormat};
use std::path::{Path, PathBuf};

pub const SUPPORTED_EXTENSIONS: [&str; 8] =
    ["jpg", "jpeg", "png", "gif", "bmp", "webp", "tiff", "tif"];

/// Extension membership test, case-insensitive.
pub fn is_supported_format(path: &Path) -> bool {
    get_file_extension(path)
        .map(|ext| SUPPORTED_EXTENSIONS.contains(&ext.as_str()))
        .unwrap_or(false)
}

pub fn get_file_extension(path: &Path) -> Option<String> {
    path.extension()
        .and_then(|ext| ext.to_str())
        .map(|s| s.to_lowercase())
}

/// Output location for `input_path`: same file name when no format is
/// requested, otherwise the input stem with the target's extension.
pub fn output_path_for(
    input_path: &Path,
    output_dir: &Path,
    format: Option<TargetFormat>,
) -> Option<PathBuf> {
    match format {
        None => input_path.file_name().map(|name| output_dir.join(name)),
        Some(format) => {
            let stem = input_path.file_stem()?.to_string_lossy();
            Some(output_dir.join(format!("{}.{}", stem, format.extension())))
        }
    }
}

pub fn format_dimensions(dimensions: Option<Dimensions>) -> String {
    dimensions
        .map(|d| d.to_string())
        .unwrap_or_else(|| "N/A".to_string())
}

pub fn format_file_size(bytes: u64) -> String {
    const UNITS: [&str; 6] = ["B", "KB", "MB", "GB", "TB", "PB"];

    if bytes == 0 {
        return "0 B".to_string();
    }

    let base = 1024_f64;
    let bytes_f64 = bytes as f64;
    let exponent = ((bytes_f64.log10() / base.log10()).floor() as usize).min(UNITS.len() - 1);
    let size = bytes_f64 / base.powi(exponent as i32);

    format!("{:.2} {}", size, UNITS[exponent])
}

pub fn calculate_aspect_ratio(width: u32, height: u32) -> f32 {
    if height == 0 {
        0.0
    } else {
        width as f32 / height as f32
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn supported_format_ignores_case() {
        assert!(is_supported_format(Path::new("a/photo.JPG")));
        assert!(is_supported_format(Path::new("scan.TiF")));
        assert!(is_supported_format(Path::new("x.webp")));
        assert!(!is_supported_format(Path::new("notes.txt")));
        assert!(!is_supported_format(Path::new("jpg")));
    }

    #[test]
    fn output_path_keeps_name_without_format() {
        let out = output_path_for(Path::new("/in/Photo.JPEG"), Path::new("/out"), None);
        assert_eq!(out, Some(PathBuf::from("/out/Photo.JPEG")));
    }

    #[test]
    fn output_path_swaps_extension_for_target() {
        let dir = Path::new("/out");
        let input = Path::new("/in/photo.png");
        assert_eq!(
            output_path_for(input, dir, Some(TargetFormat::Jpeg)),
            Some(PathBuf::from("/out/photo.jpg"))
        );
        assert_eq!(
            output_path_for(input, dir, Some(TargetFormat::Tiff)),
            Some(PathBuf::from("/out/photo.tif"))
        );
    }

    #[test]
    fn file_sizes_are_humanized() {
        assert_eq!(format_file_size(0), "0 B");
        assert_eq!(format_file_size(512), "512.00 B");
        assert_eq!(format_file_size(2048), "2.00 KB");
    }

    #[test]
    fn missing_dimensions_render_as_na() {
        assert_eq!(format_dimensions(None), "N/A");
        assert_eq!(format_dimensions(Some(Dimensions::new(4, 3))), "4x3");
    }
}
