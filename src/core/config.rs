// pixbatch/src/core/config.rs
use super::{AspectRatio, ConfigError, ResizeFilter, ResizeMode, TargetFormat};
use std::path::{Path, PathBuf};

/// Operator input for one run, as typed into the form or passed on the
/// command line. Numeric fields hold raw text; an empty string means "not set".
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Configuration {
    pub input_dir: PathBuf,
    pub output_dir: PathBuf,
    pub format: String,
    pub dpi: String,
    pub resize_mode: ResizeMode,
    pub width: String,
    pub height: String,
    pub percentage: String,
    pub aspect_ratio: String,
    pub filter: ResizeFilter,
}

/// Resize fields after validation. The engine dispatches on which of these
/// are set, not on the mode tag.
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct ResizeFields {
    pub width: Option<u32>,
    pub height: Option<u32>,
    pub percentage: Option<f64>,
    pub aspect_ratio: Option<AspectRatio>,
}

/// Typed, validated form of a [`Configuration`].
#[derive(Debug, Clone, PartialEq)]
pub struct RunSettings {
    pub input_dir: PathBuf,
    pub output_dir: PathBuf,
    pub format: Option<TargetFormat>,
    pub dpi: Option<u32>,
    pub resize_mode: ResizeMode,
    pub resize: ResizeFields,
    pub filter: ResizeFilter,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum AspectRatioError {
    Format,
    Value,
}

impl Configuration {
    pub fn new(input_dir: impl Into<PathBuf>, output_dir: impl Into<PathBuf>) -> Self {
        Self {
            input_dir: input_dir.into(),
            output_dir: output_dir.into(),
            ..Default::default()
        }
    }

    /// Copy of this configuration with every field of the inactive resize
    /// modes cleared.
    pub fn active_fields(&self) -> Configuration {
        let mut active = self.clone();
        match self.resize_mode {
            ResizeMode::Manual => {
                active.percentage.clear();
                active.aspect_ratio.clear();
            }
            ResizeMode::AspectRatio => {
                active.width.clear();
                active.height.clear();
                active.percentage.clear();
            }
            ResizeMode::Percentage => {
                active.width.clear();
                active.height.clear();
                active.aspect_ratio.clear();
            }
        }
        active
    }

    pub fn validate(&self) -> Result<RunSettings, ConfigError> {
        validate_config(self)
    }
}

/// Checks a configuration rule by rule and stops at the first violation.
///
/// Creating a missing output directory is the only side effect.
pub fn validate_config(config: &Configuration) -> Result<RunSettings, ConfigError> {
    let config = config.active_fields();

    let input_dir = validate_input_dir(&config.input_dir)?;
    let output_dir = validate_output_dir(&config.output_dir)?;

    let dpi = optional(&config.dpi)
        .map(|text| parse_positive_int(text).ok_or_else(|| ConfigError::InvalidDpi(text.to_string())))
        .transpose()?;
    let width = optional(&config.width)
        .map(|text| parse_positive_int(text).ok_or_else(|| ConfigError::InvalidWidth(text.to_string())))
        .transpose()?;
    let height = optional(&config.height)
        .map(|text| parse_positive_int(text).ok_or_else(|| ConfigError::InvalidHeight(text.to_string())))
        .transpose()?;
    let percentage = optional(&config.percentage)
        .map(|text| {
            parse_positive_real(text).ok_or_else(|| ConfigError::InvalidPercentage(text.to_string()))
        })
        .transpose()?;
    let aspect_ratio = optional(&config.aspect_ratio)
        .map(|text| {
            parse_aspect_ratio(text).map_err(|e| match e {
                AspectRatioError::Format => ConfigError::AspectRatioFormat(text.to_string()),
                AspectRatioError::Value => ConfigError::AspectRatioValue(text.to_string()),
            })
        })
        .transpose()?;

    match config.resize_mode {
        ResizeMode::Manual => {}
        ResizeMode::Percentage if percentage.is_none() => {
            return Err(ConfigError::PercentageRequired);
        }
        ResizeMode::AspectRatio if aspect_ratio.is_none() => {
            return Err(ConfigError::AspectRatioRequired);
        }
        _ => {}
    }

    let format = optional(&config.format)
        .map(|text| {
            text.parse::<TargetFormat>()
                .map_err(|_| ConfigError::UnsupportedFormat(text.to_string()))
        })
        .transpose()?;

    Ok(RunSettings {
        input_dir,
        output_dir,
        format,
        dpi,
        resize_mode: config.resize_mode,
        resize: ResizeFields {
            width,
            height,
            percentage,
            aspect_ratio,
        },
        filter: config.filter,
    })
}

fn validate_input_dir(path: &Path) -> Result<PathBuf, ConfigError> {
    if is_blank(path) {
        return Err(ConfigError::InputMissing);
    }
    if !path.exists() {
        return Err(ConfigError::InputNotFound(path.display().to_string()));
    }
    if !path.is_dir() {
        return Err(ConfigError::InputNotDirectory(path.display().to_string()));
    }
    Ok(path.to_path_buf())
}

fn validate_output_dir(path: &Path) -> Result<PathBuf, ConfigError> {
    if is_blank(path) {
        return Err(ConfigError::OutputMissing);
    }
    if !path.exists() {
        std::fs::create_dir_all(path).map_err(|e| ConfigError::OutputCreate(e.to_string()))?;
        log::info!("Created output folder {}", path.display());
    } else if !path.is_dir() {
        return Err(ConfigError::OutputNotDirectory(path.display().to_string()));
    }
    Ok(path.to_path_buf())
}

fn is_blank(path: &Path) -> bool {
    path.to_string_lossy().trim().is_empty()
}

fn optional(text: &str) -> Option<&str> {
    let text = text.trim();
    if text.is_empty() {
        None
    } else {
        Some(text)
    }
}

pub(crate) fn parse_positive_int(text: &str) -> Option<u32> {
    text.trim().parse::<u32>().ok().filter(|value| *value > 0)
}

pub(crate) fn parse_positive_real(text: &str) -> Option<f64> {
    text.trim()
        .parse::<f64>()
        .ok()
        .filter(|value| value.is_finite() && *value > 0.0)
}

pub(crate) fn parse_aspect_ratio(text: &str) -> Result<AspectRatio, AspectRatioError> {
    let text = text.trim();
    if !text.contains(':') {
        return Err(AspectRatioError::Format);
    }

    let parts: Vec<&str> = text.split(':').collect();
    if parts.len() != 2 {
        return Err(AspectRatioError::Value);
    }

    let width = parts[0].trim().parse::<u32>().map_err(|_| AspectRatioError::Value)?;
    let height = parts[1].trim().parse::<u32>().map_err(|_| AspectRatioError::Value)?;
    if width == 0 || height == 0 {
        return Err(AspectRatioError::Value);
    }

    Ok(AspectRatio { width, height })
}
