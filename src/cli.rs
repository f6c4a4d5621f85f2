// pixbatch/src/cli.rs
use crate::core::{Configuration, ResizeFilter, ResizeMode};
use clap::{Args, Parser, Subcommand, ValueEnum};
use std::path::PathBuf;

#[derive(Parser, Debug)]
#[command(name = "pixbatch", version, about = "Batch image resizer, converter and DPI tagger")]
pub struct Cli {
    /// Enable debug logging
    #[arg(short, long, global = true)]
    pub verbose: bool,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Resize, convert and DPI-tag every image at the top level of a folder
    Run {
        /// Input folder
        input: PathBuf,

        /// Output folder, created if missing
        output: PathBuf,

        /// Target format: JPG, JPEG, PNG, TIF or WEBP (default: keep original)
        #[arg(short, long)]
        format: Option<String>,

        /// DPI stamped into each saved file
        #[arg(short, long)]
        dpi: Option<String>,

        /// Resampling filter
        #[arg(long, value_enum, default_value_t = FilterArg::Bicubic)]
        filter: FilterArg,

        #[command(flatten)]
        resize: ResizeArgs,
    },

    /// Show the size a resize setting would produce for the folder's first image
    Preview {
        /// Input folder to sample
        input: PathBuf,

        #[command(flatten)]
        resize: ResizeArgs,
    },

    /// Display image dimensions, format and DPI
    Info {
        /// Image file
        input: PathBuf,
    },
}

#[derive(Args, Debug, Clone)]
pub struct ResizeArgs {
    /// Which resize fields are active
    #[arg(short, long, value_enum, default_value_t = ModeArg::Manual)]
    pub mode: ModeArg,

    /// Target width in pixels (manual mode)
    #[arg(short = 'W', long)]
    pub width: Option<String>,

    /// Target height in pixels (manual mode)
    #[arg(short = 'H', long)]
    pub height: Option<String>,

    /// Scale factor in percent (percentage mode)
    #[arg(short, long)]
    pub percentage: Option<String>,

    /// Aspect ratio as W:H, width is kept (aspect mode)
    #[arg(short, long)]
    pub aspect: Option<String>,
}

impl ResizeArgs {
    pub fn apply_to(&self, config: &mut Configuration) {
        config.resize_mode = self.mode.into();
        config.width = self.width.clone().unwrap_or_default();
        config.height = self.height.clone().unwrap_or_default();
        config.percentage = self.percentage.clone().unwrap_or_default();
        config.aspect_ratio = self.aspect.clone().unwrap_or_default();
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum ModeArg {
    Manual,
    Aspect,
    Percentage,
}

impl From<ModeArg> for ResizeMode {
    fn from(mode: ModeArg) -> Self {
        match mode {
            ModeArg::Manual => ResizeMode::Manual,
            ModeArg::Aspect => ResizeMode::AspectRatio,
            ModeArg::Percentage => ResizeMode::Percentage,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum FilterArg {
    Nearest,
    Bilinear,
    Bicubic,
    Lanczos3,
}

impl From<FilterArg> for ResizeFilter {
    fn from(filter: FilterArg) -> Self {
        match filter {
            FilterArg::Nearest => ResizeFilter::Nearest,
            FilterArg::Bilinear => ResizeFilter::Bilinear,
            FilterArg::Bicubic => ResizeFilter::Bicubic,
            FilterArg::Lanczos3 => ResizeFilter::Lanczos3,
        }
    }
}
