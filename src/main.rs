use anyhow::{Context, Result};
use clap::Parser;
use indicatif::{ProgressBar, ProgressStyle};
use log::LevelFilter;
use pixbatch::{
    calculate_aspect_ratio, format_dimensions, format_file_size, BatchPipeline, Cli, Commands,
    Configuration, DimensionResolver, Event, EventCategory, EventSink, FileResult, FilterArg,
    Loader, MetadataProcessor, ResizeArgs, RunReport,
};
use std::path::PathBuf;

fn main() -> Result<()> {
    let cli = Cli::parse();

    // Initialize logger
    env_logger::Builder::new()
        .filter_level(if cli.verbose {
            LevelFilter::Debug
        } else {
            LevelFilter::Info
        })
        .init();

    match cli.command {
        Commands::Run {
            input,
            output,
            format,
            dpi,
            filter,
            resize,
        } => process_run(input, output, format, dpi, filter, resize),
        Commands::Preview { input, resize } => process_preview(input, resize),
        Commands::Info { input } => process_info(input),
    }
}

/// Prints events above a progress bar that advances once per result.
struct ConsoleSink {
    progress: ProgressBar,
}

impl ConsoleSink {
    fn new() -> Self {
        Self {
            progress: ProgressBar::hidden(),
        }
    }
}

impl EventSink for ConsoleSink {
    fn on_event(&mut self, event: &Event) {
        if self.progress.is_hidden() {
            println!("{}", event);
        } else {
            self.progress.println(event.to_string());
        }
    }

    fn on_result(&mut self, _result: &FileResult) {
        self.progress.inc(1);
    }

    fn on_scan_complete(&mut self, total: usize) {
        if total == 0 {
            return;
        }
        let progress = ProgressBar::new(total as u64);
        if let Ok(style) = ProgressStyle::default_bar()
            .template("{spinner:.green} [{elapsed_precise}] [{bar:40.cyan/blue}] {pos}/{len} ({eta})")
        {
            progress.set_style(style.progress_chars("#>-"));
        }
        self.progress = progress;
    }
}

fn process_run(
    input: PathBuf,
    output: PathBuf,
    format: Option<String>,
    dpi: Option<String>,
    filter: FilterArg,
    resize: ResizeArgs,
) -> Result<()> {
    let mut config = Configuration::new(input, output);
    config.format = format.unwrap_or_default();
    config.dpi = dpi.unwrap_or_default();
    config.filter = filter.into();
    resize.apply_to(&mut config);

    let mut sink = ConsoleSink::new();
    sink.on_event(&Event::new(
        EventCategory::InputSelected,
        format!("Selected input folder: {}", config.input_dir.display()),
    ));
    sink.on_event(&Event::new(
        EventCategory::OutputSelected,
        format!("Selected output folder: {}", config.output_dir.display()),
    ));

    let handle = BatchPipeline::new(config)
        .spawn(sink)
        .context("Failed to start worker thread")?;
    let (report, sink) = handle.join().context("Cannot start processing")?;
    sink.progress.finish_and_clear();

    print_results(&report);
    Ok(())
}

fn print_results(report: &RunReport) {
    if report.results.is_empty() {
        return;
    }

    println!();
    println!(
        "{:<30} {:>13} {:>13}  {:<40} {}",
        "Filename", "Original Size", "New Size", "Changes", "Status"
    );
    for result in &report.results {
        println!(
            "{:<30} {:>13} {:>13}  {:<40} {}",
            result.filename,
            format_dimensions(result.original_size),
            format_dimensions(result.new_size),
            result.changes.to_string(),
            result.status
        );
    }
    println!(
        "\n{:?}: {} succeeded, {} failed, {} of {} processed",
        report.state,
        report.succeeded(),
        report.failed(),
        report.processed(),
        report.total
    );
}

fn process_preview(input: PathBuf, resize: ResizeArgs) -> Result<()> {
    let mut config = Configuration {
        input_dir: input,
        ..Default::default()
    };
    resize.apply_to(&mut config);

    let config = config.active_fields();
    let preview = DimensionResolver::preview(&config);
    println!("Mode: {:?}", config.resize_mode);
    println!("Target: {}", preview);

    Ok(())
}

fn process_info(input: PathBuf) -> Result<()> {
    if !input.exists() {
        anyhow::bail!("File does not exist: {}", input.display());
    }

    let metadata_processor = MetadataProcessor::new();

    let file_size = std::fs::metadata(&input)?.len();
    let loaded = Loader::new().load(&input)?;
    let dimensions = loaded.dimensions();
    let aspect_ratio = calculate_aspect_ratio(dimensions.width, dimensions.height);
    let dpi = metadata_processor.read_dpi(&input)?;

    println!("=== Image Information ===");
    println!("File: {}", input.display());
    println!("Size: {}", format_file_size(file_size));
    println!("Dimensions: {} pixels", dimensions);
    println!("Aspect Ratio: {:.2}:1", aspect_ratio);
    println!("Format: {}", loaded.format_name());
    println!("Color: {:?}", loaded.image.color());
    match dpi {
        Some(dpi) => println!("DPI: {}", dpi),
        None => println!("DPI: not set"),
    }

    if let Ok(Some(exif)) = metadata_processor.read_metadata(&input) {
        println!("\n=== EXIF Metadata ===");
        for field in exif.fields() {
            println!("{}: {}", field.tag, field.display_value().with_unit(&exif));
        }
    }

    Ok(())
}
