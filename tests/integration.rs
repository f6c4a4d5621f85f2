use assert_fs::prelude::*;
use assert_fs::TempDir;
use pixbatch::{
    BatchError, BatchPipeline, CancelFlag, CollectingSink, ConfigError, Configuration, Dimensions,
    Event, EventCategory, EventSink, FileResult, FileStatus, MetadataProcessor, PipelineState,
    ResizeMode,
};
use std::path::Path;

fn rgb(path: &Path, width: u32, height: u32) {
    image::RgbImage::from_pixel(width, height, image::Rgb([200, 100, 50]))
        .save(path)
        .unwrap();
}

fn rgba(path: &Path, width: u32, height: u32) {
    image::RgbaImage::from_pixel(width, height, image::Rgba([10, 20, 30, 100]))
        .save(path)
        .unwrap();
}

fn config_for(temp: &TempDir) -> Configuration {
    Configuration::new(temp.child("in").path(), temp.child("out").path())
}

fn input_dir(temp: &TempDir) -> assert_fs::fixture::ChildPath {
    let input = temp.child("in");
    input.create_dir_all().unwrap();
    input
}

fn run(config: Configuration) -> (pixbatch::RunReport, CollectingSink) {
    let mut sink = CollectingSink::new();
    let report = BatchPipeline::new(config).run(&mut sink).unwrap();
    (report, sink)
}

#[test]
fn manual_mode_without_size_keeps_dimensions() {
    let temp = TempDir::new().unwrap();
    let input = input_dir(&temp);
    rgb(input.child("a.png").path(), 30, 20);
    rgb(input.child("b.jpg").path(), 16, 9);

    let (report, _) = run(config_for(&temp));

    assert_eq!(report.state, PipelineState::Completed);
    assert_eq!(report.processed(), 2);
    for result in &report.results {
        assert_eq!(result.status, FileStatus::Completed);
        assert_eq!(result.new_size, result.original_size);
        assert!(result.changes.size.is_none());
    }
    assert!(temp.child("out/a.png").path().exists());
    assert!(temp.child("out/b.jpg").path().exists());
}

#[test]
fn percentage_mode_scales_each_file_with_truncation() {
    let temp = TempDir::new().unwrap();
    let input = input_dir(&temp);
    rgb(input.child("big.png").path(), 100, 50);
    rgb(input.child("odd.png").path(), 33, 11);

    let mut config = config_for(&temp);
    config.resize_mode = ResizeMode::Percentage;
    config.percentage = "50".to_string();
    // stale values from manual mode are ignored
    config.width = "999".to_string();
    config.height = "999".to_string();

    let (report, _) = run(config);

    let sizes: Vec<(String, Option<Dimensions>)> = report
        .results
        .iter()
        .map(|r| (r.filename.clone(), r.new_size))
        .collect();
    assert!(sizes.contains(&("big.png".to_string(), Some(Dimensions::new(50, 25)))));
    assert!(sizes.contains(&("odd.png".to_string(), Some(Dimensions::new(16, 5)))));
}

#[test]
fn aspect_ratio_mode_keeps_width() {
    let temp = TempDir::new().unwrap();
    let input = input_dir(&temp);
    rgb(input.child("photo.png").path(), 192, 120);

    let mut config = config_for(&temp);
    config.resize_mode = ResizeMode::AspectRatio;
    config.aspect_ratio = "16:9".to_string();

    let (report, sink) = run(config);

    let result = &report.results[0];
    assert_eq!(result.original_size, Some(Dimensions::new(192, 120)));
    assert_eq!(result.new_size, Some(Dimensions::new(192, 108)));
    assert!(sink
        .messages_for(EventCategory::ConfigEcho)
        .contains(&"Target from sample photo.png: 192x108"));
}

#[test]
fn jpeg_target_converts_alpha_sources() {
    let temp = TempDir::new().unwrap();
    let input = input_dir(&temp);
    rgba(input.child("logo.png").path(), 24, 24);

    let mut config = config_for(&temp);
    config.format = "jpg".to_string();

    let (report, sink) = run(config);

    let result = &report.results[0];
    assert_eq!(result.status, FileStatus::Completed);
    assert_eq!(result.changes.format.as_deref(), Some("JPEG"));
    assert_eq!(sink.messages_for(EventCategory::Convert).len(), 1);

    let written = temp.child("out/logo.jpg");
    assert!(written.path().exists());
    let decoded = image::open(written.path()).unwrap();
    assert_eq!(decoded.color(), image::ColorType::Rgb8);
}

#[test]
fn dpi_is_stamped_on_converted_and_original_formats() {
    let temp = TempDir::new().unwrap();
    let input = input_dir(&temp);
    rgb(input.child("scan.jpg").path(), 10, 10);

    let mut config = config_for(&temp);
    config.dpi = "300".to_string();
    let (report, _) = run(config.clone());
    assert_eq!(report.results[0].changes.dpi, Some(300));

    let reader = MetadataProcessor::new();
    assert_eq!(reader.read_dpi(temp.child("out/scan.jpg").path()).unwrap(), Some(300));

    config.format = "TIF".to_string();
    run(config);
    assert_eq!(reader.read_dpi(temp.child("out/scan.tif").path()).unwrap(), Some(300));
}

#[test]
fn failed_file_does_not_stop_the_batch() {
    let temp = TempDir::new().unwrap();
    let input = input_dir(&temp);
    input.child("corrupt.png").write_binary(b"not an image").unwrap();
    rgb(input.child("fine.png").path(), 8, 8);

    let (report, sink) = run(config_for(&temp));

    assert_eq!(report.state, PipelineState::Completed);
    assert_eq!(report.processed(), 2);
    assert_eq!(report.failed(), 1);

    let corrupt = report
        .results
        .iter()
        .find(|r| r.filename == "corrupt.png")
        .unwrap();
    assert!(matches!(corrupt.status, FileStatus::Failed(_)));
    assert_eq!(corrupt.original_size, None);
    assert!(!temp.child("out/corrupt.png").path().exists());
    assert_eq!(sink.messages_for(EventCategory::Error).len(), 1);
}

#[test]
fn empty_folder_completes_with_no_results() {
    let temp = TempDir::new().unwrap();
    let input = input_dir(&temp);
    input.child("readme.txt").write_str("nothing to see").unwrap();
    input.child("nested").create_dir_all().unwrap();
    rgb(input.child("nested/deep.png").path(), 4, 4);

    let pipeline = BatchPipeline::new(config_for(&temp));
    let mut sink = CollectingSink::new();
    let report = pipeline.run(&mut sink).unwrap();

    assert_eq!(report.state, PipelineState::Completed);
    assert_eq!(pipeline.state(), PipelineState::Completed);
    assert!(report.results.is_empty());
    assert_eq!(
        sink.messages_for(EventCategory::ScanSummary),
        vec!["Found 0 image(s) in input folder"]
    );
    assert_eq!(
        sink.messages_for(EventCategory::Info),
        vec![
            "No image files found",
            "Image processing completed! Processed 0 of 0 images."
        ]
    );
}

/// Requests a stop as soon as `after` results have been recorded.
struct StopAfter {
    inner: CollectingSink,
    cancel: CancelFlag,
    after: usize,
}

impl EventSink for StopAfter {
    fn on_event(&mut self, event: &Event) {
        self.inner.on_event(event);
    }

    fn on_result(&mut self, result: &FileResult) {
        self.inner.on_result(result);
        if self.inner.results.len() == self.after {
            self.cancel.cancel();
        }
    }
}

#[test]
fn cancellation_is_observed_between_files() {
    let temp = TempDir::new().unwrap();
    let input = input_dir(&temp);
    for name in ["1.png", "2.png", "3.png", "4.png"] {
        rgb(input.child(name).path(), 6, 6);
    }

    let pipeline = BatchPipeline::new(config_for(&temp));
    let mut sink = StopAfter {
        inner: CollectingSink::new(),
        cancel: pipeline.cancel_flag(),
        after: 2,
    };
    let report = pipeline.run(&mut sink).unwrap();

    assert_eq!(report.state, PipelineState::Stopped);
    assert_eq!(pipeline.state(), PipelineState::Stopped);
    assert_eq!(report.processed(), 2);
    assert_eq!(report.total, 4);
    assert!(sink
        .inner
        .messages_for(EventCategory::Info)
        .contains(&"Image processing stopped! Processed 2 of 4 images."));
}

#[test]
fn rerunning_produces_identical_results() {
    let temp = TempDir::new().unwrap();
    let input = input_dir(&temp);
    rgb(input.child("a.png").path(), 40, 30);
    rgba(input.child("b.png").path(), 12, 12);
    input.child("c.gif").write_binary(b"GIF89a broken").unwrap();

    let mut config = config_for(&temp);
    config.resize_mode = ResizeMode::Manual;
    config.width = "20".to_string();
    config.height = "10".to_string();
    config.format = "webp".to_string();

    let (first, _) = run(config.clone());
    let (second, _) = run(config);

    assert_eq!(first.results, second.results);
    assert!(temp.child("out/a.webp").path().exists());
    assert!(temp.child("out/b.webp").path().exists());
}

#[test]
fn events_for_each_file_are_grouped_in_order() {
    let temp = TempDir::new().unwrap();
    let input = input_dir(&temp);
    rgb(input.child("x.png").path(), 5, 5);
    rgb(input.child("y.png").path(), 5, 5);

    let mut config = config_for(&temp);
    config.dpi = "96".to_string();
    let (_, sink) = run(config);

    let categories = sink.categories();
    let per_file: Vec<EventCategory> = categories
        .iter()
        .copied()
        .skip_while(|c| *c != EventCategory::ScanSummary)
        .skip(1)
        .collect();
    let file_block = [
        EventCategory::ProcessStart,
        EventCategory::Open,
        EventCategory::Dpi,
        EventCategory::Save,
        EventCategory::NewSize,
        EventCategory::Success,
    ];
    assert_eq!(&per_file[..6], &file_block);
    assert_eq!(&per_file[6..12], &file_block);
    assert_eq!(per_file[12], EventCategory::Info);
    assert_eq!(categories[0], EventCategory::ProcessStart);
}

#[test]
fn missing_input_is_reported_first() {
    let temp = TempDir::new().unwrap();
    let config = Configuration {
        output_dir: temp.child("out").path().to_path_buf(),
        dpi: "-1".to_string(),
        aspect_ratio: "bad".to_string(),
        resize_mode: ResizeMode::AspectRatio,
        ..Default::default()
    };

    let mut sink = CollectingSink::new();
    let err = BatchPipeline::new(config).run(&mut sink).unwrap_err();
    assert!(matches!(err, BatchError::Config(ConfigError::InputMissing)));
    assert!(!temp.child("out").path().exists());
}

#[test]
fn spawned_worker_hands_back_sink_and_report() {
    let temp = TempDir::new().unwrap();
    let input = input_dir(&temp);
    rgb(input.child("only.png").path(), 9, 3);

    let handle = BatchPipeline::new(config_for(&temp))
        .spawn(CollectingSink::new())
        .unwrap();
    let (report, sink) = handle.join().unwrap();

    assert_eq!(report.state, PipelineState::Completed);
    assert_eq!(sink.results, report.results);
    assert_eq!(sink.results[0].new_size, Some(Dimensions::new(9, 3)));
}

#[test]
fn oversized_manual_target_fails_files_not_the_batch() {
    let temp = TempDir::new().unwrap();
    let input = input_dir(&temp);
    rgb(input.child("a.png").path(), 8, 8);
    rgb(input.child("b.png").path(), 8, 8);

    let mut config = config_for(&temp);
    config.width = "4294967295".to_string();
    config.height = "4294967295".to_string();

    let (report, _) = run(config);

    assert_eq!(report.state, PipelineState::Completed);
    assert_eq!(report.processed(), 2);
    assert_eq!(report.failed(), 2);
    assert!(!temp.child("out/a.png").path().exists());
    assert!(!temp.child("out/b.png").path().exists());
}

#[test]
fn dpi_keeps_sixteen_bit_sources_deep() {
    let temp = TempDir::new().unwrap();
    let input = input_dir(&temp);
    image::ImageBuffer::<image::Rgb<u16>, _>::from_pixel(6, 4, image::Rgb([300u16, 30000, 60000]))
        .save(input.child("deep.png").path())
        .unwrap();

    let mut config = config_for(&temp);
    config.dpi = "300".to_string();
    let (report, _) = run(config.clone());
    assert_eq!(report.results[0].status, FileStatus::Completed);

    let written = temp.child("out/deep.png");
    assert_eq!(image::open(written.path()).unwrap().color(), image::ColorType::Rgb16);
    assert_eq!(MetadataProcessor::new().read_dpi(written.path()).unwrap(), Some(300));

    config.format = "tiff".to_string();
    run(config);
    let tif = temp.child("out/deep.tif");
    assert_eq!(image::open(tif.path()).unwrap().color(), image::ColorType::Rgb16);
}
