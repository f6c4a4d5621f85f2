// pixbatch/src/processors/batch.rs
use crate::core::{
    validate_config, BatchError, ConfigError, Configuration, FileResult, ImageProcessor, ResizeMode,
    Result, RunSettings,
};
use crate::events::{emit, EventCategory, EventSink};
use crate::processors::dimensions::{find_sample_image, DimensionPreview, DimensionResolver};
use crate::processors::Loader;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex, PoisonError};
use std::thread::JoinHandle;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum PipelineState {
    #[default]
    Idle,
    Running,
    Completed,
    Stopped,
}

/// Cooperative stop request. Checked only between files.
#[derive(Debug, Clone, Default)]
pub struct CancelFlag(Arc<AtomicBool>);

impl CancelFlag {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn cancel(&self) {
        self.0.store(true, Ordering::SeqCst);
    }

    pub fn is_cancelled(&self) -> bool {
        self.0.load(Ordering::SeqCst)
    }

    fn reset(&self) {
        self.0.store(false, Ordering::SeqCst);
    }
}

/// Busy flag shared by every pipeline a caller starts; at most one run holds
/// it at a time.
#[derive(Debug, Clone, Default)]
pub struct ProcessingGate(Arc<AtomicBool>);

impl ProcessingGate {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn is_busy(&self) -> bool {
        self.0.load(Ordering::SeqCst)
    }

    fn try_acquire(&self) -> Option<GateGuard> {
        self.0
            .compare_exchange(false, true, Ordering::SeqCst, Ordering::SeqCst)
            .ok()
            .map(|_| GateGuard(Arc::clone(&self.0)))
    }
}

struct GateGuard(Arc<AtomicBool>);

impl Drop for GateGuard {
    fn drop(&mut self) {
        self.0.store(false, Ordering::SeqCst);
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RunReport {
    pub state: PipelineState,
    pub total: usize,
    pub results: Vec<FileResult>,
}

impl RunReport {
    pub fn processed(&self) -> usize {
        self.results.len()
    }

    pub fn succeeded(&self) -> usize {
        self.results.iter().filter(|r| r.status.is_completed()).count()
    }

    pub fn failed(&self) -> usize {
        self.processed() - self.succeeded()
    }
}

pub struct BatchPipeline {
    config: Configuration,
    cancel: CancelFlag,
    gate: ProcessingGate,
    state: Arc<Mutex<PipelineState>>,
}

impl BatchPipeline {
    /// Pipeline with its own private gate. Runs started from separate
    /// pipelines only exclude each other when they share a gate through
    /// [`BatchPipeline::with_gate`].
    pub fn new(config: Configuration) -> Self {
        Self {
            config,
            cancel: CancelFlag::new(),
            gate: ProcessingGate::new(),
            state: Arc::new(Mutex::new(PipelineState::Idle)),
        }
    }

    pub fn with_gate(mut self, gate: ProcessingGate) -> Self {
        self.gate = gate;
        self
    }

    pub fn cancel_flag(&self) -> CancelFlag {
        self.cancel.clone()
    }

    pub fn state(&self) -> PipelineState {
        *self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }

    fn set_state(&self, state: PipelineState) {
        *self.state.lock().unwrap_or_else(PoisonError::into_inner) = state;
    }

    /// Runs the whole batch on the calling thread.
    ///
    /// Returns `Err` only when the run cannot start; per-file failures are
    /// reported as failed results.
    pub fn run(&self, sink: &mut dyn EventSink) -> Result<RunReport> {
        self.execute(sink, true)
    }

    // `reset_cancel` is false when the caller thread already cleared the
    // flag, so a stop requested right after `spawn` is kept.
    fn execute(&self, sink: &mut dyn EventSink, reset_cancel: bool) -> Result<RunReport> {
        let Some(_guard) = self.gate.try_acquire() else {
            let err = BatchError::AlreadyRunning;
            emit(sink, EventCategory::Error, err.to_string());
            return Err(err);
        };

        let settings = match validate_config(&self.config) {
            Ok(settings) => settings,
            Err(e) => {
                emit(sink, EventCategory::Error, e.to_string());
                return Err(e.into());
            }
        };

        if reset_cancel {
            self.cancel.reset();
        }
        self.set_state(PipelineState::Running);

        match self.run_validated(&settings, sink) {
            Ok(report) => {
                self.set_state(report.state);
                Ok(report)
            }
            Err(e) => {
                emit(sink, EventCategory::Error, e.to_string());
                self.set_state(PipelineState::Idle);
                Err(e)
            }
        }
    }

    /// Runs the batch on a dedicated worker thread.
    pub fn spawn<S>(self, mut sink: S) -> Result<RunHandle<S>>
    where
        S: EventSink + 'static,
    {
        self.cancel.reset();
        let cancel = self.cancel.clone();
        let state = Arc::clone(&self.state);
        let thread = std::thread::Builder::new()
            .name("pixbatch-worker".to_string())
            .spawn(move || {
                let report = self.execute(&mut sink, false);
                (report, sink)
            })?;

        Ok(RunHandle {
            cancel,
            state,
            thread,
        })
    }

    fn run_validated(&self, settings: &RunSettings, sink: &mut dyn EventSink) -> Result<RunReport> {
        emit(sink, EventCategory::ProcessStart, "Beginning image processing...");
        self.echo_config(settings, sink);
        emit(
            sink,
            EventCategory::PathEcho,
            format!("Input: {}", settings.input_dir.display()),
        );
        emit(
            sink,
            EventCategory::PathEcho,
            format!("Output: {}", settings.output_dir.display()),
        );

        std::fs::create_dir_all(&settings.output_dir)
            .map_err(|e| ConfigError::OutputCreate(e.to_string()))?;
        emit(
            sink,
            EventCategory::FolderReady,
            format!("Output folder ready: {}", settings.output_dir.display()),
        );

        let files = Loader::new().scan_directory(&settings.input_dir)?;
        let total = files.len();
        emit(
            sink,
            EventCategory::ScanSummary,
            format!("Found {} image(s) in input folder", total),
        );
        sink.on_scan_complete(total);

        if files.is_empty() {
            emit(sink, EventCategory::Info, "No image files found");
            log::warn!("No image files found in {}", settings.input_dir.display());
            emit_summary(sink, PipelineState::Completed, 0, 0);
            return Ok(RunReport {
                state: PipelineState::Completed,
                total: 0,
                results: Vec::new(),
            });
        }

        log::info!(
            "Processing {} images from {}",
            total,
            settings.input_dir.display()
        );

        let processor = ImageProcessor::new(settings);
        let mut results = Vec::with_capacity(total);
        let mut state = PipelineState::Completed;

        for (idx, file) in files.iter().enumerate() {
            if self.cancel.is_cancelled() {
                emit(
                    sink,
                    EventCategory::Info,
                    format!("Processing stopped by user at image {}/{}", idx + 1, total),
                );
                state = PipelineState::Stopped;
                break;
            }

            emit(
                sink,
                EventCategory::ProcessStart,
                format!("[{}/{}] Processing: {}", idx + 1, total, file.filename),
            );
            let result = processor.process(file, sink);
            sink.on_result(&result);
            results.push(result);
        }

        emit_summary(sink, state, results.len(), total);

        Ok(RunReport {
            state,
            total,
            results,
        })
    }

    fn echo_config(&self, settings: &RunSettings, sink: &mut dyn EventSink) {
        let or_default = |value: Option<String>, default: &str| value.unwrap_or_else(|| default.to_string());
        let resize = &settings.resize;

        let lines = [
            format!(
                "Format: {}",
                or_default(settings.format.map(|f| f.output_format().to_string()), "Original")
            ),
            format!("DPI: {}", or_default(settings.dpi.map(|d| d.to_string()), "Default")),
            format!("Resize mode: {:?}", settings.resize_mode),
            format!("Width: {}", or_default(resize.width.map(|w| w.to_string()), "Not set")),
            format!("Height: {}", or_default(resize.height.map(|h| h.to_string()), "Not set")),
            format!(
                "Percentage: {}",
                or_default(resize.percentage.map(|p| p.to_string()), "Not set")
            ),
            format!(
                "Aspect Ratio: {}",
                or_default(resize.aspect_ratio.map(|a| a.to_string()), "Not set")
            ),
        ];
        for line in lines {
            emit(sink, EventCategory::ConfigEcho, line);
        }

        if settings.resize_mode != ResizeMode::Manual {
            let sample = find_sample_image(&settings.input_dir);
            let active = self.config.active_fields();
            let preview =
                DimensionResolver::resolve(&active, sample.as_ref().map(|s| s.dimensions));
            let message = match (&sample, preview) {
                (Some(sample), DimensionPreview::Target(target)) => {
                    format!("Target from sample {}: {}", sample.file.filename, target)
                }
                _ => format!("Target: {}", preview),
            };
            emit(sink, EventCategory::ConfigEcho, message);
        }
    }
}

fn emit_summary(sink: &mut dyn EventSink, state: PipelineState, processed: usize, total: usize) {
    let verb = match state {
        PipelineState::Stopped => "stopped",
        _ => "completed",
    };
    let summary = format!(
        "Image processing {}! Processed {} of {} images.",
        verb, processed, total
    );
    log::info!("{}", summary);
    emit(sink, EventCategory::Info, summary);
}

/// Handle to a pipeline running on its worker thread.
pub struct RunHandle<S> {
    cancel: CancelFlag,
    state: Arc<Mutex<PipelineState>>,
    thread: JoinHandle<(Result<RunReport>, S)>,
}

impl<S> RunHandle<S> {
    /// Requests a stop; the file in progress still finishes.
    pub fn cancel(&self) {
        self.cancel.cancel();
    }

    pub fn state(&self) -> PipelineState {
        *self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }

    pub fn is_finished(&self) -> bool {
        self.thread.is_finished()
    }

    /// Waits for the worker and hands the sink back.
    pub fn join(self) -> Result<(RunReport, S)> {
        let (report, sink) = self
            .thread
            .join()
            .map_err(|_| BatchError::Processing("Worker thread panicked".to_string()))?;
        Ok((report?, sink))
    }
}
