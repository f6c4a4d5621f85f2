// pixbatch/src/events.rs
use crate::core::FileResult;
use chrono::{DateTime, Local};
use std::fmt;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum EventCategory {
    InputSelected,
    OutputSelected,
    ConfigEcho,
    PathEcho,
    FolderReady,
    ScanSummary,
    ProcessStart,
    Open,
    Dpi,
    Resize,
    Format,
    Convert,
    Save,
    NewSize,
    Success,
    Error,
    Info,
}

impl EventCategory {
    pub fn label(self) -> &'static str {
        match self {
            EventCategory::InputSelected => "input-selected",
            EventCategory::OutputSelected => "output-selected",
            EventCategory::ConfigEcho => "config-echo",
            EventCategory::PathEcho => "path-echo",
            EventCategory::FolderReady => "folder-ready",
            EventCategory::ScanSummary => "scan-summary",
            EventCategory::ProcessStart => "process-start",
            EventCategory::Open => "open",
            EventCategory::Dpi => "dpi",
            EventCategory::Resize => "resize",
            EventCategory::Format => "format",
            EventCategory::Convert => "convert",
            EventCategory::Save => "save",
            EventCategory::NewSize => "new-size",
            EventCategory::Success => "success",
            EventCategory::Error => "error",
            EventCategory::Info => "info",
        }
    }
}

impl fmt::Display for EventCategory {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct Event {
    pub category: EventCategory,
    pub message: String,
    pub timestamp: DateTime<Local>,
}

impl Event {
    pub fn new(category: EventCategory, message: impl Into<String>) -> Self {
        Self {
            category,
            message: message.into(),
            timestamp: Local::now(),
        }
    }
}

impl fmt::Display for Event {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{} [{}] {}",
            self.timestamp.format("%H:%M:%S"),
            self.category,
            self.message
        )
    }
}

/// Observer for a run. Called synchronously from the worker thread, so
/// implementations should return quickly.
pub trait EventSink: Send {
    fn on_event(&mut self, event: &Event);

    fn on_result(&mut self, result: &FileResult);

    /// Number of matching files, reported once after the directory scan.
    fn on_scan_complete(&mut self, _total: usize) {}
}

/// Emits an event to the sink and mirrors it into the log.
pub(crate) fn emit(sink: &mut dyn EventSink, category: EventCategory, message: impl Into<String>) {
    let event = Event::new(category, message);
    if category == EventCategory::Error {
        log::warn!("[{}] {}", event.category, event.message);
    } else {
        log::debug!("[{}] {}", event.category, event.message);
    }
    sink.on_event(&event);
}

/// Sink that keeps everything it receives, in order.
#[derive(Debug, Default, Clone)]
pub struct CollectingSink {
    pub events: Vec<Event>,
    pub results: Vec<FileResult>,
}

impl CollectingSink {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn categories(&self) -> Vec<EventCategory> {
        self.events.iter().map(|event| event.category).collect()
    }

    pub fn messages_for(&self, category: EventCategory) -> Vec<&str> {
        self.events
            .iter()
            .filter(|event| event.category == category)
            .map(|event| event.message.as_str())
            .collect()
    }
}

impl EventSink for CollectingSink {
    fn on_event(&mut self, event: &Event) {
        self.events.push(event.clone());
    }

    fn on_result(&mut self, result: &FileResult) {
        self.results.push(result.clone());
    }
}
