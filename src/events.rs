//! Progress and log sinks the engine reports into.
//!
//! The engine never prints anything itself. Hosts implement [`EventSink`] to
//! surface progress and log lines; [`LogSink`] forwards to the `log` facade
//! and [`Transcript`] records everything for later inspection.

use std::fmt;

use log::{debug, error, info, warn};
use serde::Serialize;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Severity {
    Plain,
    Success,
    Warn,
    Error,
}

impl fmt::Display for Severity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let label = match self {
            Severity::Plain => "plain",
            Severity::Success => "success",
            Severity::Warn => "warn",
            Severity::Error => "error",
        };
        f.write_str(label)
    }
}

/// Receives progress and log events, in-line, from the pipeline.
///
/// Implementations must return promptly: the pipeline is single threaded and
/// waits for every call.
pub trait EventSink {
    fn progress(&mut self, percent: u8, label: &str);

    fn log(&mut self, icon: &str, message: &str, severity: Severity);

    /// Cooperative yield point. Called after every output flush and
    /// periodically while rows are processed. Must not reorder anything.
    fn yield_now(&mut self) {}
}

/// Forwards events to the `log` crate.
#[derive(Debug, Default)]
pub struct LogSink;

impl EventSink for LogSink {
    fn progress(&mut self, percent: u8, label: &str) {
        debug!("[{percent:>3}%] {label}");
    }

    fn log(&mut self, icon: &str, message: &str, severity: Severity) {
        match severity {
            Severity::Plain | Severity::Success => info!("{icon} {message}"),
            Severity::Warn => warn!("{icon} {message}"),
            Severity::Error => error!("{icon} {message}"),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct LogEntry {
    pub icon: String,
    pub message: String,
    pub severity: Severity,
}

/// Records every event in memory.
#[derive(Debug, Default)]
pub struct Transcript {
    pub progress: Vec<(u8, String)>,
    pub entries: Vec<LogEntry>,
    pub yields: usize,
}

impl Transcript {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn messages_with(&self, severity: Severity) -> Vec<&str> {
        self.entries
            .iter()
            .filter(|entry| entry.severity == severity)
            .map(|entry| entry.message.as_str())
            .collect()
    }

    /// Renders the log entries one per line, the way a host would display them.
    pub fn render(&self) -> String {
        let mut out = String::new();
        for entry in &self.entries {
            out.push_str(&format!(
                "{} [{}] {}\n",
                entry.icon, entry.severity, entry.message
            ));
        }
        out
    }
}

impl EventSink for Transcript {
    fn progress(&mut self, percent: u8, label: &str) {
        self.progress.push((percent, label.to_string()));
    }

    fn log(&mut self, icon: &str, message: &str, severity: Severity) {
        self.entries.push(LogEntry {
            icon: icon.to_string(),
            message: message.to_string(),
            severity,
        });
    }

    fn yield_now(&mut self) {
        self.yields += 1;
    }
}

/// Fans events out to two sinks.
pub struct Tee<'a, A: EventSink, B: EventSink> {
    pub first: &'a mut A,
    pub second: &'a mut B,
}

impl<A: EventSink, B: EventSink> EventSink for Tee<'_, A, B> {
    fn progress(&mut self, percent: u8, label: &str) {
        self.first.progress(percent, label);
        self.second.progress(percent, label);
    }

    fn log(&mut self, icon: &str, message: &str, severity: Severity) {
        self.first.log(icon, message, severity);
        self.second.log(icon, message, severity);
    }

    fn yield_now(&mut self) {
        self.first.yield_now();
        self.second.yield_now();
    }
}

/// Wraps a sink so reported progress never goes backwards.
///
/// Lower-than-previous percentages are dropped; equal ones pass through so a
/// new label can be shown at the same position.
pub struct Monotonic<'a, E: EventSink + ?Sized> {
    inner: &'a mut E,
    last: Option<u8>,
}

impl<'a, E: EventSink + ?Sized> Monotonic<'a, E> {
    pub fn new(inner: &'a mut E) -> Self {
        Self { inner, last: None }
    }

    pub fn last(&self) -> Option<u8> {
        self.last
    }
}

impl<E: EventSink + ?Sized> EventSink for Monotonic<'_, E> {
    fn progress(&mut self, percent: u8, label: &str) {
        let percent = percent.min(100);
        if self.last.is_some_and(|last| percent < last) {
            return;
        }
        self.last = Some(percent);
        self.inner.progress(percent, label);
    }

    fn log(&mut self, icon: &str, message: &str, severity: Severity) {
        self.inner.log(icon, message, severity);
    }

    fn yield_now(&mut self) {
        self.inner.yield_now();
    }
}
