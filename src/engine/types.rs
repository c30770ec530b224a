//! Engine types
//!
//! Run statistics and the failure-reporting seam of the sync engine.

use crate::error::Error;
use tracing::error;

/// Receives the error that ended a run
///
/// The engine calls this exactly once per failed run, before returning the
/// error to its caller.
pub trait FailureReporter: Send + Sync {
    /// Report a fatal error
    fn report_failure(&self, error: &Error);
}

/// Reports failures through `tracing`
#[derive(Debug, Clone, Copy, Default)]
pub struct LogReporter;

impl FailureReporter for LogReporter {
    fn report_failure(&self, err: &Error) {
        match err {
            Error::StreamFailed { stream, source } => {
                error!(stream = %stream, error = %source, "Sync failed");
            }
            other => error!(error = %other, "Sync failed"),
        }
    }
}

/// Outcome of one stream-run
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct StreamSummary {
    /// Stream id
    pub stream: String,
    /// Records emitted
    pub records_emitted: usize,
    /// Records skipped as older than the bookmark
    pub records_skipped: usize,
    /// Pages fetched from the stream's own endpoint
    pub pages_fetched: usize,
    /// Time windows traversed
    pub windows: usize,
    /// Bookmark written at the end of the run
    pub bookmark: Option<String>,
}

impl StreamSummary {
    /// Create an empty summary
    pub fn new(stream: impl Into<String>) -> Self {
        Self {
            stream: stream.into(),
            ..Self::default()
        }
    }
}

/// Statistics from a sync operation
#[derive(Debug, Clone, Default)]
pub struct SyncStats {
    /// Total records emitted
    pub records_synced: usize,
    /// Total records skipped by the bookmark filter
    pub records_skipped: usize,
    /// Total pages fetched
    pub pages_fetched: usize,
    /// Total streams synced
    pub streams_synced: usize,
    /// Errors encountered
    pub errors: usize,
    /// Duration in milliseconds
    pub duration_ms: u64,
}

impl SyncStats {
    /// Create new stats
    pub fn new() -> Self {
        Self::default()
    }

    /// Fold in a finished stream
    pub fn add_stream(&mut self, summary: &StreamSummary) {
        self.records_synced += summary.records_emitted;
        self.records_skipped += summary.records_skipped;
        self.pages_fetched += summary.pages_fetched;
        self.streams_synced += 1;
    }

    /// Add an error
    pub fn add_error(&mut self) {
        self.errors += 1;
    }

    /// Set duration
    pub fn set_duration(&mut self, ms: u64) {
        self.duration_ms = ms;
    }
}
