//! Time-window planning
//!
//! Some endpoints reject `since`/`until` ranges wider than a fixed span
//! (PagerDuty: 6 months for incidents, 3 months for notifications). The
//! planner slices a `[since, until)` interval into consecutive half-open
//! windows no wider than that span; each window is paginated on its own.

use crate::error::{Error, Result};
use crate::pagination::RequestParameters;
use crate::types::format_timestamp;
use chrono::{DateTime, Duration, Utc};

/// One half-open `[since, until)` slice of a larger interval
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Window {
    /// Inclusive start
    pub since: DateTime<Utc>,
    /// Exclusive end
    pub until: DateTime<Utc>,
}

impl Window {
    /// Create a window
    pub fn new(since: DateTime<Utc>, until: DateTime<Utc>) -> Self {
        Self { since, until }
    }

    /// Width of the window
    pub fn span(&self) -> Duration {
        self.until - self.since
    }

    /// Parameters for paginating this window: `since`/`until` set to the
    /// window bounds and `offset` rewound to 0
    pub fn params_from(&self, base: &RequestParameters) -> Result<RequestParameters> {
        let mut params = base.clone();
        params.insert("since", format_timestamp(self.since))?;
        params.insert("until", format_timestamp(self.until))?;
        params.reset_offset();
        Ok(params)
    }
}

impl std::fmt::Display for Window {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "[{}, {})",
            format_timestamp(self.since),
            format_timestamp(self.until)
        )
    }
}

/// Splits intervals into windows no wider than `max_span`
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct WindowPlanner {
    max_span: Duration,
}

impl WindowPlanner {
    /// Create a planner; the span must be positive
    pub fn new(max_span: Duration) -> Result<Self> {
        if max_span <= Duration::zero() {
            return Err(Error::config(format!(
                "window span must be positive, got {max_span}"
            )));
        }
        Ok(Self { max_span })
    }

    /// Planner for a span given in whole days
    pub fn days(days: i64) -> Result<Self> {
        Self::new(Duration::days(days))
    }

    /// Maximum window width
    pub fn max_span(&self) -> Duration {
        self.max_span
    }

    /// Plan the windows covering `[since, until)`
    ///
    /// Windows start at `since` and step by exactly `max_span`; the last one
    /// is clipped to `until`. An empty or inverted interval yields nothing.
    pub fn plan(&self, since: DateTime<Utc>, until: DateTime<Utc>) -> Vec<Window> {
        let mut windows = Vec::new();
        let mut cursor = since;

        while cursor < until {
            let next = cursor + self.max_span;
            windows.push(Window::new(cursor, next.min(until)));
            cursor = next;
        }

        windows
    }
}

/// Plan windows covering `[since, until)` no wider than `max_span`
pub fn plan_windows(
    since: DateTime<Utc>,
    until: DateTime<Utc>,
    max_span: Duration,
) -> Result<Vec<Window>> {
    Ok(WindowPlanner::new(max_span)?.plan(since, until))
}
