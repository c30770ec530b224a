//! Execution engine module
//!
//! Main read loop and stream orchestration.
//!
//! # Overview
//!
//! For every selected stream, in order:
//!
//! 1. build request parameters (all streams are validated before the first
//!    request goes out)
//! 2. plan time windows for endpoints that limit the queried range
//! 3. paginate each window
//! 4. drop records older than the committed bookmark
//! 5. attach sub-resources fetched per record
//! 6. coerce to the stream schema and emit
//! 7. commit the bookmark high-water mark into state
//!
//! Streams run one after another and the first failure ends the run.
//! Before each stream the state is emitted with `currently_syncing` set, and
//! after it with the marker cleared and the new bookmark in place.

mod types;

pub use types::{FailureReporter, LogReporter, StreamSummary, SyncStats};

use crate::config::TapConfig;
use crate::error::{Error, Result};
use crate::http::HttpClient;
use crate::output::{Message, MessageSink};
use crate::pagination::{PageCursor, RequestParameters};
use crate::schema::{coerce_record, SchemaLoader, StreamSchema};
use crate::state::{BookmarkTracker, State};
use crate::streams::{apply_bookmark, build_parameters, StreamDescriptor};
use crate::types::{parse_timestamp, JsonValue};
use chrono::{DateTime, Utc};
use std::time::Instant;
use tracing::{debug, info, warn};

/// A stream ready to run: windows cut, bookmark read, schema loaded
struct StreamPlan {
    descriptor: &'static StreamDescriptor,
    windows: Vec<RequestParameters>,
    tracker: Option<BookmarkTracker>,
    schema: StreamSchema,
}

/// Sync engine for orchestrating data extraction
pub struct SyncEngine {
    /// HTTP client
    client: HttpClient,
    /// Tap configuration
    config: TapConfig,
    /// Schema source
    schemas: SchemaLoader,
    /// Where fatal errors are reported
    reporter: Box<dyn FailureReporter>,
    /// Fixed "now" for reproducible runs
    now: Option<DateTime<Utc>>,
    /// Statistics
    stats: SyncStats,
}

impl SyncEngine {
    /// Create an engine with an HTTP client built from the config
    pub fn new(config: TapConfig) -> Result<Self> {
        let client = HttpClient::with_config(config.http_config())?;
        Ok(Self::with_client(client, config))
    }

    /// Create an engine around an existing client
    pub fn with_client(client: HttpClient, config: TapConfig) -> Self {
        Self {
            client,
            config,
            schemas: SchemaLoader::bundled(),
            reporter: Box::new(LogReporter),
            now: None,
            stats: SyncStats::default(),
        }
    }

    /// Use a different schema source
    #[must_use]
    pub fn with_schemas(mut self, schemas: SchemaLoader) -> Self {
        self.schemas = schemas;
        self
    }

    /// Report fatal errors somewhere other than the log
    #[must_use]
    pub fn with_reporter(mut self, reporter: impl FailureReporter + 'static) -> Self {
        self.reporter = Box::new(reporter);
        self
    }

    /// Pin the time used as the default `until`
    #[must_use]
    pub fn at(mut self, now: DateTime<Utc>) -> Self {
        self.now = Some(now);
        self
    }

    /// Get statistics
    pub fn stats(&self) -> &SyncStats {
        &self.stats
    }

    /// Sync `streams` in order, updating `state` and writing to `sink`
    ///
    /// Every stream is planned before the first request: parameters built,
    /// bookmark applied, windows cut and schema loaded. A configuration or
    /// state error therefore never leaves a partial run behind. A failure is
    /// reported through the [`FailureReporter`] and returned as
    /// [`Error::StreamFailed`]; bookmarks of streams that completed before
    /// it stay committed in `state`.
    pub async fn sync_all(
        &mut self,
        streams: &[&'static StreamDescriptor],
        state: &mut State,
        sink: &mut dyn MessageSink,
    ) -> Result<Vec<StreamSummary>> {
        let start = Instant::now();
        let now = self.now.unwrap_or_else(Utc::now);

        let mut plans = Vec::with_capacity(streams.len());
        for &descriptor in streams {
            match self.plan(descriptor, state, now) {
                Ok(plan) => plans.push(plan),
                Err(e) => return Err(self.fail(descriptor.stream_id, e)),
            }
        }

        info!(streams = plans.len(), "Starting sync");

        let mut summaries = Vec::with_capacity(plans.len());
        for plan in plans {
            let stream_id = plan.descriptor.stream_id;
            match self.run_stream(plan, state, sink).await {
                Ok(summary) => {
                    self.stats.add_stream(&summary);
                    summaries.push(summary);
                }
                Err(e) => return Err(self.fail(stream_id, e)),
            }
        }

        self.stats
            .set_duration(u64::try_from(start.elapsed().as_millis()).unwrap_or(u64::MAX));
        info!(
            streams = self.stats.streams_synced,
            records = self.stats.records_synced,
            skipped = self.stats.records_skipped,
            pages = self.stats.pages_fetched,
            duration_ms = self.stats.duration_ms,
            "Sync complete"
        );

        Ok(summaries)
    }

    /// Resolve everything one stream needs without touching the network
    fn plan(
        &self,
        descriptor: &'static StreamDescriptor,
        state: &State,
        now: DateTime<Utc>,
    ) -> Result<StreamPlan> {
        let stream_id = descriptor.stream_id;
        let mut params = build_parameters(descriptor, &self.config, now)?;

        let tracker = match descriptor.bookmark_key() {
            Some(key) => Some(BookmarkTracker::from_state(state, stream_id, key)?),
            None => None,
        };
        if let Some(ref tracker) = tracker {
            if apply_bookmark(&mut params, tracker.committed())? {
                debug!(
                    stream = stream_id,
                    since = params.get_str("since").unwrap_or_default(),
                    "Resuming from bookmark"
                );
            }
        }

        let windows = window_params(descriptor, &params)?;
        let schema = self.schemas.load(stream_id)?;
        Ok(StreamPlan {
            descriptor,
            windows,
            tracker,
            schema,
        })
    }

    fn fail(&mut self, stream: &str, error: Error) -> Error {
        let error = Error::stream_failed(stream, error);
        self.stats.add_error();
        self.reporter.report_failure(&error);
        error
    }

    /// One stream between its `currently_syncing` markers
    async fn run_stream(
        &self,
        plan: StreamPlan,
        state: &mut State,
        sink: &mut dyn MessageSink,
    ) -> Result<StreamSummary> {
        let stream_id = plan.descriptor.stream_id;

        state.set_currently_syncing(Some(stream_id));
        sink.write(&Message::state(state.to_value()))?;

        let summary = self.sync_stream(plan, state, sink).await?;

        state.set_currently_syncing(None);
        sink.write(&Message::state(state.to_value()))?;

        Ok(summary)
    }

    async fn sync_stream(
        &self,
        plan: StreamPlan,
        state: &mut State,
        sink: &mut dyn MessageSink,
    ) -> Result<StreamSummary> {
        let StreamPlan {
            descriptor,
            windows,
            mut tracker,
            schema,
        } = plan;
        let stream_id = descriptor.stream_id;
        let mut summary = StreamSummary::new(stream_id);
        summary.windows = windows.len();

        info!(
            stream = stream_id,
            method = %descriptor.replication_method,
            "Starting stream"
        );

        sink.write(&Message::schema(
            stream_id,
            schema.document.clone(),
            descriptor.key_properties,
            descriptor.bookmark_key().as_slice(),
        ))?;

        for window in windows {
            let mut cursor = PageCursor::new(
                &self.client,
                descriptor.path(),
                descriptor.resource_key(),
                window,
            );

            while let Some(page) = cursor.next_page().await? {
                summary.pages_fetched += 1;

                for record in page.into_records(descriptor.resource_key()) {
                    let value = tracker.as_ref().and_then(|t| t.value_of(&record));
                    if let (Some(t), Some(v)) = (tracker.as_ref(), value) {
                        if !t.in_scope(v) {
                            summary.records_skipped += 1;
                            continue;
                        }
                    }

                    let record = self.enrich(descriptor, record).await?;
                    let record = coerce_record(stream_id, &schema.typed, record)?;
                    sink.write(&Message::record(stream_id, record, Utc::now()))?;
                    summary.records_emitted += 1;

                    if let Some(t) = tracker.as_mut() {
                        match value {
                            Some(v) => t.observe(v),
                            None => warn!(
                                stream = stream_id,
                                key = t.key(),
                                "Record has no usable replication-key value, bookmark not advanced"
                            ),
                        }
                    }
                }
            }
        }

        if let Some(tracker) = tracker {
            summary.bookmark = tracker.commit(state, stream_id);
        }

        info!(
            stream = stream_id,
            records = summary.records_emitted,
            skipped = summary.records_skipped,
            pages = summary.pages_fetched,
            windows = summary.windows,
            bookmark = summary.bookmark.as_deref().unwrap_or("-"),
            "Completed stream"
        );

        Ok(summary)
    }

    /// Attach every sub-resource of `record`, each fully paginated
    async fn enrich(&self, descriptor: &StreamDescriptor, mut record: JsonValue) -> Result<JsonValue> {
        if descriptor.sub_resources.is_empty() {
            return Ok(record);
        }

        let id = record
            .get("id")
            .and_then(JsonValue::as_str)
            .map(ToString::to_string)
            .ok_or_else(|| {
                Error::malformed(format!("{} record without an id", descriptor.stream_id))
            })?;

        for sub in descriptor.sub_resources {
            let mut params = RequestParameters::new(self.config.limit);
            params.insert("time_zone", self.config.time_zone.as_str())?;

            let items = PageCursor::new(
                &self.client,
                sub.path(&descriptor.path(), &id),
                sub.record_key,
                params,
            )
            .collect_records()
            .await?;

            debug!(
                stream = descriptor.stream_id,
                id = %id,
                sub_resource = sub.name,
                count = items.len(),
                "Fetched sub-resource"
            );

            if let Some(object) = record.as_object_mut() {
                object.insert(sub.record_key.to_string(), JsonValue::Array(items));
            }
        }

        Ok(record)
    }
}

/// Parameters of each window, or the parameters as-is for unwindowed streams
fn window_params(
    descriptor: &StreamDescriptor,
    params: &RequestParameters,
) -> Result<Vec<RequestParameters>> {
    let Some(planner) = descriptor.window_planner()? else {
        return Ok(vec![params.clone()]);
    };

    let bound = |key: &str| {
        params
            .get_str(key)
            .and_then(parse_timestamp)
            .ok_or_else(|| {
                Error::invalid_value(
                    format!("streams.{}.{key}", descriptor.stream_id),
                    "windowed streams need timestamp bounds",
                )
            })
    };
    let since = bound("since")?;
    let until = bound("until")?;

    let windows = planner.plan(since, until);
    debug!(
        stream = descriptor.stream_id,
        windows = windows.len(),
        "Planned time windows"
    );
    windows.iter().map(|w| w.params_from(params)).collect()
}
