//! Offset/limit page cursor
//!
//! Walks a collection endpoint one page at a time, advancing `offset` by
//! `limit` for as long as the server answers `"more": true`.

use super::types::{Page, RequestParameters};
use crate::error::{Error, Result};
use crate::http::HttpClient;
use crate::types::JsonValue;
use futures::{Stream, TryStreamExt};
use tracing::{debug, warn};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum CursorState {
    NotStarted,
    HasMore,
    Exhausted,
}

/// Lazy, single-pass traversal of one paginated endpoint
///
/// The cursor owns its parameters, so every window or sub-resource fetch
/// gets an independent offset starting wherever its parameters say
/// (normally 0).
pub struct PageCursor<'a> {
    client: &'a HttpClient,
    path: String,
    resource_key: String,
    params: RequestParameters,
    state: CursorState,
    pages_fetched: usize,
}

impl<'a> PageCursor<'a> {
    /// Create a cursor over `path`, whose records live under `resource_key`
    pub fn new(
        client: &'a HttpClient,
        path: impl Into<String>,
        resource_key: impl Into<String>,
        params: RequestParameters,
    ) -> Self {
        Self {
            client,
            path: path.into(),
            resource_key: resource_key.into(),
            params,
            state: CursorState::NotStarted,
            pages_fetched: 0,
        }
    }

    /// Parameters the next request will use
    pub fn params(&self) -> &RequestParameters {
        &self.params
    }

    /// Key under which pages list their records
    pub fn resource_key(&self) -> &str {
        &self.resource_key
    }

    /// Pages fetched so far
    pub fn pages_fetched(&self) -> usize {
        self.pages_fetched
    }

    /// Whether the traversal has ended
    pub fn is_exhausted(&self) -> bool {
        self.state == CursorState::Exhausted
    }

    /// Fetch the next page, or `None` once the server has signalled the end
    pub async fn next_page(&mut self) -> Result<Option<Page>> {
        match self.state {
            CursorState::Exhausted => return Ok(None),
            CursorState::HasMore => self.params.advance(),
            CursorState::NotStarted => {}
        }

        let body = match self.client.get(&self.path, &self.params.to_query()).await {
            Ok(body) => body,
            Err(e) => {
                self.state = CursorState::Exhausted;
                return Err(e);
            }
        };
        self.pages_fetched += 1;

        if !matches!(body.get(&self.resource_key), Some(JsonValue::Array(_))) {
            warn!(
                path = %self.path,
                key = %self.resource_key,
                "Response has no record list, treating page as empty"
            );
        }

        let page = Page {
            body,
            offset: self.params.offset(),
            limit: self.params.limit(),
            number: self.pages_fetched,
        };

        self.state = if page.more() {
            CursorState::HasMore
        } else {
            if !page.body.contains_key("more") {
                debug!(path = %self.path, "Response has no 'more' flag, treating as last page");
            }
            CursorState::Exhausted
        };

        debug!(
            path = %self.path,
            page = page.number,
            offset = page.offset,
            records = page.records(&self.resource_key).len(),
            more = page.more(),
            "Fetched page"
        );

        Ok(Some(page))
    }

    /// Adapt the cursor into a `Stream` of pages
    pub fn into_stream(self) -> impl Stream<Item = Result<Page>> + 'a {
        futures::stream::try_unfold(self, |mut cursor| async move {
            Ok::<_, Error>(cursor.next_page().await?.map(|page| (page, cursor)))
        })
    }

    /// Drain every page and return all records in server order
    pub async fn collect_records(self) -> Result<Vec<JsonValue>> {
        let key = self.resource_key.clone();
        self.into_stream()
            .try_fold(Vec::new(), |mut records, page| {
                records.extend(page.into_records(&key));
                futures::future::ready(Ok(records))
            })
            .await
    }
}

impl std::fmt::Debug for PageCursor<'_> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("PageCursor")
            .field("path", &self.path)
            .field("resource_key", &self.resource_key)
            .field("params", &self.params)
            .field("state", &self.state)
            .field("pages_fetched", &self.pages_fetched)
            .finish()
    }
}
