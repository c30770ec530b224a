//! Pagination module
//!
//! Offset/limit pagination driven by the response's `more` flag.
//!
//! # Overview
//!
//! A [`PageCursor`] owns a set of [`RequestParameters`] and fetches one
//! [`Page`] per call, moving `offset` forward by `limit` while the server
//! reports more results. A missing or non-boolean `more` ends the
//! traversal, so malformed responses can never loop forever.

mod cursor;
mod types;

pub use cursor::PageCursor;
pub use types::{Page, RequestParameters, DEFAULT_LIMIT};
