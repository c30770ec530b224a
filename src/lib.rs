// Allow common clippy pedantic lints that aren't critical for this codebase
#![allow(clippy::cast_possible_truncation)]
#![allow(clippy::cast_sign_loss)]
#![allow(clippy::too_many_lines)]
#![allow(clippy::ref_option)]
#![allow(clippy::unused_self)]
#![allow(clippy::struct_excessive_bools)]
#![allow(clippy::must_use_candidate)]
#![allow(clippy::unnecessary_wraps)]
#![allow(clippy::match_same_arms)]
#![allow(clippy::needless_pass_by_value)]
#![allow(clippy::unused_async)]

//! # PagerDuty Tap
//!
//! Incremental extraction of PagerDuty resources as a stream of SCHEMA,
//! RECORD and STATE messages.
//!
//! ## Features
//!
//! - **Offset Pagination**: follows `offset`/`limit` until `more` is false
//! - **Time Windows**: splits wide `since`/`until` ranges to what each endpoint accepts
//! - **Incremental Sync**: monotonic bookmarks, resumable after interruption
//! - **Resilient HTTP**: client-side rate limiting, Fibonacci backoff on 429/5xx
//! - **Schema Coercion**: records conformed to bundled JSON schemas
//!
//! ## Quick Start
//!
//! ```rust,ignore
//! use pagerduty_tap::{Catalog, SchemaLoader, State, SyncEngine, TapConfig};
//!
//! #[tokio::main]
//! async fn main() -> pagerduty_tap::Result<()> {
//!     let config = TapConfig::from_file("config.json")?;
//!     let catalog = Catalog::discover(&SchemaLoader::bundled())?;
//!
//!     let mut state = State::new();
//!     let mut out = Vec::new();
//!     let mut engine = SyncEngine::new(config)?;
//!     engine
//!         .sync_all(pagerduty_tap::streams::AVAILABLE_STREAMS, &mut state, &mut out)
//!         .await?;
//!
//!     Ok(())
//! }
//! ```
//!
//! ## Architecture
//!
//! ```text
//! ┌─────────────────────────────────────────────────────────────────┐
//! │                          SyncEngine                             │
//! │  params → windows → pages → bookmark filter → enrich → emit     │
//! └─────────────────────────────────────────────────────────────────┘
//!                                │
//! ┌──────────┬───────────┬───────┴───────┬───────────┬─────────────┐
//! │   HTTP   │  Paginate │    Window     │   State   │   Output    │
//! ├──────────┼───────────┼───────────────┼───────────┼─────────────┤
//! │ Retry    │ Offset    │ Max span      │ Bookmarks │ SCHEMA      │
//! │ Rate     │ `more`    │ per stream    │ Resume    │ RECORD      │
//! │ Limit    │ flag      │               │ marker    │ STATE       │
//! └──────────┴───────────┴───────────────┴───────────┴─────────────┘
//! ```

#![warn(clippy::all)]
#![warn(clippy::pedantic)]
#![allow(clippy::module_name_repetitions)]
#![allow(clippy::missing_errors_doc)]
#![allow(clippy::missing_panics_doc)]
#![allow(clippy::doc_markdown)]

// ============================================================================
// Module declarations
// ============================================================================

/// Error types for the tap
pub mod error;

/// Common types and type aliases
pub mod types;

/// Tap configuration
pub mod config;

/// HTTP client with retry and rate limiting
pub mod http;

/// Offset pagination
pub mod pagination;

/// Time-window planning
pub mod window;

/// State, bookmarks and checkpointing
pub mod state;

/// Stream schemas and record coercion
pub mod schema;

/// Stream descriptors and request parameters
pub mod streams;

/// Discovery catalog
pub mod catalog;

/// Message output
pub mod output;

/// Main execution engine
pub mod engine;

/// Command-line interface
pub mod cli;

// ============================================================================
// Re-exports
// ============================================================================

pub use error::{Error, Result};
pub use types::*;

// Re-export commonly used types
pub use catalog::Catalog;
pub use config::TapConfig;
pub use engine::SyncEngine;
pub use schema::SchemaLoader;
pub use state::State;

/// Crate version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

/// Crate name
pub const NAME: &str = env!("CARGO_PKG_NAME");
