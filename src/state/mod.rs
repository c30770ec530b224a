//! State management module
//!
//! Handles bookmark tracking and checkpointing. State is handed in by the
//! caller at the start of a run and emitted back as `STATE` messages, so
//! an interrupted run resumes from its last checkpoint.
//!
//! # Overview
//!
//! - `State` - bookmarks per stream plus the `currently_syncing` marker
//! - `BookmarkTracker` - monotonic high-water mark over a replication key
//! - `StateManager` - loading and file persistence

mod bookmark;
mod manager;
mod types;

pub use bookmark::{advance, in_scope, BookmarkTracker};
pub use manager::StateManager;
pub use types::{State, StreamBookmarks};
