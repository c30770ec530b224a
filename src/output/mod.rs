//! Output module
//!
//! Serializes the tap's message stream.
//!
//! # Overview
//!
//! This module provides:
//! - `Message` - `SCHEMA`, `RECORD` and `STATE` messages
//! - `MessageSink` - destination for messages, one at a time
//! - `JsonLinesWriter` - newline-delimited JSON on any `Write`

mod message;
mod writer;

pub use message::Message;
pub use writer::{JsonLinesWriter, MessageSink};
