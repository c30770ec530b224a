//! Stream schemas
//!
//! Loads the JSON schema of each stream and coerces records to it.
//!
//! # Features
//!
//! - **Bundled Schemas**: Every stream's schema is embedded in the binary
//! - **Overrides**: A directory of `<stream_id>.json` files replaces them
//! - **Coercion**: Numeric strings, boolean strings and timestamps are
//!   converted to the declared types; undeclared properties are dropped

mod loader;
mod transform;
mod types;

pub use loader::{SchemaLoader, BUNDLED_SCHEMAS};
pub use transform::coerce_record;
pub use types::{JsonSchema, JsonType, JsonTypeOrArray, SchemaProperty, StreamSchema};

#[cfg(test)]
mod tests;
