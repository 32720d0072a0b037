//! # mockshape-core
//!
//! Core transforms for shaping mock API responses from JSON Schemas.
//!
//! This crate provides:
//! - A lossless codec between JSON trees and path-addressed chunks
//! - Consolidation of schema chunks into per-property descriptors
//! - Removal of `properties` / `items` envelope layers
//! - A pipeline that turns a response schema into a mock response
//!
//! ## Architecture
//!
//! The crate is organized into the following modules:
//!
//! - [`codec`] - `flatten` / `unflatten` between JSON values and chunks
//! - [`merge`] - Grouping descriptor chunks into a properties map
//! - [`envelope`] - Collapsing schema envelope keys
//! - [`synthesis`] - Schema-to-response pipeline and value sources
//! - [`config`] - Configuration loading, saving, and validation
//! - [`error`] - Unified error types for the crate
//! - [`types`] - Shared types and OpenAPI schemas

#![forbid(unsafe_code)]
#![warn(clippy::all, clippy::pedantic, clippy::nursery)]
#![warn(missing_docs)]

pub mod codec;
pub mod config;
pub mod envelope;
pub mod error;
pub mod merge;
pub mod synthesis;
pub mod types;

// Re-export primary types for convenience
pub use codec::{
    flatten, flatten_until, unflatten, CodecError, CodecResult, NodeKind, MAX_ARRAY_INDEX,
};
pub use config::{
    Config, ConfigError, ConfigResult, EnvelopeConfig, LogFormat, LoggingConfig, MergeConfig,
};
pub use envelope::{collapse_envelopes, EnvelopeCollapser, DEFAULT_ENVELOPE_KEYS};
pub use error::{MockshapeError, Result};
pub use merge::{
    merge_chunks_to_properties, properties_to_chunks, MergeError, MergeResult, PropertyMerger,
    DEFAULT_DESCRIPTOR_ATTRIBUTES,
};
pub use synthesis::{
    value_chunks, ExampleValues, MockSynthesizer, SynthesisError, SynthesisResult, ValueSource,
};
pub use types::{display_name, render_path, Chunk, PathSegment, PropertiesMap, PropertyDescriptor};
