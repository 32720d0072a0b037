//! Mock response synthesis from a response schema.
//!
//! The pipeline runs envelope collapsing, flattening and merging to describe
//! every schema node, asks a [`ValueSource`] for a value per node, then
//! rebuilds the nested response from those values.
//!
//! ```text
//! schema ─ collapse ─ flatten ─ merge ─▶ PropertiesMap
//!                                          │ ValueSource::generate
//!                                          ▼
//! response ◀─ unflatten ◀─ value_chunks ◀─ values
//! ```

use serde_json::{Map, Value};
use thiserror::Error;
use tracing::{debug, info};

use crate::codec::{unflatten, CodecError};
use crate::config::Config;
use crate::envelope::EnvelopeCollapser;
use crate::merge::{MergeError, PropertyMerger};
use crate::types::{Chunk, PropertiesMap, PropertyDescriptor};

/// Errors raised by the synthesis pipeline.
#[derive(Debug, Error)]
pub enum SynthesisError {
    /// The schema could not be described.
    #[error(transparent)]
    Merge(#[from] MergeError),

    /// Generated values could not be assembled into a response.
    #[error(transparent)]
    Codec(#[from] CodecError),

    /// A generated value names a property that was never described.
    #[error("Generated value for unknown property '{0}'")]
    UnknownProperty(String),

    /// The value source failed to produce values.
    #[error("Value source failed: {0}")]
    SourceFailed(String),
}

/// Result type for synthesis operations.
pub type SynthesisResult<T> = std::result::Result<T, SynthesisError>;

/// Produces a value for each described property.
///
/// Implementations receive the full properties map and return values keyed
/// by display name. Properties may be left out; they are then absent from the
/// response.
pub trait ValueSource {
    /// Generates values for `properties`.
    ///
    /// # Errors
    ///
    /// Implementations return [`SynthesisError::SourceFailed`] when no values
    /// can be produced.
    fn generate(&self, properties: &PropertiesMap) -> SynthesisResult<Map<String, Value>>;
}

impl<F> ValueSource for F
where
    F: Fn(&PropertiesMap) -> SynthesisResult<Map<String, Value>>,
{
    fn generate(&self, properties: &PropertiesMap) -> SynthesisResult<Map<String, Value>> {
        self(properties)
    }
}

/// Deterministic values taken from the descriptors themselves.
///
/// Per descriptor, the first of: `example`, `default`, the first `enum`
/// entry, `null` when `nullable` is set, or a placeholder for `type`.
/// Descriptors offering none of these get no value.
#[derive(Debug, Clone, Copy, Default)]
pub struct ExampleValues;

impl ExampleValues {
    /// The value chosen for a single descriptor.
    #[must_use]
    pub fn value_for(descriptor: &PropertyDescriptor) -> Option<Value> {
        if let Some(example) = descriptor.attribute("example") {
            return Some(example.clone());
        }
        if let Some(default) = descriptor.attribute("default") {
            return Some(default.clone());
        }
        if let Some(first) = descriptor
            .attribute("enum")
            .and_then(Value::as_array)
            .and_then(|variants| variants.first())
        {
            return Some(first.clone());
        }
        if descriptor.attribute("nullable") == Some(&Value::Bool(true)) {
            return Some(Value::Null);
        }
        descriptor.type_name().map(placeholder)
    }
}

impl ValueSource for ExampleValues {
    fn generate(&self, properties: &PropertiesMap) -> SynthesisResult<Map<String, Value>> {
        Ok(properties
            .iter()
            .filter_map(|(name, descriptor)| {
                Self::value_for(descriptor).map(|value| (name.clone(), value))
            })
            .collect())
    }
}

fn placeholder(type_name: &str) -> Value {
    match type_name {
        "string" => Value::String("string".to_owned()),
        "integer" => Value::from(0),
        "number" => Value::from(0.0),
        "boolean" => Value::Bool(false),
        "array" => Value::Array(Vec::new()),
        "object" => Value::Object(Map::new()),
        _ => Value::Null,
    }
}

/// Turns generated values into data chunks at each property's node path.
///
/// # Errors
///
/// Returns [`SynthesisError::UnknownProperty`] for a value whose display name
/// is not in `properties`.
pub fn value_chunks(
    properties: &PropertiesMap,
    values: &Map<String, Value>,
) -> SynthesisResult<Vec<Chunk>> {
    values
        .iter()
        .map(|(name, value)| {
            properties
                .get(name)
                .map(|descriptor| Chunk::new(descriptor.path.clone(), value.clone()))
                .ok_or_else(|| SynthesisError::UnknownProperty(name.clone()))
        })
        .collect()
}

/// Runs the full schema-to-response pipeline.
#[derive(Debug, Clone)]
pub struct MockSynthesizer<S> {
    collapser: EnvelopeCollapser,
    merger: PropertyMerger,
    source: S,
}

impl<S: ValueSource> MockSynthesizer<S> {
    /// Creates a synthesizer with default envelope keys and allow-list.
    pub fn new(source: S) -> Self {
        Self {
            collapser: EnvelopeCollapser::default(),
            merger: PropertyMerger::default(),
            source,
        }
    }

    /// Creates a synthesizer from configuration.
    pub fn from_config(config: &Config, source: S) -> Self {
        Self {
            collapser: EnvelopeCollapser::from_config(&config.envelope),
            merger: PropertyMerger::from_config(&config.merge),
            source,
        }
    }

    /// Describes every node of `schema` as a property descriptor.
    ///
    /// # Errors
    ///
    /// Fails when two schema nodes share a display name.
    pub fn describe(&self, schema: &Value) -> SynthesisResult<PropertiesMap> {
        let collapsed = self.collapser.collapse(schema);
        let chunks = self.merger.descriptor_chunks(&collapsed);
        Ok(self.merger.merge(&chunks)?)
    }

    /// Rebuilds a response from generated values.
    ///
    /// # Errors
    ///
    /// Fails on values for unknown properties or values whose node paths
    /// contradict each other.
    pub fn assemble(
        &self,
        properties: &PropertiesMap,
        values: &Map<String, Value>,
    ) -> SynthesisResult<Value> {
        let chunks = value_chunks(properties, values)?;
        Ok(unflatten(&chunks)?)
    }

    /// Produces a mock response for `schema`.
    ///
    /// # Errors
    ///
    /// Propagates failures from describing, generating or assembling.
    pub fn synthesize(&self, schema: &Value) -> SynthesisResult<Value> {
        let properties = self.describe(schema)?;
        let values = self.source.generate(&properties)?;
        debug!(
            properties = properties.len(),
            values = values.len(),
            "Generated property values"
        );
        let response = self.assemble(&properties, &values)?;
        info!(properties = properties.len(), "Synthesized mock response");
        Ok(response)
    }
}
