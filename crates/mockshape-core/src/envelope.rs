//! Removal of JSON-Schema `properties` / `items` wrapper layers.
//!
//! An envelope key's content is normalized and merged into the object that
//! held it, so `{"type": "object", "properties": {"id": {...}}}` becomes
//! `{"type": "object", "id": {...}}`. Merges are last-write-wins in key order.

use once_cell::sync::Lazy;
use serde_json::{Map, Value};
use tracing::{debug, trace};

use crate::config::EnvelopeConfig;

/// Envelope keys unwrapped by default.
pub const DEFAULT_ENVELOPE_KEYS: &[&str] = &["properties", "items"];

static DEFAULT_COLLAPSER: Lazy<EnvelopeCollapser> = Lazy::new(EnvelopeCollapser::default);

/// Unwraps envelope keys at every depth of a JSON tree.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EnvelopeCollapser {
    keys: Vec<String>,
}

impl Default for EnvelopeCollapser {
    fn default() -> Self {
        Self::new(DEFAULT_ENVELOPE_KEYS.iter().copied())
    }
}

impl EnvelopeCollapser {
    /// Creates a collapser unwrapping `keys`.
    pub fn new<I, S>(keys: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            keys: keys.into_iter().map(Into::into).collect(),
        }
    }

    /// Creates a collapser from the `[envelope]` configuration section.
    #[must_use]
    pub fn from_config(config: &EnvelopeConfig) -> Self {
        Self::new(config.keys.iter().cloned())
    }

    /// Returns `true` if `key` is unwrapped.
    #[must_use]
    pub fn is_envelope(&self, key: &str) -> bool {
        self.keys.iter().any(|envelope| envelope == key)
    }

    /// Returns a copy of `node` with every envelope layer collapsed.
    #[must_use]
    pub fn collapse(&self, node: &Value) -> Value {
        let collapsed = self.collapse_node(node);
        debug!("Collapsed schema envelopes");
        collapsed
    }

    fn collapse_node(&self, node: &Value) -> Value {
        match node {
            Value::Array(items) => {
                Value::Array(items.iter().map(|item| self.collapse_node(item)).collect())
            }
            Value::Object(map) => Value::Object(self.collapse_object(map)),
            Value::Null | Value::Bool(_) | Value::Number(_) | Value::String(_) => node.clone(),
        }
    }

    fn collapse_object(&self, map: &Map<String, Value>) -> Map<String, Value> {
        let mut out = Map::new();
        for (key, value) in map {
            let collapsed = self.collapse_node(value);
            if !self.is_envelope(key) {
                out.insert(key.clone(), collapsed);
                continue;
            }
            match collapsed {
                Value::Object(inner) => out.extend(inner),
                // Tuple-style `items` arrays merge under their index keys.
                Value::Array(items) => out.extend(
                    items
                        .into_iter()
                        .enumerate()
                        .map(|(index, item)| (index.to_string(), item)),
                ),
                Value::Null | Value::Bool(_) | Value::Number(_) | Value::String(_) => {
                    trace!(envelope = %key, "Discarding scalar envelope content");
                }
            }
        }
        out
    }
}

/// Collapses `properties` / `items` envelopes using the default keys.
#[must_use]
pub fn collapse_envelopes(node: &Value) -> Value {
    DEFAULT_COLLAPSER.collapse(node)
}
