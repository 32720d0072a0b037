//! Consolidation of descriptor chunks into per-node property descriptors.
//!
//! Flattening a schema yields descriptor chunks shaped
//! `[...node_path, attribute] = value`. The merger groups them by node path
//! and produces one [`PropertyDescriptor`] per node, keyed by display name.
//! Attributes outside the allow-list (`format`, `pattern`, ...) are dropped.

use std::collections::{BTreeSet, HashMap};

use once_cell::sync::Lazy;
use thiserror::Error;
use tracing::{debug, trace};

use serde_json::Value;

use crate::codec::flatten_until;
use crate::config::MergeConfig;
use crate::types::{display_name, render_path, Chunk, PathSegment, PropertiesMap, PropertyDescriptor};

/// Descriptor attributes kept by default.
pub const DEFAULT_DESCRIPTOR_ATTRIBUTES: &[&str] = &[
    "type",
    "description",
    "enum",
    "items",
    "properties",
    "nullable",
    "example",
    "default",
    "required",
];

/// Attribute holding a descriptor's own node path. Never taken from chunks.
pub const PATH_ATTRIBUTE: &str = "path";

static DEFAULT_MERGER: Lazy<PropertyMerger> = Lazy::new(PropertyMerger::default);

/// Errors raised while merging descriptor chunks.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum MergeError {
    /// Two distinct schema nodes map to the same display name.
    #[error(
        "Display name '{name}' is shared by nodes '{}' and '{}'",
        render_path(.first),
        render_path(.second)
    )]
    DuplicateDisplayName {
        /// The contested display name.
        name: String,
        /// Node path that claimed the name first.
        first: Vec<PathSegment>,
        /// Node path that collided with it.
        second: Vec<PathSegment>,
    },
}

/// Result type for merge operations.
pub type MergeResult<T> = std::result::Result<T, MergeError>;

/// Groups descriptor chunks into property descriptors.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PropertyMerger {
    allowed: BTreeSet<String>,
}

impl Default for PropertyMerger {
    fn default() -> Self {
        Self::new(DEFAULT_DESCRIPTOR_ATTRIBUTES.iter().copied())
    }
}

impl PropertyMerger {
    /// Creates a merger keeping only `attributes`. `path` is never kept.
    pub fn new<I, S>(attributes: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let allowed = attributes
            .into_iter()
            .map(Into::into)
            .filter(|attribute| attribute != PATH_ATTRIBUTE)
            .collect();
        Self { allowed }
    }

    /// Creates a merger from the `[merge]` configuration section.
    #[must_use]
    pub fn from_config(config: &MergeConfig) -> Self {
        Self::new(config.descriptor_attributes.iter().cloned())
    }

    /// Returns `true` if `attribute` survives merging.
    #[must_use]
    pub fn allows(&self, attribute: &str) -> bool {
        self.allowed.contains(attribute)
    }

    /// Flattens a collapsed schema into descriptor chunks.
    ///
    /// Array values under allow-listed attributes (`enum`, `required`, array
    /// `example`s) stay whole, so they reach the descriptor intact instead of
    /// turning into index-named nodes. Object values are still walked, since
    /// after envelope collapsing they may be nested properties.
    #[must_use]
    pub fn descriptor_chunks(&self, schema: &Value) -> Vec<Chunk> {
        flatten_until(schema, |path, node| {
            node.is_array()
                && path
                    .last()
                    .and_then(PathSegment::as_key)
                    .is_some_and(|attribute| self.allows(attribute))
        })
    }

    /// Merges descriptor chunks into a properties map.
    ///
    /// Chunks with an empty path are discarded. Chunks without data still
    /// register their node but contribute no attribute. Later chunks for the
    /// same attribute overwrite earlier ones.
    ///
    /// # Errors
    ///
    /// Returns [`MergeError::DuplicateDisplayName`] when two distinct node
    /// paths render to the same display name, e.g. `["a.b"]` and `["a", "b"]`.
    pub fn merge(&self, chunks: &[Chunk]) -> MergeResult<PropertiesMap> {
        let mut groups: Vec<PropertyDescriptor> = Vec::new();
        let mut index: HashMap<&[PathSegment], usize> = HashMap::new();

        for chunk in chunks {
            let Some((attribute, node_path)) = chunk.path.split_last() else {
                trace!("Discarding chunk with empty path");
                continue;
            };
            let position = *index.entry(node_path).or_insert_with(|| {
                groups.push(PropertyDescriptor::new(node_path.to_vec()));
                groups.len() - 1
            });

            let Some(data) = &chunk.data else {
                continue;
            };
            let name = attribute.to_string();
            if !self.allows(&name) {
                trace!(
                    node = %render_path(node_path),
                    attribute = %name,
                    "Dropping attribute outside the allow-list"
                );
                continue;
            }
            groups[position].attributes.insert(name, data.clone());
        }

        let mut properties = PropertiesMap::new();
        for descriptor in groups {
            let name = display_name(&descriptor.path);
            if let Some(existing) = properties.get(&name) {
                return Err(MergeError::DuplicateDisplayName {
                    name,
                    first: existing.path.clone(),
                    second: descriptor.path,
                });
            }
            properties.insert(name, descriptor);
        }

        debug!(
            chunks = chunks.len(),
            properties = properties.len(),
            "Merged descriptor chunks"
        );
        Ok(properties)
    }
}

/// Merges descriptor chunks using the default allow-list.
///
/// # Errors
///
/// See [`PropertyMerger::merge`].
pub fn merge_chunks_to_properties(chunks: &[Chunk]) -> MergeResult<PropertiesMap> {
    DEFAULT_MERGER.merge(chunks)
}

/// Expands descriptors back into descriptor chunks, one per attribute.
#[must_use]
pub fn properties_to_chunks(properties: &PropertiesMap) -> Vec<Chunk> {
    properties
        .values()
        .flat_map(|descriptor| {
            descriptor.attributes.iter().map(|(name, value)| {
                let mut path = descriptor.path.clone();
                path.push(PathSegment::Key(name.clone()));
                Chunk::new(path, value.clone())
            })
        })
        .collect()
}
