//! Shared types and OpenAPI schemas.
//!
//! These are the values passed between pipeline stages: path segments,
//! chunks, and the property descriptors produced by the merger. They derive
//! [`ToSchema`] so a hosting HTTP layer can publish them in its own document.

use std::collections::BTreeMap;
use std::fmt;

use serde::{Deserialize, Deserializer, Serialize};
use serde_json::Value;
use utoipa::ToSchema;

/// One step of a path into a JSON value.
///
/// Serialized untagged: keys as JSON strings, indices as JSON numbers.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize, ToSchema)]
#[serde(untagged)]
pub enum PathSegment {
    /// Object key traversal.
    Key(String),
    /// Array index traversal.
    Index(usize),
}

impl PathSegment {
    /// Returns `true` if this segment addresses an array element.
    #[inline]
    #[must_use]
    pub const fn is_index(&self) -> bool {
        matches!(self, Self::Index(_))
    }

    /// Returns the key if this segment addresses an object member.
    #[must_use]
    pub fn as_key(&self) -> Option<&str> {
        match self {
            Self::Key(key) => Some(key),
            Self::Index(_) => None,
        }
    }
}

impl fmt::Display for PathSegment {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Key(key) => f.write_str(key),
            Self::Index(index) => write!(f, "{index}"),
        }
    }
}

impl From<&str> for PathSegment {
    fn from(key: &str) -> Self {
        Self::Key(key.to_owned())
    }
}

impl From<String> for PathSegment {
    fn from(key: String) -> Self {
        Self::Key(key)
    }
}

impl From<usize> for PathSegment {
    fn from(index: usize) -> Self {
        Self::Index(index)
    }
}

/// Renders a path for log and error messages (`customer/0/id`, `<root>`).
#[must_use]
pub fn render_path(path: &[PathSegment]) -> String {
    if path.is_empty() {
        return "<root>".to_owned();
    }
    path.iter()
        .map(ToString::to_string)
        .collect::<Vec<_>>()
        .join("/")
}

/// Display name of the schema node at `node_path`.
///
/// A single segment keeps its bare string form; deeper nodes are always fully
/// dotted (`["name", "id"]` becomes `"name.id"`). The root node is `""`.
#[must_use]
pub fn display_name(node_path: &[PathSegment]) -> String {
    node_path
        .iter()
        .map(ToString::to_string)
        .collect::<Vec<_>>()
        .join(".")
}

/// A single path-addressed value: "the value at `path` is `data`".
///
/// `data` is `None` when no value was supplied for the path. That state is
/// distinct from an explicit JSON `null` and is omitted when serialized.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, ToSchema)]
#[schema(example = json!({ "path": ["customer", 0, "id"], "data": 42 }))]
pub struct Chunk {
    /// Location of the value inside the tree.
    pub path: Vec<PathSegment>,

    /// The value at `path`.
    #[serde(
        default,
        skip_serializing_if = "Option::is_none",
        deserialize_with = "deserialize_present"
    )]
    pub data: Option<Value>,
}

impl Chunk {
    /// Creates a chunk carrying `data`.
    #[must_use]
    pub fn new(path: Vec<PathSegment>, data: Value) -> Self {
        Self {
            path,
            data: Some(data),
        }
    }

    /// Creates a chunk with no value supplied.
    #[must_use]
    pub const fn undefined(path: Vec<PathSegment>) -> Self {
        Self { path, data: None }
    }

    /// For descriptor chunks: the path of the schema node the attribute belongs to.
    ///
    /// Returns `None` for the empty path.
    #[must_use]
    pub fn node_path(&self) -> Option<&[PathSegment]> {
        self.path.split_last().map(|(_, node_path)| node_path)
    }

    /// For descriptor chunks: the attribute name (last segment).
    #[must_use]
    pub fn attribute(&self) -> Option<&PathSegment> {
        self.path.last()
    }
}

/// A present field always deserializes to `Some`, including JSON `null`.
fn deserialize_present<'de, D>(deserializer: D) -> Result<Option<Value>, D::Error>
where
    D: Deserializer<'de>,
{
    Value::deserialize(deserializer).map(Some)
}

/// Consolidated descriptor attributes of one schema node.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize, ToSchema)]
#[schema(example = json!({
    "type": "string",
    "description": "Customer name",
    "path": ["name", "id"]
}))]
pub struct PropertyDescriptor {
    /// Path of the schema node this descriptor was built from.
    pub path: Vec<PathSegment>,

    /// Allow-listed descriptor attributes (`type`, `description`, ...).
    #[serde(flatten)]
    pub attributes: BTreeMap<String, Value>,
}

impl PropertyDescriptor {
    /// Creates an empty descriptor for the node at `path`.
    #[must_use]
    pub const fn new(path: Vec<PathSegment>) -> Self {
        Self {
            path,
            attributes: BTreeMap::new(),
        }
    }

    /// Looks up a single attribute.
    #[must_use]
    pub fn attribute(&self, name: &str) -> Option<&Value> {
        self.attributes.get(name)
    }

    /// The `type` attribute, when it is a string.
    #[must_use]
    pub fn type_name(&self) -> Option<&str> {
        self.attribute("type").and_then(Value::as_str)
    }

    /// The name this descriptor is keyed under in a [`PropertiesMap`].
    #[must_use]
    pub fn display_name(&self) -> String {
        display_name(&self.path)
    }
}

/// Display name to descriptor. Every descriptor `path` is unique in the map.
pub type PropertiesMap = BTreeMap<String, PropertyDescriptor>;
