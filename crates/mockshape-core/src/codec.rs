//! Lossless conversion between JSON trees and path-addressed chunks.
//!
//! [`flatten`] walks a value in pre-order and emits one [`Chunk`] per leaf.
//! Primitives are leaves, and so are empty objects and empty arrays: a walk
//! into them would produce nothing and the key would be lost.
//!
//! [`unflatten`] rebuilds the tree. Containers are created on demand, the
//! kind of each one decided by the segment used to enter it. The result does
//! not depend on chunk order, with one exception: two chunks assigning
//! scalars at the same complete path resolve last-write-wins.
//!
//! ```rust
//! use mockshape_core::codec::{flatten, unflatten};
//! use serde_json::json;
//!
//! let value = json!({ "name": "John", "children": [], "parents": {} });
//! let chunks = flatten(&value);
//! assert_eq!(chunks.len(), 3);
//! assert_eq!(unflatten(&chunks).unwrap(), value);
//! ```

use std::collections::HashMap;
use std::fmt;

use serde_json::{Map, Value};
use thiserror::Error;
use tracing::{debug, trace};

use crate::types::{render_path, Chunk, PathSegment};

/// Largest array index `unflatten` will materialize. Arrays are filled up to
/// the highest index, so an unbounded index would size the allocation.
pub const MAX_ARRAY_INDEX: usize = 65_535;

/// Errors raised while rebuilding a tree from chunks.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum CodecError {
    /// Two chunks disagree about what lives at a path.
    #[error(
        "Conflicting chunk paths at '{}': expected {expected}, found {found}",
        render_path(.path)
    )]
    ConflictingContainer {
        /// Path where the disagreement was detected.
        path: Vec<PathSegment>,
        /// What the chunk being placed requires there.
        expected: NodeKind,
        /// What earlier chunks already put there.
        found: NodeKind,
    },

    /// A chunk addresses an array position beyond [`MAX_ARRAY_INDEX`].
    #[error(
        "Array index {index} at '{}' exceeds the maximum of {}",
        render_path(.path),
        MAX_ARRAY_INDEX
    )]
    IndexOutOfRange {
        /// Path of the array being entered.
        path: Vec<PathSegment>,
        /// The rejected index.
        index: usize,
    },
}

/// Result type for codec operations.
pub type CodecResult<T> = std::result::Result<T, CodecError>;

/// Kind of node occupying a position in a tree under construction.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NodeKind {
    /// A JSON object.
    Object,
    /// A JSON array.
    Array,
    /// A string, number, boolean or null.
    Scalar,
}

impl NodeKind {
    const fn entered_by(segment: &PathSegment) -> Self {
        match segment {
            PathSegment::Key(_) => Self::Object,
            PathSegment::Index(_) => Self::Array,
        }
    }
}

impl fmt::Display for NodeKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Self::Object => "object",
            Self::Array => "array",
            Self::Scalar => "scalar value",
        })
    }
}

/// Flattens `value` into chunks in pre-order traversal order.
#[must_use]
pub fn flatten(value: &Value) -> Vec<Chunk> {
    flatten_until(value, |_, _| false)
}

/// Flattens `value`, emitting any node for which `is_leaf(path, node)` holds
/// as a single chunk instead of descending into it.
///
/// The output still satisfies `unflatten(flatten_until(v, f)) == v`.
pub fn flatten_until<F>(value: &Value, is_leaf: F) -> Vec<Chunk>
where
    F: Fn(&[PathSegment], &Value) -> bool,
{
    let mut chunks = Vec::new();
    let mut path = Vec::new();
    flatten_into(value, &mut path, &mut chunks, &is_leaf);
    debug!(chunks = chunks.len(), "Flattened JSON value");
    chunks
}

fn flatten_into<F>(value: &Value, path: &mut Vec<PathSegment>, out: &mut Vec<Chunk>, is_leaf: &F)
where
    F: Fn(&[PathSegment], &Value) -> bool,
{
    if !path.is_empty() && is_leaf(path, value) {
        out.push(Chunk::new(path.clone(), value.clone()));
        return;
    }
    match value {
        Value::Object(map) if map.is_empty() => out.push(Chunk::new(path.clone(), value.clone())),
        Value::Array(items) if items.is_empty() => {
            out.push(Chunk::new(path.clone(), value.clone()));
        }
        Value::Object(map) => {
            for (key, child) in map {
                path.push(PathSegment::Key(key.clone()));
                flatten_into(child, path, out, is_leaf);
                path.pop();
            }
        }
        Value::Array(items) => {
            for (index, child) in items.iter().enumerate() {
                path.push(PathSegment::Index(index));
                flatten_into(child, path, out, is_leaf);
                path.pop();
            }
        }
        Value::Null | Value::Bool(_) | Value::Number(_) | Value::String(_) => {
            out.push(Chunk::new(path.clone(), value.clone()));
        }
    }
}

/// Rebuilds a JSON tree from chunks.
///
/// - Chunks with no data create their intermediate containers only.
/// - Array positions no chunk addresses become `null`.
/// - An empty chunk list yields `{}`.
///
/// # Errors
///
/// Returns [`CodecError::ConflictingContainer`] when chunks treat the same
/// prefix as both an object and an array, descend through a scalar, or assign
/// a scalar where other chunks built a container. Returns
/// [`CodecError::IndexOutOfRange`] for an index above [`MAX_ARRAY_INDEX`].
pub fn unflatten(chunks: &[Chunk]) -> CodecResult<Value> {
    let mut root: Option<Slot> = None;
    for chunk in chunks {
        place(&mut root, &chunk.path, 0, chunk.data.as_ref())?;
    }
    debug!(chunks = chunks.len(), "Rebuilt JSON value from chunks");
    Ok(root.map_or_else(|| Value::Object(Map::new()), Slot::into_value))
}

/// Object under construction: members in first-seen order plus a key index.
#[derive(Debug, Default)]
struct ObjectSlot {
    entries: Vec<(String, Option<Slot>)>,
    positions: HashMap<String, usize>,
}

impl ObjectSlot {
    fn entry(&mut self, key: &str) -> &mut Option<Slot> {
        let index = match self.positions.get(key) {
            Some(&index) => index,
            None => {
                self.entries.push((key.to_owned(), None));
                self.positions.insert(key.to_owned(), self.entries.len() - 1);
                self.entries.len() - 1
            }
        };
        &mut self.entries[index].1
    }
}

/// Tree under construction. `None` marks a position that exists but holds
/// no value yet.
#[derive(Debug)]
enum Slot {
    Scalar(Value),
    Object(ObjectSlot),
    Array(Vec<Option<Slot>>),
}

impl Slot {
    const fn kind(&self) -> NodeKind {
        match self {
            Self::Scalar(_) => NodeKind::Scalar,
            Self::Object(_) => NodeKind::Object,
            Self::Array(_) => NodeKind::Array,
        }
    }

    fn empty(kind: NodeKind) -> Self {
        match kind {
            NodeKind::Object => Self::Object(ObjectSlot::default()),
            NodeKind::Array => Self::Array(Vec::new()),
            NodeKind::Scalar => Self::Scalar(Value::Null),
        }
    }

    fn from_value(value: &Value) -> Self {
        match value {
            Value::Object(map) => {
                let mut object = ObjectSlot::default();
                for (key, child) in map {
                    *object.entry(key) = Some(Self::from_value(child));
                }
                Self::Object(object)
            }
            Value::Array(items) => {
                Self::Array(items.iter().map(|item| Some(Self::from_value(item))).collect())
            }
            Value::Null | Value::Bool(_) | Value::Number(_) | Value::String(_) => {
                Self::Scalar(value.clone())
            }
        }
    }

    fn into_value(self) -> Value {
        match self {
            Self::Scalar(value) => value,
            Self::Object(object) => Value::Object(
                object
                    .entries
                    .into_iter()
                    .filter_map(|(key, slot)| slot.map(|slot| (key, slot.into_value())))
                    .collect(),
            ),
            Self::Array(items) => Value::Array(
                items
                    .into_iter()
                    .map(|slot| slot.map_or(Value::Null, Self::into_value))
                    .collect(),
            ),
        }
    }
}

fn place(
    slot: &mut Option<Slot>,
    path: &[PathSegment],
    depth: usize,
    data: Option<&Value>,
) -> CodecResult<()> {
    let Some(segment) = path.get(depth) else {
        return match data {
            Some(value) => merge_into(slot, Slot::from_value(value), &mut path.to_vec()),
            None => Ok(()),
        };
    };
    let child = descend(slot, segment, &path[..depth])?;
    place(child, path, depth + 1, data)
}

/// Enters the child at `segment`, creating the container when vacant.
fn descend<'a>(
    slot: &'a mut Option<Slot>,
    segment: &PathSegment,
    prefix: &[PathSegment],
) -> CodecResult<&'a mut Option<Slot>> {
    let expected = NodeKind::entered_by(segment);
    if slot.is_none() {
        *slot = Some(Slot::empty(expected));
    }
    match (slot.as_mut(), segment) {
        (Some(Slot::Object(object)), PathSegment::Key(key)) => Ok(object.entry(key)),
        (Some(Slot::Array(_)), PathSegment::Index(index)) if *index > MAX_ARRAY_INDEX => {
            Err(CodecError::IndexOutOfRange {
                path: prefix.to_vec(),
                index: *index,
            })
        }
        (Some(Slot::Array(items)), PathSegment::Index(index)) => Ok(array_entry(items, *index)),
        (found, _) => Err(CodecError::ConflictingContainer {
            path: prefix.to_vec(),
            expected,
            found: found.map_or(expected, |slot| slot.kind()),
        }),
    }
}

/// Merges a placed value into whatever already occupies the slot.
///
/// Containers of the same kind merge member by member, which is how an empty
/// container leaf and deeper chunks under the same prefix agree regardless of
/// order. Scalars overwrite scalars.
fn merge_into(
    slot: &mut Option<Slot>,
    incoming: Slot,
    path: &mut Vec<PathSegment>,
) -> CodecResult<()> {
    let Some(existing) = slot.as_mut() else {
        *slot = Some(incoming);
        return Ok(());
    };
    match (existing, incoming) {
        (Slot::Scalar(current), Slot::Scalar(value)) => {
            trace!(path = %render_path(path), "Overwriting scalar at repeated path");
            *current = value;
        }
        (Slot::Object(object), Slot::Object(incoming_object)) => {
            for (key, child) in incoming_object.entries {
                path.push(PathSegment::Key(key.clone()));
                let target = object.entry(&key);
                if let Some(child) = child {
                    merge_into(target, child, path)?;
                }
                path.pop();
            }
        }
        (Slot::Array(items), Slot::Array(incoming_items)) => {
            for (index, child) in incoming_items.into_iter().enumerate() {
                path.push(PathSegment::Index(index));
                let target = array_entry(items, index);
                if let Some(child) = child {
                    merge_into(target, child, path)?;
                }
                path.pop();
            }
        }
        (existing, incoming) => {
            return Err(CodecError::ConflictingContainer {
                path: path.clone(),
                expected: incoming.kind(),
                found: existing.kind(),
            })
        }
    }
    Ok(())
}

/// Callers bound `index` by [`MAX_ARRAY_INDEX`] or by the length of real data.
fn array_entry(items: &mut Vec<Option<Slot>>, index: usize) -> &mut Option<Slot> {
    if items.len() <= index {
        items.resize_with(index + 1, || None);
    }
    &mut items[index]
}

#[cfg(test)]
mod tests {
    use super::*;
    use quickcheck::{quickcheck, Arbitrary, Gen};
    use serde_json::json;

    fn path(segments: &[PathSegment]) -> Vec<PathSegment> {
        segments.to_vec()
    }

    #[test]
    fn test_flatten_object() {
        let value = json!({
            "name": "John",
            "age": 30,
            "city": "New York",
            "children": { "name": "Steve" }
        });

        let chunks = flatten(&value);
        assert_eq!(
            chunks,
            vec![
                Chunk::new(path(&["name".into()]), json!("John")),
                Chunk::new(path(&["age".into()]), json!(30)),
                Chunk::new(path(&["city".into()]), json!("New York")),
                Chunk::new(path(&["children".into(), "name".into()]), json!("Steve")),
            ]
        );
        assert_eq!(unflatten(&chunks).unwrap(), value);
    }

    #[test]
    fn test_flatten_keeps_empty_containers() {
        let value = json!({
            "name": "John",
            "age": 30,
            "city": "New York",
            "children": [],
            "parents": {}
        });

        let chunks = flatten(&value);
        assert_eq!(chunks[3], Chunk::new(path(&["children".into()]), json!([])));
        assert_eq!(chunks[4], Chunk::new(path(&["parents".into()]), json!({})));
        assert_eq!(unflatten(&chunks).unwrap(), value);
    }

    #[test]
    fn test_flatten_arrays_use_index_segments() {
        let value = json!({ "orders": [{ "id": 1 }, { "id": 2, "tags": ["a"] }] });

        let chunks = flatten(&value);
        assert_eq!(
            chunks,
            vec![
                Chunk::new(path(&["orders".into(), 0_usize.into(), "id".into()]), json!(1)),
                Chunk::new(path(&["orders".into(), 1_usize.into(), "id".into()]), json!(2)),
                Chunk::new(
                    path(&["orders".into(), 1_usize.into(), "tags".into(), 0_usize.into()]),
                    json!("a")
                ),
            ]
        );
        assert_eq!(unflatten(&chunks).unwrap(), value);
    }

    #[test]
    fn test_flatten_root_scalar_and_root_array() {
        assert_eq!(flatten(&json!(7)), vec![Chunk::new(Vec::new(), json!(7))]);
        assert_eq!(unflatten(&flatten(&json!(7))).unwrap(), json!(7));

        let value = json!([[], {}, [null]]);
        assert_eq!(unflatten(&flatten(&value)).unwrap(), value);
    }

    #[test]
    fn test_unflatten_is_order_independent() {
        let value = json!({
            "customer": { "id": 1, "tags": ["vip", "new"], "address": {} },
            "orders": [{ "id": 10, "lines": [] }, { "id": 11 }]
        });
        let mut chunks = flatten(&value);
        chunks.reverse();
        assert_eq!(unflatten(&chunks).unwrap(), value);

        chunks.swap(0, 3);
        assert_eq!(unflatten(&chunks).unwrap(), value);
    }

    #[test]
    fn test_unflatten_empty_input_is_empty_object() {
        assert_eq!(unflatten(&[]).unwrap(), json!({}));
    }

    #[test]
    fn test_unflatten_fills_array_holes_with_null() {
        let chunks = vec![Chunk::new(path(&["list".into(), 2_usize.into()]), json!("c"))];
        assert_eq!(unflatten(&chunks).unwrap(), json!({ "list": [null, null, "c"] }));
    }

    #[test]
    fn test_unflatten_skips_undefined_data() {
        let chunks = vec![
            Chunk::new(path(&["a".into()]), json!(1)),
            Chunk::undefined(path(&["b".into(), "c".into()])),
        ];
        assert_eq!(unflatten(&chunks).unwrap(), json!({ "a": 1, "b": {} }));
    }

    #[test]
    fn test_unflatten_absorbs_empty_container_in_either_order() {
        let empty_first = vec![
            Chunk::new(path(&["a".into()]), json!({})),
            Chunk::new(path(&["a".into(), "b".into()]), json!(1)),
        ];
        let empty_last: Vec<Chunk> = empty_first.iter().rev().cloned().collect();

        assert_eq!(unflatten(&empty_first).unwrap(), json!({ "a": { "b": 1 } }));
        assert_eq!(unflatten(&empty_last).unwrap(), json!({ "a": { "b": 1 } }));
    }

    #[test]
    fn test_unflatten_same_path_last_write_wins() {
        let chunks = vec![
            Chunk::new(path(&["a".into()]), json!(1)),
            Chunk::new(path(&["a".into()]), json!(2)),
        ];
        assert_eq!(unflatten(&chunks).unwrap(), json!({ "a": 2 }));
    }

    #[test]
    fn test_unflatten_rejects_object_array_conflict() {
        let chunks = vec![
            Chunk::new(path(&["a".into(), 0_usize.into()]), json!(1)),
            Chunk::new(path(&["a".into(), "b".into()]), json!(2)),
        ];
        let err = unflatten(&chunks).unwrap_err();
        assert_eq!(
            err,
            CodecError::ConflictingContainer {
                path: path(&["a".into()]),
                expected: NodeKind::Object,
                found: NodeKind::Array,
            }
        );
        assert!(err.to_string().contains("'a'"));
    }

    #[test]
    fn test_unflatten_rejects_descent_through_scalar() {
        let chunks = vec![
            Chunk::new(path(&["a".into()]), json!("leaf")),
            Chunk::new(path(&["a".into(), "b".into()]), json!(2)),
        ];
        assert!(matches!(
            unflatten(&chunks),
            Err(CodecError::ConflictingContainer {
                expected: NodeKind::Object,
                found: NodeKind::Scalar,
                ..
            })
        ));
    }

    #[test]
    fn test_unflatten_rejects_scalar_over_built_container() {
        let chunks = vec![
            Chunk::new(path(&["a".into(), "b".into()]), json!(2)),
            Chunk::new(path(&["a".into()]), json!("leaf")),
        ];
        assert!(matches!(
            unflatten(&chunks),
            Err(CodecError::ConflictingContainer {
                expected: NodeKind::Scalar,
                found: NodeKind::Object,
                ..
            })
        ));
    }

    #[test]
    fn test_unflatten_rejects_root_kind_conflict() {
        let chunks = vec![
            Chunk::new(path(&[0_usize.into()]), json!(1)),
            Chunk::new(path(&["a".into()]), json!(2)),
        ];
        let err = unflatten(&chunks).unwrap_err();
        assert!(err.to_string().contains("<root>"));
    }

    #[test]
    fn test_unflatten_rejects_oversized_index() {
        let chunks: Vec<Chunk> =
            serde_json::from_value(json!([{ "path": [u64::MAX], "data": 1 }])).unwrap();
        assert_eq!(
            unflatten(&chunks).unwrap_err(),
            CodecError::IndexOutOfRange {
                path: Vec::new(),
                index: usize::MAX,
            }
        );

        let chunks = vec![Chunk::new(path(&["a".into(), 50_000_000_usize.into()]), json!(1))];
        let err = unflatten(&chunks).unwrap_err();
        assert!(matches!(err, CodecError::IndexOutOfRange { index: 50_000_000, .. }));
        assert!(err.to_string().contains("'a'"));
    }

    #[test]
    fn test_unflatten_accepts_largest_index() {
        let chunks = vec![Chunk::new(path(&[MAX_ARRAY_INDEX.into()]), json!("last"))];
        let value = unflatten(&chunks).unwrap();
        let items = value.as_array().unwrap();
        assert_eq!(items.len(), MAX_ARRAY_INDEX + 1);
        assert_eq!(items[MAX_ARRAY_INDEX], json!("last"));
    }

    #[test]
    fn test_long_data_arrays_are_not_bounded() {
        let long: Vec<u32> = (0..70_000).collect();
        let chunks = vec![
            Chunk::new(path(&["a".into()]), json!([])),
            Chunk::new(path(&["a".into()]), json!(long)),
        ];
        assert_eq!(unflatten(&chunks).unwrap(), json!({ "a": long }));
    }

    #[test]
    fn test_wide_object_round_trips_in_order() {
        let map: Map<String, Value> = (0..5_000).map(|i| (format!("k{i}"), json!(i))).collect();
        let value = Value::Object(map);
        let rebuilt = unflatten(&flatten(&value)).unwrap();
        let keys: Vec<&String> = rebuilt.as_object().unwrap().keys().collect();
        assert_eq!(keys.len(), 5_000);
        assert_eq!(keys[4_999], "k4999");
        assert_eq!(rebuilt, value);
    }

    #[test]
    fn test_flatten_until_keeps_selected_nodes_whole() {
        let value = json!({ "status": { "type": "string", "enum": ["open", "closed"] } });
        let chunks = flatten_until(&value, |path, node| {
            node.is_array() && path.last().and_then(PathSegment::as_key) == Some("enum")
        });
        assert_eq!(
            chunks,
            vec![
                Chunk::new(path(&["status".into(), "type".into()]), json!("string")),
                Chunk::new(path(&["status".into(), "enum".into()]), json!(["open", "closed"])),
            ]
        );
        assert_eq!(unflatten(&chunks).unwrap(), value);
    }

    /// Bounded-depth JSON trees for the round-trip property.
    #[derive(Debug, Clone)]
    struct Tree(Value);

    impl Tree {
        fn generate(g: &mut Gen, depth: usize) -> Value {
            let choice = if depth == 0 { u8::arbitrary(g) % 4 } else { u8::arbitrary(g) % 6 };
            match choice {
                0 => Value::Null,
                1 => Value::Bool(bool::arbitrary(g)),
                2 => json!(i64::arbitrary(g)),
                3 => Value::String(String::arbitrary(g)),
                4 => {
                    let len = usize::arbitrary(g) % 4;
                    Value::Array((0..len).map(|_| Self::generate(g, depth - 1)).collect())
                }
                _ => {
                    let len = usize::arbitrary(g) % 4;
                    Value::Object(
                        (0..len)
                            .map(|_| (String::arbitrary(g), Self::generate(g, depth - 1)))
                            .collect(),
                    )
                }
            }
        }
    }

    impl Arbitrary for Tree {
        fn arbitrary(g: &mut Gen) -> Self {
            Self(Self::generate(g, 4))
        }
    }

    quickcheck! {
        fn prop_unflatten_inverts_flatten(tree: Tree) -> bool {
            unflatten(&flatten(&tree.0)).ok() == Some(tree.0)
        }
    }
}
