//! Output shapes of the nest operator.
//!
//! Both shapes describe the same tree: `MapResult` keys each level by an
//! ordered map, `EntriesResult` lists `(key, values)` pairs. Leaves hold
//! references into the caller's data, never copies.

use std::collections::HashSet;

use indexmap::IndexMap;
use serde::ser::{Error as _, SerializeMap, SerializeSeq, SerializeStruct};
use serde::{Serialize, Serializer};

use nest_core::Scalar;

#[derive(Debug, Clone, PartialEq)]
pub enum Leaf<'a, T, R> {
    Records(Vec<&'a T>),
    Rollup(R),
}

impl<'a, T, R> Leaf<'a, T, R> {
    pub fn as_records(&self) -> Option<&[&'a T]> {
        match self {
            Leaf::Records(records) => Some(records),
            Leaf::Rollup(_) => None,
        }
    }

    pub fn as_rollup(&self) -> Option<&R> {
        match self {
            Leaf::Rollup(value) => Some(value),
            Leaf::Records(_) => None,
        }
    }

    /// Record count; a rolled-up leaf counts as one value.
    pub fn len(&self) -> usize {
        match self {
            Leaf::Records(records) => records.len(),
            Leaf::Rollup(_) => 1,
        }
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum MapResult<'a, T, R = Scalar> {
    Groups(IndexMap<Scalar, MapResult<'a, T, R>>),
    Leaf(Leaf<'a, T, R>),
}

impl<'a, T, R> MapResult<'a, T, R> {
    pub fn as_groups(&self) -> Option<&IndexMap<Scalar, MapResult<'a, T, R>>> {
        match self {
            MapResult::Groups(groups) => Some(groups),
            MapResult::Leaf(_) => None,
        }
    }

    pub fn as_leaf(&self) -> Option<&Leaf<'a, T, R>> {
        match self {
            MapResult::Leaf(leaf) => Some(leaf),
            MapResult::Groups(_) => None,
        }
    }

    pub fn get(&self, key: &Scalar) -> Option<&Self> {
        self.as_groups()?.get(key)
    }

    /// Follow one key per level from this node.
    pub fn get_path(&self, path: &[Scalar]) -> Option<&Self> {
        path.iter().try_fold(self, |node, key| node.get(key))
    }

    /// Keys at this level, in output order; empty for a leaf.
    pub fn keys(&self) -> Vec<&Scalar> {
        self.as_groups()
            .map(|groups| groups.keys().collect())
            .unwrap_or_default()
    }

    /// Number of groups at this level, or the leaf's length.
    pub fn len(&self) -> usize {
        match self {
            MapResult::Groups(groups) => groups.len(),
            MapResult::Leaf(leaf) => leaf.len(),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// All leaves, depth-first in output order.
    pub fn leaves(&self) -> Vec<&Leaf<'a, T, R>> {
        let mut out = Vec::new();
        self.collect_leaves(&mut out);
        out
    }

    fn collect_leaves<'s>(&'s self, out: &mut Vec<&'s Leaf<'a, T, R>>) {
        match self {
            MapResult::Groups(groups) => groups.values().for_each(|g| g.collect_leaves(out)),
            MapResult::Leaf(leaf) => out.push(leaf),
        }
    }

    /// Every record under this node in output order. Rolled-up leaves
    /// contribute nothing.
    pub fn records(&self) -> Vec<&'a T> {
        self.leaves()
            .into_iter()
            .filter_map(Leaf::as_records)
            .flat_map(|records| records.iter().copied())
            .collect()
    }

    /// Structural conversion to the entries shape, keeping the map's order.
    pub fn into_entries(self) -> EntriesResult<'a, T, R> {
        match self {
            MapResult::Groups(groups) => EntriesResult::Entries(
                groups
                    .into_iter()
                    .map(|(key, value)| Entry {
                        key,
                        values: value.into_entries(),
                    })
                    .collect(),
            ),
            MapResult::Leaf(leaf) => EntriesResult::Leaf(leaf),
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct Entry<'a, T, R = Scalar> {
    pub key: Scalar,
    pub values: EntriesResult<'a, T, R>,
}

#[derive(Debug, Clone, PartialEq)]
pub enum EntriesResult<'a, T, R = Scalar> {
    Entries(Vec<Entry<'a, T, R>>),
    Leaf(Leaf<'a, T, R>),
}

impl<'a, T, R> EntriesResult<'a, T, R> {
    pub fn as_entries(&self) -> Option<&[Entry<'a, T, R>]> {
        match self {
            EntriesResult::Entries(entries) => Some(entries),
            EntriesResult::Leaf(_) => None,
        }
    }

    pub fn as_leaf(&self) -> Option<&Leaf<'a, T, R>> {
        match self {
            EntriesResult::Leaf(leaf) => Some(leaf),
            EntriesResult::Entries(_) => None,
        }
    }

    /// Keys at this level, in output order; empty for a leaf.
    pub fn keys(&self) -> Vec<&Scalar> {
        self.as_entries()
            .map(|entries| entries.iter().map(|e| &e.key).collect())
            .unwrap_or_default()
    }

    pub fn len(&self) -> usize {
        match self {
            EntriesResult::Entries(entries) => entries.len(),
            EntriesResult::Leaf(leaf) => leaf.len(),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn leaves(&self) -> Vec<&Leaf<'a, T, R>> {
        let mut out = Vec::new();
        self.collect_leaves(&mut out);
        out
    }

    fn collect_leaves<'s>(&'s self, out: &mut Vec<&'s Leaf<'a, T, R>>) {
        match self {
            EntriesResult::Entries(entries) => {
                entries.iter().for_each(|e| e.values.collect_leaves(out))
            }
            EntriesResult::Leaf(leaf) => out.push(leaf),
        }
    }

    pub fn records(&self) -> Vec<&'a T> {
        self.leaves()
            .into_iter()
            .filter_map(Leaf::as_records)
            .flat_map(|records| records.iter().copied())
            .collect()
    }
}

impl<T: Serialize, R: Serialize> Serialize for Leaf<'_, T, R> {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        match self {
            Leaf::Records(records) => {
                let mut seq = serializer.serialize_seq(Some(records.len()))?;
                for record in records {
                    seq.serialize_element(*record)?;
                }
                seq.end()
            }
            Leaf::Rollup(value) => value.serialize(serializer),
        }
    }
}

/// JSON objects need string keys, so map mode keys by the key's display text.
///
/// Distinct keys can share a display text (`Str("1")` and `I64(1)`). Such a
/// level fails to serialize rather than emit an object with a repeated name;
/// serialize the entries form to keep typed keys.
impl<T: Serialize, R: Serialize> Serialize for MapResult<'_, T, R> {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        match self {
            MapResult::Groups(groups) => {
                let mut seen = HashSet::with_capacity(groups.len());
                let mut map = serializer.serialize_map(Some(groups.len()))?;
                for (key, value) in groups {
                    let name = key.to_string();
                    if !seen.insert(name.clone()) {
                        return Err(S::Error::custom(format!(
                            "group keys collide on object key {name:?}"
                        )));
                    }
                    map.serialize_entry(&name, value)?;
                }
                map.end()
            }
            MapResult::Leaf(leaf) => leaf.serialize(serializer),
        }
    }
}

impl<T: Serialize, R: Serialize> Serialize for Entry<'_, T, R> {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let mut st = serializer.serialize_struct("Entry", 2)?;
        st.serialize_field("key", &self.key.to_json())?;
        st.serialize_field("values", &self.values)?;
        st.end()
    }
}

impl<T: Serialize, R: Serialize> Serialize for EntriesResult<'_, T, R> {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        match self {
            EntriesResult::Entries(entries) => entries.serialize(serializer),
            EntriesResult::Leaf(leaf) => leaf.serialize(serializer),
        }
    }
}
