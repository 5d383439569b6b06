//! Keyed-collection diff.
//!
//! Structured documents reduce to ordered maps of named entities (registers,
//! parameters, bus interfaces). Comparing two such maps yields additions,
//! removals, and modifications, in key order.

use std::cmp::Ordering;
use std::collections::BTreeMap;

use serde::Serialize;

/// The result of comparing two keyed maps.
#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct MapDiff<K, V> {
    pub changes: Vec<MapChange<K, V>>,
}

impl<K, V> Default for MapDiff<K, V> {
    fn default() -> Self {
        Self {
            changes: Vec::new(),
        }
    }
}

impl<K, V> MapDiff<K, V> {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn is_empty(&self) -> bool {
        self.changes.is_empty()
    }

    pub fn len(&self) -> usize {
        self.changes.len()
    }

    pub fn additions(&self) -> usize {
        self.changes
            .iter()
            .filter(|c| matches!(c, MapChange::Added { .. }))
            .count()
    }

    pub fn removals(&self) -> usize {
        self.changes
            .iter()
            .filter(|c| matches!(c, MapChange::Removed { .. }))
            .count()
    }

    pub fn modifications(&self) -> usize {
        self.changes
            .iter()
            .filter(|c| matches!(c, MapChange::Modified { .. }))
            .count()
    }
}

/// A single change between two maps.
#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
#[serde(tag = "change", rename_all = "snake_case")]
pub enum MapChange<K, V> {
    /// Key present only in the new map.
    Added { key: K, value: V },
    /// Key present only in the old map.
    Removed { key: K, value: V },
    /// Key present in both with unequal values.
    Modified { key: K, old: V, new: V },
}

impl<K, V> MapChange<K, V> {
    pub fn key(&self) -> &K {
        match self {
            Self::Added { key, .. } | Self::Removed { key, .. } | Self::Modified { key, .. } => key,
        }
    }
}

/// Diff two maps using `PartialEq` on values.
pub fn diff_maps<K, V>(old: &BTreeMap<K, V>, new: &BTreeMap<K, V>) -> MapDiff<K, V>
where
    K: Ord + Clone,
    V: Clone + PartialEq,
{
    diff_maps_by(old, new, |a, b| a == b)
}

/// Diff two maps with a caller-supplied value equality.
pub fn diff_maps_by<K, V, F>(old: &BTreeMap<K, V>, new: &BTreeMap<K, V>, mut eq: F) -> MapDiff<K, V>
where
    K: Ord + Clone,
    V: Clone,
    F: FnMut(&V, &V) -> bool,
{
    let mut changes = Vec::new();
    let mut left = old.iter().peekable();
    let mut right = new.iter().peekable();

    loop {
        let order = match (left.peek(), right.peek()) {
            (Some((ka, _)), Some((kb, _))) => ka.cmp(kb),
            (Some(_), None) => Ordering::Less,
            (None, Some(_)) => Ordering::Greater,
            (None, None) => break,
        };

        match order {
            Ordering::Less => {
                if let Some((key, value)) = left.next() {
                    changes.push(MapChange::Removed {
                        key: key.clone(),
                        value: value.clone(),
                    });
                }
            }
            Ordering::Greater => {
                if let Some((key, value)) = right.next() {
                    changes.push(MapChange::Added {
                        key: key.clone(),
                        value: value.clone(),
                    });
                }
            }
            Ordering::Equal => {
                if let (Some((key, old_val)), Some((_, new_val))) = (left.next(), right.next()) {
                    if !eq(old_val, new_val) {
                        changes.push(MapChange::Modified {
                            key: key.clone(),
                            old: old_val.clone(),
                            new: new_val.clone(),
                        });
                    }
                }
            }
        }
    }

    MapDiff { changes }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn map(pairs: &[(&str, &str)]) -> BTreeMap<String, String> {
        pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect()
    }

    #[test]
    fn identical_maps_no_diff() {
        let m = map(&[("CTRL", "0x0"), ("STATUS", "0x4")]);
        assert!(diff_maps(&m, &m).is_empty());
    }

    #[test]
    fn empty_to_populated() {
        let diff = diff_maps(&BTreeMap::new(), &map(&[("a", "1"), ("b", "2")]));
        assert_eq!(diff.additions(), 2);
        assert_eq!(diff.removals(), 0);
    }

    #[test]
    fn mixed_changes_in_key_order() {
        let old = map(&[("keep", "1"), ("modify", "old"), ("remove", "x")]);
        let new = map(&[("added", "y"), ("keep", "1"), ("modify", "new")]);

        let diff = diff_maps(&old, &new);
        assert_eq!(diff.len(), 3);
        assert_eq!(diff.additions(), 1);
        assert_eq!(diff.removals(), 1);
        assert_eq!(diff.modifications(), 1);

        let keys: Vec<&str> = diff.changes.iter().map(|c| c.key().as_str()).collect();
        assert_eq!(keys, vec!["added", "modify", "remove"]);

        match &diff.changes[1] {
            MapChange::Modified { old, new, .. } => {
                assert_eq!(old, "old");
                assert_eq!(new, "new");
            }
            other => panic!("expected Modified, got {:?}", other),
        }
    }

    #[test]
    fn custom_equality() {
        let old = map(&[("offset", "0x10")]);
        let new = map(&[("offset", "0X10")]);
        assert_eq!(diff_maps(&old, &new).modifications(), 1);

        let diff = diff_maps_by(&old, &new, |a, b| a.eq_ignore_ascii_case(b));
        assert!(diff.is_empty());
    }
}
