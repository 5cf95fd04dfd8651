//! Container shapes the views understand.
//!
//! Design: two small traits over the standard collections
//! - `Sequence`: indexed, ordered storage (`Vec`, `VecDeque`, fixed arrays)
//! - `Mapping`: keyed storage, with sets as key-only mappings
//! - Method names avoid the inherent collection methods (`BTreeMap` already
//!   has a `remove_entry`), so calls on concrete collections pick the trait

use crate::variant::Value;
use std::collections::{BTreeMap, BTreeSet, HashMap, HashSet, VecDeque};
use std::hash::Hash;

/// Indexed container with a single element type.
pub trait Sequence: Value {
    type Item: Value;

    /// `false` for fixed-size containers.
    const DYNAMIC: bool;

    fn length(&self) -> usize;
    fn item(&self, index: usize) -> Option<&Self::Item>;
    fn item_mut(&mut self, index: usize) -> Option<&mut Self::Item>;

    /// Grow with default elements or truncate. Fixed containers accept only their own length.
    fn set_length(&mut self, len: usize) -> bool;
    fn insert_item(&mut self, index: usize, item: Self::Item) -> bool;
    fn remove_item(&mut self, index: usize) -> bool;
    fn clear_items(&mut self) -> bool;
}

impl<T: Value + Clone + Default> Sequence for Vec<T> {
    type Item = T;
    const DYNAMIC: bool = true;

    fn length(&self) -> usize {
        self.len()
    }

    fn item(&self, index: usize) -> Option<&T> {
        self.get(index)
    }

    fn item_mut(&mut self, index: usize) -> Option<&mut T> {
        self.get_mut(index)
    }

    fn set_length(&mut self, len: usize) -> bool {
        self.resize_with(len, T::default);
        true
    }

    fn insert_item(&mut self, index: usize, item: T) -> bool {
        if index > self.len() {
            return false;
        }
        self.insert(index, item);
        true
    }

    fn remove_item(&mut self, index: usize) -> bool {
        if index >= self.len() {
            return false;
        }
        self.remove(index);
        true
    }

    fn clear_items(&mut self) -> bool {
        self.clear();
        true
    }
}

impl<T: Value + Clone + Default> Sequence for VecDeque<T> {
    type Item = T;
    const DYNAMIC: bool = true;

    fn length(&self) -> usize {
        self.len()
    }

    fn item(&self, index: usize) -> Option<&T> {
        self.get(index)
    }

    fn item_mut(&mut self, index: usize) -> Option<&mut T> {
        self.get_mut(index)
    }

    fn set_length(&mut self, len: usize) -> bool {
        self.resize_with(len, T::default);
        true
    }

    fn insert_item(&mut self, index: usize, item: T) -> bool {
        if index > self.len() {
            return false;
        }
        self.insert(index, item);
        true
    }

    fn remove_item(&mut self, index: usize) -> bool {
        self.remove(index).is_some()
    }

    fn clear_items(&mut self) -> bool {
        self.clear();
        true
    }
}

impl<T: Value + Clone, const N: usize> Sequence for [T; N] {
    type Item = T;
    const DYNAMIC: bool = false;

    fn length(&self) -> usize {
        N
    }

    fn item(&self, index: usize) -> Option<&T> {
        self.get(index)
    }

    fn item_mut(&mut self, index: usize) -> Option<&mut T> {
        self.get_mut(index)
    }

    fn set_length(&mut self, len: usize) -> bool {
        len == N
    }

    fn insert_item(&mut self, _index: usize, _item: T) -> bool {
        false
    }

    fn remove_item(&mut self, _index: usize) -> bool {
        false
    }

    fn clear_items(&mut self) -> bool {
        false
    }
}

/// Keyed container. Sets are key-only and use `()` as their item type.
pub trait Mapping: Value {
    type Key: Value;
    type Item: Value;

    const KEY_ONLY: bool;

    fn length(&self) -> usize;

    /// Entries in the container's native order. Key-only entries carry no item.
    fn entries(&self) -> Box<dyn Iterator<Item = (&Self::Key, Option<&Self::Item>)> + '_>;
    fn find_entry(&self, key: &Self::Key) -> Option<(&Self::Key, Option<&Self::Item>)>;

    /// Insert without replacing; `false` when the key is already present or
    /// a keyed container gets no item.
    fn insert_entry(&mut self, key: Self::Key, item: Option<Self::Item>) -> bool;

    /// Number of entries removed.
    fn erase_entry(&mut self, key: &Self::Key) -> usize;
    fn clear_entries(&mut self);
}

impl<K, V> Mapping for HashMap<K, V>
where
    K: Value + Clone + Eq + Hash,
    V: Value + Clone,
{
    type Key = K;
    type Item = V;
    const KEY_ONLY: bool = false;

    fn length(&self) -> usize {
        self.len()
    }

    fn entries(&self) -> Box<dyn Iterator<Item = (&K, Option<&V>)> + '_> {
        Box::new(self.iter().map(|(k, v)| (k, Some(v))))
    }

    fn find_entry(&self, key: &K) -> Option<(&K, Option<&V>)> {
        self.get_key_value(key).map(|(k, v)| (k, Some(v)))
    }

    fn insert_entry(&mut self, key: K, item: Option<V>) -> bool {
        match item {
            Some(item) if !self.contains_key(&key) => {
                self.insert(key, item);
                true
            }
            _ => false,
        }
    }

    fn erase_entry(&mut self, key: &K) -> usize {
        usize::from(self.remove(key).is_some())
    }

    fn clear_entries(&mut self) {
        self.clear();
    }
}

impl<K, V> Mapping for BTreeMap<K, V>
where
    K: Value + Clone + Ord,
    V: Value + Clone,
{
    type Key = K;
    type Item = V;
    const KEY_ONLY: bool = false;

    fn length(&self) -> usize {
        self.len()
    }

    fn entries(&self) -> Box<dyn Iterator<Item = (&K, Option<&V>)> + '_> {
        Box::new(self.iter().map(|(k, v)| (k, Some(v))))
    }

    fn find_entry(&self, key: &K) -> Option<(&K, Option<&V>)> {
        self.get_key_value(key).map(|(k, v)| (k, Some(v)))
    }

    fn insert_entry(&mut self, key: K, item: Option<V>) -> bool {
        match item {
            Some(item) if !self.contains_key(&key) => {
                self.insert(key, item);
                true
            }
            _ => false,
        }
    }

    fn erase_entry(&mut self, key: &K) -> usize {
        usize::from(self.remove(key).is_some())
    }

    fn clear_entries(&mut self) {
        self.clear();
    }
}

impl<K> Mapping for HashSet<K>
where
    K: Value + Clone + Eq + Hash,
{
    type Key = K;
    type Item = ();
    const KEY_ONLY: bool = true;

    fn length(&self) -> usize {
        self.len()
    }

    fn entries(&self) -> Box<dyn Iterator<Item = (&K, Option<&()>)> + '_> {
        Box::new(self.iter().map(|k| (k, None)))
    }

    fn find_entry(&self, key: &K) -> Option<(&K, Option<&()>)> {
        self.get(key).map(|k| (k, None))
    }

    fn insert_entry(&mut self, key: K, _item: Option<()>) -> bool {
        self.insert(key)
    }

    fn erase_entry(&mut self, key: &K) -> usize {
        usize::from(self.remove(key))
    }

    fn clear_entries(&mut self) {
        self.clear();
    }
}

impl<K> Mapping for BTreeSet<K>
where
    K: Value + Clone + Ord,
{
    type Key = K;
    type Item = ();
    const KEY_ONLY: bool = true;

    fn length(&self) -> usize {
        self.len()
    }

    fn entries(&self) -> Box<dyn Iterator<Item = (&K, Option<&()>)> + '_> {
        Box::new(self.iter().map(|k| (k, None)))
    }

    fn find_entry(&self, key: &K) -> Option<(&K, Option<&()>)> {
        self.get(key).map(|k| (k, None))
    }

    fn insert_entry(&mut self, key: K, _item: Option<()>) -> bool {
        self.insert(key)
    }

    fn erase_entry(&mut self, key: &K) -> usize {
        usize::from(self.remove(key))
    }

    fn clear_entries(&mut self) {
        self.clear();
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_vec_resize_fills_default() {
        let mut v: Vec<i32> = Vec::new();
        assert!(v.set_length(3));
        assert_eq!(v, vec![0, 0, 0]);
        assert!(v.set_length(1));
        assert_eq!(v.length(), 1);
    }

    #[test]
    fn test_array_is_fixed() {
        let mut a = [1u8, 2, 3];
        assert!(!<[u8; 3] as Sequence>::DYNAMIC);
        assert!(a.set_length(3));
        assert!(!a.set_length(4));
        assert!(!a.insert_item(0, 9));
        assert_eq!(a.item(2), Some(&3));
    }

    #[test]
    fn test_deque_insert_bounds() {
        let mut d: VecDeque<u8> = VecDeque::new();
        assert!(d.insert_item(0, 1));
        assert!(!d.insert_item(5, 2));
        assert!(d.remove_item(0));
        assert!(!d.remove_item(0));
    }

    #[test]
    fn test_map_insert_does_not_replace() {
        let mut m: BTreeMap<String, i32> = BTreeMap::new();
        assert!(m.insert_entry("a".into(), Some(1)));
        assert!(!m.insert_entry("a".into(), Some(2)));
        assert!(!m.insert_entry("b".into(), None));
        assert_eq!(m.find_entry(&"a".to_string()).and_then(|(_, v)| v.copied()), Some(1));
        assert_eq!(m.erase_entry(&"a".to_string()), 1);
        assert_eq!(m.erase_entry(&"a".to_string()), 0);
    }

    #[test]
    fn test_set_is_key_only() {
        let mut s: HashSet<i64> = HashSet::new();
        assert!(<HashSet<i64> as Mapping>::KEY_ONLY);
        assert!(s.insert_entry(4, None));
        assert!(!s.insert_entry(4, None));
        assert!(s.entries().all(|(_, v)| v.is_none()));
    }
}
