//! Map semantics layered on top of [`Tree`].
//!
//! When the stored element is a key/value pair ordered by its key alone (see [`KeyValue`] and
//! [`MapElement`]), the tree can be used as an ordered map: lookups and writes go through the key
//! and the tree holds at most one element per key.
//!
//! # Examples
//!
//! ```
//! use avl::Map;
//!
//! let mut map: Map<&str, i32> = Map::new();
//!
//! // Writing a missing key inserts it.
//! assert_eq!(map.set("nine", Some(9)), None);
//! assert_eq!(map.get(&"nine"), Some(&9));
//!
//! // Writing an existing key overwrites the value in place.
//! assert_eq!(map.set("nine", Some(10)), Some(9));
//! assert_eq!(map.get(&"nine"), Some(&10));
//! assert_eq!(map.len(), 1);
//!
//! // Writing nothing removes the key.
//! assert_eq!(map.set("nine", None), Some(10));
//! assert_eq!(map.get(&"nine"), None);
//! assert!(map.is_empty());
//! ```
//!
//! Inserting elements directly with [`Tree::insert`] bypasses the key check, so it can store two
//! elements with the same key. The map methods then see whichever one the search reaches first.

use std::cmp::Ordering;
use std::fmt;
use std::mem;

use crate::Tree;

/// An element made of a key and a value, ordered by the key.
///
/// Implementors should make `Ord` (and `PartialEq`) compare `key()` only, as [`MapElement`] does.
pub trait KeyValue {
    /// What the element is looked up and ordered by.
    type Key: Ord;
    /// What the element carries.
    type Value;

    /// Pairs `key` with `value`.
    fn new(key: Self::Key, value: Self::Value) -> Self;

    /// The key this element is ordered by.
    fn key(&self) -> &Self::Key;

    /// The value paired with the key.
    fn value(&self) -> &Self::Value;

    /// The value paired with the key, mutably. The key stays fixed.
    fn value_mut(&mut self) -> &mut Self::Value;

    /// Gives up the element, keeping only its value.
    fn into_value(self) -> Self::Value;
}

/// A key paired with a value, compared and ordered by the key alone.
///
/// ```
/// use avl::MapElement;
///
/// assert_eq!(MapElement::new(1, "one"), MapElement::new(1, "uno"));
/// assert!(MapElement::new(1, "z") < MapElement::new(2, "a"));
/// assert_eq!(MapElement::new(1, "one").to_string(), "1: one");
/// ```
#[derive(Clone, Debug)]
pub struct MapElement<K, V> {
    key: K,
    value: V,
}

impl<K, V> MapElement<K, V> {
    /// Pairs `key` with `value`.
    pub fn new(key: K, value: V) -> Self {
        Self { key, value }
    }
}

impl<K, V> KeyValue for MapElement<K, V>
where
    K: Ord,
{
    type Key = K;
    type Value = V;

    fn new(key: K, value: V) -> Self {
        Self { key, value }
    }

    fn key(&self) -> &K {
        &self.key
    }

    fn value(&self) -> &V {
        &self.value
    }

    fn value_mut(&mut self) -> &mut V {
        &mut self.value
    }

    fn into_value(self) -> V {
        self.value
    }
}

impl<K: PartialEq, V> PartialEq for MapElement<K, V> {
    fn eq(&self, other: &Self) -> bool {
        self.key == other.key
    }
}

impl<K: Eq, V> Eq for MapElement<K, V> {}

impl<K: Ord, V> PartialOrd for MapElement<K, V> {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl<K: Ord, V> Ord for MapElement<K, V> {
    fn cmp(&self, other: &Self) -> Ordering {
        self.key.cmp(&other.key)
    }
}

impl<K, V> fmt::Display for MapElement<K, V>
where
    K: fmt::Display,
    V: fmt::Display,
{
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}: {}", self.key, self.value)
    }
}

/// An ordered map: a [`Tree`] of [`MapElement`]s.
pub type Map<K, V> = Tree<MapElement<K, V>>;

impl<E> Tree<E>
where
    E: KeyValue + Ord,
{
    /// The value stored under `key`, if any.
    pub fn get(&self, key: &E::Key) -> Option<&E::Value> {
        self.find_by(|element| key.cmp(element.key()))
            .map(KeyValue::value)
    }

    /// The value stored under `key`, mutably. Changing it doesn't touch the tree's shape.
    ///
    /// # Examples
    ///
    /// ```
    /// use avl::Map;
    ///
    /// let mut map: Map<char, Vec<u8>> = Map::new();
    /// map.set('a', Some(vec![1]));
    ///
    /// if let Some(bytes) = map.get_mut(&'a') {
    ///     bytes.push(2);
    /// }
    /// assert_eq!(map.get(&'a'), Some(&vec![1, 2]));
    /// assert_eq!(map.get_mut(&'b'), None);
    /// ```
    pub fn get_mut(&mut self, key: &E::Key) -> Option<&mut E::Value> {
        self.find_by_mut(|element| key.cmp(element.key()))
            .map(KeyValue::value_mut)
    }

    /// Whether any element is stored under `key`.
    pub fn contains_key(&self, key: &E::Key) -> bool {
        self.find_by(|element| key.cmp(element.key())).is_some()
    }

    /// Writes `value` under `key` and returns the value it replaced.
    ///
    /// * `Some(value)` for a key already in the map overwrites its value in place.
    /// * `Some(value)` for a missing key inserts a new element.
    /// * `None` removes the key, if present.
    pub fn set(&mut self, key: E::Key, value: Option<E::Value>) -> Option<E::Value> {
        let Some(value) = value else {
            return self.remove_key(&key);
        };

        match self.get_mut(&key) {
            Some(existing) => Some(mem::replace(existing, value)),
            None => {
                self.insert(E::new(key, value));
                None
            }
        }
    }

    /// Removes the element stored under `key` and returns its value.
    pub fn remove_key(&mut self, key: &E::Key) -> Option<E::Value> {
        self.remove_by(|element| key.cmp(element.key()))
            .map(KeyValue::into_value)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn map_of(keys: &[&'static str]) -> Map<&'static str, usize> {
        let mut map = Map::new();
        for (i, key) in keys.iter().enumerate() {
            map.set(*key, Some(i));
        }
        map
    }

    #[test]
    fn string_keys_one_through_nine() {
        let mut map = map_of(&["1", "2", "3", "4", "5", "6", "7", "8", "9"]);
        assert_eq!(map.len(), 9);
        assert_eq!(map.validate(), Ok(()));

        assert!(!map.contains_key(&"11"));
        assert_eq!(map.get(&"9"), Some(&8));

        map.set("9", Some(10));
        assert_eq!(map.get(&"9"), Some(&10));
        assert_eq!(map.len(), 9);

        map.set("9", None);
        assert_eq!(map.get(&"9"), None);
        assert_eq!(map.len(), 8);

        map.set("9", Some(9));
        assert_eq!(map.get(&"9"), Some(&9));
        assert_eq!(map.len(), 9);
        assert_eq!(map.validate(), Ok(()));
    }

    #[test]
    fn removing_missing_key_is_a_no_op() {
        let mut map = map_of(&["a", "b"]);

        assert_eq!(map.set("c", None), None);
        assert_eq!(map.remove_key(&"c"), None);
        assert_eq!(map.len(), 2);

        let mut empty: Map<i32, i32> = Map::new();
        assert_eq!(empty.remove_key(&1), None);
        assert_eq!(empty.get(&1), None);
        assert_eq!(empty.len(), 0);
    }

    #[test]
    fn removing_two_child_node_keeps_values() {
        let mut map: Map<i32, String> = Map::new();
        for key in [5, 3, 8, 1, 4, 7, 9] {
            map.set(key, Some(key.to_string()));
        }

        assert_eq!(map.remove_key(&5), Some("5".to_string()));
        for key in [1, 3, 4, 7, 8, 9] {
            assert_eq!(map.get(&key), Some(&key.to_string()));
        }
        assert_eq!(map.validate(), Ok(()));
    }

    #[test]
    fn iterates_by_key() {
        let map = map_of(&["c", "a", "b"]);
        let keys: Vec<_> = map.iter().map(|element| *element.key()).collect();
        let values: Vec<_> = map.iter().map(|element| *element.value()).collect();

        assert_eq!(keys, ["a", "b", "c"]);
        assert_eq!(values, [1, 2, 0]);
    }

    #[test]
    fn raw_insert_can_duplicate_keys() {
        let mut map: Map<i32, &str> = Map::new();
        map.insert(MapElement::new(1, "first"));
        map.insert(MapElement::new(1, "second"));
        assert_eq!(map.len(), 2);

        assert!(map.set(1, None).is_some());
        assert!(map.contains_key(&1));
        assert!(map.set(1, None).is_some());
        assert!(!map.contains_key(&1));
        assert!(map.is_empty());
    }
}

#[cfg(test)]
mod quicktests {
    use std::collections::HashMap;

    use super::*;
    use crate::test::quick::Op;

    /// Applies a set of operations to a map and a hashmap.
    /// This way we can ensure that after a random smattering of writes
    /// and removes we have the same set of keys in the map.
    fn do_ops<K, V>(ops: &[Op<K, V>], map: &mut Map<K, V>, model: &mut HashMap<K, V>)
    where
        K: std::hash::Hash + Eq + Clone + Ord + std::fmt::Debug,
        V: std::fmt::Debug + PartialEq + Clone,
    {
        for op in ops {
            match op {
                Op::Insert(k, v) => {
                    assert_eq!(
                        map.set(k.clone(), Some(v.clone())),
                        model.insert(k.clone(), v.clone())
                    );
                }
                Op::Remove(k) => {
                    assert_eq!(map.set(k.clone(), None), model.remove(k));
                }
                Op::Get(k) => assert_eq!(map.get(k), model.get(k)),
                Op::Iter => {
                    let mut keys: Vec<_> = model.keys().cloned().collect();
                    keys.sort();
                    assert!(map.iter().map(KeyValue::key).eq(keys.iter()));
                }
            }
            assert_eq!(map.len(), model.len());
        }
    }

    quickcheck::quickcheck! {
        fn fuzz_multiple_operations_i8(ops: Vec<Op<i8, i8>>) -> bool {
            let mut map = Map::new();
            let mut model = HashMap::new();

            do_ops(&ops, &mut map, &mut model);
            map.validate().is_ok() && model.keys().all(|key| map.get(key) == model.get(key))
        }
    }
}
