//! A persistent hash map built on two layers of
//! [`PersistentVector`](crate::vector::PersistentVector): an outer bucket
//! table and, per bucket, a chain of colliding entries. Undo/redo
//! delegate entirely to the outer vector's own version tree.

mod iter;

use std::collections::hash_map::RandomState;
use std::hash::{BuildHasher, Hash, Hasher};

pub use iter::Iter;

use crate::error::ConfluentError;
use crate::vector::PersistentVector;

const DEFAULT_CAPACITY: usize = 16;

/// A cursor into the bucket table returned by [`PersistentMap::find`].
///
/// Unlike [`PersistentMap::get`], which hands back a reference, `Found`
/// is a plain copyable position — it can outlive the lookup that
/// produced it and be resolved later via
/// [`PersistentMap::entry_at`]. Equality matches the original
/// iterator's: it compares only the bucket (outer) position, since every
/// miss collapses to the same "nothing here" shape regardless of how far
/// the bucket scan got before giving up.
#[derive(Debug, Clone, Copy)]
pub struct Found {
    bucket: usize,
    slot: usize,
}

impl PartialEq for Found {
    fn eq(&self, other: &Self) -> bool {
        self.bucket == other.bucket
    }
}

impl Eq for Found {}

/// A persistent hash map with undo/redo, generic over the hasher the
/// same way [`std::collections::HashMap`] is — hashing is a caller
/// concern, not something this container dictates.
pub struct PersistentMap<K: Clone, V: Clone, S = RandomState> {
    outer: PersistentVector<PersistentVector<(K, V)>>,
    size: usize,
    hash_builder: S,
}

impl<K: Clone, V: Clone, S: Clone> Clone for PersistentMap<K, V, S> {
    fn clone(&self) -> Self {
        PersistentMap {
            outer: self.outer.clone(),
            size: self.size,
            hash_builder: self.hash_builder.clone(),
        }
    }
}

impl<K: Eq + Hash + Clone, V: Clone> Default for PersistentMap<K, V, RandomState> {
    fn default() -> Self {
        Self::with_capacity_and_hasher(DEFAULT_CAPACITY, RandomState::default())
    }
}

impl<K: Eq + Hash + Clone, V: Clone> PersistentMap<K, V, RandomState> {
    pub fn with_capacity(capacity: usize) -> Self {
        Self::with_capacity_and_hasher(capacity, RandomState::default())
    }
}

impl<K: Eq + Hash + Clone, V: Clone, S: BuildHasher + Clone> PersistentMap<K, V, S> {
    pub fn with_capacity_and_hasher(capacity: usize, hash_builder: S) -> Self {
        let capacity = capacity.max(1);
        PersistentMap {
            outer: PersistentVector::with_count_value(capacity, PersistentVector::default()),
            size: 0,
            hash_builder,
        }
    }

    pub fn len(&self) -> usize {
        self.size
    }

    pub fn is_empty(&self) -> bool {
        self.size == 0
    }

    /// Number of buckets currently allocated. Grows, via doubling
    /// rehash, whenever `len()` would otherwise exceed half of this.
    pub fn capacity(&self) -> usize {
        self.outer.len()
    }

    fn bucket_index_for(&self, key: &K, capacity: usize) -> usize {
        let mut hasher = self.hash_builder.build_hasher();
        key.hash(&mut hasher);
        (hasher.finish() as usize) % capacity
    }

    fn position_in_bucket(bucket: &PersistentVector<(K, V)>, key: &K) -> Option<usize> {
        (0..bucket.len()).find(|&i| &bucket.at(i).unwrap().0 == key)
    }

    pub fn get(&self, key: &K) -> Option<&V> {
        let idx = self.bucket_index_for(key, self.capacity());
        let bucket = self.outer.at(idx).ok()?;
        let pos = Self::position_in_bucket(bucket, key)?;
        Some(&bucket.at(pos).unwrap().1)
    }

    /// Keyed lookup has no natural `index`/`length` pair, so a miss is
    /// reported as `OutOfRange { index: 0, length: 0 }` — the map has one
    /// error shape, matching the vector and list, rather than a
    /// key-shaped variant of its own.
    pub fn at(&self, key: &K) -> Result<&V, ConfluentError> {
        self.get(key).ok_or(ConfluentError::OutOfRange {
            index: 0,
            length: 0,
        })
    }

    pub fn contains(&self, key: &K) -> bool {
        self.get(key).is_some()
    }

    /// Locates `key` without borrowing, returning a cursor rather than a
    /// value; `None` on miss. Resolve it back to the entry with
    /// [`entry_at`](Self::entry_at).
    pub fn find(&self, key: &K) -> Option<Found> {
        let idx = self.bucket_index_for(key, self.capacity());
        let bucket = self.outer.at(idx).ok()?;
        let slot = Self::position_in_bucket(bucket, key)?;
        Some(Found { bucket: idx, slot })
    }

    /// Resolves a [`Found`] cursor back to the `(key, value)` pair it
    /// located.
    ///
    /// # Panics
    /// Panics if `found` was not produced by a prior call to
    /// [`find`](Self::find) on this same map.
    pub fn entry_at(&self, found: Found) -> &(K, V) {
        self.outer
            .at(found.bucket)
            .expect("Found cursor references a bucket still within range")
            .at(found.slot)
            .expect("Found cursor references a slot still within range")
    }

    pub fn iter(&self) -> Iter<'_, K, V, S> {
        Iter::new(self)
    }

    /// Returns a new map with `key` bound to `value`, rehashing to
    /// double capacity first if this insertion would push the load
    /// factor above one half.
    pub fn set(&self, key: K, value: V) -> Self {
        let idx = self.bucket_index_for(&key, self.capacity());
        let bucket = self.outer.at(idx).expect("bucket index in range").clone();

        if let Some(pos) = Self::position_in_bucket(&bucket, &key) {
            let new_bucket = bucket.set(pos, (key, value)).expect("position in range");
            let new_outer = self.outer.set(idx, new_bucket).expect("index in range");
            return PersistentMap {
                outer: new_outer,
                size: self.size,
                hash_builder: self.hash_builder.clone(),
            };
        }

        let new_size = self.size + 1;
        if new_size > self.capacity() / 2 {
            self.rehashed_with(key, value, new_size)
        } else {
            let new_bucket = bucket.push_back((key, value));
            let new_outer = self.outer.set(idx, new_bucket).expect("index in range");
            PersistentMap {
                outer: new_outer,
                size: new_size,
                hash_builder: self.hash_builder.clone(),
            }
        }
    }

    fn rehashed_with(&self, key: K, value: V, new_size: usize) -> Self {
        let new_capacity = self.capacity() * 2;
        let mut new_outer =
            PersistentVector::with_count_value(new_capacity, PersistentVector::default());
        for i in 0..self.outer.len() {
            let bucket = self.outer.at(i).expect("index in range");
            for j in 0..bucket.len() {
                let (k, v) = bucket.at(j).expect("index in range").clone();
                new_outer = Self::insert_fresh(new_outer, &self.hash_builder, new_capacity, k, v);
            }
        }
        new_outer = Self::insert_fresh(new_outer, &self.hash_builder, new_capacity, key, value);
        PersistentMap {
            outer: new_outer,
            size: new_size,
            hash_builder: self.hash_builder.clone(),
        }
    }

    /// Inserts a key known not to already be present, used only while
    /// rebuilding a freshly doubled bucket table during rehash.
    fn insert_fresh(
        outer: PersistentVector<PersistentVector<(K, V)>>,
        hash_builder: &S,
        capacity: usize,
        key: K,
        value: V,
    ) -> PersistentVector<PersistentVector<(K, V)>> {
        let mut hasher = hash_builder.build_hasher();
        key.hash(&mut hasher);
        let idx = (hasher.finish() as usize) % capacity;
        let bucket = outer.at(idx).expect("index in range").push_back((key, value));
        outer.set(idx, bucket).expect("index in range")
    }

    /// Removes `key`. Returns `ConfluentError::OutOfRange` if absent.
    pub fn erase(&self, key: &K) -> Result<Self, ConfluentError> {
        let idx = self.bucket_index_for(key, self.capacity());
        let bucket = self.outer.at(idx).expect("bucket index in range");
        let pos = Self::position_in_bucket(bucket, key).ok_or(ConfluentError::OutOfRange {
            index: 0,
            length: 0,
        })?;
        let remaining: Vec<(K, V)> = bucket
            .iter()
            .enumerate()
            .filter(|(i, _)| *i != pos)
            .map(|(_, kv)| kv.clone())
            .collect();
        let new_bucket = PersistentVector::from_iter(remaining);
        let new_outer = self.outer.set(idx, new_bucket).expect("index in range");
        Ok(PersistentMap {
            outer: new_outer,
            size: self.size - 1,
            hash_builder: self.hash_builder.clone(),
        })
    }

    /// Empties every bucket while keeping the current capacity.
    pub fn clear(&self) -> Self {
        let empty_buckets = (0..self.outer.len()).map(|_| PersistentVector::default());
        let new_outer = self.outer.reset(empty_buckets);
        PersistentMap {
            outer: new_outer,
            size: 0,
            hash_builder: self.hash_builder.clone(),
        }
    }

    pub fn can_undo(&self) -> bool {
        self.outer.can_undo()
    }

    pub fn can_redo(&self) -> bool {
        self.outer.can_redo()
    }

    pub fn undo(&self) -> Self {
        let outer = self.outer.undo();
        let size = Self::recompute_size(&outer);
        PersistentMap {
            outer,
            size,
            hash_builder: self.hash_builder.clone(),
        }
    }

    pub fn redo(&self) -> Self {
        let outer = self.outer.redo();
        let size = Self::recompute_size(&outer);
        PersistentMap {
            outer,
            size,
            hash_builder: self.hash_builder.clone(),
        }
    }

    fn recompute_size(outer: &PersistentVector<PersistentVector<(K, V)>>) -> usize {
        (0..outer.len())
            .map(|i| outer.at(i).expect("index in range").len())
            .sum()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn set_then_get_round_trips() {
        let m = PersistentMap::default();
        let m = m.set("a", 1);
        let m = m.set("b", 2);
        assert_eq!(m.get(&"a"), Some(&1));
        assert_eq!(m.get(&"b"), Some(&2));
        assert_eq!(m.get(&"missing"), None);
    }

    #[test]
    fn overwriting_a_key_does_not_change_size() {
        let m = PersistentMap::default().set("a", 1);
        let m2 = m.set("a", 2);
        assert_eq!(m2.len(), 1);
        assert_eq!(m2.get(&"a"), Some(&2));
    }

    #[test]
    fn rehash_preserves_all_keys() {
        let m = PersistentMap::with_capacity(16);
        let mut m = m;
        for i in 0..9u32 {
            m = m.set(i, i * 10);
        }
        assert_eq!(m.len(), 9);
        assert!(m.capacity() > 16);
        for i in 0..9u32 {
            assert_eq!(m.get(&i), Some(&(i * 10)));
        }
    }

    #[test]
    fn erase_removes_key_and_is_idempotent_error() {
        let m = PersistentMap::default().set("a", 1).set("b", 2);
        let m2 = m.erase(&"a").unwrap();
        assert!(!m2.contains(&"a"));
        assert!(m2.contains(&"b"));
        assert!(m2.erase(&"a").is_err());
        // Original is untouched.
        assert!(m.contains(&"a"));
    }

    #[test]
    fn undo_redo_recomputes_size_from_buckets() {
        let m0 = PersistentMap::default();
        let m1 = m0.set(1, "one");
        let m2 = m1.set(2, "two");
        let back = m2.undo();
        assert_eq!(back.len(), 1);
        assert!(back.contains(&1));
        assert!(!back.contains(&2));
        let redone = back.redo();
        assert_eq!(redone.len(), 2);
    }

    #[test]
    fn find_then_entry_at_round_trips() {
        let m = PersistentMap::default().set("a", 1).set("b", 2);
        let found = m.find(&"b").expect("b was inserted");
        assert_eq!(m.entry_at(found), &("b", 2));
        assert!(m.find(&"missing").is_none());
    }

    #[test]
    fn find_equality_compares_bucket_only() {
        let m = PersistentMap::with_capacity(16).set("a", 1).set("b", 2);
        let found_a = m.find(&"a").unwrap();
        let found_a_again = m.find(&"a").unwrap();
        assert_eq!(found_a, found_a_again);
    }

    #[test]
    fn clear_keeps_capacity_but_drops_entries() {
        let m = PersistentMap::with_capacity(32).set(1, 1).set(2, 2);
        let cleared = m.clear();
        assert_eq!(cleared.len(), 0);
        assert_eq!(cleared.capacity(), 32);
    }
}
