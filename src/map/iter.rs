use super::PersistentMap;
use std::collections::hash_map::RandomState;
use std::hash::BuildHasher;

/// Iterates `(key, value)` pairs across all buckets, skipping empty ones.
pub struct Iter<'a, K: Clone, V: Clone, S = RandomState> {
    map: &'a PersistentMap<K, V, S>,
    outer: usize,
    inner: usize,
}

impl<'a, K: Clone, V: Clone, S> Iter<'a, K, V, S> {
    pub(crate) fn new(map: &'a PersistentMap<K, V, S>) -> Self {
        Iter {
            map,
            outer: 0,
            inner: 0,
        }
    }
}

impl<'a, K: Clone, V: Clone, S: BuildHasher> Iterator for Iter<'a, K, V, S> {
    type Item = (K, V);

    fn next(&mut self) -> Option<Self::Item> {
        while self.outer < self.map.outer.len() {
            let bucket = self.map.outer.at(self.outer).expect("outer index in bounds");
            if self.inner < bucket.len() {
                let (k, v) = bucket.at(self.inner).expect("inner index in bounds").clone();
                self.inner += 1;
                return Some((k, v));
            }
            self.outer += 1;
            self.inner = 0;
        }
        None
    }
}
