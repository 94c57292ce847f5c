//! A persistent doubly linked list built on fat nodes (the
//! Driscoll-Sarnak-Sleator-Tarjan node-copying scheme), with a confluent
//! undo/redo history.

mod fat_node;
mod iter;
mod root;

use std::sync::Arc;

use fat_node::{Entry, FatNode};
pub use iter::Iter;
use root::ListRoot;

use crate::error::ConfluentError;
use crate::version::VersionContext;

/// A persistent doubly linked list with undo/redo.
///
/// Values are cloned into each physical node version they occupy (the
/// fat-node scheme copies values, not just pointers, when a position's
/// neighbors change), so `T: Clone` is required throughout.
pub struct PersistentList<T: Clone> {
    root: Arc<ListRoot<T>>,
    context: VersionContext,
}

impl<T: Clone> Clone for PersistentList<T> {
    fn clone(&self) -> Self {
        PersistentList {
            root: self.root.clone(),
            context: self.context.clone(),
        }
    }
}

impl<T: Clone> Default for PersistentList<T> {
    fn default() -> Self {
        let context = VersionContext::new();
        let root = ListRoot::empty(context.next_version());
        PersistentList { root, context }
    }
}

impl<T: Clone> PersistentList<T> {
    pub fn from_iter<I: IntoIterator<Item = T>>(iter: I) -> Self {
        let mut list = Self::default();
        for value in iter {
            list = list.push_back(value);
        }
        list
    }

    pub fn len(&self) -> usize {
        self.root.size
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn can_undo(&self) -> bool {
        self.root.can_undo()
    }

    pub fn can_redo(&self) -> bool {
        self.root.can_redo()
    }

    pub fn undo(&self) -> Self {
        match self.root.undo() {
            Some(root) => PersistentList {
                root,
                context: self.context.clone(),
            },
            None => self.clone(),
        }
    }

    pub fn redo(&self) -> Self {
        match self.root.redo() {
            Some(root) => PersistentList {
                root,
                context: self.context.clone(),
            },
            None => self.clone(),
        }
    }

    pub fn front(&self) -> Option<T> {
        self.node_at_front().map(|e| e.value.clone())
    }

    pub fn back(&self) -> Option<T> {
        self.node_at_back().map(|e| e.value.clone())
    }

    pub fn get(&self, index: usize) -> Result<T, ConfluentError> {
        self.entry_at(index).map(|e| e.value.clone())
    }

    pub fn iter(&self) -> Iter<'_, T> {
        Iter::new(self)
    }

    fn node_at_front(&self) -> Option<Arc<Entry<T>>> {
        let front = self.root.front.clone()?;
        front.find(&self.root).ok()
    }

    fn node_at_back(&self) -> Option<Arc<Entry<T>>> {
        let back = self.root.back.clone()?;
        back.find(&self.root).ok()
    }

    fn entry_at(&self, index: usize) -> Result<Arc<Entry<T>>, ConfluentError> {
        if index >= self.len() {
            return Err(ConfluentError::OutOfRange {
                index,
                length: self.len(),
            });
        }
        let mut current = self
            .node_at_front()
            .expect("non-empty list must have a resolvable front");
        for _ in 0..index {
            let next_fat = current.next.clone().expect("index within bounds implies a successor");
            current = next_fat.find(&self.root)?;
        }
        Ok(current)
    }

    /// Appends `value` at the tail.
    pub fn push_back(&self, value: T) -> Self {
        let version = self.context.next_version();
        if self.is_empty() {
            let fat = FatNode::singleton(Entry {
                version,
                value,
                prev: None,
                next: None,
            });
            let root = ListRoot::new_mutation(&self.root, version, 1, Some(fat.clone()), Some(fat));
            return PersistentList {
                root,
                context: self.context.clone(),
            };
        }

        let scratch = ListRoot::scratch(&self.root, version);
        let mut front = self.root.front.clone();
        let old_back = self.root.back.clone().expect("non-empty list has a back");

        let new_tail = FatNode::empty();
        let updated_back = FatNode::update_next(&old_back, Some(new_tail.clone()), &scratch, &mut front)
            .expect("internal fat-node lookup should always resolve");
        new_tail.push(Entry {
            version,
            value,
            prev: Some(updated_back),
            next: None,
        });

        let root = ListRoot::new_mutation(&self.root, version, self.len() + 1, front, Some(new_tail));
        PersistentList {
            root,
            context: self.context.clone(),
        }
    }

    /// Prepends `value` at the head.
    pub fn push_front(&self, value: T) -> Self {
        let version = self.context.next_version();
        if self.is_empty() {
            let fat = FatNode::singleton(Entry {
                version,
                value,
                prev: None,
                next: None,
            });
            let root = ListRoot::new_mutation(&self.root, version, 1, Some(fat.clone()), Some(fat));
            return PersistentList {
                root,
                context: self.context.clone(),
            };
        }

        let scratch = ListRoot::scratch(&self.root, version);
        let mut back = self.root.back.clone();
        let old_front = self.root.front.clone().expect("non-empty list has a front");

        let new_head = FatNode::empty();
        let updated_front = FatNode::update_prev(&old_front, Some(new_head.clone()), &scratch, &mut back)
            .expect("internal fat-node lookup should always resolve");
        new_head.push(Entry {
            version,
            value,
            prev: None,
            next: Some(updated_front),
        });

        let root = ListRoot::new_mutation(&self.root, version, self.len() + 1, Some(new_head), back);
        PersistentList {
            root,
            context: self.context.clone(),
        }
    }

    /// Removes and drops the last element.
    ///
    /// # Panics
    /// Panics if `self` is empty.
    pub fn pop_back(&self) -> Self {
        assert!(!self.is_empty(), "pop_back on an empty list");
        let target = self.root.back.clone().unwrap();
        self.remove_fat_node(&target)
    }

    /// Removes and drops the first element.
    ///
    /// # Panics
    /// Panics if `self` is empty.
    pub fn pop_front(&self) -> Self {
        assert!(!self.is_empty(), "pop_front on an empty list");
        let target = self.root.front.clone().unwrap();
        self.remove_fat_node(&target)
    }

    /// Inserts `value` so that it becomes element `index`, shifting the
    /// old element at `index` (and everything after it) back by one.
    pub fn insert(&self, index: usize, value: T) -> Result<Self, ConfluentError> {
        if index > self.len() {
            return Err(ConfluentError::OutOfRange {
                index,
                length: self.len(),
            });
        }
        if index == self.len() {
            return Ok(self.push_back(value));
        }
        if index == 0 {
            return Ok(self.push_front(value));
        }

        let version = self.context.next_version();
        let scratch = ListRoot::scratch(&self.root, version);
        let mut front = self.root.front.clone();
        let mut back = self.root.back.clone();

        let before = self.entry_at(index - 1)?;
        let before_fat = self.fat_node_for(index - 1)?;
        let after_fat = before.next.clone();

        let new_fat = FatNode::empty();
        let updated_before =
            FatNode::update_next(&before_fat, Some(new_fat.clone()), &scratch, &mut front)?;
        let updated_after = match &after_fat {
            Some(a) => Some(FatNode::update_prev(a, Some(new_fat.clone()), &scratch, &mut back)?),
            None => None,
        };
        new_fat.push(Entry {
            version,
            value,
            prev: Some(updated_before),
            next: updated_after,
        });

        let root = ListRoot::new_mutation(&self.root, version, self.len() + 1, front, back);
        Ok(PersistentList {
            root,
            context: self.context.clone(),
        })
    }

    /// Replaces the value at `index`.
    ///
    /// When the target fat node still has room for another version, the
    /// new value is pushed into it in place and both neighbors are left
    /// untouched. Only a full target node forces the fresh-fat-node split
    /// path, mirroring the original's `is_full()` fast path.
    pub fn set(&self, index: usize, value: T) -> Result<Self, ConfluentError> {
        let target_fat = self.fat_node_for(index)?;
        let target = target_fat.find(&self.root)?;
        let version = self.context.next_version();

        if !target_fat.is_full() {
            target_fat.push(Entry {
                version,
                value,
                prev: target.prev.clone(),
                next: target.next.clone(),
            });
            let root = ListRoot::new_mutation(
                &self.root,
                version,
                self.len(),
                self.root.front.clone(),
                self.root.back.clone(),
            );
            return Ok(PersistentList {
                root,
                context: self.context.clone(),
            });
        }

        let scratch = ListRoot::scratch(&self.root, version);
        let mut front = self.root.front.clone();
        let mut back = self.root.back.clone();

        let placeholder = FatNode::empty();
        let prev_final = match &target.prev {
            Some(p) => Some(FatNode::update_next(p, Some(placeholder.clone()), &scratch, &mut front)?),
            None => {
                front = Some(placeholder.clone());
                None
            }
        };
        let next_final = match &target.next {
            Some(n) => Some(FatNode::update_prev(n, Some(placeholder.clone()), &scratch, &mut back)?),
            None => {
                back = Some(placeholder.clone());
                None
            }
        };
        placeholder.push(Entry {
            version,
            value,
            prev: prev_final,
            next: next_final,
        });

        let root = ListRoot::new_mutation(&self.root, version, self.len(), front, back);
        Ok(PersistentList {
            root,
            context: self.context.clone(),
        })
    }

    fn fat_node_for(&self, index: usize) -> Result<Arc<FatNode<T>>, ConfluentError> {
        if index >= self.len() {
            return Err(ConfluentError::OutOfRange {
                index,
                length: self.len(),
            });
        }
        let mut fat = self.root.front.clone().expect("non-empty list has a front");
        for _ in 0..index {
            let entry = fat.find(&self.root)?;
            fat = entry.next.clone().expect("index within bounds implies a successor");
        }
        Ok(fat)
    }

    fn remove_fat_node(&self, target: &Arc<FatNode<T>>) -> Self {
        let entry = target
            .find(&self.root)
            .expect("target fat node must resolve against the current root");
        let version = self.context.next_version();
        let scratch = ListRoot::scratch(&self.root, version);

        let mut front = self.root.front.clone();
        let mut back = self.root.back.clone();

        match (&entry.prev, &entry.next) {
            (None, None) => {
                front = None;
                back = None;
            }
            (None, Some(next)) => {
                let updated_next = FatNode::update_prev(next, None, &scratch, &mut back)
                    .expect("fat-node lookup should resolve");
                front = Some(updated_next);
            }
            (Some(prev), None) => {
                let updated_prev = FatNode::update_next(prev, None, &scratch, &mut front)
                    .expect("fat-node lookup should resolve");
                back = Some(updated_prev);
            }
            (Some(prev), Some(next)) => {
                // `update_prev` runs first since it may itself cascade and
                // allocate a brand-new right-hand fat node; it's given a
                // placeholder standing in for the left side, which is
                // patched to the real thing once `update_next` resolves it.
                let placeholder = FatNode::empty();
                let updated_next = FatNode::update_prev(next, Some(placeholder), &scratch, &mut back)
                    .expect("fat-node lookup should resolve");
                let updated_prev = FatNode::update_next(
                    prev,
                    Some(updated_next.clone()),
                    &scratch,
                    &mut front,
                )
                .expect("fat-node lookup should resolve");
                updated_next.patch_prev_for_version(version, updated_prev);
            }
        }

        let root = ListRoot::new_mutation(&self.root, version, self.len() - 1, front, back);
        PersistentList {
            root,
            context: self.context.clone(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn push_back_and_front_round_trip() {
        let l0 = PersistentList::default();
        let l1 = l0.push_back(1);
        let l2 = l1.push_back(2);
        let l3 = l2.push_back(3);
        assert_eq!(l3.iter().collect::<Vec<_>>(), vec![1, 2, 3]);

        let back_popped = l3.pop_back();
        assert_eq!(back_popped.iter().collect::<Vec<_>>(), vec![1, 2]);
        assert_eq!(l3.iter().collect::<Vec<_>>(), vec![1, 2, 3]);
    }

    #[test]
    fn push_front_builds_reverse_order() {
        let l = PersistentList::from_iter([3, 2, 1]);
        let l = l.push_front(0);
        assert_eq!(l.iter().collect::<Vec<_>>(), vec![0, 3, 2, 1]);
    }

    #[test]
    fn insert_in_the_middle_preserves_old_version() {
        let old = PersistentList::from_iter(['a', 'b', 'c', 'd']);
        let new = old.insert(2, 'x').unwrap();
        assert_eq!(new.iter().collect::<Vec<_>>(), vec!['a', 'b', 'x', 'c', 'd']);
        assert_eq!(old.iter().collect::<Vec<_>>(), vec!['a', 'b', 'c', 'd']);
    }

    #[test]
    fn undo_redo_round_trip() {
        let l0 = PersistentList::default();
        let l1 = l0.push_back(1);
        let back = l1.undo();
        assert!(back.is_empty());
        let redone = back.redo();
        assert_eq!(redone.iter().collect::<Vec<_>>(), vec![1]);
    }

    #[test]
    fn set_replaces_value_at_index() {
        let l = PersistentList::from_iter([1, 2, 3]);
        let l2 = l.set(1, 20).unwrap();
        assert_eq!(l2.iter().collect::<Vec<_>>(), vec![1, 20, 3]);
        assert_eq!(l.iter().collect::<Vec<_>>(), vec![1, 2, 3]);
    }

    #[test]
    fn set_twice_on_same_index_splits_once_the_fat_node_is_full() {
        let l0 = PersistentList::from_iter([1, 2, 3]);
        // First set lands in the still-room-for-one fat node in place.
        let l1 = l0.set(1, 20).unwrap();
        // Second set finds that same fat node full and must split.
        let l2 = l1.set(1, 200).unwrap();
        assert_eq!(l2.iter().collect::<Vec<_>>(), vec![1, 200, 3]);
        assert_eq!(l1.iter().collect::<Vec<_>>(), vec![1, 20, 3]);
        assert_eq!(l0.iter().collect::<Vec<_>>(), vec![1, 2, 3]);
    }

    #[test]
    fn out_of_range_reports_error() {
        let l = PersistentList::<i32>::default();
        assert!(l.get(0).is_err());
        assert!(l.insert(1, 5).is_err());
    }

    #[test]
    fn many_pushes_build_a_long_chain_that_drops_without_overflow() {
        let mut l = PersistentList::default();
        for i in 0..20_000 {
            l = l.push_back(i);
        }
        assert_eq!(l.len(), 20_000);
        drop(l);
    }
}
