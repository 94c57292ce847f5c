use std::sync::{Arc, Mutex};

use super::root::ListRoot;
use crate::error::ConfluentError;

/// Maximum number of physical versions a single fat node may hold before
/// it must split. Two, per the Driscoll-Sarnak-Sleator-Tarjan
/// node-copying scheme this list is built on.
const MAX_VERSIONS: usize = 2;

/// One physical version of a logical list position.
pub(crate) struct Entry<T> {
    pub version: u64,
    pub value: T,
    pub prev: Option<Arc<FatNode<T>>>,
    pub next: Option<Arc<FatNode<T>>>,
}

/// A logical list position: a bag of at most two physical [`Entry`]
/// versions, resolved against a [`ListRoot`]'s version ancestry.
pub(crate) struct FatNode<T> {
    entries: Mutex<Vec<Arc<Entry<T>>>>,
}

impl<T> FatNode<T> {
    pub(crate) fn singleton(entry: Entry<T>) -> Arc<Self> {
        Arc::new(FatNode {
            entries: Mutex::new(vec![Arc::new(entry)]),
        })
    }

    pub(crate) fn empty() -> Arc<Self> {
        Arc::new(FatNode {
            entries: Mutex::new(Vec::with_capacity(MAX_VERSIONS)),
        })
    }

    pub(crate) fn is_full(&self) -> bool {
        self.entries.lock().unwrap().len() >= MAX_VERSIONS
    }

    pub(crate) fn push(&self, entry: Entry<T>) {
        let mut guard = self.entries.lock().unwrap();
        debug_assert!(guard.len() < MAX_VERSIONS, "pushed into a full fat node");
        guard.push(Arc::new(entry));
    }

    /// Rewrites the `prev` pointer of the entry stamped with `version`,
    /// used only by [`PersistentList`](super::PersistentList)'s removal
    /// path to reconcile a right-hand split with the left-hand fat node
    /// it ultimately settled on.
    pub(crate) fn patch_prev_for_version(&self, version: u64, new_prev: Arc<FatNode<T>>)
    where
        T: Clone,
    {
        let mut guard = self.entries.lock().unwrap();
        if let Some(slot) = guard.iter_mut().find(|e| e.version == version) {
            *slot = Arc::new(Entry {
                version,
                value: slot.value.clone(),
                prev: Some(new_prev),
                next: slot.next.clone(),
            });
        }
    }

    /// Resolves this fat node against `root`'s version (or the nearest
    /// ancestor that has an entry here).
    pub(crate) fn find(
        self: &Arc<Self>,
        root: &Arc<ListRoot<T>>,
    ) -> Result<Arc<Entry<T>>, ConfluentError> {
        let mut cursor = Some(root.clone());
        while let Some(r) = cursor {
            let hit = {
                let guard = self.entries.lock().unwrap();
                guard.iter().find(|e| e.version == r.version).cloned()
            };
            if let Some(entry) = hit {
                return Ok(entry);
            }
            cursor = r.parent();
        }
        Err(ConfluentError::InvariantViolation(
            "fat node has no entry reachable from this version's ancestry".to_string(),
        ))
    }
}

impl<T: Clone> FatNode<T> {
    /// Produces the version of `fat` (resolved against `root`) whose
    /// `next` pointer is `new_next`, splitting and propagating leftward
    /// (patching `front` at the boundary) when `fat` is already full.
    pub(crate) fn update_next(
        fat: &Arc<FatNode<T>>,
        new_next: Option<Arc<FatNode<T>>>,
        root: &Arc<ListRoot<T>>,
        front: &mut Option<Arc<FatNode<T>>>,
    ) -> Result<Arc<FatNode<T>>, ConfluentError> {
        let found = fat.find(root)?;
        if !fat.is_full() {
            fat.push(Entry {
                version: root.version,
                value: found.value.clone(),
                prev: found.prev.clone(),
                next: new_next,
            });
            return Ok(fat.clone());
        }
        let replacement = FatNode::empty();
        let prev_final = match &found.prev {
            Some(p) => Some(FatNode::update_next(p, Some(replacement.clone()), root, front)?),
            None => {
                *front = Some(replacement.clone());
                None
            }
        };
        replacement.push(Entry {
            version: root.version,
            value: found.value.clone(),
            prev: prev_final,
            next: new_next,
        });
        Ok(replacement)
    }

    /// Symmetric to [`update_next`](Self::update_next), propagating
    /// rightward and patching `back` at the boundary.
    pub(crate) fn update_prev(
        fat: &Arc<FatNode<T>>,
        new_prev: Option<Arc<FatNode<T>>>,
        root: &Arc<ListRoot<T>>,
        back: &mut Option<Arc<FatNode<T>>>,
    ) -> Result<Arc<FatNode<T>>, ConfluentError> {
        let found = fat.find(root)?;
        if !fat.is_full() {
            fat.push(Entry {
                version: root.version,
                value: found.value.clone(),
                prev: new_prev,
                next: found.next.clone(),
            });
            return Ok(fat.clone());
        }
        let replacement = FatNode::empty();
        let next_final = match &found.next {
            Some(n) => Some(FatNode::update_prev(n, Some(replacement.clone()), root, back)?),
            None => {
                *back = Some(replacement.clone());
                None
            }
        };
        replacement.push(Entry {
            version: root.version,
            value: found.value.clone(),
            prev: new_prev,
            next: next_final,
        });
        Ok(replacement)
    }
}
