use std::sync::{Arc, Mutex};

use super::fat_node::FatNode;

/// One version of a [`PersistentList`](super::PersistentList)'s state:
/// size plus the front/back fat-node pointers and the version-chain
/// links that make undo/redo possible.
///
/// `parent` and `child` are a strong-reference pair wired the same way
/// as the vector's `VersionNode` (`new.parent = Some(base)`,
/// `base.child = Some(new)`), so it carries the same reference-cycle
/// hazard and needs the same iterative `Drop`.
pub(crate) struct ListRoot<T> {
    pub version: u64,
    pub size: usize,
    pub front: Option<Arc<FatNode<T>>>,
    pub back: Option<Arc<FatNode<T>>>,
    parent: Option<Arc<ListRoot<T>>>,
    child: Mutex<Option<Arc<ListRoot<T>>>>,
}

impl<T> ListRoot<T> {
    pub(crate) fn empty(version: u64) -> Arc<Self> {
        Arc::new(ListRoot {
            version,
            size: 0,
            front: None,
            back: None,
            parent: None,
            child: Mutex::new(None),
        })
    }

    /// Builds the root for a new mutation on top of `base`, overwriting
    /// `base`'s child (a fresh mutation supersedes any pending redo).
    pub(crate) fn new_mutation(
        base: &Arc<ListRoot<T>>,
        version: u64,
        size: usize,
        front: Option<Arc<FatNode<T>>>,
        back: Option<Arc<FatNode<T>>>,
    ) -> Arc<Self> {
        let node = Arc::new(ListRoot {
            version,
            size,
            front,
            back,
            parent: Some(base.clone()),
            child: Mutex::new(None),
        });
        *base.child.lock().unwrap() = Some(node.clone());
        node
    }

    /// A scratch root carrying `version` and `parent` so that
    /// [`FatNode::find`](super::fat_node::FatNode::find) can walk version
    /// ancestry while a mutation's final front/back pointers are still
    /// being computed. Never linked into any parent's `child` slot.
    pub(crate) fn scratch(base: &Arc<ListRoot<T>>, version: u64) -> Arc<Self> {
        Arc::new(ListRoot {
            version,
            size: base.size,
            front: base.front.clone(),
            back: base.back.clone(),
            parent: Some(base.clone()),
            child: Mutex::new(None),
        })
    }

    pub(crate) fn parent(&self) -> Option<Arc<ListRoot<T>>> {
        self.parent.clone()
    }

    pub(crate) fn can_undo(&self) -> bool {
        self.parent.is_some()
    }

    pub(crate) fn can_redo(&self) -> bool {
        self.child.lock().unwrap().is_some()
    }

    pub(crate) fn undo(self: &Arc<Self>) -> Option<Arc<Self>> {
        let parent = self.parent.clone()?;
        Some(Arc::new(ListRoot {
            version: parent.version,
            size: parent.size,
            front: parent.front.clone(),
            back: parent.back.clone(),
            parent: parent.parent.clone(),
            child: Mutex::new(Some(self.clone())),
        }))
    }

    pub(crate) fn redo(self: &Arc<Self>) -> Option<Arc<Self>> {
        self.child.lock().unwrap().clone()
    }
}

/// Same iterative-drop discipline as the vector's version-tree node:
/// `parent` and `child` form a reference cycle on every mutation, and a
/// long straight-line undo history must not be freed by deep recursion.
impl<T> Drop for ListRoot<T> {
    fn drop(&mut self) {
        let mut stack: Vec<Arc<ListRoot<T>>> = Vec::new();
        if let Some(p) = self.parent.take() {
            stack.push(p);
        }
        if let Ok(mut guard) = self.child.lock() {
            if let Some(c) = guard.take() {
                stack.push(c);
            }
        }
        while let Some(arc) = stack.pop() {
            if let Ok(mut node) = Arc::try_unwrap(arc) {
                if let Some(p) = node.parent.take() {
                    stack.push(p);
                }
                if let Ok(guard) = node.child.get_mut() {
                    if let Some(c) = guard.take() {
                        stack.push(c);
                    }
                }
            }
        }
    }
}
