use std::sync::{Arc, Mutex};

use super::root::TrieRoot;

/// One version of a [`PersistentVector`](super::PersistentVector)'s
/// history: the trie snapshot plus the links that make undo/redo
/// possible.
///
/// `parent` and `redo_child` are both strong references, by design:
/// every mutation wires `new.parent = Some(base)` and
/// `base.redo_child = Some(new)`, so the pair forms a genuine reference
/// cycle. That is what lets `undo().redo()` get back the exact node it
/// started from without recomputing anything, and it is exactly why
/// `Drop` below cannot be the derived one.
pub(crate) struct VersionNode<T> {
    pub root: TrieRoot<T>,
    pub version: u64,
    parent: Option<Arc<VersionNode<T>>>,
    redo_child: Mutex<Option<Arc<VersionNode<T>>>>,
    /// Set only on a node created by `undo`: the real node this one is a
    /// cursor for. Used to decide where a subsequent mutation should
    /// root itself (see `mutation_base`).
    original: Mutex<Option<Arc<VersionNode<T>>>>,
}

impl<T> VersionNode<T> {
    /// Builds the node for a genuine new mutation rooted at `base`
    /// (`None` for the very first version). Overwrites `base`'s
    /// redo-child, since a fresh mutation supersedes whatever redo
    /// branch existed before.
    pub(crate) fn new_mutation(
        base: Option<Arc<VersionNode<T>>>,
        root: TrieRoot<T>,
        version: u64,
    ) -> Arc<Self> {
        let node = Arc::new(VersionNode {
            root,
            version,
            parent: base.clone(),
            redo_child: Mutex::new(None),
            original: Mutex::new(None),
        });
        if let Some(base) = base {
            *base.redo_child.lock().unwrap() = Some(node.clone());
        }
        node
    }

    /// The node a subsequent mutation from `current` should treat as its
    /// parent: `current` itself, unless `current` is an undo cursor
    /// (has `original` set) that still has a redo branch pending, in
    /// which case new work roots at the real node being mirrored so
    /// that `redo()` afterwards reflects the new branch rather than the
    /// stale one.
    pub(crate) fn mutation_base(current: &Arc<VersionNode<T>>) -> Arc<VersionNode<T>> {
        let has_redo = current.redo_child.lock().unwrap().is_some();
        if has_redo {
            if let Some(original) = current.original.lock().unwrap().clone() {
                return original;
            }
        }
        current.clone()
    }

    pub(crate) fn can_undo(&self) -> bool {
        self.parent.is_some()
    }

    pub(crate) fn can_redo(&self) -> bool {
        self.redo_child.lock().unwrap().is_some()
    }

    pub(crate) fn undo(self: &Arc<Self>) -> Option<Arc<Self>> {
        let parent = self.parent.clone()?;
        Some(Arc::new(VersionNode {
            root: parent.root.clone(),
            version: parent.version,
            parent: parent.parent.clone(),
            redo_child: Mutex::new(Some(self.clone())),
            original: Mutex::new(Some(parent)),
        }))
    }

    pub(crate) fn redo(self: &Arc<Self>) -> Option<Arc<Self>> {
        self.redo_child.lock().unwrap().clone()
    }
}

/// Iteratively flattens the `parent` / `redo_child` / `original` edges
/// reachable from a node about to be freed, instead of letting the
/// compiler-generated field drops recurse through them.
///
/// Two hazards motivate this:
/// - `parent` and `redo_child` form a genuine reference cycle on every
///   mutation (see the struct docs); without manual breaking, a node
///   whose only remaining link is that cycle would never reach a strong
///   count of zero.
/// - Even acyclic chains (a long straight-line undo history with no
///   external holders) would otherwise drop recursively one frame per
///   version, which overflows the stack on deep histories.
///
/// The algorithm is a standard iterative-drop worklist: detach a node's
/// outgoing strong edges, and if `Arc::try_unwrap` shows we were the
/// last owner, push its own edges onto the same worklist instead of
/// letting them drop as struct fields.
impl<T> Drop for VersionNode<T> {
    fn drop(&mut self) {
        let mut stack: Vec<Arc<VersionNode<T>>> = Vec::new();

        if let Some(p) = self.parent.take() {
            stack.push(p);
        }
        if let Ok(mut guard) = self.redo_child.lock() {
            if let Some(c) = guard.take() {
                stack.push(c);
            }
        }
        if let Ok(mut guard) = self.original.lock() {
            if let Some(o) = guard.take() {
                stack.push(o);
            }
        }

        while let Some(arc) = stack.pop() {
            if let Ok(mut node) = Arc::try_unwrap(arc) {
                if let Some(p) = node.parent.take() {
                    stack.push(p);
                }
                if let Ok(guard) = node.redo_child.get_mut() {
                    if let Some(c) = guard.take() {
                        stack.push(c);
                    }
                }
                if let Ok(guard) = node.original.get_mut() {
                    if let Some(o) = guard.take() {
                        stack.push(o);
                    }
                }
                // `node`'s own Drop::drop runs when it falls out of scope
                // here, but its edges are already empty, so that call is
                // O(1) and does not recurse further.
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::version::VersionContext;

    fn node(base: Option<Arc<VersionNode<i32>>>, ctx: &VersionContext) -> Arc<VersionNode<i32>> {
        let root = match &base {
            Some(b) => b.root.emplace_back(Arc::new(0)),
            None => TrieRoot::empty().emplace_back(Arc::new(0)),
        };
        VersionNode::new_mutation(base, root, ctx.next_version())
    }

    #[test]
    fn undo_then_redo_returns_identical_node() {
        let ctx = VersionContext::new();
        let a = node(None, &ctx);
        let b = node(Some(a.clone()), &ctx);
        let undone = b.undo().unwrap();
        assert!(Arc::ptr_eq(&undone.root.child.as_ref().unwrap(), a.root.child.as_ref().unwrap()));
        let redone = undone.redo().unwrap();
        assert!(Arc::ptr_eq(&redone, &b));
    }

    #[test]
    fn mutation_after_undo_roots_at_original() {
        let ctx = VersionContext::new();
        let a = node(None, &ctx);
        let b = node(Some(a.clone()), &ctx);
        let cursor = b.undo().unwrap();
        let base = VersionNode::mutation_base(&cursor);
        assert!(Arc::ptr_eq(&base, &a));
        let c = node(Some(base), &ctx);
        // `a`'s redo child should now be `c`, not `b`.
        let a_redo = a.redo().unwrap();
        assert!(Arc::ptr_eq(&a_redo, &c));
    }

    #[test]
    fn deep_chain_drops_without_overflow() {
        let ctx = VersionContext::new();
        let mut cur = node(None, &ctx);
        for _ in 0..50_000 {
            cur = node(Some(cur), &ctx);
        }
        drop(cur);
    }
}
