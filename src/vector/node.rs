use std::sync::Arc;

/// log2 of the trie's fanout. `FANOUT = 1 << FANOUT_BITS` children per
/// interior node, values per leaf.
pub(crate) const FANOUT_BITS: u32 = 5;
pub(crate) const FANOUT: usize = 1 << FANOUT_BITS;

/// A leaf or interior node of the wide trie backing `PersistentVector`.
///
/// A tagged enum rather than one struct carrying both a child array and a
/// value array: a node is always exactly one or the other, and the
/// fanout is uniform across a level, so there is nothing to gain from a
/// single polymorphic representation.
#[derive(Debug)]
pub(crate) enum Node<T> {
    Leaf(LeafNode<T>),
    Interior(InteriorNode<T>),
}

#[derive(Debug)]
pub(crate) struct LeafNode<T> {
    pub values: Vec<Arc<T>>,
}

#[derive(Debug)]
pub(crate) struct InteriorNode<T> {
    pub children: Vec<Arc<Node<T>>>,
}

/// Result of emplacing a value at the tail of a (sub)tree.
pub(crate) enum Emplace<T> {
    /// The path down to this level was copied; use this node in place of
    /// the old one.
    Replace(Arc<Node<T>>),
    /// This node is unchanged; the caller must graft `sibling` in as a
    /// new sibling of this node, one level up.
    Sibling(Arc<Node<T>>),
}

impl<T> Node<T> {
    fn size(&self) -> usize {
        match self {
            Node::Leaf(l) => l.values.len(),
            Node::Interior(i) => i.children.len(),
        }
    }

    pub(crate) fn get(&self, pos: usize, level: u32) -> &T {
        match self {
            Node::Leaf(l) => &l.values[pos],
            Node::Interior(i) => {
                let shift = level * FANOUT_BITS;
                let id = pos >> shift;
                let mask = (1usize << shift) - 1;
                i.children[id].get(pos & mask, level - 1)
            }
        }
    }

    pub(crate) fn set(&self, pos: usize, level: u32, value: Arc<T>) -> Arc<Node<T>> {
        match self {
            Node::Leaf(l) => {
                let mut values = l.values.clone();
                values[pos] = value;
                Arc::new(Node::Leaf(LeafNode { values }))
            }
            Node::Interior(i) => {
                let shift = level * FANOUT_BITS;
                let id = pos >> shift;
                let mask = (1usize << shift) - 1;
                let new_child = i.children[id].set(pos & mask, level - 1, value);
                let mut children = i.children.clone();
                children[id] = new_child;
                Arc::new(Node::Interior(InteriorNode { children }))
            }
        }
    }

    pub(crate) fn emplace_back(&self, value: Arc<T>, level: u32) -> Emplace<T> {
        match self {
            Node::Leaf(l) => {
                if l.values.len() < FANOUT {
                    let mut values = l.values.clone();
                    values.push(value);
                    Emplace::Replace(Arc::new(Node::Leaf(LeafNode { values })))
                } else {
                    Emplace::Sibling(Arc::new(Node::Leaf(LeafNode {
                        values: vec![value],
                    })))
                }
            }
            Node::Interior(i) => {
                let last = i.children.len() - 1;
                match i.children[last].emplace_back(value, level - 1) {
                    Emplace::Replace(new_child) => {
                        let mut children = i.children.clone();
                        children[last] = new_child;
                        Emplace::Replace(Arc::new(Node::Interior(InteriorNode { children })))
                    }
                    Emplace::Sibling(sibling) => {
                        if i.children.len() < FANOUT {
                            let mut children = i.children.clone();
                            children.push(sibling);
                            Emplace::Replace(Arc::new(Node::Interior(InteriorNode { children })))
                        } else {
                            Emplace::Sibling(Arc::new(Node::Interior(InteriorNode {
                                children: vec![sibling],
                            })))
                        }
                    }
                }
            }
        }
    }

    /// In-place counterpart of `emplace_back`, legal only while `self` is
    /// not reachable from any other version. The caller is responsible for
    /// that discipline; bulk constructors never hand out an intermediate
    /// root before the build completes.
    pub(crate) fn emplace_back_inplace(&mut self, value: Arc<T>, level: u32) -> Option<Arc<Node<T>>> {
        match self {
            Node::Leaf(l) => {
                if l.values.len() < FANOUT {
                    l.values.push(value);
                    None
                } else {
                    Some(Arc::new(Node::Leaf(LeafNode {
                        values: vec![value],
                    })))
                }
            }
            Node::Interior(i) => {
                let last = i.children.len() - 1;
                let child = Arc::get_mut(&mut i.children[last])
                    .expect("vector under construction must be sole-owned");
                match child.emplace_back_inplace(value, level - 1) {
                    None => None,
                    Some(sibling) => {
                        if i.children.len() < FANOUT {
                            i.children.push(sibling);
                            None
                        } else {
                            Some(Arc::new(Node::Interior(InteriorNode {
                                children: vec![sibling],
                            })))
                        }
                    }
                }
            }
        }
    }

    pub(crate) fn pop_back(&self, level: u32) -> Option<Arc<Node<T>>> {
        match self {
            Node::Leaf(l) => {
                if l.values.len() <= 1 {
                    None
                } else {
                    let values = l.values[..l.values.len() - 1].to_vec();
                    Some(Arc::new(Node::Leaf(LeafNode { values })))
                }
            }
            Node::Interior(i) => {
                let last = i.children.len() - 1;
                match i.children[last].pop_back(level - 1) {
                    Some(new_child) => {
                        let mut children = i.children[..last].to_vec();
                        children.push(new_child);
                        Some(Arc::new(Node::Interior(InteriorNode { children })))
                    }
                    None => {
                        if last == 0 {
                            None
                        } else {
                            let children = i.children[..last].to_vec();
                            Some(Arc::new(Node::Interior(InteriorNode { children })))
                        }
                    }
                }
            }
        }
    }

    /// Truncates to the first `new_len` elements along the rightmost
    /// path. `new_len` must be `>= 1`; the caller handles `new_len == 0`.
    pub(crate) fn reduce_size(&self, new_len: usize, level: u32) -> Option<Arc<Node<T>>> {
        match self {
            Node::Leaf(l) => {
                let n = new_len.min(l.values.len());
                Some(Arc::new(Node::Leaf(LeafNode {
                    values: l.values[..n].to_vec(),
                })))
            }
            Node::Interior(i) => {
                let shift = level * FANOUT_BITS;
                let id = (new_len - 1) >> shift;
                let mask = (1usize << shift) - 1;
                let child_new_len = ((new_len - 1) & mask) + 1;
                match i.children[id].reduce_size(child_new_len, level - 1) {
                    Some(new_child) => {
                        let mut children = i.children[..id].to_vec();
                        children.push(new_child);
                        Some(Arc::new(Node::Interior(InteriorNode { children })))
                    }
                    None => {
                        if id == 0 {
                            None
                        } else {
                            let children = i.children[..id].to_vec();
                            Some(Arc::new(Node::Interior(InteriorNode { children })))
                        }
                    }
                }
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn leaf_of(n: usize) -> Node<usize> {
        Node::Leaf(LeafNode {
            values: (0..n).map(Arc::new).collect(),
        })
    }

    #[test]
    fn leaf_emplace_until_full_then_splits() {
        let leaf = leaf_of(FANOUT - 1);
        match leaf.emplace_back(Arc::new(999), 0) {
            Emplace::Replace(n) => assert_eq!(n.size(), FANOUT),
            Emplace::Sibling(_) => panic!("should not split before full"),
        }
        let full = leaf_of(FANOUT);
        match full.emplace_back(Arc::new(999), 0) {
            Emplace::Sibling(n) => assert_eq!(n.size(), 1),
            Emplace::Replace(_) => panic!("full leaf must split"),
        }
    }

    #[test]
    fn set_copies_only_the_touched_leaf() {
        let leaf = leaf_of(4);
        let updated = leaf.set(2, 0, Arc::new(42));
        assert_eq!(*updated.get(2, 0), 42);
        assert_eq!(*leaf.get(2, 0), 2);
    }
}
