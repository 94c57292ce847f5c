use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

/// A shared, cloneable source of monotonically increasing version ids.
///
/// Every persistent container constructed from scratch (`default`,
/// `with_count`, `from_iter`, ...) owns a fresh `VersionContext`. Every
/// value produced from it by a mutating operation shares the same
/// context, so version ids across the whole family are totally ordered
/// by allocation order and safe to compare for ancestry.
#[derive(Debug, Clone, Default)]
pub struct VersionContext {
    next: Arc<AtomicU64>,
}

impl VersionContext {
    /// Creates a fresh context starting at version 0.
    pub fn new() -> Self {
        Self {
            next: Arc::new(AtomicU64::new(0)),
        }
    }

    /// Mints the next version id. Safe to call concurrently from
    /// multiple threads sharing this context: each call observes a
    /// distinct id.
    pub fn next_version(&self) -> u64 {
        self.next.fetch_add(1, Ordering::SeqCst)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn versions_are_monotonic() {
        let ctx = VersionContext::new();
        let a = ctx.next_version();
        let b = ctx.next_version();
        let c = ctx.next_version();
        assert!(a < b);
        assert!(b < c);
    }

    #[test]
    fn clones_share_the_same_counter() {
        let ctx = VersionContext::new();
        let clone = ctx.clone();
        let a = ctx.next_version();
        let b = clone.next_version();
        assert_ne!(a, b);
    }
}
