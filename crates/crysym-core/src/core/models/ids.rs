use slotmap::new_key_type;
use std::sync::atomic::{AtomicU64, Ordering};

new_key_type! {
    pub struct SiteId;
}

/// Identifies one [`Structure`](super::structure::Structure) instance.
///
/// Atom sites hold this value as a non-owning back-link to the structure that owns
/// them. Identifiers are process-unique and never reused.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct StructureId(u64);

impl StructureId {
    pub(crate) fn next() -> Self {
        static NEXT: AtomicU64 = AtomicU64::new(1);
        Self(NEXT.fetch_add(1, Ordering::Relaxed))
    }

    pub fn value(&self) -> u64 {
        self.0
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn structure_ids_are_unique() {
        let first = StructureId::next();
        let second = StructureId::next();
        assert_ne!(first, second);
        assert!(second.value() > first.value());
    }
}
