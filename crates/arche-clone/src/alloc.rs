//! Identifier allocation for cloned objects.

use arche_types::ObjectId;

/// Source of candidate identifiers for cloned objects.
///
/// An allocator only proposes candidates. The planner checks each one for
/// freshness and asks again on a collision, up to
/// [`CloneOptions::max_id_attempts`](crate::CloneOptions::max_id_attempts)
/// times.
pub trait IdAllocator {
    fn allocate(&mut self) -> ObjectId;
}

/// Time-ordered random identifiers (UUID v7). The default allocator.
#[derive(Clone, Copy, Debug, Default)]
pub struct UuidAllocator;

impl IdAllocator for UuidAllocator {
    fn allocate(&mut self) -> ObjectId {
        ObjectId::new()
    }
}

/// Deterministic allocator handing out `start, start + 1, ...`.
///
/// Useful for tests and reproducible fixtures.
#[derive(Clone, Debug)]
pub struct SequenceAllocator {
    next: u128,
}

impl SequenceAllocator {
    pub fn starting_at(start: u128) -> Self {
        Self { next: start }
    }
}

impl IdAllocator for SequenceAllocator {
    fn allocate(&mut self) -> ObjectId {
        let id = ObjectId::from_u128(self.next);
        self.next = self.next.wrapping_add(1);
        id
    }
}

impl<F> IdAllocator for F
where
    F: FnMut() -> ObjectId,
{
    fn allocate(&mut self) -> ObjectId {
        self()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn sequence_is_deterministic() {
        let mut alloc = SequenceAllocator::starting_at(10);
        assert_eq!(alloc.allocate(), ObjectId::from_u128(10));
        assert_eq!(alloc.allocate(), ObjectId::from_u128(11));
    }

    #[test]
    fn uuid_allocator_does_not_repeat() {
        let mut alloc = UuidAllocator;
        assert_ne!(alloc.allocate(), alloc.allocate());
    }

    #[test]
    fn closures_are_allocators() {
        let mut calls = 0;
        let mut alloc = || {
            calls += 1;
            ObjectId::from_u128(7)
        };
        assert_eq!(alloc.allocate(), ObjectId::from_u128(7));
        drop(alloc);
        assert_eq!(calls, 1);
    }
}
