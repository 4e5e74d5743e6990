//! ID allocator invariants: monotonic, disjoint, no reuse.

use fogweave_core::alloc::{
    IdAllocator, IdKind, ENTITY_BASE, EVENT_BASE, FLAG_BASE, REGION_BASE, SCALING_BASE,
};

/// k calls yield k distinct, strictly increasing values from the base.
#[test]
fn next_is_strictly_increasing_from_base() {
    for kind in [IdKind::Entity, IdKind::Region, IdKind::Flag, IdKind::Event] {
        let mut alloc = IdAllocator::new();
        let ids: Vec<u32> = (0..100).map(|_| alloc.next(kind)).collect();
        assert!(
            ids.windows(2).all(|w| w[1] == w[0] + 1),
            "{kind:?} ids not strictly increasing: {ids:?}"
        );
        let base = match kind {
            IdKind::Entity => ENTITY_BASE,
            IdKind::Region => REGION_BASE,
            IdKind::Flag => FLAG_BASE,
            IdKind::Event => EVENT_BASE,
        };
        assert_eq!(ids[0], base, "{kind:?} does not start at its base");
    }
}

/// The four ranges never hand out the same value.
#[test]
fn ranges_are_disjoint() {
    let mut alloc = IdAllocator::new();
    let mut all = Vec::new();
    for kind in [IdKind::Entity, IdKind::Region, IdKind::Flag, IdKind::Event] {
        for _ in 0..1000 {
            all.push(alloc.next(kind));
        }
    }
    let mut deduped = all.clone();
    deduped.sort_unstable();
    deduped.dedup();
    assert_eq!(deduped.len(), all.len(), "id ranges overlap");
}

/// ReserveBlock followed by AllocateNext yields a value past the block.
#[test]
fn reserve_block_advances_cursor() {
    let mut alloc = IdAllocator::new();
    let block = alloc.reserve_block(IdKind::Flag, 50);
    assert_eq!(block, FLAG_BASE..FLAG_BASE + 50);
    let next = alloc.next(IdKind::Flag);
    assert!(next >= FLAG_BASE + 50, "next id {next} falls inside the reserved block");
    assert_eq!(alloc.issued(IdKind::Flag), 51);
}

/// Interleaved reserves and nexts stay contiguous and non-overlapping.
#[test]
fn interleaved_reserve_and_next() {
    let mut alloc = IdAllocator::new();
    let a = alloc.next(IdKind::Region);
    let block = alloc.reserve_block(IdKind::Region, 10);
    let b = alloc.next(IdKind::Region);
    assert_eq!(a, REGION_BASE);
    assert_eq!(block.start, a + 1);
    assert_eq!(b, block.end);
}

/// The scaling range skips the reserved tail sub-block of every
/// 10,000-wide block.
#[test]
fn scaling_ids_skip_reserved_tail() {
    let mut alloc = IdAllocator::new();
    let mut last = 0;
    for _ in 0..9_001 {
        last = alloc.next_scaling_entity();
        let offset = last % 10_000;
        assert!(offset < 9_000, "scaling id {last} landed in the reserved tail");
    }
    // 9,000 usable ids per block, so the 9,001st lands in the next block.
    assert_eq!(last, SCALING_BASE + 10_000);
}
