//! Monotonic ID allocation.
//!
//! RULE: every fresh identifier a compilation emits comes from this
//! allocator. One instance lives for exactly one run and is passed by
//! mutable reference to every consumer. No reuse, no freeing.
//!
//! The four base offsets are disjoint from each other, from the host
//! game's own id ranges, and from the companion randomizer tool's ranges.

use std::ops::Range;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum IdKind {
    Entity,
    Region,
    Flag,
    Event,
}

pub const ENTITY_BASE: u32 = 7_600_000;
pub const REGION_BASE: u32 = 7_700_000;
pub const FLAG_BASE: u32 = 7_800_000;
pub const EVENT_BASE: u32 = 7_900_000;

/// Base of the scaling entity-id range handed to enemy actors that have
/// no entity id of their own.
pub const SCALING_BASE: u32 = 77_000_000;

const SCALING_BLOCK: u32 = 10_000;
/// The tail of every 10,000-wide block is reserved by the host game.
const SCALING_RESERVED_TAIL: u32 = 1_000;

#[derive(Debug)]
struct IdRange {
    base: u32,
    cursor: u32,
}

impl IdRange {
    fn new(base: u32) -> Self {
        IdRange { base, cursor: base }
    }
}

#[derive(Debug)]
pub struct IdAllocator {
    entity: IdRange,
    region: IdRange,
    flag: IdRange,
    event: IdRange,
    scaling_cursor: u32,
}

impl IdAllocator {
    pub fn new() -> Self {
        IdAllocator {
            entity: IdRange::new(ENTITY_BASE),
            region: IdRange::new(REGION_BASE),
            flag: IdRange::new(FLAG_BASE),
            event: IdRange::new(EVENT_BASE),
            scaling_cursor: SCALING_BASE,
        }
    }

    fn range_mut(&mut self, kind: IdKind) -> &mut IdRange {
        match kind {
            IdKind::Entity => &mut self.entity,
            IdKind::Region => &mut self.region,
            IdKind::Flag => &mut self.flag,
            IdKind::Event => &mut self.event,
        }
    }

    /// The next unused id of `kind`. Strictly increasing for the run.
    pub fn next(&mut self, kind: IdKind) -> u32 {
        let range = self.range_mut(kind);
        let id = range.cursor;
        range.cursor += 1;
        id
    }

    /// Reserve a contiguous `[start, start + count)` block and advance
    /// the cursor past it.
    pub fn reserve_block(&mut self, kind: IdKind, count: u32) -> Range<u32> {
        let range = self.range_mut(kind);
        let start = range.cursor;
        range.cursor += count;
        start..range.cursor
    }

    /// How many ids of `kind` have been issued so far.
    pub fn issued(&self, kind: IdKind) -> u32 {
        let range = match kind {
            IdKind::Entity => &self.entity,
            IdKind::Region => &self.region,
            IdKind::Flag => &self.flag,
            IdKind::Event => &self.event,
        };
        range.cursor - range.base
    }

    /// The next scaling entity id, skipping the reserved tail sub-block
    /// of every 10,000-wide block.
    pub fn next_scaling_entity(&mut self) -> u32 {
        let offset = self.scaling_cursor % SCALING_BLOCK;
        if offset >= SCALING_BLOCK - SCALING_RESERVED_TAIL {
            self.scaling_cursor += SCALING_BLOCK - offset;
        }
        let id = self.scaling_cursor;
        self.scaling_cursor += 1;
        id
    }
}

impl Default for IdAllocator {
    fn default() -> Self {
        Self::new()
    }
}
