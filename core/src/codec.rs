//! Instruction codec.
//!
//! RULE: only codec.rs touches raw argument bytes. Every opcode the
//! compiler emits or inspects is listed here with its field layout, so
//! all offset arithmetic is in one place and unit-tested in one place.
//! Arguments are little-endian throughout.

use crate::script::Instruction;
use crate::types::{EffectId, EntityId, EventId, FlagId, MapId, RegionId};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Op {
    pub bank: u16,
    pub index: u16,
}

impl Op {
    pub fn matches(&self, ins: &Instruction) -> bool {
        ins.bank == self.bank && ins.index == self.index
    }
}

/// `[slot: i32, event_id: i32, params...]` — invoke an event as a subroutine.
pub const INITIALIZE_EVENT: Op = Op { bank: 2000, index: 0 };

/// `[flag: i32, state: u8, pad3]`.
pub const SET_EVENT_FLAG: Op = Op { bank: 2003, index: 66 };

/// `[map: 4 bytes, region: i32]` — the teleport itself.
pub const WARP_PLAYER: Op = Op { bank: 2003, index: 14 };

/// `[category: i32, entity: i32, ...]` — companion area-trigger condition.
/// The compiled exit-gate entity id sits at byte offset 4.
pub const TRIGGER_IN_AREA: Op = Op { bank: 3, index: 2 };

/// `[entity: i32, effect: i32]`.
pub const APPLY_EFFECT_TO_ENTITY: Op = Op { bank: 2004, index: 8 };

/// A fixed-layout field inside an argument block.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Field {
    pub offset: usize,
    pub width: usize,
}

pub const WARP_DEST_MAP: Field = Field { offset: 0, width: 4 };
pub const WARP_REGION: Field = Field { offset: 4, width: 4 };
pub const TRIGGER_ENTITY: Field = Field { offset: 4, width: 4 };

pub fn read_u32(args: &[u8], field: Field) -> Option<u32> {
    debug_assert_eq!(field.width, 4);
    let end = field.offset.checked_add(4)?;
    let bytes: [u8; 4] = args.get(field.offset..end)?.try_into().ok()?;
    Some(u32::from_le_bytes(bytes))
}

fn push_u32(args: &mut Vec<u8>, value: u32) {
    args.extend_from_slice(&value.to_le_bytes());
}

// ── Emitters ───────────────────────────────────────────────

pub fn initialize_event(slot: u32, event_id: EventId, params: &[u32]) -> Instruction {
    let mut args = Vec::with_capacity(8 + params.len() * 4);
    push_u32(&mut args, slot);
    push_u32(&mut args, event_id);
    for p in params {
        push_u32(&mut args, *p);
    }
    Instruction {
        bank: INITIALIZE_EVENT.bank,
        index: INITIALIZE_EVENT.index,
        args,
    }
}

pub fn set_event_flag(flag: FlagId, on: bool) -> Instruction {
    let mut args = Vec::with_capacity(8);
    push_u32(&mut args, flag);
    args.push(on as u8);
    args.extend_from_slice(&[0, 0, 0]);
    Instruction {
        bank: SET_EVENT_FLAG.bank,
        index: SET_EVENT_FLAG.index,
        args,
    }
}

pub fn warp_player(map: MapId, region: RegionId) -> Instruction {
    let mut args = Vec::with_capacity(8);
    args.extend_from_slice(&map.bytes());
    push_u32(&mut args, region);
    Instruction {
        bank: WARP_PLAYER.bank,
        index: WARP_PLAYER.index,
        args,
    }
}

pub fn apply_effect(entity: EntityId, effect: EffectId) -> Instruction {
    let mut args = Vec::with_capacity(8);
    push_u32(&mut args, entity);
    push_u32(&mut args, effect);
    Instruction {
        bank: APPLY_EFFECT_TO_ENTITY.bank,
        index: APPLY_EFFECT_TO_ENTITY.index,
        args,
    }
}

// ── Accessors ──────────────────────────────────────────────

/// Destination map bytes and spawn region of a warp instruction.
/// None when the instruction is not a warp or its block is truncated.
pub fn warp_destination(ins: &Instruction) -> Option<(MapId, RegionId)> {
    if !WARP_PLAYER.matches(ins) {
        return None;
    }
    let end = WARP_DEST_MAP.offset + WARP_DEST_MAP.width;
    let bytes: [u8; 4] = ins.args.get(WARP_DEST_MAP.offset..end)?.try_into().ok()?;
    let region = read_u32(&ins.args, WARP_REGION)?;
    Some((MapId::new(bytes), region))
}

/// The compiled exit-gate entity id of an area-trigger condition.
pub fn trigger_entity(ins: &Instruction) -> Option<EntityId> {
    if !TRIGGER_IN_AREA.matches(ins) {
        return None;
    }
    read_u32(&ins.args, TRIGGER_ENTITY)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn warp_layout_round_trips() {
        let map = MapId::new([30, 1, 0, 0]);
        let ins = warp_player(map, 7_700_123);
        assert_eq!(ins.args.len(), 8);
        let (got_map, got_region) = warp_destination(&ins).unwrap();
        assert_eq!(got_map, map);
        assert_eq!(got_region, 7_700_123);
    }

    #[test]
    fn warp_map_bytes_sit_at_offset_zero() {
        let ins = warp_player(MapId::new([31, 2, 9, 4]), 0);
        assert_eq!(&ins.args[0..4], &[31, 2, 9, 4]);
    }

    #[test]
    fn set_flag_state_byte_sits_at_offset_four() {
        let ins = set_event_flag(7_800_042, true);
        assert_eq!(read_u32(&ins.args, Field { offset: 0, width: 4 }), Some(7_800_042));
        assert_eq!(ins.args[4], 1);
        assert_eq!(ins.args.len(), 8);
    }

    #[test]
    fn trigger_entity_reads_offset_four() {
        let mut args = Vec::new();
        args.extend_from_slice(&5u32.to_le_bytes());
        args.extend_from_slice(&4_001_800u32.to_le_bytes());
        let ins = Instruction {
            bank: TRIGGER_IN_AREA.bank,
            index: TRIGGER_IN_AREA.index,
            args,
        };
        assert_eq!(trigger_entity(&ins), Some(4_001_800));
    }

    #[test]
    fn trigger_entity_rejects_other_opcodes() {
        let ins = set_event_flag(1, false);
        assert_eq!(trigger_entity(&ins), None);
    }

    #[test]
    fn truncated_argument_block_reads_none() {
        let ins = Instruction {
            bank: WARP_PLAYER.bank,
            index: WARP_PLAYER.index,
            args: vec![30, 0, 0],
        };
        assert_eq!(warp_destination(&ins), None);
    }

    #[test]
    fn initializer_layout_is_slot_then_event_then_params() {
        let ins = initialize_event(2, 7_900_005, &[11, 22]);
        assert_eq!(read_u32(&ins.args, Field { offset: 0, width: 4 }), Some(2));
        assert_eq!(read_u32(&ins.args, Field { offset: 4, width: 4 }), Some(7_900_005));
        assert_eq!(read_u32(&ins.args, Field { offset: 8, width: 4 }), Some(11));
        assert_eq!(read_u32(&ins.args, Field { offset: 12, width: 4 }), Some(22));
    }

    #[test]
    fn apply_effect_layout() {
        let ins = apply_effect(77_000_000, 7_000_012);
        assert_eq!(read_u32(&ins.args, Field { offset: 0, width: 4 }), Some(77_000_000));
        assert_eq!(read_u32(&ins.args, Field { offset: 4, width: 4 }), Some(7_000_012));
    }
}
