//! Scaling tier generation: stat-multiplier effect rows per tier pair,
//! applied to enemy actors via priority-ranked zone lookup.

use crate::alloc::IdAllocator;
use crate::codec;
use crate::error::{CompileError, CompileResult};
use crate::model::GraphDoc;
use crate::scene::PartKind;
use crate::store::ContainerStore;
use crate::types::{EffectId, Tier};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// One stat-multiplier effect row. The target format requires the
/// serialized collection to be ascending by id.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EffectRow {
    pub id: EffectId,
    pub hp_rate: f64,
    pub stamina_rate: f64,
    /// Physical, magic, fire, lightning, dark.
    pub attack_rates: [f64; 5],
    pub defense_rates: [f64; 5],
    pub drop_rate: f64,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StatBand {
    pub min: f64,
    pub max: f64,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ScalingConfig {
    /// Supported tier range is `1..=tier_count`.
    pub tier_count: u32,
    /// Effect ids live in the host game's effect-row id space, not the
    /// allocator's ranges.
    pub effect_base_id: EffectId,
    /// Copied per transition; only the rate fields are overwritten.
    pub template: EffectRow,
    pub health: StatBand,
    pub stamina: StatBand,
    pub attack: StatBand,
    pub defense: StatBand,
    pub drops: StatBand,
    /// Zone → tier the base game balances that zone for.
    #[serde(default)]
    pub vanilla_tiers: BTreeMap<String, Tier>,
    /// Scene-group id → zone. Priority (a) of actor zone resolution.
    #[serde(default)]
    pub zone_groups: BTreeMap<u32, String>,
    /// Collision part name → zone, keys either `"map:part"` or bare.
    /// Priority (b).
    #[serde(default)]
    pub collision_zones: BTreeMap<String, String>,
    /// Map name → zone. Priority (c), the last resort.
    #[serde(default)]
    pub map_zones: BTreeMap<String, String>,
}

/// Geometric interpolation `min * (max/min)^(i/(count-1))` per tier.
fn stat_table(band: &StatBand, count: u32) -> Vec<f64> {
    if count <= 1 {
        return vec![band.min];
    }
    (0..count)
        .map(|i| band.min * (band.max / band.min).powf(i as f64 / (count - 1) as f64))
        .collect()
}

pub struct TierBook {
    pub rows: Vec<EffectRow>,
    transitions: BTreeMap<(Tier, Tier), EffectId>,
}

impl TierBook {
    pub fn transition(&self, from: Tier, to: Tier) -> Option<EffectId> {
        self.transitions.get(&(from, to)).copied()
    }
}

/// One effect row for every ordered pair (from, to), from ≠ to, across
/// the supported tier range.
pub fn build_tier_book(cfg: &ScalingConfig) -> CompileResult<TierBook> {
    if cfg.tier_count == 0 {
        return Err(CompileError::malformed("scaling config", "tier_count is 0"));
    }
    let health = stat_table(&cfg.health, cfg.tier_count);
    let stamina = stat_table(&cfg.stamina, cfg.tier_count);
    let attack = stat_table(&cfg.attack, cfg.tier_count);
    let defense = stat_table(&cfg.defense, cfg.tier_count);
    let drops = stat_table(&cfg.drops, cfg.tier_count);

    let mut rows = Vec::new();
    let mut transitions = BTreeMap::new();
    let mut next_id = cfg.effect_base_id;

    for from in 1..=cfg.tier_count {
        for to in 1..=cfg.tier_count {
            if from == to {
                continue;
            }
            let fi = (from - 1) as usize;
            let ti = (to - 1) as usize;
            let mut row = cfg.template.clone();
            row.id = next_id;
            row.hp_rate = health[ti] / health[fi];
            row.stamina_rate = stamina[ti] / stamina[fi];
            row.attack_rates = [attack[ti] / attack[fi]; 5];
            row.defense_rates = [defense[ti] / defense[fi]; 5];
            row.drop_rate = drops[ti] / drops[fi];
            transitions.insert((from, to), next_id);
            rows.push(row);
            next_id += 1;
        }
    }

    // Already appended in ascending order, but the serialized format
    // requires it, so sort rather than assume.
    rows.sort_by_key(|r| r.id);
    Ok(TierBook { rows, transitions })
}

#[derive(Debug, Clone, Copy, Default, Serialize)]
pub struct ScalingCounters {
    pub applied: u32,
    pub no_zone: u32,
    pub zero_delta: u32,
    pub no_effect: u32,
}

/// Priority-ranked zone resolution for one actor.
fn resolve_zone(
    cfg: &ScalingConfig,
    map: &str,
    group_ids: &[u32],
    collision_part: Option<&str>,
) -> Option<String> {
    for gid in group_ids {
        if *gid == 0 {
            continue;
        }
        if let Some(zone) = cfg.zone_groups.get(gid) {
            return Some(zone.clone());
        }
    }
    if let Some(part) = collision_part {
        if let Some(zone) = cfg.collision_zones.get(&format!("{map}:{part}")) {
            return Some(zone.clone());
        }
        if let Some(zone) = cfg.collision_zones.get(part) {
            return Some(zone.clone());
        }
    }
    cfg.map_zones.get(map).cloned()
}

/// Re-scale every enemy actor in every loaded scene to its graph tier.
/// Skips are counted, never errors.
pub fn apply_scaling(
    graph: &GraphDoc,
    cfg: &ScalingConfig,
    book: &TierBook,
    alloc: &mut IdAllocator,
    store: &mut ContainerStore,
) -> CompileResult<ScalingCounters> {
    let target_tiers = graph.target_tiers();
    let mut counters = ScalingCounters::default();
    // (map, part index, effect) resolved before any mutation, so the
    // scan order never depends on what this pass writes.
    let mut applications: Vec<(String, usize, EffectId)> = Vec::new();

    for (map, scene) in &store.scenes {
        for (part_index, part) in scene.parts.iter().enumerate() {
            if part.kind != PartKind::Enemy {
                continue;
            }
            let zone = resolve_zone(cfg, map, &part.group_ids, part.collision_part.as_deref());
            let Some(zone) = zone else {
                counters.no_zone += 1;
                continue;
            };
            let (Some(&vanilla), Some(&target)) =
                (cfg.vanilla_tiers.get(&zone), target_tiers.get(&zone))
            else {
                counters.no_zone += 1;
                continue;
            };
            if vanilla == target {
                counters.zero_delta += 1;
                continue;
            }
            let Some(effect) = book.transition(vanilla, target) else {
                counters.no_effect += 1;
                continue;
            };
            applications.push((map.clone(), part_index, effect));
        }
    }

    for (map, part_index, effect) in applications {
        let scene = store.scene_mut(&map);
        let part = &mut scene.parts[part_index];
        if part.entity_id == 0 {
            part.entity_id = alloc.next_scaling_entity();
        }
        let entity = part.entity_id;
        store
            .script_mut(&map)
            .init_event_mut()
            .instructions
            .push(codec::apply_effect(entity, effect));
        counters.applied += 1;
    }

    log::debug!(
        "scaling: {} applied, {} no-zone, {} zero-delta, {} no-effect",
        counters.applied,
        counters.no_zone,
        counters.zero_delta,
        counters.no_effect
    );
    Ok(counters)
}
