//! Zone-tracking flag assignment.
//!
//! An injected warp instruction carries only destination-map bytes and
//! a spawn-region id, not which edge produced it. This stage scans
//! every script container for warp sites and assigns each one the flag
//! of the edge it implements, via an ordered strategy ladder. A wrong
//! assignment is strictly worse than a failed build: when the ladder is
//! exhausted and an edge is still unassigned, the whole compilation
//! aborts naming every such edge.

use crate::codec;
use crate::error::{CompileError, CompileResult};
use crate::gates::FogGateEvent;
use crate::model::ZoneMaps;
use crate::store::ContainerStore;
use crate::types::{EventId, FlagId, MapId, RegionId, UNKNOWN_ENTITY};
use std::collections::{BTreeMap, BTreeSet};

/// One physical warp instruction found in a script container.
#[derive(Debug, Clone)]
pub struct WarpSite {
    pub container: String,
    pub event_id: EventId,
    /// Instruction index inside the owning event.
    pub index: usize,
    pub dest_map: MapId,
    pub dest_region: RegionId,
}

impl WarpSite {
    /// The containing map, when the container is map-specific. Shared
    /// containers have no containing map.
    fn containing_map(&self) -> Option<MapId> {
        self.container.parse().ok()
    }
}

pub enum Resolution<'a> {
    /// Exactly one edge matches; first unique match wins the ladder.
    Unique(&'a FogGateEvent),
    /// Narrowed but still colliding; the next strategy continues.
    Ambiguous(Vec<&'a FogGateEvent>),
    /// Nothing matches; the site is not one of ours.
    NoCandidates,
}

fn decide<'a>(matched: Vec<&'a FogGateEvent>) -> Resolution<'a> {
    match matched.len() {
        0 => Resolution::NoCandidates,
        1 => Resolution::Unique(matched[0]),
        _ => Resolution::Ambiguous(matched),
    }
}

struct LadderContext<'a> {
    zone_maps: &'a ZoneMaps,
    store: &'a ContainerStore,
}

trait Strategy {
    fn name(&self) -> &'static str;

    fn try_resolve<'a>(
        &self,
        site: &WarpSite,
        candidates: &[&'a FogGateEvent],
        ctx: &LadderContext<'_>,
    ) -> Resolution<'a>;

    /// Policy: a collision at this rung in a map-specific container
    /// means the site needs no forward flag (it is near-universally a
    /// return-warp from a previously entered sub-area).
    fn skip_on_map_specific_collision(&self) -> bool {
        false
    }
}

/// Rung 1: group candidates by destination map alone.
struct DestinationOnly;

impl Strategy for DestinationOnly {
    fn name(&self) -> &'static str {
        "destination-only"
    }

    fn try_resolve<'a>(
        &self,
        site: &WarpSite,
        candidates: &[&'a FogGateEvent],
        _ctx: &LadderContext<'_>,
    ) -> Resolution<'a> {
        decide(
            candidates
                .iter()
                .copied()
                .filter(|r| r.dest_map == site.dest_map)
                .collect(),
        )
    }
}

/// Rung 2: the (source map, destination map) compound key. Each side is
/// the union of the gate's own map with every map its zone spans.
struct CompoundKey;

impl CompoundKey {
    fn source_union(record: &FogGateEvent, zone_maps: &ZoneMaps) -> BTreeSet<MapId> {
        let mut maps: BTreeSet<MapId> = zone_maps.maps_for(&record.exit_zone).iter().copied().collect();
        maps.insert(record.gate.map);
        maps
    }

    fn dest_union(record: &FogGateEvent, zone_maps: &ZoneMaps) -> BTreeSet<MapId> {
        let mut maps: BTreeSet<MapId> = zone_maps.maps_for(&record.entry_zone).iter().copied().collect();
        maps.insert(record.dest_map);
        maps
    }
}

impl Strategy for CompoundKey {
    fn name(&self) -> &'static str {
        "compound-key"
    }

    fn try_resolve<'a>(
        &self,
        site: &WarpSite,
        candidates: &[&'a FogGateEvent],
        ctx: &LadderContext<'_>,
    ) -> Resolution<'a> {
        // A shared container has no containing map; the source half of
        // the key is vacuous there and rung 3 does the real work.
        let source_map = site.containing_map();
        decide(
            candidates
                .iter()
                .copied()
                .filter(|r| {
                    let dest_ok = Self::dest_union(r, ctx.zone_maps).contains(&site.dest_map);
                    let source_ok = match source_map {
                        Some(m) => Self::source_union(r, ctx.zone_maps).contains(&m),
                        None => true,
                    };
                    dest_ok && source_ok
                })
                .collect(),
        )
    }

    fn skip_on_map_specific_collision(&self) -> bool {
        true
    }
}

/// Rung 3: recover the compiled exit-gate entity id from the companion
/// area-trigger opcode in the owning event and match it against each
/// candidate's recorded exit entity. The unknown sentinel (0) is
/// excluded from comparison, never treated as a wildcard.
struct EntityMatch;

impl Strategy for EntityMatch {
    fn name(&self) -> &'static str {
        "entity-match"
    }

    fn try_resolve<'a>(
        &self,
        site: &WarpSite,
        candidates: &[&'a FogGateEvent],
        ctx: &LadderContext<'_>,
    ) -> Resolution<'a> {
        let owning_event = ctx
            .store
            .script(&site.container)
            .and_then(|s| s.get(site.event_id));
        let Some(event) = owning_event else {
            return Resolution::Ambiguous(candidates.to_vec());
        };
        // Cutscene-style warps have no companion trigger opcode; they
        // fall straight through to the fatal rung.
        let Some(entity) = event.instructions.iter().find_map(codec::trigger_entity) else {
            return Resolution::Ambiguous(candidates.to_vec());
        };
        decide(
            candidates
                .iter()
                .copied()
                .filter(|r| r.exit_entity != UNKNOWN_ENTITY && r.exit_entity == entity)
                .collect(),
        )
    }
}

enum SiteOutcome<'a> {
    Assigned(&'a FogGateEvent),
    /// Map-specific compound-key collision; needs no forward flag.
    Skipped,
    /// Not one of ours, or exhausted without a unique match.
    Unclaimed,
}

fn resolve_site<'a>(
    site: &WarpSite,
    records: &'a [FogGateEvent],
    ctx: &LadderContext<'_>,
) -> SiteOutcome<'a> {
    let strategies: [&dyn Strategy; 3] = [&DestinationOnly, &CompoundKey, &EntityMatch];
    let mut candidates: Vec<&FogGateEvent> = records.iter().collect();

    for strategy in strategies {
        match strategy.try_resolve(site, &candidates, ctx) {
            Resolution::Unique(record) => {
                log::debug!(
                    "site {}@{}#{}: assigned flag {} via {}",
                    site.container,
                    site.event_id,
                    site.index,
                    record.flag,
                    strategy.name()
                );
                return SiteOutcome::Assigned(record);
            }
            Resolution::NoCandidates => return SiteOutcome::Unclaimed,
            Resolution::Ambiguous(narrowed) => {
                if strategy.skip_on_map_specific_collision() && site.containing_map().is_some() {
                    log::debug!(
                        "site {}@{}#{}: compound-key collision in map-specific container; \
                         skipping injection",
                        site.container,
                        site.event_id,
                        site.index
                    );
                    return SiteOutcome::Skipped;
                }
                candidates = narrowed;
            }
        }
    }
    SiteOutcome::Unclaimed
}

/// Every warp instruction in every script container, in container order.
fn collect_sites(store: &ContainerStore) -> Vec<WarpSite> {
    let mut sites = Vec::new();
    for (container, script) in &store.scripts {
        for event in script.events.values() {
            for (index, ins) in event.instructions.iter().enumerate() {
                if let Some((dest_map, dest_region)) = codec::warp_destination(ins) {
                    sites.push(WarpSite {
                        container: container.clone(),
                        event_id: event.id,
                        index,
                        dest_map,
                        dest_region,
                    });
                }
            }
        }
    }
    sites
}

#[derive(Debug, Default)]
pub struct FlagAssignments {
    /// Flag → target zone, exactly as injected.
    pub flag_zones: BTreeMap<FlagId, String>,
    pub assigned_sites: u32,
    pub skipped_sites: u32,
}

pub fn assign_flags(
    records: &[FogGateEvent],
    zone_maps: &ZoneMaps,
    store: &mut ContainerStore,
) -> CompileResult<FlagAssignments> {
    let sites = collect_sites(store);
    let ctx = LadderContext {
        zone_maps,
        store: &*store,
    };

    let mut out = FlagAssignments::default();
    // (container, event, index) -> flag; applied after the scan so the
    // scan never observes its own insertions.
    let mut injections: Vec<(String, EventId, usize, FlagId)> = Vec::new();
    let mut assigned_flags: BTreeSet<FlagId> = BTreeSet::new();

    for site in &sites {
        match resolve_site(site, records, &ctx) {
            SiteOutcome::Assigned(record) => {
                injections.push((site.container.clone(), site.event_id, site.index, record.flag));
                assigned_flags.insert(record.flag);
                out.flag_zones
                    .insert(record.flag, record.target_zone.clone());
                out.assigned_sites += 1;
            }
            SiteOutcome::Skipped => out.skipped_sites += 1,
            SiteOutcome::Unclaimed => {}
        }
    }

    // Any edge requiring a flag that no strategy claimed is fatal.
    let unassigned: Vec<String> = records
        .iter()
        .filter(|r| !assigned_flags.contains(&r.flag))
        .map(|r| r.describe())
        .collect();
    if !unassigned.is_empty() {
        return Err(CompileError::AmbiguousMatch { edges: unassigned });
    }

    // Inject the set-flag instruction immediately before each warp.
    // Descending index order within an event keeps earlier indices valid.
    injections.sort_by(|a, b| a.0.cmp(&b.0).then(a.1.cmp(&b.1)).then(b.2.cmp(&a.2)));
    for (container, event_id, index, flag) in injections {
        let script = store.script_mut(&container);
        if let Some(event) = script.events.get_mut(&event_id) {
            event
                .instructions
                .insert(index, codec::set_event_flag(flag, true));
        }
    }

    log::debug!(
        "flag assignment: {} sites tagged, {} skipped, {} flags",
        out.assigned_sites,
        out.skipped_sites,
        out.flag_zones.len()
    );
    Ok(out)
}
