//! Fog gate resolution: graph edge → concrete source/destination assets.
//!
//! Edges are processed independently, in declared order; only warning
//! emission order depends on that order. An edge whose gate, destination
//! map, or entry record cannot be found is dropped with a warning and
//! the rest of the build continues.

use crate::alloc::{IdAllocator, IdKind};
use crate::error::{CompileError, CompileResult};
use crate::model::{ClusterTable, FogEntry, FogTable, GateKind, GraphDoc, Node};
use crate::types::{EntityId, EventId, FlagId, MapId, RegionId, UNKNOWN_ENTITY};

/// One surviving edge, fully resolved. Created once, discarded after
/// injection.
#[derive(Debug, Clone)]
pub struct FogGateEvent {
    pub edge_index: usize,
    pub source: u32,
    pub target: u32,
    pub fog_id: String,
    /// The source-side physical gate.
    pub gate: FogEntry,
    /// Zone the gate resolved under; feeds the compound-key source union.
    pub exit_zone: String,
    /// The destination-side entry record.
    pub entry: FogEntry,
    pub entry_zone: String,
    /// First zone of the target node; keys the flag→zone report.
    pub target_zone: String,
    pub dest_map: MapId,
    pub event_id: EventId,
    pub flag: FlagId,
    pub region: RegionId,
    /// New scene actor with inline transform vs. enable a pre-existing one.
    pub synthesize: bool,
    /// Exit-gate entity id for entity-based disambiguation; 0 = unknown.
    pub exit_entity: EntityId,
}

impl FogGateEvent {
    /// Context string for fatal diagnostics.
    pub fn describe(&self) -> String {
        format!(
            "edge #{} ({} -> {}, fog '{}', gate {}, dest {})",
            self.edge_index, self.source, self.target, self.fog_id, self.gate.map, self.dest_map
        )
    }
}

/// Layered lookup: keyed by each of the node's zones in declared order,
/// then unkeyed on the fog identifier alone.
fn resolve_entry<'a>(
    fog_table: &'a FogTable,
    fog_id: &str,
    node: &Node,
) -> Option<(&'a FogEntry, String)> {
    for zone in &node.zones {
        if let Some(entry) = fog_table.find(fog_id, Some(zone)) {
            return Some((entry, zone.clone()));
        }
    }
    let entry = fog_table.find(fog_id, None)?;
    let zone = entry
        .zone
        .clone()
        .or_else(|| node.zones.first().cloned())
        .unwrap_or_default();
    Some((entry, zone))
}

pub fn resolve_edges(
    graph: &GraphDoc,
    fog_table: &FogTable,
    clusters: &ClusterTable,
    alloc: &mut IdAllocator,
) -> CompileResult<(Vec<FogGateEvent>, u32)> {
    let mut records = Vec::with_capacity(graph.edges.len());
    let mut dropped = 0u32;

    for (edge_index, edge) in graph.edges.iter().enumerate() {
        let source = graph.node(edge.source).ok_or_else(|| {
            CompileError::malformed(
                "graph edge",
                format!("edge #{edge_index} references unknown source node {}", edge.source),
            )
        })?;
        let target = graph.node(edge.target).ok_or_else(|| {
            CompileError::malformed(
                "graph edge",
                format!("edge #{edge_index} references unknown target node {}", edge.target),
            )
        })?;

        let Some((gate, exit_zone)) = resolve_entry(fog_table, &edge.fog_id, source) else {
            log::warn!(
                "edge #{edge_index} ({} -> {}): no source gate for fog '{}'; dropping edge",
                edge.source,
                edge.target,
                edge.fog_id
            );
            dropped += 1;
            continue;
        };

        let Some(dest_map) = clusters.map_for_zones(&target.zones) else {
            log::warn!(
                "edge #{edge_index} ({} -> {}): no destination map for zones {:?}; dropping edge",
                edge.source,
                edge.target,
                target.zones
            );
            dropped += 1;
            continue;
        };

        let Some((entry, entry_zone)) = resolve_entry(fog_table, &edge.fog_id, target) else {
            log::warn!(
                "edge #{edge_index} ({} -> {}): no destination entry for fog '{}'; dropping edge",
                edge.source,
                edge.target,
                edge.fog_id
            );
            dropped += 1;
            continue;
        };

        // Ids are always fresh, even when two edges share a physical
        // exit gate; the flag ladder sorts out which warp site is whose.
        let event_id = alloc.next(IdKind::Event);
        let flag = alloc.next(IdKind::Flag);
        let region = alloc.next(IdKind::Region);

        let synthesize = gate.transform.is_some();
        let mut gate = gate.clone();
        if synthesize && gate.entity == UNKNOWN_ENTITY {
            gate.entity = alloc.next(IdKind::Entity);
        }

        // Numeric gates are keyed by a fight identifier, not a scene
        // entity; they carry no usable exit entity.
        let exit_entity = match gate.kind {
            GateKind::Numeric => UNKNOWN_ENTITY,
            _ => edge.exit_entity.unwrap_or(gate.entity),
        };

        records.push(FogGateEvent {
            edge_index,
            source: edge.source,
            target: edge.target,
            fog_id: edge.fog_id.clone(),
            exit_zone,
            entry: entry.clone(),
            entry_zone,
            target_zone: target.zones.first().cloned().unwrap_or_default(),
            dest_map,
            event_id,
            flag,
            region,
            synthesize,
            exit_entity,
            gate,
        });
    }

    log::debug!(
        "fog gate resolution: {} edges resolved, {} dropped",
        records.len(),
        dropped
    );
    Ok((records, dropped))
}
