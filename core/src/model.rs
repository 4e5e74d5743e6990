//! Input data model: the traversal graph and its lookup tables.
//!
//! RULE: everything in this module is read-only during compilation.
//! The graph comes from the external graph collaborator; the tables are
//! static data shipped with the build driver.

use crate::types::{EntityId, MapId, Tier};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// Graph schema this compiler was written against. Other versions warn
/// and proceed as long as the required fields deserialize.
pub const GRAPH_SCHEMA_VERSION: &str = "3";

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GraphDoc {
    #[serde(default)]
    pub schema_version: Option<String>,
    pub nodes: Vec<Node>,
    pub edges: Vec<Edge>,
}

impl GraphDoc {
    pub fn warn_on_schema_drift(&self) {
        match self.schema_version.as_deref() {
            Some(GRAPH_SCHEMA_VERSION) => {}
            Some(other) => log::warn!(
                "graph schema version '{other}' (expected '{GRAPH_SCHEMA_VERSION}'); \
                 proceeding with required fields"
            ),
            None => log::warn!("graph document carries no schema version; proceeding"),
        }
    }

    pub fn node(&self, id: u32) -> Option<&Node> {
        self.nodes.iter().find(|n| n.id == id)
    }

    /// The graph-assigned target tier per zone name.
    pub fn target_tiers(&self) -> BTreeMap<String, Tier> {
        let mut tiers = BTreeMap::new();
        for node in &self.nodes {
            for zone in &node.zones {
                tiers.entry(zone.clone()).or_insert(node.tier);
            }
        }
        tiers
    }
}

/// One traversal unit: a set of zones with one difficulty tier.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Node {
    pub id: u32,
    pub zones: Vec<String>,
    pub tier: Tier,
    #[serde(default)]
    pub cluster: u32,
}

/// One directed traversal link. The assigned flag lives in the
/// resolver's output record, not here.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Edge {
    pub source: u32,
    pub target: u32,
    pub fog_id: String,
    #[serde(default)]
    pub exit_entity: Option<EntityId>,
}

/// Lookup strategy tag on a fog entry. Decides the warp template and,
/// for triggers, the shared container placement.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum GateKind {
    /// A physical fog door in a scene.
    Gate,
    /// A generic invisible trigger volume; compiled into the shared container.
    Trigger,
    /// A defeat-then-warp gate keyed by a numeric fight identifier.
    Numeric,
    /// A cutscene-then-warp transition; has no companion trigger opcode.
    Cutscene,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GateTransform {
    pub position: [f32; 3],
    pub rotation: [f32; 3],
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FogEntry {
    pub fog_id: String,
    pub map: MapId,
    /// Scene entity realizing the gate; 0 when none exists in the base game.
    #[serde(default)]
    pub entity: EntityId,
    pub asset: String,
    pub kind: GateKind,
    /// Zone key for layered lookup. Entries without one only match unkeyed.
    #[serde(default)]
    pub zone: Option<String>,
    /// Present only for gates synthesized at build time.
    #[serde(default)]
    pub transform: Option<GateTransform>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct FogTable {
    pub entries: Vec<FogEntry>,
}

impl FogTable {
    /// Keyed lookup when `zone` is given, unkeyed otherwise.
    pub fn find(&self, fog_id: &str, zone: Option<&str>) -> Option<&FogEntry> {
        match zone {
            Some(z) => self
                .entries
                .iter()
                .find(|e| e.fog_id == fog_id && e.zone.as_deref() == Some(z)),
            None => self.entries.iter().find(|e| e.fog_id == fog_id),
        }
    }
}

/// Cluster/zone-to-map rows, consulted in declared order.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ClusterRow {
    pub zones: Vec<String>,
    pub map: MapId,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ClusterTable {
    pub rows: Vec<ClusterRow>,
}

impl ClusterTable {
    /// The containing map of the first row whose zone set intersects `zones`.
    pub fn map_for_zones(&self, zones: &[String]) -> Option<MapId> {
        self.rows
            .iter()
            .find(|row| row.zones.iter().any(|z| zones.contains(z)))
            .map(|row| row.map)
    }
}

/// Zone name → every map that zone spans. Feeds the compound-key unions.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ZoneMaps {
    pub zones: BTreeMap<String, Vec<MapId>>,
}

impl ZoneMaps {
    pub fn maps_for(&self, zone: &str) -> &[MapId] {
        self.zones.get(zone).map(Vec::as_slice).unwrap_or(&[])
    }
}
