//! Shared primitive types used across the entire compiler.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// A persistent state flag repurposed to signal "this edge was traversed".
pub type FlagId = u32;

/// An event in a script container.
pub type EventId = u32;

/// A scene actor (part) identifier.
pub type EntityId = u32;

/// A spawn-point region identifier.
pub type RegionId = u32;

/// A stat-multiplier effect row identifier.
pub type EffectId = u32;

/// Integer difficulty rung assigned by the graph.
pub type Tier = u32;

/// The shared script container. Generic trigger-type gates always land here.
pub const COMMON_SCRIPT: &str = "common";

/// The shared parameter document holding the tier-transition effect rows.
pub const SHARED_PARAMS: &str = "common_params";

/// The sentinel "unknown exit entity". Never matched as a wildcard.
pub const UNKNOWN_ENTITY: EntityId = 0;

/// A map identifier: four bytes, printed as `mAA_BB_CC_DD`.
///
/// The byte form is exactly what the warp instruction embeds in its
/// argument block, so conversions live here and nowhere else.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct MapId([u8; 4]);

impl MapId {
    pub fn new(bytes: [u8; 4]) -> Self {
        MapId(bytes)
    }

    pub fn bytes(&self) -> [u8; 4] {
        self.0
    }
}

impl fmt::Display for MapId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let [a, b, c, d] = self.0;
        write!(f, "m{a:02}_{b:02}_{c:02}_{d:02}")
    }
}

impl FromStr for MapId {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let body = s
            .strip_prefix('m')
            .ok_or_else(|| format!("map name '{s}' does not start with 'm'"))?;
        let parts: Vec<&str> = body.split('_').collect();
        if parts.len() != 4 {
            return Err(format!("map name '{s}' does not have 4 byte groups"));
        }
        let mut bytes = [0u8; 4];
        for (i, part) in parts.iter().enumerate() {
            bytes[i] = part
                .parse::<u8>()
                .map_err(|_| format!("map name '{s}' has non-numeric group '{part}'"))?;
        }
        Ok(MapId(bytes))
    }
}

impl TryFrom<String> for MapId {
    type Error = String;

    fn try_from(s: String) -> Result<Self, Self::Error> {
        s.parse()
    }
}

impl From<MapId> for String {
    fn from(m: MapId) -> String {
        m.to_string()
    }
}
