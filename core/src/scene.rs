//! The scene-layout document model: actor parts and spawn regions per map.

use crate::model::GateTransform;
use crate::types::{EntityId, RegionId};
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PartKind {
    Enemy,
    Object,
    Collision,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ScenePart {
    pub name: String,
    pub kind: PartKind,
    /// 0 means the actor has no entity id yet.
    #[serde(default)]
    pub entity_id: EntityId,
    #[serde(default)]
    pub npc_id: u32,
    /// Scene-group memberships, in declared order. 0 slots are unused.
    #[serde(default)]
    pub group_ids: Vec<u32>,
    /// Name of the collision geometry the actor stands on.
    #[serde(default)]
    pub collision_part: Option<String>,
    #[serde(default)]
    pub transform: Option<GateTransform>,
    #[serde(default = "enabled_default")]
    pub enabled: bool,
}

fn enabled_default() -> bool {
    true
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SceneRegion {
    pub region_id: RegionId,
    pub position: [f32; 3],
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct SceneDoc {
    pub parts: Vec<ScenePart>,
    pub regions: Vec<SceneRegion>,
}

impl SceneDoc {
    pub fn part_mut(&mut self, name: &str) -> Option<&mut ScenePart> {
        self.parts.iter_mut().find(|p| p.name == name)
    }

    /// Make a pre-existing gate actor visible. Returns false when the
    /// named part is not in this scene.
    pub fn enable_part(&mut self, name: &str) -> bool {
        match self.part_mut(name) {
            Some(part) => {
                part.enabled = true;
                true
            }
            None => false,
        }
    }

    /// Instantiate a gate actor that has no base-game representation.
    pub fn synthesize_gate(&mut self, name: &str, entity_id: EntityId, transform: &GateTransform) {
        self.parts.push(ScenePart {
            name: name.to_string(),
            kind: PartKind::Object,
            entity_id,
            npc_id: 0,
            group_ids: Vec::new(),
            collision_part: None,
            transform: Some(transform.clone()),
            enabled: true,
        });
    }

    pub fn add_region(&mut self, region_id: RegionId, position: [f32; 3]) {
        self.regions.push(SceneRegion {
            region_id,
            position,
        });
    }
}
