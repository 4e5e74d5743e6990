//! In-memory container store.
//!
//! RULE: only the compiler's stages mutate the store, one writer at a
//! time. The external driver loads it up front and writes touched
//! containers once at the end — there is no other disk I/O. Containers
//! are keyed by map/container name; BTreeMap keying keeps serialization
//! independent of insertion order.

use crate::scaling::EffectRow;
use crate::scene::SceneDoc;
use crate::script::EventScript;
use crate::types::SHARED_PARAMS;
use std::collections::{BTreeMap, BTreeSet};

#[derive(Debug, Default)]
pub struct ContainerStore {
    pub scripts: BTreeMap<String, EventScript>,
    pub scenes: BTreeMap<String, SceneDoc>,
    /// The shared parameter document: tier-transition effect rows,
    /// ascending by id.
    pub effects: Vec<EffectRow>,
    touched: BTreeSet<String>,
}

impl ContainerStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert_script(&mut self, name: &str, script: EventScript) {
        self.scripts.insert(name.to_string(), script);
    }

    pub fn insert_scene(&mut self, name: &str, scene: SceneDoc) {
        self.scenes.insert(name.to_string(), scene);
    }

    /// Mutable access to a script container, creating it if absent.
    /// Marks the container touched.
    pub fn script_mut(&mut self, name: &str) -> &mut EventScript {
        self.touched.insert(name.to_string());
        self.scripts.entry(name.to_string()).or_default()
    }

    /// Mutable access to a scene container. Marks it touched.
    pub fn scene_mut(&mut self, name: &str) -> &mut SceneDoc {
        self.touched.insert(name.to_string());
        self.scenes.entry(name.to_string()).or_default()
    }

    pub fn script(&self, name: &str) -> Option<&EventScript> {
        self.scripts.get(name)
    }

    pub fn scene(&self, name: &str) -> Option<&SceneDoc> {
        self.scenes.get(name)
    }

    /// Install the tier-transition effect rows. Callers sort first; the
    /// target format requires ascending ids.
    pub fn install_effects(&mut self, rows: Vec<EffectRow>) {
        debug_assert!(rows.windows(2).all(|w| w[0].id < w[1].id));
        self.effects = rows;
        self.touched.insert(SHARED_PARAMS.to_string());
    }

    /// Names of every container this compilation modified.
    pub fn touched(&self) -> Vec<String> {
        self.touched.iter().cloned().collect()
    }
}
