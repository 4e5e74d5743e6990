//! The script-container document model.
//!
//! A script container holds the per-map event streams the compiler
//! patches. Event id 0 is the constructor: it runs when the map loads
//! and is where initializers and scaling applications are appended.

use crate::types::EventId;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

pub const INIT_EVENT_ID: EventId = 0;

/// The atomic unit of the bytecode format: bank, opcode index, and the
/// raw argument block. Argument layout is codec.rs territory.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Instruction {
    pub bank: u16,
    pub index: u16,
    pub args: Vec<u8>,
}

/// Reset behavior carried on the event header, never in its instructions.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RestartBehavior {
    #[default]
    None,
    /// Re-arm the event when the player respawns.
    Restart,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Event {
    pub id: EventId,
    #[serde(default)]
    pub restart: RestartBehavior,
    pub instructions: Vec<Instruction>,
}

impl Event {
    pub fn new(id: EventId) -> Self {
        Event {
            id,
            restart: RestartBehavior::None,
            instructions: Vec::new(),
        }
    }
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct EventScript {
    pub events: BTreeMap<EventId, Event>,
}

impl EventScript {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn contains(&self, id: EventId) -> bool {
        self.events.contains_key(&id)
    }

    pub fn get(&self, id: EventId) -> Option<&Event> {
        self.events.get(&id)
    }

    pub fn insert(&mut self, event: Event) {
        self.events.insert(event.id, event);
    }

    /// The constructor event, created on first touch.
    pub fn init_event_mut(&mut self) -> &mut Event {
        self.events
            .entry(INIT_EVENT_ID)
            .or_insert_with(|| Event::new(INIT_EVENT_ID))
    }
}
