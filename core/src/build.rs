//! Event injection: per-edge records → concrete per-map instruction
//! streams and scene patches.
//!
//! Execution order is fixed: gate resolution produced the records, this
//! stage instantiates and registers their events, the flag ladder then
//! scans what was injected. Trigger-type gates always land in the
//! shared script container.

use crate::codec;
use crate::error::{CompileError, CompileResult};
use crate::gates::FogGateEvent;
use crate::model::GateKind;
use crate::store::ContainerStore;
use crate::templates::{register_into, TemplateArg, TemplateRegistry};
use crate::types::COMMON_SCRIPT;
use std::collections::BTreeSet;

/// Warp template per lookup-strategy tag.
pub fn template_for(kind: GateKind) -> &'static str {
    match kind {
        GateKind::Gate => "fog_gate_warp",
        GateKind::Trigger => "trigger_warp",
        GateKind::Numeric => "defeat_warp",
        GateKind::Cutscene => "cutscene_warp",
    }
}

/// Every template name this batch of records will instantiate.
pub fn referenced_templates(records: &[FogGateEvent]) -> BTreeSet<&'static str> {
    records
        .iter()
        .map(|r| template_for(r.gate.kind))
        .collect()
}

/// The container a record's warp event belongs to.
pub fn owning_script(record: &FogGateEvent) -> String {
    match record.gate.kind {
        GateKind::Trigger => COMMON_SCRIPT.to_string(),
        _ => record.gate.map.to_string(),
    }
}

/// Bind a template's declared params, in declared order, to this
/// record's build-time constants. An undeclared name is fatal.
fn args_for(
    registry: &TemplateRegistry,
    name: &str,
    record: &FogGateEvent,
) -> CompileResult<Vec<TemplateArg>> {
    let template = registry.get(name)?;
    let map = record.dest_map.bytes();
    template
        .params
        .iter()
        .map(|param| match param.as_str() {
            "flag" => Ok(TemplateArg::Id(record.flag)),
            "event" => Ok(TemplateArg::Id(record.event_id)),
            "dest_map" => Ok(TemplateArg::MapBytes(map)),
            "dest_region" => Ok(TemplateArg::Id(record.region)),
            "gate_entity" => Ok(TemplateArg::Id(record.gate.entity)),
            other => Err(CompileError::malformed(
                "template parameter",
                format!("template '{name}' declares unknown parameter '{other}'"),
            )),
        })
        .collect()
}

pub fn inject_events(
    records: &[FogGateEvent],
    registry: &TemplateRegistry,
    store: &mut ContainerStore,
) -> CompileResult<()> {
    // The shared script container is touched on every build, even when
    // no trigger gate lands in it.
    store.script_mut(COMMON_SCRIPT);

    for record in records {
        let template_name = template_for(record.gate.kind);
        let args = args_for(registry, template_name, record)?;
        let event = registry.build_event(template_name, Some(record.event_id), &args)?;

        let script_name = owning_script(record);
        let script = store.script_mut(&script_name);
        register_into(script, event);
        script
            .init_event_mut()
            .instructions
            .push(codec::initialize_event(0, record.event_id, &[]));

        // Source side: make the gate exist.
        let gate_map = record.gate.map.to_string();
        let scene = store.scene_mut(&gate_map);
        if record.synthesize {
            let transform = record.gate.transform.as_ref().ok_or_else(|| {
                CompileError::malformed(
                    "fog entry",
                    format!("{}: synthesized gate without transform", record.describe()),
                )
            })?;
            scene.synthesize_gate(&record.gate.asset, record.gate.entity, transform);
        } else if !scene.enable_part(&record.gate.asset) {
            log::warn!(
                "{}: gate asset '{}' not present in scene {gate_map}",
                record.describe(),
                record.gate.asset
            );
        }

        // Destination side: a fresh spawn region near the entry gate.
        let position = record
            .entry
            .transform
            .as_ref()
            .map(|t| t.position)
            .unwrap_or([0.0; 3]);
        store
            .scene_mut(&record.dest_map.to_string())
            .add_region(record.region, position);
    }

    log::debug!("event injection: {} records injected", records.len());
    Ok(())
}
