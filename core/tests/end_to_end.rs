//! Whole-pipeline compilation over a small three-node world.

use fogweave_core::alloc::FLAG_BASE;
use fogweave_core::codec::{self, Field};
use fogweave_core::compiler::{CompileInputs, CompileOutput, Compiler};
use fogweave_core::model::{
    ClusterRow, ClusterTable, Edge, FogEntry, FogTable, GateKind, GraphDoc, Node, ZoneMaps,
};
use fogweave_core::scaling::{EffectRow, ScalingConfig, StatBand};
use fogweave_core::scene::{PartKind, SceneDoc, ScenePart};
use fogweave_core::store::ContainerStore;
use fogweave_core::templates::{EventTemplate, TemplateTable};
use fogweave_core::types::{FlagId, MapId, COMMON_SCRIPT, SHARED_PARAMS};
use std::collections::BTreeSet;

const M10: &str = "m10_00_00_00"; // start
const M11: &str = "m11_00_00_00"; // mid
const M50: &str = "m50_00_00_00"; // boss

fn map(name: &str) -> MapId {
    name.parse().unwrap()
}

fn gate(fog: &str, map_name: &str, entity: u32, zone: &str) -> FogEntry {
    FogEntry {
        fog_id: fog.to_string(),
        map: map(map_name),
        entity,
        asset: format!("o{fog}"),
        kind: GateKind::Gate,
        zone: Some(zone.to_string()),
        transform: None,
    }
}

fn enemy(name: &str, entity: u32) -> ScenePart {
    ScenePart {
        name: name.to_string(),
        kind: PartKind::Enemy,
        entity_id: entity,
        npc_id: 2000,
        group_ids: vec![],
        collision_part: None,
        transform: None,
        enabled: true,
    }
}

fn templates() -> TemplateTable {
    TemplateTable {
        templates: vec![EventTemplate {
            id: 950,
            name: "fog_gate_warp".to_string(),
            restart: false,
            params: vec![
                "dest_map".to_string(),
                "dest_region".to_string(),
                "gate_entity".to_string(),
            ],
            instructions: vec![
                "3[02] 5, $gate_entity".to_string(),
                "2003[14] $dest_map, $dest_region".to_string(),
            ],
        }],
    }
}

/// 3 nodes: tier-1 start, tier-1 mid, tier-5 boss. Both edges enter the
/// boss map from different source maps.
fn world() -> CompileInputs {
    let graph = GraphDoc {
        schema_version: Some("3".to_string()),
        nodes: vec![
            Node { id: 1, zones: vec!["start".to_string()], tier: 1, cluster: 1 },
            Node { id: 2, zones: vec!["mid".to_string()], tier: 1, cluster: 1 },
            Node { id: 3, zones: vec!["boss".to_string()], tier: 5, cluster: 2 },
        ],
        edges: vec![
            Edge { source: 1, target: 3, fog_id: "f_s".to_string(), exit_entity: None },
            Edge { source: 2, target: 3, fog_id: "f_m".to_string(), exit_entity: None },
        ],
    };
    let fog_table = FogTable {
        entries: vec![
            gate("f_s", M10, 1000, "start"),
            gate("f_s", M50, 3000, "boss"),
            gate("f_m", M11, 1100, "mid"),
            gate("f_m", M50, 3001, "boss"),
        ],
    };
    let mut zone_maps = ZoneMaps::default();
    let mut clusters = ClusterTable::default();
    for (zone, map_name) in [("start", M10), ("mid", M11), ("boss", M50)] {
        zone_maps.zones.insert(zone.to_string(), vec![map(map_name)]);
        clusters.rows.push(ClusterRow {
            zones: vec![zone.to_string()],
            map: map(map_name),
        });
    }

    let scaling = ScalingConfig {
        tier_count: 5,
        effect_base_id: 7_000_000,
        template: EffectRow {
            id: 0,
            hp_rate: 1.0,
            stamina_rate: 1.0,
            attack_rates: [1.0; 5],
            defense_rates: [1.0; 5],
            drop_rate: 1.0,
        },
        health: StatBand { min: 1.0, max: 8.0 },
        stamina: StatBand { min: 1.0, max: 4.0 },
        attack: StatBand { min: 1.0, max: 6.0 },
        defense: StatBand { min: 1.0, max: 2.0 },
        drops: StatBand { min: 1.0, max: 10.0 },
        vanilla_tiers: [
            ("start".to_string(), 1),
            ("mid".to_string(), 1),
            ("boss".to_string(), 1),
        ]
        .into(),
        zone_groups: Default::default(),
        collision_zones: Default::default(),
        map_zones: [
            (M10.to_string(), "start".to_string()),
            (M50.to_string(), "boss".to_string()),
        ]
        .into(),
    };

    let mut store = ContainerStore::new();
    let mut boss_scene = SceneDoc::default();
    boss_scene.parts.push(enemy("knight_a", 0));
    boss_scene.parts.push(enemy("knight_b", 0));
    boss_scene.parts.push(enemy("boss_lord", 5000));
    store.insert_scene(M50, boss_scene);
    let mut start_scene = SceneDoc::default();
    start_scene.parts.push(enemy("hollow", 0));
    store.insert_scene(M10, start_scene);

    CompileInputs {
        graph,
        fog_table,
        clusters,
        zone_maps,
        templates: templates(),
        scaling,
        store,
    }
}

fn all_set_flags(output: &CompileOutput) -> BTreeSet<FlagId> {
    let mut flags = BTreeSet::new();
    for script in output.store.scripts.values() {
        for event in script.events.values() {
            for ins in &event.instructions {
                if codec::SET_EVENT_FLAG.matches(ins) {
                    flags.insert(
                        codec::read_u32(&ins.args, Field { offset: 0, width: 4 }).unwrap(),
                    );
                }
            }
        }
    }
    flags
}

/// 2 structurally-required flags compile to exactly 2 distinct flags,
/// and the report matches what was actually injected.
#[test]
fn two_required_flags_yield_two_distinct_flags() {
    let output = Compiler::run(world()).unwrap();
    let report = &output.report;

    assert_eq!(report.edges_total, 2);
    assert_eq!(report.edges_dropped, 0);
    assert_eq!(report.flag_zones.len(), 2);
    assert!(report.flag_zones.values().all(|z| z == "boss"));

    let injected = all_set_flags(&output);
    let reported: BTreeSet<FlagId> = report.flag_zones.keys().copied().collect();
    assert_eq!(injected, reported, "report and injected flags diverge");
    assert_eq!(reported, BTreeSet::from([FLAG_BASE, FLAG_BASE + 1]));
}

/// Every boss-zone enemy with vanilla tier 1 receives exactly one
/// tier-1→tier-5 effect application; the tier-1 start enemy gets none.
#[test]
fn boss_zone_enemies_scale_once() {
    let output = Compiler::run(world()).unwrap();
    assert_eq!(output.report.scaling.applied, 3);
    assert_eq!(output.report.scaling.zero_delta, 1);

    // (1,5) is the fourth transition enumerated from tier 1.
    let expected_effect = 7_000_000 + 3;
    let applications: Vec<u32> = output
        .store
        .script(M50)
        .unwrap()
        .get(0)
        .unwrap()
        .instructions
        .iter()
        .filter(|i| codec::APPLY_EFFECT_TO_ENTITY.matches(i))
        .map(|i| codec::read_u32(&i.args, Field { offset: 4, width: 4 }).unwrap())
        .collect();
    assert_eq!(applications, vec![expected_effect; 3]);

    let start_applications = output
        .store
        .script(M10)
        .unwrap()
        .events
        .values()
        .flat_map(|e| &e.instructions)
        .filter(|i| codec::APPLY_EFFECT_TO_ENTITY.matches(i))
        .count();
    assert_eq!(start_applications, 0);
}

/// Both shared containers are part of every build's output, and the
/// effect rows serialize ascending.
#[test]
fn shared_containers_always_touched() {
    let output = Compiler::run(world()).unwrap();
    let touched = &output.report.touched;
    assert!(touched.iter().any(|t| t == COMMON_SCRIPT));
    assert!(touched.iter().any(|t| t == SHARED_PARAMS));
    assert!(touched.iter().any(|t| t == M10));
    assert!(touched.iter().any(|t| t == M11));
    assert!(touched.iter().any(|t| t == M50));

    assert_eq!(output.store.effects.len(), 20);
    assert!(output.store.effects.windows(2).all(|w| w[0].id < w[1].id));
}

/// An old schema version warns but compiles when required fields are
/// present.
#[test]
fn old_schema_version_warns_not_fails() {
    let mut inputs = world();
    inputs.graph.schema_version = Some("2".to_string());
    assert!(Compiler::run(inputs).is_ok());
}

/// An edge with an unresolvable fog identifier is dropped alone; the
/// rest of the build survives.
#[test]
fn unresolvable_edge_is_dropped_not_fatal() {
    let mut inputs = world();
    inputs.graph.edges.push(Edge {
        source: 1,
        target: 2,
        fog_id: "missing_fog".to_string(),
        exit_entity: None,
    });
    let output = Compiler::run(inputs).unwrap();
    assert_eq!(output.report.edges_total, 3);
    assert_eq!(output.report.edges_dropped, 1);
    assert_eq!(output.report.flag_zones.len(), 2);
}
