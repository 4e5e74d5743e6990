//! The compilation driver.
//!
//! STAGE ORDER (fixed, documented, never reordered):
//!   1. Graph schema check, template validation
//!   2. Fog gate resolution        (edges → records)
//!   3. Event injection            (records → instruction streams)
//!   4. Zone-tracking flag ladder  (warp sites → flags)
//!   5. Scaling tier generation    (effect rows + per-actor application)
//!
//! RULES:
//!   - Single-threaded, single pass; no stage re-runs.
//!   - Every fresh id comes from the one IdAllocator instance.
//!   - The store is only handed back on full success; any fatal error
//!     aborts with no output committed.

use crate::alloc::IdAllocator;
use crate::error::CompileResult;
use crate::flags;
use crate::gates;
use crate::model::{ClusterTable, FogTable, GraphDoc, ZoneMaps};
use crate::scaling::{self, ScalingConfig, ScalingCounters};
use crate::store::ContainerStore;
use crate::templates::{TemplateRegistry, TemplateTable};
use crate::types::FlagId;
use crate::{build, types};
use std::collections::BTreeMap;

pub struct CompileInputs {
    pub graph: GraphDoc,
    pub fog_table: FogTable,
    pub clusters: ClusterTable,
    pub zone_maps: ZoneMaps,
    pub templates: TemplateTable,
    pub scaling: ScalingConfig,
    pub store: ContainerStore,
}

#[derive(Debug)]
pub struct CompileReport {
    /// Flag → target zone, consistent with what was actually injected.
    pub flag_zones: BTreeMap<FlagId, String>,
    pub edges_total: usize,
    pub edges_dropped: u32,
    pub assigned_sites: u32,
    pub skipped_sites: u32,
    pub scaling: ScalingCounters,
    pub touched: Vec<String>,
}

#[derive(Debug)]
pub struct CompileOutput {
    pub store: ContainerStore,
    pub report: CompileReport,
}

pub struct Compiler;

impl Compiler {
    /// One whole compilation run. Consumes the loaded store; the caller
    /// only ever sees patched containers on `Ok`.
    pub fn run(inputs: CompileInputs) -> CompileResult<CompileOutput> {
        let CompileInputs {
            graph,
            fog_table,
            clusters,
            zone_maps,
            templates,
            scaling,
            store: mut scratch,
        } = inputs;

        graph.warn_on_schema_drift();
        let registry = TemplateRegistry::from_table(templates);
        let mut alloc = IdAllocator::new();

        log::info!("stage 2: fog gate resolution ({} edges)", graph.edges.len());
        let (records, edges_dropped) =
            gates::resolve_edges(&graph, &fog_table, &clusters, &mut alloc)?;

        // Every referenced template must exist before codegen begins.
        registry.validate_references(build::referenced_templates(&records))?;

        log::info!("stage 3: event injection ({} records)", records.len());
        build::inject_events(&records, &registry, &mut scratch)?;

        log::info!("stage 4: zone-tracking flag ladder");
        let assignments = flags::assign_flags(&records, &zone_maps, &mut scratch)?;

        log::info!("stage 5: scaling tier generation");
        let book = scaling::build_tier_book(&scaling)?;
        scratch.install_effects(book.rows.clone());
        let counters = scaling::apply_scaling(&graph, &scaling, &book, &mut alloc, &mut scratch)?;

        // The shared containers are part of every build's output.
        debug_assert!(scratch.touched().iter().any(|t| t == types::COMMON_SCRIPT));
        debug_assert!(scratch.touched().iter().any(|t| t == types::SHARED_PARAMS));

        let report = CompileReport {
            flag_zones: assignments.flag_zones,
            edges_total: graph.edges.len(),
            edges_dropped,
            assigned_sites: assignments.assigned_sites,
            skipped_sites: assignments.skipped_sites,
            scaling: counters,
            touched: scratch.touched(),
        };
        Ok(CompileOutput {
            store: scratch,
            report,
        })
    }
}
