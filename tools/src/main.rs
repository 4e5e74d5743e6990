//! fogweave-build: headless build driver for the fogweave compiler.
//!
//! Usage:
//!   fogweave-build --data-dir ./data --out ./out
//!   fogweave-build --data-dir ./data --dry-run
//!
//! The driver owns all disk I/O: it loads the graph, the lookup tables,
//! and the base containers, runs one compilation, and writes each
//! touched container out once. The core never touches the filesystem.

use anyhow::{Context, Result};
use fogweave_core::{
    compiler::{CompileInputs, Compiler},
    model::{ClusterTable, FogTable, GraphDoc, ZoneMaps},
    scaling::ScalingConfig,
    scene::SceneDoc,
    script::EventScript,
    store::ContainerStore,
    templates::TemplateTable,
    types::SHARED_PARAMS,
};
use serde::de::DeserializeOwned;
use std::env;
use std::fs;
use std::path::{Path, PathBuf};

fn main() -> Result<()> {
    env_logger::init();

    let args: Vec<String> = env::args().collect();
    let data_dir = arg_value(&args, "--data-dir").unwrap_or_else(|| "./data".to_string());
    let out_dir = arg_value(&args, "--out").unwrap_or_else(|| "./out".to_string());
    let dry_run = args.iter().any(|a| a == "--dry-run");

    println!("fogweave-build");
    println!("  data_dir: {data_dir}");
    println!("  out:      {out_dir}");
    println!("  started:  {}", chrono::Local::now().format("%Y-%m-%d %H:%M:%S"));
    println!();

    let data = Path::new(&data_dir);
    let inputs = CompileInputs {
        graph: load_json::<GraphDoc>(&data.join("graph.json"))?,
        fog_table: load_json::<FogTable>(&data.join("fog_table.json"))?,
        clusters: load_json::<ClusterTable>(&data.join("clusters.json"))?,
        zone_maps: load_json::<ZoneMaps>(&data.join("zone_maps.json"))?,
        templates: load_json::<TemplateTable>(&data.join("templates.json"))?,
        scaling: load_json::<ScalingConfig>(&data.join("scaling.json"))?,
        store: load_store(data)?,
    };

    let output = Compiler::run(inputs).context("compilation failed; no output written")?;
    let report = &output.report;

    if !dry_run {
        write_store(Path::new(&out_dir), &output)?;
        let mapping = serde_json::to_string_pretty(&report.flag_zones)?;
        fs::write(Path::new(&out_dir).join("flag_zones.json"), mapping)
            .context("writing flag_zones.json")?;
    }

    println!("Build complete.");
    println!("  edges:          {} ({} dropped)", report.edges_total, report.edges_dropped);
    println!("  flags assigned: {}", report.flag_zones.len());
    println!("  warp sites:     {} tagged, {} skipped", report.assigned_sites, report.skipped_sites);
    println!(
        "  scaling:        {} applied, {} no-zone, {} zero-delta, {} no-effect",
        report.scaling.applied, report.scaling.no_zone, report.scaling.zero_delta, report.scaling.no_effect
    );
    println!("  containers:     {} touched", report.touched.len());
    Ok(())
}

fn arg_value(args: &[String], flag: &str) -> Option<String> {
    args.windows(2)
        .find(|w| w[0] == flag)
        .map(|w| w[1].clone())
}

fn load_json<T: DeserializeOwned>(path: &Path) -> Result<T> {
    let text = fs::read_to_string(path).with_context(|| format!("reading {}", path.display()))?;
    serde_json::from_str(&text).with_context(|| format!("parsing {}", path.display()))
}

/// Container documents live under `scripts/` and `scenes/`, one JSON
/// file per container, named by container name.
fn load_store(data: &Path) -> Result<ContainerStore> {
    let mut store = ContainerStore::new();
    for path in json_files(&data.join("scripts"))? {
        let name = container_name(&path)?;
        store.insert_script(&name, load_json::<EventScript>(&path)?);
    }
    for path in json_files(&data.join("scenes"))? {
        let name = container_name(&path)?;
        store.insert_scene(&name, load_json::<SceneDoc>(&path)?);
    }
    log::debug!(
        "loaded {} script and {} scene containers",
        store.scripts.len(),
        store.scenes.len()
    );
    Ok(store)
}

fn write_store(out: &Path, output: &fogweave_core::compiler::CompileOutput) -> Result<()> {
    fs::create_dir_all(out.join("scripts"))?;
    fs::create_dir_all(out.join("scenes"))?;
    // Touched names are already sorted; bytes never depend on write order.
    for name in &output.report.touched {
        if let Some(script) = output.store.script(name) {
            let path = out.join("scripts").join(format!("{name}.json"));
            fs::write(&path, serde_json::to_string_pretty(script)?)
                .with_context(|| format!("writing {}", path.display()))?;
        }
        if let Some(scene) = output.store.scene(name) {
            let path = out.join("scenes").join(format!("{name}.json"));
            fs::write(&path, serde_json::to_string_pretty(scene)?)
                .with_context(|| format!("writing {}", path.display()))?;
        }
        if name == SHARED_PARAMS {
            let path = out.join(format!("{name}.json"));
            fs::write(&path, serde_json::to_string_pretty(&output.store.effects)?)
                .with_context(|| format!("writing {}", path.display()))?;
        }
    }
    Ok(())
}

fn json_files(dir: &Path) -> Result<Vec<PathBuf>> {
    let mut files = Vec::new();
    if !dir.is_dir() {
        return Ok(files);
    }
    for entry in fs::read_dir(dir).with_context(|| format!("listing {}", dir.display()))? {
        let path = entry?.path();
        if path.extension().is_some_and(|e| e == "json") {
            files.push(path);
        }
    }
    files.sort();
    Ok(files)
}

fn container_name(path: &Path) -> Result<String> {
    path.file_stem()
        .and_then(|s| s.to_str())
        .map(str::to_string)
        .context("container file has no valid name")
}
