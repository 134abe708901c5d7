//! Thin CLI adapter over `attack_graph_engine` (SPEC_FULL.md §0): reads the
//! JSON interfaces of spec §6 from a directory and prints the resulting
//! graph. All file I/O and argument parsing lives here; the library crate
//! has none of it.

use std::fs;
use std::path::{Path, PathBuf};

use attack_graph_engine::rules::RawRule;
use attack_graph_engine::topology::{PrivilegedAccessMap, Topology};
use attack_graph_engine::{build_attack_graph, GraphRequest};
use clap::Parser;
use indexmap::IndexMap;
use thiserror::Error;

/// Computes an attack graph from a directory of JSON input files.
#[derive(Parser, Debug)]
#[command(name = "attack-graph", version, about)]
struct Cli {
    /// Directory containing topology.json, privileged_access.json,
    /// precondition_rules.json, postcondition_rules.json, a `catalog/`
    /// subdirectory of CVE catalog files, and a `scans/` subdirectory of
    /// per-container vulnerability reports named `<container>.json`.
    #[arg(value_name = "INPUT_DIR")]
    input_dir: PathBuf,

    /// Pretty-print the JSON output.
    #[arg(long)]
    pretty: bool,
}

#[derive(Debug, Error)]
enum CliError {
    #[error("failed to read '{path}': {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("failed to parse '{path}': {source}")]
    Json {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },
    #[error(transparent)]
    Graph(#[from] attack_graph_engine::error::GraphError),
}

fn read_to_string(path: &Path) -> Result<String, CliError> {
    fs::read_to_string(path).map_err(|source| CliError::Io {
        path: path.to_path_buf(),
        source,
    })
}

fn read_json<T: serde::de::DeserializeOwned>(path: &Path) -> Result<T, CliError> {
    let contents = read_to_string(path)?;
    serde_json::from_str(&contents).map_err(|source| CliError::Json {
        path: path.to_path_buf(),
        source,
    })
}

/// Reads every `*.json` file in `dir` (if it exists) and returns its raw
/// text, sorted by file name for deterministic catalog-merge ordering.
fn read_raw_json_dir(dir: &Path) -> Result<Vec<(String, String)>, CliError> {
    if !dir.is_dir() {
        return Ok(Vec::new());
    }

    let mut entries: Vec<PathBuf> = fs::read_dir(dir)
        .map_err(|source| CliError::Io {
            path: dir.to_path_buf(),
            source,
        })?
        .filter_map(|entry| entry.ok())
        .map(|entry| entry.path())
        .filter(|path| path.extension().map(|ext| ext == "json").unwrap_or(false))
        .collect();
    entries.sort();

    entries
        .into_iter()
        .map(|path| {
            let contents = read_to_string(&path)?;
            let name = path
                .file_stem()
                .map(|s| s.to_string_lossy().into_owned())
                .unwrap_or_default();
            Ok((name, contents))
        })
        .collect()
}

fn load_request(input_dir: &Path) -> Result<GraphRequest, CliError> {
    let topology: Topology = read_json(&input_dir.join("topology.json"))?;

    let privileged_access: PrivilegedAccessMap = {
        let path = input_dir.join("privileged_access.json");
        if path.is_file() {
            read_json(&path)?
        } else {
            PrivilegedAccessMap::new()
        }
    };

    let precondition_rules: IndexMap<String, RawRule> =
        read_json(&input_dir.join("precondition_rules.json"))?;
    let postcondition_rules: IndexMap<String, RawRule> =
        read_json(&input_dir.join("postcondition_rules.json"))?;

    let catalog_files: Vec<String> = read_raw_json_dir(&input_dir.join("catalog"))?
        .into_iter()
        .map(|(_, contents)| contents)
        .collect();

    let scan_reports: IndexMap<String, String> = read_raw_json_dir(&input_dir.join("scans"))?
        .into_iter()
        .collect();

    Ok(GraphRequest {
        topology,
        scan_reports,
        catalog_files,
        precondition_rules,
        postcondition_rules,
        privileged_access,
    })
}

fn run(input_dir: &Path) -> Result<attack_graph_engine::GraphResult, CliError> {
    let request = load_request(input_dir)?;
    Ok(build_attack_graph(request)?)
}

fn main() -> anyhow::Result<()> {
    env_logger::init();
    let cli = Cli::parse();

    let result = run(&cli.input_dir)?;

    log::info!(
        "preprocessing={:?} bfs={:?} diagnostics={}",
        result.preprocessing_duration,
        result.bfs_duration,
        result.diagnostics.len()
    );
    for diagnostic in &result.diagnostics {
        log::warn!("{diagnostic}");
    }

    let output = serde_json::json!({
        "nodes": result.nodes,
        "edges": result.edges,
    });

    if cli.pretty {
        println!("{}", serde_json::to_string_pretty(&output)?);
    } else {
        println!("{}", serde_json::to_string(&output)?);
    }

    Ok(())
}
