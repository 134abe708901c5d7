//! Attack-graph computation over a multi-container application (see
//! `SPEC_FULL.md`): given a network topology, per-container vulnerability
//! scans, a CVE metadata catalog, precondition/postcondition rewrite
//! rules, and a privileged-access map, [`build_attack_graph`] produces the
//! directed multigraph of `(container, privilege)` states an external
//! attacker can reach.
//!
//! The crate has no file I/O and no process-wide configuration: every
//! input arrives as an explicit field of [`GraphRequest`]. Reading JSON
//! off disk is the job of the `attack-graph` binary (`src/bin/`), a thin
//! adapter over this library.

use std::collections::HashSet;
use std::time::{Duration, Instant};

use indexmap::{IndexMap, IndexSet};

pub mod catalog;
pub mod cpe;
pub mod cvss;
pub mod error;
pub mod exploitability;
pub mod graph;
pub mod normalize;
pub mod privilege;
pub mod reachability;
pub mod rules;
pub mod scan;
pub mod topology;

use catalog::{merge_catalog, parse_catalog_file, CatalogFile};
use error::{Diagnostic, DiagnosticKind, GraphError};
use exploitability::{build_exploitability_table, ContainerExploitability};
use normalize::normalize;
use rules::{load_postcondition_rules, load_precondition_rules, RawRule};
use scan::parse_scan_report;
use topology::{referenced_containers, PrivilegedAccessMap, Topology, DOCKER_HOST, OUTSIDE};

/// Every input the core needs to build one attack graph, taken as an
/// explicit value rather than read from global or process-wide state.
#[derive(Debug, Default, Clone)]
pub struct GraphRequest {
    /// `container -> [neighbors]`, including the reserved `outside` and
    /// `docker host` identifiers.
    pub topology: Topology,
    /// One raw scan-report JSON document per container that has one. A
    /// container present in `topology` but absent here is treated as
    /// having zero vulnerabilities (§7 kind 5), not as an error.
    pub scan_reports: IndexMap<String, String>,
    /// Zero or more raw CVE-catalog JSON documents, merged in order
    /// (first file wins on a duplicate CVE id).
    pub catalog_files: Vec<String>,
    /// Precondition rule set, keyed by an arbitrary rule label.
    pub precondition_rules: IndexMap<String, RawRule>,
    /// Postcondition rule set, keyed by an arbitrary rule label.
    pub postcondition_rules: IndexMap<String, RawRule>,
    /// `container -> bool`: true when the container can escalate to full
    /// host admin (the `privileged` flag, or a mounted host socket).
    pub privileged_access: PrivilegedAccessMap,
}

/// The computed attack graph plus diagnostics and timing telemetry (§6).
#[derive(Debug, Clone, Default)]
pub struct GraphResult {
    /// Rendered node strings, e.g. `"c1(VOS USER)"`.
    pub nodes: IndexSet<String>,
    /// `"src_node|dst_node" -> [label, ...]`, labels in BFS-visit order.
    pub edges: IndexMap<String, Vec<String>>,
    /// Non-fatal issues accumulated while building the graph (§7 kinds 1, 5).
    pub diagnostics: Vec<Diagnostic>,
    /// Wall-clock time spent parsing and normalizing catalog/scan input
    /// and building the exploitability tables.
    pub preprocessing_duration: Duration,
    /// Wall-clock time spent in the breadth-first reachability search.
    pub bfs_duration: Duration,
}

/// Builds the attack graph described by `request`.
///
/// Returns `Err(GraphError)` and aborts the build entirely for the fatal
/// error kinds of §7 (an unknown container, or an unknown privilege name
/// in a rule). Every other malformed-input case downgrades to a
/// [`Diagnostic`] on a successful [`GraphResult`].
pub fn build_attack_graph(request: GraphRequest) -> Result<GraphResult, GraphError> {
    validate_containers(&request.topology, &request.privileged_access)?;

    let preprocessing_start = Instant::now();
    let mut diagnostics = Vec::new();

    let catalog_files: Vec<CatalogFile> = request
        .catalog_files
        .iter()
        .enumerate()
        .filter_map(|(idx, raw)| {
            let label = format!("catalog[{idx}]");
            let (file, mut file_diagnostics) = parse_catalog_file(raw, &label);
            diagnostics.append(&mut file_diagnostics);
            file
        })
        .collect();
    let catalog = merge_catalog(&catalog_files);
    log::debug!("merged {} catalog files into {} entries", catalog_files.len(), catalog.len());

    let precondition_rules = {
        let (rules, mut rule_diagnostics) = load_precondition_rules(&request.precondition_rules)?;
        diagnostics.append(&mut rule_diagnostics);
        rules
    };
    let postcondition_rules = {
        let (rules, mut rule_diagnostics) = load_postcondition_rules(&request.postcondition_rules)?;
        diagnostics.append(&mut rule_diagnostics);
        rules
    };
    log::debug!(
        "loaded {} precondition rules and {} postcondition rules",
        precondition_rules.len(),
        postcondition_rules.len()
    );

    let mut exploitability: IndexMap<String, ContainerExploitability> = IndexMap::new();
    for container in request.topology.keys() {
        if container == OUTSIDE || container == DOCKER_HOST {
            continue;
        }

        let Some(raw_report) = request.scan_reports.get(container) else {
            diagnostics.push(Diagnostic::new(
                DiagnosticKind::MissingVulnerabilityFile,
                format!("container '{container}' has no vulnerability scan report"),
            ));
            exploitability.insert(container.clone(), ContainerExploitability::default());
            continue;
        };

        let (report, mut scan_diagnostics) = parse_scan_report(raw_report, container);
        diagnostics.append(&mut scan_diagnostics);
        let Some(report) = report else {
            exploitability.insert(container.clone(), ContainerExploitability::default());
            continue;
        };

        let (vulnerabilities, mut normalize_diagnostics) = normalize(&report, &catalog);
        diagnostics.append(&mut normalize_diagnostics);
        log::debug!("container '{container}' has {} normalized vulnerabilities", vulnerabilities.len());

        let table = build_exploitability_table(&vulnerabilities, &precondition_rules, &postcondition_rules);
        exploitability.insert(container.clone(), table);
    }

    let preprocessing_duration = preprocessing_start.elapsed();
    log::info!("preprocessing finished in {:?}", preprocessing_duration);

    let bfs_start = Instant::now();
    let mut assembler = graph::GraphAssembler::new();
    reachability::run(&request.topology, &exploitability, &request.privileged_access, &mut assembler);
    let bfs_duration = bfs_start.elapsed();
    log::info!("reachability search finished in {:?}", bfs_duration);

    let (nodes, edges) = assembler.into_parts();
    log::debug!("assembled {} nodes and {} edge keys", nodes.len(), edges.len());

    for diagnostic in &diagnostics {
        log::warn!("{diagnostic}");
    }

    Ok(GraphResult {
        nodes,
        edges,
        diagnostics,
        preprocessing_duration,
        bfs_duration,
    })
}

/// Fatal validation of §7 kind 2: every container named as a topology
/// neighbor, or as a key of the privileged-access map, must also be a
/// declared key of the topology.
fn validate_containers(
    topology: &Topology,
    privileged_access: &PrivilegedAccessMap,
) -> Result<(), GraphError> {
    let declared: HashSet<&str> = topology.keys().map(String::as_str).collect();

    for (container, referenced_in) in referenced_containers(topology, privileged_access) {
        if !declared.contains(container) {
            return Err(GraphError::UnknownContainer {
                container: container.to_string(),
                referenced_in,
            });
        }
    }

    Ok(())
}

/// The five canonical privilege-name strings, re-exported for callers that
/// serialize `GraphResult` without depending on [`privilege::Privilege`]
/// directly.
pub const PRIVILEGE_NAMES: [&str; 5] = [
    "NONE",
    "VOS_USER",
    "VOS_ADMIN",
    "USER",
    "ADMIN",
];

#[cfg(test)]
mod tests {
    use super::*;

    fn topology_with(pairs: &[(&str, &[&str])]) -> Topology {
        let mut topology = Topology::new();
        for (container, neighbors) in pairs {
            topology.insert(
                container.to_string(),
                neighbors.iter().map(|n| n.to_string()).collect(),
            );
        }
        topology
    }

    #[test]
    fn empty_attacker_scope_yields_an_empty_result() {
        let request = GraphRequest {
            topology: topology_with(&[(OUTSIDE, &[])]),
            ..Default::default()
        };
        let result = build_attack_graph(request).unwrap();
        assert!(result.nodes.is_empty());
        assert!(result.edges.is_empty());
    }

    #[test]
    fn unknown_container_in_topology_neighbor_is_fatal() {
        let request = GraphRequest {
            topology: topology_with(&[(OUTSIDE, &["ghost"])]),
            ..Default::default()
        };
        let err = build_attack_graph(request).unwrap_err();
        assert!(matches!(err, GraphError::UnknownContainer { container, .. } if container == "ghost"));
    }

    #[test]
    fn unknown_container_in_privileged_access_map_is_fatal() {
        let mut privileged_access = PrivilegedAccessMap::new();
        privileged_access.insert("ghost".to_string(), true);
        let request = GraphRequest {
            topology: topology_with(&[(OUTSIDE, &[])]),
            privileged_access,
            ..Default::default()
        };
        let err = build_attack_graph(request).unwrap_err();
        assert!(matches!(err, GraphError::UnknownContainer { container, .. } if container == "ghost"));
    }

    #[test]
    fn missing_scan_report_is_a_diagnostic_not_an_error() {
        let request = GraphRequest {
            topology: topology_with(&[(OUTSIDE, &["c1"]), ("c1", &[OUTSIDE])]),
            ..Default::default()
        };
        let result = build_attack_graph(request).unwrap();
        assert!(result
            .diagnostics
            .iter()
            .any(|d| d.kind == DiagnosticKind::MissingVulnerabilityFile));
    }

    #[test]
    fn unknown_privilege_name_in_a_rule_is_fatal() {
        let mut precondition_rules = IndexMap::new();
        precondition_rules.insert(
            "rule-1".to_string(),
            RawRule {
                cpe: "unknown".to_string(),
                vocabulary: Some(vec!["?".to_string()]),
                access_vector: None,
                authentication: None,
                access_complexity: None,
                impacts: None,
                precondition: Some("SUPERUSER".to_string()),
                postcondition: None,
            },
        );
        let request = GraphRequest {
            topology: topology_with(&[(OUTSIDE, &[])]),
            precondition_rules,
            ..Default::default()
        };
        let err = build_attack_graph(request).unwrap_err();
        assert!(matches!(err, GraphError::UnknownPrivilegeName { .. }));
    }

    #[test]
    fn clique_end_to_end_through_the_public_entry_point() {
        let mut precondition_rules = IndexMap::new();
        precondition_rules.insert(
            "any".to_string(),
            RawRule {
                cpe: "unknown".to_string(),
                vocabulary: Some(vec!["?".to_string()]),
                access_vector: None,
                authentication: None,
                access_complexity: None,
                impacts: None,
                precondition: Some("NONE".to_string()),
                postcondition: None,
            },
        );
        let mut postcondition_rules = IndexMap::new();
        postcondition_rules.insert(
            "rce".to_string(),
            RawRule {
                cpe: "unknown".to_string(),
                vocabulary: Some(vec!["remote code execution".to_string()]),
                access_vector: None,
                authentication: None,
                access_complexity: None,
                impacts: Some("ALL_COMPLETE".to_string()),
                precondition: None,
                postcondition: Some("ADMIN".to_string()),
            },
        );

        let scan_json = |name: &str| {
            serde_json::json!({
                "Layers": [{"Layer": {"Features": [{"Vulnerabilities": [{
                    "Name": name,
                    "Description": "a remote code execution flaw",
                    "Metadata": {"NVD": {"CVSSv2": {"Vectors": "AV:N/AC:L/Au:N/C:C/I:C"}}}
                }]}]}}]
            })
            .to_string()
        };

        let mut scan_reports = IndexMap::new();
        scan_reports.insert("c1".to_string(), scan_json("CVE-2020-0001"));

        let request = GraphRequest {
            topology: topology_with(&[(OUTSIDE, &["c1"]), ("c1", &[OUTSIDE])]),
            scan_reports,
            precondition_rules,
            postcondition_rules,
            ..Default::default()
        };

        let result = build_attack_graph(request).unwrap();
        assert!(result.nodes.contains("outside(ADMIN)"));
        assert!(result.nodes.contains("c1(ADMIN)"));
        assert_eq!(result.edges["outside(ADMIN)|c1(ADMIN)"], vec!["CVE-2020-0001".to_string()]);
    }
}
