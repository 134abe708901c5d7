//! The Attack-Vector Catalog (§4.2): merges global CVE metadata files into
//! a per-CVE record of attack vector, description, and CPE class.
//!
//! JSON shapes mirror the legacy NVD `nvdcve-*.json` feed format
//! (`CVE_Items[*]`).

use indexmap::IndexMap;
use serde::Deserialize;

use crate::cpe::CpeClass;
use crate::error::{Diagnostic, DiagnosticKind};

#[derive(Debug, Deserialize)]
pub struct CatalogFile {
    #[serde(rename = "CVE_Items")]
    pub cve_items: Vec<CveItem>,
}

#[derive(Debug, Deserialize)]
pub struct CveItem {
    pub cve: CveMeta,
    pub impact: ImpactField,
    #[serde(default)]
    pub configurations: Option<Configurations>,
}

#[derive(Debug, Deserialize)]
pub struct CveMeta {
    #[serde(rename = "CVE_data_meta")]
    pub data_meta: CveDataMeta,
    pub description: Description,
}

#[derive(Debug, Deserialize)]
pub struct CveDataMeta {
    #[serde(rename = "ID")]
    pub id: String,
}

#[derive(Debug, Deserialize)]
pub struct Description {
    pub description_data: Vec<DescriptionDatum>,
}

#[derive(Debug, Deserialize)]
pub struct DescriptionDatum {
    pub value: String,
}

#[derive(Debug, Deserialize)]
pub struct ImpactField {
    #[serde(rename = "baseMetricV2")]
    pub base_metric_v2: Option<BaseMetricV2>,
}

#[derive(Debug, Deserialize)]
pub struct BaseMetricV2 {
    #[serde(rename = "cvssV2")]
    pub cvss_v2: CvssV2Fields,
}

#[derive(Debug, Deserialize)]
pub struct CvssV2Fields {
    #[serde(rename = "vectorString")]
    pub vector_string: String,
}

#[derive(Debug, Deserialize)]
pub struct Configurations {
    pub nodes: Vec<ConfigNode>,
}

#[derive(Debug, Deserialize)]
pub struct ConfigNode {
    #[serde(default)]
    pub cpe: Option<Vec<CpeEntry>>,
    #[serde(default)]
    pub children: Option<Vec<ConfigNode>>,
}

#[derive(Debug, Deserialize)]
pub struct CpeEntry {
    #[serde(rename = "cpe22Uri")]
    pub cpe22_uri: String,
}

/// A catalog entry merged from one or more catalog files.
#[derive(Debug, Clone)]
pub struct CatalogEntry {
    pub attack_vector_string: String,
    pub description: String,
    pub cpe_class: CpeClass,
}

/// Merges a list of catalog files into a single `cve_id -> CatalogEntry`
/// table, in the order the files and their entries are given (§5
/// ordering guarantees). When the same CVE id appears in more than one
/// file, the first occurrence wins (§3 decision, see DESIGN.md).
///
/// An entry with no `baseMetricV2` is skipped entirely (§4.2 extraction
/// policy) and is not a diagnostic: it is not a malformed entry, just one
/// this catalog cannot classify.
pub fn merge_catalog(files: &[CatalogFile]) -> IndexMap<String, CatalogEntry> {
    let mut catalog = IndexMap::new();

    for file in files {
        for item in &file.cve_items {
            let Some(base_metric_v2) = &item.impact.base_metric_v2 else {
                continue;
            };

            let id = item.cve.data_meta.id.clone();
            if catalog.contains_key(&id) {
                continue;
            }

            let description = item
                .cve
                .description
                .description_data
                .first()
                .map(|d| d.value.clone())
                .unwrap_or_default();

            let cpe_class = first_cpe_uri(item.configurations.as_ref())
                .map(|uri| CpeClass::from_cpe22_uri(&uri))
                .unwrap_or(CpeClass::Unknown);

            catalog.insert(
                id,
                CatalogEntry {
                    attack_vector_string: base_metric_v2.cvss_v2.vector_string.clone(),
                    description,
                    cpe_class,
                },
            );
        }
    }

    catalog
}

/// Finds the first CPE URI in the configuration nodes, falling back to
/// the first child's CPE when the node itself has none (§4.2).
fn first_cpe_uri(configurations: Option<&Configurations>) -> Option<String> {
    let nodes = &configurations?.nodes;
    for node in nodes {
        if let Some(cpes) = &node.cpe {
            if let Some(first) = cpes.first() {
                return Some(first.cpe22_uri.clone());
            }
        }
        if let Some(children) = &node.children {
            if let Some(child) = children.first() {
                if let Some(cpes) = &child.cpe {
                    if let Some(first) = cpes.first() {
                        return Some(first.cpe22_uri.clone());
                    }
                }
            }
        }
    }
    None
}

/// Parses a single catalog file's raw JSON bytes, reporting a diagnostic
/// and returning `None` on malformed input rather than failing the whole
/// build (§7 kind 1).
pub fn parse_catalog_file(bytes: &str, source_label: &str) -> (Option<CatalogFile>, Vec<Diagnostic>) {
    match serde_json::from_str::<CatalogFile>(bytes) {
        Ok(file) => (Some(file), Vec::new()),
        Err(err) => (
            None,
            vec![Diagnostic::new(
                DiagnosticKind::MalformedCatalogEntry,
                format!("catalog file '{source_label}' could not be parsed: {err}"),
            )],
        ),
    }
}
