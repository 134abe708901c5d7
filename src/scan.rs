//! Per-container vulnerability scan report ingestion (§4.3 step 1,
//! input shape from §6): `Layers[*].Layer.Features[*].Vulnerabilities[*]`.

use indexmap::IndexMap;
use serde::Deserialize;

use crate::error::{Diagnostic, DiagnosticKind};

#[derive(Debug, Deserialize)]
pub struct ScanReport {
    #[serde(rename = "Layers")]
    pub layers: Vec<LayerWrapper>,
}

#[derive(Debug, Deserialize)]
pub struct LayerWrapper {
    #[serde(rename = "Layer")]
    pub layer: Layer,
}

#[derive(Debug, Deserialize)]
pub struct Layer {
    #[serde(rename = "Features")]
    pub features: Vec<Feature>,
}

#[derive(Debug, Deserialize)]
pub struct Feature {
    #[serde(rename = "Vulnerabilities", default)]
    pub vulnerabilities: Vec<ScanVulnerability>,
}

#[derive(Debug, Deserialize)]
pub struct ScanVulnerability {
    #[serde(rename = "Name")]
    pub name: String,
    #[serde(rename = "Description", default)]
    pub description: Option<String>,
    #[serde(rename = "Metadata", default)]
    pub metadata: Option<ScanMetadata>,
}

#[derive(Debug, Deserialize)]
pub struct ScanMetadata {
    #[serde(rename = "NVD", default)]
    pub nvd: Option<NvdMetadata>,
}

#[derive(Debug, Deserialize)]
pub struct NvdMetadata {
    #[serde(rename = "CVSSv2", default)]
    pub cvss_v2: Option<CvssV2Metadata>,
}

#[derive(Debug, Deserialize)]
pub struct CvssV2Metadata {
    #[serde(rename = "Vectors", default)]
    pub vectors: Option<String>,
}

/// A vulnerability as it exists right after being pulled out of the scan
/// report's nested structure, before merging with the catalog (§4.3 step 1).
#[derive(Debug, Clone)]
pub struct CleanedVulnerability {
    pub description: Option<String>,
    pub attack_vector_string: Option<String>,
}

/// Walks the report and deduplicates by `Name`, keeping the first
/// occurrence encountered and preserving that encounter order (§5
/// ordering guarantees).
pub fn clean(report: &ScanReport) -> IndexMap<String, CleanedVulnerability> {
    let mut cleaned = IndexMap::new();

    for layer_wrapper in &report.layers {
        for feature in &layer_wrapper.layer.features {
            for vulnerability in &feature.vulnerabilities {
                if cleaned.contains_key(&vulnerability.name) {
                    continue;
                }

                let attack_vector_string = vulnerability
                    .metadata
                    .as_ref()
                    .and_then(|m| m.nvd.as_ref())
                    .and_then(|n| n.cvss_v2.as_ref())
                    .and_then(|c| c.vectors.clone());

                cleaned.insert(
                    vulnerability.name.clone(),
                    CleanedVulnerability {
                        description: vulnerability.description.clone(),
                        attack_vector_string,
                    },
                );
            }
        }
    }

    cleaned
}

/// Parses a single container's raw scan-report JSON bytes, reporting a
/// diagnostic and returning `None` on malformed input rather than failing
/// the whole build (§7 kind 1).
pub fn parse_scan_report(bytes: &str, container: &str) -> (Option<ScanReport>, Vec<Diagnostic>) {
    match serde_json::from_str::<ScanReport>(bytes) {
        Ok(report) => (Some(report), Vec::new()),
        Err(err) => (
            None,
            vec![Diagnostic::new(
                DiagnosticKind::MalformedScanEntry,
                format!("scan report for container '{container}' could not be parsed: {err}"),
            )],
        ),
    }
}
