//! The Vulnerability Normalizer (§4.3): merges a container's cleaned scan
//! report with the attack-vector catalog into one `cve_id -> record`
//! mapping, parsing whatever CVSS vector string survives into a
//! structured [`AttackVector`].

use indexmap::IndexMap;

use crate::catalog::CatalogEntry;
use crate::cpe::CpeClass;
use crate::cvss::AttackVector;
use crate::error::{Diagnostic, DiagnosticKind};
use crate::scan::{clean, CleanedVulnerability, ScanReport};

/// Where a normalized vulnerability's description/CPE class came from.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Source {
    Catalog,
    Scan,
}

/// A fully normalized vulnerability record (§3).
#[derive(Debug, Clone)]
pub struct VulnerabilityRecord {
    pub id: String,
    pub description: String,
    pub cpe_class: CpeClass,
    pub attack_vector: Option<AttackVector>,
    pub source: Source,
}

/// Merges a container's cleaned scan report with the catalog (§4.3 step 2).
///
/// For each cleaned vulnerability: prefer the catalog's description, CPE
/// class, and attack-vector string when the CVE id is present there;
/// otherwise keep the scan's own fields with an unknown CPE class. Any
/// surviving CVSS vector string is parsed; a parse failure downgrades the
/// attack vector to absent and is reported as a [`Diagnostic`], not a
/// fatal error.
pub fn normalize(
    report: &ScanReport,
    catalog: &IndexMap<String, CatalogEntry>,
) -> (IndexMap<String, VulnerabilityRecord>, Vec<Diagnostic>) {
    let cleaned = clean(report);
    normalize_cleaned(&cleaned, catalog)
}

fn normalize_cleaned(
    cleaned: &IndexMap<String, CleanedVulnerability>,
    catalog: &IndexMap<String, CatalogEntry>,
) -> (IndexMap<String, VulnerabilityRecord>, Vec<Diagnostic>) {
    let mut records = IndexMap::new();
    let mut diagnostics = Vec::new();

    for (id, scan_vuln) in cleaned {
        let (description, cpe_class, attack_vector_string, source) =
            if let Some(catalog_entry) = catalog.get(id) {
                (
                    catalog_entry.description.clone(),
                    catalog_entry.cpe_class,
                    Some(catalog_entry.attack_vector_string.clone()),
                    Source::Catalog,
                )
            } else {
                (
                    scan_vuln.description.clone().unwrap_or_default(),
                    CpeClass::Unknown,
                    scan_vuln.attack_vector_string.clone(),
                    Source::Scan,
                )
            };

        let attack_vector = attack_vector_string.and_then(|s| match s.parse() {
            Ok(parsed) => Some(parsed),
            Err(err) => {
                diagnostics.push(Diagnostic::new(
                    DiagnosticKind::UnparsableAttackVector,
                    format!("vulnerability '{id}' has an unparsable CVSS vector '{s}': {err}"),
                ));
                None
            }
        });

        records.insert(
            id.clone(),
            VulnerabilityRecord {
                id: id.clone(),
                description,
                cpe_class,
                attack_vector,
                source,
            },
        );
    }

    (records, diagnostics)
}
