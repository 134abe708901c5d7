//! The Exploitability Table (§4.5): for each container, a
//! `vuln_id -> precondition` and `vuln_id -> postcondition` mapping built
//! by running every normalized vulnerability through the rule engine.
//!
//! A vulnerability with no parsed attack vector is skipped entirely. It
//! never appears in the table, regardless of whether a vocabulary rule
//! would otherwise have matched its description.

use indexmap::IndexMap;

use crate::normalize::VulnerabilityRecord;
use crate::privilege::Privilege;
use crate::rules::{classify, PreconditionRule, PostconditionRule};

/// The default precondition/postcondition applied when no rule of that
/// kind matched a vulnerability (§4.4 defaults).
const DEFAULT_PRECONDITION: Privilege = Privilege::None;
const DEFAULT_POSTCONDITION: Privilege = Privilege::Admin;

/// One container's exploitability table.
#[derive(Debug, Clone, Default)]
pub struct ContainerExploitability {
    pub precondition: IndexMap<String, Privilege>,
    pub postcondition: IndexMap<String, Privilege>,
}

/// Builds one container's exploitability table from its normalized
/// vulnerabilities and the loaded rule sets.
pub fn build_exploitability_table(
    vulnerabilities: &IndexMap<String, VulnerabilityRecord>,
    preconditions: &[PreconditionRule],
    postconditions: &[PostconditionRule],
) -> ContainerExploitability {
    let mut table = ContainerExploitability::default();

    for vuln in vulnerabilities.values() {
        if vuln.attack_vector.is_none() {
            continue;
        }

        let (precondition, postcondition) = classify(vuln, preconditions, postconditions);
        table
            .precondition
            .insert(vuln.id.clone(), precondition.unwrap_or(DEFAULT_PRECONDITION));
        table
            .postcondition
            .insert(vuln.id.clone(), postcondition.unwrap_or(DEFAULT_POSTCONDITION));
    }

    table
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::cpe::CpeClass;
    use crate::cvss::AttackVector;
    use crate::normalize::Source;
    use crate::rules::{CpeFilter, ImpactsFilter, PreconditionMatcher};

    fn vuln(id: &str, description: &str, vector: Option<&str>) -> VulnerabilityRecord {
        VulnerabilityRecord {
            id: id.to_string(),
            description: description.to_string(),
            cpe_class: CpeClass::Unknown,
            attack_vector: vector.map(|v| v.parse::<AttackVector>().unwrap()),
            source: Source::Scan,
        }
    }

    #[test]
    fn vulnerability_without_attack_vector_is_absent_from_the_table() {
        let mut vulns = IndexMap::new();
        vulns.insert("CVE-1".to_string(), vuln("CVE-1", "no vector here", None));
        let table = build_exploitability_table(&vulns, &[], &[]);
        assert!(!table.precondition.contains_key("CVE-1"));
        assert!(!table.postcondition.contains_key("CVE-1"));
    }

    #[test]
    fn unclassified_vulnerability_gets_the_documented_defaults() {
        let mut vulns = IndexMap::new();
        vulns.insert(
            "CVE-2".to_string(),
            vuln("CVE-2", "nothing matches", Some("AV:N/AC:L/Au:N/C:N/I:N")),
        );
        let table = build_exploitability_table(&vulns, &[], &[]);
        assert_eq!(table.precondition["CVE-2"], Privilege::None);
        assert_eq!(table.postcondition["CVE-2"], Privilege::Admin);
    }

    #[test]
    fn classified_vulnerability_uses_the_rule_engine_result() {
        let mut vulns = IndexMap::new();
        vulns.insert(
            "CVE-3".to_string(),
            vuln("CVE-3", "remote code execution", Some("AV:N/AC:L/Au:N/C:C/I:C")),
        );
        let preconditions = vec![PreconditionRule {
            cpe: CpeFilter::Unknown,
            matcher: PreconditionMatcher::Vocabulary(vec!["remote".to_string()]),
            precondition: Privilege::VosUser,
        }];
        let postconditions = vec![PostconditionRule {
            cpe: CpeFilter::Unknown,
            vocabulary: vec!["?".to_string()],
            impacts: ImpactsFilter::AllComplete,
            postcondition: Privilege::Admin,
        }];
        let table = build_exploitability_table(&vulns, &preconditions, &postconditions);
        assert_eq!(table.precondition["CVE-3"], Privilege::VosUser);
        assert_eq!(table.postcondition["CVE-3"], Privilege::Admin);
    }
}
