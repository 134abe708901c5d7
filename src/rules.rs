//! The Rule Engine (§4.4): classifies each normalized vulnerability into a
//! precondition privilege (what an attacker must already hold to exploit
//! it) and a postcondition privilege (what exploiting it grants).
//!
//! Precondition rules match in one of two modes: a vocabulary pattern
//! against the vulnerability description, or a structured filter against
//! its parsed CVSS fields. The engine takes the *maximum* precondition
//! across every matching rule. Postcondition rules always match on
//! vocabulary plus an impacts filter, and the engine takes the *minimum*
//! postcondition across every matching rule.

use indexmap::IndexMap;
use serde::Deserialize;

use crate::cpe::CpeClass;
use crate::cvss::{AccessVector, Authentication, Impact};
use crate::error::{Diagnostic, DiagnosticKind, GraphError};
use crate::normalize::VulnerabilityRecord;
use crate::privilege::Privilege;

/// The CPE-class filter every rule applies before its own matcher runs.
/// `Hardware` also accepts `Application`-classed CPEs (§4.4), so it is not
/// a strict subset check.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CpeFilter {
    Unknown,
    OperatingSystem,
    Hardware,
}

impl CpeFilter {
    fn accepts(self, class: CpeClass) -> bool {
        match self {
            CpeFilter::Unknown => true,
            CpeFilter::OperatingSystem => class == CpeClass::OperatingSystem,
            CpeFilter::Hardware => matches!(class, CpeClass::Hardware | CpeClass::Application),
        }
    }

    fn parse(value: &str) -> Option<CpeFilter> {
        match value {
            "unknown" => Some(CpeFilter::Unknown),
            "operating_system" => Some(CpeFilter::OperatingSystem),
            "hardware" => Some(CpeFilter::Hardware),
            _ => None,
        }
    }
}

/// How a precondition rule decides whether a vulnerability matches.
#[derive(Debug, Clone)]
pub enum PreconditionMatcher {
    /// Match against the vulnerability's description text.
    Vocabulary(Vec<String>),
    /// Match against the parsed CVSS attack vector's fields.
    CvssFilter {
        access_vector: Option<String>,
        authentication: Option<String>,
        access_complexity: String,
    },
}

#[derive(Debug, Clone)]
pub struct PreconditionRule {
    pub cpe: CpeFilter,
    pub matcher: PreconditionMatcher,
    pub precondition: Privilege,
}

/// The impacts a postcondition rule requires of the CVSS confidentiality
/// and integrity metrics. `Partial` and `AnyNone` overlap; see
/// `SPEC_FULL.md` §3.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ImpactsFilter {
    AllComplete,
    Partial,
    AnyNone,
}

#[derive(Debug, Clone)]
pub struct PostconditionRule {
    pub cpe: CpeFilter,
    pub vocabulary: Vec<String>,
    pub impacts: ImpactsFilter,
    pub postcondition: Privilege,
}

/// The outcome of running every rule against one vulnerability.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Classification {
    pub precondition: Privilege,
    pub postcondition: Privilege,
}

/// Tests a single vocabulary pattern against a description.
///
/// - `?` matches any description.
/// - `"a...b"` matches when both `a` and `b` appear, in either order.
/// - anything else is a plain case-sensitive substring match.
fn matches_pattern(pattern: &str, description: &str) -> bool {
    if pattern == "?" {
        return true;
    }
    if let Some(idx) = pattern.find("...") {
        let left = pattern[..idx].trim();
        let right = pattern[idx + 3..].trim();
        if left.is_empty() || right.is_empty() {
            return false;
        }
        return description.contains(left) && description.contains(right);
    }
    description.contains(pattern)
}

/// A vocabulary matches a description if any one of its patterns does.
fn vocabulary_matches(patterns: &[String], description: &str) -> bool {
    patterns.iter().any(|p| matches_pattern(p, description))
}

fn access_vector_matches(filter: &str, actual: AccessVector) -> bool {
    if filter.eq_ignore_ascii_case("unknown") {
        return true;
    }
    if filter.eq_ignore_ascii_case("LOCAL") {
        actual == AccessVector::Local
    } else {
        matches!(actual, AccessVector::Network | AccessVector::AdjacentNetwork)
    }
}

fn authentication_matches(filter: &str, actual: Authentication) -> bool {
    if filter.eq_ignore_ascii_case("unknown") {
        return true;
    }
    if filter.eq_ignore_ascii_case("NONE") {
        actual == Authentication::None
    } else {
        matches!(actual, Authentication::Low | Authentication::High)
    }
}

fn precondition_matches(rule: &PreconditionRule, vuln: &VulnerabilityRecord) -> bool {
    if !rule.cpe.accepts(vuln.cpe_class) {
        return false;
    }

    match &rule.matcher {
        PreconditionMatcher::Vocabulary(patterns) => {
            vocabulary_matches(patterns, &vuln.description)
        }
        PreconditionMatcher::CvssFilter {
            access_vector,
            authentication,
            access_complexity,
        } => {
            let Some(av) = &vuln.attack_vector else {
                return false;
            };

            if let Some(filter) = access_vector {
                if !access_vector_matches(filter, av.access_vector) {
                    return false;
                }
            }
            if let Some(filter) = authentication {
                if !authentication_matches(filter, av.authentication) {
                    return false;
                }
            }
            let wanted = access_complexity
                .chars()
                .next()
                .map(|c| c.to_ascii_uppercase());
            wanted == Some(av.access_complexity.letter())
        }
    }
}

fn postcondition_matches(rule: &PostconditionRule, vuln: &VulnerabilityRecord) -> bool {
    if !rule.cpe.accepts(vuln.cpe_class) {
        return false;
    }
    if !vocabulary_matches(&rule.vocabulary, &vuln.description) {
        return false;
    }

    let Some(av) = &vuln.attack_vector else {
        return false;
    };

    match rule.impacts {
        ImpactsFilter::AllComplete => {
            av.confidentiality_impact == Impact::Complete && av.integrity_impact == Impact::Complete
        }
        ImpactsFilter::AnyNone => {
            av.confidentiality_impact == Impact::None || av.integrity_impact == Impact::None
        }
        ImpactsFilter::Partial => {
            !(av.confidentiality_impact == Impact::Complete && av.integrity_impact == Impact::Complete)
        }
    }
}

/// Classifies one vulnerability against every precondition and
/// postcondition rule, taking the maximum matching precondition and the
/// minimum matching postcondition. Unmatched defaults are `NONE`/`ADMIN`
/// respectively (§4.4 defaults), applied by the caller, not here. This
/// function returns `None` for a dimension with no matching rule so
/// `exploitability.rs` can tell "defaulted" apart from "matched NONE".
pub fn classify(
    vuln: &VulnerabilityRecord,
    preconditions: &[PreconditionRule],
    postconditions: &[PostconditionRule],
) -> (Option<Privilege>, Option<Privilege>) {
    let mut precondition = None;
    for rule in preconditions {
        if precondition_matches(rule, vuln) {
            precondition = Some(match precondition {
                Some(current) => Privilege::max(current, rule.precondition),
                None => rule.precondition,
            });
        }
    }

    let mut postcondition = None;
    for rule in postconditions {
        if postcondition_matches(rule, vuln) {
            postcondition = Some(match postcondition {
                Some(current) => Privilege::min(current, rule.postcondition),
                None => rule.postcondition,
            });
        }
    }

    (precondition, postcondition)
}

/// A rule as it is represented in rule-set JSON before being typed,
/// covering both the precondition and postcondition shapes.
#[derive(Debug, Clone, Deserialize)]
pub struct RawRule {
    pub cpe: String,
    #[serde(default)]
    pub vocabulary: Option<Vec<String>>,
    #[serde(rename = "accessVector", default)]
    pub access_vector: Option<String>,
    #[serde(default)]
    pub authentication: Option<String>,
    #[serde(rename = "accessComplexity", default)]
    pub access_complexity: Option<String>,
    #[serde(default)]
    pub impacts: Option<String>,
    #[serde(default)]
    pub precondition: Option<String>,
    #[serde(default)]
    pub postcondition: Option<String>,
}

fn parse_impacts_filter(value: &str) -> Option<ImpactsFilter> {
    match value {
        "ALL_COMPLETE" => Some(ImpactsFilter::AllComplete),
        "PARTIAL" => Some(ImpactsFilter::Partial),
        "ANY_NONE" => Some(ImpactsFilter::AnyNone),
        _ => None,
    }
}

/// Builds precondition rules from a raw rule set, skipping malformed
/// entries as diagnostics. An unrecognized `precondition` privilege name
/// is fatal (§7 kind 3).
pub fn load_precondition_rules(
    raw: &IndexMap<String, RawRule>,
) -> Result<(Vec<PreconditionRule>, Vec<Diagnostic>), GraphError> {
    let mut rules = Vec::new();
    let mut diagnostics = Vec::new();

    for (label, entry) in raw {
        let Some(cpe) = CpeFilter::parse(&entry.cpe) else {
            diagnostics.push(Diagnostic::new(
                DiagnosticKind::MalformedRule,
                format!("precondition rule '{label}' has an unrecognized cpe filter '{}'", entry.cpe),
            ));
            continue;
        };

        let matcher = if let Some(vocabulary) = &entry.vocabulary {
            PreconditionMatcher::Vocabulary(vocabulary.clone())
        } else if let Some(access_complexity) = &entry.access_complexity {
            PreconditionMatcher::CvssFilter {
                access_vector: entry.access_vector.clone(),
                authentication: entry.authentication.clone(),
                access_complexity: access_complexity.clone(),
            }
        } else {
            diagnostics.push(Diagnostic::new(
                DiagnosticKind::MalformedRule,
                format!("precondition rule '{label}' has neither a vocabulary nor a CVSS filter"),
            ));
            continue;
        };

        let Some(precondition_name) = &entry.precondition else {
            diagnostics.push(Diagnostic::new(
                DiagnosticKind::MalformedRule,
                format!("precondition rule '{label}' is missing its precondition"),
            ));
            continue;
        };
        let precondition = Privilege::parse_rule_privilege(precondition_name, label)?;

        rules.push(PreconditionRule {
            cpe,
            matcher,
            precondition,
        });
    }

    Ok((rules, diagnostics))
}

/// Builds postcondition rules from a raw rule set, mirroring
/// [`load_precondition_rules`]'s diagnostic/fatal split.
pub fn load_postcondition_rules(
    raw: &IndexMap<String, RawRule>,
) -> Result<(Vec<PostconditionRule>, Vec<Diagnostic>), GraphError> {
    let mut rules = Vec::new();
    let mut diagnostics = Vec::new();

    for (label, entry) in raw {
        let Some(cpe) = CpeFilter::parse(&entry.cpe) else {
            diagnostics.push(Diagnostic::new(
                DiagnosticKind::MalformedRule,
                format!("postcondition rule '{label}' has an unrecognized cpe filter '{}'", entry.cpe),
            ));
            continue;
        };

        let Some(vocabulary) = &entry.vocabulary else {
            diagnostics.push(Diagnostic::new(
                DiagnosticKind::MalformedRule,
                format!("postcondition rule '{label}' is missing its vocabulary"),
            ));
            continue;
        };

        let Some(impacts_name) = &entry.impacts else {
            diagnostics.push(Diagnostic::new(
                DiagnosticKind::MalformedRule,
                format!("postcondition rule '{label}' is missing its impacts filter"),
            ));
            continue;
        };
        let Some(impacts) = parse_impacts_filter(impacts_name) else {
            diagnostics.push(Diagnostic::new(
                DiagnosticKind::MalformedRule,
                format!("postcondition rule '{label}' has an unrecognized impacts filter '{impacts_name}'"),
            ));
            continue;
        };

        let Some(postcondition_name) = &entry.postcondition else {
            diagnostics.push(Diagnostic::new(
                DiagnosticKind::MalformedRule,
                format!("postcondition rule '{label}' is missing its postcondition"),
            ));
            continue;
        };
        let postcondition = Privilege::parse_rule_privilege(postcondition_name, label)?;

        rules.push(PostconditionRule {
            cpe,
            vocabulary: vocabulary.clone(),
            impacts,
            postcondition,
        });
    }

    Ok((rules, diagnostics))
}
