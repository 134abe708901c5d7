//! CVSS v2 attack-vector parsing (§3).
//!
//! Adapted from the teacher crate's `v2_0` module: the same
//! `AV`/`AC`/`Au`/`C`/`I` metric letters, the same lenient
//! "unknown metrics are ignored" parsing philosophy, trimmed to the
//! fields the rule engine actually consumes (no score calculation, no
//! temporal/environmental metrics).

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};
use strum::{Display, EnumString};

/// Errors that can occur when parsing a CVSS v2 vector string.
#[derive(Clone, Debug, PartialEq, Eq, thiserror::Error)]
pub enum ParseError {
    #[error("invalid component format: '{component}' (expected 'KEY:VALUE')")]
    InvalidComponent { component: String },
    #[error("invalid value '{value}' for metric '{metric}'")]
    InvalidMetricValue { metric: String, value: String },
    #[error("missing required metric: '{metric}'")]
    MissingRequiredMetric { metric: String },
}

/// The access vector metric (`AV`).
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize, EnumString, Display)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum AccessVector {
    #[strum(serialize = "N")]
    Network,
    #[strum(serialize = "A")]
    AdjacentNetwork,
    #[strum(serialize = "L")]
    Local,
}

/// The access complexity metric (`AC`).
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize, EnumString, Display)]
#[serde(rename_all = "UPPERCASE")]
pub enum AccessComplexity {
    #[strum(serialize = "H")]
    High,
    #[strum(serialize = "M")]
    Medium,
    #[strum(serialize = "L")]
    Low,
}

impl AccessComplexity {
    /// The single letter this metric serializes to (`H`/`M`/`L`), used by
    /// the rule engine's "first character" comparison (§4.4).
    pub fn letter(self) -> char {
        match self {
            AccessComplexity::High => 'H',
            AccessComplexity::Medium => 'M',
            AccessComplexity::Low => 'L',
        }
    }
}

/// The authentication metric (`Au`). `spec.md` §3 documents five possible
/// values for this field (`N`/`S`/`M`/`L`/`H`), wider than the three the
/// CVSS v2 standard itself defines (`N`/`S`/`M`). We parse all five as they
/// appear in the wild; see `rules.rs` for how the rule engine's
/// authentication filter treats them.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize, EnumString, Display)]
#[serde(rename_all = "UPPERCASE")]
pub enum Authentication {
    #[strum(serialize = "N")]
    None,
    #[strum(serialize = "S")]
    Single,
    #[strum(serialize = "M")]
    Multiple,
    #[strum(serialize = "L")]
    Low,
    #[strum(serialize = "H")]
    High,
}

/// An impact metric (confidentiality `C` or integrity `I`).
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize, EnumString, Display)]
#[serde(rename_all = "UPPERCASE")]
pub enum Impact {
    #[strum(serialize = "N")]
    None,
    #[strum(serialize = "P")]
    Partial,
    #[strum(serialize = "C")]
    Complete,
}

/// A parsed CVSS v2 attack vector, containing at least `AV`, `AC`, `Au`,
/// `C`, `I` (§3). `A` (availability impact) is tracked when present so
/// that re-serializing preserves the original field set, but the rule
/// engine never reads it.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct AttackVector {
    pub access_vector: AccessVector,
    pub access_complexity: AccessComplexity,
    pub authentication: Authentication,
    pub confidentiality_impact: Impact,
    pub integrity_impact: Impact,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub availability_impact: Option<Impact>,
}

impl FromStr for AttackVector {
    type Err = ParseError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        // Strip an optional bracketed/parenthesized form and an optional
        // "CVSS2#" or version prefix some feeds emit.
        let trimmed = s.trim();
        let inner = trimmed
            .strip_prefix('(')
            .and_then(|rest| rest.strip_suffix(')'))
            .unwrap_or(trimmed);

        let mut access_vector = None;
        let mut access_complexity = None;
        let mut authentication = None;
        let mut confidentiality_impact = None;
        let mut integrity_impact = None;
        let mut availability_impact = None;

        for component in inner.split('/') {
            let component = component.trim();
            if component.is_empty() {
                continue;
            }

            let mut parts = component.splitn(2, ':');
            let key = parts
                .next()
                .ok_or_else(|| ParseError::InvalidComponent {
                    component: component.to_string(),
                })?
                .to_ascii_uppercase();
            let value = parts
                .next()
                .ok_or_else(|| ParseError::InvalidComponent {
                    component: component.to_string(),
                })?
                .to_ascii_uppercase();

            match key.as_str() {
                "AV" => {
                    access_vector = Some(value.parse().map_err(|_| ParseError::InvalidMetricValue {
                        metric: key.clone(),
                        value: value.clone(),
                    })?)
                }
                "AC" => {
                    access_complexity =
                        Some(value.parse().map_err(|_| ParseError::InvalidMetricValue {
                            metric: key.clone(),
                            value: value.clone(),
                        })?)
                }
                "AU" => {
                    authentication =
                        Some(value.parse().map_err(|_| ParseError::InvalidMetricValue {
                            metric: key.clone(),
                            value: value.clone(),
                        })?)
                }
                "C" => {
                    confidentiality_impact =
                        Some(value.parse().map_err(|_| ParseError::InvalidMetricValue {
                            metric: key.clone(),
                            value: value.clone(),
                        })?)
                }
                "I" => {
                    integrity_impact =
                        Some(value.parse().map_err(|_| ParseError::InvalidMetricValue {
                            metric: key.clone(),
                            value: value.clone(),
                        })?)
                }
                "A" => {
                    availability_impact =
                        Some(value.parse().map_err(|_| ParseError::InvalidMetricValue {
                            metric: key.clone(),
                            value: value.clone(),
                        })?)
                }
                // Unknown metric abbreviations are ignored, matching the
                // teacher's lenient parsing philosophy.
                _ => {}
            }
        }

        Ok(AttackVector {
            access_vector: access_vector.ok_or_else(|| ParseError::MissingRequiredMetric {
                metric: "AV".to_string(),
            })?,
            access_complexity: access_complexity.ok_or_else(|| ParseError::MissingRequiredMetric {
                metric: "AC".to_string(),
            })?,
            authentication: authentication.ok_or_else(|| ParseError::MissingRequiredMetric {
                metric: "Au".to_string(),
            })?,
            confidentiality_impact: confidentiality_impact.ok_or_else(|| {
                ParseError::MissingRequiredMetric {
                    metric: "C".to_string(),
                }
            })?,
            integrity_impact: integrity_impact.ok_or_else(|| ParseError::MissingRequiredMetric {
                metric: "I".to_string(),
            })?,
            availability_impact,
        })
    }
}

impl fmt::Display for AttackVector {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "AV:{}/AC:{}/Au:{}/C:{}/I:{}",
            self.access_vector,
            self.access_complexity,
            self.authentication,
            self.confidentiality_impact,
            self.integrity_impact
        )?;
        if let Some(a) = self.availability_impact {
            write!(f, "/A:{}", a)?;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_the_five_required_fields() {
        let av: AttackVector = "AV:L/AC:M/Au:N/C:P/I:P/A:N".parse().unwrap();
        assert_eq!(av.access_vector, AccessVector::Local);
        assert_eq!(av.access_complexity, AccessComplexity::Medium);
        assert_eq!(av.authentication, Authentication::None);
        assert_eq!(av.confidentiality_impact, Impact::Partial);
        assert_eq!(av.integrity_impact, Impact::Partial);
        assert_eq!(av.availability_impact, Some(Impact::None));
    }

    #[test]
    fn strips_outer_parentheses() {
        let av: AttackVector = "(AV:N/AC:L/Au:N/C:C/I:C/A:C)".parse().unwrap();
        assert_eq!(av.access_vector, AccessVector::Network);
    }

    #[test]
    fn missing_required_metric_is_an_error() {
        let err = "AV:N/AC:L/Au:N/C:C".parse::<AttackVector>().unwrap_err();
        assert_eq!(
            err,
            ParseError::MissingRequiredMetric {
                metric: "I".to_string()
            }
        );
    }

    #[test]
    fn unknown_metrics_are_ignored() {
        let av: AttackVector = "AV:N/AC:L/Au:N/C:C/I:C/A:C/E:F/RL:OF".parse().unwrap();
        assert_eq!(av.access_vector, AccessVector::Network);
    }

    #[test]
    fn availability_absent_when_not_in_vector() {
        let av: AttackVector = "AV:N/AC:L/Au:N/C:C/I:C".parse().unwrap();
        assert_eq!(av.availability_impact, None);
    }

    #[test]
    fn round_trip_preserves_field_set() {
        let original = "AV:L/AC:H/Au:S/C:N/I:N/A:N";
        let parsed: AttackVector = original.parse().unwrap();
        let rendered = parsed.to_string();
        let reparsed: AttackVector = rendered.parse().unwrap();
        assert_eq!(parsed, reparsed);
    }

    #[test]
    fn authentication_parses_all_five_letters() {
        for (letter, expected) in [
            ("N", Authentication::None),
            ("S", Authentication::Single),
            ("M", Authentication::Multiple),
            ("L", Authentication::Low),
            ("H", Authentication::High),
        ] {
            let vector = format!("AV:N/AC:L/Au:{letter}/C:N/I:N");
            let av: AttackVector = vector.parse().unwrap();
            assert_eq!(av.authentication, expected);
        }
    }
}
