//! Error and diagnostic types for the attack-graph engine.
//!
//! `GraphError` covers the fatal kinds of invocation error (§7 kinds 2-3);
//! a build aborts and this is returned to the caller. Non-fatal issues
//! never produce an `Err`. They accumulate as `Diagnostic`s alongside a
//! successful result and are also logged through the `log` facade.

use std::fmt;

/// Fatal errors that abort the current graph build.
#[derive(Debug, thiserror::Error, Clone, PartialEq, Eq)]
pub enum GraphError {
    /// A container name referenced in the topology or the privileged-access
    /// map was never declared as a key of the topology.
    #[error("unknown container '{container}' referenced in {referenced_in}")]
    UnknownContainer {
        container: String,
        referenced_in: &'static str,
    },

    /// A rule's `precondition`/`postcondition` field names a privilege
    /// level outside the five canonical names.
    #[error("unknown privilege name '{name}' in rule '{rule_label}'")]
    UnknownPrivilegeName { name: String, rule_label: String },
}

/// The category of a non-fatal issue encountered while building the graph.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DiagnosticKind {
    /// A catalog entry was missing a required sub-field and was skipped.
    MalformedCatalogEntry,
    /// A scan entry was missing a required sub-field and was skipped.
    MalformedScanEntry,
    /// A container had no vulnerability file; treated as zero vulnerabilities.
    MissingVulnerabilityFile,
    /// A CVSS vector string failed to parse; the attack vector is absent.
    UnparsableAttackVector,
    /// A precondition/postcondition rule was missing a required shape
    /// (neither matcher form, no cpe filter, no target privilege) and was
    /// skipped entirely.
    MalformedRule,
}

/// A single non-fatal issue, collected for the caller's diagnostic channel.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Diagnostic {
    pub kind: DiagnosticKind,
    pub message: String,
}

impl Diagnostic {
    pub fn new(kind: DiagnosticKind, message: impl Into<String>) -> Self {
        Self {
            kind,
            message: message.into(),
        }
    }
}

impl fmt::Display for Diagnostic {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:?}: {}", self.kind, self.message)
    }
}
