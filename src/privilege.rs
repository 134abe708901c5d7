//! The privilege lattice (§4.1): a totally ordered set of five levels.

use std::fmt;

use crate::error::GraphError;

/// One of the five ordered privilege levels an attacker can hold on a
/// container. `VOS_*` denotes privilege inside a containerized/virtual-OS
/// context; plain `User`/`Admin` denote host-level privilege.
///
/// The declaration order doubles as the lattice order: `derive(Ord)`
/// compares variants in declaration order, which is exactly `value()`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum Privilege {
    None,
    VosUser,
    VosAdmin,
    User,
    Admin,
}

pub const ALL_PRIVILEGES: [Privilege; 5] = [
    Privilege::None,
    Privilege::VosUser,
    Privilege::VosAdmin,
    Privilege::User,
    Privilege::Admin,
];

impl Privilege {
    /// The integer value of the level (`NONE`=0 .. `ADMIN`=4).
    pub fn value(self) -> u8 {
        self as u8
    }

    /// The canonical name, as used in rule/config JSON: underscore form.
    /// Rendering to the `VOS USER`-with-space output form happens only at
    /// the graph-output boundary, via [`Privilege::node_label`].
    pub fn name(self) -> &'static str {
        match self {
            Privilege::None => "NONE",
            Privilege::VosUser => "VOS_USER",
            Privilege::VosAdmin => "VOS_ADMIN",
            Privilege::User => "USER",
            Privilege::Admin => "ADMIN",
        }
    }

    /// The label used inside a rendered node string, e.g. `container(VOS USER)`.
    pub fn node_label(self) -> String {
        self.name().replace('_', " ")
    }

    /// Parses a privilege name. Accepts both the canonical underscore form
    /// and the space form used in rendered node labels, for leniency when
    /// round-tripping rendered output back into configuration.
    pub fn from_name(name: &str) -> Option<Privilege> {
        let normalized = name.replace(' ', "_");
        match normalized.as_str() {
            "NONE" => Some(Privilege::None),
            "VOS_USER" => Some(Privilege::VosUser),
            "VOS_ADMIN" => Some(Privilege::VosAdmin),
            "USER" => Some(Privilege::User),
            "ADMIN" => Some(Privilege::Admin),
            _ => None,
        }
    }

    /// Like [`Privilege::from_name`], but produces the fatal `GraphError`
    /// required by §7 kind 3 when the name is not one of the five levels.
    pub fn parse_rule_privilege(name: &str, rule_label: &str) -> Result<Privilege, GraphError> {
        Privilege::from_name(name).ok_or_else(|| GraphError::UnknownPrivilegeName {
            name: name.to_string(),
            rule_label: rule_label.to_string(),
        })
    }

    /// The greater of the two levels.
    pub fn max(self, other: Privilege) -> Privilege {
        std::cmp::max(self, other)
    }

    /// The lesser of the two levels.
    pub fn min(self, other: Privilege) -> Privilege {
        std::cmp::min(self, other)
    }
}

impl fmt::Display for Privilege {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.name())
    }
}
