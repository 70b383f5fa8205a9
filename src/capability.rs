use std::collections::BTreeSet;

use serde::{Deserialize, Serialize};
use ts_rs::TS;
use utoipa::ToSchema;

/// Role
///
/// The role carried in a verified session token. Determines the capability set of the subject.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, TS, ToSchema)]
#[serde(rename_all = "snake_case")]
#[ts(export)]
pub enum Role {
    Viewer,
    Operator,
    Admin,
}

/// Capability
///
/// A single permission checked at navigation time. Ordering is declaration order, which is also
/// the order missing capabilities are reported in.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize, TS, ToSchema)]
#[serde(rename_all = "snake_case")]
#[ts(export)]
pub enum Capability {
    ViewDashboard,
    ManageRollups,
    ManageSettings,
    Administer,
}

impl Role {
    pub fn capabilities(self) -> &'static [Capability] {
        match self {
            Role::Viewer => &[Capability::ViewDashboard],
            Role::Operator => &[
                Capability::ViewDashboard,
                Capability::ManageRollups,
                Capability::ManageSettings,
            ],
            Role::Admin => &[
                Capability::ViewDashboard,
                Capability::ManageRollups,
                Capability::ManageSettings,
                Capability::Administer,
            ],
        }
    }
}

/// Subject
///
/// Whoever is asking for access, reduced to the set of capabilities it holds.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Subject {
    capabilities: BTreeSet<Capability>,
}

impl Subject {
    pub fn new(capabilities: impl IntoIterator<Item = Capability>) -> Self {
        Self {
            capabilities: capabilities.into_iter().collect(),
        }
    }

    pub fn holds(&self, capability: Capability) -> bool {
        self.capabilities.contains(&capability)
    }

    pub fn capabilities(&self) -> impl Iterator<Item = Capability> + '_ {
        self.capabilities.iter().copied()
    }
}

impl From<Role> for Subject {
    fn from(role: Role) -> Self {
        Subject::new(role.capabilities().iter().copied())
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Access {
    Allow,
    Deny { missing: Vec<Capability> },
}

impl Access {
    pub fn is_allowed(&self) -> bool {
        matches!(self, Access::Allow)
    }
}

/// check
///
/// Pure predicate: allow iff the subject holds every required capability. An empty requirement
/// always allows.
pub fn check(subject: &Subject, required: &[Capability]) -> Access {
    let missing: BTreeSet<Capability> = required
        .iter()
        .copied()
        .filter(|capability| !subject.holds(*capability))
        .collect();

    if missing.is_empty() {
        Access::Allow
    } else {
        Access::Deny {
            missing: missing.into_iter().collect(),
        }
    }
}

// Longest-prefix entries are not needed while no two entries overlap.
const PATH_REQUIREMENTS: &[(&str, &[Capability])] = &[
    ("/admin", &[Capability::Administer]),
    ("/settings", &[Capability::ManageSettings]),
    ("/dashboard", &[Capability::ViewDashboard]),
];

/// required_capabilities
///
/// Capabilities a page path demands of a verified subject.
pub fn required_capabilities(path: &str) -> &'static [Capability] {
    PATH_REQUIREMENTS
        .iter()
        .find(|(prefix, _)| path.starts_with(prefix))
        .map(|(_, required)| *required)
        .unwrap_or(&[])
}
