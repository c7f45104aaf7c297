//! Organization entitlements and the missing-set computation.
//!
//! Entitlements are capability flags the hosted edition attaches to each
//! organization. The set is fetched once per test run and consulted before
//! exercising an endpoint; the self-hosted edition has no entitlement
//! concept, so every requirement is considered satisfied there.

use std::collections::HashMap;
use std::fmt;

use serde::{Deserialize, Serialize};

use crate::document::Resource;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Entitlement {
    Agents,
    AuditLogging,
    ConfigurationDesigner,
    CostEstimation,
    Operations,
    PolicyEnforcement,
    PrivateRegistry,
    RunTasks,
    SelfServeBilling,
    Sso,
    StateStorage,
    Teams,
    UsageReporting,
    VcsIntegrations,
}

impl Entitlement {
    /// Canonical wire key, as it appears in the entitlement-set attributes.
    pub fn as_key(self) -> &'static str {
        match self {
            Entitlement::Agents => "agents",
            Entitlement::AuditLogging => "audit-logging",
            Entitlement::ConfigurationDesigner => "configuration-designer",
            Entitlement::CostEstimation => "cost-estimation",
            Entitlement::Operations => "operations",
            Entitlement::PolicyEnforcement => "policy-enforcement",
            Entitlement::PrivateRegistry => "private-registry",
            Entitlement::RunTasks => "run-tasks",
            Entitlement::SelfServeBilling => "self-serve-billing",
            Entitlement::Sso => "sso",
            Entitlement::StateStorage => "state-storage",
            Entitlement::Teams => "teams",
            Entitlement::UsageReporting => "usage-reporting",
            Entitlement::VcsIntegrations => "vcs-integrations",
        }
    }

    /// Parses a capability key as returned by the service. Keys are
    /// normalized first (separators unified, case folded) so `cost_estimation`,
    /// `COST-ESTIMATION`, and `cost-estimation` all resolve to the same
    /// variant.
    pub fn from_key(key: &str) -> Option<Self> {
        let normalized = key.trim().replace('_', "-").to_ascii_lowercase();
        ALL_ENTITLEMENTS
            .iter()
            .copied()
            .find(|entitlement| entitlement.as_key() == normalized)
    }
}

impl fmt::Display for Entitlement {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_key())
    }
}

const ALL_ENTITLEMENTS: [Entitlement; 14] = [
    Entitlement::Agents,
    Entitlement::AuditLogging,
    Entitlement::ConfigurationDesigner,
    Entitlement::CostEstimation,
    Entitlement::Operations,
    Entitlement::PolicyEnforcement,
    Entitlement::PrivateRegistry,
    Entitlement::RunTasks,
    Entitlement::SelfServeBilling,
    Entitlement::Sso,
    Entitlement::StateStorage,
    Entitlement::Teams,
    Entitlement::UsageReporting,
    Entitlement::VcsIntegrations,
];

/// Snapshot of an organization's enabled-capability flags, keyed by the raw
/// wire keys the service returned.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct EntitlementSet {
    flags: HashMap<String, bool>,
}

impl EntitlementSet {
    pub fn new() -> Self {
        Self::default()
    }

    /// Reads every boolean attribute off an entitlement-set resource.
    /// Non-boolean attributes are ignored rather than rejected.
    pub fn from_resource(resource: &Resource) -> Self {
        let mut set = Self::new();
        for (key, value) in &resource.attributes {
            if let Some(enabled) = value.as_bool() {
                set.insert(key, enabled);
            }
        }
        set
    }

    pub fn insert(&mut self, key: &str, enabled: bool) {
        self.flags.insert(key.to_string(), enabled);
    }

    pub fn is_empty(&self) -> bool {
        self.flags.is_empty()
    }

    /// True when any key in the set normalizes to `entitlement` and is
    /// enabled. Disabled or absent keys both answer false.
    pub fn is_enabled(&self, entitlement: Entitlement) -> bool {
        self.flags
            .iter()
            .any(|(key, enabled)| *enabled && Entitlement::from_key(key) == Some(entitlement))
    }
}

/// Computes the subset of `required` not enabled in `current`.
///
/// Entitlements only exist on the hosted multi-tenant edition; off-cloud the
/// check is skipped entirely and nothing is reported missing. An absent
/// snapshot (`None`) is treated as "no entitlements", so every requirement
/// is reported missing. That can only produce a conservative skip, never a
/// false pass.
pub fn missing_entitlements(
    required: &[Entitlement],
    current: Option<&EntitlementSet>,
    cloud: bool,
) -> Vec<Entitlement> {
    if !cloud {
        return Vec::new();
    }
    match current {
        Some(set) => required
            .iter()
            .copied()
            .filter(|entitlement| !set.is_enabled(*entitlement))
            .collect(),
        None => required.to_vec(),
    }
}
