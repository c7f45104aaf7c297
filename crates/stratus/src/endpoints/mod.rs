//! Resource namespaces of the Stratus API.
//!
//! Each namespace is a cheap handle borrowing the client; all of them speak
//! the shared document envelope. Every handle also publishes an
//! [`EndpointMeta`] describing the static preconditions (entitlements,
//! edition restrictions) a harness checks before exercising it.

pub mod organizations;
pub mod policies;
pub mod registry;
pub mod runs;
pub mod state_versions;
pub mod teams;
pub mod vcs;
pub mod workspaces;

pub use organizations::{OrgMemberships, OrgTags, OrgTokens, Organizations};
pub use policies::{Policies, PolicySets};
pub use registry::{RegistryModules, RegistryProviders};
pub use runs::{RunTasks, Runs};
pub use state_versions::{StateVersionFilters, StateVersions};
pub use teams::{AgentPools, Teams};
pub use vcs::{OauthClients, SshKeys};
pub use workspaces::{VariableSets, Variables, Workspaces};

use crate::entitlements::Entitlement;

/// Static metadata describing what an endpoint needs before it is usable.
///
/// Each namespace exposes one as an associated `META` constant and via
/// `meta()` on its handle.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct EndpointMeta {
    /// Namespace name, used in skip and log messages.
    pub name: &'static str,
    /// Entitlements the hosted edition must enable for this namespace.
    pub required_entitlements: &'static [Entitlement],
    /// True when the namespace exists only on the hosted edition.
    pub cloud_only: bool,
    /// True when the namespace exists only on self-hosted installs.
    pub self_hosted_only: bool,
}

impl EndpointMeta {
    pub const fn named(name: &'static str) -> Self {
        EndpointMeta {
            name,
            required_entitlements: &[],
            cloud_only: false,
            self_hosted_only: false,
        }
    }

    pub const fn requires(mut self, entitlements: &'static [Entitlement]) -> Self {
        self.required_entitlements = entitlements;
        self
    }

    pub const fn cloud_only(mut self) -> Self {
        self.cloud_only = true;
        self
    }

    pub const fn self_hosted_only(mut self) -> Self {
        self.self_hosted_only = true;
        self
    }
}
