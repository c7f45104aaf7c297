//! Teams and agent pools, the org-level access and execution groupings.

use serde_json::Value;

use crate::client::Stratus;
use crate::document::Document;
use crate::endpoints::EndpointMeta;
use crate::entitlements::Entitlement;
use crate::error::ApiError;

/// Deleting a team cascades to its memberships and tokens. Every org keeps
/// an immutable `owners` team that cannot be destroyed.
pub struct Teams<'a> {
    api: &'a Stratus,
}

impl<'a> Teams<'a> {
    pub const META: EndpointMeta = EndpointMeta::named("teams").requires(&[Entitlement::Teams]);

    pub(crate) fn new(api: &'a Stratus) -> Self {
        Teams { api }
    }

    pub fn meta(&self) -> &'static EndpointMeta {
        &Self::META
    }

    pub async fn list(&self) -> Result<Document, ApiError> {
        let org = self.api.org()?;
        self.api.get(&format!("/api/v2/organizations/{org}/teams")).await
    }

    pub async fn create(&self, payload: &Value) -> Result<Document, ApiError> {
        let org = self.api.org()?;
        self.api
            .post(&format!("/api/v2/organizations/{org}/teams"), payload)
            .await
    }

    pub async fn destroy(&self, team_id: &str) -> Result<(), ApiError> {
        self.api.delete(&format!("/api/v2/teams/{team_id}")).await
    }
}

pub struct AgentPools<'a> {
    api: &'a Stratus,
}

impl<'a> AgentPools<'a> {
    pub const META: EndpointMeta =
        EndpointMeta::named("agent_pools").requires(&[Entitlement::Agents]);

    pub(crate) fn new(api: &'a Stratus) -> Self {
        AgentPools { api }
    }

    pub fn meta(&self) -> &'static EndpointMeta {
        &Self::META
    }

    pub async fn list(&self) -> Result<Document, ApiError> {
        let org = self.api.org()?;
        self.api.get(&format!("/api/v2/organizations/{org}/agent-pools")).await
    }

    pub async fn create(&self, payload: &Value) -> Result<Document, ApiError> {
        let org = self.api.org()?;
        self.api
            .post(&format!("/api/v2/organizations/{org}/agent-pools"), payload)
            .await
    }

    pub async fn destroy(&self, agent_pool_id: &str) -> Result<(), ApiError> {
        self.api.delete(&format!("/api/v2/agent-pools/{agent_pool_id}")).await
    }
}

