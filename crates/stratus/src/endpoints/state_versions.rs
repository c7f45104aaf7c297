//! State versions: the historical state blobs a workspace accumulates.
//! Listings are filtered by workspace/organization name and may side-load
//! related resources through `include`, which the service materializes
//! asynchronously.

use serde_json::Value;

use crate::client::Stratus;
use crate::document::Document;
use crate::endpoints::EndpointMeta;
use crate::entitlements::Entitlement;
use crate::error::ApiError;

/// Filter parameters for state-version listings.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct StateVersionFilters {
    pub workspace_name: Option<String>,
    pub organization_name: Option<String>,
}

impl StateVersionFilters {
    fn to_query(&self) -> Vec<(String, String)> {
        let mut query = Vec::new();
        if let Some(workspace) = &self.workspace_name {
            query.push(("filter[workspace][name]".to_string(), workspace.clone()));
        }
        if let Some(organization) = &self.organization_name {
            query.push(("filter[organization][name]".to_string(), organization.clone()));
        }
        query
    }
}

pub struct StateVersions<'a> {
    api: &'a Stratus,
}

impl<'a> StateVersions<'a> {
    pub const META: EndpointMeta =
        EndpointMeta::named("state_versions").requires(&[Entitlement::StateStorage]);

    pub(crate) fn new(api: &'a Stratus) -> Self {
        StateVersions { api }
    }

    pub fn meta(&self) -> &'static EndpointMeta {
        &Self::META
    }

    pub async fn list(
        &self,
        filters: &StateVersionFilters,
        include: Option<&str>,
    ) -> Result<Document, ApiError> {
        let mut query = filters.to_query();
        if let Some(include) = include {
            query.push(("include".to_string(), include.to_string()));
        }
        self.api.get_with_query("/api/v2/state-versions", &query).await
    }

    /// Same as [`list`](Self::list), but walks every page.
    pub async fn list_all(
        &self,
        filters: &StateVersionFilters,
        include: Option<&str>,
    ) -> Result<Document, ApiError> {
        let mut query = filters.to_query();
        if let Some(include) = include {
            query.push(("include".to_string(), include.to_string()));
        }
        self.api.list_all_pages("/api/v2/state-versions", &query).await
    }

    pub async fn create(&self, workspace_id: &str, payload: &Value) -> Result<Document, ApiError> {
        self.api
            .post(&format!("/api/v2/workspaces/{workspace_id}/state-versions"), payload)
            .await
    }
}

