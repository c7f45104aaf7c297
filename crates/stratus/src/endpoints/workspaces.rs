//! Workspaces and the variable surfaces attached to them.

use serde_json::Value;

use crate::client::Stratus;
use crate::document::Document;
use crate::endpoints::EndpointMeta;
use crate::entitlements::Entitlement;
use crate::error::ApiError;

pub struct Workspaces<'a> {
    api: &'a Stratus,
}

impl<'a> Workspaces<'a> {
    pub const META: EndpointMeta =
        EndpointMeta::named("workspaces").requires(&[Entitlement::StateStorage]);

    pub(crate) fn new(api: &'a Stratus) -> Self {
        Workspaces { api }
    }

    pub fn meta(&self) -> &'static EndpointMeta {
        &Self::META
    }

    pub async fn list(&self) -> Result<Document, ApiError> {
        let org = self.api.org()?;
        self.api.get(&format!("/api/v2/organizations/{org}/workspaces")).await
    }

    pub async fn list_all(&self) -> Result<Document, ApiError> {
        let org = self.api.org()?;
        self.api
            .list_all_pages(&format!("/api/v2/organizations/{org}/workspaces"), &[])
            .await
    }

    pub async fn show(&self, workspace_id: &str) -> Result<Document, ApiError> {
        self.api.get(&format!("/api/v2/workspaces/{workspace_id}")).await
    }

    pub async fn create(&self, payload: &Value) -> Result<Document, ApiError> {
        let org = self.api.org()?;
        self.api
            .post(&format!("/api/v2/organizations/{org}/workspaces"), payload)
            .await
    }

    pub async fn destroy(&self, workspace_id: &str) -> Result<(), ApiError> {
        self.api.delete(&format!("/api/v2/workspaces/{workspace_id}")).await
    }
}

/// Workspace-scoped configuration and environment variables.
pub struct Variables<'a> {
    api: &'a Stratus,
}

impl<'a> Variables<'a> {
    pub const META: EndpointMeta = EndpointMeta::named("variables");

    pub(crate) fn new(api: &'a Stratus) -> Self {
        Variables { api }
    }

    pub fn meta(&self) -> &'static EndpointMeta {
        &Self::META
    }

    pub async fn list(&self) -> Result<Document, ApiError> {
        self.api.get("/api/v2/vars").await
    }

    pub async fn create(&self, payload: &Value) -> Result<Document, ApiError> {
        self.api.post("/api/v2/vars", payload).await
    }

    pub async fn destroy(&self, variable_id: &str) -> Result<(), ApiError> {
        self.api.delete(&format!("/api/v2/vars/{variable_id}")).await
    }
}

/// Reusable variable collections assignable to many workspaces. Still
/// rolling out; only the hosted edition serves them.
pub struct VariableSets<'a> {
    api: &'a Stratus,
}

impl<'a> VariableSets<'a> {
    pub const META: EndpointMeta = EndpointMeta::named("variable_sets").cloud_only();

    pub(crate) fn new(api: &'a Stratus) -> Self {
        VariableSets { api }
    }

    pub fn meta(&self) -> &'static EndpointMeta {
        &Self::META
    }

    pub async fn list_for_org(&self) -> Result<Document, ApiError> {
        let org = self.api.org()?;
        self.api.get(&format!("/api/v2/organizations/{org}/varsets")).await
    }

    pub async fn create(&self, payload: &Value) -> Result<Document, ApiError> {
        let org = self.api.org()?;
        self.api
            .post(&format!("/api/v2/organizations/{org}/varsets"), payload)
            .await
    }

    pub async fn destroy(&self, varset_id: &str) -> Result<(), ApiError> {
        self.api.delete(&format!("/api/v2/varsets/{varset_id}")).await
    }
}

