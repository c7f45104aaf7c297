//! Runs (plan/apply cycles) and the run-task hooks that fire around them.

use serde_json::Value;

use crate::client::Stratus;
use crate::document::Document;
use crate::endpoints::EndpointMeta;
use crate::entitlements::Entitlement;
use crate::error::ApiError;

pub struct Runs<'a> {
    api: &'a Stratus,
}

impl<'a> Runs<'a> {
    pub const META: EndpointMeta = EndpointMeta::named("runs").requires(&[Entitlement::Operations]);

    pub(crate) fn new(api: &'a Stratus) -> Self {
        Runs { api }
    }

    pub fn meta(&self) -> &'static EndpointMeta {
        &Self::META
    }

    pub async fn create(&self, payload: &Value) -> Result<Document, ApiError> {
        self.api.post("/api/v2/runs", payload).await
    }

    pub async fn show(&self, run_id: &str) -> Result<Document, ApiError> {
        self.api.get(&format!("/api/v2/runs/{run_id}")).await
    }
}

/// External checks invoked between run stages. Hosted edition only while
/// the feature finishes rolling out.
pub struct RunTasks<'a> {
    api: &'a Stratus,
}

impl<'a> RunTasks<'a> {
    pub const META: EndpointMeta = EndpointMeta::named("run_tasks")
        .requires(&[Entitlement::RunTasks])
        .cloud_only();

    pub(crate) fn new(api: &'a Stratus) -> Self {
        RunTasks { api }
    }

    pub fn meta(&self) -> &'static EndpointMeta {
        &Self::META
    }

    pub async fn list_all(&self) -> Result<Document, ApiError> {
        let org = self.api.org()?;
        self.api
            .list_all_pages(&format!("/api/v2/organizations/{org}/tasks"), &[])
            .await
    }

    pub async fn create(&self, payload: &Value) -> Result<Document, ApiError> {
        let org = self.api.org()?;
        self.api
            .post(&format!("/api/v2/organizations/{org}/tasks"), payload)
            .await
    }

    pub async fn destroy(&self, task_id: &str) -> Result<(), ApiError> {
        self.api.delete(&format!("/api/v2/tasks/{task_id}")).await
    }
}

