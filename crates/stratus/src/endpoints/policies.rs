//! Policy-as-code: individual policies and the policy sets grouping them.
//! Policy sets may be VCS-backed, which makes them depend on an OAuth
//! client; purge order has to honor that.

use serde_json::Value;

use crate::client::Stratus;
use crate::document::Document;
use crate::endpoints::EndpointMeta;
use crate::entitlements::Entitlement;
use crate::error::ApiError;

pub struct Policies<'a> {
    api: &'a Stratus,
}

impl<'a> Policies<'a> {
    pub const META: EndpointMeta =
        EndpointMeta::named("policies").requires(&[Entitlement::PolicyEnforcement]);

    pub(crate) fn new(api: &'a Stratus) -> Self {
        Policies { api }
    }

    pub fn meta(&self) -> &'static EndpointMeta {
        &Self::META
    }

    pub async fn list_all(&self) -> Result<Document, ApiError> {
        let org = self.api.org()?;
        self.api
            .list_all_pages(&format!("/api/v2/organizations/{org}/policies"), &[])
            .await
    }

    pub async fn create(&self, payload: &Value) -> Result<Document, ApiError> {
        let org = self.api.org()?;
        self.api
            .post(&format!("/api/v2/organizations/{org}/policies"), payload)
            .await
    }

    pub async fn destroy(&self, policy_id: &str) -> Result<(), ApiError> {
        self.api.delete(&format!("/api/v2/policies/{policy_id}")).await
    }
}

pub struct PolicySets<'a> {
    api: &'a Stratus,
}

impl<'a> PolicySets<'a> {
    pub const META: EndpointMeta =
        EndpointMeta::named("policy_sets").requires(&[Entitlement::PolicyEnforcement]);

    pub(crate) fn new(api: &'a Stratus) -> Self {
        PolicySets { api }
    }

    pub fn meta(&self) -> &'static EndpointMeta {
        &Self::META
    }

    pub async fn list_all(&self) -> Result<Document, ApiError> {
        let org = self.api.org()?;
        self.api
            .list_all_pages(&format!("/api/v2/organizations/{org}/policy-sets"), &[])
            .await
    }

    pub async fn create(&self, payload: &Value) -> Result<Document, ApiError> {
        let org = self.api.org()?;
        self.api
            .post(&format!("/api/v2/organizations/{org}/policy-sets"), payload)
            .await
    }

    pub async fn destroy(&self, policy_set_id: &str) -> Result<(), ApiError> {
        self.api.delete(&format!("/api/v2/policy-sets/{policy_set_id}")).await
    }
}

