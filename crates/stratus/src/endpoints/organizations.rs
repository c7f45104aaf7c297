//! Organization administration: the organizations themselves plus the
//! org-level collections that live directly under one (tags, memberships,
//! the organization API token).

use serde_json::Value;

use crate::client::Stratus;
use crate::document::Document;
use crate::endpoints::EndpointMeta;
use crate::entitlements::Entitlement;
use crate::error::ApiError;

pub struct Organizations<'a> {
    api: &'a Stratus,
}

impl<'a> Organizations<'a> {
    pub const META: EndpointMeta = EndpointMeta::named("organizations");

    pub(crate) fn new(api: &'a Stratus) -> Self {
        Organizations { api }
    }

    pub fn meta(&self) -> &'static EndpointMeta {
        &Self::META
    }

    pub async fn list(&self) -> Result<Document, ApiError> {
        self.api.get("/api/v2/organizations").await
    }

    pub async fn show(&self, name: &str) -> Result<Document, ApiError> {
        self.api.get(&format!("/api/v2/organizations/{name}")).await
    }

    pub async fn create(&self, payload: &Value) -> Result<Document, ApiError> {
        self.api.post("/api/v2/organizations", payload).await
    }

    pub async fn destroy(&self, name: &str) -> Result<(), ApiError> {
        self.api.delete(&format!("/api/v2/organizations/{name}")).await
    }
}

/// Free-form tags attached at the organization level. Deletion is a batch
/// operation taking a list of type/id references.
pub struct OrgTags<'a> {
    api: &'a Stratus,
}

impl<'a> OrgTags<'a> {
    pub const META: EndpointMeta = EndpointMeta::named("org_tags");

    pub(crate) fn new(api: &'a Stratus) -> Self {
        OrgTags { api }
    }

    pub fn meta(&self) -> &'static EndpointMeta {
        &Self::META
    }

    pub async fn list(&self) -> Result<Document, ApiError> {
        let org = self.api.org()?;
        self.api.get(&format!("/api/v2/organizations/{org}/tags")).await
    }

    pub async fn delete_tags(&self, payload: &Value) -> Result<(), ApiError> {
        let org = self.api.org()?;
        self.api
            .delete_with_body(&format!("/api/v2/organizations/{org}/tags"), payload)
            .await
    }
}

pub struct OrgMemberships<'a> {
    api: &'a Stratus,
}

impl<'a> OrgMemberships<'a> {
    pub const META: EndpointMeta = EndpointMeta::named("org_memberships")
        .requires(&[Entitlement::Teams]);

    pub(crate) fn new(api: &'a Stratus) -> Self {
        OrgMemberships { api }
    }

    pub fn meta(&self) -> &'static EndpointMeta {
        &Self::META
    }

    pub async fn invite(&self, payload: &Value) -> Result<Document, ApiError> {
        let org = self.api.org()?;
        self.api
            .post(&format!("/api/v2/organizations/{org}/organization-memberships"), payload)
            .await
    }

    pub async fn list_all_for_org(&self) -> Result<Document, ApiError> {
        let org = self.api.org()?;
        self.api
            .list_all_pages(
                &format!("/api/v2/organizations/{org}/organization-memberships"),
                &[],
            )
            .await
    }

    pub async fn remove(&self, membership_id: &str) -> Result<(), ApiError> {
        self.api
            .delete(&format!("/api/v2/organization-memberships/{membership_id}"))
            .await
    }
}

/// The single API token an organization may hold. Create replaces any
/// existing token; destroy on a token-less org answers 404.
pub struct OrgTokens<'a> {
    api: &'a Stratus,
}

impl<'a> OrgTokens<'a> {
    pub const META: EndpointMeta = EndpointMeta::named("org_tokens");

    pub(crate) fn new(api: &'a Stratus) -> Self {
        OrgTokens { api }
    }

    pub fn meta(&self) -> &'static EndpointMeta {
        &Self::META
    }

    pub async fn create(&self) -> Result<Document, ApiError> {
        let org = self.api.org()?;
        self.api
            .post(
                &format!("/api/v2/organizations/{org}/authentication-token"),
                &serde_json::json!({}),
            )
            .await
    }

    pub async fn destroy(&self) -> Result<(), ApiError> {
        let org = self.api.org()?;
        self.api
            .delete(&format!("/api/v2/organizations/{org}/authentication-token"))
            .await
    }
}

