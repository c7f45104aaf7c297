//! VCS integration surfaces: OAuth clients binding the org to a provider,
//! and SSH keys used for private module access.

use serde_json::Value;

use crate::client::Stratus;
use crate::document::Document;
use crate::endpoints::EndpointMeta;
use crate::entitlements::Entitlement;
use crate::error::ApiError;

/// An OAuth client is the org-level connection to a VCS provider. Other
/// resources (workspaces, policy sets) hold token references into it, so it
/// must outlive them.
pub struct OauthClients<'a> {
    api: &'a Stratus,
}

impl<'a> OauthClients<'a> {
    pub const META: EndpointMeta =
        EndpointMeta::named("oauth_clients").requires(&[Entitlement::VcsIntegrations]);

    pub(crate) fn new(api: &'a Stratus) -> Self {
        OauthClients { api }
    }

    pub fn meta(&self) -> &'static EndpointMeta {
        &Self::META
    }

    pub async fn list(&self) -> Result<Document, ApiError> {
        let org = self.api.org()?;
        self.api.get(&format!("/api/v2/organizations/{org}/oauth-clients")).await
    }

    pub async fn create(&self, payload: &Value) -> Result<Document, ApiError> {
        let org = self.api.org()?;
        self.api
            .post(&format!("/api/v2/organizations/{org}/oauth-clients"), payload)
            .await
    }

    pub async fn destroy(&self, oauth_client_id: &str) -> Result<(), ApiError> {
        self.api.delete(&format!("/api/v2/oauth-clients/{oauth_client_id}")).await
    }
}

pub struct SshKeys<'a> {
    api: &'a Stratus,
}

impl<'a> SshKeys<'a> {
    pub const META: EndpointMeta = EndpointMeta::named("ssh_keys");

    pub(crate) fn new(api: &'a Stratus) -> Self {
        SshKeys { api }
    }

    pub fn meta(&self) -> &'static EndpointMeta {
        &Self::META
    }

    pub async fn list(&self) -> Result<Document, ApiError> {
        let org = self.api.org()?;
        self.api.get(&format!("/api/v2/organizations/{org}/ssh-keys")).await
    }

    pub async fn create(&self, payload: &Value) -> Result<Document, ApiError> {
        let org = self.api.org()?;
        self.api
            .post(&format!("/api/v2/organizations/{org}/ssh-keys"), payload)
            .await
    }

    pub async fn destroy(&self, ssh_key_id: &str) -> Result<(), ApiError> {
        self.api.delete(&format!("/api/v2/ssh-keys/{ssh_key_id}")).await
    }
}

