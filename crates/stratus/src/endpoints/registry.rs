//! Private registry namespaces. Either collection can be entirely absent on
//! installations without the registry feature, in which case list calls
//! answer 404 for the whole collection rather than an empty list.

use crate::client::Stratus;
use crate::document::Document;
use crate::endpoints::EndpointMeta;
use crate::entitlements::Entitlement;
use crate::error::ApiError;

/// Modules are addressed by name within the org's private registry.
pub struct RegistryModules<'a> {
    api: &'a Stratus,
}

impl<'a> RegistryModules<'a> {
    pub const META: EndpointMeta =
        EndpointMeta::named("registry_modules").requires(&[Entitlement::PrivateRegistry]);

    pub(crate) fn new(api: &'a Stratus) -> Self {
        RegistryModules { api }
    }

    pub fn meta(&self) -> &'static EndpointMeta {
        &Self::META
    }

    pub async fn list(&self) -> Result<Document, ApiError> {
        let org = self.api.org()?;
        self.api
            .get(&format!("/api/v2/organizations/{org}/registry-modules"))
            .await
    }

    /// Searches the registry across namespaces.
    pub async fn search(&self, query: &str) -> Result<Document, ApiError> {
        self.api
            .get_with_query(
                "/api/v2/registry-modules/search",
                &[("q".to_string(), query.to_string())],
            )
            .await
    }

    pub async fn destroy(&self, module_name: &str) -> Result<(), ApiError> {
        let org = self.api.org()?;
        self.api
            .delete(&format!("/api/v2/organizations/{org}/registry-modules/{module_name}"))
            .await
    }
}

/// Providers are addressed by registry name, namespace, and provider name.
pub struct RegistryProviders<'a> {
    api: &'a Stratus,
}

impl<'a> RegistryProviders<'a> {
    pub const META: EndpointMeta =
        EndpointMeta::named("registry_providers").requires(&[Entitlement::PrivateRegistry]);

    pub(crate) fn new(api: &'a Stratus) -> Self {
        RegistryProviders { api }
    }

    pub fn meta(&self) -> &'static EndpointMeta {
        &Self::META
    }

    pub async fn list(&self) -> Result<Document, ApiError> {
        let org = self.api.org()?;
        self.api
            .get(&format!("/api/v2/organizations/{org}/registry-providers"))
            .await
    }

    pub async fn destroy(
        &self,
        registry_name: &str,
        namespace: &str,
        provider_name: &str,
    ) -> Result<(), ApiError> {
        let org = self.api.org()?;
        self.api
            .delete(&format!(
                "/api/v2/organizations/{org}/registry-providers/{registry_name}/{namespace}/{provider_name}"
            ))
            .await
    }
}

