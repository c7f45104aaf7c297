//! The `Stratus` API handle: authenticated transport plus organization
//! binding. Resource namespaces hang off it as cheap borrowing handles.

use log::{debug, trace};
use serde_json::Value;

use crate::document::Document;
use crate::endpoints::{
    AgentPools, OauthClients, OrgMemberships, OrgTags, OrgTokens, Organizations, Policies,
    PolicySets, RegistryModules, RegistryProviders, RunTasks, Runs, SshKeys, StateVersions, Teams,
    VariableSets, Variables, Workspaces,
};
use crate::entitlements::EntitlementSet;
use crate::error::ApiError;

/// Base URL of the hosted multi-tenant service.
pub const DEFAULT_CLOUD_URL: &str = "https://app.stratus.dev";

/// Deployment mode of the service a client is pointed at.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Edition {
    /// The hosted multi-tenant service.
    Cloud,
    /// A customer-operated installation.
    SelfHosted,
}

#[derive(Debug, Clone)]
pub struct ClientConfig {
    pub token: String,
    pub base_url: String,
    pub verify_tls: bool,
    /// Overrides URL-based edition detection. Left `None` outside of test
    /// doubles, where the service never lives at the well-known cloud URL.
    pub edition: Option<Edition>,
}

impl ClientConfig {
    pub fn new(token: impl Into<String>) -> Self {
        ClientConfig {
            token: token.into(),
            base_url: DEFAULT_CLOUD_URL.to_string(),
            verify_tls: true,
            edition: None,
        }
    }

    pub fn with_base_url(mut self, base_url: impl Into<String>) -> Self {
        self.base_url = base_url.into();
        self
    }

    pub fn with_verify_tls(mut self, verify_tls: bool) -> Self {
        self.verify_tls = verify_tls;
        self
    }

    pub fn with_edition(mut self, edition: Edition) -> Self {
        self.edition = Some(edition);
        self
    }
}

#[derive(Debug)]
pub struct Stratus {
    http: reqwest::Client,
    base_url: String,
    edition: Edition,
    org: Option<String>,
}

impl Stratus {
    pub fn new(config: ClientConfig) -> Result<Self, ApiError> {
        if config.token.trim().is_empty() {
            return Err(ApiError::InvalidConfig("API token must not be empty".to_string()));
        }

        let base_url = config.base_url.trim_end_matches('/').to_string();
        let edition = config.edition.unwrap_or(if base_url == DEFAULT_CLOUD_URL {
            Edition::Cloud
        } else {
            Edition::SelfHosted
        });

        let mut headers = reqwest::header::HeaderMap::new();
        let mut auth = reqwest::header::HeaderValue::from_str(&format!("Bearer {}", config.token))
            .map_err(|_| ApiError::InvalidConfig("API token contains invalid characters".to_string()))?;
        auth.set_sensitive(true);
        headers.insert(reqwest::header::AUTHORIZATION, auth);
        headers.insert(
            reqwest::header::CONTENT_TYPE,
            reqwest::header::HeaderValue::from_static("application/vnd.api+json"),
        );

        let http = reqwest::Client::builder()
            .default_headers(headers)
            .danger_accept_invalid_certs(!config.verify_tls)
            .build()?;

        Ok(Stratus {
            http,
            base_url,
            edition,
            org: None,
        })
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    /// Binds subsequent org-scoped calls to the named organization.
    pub fn set_org(&mut self, name: &str) {
        debug!("Binding client to organization {name}");
        self.org = Some(name.to_string());
    }

    pub fn org(&self) -> Result<&str, ApiError> {
        self.org
            .as_deref()
            .ok_or_else(|| ApiError::InvalidConfig("no organization bound; call set_org first".to_string()))
    }

    pub fn edition(&self) -> Edition {
        self.edition
    }

    /// True when pointed at the hosted multi-tenant service.
    pub fn is_cloud(&self) -> bool {
        self.edition == Edition::Cloud
    }

    /// Fetches the bound organization's entitlement snapshot.
    ///
    /// Absent (404) or malformed entitlement data yields `None`, which
    /// downstream gating treats as "no entitlements".
    pub async fn entitlements(&self) -> Result<Option<EntitlementSet>, ApiError> {
        let path = format!("/api/v2/organizations/{}/entitlement-set", self.org()?);
        match self.get(&path).await {
            Ok(doc) => Ok(doc.single().map(EntitlementSet::from_resource)),
            Err(err) if err.is_not_found() => Ok(None),
            Err(err) => Err(err),
        }
    }

    // =========================================================================
    // RESOURCE NAMESPACES
    // =========================================================================

    pub fn organizations(&self) -> Organizations<'_> {
        Organizations::new(self)
    }

    pub fn workspaces(&self) -> Workspaces<'_> {
        Workspaces::new(self)
    }

    pub fn runs(&self) -> Runs<'_> {
        Runs::new(self)
    }

    pub fn variables(&self) -> Variables<'_> {
        Variables::new(self)
    }

    pub fn policies(&self) -> Policies<'_> {
        Policies::new(self)
    }

    pub fn policy_sets(&self) -> PolicySets<'_> {
        PolicySets::new(self)
    }

    pub fn oauth_clients(&self) -> OauthClients<'_> {
        OauthClients::new(self)
    }

    pub fn ssh_keys(&self) -> SshKeys<'_> {
        SshKeys::new(self)
    }

    pub fn teams(&self) -> Teams<'_> {
        Teams::new(self)
    }

    pub fn org_tags(&self) -> OrgTags<'_> {
        OrgTags::new(self)
    }

    pub fn org_memberships(&self) -> OrgMemberships<'_> {
        OrgMemberships::new(self)
    }

    pub fn agent_pools(&self) -> AgentPools<'_> {
        AgentPools::new(self)
    }

    pub fn run_tasks(&self) -> RunTasks<'_> {
        RunTasks::new(self)
    }

    pub fn variable_sets(&self) -> VariableSets<'_> {
        VariableSets::new(self)
    }

    pub fn state_versions(&self) -> StateVersions<'_> {
        StateVersions::new(self)
    }

    pub fn registry_modules(&self) -> RegistryModules<'_> {
        RegistryModules::new(self)
    }

    pub fn registry_providers(&self) -> RegistryProviders<'_> {
        RegistryProviders::new(self)
    }

    pub fn org_tokens(&self) -> OrgTokens<'_> {
        OrgTokens::new(self)
    }

    // =========================================================================
    // ENVELOPE TRANSPORT
    // =========================================================================

    pub(crate) async fn get(&self, path: &str) -> Result<Document, ApiError> {
        self.get_with_query(path, &[]).await
    }

    pub(crate) async fn get_with_query(
        &self,
        path: &str,
        query: &[(String, String)],
    ) -> Result<Document, ApiError> {
        let url = self.url(path, query);
        trace!("GET {url}");
        let response = self.http.get(&url).send().await?;
        Self::decode_document(path, response).await
    }

    pub(crate) async fn post(&self, path: &str, body: &Value) -> Result<Document, ApiError> {
        let url = self.url(path, &[]);
        trace!("POST {url}");
        let response = self.http.post(&url).json(body).send().await?;
        Self::decode_document(path, response).await
    }

    pub(crate) async fn delete(&self, path: &str) -> Result<(), ApiError> {
        let url = self.url(path, &[]);
        trace!("DELETE {url}");
        let response = self.http.delete(&url).send().await?;
        Self::check_status(path, response).await.map(|_| ())
    }

    pub(crate) async fn delete_with_body(&self, path: &str, body: &Value) -> Result<(), ApiError> {
        let url = self.url(path, &[]);
        trace!("DELETE {url}");
        let response = self.http.delete(&url).json(body).send().await?;
        Self::check_status(path, response).await.map(|_| ())
    }

    /// Follows `page[number]` pagination until the server stops advertising
    /// a next page, concatenating `data` and `included` across pages.
    pub(crate) async fn list_all_pages(
        &self,
        path: &str,
        base_query: &[(String, String)],
    ) -> Result<Document, ApiError> {
        use crate::document::{DocumentData, Resource};

        let mut page: u64 = 1;
        let mut resources: Vec<Resource> = Vec::new();
        let mut included: Vec<Resource> = Vec::new();
        loop {
            let mut query = base_query.to_vec();
            query.push(("page[number]".to_string(), page.to_string()));
            query.push(("page[size]".to_string(), "100".to_string()));
            let doc = self.get_with_query(path, &query).await?;

            let next_page = doc
                .meta
                .as_ref()
                .and_then(|meta| meta.get("pagination"))
                .and_then(|pagination| pagination.get("next-page"))
                .and_then(Value::as_u64);
            if let Some(extra) = doc.included.clone() {
                included.extend(extra);
            }
            let batch = doc.into_many();
            let empty_batch = batch.is_empty();
            resources.extend(batch);

            match next_page {
                // Refuse to spin on a server that repeats the same page.
                Some(next) if next > page && !empty_batch => page = next,
                _ => break,
            }
        }
        Ok(Document {
            data: Some(DocumentData::Many(resources)),
            included: if included.is_empty() { None } else { Some(included) },
            meta: None,
        })
    }

    fn url(&self, path: &str, query: &[(String, String)]) -> String {
        let mut url = format!("{}{}", self.base_url, path);
        if !query.is_empty() {
            let encoded: Vec<String> = query
                .iter()
                .map(|(key, value)| {
                    format!("{}={}", urlencoding::encode(key), urlencoding::encode(value))
                })
                .collect();
            url.push('?');
            url.push_str(&encoded.join("&"));
        }
        url
    }

    async fn decode_document(path: &str, response: reqwest::Response) -> Result<Document, ApiError> {
        let response = Self::check_status(path, response).await?;
        let body = response.text().await?;
        if body.trim().is_empty() {
            return Ok(Document::empty());
        }
        serde_json::from_str(&body).map_err(|err| ApiError::Decode(err.to_string()))
    }

    async fn check_status(
        path: &str,
        response: reqwest::Response,
    ) -> Result<reqwest::Response, ApiError> {
        let status = response.status();
        if status.is_success() {
            return Ok(response);
        }
        if status == reqwest::StatusCode::NOT_FOUND {
            return Err(ApiError::NotFound {
                path: path.to_string(),
            });
        }
        let body = response.text().await.unwrap_or_default();
        Err(ApiError::Api {
            status: status.as_u16(),
            message: Self::error_message(&body),
        })
    }

    /// Pulls human-readable detail out of an error envelope, falling back to
    /// the raw body when it does not parse.
    fn error_message(body: &str) -> String {
        if let Ok(value) = serde_json::from_str::<Value>(body) {
            if let Some(errors) = value.get("errors").and_then(Value::as_array) {
                let titles: Vec<&str> = errors
                    .iter()
                    .filter_map(|error| {
                        error
                            .get("detail")
                            .or_else(|| error.get("title"))
                            .and_then(Value::as_str)
                    })
                    .collect();
                if !titles.is_empty() {
                    return titles.join("; ");
                }
            }
        }
        let trimmed = body.trim();
        if trimmed.is_empty() {
            "no error detail provided".to_string()
        } else {
            trimmed.to_string()
        }
    }
}
