//! In-process stand-in for the Stratus service.
//!
//! Serves just enough of the API surface for the harness to run end to end:
//! organization CRUD, the org-scoped collections the purge sequencer walks,
//! and scriptable run/workspace/listing states so waiter tests can stage
//! eventual-consistency transitions. State lives in one mutex-guarded map;
//! nothing here persists.

use std::collections::HashMap;
use std::sync::{Arc, Mutex};

use axum::Router;
use axum::extract::{Path, Query, State};
use axum::http::StatusCode;
use axum::response::{IntoResponse, Json, Response};
use axum::routing::{delete, get, post};
use serde_json::{Value, json};
use tokio::net::TcpListener;

use stratus::{ClientConfig, Edition, Stratus};

/// Org-scoped collections, keyed by their URL segment.
const COLLECTIONS: &[&str] = &[
    "workspaces",
    "policies",
    "policy-sets",
    "oauth-clients",
    "ssh-keys",
    "teams",
    "tags",
    "organization-memberships",
    "agent-pools",
    "tasks",
    "varsets",
    "registry-modules",
    "registry-providers",
];

type SharedState = Arc<Mutex<ServiceState>>;

#[derive(Default)]
struct ServiceState {
    orgs: HashMap<String, OrgState>,
    /// Per-org entitlement attribute maps; `Some(None)` means the endpoint
    /// answers 404 for that org.
    entitlements: HashMap<String, Option<Value>>,
    /// Fallback applied to orgs without an explicit entry (covers orgs the
    /// provisioner creates with random names).
    default_entitlements: Option<Option<Value>>,
    /// Scripted run attribute states, consumed front to back; the final
    /// state repeats forever.
    run_scripts: HashMap<String, Vec<Value>>,
    /// Scripted workspace `locked` values, same consumption rule.
    workspace_lock_scripts: HashMap<String, Vec<bool>>,
    /// Collections whose listing answers 404 (feature absent).
    absent_collections: Vec<String>,
    /// Collections whose listing answers 500.
    failing_collections: Vec<String>,
    /// Resources that join a collection listing only after N list calls.
    pending_listings: Vec<PendingListing>,
    search_results: Vec<Value>,
    pending_search: Option<(u32, Value)>,
    state_versions: Vec<Value>,
    /// Listing calls before `included` is materialized.
    state_version_includes_after: u32,
    counters: HashMap<String, u32>,
    /// Every DELETE path, in arrival order.
    deletions: Vec<String>,
    next_id: u32,
}

struct PendingListing {
    org: String,
    collection: String,
    after: u32,
    resource: Value,
}

#[derive(Default)]
struct OrgState {
    email: String,
    collections: HashMap<String, Vec<Value>>,
    has_token: bool,
}

impl OrgState {
    fn new(email: &str, owners_team_id: &str) -> Self {
        let mut collections: HashMap<String, Vec<Value>> = HashMap::new();
        for key in COLLECTIONS {
            collections.insert((*key).to_string(), Vec::new());
        }
        // Every org is born with an undeletable owners team.
        collections.get_mut("teams").unwrap().push(json!({
            "id": owners_team_id,
            "type": "teams",
            "attributes": { "name": "owners" }
        }));
        OrgState {
            email: email.to_string(),
            collections,
            has_token: false,
        }
    }
}

impl ServiceState {
    fn bump(&mut self, key: &str) -> u32 {
        let counter = self.counters.entry(key.to_string()).or_insert(0);
        *counter += 1;
        *counter
    }

    fn take_id(&mut self, prefix: &str) -> String {
        self.next_id += 1;
        format!("{prefix}-{}", self.next_id)
    }
}

pub struct MockService {
    base_url: String,
    state: SharedState,
}

impl MockService {
    pub async fn start() -> Self {
        stratus::telemetry::init();
        let state: SharedState = Arc::new(Mutex::new(ServiceState::default()));
        let app = router(state.clone());
        let listener = TcpListener::bind("127.0.0.1:0")
            .await
            .expect("Failed to bind mock service");
        let addr = listener.local_addr().expect("Mock service has no local addr");
        tokio::spawn(async move {
            axum::serve(listener, app).await.expect("Mock service stopped");
        });
        MockService {
            base_url: format!("http://{addr}"),
            state,
        }
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    /// A client pointed at this mock. The edition override is required
    /// because the mock never lives at the well-known cloud URL.
    pub fn client(&self, edition: Edition) -> Stratus {
        Stratus::new(
            ClientConfig::new("test-token")
                .with_base_url(self.base_url.clone())
                .with_edition(edition),
        )
        .expect("Failed to build client for mock service")
    }

    pub fn seed_org(&self, name: &str) {
        let mut state = self.state.lock().unwrap();
        let owners_id = state.take_id("team-owners");
        state
            .orgs
            .insert(name.to_string(), OrgState::new("seed@stratus.dev", &owners_id));
    }

    pub fn seed_resource(&self, org: &str, collection: &str, resource: Value) {
        let mut state = self.state.lock().unwrap();
        state
            .orgs
            .get_mut(org)
            .expect("Org must be seeded first")
            .collections
            .get_mut(collection)
            .expect("Unknown collection")
            .push(resource);
    }

    pub fn set_org_token(&self, org: &str, has_token: bool) {
        let mut state = self.state.lock().unwrap();
        state.orgs.get_mut(org).expect("Org must be seeded first").has_token = has_token;
    }

    /// Entitlement attributes served for every org without an explicit
    /// entry; `None` makes the endpoint answer 404.
    pub fn set_default_entitlements(&self, attrs: Option<Value>) {
        self.state.lock().unwrap().default_entitlements = Some(attrs);
    }

    pub fn script_run(&self, run_id: &str, states: Vec<Value>) {
        assert!(!states.is_empty(), "Run scripts need at least one state");
        self.state
            .lock()
            .unwrap()
            .run_scripts
            .insert(run_id.to_string(), states);
    }

    pub fn script_workspace_locks(&self, workspace_id: &str, locks: Vec<bool>) {
        assert!(!locks.is_empty(), "Lock scripts need at least one state");
        self.state
            .lock()
            .unwrap()
            .workspace_lock_scripts
            .insert(workspace_id.to_string(), locks);
    }

    pub fn set_collection_absent(&self, collection: &str) {
        self.state
            .lock()
            .unwrap()
            .absent_collections
            .push(collection.to_string());
    }

    pub fn set_collection_failing(&self, collection: &str) {
        self.state
            .lock()
            .unwrap()
            .failing_collections
            .push(collection.to_string());
    }

    /// Makes `resource` join the collection listing on call number `after`.
    pub fn schedule_listing(&self, org: &str, collection: &str, after: u32, resource: Value) {
        self.state.lock().unwrap().pending_listings.push(PendingListing {
            org: org.to_string(),
            collection: collection.to_string(),
            after,
            resource,
        });
    }

    /// Makes `resource` join search results on call number `after`.
    pub fn schedule_search_result(&self, after: u32, resource: Value) {
        self.state.lock().unwrap().pending_search = Some((after, resource));
    }

    pub fn seed_state_version(&self, resource: Value) {
        self.state.lock().unwrap().state_versions.push(resource);
    }

    pub fn set_state_version_includes_after(&self, after: u32) {
        self.state.lock().unwrap().state_version_includes_after = after;
    }

    pub fn has_org(&self, name: &str) -> bool {
        self.state.lock().unwrap().orgs.contains_key(name)
    }

    pub fn org_names(&self) -> Vec<String> {
        self.state.lock().unwrap().orgs.keys().cloned().collect()
    }

    pub fn fetch_count(&self, key: &str) -> u32 {
        *self.state.lock().unwrap().counters.get(key).unwrap_or(&0)
    }

    pub fn deletions(&self) -> Vec<String> {
        self.state.lock().unwrap().deletions.clone()
    }
}

fn router(state: SharedState) -> Router {
    Router::new()
        .route("/api/v2/organizations", post(create_org))
        .route("/api/v2/organizations/{org}", get(show_org).delete(destroy_org))
        .route(
            "/api/v2/organizations/{org}/entitlement-set",
            get(entitlement_set),
        )
        .route(
            "/api/v2/organizations/{org}/{collection}",
            get(list_collection)
                .post(create_in_collection)
                .delete(delete_collection_scoped),
        )
        .route(
            "/api/v2/organizations/{org}/registry-modules/{name}",
            delete(destroy_registry_module),
        )
        .route(
            "/api/v2/organizations/{org}/registry-providers/{registry}/{namespace}/{name}",
            delete(destroy_registry_provider),
        )
        .route("/api/v2/registry-modules/search", get(search_registry_modules))
        .route(
            "/api/v2/workspaces/{id}",
            get(show_workspace).delete(destroy_workspace),
        )
        .route("/api/v2/runs", post(create_run))
        .route("/api/v2/runs/{id}", get(show_run))
        .route("/api/v2/state-versions", get(list_state_versions))
        .route("/api/v2/{collection}/{id}", delete(destroy_by_id))
        .with_state(state)
}

// =============================================================================
// RESPONSE HELPERS
// =============================================================================

fn doc_one(resource: Value) -> Response {
    Json(json!({ "data": resource })).into_response()
}

fn doc_many(resources: Vec<Value>) -> Response {
    Json(json!({ "data": resources })).into_response()
}

fn not_found(detail: &str) -> Response {
    (
        StatusCode::NOT_FOUND,
        Json(json!({ "errors": [{ "status": "404", "title": "not found", "detail": detail }] })),
    )
        .into_response()
}

fn server_error(detail: &str) -> Response {
    (
        StatusCode::INTERNAL_SERVER_ERROR,
        Json(json!({ "errors": [{ "status": "500", "title": "internal error", "detail": detail }] })),
    )
        .into_response()
}

fn default_entitlement_attrs() -> Value {
    json!({
        "agents": true,
        "audit-logging": true,
        "configuration-designer": true,
        "cost-estimation": true,
        "operations": true,
        "policy-enforcement": true,
        "private-registry": true,
        "run-tasks": true,
        "self-serve-billing": true,
        "sso": true,
        "state-storage": true,
        "teams": true,
        "usage-reporting": true,
        "vcs-integrations": true
    })
}

fn org_resource(name: &str, email: &str) -> Value {
    json!({
        "id": name,
        "type": "organizations",
        "attributes": {
            "name": name,
            "email": email,
            "created-at": chrono::Utc::now().to_rfc3339()
        }
    })
}

// =============================================================================
// ORGANIZATION HANDLERS
// =============================================================================

async fn create_org(State(state): State<SharedState>, Json(payload): Json<Value>) -> Response {
    let name = payload["data"]["attributes"]["name"].as_str().unwrap_or_default();
    let email = payload["data"]["attributes"]["email"].as_str().unwrap_or_default();
    if name.is_empty() {
        return server_error("organization name missing from payload");
    }
    let mut state = state.lock().unwrap();
    let owners_id = state.take_id("team-owners");
    state
        .orgs
        .insert(name.to_string(), OrgState::new(email, &owners_id));
    doc_one(org_resource(name, email))
}

async fn show_org(State(state): State<SharedState>, Path(name): Path<String>) -> Response {
    let state = state.lock().unwrap();
    match state.orgs.get(&name) {
        Some(org) => doc_one(org_resource(&name, &org.email)),
        None => not_found("organization does not exist"),
    }
}

async fn destroy_org(State(state): State<SharedState>, Path(name): Path<String>) -> Response {
    let mut state = state.lock().unwrap();
    state.deletions.push(format!("/api/v2/organizations/{name}"));
    match state.orgs.remove(&name) {
        Some(_) => StatusCode::NO_CONTENT.into_response(),
        None => not_found("organization does not exist"),
    }
}

async fn entitlement_set(State(state): State<SharedState>, Path(name): Path<String>) -> Response {
    let state = state.lock().unwrap();
    if !state.orgs.contains_key(&name) {
        return not_found("organization does not exist");
    }
    let attrs = match state.entitlements.get(&name) {
        Some(entry) => entry.clone(),
        None => state
            .default_entitlements
            .clone()
            .unwrap_or_else(|| Some(default_entitlement_attrs())),
    };
    match attrs {
        Some(attrs) => doc_one(json!({
            "id": format!("org-{name}"),
            "type": "entitlement-sets",
            "attributes": attrs
        })),
        None => not_found("entitlement set unavailable"),
    }
}

// =============================================================================
// GENERIC COLLECTION HANDLERS
// =============================================================================

async fn list_collection(
    State(state): State<SharedState>,
    Path((org, collection)): Path<(String, String)>,
) -> Response {
    let mut state = state.lock().unwrap();
    let calls = state.bump(&format!("{org}/{collection}"));

    if state.absent_collections.contains(&collection) {
        return not_found("collection is not available on this installation");
    }
    if state.failing_collections.contains(&collection) {
        return server_error("listing blew up");
    }

    // Promote any staged resources whose turn has come.
    let mut promoted = Vec::new();
    state.pending_listings.retain(|pending| {
        if pending.org == org && pending.collection == collection && calls >= pending.after {
            promoted.push(pending.resource.clone());
            false
        } else {
            true
        }
    });

    let Some(org_state) = state.orgs.get_mut(&org) else {
        return not_found("organization does not exist");
    };
    let Some(resources) = org_state.collections.get_mut(&collection) else {
        return not_found("unknown collection");
    };
    resources.extend(promoted);
    doc_many(resources.clone())
}

async fn create_in_collection(
    State(state): State<SharedState>,
    Path((org, collection)): Path<(String, String)>,
    Json(payload): Json<Value>,
) -> Response {
    let mut state = state.lock().unwrap();

    if collection == "authentication-token" {
        let Some(org_state) = state.orgs.get_mut(&org) else {
            return not_found("organization does not exist");
        };
        org_state.has_token = true;
        let token_id = state.take_id("at");
        return doc_one(json!({
            "id": token_id,
            "type": "authentication-tokens",
            "attributes": { "token": "ott-redacted" }
        }));
    }

    let id = state.take_id(id_prefix(&collection));
    let mut attributes = payload["data"]["attributes"].clone();
    if attributes.is_null() {
        attributes = json!({});
    }
    // Fresh membership invites always start out pending.
    if collection == "organization-memberships" {
        attributes["status"] = json!("invited");
    }
    attributes["created-at"] = json!(chrono::Utc::now().to_rfc3339());
    let kind = payload["data"]["type"]
        .as_str()
        .unwrap_or(collection.as_str())
        .to_string();
    let resource = json!({ "id": id, "type": kind, "attributes": attributes });

    let Some(org_state) = state.orgs.get_mut(&org) else {
        return not_found("organization does not exist");
    };
    let Some(resources) = org_state.collections.get_mut(&collection) else {
        return not_found("unknown collection");
    };
    resources.push(resource.clone());
    doc_one(resource)
}

/// DELETE on an org-scoped collection path: the tag batch delete, or the
/// org token destroy.
async fn delete_collection_scoped(
    State(state): State<SharedState>,
    Path((org, collection)): Path<(String, String)>,
    body: axum::body::Bytes,
) -> Response {
    let mut state = state.lock().unwrap();
    state
        .deletions
        .push(format!("/api/v2/organizations/{org}/{collection}"));

    match collection.as_str() {
        "authentication-token" => {
            let Some(org_state) = state.orgs.get_mut(&org) else {
                return not_found("organization does not exist");
            };
            if org_state.has_token {
                org_state.has_token = false;
                StatusCode::NO_CONTENT.into_response()
            } else {
                not_found("no organization token exists")
            }
        }
        "tags" => {
            let payload: Value = serde_json::from_slice(&body).unwrap_or(Value::Null);
            let ids: Vec<String> = payload["data"]
                .as_array()
                .cloned()
                .unwrap_or_default()
                .iter()
                .filter_map(|tag_ref| tag_ref["id"].as_str().map(str::to_string))
                .collect();
            let Some(org_state) = state.orgs.get_mut(&org) else {
                return not_found("organization does not exist");
            };
            let tags = org_state.collections.get_mut("tags").unwrap();
            tags.retain(|tag| {
                tag["id"]
                    .as_str()
                    .is_none_or(|id| !ids.iter().any(|deleted| deleted == id))
            });
            StatusCode::NO_CONTENT.into_response()
        }
        _ => not_found("collection does not support bulk delete"),
    }
}

async fn destroy_by_id(
    State(state): State<SharedState>,
    Path((collection, id)): Path<(String, String)>,
) -> Response {
    remove_from_collection(&state, &collection, &id)
}

/// Workspaces have their own GET route for lock scripting, which also
/// shadows the generic id-scoped DELETE; route it back by hand.
async fn destroy_workspace(State(state): State<SharedState>, Path(id): Path<String>) -> Response {
    remove_from_collection(&state, "workspaces", &id)
}

fn remove_from_collection(state: &SharedState, collection: &str, id: &str) -> Response {
    let mut state = state.lock().unwrap();
    state.deletions.push(format!("/api/v2/{collection}/{id}"));

    for org_state in state.orgs.values_mut() {
        if let Some(resources) = org_state.collections.get_mut(collection) {
            let before = resources.len();
            resources.retain(|resource| resource["id"].as_str() != Some(id));
            if resources.len() < before {
                return StatusCode::NO_CONTENT.into_response();
            }
        }
    }
    not_found("resource does not exist")
}

// =============================================================================
// REGISTRY HANDLERS
// =============================================================================

async fn destroy_registry_module(
    State(state): State<SharedState>,
    Path((org, name)): Path<(String, String)>,
) -> Response {
    let mut state = state.lock().unwrap();
    state
        .deletions
        .push(format!("/api/v2/organizations/{org}/registry-modules/{name}"));
    let Some(org_state) = state.orgs.get_mut(&org) else {
        return not_found("organization does not exist");
    };
    let modules = org_state.collections.get_mut("registry-modules").unwrap();
    let before = modules.len();
    modules.retain(|module| module["attributes"]["name"].as_str() != Some(name.as_str()));
    if modules.len() < before {
        StatusCode::NO_CONTENT.into_response()
    } else {
        not_found("module does not exist")
    }
}

async fn destroy_registry_provider(
    State(state): State<SharedState>,
    Path((org, registry, namespace, name)): Path<(String, String, String, String)>,
) -> Response {
    let mut state = state.lock().unwrap();
    state.deletions.push(format!(
        "/api/v2/organizations/{org}/registry-providers/{registry}/{namespace}/{name}"
    ));
    let Some(org_state) = state.orgs.get_mut(&org) else {
        return not_found("organization does not exist");
    };
    let providers = org_state.collections.get_mut("registry-providers").unwrap();
    let before = providers.len();
    providers.retain(|provider| provider["attributes"]["name"].as_str() != Some(name.as_str()));
    if providers.len() < before {
        StatusCode::NO_CONTENT.into_response()
    } else {
        not_found("provider does not exist")
    }
}

async fn search_registry_modules(
    State(state): State<SharedState>,
    Query(_params): Query<HashMap<String, String>>,
) -> Response {
    let mut state = state.lock().unwrap();
    let calls = state.bump("registry-modules/search");
    if let Some((after, resource)) = state.pending_search.take() {
        if calls >= after {
            state.search_results.push(resource);
        } else {
            state.pending_search = Some((after, resource));
        }
    }
    doc_many(state.search_results.clone())
}

// =============================================================================
// SCRIPTED STATE HANDLERS
// =============================================================================

/// Consumes the front of a script, leaving the final state in place so it
/// repeats on every later fetch.
fn advance<T: Clone>(script: &mut Vec<T>) -> Option<T> {
    match script.len() {
        0 => None,
        1 => Some(script[0].clone()),
        _ => Some(script.remove(0)),
    }
}

async fn show_workspace(State(state): State<SharedState>, Path(id): Path<String>) -> Response {
    let mut state = state.lock().unwrap();
    state.bump(&format!("workspaces/{id}"));

    if let Some(script) = state.workspace_lock_scripts.get_mut(&id) {
        let locked = advance(script).unwrap_or(false);
        return doc_one(json!({
            "id": id,
            "type": "workspaces",
            "attributes": { "name": format!("workspace-{id}"), "locked": locked }
        }));
    }

    for org_state in state.orgs.values() {
        if let Some(workspace) = org_state.collections["workspaces"]
            .iter()
            .find(|workspace| workspace["id"].as_str() == Some(id.as_str()))
        {
            return doc_one(workspace.clone());
        }
    }
    not_found("workspace does not exist")
}

async fn create_run(State(state): State<SharedState>, Json(payload): Json<Value>) -> Response {
    let mut state = state.lock().unwrap();
    let id = state.take_id("run");
    let workspace_id = payload["data"]["relationships"]["workspace"]["data"]["id"].clone();
    let resource = json!({
        "id": id,
        "type": "runs",
        "attributes": {
            "status": "pending",
            "actions": { "is-confirmable": false },
            "workspace-id": workspace_id
        }
    });
    state
        .run_scripts
        .insert(id.clone(), vec![resource["attributes"].clone()]);
    doc_one(resource)
}

async fn show_run(State(state): State<SharedState>, Path(id): Path<String>) -> Response {
    let mut state = state.lock().unwrap();
    state.bump(&format!("runs/{id}"));

    match state.run_scripts.get_mut(&id).and_then(advance) {
        Some(attributes) => doc_one(json!({ "id": id, "type": "runs", "attributes": attributes })),
        None => not_found("run does not exist"),
    }
}

async fn list_state_versions(
    State(state): State<SharedState>,
    Query(params): Query<HashMap<String, String>>,
) -> Response {
    let mut state = state.lock().unwrap();
    let calls = state.bump("state-versions");

    let mut document = json!({ "data": state.state_versions.clone() });
    if params.contains_key("include") && calls >= state.state_version_includes_after {
        document["included"] = json!([
            {
                "id": "svo-1",
                "type": "state-version-outputs",
                "attributes": { "name": "greeting", "value": "hello" }
            }
        ]);
    }
    Json(document).into_response()
}

fn id_prefix(collection: &str) -> &'static str {
    match collection {
        "workspaces" => "ws",
        "policies" => "pol",
        "policy-sets" => "polset",
        "oauth-clients" => "oc",
        "ssh-keys" => "sshkey",
        "teams" => "team",
        "tags" => "tag",
        "organization-memberships" => "ou",
        "agent-pools" => "apool",
        "tasks" => "task",
        "varsets" => "varset",
        "registry-modules" => "mod",
        "registry-providers" => "prov",
        _ => "res",
    }
}
