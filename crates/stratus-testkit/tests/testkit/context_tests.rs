use std::time::Duration;

use serde_json::json;
use stratus::endpoints::{RunTasks, Runs, Workspaces};
use stratus::{ApiError, Edition, Entitlement};
use stratus_testkit::{SetupError, SkipReason, TestConfig, TestContext, payloads};

use super::mock_service::MockService;

fn config_for(mock: &MockService, edition: Edition) -> TestConfig {
    TestConfig {
        token: "test-token".to_string(),
        org_token: None,
        base_url: mock.base_url().to_string(),
        edition: Some(edition),
        existing_org: None,
        email: "testkit@stratus.dev".to_string(),
        username: "stratus-testkit".to_string(),
        team_name: "stratus-testkit-team".to_string(),
        password: None,
        vcs_token: None,
        verify_tls: true,
        max_test_timeout: Duration::from_secs(30),
        vcs_working_dir: String::new(),
    }
}

#[tokio::test]
async fn test_setup_creates_org_and_teardown_destroys_it() {
    let mock = MockService::start().await;

    let context = TestContext::setup(config_for(&mock, Edition::Cloud), &Workspaces::META)
        .await
        .expect("setup failed");
    let org_name = context.org_name().to_string();
    assert!(org_name.starts_with("stratus-testkit-"));
    assert!(mock.has_org(&org_name));
    assert!(!context.fixtures().config_string.is_empty());

    context.teardown().await.expect("teardown failed");
    assert!(!mock.has_org(&org_name));
}

#[tokio::test]
async fn test_setup_adopts_configured_org_and_never_destroys_it() {
    let mock = MockService::start().await;
    mock.seed_org("shared-org");

    let mut config = config_for(&mock, Edition::Cloud);
    config.existing_org = Some("shared-org".to_string());

    let context = TestContext::setup(config, &Workspaces::META)
        .await
        .expect("setup failed");
    assert_eq!(context.org_name(), "shared-org");

    context.teardown().await.expect("teardown failed");
    assert!(mock.has_org("shared-org"), "adopted orgs must survive teardown");
}

#[tokio::test]
async fn test_setup_fails_when_adopted_org_is_missing() {
    let mock = MockService::start().await;

    let mut config = config_for(&mock, Edition::Cloud);
    config.existing_org = Some("ghost-org".to_string());

    let err = TestContext::setup(config, &Workspaces::META).await.unwrap_err();
    match err {
        SetupError::Api(ApiError::NotFound { .. }) => {}
        other => panic!("expected a not-found error, got {other:?}"),
    }
}

#[tokio::test]
async fn test_setup_purges_preexisting_resources() {
    let mock = MockService::start().await;
    mock.seed_org("dirty-org");
    mock.seed_resource(
        "dirty-org",
        "workspaces",
        json!({ "id": "ws-55", "type": "workspaces", "attributes": { "name": "leftover" } }),
    );

    let mut config = config_for(&mock, Edition::Cloud);
    config.existing_org = Some("dirty-org".to_string());

    let context = TestContext::setup(config, &Workspaces::META)
        .await
        .expect("setup failed");
    assert!(
        mock.deletions().contains(&"/api/v2/workspaces/ws-55".to_string()),
        "setup must leave the org empty"
    );
    context.teardown().await.expect("teardown failed");
}

#[tokio::test]
async fn test_missing_entitlement_skips_and_reclaims_the_org() {
    let mock = MockService::start().await;
    mock.set_default_entitlements(Some(json!({
        "operations": false,
        "state-storage": true
    })));

    let err = TestContext::setup(config_for(&mock, Edition::Cloud), &Runs::META)
        .await
        .unwrap_err();
    match err.as_skip() {
        Some(SkipReason::MissingEntitlements { endpoint, missing }) => {
            assert_eq!(*endpoint, "runs");
            assert_eq!(missing, &vec![Entitlement::Operations]);
        }
        other => panic!("expected an entitlement skip, got {other:?}"),
    }
    assert!(
        mock.org_names().is_empty(),
        "the throwaway org must not leak on skip"
    );
}

#[tokio::test]
async fn test_absent_entitlement_data_skips_conservatively() {
    let mock = MockService::start().await;
    // The entitlement endpoint answers 404 for every org.
    mock.set_default_entitlements(None);

    let err = TestContext::setup(config_for(&mock, Edition::Cloud), &Runs::META)
        .await
        .unwrap_err();
    match err.as_skip() {
        Some(SkipReason::MissingEntitlements { missing, .. }) => {
            assert_eq!(missing, &vec![Entitlement::Operations]);
        }
        other => panic!("expected an entitlement skip, got {other:?}"),
    }
}

#[tokio::test]
async fn test_entitlements_are_ignored_off_cloud() {
    let mock = MockService::start().await;
    // Disabled everywhere, but the self-hosted edition has no entitlement
    // concept, so setup must proceed.
    mock.set_default_entitlements(Some(json!({ "operations": false })));

    let context = TestContext::setup(config_for(&mock, Edition::SelfHosted), &Runs::META)
        .await
        .expect("entitlements must not gate self-hosted runs");
    context.teardown().await.expect("teardown failed");
}

#[tokio::test]
async fn test_cloud_only_endpoint_skips_on_self_hosted() {
    let mock = MockService::start().await;

    let err = TestContext::setup(config_for(&mock, Edition::SelfHosted), &RunTasks::META)
        .await
        .unwrap_err();
    match err.as_skip() {
        Some(SkipReason::EditionMismatch { endpoint, required }) => {
            assert_eq!(*endpoint, "run_tasks");
            assert_eq!(*required, Edition::Cloud);
        }
        other => panic!("expected an edition skip, got {other:?}"),
    }
    assert!(mock.org_names().is_empty());
}

#[tokio::test]
async fn test_payload_builders_roundtrip_through_the_client() {
    let mock = MockService::start().await;

    let context = TestContext::setup(config_for(&mock, Edition::Cloud), &Workspaces::META)
        .await
        .expect("setup failed");
    let api = context.api();

    let workspace_name = payloads::test_name("workspaces");
    let workspace = api
        .workspaces()
        .create(&payloads::workspace_create_payload(&workspace_name))
        .await
        .expect("workspace create failed")
        .into_single()
        .expect("create must return one workspace");
    assert_eq!(workspace.attr_str("name"), Some(workspace_name.as_str()));

    let listed = api.workspaces().list_all().await.expect("list failed");
    assert!(
        listed
            .many()
            .iter()
            .any(|candidate| candidate.attr_str("name") == Some(workspace_name.as_str()))
    );

    let invite = api
        .org_memberships()
        .invite(&payloads::org_membership_invite_payload("new-user@stratus.dev"))
        .await
        .expect("invite failed")
        .into_single()
        .expect("invite must return one membership");
    assert_eq!(invite.attr_str("status"), Some("invited"));

    context.teardown().await.expect("teardown failed");
}

#[tokio::test]
async fn test_wait_options_carry_the_configured_deadline() {
    let mock = MockService::start().await;
    let mut config = config_for(&mock, Edition::Cloud);
    config.max_test_timeout = Duration::from_secs(77);

    let context = TestContext::setup(config, &Workspaces::META)
        .await
        .expect("setup failed");
    assert_eq!(context.wait_options().deadline, Duration::from_secs(77));
    context.teardown().await.expect("teardown failed");
}
