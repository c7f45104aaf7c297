//! Per-suite test environment: one organization, one bound client, one set
//! of fixtures, owned for the suite's lifetime and torn down explicitly.

use log::{debug, info};

use stratus::{ApiError, EndpointMeta, Stratus, missing_entitlements};

use crate::config::TestConfig;
use crate::error::{SetupError, SkipReason};
use crate::fixtures::Fixtures;
use crate::payloads;
use crate::purge::purge_organization;
use crate::wait::WaitOptions;

#[derive(Debug)]
pub struct TestContext {
    api: Stratus,
    org_name: String,
    auto_created: bool,
    fixtures: Fixtures,
    config: TestConfig,
}

impl TestContext {
    /// Establishes a usable, empty organization for the endpoint under
    /// test.
    ///
    /// When `config.existing_org` is set that org is adopted (fetched, and
    /// never destroyed at teardown); otherwise a uniquely named org is
    /// created and owned by this context. After binding, entitlement and
    /// edition preconditions are checked — an unmet one yields
    /// [`SetupError::Skip`], which is a skip signal rather than a failure —
    /// and finally the org is purged of any pre-existing resources.
    pub async fn setup(
        config: TestConfig,
        endpoint: &EndpointMeta,
    ) -> Result<Self, SetupError> {
        let mut api = Stratus::new(config.client_config())?;

        let (org_name, auto_created) = match &config.existing_org {
            Some(name) => {
                info!("Adopting existing org {name} for {} tests", endpoint.name);
                api.organizations().show(name).await?;
                (name.clone(), false)
            }
            None => {
                let name = payloads::random_org_name();
                info!("Creating org {name} for {} tests", endpoint.name);
                api.organizations()
                    .create(&payloads::org_create_payload(&name, &config.email))
                    .await?;
                (name, true)
            }
        };
        api.set_org(&org_name);

        if let Err(err) = check_preconditions(&api, endpoint).await {
            // A skipped suite runs no teardown, so reclaim the throwaway
            // org here instead of leaking it.
            if auto_created {
                let _ = api.organizations().destroy(&org_name).await;
            }
            return Err(err);
        }

        purge_organization(&api).await?;

        let fixtures = Fixtures::load()?;

        Ok(TestContext {
            api,
            org_name,
            auto_created,
            fixtures,
            config,
        })
    }

    pub fn api(&self) -> &Stratus {
        &self.api
    }

    pub fn org_name(&self) -> &str {
        &self.org_name
    }

    pub fn fixtures(&self) -> &Fixtures {
        &self.fixtures
    }

    pub fn config(&self) -> &TestConfig {
        &self.config
    }

    /// Waiter options carrying the configured per-call deadline.
    pub fn wait_options(&self) -> WaitOptions {
        WaitOptions::new(self.config.max_test_timeout)
    }

    /// Destroys the organization if this context created it; adopted orgs
    /// are left untouched.
    pub async fn teardown(self) -> Result<(), ApiError> {
        if self.auto_created {
            debug!("Destroying autogenerated org {}...", self.org_name);
            self.api.organizations().destroy(&self.org_name).await?;
            debug!("Destroyed autogenerated org {}.", self.org_name);
        } else {
            debug!("Leaving adopted org {} in place.", self.org_name);
        }
        Ok(())
    }
}

async fn check_preconditions(
    api: &Stratus,
    endpoint: &EndpointMeta,
) -> Result<(), SetupError> {
    let current = api.entitlements().await?;
    let missing =
        missing_entitlements(endpoint.required_entitlements, current.as_ref(), api.is_cloud());
    if !missing.is_empty() {
        return Err(SetupError::Skip(SkipReason::MissingEntitlements {
            endpoint: endpoint.name,
            missing,
        }));
    }

    if api.is_cloud() && endpoint.self_hosted_only {
        return Err(SetupError::Skip(SkipReason::EditionMismatch {
            endpoint: endpoint.name,
            required: stratus::Edition::SelfHosted,
        }));
    }
    if !api.is_cloud() && endpoint.cloud_only {
        return Err(SetupError::Skip(SkipReason::EditionMismatch {
            endpoint: endpoint.name,
            required: stratus::Edition::Cloud,
        }));
    }

    Ok(())
}
