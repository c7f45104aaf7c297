//! Resets an organization to an empty state before a suite runs.
//!
//! Deletion order matters: anything holding a VCS token reference
//! (workspaces, policy sets) must go before the OAuth clients they point
//! at, and the org itself can only be destroyed once every collection is
//! empty. "Not found" is only tolerated where a whole feature can be
//! absent (registry collections, the org token); any other error aborts
//! the purge immediately.

use log::{debug, info};

use stratus::{ApiError, Stratus};

use crate::payloads;

/// The default team every organization carries; it cannot be deleted.
const OWNERS_TEAM: &str = "owners";

#[tracing::instrument(level = "debug", skip(api))]
pub async fn purge_organization(api: &Stratus) -> Result<(), ApiError> {
    let org = api.org()?.to_string();
    info!("Purging test org ({org}) of all resources to start fresh...");

    debug!("Purging test org ({org}) of workspaces...");
    for workspace in api.workspaces().list_all().await?.many() {
        api.workspaces().destroy(workspace.require_id()?).await?;
    }
    debug!("Workspaces purged from test org ({org}).");

    purge_module_registry(api, &org).await?;
    purge_provider_registry(api, &org).await?;

    debug!("Purging test org ({org}) of policies...");
    for policy in api.policies().list_all().await?.many() {
        api.policies().destroy(policy.require_id()?).await?;
    }
    debug!("Policies purged from test org ({org}).");

    debug!("Purging test org ({org}) of policy sets...");
    for policy_set in api.policy_sets().list_all().await?.many() {
        api.policy_sets().destroy(policy_set.require_id()?).await?;
    }
    debug!("Policy sets purged from test org ({org}).");

    // Everything referencing a VCS token is gone now; the clients can go.
    debug!("Purging test org ({org}) of OAuth clients...");
    for oauth_client in api.oauth_clients().list().await?.many() {
        api.oauth_clients().destroy(oauth_client.require_id()?).await?;
    }
    debug!("OAuth clients purged from test org ({org}).");

    debug!("Purging test org ({org}) of SSH keys...");
    for ssh_key in api.ssh_keys().list().await?.many() {
        api.ssh_keys().destroy(ssh_key.require_id()?).await?;
    }
    debug!("SSH keys purged from test org ({org}).");

    // Deleting a team cascades to its memberships and tokens.
    debug!("Purging test org ({org}) of teams...");
    for team in api.teams().list().await?.many() {
        if team.attr_str("name") != Some(OWNERS_TEAM) {
            api.teams().destroy(team.require_id()?).await?;
        }
    }
    debug!("Teams purged from test org ({org}).");

    debug!("Purging test org ({org}) of org tags...");
    let tags = api.org_tags().list().await?;
    let tag_ids: Vec<String> = tags
        .many()
        .iter()
        .map(|tag| tag.require_id().map(str::to_string))
        .collect::<Result<_, _>>()?;
    if !tag_ids.is_empty() {
        api.org_tags()
            .delete_tags(&payloads::org_tag_delete_payload(&tag_ids))
            .await?;
    }
    debug!("Org tags purged from test org ({org}).");

    // Only pending invites are removable; active memberships stay.
    debug!("Purging test org ({org}) of org membership invites...");
    for membership in api.org_memberships().list_all_for_org().await?.many() {
        if membership.attr_str("status") == Some("invited") {
            api.org_memberships().remove(membership.require_id()?).await?;
        }
    }
    debug!("Org member invites purged from test org ({org}).");

    debug!("Purging test org ({org}) of agent pools...");
    for agent_pool in api.agent_pools().list().await?.many() {
        api.agent_pools().destroy(agent_pool.require_id()?).await?;
    }
    debug!("Agent pools purged from test org ({org}).");

    // TODO: fold these into the unconditional sequence once run tasks and
    // variable sets ship on self-hosted installs.
    if api.is_cloud() {
        debug!("Purging test org ({org}) of run tasks...");
        for run_task in api.run_tasks().list_all().await?.many() {
            api.run_tasks().destroy(run_task.require_id()?).await?;
        }
        debug!("Run tasks purged from test org ({org}).");

        debug!("Purging test org ({org}) of variable sets...");
        for variable_set in api.variable_sets().list_for_org().await?.many() {
            api.variable_sets().destroy(variable_set.require_id()?).await?;
        }
        debug!("Variable sets purged from test org ({org}).");
    }

    debug!("Purging org token from test org ({org})...");
    match api.org_tokens().destroy().await {
        Ok(()) => debug!("Org token purged from test org ({org})."),
        Err(err) if err.is_not_found() => {
            debug!("No org token exists for test org ({org}).");
        }
        Err(err) => return Err(err),
    }

    Ok(())
}

/// The registry feature may be entirely absent, in which case the listing
/// itself answers 404; that is not a purge failure.
async fn purge_module_registry(api: &Stratus, org: &str) -> Result<(), ApiError> {
    debug!("Purging test org ({org}) of registry modules...");
    match api.registry_modules().list().await {
        Ok(modules) => {
            for module in modules.many() {
                let name = module.attr_str("name").ok_or_else(|| {
                    ApiError::Decode("registry module is missing a name attribute".to_string())
                })?;
                api.registry_modules().destroy(name).await?;
            }
            debug!("Registry modules purged from test org ({org}).");
            Ok(())
        }
        Err(err) if err.is_not_found() => {
            debug!("No registry modules exist in this org, skipping.");
            Ok(())
        }
        Err(err) => Err(err),
    }
}

async fn purge_provider_registry(api: &Stratus, org: &str) -> Result<(), ApiError> {
    debug!("Purging test org ({org}) of registry providers...");
    match api.registry_providers().list().await {
        Ok(providers) => {
            for provider in providers.many() {
                let registry_name = provider.attr_str("registry-name").unwrap_or("private");
                let namespace = provider.attr_str("namespace").unwrap_or(org);
                let name = provider.attr_str("name").ok_or_else(|| {
                    ApiError::Decode("registry provider is missing a name attribute".to_string())
                })?;
                api.registry_providers()
                    .destroy(registry_name, namespace, name)
                    .await?;
            }
            debug!("Registry providers purged from test org ({org}).");
            Ok(())
        }
        Err(err) if err.is_not_found() => {
            debug!("No registry providers exist in this org, skipping.");
            Ok(())
        }
        Err(err) => Err(err),
    }
}
