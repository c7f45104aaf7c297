//! Eventual-consistency waiters.
//!
//! The service acknowledges mutations before their effects are readable, so
//! tests re-poll until the state they provoked becomes visible. All waiters
//! share one primitive: re-fetch on a fixed interval until a predicate
//! holds, under a single wall-clock deadline. There is no backoff or
//! jitter; the deadline is the only cancellation mechanism.

use std::future::Future;
use std::time::Duration;

use log::{debug, warn};
use serde_json::Value;
use tokio::time::{sleep, timeout};

use stratus::endpoints::StateVersionFilters;
use stratus::{ApiError, Document, Resource, Stratus};

use crate::error::WaitError;

/// Fixed delay between polls.
pub const DEFAULT_POLL_INTERVAL: Duration = Duration::from_secs(1);

/// Poll cap for [`run_planned`]; see its docs for the fallthrough contract.
pub const PLAN_WAIT_MAX_POLLS: u32 = 20;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct WaitOptions {
    pub interval: Duration,
    /// Overall wall-clock budget; exceeding it yields `WaitError::Timeout`.
    pub deadline: Duration,
}

impl WaitOptions {
    pub fn new(deadline: Duration) -> Self {
        WaitOptions {
            interval: DEFAULT_POLL_INTERVAL,
            deadline,
        }
    }

    pub fn with_interval(mut self, interval: Duration) -> Self {
        self.interval = interval;
        self
    }
}

/// Re-fetches until `predicate` accepts the fetched value, sleeping
/// `options.interval` between attempts, all under `options.deadline`.
///
/// Fetch errors abort immediately as `WaitError::Api`; only deadline expiry
/// produces `WaitError::Timeout`.
pub async fn poll_until<T, F, Fut, P>(
    options: WaitOptions,
    mut fetch: F,
    mut predicate: P,
) -> Result<T, WaitError>
where
    F: FnMut() -> Fut,
    Fut: Future<Output = Result<T, ApiError>>,
    P: FnMut(&T) -> bool,
{
    let poll = async {
        let mut value = fetch().await?;
        while !predicate(&value) {
            sleep(options.interval).await;
            value = fetch().await?;
        }
        Ok::<T, ApiError>(value)
    };
    match timeout(options.deadline, poll).await {
        Ok(Ok(value)) => Ok(value),
        Ok(Err(err)) => Err(WaitError::Api(err)),
        Err(_) => Err(WaitError::Timeout {
            waited: options.deadline,
        }),
    }
}

/// Waits for a freshly created run to finish planning: status
/// `planned_and_finished`, or the run becoming confirmable, whichever
/// comes first.
///
/// Polling stops after [`PLAN_WAIT_MAX_POLLS`] even if neither condition
/// holds. In that case the last-observed run is still returned, with
/// `settled == false` so callers can tell the fallthrough apart from a
/// finished plan.
#[tracing::instrument(level = "debug", skip(api, options), fields(run_id = %run_id))]
pub async fn run_planned(
    api: &Stratus,
    run_id: &str,
    options: WaitOptions,
) -> Result<(Resource, bool), WaitError> {
    let poll = async {
        let mut run = api.runs().show(run_id).await?.into_single()?;
        let mut polls_waited: u32 = 0;
        while !plan_settled(&run) && polls_waited != PLAN_WAIT_MAX_POLLS {
            debug!("Waiting for run {run_id} to finish planning...");
            sleep(options.interval).await;
            run = api.runs().show(run_id).await?.into_single()?;
            polls_waited += 1;
        }
        Ok::<Resource, ApiError>(run)
    };
    match timeout(options.deadline, poll).await {
        Ok(Ok(run)) => {
            let settled = plan_settled(&run);
            if settled {
                debug!("Plan finished for run {run_id}.");
            } else {
                warn!(
                    "Run {run_id} did not finish planning within {PLAN_WAIT_MAX_POLLS} polls; \
                     returning last observed state"
                );
            }
            Ok((run, settled))
        }
        Ok(Err(err)) => Err(WaitError::Api(err)),
        Err(_) => Err(WaitError::Timeout {
            waited: options.deadline,
        }),
    }
}

fn plan_settled(run: &Resource) -> bool {
    run.attr_str("status") == Some("planned_and_finished")
        || run
            .attr("actions")
            .and_then(|actions| actions.get("is-confirmable"))
            .and_then(Value::as_bool)
            .unwrap_or(false)
}

/// Waits for a run to reach status `applied`. Unlike [`run_planned`] there
/// is no poll cap; only the deadline bounds this.
#[tracing::instrument(level = "debug", skip(api, options), fields(run_id = %run_id))]
pub async fn run_applied(
    api: &Stratus,
    run_id: &str,
    options: WaitOptions,
) -> Result<Resource, WaitError> {
    let run = poll_until(
        options,
        || async move {
            debug!("Waiting for run {run_id} to finish applying...");
            api.runs().show(run_id).await?.into_single()
        },
        |run| run.attr_str("status") == Some("applied"),
    )
    .await?;
    debug!("Apply finished for run {run_id}.");
    Ok(run)
}

/// Waits for a workspace's `locked` flag to clear.
#[tracing::instrument(level = "debug", skip(api, options), fields(workspace_id = %workspace_id))]
pub async fn workspace_unlocked(
    api: &Stratus,
    workspace_id: &str,
    options: WaitOptions,
) -> Result<Resource, WaitError> {
    let workspace = poll_until(
        options,
        || async move {
            debug!("Waiting for workspace {workspace_id} to be unlocked...");
            api.workspaces().show(workspace_id).await?.into_single()
        },
        |workspace| !workspace.attr_bool("locked").unwrap_or(false),
    )
    .await?;
    debug!("Workspace {workspace_id} unlocked.");
    Ok(workspace)
}

/// Waits for a published module to show up in the registry listing.
/// Returns the final listing plus a found flag.
pub async fn module_listed(
    api: &Stratus,
    module_name: &str,
    options: WaitOptions,
) -> Result<(Vec<Resource>, bool), WaitError> {
    let modules = poll_until(
        options,
        || async move {
            debug!("Waiting for published module {module_name} to appear in listings...");
            Ok(api.registry_modules().list().await?.into_many())
        },
        |modules| {
            modules
                .iter()
                .any(|module| module.attr_str("name") == Some(module_name))
        },
    )
    .await?;
    debug!("Published module {module_name} found.");
    Ok((modules, true))
}

/// Waits for registry search to return a result in the target namespace.
/// Returns the final result set plus a found flag.
pub async fn module_search(
    api: &Stratus,
    namespace: &str,
    options: WaitOptions,
) -> Result<(Vec<Resource>, bool), WaitError> {
    let results = poll_until(
        options,
        || async move {
            debug!("Waiting for module search to cover namespace {namespace}...");
            Ok(api.registry_modules().search(namespace).await?.into_many())
        },
        |results| {
            results
                .iter()
                .any(|module| module.attr_str("namespace") == Some(namespace))
        },
    )
    .await?;
    debug!("Module search result found for namespace {namespace}.");
    Ok((results, true))
}

/// Waits for a state-version listing to come back with its `included`
/// section materialized. Returns the raw document plus a found flag.
pub async fn state_version_includes(
    api: &Stratus,
    filters: &StateVersionFilters,
    include: Option<&str>,
    list_all: bool,
    options: WaitOptions,
) -> Result<(Document, bool), WaitError> {
    let document = poll_until(
        options,
        || async move {
            debug!("Waiting for state version listing to return includes...");
            if list_all {
                api.state_versions().list_all(filters, include).await
            } else {
                api.state_versions().list(filters, include).await
            }
        },
        Document::has_included,
    )
    .await?;
    Ok((document, true))
}
