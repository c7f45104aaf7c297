use std::fmt;
use std::time::Duration;

use stratus::{ApiError, Edition, Entitlement};

/// A precondition for the endpoint under test was not met. This is a skip
/// signal, not a failure: the environment simply cannot exercise the
/// endpoint.
#[derive(Debug)]
pub enum SkipReason {
    MissingEntitlements {
        endpoint: &'static str,
        missing: Vec<Entitlement>,
    },
    EditionMismatch {
        endpoint: &'static str,
        required: Edition,
    },
}

impl fmt::Display for SkipReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SkipReason::MissingEntitlements { endpoint, missing } => {
                let keys: Vec<&str> = missing.iter().map(|e| e.as_key()).collect();
                write!(
                    f,
                    "Skipping {endpoint}: organization is missing entitlements [{}]",
                    keys.join(", ")
                )
            }
            SkipReason::EditionMismatch { endpoint, required } => {
                let edition = match required {
                    Edition::Cloud => "hosted",
                    Edition::SelfHosted => "self-hosted",
                };
                write!(f, "Skipping {endpoint}: endpoint requires the {edition} edition")
            }
        }
    }
}

#[derive(Debug)]
pub enum SetupError {
    /// Precondition not met; the suite should skip, not fail.
    Skip(SkipReason),
    /// A remote call during provisioning or purge failed.
    Api(ApiError),
    /// The environment configuration is unusable.
    Config(ConfigError),
    /// A local fixture could not be read.
    Io(std::io::Error),
}

impl SetupError {
    pub fn as_skip(&self) -> Option<&SkipReason> {
        match self {
            SetupError::Skip(reason) => Some(reason),
            _ => None,
        }
    }
}

impl fmt::Display for SetupError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SetupError::Skip(reason) => write!(f, "{reason}"),
            SetupError::Api(err) => write!(f, "Setup failed: {err}"),
            SetupError::Config(err) => write!(f, "Setup failed: {err}"),
            SetupError::Io(err) => write!(f, "Setup failed reading fixtures: {err}"),
        }
    }
}

impl std::error::Error for SetupError {}

impl From<ApiError> for SetupError {
    fn from(err: ApiError) -> Self {
        SetupError::Api(err)
    }
}

impl From<ConfigError> for SetupError {
    fn from(err: ConfigError) -> Self {
        SetupError::Config(err)
    }
}

impl From<std::io::Error> for SetupError {
    fn from(err: std::io::Error) -> Self {
        SetupError::Io(err)
    }
}

/// Waiter failure: either the global deadline elapsed or a poll itself
/// errored. The two are deliberately distinct variants so callers can tell
/// a slow service from a broken one.
#[derive(Debug)]
pub enum WaitError {
    Timeout { waited: Duration },
    Api(ApiError),
}

impl WaitError {
    pub fn is_timeout(&self) -> bool {
        matches!(self, WaitError::Timeout { .. })
    }
}

impl fmt::Display for WaitError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            WaitError::Timeout { waited } => {
                write!(f, "Timed out after {}s waiting for condition", waited.as_secs())
            }
            WaitError::Api(err) => write!(f, "Wait aborted by API error: {err}"),
        }
    }
}

impl std::error::Error for WaitError {}

impl From<ApiError> for WaitError {
    fn from(err: ApiError) -> Self {
        WaitError::Api(err)
    }
}

#[derive(Debug)]
pub enum ConfigError {
    Missing(&'static str),
    Invalid { name: &'static str, reason: String },
}

impl fmt::Display for ConfigError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ConfigError::Missing(name) => write!(f, "Required environment variable {name} is not set"),
            ConfigError::Invalid { name, reason } => write!(f, "Environment variable {name} is invalid: {reason}"),
        }
    }
}

impl std::error::Error for ConfigError {}
