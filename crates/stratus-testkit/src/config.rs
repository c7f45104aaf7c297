//! Environment-sourced configuration for the harness.
//!
//! Everything a test run needs comes in through `STRATUS_*` variables so CI
//! and local runs configure themselves the same way. Log verbosity rides
//! the usual `RUST_LOG` via [`stratus::telemetry::init`].

use std::env;
use std::time::Duration;

use stratus::{ClientConfig, DEFAULT_CLOUD_URL, Edition};

use crate::error::ConfigError;

pub const ENV_TOKEN: &str = "STRATUS_TOKEN";
pub const ENV_ORG_TOKEN: &str = "STRATUS_ORG_TOKEN";
pub const ENV_URL: &str = "STRATUS_URL";
pub const ENV_EDITION: &str = "STRATUS_EDITION";
pub const ENV_TEST_ORG: &str = "STRATUS_TEST_ORG";
pub const ENV_TEST_EMAIL: &str = "STRATUS_TEST_EMAIL";
pub const ENV_TEST_USERNAME: &str = "STRATUS_TEST_USERNAME";
pub const ENV_TEST_TEAM: &str = "STRATUS_TEST_TEAM";
pub const ENV_TEST_PASSWORD: &str = "STRATUS_TEST_PASSWORD";
pub const ENV_VCS_TOKEN: &str = "STRATUS_VCS_TOKEN";
pub const ENV_SSL_VERIFY: &str = "STRATUS_SSL_VERIFY";
pub const ENV_MAX_TEST_TIMEOUT: &str = "STRATUS_MAX_TEST_TIMEOUT";
pub const ENV_VCS_WORKING_DIR: &str = "STRATUS_VCS_WORKING_DIR";

#[derive(Debug, Clone)]
pub struct TestConfig {
    pub token: String,
    pub org_token: Option<String>,
    pub base_url: String,
    /// Explicit edition override; detection falls back to the base URL.
    pub edition: Option<Edition>,
    /// When set, the named org is adopted instead of creating a throwaway
    /// one, and teardown leaves it alone.
    pub existing_org: Option<String>,
    pub email: String,
    pub username: String,
    pub team_name: String,
    pub password: Option<String>,
    pub vcs_token: Option<String>,
    pub verify_tls: bool,
    /// Wall-clock budget for any single waiter.
    pub max_test_timeout: Duration,
    pub vcs_working_dir: String,
}

impl TestConfig {
    pub fn from_env() -> Result<Self, ConfigError> {
        let token = require(ENV_TOKEN)?;
        let email = require(ENV_TEST_EMAIL)?;

        Ok(TestConfig {
            token,
            org_token: optional(ENV_ORG_TOKEN),
            base_url: optional(ENV_URL).unwrap_or_else(|| DEFAULT_CLOUD_URL.to_string()),
            edition: parse_edition(optional(ENV_EDITION))?,
            existing_org: optional(ENV_TEST_ORG),
            email,
            username: optional(ENV_TEST_USERNAME).unwrap_or_else(|| "stratus-testkit".to_string()),
            team_name: optional(ENV_TEST_TEAM).unwrap_or_else(|| "stratus-testkit-team".to_string()),
            password: optional(ENV_TEST_PASSWORD),
            vcs_token: optional(ENV_VCS_TOKEN),
            verify_tls: parse_bool(ENV_SSL_VERIFY, optional(ENV_SSL_VERIFY), true)?,
            max_test_timeout: parse_timeout(optional(ENV_MAX_TEST_TIMEOUT))?,
            vcs_working_dir: optional(ENV_VCS_WORKING_DIR).unwrap_or_default(),
        })
    }

    pub fn client_config(&self) -> ClientConfig {
        let mut config = ClientConfig::new(self.token.clone())
            .with_base_url(self.base_url.clone())
            .with_verify_tls(self.verify_tls);
        if let Some(edition) = self.edition {
            config = config.with_edition(edition);
        }
        config
    }
}

fn require(name: &'static str) -> Result<String, ConfigError> {
    optional(name).ok_or(ConfigError::Missing(name))
}

fn optional(name: &str) -> Option<String> {
    match env::var(name) {
        Ok(value) if !value.trim().is_empty() => Some(value),
        _ => None,
    }
}

fn parse_edition(raw: Option<String>) -> Result<Option<Edition>, ConfigError> {
    match raw.as_deref() {
        None => Ok(None),
        Some("cloud") => Ok(Some(Edition::Cloud)),
        Some("self-hosted") => Ok(Some(Edition::SelfHosted)),
        Some(other) => Err(ConfigError::Invalid {
            name: ENV_EDITION,
            reason: format!("expected 'cloud' or 'self-hosted', got '{other}'"),
        }),
    }
}

fn parse_bool(name: &'static str, raw: Option<String>, default: bool) -> Result<bool, ConfigError> {
    let Some(value) = raw else {
        return Ok(default);
    };
    let trimmed = value.trim();
    if trimmed.eq_ignore_ascii_case("true") || trimmed == "1" {
        Ok(true)
    } else if trimmed.eq_ignore_ascii_case("false") || trimmed == "0" {
        Ok(false)
    } else {
        Err(ConfigError::Invalid {
            name,
            reason: format!("expected 1, 0, true, or false, got '{trimmed}'"),
        })
    }
}

/// Resolves the waiter budget. CI boxes are slower and noisier than
/// developer machines, so the default is extended there, mirroring how the
/// rest of our integration tooling picks timeouts.
fn parse_timeout(raw: Option<String>) -> Result<Duration, ConfigError> {
    if let Some(value) = raw {
        let secs: u64 = value.trim().parse().map_err(|_| ConfigError::Invalid {
            name: ENV_MAX_TEST_TIMEOUT,
            reason: format!("expected a positive integer number of seconds, got '{value}'"),
        })?;
        if secs == 0 {
            return Err(ConfigError::Invalid {
                name: ENV_MAX_TEST_TIMEOUT,
                reason: "must be greater than zero".to_string(),
            });
        }
        return Ok(Duration::from_secs(secs));
    }
    if env::var("CI").is_ok() {
        Ok(Duration::from_secs(300))
    } else {
        Ok(Duration::from_secs(120))
    }
}
