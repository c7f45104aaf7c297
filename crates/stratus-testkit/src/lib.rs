//! Integration test harness for the `stratus` client.
//!
//! A test suite gets one [`TestContext`] per endpoint under test: setup
//! provisions (or adopts) an organization, verifies entitlement and edition
//! preconditions, and purges every known resource collection so tests start
//! against a known-empty org. Payload builders produce well-formed create
//! requests, and the waiters in [`wait`] absorb the service's eventual
//! consistency.

pub mod config;
pub mod context;
pub mod error;
pub mod fixtures;
pub mod payloads;
pub mod purge;
pub mod wait;

pub use config::TestConfig;
pub use context::TestContext;
pub use error::{ConfigError, SetupError, SkipReason, WaitError};
pub use fixtures::Fixtures;
pub use purge::purge_organization;
pub use wait::{PLAN_WAIT_MAX_POLLS, WaitOptions, poll_until};

// The telemetry entry point lives with the client crate; re-export it so
// test binaries only need one import.
pub use stratus::telemetry;
