//! Typed REST client for the Stratus infrastructure-automation service.
//!
//! The API is organized into resource namespaces scoped to an organization
//! (workspaces, runs, policies, ...). Every namespace speaks the same
//! `data`/`included` document envelope, so the client exposes one generic
//! transport and thin per-resource handles on top of it.

pub mod client;
pub mod document;
pub mod endpoints;
pub mod entitlements;
pub mod error;
pub mod telemetry;

pub use client::{ClientConfig, DEFAULT_CLOUD_URL, Edition, Stratus};
pub use document::{Document, Resource, ResourceRef};
pub use endpoints::EndpointMeta;
pub use entitlements::{Entitlement, EntitlementSet, missing_entitlements};
pub use error::ApiError;

// Re-export logging macros for consistent usage across the crate
pub use log::{debug, error, info, trace, warn};
