//! # foundry-hub
//!
//! Remote container provisioning and template synchronization.
//!
//! - [`ContainerApi`] — the minimal capability surface the pipeline needs
//!   from a file-bearing container host
//! - [`HubClient`] — ureq implementation speaking a GitHub-compatible REST
//!   protocol
//! - [`SyncEngine`] — walks a local template tree, computes a deterministic
//!   sync plan, applies it with optimistic per-file updates
//! - [`SecretProvisioner`] — sealed-box secret upserts

pub mod api;
pub mod client;
pub mod error;
pub mod secrets;
pub mod sync;

pub use api::{ContainerApi, ContainerInfo, ContainerPublicKey};
pub use client::{HubClient, HubConfig};
pub use error::HubError;
pub use secrets::SecretProvisioner;
pub use sync::{
    plan_local_tree, ExclusionSet, SyncEngine, SyncEntry, SyncOptions, SyncReport,
    DEFAULT_EXCLUDED_SEGMENTS,
};
