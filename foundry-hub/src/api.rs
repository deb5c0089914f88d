//! Container host capability contract.
//!
//! The pipeline depends on exactly this surface; [`crate::HubClient`] is the
//! production implementation, tests substitute in-memory fakes.

use serde::Deserialize;

use crate::error::HubError;

/// Metadata returned for a remote container.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct ContainerInfo {
    pub name: String,
    #[serde(default)]
    pub full_name: Option<String>,
    #[serde(default)]
    pub html_url: Option<String>,
    #[serde(default)]
    pub private: bool,
    #[serde(default)]
    pub description: Option<String>,
}

/// Public encryption key advertised by a container for secret upserts.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct ContainerPublicKey {
    pub key_id: String,
    /// Base64-encoded 32-byte public key.
    pub key: String,
}

/// Minimal create/get/upload surface against a file-bearing container host.
pub trait ContainerApi {
    /// `Ok(None)` when no container with `name` exists.
    fn get_container(&self, name: &str) -> Result<Option<ContainerInfo>, HubError>;

    fn create_container(
        &self,
        name: &str,
        private: bool,
        description: &str,
    ) -> Result<ContainerInfo, HubError>;

    /// Version token of the file at `path`, `Ok(None)` when absent.
    ///
    /// Presence forces update semantics on the next [`Self::put_file`] so a
    /// concurrent remote edit is never silently overwritten.
    fn get_file_version(&self, container: &str, path: &str)
        -> Result<Option<String>, HubError>;

    /// Create (`version` absent) or update (`version` present) a file.
    fn put_file(
        &self,
        container: &str,
        path: &str,
        content: &[u8],
        version: Option<&str>,
        message: &str,
    ) -> Result<(), HubError>;

    fn get_public_key(&self, container: &str) -> Result<ContainerPublicKey, HubError>;

    /// Upsert a secret; `encrypted_value` is the base64 sealed box produced
    /// under the key identified by `key_id`.
    fn put_secret(
        &self,
        container: &str,
        name: &str,
        encrypted_value: &str,
        key_id: &str,
    ) -> Result<(), HubError>;
}
