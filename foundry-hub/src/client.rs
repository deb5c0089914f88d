//! ureq client speaking a GitHub-compatible container REST protocol.

use std::time::Duration;

use base64::engine::general_purpose::STANDARD as BASE64;
use base64::Engine as _;
use serde::Deserialize;

use crate::api::{ContainerApi, ContainerInfo, ContainerPublicKey};
use crate::error::HubError;

/// Default API base URL.
pub const DEFAULT_API_BASE: &str = "https://api.github.com";

/// Connection settings for [`HubClient`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HubConfig {
    pub api_base: String,
    pub owner: String,
    pub token: String,
}

impl HubConfig {
    pub fn new(owner: impl Into<String>, token: impl Into<String>) -> Self {
        Self {
            api_base: DEFAULT_API_BASE.to_owned(),
            owner: owner.into(),
            token: token.into(),
        }
    }

    pub fn with_api_base(mut self, api_base: impl Into<String>) -> Self {
        self.api_base = api_base.into().trim_end_matches('/').to_owned();
        self
    }
}

/// Version-token envelope of a contents GET.
#[derive(Debug, Deserialize)]
struct FileVersion {
    sha: String,
}

/// Decode a success response body.
fn parse_body<T: serde::de::DeserializeOwned>(response: ureq::Response) -> Result<T, HubError> {
    response.into_json().map_err(|e| HubError::Json(e.to_string()))
}

/// Container host client.
pub struct HubClient {
    agent: ureq::Agent,
    config: HubConfig,
}

impl HubClient {
    pub fn new(config: HubConfig) -> Self {
        let agent = ureq::AgentBuilder::new()
            .timeout_connect(Duration::from_secs(10))
            .timeout(Duration::from_secs(30))
            .build();
        Self { agent, config }
    }

    pub fn owner(&self) -> &str {
        &self.config.owner
    }

    fn url(&self, path: &str) -> String {
        format!("{}{path}", self.config.api_base)
    }

    fn request(&self, method: &str, path: &str) -> ureq::Request {
        self.agent
            .request(method, &self.url(path))
            .set("Authorization", &format!("Bearer {}", self.config.token))
            .set("Accept", "application/vnd.github+json")
    }
}

impl ContainerApi for HubClient {
    fn get_container(&self, name: &str) -> Result<Option<ContainerInfo>, HubError> {
        let owner = &self.config.owner;
        match self.request("GET", &format!("/repos/{owner}/{name}")).call() {
            Ok(response) => Ok(Some(parse_body(response)?)),
            Err(ureq::Error::Status(404, _)) => Ok(None),
            Err(e) => Err(HubError::from_ureq(e)),
        }
    }

    fn create_container(
        &self,
        name: &str,
        private: bool,
        description: &str,
    ) -> Result<ContainerInfo, HubError> {
        let owner = &self.config.owner;
        tracing::info!("creating container {owner}/{name}");
        let response = self
            .request("POST", &format!("/orgs/{owner}/repos"))
            .send_json(serde_json::json!({
                "name": name,
                "private": private,
                "description": description,
                "auto_init": false,
            }))
            .map_err(HubError::from_ureq)?;
        parse_body(response)
    }

    fn get_file_version(
        &self,
        container: &str,
        path: &str,
    ) -> Result<Option<String>, HubError> {
        let owner = &self.config.owner;
        match self
            .request("GET", &format!("/repos/{owner}/{container}/contents/{path}"))
            .call()
        {
            Ok(response) => {
                let version: FileVersion = parse_body(response)?;
                Ok(Some(version.sha))
            }
            Err(ureq::Error::Status(404, _)) => Ok(None),
            Err(e) => Err(HubError::from_ureq(e)),
        }
    }

    fn put_file(
        &self,
        container: &str,
        path: &str,
        content: &[u8],
        version: Option<&str>,
        message: &str,
    ) -> Result<(), HubError> {
        let owner = &self.config.owner;
        let mut payload = serde_json::json!({
            "message": message,
            "content": BASE64.encode(content),
        });
        if let Some(sha) = version {
            payload["sha"] = serde_json::Value::String(sha.to_owned());
        }

        tracing::debug!("uploading {owner}/{container}@{path}");
        self.request("PUT", &format!("/repos/{owner}/{container}/contents/{path}"))
            .send_json(payload)
            .map_err(HubError::from_ureq)?;
        Ok(())
    }

    fn get_public_key(&self, container: &str) -> Result<ContainerPublicKey, HubError> {
        let owner = &self.config.owner;
        let response = self
            .request(
                "GET",
                &format!("/repos/{owner}/{container}/actions/secrets/public-key"),
            )
            .call()
            .map_err(HubError::from_ureq)?;
        parse_body(response)
    }

    fn put_secret(
        &self,
        container: &str,
        name: &str,
        encrypted_value: &str,
        key_id: &str,
    ) -> Result<(), HubError> {
        let owner = &self.config.owner;
        tracing::debug!("upserting secret {name} on {owner}/{container}");
        self.request(
            "PUT",
            &format!("/repos/{owner}/{container}/actions/secrets/{name}"),
        )
        .send_json(serde_json::json!({
            "encrypted_value": encrypted_value,
            "key_id": key_id,
        }))
        .map_err(HubError::from_ureq)?;
        Ok(())
    }
}
