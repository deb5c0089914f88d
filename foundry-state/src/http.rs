//! HTTP object-store state backend.
//!
//! Speaks plain blob GET/PUT against `{base_url}/{key}` with an optional
//! bearer token. Any store exposing that surface (object-store gateway,
//! artifact server) works; there is no conditional-write protocol here —
//! exclusion comes from the pipeline lock.

use std::time::Duration;

use foundry_core::types::StateDocument;

use crate::error::StateError;
use crate::store::{parse_or_reset, StateStore};

/// State store PUT/GETting a single JSON blob over HTTP.
pub struct HttpStateStore {
    agent: ureq::Agent,
    base_url: String,
    key: String,
    token: Option<String>,
}

impl HttpStateStore {
    pub fn new(base_url: impl Into<String>, key: impl Into<String>, token: Option<String>) -> Self {
        let agent = ureq::AgentBuilder::new()
            .timeout_connect(Duration::from_secs(10))
            .timeout(Duration::from_secs(30))
            .build();
        Self {
            agent,
            base_url: base_url.into().trim_end_matches('/').to_owned(),
            key: key.into(),
            token,
        }
    }

    /// `{base_url}/{key}` — pure, no I/O.
    pub fn object_url(&self) -> String {
        format!("{}/{}", self.base_url, self.key.trim_start_matches('/'))
    }

    fn apply_auth(&self, request: ureq::Request) -> ureq::Request {
        match &self.token {
            Some(token) => request.set("Authorization", &format!("Bearer {token}")),
            None => request,
        }
    }
}

impl StateStore for HttpStateStore {
    fn load(&self) -> Result<StateDocument, StateError> {
        let url = self.object_url();
        let response = match self.apply_auth(self.agent.get(&url)).call() {
            Ok(response) => response,
            Err(ureq::Error::Status(404, _)) => {
                tracing::info!("no existing state at {url}");
                return Ok(StateDocument::default());
            }
            Err(ureq::Error::Status(status, response)) => {
                return Err(StateError::Http {
                    status,
                    body: response.into_string().unwrap_or_default(),
                })
            }
            Err(e) => return Err(StateError::Transport(e.to_string())),
        };

        let body = response
            .into_string()
            .map_err(|e| StateError::Transport(e.to_string()))?;
        Ok(parse_or_reset(&body, &url))
    }

    fn save(&self, doc: &StateDocument) -> Result<(), StateError> {
        let url = self.object_url();
        let json = serde_json::to_string_pretty(doc)?;
        match self
            .apply_auth(self.agent.put(&url))
            .set("Content-Type", "application/json")
            .send_string(&json)
        {
            Ok(_) => {
                tracing::info!("state saved to {url}");
                Ok(())
            }
            Err(ureq::Error::Status(status, response)) => Err(StateError::Http {
                status,
                body: response.into_string().unwrap_or_default(),
            }),
            Err(e) => Err(StateError::Transport(e.to_string())),
        }
    }
}
