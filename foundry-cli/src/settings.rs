//! Environment → explicit settings mapping.
//!
//! This is the only place the process environment is read. Components take
//! the resulting explicit configuration values; none of them branch on
//! ambient state themselves.
//!
//! | Variable                  | Effect                                           |
//! |---------------------------|--------------------------------------------------|
//! | `FOUNDRY_HUB_TOKEN`       | hub credential (required for non-dry runs)       |
//! | `FOUNDRY_HUB_OWNER`       | hub owner/organization (required likewise)       |
//! | `FOUNDRY_HUB_API`         | hub API base URL (default api.github.com)        |
//! | `FOUNDRY_LOCK_DIR`        | lease directory; unset → no-op lock              |
//! | `FOUNDRY_LOCK_ID`         | lease id (default foundry-pipeline-lock)         |
//! | `FOUNDRY_STATE_URL`       | HTTP state store base; unset → local file        |
//! | `FOUNDRY_STATE_KEY`       | HTTP state object key                            |
//! | `FOUNDRY_STATE_TOKEN`     | HTTP state bearer token                          |
//! | `FOUNDRY_STATE_PATH`      | local state file (default .foundry/state.json)   |
//! | `FOUNDRY_PROJECT_NAME`    | overrides workspace.yaml project_name            |

use std::env;
use std::path::PathBuf;

use foundry_core::ConfigError;
use foundry_hub::HubConfig;
use foundry_lock::{LockConfig, DEFAULT_LOCK_ID, DEFAULT_TTL};
use foundry_state::{StateConfig, DEFAULT_STATE_KEY, DEFAULT_STATE_PATH};

/// Resolved ambient settings.
#[derive(Debug, Clone)]
pub struct Settings {
    pub lock: LockConfig,
    pub state: StateConfig,
    pub project_name_override: Option<String>,
}

impl Settings {
    pub fn from_env() -> Self {
        let lock = match non_empty(env::var("FOUNDRY_LOCK_DIR").ok()) {
            Some(dir) => LockConfig::File {
                dir: PathBuf::from(dir),
                lock_id: non_empty(env::var("FOUNDRY_LOCK_ID").ok())
                    .unwrap_or_else(|| DEFAULT_LOCK_ID.to_owned()),
                ttl: DEFAULT_TTL,
            },
            None => LockConfig::Disabled,
        };

        let state = match non_empty(env::var("FOUNDRY_STATE_URL").ok()) {
            Some(base_url) => StateConfig::Http {
                base_url,
                key: non_empty(env::var("FOUNDRY_STATE_KEY").ok())
                    .unwrap_or_else(|| DEFAULT_STATE_KEY.to_owned()),
                token: non_empty(env::var("FOUNDRY_STATE_TOKEN").ok()),
            },
            None => StateConfig::Local {
                path: non_empty(env::var("FOUNDRY_STATE_PATH").ok())
                    .map(PathBuf::from)
                    .unwrap_or_else(|| PathBuf::from(DEFAULT_STATE_PATH)),
            },
        };

        Self {
            lock,
            state,
            project_name_override: non_empty(env::var("FOUNDRY_PROJECT_NAME").ok()),
        }
    }

    /// Hub credentials, required for any run that talks to the remote.
    pub fn hub_config() -> Result<HubConfig, ConfigError> {
        let token = non_empty(env::var("FOUNDRY_HUB_TOKEN").ok()).ok_or(
            ConfigError::MissingSetting {
                name: "FOUNDRY_HUB_TOKEN",
            },
        )?;
        let owner = non_empty(env::var("FOUNDRY_HUB_OWNER").ok()).ok_or(
            ConfigError::MissingSetting {
                name: "FOUNDRY_HUB_OWNER",
            },
        )?;

        let mut config = HubConfig::new(owner, token);
        if let Some(base) = non_empty(env::var("FOUNDRY_HUB_API").ok()) {
            config = config.with_api_base(base);
        }
        Ok(config)
    }

    /// Value of the configured secret's environment variable, if set.
    pub fn secret_value(env_name: &str) -> Option<String> {
        non_empty(env::var(env_name).ok())
    }
}

fn non_empty(value: Option<String>) -> Option<String> {
    value.filter(|s| !s.trim().is_empty())
}
