//! Workspace configuration (`workspace.yaml`) loading and defaulting.
//!
//! Components never read environment variables themselves; the CLI resolves
//! ambient settings (credentials, backend selection, name overrides) and
//! passes them in explicitly. This module only knows about the workspace
//! file and an optional project-name override.

use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::error::ConfigError;

// ---------------------------------------------------------------------------
// Sections
// ---------------------------------------------------------------------------

/// Observability wiring recorded into the state document.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ObservabilityConfig {
    #[serde(default = "default_true")]
    pub enabled: bool,
    #[serde(default = "default_observability_tool")]
    pub tool: String,
}

impl Default for ObservabilityConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            tool: default_observability_tool(),
        }
    }
}

/// Accepts both the section form and a legacy bare boolean:
///
/// ```yaml
/// observability: false
/// # or
/// observability:
///   enabled: false
///   tool: phoenix
/// ```
#[derive(Debug, Deserialize)]
#[serde(untagged)]
enum ObservabilityCompat {
    Section(ObservabilityConfig),
    Toggle(bool),
}

impl From<ObservabilityCompat> for ObservabilityConfig {
    fn from(compat: ObservabilityCompat) -> Self {
        match compat {
            ObservabilityCompat::Section(section) => section,
            ObservabilityCompat::Toggle(enabled) => Self {
                enabled,
                ..Self::default()
            },
        }
    }
}

/// Optional prefix/suffix wrapped around the derived slug when a container
/// name is first assigned.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, Default)]
pub struct NamingConfig {
    #[serde(default)]
    pub prefix: String,
    #[serde(default)]
    pub suffix: String,
}

/// Sync tuning: extra exclusion segments on top of the built-in set.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, Default)]
pub struct SyncConfig {
    #[serde(default)]
    pub exclude: Vec<String>,
}

/// The secret provisioned into the container after a successful sync.
///
/// `env` names the environment variable holding the value; the CLI resolves
/// it and the pipeline skips the step when the variable is unset.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SecretConfig {
    #[serde(default = "default_secret_name")]
    pub name: String,
    #[serde(default = "default_secret_env")]
    pub env: String,
}

impl Default for SecretConfig {
    fn default() -> Self {
        Self {
            name: default_secret_name(),
            env: default_secret_env(),
        }
    }
}

// ---------------------------------------------------------------------------
// Workspace config
// ---------------------------------------------------------------------------

/// Parsed and validated `workspace.yaml`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct WorkspaceConfig {
    #[serde(default = "default_version")]
    pub version: u32,
    pub project_name: String,
    #[serde(default)]
    pub description: String,
    #[serde(default = "default_true")]
    pub private: bool,
    #[serde(default)]
    pub observability: ObservabilityConfig,
    #[serde(default = "default_templates_folder")]
    pub templates_folder: String,
    #[serde(default)]
    pub naming: NamingConfig,
    #[serde(default)]
    pub sync: SyncConfig,
    #[serde(default)]
    pub secret: SecretConfig,
}

/// Raw form with every field optional, so a missing `project_name` can be
/// filled by the override before validation rejects it.
#[derive(Debug, Deserialize)]
struct RawWorkspace {
    #[serde(default = "default_version")]
    version: u32,
    #[serde(default)]
    project_name: Option<String>,
    #[serde(default)]
    description: String,
    #[serde(default = "default_true")]
    private: bool,
    #[serde(default)]
    observability: Option<ObservabilityCompat>,
    #[serde(default = "default_templates_folder")]
    templates_folder: String,
    #[serde(default)]
    naming: NamingConfig,
    #[serde(default)]
    sync: SyncConfig,
    #[serde(default)]
    secret: SecretConfig,
}

impl WorkspaceConfig {
    /// Load `workspace.yaml` from `path`, applying defaults.
    ///
    /// `name_override` takes precedence over the file's `project_name`
    /// (pipeline-trigger input); validation requires one of the two.
    pub fn load(path: &Path, name_override: Option<&str>) -> Result<Self, ConfigError> {
        if !path.exists() {
            return Err(ConfigError::WorkspaceNotFound {
                path: path.to_path_buf(),
            });
        }
        let contents = std::fs::read_to_string(path).map_err(|e| ConfigError::Io {
            path: path.to_path_buf(),
            source: e,
        })?;
        let raw: RawWorkspace =
            serde_yaml::from_str(&contents).map_err(|e| ConfigError::Parse {
                path: path.to_path_buf(),
                source: e,
            })?;

        let project_name = name_override
            .map(str::to_owned)
            .filter(|s| !s.is_empty())
            .or(raw.project_name)
            .filter(|s| !s.is_empty())
            .ok_or(ConfigError::MissingProjectName)?;

        Ok(Self {
            version: raw.version,
            project_name,
            description: raw.description,
            private: raw.private,
            observability: raw.observability.map(Into::into).unwrap_or_default(),
            templates_folder: raw.templates_folder,
            naming: raw.naming,
            sync: raw.sync,
            secret: raw.secret,
        })
    }

    /// Container description used when one isn't configured.
    pub fn container_description(&self) -> String {
        if self.description.is_empty() {
            format!("Provisioned container for {}", self.project_name)
        } else {
            self.description.clone()
        }
    }
}

fn default_version() -> u32 {
    1
}

fn default_true() -> bool {
    true
}

fn default_observability_tool() -> String {
    "phoenix".to_owned()
}

fn default_templates_folder() -> String {
    "templates".to_owned()
}

fn default_secret_name() -> String {
    "OBSERVABILITY_API_KEY".to_owned()
}

fn default_secret_env() -> String {
    "FOUNDRY_OBSERVABILITY_KEY".to_owned()
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use std::fs;

    use tempfile::TempDir;

    use super::*;
    use crate::error::ConfigError;

    fn write_workspace(dir: &TempDir, contents: &str) -> std::path::PathBuf {
        let path = dir.path().join("workspace.yaml");
        fs::write(&path, contents).expect("write workspace");
        path
    }

    #[test]
    fn minimal_workspace_gets_defaults() {
        let dir = TempDir::new().expect("tempdir");
        let path = write_workspace(&dir, "project_name: Acme Corp\n");
        let cfg = WorkspaceConfig::load(&path, None).expect("load");

        assert_eq!(cfg.project_name, "Acme Corp");
        assert_eq!(cfg.version, 1);
        assert!(cfg.private);
        assert!(cfg.observability.enabled);
        assert_eq!(cfg.observability.tool, "phoenix");
        assert_eq!(cfg.templates_folder, "templates");
        assert_eq!(cfg.naming, NamingConfig::default());
        assert!(cfg.sync.exclude.is_empty());
    }

    #[test]
    fn missing_file_is_workspace_not_found() {
        let dir = TempDir::new().expect("tempdir");
        let err = WorkspaceConfig::load(&dir.path().join("nope.yaml"), None).unwrap_err();
        assert!(matches!(err, ConfigError::WorkspaceNotFound { .. }), "got: {err}");
    }

    #[test]
    fn missing_project_name_rejected() {
        let dir = TempDir::new().expect("tempdir");
        let path = write_workspace(&dir, "description: no name here\n");
        let err = WorkspaceConfig::load(&path, None).unwrap_err();
        assert!(matches!(err, ConfigError::MissingProjectName), "got: {err}");
    }

    #[test]
    fn override_beats_file_and_fills_missing() {
        let dir = TempDir::new().expect("tempdir");
        let path = write_workspace(&dir, "project_name: from-file\n");
        let cfg = WorkspaceConfig::load(&path, Some("from-trigger")).expect("load");
        assert_eq!(cfg.project_name, "from-trigger");

        let bare = write_workspace(&dir, "description: only\n");
        let cfg = WorkspaceConfig::load(&bare, Some("injected")).expect("load");
        assert_eq!(cfg.project_name, "injected");
    }

    #[test]
    fn empty_override_does_not_mask_file_name() {
        let dir = TempDir::new().expect("tempdir");
        let path = write_workspace(&dir, "project_name: from-file\n");
        let cfg = WorkspaceConfig::load(&path, Some("")).expect("load");
        assert_eq!(cfg.project_name, "from-file");
    }

    #[test]
    fn observability_accepts_bare_boolean() {
        let dir = TempDir::new().expect("tempdir");
        let path = write_workspace(&dir, "project_name: p\nobservability: false\n");
        let cfg = WorkspaceConfig::load(&path, None).expect("load");
        assert!(!cfg.observability.enabled);
        assert_eq!(cfg.observability.tool, "phoenix");
    }

    #[test]
    fn observability_section_parses() {
        let dir = TempDir::new().expect("tempdir");
        let path = write_workspace(
            &dir,
            "project_name: p\nobservability:\n  enabled: true\n  tool: custom\n",
        );
        let cfg = WorkspaceConfig::load(&path, None).expect("load");
        assert!(cfg.observability.enabled);
        assert_eq!(cfg.observability.tool, "custom");
    }

    #[test]
    fn malformed_yaml_is_parse_error_with_path() {
        let dir = TempDir::new().expect("tempdir");
        let path = write_workspace(&dir, ": : not yaml : [unclosed");
        let err = WorkspaceConfig::load(&path, None).unwrap_err();
        assert!(matches!(err, ConfigError::Parse { .. }), "got: {err}");
        assert!(err.to_string().contains("workspace.yaml"));
    }

    #[test]
    fn container_description_falls_back() {
        let dir = TempDir::new().expect("tempdir");
        let path = write_workspace(&dir, "project_name: Acme Corp\n");
        let cfg = WorkspaceConfig::load(&path, None).expect("load");
        assert!(cfg.container_description().contains("Acme Corp"));

        let path = write_workspace(&dir, "project_name: p\ndescription: custom text\n");
        let cfg = WorkspaceConfig::load(&path, None).expect("load");
        assert_eq!(cfg.container_description(), "custom text");
    }
}
