//! Domain types for the Foundry pipeline.
//!
//! `StateDocument` mirrors the persisted provisioning state: a mapping of
//! project names to the facts recorded about each provisioned container.
//! Unknown fields survive a load/save cycle untouched (serde flatten), so a
//! document written by a newer build never loses data here.

use std::collections::BTreeMap;
use std::fmt;

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

// ---------------------------------------------------------------------------
// Newtypes
// ---------------------------------------------------------------------------

/// A strongly-typed human-readable project name (state document key).
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct ProjectName(pub String);

impl fmt::Display for ProjectName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        self.0.fmt(f)
    }
}

impl From<String> for ProjectName {
    fn from(s: String) -> Self {
        Self(s)
    }
}

impl From<&str> for ProjectName {
    fn from(s: &str) -> Self {
        Self(s.to_owned())
    }
}

/// A strongly-typed remote container name (slug-shaped).
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct ContainerName(pub String);

impl fmt::Display for ContainerName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        self.0.fmt(f)
    }
}

impl From<String> for ContainerName {
    fn from(s: String) -> Self {
        Self(s)
    }
}

impl From<&str> for ContainerName {
    fn from(s: &str) -> Self {
        Self(s.to_owned())
    }
}

// ---------------------------------------------------------------------------
// State document
// ---------------------------------------------------------------------------

/// Provisioning facts recorded for one project.
///
/// `container_name`, once assigned, is stable: later runs reuse the recorded
/// name rather than re-deriving it, even if the derivation rule changes.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Default)]
pub struct ProjectRecord {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub project_name: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub container_name: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub container_full_name: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub container_url: Option<String>,
    #[serde(default)]
    pub observability_enabled: bool,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

/// Whole-document pipeline state, loaded and saved wholesale.
///
/// There is one document per deployment; it is never partially updated
/// remotely. Concurrent access is arbitrated by the pipeline lock, not here.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Default)]
pub struct StateDocument {
    #[serde(default)]
    pub projects: BTreeMap<String, ProjectRecord>,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

impl StateDocument {
    /// Record (or overwrite) the facts for `project`, preserving any extra
    /// fields an earlier writer attached to the record.
    pub fn upsert_project(&mut self, project: &str, record: ProjectRecord) {
        let entry = self.projects.entry(project.to_owned()).or_default();
        let extra = std::mem::take(&mut entry.extra);
        *entry = record;
        for (k, v) in extra {
            entry.extra.entry(k).or_insert(v);
        }
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
