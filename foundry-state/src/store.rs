//! State store contract, local-file and in-memory variants, factory.

use std::path::{Path, PathBuf};
use std::sync::Mutex;

use foundry_core::types::StateDocument;

use crate::error::{io_err, StateError};

/// Default local state file, relative to the working directory.
pub const DEFAULT_STATE_PATH: &str = ".foundry/state.json";
/// Default object key for the HTTP variant.
pub const DEFAULT_STATE_KEY: &str = "foundry/state.json";

// ---------------------------------------------------------------------------
// Contract
// ---------------------------------------------------------------------------

/// Whole-document load/save. Last writer wins.
pub trait StateStore {
    /// Load the stored document. An absent or unparseable blob yields an
    /// empty document, never an error.
    fn load(&self) -> Result<StateDocument, StateError>;

    /// Overwrite the entire stored blob in a single write.
    fn save(&self, doc: &StateDocument) -> Result<(), StateError>;
}

/// Parse a stored blob, resetting to empty on any shape problem.
pub(crate) fn parse_or_reset(contents: &str, origin: &str) -> StateDocument {
    if contents.trim().is_empty() {
        return StateDocument::default();
    }
    match serde_json::from_str(contents) {
        Ok(doc) => doc,
        Err(e) => {
            tracing::warn!("state blob at {origin} is not a valid document ({e}); resetting");
            StateDocument::default()
        }
    }
}

// ---------------------------------------------------------------------------
// Local file store
// ---------------------------------------------------------------------------

/// JSON state file on the local filesystem.
///
/// Writes use the atomic `.tmp` + rename pattern and 0600 permissions.
#[derive(Debug)]
pub struct LocalStateStore {
    path: PathBuf,
}

impl LocalStateStore {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }
}

impl StateStore for LocalStateStore {
    fn load(&self) -> Result<StateDocument, StateError> {
        let contents = match std::fs::read_to_string(&self.path) {
            Ok(contents) => contents,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                tracing::info!("no existing state at {}", self.path.display());
                return Ok(StateDocument::default());
            }
            Err(e) => return Err(io_err(&self.path, e)),
        };
        Ok(parse_or_reset(&contents, &self.path.display().to_string()))
    }

    fn save(&self, doc: &StateDocument) -> Result<(), StateError> {
        if let Some(dir) = self.path.parent() {
            if !dir.as_os_str().is_empty() {
                std::fs::create_dir_all(dir).map_err(|e| io_err(dir, e))?;
            }
        }

        let json = serde_json::to_string_pretty(doc)?;
        let tmp = self.path.with_extension("json.tmp");
        std::fs::write(&tmp, json).map_err(|e| io_err(&tmp, e))?;
        set_file_permissions(&tmp)?;
        std::fs::rename(&tmp, &self.path).map_err(|e| io_err(&self.path, e))?;
        tracing::info!("state saved locally at {}", self.path.display());
        Ok(())
    }
}

#[cfg(unix)]
fn set_file_permissions(path: &Path) -> Result<(), StateError> {
    use std::os::unix::fs::PermissionsExt;
    std::fs::set_permissions(path, std::fs::Permissions::from_mode(0o600))
        .map_err(|e| io_err(path, e))
}
#[cfg(not(unix))]
fn set_file_permissions(_path: &Path) -> Result<(), StateError> {
    Ok(())
}

// ---------------------------------------------------------------------------
// Memory store
// ---------------------------------------------------------------------------

/// In-process store for tests and single-process embeddings.
#[derive(Debug, Default)]
pub struct MemoryStateStore {
    blob: Mutex<Option<String>>,
}

impl MemoryStateStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Seed the raw stored blob (test setup for corrupt-input cases).
    pub fn seed(&self, blob: impl Into<String>) {
        *self.blob.lock().expect("state blob poisoned") = Some(blob.into());
    }
}

impl StateStore for MemoryStateStore {
    fn load(&self) -> Result<StateDocument, StateError> {
        match &*self.blob.lock().expect("state blob poisoned") {
            Some(blob) => Ok(parse_or_reset(blob, "memory")),
            None => Ok(StateDocument::default()),
        }
    }

    fn save(&self, doc: &StateDocument) -> Result<(), StateError> {
        let json = serde_json::to_string_pretty(doc)?;
        *self.blob.lock().expect("state blob poisoned") = Some(json);
        Ok(())
    }
}

// ---------------------------------------------------------------------------
// Factory
// ---------------------------------------------------------------------------

/// Closed set of state backends, chosen by explicit configuration.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum StateConfig {
    /// Local JSON file.
    Local { path: PathBuf },
    /// Remote object store speaking plain GET/PUT.
    Http {
        base_url: String,
        key: String,
        token: Option<String>,
    },
}

/// Build the configured state store variant.
pub fn state_from_config(config: StateConfig) -> Box<dyn StateStore> {
    match config {
        StateConfig::Local { path } => Box::new(LocalStateStore::new(path)),
        StateConfig::Http {
            base_url,
            key,
            token,
        } => Box::new(crate::http::HttpStateStore::new(base_url, key, token)),
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
