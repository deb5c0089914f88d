//! Template tree synchronization.
//!
//! ## Sync algorithm
//!
//! 1. Walk the local root; prune excluded directories from descent entirely.
//! 2. Skip files whose path contains an excluded segment.
//! 3. Classify text/binary by UTF-8-decoding a bounded prefix.
//! 4. Sort the plan lexicographically by relative path.
//! 5. Per file: look up the remote version token, then create (no token) or
//!    update (token) with bounded retries for transient failures.
//! 6. Pace uploads with a fixed delay to stay under the host's rate limit.
//!
//! Every file is always re-sent; idempotence comes from the update-vs-create
//! branching on the version token, not from content diffing. A crash mid-run
//! is recovered by re-running the same plan.

use std::collections::BTreeSet;
use std::path::Path;
use std::time::Duration;

use foundry_core::time::Clock;

use crate::api::{ContainerApi, ContainerInfo};
use crate::error::{io_err, HubError};

/// Path segments never synced: version-control metadata, interpreter and
/// package caches, OS litter, foundry's own state and workflow file.
pub const DEFAULT_EXCLUDED_SEGMENTS: &[&str] = &[
    ".git",
    ".hg",
    ".svn",
    "__pycache__",
    ".venv",
    "node_modules",
    ".DS_Store",
    ".foundry",
    "foundry.yml",
];

/// Bytes sniffed when classifying a file as text or binary.
const BINARY_SNIFF_LEN: usize = 8192;

// ---------------------------------------------------------------------------
// Exclusions
// ---------------------------------------------------------------------------

/// Path-segment exclusion set.
///
/// Matching is per segment, exact — never substring — and applies to both
/// directories (pruned from descent) and files.
#[derive(Debug, Clone)]
pub struct ExclusionSet {
    segments: BTreeSet<String>,
}

impl ExclusionSet {
    /// The built-in segment set.
    pub fn builtin() -> Self {
        Self {
            segments: DEFAULT_EXCLUDED_SEGMENTS
                .iter()
                .map(|s| (*s).to_owned())
                .collect(),
        }
    }

    /// Built-in set plus workspace-configured extras.
    pub fn with_extra<I, S>(extra: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let mut set = Self::builtin();
        set.segments.extend(extra.into_iter().map(Into::into));
        set
    }

    pub fn matches_segment(&self, segment: &str) -> bool {
        self.segments.contains(segment)
    }

    /// Whether any `/`-separated segment of `relative_path` is excluded.
    pub fn matches_path(&self, relative_path: &str) -> bool {
        relative_path
            .split('/')
            .any(|segment| self.matches_segment(segment))
    }
}

impl Default for ExclusionSet {
    fn default() -> Self {
        Self::builtin()
    }
}

// ---------------------------------------------------------------------------
// Plan
// ---------------------------------------------------------------------------

/// One file scheduled for upload. Ephemeral, recomputed every run.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SyncEntry {
    /// Path relative to the local root, forward-slash separators.
    pub relative_path: String,
    pub content: Vec<u8>,
    pub is_binary: bool,
}

/// Classify by UTF-8-decoding a bounded prefix.
///
/// A multi-byte sequence cut off at the sniff boundary is not evidence of
/// binary content; an invalid sequence anywhere in the prefix is.
fn is_binary(content: &[u8]) -> bool {
    let sniff = &content[..content.len().min(BINARY_SNIFF_LEN)];
    match std::str::from_utf8(sniff) {
        Ok(_) => false,
        Err(e) => e.error_len().is_some() || sniff.len() == content.len(),
    }
}

/// Walk `local_root` and build the sorted sync plan.
///
/// Fails with [`HubError::TemplatesMissing`] when the root does not exist;
/// everything else I/O-fails with path context.
pub fn plan_local_tree(
    local_root: &Path,
    exclusions: &ExclusionSet,
) -> Result<Vec<SyncEntry>, HubError> {
    if !local_root.is_dir() {
        return Err(HubError::TemplatesMissing {
            path: local_root.to_path_buf(),
        });
    }

    let mut entries = Vec::new();
    collect(local_root, local_root, exclusions, &mut entries)?;

    // Deterministic plan order regardless of directory enumeration order.
    entries.sort_by(|a, b| a.relative_path.cmp(&b.relative_path));
    Ok(entries)
}

fn collect(
    root: &Path,
    dir: &Path,
    exclusions: &ExclusionSet,
    out: &mut Vec<SyncEntry>,
) -> Result<(), HubError> {
    for entry in std::fs::read_dir(dir).map_err(|e| io_err(dir, e))? {
        let entry = entry.map_err(|e| io_err(dir, e))?;
        let path = entry.path();
        let name = entry.file_name().to_string_lossy().into_owned();
        let file_type = entry.file_type().map_err(|e| io_err(&path, e))?;

        if file_type.is_dir() {
            if exclusions.matches_segment(&name) {
                tracing::debug!("pruned directory: {}", path.display());
                continue;
            }
            collect(root, &path, exclusions, out)?;
            continue;
        }
        if !file_type.is_file() {
            continue;
        }

        let relative_path = relative_posix(root, &path);
        if exclusions.matches_path(&relative_path) {
            tracing::debug!("excluded file: {relative_path}");
            continue;
        }

        let content = std::fs::read(&path).map_err(|e| io_err(&path, e))?;
        let is_binary = is_binary(&content);
        out.push(SyncEntry {
            relative_path,
            content,
            is_binary,
        });
    }
    Ok(())
}

fn relative_posix(root: &Path, path: &Path) -> String {
    let relative = path.strip_prefix(root).unwrap_or(path);
    let segments: Vec<String> = relative
        .components()
        .map(|c| c.as_os_str().to_string_lossy().into_owned())
        .collect();
    segments.join("/")
}

// ---------------------------------------------------------------------------
// Engine
// ---------------------------------------------------------------------------

/// Upload behavior knobs.
#[derive(Debug, Clone)]
pub struct SyncOptions {
    pub exclusions: ExclusionSet,
    /// Total attempts per file, transient failures only.
    pub upload_attempts: u32,
    /// Fixed delay between attempts.
    pub retry_delay: Duration,
    /// Fixed delay after each upload, to stay under the host's rate limit.
    pub pacing: Duration,
}

impl Default for SyncOptions {
    fn default() -> Self {
        Self {
            exclusions: ExclusionSet::builtin(),
            upload_attempts: 3,
            retry_delay: Duration::from_secs(2),
            pacing: Duration::from_millis(150),
        }
    }
}

/// Outcome of a sync run.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SyncReport {
    /// Relative paths uploaded, in plan order.
    pub uploaded: Vec<String>,
}

/// Reconciles a local template tree against a remote container.
pub struct SyncEngine<'a> {
    api: &'a dyn ContainerApi,
    clock: &'a dyn Clock,
    options: SyncOptions,
}

impl<'a> SyncEngine<'a> {
    pub fn new(api: &'a dyn ContainerApi, clock: &'a dyn Clock) -> Self {
        Self::with_options(api, clock, SyncOptions::default())
    }

    pub fn with_options(
        api: &'a dyn ContainerApi,
        clock: &'a dyn Clock,
        options: SyncOptions,
    ) -> Self {
        Self {
            api,
            clock,
            options,
        }
    }

    /// Return the existing container's metadata, or create it.
    pub fn ensure_container(
        &self,
        name: &str,
        description: &str,
        private: bool,
    ) -> Result<ContainerInfo, HubError> {
        if let Some(info) = self.api.get_container(name)? {
            tracing::info!("container already exists: {name}");
            return Ok(info);
        }
        self.api.create_container(name, private, description)
    }

    /// Push every plannable file under `local_root` into `container`.
    pub fn sync(&self, container: &str, local_root: &Path) -> Result<SyncReport, HubError> {
        tracing::info!(
            "syncing templates from {} to {container}",
            local_root.display()
        );
        let plan = plan_local_tree(local_root, &self.options.exclusions)?;

        let mut report = SyncReport::default();
        for entry in &plan {
            self.upload(container, entry)?;
            self.clock.sleep(self.options.pacing);
            report.uploaded.push(entry.relative_path.clone());
        }

        if report.uploaded.is_empty() {
            tracing::warn!(
                "sync plan for {container} is empty; is {} the right template root?",
                local_root.display()
            );
        }
        Ok(report)
    }

    fn upload(&self, container: &str, entry: &SyncEntry) -> Result<(), HubError> {
        let path = entry.relative_path.as_str();
        let version = self.api.get_file_version(container, path)?;
        let message = match version {
            Some(_) => format!("Update {path}"),
            None => format!("Add {path}"),
        };

        let mut attempt = 0;
        loop {
            attempt += 1;
            match self
                .api
                .put_file(container, path, &entry.content, version.as_deref(), &message)
            {
                Ok(()) => {
                    tracing::info!("uploaded {path} (binary={})", entry.is_binary);
                    return Ok(());
                }
                Err(e) if e.is_transient() && attempt < self.options.upload_attempts => {
                    tracing::warn!(
                        "upload of {path} failed (attempt {attempt}/{}): {e}; retrying",
                        self.options.upload_attempts
                    );
                    self.clock.sleep(self.options.retry_delay);
                }
                Err(e) => return Err(e),
            }
        }
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
