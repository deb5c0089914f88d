//! End-to-end pipeline runs against in-memory collaborators: naming
//! stability, lock discipline, best-effort secrets.

use std::collections::HashMap;
use std::fs;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use foundry_core::config::{NamingConfig, WorkspaceConfig};
use foundry_core::time::{Clock, ManualClock};
use foundry_hub::{ContainerApi, ContainerInfo, ContainerPublicKey, HubError};
use foundry_lock::{Lease, LeaseLock, MemoryLeaseBackend, NoopLock};
use foundry_pipeline::{run, PipelineDeps, PipelineError, RunRequest, SecretValue};
use foundry_state::{MemoryStateStore, StateStore};
use tempfile::TempDir;

// ---------------------------------------------------------------------------
// Fake container host
// ---------------------------------------------------------------------------

#[derive(Default)]
struct FakeHub {
    containers: Mutex<HashMap<String, ContainerInfo>>,
    files: Mutex<HashMap<(String, String), Vec<u8>>>,
    secrets: Mutex<HashMap<(String, String), String>>,
    fail_secrets: AtomicBool,
    fail_puts: AtomicBool,
}

impl ContainerApi for FakeHub {
    fn get_container(&self, name: &str) -> Result<Option<ContainerInfo>, HubError> {
        Ok(self.containers.lock().unwrap().get(name).cloned())
    }

    fn create_container(
        &self,
        name: &str,
        private: bool,
        description: &str,
    ) -> Result<ContainerInfo, HubError> {
        let info = ContainerInfo {
            name: name.to_owned(),
            full_name: Some(format!("org/{name}")),
            html_url: Some(format!("https://hub.example/org/{name}")),
            private,
            description: Some(description.to_owned()),
        };
        self.containers
            .lock()
            .unwrap()
            .insert(name.to_owned(), info.clone());
        Ok(info)
    }

    fn get_file_version(
        &self,
        container: &str,
        path: &str,
    ) -> Result<Option<String>, HubError> {
        Ok(self
            .files
            .lock()
            .unwrap()
            .get(&(container.to_owned(), path.to_owned()))
            .map(|_| "v1".to_owned()))
    }

    fn put_file(
        &self,
        container: &str,
        path: &str,
        content: &[u8],
        _version: Option<&str>,
        _message: &str,
    ) -> Result<(), HubError> {
        if self.fail_puts.load(Ordering::SeqCst) {
            return Err(HubError::Api {
                status: 500,
                body: "storage down".into(),
            });
        }
        self.files
            .lock()
            .unwrap()
            .insert((container.to_owned(), path.to_owned()), content.to_vec());
        Ok(())
    }

    fn get_public_key(&self, _container: &str) -> Result<ContainerPublicKey, HubError> {
        use base64::Engine as _;
        Ok(ContainerPublicKey {
            key_id: "key-1".to_owned(),
            key: base64::engine::general_purpose::STANDARD.encode([9u8; 32]),
        })
    }

    fn put_secret(
        &self,
        container: &str,
        name: &str,
        encrypted_value: &str,
        _key_id: &str,
    ) -> Result<(), HubError> {
        if self.fail_secrets.load(Ordering::SeqCst) {
            return Err(HubError::Api {
                status: 503,
                body: "secrets endpoint unavailable".into(),
            });
        }
        self.secrets.lock().unwrap().insert(
            (container.to_owned(), name.to_owned()),
            encrypted_value.to_owned(),
        );
        Ok(())
    }
}

// ---------------------------------------------------------------------------
// Fixtures
// ---------------------------------------------------------------------------

fn workspace_config(project: &str, templates_root: &TempDir) -> WorkspaceConfig {
    WorkspaceConfig {
        version: 1,
        project_name: project.to_owned(),
        description: String::new(),
        private: true,
        observability: Default::default(),
        templates_folder: templates_root.path().display().to_string(),
        naming: NamingConfig::default(),
        sync: Default::default(),
        secret: Default::default(),
    }
}

fn template_tree() -> TempDir {
    let root = TempDir::new().expect("tempdir");
    fs::write(root.path().join("workspace.yaml"), "project_name: seeded\n").expect("write");
    fs::create_dir_all(root.path().join("src")).expect("mkdir");
    fs::write(root.path().join("src/main.py"), "print('hi')\n").expect("write");
    root
}

fn fast_request(config: WorkspaceConfig) -> RunRequest {
    let mut request = RunRequest::new(config.clone());
    request.templates_root = config.templates_folder.clone().into();
    request.wait_budget = Duration::from_secs(10);
    request.poll_interval = Duration::from_secs(1);
    request.sync_options.pacing = Duration::from_millis(1);
    request.sync_options.retry_delay = Duration::from_millis(1);
    request
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[test]
fn fresh_project_provisions_and_persists_container_name() {
    let templates = template_tree();
    let hub = FakeHub::default();
    let state = MemoryStateStore::new();
    let clock = ManualClock::default();
    let lock = NoopLock;

    let outcome = run(
        &fast_request(workspace_config("Acme Corp", &templates)),
        &PipelineDeps {
            lock: &lock,
            state: &state,
            api: &hub,
            clock: &clock,
        },
    )
    .expect("run");

    assert_eq!(outcome.container_name, "acme-corp");
    assert_eq!(outcome.container_full_name.as_deref(), Some("org/acme-corp"));
    assert_eq!(
        outcome.uploaded,
        vec!["src/main.py", "workspace.yaml"],
        "plan order is lexicographic"
    );
    assert!(outcome.secret_warning.is_none());

    let doc = state.load().expect("state");
    let record = &doc.projects["Acme Corp"];
    assert_eq!(record.container_name.as_deref(), Some("acme-corp"));
    assert!(record.observability_enabled);
}

#[test]
fn second_run_reuses_recorded_name_even_if_naming_rule_changed() {
    let templates = template_tree();
    let hub = FakeHub::default();
    let state = MemoryStateStore::new();
    let clock = ManualClock::default();
    let lock = NoopLock;
    let deps = PipelineDeps {
        lock: &lock,
        state: &state,
        api: &hub,
        clock: &clock,
    };

    let first = run(
        &fast_request(workspace_config("Acme Corp", &templates)),
        &deps,
    )
    .expect("first run");
    assert_eq!(first.container_name, "acme-corp");

    // Hypothetical naming-rule change between runs.
    let mut changed = workspace_config("Acme Corp", &templates);
    changed.naming = NamingConfig {
        prefix: "team".to_owned(),
        suffix: "v2".to_owned(),
    };
    let second = run(&fast_request(changed), &deps).expect("second run");

    assert_eq!(
        second.container_name, "acme-corp",
        "recorded name beats re-derivation"
    );
    assert_eq!(hub.containers.lock().unwrap().len(), 1);
}

#[test]
fn secret_failure_logs_warning_but_run_succeeds() {
    let templates = template_tree();
    let hub = FakeHub::default();
    hub.fail_secrets.store(true, Ordering::SeqCst);
    let state = MemoryStateStore::new();
    let clock = ManualClock::default();
    let lock = NoopLock;

    let request = fast_request(workspace_config("Acme Corp", &templates)).with_secret(Some(
        SecretValue {
            name: "OBSERVABILITY_API_KEY".to_owned(),
            value: "shh".to_owned(),
        },
    ));
    let outcome = run(
        &request,
        &PipelineDeps {
            lock: &lock,
            state: &state,
            api: &hub,
            clock: &clock,
        },
    )
    .expect("run despite secret failure");

    let warning = outcome.secret_warning.expect("warning recorded");
    assert!(warning.contains("OBSERVABILITY_API_KEY"));
    // State still persisted: the run is a success.
    assert!(state.load().expect("state").projects.contains_key("Acme Corp"));
}

#[test]
fn secret_success_reaches_the_hub_encrypted() {
    let templates = template_tree();
    let hub = FakeHub::default();
    let state = MemoryStateStore::new();
    let clock = ManualClock::default();
    let lock = NoopLock;

    let request = fast_request(workspace_config("Acme Corp", &templates)).with_secret(Some(
        SecretValue {
            name: "OBSERVABILITY_API_KEY".to_owned(),
            value: "shh".to_owned(),
        },
    ));
    run(
        &request,
        &PipelineDeps {
            lock: &lock,
            state: &state,
            api: &hub,
            clock: &clock,
        },
    )
    .expect("run");

    let secrets = hub.secrets.lock().unwrap();
    let stored = secrets
        .get(&("acme-corp".to_owned(), "OBSERVABILITY_API_KEY".to_owned()))
        .expect("secret stored");
    assert_ne!(stored, "shh");
}

#[test]
fn lock_timeout_aborts_with_no_side_effects() {
    let templates = template_tree();
    let hub = FakeHub::default();
    let state = MemoryStateStore::new();
    let clock = Arc::new(ManualClock::default());

    let backend = MemoryLeaseBackend::new();
    backend.insert(Lease {
        lock_id: "foundry-pipeline-lock".into(),
        expires_at: clock.now() + chrono::Duration::seconds(3600),
    });
    let lock = LeaseLock::new(
        backend,
        clock.clone(),
        "foundry-pipeline-lock",
        Duration::from_secs(120),
    );

    let err = run(
        &fast_request(workspace_config("Acme Corp", &templates)),
        &PipelineDeps {
            lock: &lock,
            state: &state,
            api: &hub,
            clock: clock.as_ref(),
        },
    )
    .unwrap_err();

    assert!(matches!(err, PipelineError::LockTimeout { .. }), "got: {err}");
    assert!(hub.containers.lock().unwrap().is_empty());
    assert!(state.load().expect("state").projects.is_empty());
}

#[test]
fn lock_released_after_successful_run() {
    let templates = template_tree();
    let hub = FakeHub::default();
    let state = MemoryStateStore::new();
    let clock = Arc::new(ManualClock::default());
    let backend = Arc::new(MemoryLeaseBackend::new());
    let lock = LeaseLock::new(
        backend.clone(),
        clock.clone(),
        "foundry-pipeline-lock",
        Duration::from_secs(120),
    );

    run(
        &fast_request(workspace_config("Acme Corp", &templates)),
        &PipelineDeps {
            lock: &lock,
            state: &state,
            api: &hub,
            clock: clock.as_ref(),
        },
    )
    .expect("run");

    assert!(
        backend.lease("foundry-pipeline-lock").is_none(),
        "lease must be deleted at scope exit"
    );
}

#[test]
fn lock_released_even_when_sync_fails() {
    let templates = template_tree();
    let hub = FakeHub::default();
    hub.fail_puts.store(true, Ordering::SeqCst);
    let state = MemoryStateStore::new();
    let clock = Arc::new(ManualClock::default());
    let backend = Arc::new(MemoryLeaseBackend::new());
    let lock = LeaseLock::new(
        backend.clone(),
        clock.clone(),
        "foundry-pipeline-lock",
        Duration::from_secs(120),
    );

    let err = run(
        &fast_request(workspace_config("Acme Corp", &templates)),
        &PipelineDeps {
            lock: &lock,
            state: &state,
            api: &hub,
            clock: clock.as_ref(),
        },
    )
    .unwrap_err();

    assert!(matches!(err, PipelineError::Hub(_)), "got: {err}");
    assert!(
        backend.lease("foundry-pipeline-lock").is_none(),
        "lease must be deleted on the failure path too"
    );
    assert!(
        state.load().expect("state").projects.is_empty(),
        "state must not record a failed run"
    );
}

#[test]
fn missing_templates_root_fails_without_touching_state() {
    let templates = template_tree();
    let hub = FakeHub::default();
    let state = MemoryStateStore::new();
    let clock = ManualClock::default();
    let lock = NoopLock;

    let mut request = fast_request(workspace_config("Acme Corp", &templates));
    request.templates_root = "/definitely/not/here".into();

    let err = run(
        &request,
        &PipelineDeps {
            lock: &lock,
            state: &state,
            api: &hub,
            clock: &clock,
        },
    )
    .unwrap_err();

    assert!(
        matches!(
            err,
            PipelineError::Hub(HubError::TemplatesMissing { .. })
        ),
        "got: {err}"
    );
    assert!(state.load().expect("state").projects.is_empty());
}
