//! Trait definitions with mockall annotations for testing
//!
//! These ports are the seams between the matching/migration logic and the
//! outside world (kubectl, the Docker runtime, the operator's console).
//! Real implementations live in `services`; tests inject mocks.

use std::path::Path;

use crate::error::MigrateResult;
use crate::types::{ClaimPhase, PodPhase, SourceVolume};

/// Narrow control-plane client abstraction.
///
/// Wraps the handful of cluster operations the engine needs so a native
/// API client could replace the kubectl shell-out without touching
/// orchestration logic. Errors distinguish timeout, not-found and
/// transport failure.
#[mockall::automock]
#[async_trait::async_trait]
pub trait ClusterClient: Send + Sync {
    /// Apply a manifest file into the given namespace
    async fn apply_file(&self, path: &Path, namespace: &str) -> MigrateResult<()>;

    /// Apply an inline manifest (fed via stdin) into the given namespace
    async fn apply_manifest(&self, manifest: &str, namespace: &str) -> MigrateResult<()>;

    /// Current phase of a PersistentVolumeClaim
    async fn claim_phase(&self, name: &str, namespace: &str) -> MigrateResult<ClaimPhase>;

    /// Current phase of a pod
    async fn pod_phase(&self, name: &str, namespace: &str) -> MigrateResult<PodPhase>;

    /// Fetch the logs of a completed pod
    async fn pod_logs(&self, name: &str, namespace: &str) -> MigrateResult<String>;

    /// Delete a pod, tolerating absence
    async fn delete_pod(&self, name: &str, namespace: &str) -> MigrateResult<()>;

    /// Names of all schedulable cluster nodes
    async fn list_nodes(&self) -> MigrateResult<Vec<String>>;
}

/// Source-volume inventory abstraction.
///
/// # Returns
/// The full snapshot of migratable volumes: name, mount path and a
/// best-effort size. Volumes currently attached to a container are
/// excluded by the implementation.
#[mockall::automock]
#[async_trait::async_trait]
pub trait VolumeStore: Send + Sync {
    async fn load_volumes(&self) -> MigrateResult<Vec<SourceVolume>>;
}

/// Operator prompt abstraction.
///
/// Blocking console interaction modeled as a port so the matcher and the
/// engine can be driven by scripted doubles in tests.
#[mockall::automock]
pub trait Prompt: Send + Sync {
    /// Render a numbered menu and block for a selection.
    ///
    /// # Parameters
    /// - `title`: heading printed above the menu
    /// - `options`: menu entries; index 0 is rendered as option `0`
    ///
    /// # Returns
    /// The chosen index, guaranteed to be within `0..options.len()`
    fn ask_choice(&self, title: &str, options: &[String]) -> MigrateResult<usize>;

    /// Print a prompt and block for a trimmed line of free text.
    /// An empty string means the operator pressed Enter.
    fn ask_text(&self, prompt: &str) -> MigrateResult<String>;
}
