//! Migration engine
//!
//! Drives each matched claim through its lifecycle: apply the claim
//! declaration, wait for it to bind, launch an ephemeral copy pod pinned
//! to the node holding the source mount, wait for completion, surface the
//! logs and tear the pod down. Items run strictly in input order and the
//! first failure aborts the run.

use std::path::PathBuf;
use std::time::Duration;

use chrono::Utc;
use tokio::time::Instant;
use tracing::{debug, error, info, warn};

use crate::core::manifest;
use crate::error::{MigrateError, MigrateResult};
use crate::traits::{ClusterClient, Prompt};
use crate::types::{ClaimPhase, ClaimRequest, PodPhase, SourceVolume};

const DEFAULT_POLL_INTERVAL: Duration = Duration::from_secs(5);
const DEFAULT_BIND_TIMEOUT: Duration = Duration::from_secs(5 * 60);
const DEFAULT_POD_TIMEOUT: Duration = Duration::from_secs(10 * 60);

pub struct MigrationEngine<C: ClusterClient, P: Prompt> {
    cluster: C,
    prompt: P,

    /// Namespace migration objects are created in
    namespace: String,

    /// Directory holding the claim declarations
    manifest_dir: PathBuf,

    poll_interval: Duration,
    bind_timeout: Duration,
    pod_timeout: Duration,
}

impl<C: ClusterClient, P: Prompt> MigrationEngine<C, P> {
    pub fn new(cluster: C, prompt: P, namespace: impl Into<String>, manifest_dir: PathBuf) -> Self {
        let namespace = namespace.into();
        Self {
            cluster,
            prompt,
            namespace: if namespace.is_empty() { "default".to_string() } else { namespace },
            manifest_dir,
            poll_interval: DEFAULT_POLL_INTERVAL,
            bind_timeout: DEFAULT_BIND_TIMEOUT,
            pod_timeout: DEFAULT_POD_TIMEOUT,
        }
    }

    /// Configure the status polling interval (fluent API)
    pub fn with_poll_interval(mut self, interval: Duration) -> Self {
        self.poll_interval = interval;
        self
    }

    /// Configure the claim bound-wait ceiling (fluent API)
    pub fn with_bind_timeout(mut self, timeout: Duration) -> Self {
        self.bind_timeout = timeout;
        self
    }

    /// Configure the pod completion ceiling (fluent API)
    pub fn with_pod_timeout(mut self, timeout: Duration) -> Self {
        self.pod_timeout = timeout;
        self
    }

    /// Execute the migration for all claims, strictly in input order.
    /// Unmatched claims are skipped; the first lifecycle failure aborts
    /// the remaining queue.
    pub async fn run(&self, claims: &[ClaimRequest]) -> MigrateResult<()> {
        println!("\n=== Starting Migration Process ===");

        let total = claims.len();
        for (index, claim) in claims.iter().enumerate() {
            let Some(volume) = &claim.matched_volume else {
                info!("skipping {} (no volume selected)", claim.name);
                continue;
            };

            info!("[{}/{}] migrating claim: {}", index + 1, total, claim.name);

            if let Err(e) = self.migrate_claim(claim, volume).await {
                error!("failed to migrate {}: {e}", claim.name);
                return Err(e);
            }

            info!("successfully migrated {}", claim.name);
        }

        println!("\nMigration completed successfully!");
        Ok(())
    }

    /// Render the per-item projection without touching the control plane.
    pub fn dry_run(&self, claims: &[ClaimRequest]) -> Vec<String> {
        let mut lines = vec!["=== Dry Run - Migration Plan ===".to_string()];

        for (index, claim) in claims.iter().enumerate() {
            match &claim.matched_volume {
                None => lines.push(format!("[{}] SKIP: {} (no volume selected)", index + 1, claim.name)),
                Some(volume) => {
                    lines.push(format!("[{}] MIGRATE: {}", index + 1, claim.name));
                    lines.push(format!("    Source: {} ({})", volume.name, volume.size_human));
                    lines.push(format!(
                        "    Target: claim {}/{} ({})",
                        claim.namespace, claim.name, claim.new_size
                    ));
                    lines.push(format!("    Path: {} -> claim mount", volume.mountpoint.display()));
                }
            }
        }

        lines.push("Use --execute to run the actual migration".to_string());
        lines
    }

    async fn migrate_claim(&self, claim: &ClaimRequest, volume: &SourceVolume) -> MigrateResult<()> {
        info!("applying declaration for claim {} to namespace {}", claim.name, self.namespace);
        self.create_claim(claim).await?;

        info!("waiting for claim {} to be bound", claim.name);
        self.wait_claim_bound(claim).await?;

        info!("copying data from source volume {}", volume.name);
        self.copy_data(claim, volume).await
    }

    async fn create_claim(&self, claim: &ClaimRequest) -> MigrateResult<()> {
        let manifest_file = manifest::find_claim_file(&self.manifest_dir, claim)?;
        debug!("applying {} to namespace {}", manifest_file.display(), self.namespace);
        self.cluster.apply_file(&manifest_file, &self.namespace).await
    }

    async fn wait_claim_bound(&self, claim: &ClaimRequest) -> MigrateResult<()> {
        let deadline = Instant::now() + self.bind_timeout;

        loop {
            match self.cluster.claim_phase(&claim.name, &self.namespace).await {
                Ok(ClaimPhase::Bound) => {
                    info!("claim {} is now bound", claim.name);
                    return Ok(());
                }
                Ok(ClaimPhase::Failed) => {
                    return Err(MigrateError::ClaimFailed {
                        claim: claim.name.clone(),
                    })
                }
                Ok(phase) => debug!("claim status: {phase}"),
                Err(e) if e.is_transient() => warn!("error checking claim status: {e}"),
                Err(e) => return Err(e),
            }

            if Instant::now() >= deadline {
                return Err(MigrateError::BindTimeout {
                    claim: claim.name.clone(),
                    timeout: self.bind_timeout,
                });
            }
            tokio::time::sleep(self.poll_interval).await;
        }
    }

    async fn copy_data(&self, claim: &ClaimRequest, volume: &SourceVolume) -> MigrateResult<()> {
        // The source path is a host-local mount, so the copy pod must land
        // on the node that actually holds it.
        let node = self.select_node().await?;

        let pod_name = format!("migration-{}-{}", claim.name, Utc::now().timestamp());
        let pod_manifest = copy_pod_manifest(&pod_name, &self.namespace, &node, volume, &claim.name);

        self.cluster.apply_manifest(&pod_manifest, &self.namespace).await?;
        info!(
            "migration pod {} created in namespace {}, scheduled on node {}",
            pod_name, self.namespace, node
        );

        info!("waiting for migration pod to complete");
        self.wait_pod_complete(&pod_name).await?;

        match self.cluster.pod_logs(&pod_name, &self.namespace).await {
            Ok(logs) => {
                println!("  Migration pod logs:");
                for line in logs.lines().filter(|line| !line.trim().is_empty()) {
                    println!("    {line}");
                }
            }
            Err(e) => warn!("could not retrieve pod logs: {e}"),
        }

        if let Err(e) = self.cluster.delete_pod(&pod_name, &self.namespace).await {
            warn!("could not delete migration pod {pod_name}: {e}");
        }

        Ok(())
    }

    async fn wait_pod_complete(&self, pod_name: &str) -> MigrateResult<()> {
        let deadline = Instant::now() + self.pod_timeout;

        loop {
            match self.cluster.pod_phase(pod_name, &self.namespace).await {
                Ok(PodPhase::Succeeded) => return Ok(()),
                Ok(PodPhase::Failed) => {
                    return Err(MigrateError::PodFailed {
                        pod: pod_name.to_string(),
                    })
                }
                Ok(phase) => debug!("pod status: {phase}"),
                Err(e) if e.is_transient() => warn!("error checking pod status: {e}"),
                Err(e) => return Err(e),
            }

            if Instant::now() >= deadline {
                return Err(MigrateError::PodTimeout {
                    pod: pod_name.to_string(),
                    timeout: self.pod_timeout,
                });
            }
            tokio::time::sleep(self.poll_interval).await;
        }
    }

    /// Interactive node selection with a hostname-derived default.
    /// Accepts a menu number, an exact node name, or an unambiguous
    /// substring; ambiguous substrings re-prompt.
    async fn select_node(&self) -> MigrateResult<String> {
        let nodes = self.cluster.list_nodes().await?;
        if nodes.is_empty() {
            return Err(MigrateError::NoNodes);
        }

        let default_node = best_default_node(&nodes, &local_hostname());

        println!("\nSelect cluster node for migration pods:");
        for (index, node) in nodes.iter().enumerate() {
            let marker = if *node == default_node { "* " } else { "  " };
            println!("{marker}{}. {node}", index + 1);
        }
        println!("\nDefault: {default_node} (press Enter to use default)");

        loop {
            let input = self
                .prompt
                .ask_text(&format!("Enter choice (number 1-{} or node name): ", nodes.len()))?;

            if input.is_empty() {
                info!("selected node {default_node} (default)");
                return Ok(default_node);
            }

            if let Ok(choice) = input.parse::<usize>() {
                if choice >= 1 && choice <= nodes.len() {
                    let selected = nodes[choice - 1].clone();
                    info!("selected node {selected}");
                    return Ok(selected);
                }
                println!("Invalid number. Enter 1-{} or a node name.", nodes.len());
                continue;
            }

            if let Some(exact) = nodes.iter().find(|node| node.eq_ignore_ascii_case(&input)) {
                info!("selected node {exact}");
                return Ok(exact.clone());
            }

            let needle = input.to_lowercase();
            let matches: Vec<&String> = nodes.iter().filter(|node| node.to_lowercase().contains(&needle)).collect();

            match matches.as_slice() {
                [single] => {
                    info!("selected node {single}");
                    return Ok((*single).clone());
                }
                [] => println!("Node '{input}' not found."),
                many => {
                    let names: Vec<&str> = many.iter().map(|node| node.as_str()).collect();
                    println!("Multiple matches found: {}. Please be more specific.", names.join(", "));
                }
            }
        }
    }
}

/// Prefer a node whose name and the local hostname contain each other;
/// otherwise fall back to the first node.
fn best_default_node(nodes: &[String], hostname: &str) -> String {
    let hostname = hostname.to_lowercase();

    if !hostname.is_empty() {
        for node in nodes {
            let node_lower = node.to_lowercase();
            if node_lower.contains(&hostname) || hostname.contains(&node_lower) {
                return node.clone();
            }
        }
    }

    nodes[0].clone()
}

#[cfg(unix)]
fn local_hostname() -> String {
    nix::unistd::gethostname()
        .map(|name| name.to_string_lossy().into_owned())
        .unwrap_or_default()
}

#[cfg(not(unix))]
fn local_hostname() -> String {
    String::new()
}

/// Manifest for the ephemeral copy pod. The pod mounts the source volume's
/// host path next to the bound claim, copies recursively only when the
/// source is non-empty, and always exits zero.
fn copy_pod_manifest(pod_name: &str, namespace: &str, node: &str, volume: &SourceVolume, claim_name: &str) -> String {
    format!(
        r#"apiVersion: v1
kind: Pod
metadata:
  name: {pod_name}
  namespace: {namespace}
spec:
  restartPolicy: Never
  nodeName: {node}
  containers:
  - name: migration
    image: busybox:latest
    command: ["/bin/sh", "-c"]
    args:
    - |
      echo "Starting data copy..."
      echo "Source: /source-data"
      echo "Target: /claim-data"
      ls -la /source-data/ || echo "Source directory empty or missing"
      ls -la /claim-data/ || echo "Target directory empty"

      if [ "$(ls -A /source-data 2>/dev/null)" ]; then
        echo "Copying data..."
        cp -av /source-data/* /claim-data/ 2>/dev/null || echo "No files to copy or copy failed"
        echo "Copy completed"
      else
        echo "Source directory is empty"
      fi

      echo "Final target contents:"
      ls -la /claim-data/
      echo "Migration pod completed"
    volumeMounts:
    - name: source-volume
      mountPath: /source-data
    - name: claim-volume
      mountPath: /claim-data
  volumes:
  - name: source-volume
    hostPath:
      path: {mountpoint}
      type: Directory
  - name: claim-volume
    persistentVolumeClaim:
      claimName: {claim_name}
"#,
        mountpoint = volume.mountpoint.display()
    )
}
