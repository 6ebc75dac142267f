//! Cluster client backed by the kubectl CLI
//!
//! Every operation is one blocking round-trip through a kubectl
//! subprocess. Errors are mapped into the typed channel the engine polls
//! against: not-found and transport failures are retryable, everything
//! else is terminal.

use std::path::Path;
use std::process::Stdio;

use async_trait::async_trait;
use tokio::io::AsyncWriteExt;
use tokio::process::Command;
use tracing::debug;

use crate::error::{MigrateError, MigrateResult};
use crate::traits::ClusterClient;
use crate::types::{ClaimPhase, PodPhase};

/// kubectl-backed `ClusterClient` implementation
#[derive(Debug, Clone, Copy, Default)]
pub struct KubectlClient;

impl KubectlClient {
    pub fn new() -> Self {
        Self
    }

    async fn kubectl(&self, args: &[&str]) -> MigrateResult<std::process::Output> {
        debug!("running kubectl {}", args.join(" "));
        Command::new("kubectl")
            .args(args)
            .output()
            .await
            .map_err(|e| MigrateError::transport(format!("failed to run kubectl: {e}")))
    }

    /// Run a query subcommand, mapping a missing object to `NotFound`.
    async fn query(&self, args: &[&str], kind: &str, name: &str) -> MigrateResult<String> {
        let output = self.kubectl(args).await?;
        if output.status.success() {
            return Ok(String::from_utf8_lossy(&output.stdout).into_owned());
        }

        let stderr = String::from_utf8_lossy(&output.stderr);
        if stderr.contains("NotFound") || stderr.contains("not found") {
            return Err(MigrateError::NotFound {
                kind: kind.to_string(),
                name: name.to_string(),
            });
        }

        Err(MigrateError::transport(format!("kubectl failed: {}", stderr.trim())))
    }
}

#[async_trait]
impl ClusterClient for KubectlClient {
    async fn apply_file(&self, path: &Path, namespace: &str) -> MigrateResult<()> {
        let path_str = path.to_string_lossy();
        let output = self.kubectl(&["apply", "-f", &path_str, "-n", namespace]).await?;

        if output.status.success() {
            Ok(())
        } else {
            Err(MigrateError::ApplyFailed {
                object: path_str.into_owned(),
                detail: String::from_utf8_lossy(&output.stderr).trim().to_string(),
            })
        }
    }

    async fn apply_manifest(&self, manifest: &str, namespace: &str) -> MigrateResult<()> {
        let mut child = Command::new("kubectl")
            .args(["apply", "-f", "-", "-n", namespace])
            .stdin(Stdio::piped())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .spawn()
            .map_err(|e| MigrateError::transport(format!("failed to run kubectl: {e}")))?;

        if let Some(mut stdin) = child.stdin.take() {
            stdin
                .write_all(manifest.as_bytes())
                .await
                .map_err(|e| MigrateError::transport(format!("failed to feed kubectl stdin: {e}")))?;
        }

        let output = child
            .wait_with_output()
            .await
            .map_err(|e| MigrateError::transport(format!("kubectl did not exit: {e}")))?;

        if output.status.success() {
            Ok(())
        } else {
            Err(MigrateError::ApplyFailed {
                object: "inline manifest".to_string(),
                detail: String::from_utf8_lossy(&output.stderr).trim().to_string(),
            })
        }
    }

    async fn claim_phase(&self, name: &str, namespace: &str) -> MigrateResult<ClaimPhase> {
        let output = self
            .query(
                &["get", "pvc", name, "-n", namespace, "-o", "jsonpath={.status.phase}"],
                "pvc",
                name,
            )
            .await?;

        let text = output.trim().to_string();
        Ok(text.parse().unwrap_or(ClaimPhase::Other(text)))
    }

    async fn pod_phase(&self, name: &str, namespace: &str) -> MigrateResult<PodPhase> {
        let output = self
            .query(
                &["get", "pod", name, "-n", namespace, "-o", "jsonpath={.status.phase}"],
                "pod",
                name,
            )
            .await?;

        let text = output.trim().to_string();
        Ok(text.parse().unwrap_or(PodPhase::Other(text)))
    }

    async fn pod_logs(&self, name: &str, namespace: &str) -> MigrateResult<String> {
        self.query(&["logs", name, "-n", namespace], "pod", name).await
    }

    async fn delete_pod(&self, name: &str, namespace: &str) -> MigrateResult<()> {
        let output = self
            .kubectl(&["delete", "pod", name, "-n", namespace, "--ignore-not-found"])
            .await?;

        if output.status.success() {
            Ok(())
        } else {
            Err(MigrateError::transport(format!(
                "kubectl delete failed: {}",
                String::from_utf8_lossy(&output.stderr).trim()
            )))
        }
    }

    async fn list_nodes(&self) -> MigrateResult<Vec<String>> {
        let output = self
            .query(
                &["get", "nodes", "-o", "jsonpath={.items[*].metadata.name}"],
                "nodes",
                "*",
            )
            .await?;

        Ok(output.split_whitespace().map(str::to_string).collect())
    }
}
