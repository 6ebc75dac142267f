//! Source-volume inventory backed by the docker CLI
//!
//! Lists the local named volumes and attaches best-effort sizes from
//! `docker system df -v`. Volumes referenced by a container are excluded
//! entirely; their data must not be migrated while attached. When the df
//! oracle is unavailable the size falls back to a filesystem walk, and
//! below that to raw block statistics.

use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::time::Duration;

use async_trait::async_trait;
use tokio::process::Command;
use tracing::{info, warn};
use walkdir::WalkDir;

use crate::core::units;
use crate::error::{MigrateError, MigrateResult};
use crate::traits::VolumeStore;
use crate::types::SourceVolume;

const DF_TIMEOUT: Duration = Duration::from_secs(5 * 60);

/// docker-CLI-backed `VolumeStore` implementation
#[derive(Debug, Clone, Copy, Default)]
pub struct DockerStore;

#[derive(Debug, Clone)]
struct DfEntry {
    bytes: u64,
    human: String,
    links: u32,
}

impl DockerStore {
    pub fn new() -> Self {
        Self
    }

    async fn docker(&self, args: &[&str]) -> MigrateResult<String> {
        let output = Command::new("docker")
            .args(args)
            .output()
            .await
            .map_err(|e| MigrateError::transport(format!("failed to run docker: {e}")))?;

        if !output.status.success() {
            return Err(MigrateError::transport(format!(
                "docker {} failed: {}",
                args.first().unwrap_or(&""),
                String::from_utf8_lossy(&output.stderr).trim()
            )));
        }

        Ok(String::from_utf8_lossy(&output.stdout).into_owned())
    }

    /// Bulk size oracle. `docker system df -v` can be slow, so it runs
    /// under a generous timeout.
    async fn df_sizes(&self) -> MigrateResult<HashMap<String, DfEntry>> {
        let output = tokio::time::timeout(DF_TIMEOUT, self.docker(&["system", "df", "-v"]))
            .await
            .map_err(|_| MigrateError::transport("docker system df -v timed out".to_string()))??;

        Ok(parse_df_output(&output))
    }
}

#[async_trait]
impl VolumeStore for DockerStore {
    async fn load_volumes(&self) -> MigrateResult<Vec<SourceVolume>> {
        let listing = self
            .docker(&["volume", "ls", "--format", "{{.Name}}\t{{.Mountpoint}}"])
            .await?;

        info!("getting volume sizes (this may take a moment)");
        let df_sizes = match self.df_sizes().await {
            Ok(sizes) => sizes,
            Err(e) => {
                warn!("failed to get volume sizes from docker df, falling back to filesystem walk: {e}");
                HashMap::new()
            }
        };

        Ok(build_inventory(&listing, &df_sizes))
    }
}

/// Assemble the inventory from the volume listing and the df size table.
/// Volumes with a non-zero link count are attached to a container and
/// must not be migrated, so they are dropped here.
fn build_inventory(listing: &str, df_sizes: &HashMap<String, DfEntry>) -> Vec<SourceVolume> {
    let mut volumes = Vec::new();

    for line in listing.lines() {
        let Some((name, mountpoint)) = line.split_once('\t') else {
            continue;
        };
        let name = name.trim();
        let mountpoint = PathBuf::from(mountpoint.trim());

        let entry = df_sizes.get(name);

        if let Some(entry) = entry {
            if entry.links > 0 {
                info!("skipping volume {name} (in use: {} links)", entry.links);
                continue;
            }
        }

        let (size_bytes, size_human) = match entry {
            Some(entry) if entry.bytes > 0 => (entry.bytes, entry.human.clone()),
            _ => walk_size(&mountpoint),
        };

        volumes.push(SourceVolume {
            name: name.to_string(),
            mountpoint,
            size_bytes,
            size_human,
        });
    }

    volumes
}

/// Parse the volumes table out of `docker system df -v` output.
///
/// Rows look like `<name> <links> ... <size>`; anything that does not
/// parse as such (section headers, image rows, malformed lines) is
/// skipped.
fn parse_df_output(output: &str) -> HashMap<String, DfEntry> {
    let mut sizes = HashMap::new();

    for line in output.lines() {
        let line = line.trim();
        if line.is_empty() || line.starts_with("VOLUME NAME") || line.contains("Local Volumes") {
            continue;
        }

        let fields: Vec<&str> = line.split_whitespace().collect();
        if fields.len() < 3 {
            continue;
        }

        let name = fields[0];
        let Ok(links) = fields[1].parse::<u32>() else {
            continue;
        };
        let size_str = fields[fields.len() - 1];
        let Ok(bytes) = units::parse_si_size(size_str) else {
            continue;
        };

        sizes.insert(
            name.to_string(),
            DfEntry {
                bytes,
                human: size_str.to_string(),
                links,
            },
        );
    }

    sizes
}

/// Recursive size summation over the volume's mount path, falling back to
/// block statistics when the mount itself cannot be read.
fn walk_size(mountpoint: &Path) -> (u64, String) {
    let total = if std::fs::metadata(mountpoint).is_ok() {
        WalkDir::new(mountpoint)
            .into_iter()
            .filter_map(|entry| entry.ok())
            .filter(|entry| entry.file_type().is_file())
            .filter_map(|entry| entry.metadata().ok())
            .map(|metadata| metadata.len())
            .sum()
    } else {
        block_stats_size(mountpoint)
    };

    (total, units::format_bytes(total))
}

#[cfg(unix)]
fn block_stats_size(mountpoint: &Path) -> u64 {
    nix::sys::statvfs::statvfs(mountpoint)
        .map(|stat| stat.blocks() as u64 * stat.fragment_size() as u64)
        .unwrap_or(0)
}

#[cfg(not(unix))]
fn block_stats_size(_mountpoint: &Path) -> u64 {
    0
}
