//! Core data types shared across the matcher and the migration engine

use std::fmt;
use std::path::PathBuf;
use std::str::FromStr;

/// A named Docker volume discovered in the local volume store.
///
/// Populated once at startup from the inventory snapshot and immutable
/// afterwards. Volumes that are attached to a running container never
/// make it into the inventory.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SourceVolume {
    /// Volume name as reported by the runtime
    pub name: String,

    /// Host-local mount path backing the volume
    pub mountpoint: PathBuf,

    /// Observed size in bytes (best effort)
    pub size_bytes: u64,

    /// Human-readable size string for display
    pub size_human: String,
}

/// A PersistentVolumeClaim declaration parsed from the manifest directory.
///
/// `matched_volume` is set by the matching step, `new_size` by the
/// interactive sizing step; the engine treats the whole struct as
/// read-only.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ClaimRequest {
    pub name: String,
    pub namespace: String,

    /// Size requested by the declaration (Kubernetes quantity syntax)
    pub requested_size: String,

    /// Source volume confirmed by the operator, if any
    pub matched_volume: Option<SourceVolume>,

    /// Final resolved size, defaults to `requested_size`
    pub new_size: String,
}

impl ClaimRequest {
    pub fn new(name: impl Into<String>, namespace: impl Into<String>, requested_size: impl Into<String>) -> Self {
        let requested_size = requested_size.into();
        Self {
            name: name.into(),
            namespace: namespace.into(),
            new_size: requested_size.clone(),
            requested_size,
            matched_volume: None,
        }
    }
}

/// Compose-context hint tying a declared volume alias to the store volume
/// name the compose project would have created. Derived once per run and
/// used only to bias candidate ordering.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct VolumeMapping {
    /// Compose service declaring the mount
    pub service: String,

    /// Volume alias as written in the compose file
    pub alias: String,

    /// Expected store volume name (`{project}_{alias}`)
    pub store_volume: String,

    /// Container-side mount target
    pub mount_path: String,
}

/// Phase of a PersistentVolumeClaim as reported by the control plane.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ClaimPhase {
    Pending,
    Bound,
    Failed,
    Other(String),
}

impl FromStr for ClaimPhase {
    type Err = std::convert::Infallible;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Ok(match s.trim() {
            "Pending" => ClaimPhase::Pending,
            "Bound" => ClaimPhase::Bound,
            "Failed" => ClaimPhase::Failed,
            other => ClaimPhase::Other(other.to_string()),
        })
    }
}

impl fmt::Display for ClaimPhase {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ClaimPhase::Pending => write!(f, "Pending"),
            ClaimPhase::Bound => write!(f, "Bound"),
            ClaimPhase::Failed => write!(f, "Failed"),
            ClaimPhase::Other(s) => write!(f, "{s}"),
        }
    }
}

/// Phase of the ephemeral migration pod.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PodPhase {
    Pending,
    Running,
    Succeeded,
    Failed,
    Other(String),
}

impl FromStr for PodPhase {
    type Err = std::convert::Infallible;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Ok(match s.trim() {
            "Pending" => PodPhase::Pending,
            "Running" => PodPhase::Running,
            "Succeeded" => PodPhase::Succeeded,
            "Failed" => PodPhase::Failed,
            other => PodPhase::Other(other.to_string()),
        })
    }
}

impl fmt::Display for PodPhase {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            PodPhase::Pending => write!(f, "Pending"),
            PodPhase::Running => write!(f, "Running"),
            PodPhase::Succeeded => write!(f, "Succeeded"),
            PodPhase::Failed => write!(f, "Failed"),
            PodPhase::Other(s) => write!(f, "{s}"),
        }
    }
}
