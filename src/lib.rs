//! Migrate Docker named volumes into Kubernetes PersistentVolumeClaims
//!
//! The library splits into the matching engine (which source volume feeds
//! which claim), the migration engine (claim creation, bound-wait, copy
//! pod lifecycle), and thin service backends for kubectl, docker and the
//! operator console. All external surfaces sit behind injectable traits.

pub mod core;
pub mod error;
pub mod logging;
pub mod services;
pub mod traits;
pub mod types;

// Re-export commonly used types
pub use core::{MigrationEngine, VolumeMatcher};
pub use error::{MigrateError, MigrateResult};
pub use traits::{ClusterClient, Prompt, VolumeStore};
pub use types::{ClaimRequest, SourceVolume};
