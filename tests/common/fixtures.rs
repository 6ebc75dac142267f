//! Test fixtures shared across the test suites

use std::path::{Path, PathBuf};

use pvc_migrate::types::{ClaimRequest, SourceVolume};

pub struct TestFixtures;

impl TestFixtures {
    pub const CLAIM_NAME: &'static str = "svc-app-data";
    pub const NAMESPACE: &'static str = "default";
    pub const REQUESTED_SIZE: &'static str = "1Gi";

    /// Inventory volume matching the standard claim
    pub fn app_data_volume() -> SourceVolume {
        Self::volume("app_data", 500_000_000, "500MB")
    }

    pub fn volume(name: &str, size_bytes: u64, size_human: &str) -> SourceVolume {
        SourceVolume {
            name: name.to_string(),
            mountpoint: PathBuf::from(format!("/var/lib/docker/volumes/{name}/_data")),
            size_bytes,
            size_human: size_human.to_string(),
        }
    }

    pub fn claim() -> ClaimRequest {
        ClaimRequest::new(Self::CLAIM_NAME, Self::NAMESPACE, Self::REQUESTED_SIZE)
    }

    pub fn matched_claim() -> ClaimRequest {
        let mut claim = Self::claim();
        claim.matched_volume = Some(Self::app_data_volume());
        claim
    }

    pub fn unmatched_claim(name: &str) -> ClaimRequest {
        ClaimRequest::new(name, Self::NAMESPACE, Self::REQUESTED_SIZE)
    }

    /// Standard claim declaration document
    pub fn claim_yaml(name: &str, storage: &str) -> String {
        format!(
            "apiVersion: v1\n\
             kind: PersistentVolumeClaim\n\
             metadata:\n\
             \x20 name: {name}\n\
             \x20 namespace: default\n\
             spec:\n\
             \x20 accessModes:\n\
             \x20   - ReadWriteOnce\n\
             \x20 resources:\n\
             \x20   requests:\n\
             \x20     storage: {storage}\n"
        )
    }

    /// A non-claim document that must survive rewrites byte-for-byte
    pub fn deployment_yaml() -> String {
        "apiVersion: apps/v1\n\
         kind: Deployment\n\
         metadata:\n\
         \x20 name: web\n\
         \x20 annotations:\n\
         \x20   keep: \"exact   spacing\"\n\
         spec:\n\
         \x20 replicas: 1\n"
            .to_string()
    }

    /// Write a manifest file declaring the standard claim into `dir`
    pub fn write_claim_manifest(dir: &Path) -> PathBuf {
        let path = dir.join("claims.yaml");
        let content = format!(
            "{}\n---\n{}",
            Self::deployment_yaml(),
            Self::claim_yaml(Self::CLAIM_NAME, Self::REQUESTED_SIZE)
        );
        std::fs::write(&path, content).expect("write manifest fixture");
        path
    }

    pub fn compose_yaml() -> String {
        "services:\n\
         \x20 app:\n\
         \x20   image: example/app:latest\n\
         \x20   volumes:\n\
         \x20     - app-data:/var/lib/app\n\
         \x20     - /host/tmp:/tmp\n\
         volumes:\n\
         \x20 app-data:\n"
            .to_string()
    }
}
