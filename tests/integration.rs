//! Integration tests for the migration engine
//!
//! The engine runs against mocked cluster-client and prompt ports, with
//! millisecond poll intervals so the polling scenarios stay fast.

mod common;
use common::TestFixtures;

use std::time::Duration;

use pvc_migrate::core::MigrationEngine;
use pvc_migrate::traits::{MockClusterClient, MockPrompt};
use pvc_migrate::types::{ClaimPhase, PodPhase};
use pvc_migrate::MigrateError;

fn engine_with(
    cluster: MockClusterClient,
    prompt: MockPrompt,
    manifest_dir: std::path::PathBuf,
) -> MigrationEngine<MockClusterClient, MockPrompt> {
    MigrationEngine::new(cluster, prompt, "default", manifest_dir).with_poll_interval(Duration::from_millis(1))
}

/// Full lifecycle: apply, bound on the third poll (Pending, Pending,
/// Bound), copy pod pinned to the default node, logs fetched, pod
/// deleted.
#[tokio::test]
async fn full_migration_lifecycle() {
    let dir = tempfile::tempdir().unwrap();
    TestFixtures::write_claim_manifest(dir.path());

    let mut cluster = MockClusterClient::new();
    cluster
        .expect_apply_file()
        .withf(|path, ns| path.ends_with("claims.yaml") && ns == "default")
        .times(1)
        .returning(|_, _| Ok(()));
    cluster
        .expect_claim_phase()
        .times(2)
        .returning(|_, _| Ok(ClaimPhase::Pending));
    cluster
        .expect_claim_phase()
        .times(1)
        .returning(|_, _| Ok(ClaimPhase::Bound));
    cluster
        .expect_list_nodes()
        .times(1)
        .returning(|| Ok(vec!["node-a".to_string(), "node-b".to_string()]));
    cluster
        .expect_apply_manifest()
        .withf(|manifest, ns| {
            manifest.contains("nodeName: node-a")
                && manifest.contains("claimName: svc-app-data")
                && manifest.contains("path: /var/lib/docker/volumes/app_data/_data")
                && ns == "default"
        })
        .times(1)
        .returning(|_, _| Ok(()));
    cluster
        .expect_pod_phase()
        .times(1)
        .returning(|_, _| Ok(PodPhase::Running));
    cluster
        .expect_pod_phase()
        .times(1)
        .returning(|_, _| Ok(PodPhase::Succeeded));
    cluster
        .expect_pod_logs()
        .times(1)
        .returning(|_, _| Ok("Copy completed".to_string()));
    cluster.expect_delete_pod().times(1).returning(|_, _| Ok(()));

    let mut prompt = MockPrompt::new();
    // Enter accepts the default node
    prompt.expect_ask_text().times(1).returning(|_| Ok(String::new()));

    let engine = engine_with(cluster, prompt, dir.path().to_path_buf());
    engine.run(&[TestFixtures::matched_claim()]).await.unwrap();
}

/// An apply failure is fatal before any polling happens.
#[tokio::test]
async fn apply_failure_aborts_immediately() {
    let dir = tempfile::tempdir().unwrap();
    TestFixtures::write_claim_manifest(dir.path());

    let mut cluster = MockClusterClient::new();
    cluster.expect_apply_file().times(1).returning(|_, _| {
        Err(MigrateError::ApplyFailed {
            object: "claims.yaml".to_string(),
            detail: "invalid spec".to_string(),
        })
    });

    let engine = engine_with(cluster, MockPrompt::new(), dir.path().to_path_buf());
    let err = engine.run(&[TestFixtures::matched_claim()]).await.unwrap_err();
    assert!(matches!(err, MigrateError::ApplyFailed { .. }));
}

/// A claim reporting the Failed phase is fatal.
#[tokio::test]
async fn failed_claim_phase_is_fatal() {
    let dir = tempfile::tempdir().unwrap();
    TestFixtures::write_claim_manifest(dir.path());

    let mut cluster = MockClusterClient::new();
    cluster.expect_apply_file().times(1).returning(|_, _| Ok(()));
    cluster
        .expect_claim_phase()
        .times(1)
        .returning(|_, _| Ok(ClaimPhase::Failed));

    let engine = engine_with(cluster, MockPrompt::new(), dir.path().to_path_buf());
    let err = engine.run(&[TestFixtures::matched_claim()]).await.unwrap_err();
    assert!(matches!(err, MigrateError::ClaimFailed { .. }));
}

/// The bound-wait ceiling turns into a typed timeout error.
#[tokio::test]
async fn bound_wait_ceiling_times_out() {
    let dir = tempfile::tempdir().unwrap();
    TestFixtures::write_claim_manifest(dir.path());

    let mut cluster = MockClusterClient::new();
    cluster.expect_apply_file().times(1).returning(|_, _| Ok(()));
    cluster
        .expect_claim_phase()
        .times(1)
        .returning(|_, _| Ok(ClaimPhase::Pending));

    let engine = engine_with(cluster, MockPrompt::new(), dir.path().to_path_buf())
        .with_bind_timeout(Duration::ZERO);
    let err = engine.run(&[TestFixtures::matched_claim()]).await.unwrap_err();
    assert!(matches!(err, MigrateError::BindTimeout { .. }));
}

/// Transient phase-query failures are retried until a real phase shows.
#[tokio::test]
async fn transient_status_errors_are_retried() {
    let dir = tempfile::tempdir().unwrap();
    TestFixtures::write_claim_manifest(dir.path());

    let mut cluster = MockClusterClient::new();
    cluster.expect_apply_file().times(1).returning(|_, _| Ok(()));
    cluster
        .expect_claim_phase()
        .times(1)
        .returning(|_, _| Err(MigrateError::transport("connection refused")));
    cluster
        .expect_claim_phase()
        .times(1)
        .returning(|_, _| Ok(ClaimPhase::Bound));
    cluster
        .expect_list_nodes()
        .times(1)
        .returning(|| Ok(vec!["node-a".to_string()]));
    cluster.expect_apply_manifest().times(1).returning(|_, _| Ok(()));
    cluster
        .expect_pod_phase()
        .times(1)
        .returning(|_, _| Ok(PodPhase::Succeeded));
    cluster
        .expect_pod_logs()
        .times(1)
        .returning(|_, _| Ok(String::new()));
    cluster.expect_delete_pod().times(1).returning(|_, _| Ok(()));

    let mut prompt = MockPrompt::new();
    prompt.expect_ask_text().times(1).returning(|_| Ok(String::new()));

    let engine = engine_with(cluster, prompt, dir.path().to_path_buf());
    engine.run(&[TestFixtures::matched_claim()]).await.unwrap();
}

/// A Failed pod phase aborts the run without log retrieval or cleanup.
#[tokio::test]
async fn failed_pod_phase_is_fatal_without_cleanup() {
    let dir = tempfile::tempdir().unwrap();
    TestFixtures::write_claim_manifest(dir.path());

    let mut cluster = MockClusterClient::new();
    cluster.expect_apply_file().times(1).returning(|_, _| Ok(()));
    cluster
        .expect_claim_phase()
        .times(1)
        .returning(|_, _| Ok(ClaimPhase::Bound));
    cluster
        .expect_list_nodes()
        .times(1)
        .returning(|| Ok(vec!["node-a".to_string()]));
    cluster.expect_apply_manifest().times(1).returning(|_, _| Ok(()));
    cluster
        .expect_pod_phase()
        .times(1)
        .returning(|_, _| Ok(PodPhase::Failed));
    // No pod_logs / delete_pod expectations: neither may be called

    let mut prompt = MockPrompt::new();
    prompt.expect_ask_text().times(1).returning(|_| Ok(String::new()));

    let engine = engine_with(cluster, prompt, dir.path().to_path_buf());
    let err = engine.run(&[TestFixtures::matched_claim()]).await.unwrap_err();
    assert!(matches!(err, MigrateError::PodFailed { .. }));
}

/// Cleanup failure after a successful copy is a warning, not an error.
#[tokio::test]
async fn cleanup_failure_is_tolerated() {
    let dir = tempfile::tempdir().unwrap();
    TestFixtures::write_claim_manifest(dir.path());

    let mut cluster = MockClusterClient::new();
    cluster.expect_apply_file().times(1).returning(|_, _| Ok(()));
    cluster
        .expect_claim_phase()
        .times(1)
        .returning(|_, _| Ok(ClaimPhase::Bound));
    cluster
        .expect_list_nodes()
        .times(1)
        .returning(|| Ok(vec!["node-a".to_string()]));
    cluster.expect_apply_manifest().times(1).returning(|_, _| Ok(()));
    cluster
        .expect_pod_phase()
        .times(1)
        .returning(|_, _| Ok(PodPhase::Succeeded));
    cluster
        .expect_pod_logs()
        .times(1)
        .returning(|_, _| Err(MigrateError::transport("logs unavailable")));
    cluster
        .expect_delete_pod()
        .times(1)
        .returning(|_, _| Err(MigrateError::transport("already gone")));

    let mut prompt = MockPrompt::new();
    prompt.expect_ask_text().times(1).returning(|_| Ok(String::new()));

    let engine = engine_with(cluster, prompt, dir.path().to_path_buf());
    engine.run(&[TestFixtures::matched_claim()]).await.unwrap();
}

/// A claim without a matched volume triggers zero control-plane calls.
#[tokio::test]
async fn unmatched_claim_is_skipped_with_zero_calls() {
    let dir = tempfile::tempdir().unwrap();

    // No expectations on either mock: any call would panic
    let engine = engine_with(MockClusterClient::new(), MockPrompt::new(), dir.path().to_path_buf());
    engine.run(&[TestFixtures::unmatched_claim("ns-lonely")]).await.unwrap();
}

/// Dry-run is idempotent, side-effect-free, and renders SKIP for
/// unmatched claims.
#[tokio::test]
async fn dry_run_is_idempotent_and_issues_no_calls() {
    let dir = tempfile::tempdir().unwrap();

    let engine = engine_with(MockClusterClient::new(), MockPrompt::new(), dir.path().to_path_buf());
    let claims = vec![TestFixtures::matched_claim(), TestFixtures::unmatched_claim("ns-extra")];

    let first = engine.dry_run(&claims);
    let second = engine.dry_run(&claims);
    assert_eq!(first, second);

    assert!(first.iter().any(|line| line == "[1] MIGRATE: svc-app-data"));
    assert!(first.iter().any(|line| line == "[2] SKIP: ns-extra (no volume selected)"));
    assert!(first.iter().any(|line| line.contains("Target: claim default/svc-app-data (1Gi)")));
}

/// Node selection accepts a menu number.
#[tokio::test]
async fn node_selection_by_number() {
    let dir = tempfile::tempdir().unwrap();
    TestFixtures::write_claim_manifest(dir.path());

    let mut cluster = MockClusterClient::new();
    cluster.expect_apply_file().times(1).returning(|_, _| Ok(()));
    cluster
        .expect_claim_phase()
        .times(1)
        .returning(|_, _| Ok(ClaimPhase::Bound));
    cluster
        .expect_list_nodes()
        .times(1)
        .returning(|| Ok(vec!["node-a".to_string(), "node-b".to_string()]));
    cluster
        .expect_apply_manifest()
        .withf(|manifest, _| manifest.contains("nodeName: node-b"))
        .times(1)
        .returning(|_, _| Ok(()));
    cluster
        .expect_pod_phase()
        .times(1)
        .returning(|_, _| Ok(PodPhase::Succeeded));
    cluster
        .expect_pod_logs()
        .times(1)
        .returning(|_, _| Ok(String::new()));
    cluster.expect_delete_pod().times(1).returning(|_, _| Ok(()));

    let mut prompt = MockPrompt::new();
    prompt.expect_ask_text().times(1).returning(|_| Ok("2".to_string()));

    let engine = engine_with(cluster, prompt, dir.path().to_path_buf());
    engine.run(&[TestFixtures::matched_claim()]).await.unwrap();
}

/// Ambiguous substrings re-prompt; an unambiguous one selects.
#[tokio::test]
async fn node_selection_ambiguous_substring_reprompts() {
    let dir = tempfile::tempdir().unwrap();
    TestFixtures::write_claim_manifest(dir.path());

    let mut cluster = MockClusterClient::new();
    cluster.expect_apply_file().times(1).returning(|_, _| Ok(()));
    cluster
        .expect_claim_phase()
        .times(1)
        .returning(|_, _| Ok(ClaimPhase::Bound));
    cluster
        .expect_list_nodes()
        .times(1)
        .returning(|| Ok(vec!["node-alpha".to_string(), "node-beta".to_string()]));
    cluster
        .expect_apply_manifest()
        .withf(|manifest, _| manifest.contains("nodeName: node-beta"))
        .times(1)
        .returning(|_, _| Ok(()));
    cluster
        .expect_pod_phase()
        .times(1)
        .returning(|_, _| Ok(PodPhase::Succeeded));
    cluster
        .expect_pod_logs()
        .times(1)
        .returning(|_, _| Ok(String::new()));
    cluster.expect_delete_pod().times(1).returning(|_, _| Ok(()));

    let mut prompt = MockPrompt::new();
    // "node" matches both nodes, "beta" only one
    prompt.expect_ask_text().times(1).returning(|_| Ok("node".to_string()));
    prompt.expect_ask_text().times(1).returning(|_| Ok("beta".to_string()));

    let engine = engine_with(cluster, prompt, dir.path().to_path_buf());
    engine.run(&[TestFixtures::matched_claim()]).await.unwrap();
}

/// An empty node list is a typed error before any pod is created.
#[tokio::test]
async fn empty_node_list_is_fatal() {
    let dir = tempfile::tempdir().unwrap();
    TestFixtures::write_claim_manifest(dir.path());

    let mut cluster = MockClusterClient::new();
    cluster.expect_apply_file().times(1).returning(|_, _| Ok(()));
    cluster
        .expect_claim_phase()
        .times(1)
        .returning(|_, _| Ok(ClaimPhase::Bound));
    cluster.expect_list_nodes().times(1).returning(|| Ok(Vec::new()));

    let engine = engine_with(cluster, MockPrompt::new(), dir.path().to_path_buf());
    let err = engine.run(&[TestFixtures::matched_claim()]).await.unwrap_err();
    assert!(matches!(err, MigrateError::NoNodes));
}

/// A missing declaration file for a matched claim fails before apply.
#[tokio::test]
async fn missing_manifest_for_claim_is_fatal() {
    let dir = tempfile::tempdir().unwrap();

    let engine = engine_with(MockClusterClient::new(), MockPrompt::new(), dir.path().to_path_buf());
    let err = engine.run(&[TestFixtures::matched_claim()]).await.unwrap_err();
    assert!(matches!(err, MigrateError::ManifestMissing { .. }));
}
