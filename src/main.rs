//! Main entry point for the migration CLI
//!
//! Wires the real service backends into the matcher and the migration
//! engine, then drives the run: inventory, matching, sizing, manifest
//! rewrite, and finally dry-run projection or live migration.

use std::path::PathBuf;

use anyhow::Context;
use clap::Parser;
use tracing::info;

use pvc_migrate::core::{manifest, review, MigrationEngine, VolumeMatcher};
use pvc_migrate::logging;
use pvc_migrate::services::{ConsolePrompt, DockerStore, KubectlClient};
use pvc_migrate::traits::VolumeStore;

/// Migrate Docker named volumes into Kubernetes PersistentVolumeClaims
#[derive(Parser)]
#[command(name = "pvc-migrate")]
#[command(about = "Matches Docker volumes to PVC declarations and copies their data into the cluster")]
pub struct Args {
    /// Directory containing the claim declaration YAML files
    pub manifest_dir: PathBuf,

    /// Execute the migration (default is dry-run)
    #[arg(long)]
    pub execute: bool,

    /// Kubernetes namespace for claims and migration pods
    #[arg(long, default_value = "default")]
    pub namespace: String,

    /// Log level (trace, debug, info, warn, error)
    #[arg(long, default_value = "info")]
    pub log_level: String,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let args = Args::parse();
    logging::init_tracing(&args.log_level);

    // Inventory snapshot; in-use volumes are already excluded here
    info!("loading source volumes");
    let store = DockerStore::new();
    let volumes = store.load_volumes().await.context("loading Docker volumes")?;
    info!("found {} source volumes", volumes.len());

    info!("parsing claim declarations in {}", args.manifest_dir.display());
    let mut claims =
        manifest::scan_claims(&args.manifest_dir).context("parsing claim declarations")?;
    info!("found {} claims in manifest files", claims.len());

    let prompt = ConsolePrompt::new();

    info!("matching source volumes to claims");
    let mut matcher = VolumeMatcher::new(volumes, prompt);
    matcher.load_compose_context(&args.manifest_dir);
    matcher.match_volumes(&mut claims).context("matching volumes")?;

    review::interactive_set_sizes(&mut claims, &prompt).context("interactive size configuration")?;
    review::print_summary(&claims);

    manifest::update_claim_sizes(&args.manifest_dir, &claims).context("updating claim manifests")?;

    let engine = MigrationEngine::new(KubectlClient::new(), prompt, args.namespace, args.manifest_dir);

    if args.execute {
        info!("starting migration");
        engine.run(&claims).await.context("migration failed")?;
    } else {
        for line in engine.dry_run(&claims) {
            println!("{line}");
        }
    }

    println!("Process complete!");
    Ok(())
}
