//! Tracing initialization for the migration CLI

use tracing_subscriber::EnvFilter;

/// Initialize the stdout tracing subscriber.
///
/// `RUST_LOG` takes precedence when set; otherwise the level from the
/// `--log-level` flag is applied to this crate only so kubectl/docker
/// noise from dependencies stays quiet.
pub fn init_tracing(log_level: &str) {
    let default_filter = format!("pvc_migrate={log_level}");
    let env_filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_filter));

    tracing_subscriber::fmt()
        .with_env_filter(env_filter)
        .with_target(false)
        .with_file(false)
        .with_line_number(false)
        .compact()
        .init();
}
