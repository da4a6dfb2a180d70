//! Logging setup

use crate::config::BuildInfo;
use tracing_subscriber::EnvFilter;

/// Structured logs on stderr; stdout is reserved for workflow commands.
/// `RUST_LOG` overrides the default `info` level.
pub fn init_tracing() {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .with_writer(std::io::stderr)
        .init();
}

pub fn log_build(build: &BuildInfo) {
    tracing::info!(
        version = env!("CARGO_PKG_VERSION"),
        run_id = build.run_id.as_deref().unwrap_or("-"),
        repository = build.repository.as_deref().unwrap_or("-"),
        commit = build.commit.as_deref().unwrap_or("-"),
        "Starting sitepush"
    );
}
