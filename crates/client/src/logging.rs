//! File logging for the terminal host.
//!
//! Logs never go to stdout, which belongs to the dialog and gate prompts.
use std::path::PathBuf;

use anyhow::Result;
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;

/// Setup logging to a per-session file
///
/// `RUST_LOG` adds directives on top of the `info` default.
pub fn setup_logging(session_id: &Option<String>) -> Result<PathBuf> {
    use std::time::{SystemTime, UNIX_EPOCH};

    let session_id = session_id.clone().unwrap_or_else(|| {
        let timestamp = SystemTime::now()
            .duration_since(UNIX_EPOCH)
            .map(|elapsed| elapsed.as_secs())
            .unwrap_or_default();
        format!("session_{}", timestamp)
    });

    let session_log_dir = log_directory().join(&session_id);
    std::fs::create_dir_all(&session_log_dir)?;

    let file_appender = tracing_appender::rolling::never(&session_log_dir, "client.log");
    let (non_blocking_file, guard) = tracing_appender::non_blocking(file_appender);

    let env_filter = tracing_subscriber::EnvFilter::from_default_env()
        .add_directive(tracing::Level::INFO.into());

    let file_layer = tracing_subscriber::fmt::layer()
        .with_writer(non_blocking_file)
        .with_ansi(false);

    tracing_subscriber::registry()
        .with(env_filter)
        .with(file_layer)
        .try_init()?;

    // Keep the writer alive for the rest of the process
    std::mem::forget(guard);

    tracing::info!("Logging initialized: session={}", session_id);

    let log_file = session_log_dir.join("client.log");
    tracing::info!("Log file: {}", log_file.display());
    Ok(log_file)
}

/// Platform cache directory for logs, e.g. `~/.cache/eldritch-sanctuary/logs` on Linux.
fn log_directory() -> PathBuf {
    directories::ProjectDirs::from("", "", "eldritch-sanctuary")
        .map(|dirs| dirs.cache_dir().join("logs"))
        .unwrap_or_else(|| std::env::temp_dir().join("eldritch-sanctuary").join("logs"))
}
