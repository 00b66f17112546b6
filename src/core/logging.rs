// ─── Logging ───
// Console + launcher-latest.log, filtered through RUST_LOG.

use std::fs::File;
use std::sync::Mutex;

use tracing::info;
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;
use tracing_subscriber::{fmt, EnvFilter};

use crate::core::error::{LauncherError, LauncherResult};
use crate::core::paths::InstallLayout;

pub const DEFAULT_FILTER: &str = "info,solar_launcher=debug";

/// Installs the global subscriber. The launcher log is truncated first.
pub fn init(layout: &InstallLayout) -> LauncherResult<()> {
    let logs_dir = layout.logs_dir();
    std::fs::create_dir_all(&logs_dir).map_err(|e| LauncherError::io(&logs_dir, e))?;
    let log_path = layout.launcher_log();
    let file = File::create(&log_path).map_err(|e| LauncherError::io(&log_path, e))?;

    tracing_subscriber::registry()
        .with(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(DEFAULT_FILTER)))
        .with(fmt::layer().with_target(false))
        .with(fmt::layer().with_ansi(false).with_writer(Mutex::new(file)))
        .try_init()
        .map_err(|e| LauncherError::Other(format!("Logger already installed: {e}")))?;

    info!(
        "Solar launcher starting at {} (log file {:?})",
        chrono::Local::now().format("%Y-%m-%d %H:%M:%S"),
        log_path
    );
    Ok(())
}
