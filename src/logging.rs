/// Session logs for chanstat commands.
///
/// Every command appends to `<data_root>/logs/chanstat.log`. A session opens
/// with a `Session started` event carrying the subcommand and process id, so
/// concurrent runs stay distinguishable in one file.
use anyhow::{Context, Result};
use std::fmt;
use std::path::{Path, PathBuf};
use tracing_appender::rolling::{RollingFileAppender, Rotation};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

use crate::config::LoggingConfig;

/// Directory under the data root holding the log file.
pub const LOG_DIR: &str = "logs";

/// Log file name inside [`LOG_DIR`].
pub const LOG_FILE: &str = "chanstat.log";

/// Subcommand a log session belongs to.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SessionKind {
    Analyze,
    Quota,
}

impl fmt::Display for SessionKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Self::Analyze => "analyze",
            Self::Quota => "quota",
        })
    }
}

pub fn log_path(data_root: &Path) -> PathBuf {
    data_root.join(LOG_DIR).join(LOG_FILE)
}

fn build_filter(settings: &LoggingConfig) -> Result<EnvFilter> {
    if let Ok(filter) = EnvFilter::try_from_default_env() {
        return Ok(filter);
    }
    EnvFilter::try_new(&settings.level)
        .with_context(|| format!("Invalid log filter in config: '{}'", settings.level))
}

/// Install the file subscriber and open a session.
///
/// `detail` names what the session works on, e.g. the channel reference or
/// the quota action. Only the first call in a process installs a subscriber;
/// later calls just log a new session start.
pub fn init_logging(
    data_root: &Path,
    settings: &LoggingConfig,
    kind: SessionKind,
    detail: &str,
) -> Result<PathBuf> {
    let log_dir = data_root.join(LOG_DIR);
    std::fs::create_dir_all(&log_dir)
        .with_context(|| format!("Failed to create log directory: {}", log_dir.display()))?;

    let filter = build_filter(settings)?;
    let appender = RollingFileAppender::new(Rotation::NEVER, &log_dir, LOG_FILE);
    let file_layer = tracing_subscriber::fmt::layer()
        .with_writer(appender)
        .with_ansi(false)
        .with_target(true);

    let _ = tracing_subscriber::registry()
        .with(filter)
        .with(file_layer)
        .try_init();

    tracing::info!(
        session = %kind,
        detail,
        pid = std::process::id(),
        "Session started"
    );

    Ok(log_path(data_root))
}
