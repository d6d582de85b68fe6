use std::fs;
use std::fs::OpenOptions;
use std::path::Path;

use tracing_appender::non_blocking;
use tracing_appender::non_blocking::WorkerGuard;
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;
use tracing_subscriber::EnvFilter;
use tracing_subscriber::Layer;

const LOG_FILE: &str = "folio-tui.log";

/// The binary's own events are targeted `folio::…` (the bin name), not the
/// package name.
pub fn default_filter(debug: bool) -> &'static str {
    if debug {
        "folio=info,folio_core=info,folio_remote=info"
    } else {
        "folio=warn,folio_core=warn,folio_remote=warn"
    }
}

/// Sends all tracing output to `log_dir/folio-tui.log`. The terminal belongs
/// to the UI, so nothing is written to stdout. Keep the guard alive until
/// exit or buffered lines are lost.
pub fn init_file_logging(log_dir: &Path, debug: bool) -> anyhow::Result<WorkerGuard> {
    fs::create_dir_all(log_dir)?;
    let mut options = OpenOptions::new();
    options.create(true).append(true);
    #[cfg(unix)]
    {
        use std::os::unix::fs::OpenOptionsExt;
        options.mode(0o600);
    }
    let log_file = options.open(log_dir.join(LOG_FILE))?;
    let (writer, guard) = non_blocking(log_file);

    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_filter(debug)));
    let file_layer = tracing_subscriber::fmt::layer()
        .with_writer(writer)
        .with_target(false)
        .with_ansi(false)
        .with_filter(filter);

    let _ = tracing_subscriber::registry().with(file_layer).try_init();
    Ok(guard)
}
