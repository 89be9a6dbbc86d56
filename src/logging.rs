// SPDX-License-Identifier: MIT
//
// Trace logging to a file.
//
// The terminal is in raw mode and every byte on it is accounted for by
// the document renderer, so logs can only go to a file. Without `--log`
// no subscriber is installed and every `tracing` macro is a no-op.

use std::path::Path;

use tracing_appender::non_blocking::WorkerGuard;
use tracing_subscriber::EnvFilter;

/// Environment variable holding the log filter directives.
pub const FILTER_ENV: &str = "ROWED_LOG";

/// Install a file subscriber writing to `path`.
///
/// Returns the writer guard; drop it last so buffered lines are flushed.
/// If a global subscriber is already installed the file is still created
/// but nothing is routed to it.
pub fn init(path: &Path) -> WorkerGuard {
    let dir = path
        .parent()
        .filter(|p| !p.as_os_str().is_empty())
        .unwrap_or_else(|| Path::new("."));
    let file_name = path.file_name().unwrap_or_else(|| "rowed.log".as_ref());

    let appender = tracing_appender::rolling::never(dir, file_name);
    let (writer, guard) = tracing_appender::non_blocking(appender);

    let filter = EnvFilter::try_from_env(FILTER_ENV).unwrap_or_else(|_| EnvFilter::new("info"));
    let _ = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(writer)
        .with_ansi(false)
        .try_init();

    guard
}
