// SPDX-License-Identifier: Apache-2.0

//! Logging setup for hosts embedding the console engine.
//!
//! Events go to a daily-rolling JSON log under the user's data directory;
//! files older than the retention window are removed at startup. Commands
//! are never logged verbatim by this crate, only their length.

pub mod sensitive;

pub use sensitive::Sensitive;

use std::fs;
use std::path::{Path, PathBuf};
use std::time::{Duration, SystemTime};

use tracing_appender::rolling::RollingFileAppender;
use tracing_subscriber::fmt::format::FmtSpan;
use tracing_subscriber::EnvFilter;

const LOG_FILE_PREFIX: &str = "webconsole.log";
const LOG_RETENTION_DAYS: u64 = 14;
const DEFAULT_FILTER: &str = "webconsole=info,audit=info";

/// Installs the global subscriber writing to the default log directory.
pub fn init_tracing() {
    init_tracing_in(&log_directory());
}

/// Installs the global subscriber writing under `log_dir`.
///
/// `RUST_LOG` overrides the default filter. A subscriber installed earlier
/// by the host wins; this call then only prunes old files.
pub fn init_tracing_in(log_dir: &Path) {
    let _ = fs::create_dir_all(log_dir);

    if let Err(e) = cleanup_old_logs(log_dir, LOG_RETENTION_DAYS) {
        eprintln!("Failed to clean up old logs: {}", e);
    }

    let file_appender: RollingFileAppender =
        tracing_appender::rolling::daily(log_dir, LOG_FILE_PREFIX);
    let env_filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(DEFAULT_FILTER));

    let installed = tracing_subscriber::fmt()
        .with_env_filter(env_filter)
        .with_writer(file_appender)
        .json()
        .with_thread_ids(true)
        .with_file(true)
        .with_line_number(true)
        .with_current_span(true)
        .with_span_list(true)
        .with_ansi(false)
        .with_span_events(FmtSpan::CLOSE)
        .try_init()
        .is_ok();

    if !installed {
        return;
    }

    let previous_hook = std::panic::take_hook();
    std::panic::set_hook(Box::new(move |panic_info| {
        let location = panic_info
            .location()
            .map(|l| format!("{}:{}:{}", l.file(), l.line(), l.column()))
            .unwrap_or_else(|| "unknown".to_string());

        let payload = panic_info.payload();
        let message = if let Some(s) = payload.downcast_ref::<&str>() {
            (*s).to_string()
        } else if let Some(s) = payload.downcast_ref::<String>() {
            s.clone()
        } else {
            "unknown cause".to_string()
        };

        tracing::error!(target: "panic", location = %location, message = %message, "panicked");
        previous_hook(panic_info);
    }));

    tracing::info!(log_dir = %log_dir.display(), "tracing initialized");
}

fn log_directory() -> PathBuf {
    dirs::data_local_dir()
        .or_else(dirs::home_dir)
        .unwrap_or_else(std::env::temp_dir)
        .join("webconsole")
        .join("logs")
}

/// Removes `*.log*` files in `log_dir` older than `retention_days`.
/// Returns how many were removed.
fn cleanup_old_logs(log_dir: &Path, retention_days: u64) -> std::io::Result<usize> {
    let now = SystemTime::now();
    let retention = Duration::from_secs(retention_days * 24 * 60 * 60);
    let mut removed = 0;

    for entry in fs::read_dir(log_dir)? {
        let path = entry?.path();
        let is_log = path
            .file_name()
            .and_then(|name| name.to_str())
            .map(|name| name.starts_with(LOG_FILE_PREFIX) || name.ends_with(".log"))
            .unwrap_or(false);
        if !is_log {
            continue;
        }

        let age = fs::metadata(&path)
            .and_then(|metadata| metadata.modified())
            .ok()
            .and_then(|modified| now.duration_since(modified).ok());

        if matches!(age, Some(age) if age > retention) {
            match fs::remove_file(&path) {
                Ok(()) => removed += 1,
                Err(e) => eprintln!("Failed to remove old log file {:?}: {}", path, e),
            }
        }
    }
    Ok(removed)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn age_file(path: &Path, days: u64) {
        let file = fs::File::options().write(true).open(path).unwrap();
        file.set_modified(SystemTime::now() - Duration::from_secs(days * 24 * 60 * 60))
            .unwrap();
    }

    #[test]
    fn cleanup_removes_only_expired_logs() {
        let dir = tempfile::tempdir().unwrap();
        let old = dir.path().join("webconsole.log.2020-01-01");
        let fresh = dir.path().join("webconsole.log.2099-01-01");
        let unrelated = dir.path().join("notes.txt");
        for path in [&old, &fresh, &unrelated] {
            fs::write(path, "{}").unwrap();
        }
        age_file(&old, 30);
        age_file(&unrelated, 30);

        let removed = cleanup_old_logs(dir.path(), LOG_RETENTION_DAYS).unwrap();

        assert_eq!(removed, 1);
        assert!(!old.exists());
        assert!(fresh.exists());
        assert!(unrelated.exists());
    }

    #[test]
    fn cleanup_of_missing_directory_fails() {
        let dir = tempfile::tempdir().unwrap();
        assert!(cleanup_old_logs(&dir.path().join("absent"), 1).is_err());
    }

    #[test]
    fn default_directory_is_namespaced() {
        assert!(log_directory().ends_with("webconsole/logs"));
    }
}
