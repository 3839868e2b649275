use std::ffi::OsStr;
use std::io;
use std::path::{Path, PathBuf};

use once_cell::sync::OnceCell;
use tracing_appender::non_blocking::WorkerGuard;
use tracing_subscriber::util::SubscriberInitExt;
use tracing_subscriber::{fmt, layer::SubscriberExt, EnvFilter};

pub const LOG_FILE_ENV: &str = "RUST_LOG_FILE";
pub const DEFAULT_LOG_FILE: &str = "logs/app.log";

static FILE_GUARD: OnceCell<WorkerGuard> = OnceCell::new();

/// Log file from RUST_LOG_FILE, or logs/app.log
pub fn log_file_path() -> PathBuf {
    std::env::var_os(LOG_FILE_ENV).map(PathBuf::from).unwrap_or_else(|| PathBuf::from(DEFAULT_LOG_FILE))
}

/// Splits a log path into the rolling appender's directory and file prefix
fn split_log_path(path: &Path) -> (&Path, &OsStr) {
    let dir = match path.parent() {
        Some(p) if !p.as_os_str().is_empty() => p,
        _ => Path::new("."),
    };
    let file = path.file_name().unwrap_or(OsStr::new("app.log"));
    (dir, file)
}

/// Installs stderr and daily-rolling file logging plus a panic hook.
/// The filter comes from RUST_LOG and defaults to `info`.
pub fn init() {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));

    let console_layer = fmt::layer()
        .with_writer(io::stderr)
        .with_target(true)
        .with_file(true)
        .with_line_number(true)
        .with_level(true)
        .compact();

    let log_path = log_file_path();
    let (dir, file) = split_log_path(&log_path);
    let (nb_writer, guard) = tracing_appender::non_blocking(tracing_appender::rolling::daily(dir, file));
    let _ = FILE_GUARD.set(guard);

    let file_layer = fmt::layer()
        .with_writer(nb_writer)
        .with_ansi(false)
        .with_target(true)
        .with_file(true)
        .with_line_number(true)
        .with_level(true)
        .compact();

    let installed = tracing_subscriber::registry().with(filter).with(console_layer).with(file_layer).try_init();
    if installed.is_err() {
        tracing::warn!("A global tracing subscriber was already set");
        return;
    }

    std::panic::set_hook(Box::new(|info| {
        let mut msg = String::new();
        if let Some(loc) = info.location() {
            msg.push_str(&format!("panic at {}:{}:{} ", loc.file(), loc.line(), loc.column()));
        }
        if let Some(s) = info.payload().downcast_ref::<&str>() {
            msg.push_str(s);
        } else if let Some(s) = info.payload().downcast_ref::<String>() {
            msg.push_str(s);
        } else {
            msg.push_str("<non-string panic>");
        }
        let bt = std::backtrace::Backtrace::force_capture();
        tracing::error!("{}\nBacktrace:\n{:?}", msg, bt);
    }));
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_split_log_path() {
        let (dir, file) = split_log_path(Path::new("logs/app.log"));
        assert_eq!(dir, Path::new("logs"));
        assert_eq!(file, OsStr::new("app.log"));

        let (dir, file) = split_log_path(Path::new("runner.log"));
        assert_eq!(dir, Path::new("."));
        assert_eq!(file, OsStr::new("runner.log"));
    }
}
