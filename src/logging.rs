use std::fs::{File, OpenOptions};
use std::io;
use std::path::Path;

use anyhow::{Context, Result};
use tracing_appender::non_blocking::WorkerGuard;
use tracing_subscriber::{fmt, layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

/// Diagnostics go to stderr; stdout carries only the result. An optional
/// transcript file gets a second, plain-text copy of everything.
///
/// The returned guard must stay alive for the life of the invocation or
/// the file writer drops buffered lines.
pub fn init(log_file: Option<&Path>, append: bool) -> Result<Option<WorkerGuard>> {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    let stderr_layer = fmt::layer()
        .with_writer(io::stderr)
        .with_target(false)
        .without_time();

    let (file_layer, guard) = match log_file {
        Some(path) => {
            let file = open_log_file(path, append)
                .with_context(|| format!("could not open log file {}", path.display()))?;
            let (writer, guard) = tracing_appender::non_blocking(file);
            let layer = fmt::layer()
                .with_writer(writer)
                .with_ansi(false)
                .with_target(false);
            (Some(layer), Some(guard))
        }
        None => (None, None),
    };

    tracing_subscriber::registry()
        .with(filter)
        .with(stderr_layer)
        .with(file_layer)
        .init();
    Ok(guard)
}

fn open_log_file(path: &Path, append: bool) -> io::Result<File> {
    let mut options = OpenOptions::new();
    options.create(true).write(true);
    if append {
        options.append(true);
    } else {
        options.truncate(true);
    }
    options.open(path)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    #[test]
    fn append_keeps_existing_transcript() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("run.log");

        let mut first = open_log_file(&path, false).unwrap();
        writeln!(first, "first run").unwrap();
        drop(first);

        let mut second = open_log_file(&path, true).unwrap();
        writeln!(second, "second run").unwrap();
        drop(second);

        let contents = std::fs::read_to_string(&path).unwrap();
        assert!(contents.contains("first run"));
        assert!(contents.contains("second run"));
    }

    #[test]
    fn fresh_open_truncates_transcript() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("run.log");

        let mut first = open_log_file(&path, false).unwrap();
        writeln!(first, "stale line").unwrap();
        drop(first);

        drop(open_log_file(&path, false).unwrap());
        let contents = std::fs::read_to_string(&path).unwrap();
        assert!(!contents.contains("stale line"));
    }
}
