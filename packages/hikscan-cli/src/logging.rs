//! Console and log file output.

use std::fs::{File, OpenOptions};
use std::io::{self, Write};
use std::path::Path;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use tracing_subscriber::fmt::MakeWriter;
use tracing_subscriber::prelude::*;
use tracing_subscriber::{EnvFilter, fmt};

/// Initialize logging. Console output starts immediately; the returned
/// [`LogFile`] receives the same events once a file is attached.
///
/// `RUST_LOG` overrides the default filter.
pub fn init(verbose: bool) -> LogFile {
    let log_level = if verbose { "debug" } else { "info" };
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| format!("hikscan={},hikscan_core={}", log_level, log_level).into());

    let log_file = LogFile::default();

    tracing_subscriber::registry()
        .with(filter)
        .with(fmt::layer().with_target(false))
        .with(
            fmt::layer()
                .with_ansi(false)
                .with_target(false)
                .with_writer(log_file.clone()),
        )
        .init();

    log_file
}

/// Log file sink that can be opened after logging is up.
///
/// Output written before [`LogFile::attach`] is held and flushed to the
/// file on attach, so settings warnings end up in the log as well.
#[derive(Clone, Default)]
pub struct LogFile {
    inner: Arc<Mutex<Sink>>,
}

#[derive(Default)]
struct Sink {
    file: Option<File>,
    pending: Vec<u8>,
    detached: bool,
}

impl LogFile {
    /// Open `path` for appending and flush held output into it.
    pub fn attach(&self, path: &Path) {
        let opened = OpenOptions::new()
            .create(true)
            .append(true)
            .open(path)
            .and_then(|mut file| {
                let pending = std::mem::take(&mut self.lock().pending);
                file.write_all(&pending)?;
                Ok(file)
            });

        match opened {
            Ok(file) => self.lock().file = Some(file),
            Err(e) => {
                self.detach();
                tracing::warn!("Failed to open log file {}: {}", path.display(), e);
            }
        }
    }

    /// Drop held output and stop holding more.
    pub fn detach(&self) {
        let mut sink = self.lock();
        sink.pending.clear();
        sink.detached = true;
    }

    fn lock(&self) -> MutexGuard<'_, Sink> {
        self.inner.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

impl Write for LogFile {
    fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
        let mut sink = self.lock();
        match sink.file.as_mut() {
            Some(file) => file.write(buf),
            None => {
                if !sink.detached {
                    sink.pending.extend_from_slice(buf);
                }
                Ok(buf.len())
            }
        }
    }

    fn flush(&mut self) -> io::Result<()> {
        match self.lock().file.as_mut() {
            Some(file) => file.flush(),
            None => Ok(()),
        }
    }
}

impl<'a> MakeWriter<'a> for LogFile {
    type Writer = LogFile;

    fn make_writer(&'a self) -> Self::Writer {
        self.clone()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use hikscan_core::config::ScanConfig;

    fn capture(log_file: &LogFile) -> tracing::subscriber::DefaultGuard {
        let subscriber = tracing_subscriber::fmt()
            .with_writer(log_file.clone())
            .with_ansi(false)
            .with_target(false)
            .finish();
        tracing::subscriber::set_default(subscriber)
    }

    #[test]
    fn test_settings_warnings_reach_log_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("scan_log.txt");
        let log_file = LogFile::default();
        let _guard = capture(&log_file);

        // emitted while the log path is still unknown
        let config =
            ScanConfig::from_sources(None, |key| (key == "HIK_PORT").then(|| "eighty".to_string()));
        assert_eq!(config.device.port, 80);
        log_file.attach(&path);
        tracing::info!("Processing: cam-gate (10.0.0.5)...");

        let content = std::fs::read_to_string(&path).unwrap();
        let lines: Vec<_> = content.lines().collect();
        assert_eq!(lines.len(), 2);
        assert!(lines[0].contains("Ignoring HIK_PORT='eighty'"));
        assert!(lines[1].contains("Processing: cam-gate"));
    }

    #[test]
    fn test_attach_appends() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("scan_log.txt");
        std::fs::write(&path, "previous run\n").unwrap();

        let mut log_file = LogFile::default();
        log_file.write_all(b"next run\n").unwrap();
        log_file.attach(&path);

        assert_eq!(std::fs::read_to_string(&path).unwrap(), "previous run\nnext run\n");
    }

    #[test]
    fn test_unopenable_log_file_is_not_fatal() {
        let dir = tempfile::tempdir().unwrap();
        let mut log_file = LogFile::default();
        log_file.write_all(b"held\n").unwrap();

        log_file.attach(&dir.path().join("missing-dir").join("scan_log.txt"));
        log_file.write_all(b"dropped\n").unwrap();

        let sink = log_file.lock();
        assert!(sink.file.is_none());
        assert!(sink.pending.is_empty());
    }
}
