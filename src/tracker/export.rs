//! Throttled status export.
//!
//! The tracker hands a snapshot of its active set to a [`StatusSink`] at most
//! once per export interval. Sink failures are logged by the tracker and never
//! touch tracking state.

use std::fs;
use std::io::Write;
use std::path::{Path, PathBuf};
use std::sync::mpsc::{self, SyncSender, TrySendError};
use std::thread::{self, JoinHandle};
use std::time::{Duration, Instant};

use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

use crate::error::ExportError;

/// One exported entity.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StatusRecord {
    pub internal_id: u64,
    pub class: String,
    /// Time since creation, `MM:SS`.
    pub duration: String,
    /// First-seen time, `YYYY-MM-DD HH:MM:SS`.
    pub timestamp: String,
    /// `LIVE` if matched this frame, else `MEMORY`.
    pub status: String,
}

/// Destination for status snapshots.
pub trait StatusSink: Send {
    fn write(&mut self, records: &[StatusRecord]) -> Result<(), ExportError>;
}

/// Overwrites a JSON file with the latest snapshot.
///
/// The file is written to a sibling temp file and renamed into place, so
/// readers tailing it never see a half-written array. On Unix the file is
/// made world-readable and writable.
#[derive(Debug, Clone)]
pub struct JsonFileSink {
    path: PathBuf,
}

impl JsonFileSink {
    /// Create the sink, creating parent directories and an empty array file
    /// if none exists yet.
    pub fn create(path: impl Into<PathBuf>) -> Result<Self, ExportError> {
        let sink = Self { path: path.into() };
        if let Some(parent) = sink.path.parent().filter(|p| !p.as_os_str().is_empty()) {
            fs::create_dir_all(parent).map_err(|source| ExportError::Io {
                path: parent.to_path_buf(),
                source,
            })?;
        }
        if !sink.path.exists() {
            sink.write_all(&[])?;
        }
        Ok(sink)
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    fn write_all(&self, records: &[StatusRecord]) -> Result<(), ExportError> {
        let io_err = |source| ExportError::Io {
            path: self.path.clone(),
            source,
        };

        let mut buf = Vec::new();
        let formatter = serde_json::ser::PrettyFormatter::with_indent(b"    ");
        let mut ser = serde_json::Serializer::with_formatter(&mut buf, formatter);
        records.serialize(&mut ser)?;

        let tmp = self.path.with_extension("json.tmp");
        let mut file = fs::File::create(&tmp).map_err(io_err)?;
        file.write_all(&buf).map_err(io_err)?;
        file.sync_data().map_err(io_err)?;
        drop(file);
        set_world_readable(&tmp).map_err(io_err)?;
        fs::rename(&tmp, &self.path).map_err(io_err)?;
        Ok(())
    }
}

impl StatusSink for JsonFileSink {
    fn write(&mut self, records: &[StatusRecord]) -> Result<(), ExportError> {
        self.write_all(records)
    }
}

#[cfg(unix)]
fn set_world_readable(path: &Path) -> std::io::Result<()> {
    use std::os::unix::fs::PermissionsExt;
    fs::set_permissions(path, fs::Permissions::from_mode(0o666))
}

#[cfg(not(unix))]
fn set_world_readable(_path: &Path) -> std::io::Result<()> {
    Ok(())
}

/// How long dropping a [`BackgroundSink`] waits for the writer by default.
pub const DEFAULT_SHUTDOWN_TIMEOUT: Duration = Duration::from_secs(1);

/// Runs another sink on a dedicated writer thread.
///
/// At most one snapshot is queued. `write` waits up to `max_wait` for the
/// queue to free up and otherwise returns [`ExportError::Busy`], so slow
/// storage can never stall the frame loop for longer than that. Dropping the
/// sink waits up to the shutdown timeout for the last snapshot, then leaves a
/// stuck writer thread detached.
pub struct BackgroundSink {
    sender: Option<SyncSender<Vec<StatusRecord>>>,
    worker: Option<JoinHandle<()>>,
    max_wait: Duration,
    shutdown_timeout: Duration,
}

impl BackgroundSink {
    /// Background sink that never waits for the queue.
    pub fn new<S: StatusSink + 'static>(inner: S) -> Self {
        Self::spawn(inner, Duration::ZERO)
    }

    pub fn spawn<S: StatusSink + 'static>(mut inner: S, max_wait: Duration) -> Self {
        let (sender, receiver) = mpsc::sync_channel::<Vec<StatusRecord>>(1);
        let worker = thread::spawn(move || {
            for records in receiver {
                match inner.write(&records) {
                    Ok(()) => debug!(count = records.len(), "status snapshot written"),
                    Err(e) => warn!("status export failed: {e}"),
                }
            }
        });
        Self {
            sender: Some(sender),
            worker: Some(worker),
            max_wait,
            shutdown_timeout: DEFAULT_SHUTDOWN_TIMEOUT,
        }
    }

    pub fn with_shutdown_timeout(mut self, timeout: Duration) -> Self {
        self.shutdown_timeout = timeout;
        self
    }

    pub fn max_wait(&self) -> Duration {
        self.max_wait
    }
}

impl StatusSink for BackgroundSink {
    fn write(&mut self, records: &[StatusRecord]) -> Result<(), ExportError> {
        let sender = self.sender.as_ref().ok_or(ExportError::Disconnected)?;
        let deadline = Instant::now() + self.max_wait;
        let mut pending = records.to_vec();
        loop {
            match sender.try_send(pending) {
                Ok(()) => return Ok(()),
                Err(TrySendError::Disconnected(_)) => return Err(ExportError::Disconnected),
                Err(TrySendError::Full(back)) => {
                    if Instant::now() >= deadline {
                        return Err(ExportError::Busy);
                    }
                    pending = back;
                    thread::sleep(Duration::from_millis(1));
                }
            }
        }
    }
}

impl Drop for BackgroundSink {
    fn drop(&mut self) {
        // Closing the channel lets the worker drain and exit.
        self.sender.take();
        let Some(worker) = self.worker.take() else {
            return;
        };
        let deadline = Instant::now() + self.shutdown_timeout;
        while !worker.is_finished() {
            if Instant::now() >= deadline {
                warn!(
                    timeout_ms = self.shutdown_timeout.as_millis() as u64,
                    "status writer did not finish, detaching it"
                );
                return;
            }
            thread::sleep(Duration::from_millis(1));
        }
        let _ = worker.join();
    }
}
