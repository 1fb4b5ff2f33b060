//! Debounced single-slot document writer.
//!
//! A background thread owns one pending snapshot. Every scheduled
//! snapshot replaces the pending one and restarts the delay, so a burst
//! of mutations produces a single write of the final state. Dropping the
//! writer flushes whatever is still pending.

use std::io;
use std::path::PathBuf;
use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::mpsc::{self, RecvTimeoutError, Sender};
use std::thread::JoinHandle;
use std::time::Duration;

use tracing::{trace, warn};

use super::file::atomic_write;

/// Default debounce delay.
pub const DEFAULT_DEBOUNCE: Duration = Duration::from_millis(500);

enum Command {
    Write(String),
    Flush(Sender<io::Result<()>>),
}

/// Handle to the background writer thread.
pub struct DebouncedWriter {
    tx: Option<Sender<Command>>,
    handle: Option<JoinHandle<()>>,
    writes: Arc<AtomicUsize>,
    scheduled: AtomicUsize,
    settled: Arc<AtomicUsize>,
    path: PathBuf,
}

impl DebouncedWriter {
    /// Start a writer for `path` with the given delay.
    #[must_use]
    pub fn spawn(path: PathBuf, delay: Duration) -> Self {
        let (tx, rx) = mpsc::channel();
        let writes = Arc::new(AtomicUsize::new(0));
        let settled = Arc::new(AtomicUsize::new(0));

        let thread_path = path.clone();
        let thread_writes = Arc::clone(&writes);
        let thread_settled = Arc::clone(&settled);
        let handle = std::thread::spawn(move || {
            let mut pending: Option<String> = None;
            let mut received = 0;

            loop {
                let next = if pending.is_some() {
                    match rx.recv_timeout(delay) {
                        Ok(cmd) => Some(cmd),
                        Err(RecvTimeoutError::Timeout) => None,
                        Err(RecvTimeoutError::Disconnected) => break,
                    }
                } else {
                    match rx.recv() {
                        Ok(cmd) => Some(cmd),
                        Err(_) => break,
                    }
                };

                match next {
                    // Delay elapsed with no newer snapshot
                    None => {
                        if let Some(content) = pending.take() {
                            write_logged(&thread_path, &content, &thread_writes);
                        }
                        thread_settled.store(received, Ordering::Release);
                    }
                    Some(Command::Write(content)) => {
                        trace!("Snapshot scheduled, delay restarted");
                        pending = Some(content);
                        received += 1;
                    }
                    Some(Command::Flush(ack)) => {
                        let result = match pending.take() {
                            Some(content) => write_counted(&thread_path, &content, &thread_writes),
                            None => Ok(()),
                        };
                        thread_settled.store(received, Ordering::Release);
                        let _ = ack.send(result);
                    }
                }
            }

            if let Some(content) = pending.take() {
                write_logged(&thread_path, &content, &thread_writes);
            }
            thread_settled.store(received, Ordering::Release);
        });

        Self {
            tx: Some(tx),
            handle: Some(handle),
            writes,
            scheduled: AtomicUsize::new(0),
            settled,
            path,
        }
    }

    /// Replace the pending snapshot and restart the delay.
    pub fn schedule(&self, content: String) {
        if let Some(tx) = &self.tx {
            if tx.send(Command::Write(content)).is_err() {
                warn!(path = %self.path.display(), "Document writer stopped, snapshot dropped");
                return;
            }
            self.scheduled.fetch_add(1, Ordering::AcqRel);
        }
    }

    /// Whether a scheduled snapshot has not reached the document yet.
    #[must_use]
    pub fn is_pending(&self) -> bool {
        self.scheduled.load(Ordering::Acquire) != self.settled.load(Ordering::Acquire)
    }

    /// Write the pending snapshot now, if any.
    ///
    /// # Errors
    ///
    /// Returns the I/O error of the write, or `BrokenPipe` if the writer
    /// thread is gone.
    pub fn flush(&self) -> io::Result<()> {
        let stopped = || io::Error::new(io::ErrorKind::BrokenPipe, "document writer stopped");

        let tx = self.tx.as_ref().ok_or_else(stopped)?;
        let (ack_tx, ack_rx) = mpsc::channel();
        tx.send(Command::Flush(ack_tx)).map_err(|_| stopped())?;
        ack_rx.recv().map_err(|_| stopped())?
    }

    /// Number of completed writes.
    #[must_use]
    pub fn writes(&self) -> usize {
        self.writes.load(Ordering::Relaxed)
    }

    /// Target document path.
    #[must_use]
    pub fn path(&self) -> &std::path::Path {
        &self.path
    }
}

impl Drop for DebouncedWriter {
    fn drop(&mut self) {
        // Closing the channel makes the thread flush and exit
        self.tx.take();
        if let Some(handle) = self.handle.take() {
            let _ = handle.join();
        }
    }
}

fn write_counted(path: &std::path::Path, content: &str, writes: &AtomicUsize) -> io::Result<()> {
    atomic_write(path, content)?;
    writes.fetch_add(1, Ordering::Relaxed);
    Ok(())
}

fn write_logged(path: &std::path::Path, content: &str, writes: &AtomicUsize) {
    if let Err(e) = write_counted(path, content, writes) {
        warn!(path = %path.display(), error = %e, "Failed to write planner document");
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;
    use tempfile::TempDir;

    #[test]
    fn test_burst_coalesces_into_one_write() {
        let temp_dir = TempDir::new().unwrap();
        let path = temp_dir.path().join("doc.json");
        let writer = DebouncedWriter::spawn(path.clone(), Duration::from_secs(60));

        for i in 0..10 {
            writer.schedule(format!("state {i}"));
        }
        writer.flush().unwrap();

        assert_eq!(writer.writes(), 1);
        assert_eq!(fs::read_to_string(&path).unwrap(), "state 9");
    }

    #[test]
    fn test_delay_elapses_and_writes() {
        let temp_dir = TempDir::new().unwrap();
        let path = temp_dir.path().join("doc.json");
        let writer = DebouncedWriter::spawn(path.clone(), Duration::from_millis(20));

        writer.schedule("a".into());
        writer.schedule("b".into());

        let deadline = std::time::Instant::now() + Duration::from_secs(5);
        while writer.writes() == 0 && std::time::Instant::now() < deadline {
            std::thread::sleep(Duration::from_millis(10));
        }

        assert_eq!(writer.writes(), 1);
        assert_eq!(fs::read_to_string(&path).unwrap(), "b");
    }

    #[test]
    fn test_pending_until_written() {
        let temp_dir = TempDir::new().unwrap();
        let path = temp_dir.path().join("doc.json");
        let writer = DebouncedWriter::spawn(path, Duration::from_secs(60));
        assert!(!writer.is_pending());

        writer.schedule("a".into());
        writer.schedule("b".into());
        assert!(writer.is_pending());

        writer.flush().unwrap();
        assert!(!writer.is_pending());
    }

    #[test]
    fn test_flush_without_pending_is_noop() {
        let temp_dir = TempDir::new().unwrap();
        let path = temp_dir.path().join("doc.json");
        let writer = DebouncedWriter::spawn(path.clone(), Duration::from_secs(60));

        writer.flush().unwrap();
        assert_eq!(writer.writes(), 0);
        assert!(!path.exists());
    }

    #[test]
    fn test_drop_flushes_pending() {
        let temp_dir = TempDir::new().unwrap();
        let path = temp_dir.path().join("doc.json");

        {
            let writer = DebouncedWriter::spawn(path.clone(), Duration::from_secs(60));
            writer.schedule("final".into());
        }

        assert_eq!(fs::read_to_string(&path).unwrap(), "final");
    }
}
