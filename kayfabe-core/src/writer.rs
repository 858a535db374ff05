//! Fire-and-forget background snapshot persistence.
//!
//! Save jobs flow through a channel to a dedicated thread that owns the
//! [`StateStore`]. Submitting never blocks the decision pipeline and a
//! failed save is logged and counted, never surfaced to the caller; the
//! engine accepts divergence between memory and disk over crashing.
//!
//! Shutdown is a sentinel job: everything queued ahead of it is flushed,
//! a rotating backup is taken, and the thread exits.

use std::sync::mpsc::{self, Receiver, Sender};
use std::sync::Arc;
use std::thread::JoinHandle;

use parking_lot::Mutex;
use tracing::{debug, info, warn};

use crate::error::Result;
use crate::persistence::StateStore;

/// One unit of background persistence work.
#[derive(Debug, Clone)]
pub enum SaveJob {
    /// Upsert one component's JSON snapshot.
    Snapshot {
        /// Component name (`director`, `ledger`, `booker`).
        component: String,
        /// Serialized state.
        json: String,
    },
    /// Append one record to the storyline audit log.
    Beat {
        /// Serialized beat record.
        json: String,
    },
    /// Flush queued work, back up, and stop the thread.
    Shutdown,
}

/// Counters for background save activity.
#[derive(Debug, Clone, Default)]
pub struct WriterStats {
    /// Jobs handed to the channel (shutdown sentinels excluded).
    pub submitted: u64,
    /// Jobs persisted successfully.
    pub saved: u64,
    /// Jobs that hit a storage error.
    pub failed: u64,
}

/// Cloneable submission half of the writer.
#[derive(Debug, Clone)]
pub struct SnapshotHandle {
    tx: Sender<SaveJob>,
    stats: Arc<Mutex<WriterStats>>,
}

impl SnapshotHandle {
    /// Queue a job. Never blocks; a dead writer thread drops the job
    /// with a warning.
    pub fn submit(&self, job: SaveJob) {
        if !matches!(job, SaveJob::Shutdown) {
            self.stats.lock().submitted += 1;
        }
        if self.tx.send(job).is_err() {
            warn!("snapshot writer is gone; save job dropped");
        }
    }

    /// Queue a component snapshot.
    pub fn snapshot(&self, component: impl Into<String>, json: String) {
        self.submit(SaveJob::Snapshot {
            component: component.into(),
            json,
        });
    }

    /// Queue an audit-log beat.
    pub fn beat(&self, json: String) {
        self.submit(SaveJob::Beat { json });
    }

    /// Copy of the current counters.
    #[must_use]
    pub fn stats(&self) -> WriterStats {
        self.stats.lock().clone()
    }
}

/// The background writer thread. Stop it with [`Self::shutdown`]; dropping
/// it instead detaches the thread, which exits once every handle is gone.
#[derive(Debug)]
pub struct SnapshotWriter {
    thread: Option<JoinHandle<()>>,
}

impl SnapshotWriter {
    /// Spawn the writer thread, taking ownership of `store`.
    ///
    /// # Errors
    /// Returns `KayfabeError::Io` if the OS refuses a new thread.
    pub fn spawn(store: StateStore) -> Result<(Self, SnapshotHandle)> {
        let (tx, rx) = mpsc::channel();
        let stats = Arc::new(Mutex::new(WriterStats::default()));
        let thread_stats = Arc::clone(&stats);
        let thread = std::thread::Builder::new()
            .name("kayfabe-snapshot-writer".to_string())
            .spawn(move || writer_loop(&store, &rx, &thread_stats))?;
        Ok((
            Self { thread: Some(thread) },
            SnapshotHandle { tx, stats },
        ))
    }

    /// Send the shutdown sentinel and join, flushing all queued jobs.
    pub fn shutdown(mut self, handle: &SnapshotHandle) {
        handle.submit(SaveJob::Shutdown);
        if let Some(thread) = self.thread.take() {
            if thread.join().is_err() {
                warn!("snapshot writer thread panicked");
            }
        }
    }
}

fn writer_loop(store: &StateStore, rx: &Receiver<SaveJob>, stats: &Mutex<WriterStats>) {
    while let Ok(job) = rx.recv() {
        match job {
            SaveJob::Snapshot { component, json } => match store.save_snapshot(&component, &json) {
                Ok(()) => stats.lock().saved += 1,
                Err(e) => {
                    stats.lock().failed += 1;
                    warn!(component = %component, error = %e, "snapshot save failed");
                }
            },
            SaveJob::Beat { json } => match store.append_beat(&json) {
                Ok(()) => stats.lock().saved += 1,
                Err(e) => {
                    stats.lock().failed += 1;
                    warn!(error = %e, "audit-log append failed");
                }
            },
            SaveJob::Shutdown => {
                if let Err(e) = store.create_rotating_backup() {
                    warn!(error = %e, "backup on shutdown failed");
                }
                info!("snapshot writer stopped");
                return;
            }
        }
    }
    debug!("snapshot channel closed without shutdown sentinel");
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::PersistenceConfig;

    #[test]
    fn jobs_are_flushed_before_shutdown_completes() {
        let dir = tempfile::tempdir().expect("tempdir");
        let db_path = dir.path().join("writer.db");
        let config = PersistenceConfig::default();
        let store = StateStore::open(&db_path, &config).expect("open");

        let (writer, handle) = SnapshotWriter::spawn(store).expect("spawn");
        handle.snapshot("director", "{\"message_count\":3}".to_string());
        handle.beat("{\"beat\":\"trash-talk\"}".to_string());
        handle.beat("{\"beat\":\"promo-hype\"}".to_string());
        writer.shutdown(&handle);

        let stats = handle.stats();
        assert_eq!(stats.submitted, 3);
        assert_eq!(stats.saved, 3);
        assert_eq!(stats.failed, 0);

        let reopened = StateStore::open(&db_path, &config).expect("reopen");
        assert_eq!(
            reopened.load_snapshot("director").expect("load").expect("Some"),
            "{\"message_count\":3}"
        );
        assert_eq!(reopened.beat_count().expect("count"), 2);
    }

    #[test]
    fn shutdown_takes_a_rotating_backup() {
        let dir = tempfile::tempdir().expect("tempdir");
        let db_path = dir.path().join("promotion.db");
        let store = StateStore::open(&db_path, &PersistenceConfig::default()).expect("open");

        let (writer, handle) = SnapshotWriter::spawn(store).expect("spawn");
        handle.snapshot("ledger", "{}".to_string());
        writer.shutdown(&handle);

        assert!(dir.path().join("promotion.db.bak.1").exists());
    }

    #[test]
    fn submitting_after_shutdown_does_not_panic() {
        let dir = tempfile::tempdir().expect("tempdir");
        let store =
            StateStore::open(dir.path().join("late.db"), &PersistenceConfig::default())
                .expect("open");

        let (writer, handle) = SnapshotWriter::spawn(store).expect("spawn");
        writer.shutdown(&handle);

        // The thread is gone; the job is dropped with a warning.
        handle.snapshot("director", "{}".to_string());
        assert_eq!(handle.stats().submitted, 1);
        assert_eq!(handle.stats().saved, 0);
    }
}
