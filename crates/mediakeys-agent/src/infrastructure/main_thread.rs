//! Primary-thread executors.
//!
//! [`main_thread_channel`] returns a queue (`Send + Sync`, handed to the
//! engine) and a loop that the binary drives on the process's primary
//! thread inside a current-thread Tokio runtime.  Jobs run in submission
//! order, one at a time.
//!
//! [`InlineExecutor`] runs jobs immediately on the submitting thread.  It is
//! only correct where no OS API cares which thread it runs on: tests and the
//! mock backend.

use tokio::sync::mpsc;
use tracing::debug;

use crate::application::ports::{ExecutorError, MainThreadExecutor, MainThreadJob};

/// Creates a connected queue / loop pair.
pub fn main_thread_channel() -> (MainThreadQueue, MainThreadLoop) {
    let (tx, rx) = mpsc::unbounded_channel();
    (MainThreadQueue { tx }, MainThreadLoop { rx })
}

/// Sending half.  Cheap to clone.
#[derive(Clone)]
pub struct MainThreadQueue {
    tx: mpsc::UnboundedSender<MainThreadJob>,
}

impl MainThreadExecutor for MainThreadQueue {
    fn submit(&self, job: MainThreadJob) -> Result<(), ExecutorError> {
        self.tx.send(job).map_err(|_| ExecutorError::Closed)
    }
}

/// Receiving half.  Must be driven from the primary thread.
pub struct MainThreadLoop {
    rx: mpsc::UnboundedReceiver<MainThreadJob>,
}

impl MainThreadLoop {
    /// Runs jobs until every queue handle has been dropped.
    pub async fn run(mut self) {
        while let Some(job) = self.rx.recv().await {
            job();
        }
        debug!("main-thread queue closed");
    }

    /// Runs every job queued so far without waiting.  Returns how many ran.
    pub fn run_pending(&mut self) -> usize {
        let mut ran = 0;
        while let Ok(job) = self.rx.try_recv() {
            job();
            ran += 1;
        }
        ran
    }
}

/// Runs each job on the calling thread.
#[derive(Debug, Default, Clone, Copy)]
pub struct InlineExecutor;

impl MainThreadExecutor for InlineExecutor {
    fn submit(&self, job: MainThreadJob) -> Result<(), ExecutorError> {
        job();
        Ok(())
    }
}

// ── Tests ─────────────────────────────────────────────────────────────────────
