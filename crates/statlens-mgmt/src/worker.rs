//! Dedicated background thread for rolling-average maintenance.
//!
//! One FIFO queue, one thread. Counters submit clean/average jobs and return
//! immediately; once the worker is closed, submissions are handed back and
//! run on the caller's thread. A job accepted before the close always runs.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::thread;

use tokio::sync::{mpsc, oneshot};

use statlens_core::error::{Result, StatsError};
use statlens_core::{Job, TaskQueue};

enum Task {
    Run(Job),
    Stop,
}

#[derive(Clone)]
pub struct BackgroundWorker {
    tx: mpsc::UnboundedSender<Task>,
    closed: Arc<AtomicBool>,
}

impl BackgroundWorker {
    /// Start the worker thread.
    pub fn spawn(name: &str) -> Result<(Self, thread::JoinHandle<()>)> {
        let (tx, mut rx) = mpsc::unbounded_channel::<Task>();
        let thread_name = name.to_string();
        let handle = thread::Builder::new()
            .name(thread_name.clone())
            .spawn(move || {
                tracing::debug!(worker = %thread_name, "background worker started");
                // After `Stop` the receiver is closed: later sends fail and are
                // run by the submitter, queued jobs still drain here.
                while let Some(task) = rx.blocking_recv() {
                    match task {
                        Task::Run(job) => job(),
                        Task::Stop => rx.close(),
                    }
                }
                tracing::debug!(worker = %thread_name, "background worker stopped");
            })
            .map_err(|e| StatsError::Internal(format!("spawn background worker failed: {e}")))?;

        Ok((
            Self {
                tx,
                closed: Arc::new(AtomicBool::new(false)),
            },
            handle,
        ))
    }

    pub fn is_closed(&self) -> bool {
        self.closed.load(Ordering::Acquire)
    }

    /// Stop accepting jobs. Jobs already queued still run.
    pub fn close(&self) {
        if !self.closed.swap(true, Ordering::AcqRel) {
            let _ = self.tx.send(Task::Stop);
        }
    }

    /// Block until every job submitted before this call has run. Returns
    /// false when the worker had already stopped receiving.
    ///
    /// Must not be called from inside an async runtime.
    pub fn flush(&self) -> bool {
        let (done_tx, done_rx) = oneshot::channel::<()>();
        let job: Job = Box::new(move || {
            let _ = done_tx.send(());
        });
        self.tx.send(Task::Run(job)).is_ok() && done_rx.blocking_recv().is_ok()
    }
}

impl TaskQueue for BackgroundWorker {
    fn submit(&self, job: Job) -> std::result::Result<(), Job> {
        if self.is_closed() {
            return Err(job);
        }
        self.tx.send(Task::Run(job)).map_err(|e| match e.0 {
            Task::Run(job) => job,
            Task::Stop => Box::new(|| {}) as Job,
        })
    }
}
