//! Seam for running rolling-average maintenance off the caller's thread.

/// A unit of background work.
pub type Job = Box<dyn FnOnce() + Send + 'static>;

/// FIFO executor for clean/average jobs.
pub trait TaskQueue: Send + Sync {
    /// Enqueue `job`. Hands the job back when the queue no longer accepts work,
    /// so the caller can run it inline instead.
    fn submit(&self, job: Job) -> std::result::Result<(), Job>;
}
