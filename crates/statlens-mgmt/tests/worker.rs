#![allow(clippy::unwrap_used)]
#![allow(clippy::expect_used)]
#![allow(clippy::panic)]

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{mpsc, Arc};
use std::thread;
use std::time::Duration;

use statlens_core::{Job, TaskQueue};
use statlens_mgmt::worker::BackgroundWorker;

/// Occupy the worker until the returned sender fires.
fn hold(worker: &BackgroundWorker) -> mpsc::Sender<()> {
    let (release_tx, release_rx) = mpsc::channel::<()>();
    let job: Job = Box::new(move || {
        let _ = release_rx.recv();
    });
    assert!(worker.submit(job).is_ok());
    release_tx
}

fn counting_job(ran: &Arc<AtomicUsize>) -> Job {
    let ran = Arc::clone(ran);
    Box::new(move || {
        ran.fetch_add(1, Ordering::SeqCst);
    })
}

#[test]
fn queued_jobs_run_before_stop() {
    let (worker, handle) = BackgroundWorker::spawn("worker-drain").unwrap();
    let ran = Arc::new(AtomicUsize::new(0));

    let release = hold(&worker);
    for _ in 0..10 {
        assert!(worker.submit(counting_job(&ran)).is_ok());
    }
    worker.close();
    release.send(()).unwrap();
    handle.join().unwrap();

    assert_eq!(ran.load(Ordering::SeqCst), 10);
}

#[test]
fn closed_worker_hands_jobs_back() {
    let (worker, handle) = BackgroundWorker::spawn("worker-closed").unwrap();
    worker.close();
    assert!(worker.is_closed());

    let ran = Arc::new(AtomicUsize::new(0));
    let job = worker.submit(counting_job(&ran)).unwrap_err();
    job();
    assert_eq!(ran.load(Ordering::SeqCst), 1);

    handle.join().unwrap();
    assert!(!worker.flush());
}

#[test]
fn job_sent_behind_stop_still_runs() {
    let (worker, handle) = BackgroundWorker::spawn("worker-late").unwrap();
    let release = hold(&worker);

    // Stop is queued first; the flush barrier lands behind it.
    worker.close();
    let releaser = thread::spawn(move || {
        thread::sleep(Duration::from_millis(50));
        release.send(()).unwrap();
    });
    assert!(worker.flush());

    releaser.join().unwrap();
    handle.join().unwrap();
}
