//! Single background worker for platform registration work
//!
//! Platform calls can block, so they run on one dedicated thread instead of
//! the caller's. Jobs run in submission order.

use crate::error::{Result, ToastError};
use parking_lot::Mutex;
use std::panic::{self, AssertUnwindSafe};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::thread::{self, JoinHandle};
use tokio::sync::{mpsc, oneshot};

pub type Job = Box<dyn FnOnce() + Send + 'static>;

/// Message types for the worker
enum DispatchMessage {
    /// Run a job
    Run(Job),
    /// Stop after everything queued before this message
    Stop,
}

pub struct BackgroundDispatcher {
    /// Whether the worker accepts jobs
    is_running: Arc<AtomicBool>,
    /// Channel to the worker
    tx: mpsc::UnboundedSender<DispatchMessage>,
    /// Worker thread, taken when joined
    thread: Mutex<Option<JoinHandle<()>>>,
}

impl BackgroundDispatcher {
    /// Start the worker thread
    pub fn spawn(thread_name: &str) -> Result<Self> {
        let (tx, rx) = mpsc::unbounded_channel();
        let is_running = Arc::new(AtomicBool::new(true));

        let worker_running = is_running.clone();
        let handle = thread::Builder::new()
            .name(thread_name.to_string())
            .spawn(move || Self::run_worker(rx, worker_running))
            .map_err(|e| ToastError::DispatcherCreationFailed(e.to_string()))?;

        tracing::info!("Background dispatcher '{}' started", thread_name);

        Ok(Self {
            is_running,
            tx,
            thread: Mutex::new(Some(handle)),
        })
    }

    /// Queue a job. Fails once the worker has stopped.
    pub fn dispatch(&self, job: Job) -> Result<()> {
        if !self.is_running.load(Ordering::SeqCst) {
            return Err(ToastError::InitDispatchFailure(
                "background dispatcher is stopped".to_string(),
            ));
        }

        self.tx
            .send(DispatchMessage::Run(job))
            .map_err(|_| ToastError::InitDispatchFailure("background worker exited".to_string()))
    }

    /// Block until every job queued before this call has run.
    ///
    /// Must not be called from the worker thread or from inside an async
    /// runtime.
    pub fn flush(&self) -> Result<()> {
        let (done_tx, done_rx) = oneshot::channel();
        self.dispatch(Box::new(move || {
            let _ = done_tx.send(());
        }))?;

        done_rx
            .blocking_recv()
            .map_err(|_| ToastError::Other("background worker exited before flush".to_string()))
    }

    /// Check if the worker accepts jobs
    pub fn is_running(&self) -> bool {
        self.is_running.load(Ordering::SeqCst)
    }

    /// Stop accepting jobs, let queued jobs finish, and join the worker
    pub fn stop(&self) {
        if self.is_running.swap(false, Ordering::SeqCst) {
            let _ = self.tx.send(DispatchMessage::Stop);
        }

        let Some(handle) = self.thread.lock().take() else {
            return;
        };

        // Dropping the last owner from inside a job must not self-join
        if handle.thread().id() == thread::current().id() {
            return;
        }

        if handle.join().is_err() {
            tracing::error!("Background dispatcher thread panicked");
        }
        tracing::info!("Background dispatcher stopped");
    }

    fn run_worker(mut rx: mpsc::UnboundedReceiver<DispatchMessage>, is_running: Arc<AtomicBool>) {
        let _running = scopeguard::guard(is_running, |flag| flag.store(false, Ordering::SeqCst));

        while let Some(msg) = rx.blocking_recv() {
            match msg {
                DispatchMessage::Run(job) => {
                    if panic::catch_unwind(AssertUnwindSafe(job)).is_err() {
                        tracing::error!("Background job panicked");
                    }
                }
                DispatchMessage::Stop => break,
            }
        }

        tracing::debug!("Background dispatcher loop ended");
    }
}

impl Drop for BackgroundDispatcher {
    fn drop(&mut self) {
        self.stop();
    }
}
