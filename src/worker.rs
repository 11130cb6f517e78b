//! Single background thread executing jobs one at a time, in submission order.

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use std::thread::{self, ThreadId};
use tokio::sync::mpsc;
use tracing::{debug, warn};

use crate::error::StoreError;
use crate::feed::{CancellableCompletion, Completion};

type Job<S> = Box<dyn FnOnce(&mut S) + Send + 'static>;

/// Serial worker owning some state `S` on its own thread.
///
/// Every job gets exclusive access to the state, and jobs run strictly in the
/// order they were submitted. The thread exits once every handle is dropped
/// and the queue has drained.
pub struct SerialWorker<S> {
  sender: mpsc::UnboundedSender<Job<S>>,
  thread_id: ThreadId,
  name: String,
  /// Jobs queued or running
  pending: Arc<AtomicUsize>,
}

impl<S: Send + 'static> SerialWorker<S> {
  /// Spawn the worker thread, moving `state` onto it.
  pub fn spawn(name: &str, state: S) -> std::io::Result<Self> {
    let (sender, mut receiver) = mpsc::unbounded_channel::<Job<S>>();
    let thread_name = name.to_string();
    let pending = Arc::new(AtomicUsize::new(0));
    let queued = Arc::clone(&pending);

    let handle = thread::Builder::new()
      .name(thread_name.clone())
      .spawn(move || {
        let mut state = state;
        debug!(worker = %thread_name, "worker started");
        while let Some(job) = receiver.blocking_recv() {
          job(&mut state);
          queued.fetch_sub(1, Ordering::SeqCst);
        }
        debug!(worker = %thread_name, "worker stopped");
      })?;

    Ok(Self {
      sender,
      thread_id: handle.thread().id(),
      name: name.to_string(),
      pending,
    })
  }

  /// Whether the caller is running on this worker's thread.
  pub fn is_current(&self) -> bool {
    thread::current().id() == self.thread_id
  }

  /// Queue `job` without waiting for it.
  ///
  /// Returns `false` if the worker has stopped and the job was dropped.
  pub fn submit<F>(&self, job: F) -> bool
  where
    F: FnOnce(&mut S) + Send + 'static,
  {
    self.pending.fetch_add(1, Ordering::SeqCst);
    if self.sender.send(Box::new(job)).is_err() {
      self.pending.fetch_sub(1, Ordering::SeqCst);
      warn!(worker = %self.name, "job dropped, worker is closed");
      return false;
    }
    true
  }

  /// Queue `op` and deliver its result to `completion` from the worker thread.
  ///
  /// If the worker is gone, `completion` receives `StoreError::Closed` on the
  /// calling thread instead.
  pub fn call<R, F>(&self, op: F, completion: Completion<Result<R, StoreError>>)
  where
    R: Send + 'static,
    F: FnOnce(&mut S) -> Result<R, StoreError> + Send + 'static,
  {
    let completion = CancellableCompletion::new(completion);
    let producer = completion.clone();

    if !self.submit(move |state| {
      producer.complete(op(state));
    }) {
      completion.complete(Err(StoreError::Closed));
    }
  }

  /// Queue `op` and block the calling thread until it has run.
  ///
  /// Only the caller blocks; the worker keeps processing its queue in order.
  pub fn call_blocking<R, F>(&self, op: F) -> Result<R, StoreError>
  where
    R: Send + 'static,
    F: FnOnce(&mut S) -> Result<R, StoreError> + Send + 'static,
  {
    // The job would queue behind the one currently running and never start.
    if self.is_current() {
      return Err(StoreError::Reentrant);
    }

    // std channel, so callers may block from inside a tokio runtime.
    let (tx, rx) = std::sync::mpsc::sync_channel(1);
    self.call(
      op,
      Box::new(move |result| {
        let _ = tx.send(result);
      }),
    );
    rx.recv().map_err(|_| StoreError::Closed)?
  }

  /// Block until the queue is empty, including jobs that queued jobs submit
  /// while they run.
  pub fn flush(&self) -> Result<(), StoreError> {
    loop {
      // Runs alone on the worker, so any count beyond itself is a job queued
      // behind it.
      let pending = Arc::clone(&self.pending);
      let drained = self.call_blocking(move |_| Ok(pending.load(Ordering::SeqCst) == 1))?;
      if drained {
        return Ok(());
      }
    }
  }
}

impl<S> Clone for SerialWorker<S> {
  fn clone(&self) -> Self {
    Self {
      sender: self.sender.clone(),
      thread_id: self.thread_id,
      name: self.name.clone(),
      pending: Arc::clone(&self.pending),
    }
  }
}

impl<S> std::fmt::Debug for SerialWorker<S> {
  fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
    f.debug_struct("SerialWorker")
      .field("name", &self.name)
      .field("thread_id", &self.thread_id)
      .finish_non_exhaustive()
  }
}
