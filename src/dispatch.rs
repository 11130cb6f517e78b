//! Execution contexts that completions can be delivered on.

use std::marker::PhantomData;
use std::thread::{self, ThreadId};
use tokio::sync::{mpsc, oneshot};
use tracing::warn;

use crate::worker::SerialWorker;

/// Unit of work handed to a dispatcher.
pub type Task = Box<dyn FnOnce() + Send + 'static>;

/// A single designated serial execution context.
pub trait Dispatcher: Send + Sync {
  /// Whether the caller is already running on this context.
  fn is_current(&self) -> bool;

  /// Run `task` on this context at some later point.
  fn dispatch(&self, task: Task);
}

/// Runs every task inline on the calling thread.
///
/// Treats every thread as current. Useful in tests that do not care about
/// delivery threads.
#[derive(Debug, Clone, Copy, Default)]
pub struct ImmediateDispatcher;

impl Dispatcher for ImmediateDispatcher {
  fn is_current(&self) -> bool {
    true
  }

  fn dispatch(&self, task: Task) {
    task()
  }
}

impl Dispatcher for SerialWorker<()> {
  fn is_current(&self) -> bool {
    SerialWorker::is_current(self)
  }

  fn dispatch(&self, task: Task) {
    self.submit(move |_| task());
  }
}

/// Task queue drained by the thread that created it.
///
/// This is the "main thread" of an application: tasks dispatched from any
/// thread through a [`MainQueueHandle`] run only when the owning thread calls
/// [`MainQueue::run_pending`] or [`MainQueue::run_until`]. The queue cannot be
/// moved to another thread.
pub struct MainQueue {
  receiver: mpsc::UnboundedReceiver<Task>,
  handle: MainQueueHandle,
  _not_send: PhantomData<*const ()>,
}

/// Cloneable, thread-safe handle for dispatching onto a [`MainQueue`].
#[derive(Clone, Debug)]
pub struct MainQueueHandle {
  sender: mpsc::UnboundedSender<Task>,
  thread_id: ThreadId,
}

impl MainQueue {
  /// Create a queue bound to the current thread.
  pub fn new() -> Self {
    let (sender, receiver) = mpsc::unbounded_channel();
    Self {
      receiver,
      handle: MainQueueHandle {
        sender,
        thread_id: thread::current().id(),
      },
      _not_send: PhantomData,
    }
  }

  pub fn handle(&self) -> MainQueueHandle {
    self.handle.clone()
  }

  /// Run every task queued so far. Returns the number of tasks run.
  pub fn run_pending(&mut self) -> usize {
    let mut ran = 0;
    while let Ok(task) = self.receiver.try_recv() {
      task();
      ran += 1;
    }
    ran
  }

  /// Keep running tasks as they arrive until `done` resolves.
  ///
  /// Returns `None` if the sending half of `done` was dropped.
  pub async fn run_until<T>(&mut self, mut done: oneshot::Receiver<T>) -> Option<T> {
    loop {
      tokio::select! {
        biased;
        task = self.receiver.recv() => match task {
          Some(task) => task(),
          None => return (&mut done).await.ok(),
        },
        result = &mut done => {
          self.run_pending();
          return result.ok();
        }
      }
    }
  }
}

impl Default for MainQueue {
  fn default() -> Self {
    Self::new()
  }
}

impl Dispatcher for MainQueueHandle {
  fn is_current(&self) -> bool {
    thread::current().id() == self.thread_id
  }

  fn dispatch(&self, task: Task) {
    if self.sender.send(task).is_err() {
      warn!("main queue is gone, dropping task");
    }
  }
}
