//! Cancellation handles for in-flight image data loads.

use parking_lot::ReentrantMutex;
use std::cell::RefCell;
use std::sync::Arc;

use super::Completion;

/// Handle to an in-flight image data load.
///
/// After `cancel` returns, the completion passed to the load is never invoked.
pub trait FeedImageDataLoaderTask: Send + Sync {
  fn cancel(&self);
}

/// A completion that can be invoked at most once and revoked by cancellation.
///
/// Clones share the same slot, so one clone can be handed to the producer of
/// the result while another is returned to the caller as the task handle.
///
/// The slot stays locked while the completion runs. A `cancel` from another
/// thread waits for a delivery already in progress; a `cancel` from inside the
/// completion returns immediately.
pub struct CancellableCompletion<T> {
  slot: Arc<ReentrantMutex<RefCell<Option<Completion<T>>>>>,
}

impl<T: Send + 'static> CancellableCompletion<T> {
  pub fn new(completion: Completion<T>) -> Self {
    Self {
      slot: Arc::new(ReentrantMutex::new(RefCell::new(Some(completion)))),
    }
  }

  /// Deliver `value` unless already delivered or cancelled.
  ///
  /// Returns whether the completion was invoked.
  pub fn complete(&self, value: T) -> bool {
    let slot = self.slot.lock();
    let completion = slot.borrow_mut().take();
    match completion {
      Some(completion) => {
        completion(value);
        true
      }
      None => false,
    }
  }

  /// Whether the completion is still waiting for a value.
  pub fn is_pending(&self) -> bool {
    self.slot.lock().borrow().is_some()
  }

  /// Convert into a plain completion that forwards into this slot.
  pub fn into_completion(self) -> Completion<T> {
    Box::new(move |value| {
      self.complete(value);
    })
  }
}

impl<T> Clone for CancellableCompletion<T> {
  fn clone(&self) -> Self {
    Self {
      slot: Arc::clone(&self.slot),
    }
  }
}

impl<T: Send + 'static> FeedImageDataLoaderTask for CancellableCompletion<T> {
  fn cancel(&self) {
    let slot = self.slot.lock();
    let released = slot.borrow_mut().take();
    drop(released);
  }
}
