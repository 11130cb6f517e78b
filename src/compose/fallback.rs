//! Composites that retry through a fallback loader when the primary fails.

use parking_lot::Mutex;
use std::sync::Arc;
use tracing::debug;
use url::Url;

use crate::feed::{
  CancellableCompletion, Completion, FeedImageDataLoader, FeedImageDataLoaderTask, FeedLoader,
  LoadFeedResult, LoadImageDataResult,
};

/// Loads from `primary`, and from `fallback` only if the primary fails.
///
/// The caller sees the primary's success or, after a primary failure, exactly
/// what the fallback delivers. The primary is never retried.
pub struct FeedLoaderWithFallbackComposite<P, F: ?Sized> {
  primary: P,
  fallback: Arc<F>,
}

impl<P, F: ?Sized> FeedLoaderWithFallbackComposite<P, F> {
  pub fn new(primary: P, fallback: Arc<F>) -> Self {
    Self { primary, fallback }
  }
}

impl<P, F> FeedLoader for FeedLoaderWithFallbackComposite<P, F>
where
  P: FeedLoader,
  F: FeedLoader + ?Sized + 'static,
{
  fn load(&self, completion: Completion<LoadFeedResult>) {
    let fallback = Arc::clone(&self.fallback);

    self.primary.load(Box::new(move |result| match result {
      Ok(feed) => completion(Ok(feed)),
      Err(err) => {
        debug!(error = %err, "primary feed load failed, trying fallback");
        fallback.load(completion)
      }
    }));
  }
}

/// Image data counterpart of [`FeedLoaderWithFallbackComposite`].
///
/// The returned task cancels whichever load is in flight, including a
/// fallback load that starts after the cancel.
pub struct FeedImageDataLoaderWithFallbackComposite<P, F: ?Sized> {
  primary: P,
  fallback: Arc<F>,
}

impl<P, F: ?Sized> FeedImageDataLoaderWithFallbackComposite<P, F> {
  pub fn new(primary: P, fallback: Arc<F>) -> Self {
    Self { primary, fallback }
  }
}

#[derive(Default)]
struct InFlight {
  cancelled: bool,
  fallback_started: bool,
  current: Option<Box<dyn FeedImageDataLoaderTask>>,
}

/// Tracks which branch is in flight.
#[derive(Default)]
struct InFlightTask {
  state: Mutex<InFlight>,
}

impl InFlightTask {
  /// Record the primary's task, unless the fallback already took over.
  fn set_primary(&self, task: Box<dyn FeedImageDataLoaderTask>) {
    let mut state = self.state.lock();
    if state.cancelled {
      drop(state);
      task.cancel();
    } else if !state.fallback_started {
      state.current = Some(task);
    }
  }

  /// Mark the switch to the fallback. Returns `false` once cancelled.
  fn begin_fallback(&self) -> bool {
    let mut state = self.state.lock();
    if state.cancelled {
      return false;
    }
    state.fallback_started = true;
    state.current = None;
    true
  }

  fn set_fallback(&self, task: Box<dyn FeedImageDataLoaderTask>) {
    let mut state = self.state.lock();
    if state.cancelled {
      drop(state);
      task.cancel();
    } else {
      state.current = Some(task);
    }
  }

  fn cancel(&self) {
    let current = {
      let mut state = self.state.lock();
      state.cancelled = true;
      state.current.take()
    };
    if let Some(task) = current {
      task.cancel();
    }
  }
}

struct FallbackTask {
  completion: CancellableCompletion<LoadImageDataResult>,
  in_flight: Arc<InFlightTask>,
}

impl FeedImageDataLoaderTask for FallbackTask {
  fn cancel(&self) {
    self.completion.cancel();
    self.in_flight.cancel();
  }
}

impl<P, F> FeedImageDataLoader for FeedImageDataLoaderWithFallbackComposite<P, F>
where
  P: FeedImageDataLoader,
  F: FeedImageDataLoader + ?Sized + 'static,
{
  fn load_image_data(
    &self,
    url: &Url,
    completion: Completion<LoadImageDataResult>,
  ) -> Box<dyn FeedImageDataLoaderTask> {
    let completion = CancellableCompletion::new(completion);
    let in_flight = Arc::new(InFlightTask::default());

    let delivery = completion.clone();
    let tracker = Arc::clone(&in_flight);
    let fallback = Arc::clone(&self.fallback);
    let retry_url = url.clone();

    let primary_task = self.primary.load_image_data(
      url,
      Box::new(move |result| match result {
        Ok(data) => {
          delivery.complete(Ok(data));
        }
        Err(err) => {
          if !tracker.begin_fallback() {
            return;
          }
          debug!(error = %err, url = %retry_url, "primary image data load failed, trying fallback");
          let fallback_task = fallback.load_image_data(&retry_url, delivery.into_completion());
          tracker.set_fallback(fallback_task);
        }
      }),
    );
    in_flight.set_primary(primary_task);

    Box::new(FallbackTask {
      completion,
      in_flight,
    })
  }
}
