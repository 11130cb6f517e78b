//! Delivers completions on a single designated dispatcher.

use std::sync::Arc;
use url::Url;

use crate::dispatch::Dispatcher;
use crate::feed::{
  CancellableCompletion, Completion, FeedCache, FeedImage, FeedImageDataCache,
  FeedImageDataLoader, FeedImageDataLoaderTask, FeedLoader, LoadFeedResult, LoadImageDataResult,
  SaveResult,
};

/// Forwards every call to `decoratee` and runs its completion on `dispatcher`.
///
/// Completions already on the dispatcher run inline; others are queued.
pub struct MainQueueDispatchDecorator<T> {
  decoratee: T,
  dispatcher: Arc<dyn Dispatcher>,
}

impl<T> MainQueueDispatchDecorator<T> {
  pub fn new(decoratee: T, dispatcher: Arc<dyn Dispatcher>) -> Self {
    Self {
      decoratee,
      dispatcher,
    }
  }

  fn deliver<R: Send + 'static>(&self, completion: Completion<R>) -> Completion<R> {
    let dispatcher = Arc::clone(&self.dispatcher);
    Box::new(move |result| {
      if dispatcher.is_current() {
        completion(result)
      } else {
        dispatcher.dispatch(Box::new(move || completion(result)))
      }
    })
  }
}

impl<T: FeedLoader> FeedLoader for MainQueueDispatchDecorator<T> {
  fn load(&self, completion: Completion<LoadFeedResult>) {
    self.decoratee.load(self.deliver(completion))
  }
}

impl<T: FeedCache> FeedCache for MainQueueDispatchDecorator<T> {
  fn save(&self, feed: Vec<FeedImage>, completion: Completion<SaveResult>) {
    self.decoratee.save(feed, self.deliver(completion))
  }
}

impl<T: FeedImageDataCache> FeedImageDataCache for MainQueueDispatchDecorator<T> {
  fn save(&self, data: Vec<u8>, url: &Url, completion: Completion<SaveResult>) {
    self.decoratee.save(data, url, self.deliver(completion))
  }
}

struct DispatchedTask {
  completion: CancellableCompletion<LoadImageDataResult>,
  inner: Box<dyn FeedImageDataLoaderTask>,
}

impl FeedImageDataLoaderTask for DispatchedTask {
  fn cancel(&self) {
    // Also covers a result already queued on the dispatcher.
    self.completion.cancel();
    self.inner.cancel();
  }
}

impl<T: FeedImageDataLoader> FeedImageDataLoader for MainQueueDispatchDecorator<T> {
  fn load_image_data(
    &self,
    url: &Url,
    completion: Completion<LoadImageDataResult>,
  ) -> Box<dyn FeedImageDataLoaderTask> {
    let completion = CancellableCompletion::new(completion);
    let inner = self
      .decoratee
      .load_image_data(url, self.deliver(completion.clone().into_completion()));

    Box::new(DispatchedTask { completion, inner })
  }
}
