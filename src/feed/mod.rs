//! Feed domain types and the capabilities exposed to consumers.
//!
//! All capabilities report through a boxed `FnOnce` completion that may run on
//! any thread. Wrap a loader in
//! [`MainQueueDispatchDecorator`](crate::compose::MainQueueDispatchDecorator)
//! when delivery on a specific thread matters.

mod task;
mod types;

use std::sync::Arc;
use url::Url;

use crate::error::Error;

pub use task::{CancellableCompletion, FeedImageDataLoaderTask};
pub use types::FeedImage;

/// Callback receiving the outcome of an asynchronous operation.
pub type Completion<T> = Box<dyn FnOnce(T) + Send + 'static>;

pub type LoadFeedResult = Result<Vec<FeedImage>, Error>;
pub type LoadImageDataResult = Result<Vec<u8>, Error>;
pub type SaveResult = Result<(), Error>;

/// Loads the whole feed.
pub trait FeedLoader: Send + Sync {
  fn load(&self, completion: Completion<LoadFeedResult>);
}

/// Persists a feed for later offline loading.
pub trait FeedCache: Send + Sync {
  fn save(&self, feed: Vec<FeedImage>, completion: Completion<SaveResult>);
}

/// Loads the binary payload of one feed image.
pub trait FeedImageDataLoader: Send + Sync {
  fn load_image_data(
    &self,
    url: &Url,
    completion: Completion<LoadImageDataResult>,
  ) -> Box<dyn FeedImageDataLoaderTask>;
}

/// Persists the binary payload of one feed image.
pub trait FeedImageDataCache: Send + Sync {
  fn save(&self, data: Vec<u8>, url: &Url, completion: Completion<SaveResult>);
}

impl<T: FeedLoader + ?Sized> FeedLoader for Arc<T> {
  fn load(&self, completion: Completion<LoadFeedResult>) {
    (**self).load(completion)
  }
}

impl<T: FeedCache + ?Sized> FeedCache for Arc<T> {
  fn save(&self, feed: Vec<FeedImage>, completion: Completion<SaveResult>) {
    (**self).save(feed, completion)
  }
}

impl<T: FeedImageDataLoader + ?Sized> FeedImageDataLoader for Arc<T> {
  fn load_image_data(
    &self,
    url: &Url,
    completion: Completion<LoadImageDataResult>,
  ) -> Box<dyn FeedImageDataLoaderTask> {
    (**self).load_image_data(url, completion)
  }
}

impl<T: FeedImageDataCache + ?Sized> FeedImageDataCache for Arc<T> {
  fn save(&self, data: Vec<u8>, url: &Url, completion: Completion<SaveResult>) {
    (**self).save(data, url, completion)
  }
}
