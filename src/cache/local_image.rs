//! Image data loading and saving on top of a `FeedImageDataStore`.

use std::sync::Arc;
use url::Url;

use super::store::FeedImageDataStore;
use crate::error::Error;
use crate::feed::{
  CancellableCompletion, Completion, FeedImageDataCache, FeedImageDataLoader,
  FeedImageDataLoaderTask, LoadImageDataResult, SaveResult,
};

/// Serves and stores image bytes by URL.
///
/// Image data never expires here; only the feed snapshot has a staleness policy.
pub struct LocalFeedImageDataLoader<S: ?Sized> {
  store: Arc<S>,
}

impl<S: FeedImageDataStore + ?Sized> LocalFeedImageDataLoader<S> {
  pub fn new(store: Arc<S>) -> Self {
    Self { store }
  }
}

impl<S: FeedImageDataStore + ?Sized> FeedImageDataLoader for LocalFeedImageDataLoader<S> {
  fn load_image_data(
    &self,
    url: &Url,
    completion: Completion<LoadImageDataResult>,
  ) -> Box<dyn FeedImageDataLoaderTask> {
    let task = CancellableCompletion::new(completion);
    let delivery = task.clone();
    let requested = url.clone();

    self.store.retrieve_image_data(
      url,
      Box::new(move |result| {
        delivery.complete(match result {
          Ok(Some(data)) => Ok(data),
          Ok(None) => Err(Error::NotFound(requested)),
          Err(err) => Err(Error::Store(err)),
        });
      }),
    );

    Box::new(task)
  }
}

impl<S: FeedImageDataStore + ?Sized> FeedImageDataCache for LocalFeedImageDataLoader<S> {
  fn save(&self, data: Vec<u8>, url: &Url, completion: Completion<SaveResult>) {
    self.store.insert_image_data(
      data,
      url,
      Box::new(move |result| completion(result.map_err(Error::SaveFailed))),
    );
  }
}
