//! Decorators that write successful loads into a cache.

use std::sync::Arc;
use tracing::warn;
use url::Url;

use crate::feed::{
  Completion, FeedCache, FeedImageDataCache, FeedImageDataLoader, FeedImageDataLoaderTask,
  FeedLoader, LoadFeedResult, LoadImageDataResult,
};

/// Saves every successfully loaded feed to `cache`.
///
/// The save is best-effort: its outcome is logged and never reaches the caller.
pub struct FeedLoaderCacheDecorator<L, C: ?Sized> {
  decoratee: L,
  cache: Arc<C>,
}

impl<L, C: ?Sized> FeedLoaderCacheDecorator<L, C> {
  pub fn new(decoratee: L, cache: Arc<C>) -> Self {
    Self { decoratee, cache }
  }
}

impl<L, C> FeedLoader for FeedLoaderCacheDecorator<L, C>
where
  L: FeedLoader,
  C: FeedCache + ?Sized + 'static,
{
  fn load(&self, completion: Completion<LoadFeedResult>) {
    let cache = Arc::clone(&self.cache);

    self.decoratee.load(Box::new(move |result| {
      if let Ok(feed) = &result {
        cache.save(
          feed.clone(),
          Box::new(|saved| {
            if let Err(err) = saved {
              warn!(error = %err, "failed to cache loaded feed");
            }
          }),
        );
      }
      completion(result)
    }));
  }
}

/// Saves every successfully loaded image payload to `cache`.
pub struct FeedImageDataLoaderCacheDecorator<L, C: ?Sized> {
  decoratee: L,
  cache: Arc<C>,
}

impl<L, C: ?Sized> FeedImageDataLoaderCacheDecorator<L, C> {
  pub fn new(decoratee: L, cache: Arc<C>) -> Self {
    Self { decoratee, cache }
  }
}

impl<L, C> FeedImageDataLoader for FeedImageDataLoaderCacheDecorator<L, C>
where
  L: FeedImageDataLoader,
  C: FeedImageDataCache + ?Sized + 'static,
{
  fn load_image_data(
    &self,
    url: &Url,
    completion: Completion<LoadImageDataResult>,
  ) -> Box<dyn FeedImageDataLoaderTask> {
    let cache = Arc::clone(&self.cache);
    let key = url.clone();

    self.decoratee.load_image_data(
      url,
      Box::new(move |result| {
        if let Ok(data) = &result {
          cache.save(
            data.clone(),
            &key,
            Box::new(move |saved| {
              if let Err(err) = saved {
                warn!(error = %err, "failed to cache loaded image data");
              }
            }),
          );
        }
        completion(result)
      }),
    )
  }
}
