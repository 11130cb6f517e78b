//! Decorators and composites around the loader capabilities, and the wiring
//! that assembles them into offline-first pipelines.
//!
//! Feed: prefer the remote source, cache what it returns, fall back to the
//! cache when it fails.
//! Image data: prefer the cache, fall back to the remote source, cache what
//! it returns.
//! Both deliver completions on the injected dispatcher.

mod caching;
mod fallback;
mod main_queue;

use std::sync::Arc;

pub use caching::{FeedImageDataLoaderCacheDecorator, FeedLoaderCacheDecorator};
pub use fallback::{FeedImageDataLoaderWithFallbackComposite, FeedLoaderWithFallbackComposite};
pub use main_queue::MainQueueDispatchDecorator;

use crate::cache::{
  CachePolicy, FeedImageDataStore, FeedStore, LocalFeedImageDataLoader, LocalFeedLoader,
};
use crate::clock::Clock;
use crate::dispatch::Dispatcher;
use crate::feed::{FeedImageDataLoader, FeedLoader};

/// Remote-first feed pipeline.
pub type ComposedFeedLoader<R, S> = MainQueueDispatchDecorator<
  FeedLoaderWithFallbackComposite<FeedLoaderCacheDecorator<R, LocalFeedLoader<S>>, LocalFeedLoader<S>>,
>;

/// Cache-first image data pipeline.
pub type ComposedFeedImageDataLoader<R, S> = MainQueueDispatchDecorator<
  FeedImageDataLoaderWithFallbackComposite<
    Arc<LocalFeedImageDataLoader<S>>,
    FeedImageDataLoaderCacheDecorator<R, LocalFeedImageDataLoader<S>>,
  >,
>;

/// Builds loader pipelines sharing one store and one dispatcher.
pub struct LoaderComposer<S: ?Sized> {
  local_feed: Arc<LocalFeedLoader<S>>,
  local_image_data: Arc<LocalFeedImageDataLoader<S>>,
  dispatcher: Arc<dyn Dispatcher>,
}

impl<S> LoaderComposer<S>
where
  S: FeedStore + FeedImageDataStore + ?Sized + 'static,
{
  pub fn new(
    store: Arc<S>,
    clock: impl Clock + 'static,
    policy: CachePolicy,
    dispatcher: Arc<dyn Dispatcher>,
  ) -> Self {
    Self {
      local_feed: Arc::new(LocalFeedLoader::new(Arc::clone(&store), clock).with_policy(policy)),
      local_image_data: Arc::new(LocalFeedImageDataLoader::new(store)),
      dispatcher,
    }
  }

  pub fn local_feed_loader(&self) -> Arc<LocalFeedLoader<S>> {
    Arc::clone(&self.local_feed)
  }

  /// Wrap `remote` into the remote-first feed pipeline.
  pub fn feed_loader<R: FeedLoader>(&self, remote: R) -> ComposedFeedLoader<R, S> {
    MainQueueDispatchDecorator::new(
      FeedLoaderWithFallbackComposite::new(
        FeedLoaderCacheDecorator::new(remote, Arc::clone(&self.local_feed)),
        Arc::clone(&self.local_feed),
      ),
      Arc::clone(&self.dispatcher),
    )
  }

  /// Wrap `remote` into the cache-first image data pipeline.
  pub fn image_data_loader<R: FeedImageDataLoader + 'static>(
    &self,
    remote: R,
  ) -> ComposedFeedImageDataLoader<R, S> {
    MainQueueDispatchDecorator::new(
      FeedImageDataLoaderWithFallbackComposite::new(
        Arc::clone(&self.local_image_data),
        Arc::new(FeedImageDataLoaderCacheDecorator::new(
          remote,
          Arc::clone(&self.local_image_data),
        )),
      ),
      Arc::clone(&self.dispatcher),
    )
  }
}
