//! Feed loading and saving on top of a `FeedStore`.

use std::sync::Arc;
use tracing::{debug, warn};

use super::policy::CachePolicy;
use super::store::FeedStore;
use crate::clock::Clock;
use crate::error::Error;
use crate::feed::{Completion, FeedCache, FeedImage, FeedLoader, LoadFeedResult, SaveResult};

/// Serves the cached feed while it is fresh and replaces it on save.
pub struct LocalFeedLoader<S: ?Sized> {
  store: Arc<S>,
  clock: Arc<dyn Clock>,
  policy: CachePolicy,
}

impl<S: FeedStore + ?Sized + 'static> LocalFeedLoader<S> {
  pub fn new(store: Arc<S>, clock: impl Clock + 'static) -> Self {
    Self {
      store,
      clock: Arc::new(clock),
      policy: CachePolicy::default(),
    }
  }

  /// Set the staleness policy for the cached feed.
  pub fn with_policy(mut self, policy: CachePolicy) -> Self {
    self.policy = policy;
    self
  }

  /// Delete the cached feed if it can no longer be read.
  ///
  /// A snapshot that reads back fine is left alone, stale or not; `load`
  /// purges stale snapshots on its own.
  pub fn validate_cache(&self, completion: Completion<SaveResult>) {
    let store = Arc::clone(&self.store);

    self.store.retrieve(Box::new(move |result| match result {
      Ok(_) => completion(Ok(())),
      Err(err) => {
        warn!(error = %err, "cached feed unreadable, deleting");
        store.delete_cached_feed(Box::new(move |deletion| {
          completion(deletion.map_err(Error::Store))
        }));
      }
    }));
  }
}

impl<S: FeedStore + ?Sized + 'static> FeedCache for LocalFeedLoader<S> {
  /// Delete the current snapshot, then insert `feed` stamped with the current time.
  fn save(&self, feed: Vec<FeedImage>, completion: Completion<SaveResult>) {
    let store = Arc::clone(&self.store);
    let clock = Arc::clone(&self.clock);

    self.store.delete_cached_feed(Box::new(move |deletion| {
      if let Err(err) = deletion {
        return completion(Err(Error::Store(err)));
      }

      let timestamp = clock.now();
      store.insert(
        feed,
        timestamp,
        Box::new(move |insertion| completion(insertion.map_err(Error::Store))),
      );
    }));
  }
}

impl<S: FeedStore + ?Sized + 'static> FeedLoader for LocalFeedLoader<S> {
  fn load(&self, completion: Completion<LoadFeedResult>) {
    let store = Arc::clone(&self.store);
    let clock = Arc::clone(&self.clock);
    let policy = self.policy;

    self.store.retrieve(Box::new(move |result| match result {
      Err(err) => completion(Err(Error::Store(err))),
      Ok(Some(cache)) if policy.validate(cache.timestamp, clock.now()) => completion(Ok(cache.feed)),
      Ok(Some(cache)) => {
        debug!(cached_at = %cache.timestamp, "cached feed expired, purging");
        store.delete_cached_feed(Box::new(|deletion| {
          if let Err(err) = deletion {
            warn!(error = %err, "failed to purge expired feed cache");
          }
        }));
        completion(Ok(Vec::new()))
      }
      Ok(None) => completion(Ok(Vec::new())),
    }));
  }
}
