//! In-memory store, for fast paths and tests.

use chrono::{DateTime, Utc};
use parking_lot::Mutex;
use std::collections::HashMap;
use url::Url;

use super::store::{
  CachedFeed, DeletionResult, FeedImageDataStore, FeedStore, ImageDataRetrievalResult,
  InsertionResult, RetrievalResult,
};
use crate::feed::{Completion, FeedImage};

#[derive(Debug, Default)]
struct State {
  feed: Option<CachedFeed>,
  images: HashMap<Url, Vec<u8>>,
}

/// Store that keeps everything in process memory.
///
/// Operations complete synchronously on the calling thread. Mutations are
/// serialized by a lock, and completions run after the lock is released.
#[derive(Debug, Default)]
pub struct InMemoryFeedStore {
  state: Mutex<State>,
}

impl InMemoryFeedStore {
  pub fn new() -> Self {
    Self::default()
  }

  /// Create a store that already holds `cache`.
  pub fn with_feed_cache(cache: CachedFeed) -> Self {
    Self {
      state: Mutex::new(State {
        feed: Some(cache),
        images: HashMap::new(),
      }),
    }
  }
}

impl FeedStore for InMemoryFeedStore {
  fn delete_cached_feed(&self, completion: Completion<DeletionResult>) {
    self.state.lock().feed = None;
    completion(Ok(()))
  }

  fn insert(
    &self,
    feed: Vec<FeedImage>,
    timestamp: DateTime<Utc>,
    completion: Completion<InsertionResult>,
  ) {
    self.state.lock().feed = Some(CachedFeed { feed, timestamp });
    completion(Ok(()))
  }

  fn retrieve(&self, completion: Completion<RetrievalResult>) {
    let cache = self.state.lock().feed.clone();
    completion(Ok(cache))
  }
}

impl FeedImageDataStore for InMemoryFeedStore {
  fn insert_image_data(&self, data: Vec<u8>, url: &Url, completion: Completion<InsertionResult>) {
    self.state.lock().images.insert(url.clone(), data);
    completion(Ok(()))
  }

  fn retrieve_image_data(&self, url: &Url, completion: Completion<ImageDataRetrievalResult>) {
    let data = self.state.lock().images.get(url).cloned();
    completion(Ok(data))
  }
}
