//! Persistent store contracts for the feed snapshot and image data.
//!
//! Every operation comes in two forms: a callback form that never blocks the
//! caller, and a `*_blocking` form that waits for the same operation to finish.
//! The blocking forms are provided on top of the callback forms, so both go
//! through the same ordering guarantees of the implementation.

use chrono::{DateTime, Utc};
use std::sync::Arc;
use url::Url;

use crate::error::StoreError;
use crate::feed::{Completion, FeedImage};

/// The single persisted snapshot of the feed.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CachedFeed {
  pub feed: Vec<FeedImage>,
  /// When the snapshot was written
  pub timestamp: DateTime<Utc>,
}

pub type RetrievalResult = Result<Option<CachedFeed>, StoreError>;
pub type DeletionResult = Result<(), StoreError>;
pub type InsertionResult = Result<(), StoreError>;
pub type ImageDataRetrievalResult = Result<Option<Vec<u8>>, StoreError>;

/// Storage for the feed snapshot.
///
/// A failed operation must leave the stored snapshot exactly as it was.
pub trait FeedStore: Send + Sync {
  /// Remove the snapshot. Succeeds when there is none.
  fn delete_cached_feed(&self, completion: Completion<DeletionResult>);

  /// Replace the snapshot wholesale.
  fn insert(
    &self,
    feed: Vec<FeedImage>,
    timestamp: DateTime<Utc>,
    completion: Completion<InsertionResult>,
  );

  /// Read the snapshot, `None` when absent.
  fn retrieve(&self, completion: Completion<RetrievalResult>);

  fn delete_cached_feed_blocking(&self) -> DeletionResult {
    wait(|done| self.delete_cached_feed(done))
  }

  fn insert_blocking(&self, feed: Vec<FeedImage>, timestamp: DateTime<Utc>) -> InsertionResult {
    wait(|done| self.insert(feed, timestamp, done))
  }

  fn retrieve_blocking(&self) -> RetrievalResult {
    wait(|done| self.retrieve(done))
  }
}

/// Storage for image bytes keyed by URL. Last write wins.
pub trait FeedImageDataStore: Send + Sync {
  fn insert_image_data(&self, data: Vec<u8>, url: &Url, completion: Completion<InsertionResult>);

  fn retrieve_image_data(&self, url: &Url, completion: Completion<ImageDataRetrievalResult>);

  fn insert_image_data_blocking(&self, data: Vec<u8>, url: &Url) -> InsertionResult {
    wait(|done| self.insert_image_data(data, url, done))
  }

  fn retrieve_image_data_blocking(&self, url: &Url) -> ImageDataRetrievalResult {
    wait(|done| self.retrieve_image_data(url, done))
  }
}

/// Start an operation and block until its completion fires.
///
/// Uses a std channel: tokio's `blocking_recv` panics inside a runtime, and
/// the blocking forms are called from async contexts.
fn wait<T, F>(start: F) -> Result<T, StoreError>
where
  T: Send + 'static,
  F: FnOnce(Completion<Result<T, StoreError>>),
{
  let (tx, rx) = std::sync::mpsc::sync_channel(1);
  start(Box::new(move |result| {
    let _ = tx.send(result);
  }));
  // A dropped completion means the store went away mid-operation.
  rx.recv().map_err(|_| StoreError::Closed)?
}

impl<T: FeedStore + ?Sized> FeedStore for Arc<T> {
  fn delete_cached_feed(&self, completion: Completion<DeletionResult>) {
    (**self).delete_cached_feed(completion)
  }

  fn insert(
    &self,
    feed: Vec<FeedImage>,
    timestamp: DateTime<Utc>,
    completion: Completion<InsertionResult>,
  ) {
    (**self).insert(feed, timestamp, completion)
  }

  fn retrieve(&self, completion: Completion<RetrievalResult>) {
    (**self).retrieve(completion)
  }

  fn delete_cached_feed_blocking(&self) -> DeletionResult {
    (**self).delete_cached_feed_blocking()
  }

  fn insert_blocking(&self, feed: Vec<FeedImage>, timestamp: DateTime<Utc>) -> InsertionResult {
    (**self).insert_blocking(feed, timestamp)
  }

  fn retrieve_blocking(&self) -> RetrievalResult {
    (**self).retrieve_blocking()
  }
}

impl<T: FeedImageDataStore + ?Sized> FeedImageDataStore for Arc<T> {
  fn insert_image_data(&self, data: Vec<u8>, url: &Url, completion: Completion<InsertionResult>) {
    (**self).insert_image_data(data, url, completion)
  }

  fn retrieve_image_data(&self, url: &Url, completion: Completion<ImageDataRetrievalResult>) {
    (**self).retrieve_image_data(url, completion)
  }

  fn insert_image_data_blocking(&self, data: Vec<u8>, url: &Url) -> InsertionResult {
    (**self).insert_image_data_blocking(data, url)
  }

  fn retrieve_image_data_blocking(&self, url: &Url) -> ImageDataRetrievalResult {
    (**self).retrieve_image_data_blocking(url)
  }
}
