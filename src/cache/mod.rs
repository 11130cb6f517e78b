//! Offline cache for the feed and its image data.
//!
//! This module provides:
//! - A staleness policy for the cached feed (`CachePolicy`)
//! - Store contracts with callback and blocking forms (`FeedStore`, `FeedImageDataStore`)
//! - A durable SQLite store and an in-memory store
//! - Loaders serving the cache through the same capabilities as the remote source

mod local_feed;
mod local_image;
mod memory;
mod policy;
mod sqlite;
mod store;

pub use local_feed::LocalFeedLoader;
pub use local_image::LocalFeedImageDataLoader;
pub use memory::InMemoryFeedStore;
pub use policy::{CachePolicy, DEFAULT_MAX_AGE_DAYS};
pub use sqlite::SqliteFeedStore;
pub use store::{
  CachedFeed, DeletionResult, FeedImageDataStore, FeedStore, ImageDataRetrievalResult,
  InsertionResult, RetrievalResult,
};
