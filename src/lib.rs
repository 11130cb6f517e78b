//! Offline-first loading of a remote image feed.
//!
//! The feed is fetched from a remote endpoint and cached in a local store so
//! it stays available offline; image data is served from the store first and
//! fetched remotely on a miss. See [`compose::LoaderComposer`] for the wiring.

pub mod cache;
pub mod clock;
pub mod compose;
pub mod config;
pub mod dispatch;
pub mod error;
pub mod feed;
pub mod logging;
pub mod remote;
pub mod worker;

#[cfg(test)]
mod test_support;

pub use error::{Error, StoreError};
pub use feed::{
  Completion, FeedCache, FeedImage, FeedImageDataCache, FeedImageDataLoader,
  FeedImageDataLoaderTask, FeedLoader,
};
