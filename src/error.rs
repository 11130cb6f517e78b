//! Error types shared by loaders, caches and stores.

use url::Url;

/// Failure reported by a persistent store.
#[derive(Debug, thiserror::Error)]
pub enum StoreError {
  /// The underlying SQLite connection failed.
  #[error("database error: {0}")]
  Database(#[from] rusqlite::Error),

  /// The store file or its worker thread could not be set up.
  #[error("io error: {0}")]
  Io(#[from] std::io::Error),

  /// A value could not be encoded for storage.
  #[error("serialization error: {0}")]
  Serialization(#[from] serde_json::Error),

  /// Stored data exists but cannot be decoded.
  #[error("corrupt store data: {0}")]
  Corrupt(String),

  /// The store's worker thread is no longer running.
  #[error("store worker is closed")]
  Closed,

  /// A blocking call was issued from the store's own worker thread.
  #[error("blocking store call issued from the store worker")]
  Reentrant,
}

/// Error delivered to consumers of the loader and cache capabilities.
///
/// Each variant is a distinct failure kind; presentation code may collapse
/// them into a single message, but this layer never does.
#[derive(Debug, thiserror::Error)]
pub enum Error {
  /// The remote source could not be reached.
  #[error("connectivity error: {0}")]
  Connectivity(String),

  /// The remote payload could not be mapped.
  #[error("invalid data: {0}")]
  InvalidData(String),

  /// A store read, write or delete failed.
  #[error("store failure: {0}")]
  Store(#[source] StoreError),

  /// No image data is stored for the requested URL.
  #[error("no image data for {0}")]
  NotFound(Url),

  /// Image data could not be written to the store.
  #[error("failed to save image data: {0}")]
  SaveFailed(#[source] StoreError),
}

impl From<StoreError> for Error {
  fn from(err: StoreError) -> Self {
    Error::Store(err)
  }
}
