//! SQLite-backed store running on a single serial worker.

use chrono::{DateTime, SecondsFormat, Utc};
use rusqlite::{params, Connection, OptionalExtension, Transaction};
use std::path::{Path, PathBuf};
use tracing::{debug, warn};
use url::Url;

use super::store::{
  CachedFeed, DeletionResult, FeedImageDataStore, FeedStore, ImageDataRetrievalResult,
  InsertionResult, RetrievalResult,
};
use crate::error::StoreError;
use crate::feed::{Completion, FeedImage};
use crate::worker::SerialWorker;

/// Schema for the feed snapshot and image data tables.
const STORE_SCHEMA: &str = r#"
-- The feed snapshot (at most one row)
CREATE TABLE IF NOT EXISTS feed_cache (
    id INTEGER PRIMARY KEY CHECK (id = 1),
    timestamp TEXT NOT NULL
);

-- Snapshot items in order (stores serialized JSON)
CREATE TABLE IF NOT EXISTS feed_image (
    cache_id INTEGER NOT NULL,
    position INTEGER NOT NULL,
    image_id TEXT NOT NULL,
    data BLOB NOT NULL,
    PRIMARY KEY (cache_id, position),
    FOREIGN KEY (cache_id) REFERENCES feed_cache(id) ON DELETE CASCADE
);

-- Image bytes keyed by URL, independent of the snapshot
CREATE TABLE IF NOT EXISTS image_data (
    url TEXT PRIMARY KEY,
    data BLOB NOT NULL
);
"#;

/// Row id of the single snapshot.
const SNAPSHOT_ID: i64 = 1;

/// Durable store backed by a SQLite database.
///
/// The connection lives on one background thread and every operation is
/// queued to it, so operations never interleave and complete in the order they
/// were issued. Writes run inside a transaction that is rolled back on error.
#[derive(Debug, Clone)]
pub struct SqliteFeedStore {
  worker: SerialWorker<Connection>,
}

impl SqliteFeedStore {
  /// Open or create the store at `path`.
  pub fn open(path: impl AsRef<Path>) -> Result<Self, StoreError> {
    let path = path.as_ref();

    // Ensure parent directory exists
    if let Some(parent) = path.parent() {
      std::fs::create_dir_all(parent)?;
    }

    let conn = Connection::open(path)?;
    conn.execute_batch("PRAGMA journal_mode=WAL;")?;
    debug!(path = %path.display(), "opened feed store");

    Self::from_connection(conn)
  }

  /// Open a store that lives only as long as this value and its clones.
  pub fn in_memory() -> Result<Self, StoreError> {
    Self::from_connection(Connection::open_in_memory()?)
  }

  /// Wrap an existing connection, creating tables as needed.
  pub fn from_connection(conn: Connection) -> Result<Self, StoreError> {
    run_migrations(&conn)?;
    let worker = SerialWorker::spawn("feed-store", conn)?;
    Ok(Self { worker })
  }

  /// Get the default database path.
  pub fn default_path() -> Option<PathBuf> {
    let data_dir = dirs::data_dir().or_else(|| dirs::home_dir().map(|p| p.join(".local/share")))?;

    Some(data_dir.join("feedcache").join("feed-store.sqlite"))
  }

  /// Wait until every queued operation has run, including follow-up writes
  /// queued from completions.
  pub fn flush(&self) -> Result<(), StoreError> {
    self.worker.flush()
  }
}

/// Run database migrations for store tables.
fn run_migrations(conn: &Connection) -> Result<(), StoreError> {
  conn.execute_batch("PRAGMA foreign_keys=ON;")?;
  conn.execute_batch(STORE_SCHEMA)?;
  Ok(())
}

/// Run `op` in a transaction, committing on success and rolling back on error.
fn write<R>(
  conn: &mut Connection,
  op: impl FnOnce(&Transaction<'_>) -> Result<R, StoreError>,
) -> Result<R, StoreError> {
  let tx = conn.transaction()?;
  match op(&tx) {
    Ok(value) => {
      tx.commit()?;
      Ok(value)
    }
    Err(err) => {
      if let Err(rollback) = tx.rollback() {
        warn!(error = %rollback, "failed to roll back feed store transaction");
      }
      warn!(error = %err, "feed store write rolled back");
      Err(err)
    }
  }
}

fn delete_cached_feed(conn: &mut Connection) -> DeletionResult {
  write(conn, |tx| {
    tx.execute("DELETE FROM feed_cache", [])?;
    Ok(())
  })
}

fn insert(conn: &mut Connection, feed: &[FeedImage], timestamp: DateTime<Utc>) -> InsertionResult {
  write(conn, |tx| {
    // Cascades to feed_image
    tx.execute("DELETE FROM feed_cache", [])?;
    tx.execute(
      "INSERT INTO feed_cache (id, timestamp) VALUES (?1, ?2)",
      params![SNAPSHOT_ID, format_timestamp(timestamp)],
    )?;

    let mut stmt = tx.prepare(
      "INSERT INTO feed_image (cache_id, position, image_id, data)
       VALUES (?1, ?2, ?3, ?4)",
    )?;
    for (position, image) in feed.iter().enumerate() {
      let data = serde_json::to_vec(image)?;
      stmt.execute(params![SNAPSHOT_ID, position, image.id.to_string(), data])?;
    }

    Ok(())
  })
}

fn retrieve(conn: &mut Connection) -> RetrievalResult {
  let timestamp: Option<String> = conn
    .query_row(
      "SELECT timestamp FROM feed_cache WHERE id = ?1",
      params![SNAPSHOT_ID],
      |row| row.get(0),
    )
    .optional()?;

  let timestamp = match timestamp {
    Some(timestamp) => parse_timestamp(&timestamp)?,
    None => return Ok(None),
  };

  let mut stmt = conn.prepare(
    "SELECT data FROM feed_image
     WHERE cache_id = ?1
     ORDER BY position",
  )?;

  let feed = stmt
    .query_map(params![SNAPSHOT_ID], |row| row.get::<_, Vec<u8>>(0))?
    .map(|data| {
      let data = data?;
      serde_json::from_slice::<FeedImage>(&data)
        .map_err(|e| StoreError::Corrupt(format!("undecodable feed image: {}", e)))
    })
    .collect::<Result<Vec<_>, StoreError>>()?;

  Ok(Some(CachedFeed { feed, timestamp }))
}

fn insert_image_data(conn: &mut Connection, data: &[u8], url: &Url) -> InsertionResult {
  write(conn, |tx| {
    tx.execute(
      "INSERT INTO image_data (url, data) VALUES (?1, ?2)
       ON CONFLICT(url) DO UPDATE SET data = excluded.data",
      params![url.as_str(), data],
    )?;
    Ok(())
  })
}

fn retrieve_image_data(conn: &mut Connection, url: &Url) -> ImageDataRetrievalResult {
  let data = conn
    .query_row(
      "SELECT data FROM image_data WHERE url = ?1",
      params![url.as_str()],
      |row| row.get::<_, Vec<u8>>(0),
    )
    .optional()?;
  Ok(data)
}

fn format_timestamp(timestamp: DateTime<Utc>) -> String {
  timestamp.to_rfc3339_opts(SecondsFormat::Nanos, true)
}

/// Parse a timestamp written by `format_timestamp`.
fn parse_timestamp(s: &str) -> Result<DateTime<Utc>, StoreError> {
  DateTime::parse_from_rfc3339(s)
    .map(|dt| dt.with_timezone(&Utc))
    .map_err(|e| StoreError::Corrupt(format!("invalid timestamp '{}': {}", s, e)))
}

impl FeedStore for SqliteFeedStore {
  fn delete_cached_feed(&self, completion: Completion<DeletionResult>) {
    self.worker.call(delete_cached_feed, completion);
  }

  fn insert(
    &self,
    feed: Vec<FeedImage>,
    timestamp: DateTime<Utc>,
    completion: Completion<InsertionResult>,
  ) {
    self
      .worker
      .call(move |conn| insert(conn, &feed, timestamp), completion);
  }

  fn retrieve(&self, completion: Completion<RetrievalResult>) {
    self.worker.call(retrieve, completion);
  }

  fn delete_cached_feed_blocking(&self) -> DeletionResult {
    self.worker.call_blocking(delete_cached_feed)
  }

  fn insert_blocking(&self, feed: Vec<FeedImage>, timestamp: DateTime<Utc>) -> InsertionResult {
    self
      .worker
      .call_blocking(move |conn| insert(conn, &feed, timestamp))
  }

  fn retrieve_blocking(&self) -> RetrievalResult {
    self.worker.call_blocking(retrieve)
  }
}

impl FeedImageDataStore for SqliteFeedStore {
  fn insert_image_data(&self, data: Vec<u8>, url: &Url, completion: Completion<InsertionResult>) {
    let url = url.clone();
    self
      .worker
      .call(move |conn| insert_image_data(conn, &data, &url), completion);
  }

  fn retrieve_image_data(&self, url: &Url, completion: Completion<ImageDataRetrievalResult>) {
    let url = url.clone();
    self
      .worker
      .call(move |conn| retrieve_image_data(conn, &url), completion);
  }

  fn insert_image_data_blocking(&self, data: Vec<u8>, url: &Url) -> InsertionResult {
    let url = url.clone();
    self
      .worker
      .call_blocking(move |conn| insert_image_data(conn, &data, &url))
  }

  fn retrieve_image_data_blocking(&self, url: &Url) -> ImageDataRetrievalResult {
    let url = url.clone();
    self
      .worker
      .call_blocking(move |conn| retrieve_image_data(conn, &url))
  }
}
