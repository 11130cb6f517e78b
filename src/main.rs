use clap::{Parser, Subcommand};
use color_eyre::{eyre::eyre, Result};
use std::path::PathBuf;
use std::sync::Arc;
use tokio::runtime::Handle;
use tokio::sync::oneshot;
use tracing::info;
use url::Url;

use feedcache::cache::{FeedStore, SqliteFeedStore};
use feedcache::clock::SystemClock;
use feedcache::compose::LoaderComposer;
use feedcache::config::Config;
use feedcache::dispatch::MainQueue;
use feedcache::remote::{HttpClient, RemoteFeedImageDataLoader, RemoteFeedLoader, ReqwestHttpClient};
use feedcache::{Completion, FeedImage, FeedImageDataLoader, FeedLoader};

#[derive(Parser, Debug)]
#[command(name = "feedcache")]
#[command(about = "Load an image feed, falling back to a local cache when offline")]
#[command(version)]
struct Args {
  /// Path to config file (default: $XDG_CONFIG_HOME/feedcache/config.yaml)
  #[arg(short, long)]
  config: Option<PathBuf>,

  /// Remote feed endpoint (overrides FEEDCACHE_FEED_URL and the config file)
  #[arg(long)]
  feed_url: Option<Url>,

  #[command(subcommand)]
  command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
  /// Load the feed from the remote endpoint, or from the cache when offline
  Feed,
  /// Load one image's data, from the cache when it is there
  Image {
    url: Url,
    /// Write the bytes to this file
    #[arg(short, long)]
    out: Option<PathBuf>,
  },
  /// Delete the cached feed if it can no longer be read
  Validate,
  /// Show the cached feed without touching the network
  Cached,
}

#[tokio::main]
async fn main() -> Result<()> {
  color_eyre::install()?;

  let args = Args::parse();

  // Load configuration
  let config = Config::load(args.config.as_deref())?;
  let _log_guard = feedcache::logging::init(&config.log)?;

  let cache_path = config.cache_path()?;
  let store = Arc::new(SqliteFeedStore::open(&cache_path)?);
  info!(path = %cache_path.display(), "using feed cache");

  let mut main_queue = MainQueue::new();
  let composer = LoaderComposer::new(
    Arc::clone(&store),
    SystemClock,
    config.cache_policy(),
    Arc::new(main_queue.handle()),
  );

  match args.command {
    Command::Feed => {
      let client = http_client()?;
      let remote = RemoteFeedLoader::new(config.feed_url(args.feed_url)?, client);
      let loader = composer.feed_loader(remote);

      let (done, result) = completion();
      loader.load(done);
      let feed = main_queue
        .run_until(result)
        .await
        .ok_or_else(|| eyre!("Feed load finished without a result"))??;

      print_feed(&feed);
    }
    Command::Image { url, out } => {
      let client = http_client()?;
      let loader = composer.image_data_loader(RemoteFeedImageDataLoader::new(client));

      let (done, result) = completion();
      let _task = loader.load_image_data(&url, done);
      let data = main_queue
        .run_until(result)
        .await
        .ok_or_else(|| eyre!("Image load finished without a result"))??;

      match out {
        Some(path) => {
          std::fs::write(&path, &data)
            .map_err(|e| eyre!("Failed to write {}: {}", path.display(), e))?;
          println!("Wrote {} bytes to {}", data.len(), path.display());
        }
        None => println!("{} bytes", data.len()),
      }
    }
    Command::Validate => {
      let (done, result) = completion();
      composer.local_feed_loader().validate_cache(done);
      main_queue
        .run_until(result)
        .await
        .ok_or_else(|| eyre!("Cache validation finished without a result"))??;

      println!("Cache is valid");
    }
    Command::Cached => match store.retrieve_blocking()? {
      Some(cached) => {
        println!("Cached at {}", cached.timestamp.to_rfc3339());
        print_feed(&cached.feed);
      }
      None => println!("No cached feed"),
    },
  }

  // Let best-effort cache writes land before exiting
  store.flush()?;

  Ok(())
}

fn http_client() -> Result<Arc<dyn HttpClient>> {
  Ok(Arc::new(ReqwestHttpClient::with_runtime(Handle::current())?))
}

/// A completion paired with the receiver `MainQueue::run_until` waits on.
fn completion<T: Send + 'static>() -> (Completion<T>, oneshot::Receiver<T>) {
  let (tx, rx) = oneshot::channel();
  (
    Box::new(move |value| {
      let _ = tx.send(value);
    }),
    rx,
  )
}

fn print_feed(feed: &[FeedImage]) {
  if feed.is_empty() {
    println!("Feed is empty");
    return;
  }

  for image in feed {
    println!("{}  {}", image.id, image.url);
    if let Some(description) = &image.description {
      println!("    {}", description);
    }
    if let Some(location) = &image.location {
      println!("    @ {}", location);
    }
  }
}
