//! Shared fixtures and test doubles.

use chrono::{DateTime, Utc};
use parking_lot::Mutex;
use std::sync::Arc;
use url::Url;
use uuid::Uuid;

use crate::cache::{
  DeletionResult, FeedImageDataStore, FeedStore, ImageDataRetrievalResult, InsertionResult,
  RetrievalResult,
};
use crate::error::{Error, StoreError};
use crate::feed::{
  Completion, FeedCache, FeedImage, FeedImageDataCache, FeedImageDataLoader,
  FeedImageDataLoaderTask, FeedLoader, LoadFeedResult, LoadImageDataResult, SaveResult,
};
use crate::remote::{HttpClient, HttpClientResult, HttpClientTask, HttpResponse};

pub fn any_url() -> Url {
  Url::parse("https://any-url.com/image.png").unwrap()
}

pub fn unique_image() -> FeedImage {
  let id = Uuid::new_v4();
  FeedImage::new(
    id,
    Some("a description".to_string()),
    None,
    Url::parse(&format!("https://images.example.com/{}.png", id)).unwrap(),
  )
}

pub fn unique_feed() -> Vec<FeedImage> {
  vec![unique_image(), unique_image()]
}

pub fn any_store_error() -> StoreError {
  StoreError::Corrupt("any error".to_string())
}

pub fn any_error() -> Error {
  Error::Connectivity("offline".to_string())
}

/// Collects every value delivered to its completions.
pub struct Capture<T> {
  values: Arc<Mutex<Vec<T>>>,
}

impl<T: Send + 'static> Capture<T> {
  pub fn new() -> Self {
    Self {
      values: Arc::new(Mutex::new(Vec::new())),
    }
  }

  pub fn completion(&self) -> Completion<T> {
    let values = Arc::clone(&self.values);
    Box::new(move |value| values.lock().push(value))
  }

  /// Remove and return the first delivered value.
  pub fn take(&self) -> Option<T> {
    let mut values = self.values.lock();
    if values.is_empty() {
      None
    } else {
      Some(values.remove(0))
    }
  }

  pub fn count(&self) -> usize {
    self.values.lock().len()
  }
}

// ============================================================================
// Store spy
// ============================================================================

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum StoreMessage {
  DeleteCachedFeed,
  Insert(Vec<FeedImage>, DateTime<Utc>),
  Retrieve,
  InsertImageData(Vec<u8>, Url),
  RetrieveImageData(Url),
}

#[derive(Default)]
struct StoreSpyState {
  messages: Vec<StoreMessage>,
  deletions: Vec<Completion<DeletionResult>>,
  insertions: Vec<Completion<InsertionResult>>,
  retrievals: Vec<Completion<RetrievalResult>>,
  image_insertions: Vec<Completion<InsertionResult>>,
  image_retrievals: Vec<Completion<ImageDataRetrievalResult>>,
}

/// Records every store message and holds completions until told to finish them.
///
/// `complete_*` finishes the oldest pending operation of that kind.
#[derive(Default)]
pub struct FeedStoreSpy {
  state: Mutex<StoreSpyState>,
}

impl FeedStoreSpy {
  pub fn messages(&self) -> Vec<StoreMessage> {
    self.state.lock().messages.clone()
  }

  pub fn complete_deletion(&self, result: DeletionResult) {
    let completion = self.state.lock().deletions.remove(0);
    completion(result)
  }

  pub fn complete_insertion(&self, result: InsertionResult) {
    let completion = self.state.lock().insertions.remove(0);
    completion(result)
  }

  pub fn complete_retrieval(&self, result: RetrievalResult) {
    let completion = self.state.lock().retrievals.remove(0);
    completion(result)
  }

  pub fn complete_image_insertion(&self, result: InsertionResult) {
    let completion = self.state.lock().image_insertions.remove(0);
    completion(result)
  }

  pub fn complete_image_retrieval(&self, result: ImageDataRetrievalResult) {
    let completion = self.state.lock().image_retrievals.remove(0);
    completion(result)
  }
}

impl FeedStore for FeedStoreSpy {
  fn delete_cached_feed(&self, completion: Completion<DeletionResult>) {
    let mut state = self.state.lock();
    state.messages.push(StoreMessage::DeleteCachedFeed);
    state.deletions.push(completion);
  }

  fn insert(
    &self,
    feed: Vec<FeedImage>,
    timestamp: DateTime<Utc>,
    completion: Completion<InsertionResult>,
  ) {
    let mut state = self.state.lock();
    state.messages.push(StoreMessage::Insert(feed, timestamp));
    state.insertions.push(completion);
  }

  fn retrieve(&self, completion: Completion<RetrievalResult>) {
    let mut state = self.state.lock();
    state.messages.push(StoreMessage::Retrieve);
    state.retrievals.push(completion);
  }
}

impl FeedImageDataStore for FeedStoreSpy {
  fn insert_image_data(&self, data: Vec<u8>, url: &Url, completion: Completion<InsertionResult>) {
    let mut state = self.state.lock();
    state
      .messages
      .push(StoreMessage::InsertImageData(data, url.clone()));
    state.image_insertions.push(completion);
  }

  fn retrieve_image_data(&self, url: &Url, completion: Completion<ImageDataRetrievalResult>) {
    let mut state = self.state.lock();
    state
      .messages
      .push(StoreMessage::RetrieveImageData(url.clone()));
    state.image_retrievals.push(completion);
  }
}

// ============================================================================
// Loader and cache doubles
// ============================================================================

/// Feed loader that completes immediately with a canned outcome.
pub struct FeedLoaderStub {
  feed: Option<Vec<FeedImage>>,
  loads: Mutex<usize>,
}

impl FeedLoaderStub {
  pub fn success(feed: Vec<FeedImage>) -> Self {
    Self {
      feed: Some(feed),
      loads: Mutex::new(0),
    }
  }

  /// Fails every load with a connectivity error.
  pub fn failure() -> Self {
    Self {
      feed: None,
      loads: Mutex::new(0),
    }
  }

  pub fn load_count(&self) -> usize {
    *self.loads.lock()
  }
}

impl FeedLoader for FeedLoaderStub {
  fn load(&self, completion: Completion<LoadFeedResult>) {
    *self.loads.lock() += 1;
    match &self.feed {
      Some(feed) => completion(Ok(feed.clone())),
      None => completion(Err(any_error())),
    }
  }
}

/// Feed loader that holds completions until told to finish them.
#[derive(Default)]
pub struct FeedLoaderSpy {
  completions: Mutex<Vec<Completion<LoadFeedResult>>>,
  loads: Mutex<usize>,
}

impl FeedLoaderSpy {
  /// Every `load` call so far, completed or not.
  pub fn load_count(&self) -> usize {
    *self.loads.lock()
  }

  pub fn complete(&self, result: LoadFeedResult) {
    let completion = self.completions.lock().remove(0);
    completion(result)
  }
}

impl FeedLoader for FeedLoaderSpy {
  fn load(&self, completion: Completion<LoadFeedResult>) {
    *self.loads.lock() += 1;
    self.completions.lock().push(completion);
  }
}

/// Records saved feeds; saves fail when built with `failing`.
#[derive(Default)]
pub struct FeedCacheSpy {
  saved: Mutex<Vec<Vec<FeedImage>>>,
  fail: bool,
}

impl FeedCacheSpy {
  pub fn failing() -> Self {
    Self {
      saved: Mutex::new(Vec::new()),
      fail: true,
    }
  }

  pub fn saved(&self) -> Vec<Vec<FeedImage>> {
    self.saved.lock().clone()
  }
}

impl FeedCache for FeedCacheSpy {
  fn save(&self, feed: Vec<FeedImage>, completion: Completion<SaveResult>) {
    self.saved.lock().push(feed);
    if self.fail {
      completion(Err(Error::Store(any_store_error())))
    } else {
      completion(Ok(()))
    }
  }
}

#[derive(Default)]
struct ImageLoaderSpyState {
  urls: Vec<Url>,
  completions: Vec<Option<Completion<LoadImageDataResult>>>,
  cancelled: Vec<Url>,
}

/// Image data loader that holds completions and records cancellations.
///
/// Its tasks only record the cancel; completing afterwards still delivers,
/// like a transport that ignores cancellation.
#[derive(Default, Clone)]
pub struct ImageDataLoaderSpy {
  state: Arc<Mutex<ImageLoaderSpyState>>,
}

struct ImageDataLoaderSpyTask {
  url: Url,
  state: Arc<Mutex<ImageLoaderSpyState>>,
}

impl FeedImageDataLoaderTask for ImageDataLoaderSpyTask {
  fn cancel(&self) {
    self.state.lock().cancelled.push(self.url.clone());
  }
}

impl ImageDataLoaderSpy {
  pub fn loaded_urls(&self) -> Vec<Url> {
    self.state.lock().urls.clone()
  }

  pub fn cancelled_urls(&self) -> Vec<Url> {
    self.state.lock().cancelled.clone()
  }

  pub fn complete(&self, index: usize, result: LoadImageDataResult) {
    let completion = self.state.lock().completions[index].take();
    if let Some(completion) = completion {
      completion(result)
    }
  }
}

impl FeedImageDataLoader for ImageDataLoaderSpy {
  fn load_image_data(
    &self,
    url: &Url,
    completion: Completion<LoadImageDataResult>,
  ) -> Box<dyn FeedImageDataLoaderTask> {
    let mut state = self.state.lock();
    state.urls.push(url.clone());
    state.completions.push(Some(completion));
    Box::new(ImageDataLoaderSpyTask {
      url: url.clone(),
      state: Arc::clone(&self.state),
    })
  }
}

/// Records saved image data; saves fail when built with `failing`.
#[derive(Default)]
pub struct ImageDataCacheSpy {
  saved: Mutex<Vec<(Vec<u8>, Url)>>,
  fail: bool,
}

impl ImageDataCacheSpy {
  pub fn failing() -> Self {
    Self {
      saved: Mutex::new(Vec::new()),
      fail: true,
    }
  }

  pub fn saved(&self) -> Vec<(Vec<u8>, Url)> {
    self.saved.lock().clone()
  }
}

impl FeedImageDataCache for ImageDataCacheSpy {
  fn save(&self, data: Vec<u8>, url: &Url, completion: Completion<SaveResult>) {
    self.saved.lock().push((data, url.clone()));
    if self.fail {
      completion(Err(Error::SaveFailed(any_store_error())))
    } else {
      completion(Ok(()))
    }
  }
}

// ============================================================================
// HTTP client spy
// ============================================================================

#[derive(Default)]
struct HttpSpyState {
  urls: Vec<Url>,
  completions: Vec<Option<Completion<HttpClientResult>>>,
  cancelled: Vec<Url>,
}

/// HTTP client that holds requests until told to complete them.
#[derive(Default, Clone)]
pub struct HttpClientSpy {
  state: Arc<Mutex<HttpSpyState>>,
}

struct HttpClientSpyTask {
  url: Url,
  state: Arc<Mutex<HttpSpyState>>,
}

impl HttpClientTask for HttpClientSpyTask {
  fn cancel(&self) {
    self.state.lock().cancelled.push(self.url.clone());
  }
}

impl HttpClientSpy {
  pub fn requested_urls(&self) -> Vec<Url> {
    self.state.lock().urls.clone()
  }

  pub fn cancelled_urls(&self) -> Vec<Url> {
    self.state.lock().cancelled.clone()
  }

  pub fn complete_with(&self, index: usize, status: u16, body: &[u8]) {
    self.complete(index, Ok((HttpResponse { status }, body.to_vec())));
  }

  pub fn complete(&self, index: usize, result: HttpClientResult) {
    let completion = self.state.lock().completions[index].take();
    if let Some(completion) = completion {
      completion(result)
    }
  }
}

impl HttpClient for HttpClientSpy {
  fn get(&self, url: &Url, completion: Completion<HttpClientResult>) -> Box<dyn HttpClientTask> {
    let mut state = self.state.lock();
    state.urls.push(url.clone());
    state.completions.push(Some(completion));
    Box::new(HttpClientSpyTask {
      url: url.clone(),
      state: Arc::clone(&self.state),
    })
  }
}
