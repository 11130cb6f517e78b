//! Remote feed endpoint.

use serde::Deserialize;
use std::sync::Arc;
use url::Url;
use uuid::Uuid;

use super::client::{HttpClient, HttpResponse};
use crate::error::Error;
use crate::feed::{Completion, FeedImage, FeedLoader, LoadFeedResult};

// ============================================================================
// Wire types
// ============================================================================

#[derive(Debug, Deserialize)]
struct ApiFeedResponse {
  items: Vec<ApiFeedItem>,
}

#[derive(Debug, Deserialize)]
struct ApiFeedItem {
  id: Uuid,
  description: Option<String>,
  location: Option<String>,
  image: Url,
}

impl From<ApiFeedItem> for FeedImage {
  fn from(item: ApiFeedItem) -> Self {
    FeedImage::new(item.id, item.description, item.location, item.image)
  }
}

/// Map a feed endpoint response to feed images.
pub fn map_feed_items(response: &HttpResponse, body: &[u8]) -> Result<Vec<FeedImage>, Error> {
  if !response.is_ok() {
    return Err(Error::InvalidData(format!(
      "unexpected status {}",
      response.status
    )));
  }

  let payload: ApiFeedResponse = serde_json::from_slice(body)
    .map_err(|e| Error::InvalidData(format!("malformed feed payload: {}", e)))?;

  Ok(payload.items.into_iter().map(FeedImage::from).collect())
}

// ============================================================================
// Loader
// ============================================================================

/// Loads the feed from a remote endpoint.
pub struct RemoteFeedLoader {
  url: Url,
  client: Arc<dyn HttpClient>,
}

impl RemoteFeedLoader {
  pub fn new(url: Url, client: Arc<dyn HttpClient>) -> Self {
    Self { url, client }
  }
}

impl FeedLoader for RemoteFeedLoader {
  fn load(&self, completion: Completion<LoadFeedResult>) {
    // The feed request is never cancelled.
    let _task = self.client.get(
      &self.url,
      Box::new(move |result| {
        completion(result.and_then(|(response, body)| map_feed_items(&response, &body)))
      }),
    );
  }
}

#[cfg(test)]
mod tests {
  use super::*;
  use crate::test_support::{unique_image, Capture, HttpClientSpy};
  use serde_json::json;

  fn feed_url() -> Url {
    Url::parse("https://a-feed.com/feed").unwrap()
  }

  fn make_sut() -> (RemoteFeedLoader, HttpClientSpy) {
    let client = HttpClientSpy::default();
    (
      RemoteFeedLoader::new(feed_url(), Arc::new(client.clone())),
      client,
    )
  }

  fn items_json(feed: &[FeedImage]) -> Vec<u8> {
    let items: Vec<_> = feed
      .iter()
      .map(|image| {
        json!({
          "id": image.id,
          "description": image.description,
          "location": image.location,
          "image": image.url,
        })
      })
      .collect();
    serde_json::to_vec(&json!({ "items": items })).unwrap()
  }

  #[test]
  fn test_load_requests_feed_url() {
    let (sut, client) = make_sut();

    sut.load(Box::new(|_| {}));

    assert_eq!(client.requested_urls(), vec![feed_url()]);
  }

  #[test]
  fn test_load_delivers_connectivity_error_on_client_error() {
    let (sut, client) = make_sut();
    let received = Capture::new();

    sut.load(received.completion());
    client.complete(0, Err(Error::Connectivity("offline".to_string())));

    assert!(matches!(received.take(), Some(Err(Error::Connectivity(_)))));
  }

  #[test]
  fn test_load_delivers_invalid_data_on_non_200_response() {
    for status in [199, 201, 300, 400, 500] {
      let (sut, client) = make_sut();
      let received = Capture::new();

      sut.load(received.completion());
      client.complete_with(0, status, &items_json(&[]));

      assert!(
        matches!(received.take(), Some(Err(Error::InvalidData(_)))),
        "status {}",
        status
      );
    }
  }

  #[test]
  fn test_load_delivers_invalid_data_on_malformed_body() {
    let (sut, client) = make_sut();
    let received = Capture::new();

    sut.load(received.completion());
    client.complete_with(0, 200, b"invalid json");

    assert!(matches!(received.take(), Some(Err(Error::InvalidData(_)))));
  }

  #[test]
  fn test_load_delivers_empty_feed_on_empty_items() {
    let (sut, client) = make_sut();
    let received = Capture::new();

    sut.load(received.completion());
    client.complete_with(0, 200, br#"{"items": []}"#);

    assert_eq!(received.take().map(|r| r.unwrap()), Some(vec![]));
  }

  #[test]
  fn test_load_delivers_mapped_items() {
    let (sut, client) = make_sut();
    let mut sparse = unique_image();
    sparse.description = None;
    sparse.location = None;
    let mut full = unique_image();
    full.location = Some("a location".to_string());
    let feed = vec![sparse, full];
    let received = Capture::new();

    sut.load(received.completion());
    client.complete_with(0, 200, &items_json(&feed));

    assert_eq!(received.take().map(|r| r.unwrap()), Some(feed));
  }

  #[test]
  fn test_mapper_rejects_item_without_image_url() {
    let body = json!({ "items": [{ "id": Uuid::new_v4() }] }).to_string();

    let result = map_feed_items(&HttpResponse { status: 200 }, body.as_bytes());

    assert!(matches!(result, Err(Error::InvalidData(_))));
  }
}
