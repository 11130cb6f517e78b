//! Remote image data endpoint.

use std::sync::Arc;
use url::Url;

use super::client::{HttpClient, HttpClientTask, HttpResponse};
use crate::error::Error;
use crate::feed::{
  CancellableCompletion, Completion, FeedImageDataLoader, FeedImageDataLoaderTask,
  LoadImageDataResult,
};

/// Map an image response to its bytes.
pub fn map_image_data(response: &HttpResponse, body: Vec<u8>) -> Result<Vec<u8>, Error> {
  if !response.is_ok() {
    return Err(Error::InvalidData(format!(
      "unexpected status {}",
      response.status
    )));
  }
  if body.is_empty() {
    return Err(Error::InvalidData("empty image data".to_string()));
  }
  Ok(body)
}

/// Loads image bytes over HTTP.
pub struct RemoteFeedImageDataLoader {
  client: Arc<dyn HttpClient>,
}

impl RemoteFeedImageDataLoader {
  pub fn new(client: Arc<dyn HttpClient>) -> Self {
    Self { client }
  }
}

struct HttpImageDataTask {
  completion: CancellableCompletion<LoadImageDataResult>,
  request: Box<dyn HttpClientTask>,
}

impl FeedImageDataLoaderTask for HttpImageDataTask {
  fn cancel(&self) {
    self.completion.cancel();
    self.request.cancel();
  }
}

impl FeedImageDataLoader for RemoteFeedImageDataLoader {
  fn load_image_data(
    &self,
    url: &Url,
    completion: Completion<LoadImageDataResult>,
  ) -> Box<dyn FeedImageDataLoaderTask> {
    let completion = CancellableCompletion::new(completion);
    let delivery = completion.clone();

    let request = self.client.get(
      url,
      Box::new(move |result| {
        delivery.complete(result.and_then(|(response, body)| map_image_data(&response, body)));
      }),
    );

    Box::new(HttpImageDataTask {
      completion,
      request,
    })
  }
}
