//! HTTP transport used by the remote loaders.

use tokio::runtime::Handle;
use tokio::task::AbortHandle;
use url::Url;

use crate::error::Error;
use crate::feed::Completion;

/// Status line of an HTTP response
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct HttpResponse {
  pub status: u16,
}

impl HttpResponse {
  pub fn is_ok(&self) -> bool {
    self.status == 200
  }
}

/// Response and body, or a transport failure.
pub type HttpClientResult = Result<(HttpResponse, Vec<u8>), Error>;

/// Handle to an in-flight request.
pub trait HttpClientTask: Send + Sync {
  fn cancel(&self);
}

/// Performs GET requests.
///
/// Transport failures are reported as `Error::Connectivity`; any response,
/// whatever its status, is a success at this level.
pub trait HttpClient: Send + Sync {
  fn get(&self, url: &Url, completion: Completion<HttpClientResult>) -> Box<dyn HttpClientTask>;
}

/// `HttpClient` backed by reqwest, running requests on a tokio runtime.
#[derive(Clone)]
pub struct ReqwestHttpClient {
  client: reqwest::Client,
  runtime: Handle,
}

impl ReqwestHttpClient {
  pub fn new(client: reqwest::Client, runtime: Handle) -> Self {
    Self { client, runtime }
  }

  /// Build a client with default settings on the given runtime.
  pub fn with_runtime(runtime: Handle) -> Result<Self, Error> {
    let client = reqwest::Client::builder()
      .user_agent(concat!("feedcache/", env!("CARGO_PKG_VERSION")))
      .build()
      .map_err(|e| Error::Connectivity(format!("Failed to create HTTP client: {}", e)))?;
    Ok(Self::new(client, runtime))
  }
}

struct AbortOnCancel(AbortHandle);

impl HttpClientTask for AbortOnCancel {
  fn cancel(&self) {
    self.0.abort();
  }
}

impl HttpClient for ReqwestHttpClient {
  fn get(&self, url: &Url, completion: Completion<HttpClientResult>) -> Box<dyn HttpClientTask> {
    let request = self.client.get(url.clone());

    let handle = self.runtime.spawn(async move {
      let result = async {
        let response = request.send().await?;
        let status = response.status().as_u16();
        let body = response.bytes().await?;
        Ok::<_, reqwest::Error>((HttpResponse { status }, body.to_vec()))
      }
      .await;

      completion(result.map_err(|e| Error::Connectivity(e.to_string())));
    });

    Box::new(AbortOnCancel(handle.abort_handle()))
  }
}
