//! Network side of the pipelines: an HTTP transport and the loaders that map
//! its responses into feed values.

mod client;
mod feed;
mod image;

pub use client::{HttpClient, HttpClientResult, HttpClientTask, HttpResponse, ReqwestHttpClient};
pub use feed::{map_feed_items, RemoteFeedLoader};
pub use image::{map_image_data, RemoteFeedImageDataLoader};
