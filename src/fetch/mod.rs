mod http_fetcher;

pub use http_fetcher::HttpImageFetcher;

use async_trait::async_trait;
use image::DynamicImage;

use crate::error::FetchError;

/// Downloads and decodes the image behind a URL.
#[async_trait]
pub trait ImageFetcher: Send + Sync {
    async fn fetch(&self, url: &str) -> Result<DynamicImage, FetchError>;
}
