use std::time::Duration;

use async_trait::async_trait;
use image::DynamicImage;
use tracing::{debug, instrument, warn};

use super::ImageFetcher;
use crate::config::FetchConfig;
use crate::error::FetchError;

/// [`ImageFetcher`] over HTTP(S) with a per-request timeout.
#[derive(Debug, Clone)]
pub struct HttpImageFetcher {
    client: reqwest::Client,
}

impl HttpImageFetcher {
    pub fn new(config: &FetchConfig) -> Result<Self, FetchError> {
        if config.accept_invalid_certs {
            warn!("TLS certificate validation is disabled for image downloads");
        }

        let client = reqwest::Client::builder()
            .timeout(Duration::from_secs(config.timeout_secs))
            .danger_accept_invalid_certs(config.accept_invalid_certs)
            .user_agent(config.user_agent.as_str())
            .build()?;

        Ok(Self { client })
    }
}

#[async_trait]
impl ImageFetcher for HttpImageFetcher {
    #[instrument(skip(self))]
    async fn fetch(&self, url: &str) -> Result<DynamicImage, FetchError> {
        let response = self.client.get(url).send().await?;

        let status = response.status();
        if !status.is_success() {
            return Err(FetchError::Status {
                url: url.to_string(),
                status,
            });
        }

        let bytes = response.bytes().await?;
        debug!(bytes = bytes.len(), "Downloaded image");

        // Decoding large JPEGs is CPU bound, keep it off the async workers.
        tokio::task::spawn_blocking(move || image::load_from_memory(&bytes))
            .await
            .map_err(|e| FetchError::Worker(e.to_string()))?
            .map_err(FetchError::from)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn fetcher() -> HttpImageFetcher {
        HttpImageFetcher::new(&FetchConfig {
            timeout_secs: 2,
            ..FetchConfig::default()
        })
        .expect("Failed to build fetcher")
    }

    #[tokio::test]
    async fn unreachable_host_is_a_request_error() {
        let result = fetcher().fetch("http://127.0.0.1:1/artifact.jpg").await;
        assert!(matches!(result, Err(FetchError::Request(_))));
    }

    #[tokio::test]
    async fn malformed_url_is_a_request_error() {
        let result = fetcher().fetch("not a url").await;
        assert!(matches!(result, Err(FetchError::Request(_))));
    }
}
