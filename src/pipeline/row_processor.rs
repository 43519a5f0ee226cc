use std::future::Future;
use std::pin::Pin;
use std::sync::Arc;
use std::task::{Context, Poll};

use tower::Service;
use tracing::{debug, instrument, warn};

use super::preprocessing;
use crate::catalog::{AugmentedRow, CatalogRow};
use crate::color::{BlueExtractor, Extraction, PopulationSource};
use crate::error::{AppError, FetchError};
use crate::fetch::ImageFetcher;

/// A catalog row tagged with its position in the input.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct IndexedRow {
    pub index: usize,
    pub row: CatalogRow,
}

/// What happened to a row. Every variant still yields an output row.
#[derive(Debug, Clone, PartialEq)]
pub enum RowOutcome {
    /// The row had no image URL.
    Skipped,
    /// The image was analyzed; `shades` is zero when no blue was found.
    Completed {
        shades: usize,
        source: Option<PopulationSource>,
    },
    /// Fetching, decoding or analysis failed.
    Failed(String),
}

#[derive(Debug, Clone, PartialEq)]
pub struct ProcessedRow {
    pub index: usize,
    pub row: AugmentedRow,
    pub outcome: RowOutcome,
}

/// Fetches a row's image, extracts its blue shades and formats the summary.
///
/// Row level failures never surface as errors: the row comes back with an
/// empty `rgb_color` and a [`RowOutcome::Failed`].
#[derive(Clone)]
pub struct RowProcessor {
    fetcher: Arc<dyn ImageFetcher>,
    extractor: Arc<BlueExtractor>,
    max_dimension: u32,
}

impl RowProcessor {
    pub fn new(fetcher: Arc<dyn ImageFetcher>, extractor: BlueExtractor, max_dimension: u32) -> Self {
        Self {
            fetcher,
            extractor: Arc::new(extractor),
            max_dimension,
        }
    }

    #[instrument(skip(self, request), fields(index = request.index, id = %request.row.id))]
    pub async fn process(&self, request: IndexedRow) -> ProcessedRow {
        let IndexedRow { index, row } = request;

        if !row.has_url() {
            debug!("No URL, skipping");
            return ProcessedRow {
                index,
                row: AugmentedRow::without_color(row),
                outcome: RowOutcome::Skipped,
            };
        }

        match self.analyze(&row.url).await {
            Ok(extraction) => {
                debug!(
                    pixels = extraction.total_pixels,
                    population = extraction.population,
                    source = ?extraction.source,
                    threshold = ?extraction.threshold,
                    "Extracted blue shades"
                );
                let outcome = RowOutcome::Completed {
                    shades: extraction.histogram.len(),
                    source: extraction.source,
                };
                ProcessedRow {
                    index,
                    row: AugmentedRow::new(row, extraction.histogram.to_summary()),
                    outcome,
                }
            }
            Err(e) => {
                warn!(url = %row.url, "Failed to process image: {}", e);
                ProcessedRow {
                    index,
                    row: AugmentedRow::without_color(row),
                    outcome: RowOutcome::Failed(e.to_string()),
                }
            }
        }
    }

    async fn analyze(&self, url: &str) -> Result<Extraction, FetchError> {
        let image = self.fetcher.fetch(url).await?;

        let extractor = self.extractor.clone();
        let max_dimension = self.max_dimension;
        tokio::task::spawn_blocking(move || {
            let image = preprocessing::prepare(image, max_dimension);
            extractor.extract_detailed(image.pixels().copied())
        })
        .await
        .map_err(|e| FetchError::Worker(e.to_string()))
    }
}

impl Service<IndexedRow> for RowProcessor {
    type Response = ProcessedRow;
    type Error = AppError;
    type Future = Pin<Box<dyn Future<Output = Result<Self::Response, Self::Error>> + Send>>;

    fn poll_ready(&mut self, _cx: &mut Context<'_>) -> Poll<Result<(), AppError>> {
        Poll::Ready(Ok(()))
    }

    fn call(&mut self, request: IndexedRow) -> Self::Future {
        let processor = self.clone();

        Box::pin(async move { Ok(processor.process(request).await) })
    }
}

#[cfg(test)]
pub(crate) mod tests {
    use std::collections::HashMap;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::time::Duration;

    use async_trait::async_trait;
    use image::{DynamicImage, Rgb, RgbImage};
    use tower::ServiceExt;

    use super::*;

    /// Serves canned images, optionally after a delay, and tracks how many
    /// fetches are in flight.
    #[derive(Default)]
    pub(crate) struct StubFetcher {
        images: HashMap<String, (DynamicImage, Duration)>,
        in_flight: AtomicUsize,
        pub(crate) peak_in_flight: AtomicUsize,
    }

    impl StubFetcher {
        pub(crate) fn with_image(mut self, url: &str, image: RgbImage, delay: Duration) -> Self {
            self.images
                .insert(url.to_string(), (DynamicImage::ImageRgb8(image), delay));
            self
        }
    }

    #[async_trait]
    impl ImageFetcher for StubFetcher {
        async fn fetch(&self, url: &str) -> Result<DynamicImage, FetchError> {
            let now = self.in_flight.fetch_add(1, Ordering::SeqCst) + 1;
            self.peak_in_flight.fetch_max(now, Ordering::SeqCst);

            let result = match self.images.get(url) {
                Some((image, delay)) => {
                    tokio::time::sleep(*delay).await;
                    Ok(image.clone())
                }
                None => Err(FetchError::Worker(format!("no image for {url}"))),
            };

            self.in_flight.fetch_sub(1, Ordering::SeqCst);
            result
        }
    }

    fn processor(fetcher: StubFetcher) -> RowProcessor {
        RowProcessor::new(Arc::new(fetcher), BlueExtractor::default(), 800)
    }

    fn request(row: CatalogRow) -> IndexedRow {
        IndexedRow { index: 3, row }
    }

    #[tokio::test]
    async fn formats_blue_summary() {
        let image = RgbImage::from_fn(10, 10, |x, _| {
            if x < 8 {
                Rgb([30, 60, 200])
            } else {
                Rgb([0, 0, 250])
            }
        });
        let fetcher = StubFetcher::default().with_image("a.jpg", image, Duration::ZERO);
        let row = CatalogRow::new("7", "ceramic", "a.jpg");

        let processed = processor(fetcher).oneshot(request(row)).await.unwrap();

        assert_eq!(processed.index, 3);
        assert_eq!(processed.row.id, "7");
        assert_eq!(processed.row.item_type, "ceramic");
        assert_eq!(processed.row.url, "a.jpg");
        assert_eq!(
            processed.row.rgb_color,
            "rgb(0, 32, 192): 0.80; rgb(0, 0, 224): 0.20"
        );
        assert_eq!(
            processed.outcome,
            RowOutcome::Completed {
                shades: 2,
                source: Some(PopulationSource::Classifier)
            }
        );
    }

    #[tokio::test]
    async fn blank_url_is_skipped() {
        let processed = processor(StubFetcher::default())
            .process(request(CatalogRow::new("1", "textile", "  ")))
            .await;

        assert_eq!(processed.outcome, RowOutcome::Skipped);
        assert_eq!(processed.row.rgb_color, "");
        assert_eq!(processed.row.url, "  ");
    }

    #[tokio::test]
    async fn fetch_failure_yields_empty_color() {
        let processed = processor(StubFetcher::default())
            .process(request(CatalogRow::new("1", "textile", "missing.jpg")))
            .await;

        assert!(matches!(processed.outcome, RowOutcome::Failed(_)));
        assert_eq!(processed.row.rgb_color, "");
        assert_eq!(processed.row.id, "1");
    }

    #[tokio::test]
    async fn image_without_blue_completes_with_empty_color() {
        let image = RgbImage::from_pixel(5, 5, Rgb([200, 30, 30]));
        let fetcher = StubFetcher::default().with_image("red.jpg", image, Duration::ZERO);

        let processed = processor(fetcher)
            .process(request(CatalogRow::new("1", "textile", "red.jpg")))
            .await;

        assert_eq!(
            processed.outcome,
            RowOutcome::Completed {
                shades: 0,
                source: None
            }
        );
        assert_eq!(processed.row.rgb_color, "");
    }
}
