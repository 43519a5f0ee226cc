use std::collections::HashMap;

use image::{Rgb, RgbImage};
use serde::{Deserialize, Serialize};

use super::classifier::BlueClassifier;
use super::histogram::ColorHistogram;
use super::quantize::Bucket;

/// Threshold used for the single back-off step of [`extract`].
const BACKOFF_THRESHOLD: f64 = 0.03;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ExtractorConfig {
    /// Quantization step per channel. Larger steps give coarser buckets.
    pub bucket_step: u8,
    /// Retain thresholds tried in order. The first one that keeps at least
    /// one bucket wins.
    pub retain_thresholds: Vec<f64>,
    /// Whether the fallback population may contain achromatic pixels
    /// (black, white and pure grays).
    pub fallback_admits_gray: bool,
}

impl Default for ExtractorConfig {
    fn default() -> Self {
        Self {
            bucket_step: 32,
            retain_thresholds: vec![0.05, BACKOFF_THRESHOLD],
            fallback_admits_gray: false,
        }
    }
}

/// Which rule produced the blue population of an image.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum PopulationSource {
    Classifier,
    Fallback,
}

/// Result of one extraction with the bookkeeping needed for logging.
#[derive(Debug, Clone, PartialEq)]
pub struct Extraction {
    pub histogram: ColorHistogram,
    pub total_pixels: usize,
    pub population: usize,
    pub source: Option<PopulationSource>,
    /// Threshold that retained the reported buckets.
    pub threshold: Option<f64>,
}

/// Builds the normalized histogram of dominant blue shades of an image.
#[derive(Debug, Clone, Default)]
pub struct BlueExtractor {
    classifier: BlueClassifier,
    config: ExtractorConfig,
}

impl BlueExtractor {
    pub fn new(classifier: BlueClassifier, config: ExtractorConfig) -> Self {
        Self { classifier, config }
    }

    pub fn classifier(&self) -> &BlueClassifier {
        &self.classifier
    }

    pub fn config(&self) -> &ExtractorConfig {
        &self.config
    }

    pub fn extract(&self, image: &RgbImage) -> ColorHistogram {
        self.extract_detailed(image.pixels().copied()).histogram
    }

    pub fn extract_pixels<I>(&self, pixels: I) -> ColorHistogram
    where
        I: IntoIterator<Item = Rgb<u8>>,
    {
        self.extract_detailed(pixels).histogram
    }

    pub fn extract_detailed<I>(&self, pixels: I) -> Extraction
    where
        I: IntoIterator<Item = Rgb<u8>>,
    {
        let pixels: Vec<Rgb<u8>> = pixels.into_iter().collect();
        let total_pixels = pixels.len();

        let Some((population, source)) = self.blue_population(&pixels) else {
            return Extraction {
                histogram: ColorHistogram::empty(),
                total_pixels,
                population: 0,
                source: None,
                threshold: None,
            };
        };

        let counts = bucket_counts(&population, self.config.bucket_step);
        let (histogram, threshold) = self.retain(&counts, population.len());

        Extraction {
            histogram,
            total_pixels,
            population: population.len(),
            source: Some(source),
            threshold,
        }
    }

    /// Pixels passing the classifier, or, when none do, pixels whose blue
    /// channel is at least as large as red and green. `None` when both are
    /// empty.
    pub fn blue_population(
        &self,
        pixels: &[Rgb<u8>],
    ) -> Option<(Vec<Rgb<u8>>, PopulationSource)> {
        let strict: Vec<Rgb<u8>> = pixels
            .iter()
            .filter(|pixel| self.classifier.is_blue(pixel))
            .copied()
            .collect();
        if !strict.is_empty() {
            return Some((strict, PopulationSource::Classifier));
        }

        let fallback: Vec<Rgb<u8>> = pixels
            .iter()
            .filter(|pixel| self.admitted_by_fallback(pixel))
            .copied()
            .collect();
        if fallback.is_empty() {
            None
        } else {
            Some((fallback, PopulationSource::Fallback))
        }
    }

    fn admitted_by_fallback(&self, pixel: &Rgb<u8>) -> bool {
        let [r, g, b] = pixel.0;
        let blue_leads = b >= r && b >= g;
        let achromatic = r == g && g == b;
        blue_leads && (self.config.fallback_admits_gray || !achromatic)
    }

    fn retain(
        &self,
        counts: &HashMap<Bucket, usize>,
        population: usize,
    ) -> (ColorHistogram, Option<f64>) {
        for &threshold in &self.config.retain_thresholds {
            let retained: Vec<(Bucket, f64)> = proportions(counts, population)
                .filter(|(_, proportion)| *proportion >= threshold)
                .collect();

            if !retained.is_empty() {
                return (ColorHistogram::renormalized(retained), Some(threshold));
            }
        }

        (ColorHistogram::empty(), None)
    }
}

/// Extracts with the default classifier, a single bucket step and one retain
/// threshold, backing off once to 3% when nothing clears it.
///
/// # Panics
///
/// Panics if `bucket_step` is 0.
pub fn extract<I>(pixels: I, bucket_step: u8, retain_threshold: f64) -> ColorHistogram
where
    I: IntoIterator<Item = Rgb<u8>>,
{
    assert!(bucket_step > 0, "bucket step must be greater than 0");

    let mut retain_thresholds = vec![retain_threshold];
    if BACKOFF_THRESHOLD < retain_threshold {
        retain_thresholds.push(BACKOFF_THRESHOLD);
    }

    let config = ExtractorConfig {
        bucket_step,
        retain_thresholds,
        ..ExtractorConfig::default()
    };
    BlueExtractor::new(BlueClassifier::default(), config).extract_pixels(pixels)
}

pub(crate) fn bucket_counts(pixels: &[Rgb<u8>], step: u8) -> HashMap<Bucket, usize> {
    let mut counts = HashMap::new();
    for pixel in pixels {
        *counts.entry(Bucket::quantize(pixel, step)).or_insert(0) += 1;
    }
    counts
}

pub(crate) fn proportions(
    counts: &HashMap<Bucket, usize>,
    population: usize,
) -> impl Iterator<Item = (Bucket, f64)> + '_ {
    counts
        .iter()
        .map(move |(bucket, count)| (*bucket, *count as f64 / population as f64))
}
