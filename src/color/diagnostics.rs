use image::{Rgb, RgbImage};
use serde::Serialize;

use super::extractor::{bucket_counts, proportions, BlueExtractor};
use super::hsv::Hsv;
use super::quantize::Bucket;

const TOP_BUCKETS: usize = 20;
const COVERAGE_THRESHOLDS: [f64; 5] = [0.01, 0.02, 0.03, 0.05, 0.10];

/// Min/max of each HSV component over a set of pixels.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct HsvRange {
    pub hue: (f64, f64),
    pub saturation: (f64, f64),
    pub value: (f64, f64),
}

impl HsvRange {
    fn of(values: impl IntoIterator<Item = Hsv>) -> Option<Self> {
        values.into_iter().fold(None, |range, hsv| {
            Some(match range {
                None => Self {
                    hue: (hsv.hue, hsv.hue),
                    saturation: (hsv.saturation, hsv.saturation),
                    value: (hsv.value, hsv.value),
                },
                Some(range) => Self {
                    hue: widen(range.hue, hsv.hue),
                    saturation: widen(range.saturation, hsv.saturation),
                    value: widen(range.value, hsv.value),
                },
            })
        })
    }
}

fn widen((min, max): (f64, f64), sample: f64) -> (f64, f64) {
    (min.min(sample), max.max(sample))
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct HueWindowStats {
    pub pixels: usize,
    pub mean_saturation: f64,
    pub mean_value: f64,
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct BucketShare {
    pub color: Bucket,
    pub count: usize,
    pub proportion: f64,
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct ThresholdCoverage {
    pub threshold: f64,
    pub buckets: usize,
    /// Share of the blue pixels that fall into the retained buckets.
    pub coverage: f64,
}

/// Why an image did or did not produce blue shades.
///
/// Used by the `inspect` command when tuning the classifier against a
/// problem image.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ImageDiagnostics {
    pub width: u32,
    pub height: u32,
    pub total_pixels: usize,
    /// Pixels passing the classifier.
    pub blue_pixels: usize,
    pub blue_ratio: f64,
    pub blue_hsv: Option<HsvRange>,
    /// Pixels where blue strictly exceeds red and green, regardless of hue.
    pub dominant_pixels: usize,
    pub dominant_hsv: Option<HsvRange>,
    pub dominant_in_hue_window: Option<HueWindowStats>,
    pub all_hsv: Option<HsvRange>,
    pub bucket_step: u8,
    pub top_buckets: Vec<BucketShare>,
    pub coverage: Vec<ThresholdCoverage>,
    /// The summary the extractor would write for this image.
    pub summary: String,
}

impl ImageDiagnostics {
    pub fn analyze(extractor: &BlueExtractor, image: &RgbImage) -> Self {
        let classifier = extractor.classifier();
        let pixels: Vec<Rgb<u8>> = image.pixels().copied().collect();
        let total_pixels = pixels.len();

        let blue: Vec<Rgb<u8>> = pixels
            .iter()
            .filter(|pixel| classifier.is_blue(pixel))
            .copied()
            .collect();

        let dominant: Vec<Hsv> = pixels
            .iter()
            .filter(|pixel| {
                let [r, g, b] = pixel.0;
                b > r && b > g
            })
            .map(Hsv::from)
            .collect();

        let in_window: Vec<&Hsv> = dominant
            .iter()
            .filter(|hsv| classifier.in_hue_window(hsv.hue))
            .collect();
        let dominant_in_hue_window = (!in_window.is_empty()).then(|| {
            let n = in_window.len() as f64;
            HueWindowStats {
                pixels: in_window.len(),
                mean_saturation: in_window.iter().map(|hsv| hsv.saturation).sum::<f64>() / n,
                mean_value: in_window.iter().map(|hsv| hsv.value).sum::<f64>() / n,
            }
        });

        let bucket_step = extractor.config().bucket_step;
        let counts = bucket_counts(&blue, bucket_step);

        let mut top_buckets: Vec<BucketShare> = counts
            .iter()
            .map(|(bucket, count)| BucketShare {
                color: *bucket,
                count: *count,
                proportion: *count as f64 / blue.len() as f64,
            })
            .collect();
        top_buckets.sort_by(|a, b| b.count.cmp(&a.count).then(a.color.cmp(&b.color)));
        top_buckets.truncate(TOP_BUCKETS);

        let coverage = COVERAGE_THRESHOLDS
            .iter()
            .map(|&threshold| {
                let retained: Vec<f64> = proportions(&counts, blue.len())
                    .map(|(_, proportion)| proportion)
                    .filter(|proportion| *proportion >= threshold)
                    .collect();
                ThresholdCoverage {
                    threshold,
                    buckets: retained.len(),
                    coverage: retained.iter().sum(),
                }
            })
            .collect();

        Self {
            width: image.width(),
            height: image.height(),
            total_pixels,
            blue_pixels: blue.len(),
            blue_ratio: if total_pixels == 0 {
                0.0
            } else {
                blue.len() as f64 / total_pixels as f64
            },
            blue_hsv: HsvRange::of(blue.iter().map(Hsv::from)),
            dominant_pixels: dominant.len(),
            dominant_hsv: HsvRange::of(dominant.iter().copied()),
            dominant_in_hue_window,
            all_hsv: HsvRange::of(pixels.iter().map(Hsv::from)),
            bucket_step,
            top_buckets,
            coverage,
            summary: extractor.extract(image).to_summary(),
        }
    }
}
