use image::Rgb;
use serde::{Deserialize, Serialize};

use super::hsv::Hsv;

/// Thresholds for the per-pixel blue test.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ClassifierConfig {
    /// Inclusive hue window in degrees.
    pub hue_min: f64,
    pub hue_max: f64,
    /// Saturation must be strictly above this.
    pub min_saturation: f64,
    /// Value must be strictly above this.
    pub min_value: f64,
}

impl Default for ClassifierConfig {
    fn default() -> Self {
        Self {
            hue_min: 200.0,
            hue_max: 260.0,
            min_saturation: 0.05,
            min_value: 0.15,
        }
    }
}

/// Decides whether a single pixel reads as blue.
///
/// A pixel is blue when its hue falls inside the window, it carries some
/// color, it is not too dark, and its blue channel strictly dominates both
/// red and green. There is no grayscale rule here; population level
/// fallbacks live in [`BlueExtractor`](super::BlueExtractor).
#[derive(Debug, Clone, Default)]
pub struct BlueClassifier {
    config: ClassifierConfig,
}

impl BlueClassifier {
    pub fn new(config: ClassifierConfig) -> Self {
        Self { config }
    }

    pub fn config(&self) -> &ClassifierConfig {
        &self.config
    }

    pub fn is_blue(&self, pixel: &Rgb<u8>) -> bool {
        let [r, g, b] = pixel.0;
        if b <= r || b <= g {
            return false;
        }

        let hsv = Hsv::from_rgb(r, g, b);
        self.in_hue_window(hsv.hue)
            && hsv.saturation > self.config.min_saturation
            && hsv.value > self.config.min_value
    }

    pub fn in_hue_window(&self, hue: f64) -> bool {
        (self.config.hue_min..=self.config.hue_max).contains(&hue)
    }
}

/// [`BlueClassifier::is_blue`] with the default thresholds.
pub fn is_blue(pixel: &Rgb<u8>) -> bool {
    BlueClassifier::default().is_blue(pixel)
}
