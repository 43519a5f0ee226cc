use std::fmt;

use image::Rgb;
use serde::Serialize;

/// A color cell: every channel floored to a multiple of the quantization step.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize)]
pub struct Bucket {
    pub r: u8,
    pub g: u8,
    pub b: u8,
}

impl Bucket {
    /// Floors each channel with integer division, so 255 at step 32 lands on
    /// 224. `step` must be non-zero.
    pub fn quantize(pixel: &Rgb<u8>, step: u8) -> Self {
        let [r, g, b] = pixel.0;
        Self {
            r: floor_to_step(r, step),
            g: floor_to_step(g, step),
            b: floor_to_step(b, step),
        }
    }

    pub fn to_rgb(self) -> Rgb<u8> {
        Rgb([self.r, self.g, self.b])
    }
}

fn floor_to_step(channel: u8, step: u8) -> u8 {
    (channel / step) * step
}

impl From<Bucket> for Rgb<u8> {
    fn from(bucket: Bucket) -> Self {
        bucket.to_rgb()
    }
}

impl fmt::Display for Bucket {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "rgb({}, {}, {})", self.r, self.g, self.b)
    }
}
