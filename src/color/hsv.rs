use image::Rgb;
use serde::Serialize;

/// Hue in degrees `[0, 360)`, saturation and value in `[0, 1]`.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct Hsv {
    pub hue: f64,
    pub saturation: f64,
    pub value: f64,
}

impl Hsv {
    /// Hue is derived from the integer channel differences with a single
    /// division, so hues that are whole degrees come out exact.
    pub fn from_rgb(r: u8, g: u8, b: u8) -> Self {
        let (r, g, b) = (i32::from(r), i32::from(g), i32::from(b));

        let max = r.max(g).max(b);
        let min = r.min(g).min(b);
        let delta = max - min;

        // hue = 60 * sector / delta, sector in [0, 6 * delta)
        let sector = if delta == 0 {
            0
        } else if max == r {
            (g - b).rem_euclid(6 * delta)
        } else if max == g {
            2 * delta + b - r
        } else {
            4 * delta + r - g
        };

        let hue = if delta == 0 {
            0.0
        } else {
            f64::from(60 * sector) / f64::from(delta)
        };
        let saturation = if max == 0 {
            0.0
        } else {
            f64::from(delta) / f64::from(max)
        };

        Self {
            hue,
            saturation,
            value: f64::from(max) / 255.0,
        }
    }
}

impl From<&Rgb<u8>> for Hsv {
    fn from(pixel: &Rgb<u8>) -> Self {
        let [r, g, b] = pixel.0;
        Self::from_rgb(r, g, b)
    }
}

impl From<Rgb<u8>> for Hsv {
    fn from(pixel: Rgb<u8>) -> Self {
        Self::from(&pixel)
    }
}
