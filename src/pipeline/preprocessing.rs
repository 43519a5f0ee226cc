use image::imageops::{self, FilterType};
use image::{DynamicImage, RgbImage};

/// Drops alpha and shrinks the image so its longer side is at most
/// `max_dimension`.
pub fn prepare(image: DynamicImage, max_dimension: u32) -> RgbImage {
    downsample(image.into_rgb8(), max_dimension)
}

/// Lanczos3 resize keeping the aspect ratio. The shorter side is floored.
pub fn downsample(image: RgbImage, max_dimension: u32) -> RgbImage {
    let (width, height) = image.dimensions();
    let longest = width.max(height);
    if longest <= max_dimension {
        return image;
    }

    let ratio = max_dimension as f64 / longest as f64;
    let scale = |side: u32| ((side as f64 * ratio) as u32).clamp(1, max_dimension);
    let (new_width, new_height) = if width >= height {
        (max_dimension, scale(height))
    } else {
        (scale(width), max_dimension)
    };

    imageops::resize(&image, new_width, new_height, FilterType::Lanczos3)
}

#[cfg(test)]
mod tests {
    use super::*;
    use image::{Rgb, Rgba, RgbaImage};

    #[test]
    fn small_images_are_untouched() {
        let image = RgbImage::from_pixel(640, 480, Rgb([1, 2, 3]));
        let prepared = downsample(image.clone(), 800);
        assert_eq!(prepared, image);
    }

    #[test]
    fn caps_the_longer_side() {
        let wide = downsample(RgbImage::new(3000, 1000), 800);
        assert_eq!(wide.dimensions(), (800, 266));

        let tall = downsample(RgbImage::new(1000, 1600), 800);
        assert_eq!(tall.dimensions(), (500, 800));

        let sliver = downsample(RgbImage::new(5000, 2), 800);
        assert_eq!(sliver.dimensions(), (800, 1));
    }

    #[test]
    fn solid_color_survives_resampling() {
        let image = RgbImage::from_pixel(1200, 900, Rgb([30, 60, 200]));
        let prepared = downsample(image, 800);
        assert!(prepared.pixels().all(|pixel| *pixel == Rgb([30, 60, 200])));
    }

    #[test]
    fn alpha_is_dropped() {
        let image = DynamicImage::ImageRgba8(RgbaImage::from_pixel(4, 4, Rgba([0, 0, 255, 10])));
        let prepared = prepare(image, 800);
        assert_eq!(prepared.get_pixel(0, 0), &Rgb([0, 0, 255]));
    }
}
