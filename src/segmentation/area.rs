use super::color::in_range;
use super::contours::find_external_contours;
use super::hsv::{convert_to_hsv, HsvRange};
use super::types::{Mask, Measurement};
use image::RgbImage;

/// Counts the dark pixels left after segmentation
///
/// Pixels zeroed by the segmenter count as dark too, so the area grows
/// with everything outside the surface color range plus any genuinely
/// dark material.
#[derive(Debug, Clone, Copy, Default)]
pub struct AreaMeasurer {
    dark: HsvRange,
}

impl AreaMeasurer {
    pub fn new(dark: HsvRange) -> Self {
        Self { dark }
    }

    /// Mask of the pixels inside the dark range
    pub fn dark_mask(&self, masked: &RgbImage) -> Mask {
        in_range(&convert_to_hsv(masked), &self.dark)
    }

    /// Count the dark pixels and trace their outer boundaries
    pub fn measure(&self, masked: &RgbImage) -> Measurement {
        let _span = tracing::debug_span!("measure").entered();

        let mask = self.dark_mask(masked);
        Measurement {
            area: count_non_zero(&mask),
            contours: find_external_contours(&mask),
        }
    }
}

/// Number of set pixels in a mask
pub fn count_non_zero(mask: &Mask) -> u64 {
    mask.pixels().filter(|p| p[0] != 0).count() as u64
}

#[cfg(test)]
mod tests {
    use super::*;
    use image::Rgb;

    fn solid(width: u32, height: u32, color: [u8; 3]) -> RgbImage {
        RgbImage::from_pixel(width, height, Rgb(color))
    }

    #[test]
    fn all_black_region_is_fully_counted() {
        let measurement = AreaMeasurer::default().measure(&solid(40, 25, [0, 0, 0]));

        assert_eq!(measurement.area, 40 * 25);
        assert_eq!(measurement.contours.len(), 1);
    }

    #[test]
    fn all_white_region_has_no_area() {
        let measurement = AreaMeasurer::default().measure(&solid(40, 25, [255, 255, 255]));

        assert_eq!(measurement.area, 0);
        assert!(measurement.contours.is_empty());
    }

    #[test]
    fn area_matches_a_naive_scan() {
        // pseudo-random pattern with values straddling the dark threshold
        let image = RgbImage::from_fn(64, 48, |x, y| {
            let n = (x * 7919 + y * 104729 + x * y * 31) % 97;
            let v = (n as u8).wrapping_mul(3);
            Rgb([v, v / 2, v / 3])
        });
        let measurer = AreaMeasurer::default();

        let naive = image
            .pixels()
            .filter(|p| p.0.iter().copied().max().unwrap_or(0) <= 50)
            .count() as u64;

        assert_eq!(measurer.measure(&image).area, naive);
        assert_eq!(count_non_zero(&measurer.dark_mask(&image)), naive);
    }

    #[test]
    fn custom_dark_range_is_respected() {
        use crate::segmentation::HsvColor;

        let image = solid(10, 10, [60, 60, 60]);
        assert_eq!(AreaMeasurer::default().measure(&image).area, 0);

        let wider = AreaMeasurer::new(HsvRange::new(
            HsvColor::new(0, 0, 0),
            HsvColor::new(180, 255, 60),
        ));
        assert_eq!(wider.measure(&image).area, 100);
    }
}
