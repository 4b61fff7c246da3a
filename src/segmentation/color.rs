use super::hsv::{convert_to_hsv, HsvRange};
use super::types::{Mask, MASK_ON};
use image::{Luma, Rgb, RgbImage};

/// Mark every pixel of an HSV image that falls inside `range`
pub fn in_range(hsv: &RgbImage, range: &HsvRange) -> Mask {
    let (width, height) = hsv.dimensions();
    Mask::from_fn(width, height, |x, y| {
        if range.contains(hsv.get_pixel(x, y)) {
            Luma([MASK_ON])
        } else {
            Luma([0])
        }
    })
}

/// Keep the pixels of `image` selected by `mask` and zero the rest
pub fn apply_mask(image: &RgbImage, mask: &Mask) -> RgbImage {
    let mut masked = image.clone();
    for (pixel, keep) in masked.pixels_mut().zip(mask.pixels()) {
        if keep[0] == 0 {
            *pixel = Rgb([0, 0, 0]);
        }
    }
    masked
}

/// Isolates the pixels of the tracked object's surface color
#[derive(Debug, Clone, Copy)]
pub struct ColorSegmenter {
    range: HsvRange,
}

impl ColorSegmenter {
    pub fn new(range: HsvRange) -> Self {
        Self { range }
    }

    /// Mask of pixels whose HSV value lies inside the surface range
    pub fn mask(&self, image: &RgbImage) -> Mask {
        in_range(&convert_to_hsv(image), &self.range)
    }

    /// Copy of `image` with every pixel outside the surface range zeroed
    pub fn isolate(&self, image: &RgbImage) -> RgbImage {
        let _span = tracing::debug_span!("segment").entered();

        let mask = self.mask(image);
        apply_mask(image, &mask)
    }
}
