use image::GrayImage;
use imageproc::contours::Contour;

/// Binary mask: 255 where a pixel passed a color test, 0 elsewhere
/// Dimensions match the image the mask was computed from
pub type Mask = GrayImage;

/// Value written into a mask for selected pixels
pub const MASK_ON: u8 = 255;

/// Result of measuring one masked region of interest
#[derive(Debug, Clone)]
pub struct Measurement {
    /// Number of pixels inside the dark range
    pub area: u64,

    /// Outer boundaries of the dark regions, in ROI coordinates
    pub contours: Vec<Contour<i32>>,
}
