use crate::error::AnalysisError;
use image::{imageops, RgbImage};
use std::fmt;
use std::str::FromStr;

/// Fixed rectangular window of each frame that gets analyzed
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Roi {
    pub x: u32,
    pub y: u32,
    pub width: u32,
    pub height: u32,
}

impl Roi {
    pub const fn new(x: u32, y: u32, width: u32, height: u32) -> Self {
        Self {
            x,
            y,
            width,
            height,
        }
    }

    /// Region covering a whole `width` x `height` frame
    pub const fn full(width: u32, height: u32) -> Self {
        Self::new(0, 0, width, height)
    }

    /// Ensure the region lies entirely within a frame of the given size
    pub fn check_bounds(&self, frame_width: u32, frame_height: u32) -> Result<(), AnalysisError> {
        let right = self.x.checked_add(self.width);
        let bottom = self.y.checked_add(self.height);

        match (right, bottom) {
            (Some(right), Some(bottom)) if right <= frame_width && bottom <= frame_height => Ok(()),
            _ => Err(AnalysisError::RegionOutOfBounds {
                roi: *self,
                frame_width,
                frame_height,
            }),
        }
    }

    /// Copy the region out of a frame
    pub fn crop(&self, frame: &RgbImage) -> Result<RgbImage, AnalysisError> {
        let _span = tracing::debug_span!("crop").entered();

        let (width, height) = frame.dimensions();
        self.check_bounds(width, height)?;

        Ok(imageops::crop_imm(frame, self.x, self.y, self.width, self.height).to_image())
    }
}

impl fmt::Display for Roi {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        // same form FromStr accepts
        write!(f, "{},{},{},{}", self.x, self.y, self.width, self.height)
    }
}

impl FromStr for Roi {
    type Err = AnalysisError;

    /// Parse `x,y,width,height`
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let values = s
            .split(',')
            .map(|part| {
                part.trim()
                    .parse::<u32>()
                    .map_err(|e| AnalysisError::InvalidRegion(format!("'{part}' in '{s}': {e}")))
            })
            .collect::<Result<Vec<_>, _>>()?;

        let [x, y, width, height] = values[..] else {
            return Err(AnalysisError::InvalidRegion(format!(
                "expected x,y,width,height but got '{s}'"
            )));
        };

        if width == 0 || height == 0 {
            return Err(AnalysisError::InvalidRegion(format!(
                "region '{s}' is empty"
            )));
        }

        Ok(Self::new(x, y, width, height))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use image::Rgb;

    fn gradient(width: u32, height: u32) -> RgbImage {
        RgbImage::from_fn(width, height, |x, y| Rgb([x as u8, y as u8, (x + y) as u8]))
    }

    #[test]
    fn full_frame_crop_is_identical() {
        let frame = gradient(32, 24);
        let cropped = Roi::full(32, 24).crop(&frame).unwrap();

        assert_eq!(cropped, frame);
    }

    #[test]
    fn crop_takes_the_requested_window() {
        let frame = gradient(32, 24);
        let cropped = Roi::new(5, 7, 10, 4).crop(&frame).unwrap();

        assert_eq!(cropped.dimensions(), (10, 4));
        assert_eq!(cropped.get_pixel(0, 0), frame.get_pixel(5, 7));
        assert_eq!(cropped.get_pixel(9, 3), frame.get_pixel(14, 10));
    }

    #[test]
    fn rejects_regions_past_the_frame_edge() {
        assert!(Roi::new(0, 0, 32, 24).check_bounds(32, 24).is_ok());
        assert!(Roi::new(1, 0, 32, 24).check_bounds(32, 24).is_err());
        assert!(Roi::new(0, 20, 8, 5).check_bounds(32, 24).is_err());
        assert!(Roi::new(u32::MAX, 0, 2, 2).check_bounds(32, 24).is_err());

        let err = Roi::new(1200, 1100, 775, 775)
            .crop(&gradient(64, 64))
            .unwrap_err();
        assert!(matches!(err, AnalysisError::RegionOutOfBounds { frame_width: 64, .. }));
    }

    #[test]
    fn parses_rectangles() {
        assert_eq!(
            "1200, 1100,775,775".parse::<Roi>().unwrap(),
            Roi::new(1200, 1100, 775, 775)
        );
        assert!("1,2,3".parse::<Roi>().is_err());
        assert!("1,2,0,4".parse::<Roi>().is_err());
        assert!("a,2,3,4".parse::<Roi>().is_err());
    }

    #[test]
    fn display_parses_back() {
        let roi = Roi::new(1200, 1100, 775, 775);

        assert_eq!(roi.to_string(), "1200,1100,775,775");
        assert_eq!(roi.to_string().parse::<Roi>().unwrap(), roi);

        let err = roi.check_bounds(64, 48).unwrap_err();
        assert_eq!(
            err.to_string(),
            "region 1200,1100,775,775 does not fit inside a 64x48 frame"
        );
    }
}
