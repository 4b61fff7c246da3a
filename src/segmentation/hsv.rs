use crate::error::AnalysisError;
use image::{Rgb, RgbImage};
use std::fmt;
use std::str::FromStr;

/// Hue is stored on the 8-bit 0-180 scale (degrees / 2)
pub const HUE_RANGE: i32 = 180;

const HSV_SHIFT: u32 = 12;
const HSV_ROUND: i32 = 1 << (HSV_SHIFT - 1);

/// A color in 8-bit HSV space
///
/// Hue runs 0-180 (degrees halved so it fits in a byte), saturation and
/// value run 0-255. Range literals such as `0,0,50` use this scale.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct HsvColor {
    pub h: u8,
    pub s: u8,
    pub v: u8,
}

impl HsvColor {
    pub const fn new(h: u8, s: u8, v: u8) -> Self {
        Self { h, s, v }
    }
}

impl fmt::Display for HsvColor {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{},{},{}", self.h, self.s, self.v)
    }
}

impl FromStr for HsvColor {
    type Err = AnalysisError;

    /// Parse `h,s,v`
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let parts: Vec<&str> = s.split(',').map(str::trim).collect();
        let [h, sat, v] = parts[..] else {
            return Err(AnalysisError::InvalidColor(format!(
                "expected h,s,v but got '{s}'"
            )));
        };

        let channel = |raw: &str| {
            raw.parse::<u8>()
                .map_err(|e| AnalysisError::InvalidColor(format!("'{raw}' in '{s}': {e}")))
        };
        let h = channel(h)?;
        if i32::from(h) > HUE_RANGE {
            return Err(AnalysisError::InvalidColor(format!(
                "hue {h} exceeds {HUE_RANGE}"
            )));
        }

        Ok(Self::new(h, channel(sat)?, channel(v)?))
    }
}

/// Inclusive lower/upper bounds in HSV space
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct HsvRange {
    pub lower: HsvColor,
    pub upper: HsvColor,
}

impl HsvRange {
    /// Near-black: any hue, any saturation, value up to 50
    pub const DARK: HsvRange = HsvRange::new(HsvColor::new(0, 0, 0), HsvColor::new(180, 255, 50));

    pub const fn new(lower: HsvColor, upper: HsvColor) -> Self {
        Self { lower, upper }
    }

    /// True when every channel lies within its bounds, bounds included
    #[inline]
    pub fn contains(&self, hsv: &Rgb<u8>) -> bool {
        let [h, s, v] = hsv.0;
        (self.lower.h..=self.upper.h).contains(&h)
            && (self.lower.s..=self.upper.s).contains(&s)
            && (self.lower.v..=self.upper.v).contains(&v)
    }
}

impl Default for HsvRange {
    fn default() -> Self {
        Self::DARK
    }
}

impl fmt::Display for HsvRange {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "[{}]..=[{}]", self.lower, self.upper)
    }
}

/// Convert one RGB pixel to 8-bit HSV
///
/// Fixed-point arithmetic with 12 fractional bits, the same rounding the
/// usual 8-bit BGR->HSV routines use, so thresholds picked with their
/// color pickers carry over unchanged.
#[inline]
pub fn rgb_to_hsv(pixel: &Rgb<u8>) -> Rgb<u8> {
    let [r, g, b] = pixel.0.map(i32::from);

    let v = r.max(g).max(b);
    let diff = v - r.min(g).min(b);

    let s = (diff * saturation_divisor(v) + HSV_ROUND) >> HSV_SHIFT;

    let h = if v == r {
        g - b
    } else if v == g {
        b - r + 2 * diff
    } else {
        r - g + 4 * diff
    };
    let mut h = (h * hue_divisor(diff) + HSV_ROUND) >> HSV_SHIFT;
    if h < 0 {
        h += HUE_RANGE;
    }

    Rgb([h as u8, s as u8, v as u8])
}

/// Convert a whole image, storing H, S, V in the three channels
pub fn convert_to_hsv(image: &RgbImage) -> RgbImage {
    let _span = tracing::debug_span!("convert_to_hsv").entered();

    let mut hsv = image.clone();
    for pixel in hsv.pixels_mut() {
        *pixel = rgb_to_hsv(pixel);
    }
    hsv
}

fn saturation_divisor(v: i32) -> i32 {
    if v == 0 {
        return 0;
    }
    (f64::from(255 << HSV_SHIFT) / f64::from(v)).round() as i32
}

fn hue_divisor(diff: i32) -> i32 {
    if diff == 0 {
        return 0;
    }
    (f64::from(HUE_RANGE << HSV_SHIFT) / (6.0 * f64::from(diff))).round() as i32
}
