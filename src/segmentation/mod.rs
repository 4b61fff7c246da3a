mod area;
mod color;
mod contours;
mod hsv;
mod roi;
pub mod types;

pub use area::AreaMeasurer;
pub use color::ColorSegmenter;
pub use contours::translate;
pub use hsv::{HsvColor, HsvRange};
pub use roi::Roi;
pub use types::Measurement;
