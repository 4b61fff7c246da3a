#[cfg(feature = "display")]
mod window;

#[cfg(feature = "display")]
pub use window::PreviewWindow;

use anyhow::Result;
use image::RgbImage;

/// What the viewer asked for after a frame was shown
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Control {
    Continue,
    Quit,
}

/// Trait for destinations of annotated frames
pub trait FrameSink {
    /// Present an annotated frame along with its measured area
    fn show(&mut self, frame: &RgbImage, area: u64) -> Result<Control>;
}
