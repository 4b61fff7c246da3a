use crate::segmentation::{HsvColor, HsvRange, Roi};

/// Surface color of the tracked object, tuned for a bar of soap in a tub
pub const DEFAULT_LOWER_SURFACE: HsvColor = HsvColor::new(0, 0, 50);
pub const DEFAULT_UPPER_SURFACE: HsvColor = HsvColor::new(180, 255, 115);

pub const DEFAULT_LOWER_DARK: HsvColor = HsvColor::new(0, 0, 0);
pub const DEFAULT_UPPER_DARK: HsvColor = HsvColor::new(180, 255, 50);

pub const DEFAULT_ROI: Roi = Roi::new(1200, 1100, 775, 775);

/// Measurement settings, fixed for the whole run
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct AnalysisConfig {
    /// Colors belonging to the object's visible surface
    pub surface: HsvRange,

    /// Colors counted as area once the surface has been isolated
    pub dark: HsvRange,

    /// Window of each frame that gets analyzed
    pub roi: Roi,
}

impl Default for AnalysisConfig {
    fn default() -> Self {
        Self {
            surface: HsvRange::new(DEFAULT_LOWER_SURFACE, DEFAULT_UPPER_SURFACE),
            dark: HsvRange::new(DEFAULT_LOWER_DARK, DEFAULT_UPPER_DARK),
            roi: DEFAULT_ROI,
        }
    }
}
