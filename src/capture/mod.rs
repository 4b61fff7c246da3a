mod image_sequence;
mod video_file;

pub use image_sequence::ImageSequence;
pub use video_file::VideoFile;

use crate::error::AnalysisError;
use anyhow::Result;
use image::RgbImage;
use std::path::Path;

/// Trait for sequential frame sources
pub trait FrameSource {
    /// Read the next frame, or `None` once the source is exhausted
    fn next_frame(&mut self) -> Result<Option<RgbImage>>;

    /// Get the resolution of the frames this source produces
    fn resolution(&self) -> (u32, u32);
}

impl<S: FrameSource + ?Sized> FrameSource for Box<S> {
    fn next_frame(&mut self) -> Result<Option<RgbImage>> {
        (**self).next_frame()
    }

    fn resolution(&self) -> (u32, u32) {
        (**self).resolution()
    }
}

/// Open a video file, or a directory of still frames
pub fn open_source<P: AsRef<Path>>(path: P) -> Result<Box<dyn FrameSource>, AnalysisError> {
    let path = path.as_ref();

    if !path.exists() {
        return Err(AnalysisError::SourceUnavailable {
            path: path.to_path_buf(),
            reason: "no such file or directory".to_string(),
        });
    }

    if path.is_dir() {
        Ok(Box::new(ImageSequence::open(path)?))
    } else {
        Ok(Box::new(VideoFile::open(path)?))
    }
}
