use super::FrameSource;
use crate::error::AnalysisError;
use anyhow::{Context, Result};
use image::RgbImage;
use std::collections::VecDeque;
use std::path::{Path, PathBuf};

const FRAME_EXTENSIONS: &[&str] = &["png", "jpg", "jpeg", "bmp", "tif", "tiff"];

/// Directory of still frames, played back in file-name order
pub struct ImageSequence {
    frames: VecDeque<PathBuf>,
    width: u32,
    height: u32,
}

impl ImageSequence {
    pub fn open<P: AsRef<Path>>(dir: P) -> Result<Self, AnalysisError> {
        let dir = dir.as_ref();
        let unavailable = |reason: String| AnalysisError::SourceUnavailable {
            path: dir.to_path_buf(),
            reason,
        };

        let entries = std::fs::read_dir(dir).map_err(|e| unavailable(e.to_string()))?;

        let mut frames: Vec<PathBuf> = entries
            .filter_map(|entry| entry.ok().map(|e| e.path()))
            .filter(|path| path.is_file() && is_frame_file(path))
            .collect();
        frames.sort();

        let first = frames
            .first()
            .ok_or_else(|| unavailable("directory contains no frame images".to_string()))?;
        let (width, height) =
            image::image_dimensions(first).map_err(|e| unavailable(e.to_string()))?;

        tracing::info!(
            "Opened image sequence {} ({} frames, {}x{})",
            dir.display(),
            frames.len(),
            width,
            height
        );

        Ok(Self {
            frames: frames.into(),
            width,
            height,
        })
    }
}

fn is_frame_file(path: &Path) -> bool {
    path.extension()
        .and_then(|ext| ext.to_str())
        .map(|ext| FRAME_EXTENSIONS.contains(&ext.to_ascii_lowercase().as_str()))
        .unwrap_or(false)
}

impl FrameSource for ImageSequence {
    fn next_frame(&mut self) -> Result<Option<RgbImage>> {
        let Some(path) = self.frames.pop_front() else {
            return Ok(None);
        };

        let frame = image::open(&path)
            .with_context(|| format!("Failed to decode frame {}", path.display()))?
            .to_rgb8();

        if frame.dimensions() != (self.width, self.height) {
            anyhow::bail!(
                "frame {} is {}x{}, expected {}x{}",
                path.display(),
                frame.width(),
                frame.height(),
                self.width,
                self.height
            );
        }

        Ok(Some(frame))
    }

    fn resolution(&self) -> (u32, u32) {
        (self.width, self.height)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use image::Rgb;

    fn write_frame(dir: &Path, name: &str, shade: u8) {
        write_sized_frame(dir, name, 6, 4, shade);
    }

    fn write_sized_frame(dir: &Path, name: &str, width: u32, height: u32, shade: u8) {
        RgbImage::from_pixel(width, height, Rgb([shade, shade, shade]))
            .save(dir.join(name))
            .unwrap();
    }

    #[test]
    fn plays_frames_in_name_order() {
        let dir = tempfile::tempdir().unwrap();
        write_frame(dir.path(), "frame_002.png", 20);
        write_frame(dir.path(), "frame_000.png", 0);
        write_frame(dir.path(), "frame_001.png", 10);
        std::fs::write(dir.path().join("notes.txt"), "not a frame").unwrap();

        let mut source = ImageSequence::open(dir.path()).unwrap();
        assert_eq!(source.resolution(), (6, 4));

        let mut shades = Vec::new();
        while let Some(frame) = source.next_frame().unwrap() {
            shades.push(frame.get_pixel(0, 0)[0]);
        }
        assert_eq!(shades, vec![0, 10, 20]);
        assert!(source.next_frame().unwrap().is_none());
    }

    #[test]
    fn empty_directory_is_unavailable() {
        let dir = tempfile::tempdir().unwrap();

        let err = ImageSequence::open(dir.path()).err().unwrap();
        assert!(matches!(err, AnalysisError::SourceUnavailable { .. }));
    }

    #[test]
    fn unreadable_frame_is_an_error() {
        let dir = tempfile::tempdir().unwrap();
        write_frame(dir.path(), "a.png", 0);
        std::fs::write(dir.path().join("b.png"), b"garbage").unwrap();

        let mut source = ImageSequence::open(dir.path()).unwrap();
        assert!(source.next_frame().unwrap().is_some());
        assert!(source.next_frame().is_err());
    }

    #[test]
    fn frame_of_another_size_is_an_error() {
        let dir = tempfile::tempdir().unwrap();
        write_frame(dir.path(), "a.png", 0);
        write_sized_frame(dir.path(), "b.png", 3, 2, 0);

        let mut source = ImageSequence::open(dir.path()).unwrap();
        assert!(source.next_frame().unwrap().is_some());

        let err = source.next_frame().unwrap_err();
        assert!(err.to_string().contains("3x2, expected 6x4"), "{err}");
    }
}
