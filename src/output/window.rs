use super::{Control, FrameSink};
use anyhow::{Context, Result};
use image::RgbImage;
use minifb::{Key, KeyRepeat, Scale, ScaleMode, Window, WindowOptions};

/// Live preview of annotated frames
///
/// `q`, Escape or closing the window asks the pipeline to stop.
pub struct PreviewWindow {
    window: Window,
    title: String,
    buffer: Vec<u32>,
}

impl PreviewWindow {
    pub fn new(title: &str, width: u32, height: u32) -> Result<Self> {
        tracing::info!("Opening preview window ({}x{})", width, height);

        let mut window = Window::new(
            title,
            width as usize,
            height as usize,
            WindowOptions {
                resize: true,
                scale: Scale::FitScreen,
                scale_mode: ScaleMode::AspectRatioStretch,
                ..WindowOptions::default()
            },
        )
        .context("Failed to open preview window")?;
        window.set_target_fps(60);

        Ok(Self {
            window,
            title: title.to_string(),
            buffer: Vec::new(),
        })
    }

    /// Pack RGB pixels into minifb's 0RGB words
    fn fill_buffer(&mut self, frame: &RgbImage) {
        self.buffer.clear();
        self.buffer.extend(frame.pixels().map(|p| {
            (u32::from(p[0]) << 16) | (u32::from(p[1]) << 8) | u32::from(p[2])
        }));
    }
}

impl FrameSink for PreviewWindow {
    fn show(&mut self, frame: &RgbImage, area: u64) -> Result<Control> {
        if !self.window.is_open() {
            return Ok(Control::Quit);
        }

        self.fill_buffer(frame);
        let (width, height) = frame.dimensions();

        self.window
            .set_title(&format!("{} - SOAP AREA: {} pixels", self.title, area));
        self.window
            .update_with_buffer(&self.buffer, width as usize, height as usize)
            .context("Failed to update preview window")?;

        let quit = !self.window.is_open()
            || self.window.is_key_pressed(Key::Q, KeyRepeat::No)
            || self.window.is_key_down(Key::Escape);

        Ok(if quit { Control::Quit } else { Control::Continue })
    }
}
