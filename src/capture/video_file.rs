use super::FrameSource;
use crate::error::AnalysisError;
use anyhow::{Context, Result};
use image::RgbImage;
use std::ffi::OsString;
use std::io::{BufReader, ErrorKind, Read};
use std::path::{Path, PathBuf};
use std::process::{Child, ChildStdout, Command, Stdio};

/// Video file decoded by an `ffmpeg` child process
///
/// Frames arrive on the child's stdout as packed RGB24. The process is
/// killed and reaped when this value is dropped, however reading ended.
pub struct VideoFile {
    path: PathBuf,
    child: Child,
    stdout: BufReader<ChildStdout>,
    width: u32,
    height: u32,
}

impl VideoFile {
    pub fn open<P: AsRef<Path>>(video_path: P) -> Result<Self, AnalysisError> {
        let path = video_path.as_ref();
        let unavailable = |reason: String| AnalysisError::SourceUnavailable {
            path: path.to_path_buf(),
            reason,
        };

        if !path.is_file() {
            return Err(unavailable("not a readable file".to_string()));
        }

        let (width, height) = probe_dimensions(path).map_err(|e| unavailable(format!("{e:#}")))?;

        tracing::info!(
            "Opening video {} ({}x{})",
            path.display(),
            width,
            height
        );

        let mut child = Command::new("ffmpeg")
            .args(decoder_args(path))
            .stdin(Stdio::null())
            .stdout(Stdio::piped())
            .stderr(Stdio::null())
            .spawn()
            .map_err(|e| unavailable(format!("failed to start ffmpeg: {e}")))?;

        let stdout = child
            .stdout
            .take()
            .ok_or_else(|| unavailable("ffmpeg stdout was not captured".to_string()))?;

        tracing::info!("Video decoder started");

        Ok(Self {
            path: path.to_path_buf(),
            child,
            stdout: BufReader::new(stdout),
            width,
            height,
        })
    }

    fn frame_len(&self) -> usize {
        self.width as usize * self.height as usize * 3
    }
}

/// `ffmpeg` arguments that stream raw RGB24 frames to stdout
///
/// Rotation metadata is ignored so frames keep the stored size that
/// `ffprobe` reports.
fn decoder_args(path: &Path) -> Vec<OsString> {
    let mut args: Vec<OsString> = ["-v", "error", "-nostdin", "-noautorotate", "-i"]
        .into_iter()
        .map(OsString::from)
        .collect();
    args.push(path.as_os_str().to_os_string());
    args.extend(
        ["-f", "rawvideo", "-pix_fmt", "rgb24", "-"]
            .into_iter()
            .map(OsString::from),
    );
    args
}

/// Ask `ffprobe` for the size of the first video stream
fn probe_dimensions(path: &Path) -> Result<(u32, u32)> {
    let output = Command::new("ffprobe")
        .args([
            "-v",
            "error",
            "-select_streams",
            "v:0",
            "-show_entries",
            "stream=width,height",
            "-of",
            "csv=s=x:p=0",
        ])
        .arg(path)
        .output()
        .context("Failed to run ffprobe")?;

    if !output.status.success() {
        anyhow::bail!(
            "ffprobe failed: {}",
            String::from_utf8_lossy(&output.stderr).trim()
        );
    }

    parse_dimensions(&String::from_utf8_lossy(&output.stdout))
}

/// Parse `WIDTHxHEIGHT` as printed by ffprobe
fn parse_dimensions(text: &str) -> Result<(u32, u32)> {
    let line = text
        .lines()
        .map(str::trim)
        .find(|line| !line.is_empty())
        .context("ffprobe reported no video stream")?;

    let (width, height) = line
        .split_once('x')
        .with_context(|| format!("Unexpected ffprobe output '{line}'"))?;
    let width: u32 = width.trim().parse().context("Invalid frame width")?;
    let height: u32 = height
        .trim()
        .trim_end_matches('x')
        .parse()
        .context("Invalid frame height")?;

    if width == 0 || height == 0 {
        anyhow::bail!("Video stream has an empty frame size {width}x{height}");
    }

    Ok((width, height))
}

impl FrameSource for VideoFile {
    fn next_frame(&mut self) -> Result<Option<RgbImage>> {
        let mut buffer = vec![0u8; self.frame_len()];

        match self.stdout.read_exact(&mut buffer) {
            Ok(()) => {}
            Err(e) if e.kind() == ErrorKind::UnexpectedEof => return Ok(None),
            Err(e) => {
                return Err(e).with_context(|| {
                    format!("Failed to read frame from {}", self.path.display())
                })
            }
        }

        let frame = RgbImage::from_raw(self.width, self.height, buffer)
            .context("Decoded frame has the wrong size")?;

        Ok(Some(frame))
    }

    fn resolution(&self) -> (u32, u32) {
        (self.width, self.height)
    }
}

impl Drop for VideoFile {
    fn drop(&mut self) {
        if let Err(e) = self.child.kill() {
            // already exited after end of stream
            tracing::debug!("ffmpeg kill: {}", e);
        }
        match self.child.wait() {
            Ok(status) => tracing::info!("Released video {} ({})", self.path.display(), status),
            Err(e) => tracing::warn!("Failed to reap ffmpeg for {}: {}", self.path.display(), e),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::capture::open_source;

    #[test]
    fn parses_probe_output() {
        assert_eq!(parse_dimensions("1920x1080\n").unwrap(), (1920, 1080));
        assert_eq!(parse_dimensions("\n 640x480x\n").unwrap(), (640, 480));
        assert!(parse_dimensions("").is_err());
        assert!(parse_dimensions("N/A").is_err());
        assert!(parse_dimensions("0x480").is_err());
    }

    #[test]
    fn decoder_keeps_stored_orientation() {
        let args = decoder_args(Path::new("clips/phone.mov"));

        let position = |flag: &str| args.iter().position(|a| a == flag).unwrap();
        assert!(position("-noautorotate") < position("-i"));
        assert_eq!(args[position("-i") + 1], OsString::from("clips/phone.mov"));
        assert_eq!(args.last().unwrap(), "-");
    }

    #[test]
    fn missing_file_is_unavailable() {
        let err = VideoFile::open("/definitely/not/here.mp4").err().unwrap();
        assert!(matches!(err, AnalysisError::SourceUnavailable { .. }));

        let err = open_source("/definitely/not/here.mp4").err().unwrap();
        assert!(err.to_string().contains("here.mp4"));
    }
}
