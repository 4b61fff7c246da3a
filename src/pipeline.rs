use crate::capture::FrameSource;
use crate::config::AnalysisConfig;
use crate::error::AnalysisError;
use crate::output::{Control, FrameSink};
use crate::overlay;
use crate::segmentation::{AreaMeasurer, ColorSegmenter, Measurement, Roi};
use anyhow::{Context, Result};
use image::RgbImage;
use std::time::{Duration, Instant};

/// How often progress gets logged
const STATS_INTERVAL: u64 = 30;

/// One observation of the remaining area
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Sample {
    pub frame_index: u64,
    pub area: u64,
}

/// Append-only record of measurements, one per processed frame
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct MeasurementSeries {
    samples: Vec<Sample>,
}

impl MeasurementSeries {
    pub fn new() -> Self {
        Self::default()
    }

    /// Record the area of the next frame
    pub fn push(&mut self, area: u64) -> Sample {
        let sample = Sample {
            frame_index: self.samples.len() as u64,
            area,
        };
        self.samples.push(sample);
        sample
    }

    pub fn len(&self) -> usize {
        self.samples.len()
    }

    pub fn is_empty(&self) -> bool {
        self.samples.is_empty()
    }

    pub fn samples(&self) -> &[Sample] {
        &self.samples
    }

    pub fn frame_indices(&self) -> Vec<u64> {
        self.samples.iter().map(|s| s.frame_index).collect()
    }

    pub fn areas(&self) -> Vec<u64> {
        self.samples.iter().map(|s| s.area).collect()
    }
}

/// Why the reading loop ended
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StopReason {
    EndOfStream,
    Quit,
}

#[derive(Debug, Clone)]
pub struct PipelineRun {
    pub series: MeasurementSeries,
    pub stop: StopReason,
}

/// Crop → segment → measure, frame after frame
pub struct FramePipeline {
    roi: Roi,
    segmenter: ColorSegmenter,
    measurer: AreaMeasurer,
}

impl FramePipeline {
    pub fn new(config: &AnalysisConfig) -> Self {
        Self {
            roi: config.roi,
            segmenter: ColorSegmenter::new(config.surface),
            measurer: AreaMeasurer::new(config.dark),
        }
    }

    /// Measure the remaining area inside the ROI of one frame
    pub fn measure_frame(&self, frame: &RgbImage) -> Result<Measurement, AnalysisError> {
        let region = self.roi.crop(frame)?;
        let isolated = self.segmenter.isolate(&region);
        Ok(self.measurer.measure(&isolated))
    }

    /// Process every frame of `source` and return the collected series
    ///
    /// The source is consumed and dropped before this returns, whether
    /// the stream ended, the viewer quit, or processing failed. A frame
    /// that cannot be read, or whose size no longer fits the ROI, ends
    /// the stream.
    pub fn run<S: FrameSource>(
        &self,
        mut source: S,
        mut sink: Option<&mut dyn FrameSink>,
    ) -> Result<PipelineRun> {
        let (width, height) = source.resolution();
        self.roi
            .check_bounds(width, height)
            .context("ROI does not fit the video")?;

        tracing::info!("Measuring ROI {} (x,y,w,h) in {}x{} frames", self.roi, width, height);
        tracing::debug!("Pipeline state: Reading");

        let mut series = MeasurementSeries::new();
        let mut total_read_time = Duration::ZERO;
        let mut total_measure_time = Duration::ZERO;
        let mut total_display_time = Duration::ZERO;

        let stop = loop {
            let read_start = Instant::now();
            let mut frame = match source.next_frame() {
                Ok(Some(frame)) => frame,
                Ok(None) => break StopReason::EndOfStream,
                Err(e) => {
                    tracing::warn!(
                        "Frame {} unreadable, treating as end of stream: {:#}",
                        series.len(),
                        e
                    );
                    break StopReason::EndOfStream;
                }
            };
            total_read_time += read_start.elapsed();

            let measure_start = Instant::now();
            let measurement = match self.measure_frame(&frame) {
                Ok(measurement) => measurement,
                Err(e) => {
                    tracing::warn!(
                        "Frame {} ({}x{}) cannot be measured, treating as end of stream: {}",
                        series.len(),
                        frame.width(),
                        frame.height(),
                        e
                    );
                    break StopReason::EndOfStream;
                }
            };
            total_measure_time += measure_start.elapsed();

            let sample = series.push(measurement.area);
            tracing::debug!("Frame {}: area={}", sample.frame_index, sample.area);

            let mut control = Control::Continue;
            if let Some(sink) = sink.as_mut() {
                let display_start = Instant::now();
                overlay::annotate(
                    &mut frame,
                    &self.roi,
                    &measurement.contours,
                    measurement.area,
                )?;
                control = sink
                    .show(&frame, measurement.area)
                    .context("Failed to display frame")?;
                total_display_time += display_start.elapsed();
            }

            let frame_count = series.len() as u64;
            if frame_count % STATS_INTERVAL == 0 {
                let per_frame = |total: Duration| total.as_secs_f64() * 1000.0 / frame_count as f64;
                tracing::info!(
                    "Frame {}: area={}, read={:.1}ms, measure={:.1}ms, display={:.1}ms",
                    frame_count,
                    sample.area,
                    per_frame(total_read_time),
                    per_frame(total_measure_time),
                    per_frame(total_display_time)
                );
            }

            if control == Control::Quit {
                tracing::info!("Quit requested after {} frames", frame_count);
                break StopReason::Quit;
            }
        };

        drop(source);
        tracing::debug!("Pipeline state: Finished ({:?})", stop);
        tracing::info!("Measured {} frames", series.len());

        Ok(PipelineRun { series, stop })
    }
}
