mod capture;
mod config;
mod error;
mod output;
mod overlay;
mod pipeline;
mod plot;
mod segmentation;
mod trend;

use anyhow::{Context, Result};
use clap::Parser;
use config::AnalysisConfig;
use pipeline::{FramePipeline, PipelineRun};
use segmentation::{HsvColor, HsvRange, Roi};
use std::path::PathBuf;
use trend::{ProjectionOrigin, TrendConfig, TrendPredictor};

#[derive(Parser, Debug)]
#[command(author, version, about = "Track a dissolving object's area through a video", long_about = None)]
struct Args {
    /// Video file, or a directory of frame images
    input: PathBuf,

    /// Lower HSV bound of the object's surface color (h,s,v; hue 0-180)
    #[arg(long, default_value_t = config::DEFAULT_LOWER_SURFACE)]
    lower_surface: HsvColor,

    /// Upper HSV bound of the object's surface color (h,s,v; hue 0-180)
    #[arg(long, default_value_t = config::DEFAULT_UPPER_SURFACE)]
    upper_surface: HsvColor,

    /// Lower HSV bound of the color counted as area
    #[arg(long, default_value_t = config::DEFAULT_LOWER_DARK)]
    lower_dark: HsvColor,

    /// Upper HSV bound of the color counted as area
    #[arg(long, default_value_t = config::DEFAULT_UPPER_DARK)]
    upper_dark: HsvColor,

    /// Region of interest as x,y,width,height
    #[arg(long, default_value_t = config::DEFAULT_ROI)]
    roi: Roi,

    /// Number of future frames to project
    #[arg(
        long,
        default_value_t = trend::DEFAULT_HORIZON,
        value_parser = clap::value_parser!(u64).range(1..=trend::MAX_HORIZON)
    )]
    horizon: u64,

    /// Seed for the train/held-out split (random if omitted)
    #[arg(long)]
    seed: Option<u64>,

    /// Start the projection right after the last frame instead of at twice the frame count
    #[arg(long)]
    project_from_last: bool,

    /// Where to write the area-over-time chart (SVG)
    #[arg(long, default_value = "degradation.svg")]
    chart: PathBuf,

    /// Do not open the preview window
    #[arg(long)]
    no_display: bool,

    /// Enable debug logging
    #[arg(long)]
    debug: bool,
}

impl Args {
    fn analysis_config(&self) -> AnalysisConfig {
        AnalysisConfig {
            surface: HsvRange::new(self.lower_surface, self.upper_surface),
            dark: HsvRange::new(self.lower_dark, self.upper_dark),
            roi: self.roi,
        }
    }

    fn trend_config(&self) -> TrendConfig {
        TrendConfig {
            horizon: self.horizon,
            seed: self.seed,
            origin: if self.project_from_last {
                ProjectionOrigin::AfterLastSample
            } else {
                ProjectionOrigin::DoubledFrameCount
            },
            ..TrendConfig::default()
        }
    }
}

fn main() -> Result<()> {
    let args = Args::parse();

    // Initialize logging
    let log_level = if args.debug {
        tracing::Level::DEBUG
    } else {
        tracing::Level::INFO
    };

    tracing_subscriber::fmt()
        .with_max_level(log_level)
        .with_target(false)
        .init();

    let config = args.analysis_config();
    tracing::info!("Soapwatch starting");
    tracing::info!("Input: {}", args.input.display());
    tracing::info!("Surface color: {}", config.surface);
    tracing::info!("Dark color: {}", config.dark);
    tracing::info!("ROI: {}", config.roi);

    let source = capture::open_source(&args.input).context("Failed to open video source")?;
    let pipeline = FramePipeline::new(&config);

    let run = measure(&pipeline, source, &args)?;

    if let Some(last) = run.series.samples().last() {
        tracing::info!(
            "Stopped ({:?}) at frame {} with area {} pixels",
            run.stop,
            last.frame_index,
            last.area
        );
    }

    let predictor = TrendPredictor::new(args.trend_config());
    let frames = run.series.frame_indices();
    let areas = run.series.areas();
    let projection = predictor
        .predict(&frames, &areas)
        .context("Failed to fit degradation trend")?;

    tracing::info!(
        "Trend: area = {:.3} * frame + {:.1} (origin {:?}, horizon {})",
        projection.model.slope,
        projection.model.intercept,
        predictor.config().origin,
        predictor.config().horizon
    );
    if let Some(score) = projection.holdout {
        tracing::info!(
            "Held-out error over {} samples: MAE={:.1}px, RMSE={:.1}px",
            score.samples,
            score.mean_absolute_error,
            score.rmse
        );
    }
    if let Some((frame, area)) = projection.predictions().last() {
        tracing::info!("Projected area at frame {}: {:.0} pixels", frame, area);
    }

    plot::write_chart(
        &args.chart,
        &frames,
        &areas,
        &projection.frames,
        &projection.areas,
    )?;

    Ok(())
}

#[cfg(feature = "display")]
fn measure(
    pipeline: &FramePipeline,
    source: Box<dyn capture::FrameSource>,
    args: &Args,
) -> Result<PipelineRun> {
    if args.no_display {
        return pipeline.run(source, None);
    }

    let (width, height) = source.resolution();
    let mut window = output::PreviewWindow::new("Soapwatch", width, height)?;
    tracing::info!("Press q to stop measuring");
    pipeline.run(source, Some(&mut window))
}

#[cfg(not(feature = "display"))]
fn measure(
    pipeline: &FramePipeline,
    source: Box<dyn capture::FrameSource>,
    args: &Args,
) -> Result<PipelineRun> {
    if !args.no_display {
        tracing::info!("Built without the display feature, running headless");
    }
    pipeline.run(source, None)
}
