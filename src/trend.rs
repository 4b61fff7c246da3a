use crate::error::AnalysisError;
use ndarray::Array1;
use rand::rngs::StdRng;
use rand::seq::SliceRandom;
use rand::SeedableRng;

/// Fewest samples a line can be fitted through
pub const MIN_SAMPLES: usize = 2;

/// Share of samples held back from fitting
pub const DEFAULT_HOLDOUT_FRACTION: f64 = 0.3;

/// Number of future frames to project
pub const DEFAULT_HORIZON: u64 = 30;

/// Longest projection the predictor will build
pub const MAX_HORIZON: u64 = 100_000;

/// Where the projected frame indices start
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ProjectionOrigin {
    /// Twice the number of processed frames
    ///
    /// Leaves a gap after the last observation; kept so charts line up
    /// with earlier runs.
    #[default]
    DoubledFrameCount,

    /// Right after the last observed frame
    AfterLastSample,
}

impl ProjectionOrigin {
    /// First future frame index for the given observed indices
    pub fn start_index(&self, frames: &[u64]) -> u64 {
        match self {
            ProjectionOrigin::DoubledFrameCount => 2 * frames.len() as u64,
            ProjectionOrigin::AfterLastSample => {
                frames.last().map_or(0, |last| last.saturating_add(1))
            }
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct TrendConfig {
    pub holdout_fraction: f64,
    pub horizon: u64,

    /// Fixed seed for the train/held-out split; random when `None`
    pub seed: Option<u64>,

    pub origin: ProjectionOrigin,
}

impl Default for TrendConfig {
    fn default() -> Self {
        Self {
            holdout_fraction: DEFAULT_HOLDOUT_FRACTION,
            horizon: DEFAULT_HORIZON,
            seed: None,
            origin: ProjectionOrigin::default(),
        }
    }
}

/// Least-squares line `area = slope * frame + intercept`
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct LinearTrend {
    pub slope: f64,
    pub intercept: f64,
}

impl LinearTrend {
    pub fn fit(frames: &[f64], areas: &[f64]) -> Result<Self, AnalysisError> {
        if frames.len() != areas.len() {
            return Err(AnalysisError::LengthMismatch {
                frames: frames.len(),
                areas: areas.len(),
            });
        }
        if frames.len() < MIN_SAMPLES {
            return Err(AnalysisError::InsufficientData {
                needed: MIN_SAMPLES,
                got: frames.len(),
            });
        }

        let x = Array1::from(frames.to_vec());
        let y = Array1::from(areas.to_vec());
        let x_mean = x.mean().unwrap_or_default();
        let y_mean = y.mean().unwrap_or_default();

        let dx = &x - x_mean;
        let dy = &y - y_mean;
        let sxx = dx.dot(&dx);

        // every sample at the same frame: no slope to speak of
        if sxx <= f64::EPSILON {
            return Err(AnalysisError::InsufficientData {
                needed: MIN_SAMPLES,
                got: distinct_count(frames),
            });
        }

        let slope = dx.dot(&dy) / sxx;
        Ok(Self {
            slope,
            intercept: y_mean - slope * x_mean,
        })
    }

    #[inline]
    pub fn predict(&self, frame: f64) -> f64 {
        self.slope * frame + self.intercept
    }
}

fn distinct_count(values: &[f64]) -> usize {
    let mut sorted = values.to_vec();
    sorted.sort_by(f64::total_cmp);
    sorted.dedup();
    sorted.len()
}

/// Error of the fitted line on the samples it never saw
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct HoldoutScore {
    pub samples: usize,
    pub mean_absolute_error: f64,
    pub rmse: f64,
}

/// Observed series extended with the projected future
#[derive(Debug, Clone)]
pub struct Projection {
    pub model: LinearTrend,

    /// Observed frame indices followed by the projected ones
    pub frames: Vec<u64>,

    /// Observed areas followed by the predicted ones
    pub areas: Vec<f64>,

    /// Number of leading entries that are observations
    pub observed: usize,

    pub holdout: Option<HoldoutScore>,
}

impl Projection {
    /// Only the projected `(frame, area)` pairs
    pub fn predictions(&self) -> impl Iterator<Item = (u64, f64)> + '_ {
        self.frames[self.observed..]
            .iter()
            .copied()
            .zip(self.areas[self.observed..].iter().copied())
    }
}

/// Fits a trend to the measured areas and projects it forward
#[derive(Debug, Clone, Default)]
pub struct TrendPredictor {
    config: TrendConfig,
}

impl TrendPredictor {
    pub fn new(config: TrendConfig) -> Self {
        Self { config }
    }

    pub fn config(&self) -> &TrendConfig {
        &self.config
    }

    /// Project starting at the index chosen by the configured origin
    pub fn predict(&self, frames: &[u64], areas: &[u64]) -> Result<Projection, AnalysisError> {
        self.project(frames, areas, self.config.origin.start_index(frames))
    }

    /// Fit on a random training subset and predict `horizon` frames from `start`
    ///
    /// Horizons past `MAX_HORIZON`, or running beyond the last `u64`
    /// frame index, are rejected before any fitting.
    pub fn project(
        &self,
        frames: &[u64],
        areas: &[u64],
        start: u64,
    ) -> Result<Projection, AnalysisError> {
        if frames.len() != areas.len() {
            return Err(AnalysisError::LengthMismatch {
                frames: frames.len(),
                areas: areas.len(),
            });
        }
        if frames.len() < MIN_SAMPLES {
            return Err(AnalysisError::InsufficientData {
                needed: MIN_SAMPLES,
                got: frames.len(),
            });
        }

        let horizon = self.config.horizon;
        let end = start
            .checked_add(horizon)
            .filter(|_| horizon <= MAX_HORIZON)
            .ok_or(AnalysisError::HorizonOutOfRange {
                start,
                horizon,
                max: MAX_HORIZON,
            })?;

        let (train, holdout) = self.split(frames.len());
        tracing::debug!(
            "Fitting on {} samples, holding out {}",
            train.len(),
            holdout.len()
        );

        let pick = |indices: &[usize], values: &[u64]| -> Vec<f64> {
            indices.iter().map(|&i| values[i] as f64).collect()
        };
        let model = LinearTrend::fit(&pick(&train, frames), &pick(&train, areas))?;
        let holdout = score(&model, &pick(&holdout, frames), &pick(&holdout, areas));

        let future: Vec<u64> = (start..end).collect();

        let mut all_frames = frames.to_vec();
        all_frames.extend_from_slice(&future);

        let mut all_areas: Vec<f64> = areas.iter().map(|&a| a as f64).collect();
        all_areas.extend(future.iter().map(|&f| model.predict(f as f64)));

        Ok(Projection {
            model,
            frames: all_frames,
            areas: all_areas,
            observed: frames.len(),
            holdout,
        })
    }

    /// Shuffle sample indices into training and held-out sets
    ///
    /// The held-out set gets `ceil(n * holdout_fraction)` samples, but
    /// training always keeps at least `MIN_SAMPLES`.
    fn split(&self, n: usize) -> (Vec<usize>, Vec<usize>) {
        let mut rng = match self.config.seed {
            Some(seed) => StdRng::seed_from_u64(seed),
            None => StdRng::from_entropy(),
        };

        let mut indices: Vec<usize> = (0..n).collect();
        indices.shuffle(&mut rng);

        // the epsilon keeps 0.3 * 10 from rounding up to 4
        let wanted = (n as f64 * self.config.holdout_fraction - 1e-9).ceil().max(0.0) as usize;
        let holdout = wanted.min(n.saturating_sub(MIN_SAMPLES));

        let train = indices.split_off(holdout);
        (train, indices)
    }
}

fn score(model: &LinearTrend, frames: &[f64], areas: &[f64]) -> Option<HoldoutScore> {
    if frames.is_empty() {
        return None;
    }

    let residuals = Array1::from_iter(
        frames
            .iter()
            .zip(areas)
            .map(|(&frame, &area)| area - model.predict(frame)),
    );
    let n = residuals.len() as f64;

    Some(HoldoutScore {
        samples: residuals.len(),
        mean_absolute_error: residuals.mapv(f64::abs).sum() / n,
        rmse: (residuals.dot(&residuals) / n).sqrt(),
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    fn seeded(seed: u64) -> TrendPredictor {
        TrendPredictor::new(TrendConfig {
            seed: Some(seed),
            ..TrendConfig::default()
        })
    }

    fn on_line(n: u64) -> (Vec<u64>, Vec<u64>) {
        let frames: Vec<u64> = (0..n).collect();
        let areas = frames.iter().map(|&f| 1000 - 2 * f).collect();
        (frames, areas)
    }

    #[test]
    fn recovers_an_exact_line() {
        let (frames, areas) = on_line(100);

        let projection = seeded(7).predict(&frames, &areas).unwrap();

        assert!((projection.model.slope + 2.0).abs() < 1e-9);
        assert!((projection.model.intercept - 1000.0).abs() < 1e-6);
        for (frame, area) in projection.predictions() {
            assert!((area - (1000.0 - 2.0 * frame as f64)).abs() < 1e-6);
        }
    }

    #[test]
    fn projects_from_twice_the_frame_count() {
        let (frames, areas) = on_line(10);

        let projection = seeded(1).predict(&frames, &areas).unwrap();

        assert_eq!(projection.observed, 10);
        assert_eq!(projection.frames.len(), 40);
        assert_eq!(&projection.frames[..10], &frames[..]);
        let future: Vec<u64> = projection.predictions().map(|(f, _)| f).collect();
        assert_eq!(future, (20..50).collect::<Vec<_>>());
        assert_eq!(projection.areas[3], 994.0);
    }

    #[test]
    fn can_project_from_the_last_sample() {
        let (frames, areas) = on_line(10);
        let predictor = TrendPredictor::new(TrendConfig {
            seed: Some(1),
            origin: ProjectionOrigin::AfterLastSample,
            horizon: 5,
            ..TrendConfig::default()
        });

        let projection = predictor.predict(&frames, &areas).unwrap();
        let future: Vec<u64> = projection.predictions().map(|(f, _)| f).collect();
        assert_eq!(future, vec![10, 11, 12, 13, 14]);
    }

    #[test]
    fn predictions_are_not_clipped_at_zero() {
        let (frames, areas) = on_line(10);

        let projection = seeded(3).project(&frames, &areas, 600).unwrap();
        let (frame, area) = projection.predictions().last().unwrap();

        assert_eq!(frame, 629);
        assert!((area - (1000.0 - 2.0 * 629.0)).abs() < 1e-6);
        assert!(area < 0.0);
    }

    #[test]
    fn too_few_samples_is_insufficient_data() {
        let predictor = TrendPredictor::default();

        for n in 0..MIN_SAMPLES as u64 {
            let (frames, areas) = on_line(n);
            let err = predictor.predict(&frames, &areas).unwrap_err();
            assert!(matches!(
                err,
                AnalysisError::InsufficientData { needed: MIN_SAMPLES, got } if got == n as usize
            ));
        }

        let (frames, areas) = on_line(2);
        assert!(predictor.predict(&frames, &areas).is_ok());
    }

    #[test]
    fn mismatched_lengths_are_rejected() {
        let err = TrendPredictor::default()
            .predict(&[0, 1, 2], &[5, 4])
            .unwrap_err();
        assert!(matches!(err, AnalysisError::LengthMismatch { frames: 3, areas: 2 }));
    }

    #[test]
    fn constant_frame_index_cannot_be_fitted() {
        let err = LinearTrend::fit(&[4.0, 4.0, 4.0], &[1.0, 2.0, 3.0]).unwrap_err();
        assert!(matches!(err, AnalysisError::InsufficientData { got: 1, .. }));
    }

    #[test]
    fn split_holds_out_thirty_percent() {
        let predictor = seeded(11);

        let (train, holdout) = predictor.split(10);
        assert_eq!((train.len(), holdout.len()), (7, 3));

        let mut all: Vec<usize> = train.iter().chain(&holdout).copied().collect();
        all.sort_unstable();
        assert_eq!(all, (0..10).collect::<Vec<_>>());

        assert_eq!(predictor.split(3).0.len(), 2);
        assert!(predictor.split(2).1.is_empty());
    }

    #[test]
    fn seeded_splits_repeat() {
        assert_eq!(seeded(42).split(50), seeded(42).split(50));
    }

    #[test]
    fn holdout_is_scored_but_not_fitted() {
        let frames: Vec<u64> = (0..20).collect();
        let mut areas: Vec<u64> = frames.iter().map(|&f| 500 + 3 * f).collect();

        // same seed, same split: only held-out samples go far off the line
        let predictor = seeded(5);
        let (_, holdout) = predictor.split(frames.len());
        assert_eq!(holdout.len(), 6);
        for &i in &holdout {
            areas[i] = 1_000_000;
        }

        let projection = predictor.predict(&frames, &areas).unwrap();

        assert!((projection.model.slope - 3.0).abs() < 1e-6);
        assert!((projection.model.intercept - 500.0).abs() < 1e-6);

        let score = projection.holdout.unwrap();
        assert_eq!(score.samples, 6);
        assert!(score.mean_absolute_error > 990_000.0);
        assert!(score.rmse >= score.mean_absolute_error);
    }

    #[test]
    fn oversized_horizon_is_rejected() {
        let (frames, areas) = on_line(10);
        let predictor = |horizon| {
            TrendPredictor::new(TrendConfig {
                seed: Some(1),
                horizon,
                ..TrendConfig::default()
            })
        };

        let err = predictor(u64::MAX).predict(&frames, &areas).unwrap_err();
        assert!(matches!(
            err,
            AnalysisError::HorizonOutOfRange { start: 20, horizon: u64::MAX, .. }
        ));
        assert!(predictor(MAX_HORIZON + 1).predict(&frames, &areas).is_err());

        let err = predictor(30).project(&frames, &areas, u64::MAX - 5).unwrap_err();
        assert!(matches!(err, AnalysisError::HorizonOutOfRange { horizon: 30, .. }));

        let projection = predictor(MAX_HORIZON).predict(&frames, &areas).unwrap();
        assert_eq!(projection.predictions().count() as u64, MAX_HORIZON);
    }
}
