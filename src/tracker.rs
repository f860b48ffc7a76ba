use serde_derive::{Deserialize, Serialize};
use tracing::{debug, info, warn};

use crate::config::TrackerConfig;
use crate::error::Error;
use crate::estimate::{FrameReport, LaneEstimate};
use crate::fit::LaneFit;
use crate::lane::{LaneGeometry, LaneModel};
use crate::mask::BinaryMask;
use crate::search::{PixelSearchEngine, SearchOutcome};

#[derive(Serialize, Deserialize, Debug, Clone, Copy, PartialEq, Eq)]
pub enum TrackerState {
    /// No lane model yet, the next frame runs sliding-window search.
    Uninitialized,
    Tracking,
}

impl TrackerState {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Uninitialized => "UNINITIALIZED",
            Self::Tracking => "TRACKING",
        }
    }
}

#[derive(Serialize, Deserialize, Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct TrackerStats {
    pub frames: u64,
    /// Frames where targeted search was rejected and sliding-window search took over.
    pub recoveries: u64,
    /// Recovery results accepted although their width was out of range.
    pub implausible_accepts: u64,
    pub full_searches: u64,
}

/// Tracks one lane over the frames of a single video stream.
///
/// Frames must be fed in order: targeted search on frame `i + 1` starts from
/// the model accepted on frame `i`.
#[derive(Debug, Clone)]
pub struct LaneTracker {
    config: TrackerConfig,
    engine: PixelSearchEngine,
    model: Option<LaneModel>,
    dims: Option<(u32, u32)>,
    force_full_search: bool,
    stats: TrackerStats,
    last: Option<LaneEstimate>,
}

impl LaneTracker {
    pub fn new(config: TrackerConfig) -> Result<Self, Error> {
        config.validate()?;

        Ok(Self {
            engine: PixelSearchEngine::new(config.search.clone()),
            config,
            model: None,
            dims: None,
            force_full_search: false,
            stats: TrackerStats::default(),
            last: None,
        })
    }

    #[inline]
    pub fn state(&self) -> TrackerState {
        if self.model.is_some() {
            TrackerState::Tracking
        } else {
            TrackerState::Uninitialized
        }
    }

    #[inline]
    pub fn model(&self) -> Option<&LaneModel> {
        self.model.as_ref()
    }

    #[inline]
    pub fn config(&self) -> &TrackerConfig {
        &self.config
    }

    #[inline]
    pub fn stats(&self) -> &TrackerStats {
        &self.stats
    }

    #[inline]
    pub fn last_estimate(&self) -> Option<&LaneEstimate> {
        self.last.as_ref()
    }

    /// Drops the lane model; the next frame starts from a sliding-window search.
    ///
    /// The session frame size is kept.
    pub fn reset(&mut self) {
        if self.model.take().is_some() {
            info!(frame = self.stats.frames, "lane tracker reset");
        }

        self.force_full_search = false;
        self.last = None;
    }

    pub fn process(&mut self, mask: &BinaryMask) -> Result<LaneEstimate, Error> {
        self.check_dims(mask)?;

        let frame = self.stats.frames;
        self.stats.frames += 1;

        let report = if self.model.is_none() || self.force_full_search {
            self.full_search(mask, false)?
        } else {
            self.track(mask)?
        };

        debug!(
            frame,
            state = self.state().as_str(),
            mode = report.mode.as_str(),
            recovered = report.recovered,
            candidate_width_m = ?report.candidate_width_m,
            "frame processed"
        );

        let estimate = LaneEstimate::assemble(frame, self.model.as_ref(), report);
        self.last = Some(estimate.clone());

        Ok(estimate)
    }

    fn check_dims(&mut self, mask: &BinaryMask) -> Result<(), Error> {
        let actual = mask.dims();
        if actual.0 == 0 || actual.1 == 0 {
            return Err(Error::EmptyMask);
        }

        let windows = self.config.search.n_windows;
        if (actual.1 as usize) < windows {
            return Err(Error::MaskTooShort {
                height: actual.1,
                windows,
            });
        }

        if let Some(expected) = self.config.frame_size {
            if expected != actual {
                return Err(Error::DimensionMismatch { expected, actual });
            }
        }

        if let Some(row) = self.config.eval_row {
            if row >= actual.1 {
                return Err(Error::InvalidConfig(format!(
                    "eval_row {} is outside a mask of height {}",
                    row, actual.1
                )));
            }
        }

        match self.dims {
            Some(expected) if expected != actual => {
                Err(Error::DimensionMismatch { expected, actual })
            }
            Some(_) => Ok(()),
            None => {
                self.dims = Some(actual);
                Ok(())
            }
        }
    }

    /// Targeted search around the current model, with one sliding-window retry.
    fn track(&mut self, mask: &BinaryMask) -> Result<FrameReport, Error> {
        let model = match self.model.as_mut() {
            Some(model) => model,
            None => return self.full_search(mask, false),
        };

        let outcome = self
            .engine
            .targeted(mask, model.left().fit(), model.right().fit());

        let rejected_width_m = match outcome.fits() {
            Some((left, right)) => {
                let width = model.candidate_width_m(&left, &right);

                if model.validate_candidate(&left, &right) {
                    model.accept(left, right);

                    return Ok(report(&outcome, false, Some(width), None));
                }

                warn!(width_m = width, "implausible lane width, retrying with sliding window");
                Some(width)
            }
            None => {
                warn!(
                    left = ?outcome.left.fit,
                    right = ?outcome.right.fit,
                    "targeted search lost a boundary, retrying with sliding window"
                );
                None
            }
        };

        self.stats.recoveries += 1;

        let mut report = self.full_search(mask, true)?;
        report.rejected_width_m = rejected_width_m;

        Ok(report)
    }

    /// Sliding-window search whose result is taken as is.
    ///
    /// Seeds the model when uninitialized (both sides required), otherwise pushes
    /// every side that produced a fit, whatever the resulting width.
    fn full_search(&mut self, mask: &BinaryMask, recovered: bool) -> Result<FrameReport, Error> {
        let outcome = self.engine.sliding_window(mask)?;
        self.stats.full_searches += 1;

        let model = match self.model.as_mut() {
            Some(model) => model,
            None => {
                return Ok(match outcome.fits() {
                    Some((left, right)) => {
                        let geometry = LaneGeometry::new(&self.config, mask.dims());
                        let model = LaneModel::new(left, right, geometry);
                        let width = model.lane_width_m();

                        info!(width_m = width, "lane tracker seeded");

                        self.model = Some(model);
                        self.force_full_search = false;

                        report(&outcome, recovered, Some(width), None)
                    }
                    None => {
                        warn!(
                            left = ?outcome.left.fit,
                            right = ?outcome.right.fit,
                            "cannot seed lane tracker, a boundary is missing"
                        );

                        report(&outcome, recovered, None, None)
                    }
                });
            }
        };

        let mut width = None;

        match (outcome.left.fit, outcome.right.fit) {
            (LaneFit::Fitted(left), LaneFit::Fitted(right)) => {
                let candidate = model.candidate_width_m(&left, &right);
                if !model.validate_candidate(&left, &right) {
                    warn!(width_m = candidate, "accepting out-of-range sliding-window lane");
                    self.stats.implausible_accepts += 1;
                }

                model.accept(left, right);
                width = Some(candidate);
            }
            (LaneFit::Fitted(left), LaneFit::Invalid(failure)) => {
                warn!(?failure, "right boundary not found, keeping its history");
                model.accept_left(left);
            }
            (LaneFit::Invalid(failure), LaneFit::Fitted(right)) => {
                warn!(?failure, "left boundary not found, keeping its history");
                model.accept_right(right);
            }
            (LaneFit::Invalid(left), LaneFit::Invalid(right)) => {
                warn!(?left, ?right, "no boundary found, keeping lane model");
            }
        }

        self.force_full_search = width.is_none();

        Ok(report(&outcome, recovered, width, None))
    }
}

#[inline]
fn report(
    outcome: &SearchOutcome,
    recovered: bool,
    candidate_width_m: Option<f64>,
    rejected_width_m: Option<f64>,
) -> FrameReport {
    FrameReport {
        mode: outcome.mode,
        recovered,
        detected_left: outcome.left.fit,
        detected_right: outcome.right.fit,
        candidate_width_m,
        rejected_width_m,
    }
}
