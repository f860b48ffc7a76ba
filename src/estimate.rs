use serde_derive::{Deserialize, Serialize};

use crate::fit::{LaneFit, PolynomialFit};
use crate::lane::LaneModel;
use crate::search::SearchMode;
use crate::tracker::TrackerState;

/// What happened while processing one frame, before metrics are attached.
#[derive(Debug, Clone)]
pub(crate) struct FrameReport {
    pub mode: SearchMode,
    pub recovered: bool,
    pub detected_left: LaneFit,
    pub detected_right: LaneFit,
    pub candidate_width_m: Option<f64>,
    pub rejected_width_m: Option<f64>,
}

/// Per-frame output handed to the overlay.
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
pub struct LaneEstimate {
    /// Zero-based index of the frame in the tracker's session.
    pub frame: u64,
    pub state: TrackerState,

    /// Search that produced the fits pushed this frame.
    pub mode: SearchMode,

    /// Targeted search was rejected and sliding-window search took over.
    pub recovered: bool,

    // fits found in this frame, before smoothing
    pub detected_left: LaneFit,
    pub detected_right: LaneFit,

    /// Width (m) of the detected pair, when both sides were found.
    pub candidate_width_m: Option<f64>,

    /// Width (m) of the targeted pair that failed validation.
    pub rejected_width_m: Option<f64>,

    // smoothed curves, `None` while uninitialized
    pub left: Option<PolynomialFit>,
    pub right: Option<PolynomialFit>,

    pub lane_width_m: Option<f64>,

    // positive when the vehicle sits right of the lane centre
    pub center_offset_m: Option<f64>,

    // infinite for a straight lane
    pub mean_curvature_m: Option<f64>,
}

impl LaneEstimate {
    pub(crate) fn assemble(frame: u64, model: Option<&LaneModel>, report: FrameReport) -> Self {
        let state = if model.is_some() {
            TrackerState::Tracking
        } else {
            TrackerState::Uninitialized
        };

        Self {
            frame,
            state,
            mode: report.mode,
            recovered: report.recovered,
            detected_left: report.detected_left,
            detected_right: report.detected_right,
            candidate_width_m: report.candidate_width_m,
            rejected_width_m: report.rejected_width_m,
            left: model.map(|m| *m.left().fit()),
            right: model.map(|m| *m.right().fit()),
            lane_width_m: model.map(LaneModel::lane_width_m),
            center_offset_m: model.map(LaneModel::center_offset_m),
            mean_curvature_m: model.map(LaneModel::mean_curvature_m),
        }
    }

    /// Whether the curvature radius is too large to call the lane curved.
    #[inline]
    pub fn is_straight(&self, min_radius_m: f64) -> bool {
        self.mean_curvature_m
            .map(|r| r >= min_radius_m)
            .unwrap_or(false)
    }
}
