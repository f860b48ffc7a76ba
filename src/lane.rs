use serde_derive::{Deserialize, Serialize};

use crate::boundary::LaneBoundary;
use crate::config::{PixelScale, TrackerConfig, WidthRange};
use crate::fit::PolynomialFit;

/// Frame geometry and acceptance rules shared by both boundaries of a lane.
#[derive(Serialize, Deserialize, Debug, Clone, Copy, PartialEq)]
pub struct LaneGeometry {
    pub image_width: u32,
    pub image_height: u32,
    /// Row (pixels) where width, offset and curvature are evaluated.
    pub eval_row: f64,
    pub scale: PixelScale,
    pub width_range: WidthRange,
    pub history_depth: usize,
}

impl LaneGeometry {
    pub fn new(config: &TrackerConfig, (image_width, image_height): (u32, u32)) -> Self {
        Self {
            image_width,
            image_height,
            eval_row: config.eval_row_for(image_height),
            scale: config.scale,
            width_range: config.lane_width_m,
            history_depth: config.history_depth,
        }
    }

    /// Metric distance between two curves at the evaluation row.
    #[inline]
    fn width_between(&self, left: &LaneBoundary, right: &LaneBoundary) -> f64 {
        (right.base_x(self.eval_row) - left.base_x(self.eval_row)) * self.scale.xm_per_pix
    }
}

/// Sampled curves, one `(x, y)` point per image row.
#[derive(Serialize, Deserialize, Debug, Clone, Default, PartialEq)]
pub struct LanePolylines {
    pub left: Vec<(f64, f64)>,
    pub right: Vec<(f64, f64)>,
    pub center: Vec<(f64, f64)>,
}

/// The tracked lane: a left and a right boundary plus the geometry they live in.
#[derive(Debug, Clone)]
pub struct LaneModel {
    left: LaneBoundary,
    right: LaneBoundary,
    geometry: LaneGeometry,
}

impl LaneModel {
    pub fn new(left: PolynomialFit, right: PolynomialFit, geometry: LaneGeometry) -> Self {
        Self {
            left: LaneBoundary::new(left, geometry.history_depth),
            right: LaneBoundary::new(right, geometry.history_depth),
            geometry,
        }
    }

    #[inline]
    pub fn left(&self) -> &LaneBoundary {
        &self.left
    }

    #[inline]
    pub fn right(&self) -> &LaneBoundary {
        &self.right
    }

    #[inline]
    pub fn geometry(&self) -> &LaneGeometry {
        &self.geometry
    }

    /// Width of the accepted lane in metres.
    pub fn lane_width_m(&self) -> f64 {
        self.geometry.width_between(&self.left, &self.right)
    }

    /// Width the lane would have if only the candidate pair were known.
    pub fn candidate_width_m(&self, left: &PolynomialFit, right: &PolynomialFit) -> f64 {
        let left = LaneBoundary::new(*left, 1);
        let right = LaneBoundary::new(*right, 1);

        self.geometry.width_between(&left, &right)
    }

    /// Whether a candidate pair describes a physically plausible lane.
    ///
    /// Does not touch the tracked boundaries.
    pub fn validate_candidate(&self, left: &PolynomialFit, right: &PolynomialFit) -> bool {
        let width = self.candidate_width_m(left, right);

        width.is_finite() && self.geometry.width_range.contains(width)
    }

    pub fn accept(&mut self, left: PolynomialFit, right: PolynomialFit) {
        self.left.push(left);
        self.right.push(right);
    }

    #[inline]
    pub fn accept_left(&mut self, fit: PolynomialFit) {
        self.left.push(fit);
    }

    #[inline]
    pub fn accept_right(&mut self, fit: PolynomialFit) {
        self.right.push(fit);
    }

    /// Lateral offset of the camera from the lane centre in metres.
    ///
    /// Computed as `image_centre − lane_centre` at the evaluation row. Positive
    /// when the lane centre lies left of the image centre, that is when the
    /// vehicle sits right of the lane centre; negative the other way round.
    pub fn center_offset_m(&self) -> f64 {
        let xm = self.geometry.scale.xm_per_pix;
        let center = self.left.fit().midline(self.right.fit());
        let center_x_m = center.project(self.geometry.eval_row) * xm;

        self.geometry.image_width as f64 / 2.0 * xm - center_x_m
    }

    /// Mean radius of curvature of both boundaries, `f64::INFINITY` when straight.
    pub fn mean_curvature_m(&self) -> f64 {
        let row = self.geometry.eval_row;
        let scale = &self.geometry.scale;

        (self.left.curvature_m(row, scale) + self.right.curvature_m(row, scale)) / 2.0
    }

    /// Smoothed curves sampled at every row, for the overlay.
    pub fn polylines(&self) -> LanePolylines {
        let center = self.left.fit().midline(self.right.fit());
        let rows = 0..self.geometry.image_height;

        let sample = |fit: &PolynomialFit| -> Vec<(f64, f64)> {
            rows.clone()
                .map(|y| {
                    let y = y as f64;
                    (fit.project(y), y)
                })
                .collect()
        };

        LanePolylines {
            left: sample(self.left.fit()),
            right: sample(self.right.fit()),
            center: sample(&center),
        }
    }
}
