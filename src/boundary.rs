use crate::config::PixelScale;
use crate::fit::PolynomialFit;
use crate::history::FitHistory;

/// One edge of the lane: its recent fits and the smoothed curve derived from them.
#[derive(Debug, Clone)]
pub struct LaneBoundary {
    history: FitHistory,
    current: PolynomialFit,
}

impl LaneBoundary {
    /// A boundary is never empty: it starts from its first accepted fit.
    pub fn new(fit: PolynomialFit, depth: usize) -> Self {
        let mut history = FitHistory::with_capacity(depth);
        history.push(fit);

        Self {
            history,
            current: fit,
        }
    }

    pub fn push(&mut self, fit: PolynomialFit) {
        self.history.push(fit);

        if let Some(current) = self.history.effective_fit() {
            self.current = current;
        }
    }

    /// Smoothed curve, the mean of the history.
    #[inline]
    pub fn fit(&self) -> &PolynomialFit {
        &self.current
    }

    #[inline]
    pub fn history(&self) -> &FitHistory {
        &self.history
    }

    /// Column of the boundary at `eval_row`, the row nearest the vehicle.
    #[inline]
    pub fn base_x(&self, eval_row: f64) -> f64 {
        self.current.project(eval_row)
    }

    #[inline]
    pub fn curvature_m(&self, eval_row: f64, scale: &PixelScale) -> f64 {
        self.current.curvature_radius_m(eval_row, scale)
    }
}
