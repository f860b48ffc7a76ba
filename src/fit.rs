use serde_derive::{Deserialize, Serialize};

use crate::config::PixelScale;
use crate::math;

/// Quadratic boundary curve `x = a·y² + b·y + c` in bird's-eye pixels.
///
/// `y` is the pixel row (origin top, growing downward) and `x` the pixel column.
#[derive(Serialize, Deserialize, Debug, Clone, Copy, PartialEq)]
pub struct PolynomialFit {
    pub a: f64,
    pub b: f64,
    pub c: f64,
}

impl PolynomialFit {
    #[inline]
    pub fn new(a: f64, b: f64, c: f64) -> Self {
        Self { a, b, c }
    }

    #[inline]
    pub fn coefficients(&self) -> [f64; 3] {
        [self.a, self.b, self.c]
    }

    #[inline]
    pub fn from_coefficients(coeffs: [f64; 3]) -> Self {
        Self::new(coeffs[0], coeffs[1], coeffs[2])
    }

    /// Least-squares fit over `(x, y)` pixel coordinates.
    pub fn fit_pixels<I>(pixels: I) -> LaneFit
    where
        I: IntoIterator<Item = (u32, u32)>,
    {
        let samples: Vec<(f64, f64)> = pixels
            .into_iter()
            .map(|(x, y)| (y as f64, x as f64))
            .collect();

        if samples.is_empty() {
            return LaneFit::Invalid(FitFailure::NoPixels);
        }

        let mut rows: Vec<u64> = samples.iter().map(|&(y, _)| y as u64).collect();
        rows.sort_unstable();
        rows.dedup();

        if rows.len() < 3 {
            return LaneFit::Invalid(FitFailure::Underdetermined);
        }

        match math::polyfit2(&samples) {
            Some(coeffs) => LaneFit::Fitted(Self::from_coefficients(coeffs)),
            None => LaneFit::Invalid(FitFailure::Singular),
        }
    }

    /// Column of the curve at row `y`.
    #[inline(always)]
    pub fn project(&self, y: f64) -> f64 {
        self.a * y * y + self.b * y + self.c
    }

    /// Radius of curvature in metres at pixel row `y_eval`.
    ///
    /// The pixel coefficients are rescaled to metres on both axes before the
    /// radius formula is applied. A zero leading coefficient is a straight
    /// segment and yields `f64::INFINITY`.
    pub fn curvature_radius_m(&self, y_eval: f64, scale: &PixelScale) -> f64 {
        let PixelScale {
            ym_per_pix,
            xm_per_pix,
        } = *scale;

        let a_m = self.a * xm_per_pix / (ym_per_pix * ym_per_pix);
        let b_m = self.b * xm_per_pix / ym_per_pix;
        let y_m = y_eval * ym_per_pix;

        if a_m == 0.0 {
            return f64::INFINITY;
        }

        let slope = 2.0 * a_m * y_m + b_m;

        (1.0 + slope * slope).powf(1.5) / (2.0 * a_m).abs()
    }

    /// Coefficient-wise mean of two curves.
    #[inline]
    pub fn midline(&self, other: &PolynomialFit) -> PolynomialFit {
        PolynomialFit::new(
            (self.a + other.a) / 2.0,
            (self.b + other.b) / 2.0,
            (self.c + other.c) / 2.0,
        )
    }
}

/// Why a search pass produced no usable curve.
#[derive(Serialize, Deserialize, Debug, Clone, Copy, PartialEq, Eq)]
pub enum FitFailure {
    /// The pixel set was empty.
    NoPixels,
    /// Fewer than three distinct rows, the quadratic is not determined.
    Underdetermined,
    /// The normal equations could not be solved.
    Singular,
}

/// Outcome of fitting one side's pixel set.
#[derive(Serialize, Deserialize, Debug, Clone, Copy, PartialEq)]
pub enum LaneFit {
    Fitted(PolynomialFit),
    Invalid(FitFailure),
}

impl LaneFit {
    #[inline]
    pub fn fit(&self) -> Option<&PolynomialFit> {
        match self {
            LaneFit::Fitted(fit) => Some(fit),
            LaneFit::Invalid(_) => None,
        }
    }

    #[inline]
    pub fn is_valid(&self) -> bool {
        matches!(self, LaneFit::Fitted(_))
    }
}

impl From<PolynomialFit> for LaneFit {
    fn from(fit: PolynomialFit) -> Self {
        LaneFit::Fitted(fit)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn unit_scale() -> PixelScale {
        PixelScale {
            ym_per_pix: 1.0,
            xm_per_pix: 1.0,
        }
    }

    #[test]
    fn test_project() {
        let fit = PolynomialFit::new(0.5, -2.0, 10.0);
        assert_eq!(fit.project(0.0), 10.0);
        assert_eq!(fit.project(2.0), 8.0);
        assert_eq!(fit.project(-2.0), 16.0);
    }

    #[test]
    fn test_curvature_circle_vertex() {
        // x = y² / (2R) has radius R at its vertex.
        let r = 50.0;
        let fit = PolynomialFit::new(1.0 / (2.0 * r), 0.0, 0.0);
        let radius = fit.curvature_radius_m(0.0, &unit_scale());
        assert!((radius - r).abs() < 1e-9, "radius = {}", radius);
    }

    #[test]
    fn test_curvature_unit_scale_matches_pixel_formula() {
        let fit = PolynomialFit::new(1e-3, 0.2, 5.0);
        let y = 100.0;
        let expected = (1.0 + (2.0 * fit.a * y + fit.b).powi(2)).powf(1.5) / (2.0 * fit.a).abs();
        let radius = fit.curvature_radius_m(y, &unit_scale());
        assert!((radius - expected).abs() < 1e-9);
    }

    #[test]
    fn test_curvature_metric_scaling() {
        let scale = PixelScale {
            ym_per_pix: 0.5,
            xm_per_pix: 0.25,
        };
        let fit = PolynomialFit::new(4e-3, 0.0, 0.0);
        // a_m = 4e-3 * 0.25 / 0.25 = 4e-3, radius at vertex = 1 / (2·a_m)
        let radius = fit.curvature_radius_m(0.0, &scale);
        assert!((radius - 125.0).abs() < 1e-9, "radius = {}", radius);
    }

    #[test]
    fn test_straight_segment_is_infinite() {
        let fit = PolynomialFit::new(0.0, 0.1, 300.0);
        let radius = fit.curvature_radius_m(719.0, &PixelScale::default());
        assert!(radius.is_infinite() && radius > 0.0);
    }

    #[test]
    fn test_fit_pixels_failures() {
        assert_eq!(
            PolynomialFit::fit_pixels(Vec::new()),
            LaneFit::Invalid(FitFailure::NoPixels)
        );
        assert_eq!(
            PolynomialFit::fit_pixels(vec![(10, 5), (11, 5), (12, 6)]),
            LaneFit::Invalid(FitFailure::Underdetermined)
        );
    }

    #[test]
    fn test_fit_pixels_line() {
        let pixels = (0..100u32).map(|y| (200 + y / 2, y));
        let fit = PolynomialFit::fit_pixels(pixels);
        let fit = fit.fit().copied().unwrap();

        assert!(fit.a.abs() < 1e-4, "a = {}", fit.a);
        assert!((fit.b - 0.5).abs() < 0.02, "b = {}", fit.b);
        assert!((fit.c - 199.75).abs() < 0.5, "c = {}", fit.c);
    }

    #[test]
    fn test_midline() {
        let l = PolynomialFit::new(1e-4, 0.0, 300.0);
        let r = PolynomialFit::new(3e-4, 0.2, 1000.0);
        let m = l.midline(&r);
        assert!((m.a - 2e-4).abs() < 1e-15);
        assert!((m.b - 0.1).abs() < 1e-15);
        assert_eq!(m.c, 650.0);
    }
}
