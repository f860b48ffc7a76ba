use serde_derive::{Deserialize, Serialize};
use tracing::{debug, trace};

use crate::config::SearchConfig;
use crate::error::Error;
use crate::fit::{LaneFit, PolynomialFit};
use crate::mask::{BinaryMask, PixelSet};

#[derive(Serialize, Deserialize, Debug, Clone, Copy, PartialEq, Eq)]
pub enum Side {
    Left,
    Right,
}

#[derive(Serialize, Deserialize, Debug, Clone, Copy, PartialEq, Eq)]
pub enum SearchMode {
    /// Histogram-seeded band-by-band search, no prior needed.
    SlidingWindow,
    /// Corridor around the previously accepted curves.
    Targeted,
}

impl SearchMode {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::SlidingWindow => "SLIDING_WINDOW",
            Self::Targeted => "TARGETED",
        }
    }
}

/// One window visited by the sliding-window search.
///
/// Columns are `x_low..x_high` and may extend past the image edge.
#[derive(Serialize, Deserialize, Debug, Clone, Copy, PartialEq, Eq)]
pub struct SearchWindow {
    pub side: Side,
    pub x_low: i64,
    pub x_high: i64,
    pub y_low: u32,
    pub y_high: u32,
    /// Pixels collected inside the window.
    pub pixels: usize,
}

/// Pixels and fit found for one boundary.
#[derive(Debug, Clone, PartialEq)]
pub struct SideSearch {
    pub pixels: PixelSet,
    pub fit: LaneFit,
}

impl SideSearch {
    fn from_pixels(pixels: PixelSet) -> Self {
        let fit = pixels.fit();

        Self { pixels, fit }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct SearchOutcome {
    pub mode: SearchMode,
    pub left: SideSearch,
    pub right: SideSearch,
    /// Windows visited, empty for targeted search.
    pub windows: Vec<SearchWindow>,
}

impl SearchOutcome {
    /// Both fits, when both sides produced one.
    pub fn fits(&self) -> Option<(PolynomialFit, PolynomialFit)> {
        match (self.left.fit, self.right.fit) {
            (LaneFit::Fitted(l), LaneFit::Fitted(r)) => Some((l, r)),
            _ => None,
        }
    }
}

/// Set pixel columns bucketed by row.
struct RowIndex {
    rows: Vec<Vec<u32>>,
}

impl RowIndex {
    fn new(mask: &BinaryMask) -> Self {
        let mut rows = vec![Vec::new(); mask.height() as usize];
        for (x, y) in mask.nonzero() {
            rows[y as usize].push(x);
        }

        Self { rows }
    }

    #[inline]
    fn iter(&self) -> impl Iterator<Item = (u32, u32)> + '_ {
        self.rows
            .iter()
            .enumerate()
            .flat_map(|(y, xs)| xs.iter().map(move |&x| (x, y as u32)))
    }
}

#[cfg(feature = "rayon")]
#[inline]
fn join<A, B, RA, RB>(a: A, b: B) -> (RA, RB)
where
    A: FnOnce() -> RA + Send,
    B: FnOnce() -> RB + Send,
    RA: Send,
    RB: Send,
{
    rayon::join(a, b)
}

#[cfg(not(feature = "rayon"))]
#[inline]
fn join<A, B, RA, RB>(a: A, b: B) -> (RA, RB)
where
    A: FnOnce() -> RA,
    B: FnOnce() -> RB,
{
    (a(), b())
}

/// Index of the first maximum, 0 for an empty slice.
fn argmax(values: &[u32]) -> usize {
    let mut best = 0;
    for (idx, &v) in values.iter().enumerate() {
        if v > values[best] {
            best = idx;
        }
    }

    best
}

/// Locates left and right boundary pixels in a bird's-eye mask.
///
/// Holds no per-frame state; left and right are searched independently over
/// the same read-only mask.
#[derive(Debug, Clone)]
pub struct PixelSearchEngine {
    config: SearchConfig,
}

impl PixelSearchEngine {
    pub fn new(config: SearchConfig) -> Self {
        Self { config }
    }

    #[inline]
    pub fn config(&self) -> &SearchConfig {
        &self.config
    }

    /// Starting columns from the histogram of the mask's bottom half.
    pub fn base_columns(&self, mask: &BinaryMask) -> (u32, u32) {
        let height = mask.height();
        let histogram = mask.column_histogram((height / 2, height));
        let midpoint = histogram.len() / 2;

        let left = argmax(&histogram[..midpoint]);
        let right = midpoint + argmax(&histogram[midpoint..]);

        (left as u32, right as u32)
    }

    /// Histogram-seeded search over `n_windows` bands of `height / n_windows` rows,
    /// walked from the bottom of the mask upward.
    ///
    /// When the height is not a multiple of `n_windows`, the top
    /// `height % n_windows` rows fall outside every band and are never searched.
    pub fn sliding_window(&self, mask: &BinaryMask) -> Result<SearchOutcome, Error> {
        let n_windows = self.config.n_windows;
        if n_windows == 0 || (mask.height() as usize) < n_windows {
            return Err(Error::MaskTooShort {
                height: mask.height(),
                windows: n_windows,
            });
        }

        let (left_base, right_base) = self.base_columns(mask);
        debug!(left_base, right_base, "sliding window seeds");

        let index = RowIndex::new(mask);
        let height = mask.height();

        let ((left, mut left_windows), (right, right_windows)) = join(
            || self.walk_windows(&index, height, Side::Left, left_base),
            || self.walk_windows(&index, height, Side::Right, right_base),
        );

        left_windows.extend(right_windows);

        Ok(SearchOutcome {
            mode: SearchMode::SlidingWindow,
            left,
            right,
            windows: left_windows,
        })
    }

    /// Walks the bands from the bottom of the mask upward for one side.
    fn walk_windows(
        &self,
        index: &RowIndex,
        height: u32,
        side: Side,
        base: u32,
    ) -> (SideSearch, Vec<SearchWindow>) {
        let n_windows = self.config.n_windows as u32;
        let margin = self.config.window_margin_px as i64;
        let window_height = height / n_windows;

        let mut center = base as i64;
        let mut pixels = PixelSet::new();
        let mut windows = Vec::with_capacity(n_windows as usize);

        for window in 0..n_windows {
            let y_low = height - (window + 1) * window_height;
            let y_high = height - window * window_height;
            let x_low = center - margin;
            let x_high = center + margin;

            let mut found = PixelSet::new();
            for y in y_low..y_high {
                for &x in &index.rows[y as usize] {
                    let xi = x as i64;
                    if xi >= x_low && xi < x_high {
                        found.push(x, y);
                    }
                }
            }

            trace!(?side, window, x_low, x_high, y_low, y_high, pixels = found.len());

            windows.push(SearchWindow {
                side,
                x_low,
                x_high,
                y_low,
                y_high,
                pixels: found.len(),
            });

            if found.len() > self.config.min_pixels {
                if let Some(mean) = found.mean_x() {
                    center = mean as i64;
                }
            }

            pixels.extend(found);
        }

        (SideSearch::from_pixels(pixels), windows)
    }

    /// Selects pixels within the targeted margin of the prior curves.
    pub fn targeted(
        &self,
        mask: &BinaryMask,
        left: &PolynomialFit,
        right: &PolynomialFit,
    ) -> SearchOutcome {
        let index = RowIndex::new(mask);
        let margin = self.config.targeted_margin_px as f64;

        let (left, right) = join(
            || Self::corridor(&index, left, margin),
            || Self::corridor(&index, right, margin),
        );

        SearchOutcome {
            mode: SearchMode::Targeted,
            left,
            right,
            windows: Vec::new(),
        }
    }

    fn corridor(index: &RowIndex, prior: &PolynomialFit, margin: f64) -> SideSearch {
        let pixels: PixelSet = index
            .iter()
            .filter(|&(x, y)| {
                let expected = prior.project(y as f64);
                let x = x as f64;

                x > expected - margin && x < expected + margin
            })
            .collect();

        SideSearch::from_pixels(pixels)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::fit::FitFailure;

    fn engine() -> PixelSearchEngine {
        PixelSearchEngine::new(SearchConfig::default())
    }

    /// Draws curves three pixels thick, one set of pixels per row.
    fn draw(width: u32, height: u32, curves: &[PolynomialFit]) -> BinaryMask {
        BinaryMask::from_fn(width, height, |x, y| {
            curves.iter().any(|c| {
                let center = c.project(y as f64).round() as i64;
                (x as i64 - center).abs() <= 1
            })
        })
        .unwrap()
    }

    #[test]
    fn test_argmax_first_maximum() {
        assert_eq!(argmax(&[]), 0);
        assert_eq!(argmax(&[0, 0, 0]), 0);
        assert_eq!(argmax(&[1, 5, 2, 5]), 1);
    }

    #[test]
    fn test_base_columns() {
        let mask = draw(
            1280,
            720,
            &[PolynomialFit::new(0.0, 0.0, 290.0), PolynomialFit::new(0.0, 0.0, 990.0)],
        );

        let (left, right) = engine().base_columns(&mask);
        assert_eq!((left, right), (289, 989));
    }

    #[test]
    fn test_sliding_window_recovers_parabolas() {
        let left_true = PolynomialFit::new(2e-4, -0.1, 300.0);
        let right_true = PolynomialFit::new(2e-4, -0.1, 1000.0);
        let mask = draw(1280, 720, &[left_true, right_true]);

        let outcome = engine().sliding_window(&mask).unwrap();
        assert_eq!(outcome.mode, SearchMode::SlidingWindow);
        assert_eq!(outcome.windows.len(), 18);

        let (left, right) = outcome.fits().unwrap();
        for (fit, truth) in [(left, left_true), (right, right_true)] {
            assert!((fit.a - truth.a).abs() < 2e-6, "a = {} vs {}", fit.a, truth.a);
            assert!((fit.b - truth.b).abs() < 1e-3, "b = {} vs {}", fit.b, truth.b);
            assert!((fit.c - truth.c).abs() < 0.5, "c = {} vs {}", fit.c, truth.c);
        }

        // Every drawn pixel belongs to exactly one side.
        assert_eq!(
            outcome.left.pixels.len() + outcome.right.pixels.len(),
            mask.count_nonzero()
        );
    }

    #[test]
    fn test_sliding_window_follows_drift() {
        // Strong bend: the top of the curve is far from its histogram seed.
        let truth = PolynomialFit::new(1e-3, -1.2, 600.0);
        let mask = draw(1280, 720, &[truth, PolynomialFit::new(0.0, 0.0, 1100.0)]);

        let outcome = engine().sliding_window(&mask).unwrap();
        let left_windows: Vec<_> = outcome
            .windows
            .iter()
            .filter(|w| w.side == Side::Left)
            .collect();

        assert_eq!(left_windows[0].y_high, 720);
        assert_eq!(left_windows[8].y_low, 0);
        assert!(left_windows[8].x_low > left_windows[0].x_low + 100);

        let fit = outcome.left.fit.fit().copied().unwrap();
        assert!((fit.project(0.0) - 600.0).abs() < 2.0);
        assert!((fit.project(719.0) - truth.project(719.0)).abs() < 2.0);
    }

    #[test]
    fn test_sliding_window_missing_side() {
        let mask = draw(1280, 720, &[PolynomialFit::new(0.0, 0.0, 290.0)]);

        let outcome = engine().sliding_window(&mask).unwrap();
        assert!(outcome.left.fit.is_valid());
        assert_eq!(outcome.right.fit, LaneFit::Invalid(FitFailure::NoPixels));
        assert!(outcome.right.pixels.is_empty());
        assert!(outcome.fits().is_none());
    }

    #[test]
    fn test_sliding_window_skips_remainder_rows() {
        // 17 rows over 9 bands of one row: rows 0..8 are outside every band.
        let mask = BinaryMask::from_fn(64, 17, |x, y| y < 8 && (x == 10 || x == 50)).unwrap();

        let outcome = engine().sliding_window(&mask).unwrap();
        assert!(outcome.windows.iter().all(|w| w.y_low >= 8));
        assert!(outcome.left.pixels.is_empty());
        assert!(outcome.right.pixels.is_empty());
    }

    #[test]
    fn test_sliding_window_mask_too_short() {
        let mask = BinaryMask::from_fn(64, 4, |_, _| false).unwrap();
        assert!(matches!(
            engine().sliding_window(&mask),
            Err(Error::MaskTooShort {
                height: 4,
                windows: 9
            })
        ));
    }

    #[test]
    fn test_targeted_selects_corridor() {
        let left_prior = PolynomialFit::new(0.0, 0.0, 300.0);
        let right_prior = PolynomialFit::new(0.0, 0.0, 1000.0);

        // Markings moved 40 px right, plus a noise column outside both corridors.
        let mask = draw(
            1280,
            720,
            &[
                PolynomialFit::new(0.0, 0.0, 340.0),
                PolynomialFit::new(0.0, 0.0, 1040.0),
                PolynomialFit::new(0.0, 0.0, 650.0),
            ],
        );

        let outcome = engine().targeted(&mask, &left_prior, &right_prior);
        assert_eq!(outcome.mode, SearchMode::Targeted);
        assert!(outcome.windows.is_empty());
        assert!(outcome.left.pixels.iter().all(|p| p.x >= 339 && p.x <= 341));
        assert!(outcome.right.pixels.iter().all(|p| p.x >= 1039 && p.x <= 1041));
        assert_eq!(outcome.left.pixels.len(), 720 * 3);

        let (left, right) = outcome.fits().unwrap();
        assert!((left.project(719.0) - 340.0).abs() < 1e-6);
        assert!((right.project(719.0) - 1040.0).abs() < 1e-6);
    }

    #[test]
    fn test_targeted_margin_is_exclusive() {
        let prior = PolynomialFit::new(0.0, 0.0, 300.0);
        let mask = BinaryMask::from_fn(1280, 720, |x, _| x == 200 || x == 201).unwrap();

        let outcome = engine().targeted(&mask, &prior, &prior);
        assert!(outcome.left.pixels.iter().all(|p| p.x == 201));
        assert_eq!(outcome.left.pixels.len(), 720);
    }

    #[test]
    fn test_targeted_empty_corridor() {
        let mask = draw(1280, 720, &[PolynomialFit::new(0.0, 0.0, 290.0)]);
        let outcome = engine().targeted(
            &mask,
            &PolynomialFit::new(0.0, 0.0, 290.0),
            &PolynomialFit::new(0.0, 0.0, 990.0),
        );

        assert!(outcome.left.fit.is_valid());
        assert_eq!(outcome.right.fit, LaneFit::Invalid(FitFailure::NoPixels));
    }
}
