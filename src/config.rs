use std::fs;
use std::path::Path;

use serde_derive::{Deserialize, Serialize};

use crate::error::Error;

/// Vertical metres per bird's-eye pixel (30 m of road over 720 rows).
pub const DEFAULT_YM_PER_PIX: f64 = 30.0 / 720.0;

/// Horizontal metres per bird's-eye pixel (3.7 m lane over 700 columns).
pub const DEFAULT_XM_PER_PIX: f64 = 3.7 / 700.0;

/// Pixel to metre conversion of the rectified view.
#[derive(Serialize, Deserialize, Debug, Clone, Copy, PartialEq)]
#[serde(default)]
pub struct PixelScale {
    pub ym_per_pix: f64,
    pub xm_per_pix: f64,
}

impl Default for PixelScale {
    fn default() -> Self {
        Self {
            ym_per_pix: DEFAULT_YM_PER_PIX,
            xm_per_pix: DEFAULT_XM_PER_PIX,
        }
    }
}

/// Tunables of the two pixel search modes.
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
#[serde(default)]
pub struct SearchConfig {
    /// Number of horizontal bands the sliding-window search walks through.
    pub n_windows: usize,
    /// Half-width of a sliding window, in pixels.
    pub window_margin_px: u32,
    /// A window is re-centred only when it collected more pixels than this.
    pub min_pixels: usize,
    /// Half-width of the corridor around a prior fit, in pixels.
    pub targeted_margin_px: u32,
}

impl Default for SearchConfig {
    fn default() -> Self {
        Self {
            n_windows: 9,
            window_margin_px: 150,
            min_pixels: 50,
            targeted_margin_px: 100,
        }
    }
}

/// Physically plausible lane width, in metres, both ends inclusive.
#[derive(Serialize, Deserialize, Debug, Clone, Copy, PartialEq)]
#[serde(default)]
pub struct WidthRange {
    pub min: f64,
    pub max: f64,
}

impl WidthRange {
    #[inline]
    pub fn contains(&self, width_m: f64) -> bool {
        width_m >= self.min && width_m <= self.max
    }
}

impl Default for WidthRange {
    fn default() -> Self {
        Self { min: 3.0, max: 4.4 }
    }
}

#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
#[serde(default)]
pub struct TrackerConfig {
    pub scale: PixelScale,
    pub search: SearchConfig,
    /// Number of accepted fits averaged per boundary.
    pub history_depth: usize,
    pub lane_width_m: WidthRange,
    /// Row used for base x, width, offset and curvature. `None` is the bottom row.
    pub eval_row: Option<u32>,
    /// Expected `(width, height)` of every mask in the session.
    pub frame_size: Option<(u32, u32)>,
}

impl Default for TrackerConfig {
    fn default() -> Self {
        Self {
            scale: PixelScale::default(),
            search: SearchConfig::default(),
            history_depth: 3,
            lane_width_m: WidthRange::default(),
            eval_row: None,
            frame_size: None,
        }
    }
}

impl TrackerConfig {
    pub fn from_json_str(src: &str) -> Result<Self, Error> {
        let config: TrackerConfig = serde_json::from_str(src)?;
        config.validate()?;

        Ok(config)
    }

    pub fn load<P: AsRef<Path>>(path: P) -> Result<Self, Error> {
        let contents = fs::read_to_string(path)?;

        Self::from_json_str(&contents)
    }

    pub fn validate(&self) -> Result<(), Error> {
        let PixelScale {
            ym_per_pix,
            xm_per_pix,
        } = self.scale;

        if !(ym_per_pix.is_finite() && ym_per_pix > 0.0) {
            return Err(invalid(format!("ym_per_pix must be positive, got {}", ym_per_pix)));
        }

        if !(xm_per_pix.is_finite() && xm_per_pix > 0.0) {
            return Err(invalid(format!("xm_per_pix must be positive, got {}", xm_per_pix)));
        }

        if self.search.n_windows == 0 {
            return Err(invalid("n_windows must be at least 1".into()));
        }

        if self.search.window_margin_px == 0 || self.search.targeted_margin_px == 0 {
            return Err(invalid("search margins must be non-zero".into()));
        }

        if self.history_depth == 0 {
            return Err(invalid("history_depth must be at least 1".into()));
        }

        let WidthRange { min, max } = self.lane_width_m;
        if !(min.is_finite() && max.is_finite() && min < max) {
            return Err(invalid(format!("lane width range [{}, {}] is empty", min, max)));
        }

        Ok(())
    }

    /// Evaluation row for a mask of the given height.
    #[inline]
    pub fn eval_row_for(&self, height: u32) -> f64 {
        match self.eval_row {
            Some(row) => row as f64,
            None => height.saturating_sub(1) as f64,
        }
    }
}

#[inline]
fn invalid(msg: String) -> Error {
    Error::InvalidConfig(msg)
}
