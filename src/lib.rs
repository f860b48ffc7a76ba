pub mod boundary;
pub mod config;
pub mod error;
pub mod estimate;
pub mod fit;
pub mod history;
pub mod lane;
pub mod mask;
pub mod math;
pub mod search;
pub mod tracker;

pub use boundary::LaneBoundary;
pub use config::{PixelScale, SearchConfig, TrackerConfig, WidthRange};
pub use error::Error;
pub use estimate::LaneEstimate;
pub use fit::{FitFailure, LaneFit, PolynomialFit};
pub use history::FitHistory;
pub use lane::{LaneGeometry, LaneModel, LanePolylines};
pub use mask::{BinaryMask, PixelSet};
pub use search::{PixelSearchEngine, SearchMode, SearchOutcome, SearchWindow, Side};
pub use tracker::{LaneTracker, TrackerState, TrackerStats};

use nalgebra as na;
use std::collections::hash_map::Entry;
use std::collections::HashMap;
use std::fmt;

pub trait Float:
    num_traits::FromPrimitive + na::RealField + Copy + fmt::Debug + PartialEq + 'static
{
}

impl<T> Float for T where
    T: num_traits::FromPrimitive + na::RealField + Copy + fmt::Debug + PartialEq + 'static
{
}

pub trait Tracking {
    fn update(&mut self, mask: &BinaryMask, src: &str) -> Result<LaneEstimate, Error>;
    fn reset(&mut self, src: &str);
    fn estimate(&self, src: &str) -> Option<LaneEstimate>;
}

/// One [`LaneTracker`] per video source, created on the first frame of the source.
pub struct MultiStreamTracker {
    config: TrackerConfig,
    streams: HashMap<String, LaneTracker>,
}

impl MultiStreamTracker {
    pub fn new(config: TrackerConfig) -> Result<Self, Error> {
        config.validate()?;

        Ok(Self {
            config,
            streams: HashMap::new(),
        })
    }

    #[inline]
    pub fn tracker(&self, src: &str) -> Option<&LaneTracker> {
        self.streams.get(src)
    }

    #[inline]
    pub fn sources(&self) -> impl Iterator<Item = &str> {
        self.streams.keys().map(String::as_str)
    }

    pub fn remove(&mut self, src: &str) -> Option<LaneTracker> {
        self.streams.remove(src)
    }
}

impl Default for MultiStreamTracker {
    fn default() -> Self {
        Self {
            config: TrackerConfig::default(),
            streams: HashMap::new(),
        }
    }
}

impl crate::Tracking for MultiStreamTracker {
    fn update(&mut self, mask: &BinaryMask, src: &str) -> Result<LaneEstimate, Error> {
        let tracker = match self.streams.entry(src.to_string()) {
            Entry::Occupied(entry) => entry.into_mut(),
            Entry::Vacant(entry) => {
                tracing::debug!(src, "new lane stream");
                entry.insert(LaneTracker::new(self.config.clone())?)
            }
        };

        tracker.process(mask)
    }

    #[inline]
    fn reset(&mut self, src: &str) {
        if let Some(tracker) = self.streams.get_mut(src) {
            tracker.reset();
        }
    }

    #[inline]
    fn estimate(&self, src: &str) -> Option<LaneEstimate> {
        self.streams.get(src)?.last_estimate().cloned()
    }
}
