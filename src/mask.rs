use ndarray::prelude::*;
use serde_derive::{Deserialize, Serialize};

use crate::error::Error;
use crate::fit::{LaneFit, PolynomialFit};

/// Bird's-eye binary mask of lane-marking candidates.
///
/// Indexed `[row, column]`, origin top-left, rows growing downward.
#[derive(Debug, Clone, PartialEq)]
pub struct BinaryMask {
    data: Array2<bool>,
}

impl BinaryMask {
    pub fn from_array(data: Array2<bool>) -> Result<Self, Error> {
        if data.is_empty() {
            return Err(Error::EmptyMask);
        }

        Ok(Self { data })
    }

    /// Builds a mask from a row-major buffer; any non-zero value is set.
    pub fn from_raw(width: u32, height: u32, raw: &[u8]) -> Result<Self, Error> {
        let expected = width as usize * height as usize;
        if expected == 0 {
            return Err(Error::EmptyMask);
        }

        if raw.len() != expected {
            return Err(Error::MaskSizeMismatch {
                expected,
                actual: raw.len(),
            });
        }

        let data = Array2::from_shape_fn((height as usize, width as usize), |(y, x)| {
            raw[y * width as usize + x] != 0
        });

        Ok(Self { data })
    }

    pub fn from_fn<F>(width: u32, height: u32, mut f: F) -> Result<Self, Error>
    where
        F: FnMut(u32, u32) -> bool,
    {
        let data = Array2::from_shape_fn((height as usize, width as usize), |(y, x)| {
            f(x as u32, y as u32)
        });

        Self::from_array(data)
    }

    #[inline]
    pub fn width(&self) -> u32 {
        self.data.ncols() as u32
    }

    #[inline]
    pub fn height(&self) -> u32 {
        self.data.nrows() as u32
    }

    /// `(width, height)`
    #[inline]
    pub fn dims(&self) -> (u32, u32) {
        (self.width(), self.height())
    }

    #[inline]
    pub fn get(&self, x: u32, y: u32) -> bool {
        self.data
            .get((y as usize, x as usize))
            .copied()
            .unwrap_or(false)
    }

    /// Set pixels as `(x, y)`, row by row.
    pub fn nonzero(&self) -> impl Iterator<Item = (u32, u32)> + '_ {
        self.data
            .indexed_iter()
            .filter(|&(_, &v)| v)
            .map(|((y, x), _)| (x as u32, y as u32))
    }

    pub fn count_nonzero(&self) -> usize {
        self.data.iter().filter(|&&v| v).count()
    }

    /// Per-column count of set pixels over rows `rows.0..rows.1`.
    pub fn column_histogram(&self, rows: (u32, u32)) -> Vec<u32> {
        let (start, end) = (rows.0 as usize, (rows.1 as usize).min(self.data.nrows()));
        let mut histogram = vec![0u32; self.data.ncols()];

        if start >= end {
            return histogram;
        }

        for row in self.data.slice(s![start..end, ..]).rows() {
            for (bin, &v) in histogram.iter_mut().zip(row.iter()) {
                if v {
                    *bin += 1;
                }
            }
        }

        histogram
    }
}

/// One candidate lane-marking pixel.
#[derive(Serialize, Deserialize, Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct Pixel {
    pub x: u32,
    pub y: u32,
}

/// Pixels attributed to one boundary within one frame.
#[derive(Serialize, Deserialize, Debug, Clone, Default, PartialEq)]
pub struct PixelSet {
    pixels: Vec<Pixel>,
}

impl PixelSet {
    #[inline]
    pub fn new() -> Self {
        Self::default()
    }

    #[inline]
    pub fn push(&mut self, x: u32, y: u32) {
        self.pixels.push(Pixel { x, y });
    }

    #[inline]
    pub fn extend(&mut self, other: PixelSet) {
        self.pixels.extend(other.pixels);
    }

    #[inline]
    pub fn len(&self) -> usize {
        self.pixels.len()
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.pixels.is_empty()
    }

    #[inline]
    pub fn iter(&self) -> impl Iterator<Item = &Pixel> {
        self.pixels.iter()
    }

    /// Mean column, `None` for an empty set.
    pub fn mean_x(&self) -> Option<f64> {
        if self.pixels.is_empty() {
            return None;
        }

        let sum: f64 = self.pixels.iter().map(|p| p.x as f64).sum();
        Some(sum / self.pixels.len() as f64)
    }

    /// Degree-2 fit of `x` as a function of `y`.
    #[inline]
    pub fn fit(&self) -> LaneFit {
        PolynomialFit::fit_pixels(self.pixels.iter().map(|p| (p.x, p.y)))
    }
}

impl FromIterator<(u32, u32)> for PixelSet {
    fn from_iter<I: IntoIterator<Item = (u32, u32)>>(iter: I) -> Self {
        Self {
            pixels: iter.into_iter().map(|(x, y)| Pixel { x, y }).collect(),
        }
    }
}
