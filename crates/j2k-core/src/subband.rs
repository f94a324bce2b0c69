//! Subband and decomposition data model.
//!
//! One level of the 2D wavelet transform turns a `width x height` tile into
//! four subbands:
//!
//! ```text
//! +----------------+----------------+
//! | approximation  |  horizontal    |   row-lowpass rows: ceil(h/2)
//! | ceil x ceil    |  floor x ceil  |
//! +----------------+----------------+
//! |   vertical     |   diagonal     |   row-highpass rows: floor(h/2)
//! | ceil x floor   |  floor x floor |
//! +----------------+----------------+
//!   ceil(w/2) cols   floor(w/2) cols
//! ```
//!
//! `horizontal` is highpass along rows and lowpass along columns; `vertical`
//! is the opposite. The quadrant picture above is also the in-memory layout
//! the separable passes produce, see [`SubbandSet::from_quadrants`].
//!
//! A [`Decomposition`] is a flat list of per-level detail records plus the
//! deepest approximation. Each level's approximation is implicit: it is the
//! input of the next level.

use crate::error::{Error, Result};

/// Lowpass length for a line of `n` samples.
#[inline]
pub const fn low_len(n: usize) -> usize {
    n.div_ceil(2)
}

/// Highpass length for a line of `n` samples.
#[inline]
pub const fn high_len(n: usize) -> usize {
    n / 2
}

/// Largest decomposition depth for a tile.
///
/// Counts how many times both dimensions can be halved (rounding up) while
/// each level input is still at least 2x2, so no subband is ever smaller
/// than 1x1.
pub fn max_levels(width: usize, height: usize) -> u32 {
    let (mut w, mut h) = (width, height);
    let mut levels = 0;
    while w >= 2 && h >= 2 {
        levels += 1;
        w = low_len(w);
        h = low_len(h);
    }
    levels
}

/// The four subbands of one 2D transform level.
#[derive(Debug, Clone, PartialEq)]
pub struct SubbandSet<T> {
    /// Lowpass along both axes.
    pub approximation: Vec<T>,
    /// Highpass along rows, lowpass along columns.
    pub horizontal: Vec<T>,
    /// Lowpass along rows, highpass along columns.
    pub vertical: Vec<T>,
    /// Highpass along both axes.
    pub diagonal: Vec<T>,
    /// Width of the tile that produced this set.
    pub width: usize,
    /// Height of the tile that produced this set.
    pub height: usize,
}

impl<T: Copy + Default> SubbandSet<T> {
    /// Approximation subband dimensions.
    pub fn approx_dims(&self) -> (usize, usize) {
        (low_len(self.width), low_len(self.height))
    }

    /// Horizontal detail dimensions.
    pub fn horizontal_dims(&self) -> (usize, usize) {
        (high_len(self.width), low_len(self.height))
    }

    /// Vertical detail dimensions.
    pub fn vertical_dims(&self) -> (usize, usize) {
        (low_len(self.width), high_len(self.height))
    }

    /// Diagonal detail dimensions.
    pub fn diagonal_dims(&self) -> (usize, usize) {
        (high_len(self.width), high_len(self.height))
    }

    /// Splits a quadrant-layout buffer into four subbands.
    pub fn from_quadrants(buf: &[T], width: usize, height: usize) -> Result<Self> {
        crate::error::check_buffer_len(buf.len(), width, height)?;
        let (lw, lh) = (low_len(width), low_len(height));

        let mut set = Self {
            approximation: Vec::with_capacity(lw * lh),
            horizontal: Vec::with_capacity((width - lw) * lh),
            vertical: Vec::with_capacity(lw * (height - lh)),
            diagonal: Vec::with_capacity((width - lw) * (height - lh)),
            width,
            height,
        };

        for (y, row) in buf.chunks_exact(width.max(1)).enumerate().take(height) {
            let (left, right) = row.split_at(lw);
            if y < lh {
                set.approximation.extend_from_slice(left);
                set.horizontal.extend_from_slice(right);
            } else {
                set.vertical.extend_from_slice(left);
                set.diagonal.extend_from_slice(right);
            }
        }

        Ok(set)
    }

    /// Packs the subbands back into the quadrant layout.
    pub fn to_quadrants(&self) -> Result<Vec<T>> {
        self.validate()?;
        let (lw, lh) = self.approx_dims();
        let hw = self.width - lw;

        let mut buf = Vec::with_capacity(self.width * self.height);
        for y in 0..self.height {
            if y < lh {
                buf.extend_from_slice(&self.approximation[y * lw..(y + 1) * lw]);
                buf.extend_from_slice(&self.horizontal[y * hw..(y + 1) * hw]);
            } else {
                let r = y - lh;
                buf.extend_from_slice(&self.vertical[r * lw..(r + 1) * lw]);
                buf.extend_from_slice(&self.diagonal[r * hw..(r + 1) * hw]);
            }
        }
        Ok(buf)
    }

    /// Checks every subband length against the tile dimensions.
    pub fn validate(&self) -> Result<()> {
        let bands = [
            ("approximation", self.approximation.len(), self.approx_dims()),
            ("horizontal", self.horizontal.len(), self.horizontal_dims()),
            ("vertical", self.vertical.len(), self.vertical_dims()),
            ("diagonal", self.diagonal.len(), self.diagonal_dims()),
        ];
        for (name, len, (w, h)) in bands {
            if len != w * h {
                return Err(Error::parameter(format!(
                    "{name} subband holds {len} samples, expected {w}x{h} for a {}x{} tile",
                    self.width, self.height
                )));
            }
        }
        Ok(())
    }

    /// Separates the approximation from the detail record.
    pub fn into_parts(self) -> (Vec<T>, DetailLevel<T>) {
        (
            self.approximation,
            DetailLevel {
                width: self.width,
                height: self.height,
                horizontal: self.horizontal,
                vertical: self.vertical,
                diagonal: self.diagonal,
            },
        )
    }

    /// Rebuilds a set from an approximation and a detail record.
    pub fn from_parts(approximation: Vec<T>, level: DetailLevel<T>) -> Self {
        Self {
            approximation,
            horizontal: level.horizontal,
            vertical: level.vertical,
            diagonal: level.diagonal,
            width: level.width,
            height: level.height,
        }
    }

    /// Sum of squares of the approximation subband.
    pub fn approximation_energy(&self) -> f64
    where
        T: Into<f64>,
    {
        energy(&self.approximation)
    }

    /// Sum of squares over the three detail subbands.
    pub fn detail_energy(&self) -> f64
    where
        T: Into<f64>,
    {
        energy(&self.horizontal) + energy(&self.vertical) + energy(&self.diagonal)
    }
}

fn energy<T: Copy + Into<f64>>(band: &[T]) -> f64 {
    band.iter()
        .map(|&v| {
            let v: f64 = v.into();
            v * v
        })
        .sum()
}

/// Detail subbands of one decomposition level.
#[derive(Debug, Clone, PartialEq)]
pub struct DetailLevel<T> {
    /// Width of this level's input.
    pub width: usize,
    /// Height of this level's input.
    pub height: usize,
    /// Highpass along rows.
    pub horizontal: Vec<T>,
    /// Highpass along columns.
    pub vertical: Vec<T>,
    /// Highpass along both axes.
    pub diagonal: Vec<T>,
}

/// Multi-level wavelet pyramid.
///
/// `levels[0]` is the finest level (operates on the original tile);
/// `approximation` is the lowpass output of the last level.
#[derive(Debug, Clone, PartialEq)]
pub struct Decomposition<T> {
    /// Deepest approximation subband.
    pub approximation: Vec<T>,
    /// Original tile width.
    pub width: usize,
    /// Original tile height.
    pub height: usize,
    /// Detail records, finest first.
    pub levels: Vec<DetailLevel<T>>,
}

impl<T> Decomposition<T> {
    /// Number of levels.
    pub fn level_count(&self) -> usize {
        self.levels.len()
    }

    /// Dimensions of the deepest approximation.
    pub fn approx_dims(&self) -> (usize, usize) {
        match self.levels.last() {
            Some(level) => (low_len(level.width), low_len(level.height)),
            None => (self.width, self.height),
        }
    }

    /// Total number of coefficients held by the pyramid.
    pub fn coefficient_count(&self) -> usize {
        self.approximation.len()
            + self
                .levels
                .iter()
                .map(|l| l.horizontal.len() + l.vertical.len() + l.diagonal.len())
                .sum::<usize>()
    }
}
