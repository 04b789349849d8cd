//! Brightness histograms for 8-bit frames.
//!
//! Counting is the only part of the pipeline that splits cleanly across
//! threads: [`Histogram::from_image_striped`] counts horizontal stripes in
//! parallel and sums the partial histograms. The result is identical to the
//! sequential [`Histogram::from_image`].

use ndarray::{ArrayView2, Axis};
use rayon::prelude::*;

/// Number of distinct 8-bit brightness levels.
pub const BRIGHTNESS_LEVELS: usize = 256;

/// Pixel counts per brightness level.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Histogram {
    counts: [u64; BRIGHTNESS_LEVELS],
    total: u64,
}

impl Histogram {
    /// Histogram with no pixels counted.
    pub fn empty() -> Self {
        Self {
            counts: [0; BRIGHTNESS_LEVELS],
            total: 0,
        }
    }

    /// Count every pixel of `image` on the calling thread.
    pub fn from_image(image: &ArrayView2<u8>) -> Self {
        let mut histogram = Self::empty();
        for &value in image.iter() {
            histogram.counts[value as usize] += 1;
        }
        histogram.total = image.len() as u64;
        histogram
    }

    /// Count `image` in horizontal stripes of `stripe_rows` rows, one rayon
    /// task per stripe.
    ///
    /// A `stripe_rows` of zero is treated as one row per stripe.
    pub fn from_image_striped(image: &ArrayView2<u8>, stripe_rows: usize) -> Self {
        image
            .axis_chunks_iter(Axis(0), stripe_rows.max(1))
            .into_par_iter()
            .map(|stripe| Self::from_image(&stripe))
            .reduce(Self::empty, |mut acc, part| {
                acc.merge(&part);
                acc
            })
    }

    /// Add the counts of another histogram into this one.
    pub fn merge(&mut self, other: &Self) {
        for (count, extra) in self.counts.iter_mut().zip(other.counts.iter()) {
            *count += extra;
        }
        self.total += other.total;
    }

    /// Counts indexed by brightness.
    pub fn counts(&self) -> &[u64; BRIGHTNESS_LEVELS] {
        &self.counts
    }

    /// Number of pixels with exactly `value` brightness.
    pub fn count(&self, value: u8) -> u64 {
        self.counts[value as usize]
    }

    /// Total number of pixels counted.
    pub fn total(&self) -> u64 {
        self.total
    }

    pub fn is_empty(&self) -> bool {
        self.total == 0
    }

    /// Darkest brightness present, if any pixel was counted.
    pub fn min_value(&self) -> Option<u8> {
        self.counts
            .iter()
            .position(|&c| c > 0)
            .map(|level| level as u8)
    }

    /// Brightest brightness present, if any pixel was counted.
    pub fn max_value(&self) -> Option<u8> {
        self.counts
            .iter()
            .rposition(|&c| c > 0)
            .map(|level| level as u8)
    }

    /// Number of pixels at or above `threshold`.
    pub fn count_at_or_above(&self, threshold: u8) -> u64 {
        self.counts[threshold as usize..].iter().sum()
    }
}

impl Default for Histogram {
    fn default() -> Self {
        Self::empty()
    }
}
