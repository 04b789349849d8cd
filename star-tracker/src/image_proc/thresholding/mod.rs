//! Threshold selection for star detection
//!
//! This module picks the brightness cutoff separating sky background from
//! star signal. Two automatic strategies are provided:
//!
//! - **Percentile** ([`percent_threshold`]): keep a fixed share of the brightest
//!   pixels as signal. Cheap, and well suited to sparse star fields.
//! - **Otsu** ([`otsu_threshold`]): maximize the between-class variance of the
//!   background and signal populations over a search range of candidate cutoffs.
//!
//! A pixel counts as signal when its brightness is `>= threshold`.

pub mod histogram;

use ndarray::{Array2, ArrayView2};
use serde::{Deserialize, Serialize};

use crate::error::{Error, Result};
use crate::image_proc::image::ensure_not_empty;
pub use histogram::{Histogram, BRIGHTNESS_LEVELS};

/// Default signal fraction for the percentile strategy (top 0.1% is signal).
pub const DEFAULT_PERCENTILE_FRACTION: f64 = 0.999;

/// How the detection threshold is chosen for a frame.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(tag = "method", rename_all = "snake_case")]
pub enum ThresholdMethod {
    /// Cutoff below which `fraction` of the pixels lie
    Percentile {
        fraction: f64,
        #[serde(default = "default_bins")]
        bins: usize,
    },
    /// Between-class variance maximization over a search range
    Otsu {
        #[serde(default)]
        search: OtsuSearch,
    },
    /// Caller-supplied cutoff
    Fixed { value: u8 },
}

impl Default for ThresholdMethod {
    fn default() -> Self {
        Self::Percentile {
            fraction: DEFAULT_PERCENTILE_FRACTION,
            bins: BRIGHTNESS_LEVELS,
        }
    }
}

fn default_bins() -> usize {
    BRIGHTNESS_LEVELS
}

/// Candidate cutoffs tried by [`otsu_threshold`]: `lower`, `lower + step`, ...
/// up to and including `upper` when it falls on the grid.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct OtsuSearch {
    pub lower: u8,
    pub upper: u8,
    pub step: u8,
}

impl Default for OtsuSearch {
    fn default() -> Self {
        Self {
            lower: 0,
            upper: 255,
            step: 1,
        }
    }
}

impl OtsuSearch {
    fn validate(&self) -> Result<()> {
        if self.step == 0 {
            return Err(Error::invalid("Otsu search step must be at least 1"));
        }
        if self.lower > self.upper {
            return Err(Error::invalid(format!(
                "Otsu search range is empty: lower {} > upper {}",
                self.lower, self.upper
            )));
        }
        Ok(())
    }
}

impl Histogram {
    /// Select a threshold from an already counted histogram.
    pub fn threshold(&self, method: &ThresholdMethod) -> Result<u8> {
        match *method {
            ThresholdMethod::Percentile { fraction, bins } => {
                percent_threshold_from_histogram(self, bins, fraction)
            }
            ThresholdMethod::Otsu { search } => otsu_threshold_from_histogram(self, &search),
            ThresholdMethod::Fixed { value } => Ok(value),
        }
    }
}

/// Select a threshold for `image` with the given method.
pub fn select_threshold(image: &ArrayView2<u8>, method: &ThresholdMethod) -> Result<u8> {
    ensure_not_empty(image)?;
    Histogram::from_image(image).threshold(method)
}

/// Percentile threshold: the cutoff below which `fraction` of pixels lie.
///
/// Brightness values are grouped into `bins` equal-width bins. Walking down
/// from the brightest bin, counts are accumulated until they cover
/// `1 - fraction` of the image; the darkest brightness seen in that bin is
/// returned. With `fraction = 0.999` roughly the brightest 0.1% of pixels end
/// up at or above the threshold.
///
/// # Errors
/// `InvalidArgument` when the image is empty, `fraction` is not strictly
/// between 0 and 1, or `bins` is not in `1..=256`.
///
/// # Examples
/// ```rust
/// use ndarray::Array2;
/// use star_tracker::image_proc::thresholding::percent_threshold;
///
/// let flat = Array2::from_elem((8, 8), 42u8);
/// assert_eq!(percent_threshold(&flat.view(), 256, 0.999).unwrap(), 42);
/// ```
pub fn percent_threshold(image: &ArrayView2<u8>, bins: usize, fraction: f64) -> Result<u8> {
    ensure_not_empty(image)?;
    percent_threshold_from_histogram(&Histogram::from_image(image), bins, fraction)
}

/// [`percent_threshold`] on a precomputed histogram.
pub fn percent_threshold_from_histogram(
    histogram: &Histogram,
    bins: usize,
    fraction: f64,
) -> Result<u8> {
    if !(fraction > 0.0 && fraction < 1.0) {
        return Err(Error::invalid(format!(
            "percentile fraction must be in (0, 1), got {fraction}"
        )));
    }
    if bins == 0 || bins > BRIGHTNESS_LEVELS {
        return Err(Error::invalid(format!(
            "histogram bins must be in 1..={BRIGHTNESS_LEVELS}, got {bins}"
        )));
    }
    if histogram.is_empty() {
        return Err(Error::invalid("cannot threshold an empty histogram"));
    }

    let mut binned = vec![0u64; bins];
    let mut bin_floor = vec![u8::MAX; bins];
    for (level, &count) in histogram.counts().iter().enumerate() {
        if count == 0 {
            continue;
        }
        let bin = level * bins / BRIGHTNESS_LEVELS;
        binned[bin] += count;
        bin_floor[bin] = bin_floor[bin].min(level as u8);
    }

    let target = (1.0 - fraction) * histogram.total() as f64;
    let mut accumulated = 0u64;
    for bin in (0..bins).rev() {
        if binned[bin] == 0 {
            continue;
        }
        accumulated += binned[bin];
        if accumulated as f64 >= target {
            return Ok(bin_floor[bin]);
        }
    }

    // Only reachable through rounding; the full histogram always covers the target
    histogram
        .min_value()
        .ok_or_else(|| Error::invalid("cannot threshold an empty histogram"))
}

/// Otsu threshold: the candidate cutoff maximizing between-class variance.
///
/// For each candidate `t` from `search`, pixels `< t` form the background and
/// pixels `>= t` the signal. The candidate with the largest
/// `w_bg * w_fg * (mean_bg - mean_fg)^2` wins; ties keep the lowest candidate.
///
/// A flat image returns its only brightness. When no candidate splits the
/// pixels into two non-empty classes, `search.lower` is returned.
///
/// # Examples
/// ```rust
/// use ndarray::Array2;
/// use star_tracker::image_proc::thresholding::{otsu_threshold, OtsuSearch};
///
/// // Dim sky on the left, bright star on the right
/// let image = Array2::from_shape_fn((4, 8), |(_, x)| if x < 6 { 10u8 } else { 200 });
/// let t = otsu_threshold(&image.view(), &OtsuSearch::default()).unwrap();
/// assert!(t > 10 && t <= 200);
/// ```
pub fn otsu_threshold(image: &ArrayView2<u8>, search: &OtsuSearch) -> Result<u8> {
    ensure_not_empty(image)?;
    otsu_threshold_from_histogram(&Histogram::from_image(image), search)
}

/// [`otsu_threshold`] on a precomputed histogram.
pub fn otsu_threshold_from_histogram(histogram: &Histogram, search: &OtsuSearch) -> Result<u8> {
    search.validate()?;
    let (min_val, max_val) = match (histogram.min_value(), histogram.max_value()) {
        (Some(min), Some(max)) => (min, max),
        _ => return Err(Error::invalid("cannot threshold an empty histogram")),
    };

    // Handle edge case of flat image
    if min_val == max_val {
        return Ok(min_val);
    }

    // Prefix sums: entry t covers levels strictly below t
    let mut cum_count = [0u64; BRIGHTNESS_LEVELS + 1];
    let mut cum_weighted = [0f64; BRIGHTNESS_LEVELS + 1];
    for (level, &count) in histogram.counts().iter().enumerate() {
        cum_count[level + 1] = cum_count[level] + count;
        cum_weighted[level + 1] = cum_weighted[level] + level as f64 * count as f64;
    }

    let total = histogram.total() as f64;
    let total_weighted = cum_weighted[BRIGHTNESS_LEVELS];

    let mut best: Option<(u8, f64)> = None;
    for t in (search.lower..=search.upper).step_by(search.step as usize) {
        let n_bg = cum_count[t as usize] as f64;
        let n_fg = total - n_bg;

        // Both classes need pixels for the split to mean anything
        if n_bg == 0.0 || n_fg == 0.0 {
            continue;
        }

        let mean_bg = cum_weighted[t as usize] / n_bg;
        let mean_fg = (total_weighted - cum_weighted[t as usize]) / n_fg;
        let variance = (n_bg / total) * (n_fg / total) * (mean_bg - mean_fg).powi(2);

        match best {
            Some((_, best_variance)) if variance <= best_variance => {}
            _ => best = Some((t, variance)),
        }
    }

    Ok(best.map_or(search.lower, |(t, _)| t))
}

/// Apply thresholding to an image and return a binary mask
///
/// # Returns
///
/// A mask where true marks a signal pixel (`>= threshold`)
pub fn apply_threshold(image: &ArrayView2<u8>, threshold: u8) -> Array2<bool> {
    image.mapv(|v| v >= threshold)
}
