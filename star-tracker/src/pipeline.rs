//! End-to-end star extraction.
//!
//! Runs threshold selection, labeling, selection and masking over one frame
//! with the parameters of an [`ExtractionConfig`], logging the time spent in
//! each stage.

use std::path::Path;
use std::time::Instant;

use image::RgbImage;
use ndarray::{Array2, ArrayView2};

use crate::config::ExtractionConfig;
use crate::error::Result;
use crate::image_proc::detection::{label_blobs, select_indices, Blob, LabeledImage};
use crate::image_proc::image::{
    combine_images, ensure_not_empty, isolate_blobs, isolate_labels, load_brightness,
    write_combined, MaskPolicy,
};
use crate::image_proc::thresholding::Histogram;

/// Result of running the pipeline over one frame.
#[derive(Debug, Clone)]
pub struct Extraction {
    /// Brightness cutoff used for labeling
    pub threshold: u8,
    /// Every detected blob and the label image they came from
    pub labeled: LabeledImage,
    /// Indices into `labeled.blobs` of the blobs that survived selection,
    /// in selection order
    pub selected: Vec<usize>,
    /// Secondary array: frame values inside the mask, zero elsewhere
    pub isolated: Array2<u8>,
}

impl Extraction {
    /// All blobs found above the threshold, in discovery order.
    pub fn blobs(&self) -> &[Blob] {
        &self.labeled.blobs
    }

    /// The blobs that survived selection, in selection order.
    pub fn selected_blobs(&self) -> Vec<Blob> {
        self.selected
            .iter()
            .map(|&index| self.labeled.blobs[index])
            .collect()
    }

    /// Composite of `primary` masked by this extraction.
    pub fn composite(&self, primary: &ArrayView2<u8>) -> Result<RgbImage> {
        combine_images(primary, &self.isolated.view())
    }
}

/// Extract stars from a brightness frame.
///
/// # Arguments
/// * `image` - Brightness frame indexed `[[y, x]]`
/// * `config` - Threshold, labeling, selection and mask parameters
///
/// # Returns
/// The threshold, the labeled blobs, the selection and the isolated frame.
///
/// # Errors
/// `InvalidArgument` for an empty frame or out-of-range threshold parameters.
///
/// # Examples
/// ```rust
/// use ndarray::Array2;
/// use star_tracker::config::ExtractionConfig;
/// use star_tracker::image_proc::ThresholdMethod;
/// use star_tracker::pipeline::extract_stars;
///
/// let mut frame = Array2::from_elem((16, 16), 10u8);
/// frame[[4, 5]] = 220;
/// frame[[4, 6]] = 200;
///
/// let config = ExtractionConfig {
///     threshold: ThresholdMethod::Fixed { value: 100 },
///     ..Default::default()
/// };
/// let extraction = extract_stars(&frame.view(), &config).unwrap();
/// assert_eq!(extraction.blobs().len(), 1);
/// assert_eq!(extraction.isolated[[4, 5]], 220);
/// assert_eq!(extraction.isolated[[0, 0]], 0);
/// ```
pub fn extract_stars(image: &ArrayView2<u8>, config: &ExtractionConfig) -> Result<Extraction> {
    ensure_not_empty(image)?;
    let (height, width) = image.dim();
    let total = Instant::now();

    let start = Instant::now();
    let histogram = if config.parallel_histogram {
        Histogram::from_image_striped(image, config.stripe_rows)
    } else {
        Histogram::from_image(image)
    };
    let threshold = histogram.threshold(&config.threshold)?;
    log::debug!(
        "Threshold {} ({} signal pixels) selected in {:?}",
        threshold,
        histogram.count_at_or_above(threshold),
        start.elapsed()
    );

    let start = Instant::now();
    let labeled = label_blobs(image, threshold, config.connectivity)?;
    log::debug!(
        "Found {} blobs in {:?}",
        labeled.blobs.len(),
        start.elapsed()
    );

    let selected = select_indices(&labeled.blobs, &config.selection, config.min_pixels);

    let start = Instant::now();
    let isolated = match config.mask {
        MaskPolicy::BoundingBox { margin } => {
            let kept: Vec<Blob> = selected.iter().map(|&i| labeled.blobs[i]).collect();
            isolate_blobs(image, &kept, margin)
        }
        MaskPolicy::ExactPixels => isolate_labels(image, &labeled, &selected)?,
    };
    log::debug!("Built mask in {:?}", start.elapsed());

    log::info!(
        "Extracted {} of {} blobs from {}x{} frame at threshold {} in {:?}",
        selected.len(),
        labeled.blobs.len(),
        width,
        height,
        threshold,
        total.elapsed()
    );

    Ok(Extraction {
        threshold,
        labeled,
        selected,
        isolated,
    })
}

/// Load a frame from `input`, extract stars and write the composite to
/// `output`.
pub fn extract_stars_from_file(
    input: impl AsRef<Path>,
    output: impl AsRef<Path>,
    config: &ExtractionConfig,
) -> Result<Extraction> {
    let start = Instant::now();
    let frame = load_brightness(input.as_ref())?;
    log::debug!(
        "Loaded {} in {:?}",
        input.as_ref().display(),
        start.elapsed()
    );

    let extraction = extract_stars(&frame.view(), config)?;
    write_combined(&frame.view(), &extraction.isolated.view(), output)?;
    Ok(extraction)
}
