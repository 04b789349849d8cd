//! Image processing for star extraction
//!
//! This module provides the stages of the extraction pipeline: threshold
//! selection, connected-component labeling of the thresholded frame, blob
//! selection, and compositing of the isolated stars into an output image.

pub mod detection;
pub mod image;
pub mod thresholding;

// Re-export key functionality for easier access
pub use detection::{find_blobs, label_blobs, reduce, Blob, BlobSelection, Connectivity};
pub use image::{
    brightness_from_raw, combine_images, isolate_blobs, load_brightness, write_combined,
    ImageSize, MaskPolicy,
};
pub use thresholding::{otsu_threshold, percent_threshold, select_threshold, ThresholdMethod};
