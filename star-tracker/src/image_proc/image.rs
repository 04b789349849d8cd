//! Frame buffers, image file I/O and output compositing.
//!
//! Brightness frames are `Array2<u8>` with shape `(height, width)`, indexed
//! `[[y, x]]`. Decoding and encoding of image files is delegated to the
//! `image` crate; this module only converts between its buffers and ndarray.
//!
//! # Coordinate System Conversions
//!
//! - **ndarray**: matrix indexing `[row, col] = [y, x]` with `(height, width)` dimensions
//! - **image crate**: graphics indexing `(x, y)` with `(width, height)` dimensions

use std::fmt;
use std::path::Path;

use image::{DynamicImage, GrayImage, Luma, RgbImage};
use ndarray::{s, Array2, ArrayView2};
use serde::{Deserialize, Serialize};

use crate::error::{Error, Result};
use crate::image_proc::detection::{Blob, LabeledImage};

/// Frame dimensions in pixels.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct ImageSize {
    /// Image width in pixels
    pub width: usize,
    /// Image height in pixels
    pub height: usize,
}

impl ImageSize {
    /// Create a new ImageSize
    pub fn from_width_height(width: usize, height: usize) -> Self {
        Self { width, height }
    }

    /// Dimensions of a `(height, width)` shaped array.
    pub fn of<T>(image: &ArrayView2<T>) -> Self {
        let (height, width) = image.dim();
        Self { width, height }
    }

    /// Get total number of pixels
    pub fn pixel_count(&self) -> usize {
        self.width * self.height
    }
}

impl From<(usize, usize)> for ImageSize {
    fn from((width, height): (usize, usize)) -> Self {
        Self::from_width_height(width, height)
    }
}

impl fmt::Display for ImageSize {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, "{}x{}", self.width, self.height)
    }
}

/// How selected blobs are turned into the per-pixel mask.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum MaskPolicy {
    /// Keep everything inside each blob's bounding box grown by `margin`
    BoundingBox {
        #[serde(default)]
        margin: usize,
    },
    /// Keep only the pixels that were labeled as part of a selected blob
    ExactPixels,
}

impl Default for MaskPolicy {
    fn default() -> Self {
        Self::BoundingBox { margin: 0 }
    }
}

pub(crate) fn ensure_not_empty<T>(image: &ArrayView2<T>) -> Result<()> {
    if image.is_empty() {
        return Err(Error::invalid(format!(
            "image must have non-zero dimensions, got {}",
            ImageSize::of(image)
        )));
    }
    Ok(())
}

/// Wrap a row-major pixel buffer as a brightness frame.
///
/// # Errors
/// `InvalidArgument` when either dimension is zero or the buffer length is
/// not `width * height`.
pub fn brightness_from_raw(pixels: Vec<u8>, size: ImageSize) -> Result<Array2<u8>> {
    if size.width == 0 || size.height == 0 {
        return Err(Error::invalid(format!(
            "image must have non-zero dimensions, got {size}"
        )));
    }
    if pixels.len() != size.pixel_count() {
        return Err(Error::invalid(format!(
            "pixel buffer holds {} values but {size} needs {}",
            pixels.len(),
            size.pixel_count()
        )));
    }
    Array2::from_shape_vec((size.height, size.width), pixels)
        .map_err(|e| Error::invalid(format!("pixel buffer does not fit {size}: {e}")))
}

/// Decode an image file into a brightness frame (8-bit luma).
pub fn load_brightness(path: impl AsRef<Path>) -> Result<Array2<u8>> {
    let path = path.as_ref();
    let decoded = image::open(path).map_err(|source| Error::Io {
        path: path.to_path_buf(),
        source,
    })?;
    let gray = decoded.to_luma8();
    let size = ImageSize::from_width_height(gray.width() as usize, gray.height() as usize);
    brightness_from_raw(gray.into_raw(), size)
}

/// Build the secondary array from bounding boxes: a pixel keeps its value when
/// [`Blob::within_threshold`] holds for any blob, otherwise it is zero.
///
/// Boxes grown past the frame edge are clipped.
pub fn isolate_blobs(image: &ArrayView2<u8>, blobs: &[Blob], margin: usize) -> Array2<u8> {
    let (height, width) = image.dim();
    let mut isolated = Array2::zeros((height, width));

    for blob in blobs {
        if let Some((x0, y0, x1, y1)) = blob.clipped_bounds(margin, width, height) {
            isolated
                .slice_mut(s![y0..=y1, x0..=x1])
                .assign(&image.slice(s![y0..=y1, x0..=x1]));
        }
    }

    isolated
}

/// Build the secondary array from exact membership: a pixel keeps its value
/// when its label belongs to one of `blob_indices` (indices into
/// `labeled.blobs`).
pub fn isolate_labels(
    image: &ArrayView2<u8>,
    labeled: &LabeledImage,
    blob_indices: &[usize],
) -> Result<Array2<u8>> {
    if image.dim() != labeled.labels.dim() {
        return Err(Error::invalid(format!(
            "label image {} does not match frame {}",
            ImageSize::of(&labeled.labels.view()),
            ImageSize::of(image)
        )));
    }

    let mut keep = vec![false; labeled.blobs.len() + 1];
    for &index in blob_indices {
        if index >= labeled.blobs.len() {
            return Err(Error::invalid(format!(
                "blob index {index} out of range for {} blobs",
                labeled.blobs.len()
            )));
        }
        keep[LabeledImage::label_of(index) as usize] = true;
    }

    let mut isolated = Array2::zeros(image.dim());
    ndarray::Zip::from(&mut isolated)
        .and(image)
        .and(&labeled.labels)
        .for_each(|out, &value, &label| {
            if keep[label as usize] {
                *out = value;
            }
        });
    Ok(isolated)
}

/// Mask `primary` with `secondary`: primary values survive where the
/// secondary array is non-zero.
pub fn combine(primary: &ArrayView2<u8>, secondary: &ArrayView2<u8>) -> Result<Array2<u8>> {
    ensure_not_empty(primary)?;
    if primary.dim() != secondary.dim() {
        return Err(Error::invalid(format!(
            "cannot combine {} frame with {} mask",
            ImageSize::of(primary),
            ImageSize::of(secondary)
        )));
    }
    Ok(ndarray::Zip::from(primary)
        .and(secondary)
        .map_collect(|&p, &m| if m != 0 { p } else { 0 }))
}

/// Combine the frames into an RGB image with the grayscale value copied to
/// all three channels.
pub fn combine_images(primary: &ArrayView2<u8>, secondary: &ArrayView2<u8>) -> Result<RgbImage> {
    let combined = combine(primary, secondary)?;
    Ok(DynamicImage::ImageLuma8(array2_to_gray_image(&combined)).to_rgb8())
}

/// Combine the frames and write the result to `path`.
///
/// The file format follows the path extension (e.g. `.bmp`, `.png`).
pub fn write_combined(
    primary: &ArrayView2<u8>,
    secondary: &ArrayView2<u8>,
    path: impl AsRef<Path>,
) -> Result<()> {
    let path = path.as_ref();
    let rgb = combine_images(primary, secondary)?;
    rgb.save(path).map_err(|source| Error::Io {
        path: path.to_path_buf(),
        source,
    })?;
    log::info!(
        "Wrote {}x{} composite to {}",
        rgb.width(),
        rgb.height(),
        path.display()
    );
    Ok(())
}

/// Converts an ndarray `Array2<u8>` to an image::GrayImage
///
/// Array index `[y, x]` maps to pixel `(x, y)`; array dimensions are
/// `(height, width)` while image dimensions are `(width, height)`.
pub fn array2_to_gray_image(arr: &Array2<u8>) -> GrayImage {
    let (height, width) = arr.dim();
    let mut img = GrayImage::new(width as u32, height as u32);

    for ((y, x), &value) in arr.indexed_iter() {
        img.put_pixel(x as u32, y as u32, Luma([value]));
    }

    img
}
