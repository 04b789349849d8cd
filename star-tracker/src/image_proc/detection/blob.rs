//! Connected-region model for detected stars.
//!
//! A [`Blob`] is the bounding box of one connected group of above-threshold
//! pixels, together with the number of pixels and the summed brightness
//! (flux) of the group. The labeler grows a blob pixel by pixel; after
//! labeling finishes, blobs are plain values.
//!
//! # Coordinate System
//! - **x (columns)**: increase rightward from the left edge of the image
//! - **y (rows)**: increase downward from the top of the image
//! - **Bounds**: both min and max coordinates are inclusive
//!
//! # Examples
//!
//! ```rust
//! use star_tracker::image_proc::detection::Blob;
//!
//! let mut blob = Blob::from_pixel(10, 20, 200);
//! blob.absorb(11, 20, 180);
//! blob.absorb(11, 21, 90);
//!
//! assert_eq!(blob.width(), 2);
//! assert_eq!(blob.height(), 2);
//! assert_eq!(blob.pixel_count, 3);
//! assert_eq!(blob.flux, 470);
//!
//! assert!(blob.within_threshold(12, 22, 1));
//! assert!(!blob.within_threshold(12, 22, 0));
//! ```

use tracker_math::Point;

/// One connected region of signal pixels.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct Blob {
    /// Minimum column (x) coordinate (inclusive)
    pub min_x: usize,
    /// Maximum column (x) coordinate (inclusive)
    pub max_x: usize,
    /// Minimum row (y) coordinate (inclusive)
    pub min_y: usize,
    /// Maximum row (y) coordinate (inclusive)
    pub max_y: usize,
    /// Number of pixels absorbed into the region
    pub pixel_count: usize,
    /// Sum of the brightness of every absorbed pixel
    pub flux: u64,
}

impl Blob {
    /// Start a new blob from its seed pixel.
    pub fn from_pixel(x: usize, y: usize, brightness: u8) -> Self {
        Self {
            min_x: x,
            max_x: x,
            min_y: y,
            max_y: y,
            pixel_count: 1,
            flux: brightness as u64,
        }
    }

    /// Add a connected pixel, growing the bounding box as needed.
    pub fn absorb(&mut self, x: usize, y: usize, brightness: u8) {
        self.min_x = self.min_x.min(x);
        self.max_x = self.max_x.max(x);
        self.min_y = self.min_y.min(y);
        self.max_y = self.max_y.max(y);
        self.pixel_count += 1;
        self.flux += brightness as u64;
    }

    /// Containment test against the bounding box grown by `margin` pixels on
    /// every side.
    ///
    /// This only looks at the extent, so pixels inside the box that are not
    /// part of the region still pass.
    pub fn within_threshold(&self, x: usize, y: usize, margin: usize) -> bool {
        x.saturating_add(margin) >= self.min_x
            && x <= self.max_x.saturating_add(margin)
            && y.saturating_add(margin) >= self.min_y
            && y <= self.max_y.saturating_add(margin)
    }

    /// Width of the bounding box in pixels.
    pub fn width(&self) -> usize {
        self.max_x - self.min_x + 1
    }

    /// Height of the bounding box in pixels.
    pub fn height(&self) -> usize {
        self.max_y - self.min_y + 1
    }

    /// Area of the bounding box in square pixels.
    pub fn area(&self) -> usize {
        self.width() * self.height()
    }

    /// Centre of the bounding box in image coordinates.
    pub fn center(&self) -> Point<f64> {
        Point::new(
            (self.min_x as f64 + self.max_x as f64) / 2.0,
            (self.min_y as f64 + self.max_y as f64) / 2.0,
        )
    }

    /// Half of the larger bounding box extent.
    pub fn radius(&self) -> f64 {
        self.width().max(self.height()) as f64 / 2.0
    }

    /// Mean brightness of the absorbed pixels.
    pub fn mean_brightness(&self) -> f64 {
        self.flux as f64 / self.pixel_count as f64
    }

    /// Bounding box clipped to an image of `width` x `height` after growing it
    /// by `margin`, as inclusive `(min_x, min_y, max_x, max_y)`.
    ///
    /// Returns `None` when the grown box lies entirely outside the image.
    pub fn clipped_bounds(
        &self,
        margin: usize,
        width: usize,
        height: usize,
    ) -> Option<(usize, usize, usize, usize)> {
        let min_x = self.min_x.saturating_sub(margin);
        let min_y = self.min_y.saturating_sub(margin);
        if width == 0 || height == 0 || min_x >= width || min_y >= height {
            return None;
        }
        let max_x = self.max_x.saturating_add(margin).min(width - 1);
        let max_y = self.max_y.saturating_add(margin).min(height - 1);
        Some((min_x, min_y, max_x, max_y))
    }
}
