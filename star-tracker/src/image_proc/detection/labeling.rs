//! Connected-component labeling of thresholded frames.
//!
//! Every pixel is visited once in row-major order. The first unlabeled
//! signal pixel of a component seeds a new [`Blob`]; the rest of the
//! component is then flood filled from an explicit stack, so large saturated
//! regions cannot exhaust the call stack.

use std::fmt;

use ndarray::{Array2, ArrayView2};
use serde::{Deserialize, Serialize};

use super::blob::Blob;
use crate::error::{Error, Result};
use crate::image_proc::image::ensure_not_empty;

/// Neighbour model used by the flood fill.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Connectivity {
    /// North, south, east and west neighbours
    Four,
    /// The four direct neighbours plus the diagonals
    #[default]
    Eight,
}

const FOUR_NEIGHBORS: [(isize, isize); 4] = [(-1, 0), (0, -1), (0, 1), (1, 0)];

const EIGHT_NEIGHBORS: [(isize, isize); 8] = [
    (-1, -1),
    (-1, 0),
    (-1, 1),
    (0, -1),
    (0, 1),
    (1, -1),
    (1, 0),
    (1, 1),
];

impl Connectivity {
    /// `(dy, dx)` offsets of the neighbours considered connected.
    pub fn offsets(&self) -> &'static [(isize, isize)] {
        match self {
            Connectivity::Four => &FOUR_NEIGHBORS,
            Connectivity::Eight => &EIGHT_NEIGHBORS,
        }
    }
}

impl TryFrom<u8> for Connectivity {
    type Error = Error;

    fn try_from(neighbors: u8) -> Result<Self> {
        match neighbors {
            4 => Ok(Connectivity::Four),
            8 => Ok(Connectivity::Eight),
            other => Err(Error::invalid(format!(
                "connectivity must be 4 or 8 neighbours, got {other}"
            ))),
        }
    }
}

impl fmt::Display for Connectivity {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self {
            Connectivity::Four => write!(f, "4-connected"),
            Connectivity::Eight => write!(f, "8-connected"),
        }
    }
}

/// Blobs together with the per-pixel label image they were built from.
///
/// Label `0` is background; label `i + 1` marks the pixels of `blobs[i]`.
#[derive(Debug, Clone)]
pub struct LabeledImage {
    pub labels: Array2<u32>,
    pub blobs: Vec<Blob>,
}

impl LabeledImage {
    /// Label stored for the pixel at `(x, y)`.
    pub fn label_at(&self, x: usize, y: usize) -> u32 {
        self.labels[[y, x]]
    }

    /// Label that marks the pixels of `blobs[index]`.
    pub fn label_of(index: usize) -> u32 {
        index as u32 + 1
    }
}

/// Group all pixels `>= threshold` into connected blobs.
///
/// Blobs are returned in the order their seeds are met in a row-major scan.
///
/// # Errors
/// `InvalidArgument` if the image has zero width or height.
///
/// # Examples
/// ```rust
/// use ndarray::arr2;
/// use star_tracker::image_proc::detection::{find_blobs, Connectivity};
///
/// let image = arr2(&[
///     [0u8, 0, 0, 0],
///     [0, 255, 0, 0],
///     [0, 0, 255, 0],
///     [0, 0, 0, 0],
/// ]);
///
/// let four = find_blobs(&image.view(), 128, Connectivity::Four).unwrap();
/// let eight = find_blobs(&image.view(), 128, Connectivity::Eight).unwrap();
/// assert_eq!(four.len(), 2);
/// assert_eq!(eight.len(), 1);
/// assert_eq!(eight[0].pixel_count, 2);
/// ```
pub fn find_blobs(
    image: &ArrayView2<u8>,
    threshold: u8,
    connectivity: Connectivity,
) -> Result<Vec<Blob>> {
    label_blobs(image, threshold, connectivity).map(|labeled| labeled.blobs)
}

/// Same traversal as [`find_blobs`], keeping the label image.
pub fn label_blobs(
    image: &ArrayView2<u8>,
    threshold: u8,
    connectivity: Connectivity,
) -> Result<LabeledImage> {
    ensure_not_empty(image)?;

    let (rows, cols) = image.dim();
    let mut labels = Array2::<u32>::zeros((rows, cols));
    let mut blobs = Vec::new();
    let mut stack: Vec<(usize, usize)> = Vec::new();
    let offsets = connectivity.offsets();

    for row in 0..rows {
        for col in 0..cols {
            if image[[row, col]] < threshold || labels[[row, col]] != 0 {
                continue;
            }

            let label = LabeledImage::label_of(blobs.len());
            let mut blob = Blob::from_pixel(col, row, image[[row, col]]);

            // Pixels are labeled when pushed so each one enters the stack once
            labels[[row, col]] = label;
            stack.push((row, col));

            while let Some((y, x)) = stack.pop() {
                for &(dy, dx) in offsets {
                    let (Some(ny), Some(nx)) =
                        (y.checked_add_signed(dy), x.checked_add_signed(dx))
                    else {
                        continue;
                    };
                    if ny >= rows || nx >= cols {
                        continue;
                    }

                    let value = image[[ny, nx]];
                    if value >= threshold && labels[[ny, nx]] == 0 {
                        labels[[ny, nx]] = label;
                        blob.absorb(nx, ny, value);
                        stack.push((ny, nx));
                    }
                }
            }

            blobs.push(blob);
        }
    }

    log::debug!(
        "Labeled {} {} blobs above threshold {} in {}x{} frame",
        blobs.len(),
        connectivity,
        threshold,
        cols,
        rows
    );

    Ok(LabeledImage { labels, blobs })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::image_proc::thresholding::apply_threshold;
    use ndarray::arr2;

    fn square_image() -> Array2<u8> {
        arr2(&[
            [0, 0, 0, 0],
            [0, 255, 255, 0],
            [0, 255, 255, 0],
            [0, 0, 0, 0],
        ])
    }

    fn diagonal_image() -> Array2<u8> {
        arr2(&[
            [0, 0, 0, 0],
            [0, 255, 0, 0],
            [0, 0, 255, 0],
            [0, 0, 0, 0],
        ])
    }

    #[test]
    fn test_square_is_one_blob() {
        for connectivity in [Connectivity::Four, Connectivity::Eight] {
            let blobs = find_blobs(&square_image().view(), 128, connectivity).unwrap();
            assert_eq!(blobs.len(), 1);

            let blob = blobs[0];
            assert_eq!((blob.min_x, blob.min_y), (1, 1));
            assert_eq!((blob.max_x, blob.max_y), (2, 2));
            assert_eq!(blob.pixel_count, 4);
            assert_eq!(blob.flux, 4 * 255);
        }
    }

    #[test]
    fn test_diagonal_connectivity() {
        let image = diagonal_image();

        let four = find_blobs(&image.view(), 128, Connectivity::Four).unwrap();
        assert_eq!(four.len(), 2);
        assert!(four.iter().all(|b| b.pixel_count == 1));
        assert_eq!((four[0].min_x, four[0].min_y), (1, 1));
        assert_eq!((four[1].min_x, four[1].min_y), (2, 2));

        let eight = find_blobs(&image.view(), 128, Connectivity::Eight).unwrap();
        assert_eq!(eight.len(), 1);
        assert_eq!(eight[0].pixel_count, 2);
    }

    #[test]
    fn test_anti_diagonal_joins_with_eight() {
        let image = arr2(&[[0u8, 9], [9, 0]]);
        assert_eq!(find_blobs(&image.view(), 5, Connectivity::Four).unwrap().len(), 2);
        assert_eq!(find_blobs(&image.view(), 5, Connectivity::Eight).unwrap().len(), 1);
    }

    #[test]
    fn test_threshold_is_inclusive() {
        let image = arr2(&[[127u8, 128], [0, 0]]);
        let blobs = find_blobs(&image.view(), 128, Connectivity::Eight).unwrap();
        assert_eq!(blobs.len(), 1);
        assert_eq!((blobs[0].min_x, blobs[0].max_x), (1, 1));
    }

    #[test]
    fn test_discovery_order() {
        let image = arr2(&[
            [0u8, 0, 0, 0, 200],
            [200, 0, 0, 0, 200],
            [0, 0, 200, 0, 0],
        ]);
        let blobs = find_blobs(&image.view(), 100, Connectivity::Four).unwrap();

        // Seeds in row-major order: (4,0), (0,1), (2,2)
        let seeds: Vec<_> = blobs.iter().map(|b| (b.min_x, b.min_y)).collect();
        assert_eq!(seeds, vec![(4, 0), (0, 1), (2, 2)]);
        assert_eq!(blobs[0].pixel_count, 2);
    }

    #[test]
    fn test_u_shape_single_blob() {
        // Arms only join along the bottom row
        let image = arr2(&[
            [9u8, 0, 9],
            [9, 0, 9],
            [9, 9, 9],
        ]);
        let blobs = find_blobs(&image.view(), 1, Connectivity::Four).unwrap();
        assert_eq!(blobs.len(), 1);
        assert_eq!(blobs[0].pixel_count, 7);
    }

    #[test]
    fn test_partition_of_signal_pixels() {
        let image = Array2::from_shape_fn((40, 50), |(y, x)| ((x * 7 + y * 13) % 11 * 23) as u8);
        let threshold = 120;
        let signal = apply_threshold(&image.view(), threshold);

        for connectivity in [Connectivity::Four, Connectivity::Eight] {
            let labeled = label_blobs(&image.view(), threshold, connectivity).unwrap();

            // Every signal pixel carries exactly one label, background none
            for ((y, x), &is_signal) in signal.indexed_iter() {
                assert_eq!(labeled.label_at(x, y) != 0, is_signal);
            }

            let total: usize = labeled.blobs.iter().map(|b| b.pixel_count).sum();
            assert_eq!(total, signal.iter().filter(|&&s| s).count());

            for (index, blob) in labeled.blobs.iter().enumerate() {
                let label = LabeledImage::label_of(index);
                let members = labeled.labels.iter().filter(|&&l| l == label).count();
                assert_eq!(members, blob.pixel_count);
                assert!(blob.pixel_count >= 1);
            }
        }
    }

    #[test]
    fn test_idempotent() {
        let image = Array2::from_shape_fn((30, 30), |(y, x)| ((x * x + y * 3) % 256) as u8);
        let first = find_blobs(&image.view(), 150, Connectivity::Eight).unwrap();
        let second = find_blobs(&image.view(), 150, Connectivity::Eight).unwrap();
        assert_eq!(first, second);
    }

    #[test]
    fn test_large_region_does_not_recurse() {
        let image = Array2::from_elem((1000, 1000), 255u8);
        let blobs = find_blobs(&image.view(), 1, Connectivity::Four).unwrap();
        assert_eq!(blobs.len(), 1);
        assert_eq!(blobs[0].pixel_count, 1_000_000);
        assert_eq!(blobs[0].area(), 1_000_000);
    }

    #[test]
    fn test_no_signal() {
        let image = Array2::from_elem((8, 8), 10u8);
        assert!(find_blobs(&image.view(), 11, Connectivity::Eight)
            .unwrap()
            .is_empty());
    }

    #[test]
    fn test_empty_image_rejected() {
        let image = Array2::<u8>::zeros((5, 0));
        assert!(matches!(
            find_blobs(&image.view(), 1, Connectivity::Eight),
            Err(Error::InvalidArgument(_))
        ));
    }

    #[test]
    fn test_connectivity_conversions() {
        assert_eq!(Connectivity::try_from(4).unwrap(), Connectivity::Four);
        assert_eq!(Connectivity::try_from(8).unwrap(), Connectivity::Eight);
        assert!(Connectivity::try_from(6).is_err());
        assert_eq!(Connectivity::Four.offsets().len(), 4);
        assert_eq!(Connectivity::Eight.offsets().len(), 8);
        assert_eq!(Connectivity::default(), Connectivity::Eight);

        let parsed: Connectivity = serde_json::from_str("\"four\"").unwrap();
        assert_eq!(parsed, Connectivity::Four);
    }
}
