//! Reduce a blob collection to the blobs worth keeping.
//!
//! Two policies are available:
//!
//! - **Pass-through** ([`list_to_array`]): keep every detection.
//! - **Top-N** ([`reduce`]): rank by a [`Significance`] strategy and keep the
//!   best `n`. Ties keep discovery order.
//!
//! Asking for more blobs than were detected is not an error; the result is
//! simply shorter than requested.

use serde::{Deserialize, Serialize};

use super::blob::Blob;

/// Score used to rank blobs; larger is more significant.
pub trait Significance {
    fn significance(&self, blob: &Blob) -> f64;
}

/// Built-in ranking strategies.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum BlobRanking {
    /// Number of pixels in the region
    PixelCount,
    /// Summed brightness of the region
    #[default]
    Flux,
    /// Bounding box area
    Area,
}

impl Significance for BlobRanking {
    fn significance(&self, blob: &Blob) -> f64 {
        match self {
            BlobRanking::PixelCount => blob.pixel_count as f64,
            BlobRanking::Flux => blob.flux as f64,
            BlobRanking::Area => blob.area() as f64,
        }
    }
}

impl<F> Significance for F
where
    F: Fn(&Blob) -> f64,
{
    fn significance(&self, blob: &Blob) -> f64 {
        self(blob)
    }
}

/// Which blobs survive selection.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(tag = "policy", rename_all = "snake_case")]
pub enum BlobSelection {
    /// Keep every blob
    #[default]
    All,
    /// Keep the `count` most significant blobs
    Top {
        count: usize,
        #[serde(default)]
        ranking: BlobRanking,
    },
}

/// Copy every blob into a plain `Vec`, preserving order.
pub fn list_to_array(blobs: &[Blob]) -> Vec<Blob> {
    blobs.to_vec()
}

/// Keep the `n` most significant blobs, most significant first.
///
/// Equal scores keep their original (discovery) order. If fewer than `n`
/// blobs exist, all of them are returned.
///
/// # Examples
/// ```rust
/// use star_tracker::image_proc::detection::{reduce, Blob, BlobRanking};
///
/// let faint = Blob::from_pixel(0, 0, 20);
/// let bright = Blob::from_pixel(5, 5, 250);
///
/// let top = reduce(&[faint, bright], 1, &BlobRanking::Flux);
/// assert_eq!(top, vec![bright]);
///
/// // Asking for more than exist returns everything
/// assert_eq!(reduce(&[faint, bright], 10, &BlobRanking::Flux).len(), 2);
/// ```
pub fn reduce<S: Significance + ?Sized>(blobs: &[Blob], n: usize, ranking: &S) -> Vec<Blob> {
    rank_indices(blobs, n, ranking)
        .into_iter()
        .map(|index| blobs[index])
        .collect()
}

/// Indices of the `n` most significant blobs, most significant first.
///
/// Same ordering rules as [`reduce`]; useful when the caller needs to map
/// the chosen blobs back to their labels.
pub fn rank_indices<S: Significance + ?Sized>(blobs: &[Blob], n: usize, ranking: &S) -> Vec<usize> {
    let mut scored: Vec<(f64, usize)> = blobs
        .iter()
        .enumerate()
        .map(|(index, blob)| (ranking.significance(blob), index))
        .collect();

    // Stable sort, so ties stay in discovery order
    scored.sort_by(|a, b| b.0.total_cmp(&a.0));

    scored.into_iter().take(n).map(|(_, index)| index).collect()
}

/// Apply a [`BlobSelection`] policy.
pub fn select(blobs: &[Blob], selection: &BlobSelection) -> Vec<Blob> {
    match selection {
        BlobSelection::All => list_to_array(blobs),
        BlobSelection::Top { count, ranking } => reduce(blobs, *count, ranking),
    }
}

/// Apply a [`BlobSelection`] policy to the blobs with at least `min_pixels`
/// pixels, returning indices into `blobs`.
pub fn select_indices(blobs: &[Blob], selection: &BlobSelection, min_pixels: usize) -> Vec<usize> {
    let candidates: Vec<usize> = (0..blobs.len())
        .filter(|&index| blobs[index].pixel_count >= min_pixels)
        .collect();

    match selection {
        BlobSelection::All => candidates,
        BlobSelection::Top { count, ranking } => {
            let subset: Vec<Blob> = candidates.iter().map(|&index| blobs[index]).collect();
            rank_indices(&subset, *count, ranking)
                .into_iter()
                .map(|position| candidates[position])
                .collect()
        }
    }
}

/// Drop blobs with fewer than `min_pixels` pixels.
pub fn filter_min_pixels(blobs: &[Blob], min_pixels: usize) -> Vec<Blob> {
    blobs
        .iter()
        .filter(|blob| blob.pixel_count >= min_pixels)
        .copied()
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn blob_with(x: usize, pixels: usize, brightness: u8) -> Blob {
        let mut blob = Blob::from_pixel(x, 0, brightness);
        for y in 1..pixels {
            blob.absorb(x, y, brightness);
        }
        blob
    }

    #[test]
    fn test_list_to_array_keeps_everything() {
        let blobs = vec![blob_with(0, 1, 10), blob_with(5, 3, 10)];
        assert_eq!(list_to_array(&blobs), blobs);
        assert!(list_to_array(&[]).is_empty());
    }

    #[test]
    fn test_reduce_by_pixel_count() {
        let blobs = vec![blob_with(0, 2, 200), blob_with(5, 9, 10), blob_with(9, 4, 50)];
        let top = reduce(&blobs, 2, &BlobRanking::PixelCount);
        assert_eq!(top, vec![blobs[1], blobs[2]]);
    }

    #[test]
    fn test_reduce_by_flux() {
        let blobs = vec![blob_with(0, 2, 200), blob_with(5, 9, 10), blob_with(9, 4, 50)];
        // Flux: 400, 90, 200
        let top = reduce(&blobs, 2, &BlobRanking::Flux);
        assert_eq!(top, vec![blobs[0], blobs[2]]);
    }

    #[test]
    fn test_reduce_by_area() {
        let mut wide = Blob::from_pixel(0, 0, 1);
        wide.absorb(9, 1, 1);
        let tall = blob_with(20, 5, 255);

        let top = reduce(&[tall, wide], 1, &BlobRanking::Area);
        assert_eq!(top, vec![wide]);
    }

    #[test]
    fn test_reduce_ties_keep_discovery_order() {
        let blobs: Vec<Blob> = (0..6).map(|i| blob_with(i * 3, 2, 100)).collect();
        let top = reduce(&blobs, 4, &BlobRanking::Flux);
        assert_eq!(top, blobs[..4].to_vec());
    }

    #[test]
    fn test_reduce_more_than_available() {
        let blobs = vec![blob_with(0, 1, 10), blob_with(5, 3, 10)];
        let top = reduce(&blobs, 8, &BlobRanking::PixelCount);
        assert_eq!(top.len(), 2);
        assert!(reduce(&[], 8, &BlobRanking::PixelCount).is_empty());
        assert!(reduce(&blobs, 0, &BlobRanking::PixelCount).is_empty());
    }

    #[test]
    fn test_reduce_with_closure() {
        let blobs = vec![blob_with(0, 1, 10), blob_with(40, 1, 10), blob_with(20, 1, 10)];
        // Prefer blobs closest to the left edge
        let leftmost = |blob: &Blob| -(blob.min_x as f64);
        let top = reduce(&blobs, 2, &leftmost);
        assert_eq!(top, vec![blobs[0], blobs[2]]);
    }

    #[test]
    fn test_select_policies() {
        let blobs = vec![blob_with(0, 1, 10), blob_with(5, 3, 10)];
        assert_eq!(select(&blobs, &BlobSelection::All), blobs);

        let top = BlobSelection::Top {
            count: 1,
            ranking: BlobRanking::PixelCount,
        };
        assert_eq!(select(&blobs, &top), vec![blobs[1]]);
    }

    #[test]
    fn test_filter_min_pixels() {
        let blobs = vec![blob_with(0, 1, 10), blob_with(5, 3, 10), blob_with(9, 2, 10)];
        let kept = filter_min_pixels(&blobs, 2);
        assert_eq!(kept, vec![blobs[1], blobs[2]]);
        assert_eq!(filter_min_pixels(&blobs, 0), blobs);
    }

    #[test]
    fn test_rank_indices() {
        let blobs = vec![blob_with(0, 2, 200), blob_with(5, 9, 10), blob_with(9, 4, 50)];
        assert_eq!(rank_indices(&blobs, 3, &BlobRanking::Flux), vec![0, 2, 1]);
        assert_eq!(rank_indices(&blobs, 1, &BlobRanking::PixelCount), vec![1]);
    }

    #[test]
    fn test_select_indices_filters_then_ranks() {
        // Pixel counts 1, 9, 4, 1; the single-pixel blobs are hot pixels
        let blobs = vec![
            blob_with(0, 1, 255),
            blob_with(5, 9, 10),
            blob_with(9, 4, 50),
            blob_with(12, 1, 255),
        ];
        assert_eq!(select_indices(&blobs, &BlobSelection::All, 2), vec![1, 2]);

        let top = BlobSelection::Top {
            count: 1,
            ranking: BlobRanking::Flux,
        };
        // Flux among survivors: 90 and 200
        assert_eq!(select_indices(&blobs, &top, 2), vec![2]);
        // Without filtering the hot pixels win on flux
        assert_eq!(select_indices(&blobs, &top, 1), vec![0]);
    }

    #[test]
    fn test_selection_serde() {
        let selection: BlobSelection =
            serde_json::from_str(r#"{"policy": "top", "count": 8}"#).unwrap();
        assert_eq!(
            selection,
            BlobSelection::Top {
                count: 8,
                ranking: BlobRanking::Flux
            }
        );
    }
}
