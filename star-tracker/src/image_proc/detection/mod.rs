pub mod blob;
pub mod labeling;
pub mod selection;

pub use blob::Blob;
pub use labeling::{find_blobs, label_blobs, Connectivity, LabeledImage};
pub use selection::{
    filter_min_pixels, list_to_array, rank_indices, reduce, select, select_indices, BlobRanking,
    BlobSelection, Significance,
};
