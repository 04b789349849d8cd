//! Star extraction for star tracker frames.
//!
//! A grayscale frame goes through four stages:
//!
//! 1. [`image_proc::thresholding`] picks a brightness cutoff (percentile or Otsu).
//! 2. [`image_proc::detection`] groups above-threshold pixels into [`Blob`]s
//!    and reduces them to the most significant ones.
//! 3. [`image_proc::image`] masks the frame down to the kept blobs and writes
//!    the composite through the `image` crate.
//! 4. [`pipeline`] drives the stages from an [`ExtractionConfig`].
//!
//! ```rust,no_run
//! use star_tracker::{extract_stars_from_file, ExtractionConfig};
//!
//! let config = ExtractionConfig::from_json_file("extract.json")?;
//! let extraction = extract_stars_from_file("frame.png", "stars.bmp", &config)?;
//! for blob in extraction.selected_blobs() {
//!     println!("star at {:?}, {} px", blob.center(), blob.pixel_count);
//! }
//! # Ok::<(), star_tracker::Error>(())
//! ```

pub mod config;
pub mod error;
pub mod image_proc;
pub mod pipeline;

pub use config::ExtractionConfig;
pub use error::{Error, Result};
pub use image_proc::detection::{Blob, Connectivity};
pub use pipeline::{extract_stars, extract_stars_from_file, Extraction};
