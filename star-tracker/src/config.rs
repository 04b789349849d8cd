//! Extraction configuration.
//!
//! All parameters of the pipeline live in [`ExtractionConfig`]. Configs can be
//! built in code (`..Default::default()`) or loaded from a JSON file:
//!
//! ```json
//! {
//!     "threshold": { "method": "otsu", "search": { "lower": 200, "step": 2 } },
//!     "connectivity": "eight",
//!     "selection": { "policy": "top", "count": 8, "ranking": "flux" },
//!     "mask": { "kind": "bounding_box", "margin": 1 },
//!     "min_pixels": 2
//! }
//! ```
//!
//! Missing fields take their default values.

use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::error::{ConfigError, Error, Result};
use crate::image_proc::detection::{BlobSelection, Connectivity};
use crate::image_proc::image::MaskPolicy;
use crate::image_proc::thresholding::ThresholdMethod;

/// Configuration for star extraction from a frame.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ExtractionConfig {
    /// How the detection threshold is chosen.
    /// Default: percentile with fraction 0.999 over 256 bins
    pub threshold: ThresholdMethod,

    /// Neighbour model for connected-component labeling.
    /// Default: 8-connectivity
    pub connectivity: Connectivity,

    /// Which blobs are kept after labeling.
    /// Default: all blobs
    pub selection: BlobSelection,

    /// How kept blobs are turned into the output mask.
    /// Default: exact bounding box (margin 0)
    pub mask: MaskPolicy,

    /// Minimum number of pixels for a blob to be considered at all.
    /// Raising this rejects hot pixels.
    /// Default: 1
    pub min_pixels: usize,

    /// Count the histogram in parallel horizontal stripes.
    /// Default: false
    pub parallel_histogram: bool,

    /// Rows per stripe when `parallel_histogram` is set.
    /// Default: 64
    pub stripe_rows: usize,
}

impl Default for ExtractionConfig {
    fn default() -> Self {
        Self {
            threshold: ThresholdMethod::default(),
            connectivity: Connectivity::Eight,
            selection: BlobSelection::All,
            mask: MaskPolicy::default(),
            min_pixels: 1,
            parallel_histogram: false,
            stripe_rows: 64,
        }
    }
}

impl ExtractionConfig {
    /// Load a config from a JSON file.
    pub fn from_json_file(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let wrap = |source: ConfigError| Error::Config {
            path: path.to_path_buf(),
            source,
        };

        let text = std::fs::read_to_string(path).map_err(|e| wrap(e.into()))?;
        let config = serde_json::from_str(&text).map_err(|e| wrap(e.into()))?;
        log::debug!("Loaded extraction config from {}", path.display());
        Ok(config)
    }

    /// Serialize the config as pretty-printed JSON.
    pub fn to_json_string(&self) -> Result<String> {
        serde_json::to_string_pretty(self)
            .map_err(|e| Error::invalid(format!("config is not serializable: {e}")))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::image_proc::detection::BlobRanking;
    use crate::image_proc::thresholding::OtsuSearch;
    use std::io::Write;

    #[test]
    fn test_defaults() {
        let config = ExtractionConfig::default();
        assert_eq!(config.connectivity, Connectivity::Eight);
        assert_eq!(config.selection, BlobSelection::All);
        assert_eq!(config.mask, MaskPolicy::BoundingBox { margin: 0 });
        assert_eq!(config.min_pixels, 1);
        assert!(!config.parallel_histogram);
    }

    #[test]
    fn test_partial_json_uses_defaults() {
        let config: ExtractionConfig =
            serde_json::from_str(r#"{"connectivity": "four", "min_pixels": 3}"#).unwrap();
        assert_eq!(config.connectivity, Connectivity::Four);
        assert_eq!(config.min_pixels, 3);
        assert_eq!(config.threshold, ThresholdMethod::default());
    }

    #[test]
    fn test_json_round_trip() {
        let config = ExtractionConfig {
            threshold: ThresholdMethod::Otsu {
                search: OtsuSearch {
                    lower: 200,
                    upper: 255,
                    step: 2,
                },
            },
            selection: BlobSelection::Top {
                count: 8,
                ranking: BlobRanking::PixelCount,
            },
            mask: MaskPolicy::ExactPixels,
            ..Default::default()
        };

        let json = config.to_json_string().unwrap();
        let parsed: ExtractionConfig = serde_json::from_str(&json).unwrap();
        assert_eq!(parsed, config);
    }

    #[test]
    fn test_from_json_file() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        write!(
            file,
            r#"{{
                "threshold": {{ "method": "otsu", "search": {{ "lower": 200, "step": 2 }} }},
                "selection": {{ "policy": "top", "count": 8 }},
                "mask": {{ "kind": "bounding_box", "margin": 1 }}
            }}"#
        )
        .unwrap();

        let config = ExtractionConfig::from_json_file(file.path()).unwrap();
        assert_eq!(
            config.threshold,
            ThresholdMethod::Otsu {
                search: OtsuSearch {
                    lower: 200,
                    upper: 255,
                    step: 2
                }
            }
        );
        assert_eq!(config.mask, MaskPolicy::BoundingBox { margin: 1 });
    }

    #[test]
    fn test_from_json_file_errors() {
        let dir = tempfile::tempdir().unwrap();
        let missing = dir.path().join("missing.json");
        assert!(matches!(
            ExtractionConfig::from_json_file(&missing),
            Err(Error::Config {
                source: ConfigError::Read(_),
                ..
            })
        ));

        let bad = dir.path().join("bad.json");
        std::fs::write(&bad, "{ not json").unwrap();
        assert!(matches!(
            ExtractionConfig::from_json_file(&bad),
            Err(Error::Config {
                source: ConfigError::Parse(_),
                ..
            })
        ));
    }
}
