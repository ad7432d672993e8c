//! Object-detection results.

use serde::{Deserialize, Serialize};

/// Pixel-space bounding box of a detected object.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct BoundingBox {
    /// Left edge.
    #[serde(default)]
    pub xmin: f64,
    /// Top edge.
    #[serde(default)]
    pub ymin: f64,
    /// Right edge.
    #[serde(default)]
    pub xmax: f64,
    /// Bottom edge.
    #[serde(default)]
    pub ymax: f64,
}

/// One labelled object found in an uploaded photo.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Detection {
    /// Class label, e.g. `pizza` or `dining table`.
    pub label: String,
    /// Model confidence in `[0, 1]`.
    pub score: f64,
    /// Where the object is in the image.
    #[serde(default, rename = "box")]
    pub bounding_box: BoundingBox,
}

impl Detection {
    /// Keep detections scoring strictly above `min_score`, in order, and
    /// project them to their labels.
    pub fn confident_labels(detections: &[Self], min_score: f64) -> Vec<String> {
        detections
            .iter()
            .filter(|d| d.score > min_score)
            .map(|d| d.label.clone())
            .collect()
    }
}
