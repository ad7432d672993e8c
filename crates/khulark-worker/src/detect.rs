//! Object detection step.

use khulark_types::Detection;
use serde_json::Value;
use tracing::debug;

use crate::ai_client::WorkersAiClient;
use crate::error::WorkerError;

/// Runs the detection model and keeps confident labels.
#[derive(Debug, Clone)]
pub struct Detector {
    client: WorkersAiClient,
    model: String,
    min_score: f64,
}

impl Detector {
    /// Create a detector for `model` keeping detections scoring above `min_score`.
    pub fn new(client: WorkersAiClient, model: impl Into<String>, min_score: f64) -> Self {
        Self {
            client,
            model: model.into(),
            min_score,
        }
    }

    /// Labels of the confident detections in `image`, in model order.
    ///
    /// An empty list is a valid result.
    pub async fn detect(&self, image: &[u8]) -> Result<Vec<String>, WorkerError> {
        let output = self.client.run_binary(&self.model, image).await?;
        let detections = parse_detections(output)?;
        let labels = Detection::confident_labels(&detections, self.min_score);
        debug!(
            detections = detections.len(),
            confident = labels.len(),
            "detection complete"
        );
        Ok(labels)
    }
}

/// Read the model output as a detection list.
///
/// `null` counts as no detections. Array entries that do not look like a
/// detection are skipped.
fn parse_detections(output: Value) -> Result<Vec<Detection>, WorkerError> {
    match output {
        Value::Null => Ok(Vec::new()),
        Value::Array(items) => Ok(items
            .into_iter()
            .filter_map(|item| serde_json::from_value::<Detection>(item).ok())
            .collect()),
        other => Err(WorkerError::Detection(format!(
            "expected a detection list, got {}",
            value_kind(&other)
        ))),
    }
}

const fn value_kind(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "a boolean",
        Value::Number(_) => "a number",
        Value::String(_) => "a string",
        Value::Array(_) => "an array",
        Value::Object(_) => "an object",
    }
}
