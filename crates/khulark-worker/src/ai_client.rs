//! Workers AI REST client.
//!
//! Every model is reached at `{api_base}/accounts/{account_id}/ai/run/{model}`
//! with a bearer token. Successful responses wrap the model output in a
//! `result` field, which is unwrapped here; error responses carry an
//! `errors` array whose first message becomes the error text.

use serde_json::Value;
use tracing::debug;

use crate::config::WorkersAiConfig;
use crate::error::WorkerError;

/// Client for the Workers AI REST API.
#[derive(Debug, Clone)]
pub struct WorkersAiClient {
    client: reqwest::Client,
    api_base: String,
    account_id: String,
    api_token: String,
}

impl WorkersAiClient {
    /// Create a client from configuration.
    pub fn new(config: &WorkersAiConfig) -> Self {
        Self {
            client: reqwest::Client::new(),
            api_base: config.api_base.trim_end_matches('/').to_owned(),
            account_id: config.account_id.clone(),
            api_token: config.api_token.clone(),
        }
    }

    /// Endpoint URL for `model`.
    pub fn model_url(&self, model: &str) -> String {
        format!("{}/accounts/{}/ai/run/{model}", self.api_base, self.account_id)
    }

    /// Run a model with a JSON input.
    pub async fn run(&self, model: &str, input: &Value) -> Result<Value, WorkerError> {
        let url = self.model_url(model);
        debug!(%url, "calling Workers AI");

        let response = self
            .client
            .post(&url)
            .bearer_auth(&self.api_token)
            .json(input)
            .send()
            .await
            .map_err(|e| WorkerError::Upstream(format!("request to {model} failed: {e}")))?;

        let status = response.status();
        let raw = response
            .text()
            .await
            .map_err(|e| WorkerError::Upstream(format!("reading {model} response failed: {e}")))?;

        if !status.is_success() {
            return Err(WorkerError::Upstream(upstream_error_message(status, &raw)));
        }

        let parsed: Value = serde_json::from_str(&raw).map_err(|e| {
            WorkerError::Upstream(format!("{model} returned a non-JSON body: {e}"))
        })?;
        Ok(unwrap_result(parsed))
    }

    /// Run a model that takes an image.
    ///
    /// The image is sent as a JSON array of byte values under `image`.
    pub async fn run_binary(&self, model: &str, image: &[u8]) -> Result<Value, WorkerError> {
        debug!(model, bytes = image.len(), "sending image to Workers AI");
        let input = serde_json::json!({ "image": image });
        self.run(model, &input).await
    }
}

/// Return `result` if present and non-null, else the whole body.
fn unwrap_result(mut body: Value) -> Value {
    match body.get_mut("result").map(Value::take) {
        Some(result) if !result.is_null() => result,
        _ => body,
    }
}

/// Build an error message from a non-success response.
fn upstream_error_message(status: reqwest::StatusCode, raw: &str) -> String {
    let detail = serde_json::from_str::<Value>(raw).ok().and_then(|body| {
        body.get("errors")?
            .get(0)?
            .get("message")?
            .as_str()
            .map(ToOwned::to_owned)
    });
    match detail {
        Some(message) => format!("{} {message}", status.as_u16()),
        None => format!(
            "{} {}",
            status.as_u16(),
            status.canonical_reason().unwrap_or("error")
        ),
    }
}
