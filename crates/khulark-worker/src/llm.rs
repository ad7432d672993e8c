//! Language-model backends.
//!
//! Enum dispatch over the supported backends, since async methods are not
//! dyn-compatible. Workers AI text models may hand back the decision
//! already parsed into an object, so a completion is a [`ModelOutput`]
//! rather than a plain string.

use serde_json::{Map, Value};

use crate::ai_client::WorkersAiClient;
use crate::config::{BackendType, LlmBackendConfig};
use crate::error::WorkerError;
use crate::prompt::RenderedPrompt;

/// What a language model answered.
#[derive(Debug, Clone, PartialEq)]
pub enum ModelOutput {
    /// A JSON object that already looks like a decision.
    Object(Map<String, Value>),
    /// Free text that should contain a JSON decision somewhere.
    Text(String),
}

impl ModelOutput {
    /// Short preview for debug logging.
    pub fn preview(&self, max_chars: usize) -> String {
        let full = match self {
            Self::Object(map) => Value::Object(map.clone()).to_string(),
            Self::Text(text) => text.clone(),
        };
        full.chars().take(max_chars).collect()
    }
}

/// A language-model backend.
#[derive(Debug, Clone)]
pub enum LlmBackend {
    /// Workers AI text generation.
    Workers(WorkersBackend),
    /// `OpenAI`-compatible chat completions API.
    OpenAi(OpenAiBackend),
}

impl LlmBackend {
    /// Send a prompt and return the model's answer.
    pub async fn complete(&self, prompt: &RenderedPrompt) -> Result<ModelOutput, WorkerError> {
        match self {
            Self::Workers(backend) => backend.complete(prompt).await,
            Self::OpenAi(backend) => backend.complete(prompt).await,
        }
    }

    /// Human-readable name for logging.
    pub const fn name(&self) -> &str {
        match self {
            Self::Workers(_) => "workers-ai",
            Self::OpenAi(_) => "openai-compatible",
        }
    }
}

// ---------------------------------------------------------------------------
// Workers AI backend
// ---------------------------------------------------------------------------

/// Backend for Workers AI text-generation models.
#[derive(Debug, Clone)]
pub struct WorkersBackend {
    client: WorkersAiClient,
    model: String,
}

impl WorkersBackend {
    /// Create a backend for `model` on the given Workers AI client.
    pub fn new(client: WorkersAiClient, model: impl Into<String>) -> Self {
        Self {
            client,
            model: model.into(),
        }
    }

    async fn complete(&self, prompt: &RenderedPrompt) -> Result<ModelOutput, WorkerError> {
        let input = serde_json::json!({
            "messages": [
                {"role": "system", "content": prompt.system},
                {"role": "user", "content": prompt.user}
            ]
        });
        let output = self
            .client
            .run(&self.model, &input)
            .await
            .map_err(|e| WorkerError::LlmBackend(e.to_string()))?;
        extract_workers_output(output)
    }
}

/// Pull the answer out of a Workers AI text-generation result.
///
/// `response` holding an object with a `hunger` key is taken as the
/// decision itself; anything else is handed on as text.
fn extract_workers_output(mut output: Value) -> Result<ModelOutput, WorkerError> {
    let response = output
        .get_mut("response")
        .map(Value::take)
        .ok_or_else(|| WorkerError::LlmBackend("Workers AI result missing response".to_owned()))?;

    Ok(match response {
        Value::Object(map) if map.contains_key("hunger") => ModelOutput::Object(map),
        Value::String(text) => ModelOutput::Text(text),
        other => ModelOutput::Text(other.to_string()),
    })
}

// ---------------------------------------------------------------------------
// OpenAI-compatible backend
// ---------------------------------------------------------------------------

/// Backend for `OpenAI`-compatible chat completions APIs.
///
/// Sends requests to `{api_url}/chat/completions`.
#[derive(Debug, Clone)]
pub struct OpenAiBackend {
    client: reqwest::Client,
    api_url: String,
    api_key: String,
    model: String,
}

impl OpenAiBackend {
    /// Create a new `OpenAI`-compatible backend.
    pub fn new(
        api_url: impl Into<String>,
        api_key: impl Into<String>,
        model: impl Into<String>,
    ) -> Self {
        Self {
            client: reqwest::Client::new(),
            api_url: api_url.into(),
            api_key: api_key.into(),
            model: model.into(),
        }
    }

    async fn complete(&self, prompt: &RenderedPrompt) -> Result<ModelOutput, WorkerError> {
        let url = format!("{}/chat/completions", self.api_url);

        let body = serde_json::json!({
            "model": self.model,
            "messages": [
                {"role": "system", "content": prompt.system},
                {"role": "user", "content": prompt.user}
            ],
            "temperature": 0.8,
            "max_tokens": 256,
            "response_format": {"type": "json_object"}
        });

        let response = self
            .client
            .post(&url)
            .bearer_auth(&self.api_key)
            .json(&body)
            .send()
            .await
            .map_err(|e| WorkerError::LlmBackend(format!("OpenAI request failed: {e}")))?;

        let status = response.status();
        if !status.is_success() {
            let error_body = response
                .text()
                .await
                .unwrap_or_else(|_| "unable to read error body".to_owned());
            return Err(WorkerError::LlmBackend(format!(
                "OpenAI returned {status}: {error_body}"
            )));
        }

        let json: Value = response
            .json()
            .await
            .map_err(|e| WorkerError::LlmBackend(format!("OpenAI response parse failed: {e}")))?;

        extract_openai_content(&json).map(ModelOutput::Text)
    }
}

/// Extract the text content from an `OpenAI` chat completions response.
fn extract_openai_content(json: &Value) -> Result<String, WorkerError> {
    json.get("choices")
        .and_then(|c| c.get(0))
        .and_then(|c| c.get("message"))
        .and_then(|m| m.get("content"))
        .and_then(Value::as_str)
        .map(ToOwned::to_owned)
        .ok_or_else(|| {
            WorkerError::LlmBackend("OpenAI response missing choices[0].message.content".to_owned())
        })
}

// ---------------------------------------------------------------------------
// Factory
// ---------------------------------------------------------------------------

/// Create the configured language-model backend.
///
/// The Workers backend shares `workers_ai` with the detection step.
pub fn create_backend(
    config: &LlmBackendConfig,
    workers_ai: &WorkersAiClient,
) -> Result<LlmBackend, WorkerError> {
    match config.backend_type {
        BackendType::Workers => Ok(LlmBackend::Workers(WorkersBackend::new(
            workers_ai.clone(),
            config.model.clone(),
        ))),
        BackendType::OpenAi => {
            let api_url = config
                .api_url
                .clone()
                .ok_or_else(|| WorkerError::Config("OpenAI backend needs LLM_API_URL".to_owned()))?;
            let api_key = config
                .api_key
                .clone()
                .ok_or_else(|| WorkerError::Config("OpenAI backend needs LLM_API_KEY".to_owned()))?;
            Ok(LlmBackend::OpenAi(OpenAiBackend::new(
                api_url,
                api_key,
                config.model.clone(),
            )))
        }
    }
}
