//! Configuration for the feed-photo worker.
//!
//! All configuration is loaded from environment variables. The worker needs
//! Workers AI credentials, the two model identifiers, and where to listen.
//! [`WorkerConfig::from_lookup`] takes the variable source as a closure so
//! tests can build a config without touching the process environment.

use crate::error::WorkerError;

/// Default Workers AI REST base URL.
pub const DEFAULT_API_BASE: &str = "https://api.cloudflare.com/client/v4";

/// Default object-detection model.
pub const DEFAULT_DETECTION_MODEL: &str = "@cf/facebook/detr-resnet-50";

/// Default language model.
pub const DEFAULT_LLM_MODEL: &str = "@cf/meta/llama-4-scout-17b-16e-instruct";

/// Default upload limit: 10 MiB.
pub const DEFAULT_MAX_UPLOAD_BYTES: usize = 10 * 1024 * 1024;

/// Complete worker configuration.
#[derive(Debug, Clone)]
pub struct WorkerConfig {
    /// Workers AI account and credentials.
    pub workers_ai: WorkersAiConfig,
    /// Object-detection model identifier.
    pub detection_model: String,
    /// Detections must score strictly above this to be kept.
    pub min_detection_score: f64,
    /// Language-model backend.
    pub llm: LlmBackendConfig,
    /// Directory holding `persona.j2`; the built-in persona is used when unset.
    pub templates_dir: Option<String>,
    /// Address to listen on.
    pub host: String,
    /// Port to listen on.
    pub port: u16,
    /// Largest accepted request body, in bytes.
    pub max_upload_bytes: usize,
    /// Log output format.
    pub log_format: LogFormat,
}

/// Workers AI REST API access.
#[derive(Debug, Clone)]
pub struct WorkersAiConfig {
    /// Base URL, without a trailing slash.
    pub api_base: String,
    /// Account identifier.
    pub account_id: String,
    /// Bearer token.
    pub api_token: String,
}

/// Configuration for the language-model backend.
#[derive(Debug, Clone)]
pub struct LlmBackendConfig {
    /// Which API to talk to.
    pub backend_type: BackendType,
    /// Model identifier.
    pub model: String,
    /// Base URL for the `OpenAI`-compatible backend.
    pub api_url: Option<String>,
    /// API key for the `OpenAI`-compatible backend.
    pub api_key: Option<String>,
}

/// Supported language-model backends.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BackendType {
    /// Workers AI text generation, using the Workers AI credentials.
    Workers,
    /// `OpenAI`-compatible chat completions.
    OpenAi,
}

/// Log output format.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum LogFormat {
    /// Human-readable lines.
    #[default]
    Text,
    /// One JSON object per line.
    Json,
}

impl LogFormat {
    /// Parse a `LOG_FORMAT` value. Unknown values mean text.
    fn parse(value: Option<&str>) -> Self {
        match value.map(str::trim) {
            Some(v) if v.eq_ignore_ascii_case("json") => Self::Json,
            _ => Self::Text,
        }
    }
}

impl WorkerConfig {
    /// Load configuration from environment variables.
    ///
    /// Required variables:
    /// - `CLOUDFLARE_ACCOUNT_ID` -- Workers AI account
    /// - `CLOUDFLARE_API_TOKEN` -- Workers AI bearer token
    ///
    /// Optional variables:
    /// - `CLOUDFLARE_API_BASE` -- REST base URL (default [`DEFAULT_API_BASE`])
    /// - `DETECTION_MODEL` -- detection model (default [`DEFAULT_DETECTION_MODEL`])
    /// - `MIN_DETECTION_SCORE` -- exclusive score threshold (default `0.5`)
    /// - `LLM_BACKEND` -- `workers` (default) or `openai`
    /// - `LLM_MODEL` -- model identifier (default [`DEFAULT_LLM_MODEL`])
    /// - `LLM_API_URL`, `LLM_API_KEY` -- required when `LLM_BACKEND=openai`
    /// - `TEMPLATES_DIR` -- directory with a `persona.j2` override
    /// - `HOST` (default `0.0.0.0`), `PORT` (default `8787`)
    /// - `MAX_UPLOAD_BYTES` -- request body limit (default 10 MiB)
    /// - `LOG_FORMAT` -- `text` (default) or `json`
    pub fn from_env() -> Result<Self, WorkerError> {
        Self::from_lookup(|name| std::env::var(name).ok())
    }

    /// Load configuration using `lookup` to read variables.
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self, WorkerError> {
        let optional = |name: &str| lookup(name).filter(|v| !v.trim().is_empty());
        let required = |name: &str| {
            optional(name)
                .ok_or_else(|| WorkerError::Config(format!("missing required env var {name}")))
        };

        let workers_ai = WorkersAiConfig {
            api_base: optional("CLOUDFLARE_API_BASE")
                .unwrap_or_else(|| DEFAULT_API_BASE.to_owned())
                .trim_end_matches('/')
                .to_owned(),
            account_id: required("CLOUDFLARE_ACCOUNT_ID")?,
            api_token: required("CLOUDFLARE_API_TOKEN")?,
        };

        let backend_type = match optional("LLM_BACKEND")
            .map(|v| v.to_lowercase())
            .as_deref()
        {
            None | Some("workers" | "cloudflare") => BackendType::Workers,
            Some("openai" | "ollama" | "deepseek") => BackendType::OpenAi,
            Some(other) => {
                return Err(WorkerError::Config(format!(
                    "unknown LLM backend type: {other}"
                )));
            }
        };

        let llm = match backend_type {
            BackendType::Workers => LlmBackendConfig {
                backend_type,
                model: optional("LLM_MODEL").unwrap_or_else(|| DEFAULT_LLM_MODEL.to_owned()),
                api_url: None,
                api_key: None,
            },
            BackendType::OpenAi => LlmBackendConfig {
                backend_type,
                model: optional("LLM_MODEL").unwrap_or_else(|| DEFAULT_LLM_MODEL.to_owned()),
                api_url: Some(required("LLM_API_URL")?.trim_end_matches('/').to_owned()),
                api_key: Some(required("LLM_API_KEY")?),
            },
        };

        let min_detection_score = match optional("MIN_DETECTION_SCORE") {
            Some(raw) => raw
                .trim()
                .parse::<f64>()
                .ok()
                .filter(|v| v.is_finite())
                .ok_or_else(|| {
                    WorkerError::Config(format!("invalid MIN_DETECTION_SCORE: {raw}"))
                })?,
            None => 0.5,
        };

        let port = match optional("PORT") {
            Some(raw) => raw
                .trim()
                .parse::<u16>()
                .map_err(|e| WorkerError::Config(format!("invalid PORT: {e}")))?,
            None => 8787,
        };

        let max_upload_bytes = match optional("MAX_UPLOAD_BYTES") {
            Some(raw) => raw
                .trim()
                .parse::<usize>()
                .map_err(|e| WorkerError::Config(format!("invalid MAX_UPLOAD_BYTES: {e}")))?,
            None => DEFAULT_MAX_UPLOAD_BYTES,
        };

        Ok(Self {
            workers_ai,
            detection_model: optional("DETECTION_MODEL")
                .unwrap_or_else(|| DEFAULT_DETECTION_MODEL.to_owned()),
            min_detection_score,
            llm,
            templates_dir: optional("TEMPLATES_DIR"),
            host: optional("HOST").unwrap_or_else(|| "0.0.0.0".to_owned()),
            port,
            max_upload_bytes,
            log_format: LogFormat::parse(optional("LOG_FORMAT").as_deref()),
        })
    }
}
