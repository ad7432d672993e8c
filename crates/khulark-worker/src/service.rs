//! The feed-photo arbitration pipeline.
//!
//! One photo goes through two sequential remote calls: object detection,
//! then a language model that role-plays the creature deciding what to eat.
//! Every failure after the photo is received is absorbed here and answered
//! with a canned decision from [`crate::fallback`].

use khulark_types::Decision;
use tracing::{debug, warn};

use crate::ai_client::WorkersAiClient;
use crate::config::WorkerConfig;
use crate::detect::Detector;
use crate::error::WorkerError;
use crate::fallback;
use crate::llm::{LlmBackend, create_backend};
use crate::parse::parse_decision;
use crate::prompt::PromptEngine;

/// Characters of raw model output shown in debug logs.
const OUTPUT_PREVIEW_CHARS: usize = 200;

/// Pipeline stage of a single feed-photo request.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Stage {
    /// Image bytes accepted.
    Received,
    /// Detection call in flight.
    Detecting,
    /// Detection labels available.
    Detected,
    /// Language-model call in flight.
    Deciding,
    /// Model output parsed into a decision.
    Decided,
    /// Decision returned to the caller.
    Responded,
    /// A remote step failed.
    Failed,
    /// A canned decision was returned instead.
    FallbackResponded,
}

impl Stage {
    /// Stable label for log fields.
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Received => "received",
            Self::Detecting => "detecting",
            Self::Detected => "detected",
            Self::Deciding => "deciding",
            Self::Decided => "decided",
            Self::Responded => "responded",
            Self::Failed => "failed",
            Self::FallbackResponded => "fallback-responded",
        }
    }
}

/// Turns photos into feeding decisions.
#[derive(Debug)]
pub struct FeedPhotoService {
    detector: Detector,
    prompts: PromptEngine,
    llm: LlmBackend,
}

impl FeedPhotoService {
    /// Assemble the service from its parts.
    pub const fn new(detector: Detector, prompts: PromptEngine, llm: LlmBackend) -> Self {
        Self {
            detector,
            prompts,
            llm,
        }
    }

    /// Build the service described by `config`.
    pub fn from_config(config: &WorkerConfig) -> Result<Self, WorkerError> {
        let workers_ai = WorkersAiClient::new(&config.workers_ai);
        let llm = create_backend(&config.llm, &workers_ai)?;
        let detector = Detector::new(
            workers_ai,
            config.detection_model.clone(),
            config.min_detection_score,
        );
        let prompts = PromptEngine::new(config.templates_dir.as_deref())?;
        Ok(Self::new(detector, prompts, llm))
    }

    /// Name of the language-model backend in use.
    pub const fn backend_name(&self) -> &str {
        self.llm.name()
    }

    /// Decide what the creature makes of `image`.
    ///
    /// Never fails: a broken detection or decide step yields a canned
    /// decision, always within the delta and text limits.
    pub async fn arbitrate(&self, image: &[u8]) -> Decision {
        stage(Stage::Received);

        stage(Stage::Detecting);
        let labels = match self.detector.detect(image).await {
            Ok(labels) => labels,
            Err(e) => {
                stage(Stage::Failed);
                warn!(error = %e, "detection failed, answering fixed fallback");
                stage(Stage::FallbackResponded);
                return fallback::fixed();
            }
        };
        stage(Stage::Detected);
        debug!(labels = ?labels, "confident labels");

        stage(Stage::Deciding);
        match self.decide(&labels).await {
            Ok(decision) => {
                stage(Stage::Decided);
                stage(Stage::Responded);
                decision
            }
            Err(e) => {
                stage(Stage::Failed);
                let decision = fallback::after_decide_failure(&labels);
                warn!(
                    error = %e,
                    has_food = fallback::has_food(&labels),
                    "decide step failed, answering fallback"
                );
                stage(Stage::FallbackResponded);
                decision
            }
        }
    }

    async fn decide(&self, labels: &[String]) -> Result<Decision, WorkerError> {
        let prompt = self.prompts.render(labels)?;
        let output = self.llm.complete(&prompt).await?;
        debug!(
            backend = self.llm.name(),
            output = %output.preview(OUTPUT_PREVIEW_CHARS),
            "model output"
        );
        parse_decision(&output)
    }
}

fn stage(stage: Stage) {
    debug!(stage = stage.as_str(), "feed-photo stage");
}
