//! Persona prompt rendering via `minijinja`.
//!
//! The persona template ships inside the binary. Operators can tune it
//! without recompiling by pointing `TEMPLATES_DIR` at a directory holding
//! their own `persona.j2`.

use khulark_types::{
    AFFECTION_DELTA_LIMIT, ALERT_TEXT_MAX_CHARS, HUNGER_DELTA_LIMIT, SANITY_DELTA_LIMIT,
    SPEECH_MAX_CHARS,
};
use minijinja::Environment;

use crate::error::WorkerError;

/// File name of the persona template.
pub const PERSONA_TEMPLATE: &str = "persona.j2";

/// The user turn sent with every photo.
pub const USER_PROMPT: &str = "What do you eat from this photo?";

const BUILTIN_PERSONA: &str = include_str!("../templates/persona.j2");

/// The complete rendered prompt ready to send to a language model.
#[derive(Debug, Clone)]
pub struct RenderedPrompt {
    /// System message: persona, detected objects, rules, and output format.
    pub system: String,
    /// User message.
    pub user: String,
}

/// Renders the persona prompt for a set of detected labels.
pub struct PromptEngine {
    env: Environment<'static>,
}

impl std::fmt::Debug for PromptEngine {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("PromptEngine").finish_non_exhaustive()
    }
}

impl PromptEngine {
    /// Load the persona template from `templates_dir`, or use the built-in one.
    pub fn new(templates_dir: Option<&str>) -> Result<Self, WorkerError> {
        let source = match templates_dir {
            Some(dir) => load_template(dir, PERSONA_TEMPLATE)?,
            None => BUILTIN_PERSONA.to_owned(),
        };

        let mut env = Environment::new();
        env.add_template_owned("persona", source)
            .map_err(|e| WorkerError::Template(format!("failed to add persona template: {e}")))?;
        Ok(Self { env })
    }

    /// Render the prompt for `labels`.
    pub fn render(&self, labels: &[String]) -> Result<RenderedPrompt, WorkerError> {
        let context = serde_json::json!({
            "labels": labels,
            "objects": labels.join(", "),
            "limits": {
                // Display formatting keeps whole limits free of a ".0" suffix.
                "hunger": HUNGER_DELTA_LIMIT.to_string(),
                "affection": AFFECTION_DELTA_LIMIT.to_string(),
                "sanity": SANITY_DELTA_LIMIT.to_string(),
                "speech": SPEECH_MAX_CHARS,
                "alert_text": ALERT_TEXT_MAX_CHARS,
            },
        });

        let system = self
            .env
            .get_template("persona")
            .map_err(|e| WorkerError::Template(format!("missing persona template: {e}")))?
            .render(context)
            .map_err(|e| WorkerError::Template(format!("persona render failed: {e}")))?;

        Ok(RenderedPrompt {
            system,
            user: USER_PROMPT.to_owned(),
        })
    }
}

/// Read a template file from disk.
fn load_template(dir: &str, filename: &str) -> Result<String, WorkerError> {
    let path = std::path::Path::new(dir).join(filename);
    std::fs::read_to_string(&path)
        .map_err(|e| WorkerError::Template(format!("failed to read {}: {e}", path.display())))
}
