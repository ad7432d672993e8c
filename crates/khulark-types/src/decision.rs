//! Feeding decisions: stat deltas plus narrative text.
//!
//! A [`Decision`] is produced by the feed-photo worker and consumed by the
//! game client. Both sides treat the other's JSON as untrusted and pass it
//! through [`Decision::from_value`], which coerces missing or malformed
//! fields and clamps every value into its allowed range. There is no
//! rejection path: any JSON object becomes a valid decision. Deserializing a
//! `Decision` goes through the same coercion.

use serde::{Deserialize, Deserializer, Serialize};
use serde_json::Value;

/// Hunger deltas are clamped to `[-HUNGER_DELTA_LIMIT, HUNGER_DELTA_LIMIT]`.
pub const HUNGER_DELTA_LIMIT: f64 = 30.0;

/// Affection deltas are clamped to `[-AFFECTION_DELTA_LIMIT, AFFECTION_DELTA_LIMIT]`.
pub const AFFECTION_DELTA_LIMIT: f64 = 20.0;

/// Sanity deltas are clamped to `[-SANITY_DELTA_LIMIT, SANITY_DELTA_LIMIT]`.
pub const SANITY_DELTA_LIMIT: f64 = 20.0;

/// Maximum length of [`Decision::speech`], in characters.
pub const SPEECH_MAX_CHARS: usize = 100;

/// Maximum length of [`Decision::alert_text`], in characters.
pub const ALERT_TEXT_MAX_CHARS: usize = 80;

/// The outcome of one feeding event.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Decision {
    /// Signed hunger change, within `±30`.
    pub hunger: f64,
    /// Signed affection change, within `±20`.
    pub affection: f64,
    /// Signed sanity change, within `±20`.
    pub sanity: f64,
    /// First-person line spoken by the creature (at most 100 characters).
    pub speech: String,
    /// Third-person narration of what happened (at most 80 characters).
    pub alert_text: String,
}

impl Decision {
    /// Build a decision from trusted parts, still applying every clamp.
    pub fn new(
        hunger: f64,
        affection: f64,
        sanity: f64,
        speech: impl Into<String>,
        alert_text: impl Into<String>,
    ) -> Self {
        Self {
            hunger,
            affection,
            sanity,
            speech: speech.into(),
            alert_text: alert_text.into(),
        }
        .clamped()
    }

    /// Coerce an untrusted JSON value into a decision.
    ///
    /// Returns `None` only when `value` is not a JSON object. Inside an
    /// object, missing or non-numeric deltas become 0, numeric strings are
    /// accepted, and non-string text fields become empty before truncation.
    pub fn from_value(value: &Value) -> Option<Self> {
        let object = value.as_object()?;
        let number = |key: &str| object.get(key).map_or(0.0, coerce_number);
        let text = |key: &str| {
            object
                .get(key)
                .and_then(Value::as_str)
                .unwrap_or_default()
                .to_owned()
        };

        Some(Self::new(
            number("hunger"),
            number("affection"),
            number("sanity"),
            text("speech"),
            text("alertText"),
        ))
    }

    /// Return a copy with every delta clamped and both texts truncated.
    #[must_use]
    pub fn clamped(self) -> Self {
        Self {
            hunger: clamp_delta(self.hunger, HUNGER_DELTA_LIMIT),
            affection: clamp_delta(self.affection, AFFECTION_DELTA_LIMIT),
            sanity: clamp_delta(self.sanity, SANITY_DELTA_LIMIT),
            speech: truncate_chars(&self.speech, SPEECH_MAX_CHARS),
            alert_text: truncate_chars(&self.alert_text, ALERT_TEXT_MAX_CHARS),
        }
    }

    /// Signed sum of the three deltas.
    pub fn total_change(&self) -> f64 {
        self.hunger + self.affection + self.sanity
    }
}

impl<'de> Deserialize<'de> for Decision {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: Deserializer<'de>,
    {
        let value = Value::deserialize(deserializer)?;
        Self::from_value(&value)
            .ok_or_else(|| serde::de::Error::custom("decision must be a JSON object"))
    }
}

/// Clamp a delta into `[-limit, limit]`; non-finite values become 0.
fn clamp_delta(value: f64, limit: f64) -> f64 {
    if value.is_finite() {
        value.clamp(-limit, limit)
    } else {
        0.0
    }
}

/// Read a JSON value as a number the way a lenient client would.
fn coerce_number(value: &Value) -> f64 {
    let parsed = match value {
        Value::Number(n) => n.as_f64(),
        Value::String(s) => s.trim().parse::<f64>().ok(),
        _ => None,
    };
    parsed.filter(|n| n.is_finite()).unwrap_or(0.0)
}

/// Keep at most `max` characters of `text`.
fn truncate_chars(text: &str, max: usize) -> String {
    match text.char_indices().nth(max) {
        Some((byte_idx, _)) => text.get(..byte_idx).unwrap_or(text).to_owned(),
        None => text.to_owned(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn approx(a: f64, b: f64) -> bool {
        (a - b).abs() < 1e-9
    }

    #[test]
    fn extreme_values_are_clamped() {
        let raw = serde_json::json!({
            "hunger": 500,
            "affection": -99,
            "sanity": 21.5,
            "speech": "x".repeat(300),
            "alertText": "y".repeat(300),
        });
        let decision = Decision::from_value(&raw).unwrap_or_else(|| Decision::new(0.0, 0.0, 0.0, "", ""));
        assert!(approx(decision.hunger, 30.0));
        assert!(approx(decision.affection, -20.0));
        assert!(approx(decision.sanity, 20.0));
        assert_eq!(decision.speech.chars().count(), SPEECH_MAX_CHARS);
        assert_eq!(decision.alert_text.chars().count(), ALERT_TEXT_MAX_CHARS);
    }

    #[test]
    fn missing_and_malformed_fields_default() {
        let raw = serde_json::json!({
            "hunger": "not a number",
            "sanity": null,
            "speech": 42,
        });
        let decision = Decision::from_value(&raw).unwrap_or_else(|| Decision::new(1.0, 1.0, 1.0, "?", "?"));
        assert!(approx(decision.hunger, 0.0));
        assert!(approx(decision.affection, 0.0));
        assert!(approx(decision.sanity, 0.0));
        assert!(decision.speech.is_empty());
        assert!(decision.alert_text.is_empty());
    }

    #[test]
    fn numeric_strings_are_accepted() {
        let raw = serde_json::json!({"hunger": " 12.5 ", "affection": "-4"});
        let decision = Decision::from_value(&raw);
        assert!(decision.is_some());
        let decision = decision.unwrap_or_else(|| Decision::new(0.0, 0.0, 0.0, "", ""));
        assert!(approx(decision.hunger, 12.5));
        assert!(approx(decision.affection, -4.0));
    }

    #[test]
    fn deserializing_applies_the_same_clamps() {
        let raw = r#"{"hunger": 999, "affection": "-50", "speech": 7, "alertText": "ok"}"#;
        let decision: Result<Decision, _> = serde_json::from_str(raw);
        assert!(decision.is_ok_and(|d| {
            approx(d.hunger, 30.0)
                && approx(d.affection, -20.0)
                && approx(d.sanity, 0.0)
                && d.speech.is_empty()
                && d.alert_text == "ok"
        }));
        assert!(serde_json::from_str::<Decision>("[30, 20, 20]").is_err());
    }

    #[test]
    fn non_objects_are_rejected() {
        assert!(Decision::from_value(&serde_json::json!([1, 2, 3])).is_none());
        assert!(Decision::from_value(&serde_json::json!("hunger")).is_none());
        assert!(Decision::from_value(&Value::Null).is_none());
    }

    #[test]
    fn truncation_respects_multibyte_characters() {
        let speech = "é".repeat(150);
        let decision = Decision::new(0.0, 0.0, 0.0, speech, "");
        assert_eq!(decision.speech.chars().count(), SPEECH_MAX_CHARS);
    }

    #[test]
    fn wire_format_uses_camel_case() {
        let decision = Decision::new(5.0, 1.0, -2.0, "mm", "The khulark chews.");
        let json = serde_json::to_value(&decision).unwrap_or(Value::Null);
        assert!(json.get("alertText").is_some());
        assert!(json.get("alert_text").is_none());
    }

    #[test]
    fn total_change_is_signed_sum() {
        let decision = Decision::new(25.0, 15.0, 5.0, "", "");
        assert!(approx(decision.total_change(), 45.0));
        let decision = Decision::new(0.0, -5.0, -10.0, "", "");
        assert!(approx(decision.total_change(), -15.0));
    }
}
