//! Canned decisions used when the pipeline cannot produce one.
//!
//! | Failure                                    | Answer        |
//! |--------------------------------------------|---------------|
//! | detection call fails                       | [`fixed`]     |
//! | decide step fails, a label looks like food | [`delicious`] |
//! | decide step fails otherwise                | [`fixed`]     |

use khulark_types::Decision;

/// Substrings that mark a detection label as food.
pub const FOOD_KEYWORDS: [&str; 5] = ["food", "fruit", "pizza", "sandwich", "cake"];

/// The answer when nothing better is known.
pub fn fixed() -> Decision {
    Decision::new(
        0.0,
        -5.0,
        -10.0,
        "I... I don't feel right. Something went wrong with that.",
        "The khulark shudders, clearly unsettled by what just happened.",
    )
}

/// The answer when the model failed but the photo clearly showed food.
pub fn delicious() -> Decision {
    Decision::new(
        20.0,
        10.0,
        5.0,
        "Thank you! This looks delicious.",
        "The khulark happily devours the food.",
    )
}

/// Whether any label contains a food keyword, ignoring case.
pub fn has_food(labels: &[String]) -> bool {
    labels.iter().any(|label| {
        let label = label.to_lowercase();
        FOOD_KEYWORDS.iter().any(|keyword| label.contains(keyword))
    })
}

/// The answer after the decide step failed for `labels`.
pub fn after_decide_failure(labels: &[String]) -> Decision {
    if has_food(labels) { delicious() } else { fixed() }
}
