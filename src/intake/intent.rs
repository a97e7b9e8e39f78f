//! Keyword intent detection and cancellation words.
//!
//! Deliberately crude: only used to start a flow from an idle session. Once a
//! flow is running, input goes straight to the active step.

use std::sync::LazyLock;

use regex::Regex;

use super::session::Workflow;

/// Keywords per workflow, in priority order. First match wins.
const INTENT_KEYWORDS: &[(Workflow, &[&str])] = &[
    (Workflow::Loan, &["loan", "credit", "borrow"]),
    (Workflow::Insurance, &["insurance", "claim", "policy"]),
    (Workflow::Yield, &["yield", "predict", "harvest"]),
    (
        Workflow::PlantDoctor,
        &["disease", "plant doctor", "diagnos", "pest", "sick plant", "leaf"],
    ),
];

static CANCEL_PATTERN: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?i)\b(cancel|stop|exit)\b").expect("cancel pattern compiles"));

/// Map free text to the workflow it asks for, if any.
pub fn detect_intent(text: &str) -> Option<Workflow> {
    let lower = text.to_lowercase();
    INTENT_KEYWORDS
        .iter()
        .find(|(_, keywords)| keywords.iter().any(|k| lower.contains(k)))
        .map(|(workflow, _)| *workflow)
}

/// Whether the text asks to abandon the current flow.
pub fn is_cancellation(text: &str) -> bool {
    CANCEL_PATTERN.is_match(text)
}
