//! User-visible copy for intake replies.

use crate::error::BackendError;

use super::session::Workflow;
use super::validate::ValidationError;
use super::workflow::{Question, SubmissionOutcome};

/// Shown when the general chat service can't answer.
pub const GENERAL_CHAT_UNAVAILABLE: &str =
    "I apologize, but I'm unable to analyze that right now. Please try again later.";

/// Shown for an empty idle turn.
pub const WELCOME_HINT: &str = "\
Ask me anything about farming, loans, insurance, or weather.
You can also say \"loan\", \"insurance claim\", \"predict yield\" or \"plant disease\" to get started.";

/// Shown when a session arrives in a state no question matches.
pub const SESSION_RESET: &str =
    "Something went wrong with this conversation, so I've started over. How can I help?";

pub fn cancelled(workflow: Workflow) -> String {
    format!(
        "Okay, I've cancelled your {}. Let me know if you need anything else.",
        workflow.label()
    )
}

/// Explain what was wrong, then ask the same question again.
pub fn corrective(error: &ValidationError, question: &Question) -> String {
    format!("{}\n\n{}", error.message, question.prompt)
}

pub fn submission_failed(workflow: Workflow, error: &BackendError) -> String {
    format!(
        "❌ Sorry, your {} could not be completed: {error}\nYou can start again whenever you're ready.",
        workflow.label()
    )
}

pub fn submission_succeeded(outcome: &SubmissionOutcome) -> String {
    match outcome {
        SubmissionOutcome::Loan {
            receipt,
            application,
        } => {
            let mut text = format!(
                "✅ Loan application submitted!\nID: {}\nStatus: {}\nAmount: ₹{}\nTenure: {} months",
                receipt.id, receipt.status, application.amount, application.tenure_months
            );
            if let Some(score) = receipt.fraud_score {
                text.push_str(&format!("\nFraud Score: {score}"));
            }
            text
        }
        SubmissionOutcome::Insurance { receipt, provider } => format!(
            "✅ Insurance claim submitted with {provider}!\nID: {}\nStatus: {}",
            receipt.id, receipt.status
        ),
        SubmissionOutcome::Yield {
            prediction,
            request,
        } => {
            let mut text = format!(
                "🌾 Yield prediction for {} ({} acres):\n\
                 Predicted yield: {} kg/acre ({})\n\
                 Soil health: {}/100{}\n\
                 Climate score: {}/100",
                request.crop_type,
                request.acres,
                prediction.predicted_yield_kg_per_acre,
                prediction.yield_category,
                prediction.soil_health_score,
                if prediction.soil_health_category.is_empty() {
                    String::new()
                } else {
                    format!(" ({})", prediction.soil_health_category)
                },
                prediction.climate_score,
            );
            if !prediction.suggested_crops.is_empty() {
                let crops = prediction
                    .suggested_crops
                    .iter()
                    .map(|c| format!("{} ({} kg/ha)", c.crop_name, c.predicted_yield_kg_per_ha))
                    .collect::<Vec<_>>()
                    .join(", ");
                text.push_str(&format!("\nSuggested crops: {crops}"));
            }
            text
        }
        SubmissionOutcome::Diagnosis(diagnosis) => format!("🩺 Plant diagnosis:\n{diagnosis}"),
    }
}

#[cfg(test)]
mod tests {
    use chrono::NaiveDate;
    use rust_decimal_macros::dec;

    use super::*;
    use crate::backend::{
        LoanApplication, SubmissionReceipt, SuggestedCrop, YieldCategory, YieldPrediction,
        YieldRequest,
    };

    fn receipt(fraud_score: Option<f64>) -> SubmissionReceipt {
        SubmissionReceipt {
            id: "LN-101".into(),
            status: "under_review".into(),
            fraud_score,
        }
    }

    #[test]
    fn loan_summary_echoes_backend_identifiers() {
        let outcome = SubmissionOutcome::Loan {
            receipt: receipt(Some(0.05)),
            application: LoanApplication {
                farmer_id: "f".into(),
                farmer_name: "F".into(),
                purpose: "Seeds".into(),
                crop_type: "Rice".into(),
                acres: dec!(5),
                amount: dec!(50000),
                tenure_months: 24,
            },
        };
        let text = submission_succeeded(&outcome);
        assert!(text.contains("ID: LN-101"));
        assert!(text.contains("Status: under_review"));
        assert!(text.contains("₹50000"));
        assert!(text.contains("24 months"));
        assert!(text.contains("Fraud Score: 0.05"));
    }

    #[test]
    fn yield_summary_lists_scores_and_crops() {
        let outcome = SubmissionOutcome::Yield {
            prediction: YieldPrediction {
                predicted_yield_kg_per_acre: 1850.0,
                yield_category: YieldCategory::High,
                soil_health_score: 78.0,
                soil_health_category: "Good".into(),
                climate_score: 65.0,
                suggested_crops: vec![SuggestedCrop {
                    crop_name: "Mustard".into(),
                    predicted_yield_kg_per_ha: 1400.0,
                }],
            },
            request: YieldRequest {
                crop_type: "Wheat".into(),
                acres: dec!(3),
                planting_date: NaiveDate::from_ymd_opt(2024, 11, 1).unwrap(),
            },
        };
        let text = submission_succeeded(&outcome);
        assert!(text.contains("Wheat (3 acres)"));
        assert!(text.contains("1850 kg/acre (High)"));
        assert!(text.contains("Soil health: 78/100 (Good)"));
        assert!(text.contains("Mustard (1400 kg/ha)"));
    }

    #[test]
    fn failure_includes_collaborator_error_text() {
        let err = BackendError::rejected("insurance", "Policy not found");
        let text = submission_failed(Workflow::Insurance, &err);
        assert!(text.contains("insurance claim"));
        assert!(text.contains("Policy not found"));
    }

    #[test]
    fn cancellation_names_the_flow() {
        assert!(cancelled(Workflow::Yield).contains("yield prediction"));
    }
}
