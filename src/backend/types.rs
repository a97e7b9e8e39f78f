//! Request and response shapes for the farm backend.

use chrono::NaiveDate;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use crate::intake::Attachment;

/// Loan application body for `POST /loan/apply`.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct LoanApplication {
    #[serde(rename = "farmerUid")]
    pub farmer_id: String,
    #[serde(rename = "farmerName")]
    pub farmer_name: String,
    #[serde(rename = "loanPurpose")]
    pub purpose: String,
    #[serde(rename = "cropType")]
    pub crop_type: String,
    /// Farm size on record; the loan flow does not ask for it.
    #[serde(with = "rust_decimal::serde::float")]
    pub acres: Decimal,
    #[serde(rename = "requestedAmount", with = "rust_decimal::serde::float")]
    pub amount: Decimal,
    #[serde(rename = "tenureMonths")]
    pub tenure_months: u32,
}

/// Insurance claim, sent as multipart to `POST /insurance/create`.
#[derive(Debug, Clone, PartialEq)]
pub struct InsuranceClaim {
    pub farmer_id: String,
    pub provider: String,
    pub uin: String,
    pub policy_number: String,
    pub damage_photo: Option<Attachment>,
}

/// What the backend hands back for an accepted loan or claim.
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SubmissionReceipt {
    #[serde(deserialize_with = "id_as_string")]
    pub id: String,
    #[serde(default = "pending_status")]
    pub status: String,
    #[serde(default)]
    pub fraud_score: Option<f64>,
}

fn pending_status() -> String {
    "pending".to_string()
}

/// Some services return numeric ids.
fn id_as_string<'de, D>(deserializer: D) -> Result<String, D::Error>
where
    D: serde::Deserializer<'de>,
{
    match serde_json::Value::deserialize(deserializer)? {
        serde_json::Value::String(s) => Ok(s),
        serde_json::Value::Number(n) => Ok(n.to_string()),
        other => Err(serde::de::Error::custom(format!(
            "expected string or number id, got {other}"
        ))),
    }
}

/// Inputs for a yield prediction.
#[derive(Debug, Clone, PartialEq)]
pub struct YieldRequest {
    pub crop_type: String,
    pub acres: Decimal,
    pub planting_date: NaiveDate,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum YieldCategory {
    #[serde(alias = "high", alias = "HIGH")]
    High,
    #[serde(alias = "medium", alias = "MEDIUM")]
    Medium,
    #[serde(alias = "low", alias = "LOW")]
    Low,
}

impl std::fmt::Display for YieldCategory {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let s = match self {
            Self::High => "High",
            Self::Medium => "Medium",
            Self::Low => "Low",
        };
        write!(f, "{s}")
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SuggestedCrop {
    pub crop_name: String,
    pub predicted_yield_kg_per_ha: f64,
}

/// Strict JSON contract the yield model must answer with.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct YieldPrediction {
    pub predicted_yield_kg_per_acre: f64,
    pub yield_category: YieldCategory,
    pub soil_health_score: f64,
    #[serde(default)]
    pub soil_health_category: String,
    pub climate_score: f64,
    #[serde(default)]
    pub suggested_crops: Vec<SuggestedCrop>,
}

/// Plant doctor input. At least one of the two must be present.
#[derive(Debug, Clone, PartialEq)]
pub struct DiagnosisRequest {
    pub image: Option<Attachment>,
    pub description: Option<String>,
}
