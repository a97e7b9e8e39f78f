//! AI-backed agronomy: yield prediction with a strict JSON contract, and
//! plant disease diagnosis from a photo or description.

use std::sync::Arc;

use tracing::{info, warn};

use crate::error::BackendError;
use crate::llm::{ChatMessage, CompletionRequest, LlmProvider};

use super::types::{DiagnosisRequest, YieldPrediction, YieldRequest};

const YIELD_SYSTEM_PROMPT: &str = "\
You are an expert agronomist. Analyze the crop and farm data provided and generate a detailed yield prediction.
RETURN JSON ONLY. The JSON must match this structure exactly:
{
  \"predictedYieldKgPerAcre\": number,
  \"yieldCategory\": \"High\" | \"Medium\" | \"Low\",
  \"soilHealthScore\": number (0-100),
  \"soilHealthCategory\": string,
  \"climateScore\": number (0-100),
  \"suggestedCrops\": [ { \"cropName\": string, \"predictedYieldKgPerHa\": number } ]
}";

/// Text sent with a photo when the farmer gave no description.
pub const DEFAULT_DIAGNOSIS_PROMPT: &str = "Analyze this plant image for diseases.";

/// LLM-backed advisor for yield and disease questions.
pub struct AgronomyAdvisor {
    text: Arc<dyn LlmProvider>,
    vision: Arc<dyn LlmProvider>,
}

impl AgronomyAdvisor {
    /// `text` answers yield questions; `vision` looks at plant photos.
    pub fn new(text: Arc<dyn LlmProvider>, vision: Arc<dyn LlmProvider>) -> Self {
        Self { text, vision }
    }

    pub async fn predict_yield(
        &self,
        request: &YieldRequest,
    ) -> Result<YieldPrediction, BackendError> {
        let user_prompt = format!(
            "Crop: {}\nAcres: {}\nPlanting Date: {}",
            request.crop_type,
            request.acres,
            request.planting_date.format("%Y-%m-%d")
        );
        let completion = CompletionRequest::new(vec![
            ChatMessage::system(YIELD_SYSTEM_PROMPT),
            ChatMessage::user(user_prompt),
        ])
        .with_max_tokens(8192);

        info!(
            crop = %request.crop_type,
            model = self.text.model_name(),
            "Requesting yield prediction"
        );
        let response = self.text.complete(completion).await?;
        parse_yield_prediction(&response.content)
    }

    pub async fn diagnose(&self, request: &DiagnosisRequest) -> Result<String, BackendError> {
        let description = request
            .description
            .as_deref()
            .map(str::trim)
            .filter(|d| !d.is_empty());

        let message = match (&request.image, description) {
            (None, None) => {
                return Err(BackendError::MissingInput(
                    "Please provide an image or description.".to_string(),
                ));
            }
            (Some(image), desc) => {
                ChatMessage::user(desc.unwrap_or(DEFAULT_DIAGNOSIS_PROMPT)).with_image(image.data_uri())
            }
            (None, Some(desc)) => ChatMessage::user(desc),
        };

        info!(
            with_image = request.image.is_some(),
            model = self.vision.model_name(),
            "Requesting plant diagnosis"
        );
        let completion = CompletionRequest::new(vec![message]).with_max_tokens(1024);
        let response = self.vision.complete(completion).await?;

        let diagnosis = response.content.trim();
        if diagnosis.is_empty() {
            return Err(BackendError::malformed("diagnosis", "empty answer"));
        }
        Ok(diagnosis.to_string())
    }
}

/// Find the first balanced `{...}` block in model output, skipping braces
/// inside JSON strings.
pub fn extract_json_object(text: &str) -> Option<&str> {
    let start = text.find('{')?;
    let mut depth = 0usize;
    let mut in_string = false;
    let mut escaped = false;

    for (offset, ch) in text[start..].char_indices() {
        if in_string {
            match ch {
                _ if escaped => escaped = false,
                '\\' => escaped = true,
                '"' => in_string = false,
                _ => {}
            }
            continue;
        }
        match ch {
            '"' => in_string = true,
            '{' => depth += 1,
            '}' => {
                depth -= 1;
                if depth == 0 {
                    return Some(&text[start..=start + offset]);
                }
            }
            _ => {}
        }
    }
    None
}

/// Parse and sanity-check the model's yield JSON.
pub fn parse_yield_prediction(content: &str) -> Result<YieldPrediction, BackendError> {
    let json = extract_json_object(content).ok_or_else(|| {
        warn!(response = content, "No JSON object in yield response");
        BackendError::malformed("yield prediction", "no JSON object in AI response")
    })?;

    let prediction: YieldPrediction =
        serde_json::from_str(json).map_err(|e| BackendError::malformed("yield prediction", e))?;

    let in_range = |score: f64| (0.0..=100.0).contains(&score);
    if !in_range(prediction.soil_health_score) || !in_range(prediction.climate_score) {
        return Err(BackendError::malformed(
            "yield prediction",
            "scores must be between 0 and 100",
        ));
    }
    if !prediction.predicted_yield_kg_per_acre.is_finite()
        || prediction.predicted_yield_kg_per_acre < 0.0
    {
        return Err(BackendError::malformed(
            "yield prediction",
            "predicted yield must be a non-negative number",
        ));
    }
    Ok(prediction)
}
