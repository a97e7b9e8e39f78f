//! REST client for the farm services (loans, insurance, AI chat).

use reqwest::multipart::{Form, Part};
use serde::de::DeserializeOwned;
use tracing::{debug, info, warn};

use crate::config::BackendConfig;
use crate::error::BackendError;

use super::types::{InsuranceClaim, LoanApplication, SubmissionReceipt};

/// Reply the AI analysis endpoint wraps its answers in.
#[derive(Debug, serde::Deserialize)]
struct AnalysisReply {
    analysis: String,
}

/// HTTP client for the backend REST API.
pub struct RestClient {
    client: reqwest::Client,
    config: BackendConfig,
}

impl RestClient {
    pub fn new(config: BackendConfig) -> Self {
        Self {
            client: reqwest::Client::new(),
            config,
        }
    }

    fn backend_url(&self, path: &str) -> String {
        format!("{}{path}", self.config.backend_url.trim_end_matches('/'))
    }

    fn api_url(&self, path: &str) -> String {
        format!("{}{path}", self.config.api_url.trim_end_matches('/'))
    }

    /// `POST /loan/apply`.
    pub async fn submit_loan(
        &self,
        application: &LoanApplication,
    ) -> Result<SubmissionReceipt, BackendError> {
        info!(
            crop = %application.crop_type,
            tenure_months = application.tenure_months,
            "Submitting loan application"
        );
        let resp = self
            .client
            .post(self.backend_url("/loan/apply"))
            .json(application)
            .send()
            .await
            .map_err(|e| BackendError::unreachable("loan", e))?;
        read_json("loan", resp).await
    }

    /// `POST /insurance/create` as multipart form data.
    pub async fn submit_insurance(
        &self,
        claim: &InsuranceClaim,
    ) -> Result<SubmissionReceipt, BackendError> {
        let mut form = Form::new()
            .text("uid", claim.farmer_id.clone())
            .text("provider", claim.provider.clone())
            .text("uin", claim.uin.clone())
            .text("policyNumber", claim.policy_number.clone());

        if let Some(photo) = &claim.damage_photo {
            debug!(
                name = %photo.name,
                mime = %photo.mime_type,
                size = photo.size(),
                "Attaching damage photo"
            );
            let part = Part::bytes(photo.data.clone())
                .file_name(photo.name.clone())
                .mime_str(&photo.mime_type)
                .map_err(|e| BackendError::malformed("insurance", e))?;
            form = form.part("damageImage", part);
        }

        info!(provider = %claim.provider, "Submitting insurance claim");
        let resp = self
            .client
            .post(self.backend_url("/insurance/create"))
            .multipart(form)
            .send()
            .await
            .map_err(|e| BackendError::unreachable("insurance", e))?;
        read_json("insurance", resp).await
    }

    /// `POST /ai/analyze` with `type: chat`.
    pub async fn ask(&self, prompt: &str) -> Result<String, BackendError> {
        let body = serde_json::json!({ "type": "chat", "prompt": prompt });
        let resp = self
            .client
            .post(self.api_url("/ai/analyze"))
            .json(&body)
            .send()
            .await
            .map_err(|e| BackendError::unreachable("chat", e))?;
        let reply: AnalysisReply = read_json("chat", resp).await?;
        Ok(reply.analysis)
    }

    /// `POST /ai/analyze` with `type: feedback`.
    pub async fn feedback(&self, original_prompt: &str, rating: u8) -> Result<(), BackendError> {
        let body = serde_json::json!({
            "type": "feedback",
            "data": { "originalPrompt": original_prompt, "userRating": rating }
        });
        let resp = self
            .client
            .post(self.api_url("/ai/analyze"))
            .json(&body)
            .send()
            .await
            .map_err(|e| BackendError::unreachable("feedback", e))?;
        let status = resp.status();
        if !status.is_success() {
            let text = resp.text().await.unwrap_or_default();
            warn!(status = %status, "Feedback rejected");
            return Err(BackendError::rejected(
                "feedback",
                rejection_message(status, &text),
            ));
        }
        Ok(())
    }
}

async fn read_json<T: DeserializeOwned>(
    operation: &str,
    resp: reqwest::Response,
) -> Result<T, BackendError> {
    let status = resp.status();
    let text = resp
        .text()
        .await
        .map_err(|e| BackendError::unreachable(operation, e))?;

    if !status.is_success() {
        warn!(operation, status = %status, "Backend rejected request");
        return Err(BackendError::rejected(
            operation,
            rejection_message(status, &text),
        ));
    }

    serde_json::from_str(&text).map_err(|e| BackendError::malformed(operation, e))
}

/// Prefer the server's `message`/`error` field, then the raw body, then the
/// status line.
fn rejection_message(status: reqwest::StatusCode, body: &str) -> String {
    if let Ok(value) = serde_json::from_str::<serde_json::Value>(body) {
        for key in ["message", "error"] {
            if let Some(msg) = value.get(key).and_then(|v| v.as_str()) {
                return msg.to_string();
            }
        }
    }
    let trimmed = body.trim();
    if trimmed.is_empty() {
        format!("Request failed with status {status}")
    } else {
        trimmed.to_string()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn rejection_prefers_message_field() {
        let msg = rejection_message(
            reqwest::StatusCode::BAD_REQUEST,
            r#"{"message": "Tenure too long"}"#,
        );
        assert_eq!(msg, "Tenure too long");
    }

    #[test]
    fn rejection_falls_back_to_error_then_body_then_status() {
        assert_eq!(
            rejection_message(reqwest::StatusCode::BAD_REQUEST, r#"{"error": "bad uin"}"#),
            "bad uin"
        );
        assert_eq!(
            rejection_message(reqwest::StatusCode::BAD_GATEWAY, "upstream down"),
            "upstream down"
        );
        assert!(
            rejection_message(reqwest::StatusCode::INTERNAL_SERVER_ERROR, "")
                .contains("500")
        );
    }

    #[test]
    fn urls_join_without_double_slash() {
        let client = RestClient::new(BackendConfig {
            backend_url: "http://farm.local/".into(),
            api_url: "http://farm.local/api/".into(),
        });
        assert_eq!(client.backend_url("/loan/apply"), "http://farm.local/loan/apply");
        assert_eq!(client.api_url("/ai/analyze"), "http://farm.local/api/ai/analyze");
    }

    #[tokio::test]
    async fn unreachable_backend_is_reported() {
        // Port 9 (discard) on localhost is almost never listening.
        let client = RestClient::new(BackendConfig {
            backend_url: "http://127.0.0.1:9".into(),
            api_url: "http://127.0.0.1:9/api".into(),
        });
        let err = client.ask("hello").await.unwrap_err();
        assert!(matches!(err, BackendError::Unreachable { .. }));
    }
}
