//! Hindi/English translation for general chat.
//!
//! Farmers type in Hindi; the assistant answers best in English. Questions
//! go out translated to English and answers come back in Hindi. Callers fall
//! back to the untranslated text when translation fails.

use async_trait::async_trait;
use serde_json::Value;
use tracing::debug;

use crate::error::BackendError;

/// Languages the chat translates between.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Language {
    Hindi,
    English,
}

impl Language {
    pub fn code(self) -> &'static str {
        match self {
            Language::Hindi => "hi",
            Language::English => "en",
        }
    }
}

#[async_trait]
pub trait Translator: Send + Sync {
    async fn translate(&self, text: &str, from: Language, to: Language)
    -> Result<String, BackendError>;
}

/// Google's public `translate_a/single` endpoint.
pub struct GoogleTranslate {
    client: reqwest::Client,
    url: String,
}

impl GoogleTranslate {
    pub fn new(url: impl Into<String>) -> Self {
        Self {
            client: reqwest::Client::new(),
            url: url.into(),
        }
    }
}

#[async_trait]
impl Translator for GoogleTranslate {
    async fn translate(
        &self,
        text: &str,
        from: Language,
        to: Language,
    ) -> Result<String, BackendError> {
        let resp = self
            .client
            .get(&self.url)
            .query(&[
                ("client", "gtx"),
                ("sl", from.code()),
                ("tl", to.code()),
                ("dt", "t"),
                ("q", text),
            ])
            .send()
            .await
            .map_err(|e| BackendError::unreachable("translate", e))?;

        let status = resp.status();
        if !status.is_success() {
            return Err(BackendError::rejected(
                "translate",
                format!("Request failed with status {status}"),
            ));
        }
        let body: Value = resp
            .json()
            .await
            .map_err(|e| BackendError::malformed("translate", e))?;

        debug!(from = from.code(), to = to.code(), "Translated text");
        parse_translation(&body)
            .ok_or_else(|| BackendError::malformed("translate", "no translated segments"))
    }
}

/// Joins the translated segments: `[[["segment", "source", ...], ...], ...]`.
pub fn parse_translation(body: &Value) -> Option<String> {
    let joined: String = body
        .get(0)?
        .as_array()?
        .iter()
        .filter_map(|segment| segment.get(0)?.as_str())
        .collect();
    (!joined.trim().is_empty()).then_some(joined)
}
