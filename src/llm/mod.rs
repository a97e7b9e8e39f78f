//! LLM integration for Kisaan Saathi.
//!
//! Groq chat completions via rig-core. Yield prediction uses a text model and
//! plant diagnosis a vision model; both reach the rest of the crate through
//! the `LlmProvider` trait so tests can swap in a stub.

pub mod provider;
mod rig_adapter;

pub use provider::*;
pub use rig_adapter::RigAdapter;

use std::sync::Arc;

use rig::client::CompletionClient;
use secrecy::ExposeSecret;

use crate::error::LlmError;

/// Configuration for creating the LLM providers.
#[derive(Debug, Clone)]
pub struct LlmConfig {
    pub api_key: secrecy::SecretString,
    /// Text model, used for yield prediction.
    pub yield_model: String,
    /// Vision model, used for plant diagnosis.
    pub vision_model: String,
}

/// One provider per model the advisor needs.
#[derive(Clone)]
pub struct LlmProviders {
    pub text: Arc<dyn LlmProvider>,
    pub vision: Arc<dyn LlmProvider>,
}

/// Create the text and vision providers from configuration.
pub fn create_providers(config: &LlmConfig) -> Result<LlmProviders, LlmError> {
    use rig::providers::groq;

    let client: groq::Client = groq::Client::new(config.api_key.expose_secret()).map_err(|e| {
        LlmError::RequestFailed {
            provider: "groq".to_string(),
            reason: format!("Failed to create Groq client: {}", e),
        }
    })?;

    let text = client.completion_model(&config.yield_model);
    let vision = client.completion_model(&config.vision_model);
    tracing::info!(
        "Using Groq (model: {}, vision: {})",
        config.yield_model,
        config.vision_model
    );
    Ok(LlmProviders {
        text: Arc::new(RigAdapter::new(text, &config.yield_model, "groq")),
        vision: Arc::new(RigAdapter::new(vision, &config.vision_model, "groq")),
    })
}
