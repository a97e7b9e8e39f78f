//! Bridges rig-core's `CompletionModel` to our `LlmProvider` trait.

use async_trait::async_trait;
use rig::OneOrMany;
use rig::completion::{AssistantContent, CompletionError, CompletionModel, Message};
use rig::message::UserContent;

use crate::error::LlmError;

use super::provider::{
    ChatMessage, CompletionRequest, CompletionResponse, FinishReason, LlmProvider, Role,
};

/// Wraps any rig completion model.
pub struct RigAdapter<M> {
    model: M,
    model_name: String,
    provider: &'static str,
}

impl<M: CompletionModel> RigAdapter<M> {
    pub fn new(model: M, model_name: &str, provider: &'static str) -> Self {
        Self {
            model,
            model_name: model_name.to_string(),
            provider,
        }
    }

    fn error(&self, reason: impl Into<String>) -> LlmError {
        LlmError::InvalidResponse {
            provider: self.provider.to_string(),
            reason: reason.into(),
        }
    }
}

#[async_trait]
impl<M> LlmProvider for RigAdapter<M>
where
    M: CompletionModel + Send + Sync + 'static,
{
    fn model_name(&self) -> &str {
        &self.model_name
    }

    async fn complete(&self, request: CompletionRequest) -> Result<CompletionResponse, LlmError> {
        let Conversation {
            preamble,
            mut history,
        } = split_conversation(&request.messages).map_err(|e| self.error(e))?;
        let prompt = history
            .pop()
            .ok_or_else(|| self.error("completion request has no user message"))?;

        let mut builder = self.model.completion_request(prompt).messages(history);
        if let Some(preamble) = preamble {
            builder = builder.preamble(preamble);
        }
        if let Some(temperature) = request.temperature {
            builder = builder.temperature(f64::from(temperature));
        }
        if let Some(max_tokens) = request.max_tokens {
            builder = builder.max_tokens(u64::from(max_tokens));
        }

        tracing::debug!(model = %self.model_name, "Sending completion");
        let response = builder
            .send()
            .await
            .map_err(|e| map_completion_error(self.provider, e))?;

        let content = response
            .choice
            .iter()
            .filter_map(|c| match c {
                AssistantContent::Text(text) => Some(text.text.as_str()),
                _ => None,
            })
            .collect::<Vec<_>>()
            .join("");

        Ok(CompletionResponse {
            content,
            input_tokens: u32::try_from(response.usage.input_tokens).unwrap_or(u32::MAX),
            output_tokens: u32::try_from(response.usage.output_tokens).unwrap_or(u32::MAX),
            finish_reason: FinishReason::Stop,
        })
    }
}

/// System text plus the rig message history, last entry being the prompt.
struct Conversation {
    preamble: Option<String>,
    history: Vec<Message>,
}

fn split_conversation(messages: &[ChatMessage]) -> Result<Conversation, String> {
    let mut system = Vec::new();
    let mut history = Vec::new();

    for message in messages {
        match message.role {
            Role::System => system.push(message.content.as_str()),
            Role::Assistant => history.push(Message::assistant(message.content.clone())),
            Role::User => history.push(user_message(message)?),
        }
    }

    Ok(Conversation {
        preamble: (!system.is_empty()).then(|| system.join("\n\n")),
        history,
    })
}

fn user_message(message: &ChatMessage) -> Result<Message, String> {
    let Some(url) = &message.image_url else {
        return Ok(Message::user(message.content.clone()));
    };
    let content = OneOrMany::many(vec![
        UserContent::text(message.content.clone()),
        UserContent::image_url(url.clone(), None, None),
    ])
    .map_err(|e| e.to_string())?;
    Ok(Message::User { content })
}

fn map_completion_error(provider: &str, error: CompletionError) -> LlmError {
    let reason = error.to_string();
    let lower = reason.to_lowercase();
    if lower.contains("429") || lower.contains("rate limit") {
        LlmError::RateLimited {
            provider: provider.to_string(),
        }
    } else if lower.contains("401") || lower.contains("unauthorized") {
        LlmError::AuthFailed {
            provider: provider.to_string(),
        }
    } else {
        LlmError::RequestFailed {
            provider: provider.to_string(),
            reason,
        }
    }
}
