//! Flow controller: the single entry point for a chat turn.
//!
//! Each turn is handled to completion, including any backend call, before the
//! caller may send the next one. The controller holds no lock; callers must
//! not run two turns on the same session concurrently.

use std::sync::Arc;

use serde::Serialize;
use tracing::{debug, info, warn};

use crate::backend::{FarmBackend, Language, Translator};

use super::input::UserInput;
use super::intent::{detect_intent, is_cancellation};
use super::prompts;
use super::session::{ConversationSession, Workflow};
use super::workflow::SessionContext;

/// What kind of reply the assistant produced.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ReplyKind {
    /// The next scripted question.
    Question,
    /// An answer was rejected; the same question is asked again.
    Corrective,
    Submitted,
    SubmissionFailed,
    Cancelled,
    /// Answer from the general assistant.
    General,
    /// The general assistant could not be reached.
    GeneralUnavailable,
    Hint,
}

/// The assistant's side of a turn.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct AssistantReply {
    pub kind: ReplyKind,
    pub text: String,
}

impl AssistantReply {
    fn new(kind: ReplyKind, text: impl Into<String>) -> Self {
        Self {
            kind,
            text: text.into(),
        }
    }
}

/// Drives scripted intake flows and falls back to general chat.
pub struct FlowController {
    backend: Arc<dyn FarmBackend>,
    context: SessionContext,
    translator: Option<Arc<dyn Translator>>,
}

impl FlowController {
    pub fn new(backend: Arc<dyn FarmBackend>, context: SessionContext) -> Self {
        Self {
            backend,
            context,
            translator: None,
        }
    }

    /// Translate general-chat questions into English and answers back into Hindi.
    pub fn with_translator(mut self, translator: Arc<dyn Translator>) -> Self {
        self.translator = Some(translator);
        self
    }

    /// Handle one user turn and record both sides in the transcript.
    pub async fn handle_user_turn(
        &self,
        session: &mut ConversationSession,
        input: UserInput,
    ) -> AssistantReply {
        session.log_user(&input);
        let reply = self.dispatch(session, &input).await;
        session.log_assistant(&reply.text);
        reply
    }

    /// Jump straight into `workflow`, abandoning any unfinished flow.
    pub fn start_flow(
        &self,
        session: &mut ConversationSession,
        workflow: Workflow,
    ) -> AssistantReply {
        if let Some(previous) = session.flow_state().workflow() {
            debug!(
                previous = %previous,
                step = session.step(),
                "Discarding unfinished flow"
            );
        }
        let reply = self.begin(session, workflow);
        session.log_assistant(&reply.text);
        reply
    }

    /// Rate the last general answer. Returns whether feedback was sent.
    pub async fn rate_last_answer(&self, session: &ConversationSession, helpful: bool) -> bool {
        let Some(prompt) = session.last_general_prompt() else {
            return false;
        };
        self.send_feedback(prompt, if helpful { 5 } else { 1 }).await
    }

    /// Forward a rating for `prompt`. Failures are logged, never surfaced.
    pub async fn send_feedback(&self, prompt: &str, rating: u8) -> bool {
        match self.backend.send_feedback(prompt, rating).await {
            Ok(()) => {
                info!(rating, "Feedback sent");
                true
            }
            Err(e) => {
                warn!(error = %e, "Failed to send feedback");
                false
            }
        }
    }

    async fn dispatch(&self, session: &mut ConversationSession, input: &UserInput) -> AssistantReply {
        let text = input.text_part();

        if !session.is_consistent() {
            warn!(
                state = ?session.flow_state(),
                step = session.step(),
                fields = session.collected_fields().len(),
                "Inconsistent session; resetting"
            );
            let was_active = !session.is_idle();
            session.reset();
            if was_active {
                return AssistantReply::new(ReplyKind::Hint, prompts::SESSION_RESET);
            }
        }

        if let Some(workflow) = session.flow_state().workflow() {
            if is_cancellation(text) {
                info!(workflow = %workflow, step = session.step(), "Flow cancelled");
                session.reset();
                return AssistantReply::new(ReplyKind::Cancelled, prompts::cancelled(workflow));
            }
            return self.advance(session, workflow, input).await;
        }

        if let Some(workflow) = detect_intent(text) {
            return self.begin(session, workflow);
        }

        if text.trim().is_empty() {
            return AssistantReply::new(ReplyKind::Hint, prompts::WELCOME_HINT);
        }

        self.ask_general(session, text).await
    }

    fn begin(&self, session: &mut ConversationSession, workflow: Workflow) -> AssistantReply {
        info!(workflow = %workflow, "Starting flow");
        session.begin(workflow);
        AssistantReply::new(ReplyKind::Question, workflow.definition().first_prompt())
    }

    async fn ask_general(&self, session: &mut ConversationSession, text: &str) -> AssistantReply {
        debug!("Forwarding to general chat");
        session.set_last_general_prompt(text);
        let question = self
            .translate_or_keep(text, Language::Hindi, Language::English)
            .await;
        match self.backend.ask_general(&question).await {
            Ok(answer) => {
                let answer = self
                    .translate_or_keep(&answer, Language::English, Language::Hindi)
                    .await;
                AssistantReply::new(ReplyKind::General, answer)
            }
            Err(e) => {
                warn!(error = %e, "General chat failed");
                AssistantReply::new(
                    ReplyKind::GeneralUnavailable,
                    prompts::GENERAL_CHAT_UNAVAILABLE,
                )
            }
        }
    }

    async fn translate_or_keep(&self, text: &str, from: Language, to: Language) -> String {
        let Some(translator) = &self.translator else {
            return text.to_string();
        };
        match translator.translate(text, from, to).await {
            Ok(translated) => translated,
            Err(e) => {
                warn!(
                    error = %e,
                    from = from.code(),
                    to = to.code(),
                    "Translation failed; using original text"
                );
                text.to_string()
            }
        }
    }

    async fn advance(
        &self,
        session: &mut ConversationSession,
        workflow: Workflow,
        input: &UserInput,
    ) -> AssistantReply {
        let definition = workflow.definition();
        let step = session.step();
        let Some(question) = definition.question(step) else {
            session.reset();
            return AssistantReply::new(ReplyKind::Hint, prompts::SESSION_RESET);
        };

        let value = match question.kind.validate(input) {
            Ok(value) => value,
            Err(e) => {
                debug!(workflow = %workflow, step, field = question.field, "Answer rejected");
                return AssistantReply::new(
                    ReplyKind::Corrective,
                    prompts::corrective(&e, question),
                );
            }
        };

        debug!(workflow = %workflow, step, field = question.field, "Answer accepted");
        session.accept(question.field, value);

        if let Some(next) = definition.question(session.step()) {
            return AssistantReply::new(ReplyKind::Question, next.prompt);
        }

        // Last answer in: the session is idle again before the backend is called.
        let fields = session.finish();
        match definition
            .submit(&fields, &self.context, self.backend.as_ref())
            .await
        {
            Ok(outcome) => {
                info!(workflow = %workflow, "Submission succeeded");
                AssistantReply::new(
                    ReplyKind::Submitted,
                    prompts::submission_succeeded(&outcome),
                )
            }
            Err(e) => {
                warn!(workflow = %workflow, error = %e, "Submission failed");
                AssistantReply::new(
                    ReplyKind::SubmissionFailed,
                    prompts::submission_failed(workflow, &e),
                )
            }
        }
    }
}
