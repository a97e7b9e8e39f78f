//! Conversation session: which flow is active, which question is next, and
//! what has been collected so far.

use std::collections::BTreeMap;

use chrono::{DateTime, NaiveDate, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use super::input::{Attachment, AttachmentMeta, UserInput};

/// The guided workflows the assistant can run.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Workflow {
    Loan,
    Insurance,
    Yield,
    PlantDoctor,
}

impl Workflow {
    pub const ALL: [Workflow; 4] = [
        Workflow::Loan,
        Workflow::Insurance,
        Workflow::Yield,
        Workflow::PlantDoctor,
    ];
}

impl std::fmt::Display for Workflow {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let s = match self {
            Self::Loan => "loan",
            Self::Insurance => "insurance",
            Self::Yield => "yield",
            Self::PlantDoctor => "plant_doctor",
        };
        write!(f, "{s}")
    }
}

impl std::str::FromStr for Workflow {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().replace(['-', ' '], "_").as_str() {
            "loan" => Ok(Self::Loan),
            "insurance" | "claim" => Ok(Self::Insurance),
            "yield" => Ok(Self::Yield),
            "plant_doctor" | "plant" | "disease" => Ok(Self::PlantDoctor),
            other => Err(format!("Unknown workflow: {other}")),
        }
    }
}

/// Which flow, if any, the session is in.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FlowState {
    #[default]
    Idle,
    Loan,
    Insurance,
    Yield,
    PlantDoctor,
}

impl FlowState {
    pub fn workflow(&self) -> Option<Workflow> {
        match self {
            Self::Idle => None,
            Self::Loan => Some(Workflow::Loan),
            Self::Insurance => Some(Workflow::Insurance),
            Self::Yield => Some(Workflow::Yield),
            Self::PlantDoctor => Some(Workflow::PlantDoctor),
        }
    }
}

impl From<Workflow> for FlowState {
    fn from(workflow: Workflow) -> Self {
        match workflow {
            Workflow::Loan => Self::Loan,
            Workflow::Insurance => Self::Insurance,
            Workflow::Yield => Self::Yield,
            Workflow::PlantDoctor => Self::PlantDoctor,
        }
    }
}

/// A validated answer stored under a question's field name.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", content = "value", rename_all = "snake_case")]
pub enum FieldValue {
    Text(String),
    Decimal(Decimal),
    Months(u32),
    Date(NaiveDate),
    /// A photo with its caption, or a caption alone.
    Upload {
        file: Option<Attachment>,
        caption: Option<String>,
    },
    /// An optional field the farmer skipped.
    Skipped,
}

impl FieldValue {
    pub fn as_text(&self) -> Option<&str> {
        match self {
            Self::Text(s) => Some(s),
            _ => None,
        }
    }

    pub fn as_decimal(&self) -> Option<Decimal> {
        match self {
            Self::Decimal(d) => Some(*d),
            _ => None,
        }
    }

    pub fn as_months(&self) -> Option<u32> {
        match self {
            Self::Months(m) => Some(*m),
            _ => None,
        }
    }

    pub fn as_date(&self) -> Option<NaiveDate> {
        match self {
            Self::Date(d) => Some(*d),
            _ => None,
        }
    }

    /// `(file, caption)` for uploads.
    pub fn as_upload(&self) -> Option<(Option<&Attachment>, Option<&str>)> {
        match self {
            Self::Upload { file, caption } => Some((file.as_ref(), caption.as_deref())),
            _ => None,
        }
    }
}

/// Author of a transcript entry.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Speaker {
    User,
    Assistant,
}

/// A transcript entry. Display only; flow logic never reads it back.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ChatMessage {
    pub role: Speaker,
    pub text: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub attachment: Option<AttachmentMeta>,
    pub at: DateTime<Utc>,
}

/// One chat widget's conversation state.
///
/// Read access is public; only the flow controller mutates it.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ConversationSession {
    id: Uuid,
    flow_state: FlowState,
    step: usize,
    collected_fields: BTreeMap<String, FieldValue>,
    #[serde(default)]
    message_log: Vec<ChatMessage>,
    /// Last prompt forwarded to general chat, for feedback.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    last_general_prompt: Option<String>,
}

impl Default for ConversationSession {
    fn default() -> Self {
        Self::new()
    }
}

impl ConversationSession {
    pub fn new() -> Self {
        Self {
            id: Uuid::new_v4(),
            flow_state: FlowState::Idle,
            step: 0,
            collected_fields: BTreeMap::new(),
            message_log: Vec::new(),
            last_general_prompt: None,
        }
    }

    pub fn id(&self) -> Uuid {
        self.id
    }

    pub fn flow_state(&self) -> FlowState {
        self.flow_state
    }

    pub fn is_idle(&self) -> bool {
        self.flow_state == FlowState::Idle
    }

    pub fn step(&self) -> usize {
        self.step
    }

    pub fn collected_fields(&self) -> &BTreeMap<String, FieldValue> {
        &self.collected_fields
    }

    pub fn field(&self, name: &str) -> Option<&FieldValue> {
        self.collected_fields.get(name)
    }

    pub fn message_log(&self) -> &[ChatMessage] {
        &self.message_log
    }

    pub fn last_general_prompt(&self) -> Option<&str> {
        self.last_general_prompt.as_deref()
    }

    /// Whether step and fields agree with the flow state: idle sessions hold
    /// nothing, and a flow at step N holds exactly the answers to questions
    /// 1..N-1. Sessions arriving from a client are checked before use.
    pub fn is_consistent(&self) -> bool {
        let Some(workflow) = self.flow_state.workflow() else {
            return self.step == 0 && self.collected_fields.is_empty();
        };
        let definition = workflow.definition();
        if self.step == 0 || self.step > definition.len() {
            return false;
        }
        let answered = &definition.questions[..self.step - 1];
        answered.len() == self.collected_fields.len()
            && answered
                .iter()
                .all(|q| self.collected_fields.contains_key(q.field))
    }

    /// Enter `workflow` at its first question, dropping anything collected
    /// for an unfinished flow.
    pub(crate) fn begin(&mut self, workflow: Workflow) {
        self.flow_state = workflow.into();
        self.step = 1;
        self.collected_fields.clear();
    }

    /// Store an accepted answer and move to the next question.
    pub(crate) fn accept(&mut self, field: &str, value: FieldValue) {
        self.collected_fields.insert(field.to_string(), value);
        self.step += 1;
    }

    /// Hand the collected fields to a submission, returning to idle.
    pub(crate) fn finish(&mut self) -> BTreeMap<String, FieldValue> {
        let fields = std::mem::take(&mut self.collected_fields);
        self.reset();
        fields
    }

    pub(crate) fn reset(&mut self) {
        self.flow_state = FlowState::Idle;
        self.step = 0;
        self.collected_fields.clear();
    }

    pub(crate) fn set_last_general_prompt(&mut self, prompt: &str) {
        self.last_general_prompt = Some(prompt.to_string());
    }

    pub(crate) fn log_user(&mut self, input: &UserInput) {
        self.message_log.push(ChatMessage {
            role: Speaker::User,
            text: input.text_part().to_string(),
            attachment: input.file().map(Attachment::meta),
            at: Utc::now(),
        });
    }

    pub(crate) fn log_assistant(&mut self, text: &str) {
        self.message_log.push(ChatMessage {
            role: Speaker::Assistant,
            text: text.to_string(),
            attachment: None,
            at: Utc::now(),
        });
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn new_session_is_idle() {
        let session = ConversationSession::new();
        assert_eq!(session.flow_state(), FlowState::Idle);
        assert_eq!(session.step(), 0);
        assert!(session.collected_fields().is_empty());
        assert!(session.message_log().is_empty());
    }

    #[test]
    fn begin_discards_previous_fields() {
        let mut session = ConversationSession::new();
        session.begin(Workflow::Loan);
        session.accept("purpose", FieldValue::Text("Seeds".into()));
        assert_eq!(session.step(), 2);

        session.begin(Workflow::Yield);
        assert_eq!(session.flow_state(), FlowState::Yield);
        assert_eq!(session.step(), 1);
        assert!(session.collected_fields().is_empty());
    }

    #[test]
    fn finish_returns_fields_and_resets() {
        let mut session = ConversationSession::new();
        session.begin(Workflow::PlantDoctor);
        session.accept("description", FieldValue::Text("spots".into()));
        let fields = session.finish();
        assert_eq!(fields.len(), 1);
        assert!(session.is_idle());
        assert_eq!(session.step(), 0);
        assert!(session.collected_fields().is_empty());
    }

    #[test]
    fn workflow_display_matches_serde() {
        for workflow in Workflow::ALL {
            let display = format!("{workflow}");
            let json = serde_json::to_string(&workflow).unwrap();
            assert_eq!(format!("\"{display}\""), json);
            assert_eq!(display.parse::<Workflow>().unwrap(), workflow);
        }
    }

    #[test]
    fn workflow_parses_aliases() {
        assert_eq!("Plant Doctor".parse::<Workflow>().unwrap(), Workflow::PlantDoctor);
        assert_eq!("claim".parse::<Workflow>().unwrap(), Workflow::Insurance);
        assert!("weather".parse::<Workflow>().is_err());
    }

    #[test]
    fn flow_state_maps_to_workflow() {
        assert_eq!(FlowState::Idle.workflow(), None);
        for workflow in Workflow::ALL {
            assert_eq!(FlowState::from(workflow).workflow(), Some(workflow));
        }
    }

    #[test]
    fn transcript_keeps_attachment_metadata_only() {
        let mut session = ConversationSession::new();
        let file = Attachment::new("leaf.jpg", "image/jpeg", vec![0; 2048]);
        session.log_user(&UserInput::File(file));
        session.log_assistant("Looks like blight.");

        let log = session.message_log();
        assert_eq!(log.len(), 2);
        assert_eq!(log[0].role, Speaker::User);
        assert_eq!(log[0].text, "");
        assert_eq!(log[0].attachment.as_ref().unwrap().size, 2048);
        assert_eq!(log[1].role, Speaker::Assistant);
    }

    fn from_json(value: serde_json::Value) -> ConversationSession {
        serde_json::from_value(value).unwrap()
    }

    #[test]
    fn fresh_and_mid_flow_sessions_are_consistent() {
        let mut session = ConversationSession::new();
        assert!(session.is_consistent());
        session.begin(Workflow::Loan);
        assert!(session.is_consistent());
        session.accept("purpose", FieldValue::Text("Seeds".into()));
        assert!(session.is_consistent());
    }

    #[test]
    fn idle_session_with_leftovers_is_inconsistent() {
        let session = from_json(serde_json::json!({
            "id": Uuid::new_v4(),
            "flowState": "idle",
            "step": 3,
            "collectedFields": { "junk": { "kind": "text", "value": "x" } }
        }));
        assert!(!session.is_consistent());
    }

    #[test]
    fn unexpected_or_missing_fields_are_inconsistent() {
        let extra = from_json(serde_json::json!({
            "id": Uuid::new_v4(),
            "flowState": "loan",
            "step": 2,
            "collectedFields": {
                "purpose": { "kind": "text", "value": "Seeds" },
                "evil": { "kind": "text", "value": "x" }
            }
        }));
        assert!(!extra.is_consistent());

        let missing = from_json(serde_json::json!({
            "id": Uuid::new_v4(),
            "flowState": "loan",
            "step": 3,
            "collectedFields": { "purpose": { "kind": "text", "value": "Seeds" } }
        }));
        assert!(!missing.is_consistent());

        let past_end = from_json(serde_json::json!({
            "id": Uuid::new_v4(),
            "flowState": "plant_doctor",
            "step": 2,
            "collectedFields": { "plantImage": { "kind": "skipped" } }
        }));
        assert!(!past_end.is_consistent());
    }

    #[test]
    fn session_serde_roundtrip_mid_flow() {
        let mut session = ConversationSession::new();
        session.begin(Workflow::Loan);
        session.accept("purpose", FieldValue::Text("Crop Cultivation".into()));
        session.accept("amount", FieldValue::Decimal(Decimal::new(50000, 0)));

        let json = serde_json::to_string(&session).unwrap();
        let parsed: ConversationSession = serde_json::from_str(&json).unwrap();
        assert_eq!(parsed, session);
        assert_eq!(parsed.step(), 3);
    }
}
