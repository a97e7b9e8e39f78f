//! Conversational intake: scripted multi-step flows for loans, insurance
//! claims, yield prediction and plant diagnosis, with general chat when no
//! flow is active.

pub mod controller;
pub mod input;
pub mod intent;
pub mod prompts;
pub mod session;
pub mod validate;
pub mod workflow;

pub use controller::{AssistantReply, FlowController, ReplyKind};
pub use input::{Attachment, AttachmentMeta, UserInput};
pub use intent::{detect_intent, is_cancellation};
pub use session::{ChatMessage, ConversationSession, FieldValue, FlowState, Speaker, Workflow};
pub use validate::{FieldKind, ValidationError};
pub use workflow::{Question, SessionContext, SubmissionOutcome, WorkflowDefinition};
