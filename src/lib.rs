//! Kisaan Saathi: conversational intake for farm loans, insurance claims,
//! yield prediction and plant diagnosis.

pub mod backend;
pub mod config;
pub mod error;
pub mod intake;
pub mod llm;
pub mod shell;
