//! Farm backend: the services an intake flow submits to.
//!
//! The controller only sees the `FarmBackend` trait. `FarmServices` is the
//! production implementation: loans, claims and general chat go to the REST
//! API; yield prediction and plant diagnosis go to the LLM.

pub mod advisor;
pub mod rest;
pub mod translate;
pub mod types;

pub use advisor::{AgronomyAdvisor, extract_json_object, parse_yield_prediction};
pub use rest::RestClient;
pub use translate::{GoogleTranslate, Language, Translator, parse_translation};
pub use types::{
    DiagnosisRequest, InsuranceClaim, LoanApplication, SubmissionReceipt, SuggestedCrop,
    YieldCategory, YieldPrediction, YieldRequest,
};

use async_trait::async_trait;

use crate::error::BackendError;

/// External collaborators of the intake controller.
#[async_trait]
pub trait FarmBackend: Send + Sync {
    async fn submit_loan_application(
        &self,
        application: LoanApplication,
    ) -> Result<SubmissionReceipt, BackendError>;

    async fn submit_insurance_claim(
        &self,
        claim: InsuranceClaim,
    ) -> Result<SubmissionReceipt, BackendError>;

    async fn predict_yield(&self, request: YieldRequest) -> Result<YieldPrediction, BackendError>;

    async fn diagnose_plant_image(
        &self,
        request: DiagnosisRequest,
    ) -> Result<String, BackendError>;

    /// Free-form question for the general assistant.
    async fn ask_general(&self, prompt: &str) -> Result<String, BackendError>;

    /// Rate an earlier general answer (1 = not helpful, 5 = helpful).
    async fn send_feedback(&self, original_prompt: &str, rating: u8) -> Result<(), BackendError>;
}

/// Production backend.
pub struct FarmServices {
    rest: RestClient,
    advisor: AgronomyAdvisor,
}

impl FarmServices {
    pub fn new(rest: RestClient, advisor: AgronomyAdvisor) -> Self {
        Self { rest, advisor }
    }
}

#[async_trait]
impl FarmBackend for FarmServices {
    async fn submit_loan_application(
        &self,
        application: LoanApplication,
    ) -> Result<SubmissionReceipt, BackendError> {
        self.rest.submit_loan(&application).await
    }

    async fn submit_insurance_claim(
        &self,
        claim: InsuranceClaim,
    ) -> Result<SubmissionReceipt, BackendError> {
        self.rest.submit_insurance(&claim).await
    }

    async fn predict_yield(&self, request: YieldRequest) -> Result<YieldPrediction, BackendError> {
        self.advisor.predict_yield(&request).await
    }

    async fn diagnose_plant_image(
        &self,
        request: DiagnosisRequest,
    ) -> Result<String, BackendError> {
        self.advisor.diagnose(&request).await
    }

    async fn ask_general(&self, prompt: &str) -> Result<String, BackendError> {
        self.rest.ask(prompt).await
    }

    async fn send_feedback(&self, original_prompt: &str, rating: u8) -> Result<(), BackendError> {
        self.rest.feedback(original_prompt, rating).await
    }
}
