//! Scripted workflows: the questions each flow asks, and how the answers
//! become a backend submission.

use std::collections::BTreeMap;

use rust_decimal::Decimal;
use tracing::info;

use crate::backend::{
    DiagnosisRequest, FarmBackend, InsuranceClaim, LoanApplication, SubmissionReceipt,
    YieldPrediction, YieldRequest,
};
use crate::error::BackendError;

use super::session::{FieldValue, Workflow};
use super::validate::FieldKind;

/// One scripted question.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Question {
    /// Key the answer is stored under.
    pub field: &'static str,
    /// Text shown to the farmer.
    pub prompt: &'static str,
    pub kind: FieldKind,
}

const LOAN_QUESTIONS: &[Question] = &[
    Question {
        field: "purpose",
        prompt: "What is the purpose of the loan?",
        kind: FieldKind::Text,
    },
    Question {
        field: "cropType",
        prompt: "Which crop is this loan for?",
        kind: FieldKind::Text,
    },
    Question {
        field: "amount",
        prompt: "How much would you like to borrow (in ₹)?",
        kind: FieldKind::Amount,
    },
    Question {
        field: "tenureMonths",
        prompt: "For how many years do you need the loan? (1-10)",
        kind: FieldKind::TenureYears { min: 1, max: 10 },
    },
];

const INSURANCE_QUESTIONS: &[Question] = &[
    Question {
        field: "provider",
        prompt: "Which Insurance Provider is your policy with?",
        kind: FieldKind::Text,
    },
    Question {
        field: "uin",
        prompt: "What is the UIN (Unique Identification Number) of your policy?",
        kind: FieldKind::Text,
    },
    Question {
        field: "policyNumber",
        prompt: "What is your policy number?",
        kind: FieldKind::Text,
    },
    Question {
        field: "damagePhoto",
        prompt: "Please upload a photo of the crop damage, or type 'skip' to continue without one.",
        kind: FieldKind::OptionalPhoto,
    },
];

const YIELD_QUESTIONS: &[Question] = &[
    Question {
        field: "cropType",
        prompt: "What type of crop are you growing?",
        kind: FieldKind::Text,
    },
    Question {
        field: "acres",
        prompt: "How many acres of land is the crop planted on?",
        kind: FieldKind::Acres,
    },
    Question {
        field: "plantingDate",
        prompt: "When was it planted? (YYYY-MM-DD)",
        kind: FieldKind::Date,
    },
];

const PLANT_DOCTOR_QUESTIONS: &[Question] = &[Question {
    field: "plantImage",
    prompt: "Please upload a photo of the affected plant.",
    kind: FieldKind::PhotoOrDescription,
}];

/// Farm size sent with loans when the farmer's records have none.
pub const DEFAULT_FARM_ACRES: Decimal = Decimal::from_parts(5, 0, 0, false, 0);

/// Who is submitting, attached to every request.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SessionContext {
    pub farmer_id: String,
    pub farmer_name: String,
    pub farm_acres: Decimal,
}

impl SessionContext {
    pub fn new(farmer_id: impl Into<String>, farmer_name: impl Into<String>) -> Self {
        Self {
            farmer_id: farmer_id.into(),
            farmer_name: farmer_name.into(),
            farm_acres: DEFAULT_FARM_ACRES,
        }
    }

    pub fn with_farm_acres(mut self, acres: Decimal) -> Self {
        self.farm_acres = acres;
        self
    }
}

/// What a finished flow produced.
#[derive(Debug, Clone, PartialEq)]
pub enum SubmissionOutcome {
    Loan {
        receipt: SubmissionReceipt,
        application: LoanApplication,
    },
    Insurance {
        receipt: SubmissionReceipt,
        provider: String,
    },
    Yield {
        prediction: YieldPrediction,
        request: YieldRequest,
    },
    Diagnosis(String),
}

/// Static definition of one workflow.
#[derive(Debug, Clone, Copy)]
pub struct WorkflowDefinition {
    pub workflow: Workflow,
    pub questions: &'static [Question],
}

impl Workflow {
    pub fn definition(&self) -> WorkflowDefinition {
        let questions = match self {
            Self::Loan => LOAN_QUESTIONS,
            Self::Insurance => INSURANCE_QUESTIONS,
            Self::Yield => YIELD_QUESTIONS,
            Self::PlantDoctor => PLANT_DOCTOR_QUESTIONS,
        };
        WorkflowDefinition {
            workflow: *self,
            questions,
        }
    }

    /// Human name used in replies.
    pub fn label(&self) -> &'static str {
        match self {
            Self::Loan => "loan application",
            Self::Insurance => "insurance claim",
            Self::Yield => "yield prediction",
            Self::PlantDoctor => "plant diagnosis",
        }
    }
}

impl WorkflowDefinition {
    /// Question for a 1-based step.
    pub fn question(&self, step: usize) -> Option<&'static Question> {
        step.checked_sub(1).and_then(|i| self.questions.get(i))
    }

    pub fn first_prompt(&self) -> &'static str {
        self.questions[0].prompt
    }

    pub fn len(&self) -> usize {
        self.questions.len()
    }

    pub fn is_empty(&self) -> bool {
        self.questions.is_empty()
    }

    /// Send the collected answers to the matching backend operation.
    pub async fn submit(
        &self,
        fields: &BTreeMap<String, FieldValue>,
        context: &SessionContext,
        backend: &dyn FarmBackend,
    ) -> Result<SubmissionOutcome, BackendError> {
        let answers = Answers(fields);
        info!(workflow = %self.workflow, fields = fields.len(), "Submitting workflow");

        match self.workflow {
            Workflow::Loan => {
                let application = LoanApplication {
                    farmer_id: context.farmer_id.clone(),
                    farmer_name: context.farmer_name.clone(),
                    purpose: answers.text("purpose")?,
                    crop_type: answers.text("cropType")?,
                    acres: context.farm_acres,
                    amount: answers.decimal("amount")?,
                    tenure_months: answers.months("tenureMonths")?,
                };
                let receipt = backend.submit_loan_application(application.clone()).await?;
                Ok(SubmissionOutcome::Loan {
                    receipt,
                    application,
                })
            }
            Workflow::Insurance => {
                let provider = answers.text("provider")?;
                let claim = InsuranceClaim {
                    farmer_id: context.farmer_id.clone(),
                    provider: provider.clone(),
                    uin: answers.text("uin")?,
                    policy_number: answers.text("policyNumber")?,
                    damage_photo: answers.upload("damagePhoto")?.0,
                };
                let receipt = backend.submit_insurance_claim(claim).await?;
                Ok(SubmissionOutcome::Insurance { receipt, provider })
            }
            Workflow::Yield => {
                let request = YieldRequest {
                    crop_type: answers.text("cropType")?,
                    acres: answers.decimal("acres")?,
                    planting_date: answers.date("plantingDate")?,
                };
                let prediction = backend.predict_yield(request.clone()).await?;
                Ok(SubmissionOutcome::Yield {
                    prediction,
                    request,
                })
            }
            Workflow::PlantDoctor => {
                let (image, description) = answers.upload("plantImage")?;
                if image.is_none() && description.is_none() {
                    return Err(BackendError::MissingInput(
                        "Please provide an image or description.".to_string(),
                    ));
                }
                let diagnosis = backend
                    .diagnose_plant_image(DiagnosisRequest { image, description })
                    .await?;
                Ok(SubmissionOutcome::Diagnosis(diagnosis))
            }
        }
    }
}

/// Typed lookups over collected fields.
struct Answers<'a>(&'a BTreeMap<String, FieldValue>);

impl Answers<'_> {
    fn get(&self, field: &str) -> Result<&FieldValue, BackendError> {
        self.0
            .get(field)
            .ok_or_else(|| BackendError::MissingInput(format!("Missing answer for {field}")))
    }

    fn mismatch(field: &str) -> BackendError {
        BackendError::MissingInput(format!("Unexpected answer type for {field}"))
    }

    fn text(&self, field: &str) -> Result<String, BackendError> {
        self.get(field)?
            .as_text()
            .map(str::to_string)
            .ok_or_else(|| Self::mismatch(field))
    }

    fn decimal(&self, field: &str) -> Result<Decimal, BackendError> {
        self.get(field)?
            .as_decimal()
            .ok_or_else(|| Self::mismatch(field))
    }

    fn months(&self, field: &str) -> Result<u32, BackendError> {
        self.get(field)?
            .as_months()
            .ok_or_else(|| Self::mismatch(field))
    }

    fn date(&self, field: &str) -> Result<chrono::NaiveDate, BackendError> {
        self.get(field)?.as_date().ok_or_else(|| Self::mismatch(field))
    }

    /// Skipped uploads come back as `(None, None)`.
    fn upload(
        &self,
        field: &str,
    ) -> Result<(Option<crate::intake::Attachment>, Option<String>), BackendError> {
        match self.get(field)? {
            FieldValue::Skipped => Ok((None, None)),
            value => value
                .as_upload()
                .map(|(file, caption)| (file.cloned(), caption.map(str::to_string)))
                .ok_or_else(|| Self::mismatch(field)),
        }
    }
}
