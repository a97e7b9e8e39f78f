//! Field validators. Each turns one user input into a stored `FieldValue` or
//! a corrective instruction that re-asks the same question.

use chrono::NaiveDate;
use rust_decimal::Decimal;

use super::input::UserInput;
use super::session::FieldValue;

/// Word that skips an optional upload.
pub const SKIP_KEYWORD: &str = "skip";

const DATE_FORMATS: &[&str] = &["%Y-%m-%d", "%d/%m/%Y", "%d-%m-%Y"];

/// A rejected answer. The message is shown to the farmer as-is.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("{message}")]
pub struct ValidationError {
    pub message: String,
}

impl ValidationError {
    fn new(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
        }
    }
}

/// What kind of answer a question expects.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FieldKind {
    /// Any non-empty text.
    Text,
    /// Positive money amount; currency symbols and separators are ignored.
    Amount,
    /// Whole years within an inclusive range, stored as months.
    TenureYears { min: u32, max: u32 },
    /// Positive land area.
    Acres,
    /// Calendar date.
    Date,
    /// A photo, or failing that a written description.
    PhotoOrDescription,
    /// A photo that may be skipped with the skip keyword.
    OptionalPhoto,
}

impl FieldKind {
    /// Validate one turn of input for this kind of field.
    pub fn validate(&self, input: &UserInput) -> Result<FieldValue, ValidationError> {
        match self {
            Self::Text => validate_text(input.text_part()),
            Self::Amount => validate_amount(input.text_part()),
            Self::TenureYears { min, max } => validate_tenure(input.text_part(), *min, *max),
            Self::Acres => validate_acres(input.text_part()),
            Self::Date => validate_date(input.text_part()),
            Self::PhotoOrDescription => validate_photo_or_description(input),
            Self::OptionalPhoto => validate_optional_photo(input),
        }
    }
}

fn validate_text(text: &str) -> Result<FieldValue, ValidationError> {
    let trimmed = text.trim();
    if trimmed.is_empty() {
        return Err(ValidationError::new("Please type an answer to continue."));
    }
    Ok(FieldValue::Text(trimmed.to_string()))
}

/// Keep digits and the decimal point, then parse.
///
/// Every other character is dropped, signs and exponents included: "-5000"
/// reads as 5000 and "1e5" as 15. Farmers type "₹50,000" or "2.5 acres",
/// never signed or scientific numbers.
fn parse_positive_decimal(text: &str) -> Option<Decimal> {
    let digits: String = text
        .chars()
        .filter(|c| c.is_ascii_digit() || *c == '.')
        .collect();
    let value: Decimal = digits.parse().ok()?;
    (value > Decimal::ZERO).then_some(value)
}

fn validate_amount(text: &str) -> Result<FieldValue, ValidationError> {
    parse_positive_decimal(text)
        .map(FieldValue::Decimal)
        .ok_or_else(|| ValidationError::new("Please enter a valid amount in numbers (e.g. 50000)."))
}

fn validate_acres(text: &str) -> Result<FieldValue, ValidationError> {
    parse_positive_decimal(text)
        .map(FieldValue::Decimal)
        .ok_or_else(|| ValidationError::new("Please enter the land area in acres as a number (e.g. 2.5)."))
}

fn validate_tenure(text: &str, min: u32, max: u32) -> Result<FieldValue, ValidationError> {
    let years = text
        .split_whitespace()
        .next()
        .and_then(|token| token.parse::<u32>().ok());
    match years {
        Some(y) if (min..=max).contains(&y) => Ok(FieldValue::Months(y * 12)),
        _ => Err(ValidationError::new(format!(
            "Please enter a tenure between {min} and {max} years."
        ))),
    }
}

fn validate_date(text: &str) -> Result<FieldValue, ValidationError> {
    let trimmed = text.trim();
    DATE_FORMATS
        .iter()
        .find_map(|fmt| NaiveDate::parse_from_str(trimmed, fmt).ok())
        .map(FieldValue::Date)
        .ok_or_else(|| {
            ValidationError::new("Please enter the date as YYYY-MM-DD (e.g. 2024-06-15).")
        })
}

fn non_empty(text: &str) -> Option<String> {
    let trimmed = text.trim();
    (!trimmed.is_empty()).then(|| trimmed.to_string())
}

fn validate_photo_or_description(input: &UserInput) -> Result<FieldValue, ValidationError> {
    match input.file() {
        Some(file) if !file.is_image() => Err(ValidationError::new(
            "That file doesn't look like a photo. Please upload a JPG or PNG image of the plant.",
        )),
        Some(file) => Ok(FieldValue::Upload {
            file: Some(file.clone()),
            caption: non_empty(input.text_part()),
        }),
        None => non_empty(input.text_part())
            .map(|description| FieldValue::Upload {
                file: None,
                caption: Some(description),
            })
            .ok_or_else(|| {
                ValidationError::new(
                    "Please attach a photo of the affected plant, or describe the symptoms you see.",
                )
            }),
    }
}

fn validate_optional_photo(input: &UserInput) -> Result<FieldValue, ValidationError> {
    match input.file() {
        Some(file) if !file.is_image() => Err(ValidationError::new(
            "That file doesn't look like a photo. Please upload a JPG or PNG image, or type 'skip'.",
        )),
        Some(file) => Ok(FieldValue::Upload {
            file: Some(file.clone()),
            caption: non_empty(input.text_part()),
        }),
        None if input.text_part().trim().eq_ignore_ascii_case(SKIP_KEYWORD) => {
            Ok(FieldValue::Skipped)
        }
        None => Err(ValidationError::new(
            "Please attach a photo of the damage, or type 'skip' to continue without one.",
        )),
    }
}
