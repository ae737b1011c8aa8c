//! Public loan application form

use crate::api::ApplicationsApi;
use crate::error::{ApiError, FormError};
use crate::notification::Notification;
use serde::{Deserialize, Serialize};
use tracing::{info, warn};

/// Raw form input, exactly as typed
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ApplicationForm {
    pub full_name: String,
    pub phone: String,
    pub email: String,
    pub amount: String,
    pub term: String,
    pub purpose: String,
}

/// Validated submission in the submit endpoint's wire format
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ApplicationSubmission {
    pub full_name: String,
    pub phone: String,
    pub email: String,
    pub amount: Option<f64>,
    pub term: Option<u32>,
    pub purpose: String,
}

impl ApplicationForm {
    /// Validate the input
    ///
    /// Name, phone and email are required. Amount and term are optional but
    /// must be positive numbers when given.
    pub fn validate(&self) -> Result<ApplicationSubmission, FormError> {
        let full_name = required(&self.full_name, "full name")?;
        let phone = required(&self.phone, "phone")?;
        let email = required(&self.email, "email")?;
        validate_email(&email)?;

        Ok(ApplicationSubmission {
            full_name,
            phone,
            email,
            amount: parse_amount(&self.amount)?,
            term: parse_term(&self.term)?,
            purpose: self.purpose.trim().to_string(),
        })
    }
}

fn required(value: &str, field: &'static str) -> Result<String, FormError> {
    let value = value.trim();
    if value.is_empty() {
        return Err(FormError::MissingField(field));
    }
    Ok(value.to_string())
}

fn validate_email(email: &str) -> Result<(), FormError> {
    match email.split_once('@') {
        Some((local, domain)) if !local.is_empty() && !domain.is_empty() => Ok(()),
        _ => Err(FormError::InvalidEmail),
    }
}

fn parse_amount(raw: &str) -> Result<Option<f64>, FormError> {
    let normalized: String = raw
        .chars()
        .filter(|c| !c.is_whitespace())
        .map(|c| if c == ',' { '.' } else { c })
        .collect();
    if normalized.is_empty() {
        return Ok(None);
    }

    match normalized.parse::<f64>() {
        Ok(amount) if amount.is_finite() && amount > 0.0 => Ok(Some(amount)),
        _ => Err(FormError::InvalidAmount),
    }
}

fn parse_term(raw: &str) -> Result<Option<u32>, FormError> {
    let raw = raw.trim();
    if raw.is_empty() {
        return Ok(None);
    }

    match raw.parse::<u32>() {
        Ok(term) if term > 0 => Ok(Some(term)),
        _ => Err(FormError::InvalidTerm),
    }
}

/// What happened to a form submission
#[derive(Debug, Clone, PartialEq)]
pub struct IntakeOutcome {
    pub notification: Notification,
    /// The form should be cleared
    pub accepted: bool,
    pub application_id: Option<i64>,
}

/// Validate and submit a form
///
/// Never fails: every problem becomes an error notification and the form
/// is kept for correction.
pub async fn submit_application<A>(api: &A, form: &ApplicationForm) -> IntakeOutcome
where
    A: ApplicationsApi + ?Sized,
{
    let submission = match form.validate() {
        Ok(submission) => submission,
        Err(e) => {
            info!("Rejected application form: {}", e);
            return IntakeOutcome {
                notification: Notification::error(e.to_string()),
                accepted: false,
                application_id: None,
            };
        }
    };

    match api.submit_application(&submission).await {
        Ok(application_id) => {
            info!("Application submitted (id: {:?})", application_id);
            IntakeOutcome {
                notification: Notification::success(
                    "Application sent!",
                    "Our manager will contact you shortly.",
                ),
                accepted: true,
                application_id,
            }
        }
        Err(e) => {
            warn!("Failed to submit application: {}", e);
            let description = match e {
                ApiError::Rejected(Some(message)) => message,
                ApiError::Rejected(None) => "Could not send the application".to_string(),
                _ => "Could not connect to the server".to_string(),
            };
            IntakeOutcome {
                notification: Notification::error(description),
                accepted: false,
                application_id: None,
            }
        }
    }
}
