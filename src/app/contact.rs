use std::sync::LazyLock;

use axum::extract::rejection::JsonRejection;
use regex::Regex;
use serde::Deserialize;

use crate::db::submission::CreateSubmission;
use crate::prelude::*;
use crate::utils::geo::resolve_location;
use crate::utils::mailer::Notification;
use crate::views::filters::format_submitted_at;

pub fn add_routes(router: AppRouter) -> AppRouter {
    router.public_routes(|r| r.route("/contact", post(contact_form)))
}

/// Untrusted contact form body. Every field may be missing.
#[derive(Deserialize, Debug, Default)]
#[serde(default)]
pub struct ContactForm {
    name: Option<String>,
    email: Option<String>,
    phone: Option<String>,
    subject: Option<String>,
    message: Option<String>,
}

/// A contact form which passed validation. Values are kept exactly as submitted.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ContactRequest {
    pub name: String,
    pub email: String,
    pub phone: Option<String>,
    pub subject: String,
    pub message: String,
}

#[derive(Debug, PartialEq, Eq, thiserror::Error)]
pub enum ValidationError {
    #[error("All fields are required")]
    MissingFields,
    #[error("Invalid email format")]
    InvalidEmail,
}

impl From<ValidationError> for JsonError {
    fn from(e: ValidationError) -> Self {
        invalid(e.to_string()).into()
    }
}

static EMAIL: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?i)^[A-Z0-9._%+-]+@[A-Z0-9.-]+\.[A-Z]{2,}$").unwrap());

impl ContactForm {
    pub fn validate(self, require_phone: bool) -> Result<ContactRequest, ValidationError> {
        fn filled(v: Option<String>) -> Option<String> {
            v.filter(|v| !v.trim().is_empty())
        }

        let (Some(name), Some(email), Some(subject), Some(message)) =
            (filled(self.name), filled(self.email), filled(self.subject), filled(self.message))
        else {
            return Err(ValidationError::MissingFields);
        };
        if require_phone && filled(self.phone.clone()).is_none() {
            return Err(ValidationError::MissingFields);
        }

        if !EMAIL.is_match(&email) {
            return Err(ValidationError::InvalidEmail);
        }

        Ok(ContactRequest { name, email, phone: self.phone, subject, message })
    }
}

#[derive(serde::Serialize)]
struct Submitted {
    success: bool,
}

/// Validate, store, and queue an operator notification for a contact form submission.
///
/// Responds as soon as the submission is stored. Geolocation and email are best effort and never fail the request.
async fn contact_form(
    State(state): State<SharedAppState>,
    ClientIp(ip): ClientIp,
    body: Result<Json<ContactForm>, JsonRejection>,
) -> JsonResult<Submitted> {
    let Json(form) = body.map_err(|e| {
        tracing::debug!("Rejected contact form body: {e}");
        match e.status() {
            StatusCode::PAYLOAD_TOO_LARGE => AppError::TooLarge,
            _ => invalid("Invalid request body"),
        }
    })?;
    let contact = form.validate(state.config.contact.require_phone)?;

    let location = match &state.geo {
        Some(geo) => Some(resolve_location(geo.as_ref(), ip.as_deref()).await),
        None => None,
    };

    let submission = CreateSubmission {
        name: contact.name,
        email: contact.email,
        phone: contact.phone,
        subject: contact.subject,
        message: contact.message,
        ip_address: ip,
        location,
        submitted_at: format_submitted_at(Utc::now(), state.config.app.tz),
    };

    let id = state.store.insert(&submission).await.context("storing contact submission")?;
    tracing::info!("Stored contact submission_id={id}");

    state.mailer.enqueue(Notification { id, submission });

    Ok(Json(Submitted { success: true }))
}
