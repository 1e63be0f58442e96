//! Error types for card construction, validation and webhook delivery.

use reqwest::StatusCode;
use thiserror::Error;

use crate::context::ContextError;
use crate::webhook::{
    WEBHOOK_URL_OFFICE365_PREFIX, WEBHOOK_URL_OFFICECOM_PREFIX,
    WEBHOOK_URL_OFFICIAL_DOCS_SAMPLE_URI,
};

/// Category of a [`CardError`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CardErrorKind {
    InvalidType,
    InvalidFieldValue,
    MissingValue,
    ValueNotFound,
}

/// Errors raised while building or validating a card.
///
/// Builders return these before mutating anything, so a failed call leaves
/// the card untouched.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum CardError {
    /// Wrong discriminant or tag value
    #[error("invalid type value: {0}")]
    InvalidType(String),

    /// Value outside the allowed set or pattern
    #[error("invalid field value: {0}")]
    InvalidFieldValue(String),

    /// Required field empty or absent
    #[error("missing expected value: {0}")]
    MissingValue(String),

    /// Lookup miss
    #[error("requested value not found: {0}")]
    ValueNotFound(String),
}

impl CardError {
    /// The category of this error.
    #[must_use]
    pub const fn kind(&self) -> CardErrorKind {
        match self {
            Self::InvalidType(_) => CardErrorKind::InvalidType,
            Self::InvalidFieldValue(_) => CardErrorKind::InvalidFieldValue,
            Self::MissingValue(_) => CardErrorKind::MissingValue,
            Self::ValueNotFound(_) => CardErrorKind::ValueNotFound,
        }
    }

    /// The detail message without the category prefix.
    #[must_use]
    pub fn detail(&self) -> &str {
        match self {
            Self::InvalidType(detail)
            | Self::InvalidFieldValue(detail)
            | Self::MissingValue(detail)
            | Self::ValueNotFound(detail) => detail,
        }
    }
}

/// Errors raised by webhook URL validation.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum WebhookError {
    #[error(
        "incomplete webhook URL: provided URL {0:?} shorter than or equal to just the {prefix:?} URL prefix",
        prefix = WEBHOOK_URL_OFFICECOM_PREFIX
    )]
    Incomplete(String),

    #[error(
        "webhook URL does not contain expected prefix; got {0:?}, expected one of {a:?} or {b:?}",
        a = WEBHOOK_URL_OFFICECOM_PREFIX,
        b = WEBHOOK_URL_OFFICE365_PREFIX
    )]
    InvalidPrefix(String),

    #[error(
        "webhook URL does not match expected pattern; got {0:?}, expected webhook URL in one of these formats: {a:?}, {b:?}",
        a = format!("{WEBHOOK_URL_OFFICECOM_PREFIX}/{WEBHOOK_URL_OFFICIAL_DOCS_SAMPLE_URI}"),
        b = format!("{WEBHOOK_URL_OFFICE365_PREFIX}/{WEBHOOK_URL_OFFICIAL_DOCS_SAMPLE_URI}")
    )]
    PatternMismatch(String),
}

/// Errors raised by the code formatting helpers.
#[derive(Debug, Error)]
pub enum FormatError {
    #[error("received empty string, refusing to format")]
    Empty,

    #[error("failed to format as JSON: {0}")]
    Json(#[from] serde_json::Error),
}

/// Top-level error for building, preparing and delivering messages.
#[derive(Debug, Error)]
pub enum Error {
    /// Card failed validation
    #[error(transparent)]
    Card(#[from] CardError),

    /// Webhook URL failed validation
    #[error("webhook URL validation failed: {0}")]
    Webhook(#[from] WebhookError),

    /// HTTP transport failure
    #[error("HTTP request failed: {0}")]
    Http(#[from] reqwest::Error),

    /// Serialization error
    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    /// The endpoint answered with a status of 299 or above
    #[error("error on notification: {status}, {body:?}")]
    Status { status: StatusCode, body: String },

    /// The send context was cancelled or expired during an attempt
    #[error(transparent)]
    Context(#[from] ContextError),

    /// `prepare` was not called before delivery
    #[error("message payload has not been prepared")]
    NotPrepared,

    /// The retry loop observed an expired context before an attempt
    #[error(
        "context cancelled or expired: {reason}; aborting message submission after {completed} of {attempts} attempts{}",
        last_error_suffix(.last)
    )]
    Aborted {
        reason: ContextError,
        completed: u32,
        attempts: u32,
        last: Option<Box<Error>>,
    },

    /// Every attempt failed
    #[error("message submission failed after {attempts} attempt(s): {source}")]
    RetriesExhausted { attempts: u32, source: Box<Error> },
}

#[allow(clippy::ref_option)]
fn last_error_suffix(last: &Option<Box<Error>>) -> String {
    last.as_ref().map(|err| format!(": {err}")).unwrap_or_default()
}

impl Error {
    /// Whether a context cancellation or deadline ended the send.
    #[must_use]
    pub fn is_context_error(&self) -> bool {
        match self {
            Self::Context(_) | Self::Aborted { .. } => true,
            Self::RetriesExhausted { source, .. } => source.is_context_error(),
            _ => false,
        }
    }

    /// HTTP status of the final failed attempt, if the endpoint answered.
    #[must_use]
    pub fn status(&self) -> Option<StatusCode> {
        match self {
            Self::Status { status, .. } => Some(*status),
            Self::RetriesExhausted { source, .. } => source.status(),
            Self::Aborted { last, .. } => last.as_ref().and_then(|err| err.status()),
            _ => None,
        }
    }

    /// The card validation error, if that is what stopped the send.
    #[must_use]
    pub fn card_error(&self) -> Option<&CardError> {
        match self {
            Self::Card(err) => Some(err),
            _ => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_card_error_kind_and_detail() {
        let err = CardError::MissingValue("required field Text is empty".to_string());
        assert_eq!(err.kind(), CardErrorKind::MissingValue);
        assert_eq!(err.detail(), "required field Text is empty");
        assert_eq!(
            err.to_string(),
            "missing expected value: required field Text is empty"
        );
    }

    #[test]
    fn test_invalid_prefix_lists_both_prefixes() {
        let msg = WebhookError::InvalidPrefix("https://example.com/hook".to_string()).to_string();
        assert!(msg.contains("https://outlook.office.com"));
        assert!(msg.contains("https://outlook.office365.com"));
    }

    #[test]
    fn test_status_error_embeds_body_verbatim() {
        let err = Error::Status {
            status: StatusCode::BAD_REQUEST,
            body: "Summary or Text is required.".to_string(),
        };
        assert_eq!(
            err.to_string(),
            "error on notification: 400 Bad Request, \"Summary or Text is required.\""
        );
        assert_eq!(err.status(), Some(StatusCode::BAD_REQUEST));
    }

    #[test]
    fn test_aborted_includes_last_error() {
        let err = Error::Aborted {
            reason: ContextError::DeadlineExceeded,
            completed: 2,
            attempts: 3,
            last: Some(Box::new(Error::Status {
                status: StatusCode::INTERNAL_SERVER_ERROR,
                body: String::new(),
            })),
        };
        let msg = err.to_string();
        assert!(msg.starts_with("context cancelled or expired: context deadline exceeded"));
        assert!(msg.contains("after 2 of 3 attempts: error on notification: 500"));
        assert!(err.is_context_error());
        assert_eq!(err.status(), Some(StatusCode::INTERNAL_SERVER_ERROR));
    }

    #[test]
    fn test_exhausted_reports_context_source() {
        let err = Error::RetriesExhausted {
            attempts: 1,
            source: Box::new(Error::Context(ContextError::Canceled)),
        };
        assert!(err.is_context_error());
        assert_eq!(err.status(), None);
    }
}
