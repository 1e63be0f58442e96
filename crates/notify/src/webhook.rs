//! Teams incoming-webhook URL validation.

use std::sync::LazyLock;

use regex::Regex;
use tracing::warn;

use crate::error::WebhookError;

/// Known prefix for webhook URLs on the `office.com` domain.
pub const WEBHOOK_URL_OFFICECOM_PREFIX: &str = "https://outlook.office.com";

/// Known prefix for webhook URLs on the `office365.com` domain.
pub const WEBHOOK_URL_OFFICE365_PREFIX: &str = "https://outlook.office365.com";

/// Path portion of the sample webhook URL from the connector documentation.
pub const WEBHOOK_URL_OFFICIAL_DOCS_SAMPLE_URI: &str = "webhook/a1269812-6d10-44b1-abc5-b84f93580ba0@9e7b80c7-d1eb-4b52-8582-76f921e416d9/IncomingWebhook/3fdd6767bae44ac58e5995547d66a4e4/f332c8d9-3397-4ac5-957b-b8e3fc465a8c";

static WEBHOOK_URL_REGEX: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(
        r"^https://outlook\.office(?:365)?\.com/webhook/[-a-zA-Z0-9]{32,36}@[-a-zA-Z0-9]{36}/IncomingWebhook/[-a-zA-Z0-9]{32}/[-a-zA-Z0-9]{36}$",
    )
    .unwrap()
});

/// How strictly webhook URLs are checked before delivery.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum WebhookValidation {
    /// Length, prefix and full path shape must all match.
    #[default]
    Strict,
    /// Length and prefix must match; a path shape mismatch is only logged.
    Lenient,
    /// No checks.
    Skip,
}

/// Validate `webhook_url` using [`WebhookValidation::Strict`].
///
/// # Errors
///
/// Returns the first failed check: length, then prefix, then path shape.
pub fn validate_webhook(webhook_url: &str) -> Result<(), WebhookError> {
    validate_webhook_with(webhook_url, WebhookValidation::Strict)
}

/// Validate `webhook_url` using the given mode.
///
/// # Errors
///
/// Returns the first failed check that the mode treats as fatal.
pub fn validate_webhook_with(
    webhook_url: &str,
    mode: WebhookValidation,
) -> Result<(), WebhookError> {
    if mode == WebhookValidation::Skip {
        return Ok(());
    }

    // office.com is the shorter of the two prefixes
    if webhook_url.len() <= WEBHOOK_URL_OFFICECOM_PREFIX.len() {
        return Err(WebhookError::Incomplete(webhook_url.to_string()));
    }

    if !webhook_url.starts_with(WEBHOOK_URL_OFFICECOM_PREFIX)
        && !webhook_url.starts_with(WEBHOOK_URL_OFFICE365_PREFIX)
    {
        return Err(WebhookError::InvalidPrefix(webhook_url.to_string()));
    }

    if !WEBHOOK_URL_REGEX.is_match(webhook_url) {
        let err = WebhookError::PatternMismatch(webhook_url.to_string());
        if mode == WebhookValidation::Strict {
            return Err(err);
        }
        warn!(error = %err, "Webhook URL pattern check failed, continuing");
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample(prefix: &str) -> String {
        format!("{prefix}/{WEBHOOK_URL_OFFICIAL_DOCS_SAMPLE_URI}")
    }

    #[test]
    fn test_sample_urls_pass_strict() {
        assert_eq!(validate_webhook(&sample(WEBHOOK_URL_OFFICECOM_PREFIX)), Ok(()));
        assert_eq!(validate_webhook(&sample(WEBHOOK_URL_OFFICE365_PREFIX)), Ok(()));
    }

    #[test]
    fn test_short_url_is_incomplete() {
        for url in ["", "https://outlook.office.com", "https://x"] {
            assert!(matches!(
                validate_webhook(url),
                Err(WebhookError::Incomplete(_))
            ));
        }
    }

    #[test]
    fn test_foreign_prefix_rejected_in_every_checking_mode() {
        let url = "https://hooks.slack.com/services/T000/B000/XXXXXXXXXXXXXXXX";
        for mode in [WebhookValidation::Strict, WebhookValidation::Lenient] {
            let err = validate_webhook_with(url, mode).unwrap_err();
            assert!(matches!(err, WebhookError::InvalidPrefix(_)));
            let msg = err.to_string();
            assert!(msg.contains(WEBHOOK_URL_OFFICECOM_PREFIX));
            assert!(msg.contains(WEBHOOK_URL_OFFICE365_PREFIX));
        }
    }

    #[test]
    fn test_pattern_mismatch_is_soft_when_lenient() {
        let url = "https://outlook.office.com/webhook/not-the-right-shape";
        assert!(matches!(
            validate_webhook(url),
            Err(WebhookError::PatternMismatch(_))
        ));
        assert_eq!(validate_webhook_with(url, WebhookValidation::Lenient), Ok(()));
    }

    #[test]
    fn test_first_id_accepts_32_to_36_chars() {
        let url = "https://outlook.office365.com/webhook/3fdd6767bae44ac58e5995547d66a4e4@9e7b80c7-d1eb-4b52-8582-76f921e416d9/IncomingWebhook/3fdd6767bae44ac58e5995547d66a4e4/f332c8d9-3397-4ac5-957b-b8e3fc465a8c";
        assert_eq!(validate_webhook(url), Ok(()));

        let upper = sample(WEBHOOK_URL_OFFICECOM_PREFIX).replace("a1269812", "A1269812");
        assert_eq!(validate_webhook(&upper), Ok(()));
    }

    #[test]
    fn test_skip_accepts_anything() {
        assert_eq!(validate_webhook_with("", WebhookValidation::Skip), Ok(()));
        assert_eq!(
            validate_webhook_with("http://127.0.0.1:8080/hook", WebhookValidation::Skip),
            Ok(())
        );
    }
}
