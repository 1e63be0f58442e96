//! The "Message delivered by" trailer appended to outgoing messages.

use chrono::{DateTime, SecondsFormat, Utc};

pub const APP_NAME: &str = env!("CARGO_PKG_NAME");
pub const APP_VERSION: &str = env!("CARGO_PKG_VERSION");
pub const APP_URL: &str = env!("CARGO_PKG_REPOSITORY");

/// Trailer stamped with the current time.
#[must_use]
pub fn message_trailer(sender: &str) -> String {
    message_trailer_at(sender, Utc::now())
}

/// Trailer stamped with `at`. The sender clause is left out when `sender`
/// is empty.
#[must_use]
pub fn message_trailer_at(sender: &str, at: DateTime<Utc>) -> String {
    let mut trailer = format!(
        "Message delivered by [{APP_NAME}]({APP_URL}) ({APP_VERSION}) at {}",
        at.to_rfc3339_opts(SecondsFormat::Secs, true)
    );
    if !sender.is_empty() {
        trailer.push_str(" on behalf of ");
        trailer.push_str(sender);
    }
    trailer
}

#[cfg(test)]
mod tests {
    use chrono::TimeZone;

    use super::*;

    fn fixed() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2024, 3, 1, 12, 30, 0).unwrap()
    }

    #[test]
    fn test_trailer_without_sender() {
        let trailer = message_trailer_at("", fixed());
        assert_eq!(
            trailer,
            format!(
                "Message delivered by [teams-send]({APP_URL}) ({APP_VERSION}) at 2024-03-01T12:30:00Z"
            )
        );
    }

    #[test]
    fn test_trailer_with_sender() {
        let trailer = message_trailer_at("nightly-ci", fixed());
        assert!(trailer.ends_with("at 2024-03-01T12:30:00Z on behalf of nightly-ci"));
    }
}
