//! Command-line configuration.
//!
//! Flags are parsed with clap, then [`Config::validate`] applies the checks
//! clap cannot express. The webhook URL may also come from
//! `TEAMS_WEBHOOK_URL`.

use std::fmt;
use std::time::Duration;

use clap::{Parser, ValueEnum};
use teams_notify::messagecard::POTENTIAL_ACTION_MAX_SUPPORTED;
use teams_notify::retry::DEFAULT_RETRIES;
use teams_notify::{
    validate_webhook_with, RetryPolicy, WebhookError, WebhookValidation,
    DEFAULT_WEBHOOK_SEND_TIMEOUT,
};
use thiserror::Error;
use url::Url;

/// Environment variable holding the webhook URL.
pub const ENV_WEBHOOK_URL: &str = "TEAMS_WEBHOOK_URL";

pub const DEFAULT_THEME_COLOR: &str = "#832561";
pub const DEFAULT_TEAM_NAME: &str = "unspecified";
pub const DEFAULT_CHANNEL_NAME: &str = "unspecified";
pub const DEFAULT_RETRIES_DELAY_SECS: u64 = 2;

/// Errors from [`Config::validate`].
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("unsupported: You cannot have both silent and verbose output")]
    SilentAndVerbose,

    #[error(
        "provided message theme color too short; got message {color:?} of length {actual}, expected length of {expected}"
    )]
    ThemeColorTooShort {
        color: String,
        actual: usize,
        expected: usize,
    },

    #[error("message title too short")]
    EmptyTitle,

    #[error("message content too short")]
    EmptyMessage,

    #[error("{count} target URLs specified, a maximum of {max} are supported")]
    TooManyTargetUrls { count: usize, max: usize },

    #[error("user mentions require --format adaptivecard")]
    MentionsRequireAdaptiveCard,

    #[error("webhook URL validation failed: {0}")]
    Webhook(#[from] WebhookError),
}

/// Errors from parsing a `"first, second"` flag value.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum FlagValueError {
    #[error("received {count} arguments for {flag} flag, expected 2")]
    ArgumentCount { flag: &'static str, count: usize },

    #[error("provided URL {url} failed to parse: {source}")]
    Url { url: String, source: url::ParseError },

    #[error("empty {field} in {flag} flag")]
    Empty {
        flag: &'static str,
        field: &'static str,
    },
}

/// Card schema used for the outgoing message.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, ValueEnum)]
pub enum CardFormat {
    /// Legacy Office 365 connector card
    #[default]
    #[value(name = "messagecard")]
    MessageCard,

    /// Adaptive Card; required for user mentions
    #[value(name = "adaptivecard")]
    AdaptiveCard,
}

impl CardFormat {
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::MessageCard => "messagecard",
            Self::AdaptiveCard => "adaptivecard",
        }
    }
}

/// A link rendered as a button on the message.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TargetUrl {
    pub url: Url,
    pub description: String,
}

impl TargetUrl {
    /// Parse `"URL, description"`.
    ///
    /// # Errors
    ///
    /// Returns [`FlagValueError`] unless there are exactly two parts and the
    /// first is an absolute URL.
    pub fn parse(value: &str) -> Result<Self, FlagValueError> {
        let [url, description] = split_pair(value, "target URL")?;
        let parsed = Url::parse(&url).map_err(|source| FlagValueError::Url { url, source })?;

        Ok(Self {
            url: parsed,
            description,
        })
    }
}

impl fmt::Display for TargetUrl {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "[URL: {}, Desc: {}]", self.url, self.description)
    }
}

/// A Teams user to mention in the message.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UserMention {
    pub name: String,

    /// Teams user ID, Azure AD object ID or UPN
    pub id: String,
}

impl UserMention {
    /// Parse `"display name, id"`.
    ///
    /// # Errors
    ///
    /// Returns [`FlagValueError`] unless there are exactly two non-empty
    /// parts.
    pub fn parse(value: &str) -> Result<Self, FlagValueError> {
        const FLAG: &str = "user mention";

        let [name, id] = split_pair(value, FLAG)?;
        if name.is_empty() {
            return Err(FlagValueError::Empty {
                flag: FLAG,
                field: "name",
            });
        }
        if id.is_empty() {
            return Err(FlagValueError::Empty {
                flag: FLAG,
                field: "id",
            });
        }

        Ok(Self { name, id })
    }
}

impl fmt::Display for UserMention {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "[Name: {}, ID: {}]", self.name, self.id)
    }
}

/// Split on commas into exactly two trimmed parts with quotes removed.
fn split_pair(value: &str, flag: &'static str) -> Result<[String; 2], FlagValueError> {
    let parts: Vec<String> = value
        .split(',')
        .map(|part| part.trim().replace(['\'', '"'], ""))
        .collect();

    <[String; 2]>::try_from(parts).map_err(|parts| FlagValueError::ArgumentCount {
        flag,
        count: parts.len(),
    })
}

#[derive(Debug, Clone, Parser)]
#[command(name = "teams-send")]
#[command(about = "Send a message to a Microsoft Teams channel through an incoming webhook")]
#[command(version)]
pub struct Config {
    /// Team containing the target channel; only used in log messages
    #[arg(long, default_value = DEFAULT_TEAM_NAME)]
    pub team: String,

    /// Target channel; only used in log messages
    #[arg(long, default_value = DEFAULT_CHANNEL_NAME)]
    pub channel: String,

    /// Webhook URL of the channel's incoming webhook connector
    #[arg(long = "url", env = ENV_WEBHOOK_URL, hide_env_values = true)]
    pub webhook_url: String,

    /// Hex color code used as the message trim color
    #[arg(long, default_value = DEFAULT_THEME_COLOR)]
    pub color: String,

    /// Message title
    #[arg(long)]
    pub title: String,

    /// Message text; Markdown is supported
    #[arg(long)]
    pub message: String,

    /// Application or person on whose behalf the message is sent
    #[arg(long, default_value = "")]
    pub sender: String,

    /// Button link as "URL, description"; repeatable
    #[arg(long = "target-url", value_parser = TargetUrl::parse)]
    pub target_urls: Vec<TargetUrl>,

    /// User to mention as "display name, id"; repeatable
    #[arg(long = "user-mention", value_parser = UserMention::parse)]
    pub user_mentions: Vec<UserMention>,

    /// Card schema of the message
    #[arg(long, value_enum, default_value_t)]
    pub format: CardFormat,

    /// Delivery attempts after the first one
    #[arg(long, default_value_t = DEFAULT_RETRIES)]
    pub retries: u32,

    /// Seconds to wait between delivery attempts
    #[arg(long, default_value_t = DEFAULT_RETRIES_DELAY_SECS)]
    pub retries_delay: u64,

    /// Show the configuration, the payload and debug logging
    #[arg(short, long)]
    pub verbose: bool,

    /// Suppress all output; the exit code still reports failure
    #[arg(long)]
    pub silent: bool,

    /// Replace Windows, Mac and Linux line endings in the message with <br>
    #[arg(long)]
    pub convert_eol: bool,

    /// Omit the "Message delivered by" trailer
    #[arg(long)]
    pub no_branding: bool,

    /// Only warn when the webhook URL does not match the documented format
    #[arg(long)]
    pub disable_webhook_url_validation: bool,
}

impl Config {
    /// Check everything clap could not.
    ///
    /// # Errors
    ///
    /// Returns the first failed check.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.silent && self.verbose {
            return Err(ConfigError::SilentAndVerbose);
        }

        if self.color.len() < DEFAULT_THEME_COLOR.len() {
            return Err(ConfigError::ThemeColorTooShort {
                color: self.color.clone(),
                actual: self.color.len(),
                expected: DEFAULT_THEME_COLOR.len(),
            });
        }

        if self.title.is_empty() {
            return Err(ConfigError::EmptyTitle);
        }

        if self.message.is_empty() {
            return Err(ConfigError::EmptyMessage);
        }

        match self.format {
            CardFormat::MessageCard => {
                if self.target_urls.len() > POTENTIAL_ACTION_MAX_SUPPORTED {
                    return Err(ConfigError::TooManyTargetUrls {
                        count: self.target_urls.len(),
                        max: POTENTIAL_ACTION_MAX_SUPPORTED,
                    });
                }
                if !self.user_mentions.is_empty() {
                    return Err(ConfigError::MentionsRequireAdaptiveCard);
                }
            }
            // Extra links are paged into action sets.
            CardFormat::AdaptiveCard => {}
        }

        validate_webhook_with(&self.webhook_url, self.webhook_validation())?;
        Ok(())
    }

    #[must_use]
    pub const fn webhook_validation(&self) -> WebhookValidation {
        if self.disable_webhook_url_validation {
            WebhookValidation::Lenient
        } else {
            WebhookValidation::Strict
        }
    }

    #[must_use]
    pub const fn retry_policy(&self) -> RetryPolicy {
        RetryPolicy::from_secs(self.retries, self.retries_delay)
    }

    /// Deadline for the whole submission: every attempt at the default send
    /// timeout plus its retry delay.
    #[must_use]
    pub fn submission_timeout(&self) -> Duration {
        self.retry_policy()
            .submission_timeout(DEFAULT_WEBHOOK_SEND_TIMEOUT)
    }

    /// Default tracing filter for the output mode.
    #[must_use]
    pub const fn log_level(&self) -> &'static str {
        if self.silent {
            "off"
        } else if self.verbose {
            "debug"
        } else {
            "warn"
        }
    }
}

impl fmt::Display for Config {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let join = |items: Vec<String>| items.join(", ");

        write!(
            f,
            "Team={:?}, Channel={:?}, WebhookURL={:?}, ThemeColor={:?}, MessageTitle={:?}, \
             MessageText={:?}, Sender={:?}, TargetURLs={:?}, UserMentions={:?}, Format={:?}, \
             Retries={}, RetriesDelay={}, AppTimeout={:?}",
            self.team,
            self.channel,
            self.webhook_url,
            self.color,
            self.title,
            self.message,
            self.sender,
            join(self.target_urls.iter().map(ToString::to_string).collect()),
            join(self.user_mentions.iter().map(ToString::to_string).collect()),
            self.format.as_str(),
            self.retries,
            self.retries_delay,
            self.submission_timeout(),
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const WEBHOOK: &str = "https://outlook.office.com/webhook/a1269812-6d10-44b1-abc5-b84f93580ba0@9e7b80c7-d1eb-4b52-8582-76f921e416d9/IncomingWebhook/3fdd6767bae44ac58e5995547d66a4e4/f332c8d9-3397-4ac5-957b-b8e3fc465a8c";

    fn parse(extra: &[&str]) -> Config {
        let mut args = vec![
            "teams-send",
            "--url",
            WEBHOOK,
            "--title",
            "Build Failed",
            "--message",
            "job #42",
        ];
        args.extend_from_slice(extra);
        Config::try_parse_from(args).unwrap()
    }

    #[test]
    fn test_defaults() {
        let config = parse(&[]);
        assert_eq!(config.team, "unspecified");
        assert_eq!(config.channel, "unspecified");
        assert_eq!(config.color, "#832561");
        assert_eq!(config.retries, 2);
        assert_eq!(config.retries_delay, 2);
        assert_eq!(config.format, CardFormat::MessageCard);
        assert_eq!(config.webhook_validation(), WebhookValidation::Strict);
        assert_eq!(config.log_level(), "warn");
        assert_eq!(config.submission_timeout(), Duration::from_secs(21));
        config.validate().unwrap();
    }

    #[test]
    fn test_target_url_parsing() {
        let target = TargetUrl::parse(" 'https://ci.example.com/logs' , \"Logs\" ").unwrap();
        assert_eq!(target.url.as_str(), "https://ci.example.com/logs");
        assert_eq!(target.description, "Logs");

        assert_eq!(
            TargetUrl::parse("https://ci.example.com").unwrap_err(),
            FlagValueError::ArgumentCount {
                flag: "target URL",
                count: 1
            }
        );
        assert_eq!(
            TargetUrl::parse("https://a.example.com, b, c")
                .unwrap_err()
                .to_string(),
            "received 3 arguments for target URL flag, expected 2"
        );
        assert!(matches!(
            TargetUrl::parse("not a url, Logs").unwrap_err(),
            FlagValueError::Url { .. }
        ));
    }

    #[test]
    fn test_user_mention_parsing() {
        let mention = UserMention::parse("Jane Doe, jane@example.com").unwrap();
        assert_eq!(mention.name, "Jane Doe");
        assert_eq!(mention.id, "jane@example.com");

        assert!(matches!(
            UserMention::parse(" , jane@example.com").unwrap_err(),
            FlagValueError::Empty { field: "name", .. }
        ));
    }

    #[test]
    fn test_repeatable_flags() {
        let config = parse(&[
            "--target-url",
            "https://ci.example.com/logs, Logs",
            "--target-url",
            "https://ci.example.com/dash, Dashboard",
        ]);
        let descriptions: Vec<&str> = config
            .target_urls
            .iter()
            .map(|target| target.description.as_str())
            .collect();
        assert_eq!(descriptions, vec!["Logs", "Dashboard"]);
    }

    #[test]
    fn test_silent_and_verbose_conflict() {
        let err = parse(&["--silent", "--verbose"]).validate().unwrap_err();
        assert_eq!(
            err.to_string(),
            "unsupported: You cannot have both silent and verbose output"
        );
    }

    #[test]
    fn test_short_color_rejected() {
        let err = parse(&["--color", "#fff"]).validate().unwrap_err();
        assert_eq!(
            err.to_string(),
            "provided message theme color too short; got message \"#fff\" of length 4, expected length of 7"
        );
    }

    #[test]
    fn test_empty_title_and_message_rejected() {
        let mut config = parse(&[]);
        config.title.clear();
        assert!(matches!(config.validate(), Err(ConfigError::EmptyTitle)));

        let mut config = parse(&[]);
        config.message.clear();
        assert!(matches!(config.validate(), Err(ConfigError::EmptyMessage)));
    }

    #[test]
    fn test_target_url_limit_applies_to_message_card() {
        let links: Vec<String> = (1..=5)
            .map(|i| format!("https://ci.example.com/{i}, Link {i}"))
            .collect();
        let mut args = Vec::new();
        for link in &links {
            args.push("--target-url");
            args.push(link.as_str());
        }

        let err = parse(&args).validate().unwrap_err();
        assert_eq!(
            err.to_string(),
            "5 target URLs specified, a maximum of 4 are supported"
        );

        args.extend(["--format", "adaptivecard"]);
        parse(&args).validate().unwrap();
    }

    #[test]
    fn test_mentions_need_adaptive_card() {
        let config = parse(&["--user-mention", "Jane Doe, jane@example.com"]);
        assert!(matches!(
            config.validate(),
            Err(ConfigError::MentionsRequireAdaptiveCard)
        ));

        let config = parse(&[
            "--user-mention",
            "Jane Doe, jane@example.com",
            "--format",
            "adaptivecard",
        ]);
        config.validate().unwrap();
    }

    #[test]
    fn test_webhook_validation_modes() {
        let shaped_wrong = "https://outlook.office.com/webhook/not-the-documented-shape";

        let mut config = parse(&[]);
        config.webhook_url = shaped_wrong.to_string();
        let err = config.validate().unwrap_err();
        assert!(err.to_string().starts_with("webhook URL validation failed: "));

        config.disable_webhook_url_validation = true;
        assert_eq!(config.webhook_validation(), WebhookValidation::Lenient);
        config.validate().unwrap();

        config.webhook_url = "https://example.com/hook/abcdefghijklmnop".to_string();
        assert!(matches!(config.validate(), Err(ConfigError::Webhook(_))));
    }

    #[test]
    fn test_huge_retries_delay_saturates_timeout() {
        let config = parse(&["--retries-delay", "18446744073709551615"]);
        config.validate().unwrap();
        assert_eq!(config.submission_timeout(), Duration::MAX);
        assert!(config.to_string().contains("RetriesDelay=18446744073709551615"));
    }

    #[test]
    fn test_log_levels() {
        assert_eq!(parse(&["--silent"]).log_level(), "off");
        assert_eq!(parse(&["-v"]).log_level(), "debug");
    }
}
