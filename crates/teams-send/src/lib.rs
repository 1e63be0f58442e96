//! Send a message to a Microsoft Teams channel from the command line.
//!
//! # Usage
//!
//! ```text
//! teams-send --url "$TEAMS_WEBHOOK_URL" --title "Build Failed" --message "job #42" \
//!     --target-url "https://ci.example.com/42, Build log"
//! ```
//!
//! # Configuration
//!
//! Every setting is a flag, see [`Config`]. The webhook URL may also be
//! given through `TEAMS_WEBHOOK_URL`, and `RUST_LOG` overrides the log
//! level picked from `--silent` and `--verbose`.
//!
//! # Architecture
//!
//! - [`config`] parses and validates flags.
//! - [`app`] builds a `MessageCard` or Adaptive Card from them and submits
//!   it through `teams_notify`.
//! - [`branding`] produces the "Message delivered by" trailer.

#![warn(clippy::pedantic)]
#![allow(clippy::module_name_repetitions)]

pub mod app;
pub mod branding;
pub mod config;

pub use app::{build_message, client_for, submit, OutgoingMessage};
pub use config::{CardFormat, Config, ConfigError, TargetUrl, UserMention};
