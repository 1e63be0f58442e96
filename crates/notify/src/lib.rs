//! Microsoft Teams incoming webhook messages.
//!
//! This crate builds Teams cards in either the legacy `MessageCard` format
//! or the Adaptive Card format, validates them together with the target
//! webhook URL, serializes them to JSON and delivers them over HTTP with a
//! bounded retry budget.
//!
//! # Usage
//!
//! ```no_run
//! use std::time::Duration;
//!
//! use teams_notify::{Client, MessageCard, RetryPolicy, SendContext};
//!
//! # async fn run() -> Result<(), teams_notify::Error> {
//! let client = Client::new()?;
//! let mut card = MessageCard::with_text("Build Failed", "job #42");
//!
//! let policy = RetryPolicy::from_secs(2, 2);
//! let ctx = SendContext::with_timeout(policy.submission_timeout(Duration::from_secs(5)));
//! let webhook_url = "https://outlook.office.com/webhook/a1269812-6d10-44b1-abc5-b84f93580ba0@9e7b80c7-d1eb-4b52-8582-76f921e416d9/IncomingWebhook/3fdd6767bae44ac58e5995547d66a4e4/f332c8d9-3397-4ac5-957b-b8e3fc465a8c";
//! client
//!     .send_with_retry(&ctx, webhook_url, &mut card, policy)
//!     .await?;
//! # Ok(())
//! # }
//! ```
//!
//! # Configuration
//!
//! [`ClientBuilder`] sets the per-request timeout, user agent, webhook URL
//! validation mode ([`WebhookValidation`]) and the [`DeliveryObserver`] that
//! receives attempt progress. Nothing is read from the environment.
//!
//! # Architecture
//!
//! - [`messagecard`] and [`adaptivecard`] hold the two card models. Both
//!   implement [`TeamsMessage`]: validate, prepare, expose the payload.
//! - [`adaptivecard::validate`] walks an Adaptive Card tree once, either
//!   stopping at the first violation or collecting all of them.
//! - [`webhook`] checks webhook URLs.
//! - [`Client`] implements [`Deliver`], a single POST bound to a
//!   [`SendContext`]; [`retry::send_with_retry`] wraps any [`Deliver`] with
//!   constant-delay retries.

#![warn(clippy::pedantic)]
#![allow(clippy::module_name_repetitions)]

pub mod adaptivecard;
pub mod client;
pub mod context;
pub mod error;
pub mod format;
pub mod messagecard;
pub mod observer;
pub mod payload;
pub mod retry;
pub mod webhook;

pub use client::{Client, ClientBuilder, Deliver, DEFAULT_WEBHOOK_SEND_TIMEOUT};
pub use context::{ContextError, SendContext};
pub use error::{CardError, CardErrorKind, Error, FormatError, WebhookError};
pub use messagecard::MessageCard;
pub use observer::{DeliveryEvent, DeliveryObserver, NoopObserver, TracingObserver};
pub use payload::{read_payload, MessageFormat, TeamsMessage};
pub use retry::RetryPolicy;
pub use webhook::{validate_webhook, validate_webhook_with, WebhookValidation};
