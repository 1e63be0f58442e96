//! Delivery progress reporting.
//!
//! The client and retry loop never log attempt progress on their own; they
//! report to the [`DeliveryObserver`] they were built with. The default
//! [`NoopObserver`] discards everything, [`TracingObserver`] forwards to
//! `tracing`.

use std::time::Duration;

use reqwest::StatusCode;
use tracing::{debug, info, warn};

use crate::context::ContextError;
use crate::error::Error;

/// One step of a message submission.
#[derive(Debug)]
pub enum DeliveryEvent<'a> {
    /// An attempt is about to be made.
    AttemptStarted { attempt: u32, attempts: u32 },

    /// An attempt failed.
    AttemptFailed {
        attempt: u32,
        attempts: u32,
        error: &'a Error,
    },

    /// The loop will sleep before the next attempt.
    RetryScheduled { next_attempt: u32, delay: Duration },

    /// The webhook accepted the message.
    Succeeded { attempt: u32, attempts: u32 },

    /// The context ended before an attempt could be made.
    Aborted {
        reason: ContextError,
        completed: u32,
        attempts: u32,
    },

    /// Every attempt failed.
    Exhausted { attempts: u32 },

    /// The webhook answered with an error status.
    Response { status: StatusCode, body: &'a str },
}

/// Sink for [`DeliveryEvent`]s.
pub trait DeliveryObserver: Send + Sync {
    fn on_event(&self, event: &DeliveryEvent<'_>);
}

/// Discards every event.
#[derive(Debug, Clone, Copy, Default)]
pub struct NoopObserver;

impl DeliveryObserver for NoopObserver {
    fn on_event(&self, _event: &DeliveryEvent<'_>) {}
}

/// Forwards events to `tracing`.
#[derive(Debug, Clone, Copy, Default)]
pub struct TracingObserver;

impl DeliveryObserver for TracingObserver {
    fn on_event(&self, event: &DeliveryEvent<'_>) {
        match event {
            DeliveryEvent::AttemptStarted { attempt, attempts } => {
                debug!(attempt, attempts, "Submitting message");
            }
            DeliveryEvent::AttemptFailed {
                attempt,
                attempts,
                error,
            } => {
                warn!(
                    attempt,
                    attempts,
                    error = %error,
                    "Attempt {attempt} of {attempts} to send message failed"
                );
            }
            DeliveryEvent::RetryScheduled {
                next_attempt,
                delay,
            } => {
                info!(next_attempt, "Retrying in {delay:?}...");
            }
            DeliveryEvent::Succeeded { attempt, attempts } => {
                debug!(
                    attempt,
                    attempts, "Successfully sent message after {attempt} of {attempts} attempts"
                );
            }
            DeliveryEvent::Aborted {
                reason,
                completed,
                attempts,
            } => {
                warn!(
                    reason = %reason,
                    completed,
                    attempts,
                    "Aborting message submission"
                );
            }
            DeliveryEvent::Exhausted { attempts } => {
                warn!(attempts, "Message submission failed on every attempt");
            }
            DeliveryEvent::Response { status, body } => {
                warn!(
                    status = %status,
                    body = %body,
                    "Teams webhook request failed"
                );
            }
        }
    }
}
