//! Bounded retry around a single delivery.
//!
//! Attempts run one after another with a constant delay between them. The
//! context is checked before every attempt, so a cancellation or deadline
//! is never masked by the previous attempt's error. The delay itself is not
//! interrupted; cancellation is observed at the next attempt boundary.

use std::time::Duration;

use bytes::Bytes;

use crate::client::Deliver;
use crate::context::SendContext;
use crate::error::Error;
use crate::observer::{DeliveryEvent, DeliveryObserver};

/// Default number of retries after the first attempt.
pub const DEFAULT_RETRIES: u32 = 2;

/// Default delay between attempts.
pub const DEFAULT_RETRIES_DELAY: Duration = Duration::from_secs(2);

/// How many times to retry and how long to wait in between.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RetryPolicy {
    /// Attempts after the first one.
    pub retries: u32,

    /// Constant pause between attempts.
    pub delay: Duration,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            retries: DEFAULT_RETRIES,
            delay: DEFAULT_RETRIES_DELAY,
        }
    }
}

impl RetryPolicy {
    #[must_use]
    pub const fn new(retries: u32, delay: Duration) -> Self {
        Self { retries, delay }
    }

    /// A policy with the delay given in whole seconds.
    #[must_use]
    pub const fn from_secs(retries: u32, delay_secs: u64) -> Self {
        Self::new(retries, Duration::from_secs(delay_secs))
    }

    /// A single attempt.
    #[must_use]
    pub const fn no_retry() -> Self {
        Self::new(0, Duration::ZERO)
    }

    /// Total attempts: the first one plus every retry.
    #[must_use]
    pub const fn attempts(&self) -> u32 {
        self.retries.saturating_add(1)
    }

    /// Worst-case time for a whole submission when each attempt may take up
    /// to `per_attempt`.
    #[must_use]
    pub fn submission_timeout(&self, per_attempt: Duration) -> Duration {
        per_attempt
            .saturating_add(self.delay)
            .saturating_mul(self.attempts())
    }
}

/// Deliver `payload` up to `policy.attempts()` times.
///
/// # Errors
///
/// - [`Error::Aborted`] if the context ended before an attempt, carrying the
///   last delivery error when there was one.
/// - [`Error::RetriesExhausted`] wrapping the final delivery error once all
///   attempts failed.
pub async fn send_with_retry<D>(
    deliverer: &D,
    ctx: &SendContext,
    webhook_url: &str,
    payload: Bytes,
    policy: RetryPolicy,
    observer: &dyn DeliveryObserver,
) -> Result<(), Error>
where
    D: Deliver + ?Sized,
{
    let attempts = policy.attempts();
    let mut last: Option<Error> = None;

    for attempt in 1..=attempts {
        if let Some(reason) = ctx.err() {
            let completed = attempt - 1;
            observer.on_event(&DeliveryEvent::Aborted {
                reason,
                completed,
                attempts,
            });
            return Err(Error::Aborted {
                reason,
                completed,
                attempts,
                last: last.map(Box::new),
            });
        }

        observer.on_event(&DeliveryEvent::AttemptStarted { attempt, attempts });

        // Clones share one buffer.
        match deliverer.deliver(ctx, webhook_url, payload.clone()).await {
            Ok(()) => {
                observer.on_event(&DeliveryEvent::Succeeded { attempt, attempts });
                return Ok(());
            }
            Err(err) => {
                observer.on_event(&DeliveryEvent::AttemptFailed {
                    attempt,
                    attempts,
                    error: &err,
                });
                last = Some(err);
            }
        }

        if attempt < attempts && ctx.err().is_none() {
            observer.on_event(&DeliveryEvent::RetryScheduled {
                next_attempt: attempt + 1,
                delay: policy.delay,
            });
            tokio::time::sleep(policy.delay).await;
        }
    }

    // attempts is at least one, so a failure was recorded
    let Some(source) = last else {
        return Ok(());
    };
    observer.on_event(&DeliveryEvent::Exhausted { attempts });
    Err(Error::RetriesExhausted {
        attempts,
        source: Box::new(source),
    })
}
