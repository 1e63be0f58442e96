//! HTTP delivery to Teams incoming webhooks.

use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use bytes::Bytes;
use reqwest::header::CONTENT_TYPE;
use reqwest::StatusCode;
use tracing::debug;

use crate::context::SendContext;
use crate::error::Error;
use crate::observer::{DeliveryEvent, DeliveryObserver, NoopObserver};
use crate::payload::TeamsMessage;
use crate::retry::{self, RetryPolicy};
use crate::webhook::{validate_webhook_with, WebhookValidation};

/// Per-request timeout used when none is configured.
pub const DEFAULT_WEBHOOK_SEND_TIMEOUT: Duration = Duration::from_secs(5);

/// `Content-Type` of every webhook POST.
pub const WEBHOOK_CONTENT_TYPE: &str = "application/json;charset=utf-8";

/// `User-Agent` used when none is configured.
pub const DEFAULT_USER_AGENT: &str = concat!("teams-notify/", env!("CARGO_PKG_VERSION"));

/// One delivery of prepared JSON to a webhook.
///
/// The retry loop only depends on this trait, so it works with any
/// transport.
#[async_trait]
pub trait Deliver: Send + Sync {
    /// Name used in diagnostics.
    fn name(&self) -> &'static str;

    /// POST `payload` to `webhook_url` once.
    ///
    /// # Errors
    ///
    /// Returns a transport, status or context error.
    async fn deliver(&self, ctx: &SendContext, webhook_url: &str, payload: Bytes)
        -> Result<(), Error>;
}

/// Builder for [`Client`].
pub struct ClientBuilder {
    timeout: Duration,
    user_agent: String,
    webhook_validation: WebhookValidation,
    observer: Arc<dyn DeliveryObserver>,
    http: Option<reqwest::Client>,
}

impl Default for ClientBuilder {
    fn default() -> Self {
        Self::new()
    }
}

impl ClientBuilder {
    #[must_use]
    pub fn new() -> Self {
        Self {
            timeout: DEFAULT_WEBHOOK_SEND_TIMEOUT,
            user_agent: DEFAULT_USER_AGENT.to_string(),
            webhook_validation: WebhookValidation::default(),
            observer: Arc::new(NoopObserver),
            http: None,
        }
    }

    /// Per-request timeout. Ignored when a pre-built HTTP client is given.
    #[must_use]
    pub const fn timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    /// `User-Agent` header. Ignored when a pre-built HTTP client is given.
    #[must_use]
    pub fn user_agent(mut self, user_agent: impl Into<String>) -> Self {
        self.user_agent = user_agent.into();
        self
    }

    #[must_use]
    pub const fn webhook_validation(mut self, mode: WebhookValidation) -> Self {
        self.webhook_validation = mode;
        self
    }

    #[must_use]
    pub fn observer(mut self, observer: Arc<dyn DeliveryObserver>) -> Self {
        self.observer = observer;
        self
    }

    /// Use an existing HTTP client and its connection pool.
    #[must_use]
    pub fn http_client(mut self, http: reqwest::Client) -> Self {
        self.http = Some(http);
        self
    }

    /// Build the client.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Http`] if the TLS backend cannot be initialised.
    pub fn build(self) -> Result<Client, Error> {
        let http = match self.http {
            Some(http) => http,
            None => reqwest::Client::builder()
                .timeout(self.timeout)
                .user_agent(self.user_agent)
                .build()?,
        };

        Ok(Client {
            http,
            webhook_validation: self.webhook_validation,
            observer: self.observer,
        })
    }
}

/// Sends Teams messages to incoming webhooks.
#[derive(Clone)]
pub struct Client {
    http: reqwest::Client,
    webhook_validation: WebhookValidation,
    observer: Arc<dyn DeliveryObserver>,
}

impl std::fmt::Debug for Client {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Client")
            .field("webhook_validation", &self.webhook_validation)
            .finish_non_exhaustive()
    }
}

impl Client {
    /// A client with default settings.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Http`] if the TLS backend cannot be initialised.
    pub fn new() -> Result<Self, Error> {
        ClientBuilder::new().build()
    }

    #[must_use]
    pub fn builder() -> ClientBuilder {
        ClientBuilder::new()
    }

    /// Check `webhook_url` using this client's validation mode.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Webhook`] if the URL is rejected.
    pub fn validate_webhook(&self, webhook_url: &str) -> Result<(), Error> {
        validate_webhook_with(webhook_url, self.webhook_validation)?;
        Ok(())
    }

    /// Validate, prepare and deliver `message` once.
    ///
    /// # Errors
    ///
    /// Returns a webhook or card validation error before any request is
    /// made, otherwise the delivery error.
    pub async fn send<M>(
        &self,
        ctx: &SendContext,
        webhook_url: &str,
        message: &mut M,
    ) -> Result<(), Error>
    where
        M: TeamsMessage + Send,
    {
        let payload = self.prepare(webhook_url, message)?;
        self.deliver(ctx, webhook_url, payload).await
    }

    /// Validate and prepare `message`, then deliver it under `policy`.
    ///
    /// # Errors
    ///
    /// Returns a validation error before any request is made, otherwise see
    /// [`retry::send_with_retry`].
    pub async fn send_with_retry<M>(
        &self,
        ctx: &SendContext,
        webhook_url: &str,
        message: &mut M,
        policy: RetryPolicy,
    ) -> Result<(), Error>
    where
        M: TeamsMessage + Send,
    {
        let payload = self.prepare(webhook_url, message)?;
        retry::send_with_retry(
            self,
            ctx,
            webhook_url,
            payload,
            policy,
            self.observer.as_ref(),
        )
        .await
    }

    fn prepare<M: TeamsMessage>(&self, webhook_url: &str, message: &mut M) -> Result<Bytes, Error> {
        self.validate_webhook(webhook_url)?;
        message.validate()?;
        message.prepare()?;

        debug!(
            format = message.format().as_str(),
            payload = %message.pretty_print(),
            "Prepared payload for Microsoft Teams"
        );
        message.payload_bytes()
    }
}

#[async_trait]
impl Deliver for Client {
    fn name(&self) -> &'static str {
        "teams"
    }

    async fn deliver(
        &self,
        ctx: &SendContext,
        webhook_url: &str,
        payload: Bytes,
    ) -> Result<(), Error> {
        if let Some(reason) = ctx.err() {
            return Err(reason.into());
        }

        let request = self
            .http
            .post(webhook_url)
            .header(CONTENT_TYPE, WEBHOOK_CONTENT_TYPE)
            .body(payload);

        // Dropping the in-flight future closes the connection.
        let response = tokio::select! {
            biased;
            reason = ctx.done() => return Err(reason.into()),
            response = request.send() => response?,
        };

        let status = response.status();
        let body = tokio::select! {
            biased;
            reason = ctx.done() => return Err(reason.into()),
            body = response.text() => response_body(status, body)?,
        };

        if is_failure_status(status) {
            self.observer.on_event(&DeliveryEvent::Response {
                status,
                body: &body,
            });
            return Err(Error::Status { status, body });
        }

        debug!(channel = self.name(), status = %status, response = %body, "Message delivered");
        Ok(())
    }
}

fn is_failure_status(status: StatusCode) -> bool {
    status.as_u16() >= 299
}

/// The response text. On a failure status an unreadable body becomes empty
/// so the status is still reported.
fn response_body(status: StatusCode, body: reqwest::Result<String>) -> Result<String, Error> {
    match body {
        Ok(body) => Ok(body),
        Err(err) if is_failure_status(status) => {
            debug!(status = %status, error = %err, "Failed to read error response body");
            Ok(String::new())
        }
        Err(err) => Err(err.into()),
    }
}
