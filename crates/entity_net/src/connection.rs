//! NATS connection management.
//!
//! A thin wrapper around `async-nats` with the helpers the server needs:
//! delivering queued client messages and answering host commands.

use tracing::info;

use crate::error::NetError;
use crate::outbox::Envelope;

/// Default NATS server URL.
pub const DEFAULT_NATS_URL: &str = "nats://localhost:4222";

/// The environment variable used to override the NATS URL.
pub const NATS_URL_ENV: &str = "NATS_URL";

/// A wrapper around an `async-nats` client.
#[derive(Debug, Clone)]
pub struct NatsConnection {
    client: async_nats::Client,
}

impl NatsConnection {
    /// Connect to NATS at the specified URL.
    ///
    /// # Errors
    ///
    /// Returns [`NetError::Connect`] if the connection cannot be established.
    pub async fn connect_to(url: &str) -> Result<Self, NetError> {
        info!(url, "connecting to NATS");
        let client = async_nats::connect(url).await?;
        info!("NATS connection established");
        Ok(Self { client })
    }

    /// Publish a MessagePack-encoded message to a subject.
    ///
    /// # Errors
    ///
    /// Returns [`NetError`] if encoding or publishing fails.
    pub async fn publish<T: serde::Serialize>(
        &self,
        subject: &str,
        message: &T,
    ) -> Result<(), NetError> {
        let payload = crate::codec::encode(message)?;
        self.client
            .publish(subject.to_string(), payload.into())
            .await?;
        Ok(())
    }

    /// Deliver one queued client message to its player's subject.
    ///
    /// # Errors
    ///
    /// Returns [`NetError`] if encoding or publishing fails.
    pub async fn deliver(&self, envelope: &Envelope) -> Result<(), NetError> {
        self.publish(&crate::subjects::client(envelope.player), &envelope.message)
            .await
    }

    /// Subscribe to a subject through a queue group.
    ///
    /// # Errors
    ///
    /// Returns [`NetError::Subscribe`] if the subscription fails.
    pub async fn queue_subscribe(
        &self,
        subject: &str,
        queue_group: &str,
    ) -> Result<async_nats::Subscriber, NetError> {
        let sub = self
            .client
            .queue_subscribe(subject.to_string(), queue_group.to_string())
            .await?;
        Ok(sub)
    }
}
