//! NATS `JetStream` transport for order messages.
//!
//! Orders arrive on a subject bound to a `JetStream` stream. The service
//! reads them through a durable pull consumer, so delivery resumes from the
//! last acknowledged message after a restart (at-least-once).

use std::future::Future;

use async_nats::jetstream::{self, consumer::pull, stream};
use futures_util::{Stream, StreamExt};
use thiserror::Error;
use tokio::sync::watch;
use tracing::{debug, info, warn};

use crate::config::NatsConfig;
use crate::db::OrderStore;

use super::pipeline::{Outcome, Pipeline};

/// Durable message stream returned by [`OrderBus::subscribe`].
pub type OrderMessages = pull::Stream;

/// Errors talking to the message bus.
#[derive(Debug, Error)]
pub enum BusError {
    #[error("failed to connect to NATS: {0}")]
    Connect(#[from] async_nats::ConnectError),

    #[error("failed to set up stream {stream}: {source}")]
    Stream {
        stream: String,
        #[source]
        source: async_nats::Error,
    },

    #[error("failed to subscribe durable consumer {durable}: {source}")]
    Subscribe {
        durable: String,
        #[source]
        source: async_nats::Error,
    },

    #[error("failed to publish to {subject}: {source}")]
    Publish {
        subject: String,
        #[source]
        source: async_nats::Error,
    },
}

/// Error returned when acknowledging a message.
pub type AckError = async_nats::Error;

/// A delivered message that must be acknowledged once handled.
pub trait BusMessage: Send {
    fn payload(&self) -> &[u8];

    fn ack(&self) -> impl Future<Output = Result<(), AckError>> + Send;
}

impl BusMessage for jetstream::Message {
    fn payload(&self) -> &[u8] {
        &self.message.payload
    }

    async fn ack(&self) -> Result<(), AckError> {
        Self::ack(self).await
    }
}

/// Connection to the orders stream.
pub struct OrderBus {
    client: async_nats::Client,
    jetstream: jetstream::Context,
    config: NatsConfig,
}

impl OrderBus {
    /// Connect to the NATS server.
    ///
    /// # Errors
    ///
    /// Returns `BusError::Connect` if the server is unreachable.
    pub async fn connect(config: &NatsConfig) -> Result<Self, BusError> {
        let client = async_nats::ConnectOptions::new()
            .name(&config.client_id)
            .connect(config.url.as_str())
            .await?;
        let jetstream = jetstream::new(client.clone());

        info!(url = %config.url, client_id = %config.client_id, "Connected to NATS");
        Ok(Self {
            client,
            jetstream,
            config: config.clone(),
        })
    }

    /// Ensure the orders stream exists.
    async fn ensure_stream(&self) -> Result<stream::Stream, BusError> {
        self.jetstream
            .get_or_create_stream(stream::Config {
                name: self.config.stream.clone(),
                subjects: vec![self.config.subject.clone()],
                ..Default::default()
            })
            .await
            .map_err(|e| BusError::Stream {
                stream: self.config.stream.clone(),
                source: Box::new(e),
            })
    }

    /// Open the durable consumer and start pulling messages.
    ///
    /// # Errors
    ///
    /// Returns `BusError` if the stream or consumer cannot be set up.
    pub async fn subscribe(&self) -> Result<OrderMessages, BusError> {
        let durable = &self.config.durable;
        let subscribe_err = |e: async_nats::Error| BusError::Subscribe {
            durable: durable.clone(),
            source: e,
        };

        let consumer = self
            .ensure_stream()
            .await?
            .get_or_create_consumer(
                durable,
                pull::Config {
                    durable_name: Some(durable.clone()),
                    filter_subject: self.config.subject.clone(),
                    ..Default::default()
                },
            )
            .await
            .map_err(|e| subscribe_err(Box::new(e)))?;

        let messages = consumer
            .messages()
            .await
            .map_err(|e| subscribe_err(Box::new(e)))?;

        info!(
            subject = %self.config.subject,
            durable = %durable,
            "Subscribed to order messages"
        );
        Ok(messages)
    }

    /// Publish one order payload and wait for the stream to acknowledge it.
    ///
    /// # Errors
    ///
    /// Returns `BusError` if the stream cannot be set up or the publish is
    /// not acknowledged.
    pub async fn publish(&self, payload: Vec<u8>) -> Result<(), BusError> {
        self.ensure_stream().await?;

        let subject = self.config.subject.clone();
        let publish_err = |e: async_nats::Error| BusError::Publish {
            subject: subject.clone(),
            source: e,
        };

        let ack = self
            .jetstream
            .publish(subject.clone(), payload.into())
            .await
            .map_err(|e| publish_err(Box::new(e)))?
            .await
            .map_err(|e| publish_err(Box::new(e)))?;

        debug!(subject = %subject, sequence = ack.sequence, "Order published");
        Ok(())
    }

    /// Flush pending writes and close the connection.
    pub async fn close(self) {
        if let Err(e) = self.client.flush().await {
            warn!(error = %e, "Failed to flush NATS connection");
        }
        info!("NATS connection closed");
    }
}

/// Counts of terminal outcomes seen by [`run_consumer`].
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ConsumerStats {
    pub cached: u64,
    pub rejected: u64,
    pub failed: u64,
}

/// Drive the pipeline from a message stream until shutdown.
///
/// Messages are handled one at a time: each runs the full
/// validate → persist → cache pass and is then acknowledged, whatever the
/// outcome. Failed messages are not redelivered by this loop.
///
/// Returns when `shutdown` flips to `true` (or its sender is dropped) or
/// the stream ends.
pub async fn run_consumer<M, E, St, S>(
    mut messages: M,
    pipeline: &Pipeline<S>,
    mut shutdown: watch::Receiver<bool>,
) -> ConsumerStats
where
    M: Stream<Item = Result<St, E>> + Unpin,
    E: std::fmt::Display,
    St: BusMessage,
    S: OrderStore,
{
    let mut stats = ConsumerStats::default();

    loop {
        if *shutdown.borrow() {
            break;
        }

        let next = tokio::select! {
            changed = shutdown.changed() => {
                if changed.is_err() {
                    break;
                }
                continue;
            }
            next = messages.next() => next,
        };

        let message = match next {
            Some(Ok(message)) => message,
            Some(Err(e)) => {
                warn!(error = %e, "Failed to receive order message");
                continue;
            }
            None => {
                info!("Order message stream ended");
                break;
            }
        };

        match pipeline.process(message.payload()).await {
            Outcome::Cached(_) => stats.cached += 1,
            Outcome::Rejected => stats.rejected += 1,
            Outcome::PersistFailed => stats.failed += 1,
        }

        if let Err(e) = message.ack().await {
            warn!(error = %e, "Failed to acknowledge order message");
        }
    }

    info!(
        cached = stats.cached,
        rejected = stats.rejected,
        failed = stats.failed,
        "Order consumer stopped"
    );
    stats
}
