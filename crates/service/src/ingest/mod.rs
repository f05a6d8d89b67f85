//! Order ingestion from the message bus.
//!
//! - [`pipeline`] - the per-message validate → persist → cache state machine
//! - [`bus`] - NATS `JetStream` connection, durable subscription, and the
//!   sequential consumer loop

pub mod bus;
pub mod pipeline;

pub use bus::{
    AckError, BusError, BusMessage, ConsumerStats, OrderBus, OrderMessages, run_consumer,
};
pub use pipeline::{IngestError, Outcome, Pipeline};
