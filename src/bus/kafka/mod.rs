use std::time::Duration;

use async_trait::async_trait;
use rdkafka::message::{Header, OwnedHeaders};
use rdkafka::producer::{FutureProducer, FutureRecord};

pub use config::{KafkaEventBusConfig, SaslCredentials, DEFAULT_TOPIC};
pub use error::KafkaEventBusError;

use crate::bus::EventBus;
use crate::event::PostFact;

mod config;
mod error;

/// Header carrying [`PostFact::kind`], so consumers can filter without decoding the payload.
pub const EVENT_HEADER: &str = "event";

/// [`EventBus`] publishing post facts to a Kafka topic.
///
/// Records are keyed by post id: every fact about one post lands in the same partition, in
/// publication order.
pub struct KafkaEventBus {
    producer: FutureProducer,
    topic: String,
    delivery_timeout: Duration,
    error_handler: Box<dyn Fn(KafkaEventBusError) + Send + Sync>,
}

impl KafkaEventBus {
    /// # Errors
    ///
    /// Will return an `Err` if the producer cannot be created from the given configuration.
    pub fn new(config: KafkaEventBusConfig) -> Result<Self, KafkaEventBusError> {
        let producer: FutureProducer = config.client_config().create()?;

        Ok(Self {
            producer,
            topic: config.topic,
            delivery_timeout: Duration::from_millis(config.delivery_timeout_ms),
            error_handler: config.error_handler,
        })
    }

    pub fn topic(&self) -> &str {
        &self.topic
    }

    async fn send(&self, fact: &PostFact) -> Result<(), KafkaEventBusError> {
        let key: String = fact.post_id().to_string();
        let payload: Vec<u8> = serde_json::to_vec(fact)?;
        let headers: OwnedHeaders = OwnedHeaders::new().insert(Header {
            key: EVENT_HEADER,
            value: Some(fact.kind()),
        });

        let record = FutureRecord::to(&self.topic)
            .key(&key)
            .payload(&payload)
            .headers(headers);
        let (partition, offset) = self.producer.send(record, self.delivery_timeout).await?;
        tracing::debug!(post_id = fact.post_id(), event = fact.kind(), partition, offset, "post fact delivered");

        Ok(())
    }
}

#[async_trait]
impl EventBus for KafkaEventBus {
    async fn publish(&self, fact: &PostFact) {
        if let Err(error) = self.send(fact).await {
            (self.error_handler)(error)
        }
    }
}
