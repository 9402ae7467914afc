use async_trait::async_trait;
use lapin::options::BasicPublishOptions;
use lapin::publisher_confirm::Confirmation;
use lapin::types::ShortString;
use lapin::BasicProperties;
use uuid::Uuid;

pub use config::{RabbitEventBusConfig, RabbitFactSourceConfig, DEFAULT_ROUTING_KEY};
pub use connection::{RabbitChannelManager, RabbitConnector};
pub use error::RabbitEventBusError;
pub use source::{RabbitFactSource, RabbitSubscription};

use crate::bus::EventBus;
use crate::event::PostFact;

mod config;
mod connection;
mod error;
mod source;

/// [`EventBus`] publishing post facts to a RabbitMQ exchange.
///
/// Every message carries a fresh v4 message id, so downstream consumers can dedup replays.
pub struct RabbitEventBus {
    channel_pool: bb8::Pool<RabbitChannelManager>,
    exchange: String,
    publish_routing_key: String,
    publish_options: BasicPublishOptions,
    publish_properties: BasicProperties,
    error_handler: Box<dyn Fn(RabbitEventBusError) + Send + Sync>,
}

impl RabbitEventBus {
    /// Builds the connection and channel pools and declares the exchange.
    ///
    /// # Errors
    ///
    /// Will return an `Err` if the broker is unreachable or rejects the exchange declaration.
    pub async fn new(config: RabbitEventBusConfig<'_>) -> Result<Self, RabbitEventBusError> {
        let connector = RabbitConnector::new(config.url, config.connection_properties);
        let connections = bb8::Pool::builder().max_size(2).build(connector).await?;
        let channel_pool = bb8::Pool::builder()
            .max_size(10)
            .min_idle(Some(1))
            .build(RabbitChannelManager::new(connections))
            .await?;

        channel_pool
            .get()
            .await?
            .exchange_declare(
                config.exchange,
                config.exchange_kind,
                config.exchange_options,
                config.exchange_arguments,
            )
            .await?;

        Ok(Self {
            channel_pool,
            exchange: config.exchange.to_string(),
            publish_routing_key: config.publish_routing_key,
            publish_options: config.publish_options,
            publish_properties: config.publish_properties,
            error_handler: config.error_handler,
        })
    }

    async fn send(&self, fact: &PostFact) -> Result<(), RabbitEventBusError> {
        let bytes: Vec<u8> = serde_json::to_vec(fact)?;
        let properties: BasicProperties = self
            .publish_properties
            .clone()
            .with_message_id(ShortString::from(Uuid::new_v4().to_string()));

        let channel = self.channel_pool.get().await?;
        let confirmation: Confirmation = channel
            .basic_publish(
                self.exchange.as_str(),
                self.publish_routing_key.as_str(),
                self.publish_options,
                &bytes,
                properties,
            )
            .await?
            .await?;

        match confirmation {
            Confirmation::Ack(_) | Confirmation::NotRequested => Ok(()),
            Confirmation::Nack(_) => Err(RabbitEventBusError::PublishNack),
        }
    }
}

#[async_trait]
impl EventBus for RabbitEventBus {
    async fn publish(&self, fact: &PostFact) {
        if let Err(error) = self.send(fact).await {
            (self.error_handler)(error)
        }
    }
}
