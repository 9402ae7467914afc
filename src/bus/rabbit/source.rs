use async_trait::async_trait;
use futures::StreamExt;
use lapin::options::{BasicConsumeOptions, ExchangeDeclareOptions, QueueBindOptions, QueueDeclareOptions};
use lapin::types::FieldTable;
use lapin::{Channel, Connection, Consumer, ExchangeKind};

use crate::bus::rabbit::{RabbitConnector, RabbitFactSourceConfig};
use crate::relay::{FactMessage, FactSource, FactSubscription, RelayError};

/// [`FactSource`] reading incoming facts from RabbitMQ.
///
/// Each fact channel is a durable fanout exchange. A single queue is bound to all of them and
/// consumed with automatic acknowledgement, so delivery is at most once. The channel a message
/// arrived on is the exchange it was published to.
pub struct RabbitFactSource {
    connector: RabbitConnector,
    queue: String,
    channels: Vec<String>,
    queue_options: QueueDeclareOptions,
    consumer_tag: String,
}

impl RabbitFactSource {
    pub fn new(config: RabbitFactSourceConfig<'_>) -> Self {
        Self {
            connector: RabbitConnector::new(config.url, config.connection_properties),
            queue: config.queue.to_string(),
            channels: config.channels,
            queue_options: config.queue_options,
            consumer_tag: config.consumer_tag,
        }
    }
}

#[async_trait]
impl FactSource for RabbitFactSource {
    type Subscription = RabbitSubscription;

    async fn subscribe(&self) -> Result<Self::Subscription, RelayError> {
        let connection: Connection = self.connector.open().await?;
        let channel = connection.create_channel().await?;

        let _ = channel
            .queue_declare(&self.queue, self.queue_options, FieldTable::default())
            .await?;

        let exchange_options = ExchangeDeclareOptions {
            durable: true,
            ..ExchangeDeclareOptions::default()
        };
        for exchange in &self.channels {
            channel
                .exchange_declare(exchange, ExchangeKind::Fanout, exchange_options, FieldTable::default())
                .await?;
            channel
                .queue_bind(&self.queue, exchange, "", QueueBindOptions::default(), FieldTable::default())
                .await?;
        }

        let consumer = channel
            .basic_consume(
                &self.queue,
                &self.consumer_tag,
                BasicConsumeOptions {
                    no_ack: true,
                    ..BasicConsumeOptions::default()
                },
                FieldTable::default(),
            )
            .await?;

        tracing::info!(queue = %self.queue, channels = ?self.channels, "subscribed to fact channels");

        Ok(RabbitSubscription {
            connection,
            channel,
            consumer,
        })
    }
}

pub struct RabbitSubscription {
    connection: Connection,
    channel: Channel,
    consumer: Consumer,
}

#[async_trait]
impl FactSubscription for RabbitSubscription {
    async fn next(&mut self) -> Option<FactMessage> {
        match self.consumer.next().await? {
            Ok(delivery) => Some(FactMessage::new(delivery.exchange.as_str(), delivery.data)),
            Err(error) => {
                tracing::error!(%error, "rabbit consumer failed");
                None
            }
        }
    }

    async fn close(&mut self) {
        if let Err(error) = self.channel.close(200, "relay stopped").await {
            tracing::warn!(%error, "failed to close rabbit channel");
        }
        if let Err(error) = self.connection.close(200, "relay stopped").await {
            tracing::warn!(%error, "failed to close rabbit connection");
        }
    }
}
