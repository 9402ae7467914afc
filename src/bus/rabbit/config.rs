use lapin::options::{BasicPublishOptions, ExchangeDeclareOptions, QueueDeclareOptions};
use lapin::types::{FieldTable, ShortString};
use lapin::{BasicProperties, ConnectionProperties, ExchangeKind};
use typed_builder::TypedBuilder;

use crate::bus::rabbit::error::RabbitEventBusError;
use crate::relay::{COMMENT_EVENTS, PROFILE_EVENTS};

/// Routing key post facts are published with, unless configured otherwise.
pub const DEFAULT_ROUTING_KEY: &str = "post_events";

#[derive(TypedBuilder)]
pub struct RabbitEventBusConfig<'a> {
    /// The connection string for the RabbitMQ server, including the protocol, host, port, and
    /// virtual host.
    pub(crate) url: &'a str,
    /// The name of the RabbitMQ exchange post facts are published to.
    pub(crate) exchange: &'a str,
    /// Additional connection properties.
    #[builder(default)]
    pub(crate) connection_properties: ConnectionProperties,
    /// The type of the exchange. Defaults to "direct".
    #[builder(default = ExchangeKind::Direct)]
    pub(crate) exchange_kind: ExchangeKind,
    /// Additional exchange options.
    #[builder(default)]
    pub(crate) exchange_options: ExchangeDeclareOptions,
    /// Additional exchange arguments.
    #[builder(default)]
    pub(crate) exchange_arguments: FieldTable,
    /// Routing key attached to every published fact.
    #[builder(default = DEFAULT_ROUTING_KEY.to_string(), setter(into))]
    pub(crate) publish_routing_key: String,
    /// Additional publish options.
    #[builder(default)]
    pub(crate) publish_options: BasicPublishOptions,
    /// Additional publish properties. The message id is always overwritten per message.
    #[builder(default = BasicProperties::default().with_content_type(ShortString::from("application/json")))]
    pub(crate) publish_properties: BasicProperties,
    /// Invoked with every publishing failure. Defaults to a `warn` log line.
    #[builder(default = Box::new(|error| tracing::warn!(%error, "failed to publish post fact to rabbit")))]
    pub(crate) error_handler: Box<dyn Fn(RabbitEventBusError) + Send + Sync>,
}

#[derive(TypedBuilder)]
pub struct RabbitFactSourceConfig<'a> {
    /// The connection string for the RabbitMQ server.
    pub(crate) url: &'a str,
    /// Queue bound to every fact channel. Declared if missing.
    pub(crate) queue: &'a str,
    /// Fact channels to subscribe to. Each one is a fanout exchange.
    #[builder(default = vec![COMMENT_EVENTS.to_string(), PROFILE_EVENTS.to_string()])]
    pub(crate) channels: Vec<String>,
    /// Additional connection properties.
    #[builder(default)]
    pub(crate) connection_properties: ConnectionProperties,
    /// Options of the queue declaration. Defaults to a durable queue.
    #[builder(default = QueueDeclareOptions { durable: true, ..QueueDeclareOptions::default() })]
    pub(crate) queue_options: QueueDeclareOptions,
    /// Tag identifying this consumer on the broker.
    #[builder(default = "post-relay".to_string(), setter(into))]
    pub(crate) consumer_tag: String,
}
