use rdkafka::ClientConfig;
use typed_builder::TypedBuilder;

use crate::bus::kafka::error::KafkaEventBusError;

pub const DEFAULT_TOPIC: &str = "post_events";

#[derive(TypedBuilder)]
pub struct KafkaEventBusConfig {
    /// Comma separated `host:port` broker list.
    #[builder(setter(into))]
    pub(crate) brokers: String,
    #[builder(default = DEFAULT_TOPIC.to_string(), setter(into))]
    pub(crate) topic: String,
    #[builder(default, setter(strip_option))]
    pub(crate) credentials: Option<SaslCredentials>,
    /// Delivery report timeout, in milliseconds.
    #[builder(default = 5000)]
    pub(crate) delivery_timeout_ms: u64,
    /// Extra client properties, applied before the ones above.
    #[builder(default, setter(strip_option))]
    pub(crate) client_config: Option<ClientConfig>,
    #[builder(default = Box::new(|error| tracing::warn!(%error, "failed to publish post fact to kafka")))]
    pub(crate) error_handler: Box<dyn Fn(KafkaEventBusError) + Send + Sync>,
}

impl KafkaEventBusConfig {
    pub(crate) fn client_config(&self) -> ClientConfig {
        let mut client_config: ClientConfig = self.client_config.clone().unwrap_or_default();
        client_config
            .set("bootstrap.servers", &self.brokers)
            .set("message.timeout.ms", self.delivery_timeout_ms.to_string());

        if let Some(credentials) = &self.credentials {
            client_config
                .set("security.protocol", "SASL_SSL")
                .set("sasl.mechanisms", &credentials.mechanism)
                .set("sasl.username", &credentials.username)
                .set("sasl.password", &credentials.password);
        }

        client_config
    }
}

/// SASL_SSL login of the producer.
#[derive(Clone)]
pub struct SaslCredentials {
    pub(crate) username: String,
    pub(crate) password: String,
    pub(crate) mechanism: String,
}

impl SaslCredentials {
    pub fn new(username: impl Into<String>, password: impl Into<String>, mechanism: impl Into<String>) -> Self {
        Self {
            username: username.into(),
            password: password.into(),
            mechanism: mechanism.into(),
        }
    }
}
