use rdkafka::error::KafkaError;
use rdkafka::message::OwnedMessage;

/// The `KafkaEventBusError` enum defines the following error types:
///
/// - `Json`: Indicates a failure in serializing the fact payload.
/// - `Kafka`: Indicates an error creating the producer or delivering the message to the broker.
#[derive(thiserror::Error, Debug)]
pub enum KafkaEventBusError {
    #[error(transparent)]
    Json(#[from] serde_json::Error),
    #[error(transparent)]
    Kafka(#[from] KafkaError),
}

impl From<(KafkaError, OwnedMessage)> for KafkaEventBusError {
    fn from((error, _message): (KafkaError, OwnedMessage)) -> Self {
        Self::Kafka(error)
    }
}
