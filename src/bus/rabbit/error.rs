/// The `RabbitEventBusError` enum defines the following error types:
///
/// - `Json`: Indicates a failure in serializing the fact payload.
/// - `Rabbit`: Indicates an error occurred while talking to the RabbitMQ server.
/// - `Pool`: Indicates that no pooled channel could be obtained in time.
/// - `PublishNack`: Indicates the server answered the publish with a `Nack`.
#[derive(thiserror::Error, Debug)]
pub enum RabbitEventBusError {
    #[error(transparent)]
    Json(#[from] serde_json::Error),
    #[error(transparent)]
    Rabbit(#[from] lapin::Error),
    #[error("failed to get a rabbit channel: {0}")]
    Pool(#[from] bb8::RunError<lapin::Error>),
    #[error("Received nack on publish")]
    PublishNack,
}
