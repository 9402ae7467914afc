use std::time::Duration;

use tokio_util::sync::CancellationToken;
use tracing::Instrument;
use typed_builder::TypedBuilder;

use crate::error::StoreError;
use crate::event::IncomingFact;
use crate::relay::{FactHandler, FactMessage, FactSource, FactSubscription, RelayError};

#[derive(Clone, Debug, TypedBuilder)]
pub struct RelayConfig {
    /// Upper bound of a single handler call. A hung store delays cancellation by at most this.
    #[builder(default = Duration::from_secs(5))]
    pub handler_timeout: Duration,
}

impl Default for RelayConfig {
    fn default() -> Self {
        Self::builder().build()
    }
}

/// Long-lived loop applying incoming facts to the registered [`FactHandler`]s.
///
/// A message that cannot be decoded is dropped with a warning, and a handler failure is logged:
/// neither ever stops the loop. Only cancellation, or the source running dry, does.
pub struct Consumer<F> {
    source: F,
    handlers: Vec<Box<dyn FactHandler>>,
    config: RelayConfig,
}

impl<F> Consumer<F>
where
    F: FactSource,
{
    pub fn new(source: F, config: RelayConfig) -> Self {
        Self {
            source,
            handlers: vec![],
            config,
        }
    }

    pub fn add_handler(&mut self, handler: impl FactHandler + 'static) {
        self.handlers.push(Box::new(handler));
    }

    pub fn with_handler(mut self, handler: impl FactHandler + 'static) -> Self {
        self.add_handler(handler);
        self
    }

    /// Consumes facts until `cancel` fires or the source is exhausted, then releases the
    /// subscription.
    ///
    /// # Errors
    ///
    /// Will return an `Err` only if subscribing to the source fails.
    pub async fn run(&self, cancel: CancellationToken) -> Result<(), RelayError> {
        let mut subscription = self.source.subscribe().await?;
        tracing::info!(handlers = self.handlers.len(), "fact consumer started");

        loop {
            let message: FactMessage = tokio::select! {
                biased;
                _ = cancel.cancelled() => break,
                message = subscription.next() => match message {
                    Some(message) => message,
                    None => {
                        tracing::info!("fact source exhausted");
                        break;
                    }
                },
            };

            self.dispatch(message).await;
        }

        subscription.close().await;
        tracing::info!("fact consumer stopped");
        Ok(())
    }

    async fn dispatch(&self, message: FactMessage) {
        let fact: IncomingFact = match IncomingFact::decode(&message.payload) {
            Ok(fact) => fact,
            Err(error) => {
                tracing::warn!(channel = %message.channel, %error, "dropping undecodable fact");
                return;
            }
        };

        for handler in &self.handlers {
            let span = tracing::debug_span!(
                "fact_handler",
                handler = handler.name(),
                channel = %message.channel,
                event = fact.kind()
            );

            self.apply(handler.as_ref(), &fact).instrument(span).await;
        }
    }

    async fn apply(&self, handler: &dyn FactHandler, fact: &IncomingFact) {
        match tokio::time::timeout(self.config.handler_timeout, handler.handle(fact)).await {
            Ok(Ok(())) => {}
            Ok(Err(error @ StoreError::NotFound(_))) => tracing::debug!(%error, "fact targets a missing post"),
            Ok(Err(error)) => tracing::error!(%error, "fact handler failed"),
            Err(_) => tracing::error!(timeout = ?self.config.handler_timeout, "fact handler timed out"),
        }
    }
}
