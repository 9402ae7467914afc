//! Consumer side of the event relay: facts produced by other services flow from a
//! [`FactSource`] through the [`Consumer`] loop into every registered [`FactHandler`].

use std::ops::Deref;

use async_trait::async_trait;
use tokio::sync::{mpsc, Mutex};

pub use consumer::{Consumer, RelayConfig};
pub use handler::{CounterProjector, FactHandler};

mod consumer;
mod handler;

/// Channel carrying comment facts.
pub const COMMENT_EVENTS: &str = "comment_events";
/// Channel carrying profile facts.
pub const PROFILE_EVENTS: &str = "profile_events";

/// Raw message as delivered by a [`FactSource`]. Decoding happens in the [`Consumer`].
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct FactMessage {
    pub channel: String,
    pub payload: Vec<u8>,
}

impl FactMessage {
    pub fn new(channel: impl Into<String>, payload: impl Into<Vec<u8>>) -> Self {
        Self {
            channel: channel.into(),
            payload: payload.into(),
        }
    }
}

#[derive(thiserror::Error, Debug)]
pub enum RelayError {
    #[cfg(feature = "rabbit")]
    #[error(transparent)]
    Rabbit(#[from] lapin::Error),
    #[error("fact source already subscribed")]
    AlreadySubscribed,
}

/// Producer of incoming facts, e.g. a broker queue bound to the fact channels.
#[async_trait]
pub trait FactSource: Send + Sync {
    type Subscription: FactSubscription;

    async fn subscribe(&self) -> Result<Self::Subscription, RelayError>;
}

#[async_trait]
impl<S, T> FactSource for T
where
    S: FactSource + ?Sized,
    T: Deref<Target = S> + Send + Sync,
{
    type Subscription = S::Subscription;

    async fn subscribe(&self) -> Result<Self::Subscription, RelayError> {
        self.deref().subscribe().await
    }
}

/// A live subscription. `next` yields `None` once the source is exhausted.
#[async_trait]
pub trait FactSubscription: Send {
    async fn next(&mut self) -> Option<FactMessage>;

    /// Releases the subscription. Nothing is delivered after this returns.
    async fn close(&mut self);
}

/// In-process [`FactSource`] fed through an mpsc channel. It can be subscribed to once.
pub struct MemoryFactSource {
    receiver: Mutex<Option<mpsc::Receiver<FactMessage>>>,
}

impl MemoryFactSource {
    /// Creates the source together with the sender feeding it. The subscription ends once every
    /// sender is dropped.
    pub fn channel(capacity: usize) -> (mpsc::Sender<FactMessage>, Self) {
        let (sender, receiver) = mpsc::channel(capacity);
        let source = Self {
            receiver: Mutex::new(Some(receiver)),
        };
        (sender, source)
    }
}

#[async_trait]
impl FactSource for MemoryFactSource {
    type Subscription = MemorySubscription;

    async fn subscribe(&self) -> Result<Self::Subscription, RelayError> {
        self.receiver
            .lock()
            .await
            .take()
            .map(|receiver| MemorySubscription { receiver })
            .ok_or(RelayError::AlreadySubscribed)
    }
}

pub struct MemorySubscription {
    receiver: mpsc::Receiver<FactMessage>,
}

#[async_trait]
impl FactSubscription for MemorySubscription {
    async fn next(&mut self) -> Option<FactMessage> {
        self.receiver.recv().await
    }

    async fn close(&mut self) {
        self.receiver.close();
    }
}
