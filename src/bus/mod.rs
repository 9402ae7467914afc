use std::ops::Deref;

use async_trait::async_trait;

use crate::event::PostFact;

#[cfg(feature = "kafka")]
pub mod kafka;
#[cfg(feature = "rabbit")]
pub mod rabbit;

/// The responsibility of the [`EventBus`] trait is to publish a [`PostFact`] on a specific bus
/// implementation.
#[async_trait]
pub trait EventBus: Send + Sync {
    /// Publishes a fact after the state change it describes has been committed.
    ///
    /// Delivery is best effort: every error should be handled from within the [`EventBus`], and
    /// it must never fail the operation that produced the fact.
    async fn publish(&self, fact: &PostFact);
}

#[async_trait]
impl<B, T> EventBus for T
where
    B: EventBus + ?Sized,
    T: Deref<Target = B> + Send + Sync,
{
    async fn publish(&self, fact: &PostFact) {
        self.deref().publish(fact).await
    }
}

/// [`EventBus`] recording every published fact in memory.
#[derive(Default)]
pub struct MemoryEventBus {
    published: std::sync::Mutex<Vec<PostFact>>,
}

impl MemoryEventBus {
    pub fn new() -> Self {
        Self::default()
    }

    /// Facts published so far, in publication order.
    pub fn published(&self) -> Vec<PostFact> {
        self.published.lock().map(|facts| facts.clone()).unwrap_or_default()
    }
}

#[async_trait]
impl EventBus for MemoryEventBus {
    async fn publish(&self, fact: &PostFact) {
        if let Ok(mut published) = self.published.lock() {
            published.push(fact.clone());
        }
    }
}
