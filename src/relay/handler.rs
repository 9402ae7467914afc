use std::ops::Deref;

use async_trait::async_trait;

use crate::error::StoreError;
use crate::event::IncomingFact;
use crate::post::Counter;
use crate::store::PostStore;

/// Applies incoming facts to some piece of local state.
///
/// Facts are delivered at most once but may be replayed by an upstream retry, so every
/// implementation must be idempotent against replay.
#[async_trait]
pub trait FactHandler: Send + Sync {
    async fn handle(&self, fact: &IncomingFact) -> Result<(), StoreError>;

    /// The name of the handler, used as part of tracing spans. Defaults to the type name.
    fn name(&self) -> &'static str {
        std::any::type_name::<Self>()
    }
}

#[async_trait]
impl<H, T> FactHandler for T
where
    H: FactHandler + ?Sized,
    T: Deref<Target = H> + Send + Sync,
{
    async fn handle(&self, fact: &IncomingFact) -> Result<(), StoreError> {
        self.deref().handle(fact).await
    }

    fn name(&self) -> &'static str {
        self.deref().name()
    }
}

/// Keeps the denormalized comment counter and author fields of posts in sync with the comment
/// and profile services.
pub struct CounterProjector<S> {
    store: S,
}

impl<S> CounterProjector<S>
where
    S: PostStore,
{
    pub fn new(store: S) -> Self {
        Self { store }
    }
}

#[async_trait]
impl<S> FactHandler for CounterProjector<S>
where
    S: PostStore,
{
    async fn handle(&self, fact: &IncomingFact) -> Result<(), StoreError> {
        match fact {
            IncomingFact::CommentCreated { post_id } => self.store.increment(Counter::Comments, *post_id, 1).await,
            IncomingFact::CommentDeleted { post_id } => self.store.increment(Counter::Comments, *post_id, -1).await,
            IncomingFact::ProfileUpdated {
                user_id,
                username,
                avatar_url,
            } => {
                let touched: u64 = self.store.update_author(*user_id, username, avatar_url).await?;
                tracing::debug!(user_id, touched, "author fields refreshed");
                Ok(())
            }
        }
    }

    fn name(&self) -> &'static str {
        "counter_projector"
    }
}
