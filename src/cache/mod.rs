use std::ops::Deref;
use std::time::Duration;

use async_trait::async_trait;

use crate::error::StoreError;
use crate::types::{PostId, UserId};

pub use memory::MemoryCache;
#[cfg(feature = "postgres")]
pub use postgres::{PgCache, PgCacheBuilder};

mod memory;
#[cfg(feature = "postgres")]
mod postgres;

/// Key/value cache contract: invalidation plus an atomic "set if absent, with expiry" primitive.
///
/// An entry whose TTL elapsed is treated as absent.
#[async_trait]
pub trait Cache: Send + Sync {
    /// Stores `key` only if it is absent. Returns `true` if this call stored it.
    async fn set_if_absent(&self, key: &str, ttl: Duration) -> Result<bool, StoreError>;

    /// Removes `key`. Removing an absent key is not an error.
    async fn delete(&self, key: &str) -> Result<(), StoreError>;
}

#[async_trait]
impl<C, T> Cache for T
where
    C: Cache + ?Sized,
    T: Deref<Target = C> + Send + Sync,
{
    async fn set_if_absent(&self, key: &str, ttl: Duration) -> Result<bool, StoreError> {
        self.deref().set_if_absent(key, ttl).await
    }

    async fn delete(&self, key: &str) -> Result<(), StoreError> {
        self.deref().delete(key).await
    }
}

/// Key of the cached representation of a post.
pub fn post_key(post_id: PostId) -> String {
    format!("post:{post_id}")
}

/// Key of the marker suppressing repeated view counting.
pub fn viewed_key(post_id: PostId, user_id: UserId) -> String {
    format!("post:{post_id}:viewed_by:{user_id}")
}
