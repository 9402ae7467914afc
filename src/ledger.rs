//! The engagement ledger: who liked which post, and who viewed it recently.
//!
//! Like rows live in a durable [`LikeStore`]; view markers are short-lived cache entries. Both
//! halves are idempotent, which is what makes the two-step "ledger write, then counter
//! adjustment" sequences in [`crate::manager::PostManager`] safe to retry.

use std::collections::HashSet;
use std::time::Duration;

use crate::cache::{viewed_key, Cache};
use crate::error::StoreError;
use crate::store::LikeStore;
use crate::types::{PostId, UserId};

pub struct Ledger<L, C> {
    likes: L,
    views: C,
}

impl<L, C> Ledger<L, C>
where
    L: LikeStore,
    C: Cache,
{
    pub fn new(likes: L, views: C) -> Self {
        Self { likes, views }
    }

    pub async fn has_liked(&self, post_id: PostId, user_id: UserId) -> Result<bool, StoreError> {
        self.likes.has_like(post_id, user_id).await
    }

    pub async fn liked_among(&self, user_id: UserId, post_ids: &[PostId]) -> Result<HashSet<PostId>, StoreError> {
        self.likes.likes_among(user_id, post_ids).await
    }

    /// Idempotent insert. Returns `false`, not an error, if the pair was already recorded.
    pub async fn add_like(&self, post_id: PostId, user_id: UserId) -> Result<bool, StoreError> {
        self.likes.insert_like(post_id, user_id).await
    }

    /// Idempotent delete. Returns `false`, not an error, if the pair was not recorded.
    pub async fn remove_like(&self, post_id: PostId, user_id: UserId) -> Result<bool, StoreError> {
        self.likes.delete_like(post_id, user_id).await
    }

    /// Sets the view marker for `ttl` if it is absent. Returns `true` exactly once per window.
    pub async fn mark_viewed(&self, post_id: PostId, user_id: UserId, ttl: Duration) -> Result<bool, StoreError> {
        self.views.set_if_absent(&viewed_key(post_id, user_id), ttl).await
    }
}
