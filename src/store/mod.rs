use std::collections::HashSet;
use std::ops::Deref;

use async_trait::async_trait;

use crate::error::StoreError;
use crate::post::{Counter, NewPost, Post, PostPatch};
use crate::query::{ListQuery, Page};
use crate::types::{PostId, UserId};

pub mod memory;
#[cfg(feature = "postgres")]
pub mod postgres;

/// A PostStore is the persistent home of posts and the single source of truth for their
/// counters.
///
/// Every read method ignores soft-deleted posts. Every mutating method refreshes `updated_at`,
/// except [`PostStore::increment`]: counters move too often to count as content freshness.
#[async_trait]
pub trait PostStore: Send + Sync {
    /// Inserts a new active post. The store assigns the id and both timestamps.
    async fn create(&self, post: NewPost) -> Result<Post, StoreError>;

    /// Loads an active post, failing with [`StoreError::NotFound`] otherwise.
    async fn fetch(&self, id: PostId) -> Result<Post, StoreError>;

    /// Replaces the supplied fields of an active post and returns the updated post.
    async fn update(&self, id: PostId, patch: PostPatch) -> Result<Post, StoreError>;

    /// Marks an active post as deleted. Its row is kept.
    async fn soft_delete(&self, id: PostId) -> Result<(), StoreError>;

    /// Adds `delta` to a counter of an active post as a single atomic relative adjustment,
    /// clamping the result at zero.
    async fn increment(&self, counter: Counter, id: PostId, delta: i64) -> Result<(), StoreError>;

    /// Rewrites the denormalized author fields on every post by `author_id`. Returns the number
    /// of posts touched.
    async fn update_author(&self, author_id: UserId, username: &str, avatar_url: &str) -> Result<u64, StoreError>;

    /// Filtered listing, in the order [`crate::ranking::compare`] defines for the query's sort.
    async fn list(&self, query: &ListQuery) -> Result<Vec<Post>, StoreError>;

    /// Full-text search over title and content, most relevant first.
    async fn search(&self, text: &str, page: Page) -> Result<Vec<Post>, StoreError>;
}

/// Durable set of (post, user) like rows.
///
/// Inserts and deletes are idempotent: they report whether a row changed instead of failing.
#[async_trait]
pub trait LikeStore: Send + Sync {
    async fn has_like(&self, post_id: PostId, user_id: UserId) -> Result<bool, StoreError>;

    /// Returns the subset of `post_ids` liked by `user_id`.
    async fn likes_among(&self, user_id: UserId, post_ids: &[PostId]) -> Result<HashSet<PostId>, StoreError>;

    /// Inserts the row if absent. Returns `true` if it was inserted.
    async fn insert_like(&self, post_id: PostId, user_id: UserId) -> Result<bool, StoreError>;

    /// Deletes the row if present. Returns `true` if it was deleted.
    async fn delete_like(&self, post_id: PostId, user_id: UserId) -> Result<bool, StoreError>;
}

/// Blanket implementation making a [`PostStore`] every (smart) pointer to a [`PostStore`],
/// e.g. `&Store`, `Box<Store>`, `Arc<Store>`.
#[async_trait]
impl<S, T> PostStore for T
where
    S: PostStore + ?Sized,
    T: Deref<Target = S> + Send + Sync,
{
    async fn create(&self, post: NewPost) -> Result<Post, StoreError> {
        self.deref().create(post).await
    }

    async fn fetch(&self, id: PostId) -> Result<Post, StoreError> {
        self.deref().fetch(id).await
    }

    async fn update(&self, id: PostId, patch: PostPatch) -> Result<Post, StoreError> {
        self.deref().update(id, patch).await
    }

    async fn soft_delete(&self, id: PostId) -> Result<(), StoreError> {
        self.deref().soft_delete(id).await
    }

    async fn increment(&self, counter: Counter, id: PostId, delta: i64) -> Result<(), StoreError> {
        self.deref().increment(counter, id, delta).await
    }

    async fn update_author(&self, author_id: UserId, username: &str, avatar_url: &str) -> Result<u64, StoreError> {
        self.deref().update_author(author_id, username, avatar_url).await
    }

    async fn list(&self, query: &ListQuery) -> Result<Vec<Post>, StoreError> {
        self.deref().list(query).await
    }

    async fn search(&self, text: &str, page: Page) -> Result<Vec<Post>, StoreError> {
        self.deref().search(text, page).await
    }
}

/// Blanket implementation making a [`LikeStore`] every (smart) pointer to a [`LikeStore`].
#[async_trait]
impl<S, T> LikeStore for T
where
    S: LikeStore + ?Sized,
    T: Deref<Target = S> + Send + Sync,
{
    async fn has_like(&self, post_id: PostId, user_id: UserId) -> Result<bool, StoreError> {
        self.deref().has_like(post_id, user_id).await
    }

    async fn likes_among(&self, user_id: UserId, post_ids: &[PostId]) -> Result<HashSet<PostId>, StoreError> {
        self.deref().likes_among(user_id, post_ids).await
    }

    async fn insert_like(&self, post_id: PostId, user_id: UserId) -> Result<bool, StoreError> {
        self.deref().insert_like(post_id, user_id).await
    }

    async fn delete_like(&self, post_id: PostId, user_id: UserId) -> Result<bool, StoreError> {
        self.deref().delete_like(post_id, user_id).await
    }
}
