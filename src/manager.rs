use std::collections::HashSet;
use std::time::Duration;

use typed_builder::TypedBuilder;

use crate::bus::EventBus;
use crate::cache::{post_key, Cache};
use crate::error::PostError;
use crate::event::PostFact;
use crate::ledger::Ledger;
use crate::post::{normalize_tags, Author, Counter, NewPost, Post, PostPatch, PostView};
use crate::query::{ListQuery, Page};
use crate::store::{LikeStore, PostStore};
use crate::types::{PostId, UserId, Viewer};

/// How long a user's view of a post suppresses further view counting.
pub const DEFAULT_VIEW_TTL: Duration = Duration::from_secs(24 * 60 * 60);

#[derive(Clone, Debug, TypedBuilder)]
pub struct ManagerConfig {
    #[builder(default = DEFAULT_VIEW_TTL)]
    pub view_ttl: Duration,
}

impl Default for ManagerConfig {
    fn default() -> Self {
        Self::builder().build()
    }
}

/// The PostManager couples the post store, the engagement ledger, the cache and the event buses.
///
/// Request bounds (title and content length) are checked at the boundary with
/// [`NewPost::validated`] and [`PostPatch::validated`]; the manager only normalizes tags.
///
/// Every mutation is applied to the store first. Cache invalidation and fact publication follow
/// and are best effort: their failures are logged, never returned.
///
/// The basic APIs are:
/// 1. create, update, delete
/// 2. get, list, search
/// 3. increment_view, like, unlike
pub struct PostManager<S, L, C> {
    store: S,
    ledger: Ledger<L, C>,
    cache: C,
    event_buses: Vec<Box<dyn EventBus>>,
    config: ManagerConfig,
}

impl<S, L, C> PostManager<S, L, C>
where
    S: PostStore,
    L: LikeStore,
    C: Cache + Clone,
{
    pub fn new(store: S, likes: L, cache: C, config: ManagerConfig) -> Self {
        Self {
            store,
            ledger: Ledger::new(likes, cache.clone()),
            cache,
            event_buses: vec![],
            config,
        }
    }

    pub fn add_event_bus(&mut self, event_bus: impl EventBus + 'static) {
        self.event_buses.push(Box::new(event_bus));
    }

    pub fn with_event_buses(mut self, event_buses: Vec<Box<dyn EventBus>>) -> Self {
        self.event_buses.extend(event_buses);
        self
    }

    /// Returns the internal post store
    pub fn store(&self) -> &S {
        &self.store
    }

    #[tracing::instrument(skip_all, fields(author_id = author.id))]
    pub async fn create(
        &self,
        author: Author,
        title: impl Into<String> + Send,
        content: impl Into<String> + Send,
        tags: Vec<String>,
    ) -> Result<Post, PostError> {
        let new_post: NewPost = NewPost::new(author, title, content, normalize_tags(tags));
        let post: Post = log_unavailable(self.store.create(new_post).await.map_err(PostError::from))?;

        self.publish(PostFact::PostCreated {
            post_id: post.id,
            author_id: post.author_id,
            title: post.title.clone(),
        })
        .await;

        Ok(post)
    }

    pub async fn get(&self, id: PostId, viewer: Viewer) -> Result<PostView, PostError> {
        let post: Post = self.store.fetch(id).await?;

        let Some(user_id) = viewer else {
            return Ok(PostView::anonymous(post));
        };

        let is_liked_by_me: bool = match self.ledger.has_liked(id, user_id).await {
            Ok(liked) => liked,
            Err(error) => {
                tracing::warn!(post_id = id, user_id, %error, "failed to resolve liked flag");
                false
            }
        };

        Ok(PostView { post, is_liked_by_me })
    }

    pub async fn list(&self, query: &ListQuery, viewer: Viewer) -> Result<Vec<PostView>, PostError> {
        let posts: Vec<Post> = self.store.list(query).await?;
        Ok(self.with_liked_flags(posts, viewer).await)
    }

    /// Full-text search. A blank query matches nothing.
    pub async fn search(&self, text: &str, page: Page, viewer: Viewer) -> Result<Vec<PostView>, PostError> {
        let text: &str = text.trim();
        if text.is_empty() {
            return Ok(vec![]);
        }

        let posts: Vec<Post> = self.store.search(text, page).await?;
        Ok(self.with_liked_flags(posts, viewer).await)
    }

    #[tracing::instrument(skip_all, fields(post_id = id, user_id = user_id))]
    pub async fn update(&self, id: PostId, user_id: UserId, patch: PostPatch) -> Result<Post, PostError> {
        log_unavailable(self.apply_update(id, user_id, patch).await)
    }

    #[tracing::instrument(skip_all, fields(post_id = id, user_id = user_id))]
    pub async fn delete(&self, id: PostId, user_id: UserId) -> Result<(), PostError> {
        log_unavailable(self.apply_delete(id, user_id).await)
    }

    /// Counts a view of `id` by `user_id`, at most once per user within the view TTL. Returns
    /// whether this view was counted.
    #[tracing::instrument(skip_all, fields(post_id = id, user_id = user_id))]
    pub async fn increment_view(&self, id: PostId, user_id: UserId) -> Result<bool, PostError> {
        log_unavailable(self.count_view(id, user_id).await)
    }

    #[tracing::instrument(skip_all, fields(post_id = id, user_id = user_id))]
    pub async fn like(&self, id: PostId, user_id: UserId) -> Result<(), PostError> {
        log_unavailable(self.apply_like(id, user_id).await)
    }

    #[tracing::instrument(skip_all, fields(post_id = id, user_id = user_id))]
    pub async fn unlike(&self, id: PostId, user_id: UserId) -> Result<(), PostError> {
        log_unavailable(self.apply_unlike(id, user_id).await)
    }

    async fn apply_update(&self, id: PostId, user_id: UserId, patch: PostPatch) -> Result<Post, PostError> {
        self.authorize(id, user_id).await?;
        let patch: PostPatch = PostPatch {
            tags: patch.tags.map(normalize_tags),
            ..patch
        };

        let post: Post = self.store.update(id, patch).await?;
        self.invalidate(id).await;
        self.publish(PostFact::PostUpdated {
            post_id: id,
            author_id: user_id,
        })
        .await;

        Ok(post)
    }

    async fn apply_delete(&self, id: PostId, user_id: UserId) -> Result<(), PostError> {
        self.authorize(id, user_id).await?;

        self.store.soft_delete(id).await?;
        self.invalidate(id).await;
        self.publish(PostFact::PostDeleted {
            post_id: id,
            author_id: user_id,
        })
        .await;

        Ok(())
    }

    async fn count_view(&self, id: PostId, user_id: UserId) -> Result<bool, PostError> {
        let _: Post = self.store.fetch(id).await?;

        if !self.ledger.mark_viewed(id, user_id, self.config.view_ttl).await? {
            return Ok(false);
        }

        self.store.increment(Counter::Views, id, 1).await?;
        Ok(true)
    }

    async fn apply_like(&self, id: PostId, user_id: UserId) -> Result<(), PostError> {
        let _: Post = self.store.fetch(id).await?;

        if self.ledger.has_liked(id, user_id).await? {
            return Err(PostError::AlreadyLiked);
        }
        if !self.ledger.add_like(id, user_id).await? {
            return Err(PostError::AlreadyLiked);
        }

        // Undo the row when the counter cannot follow it.
        if let Err(error) = self.store.increment(Counter::Likes, id, 1).await {
            if let Err(revert) = self.ledger.remove_like(id, user_id).await {
                tracing::warn!(error = %revert, "failed to revert like row, likes counter is behind");
            }
            return Err(error.into());
        }
        self.publish(PostFact::PostLiked { post_id: id, user_id }).await;

        Ok(())
    }

    async fn apply_unlike(&self, id: PostId, user_id: UserId) -> Result<(), PostError> {
        let _: Post = self.store.fetch(id).await?;

        if !self.ledger.has_liked(id, user_id).await? {
            return Err(PostError::NotLiked);
        }
        if !self.ledger.remove_like(id, user_id).await? {
            return Err(PostError::NotLiked);
        }

        if let Err(error) = self.store.increment(Counter::Likes, id, -1).await {
            if let Err(revert) = self.ledger.add_like(id, user_id).await {
                tracing::warn!(error = %revert, "failed to restore like row, likes counter is ahead");
            }
            return Err(error.into());
        }
        self.publish(PostFact::PostUnliked { post_id: id, user_id }).await;

        Ok(())
    }

    async fn authorize(&self, id: PostId, user_id: UserId) -> Result<Post, PostError> {
        let post: Post = self.store.fetch(id).await?;
        if post.author_id == user_id {
            Ok(post)
        } else {
            Err(PostError::Forbidden)
        }
    }

    async fn with_liked_flags(&self, posts: Vec<Post>, viewer: Viewer) -> Vec<PostView> {
        let liked: HashSet<PostId> = match viewer {
            Some(user_id) if !posts.is_empty() => {
                let ids: Vec<PostId> = posts.iter().map(|post| post.id).collect();
                match self.ledger.liked_among(user_id, &ids).await {
                    Ok(liked) => liked,
                    Err(error) => {
                        tracing::warn!(user_id, %error, "failed to resolve liked flags");
                        HashSet::new()
                    }
                }
            }
            _ => HashSet::new(),
        };

        posts
            .into_iter()
            .map(|post| PostView {
                is_liked_by_me: liked.contains(&post.id),
                post,
            })
            .collect()
    }

    async fn invalidate(&self, id: PostId) {
        if let Err(error) = self.cache.delete(&post_key(id)).await {
            tracing::warn!(post_id = id, %error, "failed to invalidate cached post");
        }
    }

    async fn publish(&self, fact: PostFact) {
        let fact: &PostFact = &fact;
        let futures: Vec<_> = self.event_buses.iter().map(|bus| bus.publish(fact)).collect();
        let _ = futures::future::join_all(futures).await;
    }
}

/// Collaborator failures are logged as errors. Business outcomes go back to the caller unlogged.
fn log_unavailable<T>(result: Result<T, PostError>) -> Result<T, PostError> {
    if let Err(PostError::Unavailable(error)) = &result {
        tracing::error!(%error, "post collaborator unavailable");
    }
    result
}
