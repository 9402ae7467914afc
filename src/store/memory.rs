//! In-process [`PostStore`] and [`LikeStore`], for tests and single-node embedders.

use std::collections::{BTreeMap, HashSet};

use async_trait::async_trait;
use chrono::Utc;
use tokio::sync::RwLock;

use crate::error::StoreError;
use crate::post::{Counter, NewPost, Post, PostPatch};
use crate::query::{ListQuery, Page};
use crate::ranking::{self, SortMode};
use crate::store::{LikeStore, PostStore};
use crate::types::{PostId, UserId};

#[derive(Default)]
struct Inner {
    last_id: PostId,
    posts: BTreeMap<PostId, Post>,
    likes: HashSet<(PostId, UserId)>,
}

impl Inner {
    fn active_mut(&mut self, id: PostId) -> Result<&mut Post, StoreError> {
        self.posts
            .get_mut(&id)
            .filter(|post| post.is_active())
            .ok_or(StoreError::NotFound(id))
    }
}

#[derive(Default)]
pub struct MemoryStore {
    inner: RwLock<Inner>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Loads a post regardless of its lifecycle state.
    pub async fn raw(&self, id: PostId) -> Option<Post> {
        self.inner.read().await.posts.get(&id).cloned()
    }

    pub async fn like_count(&self) -> usize {
        self.inner.read().await.likes.len()
    }
}

#[async_trait]
impl PostStore for MemoryStore {
    async fn create(&self, post: NewPost) -> Result<Post, StoreError> {
        let mut inner = self.inner.write().await;
        inner.last_id += 1;
        let now = Utc::now();
        let post = Post {
            id: inner.last_id,
            title: post.title,
            content: post.content,
            author_id: post.author.id,
            author_username: post.author.username,
            author_avatar_url: post.author.avatar_url,
            tags: post.tags,
            views: 0,
            likes: 0,
            comments: 0,
            created_at: now,
            updated_at: now,
            deleted_at: None,
        };
        inner.posts.insert(post.id, post.clone());
        Ok(post)
    }

    async fn fetch(&self, id: PostId) -> Result<Post, StoreError> {
        self.inner
            .read()
            .await
            .posts
            .get(&id)
            .filter(|post| post.is_active())
            .cloned()
            .ok_or(StoreError::NotFound(id))
    }

    async fn update(&self, id: PostId, patch: PostPatch) -> Result<Post, StoreError> {
        let mut inner = self.inner.write().await;
        let post = inner.active_mut(id)?;
        patch.apply_to(post);
        post.updated_at = Utc::now();
        Ok(post.clone())
    }

    async fn soft_delete(&self, id: PostId) -> Result<(), StoreError> {
        let mut inner = self.inner.write().await;
        let post = inner.active_mut(id)?;
        let now = Utc::now();
        post.deleted_at = Some(now);
        post.updated_at = now;
        Ok(())
    }

    async fn increment(&self, counter: Counter, id: PostId, delta: i64) -> Result<(), StoreError> {
        let mut inner = self.inner.write().await;
        let value = inner.active_mut(id)?.counter_mut(counter);
        *value = value.saturating_add(delta).max(0);
        Ok(())
    }

    async fn update_author(&self, author_id: UserId, username: &str, avatar_url: &str) -> Result<u64, StoreError> {
        let mut inner = self.inner.write().await;
        let now = Utc::now();
        let mut touched = 0;
        for post in inner.posts.values_mut().filter(|post| post.author_id == author_id) {
            post.author_username = username.to_string();
            post.author_avatar_url = avatar_url.to_string();
            post.updated_at = now;
            touched += 1;
        }
        Ok(touched)
    }

    async fn list(&self, query: &ListQuery) -> Result<Vec<Post>, StoreError> {
        let inner = self.inner.read().await;
        let mut posts: Vec<Post> = inner
            .posts
            .values()
            .filter(|post| post.is_active())
            .filter(|post| query.author.as_ref().map_or(true, |a| &post.author_username == a))
            .filter(|post| query.tag.as_ref().map_or(true, |t| post.tags.contains(t)))
            .cloned()
            .collect();

        ranking::rank(query.sort, &mut posts);
        Ok(window(posts, query.page))
    }

    async fn search(&self, text: &str, page: Page) -> Result<Vec<Post>, StoreError> {
        let terms: Vec<String> = text.split_whitespace().map(str::to_lowercase).collect();
        if terms.is_empty() {
            return Ok(vec![]);
        }

        let inner = self.inner.read().await;
        let mut hits: Vec<(usize, Post)> = inner
            .posts
            .values()
            .filter(|post| post.is_active())
            .filter_map(|post| {
                let haystack = format!("{} {}", post.title, post.content).to_lowercase();
                let relevance: usize = terms.iter().map(|term| haystack.matches(term.as_str()).count()).sum();
                (relevance > 0).then(|| (relevance, post.clone()))
            })
            .collect();

        hits.sort_by(|(ra, a), (rb, b)| rb.cmp(ra).then_with(|| ranking::compare(SortMode::New, a, b)));
        Ok(window(hits.into_iter().map(|(_, post)| post).collect(), page))
    }
}

#[async_trait]
impl LikeStore for MemoryStore {
    async fn has_like(&self, post_id: PostId, user_id: UserId) -> Result<bool, StoreError> {
        Ok(self.inner.read().await.likes.contains(&(post_id, user_id)))
    }

    async fn likes_among(&self, user_id: UserId, post_ids: &[PostId]) -> Result<HashSet<PostId>, StoreError> {
        let inner = self.inner.read().await;
        Ok(post_ids
            .iter()
            .copied()
            .filter(|post_id| inner.likes.contains(&(*post_id, user_id)))
            .collect())
    }

    async fn insert_like(&self, post_id: PostId, user_id: UserId) -> Result<bool, StoreError> {
        Ok(self.inner.write().await.likes.insert((post_id, user_id)))
    }

    async fn delete_like(&self, post_id: PostId, user_id: UserId) -> Result<bool, StoreError> {
        Ok(self.inner.write().await.likes.remove(&(post_id, user_id)))
    }
}

fn window(posts: Vec<Post>, page: Page) -> Vec<Post> {
    posts
        .into_iter()
        .skip(page.offset() as usize)
        .take(page.limit() as usize)
        .collect()
}
