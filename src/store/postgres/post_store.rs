use std::collections::HashSet;
use std::sync::Arc;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sqlx::postgres::PgQueryResult;
use sqlx::{Pool, Postgres};

use crate::error::StoreError;
use crate::post::{Counter, NewPost, Post, PostPatch};
use crate::query::{ListQuery, Page};
use crate::store::{LikeStore, PostStore};
use crate::types::{PostId, UserId};

use super::Statements;

/// Postgres implementation of both [`PostStore`] and [`LikeStore`].
///
/// The store is protected by an [`Arc`] that allows it to be cloneable still having the same memory
/// reference.
///
/// Counter updates are single `UPDATE ... SET c = GREATEST(c + $delta, 0)` statements, so
/// concurrent adjustments commute and never go below zero.
pub struct PgPostStore {
    pub(super) inner: Arc<InnerPgPostStore>,
}

pub(super) struct InnerPgPostStore {
    pub(super) pool: Pool<Postgres>,
    pub(super) statements: Statements,
}

impl PgPostStore {
    /// Returns the name of the posts table
    pub fn posts_table(&self) -> &str {
        self.inner.statements.posts_table()
    }

    /// Returns the name of the like rows table
    pub fn likes_table(&self) -> &str {
        self.inner.statements.likes_table()
    }

    pub fn pool(&self) -> &Pool<Postgres> {
        &self.inner.pool
    }
}

/// Post representation on the posts table
#[derive(sqlx::FromRow, Debug)]
struct PostRow {
    id: i64,
    title: String,
    content: String,
    author_id: i64,
    author_username: String,
    author_avatar_url: String,
    tags: Vec<String>,
    views: i64,
    likes_count: i64,
    comments_count: i64,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
    deleted_at: Option<DateTime<Utc>>,
}

impl From<PostRow> for Post {
    fn from(row: PostRow) -> Self {
        Self {
            id: row.id,
            title: row.title,
            content: row.content,
            author_id: row.author_id,
            author_username: row.author_username,
            author_avatar_url: row.author_avatar_url,
            tags: row.tags,
            views: row.views,
            likes: row.likes_count,
            comments: row.comments_count,
            created_at: row.created_at,
            updated_at: row.updated_at,
            deleted_at: row.deleted_at,
        }
    }
}

#[async_trait]
impl PostStore for PgPostStore {
    #[tracing::instrument(skip_all, err)]
    async fn create(&self, post: NewPost) -> Result<Post, StoreError> {
        let row: PostRow = sqlx::query_as(self.inner.statements.insert())
            .bind(post.title)
            .bind(post.content)
            .bind(post.author.id)
            .bind(post.author.username)
            .bind(post.author.avatar_url)
            .bind(post.tags)
            .fetch_one(&self.inner.pool)
            .await?;

        Ok(row.into())
    }

    async fn fetch(&self, id: PostId) -> Result<Post, StoreError> {
        sqlx::query_as::<_, PostRow>(self.inner.statements.select_by_id())
            .bind(id)
            .fetch_optional(&self.inner.pool)
            .await?
            .map(Post::from)
            .ok_or(StoreError::NotFound(id))
    }

    async fn update(&self, id: PostId, patch: PostPatch) -> Result<Post, StoreError> {
        sqlx::query_as::<_, PostRow>(self.inner.statements.update())
            .bind(id)
            .bind(patch.title)
            .bind(patch.content)
            .bind(patch.tags)
            .fetch_optional(&self.inner.pool)
            .await?
            .map(Post::from)
            .ok_or(StoreError::NotFound(id))
    }

    async fn soft_delete(&self, id: PostId) -> Result<(), StoreError> {
        let result: PgQueryResult = sqlx::query(self.inner.statements.soft_delete())
            .bind(id)
            .execute(&self.inner.pool)
            .await?;

        match result.rows_affected() {
            0 => Err(StoreError::NotFound(id)),
            _ => Ok(()),
        }
    }

    async fn increment(&self, counter: Counter, id: PostId, delta: i64) -> Result<(), StoreError> {
        let result: PgQueryResult = sqlx::query(self.inner.statements.increment(counter))
            .bind(id)
            .bind(delta)
            .execute(&self.inner.pool)
            .await?;

        match result.rows_affected() {
            0 => Err(StoreError::NotFound(id)),
            _ => Ok(()),
        }
    }

    async fn update_author(&self, author_id: UserId, username: &str, avatar_url: &str) -> Result<u64, StoreError> {
        Ok(sqlx::query(self.inner.statements.update_author())
            .bind(author_id)
            .bind(username)
            .bind(avatar_url)
            .execute(&self.inner.pool)
            .await?
            .rows_affected())
    }

    async fn list(&self, query: &ListQuery) -> Result<Vec<Post>, StoreError> {
        Ok(sqlx::query_as::<_, PostRow>(self.inner.statements.list(query.sort))
            .bind(query.author.as_deref())
            .bind(query.tag.as_deref())
            .bind(query.page.limit())
            .bind(query.page.offset())
            .fetch_all(&self.inner.pool)
            .await?
            .into_iter()
            .map(Post::from)
            .collect())
    }

    async fn search(&self, text: &str, page: Page) -> Result<Vec<Post>, StoreError> {
        Ok(sqlx::query_as::<_, PostRow>(self.inner.statements.search())
            .bind(text)
            .bind(page.limit())
            .bind(page.offset())
            .fetch_all(&self.inner.pool)
            .await?
            .into_iter()
            .map(Post::from)
            .collect())
    }
}

#[async_trait]
impl LikeStore for PgPostStore {
    async fn has_like(&self, post_id: PostId, user_id: UserId) -> Result<bool, StoreError> {
        Ok(sqlx::query_scalar(self.inner.statements.has_like())
            .bind(post_id)
            .bind(user_id)
            .fetch_one(&self.inner.pool)
            .await?)
    }

    async fn likes_among(&self, user_id: UserId, post_ids: &[PostId]) -> Result<HashSet<PostId>, StoreError> {
        if post_ids.is_empty() {
            return Ok(HashSet::new());
        }

        let liked: Vec<PostId> = sqlx::query_scalar(self.inner.statements.likes_among())
            .bind(user_id)
            .bind(post_ids)
            .fetch_all(&self.inner.pool)
            .await?;

        Ok(liked.into_iter().collect())
    }

    async fn insert_like(&self, post_id: PostId, user_id: UserId) -> Result<bool, StoreError> {
        let result: PgQueryResult = sqlx::query(self.inner.statements.insert_like())
            .bind(post_id)
            .bind(user_id)
            .execute(&self.inner.pool)
            .await?;

        Ok(result.rows_affected() == 1)
    }

    async fn delete_like(&self, post_id: PostId, user_id: UserId) -> Result<bool, StoreError> {
        let result: PgQueryResult = sqlx::query(self.inner.statements.delete_like())
            .bind(post_id)
            .bind(user_id)
            .execute(&self.inner.pool)
            .await?;

        Ok(result.rows_affected() == 1)
    }
}

/// Debug implementation for [`PgPostStore`]. It just shows the statements, that are the only thing
/// that might be useful to debug.
impl std::fmt::Debug for PgPostStore {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("PgPostStore")
            .field("statements", &self.inner.statements)
            .finish()
    }
}

impl Clone for PgPostStore {
    fn clone(&self) -> Self {
        Self {
            inner: Arc::clone(&self.inner),
        }
    }
}
