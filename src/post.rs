use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::error::PostError;
use crate::types::{PostId, UserId};

const TITLE_LEN: std::ops::RangeInclusive<usize> = 3..=300;
const CONTENT_LEN: std::ops::RangeInclusive<usize> = 10..=50_000;

/// A user-authored post, as persisted by a [`crate::store::PostStore`].
///
/// `author_username` and `author_avatar_url` are denormalized copies of the author's profile; they
/// are refreshed by `ProfileUpdated` facts. The three counters are never negative.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Post {
    pub id: PostId,
    pub title: String,
    pub content: String,
    pub author_id: UserId,
    pub author_username: String,
    pub author_avatar_url: String,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub tags: Vec<String>,
    pub views: i64,
    #[serde(rename = "likesCount")]
    pub likes: i64,
    #[serde(rename = "commentsCount")]
    pub comments: i64,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
    #[serde(skip)]
    pub deleted_at: Option<DateTime<Utc>>,
}

impl Post {
    pub fn state(&self) -> PostState {
        match self.deleted_at {
            Some(_) => PostState::Deleted,
            None => PostState::Active,
        }
    }

    pub fn is_active(&self) -> bool {
        self.state() == PostState::Active
    }

    pub fn counter(&self, counter: Counter) -> i64 {
        match counter {
            Counter::Views => self.views,
            Counter::Likes => self.likes,
            Counter::Comments => self.comments,
        }
    }

    pub(crate) fn counter_mut(&mut self, counter: Counter) -> &mut i64 {
        match counter {
            Counter::Views => &mut self.views,
            Counter::Likes => &mut self.likes,
            Counter::Comments => &mut self.comments,
        }
    }
}

/// Lifecycle of a post. `Deleted` is terminal.
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub enum PostState {
    Active,
    Deleted,
}

/// One of the engagement counters carried by a [`Post`].
#[derive(Clone, Copy, Debug, Eq, PartialEq, Hash)]
pub enum Counter {
    Views,
    Likes,
    Comments,
}

/// Author identity and display fields, copied onto the post at creation time.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct Author {
    pub id: UserId,
    pub username: String,
    pub avatar_url: String,
}

/// Input of [`crate::store::PostStore::create`].
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct NewPost {
    pub author: Author,
    pub title: String,
    pub content: String,
    pub tags: Vec<String>,
}

impl NewPost {
    pub fn new(author: Author, title: impl Into<String>, content: impl Into<String>, tags: Vec<String>) -> Self {
        Self {
            author,
            title: title.into(),
            content: content.into(),
            tags,
        }
    }

    /// Checks title and content bounds and normalizes the tag set.
    pub fn validated(mut self) -> Result<Self, PostError> {
        check_title(&self.title)?;
        check_content(&self.content)?;
        self.tags = normalize_tags(self.tags);
        Ok(self)
    }
}

/// Partial replacement of a post's content. `None` fields keep their current value.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct PostPatch {
    pub title: Option<String>,
    pub content: Option<String>,
    pub tags: Option<Vec<String>>,
}

impl PostPatch {
    pub fn is_empty(&self) -> bool {
        self.title.is_none() && self.content.is_none() && self.tags.is_none()
    }

    pub fn validated(mut self) -> Result<Self, PostError> {
        if let Some(title) = &self.title {
            check_title(title)?;
        }
        if let Some(content) = &self.content {
            check_content(content)?;
        }
        self.tags = self.tags.map(normalize_tags);
        Ok(self)
    }

    /// Applies the patch onto `post`. Used by stores that keep posts in memory.
    pub(crate) fn apply_to(&self, post: &mut Post) {
        if let Some(title) = &self.title {
            post.title = title.clone();
        }
        if let Some(content) = &self.content {
            post.content = content.clone();
        }
        if let Some(tags) = &self.tags {
            post.tags = tags.clone();
        }
    }
}

/// Read representation of a post, as seen by a given viewer.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PostView {
    #[serde(flatten)]
    pub post: Post,
    pub is_liked_by_me: bool,
}

impl PostView {
    pub fn anonymous(post: Post) -> Self {
        Self {
            post,
            is_liked_by_me: false,
        }
    }
}

fn check_title(title: &str) -> Result<(), PostError> {
    let len = title.chars().count();
    if TITLE_LEN.contains(&len) {
        Ok(())
    } else {
        Err(PostError::invalid(format!(
            "title must be {}..={} characters, got {len}",
            TITLE_LEN.start(),
            TITLE_LEN.end()
        )))
    }
}

fn check_content(content: &str) -> Result<(), PostError> {
    let len = content.chars().count();
    if CONTENT_LEN.contains(&len) {
        Ok(())
    } else {
        Err(PostError::invalid(format!(
            "content must be {}..={} characters, got {len}",
            CONTENT_LEN.start(),
            CONTENT_LEN.end()
        )))
    }
}

/// Trims tags, drops blanks and duplicates, keeps first-seen order.
pub fn normalize_tags(tags: Vec<String>) -> Vec<String> {
    let mut normalized: Vec<String> = Vec::with_capacity(tags.len());
    for tag in tags {
        let tag = tag.trim();
        if !tag.is_empty() && !normalized.iter().any(|t| t == tag) {
            normalized.push(tag.to_string());
        }
    }
    normalized
}
