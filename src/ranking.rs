//! Ordering of posts for the `new`, `top` and `hot` listings.
//!
//! Every mode sorts descending and falls back to the `new` order on ties: newest creation
//! timestamp first, then the higher id. Stores that order in the database must reproduce
//! exactly this order.

use std::cmp::Ordering;
use std::str::FromStr;

use crate::error::PostError;
use crate::post::Post;

const LIKE_WEIGHT: f64 = 0.8;
const COMMENT_WEIGHT: f64 = 0.5;

#[derive(Clone, Copy, Debug, Default, Eq, PartialEq, Hash)]
pub enum SortMode {
    #[default]
    New,
    Hot,
    Top,
}

impl SortMode {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::New => "new",
            Self::Hot => "hot",
            Self::Top => "top",
        }
    }
}

impl FromStr for SortMode {
    type Err = PostError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "" | "new" => Ok(Self::New),
            "hot" => Ok(Self::Hot),
            "top" => Ok(Self::Top),
            other => Err(PostError::invalid(format!("unknown sort mode `{other}`"))),
        }
    }
}

/// Primary sort key of a post under a given [`SortMode`]. Greater ranks first.
#[derive(Clone, Copy, Debug, PartialEq)]
pub enum Score {
    /// `new` has no computed score; the tie-break order is the whole order.
    Recency,
    Top(i64),
    Hot(f64),
}

impl Score {
    fn cmp_primary(&self, other: &Self) -> Ordering {
        match (self, other) {
            (Self::Top(a), Self::Top(b)) => a.cmp(b),
            (Self::Hot(a), Self::Hot(b)) => a.total_cmp(b),
            _ => Ordering::Equal,
        }
    }
}

/// `likes * 0.8 + comments * 0.5 + ln(views + 1)`.
pub fn hot_score(likes: i64, comments: i64, views: i64) -> f64 {
    likes as f64 * LIKE_WEIGHT + comments as f64 * COMMENT_WEIGHT + (views as f64 + 1.0).ln()
}

pub fn score(sort: SortMode, post: &Post) -> Score {
    match sort {
        SortMode::New => Score::Recency,
        SortMode::Top => Score::Top(post.likes),
        SortMode::Hot => Score::Hot(hot_score(post.likes, post.comments, post.views)),
    }
}

/// Ordering in which `a` comes before `b` when `Ordering::Less` is returned.
pub fn compare(sort: SortMode, a: &Post, b: &Post) -> Ordering {
    score(sort, b)
        .cmp_primary(&score(sort, a))
        .then_with(|| b.created_at.cmp(&a.created_at))
        .then_with(|| b.id.cmp(&a.id))
}

pub fn rank(sort: SortMode, posts: &mut [Post]) {
    posts.sort_by(|a, b| compare(sort, a, b));
}
