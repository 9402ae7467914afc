use crate::types::PostId;

/// Error returned by collaborator adapters: post stores, like stores and caches.
#[derive(thiserror::Error, Debug)]
pub enum StoreError {
    /// The post is absent or soft-deleted.
    #[error("post {0} not found")]
    NotFound(PostId),
    /// Sql error
    #[cfg(feature = "postgres")]
    #[error(transparent)]
    Sqlx(#[from] sqlx::Error),
    /// Serialization/deserialization error
    #[error(transparent)]
    Json(#[from] serde_json::Error),
    /// Any other adapter failure.
    #[error(transparent)]
    Custom(Box<dyn std::error::Error + Send + Sync>),
}

impl StoreError {
    pub fn is_not_found(&self) -> bool {
        matches!(self, Self::NotFound(_))
    }
}

/// Closed set of outcome categories. Callers (an HTTP layer, for instance) branch on this
/// instead of on error messages.
#[derive(Clone, Copy, Debug, Eq, PartialEq, Hash)]
pub enum ErrorKind {
    NotFound,
    Forbidden,
    Conflict,
    InvalidInput,
    Unavailable,
}

/// Error returned by [`crate::manager::PostManager`] operations.
///
/// `NotFound`, `Forbidden`, `AlreadyLiked`, `NotLiked` and `InvalidInput` are expected business
/// outcomes. `Unavailable` wraps a collaborator failure and is never retried here.
#[derive(thiserror::Error, Debug)]
pub enum PostError {
    #[error("post not found")]
    NotFound,
    #[error("forbidden")]
    Forbidden,
    #[error("already liked")]
    AlreadyLiked,
    #[error("not liked")]
    NotLiked,
    #[error("invalid input: {0}")]
    InvalidInput(String),
    #[error("service unavailable: {0}")]
    Unavailable(#[source] StoreError),
}

impl PostError {
    pub fn kind(&self) -> ErrorKind {
        match self {
            Self::NotFound => ErrorKind::NotFound,
            Self::Forbidden => ErrorKind::Forbidden,
            Self::AlreadyLiked | Self::NotLiked => ErrorKind::Conflict,
            Self::InvalidInput(_) => ErrorKind::InvalidInput,
            Self::Unavailable(_) => ErrorKind::Unavailable,
        }
    }

    pub(crate) fn invalid(message: impl Into<String>) -> Self {
        Self::InvalidInput(message.into())
    }
}

impl From<StoreError> for PostError {
    fn from(error: StoreError) -> Self {
        match error {
            StoreError::NotFound(_) => Self::NotFound,
            other => Self::Unavailable(other),
        }
    }
}
