use crate::error::PostError;
use crate::ranking::SortMode;

pub const DEFAULT_LIMIT: i64 = 20;
pub const MAX_LIMIT: i64 = 100;

/// Limit/offset window over a result set.
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub struct Page {
    limit: i64,
    offset: i64,
}

impl Page {
    /// # Errors
    ///
    /// Will return [`PostError::InvalidInput`] if `limit` is outside `1..=100` or `offset` is
    /// negative.
    pub fn new(limit: i64, offset: i64) -> Result<Self, PostError> {
        if !(1..=MAX_LIMIT).contains(&limit) {
            return Err(PostError::invalid(format!("limit must be 1..={MAX_LIMIT}, got {limit}")));
        }
        if offset < 0 {
            return Err(PostError::invalid(format!("offset must not be negative, got {offset}")));
        }
        Ok(Self { limit, offset })
    }

    pub fn limit(&self) -> i64 {
        self.limit
    }

    pub fn offset(&self) -> i64 {
        self.offset
    }
}

impl Default for Page {
    fn default() -> Self {
        Self {
            limit: DEFAULT_LIMIT,
            offset: 0,
        }
    }
}

/// Filters, ordering and window of a post listing.
#[derive(Clone, Debug, Default, Eq, PartialEq)]
pub struct ListQuery {
    pub sort: SortMode,
    /// Only posts whose author currently has this username.
    pub author: Option<String>,
    /// Only posts carrying this tag.
    pub tag: Option<String>,
    pub page: Page,
}

impl ListQuery {
    pub fn sorted(sort: SortMode) -> Self {
        Self {
            sort,
            ..Self::default()
        }
    }

    pub fn with_author(mut self, author: impl Into<String>) -> Self {
        self.author = Some(author.into());
        self
    }

    pub fn with_tag(mut self, tag: impl Into<String>) -> Self {
        self.tag = Some(tag.into());
        self
    }

    pub fn with_page(mut self, page: Page) -> Self {
        self.page = page;
        self
    }
}
