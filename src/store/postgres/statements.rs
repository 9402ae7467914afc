use crate::post::Counter;
use crate::ranking::SortMode;

const POST_COLUMNS: &str = "id, title, content, author_id, author_username, author_avatar_url, \
    tags, views, likes_count, comments_count, created_at, updated_at, deleted_at";

/// Text search configuration used both by the generated `search_vector` column and by queries.
const TEXT_SEARCH_CONFIG: &str = "russian";

/// Every SQL statement issued by [`super::PgPostStore`], rendered once for the configured table
/// names.
#[derive(Clone, Debug)]
pub struct Statements {
    posts_table: String,
    likes_table: String,
    create_posts_table: String,
    create_search_index: String,
    create_author_index: String,
    create_likes_table: String,
    insert: String,
    select_by_id: String,
    update: String,
    soft_delete: String,
    increment_views: String,
    increment_likes: String,
    increment_comments: String,
    update_author: String,
    list_new: String,
    list_hot: String,
    list_top: String,
    search: String,
    has_like: String,
    likes_among: String,
    insert_like: String,
    delete_like: String,
}

impl Statements {
    pub fn new(posts: &str, likes: &str) -> Self {
        Self {
            posts_table: posts.to_string(),
            likes_table: likes.to_string(),
            create_posts_table: format!(
                "
    CREATE TABLE IF NOT EXISTS {posts}
    (
      id BIGSERIAL PRIMARY KEY,
      title TEXT NOT NULL,
      content TEXT NOT NULL,
      author_id BIGINT NOT NULL,
      author_username TEXT NOT NULL DEFAULT '',
      author_avatar_url TEXT NOT NULL DEFAULT '',
      tags TEXT[] NOT NULL DEFAULT ARRAY[]::TEXT[],
      views BIGINT NOT NULL DEFAULT 0 CHECK (views >= 0),
      likes_count BIGINT NOT NULL DEFAULT 0 CHECK (likes_count >= 0),
      comments_count BIGINT NOT NULL DEFAULT 0 CHECK (comments_count >= 0),
      created_at TIMESTAMPTZ NOT NULL DEFAULT NOW(),
      updated_at TIMESTAMPTZ NOT NULL DEFAULT NOW(),
      deleted_at TIMESTAMPTZ,
      search_vector TSVECTOR GENERATED ALWAYS AS
        (to_tsvector('{TEXT_SEARCH_CONFIG}'::regconfig, title || ' ' || content)) STORED
    )
    "
            ),
            create_search_index: format!(
                "CREATE INDEX IF NOT EXISTS {posts}_search_vector ON {posts} USING gin (search_vector)"
            ),
            create_author_index: format!("CREATE INDEX IF NOT EXISTS {posts}_author_id ON {posts} (author_id)"),
            create_likes_table: format!(
                "
    CREATE TABLE IF NOT EXISTS {likes}
    (
      post_id BIGINT NOT NULL,
      user_id BIGINT NOT NULL,
      created_at TIMESTAMPTZ NOT NULL DEFAULT NOW(),
      CONSTRAINT {likes}_pkey PRIMARY KEY (post_id, user_id)
    )
    "
            ),
            insert: format!(
                "
    INSERT INTO {posts}
    (title, content, author_id, author_username, author_avatar_url, tags)
    VALUES ($1, $2, $3, $4, $5, $6)
    RETURNING {POST_COLUMNS}
    "
            ),
            select_by_id: format!("SELECT {POST_COLUMNS} FROM {posts} WHERE id = $1 AND deleted_at IS NULL"),
            update: format!(
                "
    UPDATE {posts}
    SET title = COALESCE($2, title),
        content = COALESCE($3, content),
        tags = COALESCE($4, tags),
        updated_at = NOW()
    WHERE id = $1 AND deleted_at IS NULL
    RETURNING {POST_COLUMNS}
    "
            ),
            soft_delete: format!(
                "UPDATE {posts} SET deleted_at = NOW(), updated_at = NOW() WHERE id = $1 AND deleted_at IS NULL"
            ),
            increment_views: increment_statement(posts, Counter::Views),
            increment_likes: increment_statement(posts, Counter::Likes),
            increment_comments: increment_statement(posts, Counter::Comments),
            update_author: format!(
                "UPDATE {posts} SET author_username = $2, author_avatar_url = $3, updated_at = NOW() \
                 WHERE author_id = $1"
            ),
            list_new: list_statement(posts, SortMode::New),
            list_hot: list_statement(posts, SortMode::Hot),
            list_top: list_statement(posts, SortMode::Top),
            search: format!(
                "
    SELECT {POST_COLUMNS} FROM {posts}
    WHERE deleted_at IS NULL
      AND search_vector @@ plainto_tsquery('{TEXT_SEARCH_CONFIG}', $1)
    ORDER BY ts_rank(search_vector, plainto_tsquery('{TEXT_SEARCH_CONFIG}', $1)) DESC, created_at DESC, id DESC
    LIMIT $2 OFFSET $3
    "
            ),
            has_like: format!("SELECT EXISTS(SELECT 1 FROM {likes} WHERE post_id = $1 AND user_id = $2)"),
            likes_among: format!("SELECT post_id FROM {likes} WHERE user_id = $1 AND post_id = ANY($2)"),
            insert_like: format!("INSERT INTO {likes} (post_id, user_id) VALUES ($1, $2) ON CONFLICT DO NOTHING"),
            delete_like: format!("DELETE FROM {likes} WHERE post_id = $1 AND user_id = $2"),
        }
    }

    pub fn posts_table(&self) -> &str {
        &self.posts_table
    }

    pub fn likes_table(&self) -> &str {
        &self.likes_table
    }

    pub fn migrations(&self) -> [&str; 4] {
        [
            &self.create_posts_table,
            &self.create_search_index,
            &self.create_author_index,
            &self.create_likes_table,
        ]
    }

    pub fn insert(&self) -> &str {
        &self.insert
    }

    pub fn select_by_id(&self) -> &str {
        &self.select_by_id
    }

    pub fn update(&self) -> &str {
        &self.update
    }

    pub fn soft_delete(&self) -> &str {
        &self.soft_delete
    }

    pub fn increment(&self, counter: Counter) -> &str {
        match counter {
            Counter::Views => &self.increment_views,
            Counter::Likes => &self.increment_likes,
            Counter::Comments => &self.increment_comments,
        }
    }

    pub fn update_author(&self) -> &str {
        &self.update_author
    }

    pub fn list(&self, sort: SortMode) -> &str {
        match sort {
            SortMode::New => &self.list_new,
            SortMode::Hot => &self.list_hot,
            SortMode::Top => &self.list_top,
        }
    }

    pub fn search(&self) -> &str {
        &self.search
    }

    pub fn has_like(&self) -> &str {
        &self.has_like
    }

    pub fn likes_among(&self) -> &str {
        &self.likes_among
    }

    pub fn insert_like(&self) -> &str {
        &self.insert_like
    }

    pub fn delete_like(&self) -> &str {
        &self.delete_like
    }
}

fn counter_column(counter: Counter) -> &'static str {
    match counter {
        Counter::Views => "views",
        Counter::Likes => "likes_count",
        Counter::Comments => "comments_count",
    }
}

fn increment_statement(posts: &str, counter: Counter) -> String {
    let column = counter_column(counter);
    format!("UPDATE {posts} SET {column} = GREATEST({column} + $2, 0) WHERE id = $1 AND deleted_at IS NULL")
}

// Must agree with `crate::ranking::compare`.
fn order_by(sort: SortMode) -> &'static str {
    match sort {
        SortMode::New => "created_at DESC, id DESC",
        SortMode::Top => "likes_count DESC, created_at DESC, id DESC",
        SortMode::Hot => {
            "(likes_count::float8 * 0.8 + comments_count::float8 * 0.5 + ln(views::float8 + 1)) DESC, \
             created_at DESC, id DESC"
        }
    }
}

fn list_statement(posts: &str, sort: SortMode) -> String {
    let order_by = order_by(sort);
    format!(
        "
    SELECT {POST_COLUMNS} FROM {posts}
    WHERE deleted_at IS NULL
      AND ($1::TEXT IS NULL OR author_username = $1)
      AND ($2::TEXT IS NULL OR $2 = ANY(tags))
    ORDER BY {order_by}
    LIMIT $3 OFFSET $4
    "
    )
}
