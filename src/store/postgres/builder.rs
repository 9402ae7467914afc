use std::sync::Arc;

use sqlx::postgres::PgQueryResult;
use sqlx::{Pool, Postgres, Transaction};

use super::{InnerPgPostStore, PgPostStore, Statements};

pub const DEFAULT_POSTS_TABLE: &str = "posts";
pub const DEFAULT_LIKES_TABLE: &str = "post_likes";

/// Struct used to build a brand new [`PgPostStore`].
pub struct PgPostStoreBuilder {
    pool: Pool<Postgres>,
    posts_table: String,
    likes_table: String,
    run_migrations: bool,
}

impl PgPostStoreBuilder {
    /// Creates a new instance of a [`PgPostStoreBuilder`].
    pub fn new(pool: Pool<Postgres>) -> Self {
        Self {
            pool,
            posts_table: DEFAULT_POSTS_TABLE.to_string(),
            likes_table: DEFAULT_LIKES_TABLE.to_string(),
            run_migrations: true,
        }
    }

    /// Overrides the posts and like rows table names.
    pub fn with_tables(mut self, posts: impl Into<String>, likes: impl Into<String>) -> Self {
        self.posts_table = posts.into();
        self.likes_table = likes.into();
        self
    }

    /// Calling this function the caller avoid running migrations. It is recommend to run migrations
    /// at least once per store per startup.
    pub fn without_running_migrations(mut self) -> Self {
        self.run_migrations = false;
        self
    }

    /// Runs the table and index migrations, atomically, unless `run_migrations` is explicitly set
    /// to false, and returns the store.
    ///
    /// # Errors
    ///
    /// Will return an `Err` if there's an error running the migrations.
    pub async fn try_build(self) -> Result<PgPostStore, sqlx::Error> {
        let statements = Statements::new(&self.posts_table, &self.likes_table);

        if self.run_migrations {
            let mut transaction: Transaction<Postgres> = self.pool.begin().await?;
            for migration in statements.migrations() {
                let _: PgQueryResult = sqlx::query(migration).execute(&mut *transaction).await?;
            }
            transaction.commit().await?;
        }

        Ok(PgPostStore {
            inner: Arc::new(InnerPgPostStore {
                pool: self.pool,
                statements,
            }),
        })
    }
}
