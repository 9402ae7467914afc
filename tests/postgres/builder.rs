use sqlx::{Pool, Postgres};

use post_engagement::store::postgres::{PgPostStore, PgPostStoreBuilder, DEFAULT_LIKES_TABLE, DEFAULT_POSTS_TABLE};

#[sqlx::test]
async fn builder_can_skip_migrations_test(pool: Pool<Postgres>) {
    let store: PgPostStore = PgPostStoreBuilder::new(pool.clone())
        .with_tables("skipped_posts", "skipped_likes")
        .without_running_migrations()
        .try_build()
        .await
        .unwrap();

    assert!(!table_exists(store.posts_table(), &pool).await);
    assert!(!table_exists(store.likes_table(), &pool).await);
}

#[sqlx::test]
async fn builder_run_migrations_test(pool: Pool<Postgres>) {
    assert!(!table_exists(DEFAULT_POSTS_TABLE, &pool).await);

    let _: PgPostStore = PgPostStoreBuilder::new(pool.clone()).try_build().await.unwrap();
    assert!(table_exists(DEFAULT_POSTS_TABLE, &pool).await);
    assert!(table_exists(DEFAULT_LIKES_TABLE, &pool).await);

    // Migrations are idempotent.
    let _: PgPostStore = PgPostStoreBuilder::new(pool.clone()).try_build().await.unwrap();
}

pub async fn table_exists(table_name: &str, pool: &Pool<Postgres>) -> bool {
    !sqlx::query("SELECT table_name FROM information_schema.columns WHERE table_name = $1")
        .bind(table_name)
        .fetch_all(pool)
        .await
        .unwrap()
        .is_empty()
}
