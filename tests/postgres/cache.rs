use std::time::Duration;

use sqlx::{Pool, Postgres};

use post_engagement::cache::{Cache, PgCache, PgCacheBuilder};

#[sqlx::test]
async fn set_if_absent_acquires_once_test(pool: Pool<Postgres>) {
    let cache: PgCache = PgCacheBuilder::new(pool).try_build().await.unwrap();
    let ttl = Duration::from_secs(60);

    assert!(cache.set_if_absent("post:1:viewed_by:2", ttl).await.unwrap());
    assert!(!cache.set_if_absent("post:1:viewed_by:2", ttl).await.unwrap());
    assert!(cache.set_if_absent("post:1:viewed_by:3", ttl).await.unwrap());
}

#[sqlx::test]
async fn expired_entries_are_reacquired_test(pool: Pool<Postgres>) {
    let cache: PgCache = PgCacheBuilder::new(pool).try_build().await.unwrap();

    assert!(cache.set_if_absent("k", Duration::from_millis(1)).await.unwrap());
    tokio::time::sleep(Duration::from_millis(20)).await;

    assert!(cache.set_if_absent("k", Duration::from_secs(60)).await.unwrap());
    assert!(!cache.set_if_absent("k", Duration::from_secs(60)).await.unwrap());
}

#[sqlx::test]
async fn delete_and_purge_test(pool: Pool<Postgres>) {
    let cache: PgCache = PgCacheBuilder::new(pool).try_build().await.unwrap();

    cache.set_if_absent("post:1", Duration::from_secs(60)).await.unwrap();
    cache.delete("post:1").await.unwrap();
    cache.delete("post:1").await.unwrap();
    assert!(cache.set_if_absent("post:1", Duration::from_secs(60)).await.unwrap());

    cache.set_if_absent("short", Duration::from_millis(1)).await.unwrap();
    tokio::time::sleep(Duration::from_millis(20)).await;
    assert_eq!(cache.purge_expired().await.unwrap(), 1);
}
