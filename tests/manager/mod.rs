use std::sync::Arc;

use rand::Rng;

use post_engagement::cache::{post_key, viewed_key, Cache};
use post_engagement::store::PostStore;
use post_engagement::{ErrorKind, ListQuery, Page, PostError, PostFact, PostPatch, SortMode};

use crate::common::{author, Fixture, CONTENT};

#[tokio::test]
async fn like_unlike_end_to_end_test() {
    let fixture = Fixture::new();
    let (author_id, user_b) = (1, 2);

    let post = fixture
        .manager
        .create(author(author_id), "T", "ten-plus chars", vec![])
        .await
        .unwrap();

    let view = fixture.manager.get(post.id, None).await.unwrap();
    assert_eq!(view.post.id, post.id);
    assert!(!view.is_liked_by_me);

    fixture.manager.like(post.id, user_b).await.unwrap();
    assert_eq!(fixture.store.fetch(post.id).await.unwrap().likes, 1);
    assert!(fixture.manager.get(post.id, Some(user_b)).await.unwrap().is_liked_by_me);

    let error = fixture.manager.like(post.id, user_b).await.unwrap_err();
    assert!(matches!(error, PostError::AlreadyLiked));
    assert_eq!(error.kind(), ErrorKind::Conflict);
    assert_eq!(fixture.store.fetch(post.id).await.unwrap().likes, 1);

    fixture.manager.unlike(post.id, user_b).await.unwrap();
    assert_eq!(fixture.store.fetch(post.id).await.unwrap().likes, 0);

    let error = fixture.manager.unlike(post.id, user_b).await.unwrap_err();
    assert!(matches!(error, PostError::NotLiked));
    assert_eq!(error.kind(), ErrorKind::Conflict);

    assert_eq!(
        fixture.bus.published(),
        vec![
            PostFact::PostCreated {
                post_id: post.id,
                author_id,
                title: "T".to_string(),
            },
            PostFact::PostLiked {
                post_id: post.id,
                user_id: user_b,
            },
            PostFact::PostUnliked {
                post_id: post.id,
                user_id: user_b,
            },
        ]
    );
}

#[tokio::test]
async fn likes_counter_tracks_the_ledger_test() {
    let fixture = Fixture::new();
    let post = fixture.manager.create(author(1), "Title", CONTENT, vec![]).await.unwrap();
    let mut rng = rand::thread_rng();

    for _ in 0..200 {
        let user_id: i64 = rng.gen_range(10..20);
        if rng.gen_bool(0.5) {
            let _ = fixture.manager.like(post.id, user_id).await;
        } else {
            let _ = fixture.manager.unlike(post.id, user_id).await;
        }

        let likes = fixture.store.fetch(post.id).await.unwrap().likes;
        assert!(likes >= 0);
        assert_eq!(likes as usize, fixture.store.like_count().await);
    }
}

#[tokio::test]
async fn non_author_cannot_update_or_delete_test() {
    let fixture = Fixture::new();
    let post = fixture.manager.create(author(1), "Title", CONTENT, vec![]).await.unwrap();

    let patch = PostPatch {
        title: Some("Hijacked".to_string()),
        ..PostPatch::default()
    };
    let error = fixture.manager.update(post.id, 2, patch).await.unwrap_err();
    assert_eq!(error.kind(), ErrorKind::Forbidden);

    let error = fixture.manager.delete(post.id, 2).await.unwrap_err();
    assert_eq!(error.kind(), ErrorKind::Forbidden);

    let stored = fixture.store.fetch(post.id).await.unwrap();
    assert_eq!(stored, post);
    assert_eq!(fixture.bus.published().len(), 1);
}

#[tokio::test]
async fn partial_update_keeps_omitted_fields_test() {
    let fixture = Fixture::new();
    let post = fixture
        .manager
        .create(author(1), "Title", CONTENT, vec!["rust".to_string()])
        .await
        .unwrap();
    fixture
        .cache
        .set_if_absent(&post_key(post.id), std::time::Duration::from_secs(60))
        .await
        .unwrap();

    let patch = PostPatch {
        content: Some("Rewritten content, still long".to_string()),
        ..PostPatch::default()
    };
    let updated = fixture.manager.update(post.id, 1, patch).await.unwrap();

    assert_eq!(updated.title, "Title");
    assert_eq!(updated.tags, vec!["rust".to_string()]);
    assert_eq!(updated.content, "Rewritten content, still long");
    assert!(updated.updated_at >= post.updated_at);
    assert_eq!(updated.created_at, post.created_at);
    assert!(!fixture.cache.contains(&post_key(post.id)).await);
}

#[tokio::test]
async fn soft_deleted_post_is_hidden_from_every_read_test() {
    let fixture = Fixture::new();
    let kept = fixture
        .manager
        .create(author(1), "Kept searchable", CONTENT, vec![])
        .await
        .unwrap();
    let deleted = fixture
        .manager
        .create(author(1), "Deleted searchable", CONTENT, vec![])
        .await
        .unwrap();

    fixture.manager.delete(deleted.id, 1).await.unwrap();

    assert!(matches!(
        fixture.manager.get(deleted.id, None).await,
        Err(PostError::NotFound)
    ));

    let listed = fixture.manager.list(&ListQuery::default(), None).await.unwrap();
    assert_eq!(listed.iter().map(|view| view.post.id).collect::<Vec<_>>(), vec![kept.id]);

    let found = fixture.manager.search("searchable", Page::default(), None).await.unwrap();
    assert_eq!(found.iter().map(|view| view.post.id).collect::<Vec<_>>(), vec![kept.id]);

    assert!(fixture.store.raw(deleted.id).await.is_some());
    assert!(matches!(
        fixture.manager.delete(deleted.id, 1).await,
        Err(PostError::NotFound)
    ));
}

#[tokio::test]
async fn views_are_counted_once_per_user_test() {
    let fixture = Fixture::new();
    let post = fixture.manager.create(author(1), "Title", CONTENT, vec![]).await.unwrap();

    assert!(fixture.manager.increment_view(post.id, 7).await.unwrap());
    assert!(!fixture.manager.increment_view(post.id, 7).await.unwrap());
    assert!(fixture.manager.increment_view(post.id, 8).await.unwrap());

    assert_eq!(fixture.store.fetch(post.id).await.unwrap().views, 2);
    assert!(fixture.cache.contains(&viewed_key(post.id, 7)).await);
}

#[tokio::test]
async fn list_attaches_liked_flags_for_the_viewer_test() {
    let fixture = Fixture::new();
    let first = fixture.manager.create(author(1), "First", CONTENT, vec![]).await.unwrap();
    let second = fixture.manager.create(author(1), "Second", CONTENT, vec![]).await.unwrap();
    fixture.manager.like(first.id, 5).await.unwrap();

    let query = ListQuery::sorted(SortMode::Top);
    let views = fixture.manager.list(&query, Some(5)).await.unwrap();
    let flags: Vec<(i64, bool)> = views.iter().map(|view| (view.post.id, view.is_liked_by_me)).collect();
    assert_eq!(flags, vec![(first.id, true), (second.id, false)]);

    let anonymous = fixture.manager.list(&query, None).await.unwrap();
    assert!(anonymous.iter().all(|view| !view.is_liked_by_me));
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn concurrent_likes_from_distinct_users_commute_test() {
    let fixture = Fixture::new();
    let post = fixture.manager.create(author(1), "Title", CONTENT, vec![]).await.unwrap();
    let manager = Arc::new(fixture.manager);

    let handles: Vec<_> = (100..150)
        .map(|user_id| {
            let manager = manager.clone();
            tokio::spawn(async move { manager.like(post.id, user_id).await })
        })
        .collect();

    for result in futures::future::join_all(handles).await {
        result.unwrap().unwrap();
    }

    assert_eq!(fixture.store.fetch(post.id).await.unwrap().likes, 50);
    assert_eq!(fixture.store.like_count().await, 50);
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn racing_duplicate_likes_count_once_test() {
    let fixture = Fixture::new();
    let post = fixture.manager.create(author(1), "Title", CONTENT, vec![]).await.unwrap();
    let manager = Arc::new(fixture.manager);

    let handles: Vec<_> = (0..20)
        .map(|_| {
            let manager = manager.clone();
            tokio::spawn(async move { manager.like(post.id, 7).await })
        })
        .collect();

    let mut accepted = 0;
    for result in futures::future::join_all(handles).await {
        match result.unwrap() {
            Ok(()) => accepted += 1,
            Err(error) => assert_eq!(error.kind(), ErrorKind::Conflict),
        }
    }

    assert_eq!(accepted, 1);
    assert_eq!(fixture.store.fetch(post.id).await.unwrap().likes, 1);
    assert_eq!(fixture.store.like_count().await, 1);
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn concurrent_views_from_distinct_users_are_all_counted_test() {
    let fixture = Fixture::new();
    let post = fixture.manager.create(author(1), "Title", CONTENT, vec![]).await.unwrap();
    let manager = Arc::new(fixture.manager);

    let handles: Vec<_> = (100..150)
        .map(|user_id| {
            let manager = manager.clone();
            tokio::spawn(async move { manager.increment_view(post.id, user_id).await })
        })
        .collect();

    for result in futures::future::join_all(handles).await {
        assert!(result.unwrap().unwrap());
    }

    assert_eq!(fixture.store.fetch(post.id).await.unwrap().views, 50);
}
