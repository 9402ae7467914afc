use std::time::Duration;

use tokio_util::sync::CancellationToken;

use post_engagement::relay::{
    Consumer, CounterProjector, FactMessage, MemoryFactSource, RelayConfig, COMMENT_EVENTS, PROFILE_EVENTS,
};
use post_engagement::store::PostStore;

use crate::common::{author, Fixture, CONTENT};

fn comment(kind: &str, post_id: i64) -> FactMessage {
    FactMessage::new(COMMENT_EVENTS, format!(r#"{{"event":"{kind}","post_id":{post_id}}}"#))
}

fn projecting(source: MemoryFactSource, fixture: &Fixture) -> Consumer<MemoryFactSource> {
    Consumer::new(source, RelayConfig::default()).with_handler(CounterProjector::new(fixture.store.clone()))
}

#[tokio::test]
async fn consumer_applies_comment_and_profile_facts_test() {
    let fixture = Fixture::new();
    let post = fixture.manager.create(author(1), "Title", CONTENT, vec![]).await.unwrap();

    let (sender, source) = MemoryFactSource::channel(16);
    let consumer = projecting(source, &fixture);

    sender.send(comment("CommentCreated", post.id)).await.unwrap();
    sender.send(comment("CommentCreated", post.id)).await.unwrap();
    sender.send(comment("CommentDeleted", post.id)).await.unwrap();
    sender
        .send(FactMessage::new(
            PROFILE_EVENTS,
            r#"{"event":"ProfileUpdated","user_id":1,"username":"renamed","avatar_url":"https://new.png"}"#,
        ))
        .await
        .unwrap();
    drop(sender);

    consumer.run(CancellationToken::new()).await.unwrap();

    let stored = fixture.store.fetch(post.id).await.unwrap();
    assert_eq!(stored.comments, 1);
    assert_eq!(stored.author_username, "renamed");
    assert_eq!(stored.author_avatar_url, "https://new.png");
}

#[tokio::test]
async fn replayed_comment_deletions_clamp_at_zero_test() {
    let fixture = Fixture::new();
    let post = fixture.manager.create(author(1), "Title", CONTENT, vec![]).await.unwrap();

    let (sender, source) = MemoryFactSource::channel(16);
    let consumer = projecting(source, &fixture);

    for _ in 0..3 {
        sender.send(comment("CommentDeleted", post.id)).await.unwrap();
    }
    sender.send(comment("CommentCreated", post.id)).await.unwrap();
    drop(sender);

    consumer.run(CancellationToken::new()).await.unwrap();

    assert_eq!(fixture.store.fetch(post.id).await.unwrap().comments, 1);
}

#[tokio::test]
async fn malformed_and_orphan_facts_do_not_stop_the_consumer_test() {
    let fixture = Fixture::new();
    let post = fixture.manager.create(author(1), "Title", CONTENT, vec![]).await.unwrap();
    let deleted = fixture.manager.create(author(1), "Gone", CONTENT, vec![]).await.unwrap();
    fixture.manager.delete(deleted.id, 1).await.unwrap();

    let (sender, source) = MemoryFactSource::channel(16);
    let consumer = projecting(source, &fixture);

    sender.send(FactMessage::new(COMMENT_EVENTS, "{not json")).await.unwrap();
    sender.send(comment("CommentCreated", 0)).await.unwrap();
    sender.send(comment("CommentEdited", post.id)).await.unwrap();
    sender.send(comment("CommentCreated", deleted.id)).await.unwrap();
    sender.send(comment("CommentCreated", post.id)).await.unwrap();
    drop(sender);

    consumer.run(CancellationToken::new()).await.unwrap();

    assert_eq!(fixture.store.fetch(post.id).await.unwrap().comments, 1);
    assert_eq!(fixture.store.raw(deleted.id).await.unwrap().comments, 0);
}

#[tokio::test]
async fn cancelled_consumer_stops_applying_facts_test() {
    let fixture = Fixture::new();
    let post = fixture.manager.create(author(1), "Title", CONTENT, vec![]).await.unwrap();

    let (sender, source) = MemoryFactSource::channel(16);
    let consumer = projecting(source, &fixture);
    let cancel = CancellationToken::new();

    let handle = tokio::spawn({
        let cancel = cancel.clone();
        async move { consumer.run(cancel).await }
    });

    sender.send(comment("CommentCreated", post.id)).await.unwrap();
    tokio::time::timeout(Duration::from_secs(1), async {
        while fixture.store.fetch(post.id).await.unwrap().comments == 0 {
            tokio::task::yield_now().await;
        }
    })
    .await
    .unwrap();

    cancel.cancel();
    tokio::time::timeout(Duration::from_secs(1), handle)
        .await
        .unwrap()
        .unwrap()
        .unwrap();

    assert!(sender.send(comment("CommentCreated", post.id)).await.is_err());
    assert_eq!(fixture.store.fetch(post.id).await.unwrap().comments, 1);
}
