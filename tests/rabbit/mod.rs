use std::sync::Arc;
use std::time::Duration;

use futures::TryStreamExt;
use lapin::options::{BasicConsumeOptions, BasicPublishOptions, QueueBindOptions, QueueDeclareOptions};
use lapin::types::FieldTable;
use lapin::{BasicProperties, Connection, ConnectionProperties, Consumer as LapinConsumer, ExchangeKind};
use tokio_util::sync::CancellationToken;

use post_engagement::bus::rabbit::{RabbitEventBus, RabbitEventBusConfig, RabbitFactSource, RabbitFactSourceConfig};
use post_engagement::bus::EventBus;
use post_engagement::relay::{Consumer, CounterProjector, FactSource, FactSubscription, RelayConfig};
use post_engagement::store::memory::MemoryStore;
use post_engagement::store::PostStore;
use post_engagement::{NewPost, PostFact};

use crate::common::{author, CONTENT};

fn unique(prefix: &str) -> String {
    format!("{prefix}_{}", rand::random::<u32>())
}

#[tokio::test]
async fn rabbit_event_bus_test() {
    let rabbit_url: String = std::env::var("RABBIT_URL").unwrap();
    let exchange: String = unique("post_facts");
    let queue: String = unique("post_facts_queue");

    let config: RabbitEventBusConfig = RabbitEventBusConfig::builder()
        .url(rabbit_url.as_str())
        .exchange(exchange.as_str())
        .exchange_kind(ExchangeKind::Fanout)
        .error_handler(Box::new(|error| panic!("{:?}", error)))
        .build();
    let bus: RabbitEventBus = RabbitEventBus::new(config).await.unwrap();

    let mut consumer: LapinConsumer = consumer(rabbit_url.as_str(), exchange.as_str(), queue.as_str()).await;

    let fact = PostFact::PostLiked { post_id: 3, user_id: 4 };
    bus.publish(&fact).await;

    let delivery = tokio::time::timeout(Duration::from_secs(10), consumer.try_next())
        .await
        .unwrap()
        .unwrap()
        .unwrap();

    assert_eq!(serde_json::from_slice::<PostFact>(&delivery.data).unwrap(), fact);
    assert_eq!(delivery.routing_key.as_str(), "post_events");
    assert!(delivery.properties.message_id().is_some());
}

#[tokio::test]
async fn rabbit_fact_source_feeds_the_consumer_test() {
    let rabbit_url: String = std::env::var("RABBIT_URL").unwrap();
    let channel_name: String = unique("comment_events");

    let store = Arc::new(MemoryStore::new());
    let post = store
        .create(NewPost::new(author(1), "Title", CONTENT, vec![]))
        .await
        .unwrap();

    let queue: String = unique("post_service_facts");
    let source = RabbitFactSource::new(
        RabbitFactSourceConfig::builder()
            .url(rabbit_url.as_str())
            .queue(queue.as_str())
            .channels(vec![channel_name.clone()])
            .build(),
    );
    // Declares the exchange and binds the queue before anything is published.
    source.subscribe().await.unwrap().close().await;

    let consumer = Consumer::new(source, RelayConfig::default()).with_handler(CounterProjector::new(store.clone()));
    let cancel = CancellationToken::new();
    let handle = tokio::spawn({
        let cancel = cancel.clone();
        async move { consumer.run(cancel).await }
    });

    let connection = Connection::connect(&rabbit_url, ConnectionProperties::default())
        .await
        .unwrap();
    let channel = connection.create_channel().await.unwrap();
    let payload = format!(r#"{{"event":"CommentCreated","post_id":{}}}"#, post.id);
    channel
        .basic_publish(
            channel_name.as_str(),
            "",
            BasicPublishOptions::default(),
            payload.as_bytes(),
            BasicProperties::default(),
        )
        .await
        .unwrap();

    tokio::time::timeout(Duration::from_secs(10), async {
        while store.fetch(post.id).await.unwrap().comments == 0 {
            tokio::time::sleep(Duration::from_millis(50)).await;
        }
    })
    .await
    .unwrap();

    cancel.cancel();
    handle.await.unwrap().unwrap();
}

async fn consumer(url: &str, exchange: &str, queue: &str) -> LapinConsumer {
    let conn = Connection::connect(url, ConnectionProperties::default()).await.unwrap();
    let channel = conn.create_channel().await.unwrap();

    channel
        .queue_declare(queue, QueueDeclareOptions::default(), FieldTable::default())
        .await
        .unwrap();

    channel
        .queue_bind(queue, exchange, "", QueueBindOptions::default(), FieldTable::default())
        .await
        .unwrap();

    channel
        .basic_consume(queue, "test_consumer", BasicConsumeOptions::default(), FieldTable::default())
        .await
        .unwrap()
}
