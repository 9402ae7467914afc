use std::time::Duration;

use rdkafka::consumer::{Consumer, StreamConsumer};
use rdkafka::message::{Headers, Message};
use rdkafka::ClientConfig;

use post_engagement::bus::kafka::{KafkaEventBus, KafkaEventBusConfig, EVENT_HEADER};
use post_engagement::bus::EventBus;
use post_engagement::PostFact;

#[tokio::test]
async fn kafka_event_bus_test() {
    let brokers: String = std::env::var("KAFKA_BROKERS_URL").unwrap();
    let topic: String = format!("post_events_{}", rand::random::<u32>());

    let config: KafkaEventBusConfig = KafkaEventBusConfig::builder()
        .brokers(brokers.as_str())
        .topic(topic.as_str())
        .error_handler(Box::new(|error| panic!("{:?}", error)))
        .build();
    let bus: KafkaEventBus = KafkaEventBus::new(config).unwrap();

    let fact = PostFact::PostUnliked { post_id: 42, user_id: 7 };
    bus.publish(&fact).await;

    let consumer: StreamConsumer = ClientConfig::new()
        .set("bootstrap.servers", brokers.as_str())
        .set("group.id", topic.as_str())
        .set("auto.offset.reset", "earliest")
        .create()
        .unwrap();
    consumer.subscribe(&[topic.as_str()]).unwrap();

    let message = tokio::time::timeout(Duration::from_secs(30), consumer.recv())
        .await
        .unwrap()
        .unwrap();

    assert_eq!(message.key(), Some("42".as_bytes()));
    assert_eq!(serde_json::from_slice::<PostFact>(message.payload().unwrap()).unwrap(), fact);

    let header = message.headers().unwrap().get(0);
    assert_eq!(header.key, EVENT_HEADER);
    assert_eq!(header.value, Some("PostUnliked".as_bytes()));
}
