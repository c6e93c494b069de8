use crate::{
    publish::{MockPublisher, Producer, Publisher},
    tests::{assert_error, capture_events, topic_warnings, SPEC},
    Error, HeaderInjector, OutgoingMessage, PayloadError, Topic,
};

use futures_util::stream::{self, StreamExt};
use uuid::Uuid;

fn producer() -> (Producer<MockPublisher>, MockPublisher) {
    let publisher = MockPublisher::new();
    let injector = HeaderInjector::from_slice(SPEC.as_bytes()).expect("valid spec");
    (Producer::new(injector, publisher.clone()), publisher)
}

#[tokio::test]
async fn publishes_payload_with_resolved_headers() {
    let (producer, publisher) = producer();
    let payload = r#"{"userId": "7", "email": "seven@example.com"}"#;
    let published = producer
        .publish_json("user.created", payload)
        .await
        .expect("published");

    publisher.assert_message_published("user.created", &published.id);
    assert_eq!(publisher.len(), 1);
    assert_eq!(published.headers.get("x-id"), Some("7"));
    assert_eq!(published.headers.get("x-source"), Some("user-service"));
    assert!(Uuid::parse_str(published.headers.get("x-trace").expect("x-trace")).is_ok());

    let (topic, message) = publisher.messages().remove(0);
    assert_eq!(topic, Topic::from("user.created"));
    assert_eq!(message.uuid(), &published.id);
    assert_eq!(&message.data()[..], payload.as_bytes());
    assert_eq!(message.schema(), Some("#/components/messages/UserCreated"));
    assert_eq!(message.headers(), &published.headers.clone().into_headers());
}

#[tokio::test]
async fn unknown_topic_publishes_without_headers() {
    let (producer, publisher) = producer();
    let published = producer
        .publish_json("unknown.topic", r#"{"userId": "7"}"#)
        .await
        .expect("published");
    assert!(published.headers.is_empty());

    let (_, message) = publisher.messages().remove(0);
    assert!(message.headers().is_empty());
    assert_eq!(message.schema(), None);
}

#[test]
fn unknown_topic_warning_is_observable_through_producer() {
    let (producer, _) = producer();
    let (result, events) = capture_events(|| {
        futures_util::FutureExt::now_or_never(
            producer.publish_json("unknown.topic", r#"{"userId": "7"}"#),
        )
    });
    assert!(matches!(result, Some(Ok(_))));
    assert_eq!(topic_warnings(&events, "unknown.topic").count(), 1);
}

#[tokio::test]
async fn invalid_payload_is_not_published() {
    let (producer, publisher) = producer();
    assert!(matches!(
        producer.publish_json("user.created", "not json").await,
        Err(Error::DecodePayload(PayloadError::Json(_)))
    ));
    assert!(matches!(
        producer.publish_json("user.created", r#""just a string""#).await,
        Err(Error::DecodePayload(PayloadError::NotAnObject(_)))
    ));
    assert!(publisher.is_empty());
}

#[derive(Debug, thiserror::Error)]
#[error("broker unavailable")]
struct BrokerUnavailable;

#[derive(Debug, Clone)]
struct FailingPublisher;

impl Publisher for FailingPublisher {
    type MessageId = ();
    type MessageError = BrokerUnavailable;
    type PublishStream = stream::Iter<std::vec::IntoIter<Result<(), BrokerUnavailable>>>;

    fn publish<'a, I>(&self, _: Topic, messages: I) -> Self::PublishStream
    where
        I: Iterator<Item = &'a OutgoingMessage> + ExactSizeIterator,
    {
        stream::iter(messages.map(|_| Err(BrokerUnavailable)).collect::<Vec<_>>())
    }
}

#[derive(Debug, Clone)]
struct SilentPublisher;

impl Publisher for SilentPublisher {
    type MessageId = ();
    type MessageError = BrokerUnavailable;
    type PublishStream = stream::Empty<Result<(), BrokerUnavailable>>;

    fn publish<'a, I>(&self, _: Topic, _: I) -> Self::PublishStream
    where
        I: Iterator<Item = &'a OutgoingMessage> + ExactSizeIterator,
    {
        stream::empty()
    }
}

#[tokio::test]
async fn publisher_failures_surface() {
    let injector = HeaderInjector::from_slice(SPEC.as_bytes()).expect("valid spec");

    let err = Producer::new(injector.clone(), FailingPublisher)
        .publish_json("user.created", r#"{"userId": "7"}"#)
        .await
        .unwrap_err();
    match err {
        Error::Publish(cause) => assert!(cause.downcast_ref::<BrokerUnavailable>().is_some()),
        other => panic!("unexpected error: {other:?}"),
    }

    assert!(matches!(
        Producer::new(injector, SilentPublisher)
            .publish_json("user.created", r#"{"userId": "7"}"#)
            .await,
        Err(Error::NoResponse)
    ));
}

#[test]
fn available_topics_come_from_the_spec() {
    let (producer, _) = producer();
    assert_eq!(
        producer.available_topics(),
        vec!["audit.event", "user.created", "user.deleted"]
    );
}

#[tokio::test]
async fn mock_stream_yields_one_result_per_message() {
    let publisher = MockPublisher::new();
    let messages: Vec<_> = (0..3)
        .map(|i| {
            OutgoingMessage::new(
                Uuid::new_v4(),
                std::time::SystemTime::now(),
                None,
                Default::default(),
                format!("{{\"n\":{i}}}"),
            )
        })
        .collect();
    let ids: Vec<_> = publisher
        .publish("user.created".into(), messages.iter())
        .map(|result| result.expect("infallible"))
        .collect()
        .await;
    assert_eq!(
        ids,
        messages.iter().map(|m| *m.uuid()).collect::<Vec<_>>()
    );
    assert_eq!(publisher.len(), 3);
}

#[test]
fn errors_send_sync() {
    assert_error::<Error>();
}
