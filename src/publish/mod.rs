//! Types, traits, and functions necessary to publish messages with resolved headers.
//!
//! The transport itself lives outside this crate: anything implementing [`Publisher`] can carry
//! the messages a [`Producer`] builds.

use std::time::SystemTime;

use futures_util::stream::{Stream, StreamExt};
use tracing::debug;
use uuid::Uuid;

use crate::{
    context::ResolutionContext, engine::ResolvedHeaders, Error, HeaderInjector, MessageReference,
    OutgoingMessage, Topic,
};

mod publishers;
#[allow(unreachable_pub)]
pub use publishers::*;

/// Message publishers.
///
/// Message publishers deliver an outgoing message to an endpoint, possibly a remote one. Retrying,
/// timeouts and acknowledgement policy are up to the publisher.
pub trait Publisher {
    /// The identifier for a successfully published message.
    type MessageId: 'static;

    /// The error that this publisher returns when publishing of a message fails.
    type MessageError: std::error::Error + Send + Sync + 'static;

    /// The stream of results that the `publish` method returns.
    type PublishStream: Stream<Item = Result<Self::MessageId, Self::MessageError>>;

    /// Publish a batch of messages.
    ///
    /// The output stream shall return a result for each message in `messages` slice in order.
    fn publish<'a, I>(&self, topic: Topic, messages: I) -> Self::PublishStream
    where
        I: Iterator<Item = &'a OutgoingMessage> + ExactSizeIterator;
}

/// The outcome of [`Producer::publish_json`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Published<I> {
    /// The identifier the publisher assigned
    pub id: I,
    /// The headers attached to the message
    pub headers: ResolvedHeaders,
}

/// Publishes payloads with the headers their topic declares.
///
/// # Examples
///
/// ```
/// # #[cfg(feature = "mock")]
/// # fn main() -> Result<(), Box<dyn std::error::Error>> {
/// use header_injector::{publish::{MockPublisher, Producer}, HeaderInjector};
///
/// let injector = HeaderInjector::from_slice(
///     b"channels: { user.created: { x-headers: { x-id: '${message.payload.userId}' } } }",
/// )?;
/// let publisher = MockPublisher::new();
/// let producer = Producer::new(injector, publisher.clone());
///
/// let runtime = tokio::runtime::Builder::new_current_thread().build()?;
/// let published =
///     runtime.block_on(producer.publish_json("user.created", r#"{"userId": "U_123"}"#))?;
/// assert_eq!(published.headers.get("x-id"), Some("U_123"));
/// publisher.assert_message_published("user.created", &published.id);
/// # Ok(())
/// # }
/// # #[cfg(not(feature = "mock"))]
/// # fn main() {}
/// ```
#[derive(Debug, Clone)]
pub struct Producer<P> {
    injector: HeaderInjector,
    publisher: P,
}

impl<P> Producer<P>
where
    P: Publisher,
    P::PublishStream: Unpin,
{
    /// Create a producer that resolves headers with `injector` and sends through `publisher`.
    pub fn new(injector: HeaderInjector, publisher: P) -> Self {
        Producer {
            injector,
            publisher,
        }
    }

    /// The injector used to resolve headers.
    pub fn injector(&self) -> &HeaderInjector {
        &self.injector
    }

    /// Topics that messages can be published to.
    pub fn available_topics(&self) -> Vec<&str> {
        self.injector.topics().collect()
    }

    /// Publish a JSON object payload to `topic`, attaching the topic's resolved headers.
    ///
    /// The payload is sent exactly as given. Resolves once the publisher reports the outcome for
    /// the message.
    pub async fn publish_json(
        &self,
        topic: &str,
        payload: &str,
    ) -> Result<Published<P::MessageId>, Error> {
        let ctx = ResolutionContext::from_json_slice(payload.as_bytes())
            .map_err(Error::DecodePayload)?;
        let headers = self.injector.resolve_headers(topic, &ctx);
        let message = OutgoingMessage::new(
            Uuid::new_v4(),
            SystemTime::now(),
            self.schema_reference(topic),
            headers.clone().into_headers(),
            payload.to_owned(),
        );

        let id = self
            .publisher
            .publish(Topic::from(topic), std::iter::once(&message))
            .next()
            .await
            .ok_or(Error::NoResponse)?
            .map_err(|e| Error::Publish(Box::new(e)))?;
        debug!(
            topic = %topic,
            message_id = %message.uuid(),
            headers = headers.len(),
            "published message"
        );
        Ok(Published { id, headers })
    }

    fn schema_reference(&self, topic: &str) -> Option<String> {
        match self.injector.spec().channel(topic)?.publish()?.message()? {
            MessageReference::Ref(pointer) => Some(pointer.clone()),
            MessageReference::Inline(_) => None,
        }
    }
}
