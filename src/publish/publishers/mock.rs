use crate::{publish::Publisher, OutgoingMessage, Topic};

use std::{convert::Infallible, pin::Pin, sync::Arc, task};

use futures_util::stream::Stream;
use parking_lot::Mutex;
use uuid::Uuid;

/// A mock publisher that stores messages in-memory for later verification.
///
/// This is useful primarily in tests. To use this publisher, add feature `mock`.
///
/// # Examples
///
/// ```
/// # #[cfg(feature = "mock")]
/// use header_injector::publish::MockPublisher;
/// # #[cfg(feature = "mock")]
/// let publisher = MockPublisher::default();
/// # #[cfg(feature = "mock")]
/// let publisher_view = publisher.clone();
/// ```
#[derive(Debug, Default, Clone)]
pub struct MockPublisher(Arc<Mutex<Vec<(Topic, OutgoingMessage)>>>);

impl MockPublisher {
    /// Create a new mock publisher.
    pub fn new() -> Self {
        Default::default()
    }

    /// Number of messages published into this publisher.
    pub fn len(&self) -> usize {
        self.0.lock().len()
    }

    /// Whether nothing has been published into this publisher.
    pub fn is_empty(&self) -> bool {
        self.0.lock().is_empty()
    }

    /// Every message published so far, in publish order.
    pub fn messages(&self) -> Vec<(Topic, OutgoingMessage)> {
        self.0.lock().clone()
    }

    /// Verify that a message was published. This method asserts that the message you expected to
    /// be published, was indeed published
    ///
    /// Panics if the message was not published.
    pub fn assert_message_published<T: Into<Topic>>(&self, topic: T, uuid: &Uuid) {
        let topic = topic.into();
        if self
            .0
            .lock()
            .iter()
            .any(|(published, msg)| published == &topic && msg.uuid() == uuid)
        {
            return;
        }
        panic!(
            "Message with uuid {} was not published to topic {}",
            uuid, topic
        );
    }
}

impl Publisher for MockPublisher {
    type MessageId = Uuid;
    type MessageError = Infallible;
    type PublishStream = MockPublishStream;

    fn publish<'a, I>(&self, topic: Topic, messages: I) -> Self::PublishStream
    where
        I: Iterator<Item = &'a OutgoingMessage> + ExactSizeIterator,
    {
        let data = self.0.clone();
        let messages: Vec<_> = messages.cloned().collect();
        MockPublishStream(Box::new(messages.into_iter().map(move |msg| {
            let id = *msg.uuid();
            data.lock().push((topic.clone(), msg));
            id
        })))
    }
}

/// Stream of mock publisher results.
pub struct MockPublishStream(Box<dyn Iterator<Item = Uuid> + Send + Sync>);

impl std::fmt::Debug for MockPublishStream {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("MockPublishStream").finish_non_exhaustive()
    }
}

impl Stream for MockPublishStream {
    type Item = Result<Uuid, Infallible>;

    fn poll_next(
        mut self: Pin<&mut Self>,
        _: &mut task::Context<'_>,
    ) -> task::Poll<Option<Self::Item>> {
        task::Poll::Ready(self.0.next().map(Ok))
    }
}
