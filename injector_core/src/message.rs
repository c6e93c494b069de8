//! Message related types

use bytes::Bytes;
use std::time::SystemTime;
use uuid::Uuid;

use crate::Headers;

/// A message ready to be handed to a bus transport.
///
/// Built by the producer after the channel's header templates have been resolved against the
/// message payload.
#[derive(Debug, Clone)]
// derive Eq only in tests so that users can't foot-shoot an expensive == over data
#[cfg_attr(test, derive(PartialEq, Eq))]
pub struct OutgoingMessage {
    id: Uuid,
    timestamp: SystemTime,
    /// Reference to the message schema the channel declares for publishing, if any.
    ///
    /// E.g. `#/components/messages/UserCreated`
    schema: Option<String>,
    headers: Headers,
    data: Bytes,
}

impl OutgoingMessage {
    /// Create a new outgoing message
    pub fn new<D>(
        id: Uuid,
        timestamp: SystemTime,
        schema: Option<String>,
        headers: Headers,
        data: D,
    ) -> Self
    where
        D: Into<Bytes>,
    {
        Self {
            id,
            timestamp,
            schema,
            headers,
            data: data.into(),
        }
    }

    /// Unique message identifier.
    pub fn uuid(&self) -> &Uuid {
        &self.id
    }

    /// The timestamp when message was created in the publishing service.
    pub fn timestamp(&self) -> &SystemTime {
        &self.timestamp
    }

    /// Reference to the declared message schema, if the channel names one.
    pub fn schema(&self) -> Option<&str> {
        self.schema.as_deref()
    }

    /// Headers to attach to the message on the wire.
    pub fn headers(&self) -> &Headers {
        &self.headers
    }

    /// The encoded payload.
    pub fn data(&self) -> &Bytes {
        &self.data
    }

    /// Destructure this message into just the contained data
    pub fn into_data(self) -> Bytes {
        self.data
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn retains_constructor_fields() {
        let id = Uuid::new_v4();
        let timestamp = SystemTime::UNIX_EPOCH + std::time::Duration::from_millis(42);
        let headers = vec![("x-id", "7")]
            .into_iter()
            .map(|(k, v)| (k.into(), v.into()))
            .collect::<Headers>();
        let message = OutgoingMessage::new(
            id,
            timestamp,
            Some("#/components/messages/UserCreated".into()),
            headers.clone(),
            &b"{\"userId\":\"7\"}"[..],
        );
        assert_eq!(message.uuid(), &id);
        assert_eq!(message.timestamp(), &timestamp);
        assert_eq!(message.schema(), Some("#/components/messages/UserCreated"));
        assert_eq!(message.headers(), &headers);
        assert_eq!(message.into_data(), Bytes::from_static(b"{\"userId\":\"7\"}"));
    }
}
