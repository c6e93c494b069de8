//! The in-memory model of a channel specification.
//!
//! A [`ChannelSpec`] describes which topics exist, which header templates each topic carries and
//! the message schemas those topics publish. Values are built once, typically by a loader, and are
//! read-only afterwards; share them behind an `Arc` to resolve headers from many threads.

use std::collections::BTreeMap;

/// Prefix of `$ref` pointers that name a reusable message in `components.messages`.
const COMPONENT_MESSAGE_REF: &str = "#/components/messages/";

/// A parsed channel specification.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ChannelSpec {
    asyncapi: Option<String>,
    info: Option<Info>,
    channels: BTreeMap<String, ChannelDefinition>,
    components: ComponentsSpec,
}

impl ChannelSpec {
    /// Assemble a specification from its parts.
    pub fn new(
        asyncapi: Option<String>,
        info: Option<Info>,
        channels: BTreeMap<String, ChannelDefinition>,
        components: ComponentsSpec,
    ) -> Self {
        Self {
            asyncapi,
            info,
            channels,
            components,
        }
    }

    /// The declared document format version, e.g. `2.6.0`.
    pub fn asyncapi(&self) -> Option<&str> {
        self.asyncapi.as_deref()
    }

    /// Informational metadata about the document.
    pub fn info(&self) -> Option<&Info> {
        self.info.as_ref()
    }

    /// Look up the definition of a topic. Topic names are case-sensitive.
    pub fn channel(&self, topic: &str) -> Option<&ChannelDefinition> {
        self.channels.get(topic)
    }

    /// Names of every declared topic.
    pub fn topics(&self) -> impl Iterator<Item = &str> + '_ {
        self.channels.keys().map(String::as_str)
    }

    /// Reusable definitions shared between channels.
    pub fn components(&self) -> &ComponentsSpec {
        &self.components
    }

    /// The message schema published on `topic`.
    ///
    /// References of the form `#/components/messages/<name>` resolve against
    /// [`ComponentsSpec::messages`]; inline messages resolve to themselves. Any other reference
    /// resolves to `None`.
    pub fn message_schema(&self, topic: &str) -> Option<&MessageSchema> {
        match self.channel(topic)?.publish()?.message()? {
            MessageReference::Inline(schema) => Some(schema),
            MessageReference::Ref(pointer) => {
                let name = pointer.strip_prefix(COMPONENT_MESSAGE_REF)?;
                self.components.messages.get(name)
            }
        }
    }
}

/// Title, version and description of a specification document.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Info {
    /// Human readable title
    pub title: Option<String>,
    /// Version of the described API, not of the document format
    pub version: Option<String>,
    /// Free-form description
    pub description: Option<String>,
}

/// Everything a specification says about a single topic.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ChannelDefinition {
    publish: Option<PublishInfo>,
    headers: Option<HeaderTemplates>,
}

impl ChannelDefinition {
    /// Create a channel definition.
    pub fn new(publish: Option<PublishInfo>, headers: Option<HeaderTemplates>) -> Self {
        Self { publish, headers }
    }

    /// What the channel publishes.
    pub fn publish(&self) -> Option<&PublishInfo> {
        self.publish.as_ref()
    }

    /// The header templates declared under `x-headers`, if any.
    pub fn headers(&self) -> Option<&HeaderTemplates> {
        self.headers.as_ref()
    }
}

/// The `publish` operation of a channel.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct PublishInfo {
    /// The message published on the channel
    pub message: Option<MessageReference>,
}

impl PublishInfo {
    /// The message published on the channel.
    pub fn message(&self) -> Option<&MessageReference> {
        self.message.as_ref()
    }
}

/// A published message, either by reference or written out in place.
#[derive(Debug, Clone, PartialEq)]
pub enum MessageReference {
    /// A `$ref` pointer, e.g. `#/components/messages/UserCreated`
    Ref(String),
    /// A message schema declared inline on the channel
    Inline(MessageSchema),
}

/// Reusable definitions.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ComponentsSpec {
    /// Message schemas keyed by name
    pub messages: BTreeMap<String, MessageSchema>,
}

/// Structural description of a message.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct MessageSchema {
    /// The message payload
    pub payload: Option<PayloadSchema>,
}

/// Structural description of a message payload.
///
/// Declared types are descriptive only; payloads are never checked against them.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct PayloadSchema {
    /// Declared payload type, usually `object`
    pub schema_type: Option<String>,
    /// Declared payload fields
    pub properties: BTreeMap<String, PropertyDefinition>,
}

/// A single declared payload field.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct PropertyDefinition {
    /// Declared primitive type, e.g. `string`
    pub property_type: Option<String>,
}

/// Header templates of a channel, in declaration order.
///
/// Header names are unique; collecting a repeated name replaces the earlier template while
/// keeping its original position.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct HeaderTemplates(Vec<(String, String)>);

impl HeaderTemplates {
    /// Create an empty template set.
    pub fn new() -> Self {
        Self::default()
    }

    /// Iterate `(header name, raw template)` pairs in declaration order.
    pub fn iter(&self) -> impl ExactSizeIterator<Item = (&str, &str)> + '_ {
        self.0
            .iter()
            .map(|(name, template)| (name.as_str(), template.as_str()))
    }

    /// The raw template declared for `name`.
    pub fn get(&self, name: &str) -> Option<&str> {
        self.0
            .iter()
            .find(|(declared, _)| declared == name)
            .map(|(_, template)| template.as_str())
    }

    /// Number of declared headers.
    pub fn len(&self) -> usize {
        self.0.len()
    }

    /// Whether no header is declared.
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    fn insert(&mut self, name: String, template: String) {
        match self.0.iter_mut().find(|(declared, _)| *declared == name) {
            Some(entry) => entry.1 = template,
            None => self.0.push((name, template)),
        }
    }
}

impl<K, V> FromIterator<(K, V)> for HeaderTemplates
where
    K: Into<String>,
    V: Into<String>,
{
    fn from_iter<I: IntoIterator<Item = (K, V)>>(iter: I) -> Self {
        let mut templates = HeaderTemplates::new();
        for (name, template) in iter {
            templates.insert(name.into(), template.into());
        }
        templates
    }
}
