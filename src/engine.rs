//! Resolution of a topic's header templates into concrete headers.

use std::{io::Read, path::Path, sync::Arc};

use tracing::warn;

use crate::{
    loader::{self, LoadError},
    template::Template,
    ChannelSpec, Headers, ResolutionContext,
};

/// Headers resolved for one message, in the order the channel declares them.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ResolvedHeaders(Vec<(String, String)>);

impl ResolvedHeaders {
    /// Iterate `(header name, value)` pairs in declaration order.
    pub fn iter(&self) -> impl ExactSizeIterator<Item = (&str, &str)> + '_ {
        self.0
            .iter()
            .map(|(name, value)| (name.as_str(), value.as_str()))
    }

    /// The value resolved for `name`.
    pub fn get(&self, name: &str) -> Option<&str> {
        self.0
            .iter()
            .find(|(resolved, _)| resolved == name)
            .map(|(_, value)| value.as_str())
    }

    /// Number of headers.
    pub fn len(&self) -> usize {
        self.0.len()
    }

    /// Whether nothing was resolved.
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// Convert into transport-level headers.
    pub fn into_headers(self) -> Headers {
        self.0.into_iter().collect()
    }
}

impl IntoIterator for ResolvedHeaders {
    type Item = (String, String);
    type IntoIter = std::vec::IntoIter<(String, String)>;

    fn into_iter(self) -> Self::IntoIter {
        self.0.into_iter()
    }
}

/// Resolve the headers declared for `topic` against a message payload.
///
/// A topic that is not declared, or that declares no header templates, resolves to no headers and
/// emits a single warning naming the topic. This function never fails.
pub fn resolve_headers(topic: &str, spec: &ChannelSpec, ctx: &ResolutionContext) -> ResolvedHeaders {
    let templates = match spec
        .channel(topic)
        .and_then(|channel| channel.headers())
        .filter(|templates| !templates.is_empty())
    {
        Some(templates) => templates,
        None => {
            warn!(topic = %topic, "no header configuration found for topic");
            return ResolvedHeaders::default();
        }
    };

    ResolvedHeaders(
        templates
            .iter()
            .map(|(name, template)| (name.to_owned(), Template::parse(template).evaluate(ctx)))
            .collect(),
    )
}

/// Resolves headers for outgoing messages from a loaded channel specification.
///
/// The specification is shared, never modified, so an injector can be cloned cheaply and used from
/// any number of threads at once.
///
/// # Examples
///
/// ```
/// use header_injector::{HeaderInjector, ResolutionContext};
///
/// let injector = HeaderInjector::from_slice(
///     br#"
/// channels:
///   user.created:
///     x-headers:
///       x-id: ${message.payload.userId}
///       x-source: user-service
/// "#,
/// )?;
///
/// let payload = ResolutionContext::from_json_slice(br#"{"userId": "U_123"}"#)?;
/// let headers = injector.resolve_headers("user.created", &payload);
/// assert_eq!(headers.get("x-id"), Some("U_123"));
/// assert_eq!(headers.get("x-source"), Some("user-service"));
/// # Ok::<(), Box<dyn std::error::Error>>(())
/// ```
#[derive(Debug, Clone)]
pub struct HeaderInjector {
    spec: Arc<ChannelSpec>,
}

impl HeaderInjector {
    /// Create an injector over a loaded specification.
    pub fn new(spec: ChannelSpec) -> Self {
        Self::from_shared(Arc::new(spec))
    }

    /// Create an injector over a specification that is already shared.
    pub fn from_shared(spec: Arc<ChannelSpec>) -> Self {
        HeaderInjector { spec }
    }

    /// Load a YAML or JSON specification and create an injector over it.
    pub fn from_slice(document: &[u8]) -> Result<Self, LoadError> {
        loader::load(document).map(Self::new)
    }

    /// Load a specification from a reader and create an injector over it.
    pub fn from_reader<R: Read>(reader: R) -> Result<Self, LoadError> {
        loader::load_reader(reader).map(Self::new)
    }

    /// Load a specification file and create an injector over it.
    pub fn from_path<P: AsRef<Path>>(path: P) -> Result<Self, LoadError> {
        loader::load_path(path).map(Self::new)
    }

    /// The specification headers are resolved from.
    pub fn spec(&self) -> &ChannelSpec {
        &self.spec
    }

    /// Names of every topic the specification declares.
    pub fn topics(&self) -> impl Iterator<Item = &str> + '_ {
        self.spec.topics()
    }

    /// Resolve the headers declared for `topic`. See [`resolve_headers`].
    pub fn resolve_headers(&self, topic: &str, ctx: &ResolutionContext) -> ResolvedHeaders {
        resolve_headers(topic, &self.spec, ctx)
    }

    /// Resolve the headers declared for `topic` and add them to `headers`.
    ///
    /// Resolved headers replace existing entries of the same name.
    pub fn inject(&self, topic: &str, headers: &mut Headers, ctx: &ResolutionContext) {
        headers.extend(self.resolve_headers(topic, ctx));
    }

    /// Payload fields referenced by `topic`'s header templates that its message schema does not
    /// declare.
    ///
    /// Such references resolve to empty headers unless the payload carries the field anyway. A
    /// topic without a resolvable message schema reports every referenced field.
    pub fn undeclared_references(&self, topic: &str) -> Vec<&str> {
        let templates = match self.spec.channel(topic).and_then(|c| c.headers()) {
            Some(templates) => templates,
            None => return Vec::new(),
        };
        let declared = self
            .spec
            .message_schema(topic)
            .and_then(|message| message.payload.as_ref())
            .map(|payload| &payload.properties);

        templates
            .iter()
            .filter_map(|(_, template)| match Template::parse(template) {
                Template::PayloadField(field) => Some(field),
                _ => None,
            })
            .filter(|field| !declared.map_or(false, |declared| declared.contains_key(*field)))
            .collect()
    }
}
