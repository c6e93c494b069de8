//! Loading channel specifications from YAML or JSON documents.
//!
//! Documents are parsed into a generic value tree and then walked explicitly. JSON objects are
//! parsed with `serde_json`, everything else with `serde_yaml`. Every field is
//! optional and unknown fields are ignored, so richer real-world documents load fine; only
//! documents that are not structured data, or that use a scalar or list where a mapping is
//! expected, are rejected. Header templates are kept verbatim and checked only when resolved.

use std::{collections::BTreeMap, io::Read, path::Path};

use serde_yaml::{Mapping, Value};

use crate::{
    ChannelDefinition, ChannelSpec, ComponentsSpec, HeaderTemplates, Info, MessageReference,
    MessageSchema, PayloadSchema, PropertyDefinition, PublishInfo,
};

/// Errors that may occur when loading a channel specification.
#[derive(Debug, thiserror::Error)]
#[non_exhaustive]
pub enum LoadError {
    /// The document is not valid YAML
    #[error("unable to parse the channel specification")]
    Syntax(#[source] serde_yaml::Error),
    /// The document looks like a JSON object but is neither valid JSON nor valid YAML
    #[error("unable to parse the channel specification as JSON")]
    Json(#[source] serde_json::Error),
    /// A node of the document has the wrong shape
    #[error("`{path}` in the channel specification must be {expected}")]
    Structure {
        /// Location of the offending node, e.g. `channels[user.created].x-headers`
        path: String,
        /// What was expected at that location
        expected: &'static str,
    },
    /// The document could not be read
    #[error("unable to read the channel specification")]
    Io(#[source] std::io::Error),
}

/// Broad classification of a [`LoadError`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LoadErrorKind {
    /// The document is not structured data, or is not shaped like a channel specification
    Malformed,
    /// The document could not be read at all
    Io,
}

impl LoadError {
    /// Classify this error.
    pub fn kind(&self) -> LoadErrorKind {
        match self {
            LoadError::Syntax(_) | LoadError::Json(_) | LoadError::Structure { .. } => {
                LoadErrorKind::Malformed
            }
            LoadError::Io(_) => LoadErrorKind::Io,
        }
    }

    fn structure(path: &str, expected: &'static str) -> Self {
        LoadError::Structure {
            path: path.to_owned(),
            expected,
        }
    }
}

/// Load a specification from YAML or JSON bytes.
pub fn load(document: &[u8]) -> Result<ChannelSpec, LoadError> {
    let root = parse_document(document)?;
    let root = match untag(&root) {
        Value::Mapping(root) => root,
        _ => return Err(LoadError::structure("document", "a mapping")),
    };
    parse_spec(root)
}

/// Load a specification from a YAML or JSON string.
pub fn load_str(document: &str) -> Result<ChannelSpec, LoadError> {
    load(document.as_bytes())
}

/// Load a specification from a reader, consuming it to the end.
pub fn load_reader<R: Read>(mut reader: R) -> Result<ChannelSpec, LoadError> {
    let mut document = Vec::new();
    reader
        .read_to_end(&mut document)
        .map_err(LoadError::Io)?;
    load(&document)
}

/// Load a specification from a file.
pub fn load_path<P: AsRef<Path>>(path: P) -> Result<ChannelSpec, LoadError> {
    load(&std::fs::read(path).map_err(LoadError::Io)?)
}

/// A document starting with `{` is read as JSON first. YAML flow mappings that aren't valid JSON
/// still load through the YAML fallback.
fn parse_document(document: &[u8]) -> Result<Value, LoadError> {
    let first = document.iter().find(|byte| !byte.is_ascii_whitespace());
    if first != Some(&b'{') {
        return serde_yaml::from_slice(document).map_err(LoadError::Syntax);
    }
    match serde_json::from_slice(document) {
        Ok(root) => Ok(root),
        Err(json) => serde_yaml::from_slice(document).map_err(|_| LoadError::Json(json)),
    }
}

fn parse_spec(root: &Mapping) -> Result<ChannelSpec, LoadError> {
    let info = mapping(root.get("info"), "info")?.map(parse_info);

    let mut channels = BTreeMap::new();
    if let Some(entries) = mapping(root.get("channels"), "channels")? {
        for (topic, channel) in entries {
            let topic = key(topic, "channels")?;
            let path = format!("channels[{topic}]");
            let definition = parse_channel(channel, &path)?;
            channels.insert(topic, definition);
        }
    }

    let components = match mapping(root.get("components"), "components")? {
        Some(components) => parse_components(components)?,
        None => ComponentsSpec::default(),
    };

    Ok(ChannelSpec::new(
        text(root.get("asyncapi")),
        info,
        channels,
        components,
    ))
}

fn parse_info(info: &Mapping) -> Info {
    Info {
        title: text(info.get("title")),
        version: text(info.get("version")),
        description: text(info.get("description")),
    }
}

fn parse_channel(channel: &Value, path: &str) -> Result<ChannelDefinition, LoadError> {
    let channel = match mapping(Some(channel), path)? {
        Some(channel) => channel,
        None => return Ok(ChannelDefinition::default()),
    };

    let publish_path = format!("{path}.publish");
    let publish = match mapping(channel.get("publish"), &publish_path)? {
        Some(publish) => Some(PublishInfo {
            message: parse_message_reference(publish.get("message"), &publish_path)?,
        }),
        None => None,
    };

    let headers_path = format!("{path}.x-headers");
    let headers = match mapping(channel.get("x-headers"), &headers_path)? {
        Some(entries) => Some(
            entries
                .iter()
                .map(|(name, template)| {
                    let name = key(name, &headers_path)?;
                    let template = template_text(template, &format!("{headers_path}.{name}"))?;
                    Ok::<_, LoadError>((name, template))
                })
                .collect::<Result<HeaderTemplates, LoadError>>()?,
        ),
        None => None,
    };

    Ok(ChannelDefinition::new(publish, headers))
}

fn parse_message_reference(
    message: Option<&Value>,
    publish_path: &str,
) -> Result<Option<MessageReference>, LoadError> {
    let path = format!("{publish_path}.message");
    let message = match mapping(message, &path)? {
        Some(message) => message,
        None => return Ok(None),
    };
    Ok(Some(match text(message.get("$ref")) {
        Some(pointer) => MessageReference::Ref(pointer),
        None => MessageReference::Inline(parse_message(message, &path)?),
    }))
}

fn parse_components(components: &Mapping) -> Result<ComponentsSpec, LoadError> {
    let mut messages = BTreeMap::new();
    if let Some(entries) = mapping(components.get("messages"), "components.messages")? {
        for (name, message) in entries {
            let name = key(name, "components.messages")?;
            let path = format!("components.messages[{name}]");
            let message = match mapping(Some(message), &path)? {
                Some(message) => parse_message(message, &path)?,
                None => MessageSchema::default(),
            };
            messages.insert(name, message);
        }
    }
    Ok(ComponentsSpec { messages })
}

fn parse_message(message: &Mapping, path: &str) -> Result<MessageSchema, LoadError> {
    let payload_path = format!("{path}.payload");
    let payload = match mapping(message.get("payload"), &payload_path)? {
        Some(payload) => Some(parse_payload(payload, &payload_path)?),
        None => None,
    };
    Ok(MessageSchema { payload })
}

fn parse_payload(payload: &Mapping, path: &str) -> Result<PayloadSchema, LoadError> {
    let properties_path = format!("{path}.properties");
    let mut properties = BTreeMap::new();
    if let Some(entries) = mapping(payload.get("properties"), &properties_path)? {
        for (field, property) in entries {
            let field = key(field, &properties_path)?;
            let property_path = format!("{properties_path}.{field}");
            let property_type = mapping(Some(property), &property_path)?
                .and_then(|property| text(property.get("type")));
            properties.insert(field, PropertyDefinition { property_type });
        }
    }
    Ok(PayloadSchema {
        schema_type: text(payload.get("type")),
        properties,
    })
}

fn untag(value: &Value) -> &Value {
    match value {
        Value::Tagged(tagged) => untag(&tagged.value),
        other => other,
    }
}

/// A node that must be a mapping when present. `null` counts as absent.
fn mapping<'a>(value: Option<&'a Value>, path: &str) -> Result<Option<&'a Mapping>, LoadError> {
    match value.map(untag) {
        None | Some(Value::Null) => Ok(None),
        Some(Value::Mapping(mapping)) => Ok(Some(mapping)),
        Some(_) => Err(LoadError::structure(path, "a mapping")),
    }
}

fn scalar(value: &Value) -> Option<String> {
    match untag(value) {
        Value::String(s) => Some(s.clone()),
        Value::Number(n) => Some(n.to_string()),
        Value::Bool(b) => Some(b.to_string()),
        _ => None,
    }
}

/// An informational text field; anything that isn't a scalar is ignored.
fn text(value: Option<&Value>) -> Option<String> {
    value.and_then(scalar)
}

fn key(value: &Value, path: &str) -> Result<String, LoadError> {
    scalar(value).ok_or_else(|| LoadError::structure(path, "keyed by strings"))
}

/// An empty template is the empty literal.
fn template_text(value: &Value, path: &str) -> Result<String, LoadError> {
    match untag(value) {
        Value::Null => Ok(String::new()),
        other => scalar(other).ok_or_else(|| LoadError::structure(path, "a string template")),
    }
}
