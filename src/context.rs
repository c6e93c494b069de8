//! The decoded payload of one outgoing message, as seen by header templates.
//!
//! Fields keep the order they have in the payload.

/// Errors that may occur when decoding a payload into a [`ResolutionContext`].
#[derive(Debug, thiserror::Error)]
#[non_exhaustive]
pub enum PayloadError {
    /// The payload is not valid JSON
    #[error("payload is not valid JSON")]
    Json(#[source] serde_json::Error),
    /// The payload decoded to something other than an object
    #[error("payload must be a JSON object, found {0}")]
    NotAnObject(&'static str),
}

/// A single payload value.
#[derive(Debug, Clone, PartialEq)]
pub enum PayloadValue {
    /// An explicit `null`
    Null,
    /// A boolean
    Bool(bool),
    /// An integer or floating point number
    Number(serde_json::Number),
    /// A string
    String(String),
    /// A list of values
    Sequence(Vec<PayloadValue>),
    /// A nested mapping, in payload order
    Mapping(Vec<(String, PayloadValue)>),
}

impl PayloadValue {
    /// The text this value contributes to a header.
    ///
    /// `null` renders as the empty string, scalars as their plain textual form and sequences or
    /// mappings as compact JSON.
    pub fn to_header_value(&self) -> String {
        match self {
            PayloadValue::Null => String::new(),
            PayloadValue::Bool(b) => b.to_string(),
            PayloadValue::Number(n) => n.to_string(),
            PayloadValue::String(s) => s.clone(),
            PayloadValue::Sequence(_) | PayloadValue::Mapping(_) => {
                serde_json::Value::from(self).to_string()
            }
        }
    }
}

fn json_kind(value: &serde_json::Value) -> &'static str {
    match value {
        serde_json::Value::Null => "null",
        serde_json::Value::Bool(_) => "a boolean",
        serde_json::Value::Number(_) => "a number",
        serde_json::Value::String(_) => "a string",
        serde_json::Value::Array(_) => "an array",
        serde_json::Value::Object(_) => "an object",
    }
}

impl From<serde_json::Value> for PayloadValue {
    fn from(value: serde_json::Value) -> Self {
        match value {
            serde_json::Value::Null => PayloadValue::Null,
            serde_json::Value::Bool(b) => PayloadValue::Bool(b),
            serde_json::Value::Number(n) => PayloadValue::Number(n),
            serde_json::Value::String(s) => PayloadValue::String(s),
            serde_json::Value::Array(items) => {
                PayloadValue::Sequence(items.into_iter().map(PayloadValue::from).collect())
            }
            serde_json::Value::Object(fields) => PayloadValue::Mapping(
                fields
                    .into_iter()
                    .map(|(k, v)| (k, PayloadValue::from(v)))
                    .collect(),
            ),
        }
    }
}

impl From<&PayloadValue> for serde_json::Value {
    fn from(value: &PayloadValue) -> Self {
        match value {
            PayloadValue::Null => serde_json::Value::Null,
            PayloadValue::Bool(b) => serde_json::Value::Bool(*b),
            PayloadValue::Number(n) => serde_json::Value::Number(n.clone()),
            PayloadValue::String(s) => serde_json::Value::String(s.clone()),
            PayloadValue::Sequence(items) => {
                serde_json::Value::Array(items.iter().map(serde_json::Value::from).collect())
            }
            PayloadValue::Mapping(fields) => serde_json::Value::Object(
                fields
                    .iter()
                    .map(|(k, v)| (k.clone(), serde_json::Value::from(v)))
                    .collect(),
            ),
        }
    }
}

impl From<&str> for PayloadValue {
    fn from(s: &str) -> Self {
        PayloadValue::String(s.to_owned())
    }
}

impl From<String> for PayloadValue {
    fn from(s: String) -> Self {
        PayloadValue::String(s)
    }
}

impl From<bool> for PayloadValue {
    fn from(b: bool) -> Self {
        PayloadValue::Bool(b)
    }
}

impl From<i64> for PayloadValue {
    fn from(n: i64) -> Self {
        PayloadValue::Number(n.into())
    }
}

impl From<u64> for PayloadValue {
    fn from(n: u64) -> Self {
        PayloadValue::Number(n.into())
    }
}

/// Payload fields available to `${message.payload.<field>}` directives.
///
/// Built per publish call and dropped afterwards.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ResolutionContext {
    fields: Vec<(String, PayloadValue)>,
}

impl ResolutionContext {
    /// Create an empty context.
    pub fn new() -> Self {
        Self::default()
    }

    /// Build a context from the top-level fields of a decoded JSON object.
    pub fn from_json(payload: serde_json::Value) -> Result<Self, PayloadError> {
        match payload {
            serde_json::Value::Object(fields) => Ok(fields
                .into_iter()
                .map(|(k, v)| (k, PayloadValue::from(v)))
                .collect()),
            other => Err(PayloadError::NotAnObject(json_kind(&other))),
        }
    }

    /// Decode a JSON object payload into a context.
    pub fn from_json_slice(payload: &[u8]) -> Result<Self, PayloadError> {
        Self::from_json(serde_json::from_slice(payload).map_err(PayloadError::Json)?)
    }

    /// Set a field, returning the value it replaces.
    pub fn insert(
        &mut self,
        field: impl Into<String>,
        value: impl Into<PayloadValue>,
    ) -> Option<PayloadValue> {
        let field = field.into();
        let value = value.into();
        match self.fields.iter_mut().find(|(existing, _)| *existing == field) {
            Some((_, slot)) => Some(std::mem::replace(slot, value)),
            None => {
                self.fields.push((field, value));
                None
            }
        }
    }

    /// The value of `field`.
    pub fn get(&self, field: &str) -> Option<&PayloadValue> {
        self.fields
            .iter()
            .find(|(existing, _)| existing == field)
            .map(|(_, value)| value)
    }

    /// Iterate `(field, value)` pairs in payload order.
    pub fn iter(&self) -> impl ExactSizeIterator<Item = (&str, &PayloadValue)> + '_ {
        self.fields
            .iter()
            .map(|(field, value)| (field.as_str(), value))
    }

    /// Number of fields.
    pub fn len(&self) -> usize {
        self.fields.len()
    }

    /// Whether the context has no fields.
    pub fn is_empty(&self) -> bool {
        self.fields.is_empty()
    }
}

impl<K, V> FromIterator<(K, V)> for ResolutionContext
where
    K: Into<String>,
    V: Into<PayloadValue>,
{
    fn from_iter<I: IntoIterator<Item = (K, V)>>(iter: I) -> Self {
        let mut ctx = ResolutionContext::new();
        for (field, value) in iter {
            ctx.insert(field, value);
        }
        ctx
    }
}
