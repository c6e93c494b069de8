//! Header template evaluation.
//!
//! A template is either a literal, which resolves to itself, or a directive: a string that in its
//! entirety has the form `${<expression>}`. Recognized expressions are, in priority order:
//!
//! * `uuid()`: a fresh random (version 4) UUID;
//! * `timestamp()`: milliseconds since the Unix epoch, in decimal;
//! * `message.payload.<field>`: the payload field's value, or the empty string when absent.
//!
//! Directives with any other expression resolve to the template text unchanged. Only the whole
//! template is ever a directive; text such as `id-${uuid()}` is a literal.

use std::{
    sync::atomic::{AtomicU64, Ordering},
    time::{SystemTime, UNIX_EPOCH},
};

use uuid::Uuid;

use crate::ResolutionContext;

const DIRECTIVE_PREFIX: &str = "${";
const DIRECTIVE_SUFFIX: &str = "}";
const PAYLOAD_FIELD_PREFIX: &str = "message.payload.";

/// A classified header template.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Template<'a> {
    /// Plain text, resolved verbatim
    Literal(&'a str),
    /// `${uuid()}`
    Uuid,
    /// `${timestamp()}`
    Timestamp,
    /// `${message.payload.<field>}`, holding the field name
    PayloadField(&'a str),
    /// A directive whose expression is not recognized; resolves to the full template text
    Unknown(&'a str),
}

impl<'a> Template<'a> {
    /// Classify a raw template string.
    pub fn parse(template: &'a str) -> Self {
        let expression = match template
            .strip_prefix(DIRECTIVE_PREFIX)
            .and_then(|rest| rest.strip_suffix(DIRECTIVE_SUFFIX))
        {
            Some(expression) => expression,
            None => return Template::Literal(template),
        };

        match expression {
            "uuid()" => Template::Uuid,
            "timestamp()" => Template::Timestamp,
            _ => match expression.strip_prefix(PAYLOAD_FIELD_PREFIX) {
                Some(field) => Template::PayloadField(field),
                None => Template::Unknown(template),
            },
        }
    }

    /// Evaluate the template against a payload.
    pub fn evaluate(&self, ctx: &ResolutionContext) -> String {
        match *self {
            Template::Literal(text) | Template::Unknown(text) => text.to_owned(),
            Template::Uuid => Uuid::new_v4().to_string(),
            Template::Timestamp => epoch_millis().to_string(),
            Template::PayloadField(field) => ctx
                .get(field)
                .map(|value| value.to_header_value())
                .unwrap_or_default(),
        }
    }
}

/// Resolve a single template against a payload.
pub fn resolve(template: &str, ctx: &ResolutionContext) -> String {
    Template::parse(template).evaluate(ctx)
}

// Highest timestamp handed out so far; keeps `timestamp()` non-decreasing when the wall clock
// steps backwards.
static LAST_TIMESTAMP: AtomicU64 = AtomicU64::new(0);

fn epoch_millis() -> u64 {
    // a clock set before the epoch reads as the epoch itself
    let now = SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|elapsed| u64::try_from(elapsed.as_millis()).unwrap_or(u64::MAX))
        .unwrap_or(0);
    let previous = LAST_TIMESTAMP.fetch_max(now, Ordering::Relaxed);
    previous.max(now)
}
