#![deny(missing_docs, unused_import_braces, unused_qualifications)]
#![warn(
    missing_debug_implementations,
    missing_copy_implementations,
    trivial_casts,
    trivial_numeric_casts,
    unsafe_code,
    unstable_features
)]
#![cfg_attr(docsrs, feature(doc_cfg))]

//! Header injection for message bus producers.
//!
//! Producers describe the headers each topic carries in a declarative channel specification (a
//! reduced AsyncAPI document) rather than hard-coding them. For every outgoing message the
//! topic's header templates are resolved against the message payload:
//!
//! * a literal template, e.g. `user-service`, is used as is;
//! * `${uuid()}` becomes a fresh random UUID;
//! * `${timestamp()}` becomes the current time in milliseconds since the Unix epoch;
//! * `${message.payload.<field>}` becomes the payload field's value, or an empty string.
//!
//! Resolution never fails. Unknown topics resolve to no headers (with a warning logged through
//! [`tracing`]), missing payload fields resolve to empty strings and unrecognized directives are
//! passed through verbatim. Only loading a malformed specification is an error.
//!
//! # Examples
//!
//! ```
//! use header_injector::{HeaderInjector, ResolutionContext};
//!
//! let spec = r#"
//! asyncapi: 2.6.0
//! channels:
//!   user.created:
//!     publish:
//!       message:
//!         $ref: '#/components/messages/UserCreated'
//!     x-headers:
//!       x-user-id: ${message.payload.userId}
//!       x-request-id: ${uuid()}
//! components:
//!   messages:
//!     UserCreated:
//!       payload:
//!         type: object
//!         properties:
//!           userId:
//!             type: string
//! "#;
//!
//! // load once at startup
//! let injector = HeaderInjector::from_slice(spec.as_bytes())?;
//!
//! // then resolve for every outgoing message
//! let payload = ResolutionContext::from_json_slice(br#"{"userId": "U_123"}"#)?;
//! let headers = injector.resolve_headers("user.created", &payload);
//! assert_eq!(headers.get("x-user-id"), Some("U_123"));
//! assert_eq!(headers.len(), 2);
//! # Ok::<(), Box<dyn std::error::Error>>(())
//! ```

pub use injector_core::{
    spec::{
        ChannelDefinition, ChannelSpec, ComponentsSpec, HeaderTemplates, Info, MessageReference,
        MessageSchema, PayloadSchema, PropertyDefinition, PublishInfo,
    },
    Headers, OutgoingMessage, Topic,
};

pub mod context;
pub mod engine;
pub mod loader;
pub mod publish;
pub mod template;

mod tests;

pub use context::{PayloadError, PayloadValue, ResolutionContext};
pub use engine::{resolve_headers, HeaderInjector, ResolvedHeaders};
pub use loader::{load, LoadError, LoadErrorKind};
pub use template::{resolve, Template};

/// All errors that may be returned while publishing a message.
#[derive(Debug, thiserror::Error)]
#[non_exhaustive]
pub enum Error {
    /// The payload could not be decoded into a resolution context
    #[error("failed to decode message payload")]
    DecodePayload(#[source] PayloadError),

    /// The publisher failed to deliver the message
    #[error("failed to publish a message")]
    Publish(#[source] Box<dyn std::error::Error + Send + Sync>),

    /// The publisher finished without reporting an outcome for the message
    #[error("publisher returned no result for the message")]
    NoResponse,
}
