//! The core set of types used by the header injector.
//!
//! This crate aims to provide better version stability over the batteries-included
//! `header-injector` crate. Applications should typically use `header-injector`, while crates that
//! only inspect channel specifications or build outgoing messages can use `injector_core`.

mod topic;
pub use topic::Topic;
pub mod message;
pub mod spec;

pub use message::OutgoingMessage;
pub use spec::{
    ChannelDefinition, ChannelSpec, ComponentsSpec, HeaderTemplates, Info, MessageReference,
    MessageSchema, PayloadSchema, PropertyDefinition, PublishInfo,
};

/// Transport-level headers attached to an outgoing message.
pub type Headers = std::collections::BTreeMap<String, String>;
