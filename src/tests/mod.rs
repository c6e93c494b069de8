#![cfg(test)]

pub(crate) mod publish;

use parking_lot::Mutex;
use std::{collections::BTreeMap, fmt, sync::Arc};
use tracing::{
    field::{Field, Visit},
    Event, Level, Subscriber,
};
use tracing_subscriber::{layer::Context, prelude::*, Layer};

pub(crate) const SPEC: &str = r#"
asyncapi: 2.6.0
info:
  title: User Service
  version: 1.0.0
  description: Events published by the user service
channels:
  user.created:
    publish:
      message:
        $ref: '#/components/messages/UserCreated'
    x-headers:
      x-id: ${message.payload.userId}
      x-trace: ${uuid()}
      x-created-at: ${timestamp()}
      x-source: user-service
  user.deleted:
    publish:
      message:
        $ref: '#/components/messages/UserDeleted'
    x-headers:
      x-id: ${message.payload.userId}
      x-reason: ${message.payload.reason}
      x-region: ${env.REGION}
  audit.event:
    publish:
      message:
        $ref: '#/components/messages/UserCreated'
components:
  messages:
    UserCreated:
      payload:
        type: object
        properties:
          userId:
            type: string
          email:
            type: string
    UserDeleted:
      payload:
        type: object
        properties:
          userId:
            type: string
"#;

pub(crate) fn assert_error<T: std::error::Error + Send + Sync + 'static>() {}
pub(crate) fn assert_send_sync<T: Send + Sync>() {}

/// A `tracing` event recorded by [`capture_events`].
#[derive(Debug, Clone)]
pub(crate) struct CapturedEvent {
    pub(crate) level: Level,
    pub(crate) fields: BTreeMap<String, String>,
}

#[derive(Clone, Default)]
struct Recorder(Arc<Mutex<Vec<CapturedEvent>>>);

impl<S: Subscriber> Layer<S> for Recorder {
    fn on_event(&self, event: &Event<'_>, _: Context<'_, S>) {
        let mut fields = FieldRecorder::default();
        event.record(&mut fields);
        self.0.lock().push(CapturedEvent {
            level: *event.metadata().level(),
            fields: fields.0,
        });
    }
}

#[derive(Default)]
struct FieldRecorder(BTreeMap<String, String>);

impl Visit for FieldRecorder {
    fn record_str(&mut self, field: &Field, value: &str) {
        self.0.insert(field.name().to_owned(), value.to_owned());
    }

    fn record_debug(&mut self, field: &Field, value: &dyn fmt::Debug) {
        self.0.insert(field.name().to_owned(), format!("{value:?}"));
    }
}

/// Run `f` with a subscriber that records every event emitted on this thread.
pub(crate) fn capture_events<T>(f: impl FnOnce() -> T) -> (T, Vec<CapturedEvent>) {
    let recorder = Recorder::default();
    let subscriber = tracing_subscriber::registry().with(recorder.clone());
    let output = tracing::subscriber::with_default(subscriber, f);
    let events = recorder.0.lock().clone();
    (output, events)
}

/// Events at `WARN` level whose `topic` field equals `topic`.
pub(crate) fn topic_warnings<'a>(
    events: &'a [CapturedEvent],
    topic: &'a str,
) -> impl Iterator<Item = &'a CapturedEvent> + 'a {
    events.iter().filter(move |event| {
        event.level == Level::WARN && event.fields.get("topic").map(String::as_str) == Some(topic)
    })
}
