//! Event dispatch for event-driven hosts.
//!
//! When the library runs inside an event-driven host, packaging is driven
//! by events: the host announces that a change-staging code request has
//! been described (or that its execution was requested), a registered
//! handler assembles the package, and a "packaged" event carrying the
//! resolved descriptor and the originating request id is emitted back.
//!
//! Handlers are registered explicitly on a [`Dispatcher`] keyed by
//! [`EventKind`]; the assembly functions themselves stay pure
//! transformations and know nothing about the dispatch mechanism.
//! Resolution failures travel through expansion diagnostics, not as a
//! distinct event type.

use std::collections::HashMap;

use serde::{Deserialize, Serialize};
use tracing::info;

use crate::flake::FlakeDescriptor;

/// The kinds of events the packaging workflow exchanges with its host.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum EventKind {
  /// A change-staging code request has been described.
  CodeDescribed,
  /// Execution of a change-staging code request was requested.
  CodeExecutionRequested,
  /// A package for a described request has been assembled.
  CodePackaged,
  /// A package for an execution request has been assembled.
  CodeExecutionPackaged,
}

/// An event instance. Incoming events carry the request id; packaged events
/// additionally carry the resolved package descriptor.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "camelCase", rename_all_fields = "camelCase")]
pub enum Event {
  CodeDescribed {
    request_id: String,
  },
  CodeExecutionRequested {
    request_id: String,
  },
  CodePackaged {
    request_id: String,
    descriptor: FlakeDescriptor,
  },
  CodeExecutionPackaged {
    request_id: String,
    descriptor: FlakeDescriptor,
  },
}

impl Event {
  pub fn kind(&self) -> EventKind {
    match self {
      Event::CodeDescribed { .. } => EventKind::CodeDescribed,
      Event::CodeExecutionRequested { .. } => EventKind::CodeExecutionRequested,
      Event::CodePackaged { .. } => EventKind::CodePackaged,
      Event::CodeExecutionPackaged { .. } => EventKind::CodeExecutionPackaged,
    }
  }

  /// The id of the originating request.
  pub fn request_id(&self) -> &str {
    match self {
      Event::CodeDescribed { request_id }
      | Event::CodeExecutionRequested { request_id }
      | Event::CodePackaged { request_id, .. }
      | Event::CodeExecutionPackaged { request_id, .. } => request_id,
    }
  }
}

/// A registered event handler. Handlers may emit one follow-up event;
/// errors are surfaced to the dispatching caller.
pub type Handler = Box<dyn Fn(&Event) -> anyhow::Result<Option<Event>> + Send + Sync>;

/// Maps event kinds to their registered handlers.
///
/// Registration is explicit: the host constructs a dispatcher, registers a
/// handler per event kind it cares about, and feeds incoming events to
/// [`Dispatcher::dispatch`].
#[derive(Default)]
pub struct Dispatcher {
  handlers: HashMap<EventKind, Vec<Handler>>,
}

impl Dispatcher {
  pub fn new() -> Self {
    Self::default()
  }

  /// Register a handler for one event kind. Multiple handlers per kind run
  /// in registration order.
  pub fn register(&mut self, kind: EventKind, handler: Handler) {
    self.handlers.entry(kind).or_default().push(handler);
  }

  /// Whether any handler is registered for the given kind.
  pub fn handles(&self, kind: EventKind) -> bool {
    self.handlers.get(&kind).is_some_and(|handlers| !handlers.is_empty())
  }

  /// Run every handler registered for the event's kind and collect the
  /// events they emit. A handler error aborts the dispatch and is returned
  /// to the caller.
  pub fn dispatch(&self, event: &Event) -> anyhow::Result<Vec<Event>> {
    let Some(handlers) = self.handlers.get(&event.kind()) else {
      return Ok(Vec::new());
    };

    let mut emitted = Vec::new();
    for handler in handlers {
      if let Some(follow_up) = handler(event)? {
        info!(request = follow_up.request_id(), ?follow_up, "emitting event");
        emitted.push(follow_up);
      }
    }
    Ok(emitted)
  }
}
