#![forbid(unsafe_code)]

//! DOM events and the listener registry.
//!
//! Listeners are keyed by node, event type and an optional namespace. The
//! namespace exists so a caller can drop every listener it installed in one
//! call (`keydown` in namespace `modal`) without tracking ids.
//!
//! # Invariants
//!
//! - Listeners for one node run in registration order.
//! - Dispatch snapshots the listeners of each node before invoking them;
//!   listeners added or removed during a dispatch take effect on the next
//!   one.

use std::fmt;
use std::rc::Rc;

use crate::document::Document;
use crate::node::NodeId;

/// Key code of the Escape key.
pub const KEY_ESCAPE: u32 = 27;

/// Listener callback. Receives the document and the in-flight event.
pub type Listener = Rc<dyn Fn(&mut Document, &mut DomEvent)>;

/// Event types a listener can be bound to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum EventType {
    Click,
    KeyDown,
}

impl EventType {
    /// DOM name of the event type.
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Click => "click",
            Self::KeyDown => "keydown",
        }
    }
}

impl fmt::Display for EventType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Event payload.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EventKind {
    Click,
    KeyDown { key_code: u32 },
}

impl EventKind {
    pub const fn event_type(self) -> EventType {
        match self {
            Self::Click => EventType::Click,
            Self::KeyDown { .. } => EventType::KeyDown,
        }
    }
}

/// An event travelling from its target up to the document root.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DomEvent {
    kind: EventKind,
    target: NodeId,
    current_target: NodeId,
    default_prevented: bool,
    propagation_stopped: bool,
}

impl DomEvent {
    /// Create an event aimed at `target`.
    pub fn new(kind: EventKind, target: NodeId) -> Self {
        Self {
            kind,
            target,
            current_target: target,
            default_prevented: false,
            propagation_stopped: false,
        }
    }

    /// A click on `target`.
    pub fn click(target: NodeId) -> Self {
        Self::new(EventKind::Click, target)
    }

    /// A key press delivered to `target`.
    pub fn key_down(target: NodeId, key_code: u32) -> Self {
        Self::new(EventKind::KeyDown { key_code }, target)
    }

    #[inline]
    pub fn kind(&self) -> EventKind {
        self.kind
    }

    #[inline]
    pub fn event_type(&self) -> EventType {
        self.kind.event_type()
    }

    /// The node the event was originally aimed at.
    #[inline]
    pub fn target(&self) -> NodeId {
        self.target
    }

    /// The node whose listeners are currently running.
    #[inline]
    pub fn current_target(&self) -> NodeId {
        self.current_target
    }

    /// Key code for keyboard events.
    pub fn key_code(&self) -> Option<u32> {
        match self.kind {
            EventKind::KeyDown { key_code } => Some(key_code),
            EventKind::Click => None,
        }
    }

    pub fn prevent_default(&mut self) {
        self.default_prevented = true;
    }

    pub fn is_default_prevented(&self) -> bool {
        self.default_prevented
    }

    /// Stop bubbling after the current node's listeners have run.
    pub fn stop_propagation(&mut self) {
        self.propagation_stopped = true;
    }

    pub fn is_propagation_stopped(&self) -> bool {
        self.propagation_stopped
    }

    pub(crate) fn set_current_target(&mut self, node: NodeId) {
        self.current_target = node;
    }
}

/// Identifier returned by [`Document::on`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct ListenerId(u64);

struct ListenerEntry {
    id: ListenerId,
    node: NodeId,
    event_type: EventType,
    namespace: Option<String>,
    callback: Listener,
}

#[derive(Default)]
pub(crate) struct ListenerRegistry {
    entries: Vec<ListenerEntry>,
    next_id: u64,
}

impl ListenerRegistry {
    pub(crate) fn add(
        &mut self,
        node: NodeId,
        event_type: EventType,
        namespace: Option<&str>,
        callback: Listener,
    ) -> ListenerId {
        self.next_id += 1;
        let id = ListenerId(self.next_id);
        self.entries.push(ListenerEntry {
            id,
            node,
            event_type,
            namespace: namespace.map(str::to_owned),
            callback,
        });
        id
    }

    pub(crate) fn remove(&mut self, id: ListenerId) -> bool {
        let before = self.entries.len();
        self.entries.retain(|e| e.id != id);
        self.entries.len() != before
    }

    pub(crate) fn remove_namespace(
        &mut self,
        node: NodeId,
        event_type: EventType,
        namespace: &str,
    ) -> usize {
        let before = self.entries.len();
        self.entries.retain(|e| {
            !(e.node == node && e.event_type == event_type && e.namespace.as_deref() == Some(namespace))
        });
        before - self.entries.len()
    }

    pub(crate) fn remove_nodes(&mut self, nodes: &[NodeId]) {
        self.entries.retain(|e| !nodes.contains(&e.node));
    }

    pub(crate) fn count(&self, node: NodeId, event_type: EventType) -> usize {
        self.entries
            .iter()
            .filter(|e| e.node == node && e.event_type == event_type)
            .count()
    }

    pub(crate) fn snapshot(&self, node: NodeId, event_type: EventType) -> Vec<Listener> {
        self.entries
            .iter()
            .filter(|e| e.node == node && e.event_type == event_type)
            .map(|e| Rc::clone(&e.callback))
            .collect()
    }
}

impl fmt::Debug for ListenerRegistry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ListenerRegistry")
            .field("listeners", &self.entries.len())
            .finish()
    }
}
