#![forbid(unsafe_code)]

//! Typed lifecycle events and the observer registry.
//!
//! Observers subscribe per [`LifecycleEvent`] (or to all of them) and get a
//! [`Subscription`] guard back; dropping the guard unsubscribes.
//!
//! # Invariants
//!
//! 1. Observers run in registration order.
//! 2. The observer list is snapshotted before a notification, so an observer
//!    may subscribe, unsubscribe or call back into the controller.
//! 3. Dropping a [`Subscription`] removes the callback before the next
//!    notification.

use std::cell::{Cell, RefCell};
use std::fmt;
use std::rc::{Rc, Weak};

use scrim_dom::NodeId;

use crate::instance::ModalId;
use crate::options::ModalOptions;

/// Lifecycle events of a modal, in the order a full open/close cycle emits
/// them, followed by the reserved AJAX names.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum LifecycleEvent {
    BeforeBlock,
    Block,
    BeforeOpen,
    Open,
    BeforeClose,
    Close,
    AfterClose,
    /// Reserved for content loaders; never emitted by the controller.
    AjaxSend,
    /// Reserved for content loaders; never emitted by the controller.
    AjaxSuccess,
    /// Reserved for content loaders; never emitted by the controller.
    AjaxFail,
    /// Reserved for content loaders; never emitted by the controller.
    AjaxComplete,
}

impl LifecycleEvent {
    /// Every event, emitted ones first.
    pub const ALL: [LifecycleEvent; 11] = [
        Self::BeforeBlock,
        Self::Block,
        Self::BeforeOpen,
        Self::Open,
        Self::BeforeClose,
        Self::Close,
        Self::AfterClose,
        Self::AjaxSend,
        Self::AjaxSuccess,
        Self::AjaxFail,
        Self::AjaxComplete,
    ];

    /// Namespaced event name, e.g. `modal:before-block`.
    pub const fn name(self) -> &'static str {
        match self {
            Self::BeforeBlock => "modal:before-block",
            Self::Block => "modal:block",
            Self::BeforeOpen => "modal:before-open",
            Self::Open => "modal:open",
            Self::BeforeClose => "modal:before-close",
            Self::Close => "modal:close",
            Self::AfterClose => "modal:after-close",
            Self::AjaxSend => "modal:ajax:send",
            Self::AjaxSuccess => "modal:ajax:success",
            Self::AjaxFail => "modal:ajax:fail",
            Self::AjaxComplete => "modal:ajax:complete",
        }
    }

    /// Parse a namespaced event name.
    pub fn from_name(name: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|e| e.name() == name)
    }

    /// Whether the controller itself never emits this event.
    pub const fn is_reserved(self) -> bool {
        matches!(
            self,
            Self::AjaxSend | Self::AjaxSuccess | Self::AjaxFail | Self::AjaxComplete
        )
    }
}

impl fmt::Display for LifecycleEvent {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// Payload delivered to observers.
#[derive(Debug, Clone)]
pub struct ModalEvent {
    pub kind: LifecycleEvent,
    pub modal: ModalId,
    /// The element being displayed.
    pub element: NodeId,
    /// The overlay; `None` before it is created.
    pub blocker: Option<NodeId>,
    /// Resolved options of the instance.
    pub options: Rc<ModalOptions>,
}

type Callback = Rc<dyn Fn(&ModalEvent)>;

struct Entry {
    id: u64,
    filter: Option<LifecycleEvent>,
    callback: Callback,
}

#[derive(Default)]
pub(crate) struct Observers {
    entries: RefCell<Vec<Entry>>,
    next_id: Cell<u64>,
}

impl Observers {
    pub(crate) fn subscribe(
        self: &Rc<Self>,
        filter: Option<LifecycleEvent>,
        callback: impl Fn(&ModalEvent) + 'static,
    ) -> Subscription {
        let id = self.next_id.get() + 1;
        self.next_id.set(id);
        self.entries.borrow_mut().push(Entry {
            id,
            filter,
            callback: Rc::new(callback),
        });
        Subscription {
            observers: Rc::downgrade(self),
            id,
        }
    }

    fn unsubscribe(&self, id: u64) {
        self.entries.borrow_mut().retain(|e| e.id != id);
    }

    pub(crate) fn notify(&self, event: &ModalEvent) {
        let callbacks: Vec<Callback> = self
            .entries
            .borrow()
            .iter()
            .filter(|e| e.filter.is_none_or(|f| f == event.kind))
            .map(|e| Rc::clone(&e.callback))
            .collect();
        for callback in callbacks {
            callback(event);
        }
    }

    pub(crate) fn len(&self) -> usize {
        self.entries.borrow().len()
    }
}

impl fmt::Debug for Observers {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Observers")
            .field("count", &self.len())
            .finish()
    }
}

/// RAII guard for a lifecycle observer. Dropping it unsubscribes.
#[must_use = "dropping a Subscription unsubscribes the observer"]
pub struct Subscription {
    observers: Weak<Observers>,
    id: u64,
}

impl Subscription {
    /// Keep the observer registered for the lifetime of the controller.
    pub fn forget(mut self) {
        self.observers = Weak::new();
    }
}

impl Drop for Subscription {
    fn drop(&mut self) {
        if let Some(observers) = self.observers.upgrade() {
            observers.unsubscribe(self.id);
        }
    }
}

impl fmt::Debug for Subscription {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Subscription").field("id", &self.id).finish()
    }
}
