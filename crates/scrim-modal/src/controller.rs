#![forbid(unsafe_code)]

//! The modal controller: at most one active modal per controller.
//!
//! `ModalController` owns the defaults, the current instance and the
//! lifecycle observers. It is a cheap `Rc` handle; clone it into whatever
//! needs to open or close modals.
//!
//! # Invariants
//!
//! - At most one instance is current. `open` closes the current instance
//!   synchronously before creating the new one; there is no queueing.
//! - The current reference is cleared by `close` only if it still points at
//!   the instance being closed.
//! - Every instance created by `open` has `do_fade == false`.
//!
//! # Example
//!
//! ```
//! use scrim_dom::Document;
//! use scrim_modal::{LifecycleEvent, ModalController, ModalOverrides};
//!
//! let mut doc = Document::new();
//! let dialog = doc.create_element("div");
//!
//! let modals = ModalController::new();
//! let _sub = modals.on(LifecycleEvent::AfterClose, |event| {
//!     println!("{} closed", event.modal);
//! });
//!
//! let handle = modals
//!     .open(&mut doc, dialog, ModalOverrides::new().show_close(false))
//!     .unwrap();
//! assert!(modals.is_active());
//! assert!(!handle.options().show_close);
//!
//! doc.press_escape().unwrap();
//! assert!(!modals.is_active());
//! doc.run_until_idle();
//! ```

use std::cell::{RefCell, RefMut};
use std::fmt;
use std::rc::Rc;

use scrim_dom::{Document, DomError, DomEvent, NodeId};
use tracing::{debug, error};

use crate::error::ModalError;
use crate::instance::{ModalHandle, ModalId};
use crate::lifecycle::{LifecycleEvent, ModalEvent, Observers, Subscription};
use crate::options::{ModalOptions, ModalOverrides};

#[derive(Default)]
pub(crate) struct ControllerInner {
    defaults: RefCell<ModalOptions>,
    current: RefCell<Option<ModalHandle>>,
    pub(crate) observers: Rc<Observers>,
}

impl ControllerInner {
    pub(crate) fn is_current(&self, id: ModalId) -> bool {
        self.current
            .borrow()
            .as_ref()
            .is_some_and(|current| current.id() == id)
    }

    pub(crate) fn close(&self, doc: &mut Document, event: Option<&mut DomEvent>) -> Option<NodeId> {
        let current = self.current.borrow().clone()?;
        if let Some(event) = event {
            event.prevent_default();
        }

        if let Err(err) = current.teardown(doc) {
            error!(modal = %current.id(), error = %err, "modal teardown failed");
        }

        {
            let mut slot = self.current.borrow_mut();
            if slot.as_ref() == Some(&current) {
                *slot = None;
            }
        }

        debug!(modal = %current.id(), "modal closed");
        Some(current.element())
    }
}

/// Controller for a single active modal.
#[derive(Clone, Default)]
pub struct ModalController {
    inner: Rc<ControllerInner>,
}

impl ModalController {
    /// Create a controller with the built-in defaults.
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a controller with custom defaults.
    pub fn with_defaults(defaults: ModalOptions) -> Self {
        let controller = Self::new();
        controller.set_defaults(defaults);
        controller
    }

    /// Defaults that overrides are merged onto.
    pub fn defaults(&self) -> ModalOptions {
        self.inner.defaults.borrow().clone()
    }

    /// Mutable access to the defaults. Affects modals opened afterwards.
    pub fn defaults_mut(&self) -> RefMut<'_, ModalOptions> {
        self.inner.defaults.borrow_mut()
    }

    pub fn set_defaults(&self, defaults: ModalOptions) {
        *self.inner.defaults.borrow_mut() = defaults;
    }

    /// Open `element` as the active modal.
    ///
    /// Any current modal is closed first. The element is moved into the
    /// body, then into a new overlay. Escape and overlay-click listeners are
    /// bound according to the resolved options.
    ///
    /// # Errors
    ///
    /// Returns [`ModalError::Dom`] when `element` does not belong to `doc`,
    /// or is the body or document root. The current modal is left untouched
    /// when the element is unknown.
    pub fn open(
        &self,
        doc: &mut Document,
        element: NodeId,
        overrides: ModalOverrides,
    ) -> Result<ModalHandle, ModalError> {
        if !doc.contains(element) {
            return Err(DomError::UnknownNode(element).into());
        }
        self.close(doc, None);

        let mut options = overrides.apply_to(&self.inner.defaults.borrow());
        // Fading is switched off after every merge, whatever the caller or
        // the defaults asked for. This leaves fade_duration and fade_delay
        // without effect and is most likely unintended; it is kept as-is.
        options.do_fade = false;

        self.open_resolved(doc, element, options)
    }

    /// Open with already-resolved options; skips the merge and fade reset.
    pub(crate) fn open_resolved(
        &self,
        doc: &mut Document,
        element: NodeId,
        options: ModalOptions,
    ) -> Result<ModalHandle, ModalError> {
        let handle = ModalHandle::new(Rc::downgrade(&self.inner), element, options);
        let body = doc.body();
        doc.append_child(body, element)?;
        handle.open(doc)?;

        debug!(modal = %handle.id(), element = %element, "modal opened");
        *self.inner.current.borrow_mut() = Some(handle.clone());
        Ok(handle)
    }

    /// Close the active modal.
    ///
    /// A triggering event, if given, has its default action prevented.
    /// Returns the modal's element, or `None` when nothing was open.
    pub fn close(&self, doc: &mut Document, event: Option<&mut DomEvent>) -> Option<NodeId> {
        self.inner.close(doc, event)
    }

    /// Whether a modal is currently active.
    pub fn is_active(&self) -> bool {
        self.inner.current.borrow().is_some()
    }

    /// Handle of the active modal.
    pub fn current(&self) -> Option<ModalHandle> {
        self.inner.current.borrow().clone()
    }

    /// Observe one lifecycle event.
    pub fn on(
        &self,
        kind: LifecycleEvent,
        callback: impl Fn(&ModalEvent) + 'static,
    ) -> Subscription {
        self.inner.observers.subscribe(Some(kind), callback)
    }

    /// Observe every lifecycle event.
    pub fn subscribe(&self, callback: impl Fn(&ModalEvent) + 'static) -> Subscription {
        self.inner.observers.subscribe(None, callback)
    }
}

impl fmt::Debug for ModalController {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ModalController")
            .field("current", &self.inner.current.borrow())
            .field("observers", &self.inner.observers)
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::instance::{BLOCKER_CLASSES, ModalState};
    use pretty_assertions::assert_eq;
    use std::cell::RefCell;
    use std::time::Duration;

    fn ms(v: u64) -> Duration {
        Duration::from_millis(v)
    }

    fn record(controller: &ModalController) -> (Rc<RefCell<Vec<LifecycleEvent>>>, Subscription) {
        let log = Rc::new(RefCell::new(Vec::new()));
        let sink = Rc::clone(&log);
        let sub = controller.subscribe(move |e| sink.borrow_mut().push(e.kind));
        (log, sub)
    }

    fn fading() -> ModalOptions {
        let mut options = ModalOptions::default()
            .fade_duration(ms(200))
            .fade_delay(0.5);
        options.do_fade = true;
        options
    }

    #[test]
    fn open_forces_fade_off() {
        let mut doc = Document::new();
        let el = doc.create_element("div");
        let controller = ModalController::with_defaults(fading());
        let handle = controller
            .open(&mut doc, el, ModalOverrides::new().do_fade(true))
            .unwrap();

        assert!(!handle.options().do_fade);
        assert_eq!(handle.options().fade_duration, Some(ms(200)));
        assert_eq!(handle.state(), ModalState::Open);
        assert_eq!(doc.pending_jobs(), 0);
    }

    #[test]
    fn unknown_element_leaves_current_modal_open() {
        let mut doc = Document::new();
        let el = doc.create_element("div");
        let controller = ModalController::new();
        let first = controller.open(&mut doc, el, ModalOverrides::new()).unwrap();

        // Same arena index as `el`, different document.
        let mut other = Document::new();
        let foreign = other.create_element("div");
        assert_eq!(foreign.index(), el.index());

        let err = controller.open(&mut doc, foreign, ModalOverrides::new());
        assert!(matches!(err, Err(ModalError::Dom(DomError::UnknownNode(_)))));
        assert_eq!(controller.current(), Some(first.clone()));
        assert_eq!(doc.parent(el), first.blocker());
        assert_eq!(other.parent(foreign), None);
    }

    #[test]
    fn body_cannot_be_a_modal() {
        let mut doc = Document::new();
        let controller = ModalController::new();
        let body = doc.body();
        let err = controller.open(&mut doc, body, ModalOverrides::new());
        assert!(matches!(
            err,
            Err(ModalError::Dom(DomError::CycleDetected { .. }))
        ));
        assert!(!controller.is_active());
    }

    #[test]
    fn defaults_mut_affects_later_opens() {
        let mut doc = Document::new();
        let el = doc.create_element("div");
        let controller = ModalController::new();
        controller.defaults_mut().close_text = "Dismiss".to_owned();

        let handle = controller.open(&mut doc, el, ModalOverrides::new()).unwrap();
        let button = handle.close_button().unwrap();
        assert_eq!(doc.text(button), Some("Dismiss"));
        assert_eq!(controller.defaults().close_text, "Dismiss");
    }

    #[test]
    fn fade_path_delays_show_and_defers_unblock() {
        let mut doc = Document::new();
        let el = doc.create_element("div");
        let controller = ModalController::new();
        let (log, _sub) = record(&controller);

        let handle = controller.open_resolved(&mut doc, el, fading()).unwrap();
        let blocker = handle.blocker().unwrap();
        assert_eq!(handle.state(), ModalState::Blocked);
        assert_eq!(doc.style(blocker, "opacity"), Some("0"));
        assert_eq!(
            *log.borrow(),
            vec![LifecycleEvent::BeforeBlock, LifecycleEvent::Block]
        );

        // show fires at fade_duration * fade_delay = 100ms
        doc.advance(ms(100));
        assert_eq!(handle.state(), ModalState::Open);
        assert_eq!(doc.style(blocker, "opacity"), Some("0.5"));
        assert_eq!(doc.parent(el), Some(blocker));

        doc.advance(ms(200));
        assert_eq!(doc.style(el, "opacity"), Some("1"));

        controller.close(&mut doc, None);
        // The overlay is still fading out.
        assert!(doc.is_attached(blocker));
        assert_eq!(doc.style(doc.body(), "overflow"), Some("hidden"));

        doc.run_until_idle();
        assert!(!doc.is_attached(blocker));
        assert_eq!(doc.parent(el), Some(doc.body()));
        assert_eq!(doc.style(doc.body(), "overflow"), None);
        assert!(!doc.is_visible(el));
        assert_eq!(handle.state(), ModalState::Closed);
        assert_eq!(
            *log.borrow(),
            vec![
                LifecycleEvent::BeforeBlock,
                LifecycleEvent::Block,
                LifecycleEvent::BeforeOpen,
                LifecycleEvent::Open,
                LifecycleEvent::BeforeClose,
                LifecycleEvent::Close,
                LifecycleEvent::AfterClose,
            ]
        );
    }

    #[test]
    fn close_before_delayed_show_skips_it() {
        let mut doc = Document::new();
        let el = doc.create_element("div");
        let controller = ModalController::new();
        let (log, _sub) = record(&controller);

        let handle = controller.open_resolved(&mut doc, el, fading()).unwrap();
        controller.close(&mut doc, None);
        doc.run_until_idle();

        assert_eq!(handle.state(), ModalState::Closed);
        assert!(!log.borrow().contains(&LifecycleEvent::Open));
        assert!(handle.close_button().is_none());
        assert!(doc.query_class("close-modal").is_empty());
    }

    #[test]
    fn observers_see_active_modal_until_close_returns() {
        let mut doc = Document::new();
        let el = doc.create_element("div");
        let controller = ModalController::new();
        let probe = controller.clone();
        let seen = Rc::new(RefCell::new(Vec::new()));
        let sink = Rc::clone(&seen);
        let _sub = controller.on(LifecycleEvent::Close, move |_| {
            sink.borrow_mut().push(probe.is_active());
        });

        controller.open(&mut doc, el, ModalOverrides::new()).unwrap();
        controller.close(&mut doc, None);
        assert_eq!(*seen.borrow(), vec![true]);
        assert!(!controller.is_active());
    }

    #[test]
    fn blocker_carries_overlay_classes() {
        let mut doc = Document::new();
        let el = doc.create_element("div");
        let controller = ModalController::new();
        let handle = controller.open(&mut doc, el, ModalOverrides::new()).unwrap();
        let blocker = handle.blocker().unwrap();
        for class in BLOCKER_CLASSES.split_whitespace() {
            assert!(doc.has_class(blocker, class));
        }
    }

    #[test]
    fn debug_output_names_current_modal() {
        let mut doc = Document::new();
        let el = doc.create_element("div");
        let controller = ModalController::new();
        controller.open(&mut doc, el, ModalOverrides::new()).unwrap();
        let text = format!("{controller:?}");
        assert!(text.contains("ModalHandle"));
        assert!(text.contains("Open"));
    }
}
