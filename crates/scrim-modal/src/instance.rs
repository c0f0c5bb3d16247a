#![forbid(unsafe_code)]

//! One open modal: its overlay, close control, spinner and state machine.
//!
//! # Invariants
//!
//! - State only moves forward: `Created → Blocked → Open → Closing → Closed`.
//! - While `Open`, the element is a child of the blocker and carries the
//!   modal class plus [`CURRENT_CLASS`].
//! - `Closed` is entered when the deferred hide completion runs, right
//!   before `AfterClose` is emitted.
//!
//! # Failure Modes
//!
//! - Document errors inside deferred continuations (fade completions, the
//!   delayed show) cannot be returned to a caller; they are logged.
//! - A delayed show whose instance has left `Blocked` is skipped.

use std::cell::RefCell;
use std::fmt;
use std::rc::{Rc, Weak};
use std::sync::atomic::{AtomicU64, Ordering};

use scrim_dom::{Document, DomEvent, EventType, KEY_ESCAPE, NodeId};
use tracing::{debug, trace, warn};

use crate::controller::ControllerInner;
use crate::error::ModalError;
use crate::lifecycle::{LifecycleEvent, ModalEvent};
use crate::options::ModalOptions;

/// Namespace of the document-level key listener.
pub const KEY_NAMESPACE: &str = "modal";
/// Classes of the overlay element.
pub const BLOCKER_CLASSES: &str = "scrim blocker";
/// Marker class of the generated close control.
pub const CLOSE_CLASS: &str = "close-modal";
/// Marker class of the element while it is displayed.
pub const CURRENT_CLASS: &str = "current";

const OVERFLOW: &str = "overflow";
const CLOSE_HREF: &str = "javascript:;";

static MODAL_ID_COUNTER: AtomicU64 = AtomicU64::new(1);

/// Unique identifier of a modal instance.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct ModalId(u64);

impl ModalId {
    pub(crate) fn next() -> Self {
        Self(MODAL_ID_COUNTER.fetch_add(1, Ordering::Relaxed))
    }

    /// Get the raw ID value.
    #[inline]
    pub const fn id(self) -> u64 {
        self.0
    }
}

impl fmt::Display for ModalId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "modal-{}", self.0)
    }
}

/// Lifecycle state of an instance.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum ModalState {
    Created,
    Blocked,
    Open,
    Closing,
    Closed,
}

struct Instance {
    id: ModalId,
    element: NodeId,
    options: Rc<ModalOptions>,
    blocker: Option<NodeId>,
    close_button: Option<NodeId>,
    spinner: Option<NodeId>,
    state: ModalState,
}

/// Shared handle to a modal instance.
///
/// Handles are cheap to clone. A handle outlives its modal: once closed it
/// keeps answering queries and its spinner methods keep working.
#[derive(Clone)]
pub struct ModalHandle {
    inner: Rc<RefCell<Instance>>,
    controller: Weak<ControllerInner>,
}

impl ModalHandle {
    pub(crate) fn new(
        controller: Weak<ControllerInner>,
        element: NodeId,
        options: ModalOptions,
    ) -> Self {
        Self {
            inner: Rc::new(RefCell::new(Instance {
                id: ModalId::next(),
                element,
                options: Rc::new(options),
                blocker: None,
                close_button: None,
                spinner: None,
                state: ModalState::Created,
            })),
            controller,
        }
    }

    pub fn id(&self) -> ModalId {
        self.inner.borrow().id
    }

    /// The element being displayed.
    pub fn element(&self) -> NodeId {
        self.inner.borrow().element
    }

    /// The overlay, once created. Removed from the document on close.
    pub fn blocker(&self) -> Option<NodeId> {
        self.inner.borrow().blocker
    }

    pub fn close_button(&self) -> Option<NodeId> {
        self.inner.borrow().close_button
    }

    /// The cached spinner element, if one was ever shown.
    pub fn spinner(&self) -> Option<NodeId> {
        self.inner.borrow().spinner
    }

    /// Resolved options.
    pub fn options(&self) -> Rc<ModalOptions> {
        Rc::clone(&self.inner.borrow().options)
    }

    pub fn state(&self) -> ModalState {
        self.inner.borrow().state
    }

    /// Whether close has started (or finished).
    pub fn is_closed(&self) -> bool {
        self.state() >= ModalState::Closing
    }

    fn set_state(&self, next: ModalState) {
        let mut inner = self.inner.borrow_mut();
        if next > inner.state {
            trace!(modal = %inner.id, from = ?inner.state, to = ?next, "state transition");
            inner.state = next;
        }
    }

    fn emit(&self, kind: LifecycleEvent) {
        let event = {
            let inner = self.inner.borrow();
            ModalEvent {
                kind,
                modal: inner.id,
                element: inner.element,
                blocker: inner.blocker,
                options: Rc::clone(&inner.options),
            }
        };
        trace!(modal = %event.modal, event = %kind, "lifecycle event");
        if let Some(controller) = self.controller.upgrade() {
            controller.observers.notify(&event);
        }
    }

    // --- Open path ---

    /// Block, show, and bind the dismissal listeners.
    pub(crate) fn open(&self, doc: &mut Document) -> Result<(), ModalError> {
        let options = self.options();
        self.block(doc)?;

        if options.fades() {
            let handle = self.clone();
            doc.set_timeout(options.show_delay(), move |doc| {
                if handle.state() != ModalState::Blocked {
                    debug!(modal = %handle.id(), "delayed show skipped; modal already closing");
                    return;
                }
                if let Err(err) = handle.show(doc) {
                    warn!(modal = %handle.id(), error = %err, "delayed show failed");
                }
            });
        } else {
            self.show(doc)?;
        }

        if options.escape_close {
            let controller = self.controller.clone();
            let root = doc.root();
            doc.on(root, EventType::KeyDown, Some(KEY_NAMESPACE), move |doc, event| {
                if event.key_code() != Some(KEY_ESCAPE) {
                    return;
                }
                if let Some(controller) = controller.upgrade() {
                    controller.close(doc, Some(event));
                }
            })?;
        }

        if options.click_close
            && let Some(blocker) = self.blocker()
        {
            let controller = self.controller.clone();
            doc.on(blocker, EventType::Click, None, move |doc, event| {
                // Clicks inside the modal bubble up here too; only the overlay
                // itself dismisses.
                if event.target() != event.current_target() {
                    return;
                }
                if let Some(controller) = controller.upgrade() {
                    controller.close(doc, None);
                }
            })?;
        }

        Ok(())
    }

    fn block(&self, doc: &mut Document) -> Result<(), ModalError> {
        self.emit(LifecycleEvent::BeforeBlock);
        let options = self.options();
        let body = doc.body();

        let blocker = doc.create_element("div");
        doc.add_class(blocker, BLOCKER_CLASSES)?;
        self.inner.borrow_mut().blocker = Some(blocker);

        doc.set_style(body, OVERFLOW, "hidden")?;
        doc.append_child(body, blocker)?;
        if options.fades() {
            doc.animate_opacity(blocker, 0.0, 1.0, options.fade_duration_or_zero(), |_| {})?;
        }

        self.set_state(ModalState::Blocked);
        self.emit(LifecycleEvent::Block);
        Ok(())
    }

    fn show(&self, doc: &mut Document) -> Result<(), ModalError> {
        self.emit(LifecycleEvent::BeforeOpen);
        let options = self.options();
        let element = self.element();

        if options.show_close {
            let button = doc.create_element("a");
            doc.set_attr(button, "href", CLOSE_HREF)?;
            doc.add_class(button, CLOSE_CLASS)?;
            doc.add_class(button, &options.close_class)?;
            doc.set_text(button, &options.close_text)?;
            doc.append_child(element, button)?;

            let handle = self.clone();
            doc.on(button, EventType::Click, None, move |doc, event| {
                handle.dismiss(doc, Some(event));
            })?;
            self.inner.borrow_mut().close_button = Some(button);
        }

        doc.add_class(element, &options.modal_class)?;
        doc.add_class(element, CURRENT_CLASS)?;
        if let Some(blocker) = self.blocker() {
            doc.append_child(blocker, element)?;
        }

        if options.fades() {
            doc.show(element)?;
            doc.animate_opacity(element, 0.0, 1.0, options.fade_duration_or_zero(), |_| {})?;
        } else {
            doc.show(element)?;
        }

        self.set_state(ModalState::Open);
        self.emit(LifecycleEvent::Open);
        Ok(())
    }

    // --- Close path ---

    /// Close through the controller when this is the current modal, so the
    /// current reference is cleared; otherwise tear the instance down alone.
    fn dismiss(&self, doc: &mut Document, event: Option<&mut DomEvent>) -> Option<NodeId> {
        if let Some(controller) = self.controller.upgrade()
            && controller.is_current(self.id())
        {
            return controller.close(doc, event);
        }
        if let Some(event) = event {
            event.prevent_default();
        }
        match self.teardown(doc) {
            Ok(true) => Some(self.element()),
            Ok(false) => None,
            Err(err) => {
                warn!(modal = %self.id(), error = %err, "modal teardown failed");
                None
            }
        }
    }

    /// Close this modal. Returns the element, or `None` when it was already
    /// closing or closed.
    pub fn close(&self, doc: &mut Document) -> Option<NodeId> {
        if self.is_closed() {
            return None;
        }
        self.dismiss(doc, None)
    }

    /// Unblock, hide, and drop the document key listener.
    ///
    /// Returns `false` when the instance was already closing.
    pub(crate) fn teardown(&self, doc: &mut Document) -> Result<bool, ModalError> {
        if self.is_closed() {
            return Ok(false);
        }
        self.set_state(ModalState::Closing);
        debug!(modal = %self.id(), "closing modal");

        self.unblock(doc)?;
        self.hide(doc)?;
        let root = doc.root();
        doc.off_namespace(root, EventType::KeyDown, KEY_NAMESPACE);
        Ok(true)
    }

    fn unblock(&self, doc: &mut Document) -> Result<(), ModalError> {
        let Some(blocker) = self.blocker() else {
            return Ok(());
        };
        let options = self.options();
        let body = doc.body();

        if options.fades() {
            let id = self.id();
            doc.fade_out(blocker, options.fade_duration_or_zero(), move |doc| {
                if let Err(err) = release_blocker(doc, blocker, body) {
                    warn!(modal = %id, error = %err, "deferred unblock failed");
                }
            })?;
        } else {
            release_blocker(doc, blocker, body)?;
        }
        Ok(())
    }

    fn hide(&self, doc: &mut Document) -> Result<(), ModalError> {
        self.emit(LifecycleEvent::BeforeClose);
        let options = self.options();
        let element = self.element();

        let button = self.inner.borrow_mut().close_button.take();
        if let Some(button) = button {
            doc.remove(button)?;
        }
        doc.remove_class(element, CURRENT_CLASS)?;

        let handle = self.clone();
        doc.hide_then(element, options.fade_duration_or_zero(), move |_| {
            handle.set_state(ModalState::Closed);
            handle.emit(LifecycleEvent::AfterClose);
        })?;

        // Emitted before the hide completion has run.
        self.emit(LifecycleEvent::Close);
        Ok(())
    }

    // --- Spinner ---

    /// Show the loading spinner, creating it on first use.
    ///
    /// No-op when the `show_spinner` option is off.
    pub fn show_spinner(&self, doc: &mut Document) -> Result<(), ModalError> {
        let options = self.options();
        if !options.show_spinner {
            return Ok(());
        }
        let spinner = match self.spinner() {
            Some(spinner) => spinner,
            None => {
                let spinner = doc.create_element("div");
                doc.add_class(spinner, &options.spinner_class())?;
                if let Some(markup) = &options.spinner_html {
                    doc.set_inner_html(spinner, markup)?;
                }
                self.inner.borrow_mut().spinner = Some(spinner);
                spinner
            }
        };
        let body = doc.body();
        doc.append_child(body, spinner)?;
        doc.show(spinner)?;
        Ok(())
    }

    /// Remove the spinner from the document. The element stays cached.
    pub fn hide_spinner(&self, doc: &mut Document) -> Result<(), ModalError> {
        if let Some(spinner) = self.spinner() {
            doc.remove(spinner)?;
        }
        Ok(())
    }
}

/// Hand the overlay's children back to the body, drop the overlay and let the
/// page scroll again.
fn release_blocker(doc: &mut Document, blocker: NodeId, body: NodeId) -> Result<(), ModalError> {
    doc.move_children(blocker, body)?;
    doc.remove(blocker)?;
    doc.remove_style(body, OVERFLOW)?;
    Ok(())
}

impl PartialEq for ModalHandle {
    fn eq(&self, other: &Self) -> bool {
        Rc::ptr_eq(&self.inner, &other.inner)
    }
}

impl Eq for ModalHandle {}

impl fmt::Debug for ModalHandle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let inner = self.inner.borrow();
        f.debug_struct("ModalHandle")
            .field("id", &inner.id)
            .field("element", &inner.element)
            .field("blocker", &inner.blocker)
            .field("state", &inner.state)
            .finish()
    }
}
