#![forbid(unsafe_code)]

//! scrim: single-active modal dialogs over a headless, host-driven document.
//!
//! This crate re-exports:
//! - [`dom`] for the element tree, event dispatch and the virtual-clock job queue
//! - [`modal`] for the controller, lifecycle events and options
//!
//! Most applications only need the [`prelude`].
//!
//! ```
//! use scrim::prelude::*;
//!
//! let mut doc = Document::new();
//! let dialog = doc.create_element("div");
//! let modals = ModalController::new();
//!
//! modals.open(&mut doc, dialog, ModalOverrides::new()).unwrap();
//! assert_eq!(doc.parent(dialog), modals.current().and_then(|m| m.blocker()));
//!
//! modals.close(&mut doc, None);
//! doc.run_until_idle();
//! assert_eq!(doc.parent(dialog), Some(doc.body()));
//! ```

pub use scrim_dom as dom;
pub use scrim_modal as modal;

pub use scrim_dom::{Document, DomError, DomEvent, EventType, NodeId};
pub use scrim_modal::{
    LifecycleEvent, ModalController, ModalError, ModalEvent, ModalHandle, ModalOptions,
    ModalOverrides, ModalState, Subscription,
};

/// Common imports.
pub mod prelude {
    pub use scrim_dom::{Document, DomEvent, EventType, KEY_ESCAPE, NodeId};
    pub use scrim_modal::{
        LifecycleEvent, ModalController, ModalError, ModalEvent, ModalHandle, ModalOptions,
        ModalOverrides, ModalState, Subscription,
    };
}
