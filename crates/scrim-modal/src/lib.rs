#![forbid(unsafe_code)]

//! Single-active modal controller for scrim.
//!
//! A [`ModalController`] shows one element at a time on top of a blocking
//! overlay, with an optional close control, Escape and click-outside
//! dismissal, and an on-demand loading spinner. Every step of the lifecycle
//! is reported to typed observers:
//!
//! ```text
//! open:  before-block → block → before-open → open
//! close: before-close → close → … → after-close
//! ```
//!
//! `after-close` is emitted from a deferred continuation, so it arrives on a
//! later turn of the document's job queue than `close`.
//!
//! # Fading
//!
//! [`ModalOptions`] carries `fade_duration`, `fade_delay` and `do_fade`, and
//! the instance keeps both the animated and the immediate path for every
//! transition. [`ModalController::open`] resets `do_fade` to `false` after
//! merging options, so in practice modals never fade.

mod controller;
mod error;
mod instance;
mod lifecycle;
mod options;

pub use controller::ModalController;
pub use error::ModalError;
pub use instance::{
    BLOCKER_CLASSES, CLOSE_CLASS, CURRENT_CLASS, KEY_NAMESPACE, ModalHandle, ModalId, ModalState,
};
pub use lifecycle::{LifecycleEvent, ModalEvent, Subscription};
pub use options::{ModalOptions, ModalOverrides};
