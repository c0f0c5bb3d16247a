#![forbid(unsafe_code)]

//! Headless document model for scrim.
//!
//! `scrim-dom` is the collaborator the modal controller drives: an element
//! tree with classes, styles and attributes, a listener registry with
//! namespaced removal and bubbling dispatch, and a job queue for timers and
//! opacity animations.
//!
//! The model is host-driven and deterministic. Nothing runs on its own: the
//! host mirrors the tree to a real surface and advances the clock with
//! [`Document::advance`], [`Document::run_until_idle`] or
//! [`Document::pump`]. Deferred continuations (animation completions,
//! zero-delay callbacks) therefore always run on a later turn than the call
//! that scheduled them.
//!
//! # Example
//!
//! ```
//! use scrim_dom::{Document, DomEvent};
//!
//! let mut doc = Document::new();
//! let body = doc.body();
//! let panel = doc.create_element("div");
//! doc.add_class(panel, "panel open").unwrap();
//! doc.append_child(body, panel).unwrap();
//!
//! doc.on(panel, scrim_dom::EventType::Click, None, |doc, event| {
//!     let target = event.target();
//!     doc.hide(target).unwrap();
//! })
//! .unwrap();
//!
//! doc.dispatch(DomEvent::click(panel)).unwrap();
//! assert!(!doc.is_visible(panel));
//! ```

mod document;
mod error;
mod event;
mod node;
mod scheduler;

pub use document::Document;
pub use error::DomError;
pub use event::{DomEvent, EventKind, EventType, KEY_ESCAPE, Listener, ListenerId};
pub use node::NodeId;
pub use scheduler::Job;
