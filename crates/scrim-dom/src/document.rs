#![forbid(unsafe_code)]

//! The document tree and its event loop.
//!
//! # Invariants
//!
//! - Every node except the root has at most one parent, and appears exactly
//!   once in that parent's `children`.
//! - The tree is acyclic: `append_child` refuses to put a node under one of
//!   its own descendants.
//! - Node handles stay valid forever; `remove` only detaches. Slots are
//!   never reclaimed, so the arena grows by every element ever created
//!   (a modal open/close cycle adds its overlay and close control).
//! - A handle is only accepted by the document that created it.
//!
//! # Failure Modes
//!
//! - Mutations on a handle from another document return
//!   [`DomError::UnknownNode`], whatever its index; queries return
//!   empty/false.
//! - Moving or removing the root returns [`DomError::RootNotMovable`].

use std::fmt::Write as _;
use std::rc::Rc;
use std::sync::atomic::{AtomicU32, Ordering};
use std::time::Duration;

use web_time::Instant;

use crate::error::DomError;
use crate::event::{DomEvent, EventType, KEY_ESCAPE, Listener, ListenerId, ListenerRegistry};
use crate::node::{ElementData, NodeId};
use crate::scheduler::{Job, MAX_JOBS_PER_ADVANCE, Scheduler, format_opacity};

const OPACITY: &str = "opacity";

static DOCUMENT_ID_COUNTER: AtomicU32 = AtomicU32::new(1);

/// Headless document: element arena, listeners and job queue.
#[derive(Debug)]
pub struct Document {
    id: u32,
    nodes: Vec<ElementData>,
    root: NodeId,
    body: NodeId,
    listeners: ListenerRegistry,
    scheduler: Scheduler,
}

impl Default for Document {
    fn default() -> Self {
        Self::new()
    }
}

impl Document {
    /// Create a document containing a root node and an attached `<body>`.
    pub fn new() -> Self {
        let id = DOCUMENT_ID_COUNTER.fetch_add(1, Ordering::Relaxed);
        let root = NodeId::new(id, 0);
        let body = NodeId::new(id, 1);
        let mut root_data = ElementData::new("#document");
        root_data.children.push(body);
        let mut body_data = ElementData::new("body");
        body_data.parent = Some(root);

        Self {
            id,
            nodes: vec![root_data, body_data],
            root,
            body,
            listeners: ListenerRegistry::default(),
            scheduler: Scheduler::default(),
        }
    }

    /// The document node. Document-level listeners bind here.
    #[inline]
    pub fn root(&self) -> NodeId {
        self.root
    }

    #[inline]
    pub fn body(&self) -> NodeId {
        self.body
    }

    fn node(&self, id: NodeId) -> Result<&ElementData, DomError> {
        if id.doc() != self.id {
            return Err(DomError::UnknownNode(id));
        }
        self.nodes.get(id.index()).ok_or(DomError::UnknownNode(id))
    }

    fn node_mut(&mut self, id: NodeId) -> Result<&mut ElementData, DomError> {
        if id.doc() != self.id {
            return Err(DomError::UnknownNode(id));
        }
        self.nodes.get_mut(id.index()).ok_or(DomError::UnknownNode(id))
    }

    /// Whether `id` was created by this document (attached or not).
    pub fn contains(&self, id: NodeId) -> bool {
        self.node(id).is_ok()
    }

    /// Number of element slots, including detached and removed elements.
    pub fn node_count(&self) -> usize {
        self.nodes.len()
    }

    // --- Tree ---

    /// Create a detached element.
    pub fn create_element(&mut self, tag: &str) -> NodeId {
        let id = NodeId::new(self.id, self.nodes.len());
        self.nodes.push(ElementData::new(tag));
        id
    }

    pub fn tag(&self, id: NodeId) -> Option<&str> {
        self.node(id).ok().map(|n| n.tag.as_str())
    }

    pub fn parent(&self, id: NodeId) -> Option<NodeId> {
        self.node(id).ok().and_then(|n| n.parent)
    }

    pub fn children(&self, id: NodeId) -> &[NodeId] {
        self.node(id).map(|n| n.children.as_slice()).unwrap_or(&[])
    }

    /// Whether `node` is a strict descendant of `ancestor`.
    pub fn is_descendant_of(&self, node: NodeId, ancestor: NodeId) -> bool {
        let mut cursor = self.parent(node);
        while let Some(p) = cursor {
            if p == ancestor {
                return true;
            }
            cursor = self.parent(p);
        }
        false
    }

    /// Whether `node` is reachable from the document root.
    pub fn is_attached(&self, node: NodeId) -> bool {
        node == self.root || self.is_descendant_of(node, self.root)
    }

    /// Append `child` as the last child of `parent`, detaching it from any
    /// previous parent first.
    pub fn append_child(&mut self, parent: NodeId, child: NodeId) -> Result<(), DomError> {
        self.node(parent)?;
        self.node(child)?;
        if child == self.root {
            return Err(DomError::RootNotMovable);
        }
        if parent == child || self.is_descendant_of(parent, child) {
            return Err(DomError::CycleDetected { parent, child });
        }
        self.unlink(child);
        self.node_mut(parent)?.children.push(child);
        self.node_mut(child)?.parent = Some(parent);
        Ok(())
    }

    /// Move every child of `from` to the end of `to`, preserving order.
    pub fn move_children(&mut self, from: NodeId, to: NodeId) -> Result<(), DomError> {
        let children = self.node(from)?.children.clone();
        for child in children {
            self.append_child(to, child)?;
        }
        Ok(())
    }

    /// Detach `node` from its parent, keeping its listeners.
    pub fn detach(&mut self, node: NodeId) -> Result<(), DomError> {
        self.node(node)?;
        if node == self.root {
            return Err(DomError::RootNotMovable);
        }
        self.unlink(node);
        Ok(())
    }

    /// Detach `node` and drop the listeners of its whole subtree.
    pub fn remove(&mut self, node: NodeId) -> Result<(), DomError> {
        self.detach(node)?;
        let subtree = self.subtree(node);
        self.listeners.remove_nodes(&subtree);
        Ok(())
    }

    fn unlink(&mut self, child: NodeId) {
        let Some(old_parent) = self.nodes[child.index()].parent.take() else {
            return;
        };
        self.nodes[old_parent.index()].children.retain(|&c| c != child);
    }

    /// `node` and all of its descendants, pre-order.
    fn subtree(&self, node: NodeId) -> Vec<NodeId> {
        let mut out = Vec::new();
        let mut stack = vec![node];
        while let Some(n) = stack.pop() {
            out.push(n);
            stack.extend(self.children(n).iter().rev().copied());
        }
        out
    }

    /// Attached elements carrying `class`, in document order.
    pub fn query_class(&self, class: &str) -> Vec<NodeId> {
        self.subtree(self.root)
            .into_iter()
            .filter(|&n| self.has_class(n, class))
            .collect()
    }

    // --- Classes, styles, attributes, content ---

    /// Add one or more space-separated classes. Existing classes are kept once.
    pub fn add_class(&mut self, node: NodeId, classes: &str) -> Result<(), DomError> {
        let data = self.node_mut(node)?;
        for class in classes.split_whitespace() {
            if !data.classes.iter().any(|c| c == class) {
                data.classes.push(class.to_owned());
            }
        }
        Ok(())
    }

    /// Remove one or more space-separated classes.
    pub fn remove_class(&mut self, node: NodeId, classes: &str) -> Result<(), DomError> {
        let data = self.node_mut(node)?;
        for class in classes.split_whitespace() {
            data.classes.retain(|c| c != class);
        }
        Ok(())
    }

    pub fn has_class(&self, node: NodeId, class: &str) -> bool {
        self.node(node)
            .map(|n| n.classes.iter().any(|c| c == class))
            .unwrap_or(false)
    }

    pub fn classes(&self, node: NodeId) -> &[String] {
        self.node(node).map(|n| n.classes.as_slice()).unwrap_or(&[])
    }

    /// Set an inline style. An empty value removes the property.
    pub fn set_style(&mut self, node: NodeId, property: &str, value: &str) -> Result<(), DomError> {
        let data = self.node_mut(node)?;
        if value.is_empty() {
            data.styles.remove(property);
        } else {
            data.styles.insert(property.to_owned(), value.to_owned());
        }
        Ok(())
    }

    pub fn remove_style(&mut self, node: NodeId, property: &str) -> Result<(), DomError> {
        self.set_style(node, property, "")
    }

    pub fn style(&self, node: NodeId, property: &str) -> Option<&str> {
        self.node(node)
            .ok()
            .and_then(|n| n.styles.get(property))
            .map(String::as_str)
    }

    /// Current inline opacity, if one is set.
    pub fn opacity(&self, node: NodeId) -> Option<f64> {
        self.style(node, OPACITY).and_then(|v| v.parse().ok())
    }

    pub fn set_attr(&mut self, node: NodeId, name: &str, value: &str) -> Result<(), DomError> {
        self.node_mut(node)?
            .attributes
            .insert(name.to_owned(), value.to_owned());
        Ok(())
    }

    pub fn attr(&self, node: NodeId, name: &str) -> Option<&str> {
        self.node(node)
            .ok()
            .and_then(|n| n.attributes.get(name))
            .map(String::as_str)
    }

    pub fn set_text(&mut self, node: NodeId, text: &str) -> Result<(), DomError> {
        self.node_mut(node)?.text = Some(text.to_owned());
        Ok(())
    }

    pub fn text(&self, node: NodeId) -> Option<&str> {
        self.node(node).ok().and_then(|n| n.text.as_deref())
    }

    /// Store raw markup as the element's content. The markup is opaque to
    /// the model and is handed to the host verbatim.
    pub fn set_inner_html(&mut self, node: NodeId, markup: &str) -> Result<(), DomError> {
        self.node_mut(node)?.inner_html = Some(markup.to_owned());
        Ok(())
    }

    pub fn inner_html(&self, node: NodeId) -> Option<&str> {
        self.node(node).ok().and_then(|n| n.inner_html.as_deref())
    }

    // --- Visibility ---

    pub fn show(&mut self, node: NodeId) -> Result<(), DomError> {
        self.node_mut(node)?.visible = true;
        Ok(())
    }

    pub fn hide(&mut self, node: NodeId) -> Result<(), DomError> {
        self.node_mut(node)?.visible = false;
        Ok(())
    }

    pub fn is_visible(&self, node: NodeId) -> bool {
        self.node(node).map(|n| n.visible).unwrap_or(false)
    }

    // --- Events ---

    /// Bind a listener. `namespace` groups listeners for [`Document::off_namespace`].
    pub fn on(
        &mut self,
        node: NodeId,
        event_type: EventType,
        namespace: Option<&str>,
        callback: impl Fn(&mut Document, &mut DomEvent) + 'static,
    ) -> Result<ListenerId, DomError> {
        self.node(node)?;
        let callback: Listener = Rc::new(callback);
        Ok(self.listeners.add(node, event_type, namespace, callback))
    }

    /// Unbind one listener. Returns whether it was still bound.
    pub fn off(&mut self, id: ListenerId) -> bool {
        self.listeners.remove(id)
    }

    /// Unbind every `event_type` listener on `node` bound under `namespace`.
    pub fn off_namespace(&mut self, node: NodeId, event_type: EventType, namespace: &str) -> usize {
        self.listeners.remove_namespace(node, event_type, namespace)
    }

    pub fn listener_count(&self, node: NodeId, event_type: EventType) -> usize {
        self.listeners.count(node, event_type)
    }

    /// Deliver `event` to its target and bubble it towards the root.
    ///
    /// The propagation path is fixed before the first listener runs.
    pub fn dispatch(&mut self, mut event: DomEvent) -> Result<DomEvent, DomError> {
        let target = event.target();
        self.node(target)?;

        #[cfg(feature = "tracing")]
        let _span = tracing::trace_span!(
            "dom.dispatch",
            event = %event.event_type(),
            target = %target
        )
        .entered();

        let mut path = vec![target];
        let mut cursor = self.parent(target);
        while let Some(p) = cursor {
            path.push(p);
            cursor = self.parent(p);
        }

        for node in path {
            event.set_current_target(node);
            for listener in self.listeners.snapshot(node, event.event_type()) {
                listener(self, &mut event);
            }
            if event.is_propagation_stopped() {
                break;
            }
        }
        Ok(event)
    }

    /// Dispatch a click on `node`.
    pub fn click(&mut self, node: NodeId) -> Result<DomEvent, DomError> {
        self.dispatch(DomEvent::click(node))
    }

    /// Dispatch a key press at the body, as a browser does when nothing
    /// inside the page holds focus.
    pub fn press_key(&mut self, key_code: u32) -> Result<DomEvent, DomError> {
        self.dispatch(DomEvent::key_down(self.body, key_code))
    }

    /// Shorthand for pressing Escape.
    pub fn press_escape(&mut self) -> Result<DomEvent, DomError> {
        self.press_key(KEY_ESCAPE)
    }

    // --- Job queue ---

    /// Current virtual time.
    pub fn now(&self) -> Duration {
        self.scheduler.now()
    }

    /// Run `job` once `delay` has elapsed. A zero delay still defers the job
    /// to the next advance.
    pub fn set_timeout(&mut self, delay: Duration, job: impl FnOnce(&mut Document) + 'static) {
        self.scheduler.schedule(delay, Box::new(job));
    }

    /// Number of timers waiting to fire.
    pub fn pending_jobs(&self) -> usize {
        self.scheduler.pending()
    }

    /// Whether an opacity animation is in flight on `node`.
    pub fn is_animating(&self, node: NodeId) -> bool {
        self.scheduler.is_animating(node)
    }

    /// Animate the inline opacity of `node` from `from` to `to`.
    ///
    /// `on_complete` runs once the final value has been written.
    pub fn animate_opacity(
        &mut self,
        node: NodeId,
        from: f64,
        to: f64,
        duration: Duration,
        on_complete: impl FnOnce(&mut Document) + 'static,
    ) -> Result<(), DomError> {
        self.set_style(node, OPACITY, &format_opacity(from))?;
        let seq = self.scheduler.start_animation(node, from, to, duration);
        let finish: Job = Box::new(move |doc: &mut Document| {
            doc.scheduler.finish_animation(seq);
            // The node exists: handles are never invalidated.
            let _ = doc.set_style(node, OPACITY, &format_opacity(to));
            on_complete(doc);
        });
        self.scheduler.schedule(duration, finish);
        Ok(())
    }

    /// Fade `node` to transparent, then hide it and drop the inline opacity.
    pub fn fade_out(
        &mut self,
        node: NodeId,
        duration: Duration,
        on_complete: impl FnOnce(&mut Document) + 'static,
    ) -> Result<(), DomError> {
        let from = self.opacity(node).unwrap_or(1.0);
        self.animate_opacity(node, from, 0.0, duration, move |doc| {
            let _ = doc.hide(node);
            let _ = doc.remove_style(node, OPACITY);
            on_complete(doc);
        })
    }

    /// Hide `node`, then run `on_complete`.
    ///
    /// A zero duration hides immediately and defers `on_complete` to the next
    /// turn of the loop; otherwise this is [`Document::fade_out`].
    pub fn hide_then(
        &mut self,
        node: NodeId,
        duration: Duration,
        on_complete: impl FnOnce(&mut Document) + 'static,
    ) -> Result<(), DomError> {
        if duration.is_zero() {
            self.hide(node)?;
            self.set_timeout(Duration::ZERO, on_complete);
            Ok(())
        } else {
            self.fade_out(node, duration, on_complete)
        }
    }

    /// Advance the virtual clock by `dt`, firing every timer that falls due.
    ///
    /// Returns the number of jobs that ran.
    pub fn advance(&mut self, dt: Duration) -> usize {
        let limit = self.scheduler.now().saturating_add(dt);

        #[cfg(feature = "tracing")]
        let _span = tracing::trace_span!("dom.advance", dt_ms = dt.as_millis() as u64).entered();

        let mut ran = 0;
        while ran < MAX_JOBS_PER_ADVANCE {
            let Some((deadline, job)) = self.scheduler.pop_due(limit) else {
                break;
            };
            self.scheduler.set_now(deadline);
            self.write_animation_frames();
            job(self);
            ran += 1;
        }

        #[cfg(feature = "tracing")]
        if ran == MAX_JOBS_PER_ADVANCE {
            tracing::warn!(ran, "job budget exhausted; remaining jobs deferred");
        }

        self.scheduler.set_now(limit);
        self.write_animation_frames();
        ran
    }

    /// Keep advancing to the next deadline until no timers remain.
    pub fn run_until_idle(&mut self) -> usize {
        let mut ran = 0;
        while let Some(deadline) = self.scheduler.next_deadline() {
            if ran >= MAX_JOBS_PER_ADVANCE {
                break;
            }
            let dt = deadline.saturating_sub(self.scheduler.now());
            ran += self.advance(dt);
        }
        ran
    }

    /// Advance by the wall time elapsed since the previous pump.
    ///
    /// Real hosts call this from their frame callback; the first call only
    /// runs jobs that are already due.
    pub fn pump(&mut self) -> usize {
        let elapsed = self.scheduler.take_elapsed(Instant::now());
        self.advance(elapsed)
    }

    fn write_animation_frames(&mut self) {
        let now = self.scheduler.now();
        let frames: Vec<(NodeId, f64)> = self
            .scheduler
            .animations()
            .iter()
            .map(|a| (a.node, a.value_at(now)))
            .collect();
        for (node, value) in frames {
            let _ = self.set_style(node, OPACITY, &format_opacity(value));
        }
    }

    // --- Serialization ---

    /// Serialize `node` and its subtree as markup, for hosts and snapshots.
    ///
    /// Hidden elements are written with `display: none`.
    pub fn outer_html(&self, node: NodeId) -> String {
        let mut out = String::new();
        self.write_html(node, &mut out);
        out
    }

    fn write_html(&self, node: NodeId, out: &mut String) {
        let Ok(data) = self.node(node) else {
            return;
        };
        let _ = write!(out, "<{}", data.tag);
        if !data.classes.is_empty() {
            let _ = write!(out, " class=\"{}\"", data.classes.join(" "));
        }
        for (name, value) in &data.attributes {
            let _ = write!(out, " {name}=\"{value}\"");
        }
        let mut styles: Vec<String> = data
            .styles
            .iter()
            .map(|(k, v)| format!("{k}: {v}"))
            .collect();
        if !data.visible {
            styles.push("display: none".to_owned());
        }
        if !styles.is_empty() {
            let _ = write!(out, " style=\"{}\"", styles.join("; "));
        }
        out.push('>');
        if let Some(text) = &data.text {
            out.push_str(text);
        }
        if let Some(markup) = &data.inner_html {
            out.push_str(markup);
        }
        for &child in &data.children {
            self.write_html(child, out);
        }
        let _ = write!(out, "</{}>", data.tag);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use std::cell::RefCell;

    fn ms(v: u64) -> Duration {
        Duration::from_millis(v)
    }

    #[test]
    fn new_document_has_attached_body() {
        let doc = Document::new();
        assert!(doc.is_attached(doc.body()));
        assert_eq!(doc.parent(doc.body()), Some(doc.root()));
        assert_eq!(doc.tag(doc.body()), Some("body"));
    }

    #[test]
    fn append_reparents() {
        let mut doc = Document::new();
        let a = doc.create_element("div");
        let b = doc.create_element("div");
        let child = doc.create_element("span");
        doc.append_child(a, child).unwrap();
        doc.append_child(b, child).unwrap();

        assert!(doc.children(a).is_empty());
        assert_eq!(doc.children(b), &[child]);
        assert_eq!(doc.parent(child), Some(b));
    }

    #[test]
    fn append_rejects_cycles() {
        let mut doc = Document::new();
        let outer = doc.create_element("div");
        let inner = doc.create_element("div");
        doc.append_child(outer, inner).unwrap();

        assert_eq!(
            doc.append_child(inner, outer),
            Err(DomError::CycleDetected {
                parent: inner,
                child: outer
            })
        );
        assert_eq!(
            doc.append_child(outer, outer),
            Err(DomError::CycleDetected {
                parent: outer,
                child: outer
            })
        );
        let root = doc.root();
        assert_eq!(doc.append_child(outer, root), Err(DomError::RootNotMovable));
    }

    #[test]
    fn unknown_nodes_error_on_mutation() {
        let mut doc = Document::new();
        let mut other = Document::new();
        for _ in 0..5 {
            other.create_element("div");
        }
        let foreign = other.create_element("div");
        assert_eq!(doc.hide(foreign), Err(DomError::UnknownNode(foreign)));
        assert!(!doc.has_class(foreign, "x"));
        assert!(doc.children(foreign).is_empty());
    }

    #[test]
    fn foreign_handle_with_local_index_is_rejected() {
        let mut doc = Document::new();
        let mine = doc.create_element("div");
        let mut other = Document::new();
        let foreign = other.create_element("div");
        assert_eq!(mine.index(), foreign.index());

        assert!(doc.contains(mine));
        assert!(!doc.contains(foreign));
        assert!(!doc.contains(other.body()));
        assert_eq!(doc.show(foreign), Err(DomError::UnknownNode(foreign)));
        let body = doc.body();
        assert_eq!(
            doc.append_child(body, foreign),
            Err(DomError::UnknownNode(foreign))
        );
        assert_eq!(doc.parent(mine), None);
    }

    #[test]
    fn removed_nodes_keep_their_slots() {
        let mut doc = Document::new();
        let body = doc.body();
        let el = doc.create_element("div");
        doc.append_child(body, el).unwrap();
        let before = doc.node_count();

        doc.remove(el).unwrap();
        assert_eq!(doc.node_count(), before);
        assert_eq!(doc.tag(el), Some("div"));
        doc.append_child(body, el).unwrap();
        assert!(doc.is_attached(el));
    }

    #[test]
    fn move_children_preserves_order() {
        let mut doc = Document::new();
        let from = doc.create_element("div");
        let kids: Vec<NodeId> = (0..3).map(|_| doc.create_element("p")).collect();
        for &k in &kids {
            doc.append_child(from, k).unwrap();
        }
        let body = doc.body();
        doc.move_children(from, body).unwrap();

        assert!(doc.children(from).is_empty());
        assert_eq!(doc.children(body), kids.as_slice());
    }

    #[test]
    fn classes_are_deduplicated() {
        let mut doc = Document::new();
        let el = doc.create_element("div");
        doc.add_class(el, "modal current").unwrap();
        doc.add_class(el, "modal").unwrap();
        assert_eq!(doc.classes(el), &["modal".to_owned(), "current".to_owned()]);

        doc.remove_class(el, "current").unwrap();
        assert!(!doc.has_class(el, "current"));
        assert!(doc.has_class(el, "modal"));
    }

    #[test]
    fn empty_style_value_removes_property() {
        let mut doc = Document::new();
        let body = doc.body();
        doc.set_style(body, "overflow", "hidden").unwrap();
        assert_eq!(doc.style(body, "overflow"), Some("hidden"));
        doc.set_style(body, "overflow", "").unwrap();
        assert_eq!(doc.style(body, "overflow"), None);
    }

    #[test]
    fn click_bubbles_with_current_target() {
        let mut doc = Document::new();
        let outer = doc.create_element("div");
        let inner = doc.create_element("a");
        let body = doc.body();
        doc.append_child(body, outer).unwrap();
        doc.append_child(outer, inner).unwrap();

        let seen = Rc::new(RefCell::new(Vec::new()));
        for node in [inner, outer, body] {
            let seen = Rc::clone(&seen);
            doc.on(node, EventType::Click, None, move |_, e| {
                seen.borrow_mut().push((e.target(), e.current_target()));
            })
            .unwrap();
        }

        doc.click(inner).unwrap();
        assert_eq!(
            *seen.borrow(),
            vec![(inner, inner), (inner, outer), (inner, body)]
        );
    }

    #[test]
    fn stop_propagation_halts_bubbling() {
        let mut doc = Document::new();
        let el = doc.create_element("div");
        let body = doc.body();
        doc.append_child(body, el).unwrap();

        let hits = Rc::new(RefCell::new(0));
        doc.on(el, EventType::Click, None, |_, e| e.stop_propagation())
            .unwrap();
        let counter = Rc::clone(&hits);
        doc.on(body, EventType::Click, None, move |_, _| {
            *counter.borrow_mut() += 1;
        })
        .unwrap();

        doc.click(el).unwrap();
        assert_eq!(*hits.borrow(), 0);
    }

    #[test]
    fn remove_drops_subtree_listeners_but_detach_keeps_them() {
        let mut doc = Document::new();
        let parent = doc.create_element("div");
        let child = doc.create_element("a");
        doc.append_child(parent, child).unwrap();
        doc.on(child, EventType::Click, None, |_, _| {}).unwrap();

        doc.detach(parent).unwrap();
        assert_eq!(doc.listener_count(child, EventType::Click), 1);

        doc.remove(parent).unwrap();
        assert_eq!(doc.listener_count(child, EventType::Click), 0);
    }

    #[test]
    fn listener_can_unbind_its_namespace_mid_dispatch() {
        let mut doc = Document::new();
        let root = doc.root();
        let runs = Rc::new(RefCell::new(0));
        let counter = Rc::clone(&runs);
        doc.on(root, EventType::KeyDown, Some("modal"), move |doc, e| {
            *counter.borrow_mut() += 1;
            let root = doc.root();
            doc.off_namespace(root, EventType::KeyDown, "modal");
            e.prevent_default();
        })
        .unwrap();

        let event = doc.press_escape().unwrap();
        assert!(event.is_default_prevented());
        doc.press_escape().unwrap();
        assert_eq!(*runs.borrow(), 1);
    }

    #[test]
    fn zero_delay_timeout_is_deferred() {
        let mut doc = Document::new();
        let fired = Rc::new(RefCell::new(false));
        let flag = Rc::clone(&fired);
        doc.set_timeout(Duration::ZERO, move |_| *flag.borrow_mut() = true);

        assert!(!*fired.borrow());
        assert_eq!(doc.pending_jobs(), 1);
        assert_eq!(doc.advance(Duration::ZERO), 1);
        assert!(*fired.borrow());
    }

    #[test]
    fn nested_jobs_use_their_parent_deadline() {
        let mut doc = Document::new();
        let log = Rc::new(RefCell::new(Vec::new()));
        let outer = Rc::clone(&log);
        doc.set_timeout(ms(10), move |doc| {
            outer.borrow_mut().push(doc.now());
            let inner = Rc::clone(&outer);
            doc.set_timeout(ms(5), move |doc| inner.borrow_mut().push(doc.now()));
        });

        doc.advance(ms(100));
        assert_eq!(*log.borrow(), vec![ms(10), ms(15)]);
        assert_eq!(doc.now(), ms(100));
    }

    #[test]
    fn animation_writes_intermediate_frames() {
        let mut doc = Document::new();
        let el = doc.create_element("div");
        let done = Rc::new(RefCell::new(false));
        let flag = Rc::clone(&done);
        doc.animate_opacity(el, 0.0, 1.0, ms(200), move |_| *flag.borrow_mut() = true)
            .unwrap();

        assert_eq!(doc.style(el, "opacity"), Some("0"));
        doc.advance(ms(100));
        assert_eq!(doc.style(el, "opacity"), Some("0.5"));
        assert!(doc.is_animating(el));
        assert!(!*done.borrow());

        doc.advance(ms(100));
        assert_eq!(doc.style(el, "opacity"), Some("1"));
        assert!(!doc.is_animating(el));
        assert!(*done.borrow());
    }

    #[test]
    fn fade_out_hides_and_clears_opacity() {
        let mut doc = Document::new();
        let el = doc.create_element("div");
        doc.fade_out(el, ms(50), |_| {}).unwrap();
        assert!(doc.is_visible(el));
        doc.run_until_idle();
        assert!(!doc.is_visible(el));
        assert_eq!(doc.opacity(el), None);
    }

    #[test]
    fn hide_then_zero_hides_now_and_calls_back_later() {
        let mut doc = Document::new();
        let el = doc.create_element("div");
        let called = Rc::new(RefCell::new(false));
        let flag = Rc::clone(&called);
        doc.hide_then(el, Duration::ZERO, move |_| *flag.borrow_mut() = true)
            .unwrap();

        assert!(!doc.is_visible(el));
        assert!(!*called.borrow());
        doc.run_until_idle();
        assert!(*called.borrow());
    }

    #[test]
    fn runaway_job_chain_is_bounded() {
        fn respawn(doc: &mut Document) {
            doc.set_timeout(Duration::ZERO, respawn);
        }
        let mut doc = Document::new();
        doc.set_timeout(Duration::ZERO, respawn);
        assert_eq!(doc.advance(Duration::ZERO), MAX_JOBS_PER_ADVANCE);
        assert_eq!(doc.pending_jobs(), 1);
    }

    #[test]
    fn query_class_only_sees_attached_nodes() {
        let mut doc = Document::new();
        let attached = doc.create_element("div");
        let loose = doc.create_element("div");
        doc.add_class(attached, "blocker").unwrap();
        doc.add_class(loose, "blocker").unwrap();
        let body = doc.body();
        doc.append_child(body, attached).unwrap();

        assert_eq!(doc.query_class("blocker"), vec![attached]);
    }

    #[test]
    fn outer_html_snapshot() {
        let mut doc = Document::new();
        let body = doc.body();
        let link = doc.create_element("a");
        doc.add_class(link, "close-modal").unwrap();
        doc.set_attr(link, "href", "javascript:;").unwrap();
        doc.set_text(link, "Close").unwrap();
        doc.append_child(body, link).unwrap();
        doc.set_style(body, "overflow", "hidden").unwrap();
        doc.hide(link).unwrap();

        assert_eq!(
            doc.outer_html(body),
            "<body style=\"overflow: hidden\"><a class=\"close-modal\" href=\"javascript:;\" \
             style=\"display: none\">Close</a></body>"
        );
    }

    #[test]
    fn advance_by_max_after_clock_moved_saturates() {
        let mut doc = Document::new();
        let fired = Rc::new(RefCell::new(false));
        let flag = Rc::clone(&fired);
        doc.set_timeout(ms(5), move |_| *flag.borrow_mut() = true);

        doc.advance(ms(1));
        assert_eq!(doc.advance(Duration::MAX), 1);
        assert!(*fired.borrow());
        assert_eq!(doc.now(), Duration::MAX);

        doc.set_timeout(Duration::MAX, |_| {});
        assert_eq!(doc.advance(Duration::MAX), 1);
        assert_eq!(doc.pending_jobs(), 0);
    }

    #[test]
    fn pump_first_call_runs_only_due_jobs() {
        let mut doc = Document::new();
        doc.set_timeout(Duration::ZERO, |_| {});
        doc.set_timeout(Duration::from_secs(3600), |_| {});
        assert_eq!(doc.pump(), 1);
        assert_eq!(doc.pending_jobs(), 1);
    }
}
