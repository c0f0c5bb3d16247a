#![forbid(unsafe_code)]

use std::collections::BTreeMap;
use std::fmt;

/// Handle to an element in a [`Document`](crate::Document).
///
/// A handle records the document that created it; other documents reject it.
/// Handles are never reused: removing a node detaches it but keeps its slot,
/// so a stale handle still resolves to the (detached) element.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct NodeId {
    doc: u32,
    index: u32,
}

impl NodeId {
    pub(crate) const fn new(doc: u32, index: usize) -> Self {
        Self {
            doc,
            index: index as u32,
        }
    }

    /// Get the raw arena index.
    #[inline]
    pub const fn index(self) -> usize {
        self.index as usize
    }

    #[inline]
    pub(crate) const fn doc(self) -> u32 {
        self.doc
    }
}

impl fmt::Display for NodeId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{}", self.index)
    }
}

/// Element storage. Tree links live here too; `Document` keeps them
/// consistent (a child appears in exactly one parent's `children`).
#[derive(Debug, Clone)]
pub(crate) struct ElementData {
    pub(crate) tag: String,
    pub(crate) classes: Vec<String>,
    pub(crate) attributes: BTreeMap<String, String>,
    pub(crate) styles: BTreeMap<String, String>,
    pub(crate) text: Option<String>,
    pub(crate) inner_html: Option<String>,
    pub(crate) visible: bool,
    pub(crate) parent: Option<NodeId>,
    pub(crate) children: Vec<NodeId>,
}

impl ElementData {
    pub(crate) fn new(tag: &str) -> Self {
        Self {
            tag: tag.to_owned(),
            classes: Vec::new(),
            attributes: BTreeMap::new(),
            styles: BTreeMap::new(),
            text: None,
            inner_html: None,
            visible: true,
            parent: None,
            children: Vec::new(),
        }
    }
}
