#![forbid(unsafe_code)]

//! Property tests: arbitrary open/close/dismiss sequences keep at most one
//! modal on screen and always restore the page once closed.

use proptest::prelude::*;
use scrim_dom::{Document, NodeId};
use scrim_modal::{CURRENT_CLASS, ModalController, ModalOverrides};

#[derive(Debug, Clone)]
enum Op {
    Open(usize),
    Close,
    Escape,
    ClickOverlay,
    ClickContent,
    Advance(u64),
}

fn op() -> impl Strategy<Value = Op> {
    prop_oneof![
        (0usize..4).prop_map(Op::Open),
        Just(Op::Close),
        Just(Op::Escape),
        Just(Op::ClickOverlay),
        Just(Op::ClickContent),
        (0u64..500).prop_map(Op::Advance),
    ]
}

fn check(doc: &Document, modals: &ModalController, elements: &[NodeId]) {
    let blockers = doc.query_class("blocker");
    let current = modals.current();

    assert!(blockers.len() <= 1);
    assert_eq!(blockers.len(), usize::from(current.is_some()));

    let shown: Vec<NodeId> = elements
        .iter()
        .copied()
        .filter(|&el| doc.has_class(el, CURRENT_CLASS))
        .collect();
    match &current {
        Some(handle) => {
            assert_eq!(shown, vec![handle.element()]);
            assert_eq!(doc.parent(handle.element()), handle.blocker());
            assert_eq!(doc.style(doc.body(), "overflow"), Some("hidden"));
        }
        None => {
            assert!(shown.is_empty());
            assert_eq!(doc.style(doc.body(), "overflow"), None);
            for &el in elements {
                assert_eq!(doc.parent(el), Some(doc.body()));
            }
        }
    }
}

proptest! {
    #[test]
    fn at_most_one_modal_is_active(ops in prop::collection::vec(op(), 1..40)) {
        let mut doc = Document::new();
        let modals = ModalController::new();
        let elements: Vec<NodeId> = (0..4)
            .map(|_| {
                let el = doc.create_element("div");
                let body = doc.body();
                doc.append_child(body, el).unwrap();
                doc.hide(el).unwrap();
                el
            })
            .collect();

        for op in ops {
            match op {
                Op::Open(i) => {
                    modals.open(&mut doc, elements[i], ModalOverrides::new()).unwrap();
                }
                Op::Close => {
                    let was_active = modals.is_active();
                    prop_assert_eq!(modals.close(&mut doc, None).is_some(), was_active);
                }
                Op::Escape => {
                    doc.press_escape().unwrap();
                    prop_assert!(!modals.is_active());
                }
                Op::ClickOverlay => {
                    if let Some(blocker) = modals.current().and_then(|h| h.blocker()) {
                        doc.click(blocker).unwrap();
                        prop_assert!(!modals.is_active());
                    }
                }
                Op::ClickContent => {
                    if let Some(handle) = modals.current() {
                        doc.click(handle.element()).unwrap();
                        prop_assert!(modals.is_active());
                    }
                }
                Op::Advance(ms) => {
                    doc.advance(std::time::Duration::from_millis(ms));
                }
            }
            check(&doc, &modals, &elements);
        }

        modals.close(&mut doc, None);
        doc.run_until_idle();
        check(&doc, &modals, &elements);
        prop_assert_eq!(doc.pending_jobs(), 0);
    }
}
