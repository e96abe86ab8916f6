//! End-to-end behavior of an engine driven through its tick loop

use std::rc::Rc;
use std::time::Duration;

use rtlify::style::{PROCESSED_ATTR, RATIO_ATTR};
use rtlify::{Engine, EngineConfig, EngineState, Tick};
use rtlify_dom::{
    ComputedStyle, Display, Document, DocumentConfig, FrameContent, SharedDocument,
};
use rtlify_traits::{DummyShellProvider, ManualClock};

const ARABIC: &str = "مرحبا بالعالم";
const HEBREW: &str = "שלום עולם";
const DEBOUNCE: Duration = Duration::from_millis(150);

struct Harness {
    document: SharedDocument,
    engine: Engine,
    clock: Rc<ManualClock>,
}

impl Harness {
    fn new(doc: Document) -> Self {
        Self::with_config(doc, EngineConfig::default())
    }

    fn with_config(doc: Document, config: EngineConfig) -> Self {
        let document = doc.into_shared();
        let clock = Rc::new(ManualClock::new());
        let engine = Engine::new(document.clone(), config, Rc::new(DummyShellProvider))
            .unwrap()
            .with_clock(clock.clone());
        Self {
            document,
            engine,
            clock,
        }
    }

    /// Tick until the engine no longer asks for frames
    fn settle(&mut self) -> Tick {
        for _ in 0..1000 {
            let tick = self.engine.tick();
            if tick != Tick::Busy {
                return tick;
            }
        }
        panic!("engine did not settle");
    }

    /// Let the debounce timer expire and process whatever it flushed
    fn flush_changes(&mut self) -> Tick {
        self.engine.tick();
        self.clock.advance(DEBOUNCE);
        self.settle()
    }

    fn style(&self, node_id: usize, property: &str) -> Option<String> {
        let doc = self.document.borrow();
        doc.get_node(node_id)?
            .element_data()?
            .style
            .get_property(property)
            .map(str::to_string)
    }

    fn attr(&self, node_id: usize, name: &str) -> Option<String> {
        self.document.borrow().attribute(node_id, name)
    }

    fn is_styled(&self, node_id: usize) -> bool {
        self.attr(node_id, PROCESSED_ATTR).is_some()
    }

    fn doc(&self) -> std::cell::RefMut<'_, Document> {
        self.document.borrow_mut()
    }
}

fn text_element(doc: &mut Document, parent: usize, tag: &str, text: &str) -> usize {
    let id = doc.append_element(parent, tag, &[]).unwrap();
    doc.append_text(id, text).unwrap();
    id
}

#[test]
fn test_enable_styles_rtl_paragraphs_only() {
    let mut doc = Document::new(DocumentConfig::default());
    let body = doc.append_element(0, "body", &[]).unwrap();
    let arabic = text_element(&mut doc, body, "p", ARABIC);
    let english = text_element(&mut doc, body, "p", "Hello world");
    let mut h = Harness::new(doc);

    h.engine.enable().unwrap();
    assert_eq!(h.settle(), Tick::Idle);

    assert_eq!(h.style(arabic, "direction").as_deref(), Some("rtl"));
    assert_eq!(h.style(arabic, "text-align").as_deref(), Some("right"));
    assert_eq!(h.attr(arabic, RATIO_ATTR).as_deref(), Some("1.00"));
    assert!(!h.is_styled(english));
    assert_eq!(h.attr(english, "style"), None);

    let stats = h.engine.stats().unwrap();
    assert_eq!(stats.count, 1);
    assert_eq!(stats.mean_ratio, 1.0);
}

#[test]
fn test_threshold_applies_to_checked_categories_only() {
    let mut doc = Document::new(DocumentConfig::default());
    // 3 of 10 letters
    let at_threshold = text_element(&mut doc, 0, "label", "אבג defghij");
    // 2 of 10 letters
    let below = text_element(&mut doc, 0, "label", "אב cdefghij");
    // 1 of 16 letters, but spans are always checked
    let span = text_element(&mut doc, 0, "span", "א bcdefghijklmnop");
    let mut h = Harness::with_config(doc, EngineConfig::default().with_threshold(0.3));

    h.engine.enable().unwrap();
    h.settle();

    assert!(h.is_styled(at_threshold));
    assert!(!h.is_styled(below));
    assert!(h.is_styled(span));
    assert_eq!(h.attr(span, RATIO_ATTR).as_deref(), Some("0.06"));
}

#[test]
fn test_ltr_override_survives_rescans() {
    let mut doc = Document::new(DocumentConfig::default());
    let p = doc.append_element(0, "p", &[("dir", "ltr")]).unwrap();
    doc.append_text(p, ARABIC).unwrap();
    let mut h = Harness::new(doc);

    h.engine.enable().unwrap();
    h.settle();
    assert!(!h.is_styled(p));

    h.engine.rescan().unwrap();
    h.settle();
    assert!(!h.is_styled(p));
    assert_eq!(h.attr(p, "style"), None);

    // Dropping the override makes the node eligible again
    h.doc().remove_attribute(p, "dir").unwrap();
    h.engine.rescan().unwrap();
    h.settle();
    assert!(h.is_styled(p));

    // Adding it back reverts the node on the next rescan
    h.doc().set_attribute(p, "dir", "ltr").unwrap();
    h.engine.rescan().unwrap();
    h.settle();
    assert!(!h.is_styled(p));
    assert_eq!(h.style(p, "direction"), None);
}

#[test]
fn test_text_change_is_reclassified_after_debounce() {
    let mut doc = Document::new(DocumentConfig::default());
    let p = doc.append_element(0, "p", &[]).unwrap();
    let text = doc.append_text(p, "Hello").unwrap();
    let mut h = Harness::new(doc);

    h.engine.enable().unwrap();
    h.settle();
    assert!(!h.is_styled(p));

    h.doc().set_text(text, HEBREW).unwrap();
    assert_eq!(
        h.engine.tick(),
        Tick::Waiting {
            deadline: h.clock.peek() + DEBOUNCE
        }
    );
    assert_eq!(h.engine.state(), EngineState::Scheduling);
    assert!(!h.is_styled(p));

    h.clock.advance(DEBOUNCE);
    assert_eq!(h.settle(), Tick::Idle);
    assert!(h.is_styled(p));
    assert_eq!(h.engine.state(), EngineState::Idle);
}

#[test]
fn test_ratio_drop_reverts_styling() {
    let mut doc = Document::new(DocumentConfig::default());
    let label = doc.append_element(0, "label", &[]).unwrap();
    let text = doc.append_text(label, ARABIC).unwrap();
    let mut h = Harness::new(doc);

    h.engine.enable().unwrap();
    h.settle();
    assert!(h.is_styled(label));

    h.doc().set_text(text, "Plain English with one ש").unwrap();
    h.flush_changes();
    assert!(!h.is_styled(label));
    assert_eq!(h.attr(label, RATIO_ATTR), None);
    assert_eq!(h.style(label, "direction"), None);
}

#[test]
fn test_disable_restores_author_styles_and_enable_reapplies() {
    let mut doc = Document::new(DocumentConfig::default());
    let p = doc.append_element(0, "p", &[("style", "color: red")]).unwrap();
    doc.append_text(p, ARABIC).unwrap();
    let mut h = Harness::new(doc);

    h.engine.enable().unwrap();
    h.settle();
    assert!(h.is_styled(p));
    assert!(h.engine.cached_nodes() > 0);

    h.engine.disable().unwrap();
    assert_eq!(h.attr(p, "style").as_deref(), Some("color: red;"));
    assert!(!h.is_styled(p));
    assert_eq!(h.attr(p, RATIO_ATTR), None);
    assert_eq!(h.engine.cached_nodes(), 0);
    assert_eq!(h.engine.stats().unwrap().count, 0);

    h.engine.enable().unwrap();
    h.settle();
    assert!(h.is_styled(p));
    assert_eq!(h.style(p, "color").as_deref(), Some("red"));
}

#[test]
fn test_slices_respect_budget() {
    let mut doc = Document::new(DocumentConfig::default());
    for _ in 0..20 {
        text_element(&mut doc, 0, "p", ARABIC);
    }
    let document = doc.into_shared();
    let clock = Rc::new(ManualClock::with_auto_step(Duration::from_millis(1)));
    let config = EngineConfig::default().with_slice_budget(Duration::from_millis(8));
    let mut engine = Engine::new(document.clone(), config, Rc::new(DummyShellProvider))
        .unwrap()
        .with_clock(clock);

    engine.enable().unwrap();
    let mut slices = Vec::new();
    loop {
        let tick = engine.tick();
        slices.push(engine.last_slice_report().unwrap().processed);
        if tick != Tick::Busy {
            break;
        }
    }
    assert_eq!(slices, vec![8, 8, 4]);
    assert_eq!(engine.stats().unwrap().count, 20);
}

#[test]
fn test_debounce_coalesces_bursts() {
    let mut h = Harness::new(Document::new(DocumentConfig::default()));
    h.engine.enable().unwrap();
    h.settle();

    let first = text_element(&mut h.doc(), 0, "p", ARABIC);
    assert_eq!(h.engine.tick(), Tick::Waiting { deadline: DEBOUNCE });

    h.clock.advance(Duration::from_millis(100));
    let second = text_element(&mut h.doc(), 0, "p", HEBREW);
    let restarted = Duration::from_millis(100) + DEBOUNCE;
    assert_eq!(h.engine.tick(), Tick::Waiting { deadline: restarted });

    h.clock.advance(Duration::from_millis(100));
    assert_eq!(h.engine.tick(), Tick::Waiting { deadline: restarted });
    assert!(!h.is_styled(first));

    h.clock.advance(Duration::from_millis(50));
    assert_eq!(h.settle(), Tick::Idle);
    assert!(h.is_styled(first));
    assert!(h.is_styled(second));
    assert_eq!(h.engine.last_slice_report().unwrap().processed, 2);
}

#[test]
fn test_mutations_during_slicing_are_dropped_until_rescan() {
    let mut doc = Document::new(DocumentConfig::default());
    for _ in 0..20 {
        text_element(&mut doc, 0, "p", ARABIC);
    }
    let mut h = Harness::with_config(
        doc,
        EngineConfig::default().with_slice_budget(Duration::from_millis(8)),
    );
    h.clock.set_auto_step(Duration::from_millis(1));

    h.engine.enable().unwrap();
    assert_eq!(h.engine.tick(), Tick::Busy);
    assert_eq!(h.engine.state(), EngineState::Slicing);

    let late = text_element(&mut h.doc(), 0, "p", HEBREW);
    assert_eq!(h.settle(), Tick::Idle);
    h.clock.advance(DEBOUNCE * 2);
    assert_eq!(h.settle(), Tick::Idle);
    assert!(!h.is_styled(late));

    assert_eq!(h.engine.rescan(), Ok(1));
    h.settle();
    assert!(h.is_styled(late));
}

#[test]
fn test_disable_cancels_pending_debounce() {
    let mut h = Harness::new(Document::new(DocumentConfig::default()));
    h.engine.enable().unwrap();
    h.settle();

    let p = text_element(&mut h.doc(), 0, "p", ARABIC);
    assert!(matches!(h.engine.tick(), Tick::Waiting { .. }));

    h.engine.disable().unwrap();
    assert_eq!(h.engine.state(), EngineState::Disabled);
    h.clock.advance(DEBOUNCE * 2);
    assert_eq!(h.engine.tick(), Tick::Idle);
    assert!(!h.is_styled(p));
    assert_eq!(h.engine.rescan(), Err(rtlify::EngineError::Disabled));
}

#[test]
fn test_removed_nodes_leave_the_cache() {
    let mut doc = Document::new(DocumentConfig::default());
    let div = doc.append_element(0, "div", &[]).unwrap();
    let p = text_element(&mut doc, div, "p", ARABIC);
    let mut h = Harness::new(doc);

    h.engine.enable().unwrap();
    h.settle();
    assert_eq!(h.engine.cached_nodes(), 1);

    h.doc().remove_node(p).unwrap();
    h.engine.tick();
    assert_eq!(h.engine.cached_nodes(), 0);
}

#[test]
fn test_hidden_and_excluded_nodes_are_left_alone() {
    let mut doc = Document::new(DocumentConfig::default());
    let hidden = text_element(&mut doc, 0, "p", ARABIC);
    doc.set_computed_style(
        hidden,
        ComputedStyle {
            display: Display::None,
            ..Default::default()
        },
    )
    .unwrap();
    let pre = doc.append_element(0, "pre", &[]).unwrap();
    let in_code = text_element(&mut doc, pre, "span", ARABIC);
    let opted_out = doc.append_element(0, "section", &[("data-rtl-skip", "")]).unwrap();
    let skipped = text_element(&mut doc, opted_out, "p", ARABIC);
    let password = doc
        .append_element(0, "input", &[("type", "password"), ("value", ARABIC)])
        .unwrap();
    let search = doc
        .append_element(0, "input", &[("type", "search"), ("placeholder", "ابحث هنا")])
        .unwrap();
    let mut h = Harness::new(doc);

    h.engine.enable().unwrap();
    h.settle();

    for node in [hidden, in_code, skipped, password] {
        assert!(!h.is_styled(node), "node {node} should not be styled");
    }
    assert!(h.is_styled(search));
}

#[test]
fn test_generic_containers_get_bidi_hint() {
    let mut doc = Document::new(DocumentConfig::default());
    let container = text_element(&mut doc, 0, "div", ARABIC);
    let wrapper = doc.append_element(0, "div", &[]).unwrap();
    let inner = text_element(&mut doc, wrapper, "p", ARABIC);
    let mut h = Harness::new(doc);

    h.engine.enable().unwrap();
    h.settle();

    assert_eq!(h.style(container, "unicode-bidi").as_deref(), Some("plaintext"));
    assert_eq!(h.style(container, "direction"), None);
    assert!(!h.is_styled(wrapper));
    assert!(h.is_styled(inner));
}

#[test]
fn test_same_origin_frames_are_delegated() {
    let mut child = Document::new(DocumentConfig::with_base_url("https://example.com/frame"));
    let child_p = text_element(&mut child, 0, "p", ARABIC);
    let child = child.into_shared();

    let mut foreign = Document::new(DocumentConfig::with_base_url("https://ads.example.net/"));
    let foreign_p = text_element(&mut foreign, 0, "p", ARABIC);
    let foreign = foreign.into_shared();

    let mut doc = Document::new(DocumentConfig::with_base_url("https://example.com/"));
    let same = doc.append_element(0, "iframe", &[]).unwrap();
    let src = url::Url::parse("https://example.com/frame").ok();
    doc.attach_frame(same, FrameContent::new(src, Some(child.clone())))
        .unwrap();
    let cross = doc.append_element(0, "iframe", &[]).unwrap();
    let src = url::Url::parse("https://ads.example.net/").ok();
    doc.attach_frame(cross, FrameContent::new(src, Some(foreign.clone())))
        .unwrap();
    let mut h = Harness::new(doc);

    h.engine.enable().unwrap();
    h.settle();
    assert_eq!(h.engine.delegated_frames(), 1);
    // Not loaded yet
    assert_eq!(child.borrow().attribute(child_p, PROCESSED_ATTR), None);

    h.doc().set_frame_loaded(same).unwrap();
    h.settle();
    assert!(child.borrow().attribute(child_p, PROCESSED_ATTR).is_some());
    assert_eq!(foreign.borrow().attribute(foreign_p, PROCESSED_ATTR), None);

    // Disabling the parent reverts the frame too
    h.engine.disable().unwrap();
    assert_eq!(child.borrow().attribute(child_p, PROCESSED_ATTR), None);
}

#[test]
fn test_inserted_inline_subtree_restyles_parent() {
    let mut doc = Document::new(DocumentConfig::default());
    let p = text_element(&mut doc, 0, "p", "hello world");
    let mut h = Harness::new(doc);

    h.engine.enable().unwrap();
    h.settle();
    assert!(!h.is_styled(p));

    let strong = {
        let mut doc = h.doc();
        let strong = doc.create_element("strong", &[]);
        let text = doc.create_text_node(ARABIC);
        doc.append_child(strong, text).unwrap();
        doc.append_child(p, strong).unwrap();
        strong
    };
    assert_eq!(h.flush_changes(), Tick::Idle);

    assert!(h.is_styled(p));
    assert_eq!(h.style(p, "direction").as_deref(), Some("rtl"));
    // Inline formatting elements are never candidates themselves
    assert!(!h.is_styled(strong));
}

#[test]
fn test_frames_inserted_after_enable_are_delegated() {
    let mut child = Document::new(DocumentConfig::with_base_url("https://example.com/frame"));
    let child_p = text_element(&mut child, 0, "p", HEBREW);
    let child = child.into_shared();

    let doc = Document::new(DocumentConfig::with_base_url("https://example.com/"));
    let mut h = Harness::new(doc);
    h.engine.enable().unwrap();
    h.settle();
    assert_eq!(h.engine.delegated_frames(), 0);

    {
        let mut doc = h.doc();
        let iframe = doc.create_element("iframe", &[]);
        let src = url::Url::parse("https://example.com/frame").ok();
        doc.attach_frame(iframe, FrameContent::new(src, Some(child.clone())))
            .unwrap();
        doc.set_frame_loaded(iframe).unwrap();
        doc.append_child(0, iframe).unwrap();
    }
    h.flush_changes();

    assert_eq!(h.engine.delegated_frames(), 1);
    assert!(child.borrow().attribute(child_p, PROCESSED_ATTR).is_some());
}
