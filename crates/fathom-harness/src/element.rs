use std::collections::BTreeMap;
use std::fmt;

use fathom_tree::PropValue;

use crate::event::{handler, EventHandler, NodeRef, SyntheticEvent};
use crate::scheduler::TaskOutcome;

/// Tag that renders its children in place without a host node of its own.
pub const FRAGMENT_TAG: &str = "#fragment";

/// Declarative description of what a root should render.
#[derive(Clone)]
pub struct Element {
    pub tag: String,
    pub key: Option<String>,
    pub props: BTreeMap<String, PropValue>,
    pub children: Vec<ElementChild>,
    pub node_ref: Option<NodeRef>,
    pub handlers: Vec<(String, EventHandler)>,
}

#[derive(Clone, Debug)]
pub enum ElementChild {
    Element(Element),
    Text(String),
}

impl Element {
    pub fn new(tag: impl Into<String>) -> Self {
        Element {
            tag: tag.into(),
            key: None,
            props: BTreeMap::new(),
            children: Vec::new(),
            node_ref: None,
            handlers: Vec::new(),
        }
    }

    pub fn view() -> Self {
        Element::new("rn-view")
    }

    /// A paragraph holding a single run of text.
    pub fn text(text: impl Into<String>) -> Self {
        Element::new("rn-paragraph").with_text(text)
    }

    pub fn fragment(children: impl IntoIterator<Item = Element>) -> Self {
        let mut el = Element::new(FRAGMENT_TAG);
        el.children = children.into_iter().map(ElementChild::Element).collect();
        el
    }

    pub fn is_fragment(&self) -> bool {
        self.tag == FRAGMENT_TAG
    }

    pub fn with_key(mut self, key: impl Into<String>) -> Self {
        self.key = Some(key.into());
        self
    }

    pub fn with_prop(mut self, name: impl Into<String>, value: impl Into<PropValue>) -> Self {
        self.props.insert(name.into(), value.into());
        self
    }

    pub fn with_child(mut self, child: Element) -> Self {
        self.children.push(ElementChild::Element(child));
        self
    }

    pub fn with_text(mut self, text: impl Into<String>) -> Self {
        self.children.push(ElementChild::Text(text.into()));
        self
    }

    pub fn with_ref(mut self, node_ref: NodeRef) -> Self {
        self.node_ref = Some(node_ref);
        self
    }

    /// Attach a handler. It only becomes reachable when the element also has a ref.
    pub fn on<F, R>(mut self, event_type: impl Into<String>, f: F) -> Self
    where
        F: Fn(&SyntheticEvent) -> R + 'static,
        R: TaskOutcome,
    {
        self.handlers.push((event_type.into(), handler(f)));
        self
    }

    pub fn prop(&self, name: &str) -> Option<&PropValue> {
        self.props.get(name)
    }

    /// `display: none`. Hidden elements render without their children.
    pub fn is_hidden(&self) -> bool {
        self.prop("display").and_then(PropValue::as_str) == Some("none")
    }

    pub fn has_text_children(&self) -> bool {
        self.children.iter().any(|c| matches!(c, ElementChild::Text(_)))
    }

    /// Every `(ref, event type, handler)` binding in this subtree.
    pub fn handler_bindings(&self) -> Vec<(NodeRef, String, EventHandler)> {
        let mut out = Vec::new();
        self.collect_bindings(&mut out);
        out
    }

    fn collect_bindings(&self, out: &mut Vec<(NodeRef, String, EventHandler)>) {
        if let Some(node_ref) = self.node_ref {
            for (event_type, h) in &self.handlers {
                out.push((node_ref, event_type.clone(), h.clone()));
            }
        }
        if self.is_hidden() {
            return;
        }
        for child in &self.children {
            if let ElementChild::Element(el) = child {
                el.collect_bindings(out);
            }
        }
    }
}

impl fmt::Debug for Element {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let handlers: Vec<&str> = self.handlers.iter().map(|(t, _)| t.as_str()).collect();
        f.debug_struct("Element")
            .field("tag", &self.tag)
            .field("key", &self.key)
            .field("props", &self.props)
            .field("children", &self.children)
            .field("node_ref", &self.node_ref)
            .field("handlers", &handlers)
            .finish()
    }
}
