use std::cell::{Cell, RefCell};
use std::rc::Rc;

use fathom_tree::{extract, HostNode, LayoutMetrics, Projection, Rect, RenderedOutput};

use crate::config::RootConfig;
use crate::element::Element;
use crate::error::HarnessError;
use crate::event::NodeRef;
use crate::renderer::Renderer;
use crate::simulator::EventSimulator;

/// Tag of the synthetic node wrapping everything a root renders.
pub const ROOT_TAG: &str = "rn-root";

/// A rendering surface. Cloning yields another handle to the same root.
#[derive(Clone)]
pub struct Root {
    inner: Rc<RootInner>,
}

struct RootInner {
    id: u64,
    config: RootConfig,
    simulator: EventSimulator,
    renderer: RefCell<Box<dyn Renderer>>,
    tree: RefCell<Option<HostNode>>,
    bindings: RefCell<Vec<(NodeRef, String)>>,
    destroyed: Cell<bool>,
}

impl Root {
    pub(crate) fn new(id: u64, config: RootConfig, simulator: EventSimulator, renderer: Box<dyn Renderer>) -> Self {
        Root {
            inner: Rc::new(RootInner {
                id,
                config,
                simulator,
                renderer: RefCell::new(renderer),
                tree: RefCell::new(None),
                bindings: RefCell::new(Vec::new()),
                destroyed: Cell::new(false),
            }),
        }
    }

    pub fn id(&self) -> u64 {
        self.inner.id
    }

    pub fn config(&self) -> &RootConfig {
        &self.inner.config
    }

    pub fn is_destroyed(&self) -> bool {
        self.inner.destroyed.get()
    }

    /// Replace the root's content with `element`.
    ///
    /// Handlers bound by the previous render are released; those of elements
    /// carrying a ref in the new tree become dispatch targets.
    pub fn render(&self, element: &Element) -> Result<(), HarnessError> {
        if self.is_destroyed() {
            return Err(HarnessError::RootDestroyed(self.inner.id));
        }

        let children = self.inner.renderer.borrow_mut().render(element, &self.inner.config)?;
        let mut root = self.empty_root();
        root.children = children;

        self.release_bindings();
        let mut bound = Vec::new();
        for (node_ref, event_type, handler) in element.handler_bindings() {
            self.inner.simulator.set_handler(node_ref, event_type.clone(), handler);
            bound.push((node_ref, event_type));
        }

        log::debug!(
            "root #{} rendered {} host nodes, {} handlers bound",
            self.inner.id,
            root.node_count() - 1,
            bound.len()
        );
        *self.inner.bindings.borrow_mut() = bound;
        *self.inner.tree.borrow_mut() = Some(root);
        Ok(())
    }

    /// Unmount everything and release handlers. Idempotent.
    pub fn destroy(&self) {
        if self.inner.destroyed.replace(true) {
            return;
        }
        self.release_bindings();
        self.inner.tree.borrow_mut().take();
        log::debug!("root #{} destroyed", self.inner.id);
    }

    /// Snapshot the current host tree. A root with nothing rendered yields
    /// an empty output (`null` in JSX) unless the root wrapper is requested.
    pub fn get_rendered_output(&self, projection: &Projection) -> Result<RenderedOutput, HarnessError> {
        let tree = self.inner.tree.borrow();
        let empty;
        let root = match tree.as_ref() {
            Some(root) => root,
            None => {
                empty = self.empty_root();
                &empty
            }
        };
        Ok(extract(root, projection)?)
    }

    /// The current host tree, root wrapper included.
    pub fn host_tree(&self) -> Option<HostNode> {
        self.inner.tree.borrow().clone()
    }

    fn empty_root(&self) -> HostNode {
        let config = &self.inner.config;
        let mut layout = LayoutMetrics::new(Rect::new(0.0, 0.0, config.viewport_width, config.viewport_height));
        layout.point_scale_factor = config.point_scale_factor;
        HostNode::new(ROOT_TAG).with_layout(layout)
    }

    fn release_bindings(&self) {
        let bindings = std::mem::take(&mut *self.inner.bindings.borrow_mut());
        for (node_ref, event_type) in bindings {
            self.inner.simulator.remove_handler(node_ref, &event_type);
        }
    }
}
