use std::collections::BTreeMap;
use std::fmt::Write as _;

use sha2::{Digest, Sha256};

use crate::error::ProjectionError;
use crate::node::{is_dimension_prop, HostChild, HostNode};
use crate::projection::{PropFilter, Projection};
use crate::value::PropValue;

/// A projected node. Props are already filtered and include any layout metrics.
#[derive(Debug, Clone, PartialEq)]
pub struct SnapshotNode {
    tag: String,
    key: Option<String>,
    props: BTreeMap<String, PropValue>,
    children: Vec<SnapshotChild>,
}

#[derive(Debug, Clone, PartialEq)]
pub enum SnapshotChild {
    Text(String),
    Node(SnapshotNode),
}

impl SnapshotNode {
    pub fn tag(&self) -> &str {
        &self.tag
    }

    pub fn key(&self) -> Option<&str> {
        self.key.as_deref()
    }

    pub fn props(&self) -> &BTreeMap<String, PropValue> {
        &self.props
    }

    pub fn children(&self) -> &[SnapshotChild] {
        &self.children
    }
}

/// Read-only snapshot of a host tree under one projection.
#[derive(Debug, Clone, PartialEq)]
pub struct RenderedOutput {
    top: Vec<SnapshotChild>,
}

/// Walk `root` and project it. The tree is never modified.
pub fn extract(root: &HostNode, projection: &Projection) -> Result<RenderedOutput, ProjectionError> {
    let filter = projection.filter()?;
    let walker = Walker {
        filter: &filter,
        layout: projection.include_layout_metrics,
    };

    let top = if projection.include_root {
        vec![SnapshotChild::Node(walker.node(root))]
    } else {
        walker.children(&root.children)
    };
    Ok(RenderedOutput { top })
}

struct Walker<'a> {
    filter: &'a PropFilter,
    layout: bool,
}

impl Walker<'_> {
    fn node(&self, node: &HostNode) -> SnapshotNode {
        let mut props: BTreeMap<String, PropValue> = node
            .props
            .iter()
            .filter(|(name, _)| self.filter.admits(name))
            .map(|(name, value)| (name.clone(), value.clone()))
            .collect();

        if self.layout {
            if let Some(metrics) = &node.layout {
                for (name, value) in metrics.to_props() {
                    if self.filter.admits(&name) {
                        props.insert(name, value);
                    }
                }
            }
        }

        SnapshotNode {
            tag: node.tag.clone(),
            key: node.key.clone(),
            props,
            children: self.children(&node.children),
        }
    }

    /// Project children, merging runs of character data into one string.
    fn children(&self, children: &[HostChild]) -> Vec<SnapshotChild> {
        let mut out: Vec<SnapshotChild> = Vec::with_capacity(children.len());
        for child in children {
            match child {
                HostChild::Text(text) => {
                    if let Some(SnapshotChild::Text(prev)) = out.last_mut() {
                        prev.push_str(text);
                    } else {
                        out.push(SnapshotChild::Text(text.clone()));
                    }
                }
                HostChild::Node(node) => out.push(SnapshotChild::Node(self.node(node))),
            }
        }
        out
    }
}

impl RenderedOutput {
    /// Top-level entries: the root itself, or its children when the root is elided.
    pub fn top_level(&self) -> &[SnapshotChild] {
        &self.top
    }

    pub fn is_empty(&self) -> bool {
        self.top.is_empty()
    }

    /// Every projected node, depth-first.
    pub fn nodes(&self) -> Vec<&SnapshotNode> {
        fn walk<'a>(children: &'a [SnapshotChild], out: &mut Vec<&'a SnapshotNode>) {
            for child in children {
                if let SnapshotChild::Node(node) = child {
                    out.push(node);
                    walk(&node.children, out);
                }
            }
        }
        let mut out = Vec::new();
        walk(&self.top, &mut out);
        out
    }

    /// JSX-like markup. Floats carry six decimals; attributes are sorted.
    pub fn to_jsx(&self) -> String {
        let mut out = String::new();
        match self.top.as_slice() {
            [] => out.push_str("null"),
            [single] => write_child(&mut out, single, 0),
            many => {
                out.push_str("<>\n");
                for child in many {
                    write_child(&mut out, child, 1);
                    out.push('\n');
                }
                out.push_str("</>");
            }
        }
        out
    }

    /// Structured view with native JSON types.
    pub fn to_json(&self) -> serde_json::Value {
        match self.top.as_slice() {
            [] => serde_json::Value::Null,
            [single] => child_json(single),
            many => serde_json::Value::Array(many.iter().map(child_json).collect()),
        }
    }

    /// SHA-256 of the JSX view.
    pub fn digest(&self) -> String {
        let mut hasher = Sha256::new();
        hasher.update(self.to_jsx().as_bytes());
        format!("{:x}", hasher.finalize())
    }
}

fn indent(out: &mut String, depth: usize) {
    for _ in 0..depth {
        out.push_str("  ");
    }
}

fn write_child(out: &mut String, child: &SnapshotChild, depth: usize) {
    indent(out, depth);
    match child {
        SnapshotChild::Text(text) => out.push_str(&escape_text(text)),
        SnapshotChild::Node(node) => write_node(out, node, depth),
    }
}

fn write_node(out: &mut String, node: &SnapshotNode, depth: usize) {
    out.push('<');
    out.push_str(&node.tag);
    if let Some(key) = &node.key {
        let _ = write!(out, " key=\"{}\"", escape_attr(key));
    }
    for (name, value) in &node.props {
        let text = match value {
            PropValue::String(s) => s.clone(),
            PropValue::Int(n) if is_dimension_prop(name) => format!("{:.6}", *n as f64),
            other => other.to_string(),
        };
        let _ = write!(out, " {name}=\"{}\"", escape_attr(&text));
    }

    match node.children.as_slice() {
        [] => out.push_str(" />"),
        [SnapshotChild::Text(text)] => {
            let _ = write!(out, ">{}</{}>", escape_text(text), node.tag);
        }
        children => {
            out.push_str(">\n");
            for child in children {
                write_child(out, child, depth + 1);
                out.push('\n');
            }
            indent(out, depth);
            let _ = write!(out, "</{}>", node.tag);
        }
    }
}

fn escape_attr(s: &str) -> String {
    s.replace('&', "&amp;").replace('"', "&quot;").replace('<', "&lt;")
}

fn escape_text(s: &str) -> String {
    s.replace('&', "&amp;").replace('<', "&lt;").replace('>', "&gt;")
}

fn child_json(child: &SnapshotChild) -> serde_json::Value {
    match child {
        SnapshotChild::Text(text) => serde_json::Value::String(text.clone()),
        SnapshotChild::Node(node) => node_json(node),
    }
}

fn node_json(node: &SnapshotNode) -> serde_json::Value {
    let mut obj = serde_json::Map::new();
    obj.insert("type".into(), serde_json::Value::String(node.tag.clone()));
    if let Some(key) = &node.key {
        obj.insert("key".into(), serde_json::Value::String(key.clone()));
    }
    let props: serde_json::Map<String, serde_json::Value> = node
        .props
        .iter()
        .map(|(k, v)| (k.clone(), v.to_json()))
        .collect();
    obj.insert("props".into(), serde_json::Value::Object(props));

    let children = match node.children.as_slice() {
        [] => serde_json::Value::Null,
        [SnapshotChild::Text(text)] => serde_json::Value::String(text.clone()),
        many => serde_json::Value::Array(many.iter().map(child_json).collect()),
    };
    obj.insert("children".into(), children);
    serde_json::Value::Object(obj)
}
