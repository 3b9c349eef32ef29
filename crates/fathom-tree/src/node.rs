use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use crate::value::PropValue;

/// A node in the rendered host tree.
///
/// Host trees are produced by a renderer and only ever read by the
/// snapshot extractor.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct HostNode {
    pub tag: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub key: Option<String>,
    #[serde(default)]
    pub props: BTreeMap<String, PropValue>,
    #[serde(default)]
    pub children: Vec<HostChild>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub layout: Option<LayoutMetrics>,
}

/// A child slot: either a nested node or raw character data.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum HostChild {
    Text(String),
    Node(HostNode),
}

impl HostNode {
    pub fn new(tag: impl Into<String>) -> Self {
        HostNode {
            tag: tag.into(),
            key: None,
            props: BTreeMap::new(),
            children: Vec::new(),
            layout: None,
        }
    }

    pub fn with_key(mut self, key: impl Into<String>) -> Self {
        self.key = Some(key.into());
        self
    }

    pub fn with_prop(mut self, name: impl Into<String>, value: impl Into<PropValue>) -> Self {
        self.props.insert(name.into(), value.into());
        self
    }

    pub fn with_child(mut self, child: HostNode) -> Self {
        self.children.push(HostChild::Node(child));
        self
    }

    pub fn with_text(mut self, text: impl Into<String>) -> Self {
        self.children.push(HostChild::Text(text.into()));
        self
    }

    pub fn with_layout(mut self, layout: LayoutMetrics) -> Self {
        self.layout = Some(layout);
        self
    }

    pub fn prop(&self, name: &str) -> Option<&PropValue> {
        self.props.get(name)
    }

    /// Child nodes, skipping character data.
    pub fn child_nodes(&self) -> impl Iterator<Item = &HostNode> {
        self.children.iter().filter_map(|c| match c {
            HostChild::Node(n) => Some(n),
            HostChild::Text(_) => None,
        })
    }

    /// Concatenated character data of the whole subtree.
    pub fn text_content(&self) -> String {
        let mut out = String::new();
        for child in &self.children {
            match child {
                HostChild::Text(t) => out.push_str(t),
                HostChild::Node(n) => out.push_str(&n.text_content()),
            }
        }
        out
    }

    /// Number of nodes in this subtree, including this one.
    pub fn node_count(&self) -> usize {
        1 + self.child_nodes().map(HostNode::node_count).sum::<usize>()
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct Rect {
    pub x: f64,
    pub y: f64,
    pub width: f64,
    pub height: f64,
}

impl Rect {
    pub fn new(x: f64, y: f64, width: f64, height: f64) -> Self {
        Rect { x, y, width, height }
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct EdgeInsets {
    pub top: f64,
    pub right: f64,
    pub bottom: f64,
    pub left: f64,
}

impl EdgeInsets {
    pub fn uniform(v: f64) -> Self {
        EdgeInsets { top: v, right: v, bottom: v, left: v }
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub enum LayoutDirection {
    Undefined,
    #[default]
    LeftToRight,
    RightToLeft,
}

impl LayoutDirection {
    pub fn as_str(&self) -> &'static str {
        match self {
            LayoutDirection::Undefined => "Undefined",
            LayoutDirection::LeftToRight => "LeftToRight",
            LayoutDirection::RightToLeft => "RightToLeft",
        }
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub enum DisplayType {
    None,
    #[default]
    Flex,
    Inline,
}

impl DisplayType {
    pub fn as_str(&self) -> &'static str {
        match self {
            DisplayType::None => "None",
            DisplayType::Flex => "Flex",
            DisplayType::Inline => "Inline",
        }
    }
}

/// Computed geometry attached to a host node by the layout engine.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LayoutMetrics {
    pub frame: Rect,
    #[serde(default)]
    pub border_width: EdgeInsets,
    #[serde(default)]
    pub content_insets: EdgeInsets,
    #[serde(default)]
    pub overflow_inset: EdgeInsets,
    #[serde(default)]
    pub layout_direction: LayoutDirection,
    #[serde(default)]
    pub display_type: DisplayType,
    #[serde(default = "default_point_scale_factor")]
    pub point_scale_factor: f64,
}

fn default_point_scale_factor() -> f64 {
    1.0
}

/// Prefix shared by every derived layout property.
pub const LAYOUT_METRICS_PREFIX: &str = "layoutMetrics-";

/// Props holding lengths. The JSX view always prints them as floats.
pub const DIMENSION_PROPS: &[&str] = &["width", "height", "padding", "margin", "borderWidth", "lineHeight", "fontSize"];

pub fn is_dimension_prop(name: &str) -> bool {
    DIMENSION_PROPS.contains(&name)
}

impl LayoutMetrics {
    pub fn new(frame: Rect) -> Self {
        LayoutMetrics {
            frame,
            border_width: EdgeInsets::default(),
            content_insets: EdgeInsets::default(),
            overflow_inset: EdgeInsets::default(),
            layout_direction: LayoutDirection::default(),
            display_type: DisplayType::default(),
            point_scale_factor: default_point_scale_factor(),
        }
    }

    /// Flatten into `layoutMetrics-*` properties.
    pub fn to_props(&self) -> Vec<(String, PropValue)> {
        let rect = |r: &Rect| {
            PropValue::map([
                ("x", r.x),
                ("y", r.y),
                ("width", r.width),
                ("height", r.height),
            ])
        };
        let insets = |e: &EdgeInsets| {
            PropValue::map([
                ("top", e.top),
                ("right", e.right),
                ("bottom", e.bottom),
                ("left", e.left),
            ])
        };
        let entries = [
            ("frame", rect(&self.frame)),
            ("borderWidth", insets(&self.border_width)),
            ("contentInsets", insets(&self.content_insets)),
            ("overflowInset", insets(&self.overflow_inset)),
            ("layoutDirection", self.layout_direction.as_str().into()),
            ("displayType", self.display_type.as_str().into()),
            ("pointScaleFactor", self.point_scale_factor.into()),
        ];
        entries
            .into_iter()
            .map(|(name, value)| (format!("{LAYOUT_METRICS_PREFIX}{name}"), value))
            .collect()
    }
}
