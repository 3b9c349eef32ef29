use fathom_tree::{
    is_dimension_prop, DisplayType, EdgeInsets, HostChild, HostNode, LayoutDirection, LayoutMetrics,
    PropValue, Rect,
};

use crate::config::RootConfig;
use crate::element::{Element, ElementChild};
use crate::error::HarnessError;

/// Turns an element description into host nodes with computed geometry.
pub trait Renderer {
    fn render(&mut self, element: &Element, config: &RootConfig) -> Result<Vec<HostChild>, HarnessError>;
}

/// Props that only influence geometry. A view carrying nothing else is flattened.
const LAYOUT_ONLY_PROPS: &[&str] = &["width", "height", "padding", "margin", "direction", "collapsable"];

/// Minimal block-flow layout: children stack vertically and stretch to the
/// parent's content width unless they set `width`.
#[derive(Debug, Clone)]
pub struct FlowRenderer {
    /// Drop views that carry only layout props, hoisting their children.
    pub flatten: bool,
    /// Height of one run of text.
    pub line_height: f64,
}

impl Default for FlowRenderer {
    fn default() -> Self {
        FlowRenderer {
            flatten: true,
            line_height: 20.0,
        }
    }
}

#[derive(Debug, Clone, Copy, Default)]
struct Extent {
    width: f64,
    height: f64,
}

impl Renderer for FlowRenderer {
    fn render(&mut self, element: &Element, config: &RootConfig) -> Result<Vec<HostChild>, HarnessError> {
        let mut out = Vec::new();
        self.place(element, 0.0, 0.0, config.viewport_width, config.point_scale_factor, &mut out)?;
        Ok(out)
    }
}

impl FlowRenderer {
    pub fn without_flattening() -> Self {
        FlowRenderer {
            flatten: false,
            ..Self::default()
        }
    }

    /// Lay out `el` with its margin box at `(x, y)` in host-parent coordinates.
    fn place(
        &self,
        el: &Element,
        x: f64,
        y: f64,
        avail_width: f64,
        scale: f64,
        out: &mut Vec<HostChild>,
    ) -> Result<Extent, HarnessError> {
        if el.is_fragment() {
            let (height, width) = self.stack(el, x, y, avail_width, scale, out)?;
            return Ok(Extent { width, height });
        }

        let margin = dimension(el, "margin")?.unwrap_or(0.0);
        let (bx, by) = (x + margin, y + margin);
        let width = dimension(el, "width")?.unwrap_or((avail_width - 2.0 * margin).max(0.0));

        if el.is_hidden() {
            let mut metrics = LayoutMetrics::new(Rect::new(bx, by, 0.0, 0.0));
            metrics.display_type = DisplayType::None;
            metrics.point_scale_factor = scale;
            out.push(HostChild::Node(self.host_node(el, Vec::new(), metrics)));
            return Ok(Extent::default());
        }

        let border = dimension(el, "borderWidth")?.unwrap_or(0.0);
        let inset = border + dimension(el, "padding")?.unwrap_or(0.0);
        let content_width = (width - 2.0 * inset).max(0.0);
        let flatten = self.flatten && is_collapsable(el);

        // Flattened children are positioned relative to our host parent.
        let (ox, oy) = if flatten { (bx + inset, by + inset) } else { (inset, inset) };
        let mut kids = Vec::new();
        let (content_height, content_right) = self.stack(el, ox, oy, content_width, scale, &mut kids)?;
        let height = dimension(el, "height")?.unwrap_or(content_height + 2.0 * inset);

        if flatten {
            out.extend(kids);
            return Ok(Extent {
                width: width + 2.0 * margin,
                height: height + 2.0 * margin,
            });
        }

        let overflow = |extent: f64, size: f64| {
            let over = inset + extent - size;
            if over > 0.0 { -over } else { 0.0 }
        };
        let metrics = LayoutMetrics {
            frame: Rect::new(bx, by, width, height),
            border_width: EdgeInsets::uniform(border),
            content_insets: EdgeInsets::uniform(inset),
            overflow_inset: EdgeInsets {
                right: overflow(content_right, width),
                bottom: overflow(content_height, height),
                ..EdgeInsets::default()
            },
            layout_direction: match el.prop("direction").and_then(PropValue::as_str) {
                Some("rtl") => LayoutDirection::RightToLeft,
                _ => LayoutDirection::LeftToRight,
            },
            display_type: DisplayType::Flex,
            point_scale_factor: scale,
        };
        out.push(HostChild::Node(self.host_node(el, kids, metrics)));

        Ok(Extent {
            width: width + 2.0 * margin,
            height: height + 2.0 * margin,
        })
    }

    /// Stack children of `el` vertically from `(x, y)`. Returns (height, widest extent).
    fn stack(
        &self,
        el: &Element,
        x: f64,
        y: f64,
        avail_width: f64,
        scale: f64,
        out: &mut Vec<HostChild>,
    ) -> Result<(f64, f64), HarnessError> {
        let line_height = dimension(el, "lineHeight")?.unwrap_or(self.line_height);
        let mut cursor = 0.0;
        let mut widest: f64 = 0.0;
        for child in &el.children {
            match child {
                ElementChild::Element(child) => {
                    let extent = self.place(child, x, y + cursor, avail_width, scale, out)?;
                    cursor += extent.height;
                    widest = widest.max(extent.width);
                }
                ElementChild::Text(text) => {
                    out.push(HostChild::Text(text.clone()));
                    cursor += line_height;
                }
            }
        }
        Ok((cursor, widest))
    }

    fn host_node(&self, el: &Element, children: Vec<HostChild>, metrics: LayoutMetrics) -> HostNode {
        let props = el
            .props
            .iter()
            .filter(|(name, _)| name.as_str() != "collapsable")
            .map(|(name, value)| {
                let value = match value {
                    PropValue::Int(n) if is_dimension_prop(name) => PropValue::Float(*n as f64),
                    other => other.clone(),
                };
                (name.clone(), value)
            })
            .collect();

        HostNode {
            tag: el.tag.clone(),
            key: el.key.clone(),
            props,
            children,
            layout: Some(metrics),
        }
    }
}

fn is_collapsable(el: &Element) -> bool {
    el.tag == "rn-view"
        && el.node_ref.is_none()
        && el.handlers.is_empty()
        && !el.has_text_children()
        && el.prop("collapsable") != Some(&PropValue::Bool(false))
        && el.props.keys().all(|k| LAYOUT_ONLY_PROPS.contains(&k.as_str()))
}

fn dimension(el: &Element, name: &str) -> Result<Option<f64>, HarnessError> {
    let value = match el.prop(name) {
        Some(value) if !value.is_null() => value,
        _ => return Ok(None),
    };
    match value.as_f64() {
        Some(v) if v.is_finite() && v >= 0.0 => Ok(Some(v)),
        Some(v) => Err(HarnessError::Render(format!(
            "`{name}` on <{}> must be a finite non-negative number, got {v}",
            el.tag
        ))),
        None => Err(HarnessError::Render(format!(
            "`{name}` on <{}> must be a number, got {}",
            el.tag,
            value.type_name()
        ))),
    }
}
