pub mod error;
pub mod node;
pub mod projection;
pub mod snapshot;
pub mod value;

pub use error::ProjectionError;
pub use node::{
    is_dimension_prop, DisplayType, EdgeInsets, HostChild, HostNode, LayoutDirection, LayoutMetrics, Rect,
    DIMENSION_PROPS, LAYOUT_METRICS_PREFIX,
};
pub use projection::{PropFilter, Projection};
pub use snapshot::{extract, RenderedOutput, SnapshotChild, SnapshotNode};
pub use value::PropValue;
