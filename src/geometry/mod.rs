//! Screen-space geometry of the rendered staff
//!
//! Metrics and transforms come back from each render pass; the resolver and
//! insertion helpers turn pointer coordinates into pitches and note indices.

pub mod metrics;
pub mod selectable;
pub mod resolver;
pub mod insertion;

pub use metrics::{
    BoundingBox, LinearStaffGeometry, ScreenPoint, ScreenToStaffTransform, StaffGeometryProvider,
    StaffMetrics, StaffPoint,
};
pub use selectable::{RenderedNotehead, SelectableEntry, SelectableRegistry};
pub use resolver::{find_closest_pitch_for_y, line_for_y, PitchSearch, ResolvedPitch};
pub use insertion::resolve_insert_index;
