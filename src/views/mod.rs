//! View consumers.
//!
//! Each view is a pure projection of the latest delivered snapshot plus
//! static configuration. Views are stateless between updates in the sense
//! that `apply` always leaves them reflecting the newest snapshot; they
//! never accumulate counts themselves and never hold engine references.

mod chart_view;
mod counter_view;
mod frame_view;
mod map_view;

pub use chart_view::{ChartModel, ChartView};
pub use counter_view::CounterView;
pub use frame_view::FrameView;
pub use map_view::{MapCenter, MapMarker, MapView, OVERVIEW_ZOOM, SITE_ZOOM};
