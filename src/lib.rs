//! Traffic operator console core.
//!
//! The console displays a video feed annotated by an external
//! detection/counting engine, surfaces running vehicle counts, and renders
//! them on a map and in charts. The engine itself (inference, tracking,
//! decoding) is a black box behind the `CountingEngine` trait; this crate
//! owns everything between that boundary and the screen.
//!
//! # Module Structure
//!
//! - `engine`: the polling capability surface plus a stub implementation
//! - `relay`: background engine driver, fixed-cadence poll loop, lifecycle
//! - `dispatch`: ordered relay-to-UI event delivery
//! - `session`: authoritative state, error taxonomy, session controller
//! - `views`: frame/counter/map/chart projections of the latest snapshot
//! - `snapshot`: the per-tick frame + counts payload
//! - `config`: camera sites, categories, cadence
//!
//! # Threading
//!
//! Exactly two logical threads. The interactive thread owns all views and
//! user input; the relay thread owns the engine and is the only thread that
//! ever calls it. The only cross-thread shared data are the dispatcher's
//! channel and the relay's running flag.

pub mod config;
pub mod dispatch;
pub mod engine;
pub mod relay;
pub mod session;
pub mod snapshot;
pub mod views;

pub use config::{default_categories, default_sites, CameraSite, ConsoleConfig};
pub use dispatch::{dispatch_channel, UpdateEvent, UpdateReceiver, UpdateSender};
pub use engine::{CountingEngine, FramePoll, StubEngine, StubEngineStats, StubStep};
pub use relay::{Relay, RelayHandle};
pub use session::{SessionController, SessionError, SessionState};
pub use snapshot::{ChannelOrder, FrameImage, Snapshot};
pub use views::{
    ChartModel, ChartView, CounterView, FrameView, MapCenter, MapMarker, MapView, OVERVIEW_ZOOM,
    SITE_ZOOM,
};
