//! Counting engine boundary.
//!
//! The detection/counting engine is an external collaborator: model
//! inference, tracking, and frame decoding all live behind the
//! `CountingEngine` trait. The console core only ever drives it through
//! the narrow polling surface defined here.
//!
//! Engine calls happen on the relay thread ONLY. The trait is `Send`, not
//! `Sync`; engines are assumed non-reentrant and externally serialized.

mod handle;
pub mod stub;

pub use handle::{CountingEngine, FramePoll};
pub use stub::{StubEngine, StubEngineStats, StubStep};
