//! livelink-stream-core
//!
//! Host-agnostic engine for streaming live motion and property data to a
//! visualization host at a fixed frame rate:
//!
//! - [`hierarchy`]: flattens a nested skeleton description into a
//!   parent-indexed bone list.
//! - [`scheduler`]: the fixed-rate tick loop with a logical clock decoupled
//!   from wall-clock pacing.
//! - [`driver`]: resolves, registers once, then streams.
//! - [`session`]: the host collaborator contract and the handle that owns its
//!   load/unload lifecycle.

pub mod cancel;
pub mod clock;
pub mod config;
pub mod driver;
pub mod error;
pub mod frame;
pub mod hierarchy;
pub mod scheduler;
pub mod session;
pub mod sink;
pub mod structure;

/// Host-side name buffer size, terminator included.
pub const MAX_NAME_LENGTH: usize = 128;

// Re-exports for consumers (hosts, demos)
pub use cancel::CancelToken;
pub use clock::FrameClock;
pub use config::{PacingMode, StreamConfig};
pub use driver::StreamDriver;
pub use error::{HierarchyError, SinkError, StreamError};
pub use frame::{Camera, Frame, Light, Metadata, Payload, Timecode, TimecodeFormat, Transform};
pub use hierarchy::{resolve, resolve_with_root, BoneSpec, BoneTable, SkeletonTree};
pub use scheduler::{
    FrameScheduler, Pacer, RunReport, SchedulerState, StepBudget, ThreadPacer, Unpaced,
};
pub use session::{LiveLinkHost, LoadStatus, Session};
pub use sink::FrameSink;
pub use structure::{CameraStatic, LightStatic, Role, Structure, StructureTemplate};
