//! # motion_core
//!
//! Turns a high-rate stream of hand-tracking frames into a low-rate stream
//! of actuator commands.
//!
//! ```text
//!  HandFrame ──▶ TapDebouncer ──▶ transform ──▶ RateLimiter ──▶ CommandSink
//!   (~110 Hz)                     (pointer/arm)   (every Nth)     (serial)
//! ```
//!
//! Two pipelines share that shape:
//!
//! | Pipeline | Input | Output (wire order) |
//! |---|---|---|
//! | [`PointerPipeline`] | palm velocity, grab, taps | `up,down,right,left,click` |
//! | [`ArmPipeline`] | palm position, movement, grab | `grab,base,vertical,frontBack` |
//!
//! Nothing in this crate opens devices, spawns threads or sleeps. The
//! caller owns a [`CommandSink`] and feeds frames in from whichever thread
//! the sensor delivers them on.
//!
//! ## Quick start
//!
//! ```rust
//! use motion_core::{HandFrame, MemorySink, Pipeline, PointerPipeline, PoseSample, Vector3};
//!
//! let mut pipeline = PointerPipeline::default();
//! let mut sink = MemorySink::new();
//! for t in 0..5 {
//!     let hand = PoseSample::new(Vector3::ZERO, Vector3::new(150.0, 0.0, 0.0), 0.0, t);
//!     pipeline.on_frame(&HandFrame::single(hand), &mut sink);
//! }
//! assert_eq!(sink.wire_strings(), vec!["0,0,0,25,0"]);
//! ```

pub mod pose;
pub mod debounce;
pub mod pointer;
pub mod arm;
pub mod limiter;
pub mod sink;
pub mod pipeline;

pub use pose::{GestureEvent, GestureKind, HandFrame, PoseSample, Vector3};
pub use debounce::TapDebouncer;
pub use pointer::{PointerCommand, PointerConfig, PointerTransform};
pub use arm::{scale_grab, ArmCommand, ArmConfig, ArmTransform};
pub use limiter::RateLimiter;
pub use sink::{Command, CommandSink, MemorySink, SinkError, WireSink};
pub use pipeline::{ArmPipeline, Dispatch, Pipeline, PointerPipeline};
