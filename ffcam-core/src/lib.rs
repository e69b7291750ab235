//! Battle camera script compensation for a half-resolution game engine.
//!
//! The host runs the game's battle camera scripts unmodified through its native
//! interpreters. Several camera opcodes carry distances and durations that were
//! authored for half the host's frame rate. This crate walks each script ahead
//! of the native interpreter, doubles those argument bytes in place (once per
//! address), compensates camera functions registered indirectly, and checks the
//! native cursor against the simulated one after each call.

pub mod camera;
pub mod config;
pub mod error;
pub mod memory;
pub mod script;
pub mod trace;

pub use camera::{BattleCamera, CameraRun, NativeCameraExecutor};
pub use config::{CameraConfig, CameraConfigBuilder, CameraConfigReader, LoggerConfig};
pub use error::{CameraError, Diagnostic};
pub use memory::{HostMemory, ScriptView};
pub use script::{Cursor, Dialect, Halt, ScriptLayout, Simulation, Simulator};
pub use trace::TraceFlags;
