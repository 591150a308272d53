//! Tonebox - a real-time tone synthesizer for Rust
//!
//! This library provides a periodic signal generator and a low-latency
//! audio output sink, plus the small control-surface vocabulary needed to
//! drive them from an interactive loop.

pub mod control;
pub mod error;
pub mod generator;
pub mod signal;
pub mod sink;

// Re-export commonly used types at the crate root
pub use control::{Command, FREQUENCY_STEP_HZ, ShutdownToken};
pub use error::{Error, Result};
pub use generator::{SignalGenerator, Waveform};
pub use signal::Signal;
pub use sink::{AudioSink, FillFn};
