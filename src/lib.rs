//! face-check library crate.
//!
//! Drives an interactive face capture: acquire a camera stream with
//! resolution fallback, sample a face detector on a fixed interval, and
//! crop a still once the face has stayed inside the guide box long enough.

pub mod camera;
pub mod cli;
pub mod config;
pub mod detect;
pub mod flow;
pub mod geometry;
pub mod guide;
pub mod sinks;

pub use flow::{CaptureReport, FaceCheck, FlowError, FlowOutcome, FlowSettings, Sinks};
