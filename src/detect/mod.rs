//! Face detection sampling and capture gating.

mod gate;
mod oracle;
mod sampler;

pub use gate::{CaptureGate, GateDecision, DEFAULT_THRESHOLD};
pub use oracle::{DetectorError, FaceDetector, ScriptError, ScriptStep, ScriptedDetector};
pub use sampler::{DetectionSampler, SamplerExit, SamplerState, TickOutcome, DEFAULT_TICK_INTERVAL};
