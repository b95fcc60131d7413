//! Camera stream acquisition.
//!
//! This module provides:
//! - Resolution fallback via [`ResolutionNegotiator`]
//! - Stream lifecycle via [`StreamSessionManager`] and [`Session`]
//! - The [`MediaSource`] / [`MediaStream`] seams a device backend implements
//! - A hardware-free [`StillSource`] for replays

mod negotiator;
mod session;
mod still;
mod types;

pub use negotiator::{Exhausted, ResolutionNegotiator};
pub use session::{MediaSource, MediaStream, Session, StreamSessionManager, Unsupported};
pub use still::{StillSource, StillStream};
pub use types::{
    AcquisitionError, Frame, MediaConstraints, ResolutionCandidate, StreamSettings,
    VideoConstraints,
};
