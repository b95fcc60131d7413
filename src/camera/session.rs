//! Stream acquisition with resolution fallback, and the session that owns
//! the resulting stream.

use std::future::Future;

use super::negotiator::ResolutionNegotiator;
use super::types::{
    AcquisitionError, Frame, MediaConstraints, ResolutionCandidate, StreamSettings,
};
use crate::geometry::{GuideRect, Viewport};

/// An active camera stream.
pub trait MediaStream {
    /// Resolution and frame rate the device actually granted.
    fn settings(&self) -> StreamSettings;

    /// The most recent frame, or `None` if nothing is available yet.
    fn frame(&self) -> Option<Frame>;

    /// Stop every track of the stream. Must be safe to call repeatedly.
    fn stop_tracks(&mut self);
}

/// Something that can open camera streams, e.g. a device backend.
pub trait MediaSource {
    type Stream: MediaStream;

    /// Request a stream matching `constraints`. May suspend while the user
    /// grants or denies permission.
    fn acquire(
        &mut self,
        constraints: &MediaConstraints,
    ) -> impl Future<Output = Result<Self::Stream, AcquisitionError>>;
}

/// All resolution candidates were rejected.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("no supported resolution on this device (tried {attempts} resolution(s), last error: {last_error})")]
pub struct Unsupported {
    pub attempts: usize,
    pub last_error: AcquisitionError,
}

/// Owns the media source and drives acquisition across resolution candidates.
#[derive(Debug)]
pub struct StreamSessionManager<M> {
    source: M,
    negotiator: ResolutionNegotiator,
    constraints: MediaConstraints,
}

impl<M: MediaSource> StreamSessionManager<M> {
    pub fn new(source: M, negotiator: ResolutionNegotiator, constraints: MediaConstraints) -> Self {
        Self {
            source,
            negotiator,
            constraints,
        }
    }

    pub fn source(&self) -> &M {
        &self.source
    }

    pub fn negotiator(&self) -> &ResolutionNegotiator {
        &self.negotiator
    }

    /// Single acquisition attempt at `candidate`.
    pub async fn acquire(
        &mut self,
        candidate: ResolutionCandidate,
    ) -> Result<M::Stream, AcquisitionError> {
        let constraints = self.constraints.with_candidate(candidate);
        self.source.acquire(&constraints).await
    }

    /// Acquire a stream, falling back through the candidates on any error.
    ///
    /// Every error kind is handled the same way. After a success the
    /// negotiator goes back to the first candidate for the next start.
    pub async fn start(&mut self) -> Result<M::Stream, Unsupported> {
        loop {
            let candidate = self.negotiator.current();
            log::info!("Requesting camera stream at {}", candidate);

            match self.acquire(candidate).await {
                Ok(stream) => {
                    let settings = stream.settings();
                    log::info!(
                        "Camera stream acquired: requested {}, granted {}x{}",
                        candidate,
                        settings.width,
                        settings.height
                    );
                    self.negotiator.reset();
                    return Ok(stream);
                }
                Err(e) => {
                    log::warn!("Camera stream at {} failed: {}", candidate, e);
                    if self.negotiator.advance().is_err() {
                        let attempts = self.negotiator.attempts();
                        self.negotiator.reset();
                        log::error!("No supported resolution after {} attempt(s)", attempts);
                        return Err(Unsupported {
                            attempts,
                            last_error: e,
                        });
                    }
                }
            }
        }
    }
}

/// The active stream together with the geometry derived from it.
///
/// Exactly one session is alive at a time; it exclusively owns its stream.
/// Dropping a session releases the stream.
#[derive(Debug)]
pub struct Session<S: MediaStream> {
    stream: Option<S>,
    settings: StreamSettings,
    guide: GuideRect,
    viewport: Viewport,
}

impl<S: MediaStream> Session<S> {
    pub fn new(stream: S, guide: GuideRect, viewport: Viewport) -> Self {
        let settings = stream.settings();
        Self {
            stream: Some(stream),
            settings,
            guide,
            viewport,
        }
    }

    /// Negotiated stream settings; authoritative for all geometry.
    pub fn settings(&self) -> StreamSettings {
        self.settings
    }

    pub fn guide(&self) -> &GuideRect {
        &self.guide
    }

    pub fn viewport(&self) -> &Viewport {
        &self.viewport
    }

    pub fn is_active(&self) -> bool {
        self.stream.is_some()
    }

    /// Latest frame from the stream; `None` once released.
    pub fn frame(&self) -> Option<Frame> {
        self.stream.as_ref().and_then(S::frame)
    }

    /// Stop all tracks. Does nothing when already released.
    pub fn release(&mut self) {
        if let Some(mut stream) = self.stream.take() {
            stream.stop_tracks();
            log::info!(
                "Camera stream released ({}x{})",
                self.settings.width,
                self.settings.height
            );
        }
    }
}

impl<S: MediaStream> Drop for Session<S> {
    fn drop(&mut self) {
        self.release();
    }
}
