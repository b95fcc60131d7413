//! A camera backed by a single still image.
//!
//! Used to replay a capture flow without hardware: the image is resized to
//! whatever resolution is granted and served as every frame.

use image::imageops::{self, FilterType};
use image::RgbImage;

use super::session::{MediaSource, MediaStream};
use super::types::{AcquisitionError, Frame, MediaConstraints, ResolutionCandidate, StreamSettings};

/// Media source that serves one image at any of a fixed set of resolutions.
#[derive(Debug, Clone)]
pub struct StillSource {
    image: RgbImage,
    /// Resolutions the "device" supports; empty means any.
    supported: Vec<ResolutionCandidate>,
    attempts: Vec<ResolutionCandidate>,
}

impl StillSource {
    pub fn new(image: RgbImage) -> Self {
        Self {
            image,
            supported: Vec::new(),
            attempts: Vec::new(),
        }
    }

    /// Restrict the resolutions this source will grant.
    pub fn with_supported(mut self, supported: Vec<ResolutionCandidate>) -> Self {
        self.supported = supported;
        self
    }

    /// Every resolution requested so far, in order.
    pub fn attempts(&self) -> &[ResolutionCandidate] {
        &self.attempts
    }

    fn supports(&self, requested: &ResolutionCandidate) -> bool {
        self.supported.is_empty() || self.supported.contains(requested)
    }
}

impl MediaSource for StillSource {
    type Stream = StillStream;

    async fn acquire(
        &mut self,
        constraints: &MediaConstraints,
    ) -> Result<StillStream, AcquisitionError> {
        let requested = match constraints.requested() {
            Some(requested) => requested,
            None => ResolutionCandidate {
                width: self.image.width(),
                height: self.image.height(),
            },
        };
        self.attempts.push(requested);

        if !self.supports(&requested) {
            return Err(AcquisitionError::ConstraintUnsatisfiable {
                width: requested.width,
                height: requested.height,
            });
        }

        let image = if self.image.dimensions() == (requested.width, requested.height) {
            self.image.clone()
        } else {
            imageops::resize(
                &self.image,
                requested.width,
                requested.height,
                FilterType::Triangle,
            )
        };

        Ok(StillStream {
            frame: Frame::new(image),
            settings: StreamSettings {
                width: requested.width,
                height: requested.height,
                frame_rate: Some(constraints.video.frame_rate),
            },
            stopped: false,
        })
    }
}

/// Stream handed out by [`StillSource`].
#[derive(Debug)]
pub struct StillStream {
    frame: Frame,
    settings: StreamSettings,
    stopped: bool,
}

impl StillStream {
    pub fn is_stopped(&self) -> bool {
        self.stopped
    }
}

impl MediaStream for StillStream {
    fn settings(&self) -> StreamSettings {
        self.settings
    }

    fn frame(&self) -> Option<Frame> {
        if self.stopped {
            return None;
        }
        Some(self.frame.clone())
    }

    fn stop_tracks(&mut self) {
        self.stopped = true;
    }
}
