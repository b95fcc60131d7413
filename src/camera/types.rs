//! Camera types and data structures.

use std::fmt;
use std::time::Instant;

use image::RgbImage;
use serde::{Deserialize, Serialize};

use crate::geometry::Size;

/// A resolution to request from the camera, as an exact-pixel constraint.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct ResolutionCandidate {
    pub width: u32,
    pub height: u32,
}

impl ResolutionCandidate {
    pub const fn square(side: u32) -> Self {
        Self {
            width: side,
            height: side,
        }
    }

    /// Default candidates, highest resolution first.
    pub fn defaults() -> Vec<Self> {
        [1200, 1000, 800, 600, 400]
            .into_iter()
            .map(Self::square)
            .collect()
    }
}

impl fmt::Display for ResolutionCandidate {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}x{}", self.width, self.height)
    }
}

/// Video part of the media request.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct VideoConstraints {
    /// Exact width; `None` until a candidate has been substituted.
    pub width: Option<u32>,
    /// Exact height; `None` until a candidate has been substituted.
    pub height: Option<u32>,
    pub frame_rate: u32,
}

/// The request handed to the media source for each acquisition attempt.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MediaConstraints {
    pub audio: bool,
    pub video: VideoConstraints,
}

impl MediaConstraints {
    pub fn new(audio: bool, frame_rate: u32) -> Self {
        Self {
            audio,
            video: VideoConstraints {
                width: None,
                height: None,
                frame_rate,
            },
        }
    }

    /// Substitute the candidate's width/height, leaving everything else as is.
    pub fn with_candidate(&self, candidate: ResolutionCandidate) -> Self {
        let mut constraints = self.clone();
        constraints.video.width = Some(candidate.width);
        constraints.video.height = Some(candidate.height);
        constraints
    }

    /// The exact resolution requested, if a candidate has been substituted.
    pub fn requested(&self) -> Option<ResolutionCandidate> {
        Some(ResolutionCandidate {
            width: self.video.width?,
            height: self.video.height?,
        })
    }
}

impl Default for MediaConstraints {
    fn default() -> Self {
        Self::new(true, 20)
    }
}

/// What the device actually granted for an acquired stream.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct StreamSettings {
    pub width: u32,
    pub height: u32,
    pub frame_rate: Option<u32>,
}

impl StreamSettings {
    pub fn size(&self) -> Size {
        Size::new(self.width, self.height)
    }
}

/// A single video frame at the stream's native resolution.
#[derive(Debug, Clone)]
pub struct Frame {
    /// RGB pixel data
    pub image: RgbImage,
    /// Timestamp when frame was captured
    pub timestamp: Instant,
}

impl Frame {
    pub fn new(image: RgbImage) -> Self {
        Self {
            image,
            timestamp: Instant::now(),
        }
    }

    pub fn width(&self) -> u32 {
        self.image.width()
    }

    pub fn height(&self) -> u32 {
        self.image.height()
    }

    pub fn size(&self) -> Size {
        Size::new(self.width(), self.height())
    }
}

/// Reasons a single acquisition attempt can fail.
///
/// The session manager treats every variant the same way: move on to the
/// next resolution candidate.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum AcquisitionError {
    #[error("camera is busy or unavailable")]
    DeviceBusy,

    #[error("camera permission denied")]
    PermissionDenied,

    #[error("camera cannot satisfy {width}x{height}")]
    ConstraintUnsatisfiable { width: u32, height: u32 },

    #[error("failed to open camera: {0}")]
    Other(String),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_candidates_descending() {
        let candidates = ResolutionCandidate::defaults();
        let widths: Vec<u32> = candidates.iter().map(|c| c.width).collect();
        assert_eq!(widths, vec![1200, 1000, 800, 600, 400]);
        assert!(candidates.iter().all(|c| c.width == c.height));
    }

    #[test]
    fn test_constraints_default() {
        let constraints = MediaConstraints::default();
        assert!(constraints.audio);
        assert_eq!(constraints.video.frame_rate, 20);
        assert_eq!(constraints.requested(), None);
    }

    #[test]
    fn test_with_candidate_only_substitutes_resolution() {
        let base = MediaConstraints::new(false, 15);
        let constraints = base.with_candidate(ResolutionCandidate::square(800));
        assert!(!constraints.audio);
        assert_eq!(constraints.video.frame_rate, 15);
        assert_eq!(constraints.video.width, Some(800));
        assert_eq!(constraints.video.height, Some(800));
        assert_eq!(constraints.requested(), Some(ResolutionCandidate::square(800)));
        // Base is untouched
        assert_eq!(base.video.width, None);
    }

    #[test]
    fn test_acquisition_error_display() {
        assert_eq!(
            AcquisitionError::ConstraintUnsatisfiable {
                width: 1200,
                height: 1200
            }
            .to_string(),
            "camera cannot satisfy 1200x1200"
        );
        assert!(AcquisitionError::PermissionDenied
            .to_string()
            .contains("permission denied"));
    }

    #[test]
    fn test_frame_size() {
        let frame = Frame::new(RgbImage::new(4, 3));
        assert_eq!(frame.size(), Size::new(4, 3));
        assert_eq!(ResolutionCandidate::square(600).to_string(), "600x600");
    }
}
