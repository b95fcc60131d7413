//! Consecutive-hit counter that decides when to capture.

use crate::geometry::{contains, DetectionBox, GuideRect};
use crate::sinks::Status;

/// Consecutive in-guide detections needed before capturing.
pub const DEFAULT_THRESHOLD: u32 = 6;

/// What one tick result did to the gate.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum GateDecision {
    /// Face inside the guide; streak is now `hits`.
    Contained { hits: u32 },
    /// Face present but outside the guide; streak reset.
    NotContained,
    /// No face; streak reset.
    Absent,
    /// Threshold reached. Emitted exactly once.
    Capture,
}

impl GateDecision {
    /// Status label for this outcome.
    pub fn status(&self) -> Status {
        match self {
            GateDecision::Contained { .. } | GateDecision::Capture => Status::HoldStill,
            GateDecision::NotContained => Status::PlaceFace,
            GateDecision::Absent => Status::NoFace,
        }
    }
}

#[derive(Debug, Clone)]
pub struct CaptureGate {
    hits: u32,
    threshold: u32,
    fired: bool,
}

impl CaptureGate {
    /// A threshold of zero is treated as one.
    pub fn new(threshold: u32) -> Self {
        Self {
            hits: 0,
            threshold: threshold.max(1),
            fired: false,
        }
    }

    pub fn hits(&self) -> u32 {
        self.hits
    }

    pub fn threshold(&self) -> u32 {
        self.threshold
    }

    pub fn has_fired(&self) -> bool {
        self.fired
    }

    /// Feed one tick result.
    ///
    /// After the capture has fired the counter is frozen and every further
    /// observation reports its status without another capture.
    pub fn observe(&mut self, guide: &GuideRect, detection: Option<&DetectionBox>) -> GateDecision {
        let contained = match detection {
            None => None,
            Some(detection) => Some(contains(guide, detection)),
        };

        if self.fired {
            return match contained {
                Some(true) => GateDecision::Contained { hits: self.hits },
                Some(false) => GateDecision::NotContained,
                None => GateDecision::Absent,
            };
        }

        match contained {
            Some(true) => {
                self.hits += 1;
                if self.hits >= self.threshold {
                    self.fired = true;
                    GateDecision::Capture
                } else {
                    GateDecision::Contained { hits: self.hits }
                }
            }
            Some(false) => {
                self.hits = 0;
                GateDecision::NotContained
            }
            None => {
                self.hits = 0;
                GateDecision::Absent
            }
        }
    }
}

impl Default for CaptureGate {
    fn default() -> Self {
        Self::new(DEFAULT_THRESHOLD)
    }
}
