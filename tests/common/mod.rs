//! Recording fakes shared by the integration tests.

#![allow(dead_code)]

use std::cell::{Cell, RefCell};
use std::rc::Rc;

use face_check::camera::{
    AcquisitionError, Frame, MediaConstraints, MediaSource, MediaStream, ResolutionCandidate,
    StreamSettings,
};
use face_check::detect::{DetectorError, FaceDetector, ScriptStep, ScriptedDetector};
use face_check::geometry::{DetectionBox, Rect};
use face_check::sinks::{ImageSink, Layer, Overlay, SinkError, Status, StatusSink, Stroke};
use face_check::Sinks;
use image::{Rgb, RgbImage};

/// Box well inside the 600x600 guide {100, 100, 500, 500}.
pub const INSIDE_600: Rect = Rect::new(150.0, 150.0, 450.0, 450.0);
/// Box well inside the 1200x1200 guide {200, 200, 1000, 1000}.
pub const INSIDE_1200: Rect = Rect::new(300.0, 300.0, 900.0, 900.0);
/// Box touching the 600x600 guide's top edge.
pub const TOUCHING_600: Rect = Rect::new(100.0, 150.0, 450.0, 450.0);

/// Camera that only grants the listed resolutions.
#[derive(Debug)]
pub struct FakeCamera {
    supported: Vec<ResolutionCandidate>,
    pub attempts: Vec<ResolutionCandidate>,
    pub constraints: Vec<MediaConstraints>,
    /// Total `stop_tracks` calls across every stream handed out.
    pub stops: Rc<Cell<u32>>,
}

impl FakeCamera {
    pub fn supporting(supported: &[u32]) -> Self {
        Self {
            supported: supported.iter().copied().map(ResolutionCandidate::square).collect(),
            attempts: Vec::new(),
            constraints: Vec::new(),
            stops: Rc::new(Cell::new(0)),
        }
    }
}

impl MediaSource for FakeCamera {
    type Stream = FakeStream;

    async fn acquire(
        &mut self,
        constraints: &MediaConstraints,
    ) -> Result<FakeStream, AcquisitionError> {
        self.constraints.push(constraints.clone());
        let Some(requested) = constraints.requested() else {
            return Err(AcquisitionError::Other("no resolution requested".to_string()));
        };
        self.attempts.push(requested);

        if !self.supported.contains(&requested) {
            return Err(AcquisitionError::ConstraintUnsatisfiable {
                width: requested.width,
                height: requested.height,
            });
        }
        Ok(FakeStream {
            settings: StreamSettings {
                width: requested.width,
                height: requested.height,
                frame_rate: Some(constraints.video.frame_rate),
            },
            stopped: false,
            stops: Rc::clone(&self.stops),
        })
    }
}

#[derive(Debug)]
pub struct FakeStream {
    settings: StreamSettings,
    stopped: bool,
    stops: Rc<Cell<u32>>,
}

impl MediaStream for FakeStream {
    fn settings(&self) -> StreamSettings {
        self.settings
    }

    fn frame(&self) -> Option<Frame> {
        if self.stopped {
            return None;
        }
        // Left half dark, right half light, so crops are recognisable.
        let image = RgbImage::from_fn(self.settings.width, self.settings.height, |x, _| {
            if x < self.settings.width / 2 {
                Rgb([20, 20, 20])
            } else {
                Rgb([230, 230, 230])
            }
        });
        Some(Frame::new(image))
    }

    fn stop_tracks(&mut self) {
        if !self.stopped {
            self.stopped = true;
            self.stops.set(self.stops.get() + 1);
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LoadBehavior {
    Succeed,
    Fail,
    Hang,
}

/// Scripted detector with a configurable model load.
#[derive(Debug)]
pub struct TestDetector {
    pub script: ScriptedDetector,
    pub load: LoadBehavior,
    pub loads: Cell<u32>,
}

impl TestDetector {
    pub fn new(steps: Vec<ScriptStep>) -> Self {
        Self {
            script: ScriptedDetector::new(steps),
            load: LoadBehavior::Succeed,
            loads: Cell::new(0),
        }
    }

    pub fn with_load(mut self, load: LoadBehavior) -> Self {
        self.load = load;
        self
    }

    pub fn calls(&self) -> usize {
        self.script.calls()
    }
}

impl FaceDetector for TestDetector {
    async fn load(&mut self) -> Result<(), DetectorError> {
        self.loads.set(self.loads.get() + 1);
        match self.load {
            LoadBehavior::Succeed => self.script.load().await,
            LoadBehavior::Fail => Err(DetectorError::ModelLoad("weights not found".to_string())),
            LoadBehavior::Hang => std::future::pending().await,
        }
    }

    async fn detect(&self, frame: &Frame) -> Result<Option<DetectionBox>, DetectorError> {
        self.script.detect(frame).await
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum OverlayOp {
    Clear(Layer),
    Stroke(Layer, Rect, Stroke),
}

#[derive(Debug, Default)]
pub struct RecordingOverlay {
    pub ops: Vec<OverlayOp>,
}

impl RecordingOverlay {
    pub fn strokes(&self, layer: Layer) -> Vec<Rect> {
        self.ops
            .iter()
            .filter_map(|op| match op {
                OverlayOp::Stroke(l, rect, _) if *l == layer => Some(*rect),
                _ => None,
            })
            .collect()
    }
}

impl Overlay for RecordingOverlay {
    fn clear(&mut self, layer: Layer) {
        self.ops.push(OverlayOp::Clear(layer));
    }

    fn stroke_rect(&mut self, layer: Layer, rect: &Rect, stroke: &Stroke) {
        self.ops.push(OverlayOp::Stroke(layer, *rect, stroke.clone()));
    }
}

#[derive(Debug, Default)]
pub struct RecordingStatus {
    pub history: Vec<Status>,
}

impl StatusSink for RecordingStatus {
    fn set_status(&mut self, status: Status) {
        self.history.push(status);
    }
}

#[derive(Debug, Default)]
pub struct MemoryImages {
    pub stored: Rc<RefCell<Vec<RgbImage>>>,
}

impl ImageSink for MemoryImages {
    fn store(&mut self, image: RgbImage) -> Result<(), SinkError> {
        self.stored.borrow_mut().push(image);
        Ok(())
    }
}

/// Image sink whose storage always fails.
#[derive(Debug, Default)]
pub struct BrokenImages;

impl ImageSink for BrokenImages {
    fn store(&mut self, _image: RgbImage) -> Result<(), SinkError> {
        Err(SinkError::Io(std::io::Error::new(
            std::io::ErrorKind::PermissionDenied,
            "read-only",
        )))
    }
}

pub type RecordingSinks = Sinks<RecordingOverlay, RecordingStatus, MemoryImages>;

pub fn hits(n: usize, rect: Rect) -> Vec<ScriptStep> {
    vec![ScriptStep::hit(rect); n]
}
