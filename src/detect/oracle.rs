//! The face detection seam, and a scripted detector for replays.

use std::cell::Cell;
use std::future::Future;
use std::path::{Path, PathBuf};
use std::time::Duration;

use serde::Deserialize;

use crate::camera::Frame;
use crate::geometry::{DetectionBox, Rect};

/// Errors reported by a face detector.
#[derive(Debug, thiserror::Error)]
pub enum DetectorError {
    #[error("failed to load detection model: {0}")]
    ModelLoad(String),

    #[error("detection model did not load within {0:?}")]
    LoadTimeout(Duration),

    #[error("face detection failed: {0}")]
    Inference(String),
}

/// A face detector used as a black box.
///
/// `load` runs once before any session starts. `detect` returns the single
/// most prominent face box in native frame pixels, or `None`.
pub trait FaceDetector {
    fn load(&mut self) -> impl Future<Output = Result<(), DetectorError>>;

    fn detect(
        &self,
        frame: &Frame,
    ) -> impl Future<Output = Result<Option<DetectionBox>, DetectorError>>;
}

/// One scripted detector response.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct ScriptStep {
    pub detection: Option<DetectionBox>,
    /// How long the call takes to resolve.
    pub delay: Duration,
}

impl ScriptStep {
    pub fn hit(detection: DetectionBox) -> Self {
        Self {
            detection: Some(detection),
            delay: Duration::ZERO,
        }
    }

    pub fn miss() -> Self {
        Self::default()
    }

    pub fn delayed(mut self, delay: Duration) -> Self {
        self.delay = delay;
        self
    }
}

/// Errors reading a detection script.
#[derive(Debug, thiserror::Error)]
pub enum ScriptError {
    #[error("Failed to read detection script '{path}': {source}")]
    Io {
        path: PathBuf,
        source: std::io::Error,
    },

    #[error("Failed to parse detection script: {0}")]
    Parse(#[from] toml::de::Error),
}

#[derive(Debug, Deserialize)]
struct ScriptFile {
    #[serde(default)]
    tick: Vec<ScriptEntry>,
}

#[derive(Debug, Deserialize)]
struct ScriptEntry {
    /// `[top, left, right, bottom]`
    #[serde(rename = "box")]
    bounds: Option<[f64; 4]>,
    #[serde(default)]
    delay_ms: u64,
}

/// Detector that plays back a fixed list of responses, one per call.
///
/// Once the script runs out every call reports no detection.
#[derive(Debug, Default)]
pub struct ScriptedDetector {
    steps: Vec<ScriptStep>,
    next: Cell<usize>,
    loaded: bool,
}

impl ScriptedDetector {
    pub fn new(steps: Vec<ScriptStep>) -> Self {
        Self {
            steps,
            next: Cell::new(0),
            loaded: false,
        }
    }

    /// Parse a script of `[[tick]]` tables:
    ///
    /// ```toml
    /// [[tick]]
    /// box = [120.0, 130.0, 470.0, 480.0]
    /// delay_ms = 100
    ///
    /// [[tick]]   # no face
    /// ```
    pub fn from_toml_str(content: &str) -> Result<Self, ScriptError> {
        let file: ScriptFile = toml::from_str(content)?;
        let steps = file
            .tick
            .into_iter()
            .map(|entry| ScriptStep {
                detection: entry
                    .bounds
                    .map(|[top, left, right, bottom]| Rect::new(top, left, right, bottom)),
                delay: Duration::from_millis(entry.delay_ms),
            })
            .collect();
        Ok(Self::new(steps))
    }

    pub fn from_file(path: &Path) -> Result<Self, ScriptError> {
        let content = std::fs::read_to_string(path).map_err(|e| ScriptError::Io {
            path: path.to_path_buf(),
            source: e,
        })?;
        Self::from_toml_str(&content)
    }

    /// Number of `detect` calls made so far.
    pub fn calls(&self) -> usize {
        self.next.get()
    }

    pub fn is_loaded(&self) -> bool {
        self.loaded
    }

    pub fn steps(&self) -> &[ScriptStep] {
        &self.steps
    }
}

impl FaceDetector for ScriptedDetector {
    async fn load(&mut self) -> Result<(), DetectorError> {
        self.loaded = true;
        Ok(())
    }

    async fn detect(&self, _frame: &Frame) -> Result<Option<DetectionBox>, DetectorError> {
        let index = self.next.get();
        self.next.set(index + 1);

        let step = self.steps.get(index).copied().unwrap_or_default();
        if !step.delay.is_zero() {
            tokio::time::sleep(step.delay).await;
        }
        Ok(step.detection)
    }
}
