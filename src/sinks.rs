//! Collaborators the capture flow reports to: the overlay canvas, the status
//! label and the captured-image store.
//!
//! The flow only hands over coordinates, messages and pixels. How they are
//! shown or persisted is up to the implementations.

use std::fmt;
use std::path::{Path, PathBuf};
use std::time::{SystemTime, UNIX_EPOCH};

use image::RgbImage;

use crate::geometry::Rect;

/// Overlay layers, drawn on top of the video.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Layer {
    /// Static guide rectangle, drawn once per session.
    Guide,
    /// Per-tick detection box.
    Detections,
}

/// How a rectangle outline is stroked.
#[derive(Debug, Clone, PartialEq)]
pub enum Stroke {
    Solid {
        line_width: f64,
        color: &'static str,
    },
    Dashed {
        line_width: f64,
        /// Dash pattern as `[dash, gap]`.
        dash: [f64; 2],
        color: &'static str,
    },
}

impl Stroke {
    /// Stroke used for detection boxes.
    pub const DETECTION: Stroke = Stroke::Solid {
        line_width: 2.0,
        color: "#0000FF",
    };
}

/// Drawing surface over the video, in display coordinates.
pub trait Overlay {
    fn clear(&mut self, layer: Layer);
    fn stroke_rect(&mut self, layer: Layer, rect: &Rect, stroke: &Stroke);
}

impl<T: Overlay + ?Sized> Overlay for &mut T {
    fn clear(&mut self, layer: Layer) {
        (**self).clear(layer)
    }

    fn stroke_rect(&mut self, layer: Layer, rect: &Rect, stroke: &Stroke) {
        (**self).stroke_rect(layer, rect, stroke)
    }
}

/// Message shown to the user after each tick.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Status {
    /// Face is inside the guide.
    HoldStill,
    /// Face found but not inside the guide.
    PlaceFace,
    /// No face in the frame.
    NoFace,
}

impl Status {
    pub fn message(&self) -> &'static str {
        match self {
            Status::HoldStill => "detecting, hold still",
            Status::PlaceFace => "place face in frame",
            Status::NoFace => "no face detected",
        }
    }
}

impl fmt::Display for Status {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.message())
    }
}

/// Text label showing the current [`Status`].
pub trait StatusSink {
    fn set_status(&mut self, status: Status);
}

impl<T: StatusSink + ?Sized> StatusSink for &mut T {
    fn set_status(&mut self, status: Status) {
        (**self).set_status(status)
    }
}

/// Errors storing a captured image.
#[derive(Debug, thiserror::Error)]
pub enum SinkError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Failed to encode image: {0}")]
    Image(#[from] image::ImageError),
}

/// Receives the final captured crop.
pub trait ImageSink {
    fn store(&mut self, image: RgbImage) -> Result<(), SinkError>;
}

impl<T: ImageSink + ?Sized> ImageSink for &mut T {
    fn store(&mut self, image: RgbImage) -> Result<(), SinkError> {
        (**self).store(image)
    }
}

/// Overlay that draws nothing and logs what it was asked to draw.
#[derive(Debug, Default, Clone, Copy)]
pub struct NullOverlay;

impl Overlay for NullOverlay {
    fn clear(&mut self, layer: Layer) {
        log::trace!("overlay clear {:?}", layer);
    }

    fn stroke_rect(&mut self, layer: Layer, rect: &Rect, _stroke: &Stroke) {
        log::debug!("overlay {:?} rect {}", layer, rect);
    }
}

/// Status sink that logs each change of status.
#[derive(Debug, Default)]
pub struct LogStatusSink {
    last: Option<Status>,
}

impl LogStatusSink {
    pub fn last(&self) -> Option<Status> {
        self.last
    }
}

impl StatusSink for LogStatusSink {
    fn set_status(&mut self, status: Status) {
        if self.last != Some(status) {
            log::info!("{}", status);
        }
        self.last = Some(status);
    }
}

/// Writes captured images as PNG files into a directory.
#[derive(Debug)]
pub struct DirImageSink {
    dir: PathBuf,
    saved: Vec<PathBuf>,
}

impl DirImageSink {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self {
            dir: dir.into(),
            saved: Vec::new(),
        }
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    /// Paths written so far, oldest first.
    pub fn saved(&self) -> &[PathBuf] {
        &self.saved
    }

    fn next_path(&self) -> PathBuf {
        let millis = SystemTime::now()
            .duration_since(UNIX_EPOCH)
            .map(|d| d.as_millis())
            .unwrap_or_default();
        self.dir
            .join(format!("capture-{}-{}.png", millis, self.saved.len()))
    }
}

impl ImageSink for DirImageSink {
    fn store(&mut self, image: RgbImage) -> Result<(), SinkError> {
        std::fs::create_dir_all(&self.dir)?;
        let path = self.next_path();
        image.save(&path)?;
        log::info!(
            "Captured {}x{} image saved to {}",
            image.width(),
            image.height(),
            path.display()
        );
        self.saved.push(path);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use image::Rgb;
    use tempfile::TempDir;

    #[test]
    fn test_status_messages() {
        assert_eq!(Status::HoldStill.to_string(), "detecting, hold still");
        assert_eq!(Status::PlaceFace.to_string(), "place face in frame");
        assert_eq!(Status::NoFace.to_string(), "no face detected");
    }

    #[test]
    fn test_log_status_sink_tracks_last() {
        let mut sink = LogStatusSink::default();
        assert_eq!(sink.last(), None);
        sink.set_status(Status::NoFace);
        sink.set_status(Status::HoldStill);
        assert_eq!(sink.last(), Some(Status::HoldStill));
    }

    #[test]
    fn test_dir_image_sink_writes_png() {
        let temp = TempDir::new().unwrap();
        let mut sink = DirImageSink::new(temp.path().join("captures"));

        sink.store(RgbImage::from_pixel(8, 6, Rgb([9, 9, 9]))).unwrap();
        sink.store(RgbImage::from_pixel(8, 6, Rgb([9, 9, 9]))).unwrap();

        assert_eq!(sink.saved().len(), 2);
        assert_ne!(sink.saved()[0], sink.saved()[1]);
        let reloaded = image::open(&sink.saved()[0]).unwrap().to_rgb8();
        assert_eq!(reloaded.dimensions(), (8, 6));
        assert_eq!(*reloaded.get_pixel(0, 0), Rgb([9, 9, 9]));
    }

    #[test]
    fn test_mut_ref_forwards() {
        fn set<S: StatusSink>(mut sink: S) {
            sink.set_status(Status::PlaceFace);
        }
        let mut sink = LogStatusSink::default();
        set(&mut sink);
        assert_eq!(sink.last(), Some(Status::PlaceFace));
    }
}
