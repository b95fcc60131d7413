//! Rectangle math shared by the guide box, the detection overlay and the
//! capture crop.
//!
//! All rectangles are expressed as edges (`top`, `left`, `right`, `bottom`)
//! in pixels. Unless stated otherwise the coordinate space is the stream's
//! native resolution; [`Viewport`] converts to and from display space.

use std::fmt;

use image::imageops::{self, FilterType};
use image::RgbImage;
use serde::{Deserialize, Serialize};

/// An axis-aligned rectangle described by its four edges.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct Rect {
    pub top: f64,
    pub left: f64,
    pub right: f64,
    pub bottom: f64,
}

/// The on-screen target region a face must fall strictly within.
pub type GuideRect = Rect;

/// A face bounding box reported by the detector for one tick.
pub type DetectionBox = Rect;

impl Rect {
    pub const fn new(top: f64, left: f64, right: f64, bottom: f64) -> Self {
        Self {
            top,
            left,
            right,
            bottom,
        }
    }

    /// Build a rect from its top-left corner and size.
    pub fn from_xywh(x: f64, y: f64, width: f64, height: f64) -> Self {
        Self {
            top: y,
            left: x,
            right: x + width,
            bottom: y + height,
        }
    }

    pub fn width(&self) -> f64 {
        self.right - self.left
    }

    pub fn height(&self) -> f64 {
        self.bottom - self.top
    }

    pub fn center(&self) -> (f64, f64) {
        (
            (self.left + self.right) / 2.0,
            (self.top + self.bottom) / 2.0,
        )
    }

    /// Scale every edge independently along each axis.
    pub fn scale(&self, sx: f64, sy: f64) -> Self {
        Self {
            top: self.top * sy,
            left: self.left * sx,
            right: self.right * sx,
            bottom: self.bottom * sy,
        }
    }
}

impl fmt::Display for Rect {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{{top: {:.1}, left: {:.1}, right: {:.1}, bottom: {:.1}}}",
            self.top, self.left, self.right, self.bottom
        )
    }
}

/// Pixel dimensions of a stream, display or image.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Size {
    pub width: u32,
    pub height: u32,
}

impl Size {
    pub const fn new(width: u32, height: u32) -> Self {
        Self { width, height }
    }
}

impl fmt::Display for Size {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}x{}", self.width, self.height)
    }
}

/// A fraction expressed as `num / den`.
///
/// Kept as a ratio rather than a float so that `(w * 2) / 3` is computed in
/// the same order as a hand calculation and stays exact for multiples of 3.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Ratio {
    pub num: u32,
    pub den: u32,
}

impl Ratio {
    pub const fn new(num: u32, den: u32) -> Self {
        Self { num, den }
    }

    /// Apply the ratio to a length.
    pub fn of(&self, value: f64) -> f64 {
        (value * f64::from(self.num)) / f64::from(self.den)
    }

    /// True for ratios in `(0, 1]`.
    pub fn is_unit_fraction(&self) -> bool {
        self.den != 0 && self.num != 0 && self.num <= self.den
    }
}

impl fmt::Display for Ratio {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}/{}", self.num, self.den)
    }
}

/// Returns true iff `inner` lies strictly inside `outer` on all four edges.
///
/// Sharing an edge is not containment: there is no tolerance margin.
pub fn contains(outer: &GuideRect, inner: &DetectionBox) -> bool {
    inner.top > outer.top
        && inner.left > outer.left
        && inner.right < outer.right
        && inner.bottom < outer.bottom
}

/// A rectangle `fraction` of the container's size, centered in it.
pub fn centered_rect(container_width: f64, container_height: f64, fraction: Ratio) -> Rect {
    let width = fraction.of(container_width);
    let height = fraction.of(container_height);
    let x = container_width / 2.0 - width / 2.0;
    let y = container_height / 2.0 - height / 2.0;
    Rect::from_xywh(x, y, width, height)
}

/// Extract the pixels bounded by `rect` from `source`, scaled to `target`.
///
/// The caller guarantees that `rect` lies within the source bounds. Edges
/// are snapped to whole pixels (origin floored, size rounded).
pub fn crop_region(source: &RgbImage, rect: &Rect, target: Size) -> RgbImage {
    let x = rect.left.max(0.0).floor() as u32;
    let y = rect.top.max(0.0).floor() as u32;
    let width = rect.width().max(0.0).round() as u32;
    let height = rect.height().max(0.0).round() as u32;

    let cropped = imageops::crop_imm(source, x, y, width, height).to_image();
    if cropped.dimensions() == (target.width, target.height) {
        return cropped;
    }
    imageops::resize(&cropped, target.width, target.height, FilterType::Triangle)
}

/// Display size for a stream shown in at most `available_width` pixels.
///
/// Streams narrower than the available width are shown at native size;
/// wider ones are scaled down, keeping the aspect ratio.
pub fn display_size(native: Size, available_width: Option<u32>) -> Size {
    match available_width {
        Some(available) if available > 0 && available < native.width => {
            let height = (u64::from(native.height) * u64::from(available)) / u64::from(native.width);
            Size::new(available, height as u32)
        }
        _ => native,
    }
}

/// Maps rectangles from native stream pixels to display pixels.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Viewport {
    pub native: Size,
    pub display: Size,
}

impl Viewport {
    pub fn new(native: Size, display: Size) -> Self {
        Self { native, display }
    }

    /// A viewport that displays the stream at native size.
    pub fn identity(native: Size) -> Self {
        Self::new(native, native)
    }

    fn factors(&self) -> (f64, f64) {
        (
            f64::from(self.display.width) / f64::from(self.native.width.max(1)),
            f64::from(self.display.height) / f64::from(self.native.height.max(1)),
        )
    }

    pub fn to_display(&self, rect: &Rect) -> Rect {
        let (sx, sy) = self.factors();
        rect.scale(sx, sy)
    }
}
