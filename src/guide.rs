//! Guide box: the centered target region a face has to sit inside.

use crate::camera::StreamSettings;
use crate::geometry::{centered_rect, GuideRect, Ratio, Viewport};
use crate::sinks::{Layer, Overlay, Stroke};

/// Guide size relative to the stream dimensions.
pub const GUIDE_FRACTION: Ratio = Ratio::new(2, 3);

/// Dashed outline the guide is drawn with.
pub const GUIDE_STROKE: Stroke = Stroke::Dashed {
    line_width: 8.0,
    dash: [20.0, 10.0],
    color: "#80BCBD",
};

/// Computes the guide for each new stream and hands it to the overlay.
#[derive(Debug, Clone, Copy)]
pub struct GuideBoxController {
    fraction: Ratio,
}

impl GuideBoxController {
    pub fn new(fraction: Ratio) -> Self {
        Self { fraction }
    }

    pub fn fraction(&self) -> Ratio {
        self.fraction
    }

    /// Guide in native stream coordinates.
    pub fn compute(&self, settings: &StreamSettings) -> GuideRect {
        let guide = centered_rect(
            f64::from(settings.width),
            f64::from(settings.height),
            self.fraction,
        );
        log::debug!(
            "Guide for {}x{} stream at {}: {}",
            settings.width,
            settings.height,
            self.fraction,
            guide
        );
        guide
    }

    /// Draw the guide on its own layer, replacing any previous one.
    pub fn render<O: Overlay>(&self, guide: &GuideRect, viewport: &Viewport, overlay: &mut O) {
        overlay.clear(Layer::Guide);
        overlay.stroke_rect(Layer::Guide, &viewport.to_display(guide), &GUIDE_STROKE);
    }
}

impl Default for GuideBoxController {
    fn default() -> Self {
        Self::new(GUIDE_FRACTION)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::geometry::{Rect, Size};

    #[derive(Default)]
    struct Recorder {
        ops: Vec<(Layer, Option<Rect>)>,
    }

    impl Overlay for Recorder {
        fn clear(&mut self, layer: Layer) {
            self.ops.push((layer, None));
        }

        fn stroke_rect(&mut self, layer: Layer, rect: &Rect, stroke: &Stroke) {
            assert_eq!(*stroke, GUIDE_STROKE);
            self.ops.push((layer, Some(*rect)));
        }
    }

    fn settings(width: u32, height: u32) -> StreamSettings {
        StreamSettings {
            width,
            height,
            frame_rate: None,
        }
    }

    #[test]
    fn test_default_guide_600() {
        assert_eq!(
            GuideBoxController::default().compute(&settings(600, 600)),
            Rect::new(100.0, 100.0, 500.0, 500.0)
        );
    }

    #[test]
    fn test_controller_uses_negotiated_size() {
        let controller = GuideBoxController::default();
        let guide = controller.compute(&settings(1200, 900));
        assert_eq!(guide, Rect::new(150.0, 200.0, 1000.0, 750.0));
    }

    #[test]
    fn test_custom_fraction() {
        let controller = GuideBoxController::new(Ratio::new(1, 2));
        let guide = controller.compute(&settings(400, 400));
        assert_eq!(guide, Rect::new(100.0, 100.0, 300.0, 300.0));
    }

    #[test]
    fn test_render_in_display_coordinates() {
        let controller = GuideBoxController::default();
        let guide = controller.compute(&settings(1200, 1200));
        let viewport = Viewport::new(Size::new(1200, 1200), Size::new(600, 600));
        let mut overlay = Recorder::default();

        controller.render(&guide, &viewport, &mut overlay);

        assert_eq!(
            overlay.ops,
            vec![
                (Layer::Guide, None),
                (Layer::Guide, Some(Rect::new(100.0, 100.0, 500.0, 500.0))),
            ]
        );
    }
}
