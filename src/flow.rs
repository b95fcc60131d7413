//! The capture flow: load the detector, open a stream, sample until the
//! face has been held inside the guide long enough, then crop and store.

use std::time::Duration;

use tokio_util::sync::CancellationToken;

use crate::camera::{
    Frame, MediaConstraints, MediaSource, MediaStream, ResolutionCandidate, ResolutionNegotiator, Session,
    StreamSessionManager, StreamSettings, Unsupported,
};
use crate::config::Config;
use crate::detect::{
    DetectionSampler, DetectorError, FaceDetector, SamplerExit, DEFAULT_THRESHOLD,
    DEFAULT_TICK_INTERVAL,
};
use crate::geometry::{crop_region, display_size, GuideRect, Ratio, Size, Viewport};
use crate::guide::{GuideBoxController, GUIDE_FRACTION};
use crate::sinks::{ImageSink, Layer, Overlay, SinkError, StatusSink};

/// Tunables for one [`FaceCheck`].
#[derive(Debug, Clone, PartialEq)]
pub struct FlowSettings {
    pub resolutions: Vec<ResolutionCandidate>,
    pub constraints: MediaConstraints,
    pub display_width: Option<u32>,
    pub tick_interval: Duration,
    pub threshold: u32,
    pub guide_fraction: Ratio,
    /// `None` waits for the model indefinitely.
    pub model_load_timeout: Option<Duration>,
}

impl FlowSettings {
    pub fn from_config(config: &Config) -> Self {
        Self {
            resolutions: config.camera.resolutions.clone(),
            constraints: MediaConstraints::new(config.camera.audio, config.camera.frame_rate),
            display_width: config.camera.display_width,
            tick_interval: config.tick_interval(),
            threshold: config.detection.threshold,
            guide_fraction: config.detection.guide_fraction,
            model_load_timeout: config.model_load_timeout(),
        }
    }
}

impl Default for FlowSettings {
    fn default() -> Self {
        Self {
            resolutions: ResolutionCandidate::defaults(),
            constraints: MediaConstraints::default(),
            display_width: None,
            tick_interval: DEFAULT_TICK_INTERVAL,
            threshold: DEFAULT_THRESHOLD,
            guide_fraction: GUIDE_FRACTION,
            model_load_timeout: Some(Duration::from_secs(30)),
        }
    }
}

/// Fatal errors of the capture flow.
#[derive(Debug, thiserror::Error)]
pub enum FlowError {
    #[error("No resolution candidates configured")]
    NoCandidates,

    #[error(transparent)]
    NoSupportedResolution(#[from] Unsupported),

    #[error(transparent)]
    ModelLoad(DetectorError),

    #[error("Failed to store captured image: {0}")]
    Sink(#[from] SinkError),
}

/// What a completed capture produced.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct CaptureReport {
    pub stream: StreamSettings,
    pub guide: GuideRect,
    pub image_size: Size,
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub enum FlowOutcome {
    Captured(CaptureReport),
    Cancelled,
}

/// The collaborators the flow reports to.
#[derive(Debug, Default)]
pub struct Sinks<O, T, I> {
    pub overlay: O,
    pub status: T,
    pub images: I,
}

/// Controller owning the media source, the detector and the current session.
pub struct FaceCheck<M: MediaSource, D, O, T, I> {
    manager: StreamSessionManager<M>,
    detector: D,
    sinks: Sinks<O, T, I>,
    guide: GuideBoxController,
    settings: FlowSettings,
    model_loaded: bool,
    session: Option<Session<M::Stream>>,
}

impl<M, D, O, T, I> FaceCheck<M, D, O, T, I>
where
    M: MediaSource,
    D: FaceDetector,
    O: Overlay,
    T: StatusSink,
    I: ImageSink,
{
    pub fn new(
        source: M,
        detector: D,
        sinks: Sinks<O, T, I>,
        settings: FlowSettings,
    ) -> Result<Self, FlowError> {
        let negotiator =
            ResolutionNegotiator::new(settings.resolutions.clone()).ok_or(FlowError::NoCandidates)?;
        Ok(Self {
            manager: StreamSessionManager::new(source, negotiator, settings.constraints.clone()),
            detector,
            sinks,
            guide: GuideBoxController::new(settings.guide_fraction),
            settings,
            model_loaded: false,
            session: None,
        })
    }

    pub fn media_source(&self) -> &M {
        self.manager.source()
    }

    pub fn detector(&self) -> &D {
        &self.detector
    }

    pub fn sinks(&self) -> &Sinks<O, T, I> {
        &self.sinks
    }

    pub fn settings(&self) -> &FlowSettings {
        &self.settings
    }

    /// The current session, if a stream is held.
    pub fn session(&self) -> Option<&Session<M::Stream>> {
        self.session.as_ref()
    }

    pub fn is_model_loaded(&self) -> bool {
        self.model_loaded
    }

    /// Load the detection model once. Failure and timeout are both fatal.
    pub async fn load_model(&mut self) -> Result<(), FlowError> {
        if self.model_loaded {
            return Ok(());
        }
        log::info!("Loading face detection model...");

        let result = match self.settings.model_load_timeout {
            Some(limit) => match tokio::time::timeout(limit, self.detector.load()).await {
                Ok(result) => result,
                Err(_) => Err(DetectorError::LoadTimeout(limit)),
            },
            None => self.detector.load().await,
        };

        match result {
            Ok(()) => {
                self.model_loaded = true;
                log::info!("Face detection model loaded");
                Ok(())
            }
            Err(e) => {
                log::error!("{}", e);
                Err(FlowError::ModelLoad(e))
            }
        }
    }

    /// Tear down any current session and open a new one.
    ///
    /// The guide is computed from the granted resolution and drawn.
    pub async fn start_session(&mut self) -> Result<&Session<M::Stream>, FlowError> {
        self.load_model().await?;
        self.teardown();

        let stream = self.manager.start().await?;
        let settings = stream.settings();
        let native = settings.size();
        let viewport = Viewport::new(native, display_size(native, self.settings.display_width));
        let guide = self.guide.compute(&settings);
        self.guide.render(&guide, &viewport, &mut self.sinks.overlay);

        log::info!(
            "Session started: stream {}, display {}, guide {}",
            native,
            viewport.display,
            guide
        );
        Ok(&*self.session.insert(Session::new(stream, guide, viewport)))
    }

    /// Release the current session's stream, if any.
    pub fn teardown(&mut self) {
        if let Some(mut session) = self.session.take() {
            session.release();
            log::info!("Session torn down");
        }
    }

    /// Run one complete capture: start a session and sample until the
    /// capture fires or `cancel` is triggered.
    ///
    /// `cancel` is honoured during model load and stream acquisition too.
    pub async fn run(&mut self, cancel: &CancellationToken) -> Result<FlowOutcome, FlowError> {
        let started = tokio::select! {
            biased;

            _ = cancel.cancelled() => None,
            result = self.start_session() => Some(result.map(|_| ())),
        };
        match started {
            Some(result) => result?,
            None => {
                log::info!("Cancelled before sampling started");
                self.teardown();
                return Ok(FlowOutcome::Cancelled);
            }
        }
        let Some(session) = self.session.as_ref() else {
            return Ok(FlowOutcome::Cancelled);
        };
        let stream = session.settings();
        let guide = *session.guide();

        let mut sampler = DetectionSampler::new(self.settings.tick_interval, self.settings.threshold);
        let exit = sampler
            .run(
                session,
                &self.detector,
                &mut self.sinks.overlay,
                &mut self.sinks.status,
                cancel,
            )
            .await;

        match exit {
            SamplerExit::Captured(frame) => self
                .capture(&frame, stream, guide)
                .map(FlowOutcome::Captured),
            SamplerExit::Cancelled => {
                self.teardown();
                self.sinks.overlay.clear(Layer::Detections);
                Ok(FlowOutcome::Cancelled)
            }
        }
    }

    /// Crop the guide region out of `frame`, hand it to the image sink and
    /// end the session.
    fn capture(
        &mut self,
        frame: &Frame,
        stream: StreamSettings,
        guide: GuideRect,
    ) -> Result<CaptureReport, FlowError> {
        let target = Size::new(
            guide.width().round() as u32,
            guide.height().round() as u32,
        );

        let image = crop_region(&frame.image, &guide, target);
        log::info!("Face captured: {} crop of {} frame", target, frame.size());

        let stored = self.sinks.images.store(image);
        self.teardown();
        self.sinks.overlay.clear(Layer::Detections);
        stored?;

        Ok(CaptureReport {
            stream,
            guide,
            image_size: target,
        })
    }
}
