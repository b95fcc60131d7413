//! Fixed-interval detection sampling.
//!
//! Ticks are issued on a wall-clock interval, so a slow detector call can
//! still be running when the next tick fires. Every tick is tagged with a
//! sequence number at issue time and results are only applied if they are
//! newer than the last applied one; anything older, or anything arriving
//! after the sampler stopped, is dropped.

use std::time::Duration;

use futures_util::future::{FutureExt, LocalBoxFuture};
use futures_util::stream::{FuturesUnordered, StreamExt};
use tokio::time::{Instant, MissedTickBehavior};
use tokio_util::sync::CancellationToken;

use super::gate::{CaptureGate, GateDecision};
use super::oracle::{DetectorError, FaceDetector};
use crate::camera::{Frame, MediaStream, Session};
use crate::geometry::{DetectionBox, GuideRect};
use crate::sinks::{Layer, Overlay, StatusSink, Stroke};

/// A resolved detector call: tick sequence number, the frame it ran on and
/// the detector's answer.
type TickResult = (u64, Frame, Result<Option<DetectionBox>, DetectorError>);

/// Default time between ticks.
pub const DEFAULT_TICK_INTERVAL: Duration = Duration::from_millis(500);

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SamplerState {
    Running,
    /// Terminal: no more ticks, no more state changes.
    Stopped,
}

/// Result of offering a tick result to the sampler.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TickOutcome {
    /// Older than the last applied tick, or arrived after stop.
    Stale,
    Applied(GateDecision),
}

/// Why [`DetectionSampler::run`] returned.
#[derive(Debug)]
pub enum SamplerExit {
    /// The gate fired; holds the frame to crop.
    Captured(Frame),
    /// Torn down from outside.
    Cancelled,
}

#[derive(Debug)]
pub struct DetectionSampler {
    interval: Duration,
    state: SamplerState,
    next_seq: u64,
    last_applied: Option<u64>,
    gate: CaptureGate,
}

impl DetectionSampler {
    pub fn new(interval: Duration, threshold: u32) -> Self {
        Self {
            interval,
            state: SamplerState::Running,
            next_seq: 0,
            last_applied: None,
            gate: CaptureGate::new(threshold),
        }
    }

    pub fn state(&self) -> SamplerState {
        self.state
    }

    pub fn is_running(&self) -> bool {
        self.state == SamplerState::Running
    }

    pub fn gate(&self) -> &CaptureGate {
        &self.gate
    }

    pub fn interval(&self) -> Duration {
        self.interval
    }

    pub fn last_applied(&self) -> Option<u64> {
        self.last_applied
    }

    pub fn stop(&mut self) {
        if self.state == SamplerState::Running {
            log::debug!("Detection sampler stopped");
        }
        self.state = SamplerState::Stopped;
    }

    /// Allocate the sequence number for a new tick; `None` once stopped.
    pub fn issue(&mut self) -> Option<u64> {
        if !self.is_running() {
            return None;
        }
        let seq = self.next_seq;
        self.next_seq += 1;
        Some(seq)
    }

    /// Apply the result of tick `seq` unless it is stale.
    ///
    /// A capture decision stops the sampler before returning.
    pub fn apply(
        &mut self,
        seq: u64,
        guide: &GuideRect,
        detection: Option<&DetectionBox>,
    ) -> TickOutcome {
        if !self.is_running() {
            log::debug!("Discarding result of tick {} after stop", seq);
            return TickOutcome::Stale;
        }
        if self.last_applied.is_some_and(|last| seq <= last) {
            log::debug!(
                "Discarding stale result of tick {} (tick {:?} already applied)",
                seq,
                self.last_applied
            );
            return TickOutcome::Stale;
        }

        self.last_applied = Some(seq);
        let decision = self.gate.observe(guide, detection);
        log::debug!(
            "Tick {}: {:?} (hits {}/{})",
            seq,
            decision,
            self.gate.hits(),
            self.gate.threshold()
        );
        if decision == GateDecision::Capture {
            self.stop();
        }
        TickOutcome::Applied(decision)
    }

    /// Sample `session` until the gate fires or `cancel` is triggered.
    ///
    /// The first tick fires one interval after the call. Each applied result
    /// redraws the detection layer and updates the status label.
    pub async fn run<'d, S, D, O, T>(
        &mut self,
        session: &Session<S>,
        detector: &'d D,
        overlay: &mut O,
        status: &mut T,
        cancel: &CancellationToken,
    ) -> SamplerExit
    where
        S: MediaStream,
        D: FaceDetector,
        O: Overlay,
        T: StatusSink,
    {
        let mut ticker = tokio::time::interval_at(Instant::now() + self.interval, self.interval);
        ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);

        let mut in_flight: FuturesUnordered<LocalBoxFuture<'d, TickResult>> =
            FuturesUnordered::new();
        let guide = *session.guide();
        let viewport = *session.viewport();

        loop {
            tokio::select! {
                biased;

                _ = cancel.cancelled() => {
                    self.stop();
                    log::info!("Detection cancelled with {} call(s) in flight", in_flight.len());
                    return SamplerExit::Cancelled;
                }

                Some((seq, frame, result)) = in_flight.next(), if !in_flight.is_empty() => {
                    let detection = match result {
                        Ok(detection) => detection,
                        Err(e) => {
                            log::warn!("Detection on tick {} failed: {}", seq, e);
                            None
                        }
                    };

                    let decision = match self.apply(seq, &guide, detection.as_ref()) {
                        TickOutcome::Stale => continue,
                        TickOutcome::Applied(decision) => decision,
                    };

                    overlay.clear(Layer::Detections);
                    if let Some(detection) = &detection {
                        overlay.stroke_rect(
                            Layer::Detections,
                            &viewport.to_display(detection),
                            &Stroke::DETECTION,
                        );
                    }
                    status.set_status(decision.status());

                    if decision == GateDecision::Capture {
                        let frame = session.frame().unwrap_or(frame);
                        return SamplerExit::Captured(frame);
                    }
                }

                _ = ticker.tick() => {
                    let Some(frame) = session.frame() else {
                        log::debug!("No frame available, skipping tick");
                        continue;
                    };
                    let Some(seq) = self.issue() else {
                        continue;
                    };
                    in_flight.push(
                        async move {
                            let result = detector.detect(&frame).await;
                            (seq, frame, result)
                        }
                        .boxed_local(),
                    );
                }
            }
        }
    }
}

impl Default for DetectionSampler {
    fn default() -> Self {
        Self::new(DEFAULT_TICK_INTERVAL, super::gate::DEFAULT_THRESHOLD)
    }
}
