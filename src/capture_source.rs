// SPDX-License-Identifier: GPL-3.0-only

//! Top-level per-device capture state (spec.md §3) wiring the device
//! handle, negotiator, buffer pool, worker, and presentation step
//! together behind the Configuration API (spec.md §4.5, §6).

use crate::capture_config::{CaptureConfig, FocusHint, Orientation};
use crate::pixel_format::PixelFormat;
use crate::presentation::{Delivery, FrameRateController, PresentationStep, RtpPacketizer, SharedQueue, YuvRotator};
use crate::size::VideoSize;
use crate::video_config::VideoConfiguration;
use crate::worker;
use std::sync::Arc;
use std::time::{SystemTime, UNIX_EPOCH};

fn now_ms() -> u64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|d| d.as_millis() as u64)
        .unwrap_or(0)
}

/// Per-device capture state. Owns the producer thread (via
/// [`crate::loop_controller::CaptureLoopController`], started in the
/// graph's pre-processing hook and stopped/joined in post-processing)
/// and the presentation step invoked on every graph tick.
///
/// The configuration cache (`config`) is mutated only while the worker
/// isn't running, matching spec.md §5's "shared resource policy".
pub struct CaptureState {
    config: CaptureConfig,
    queue: Arc<SharedQueue>,
    worker: Option<crate::loop_controller::CaptureLoopController>,
    presentation: PresentationStep,
    rate: Option<FrameRateController>,
}

impl CaptureState {
    pub fn new(config: CaptureConfig) -> Self {
        CaptureState {
            config,
            queue: Arc::new(SharedQueue::new()),
            worker: None,
            presentation: PresentationStep::new(),
            rate: None,
        }
    }

    pub fn is_running(&self) -> bool {
        self.worker.as_ref().map(|w| w.is_running()).unwrap_or(false)
    }

    // ===== Configuration API (spec.md §6 "Configuration surface") =====
    // Setters are no-ops (returning `false`) while the worker is running;
    // the negotiated format only changes across stream sessions.

    pub fn fps(&self) -> u32 {
        self.config.fps
    }

    pub fn set_fps(&mut self, fps: u32) -> bool {
        if self.is_running() {
            return false;
        }
        self.config.fps = fps;
        true
    }

    pub fn size(&self) -> VideoSize {
        self.config.size
    }

    pub fn set_size(&mut self, size: VideoSize) -> bool {
        if self.is_running() {
            return false;
        }
        self.config.size = size;
        true
    }

    pub fn pixel_format(&self) -> PixelFormat {
        self.config.pixel_format
    }

    pub fn set_pixel_format(&mut self, pixel_format: PixelFormat) -> bool {
        if self.is_running() {
            return false;
        }
        self.config.pixel_format = pixel_format;
        true
    }

    pub fn device_path(&self) -> &str {
        &self.config.device_path
    }

    pub fn set_device_path(&mut self, device_path: impl Into<String>) -> bool {
        if self.is_running() {
            return false;
        }
        self.config.device_path = device_path.into();
        true
    }

    pub fn orientation(&self) -> Orientation {
        self.config.orientation
    }

    pub fn set_orientation(&mut self, orientation: Orientation) -> bool {
        if self.is_running() {
            return false;
        }
        self.config.orientation = orientation;
        true
    }

    pub fn focus_hint(&self) -> Option<FocusHint> {
        self.config.focus_hint
    }

    pub fn set_focus_hint(&mut self, hint: Option<FocusHint>) -> bool {
        if self.is_running() {
            return false;
        }
        self.config.focus_hint = hint;
        true
    }

    pub fn bitrate_bps(&self) -> u32 {
        self.config.bitrate_bps
    }

    /// Selects the highest bitrate-ladder rung not exceeding
    /// `available_bitrate_bps`, applying its bitrate/size/fps
    /// (spec.md §6 "bitrate ladder").
    pub fn select_bitrate(&mut self, available_bitrate_bps: u32) -> bool {
        if self.is_running() {
            return false;
        }
        self.config.apply_rung(VideoConfiguration::for_bitrate(available_bitrate_bps));
        true
    }

    // ===== Lifecycle (spec.md §4.5) =====

    /// Starts the background capture worker. Called from the graph's
    /// pre-processing hook; a no-op if already running.
    pub fn start(&mut self) {
        if self.worker.is_some() {
            return;
        }
        self.rate = Some(FrameRateController::new(now_ms(), self.config.fps.max(1)));
        self.worker = Some(worker::start(self.config.clone(), Arc::clone(&self.queue)));
    }

    /// Stops and joins the worker, then flushes the output queue
    /// (spec.md §5 "Cancellation": "shutdown sets the flag, joins with
    /// no timeout, then flushes the queue").
    pub fn stop(&mut self) {
        if let Some(mut worker) = self.worker.take() {
            worker.stop();
        }
        while self.queue.pop_front().is_some() {}
        self.rate = None;
    }

    /// Runs one presentation tick (spec.md §4.6), invoked by the graph
    /// ticker. Returns [`Delivery::NotAdmitted`] if the worker isn't
    /// running.
    pub fn tick(
        &mut self,
        tick_time_ms: u64,
        rotation: Option<(&dyn YuvRotator, VideoSize, u16)>,
        packetizer: Option<&mut dyn RtpPacketizer>,
    ) -> Delivery {
        let Some(rate) = self.rate.as_mut() else {
            return Delivery::NotAdmitted;
        };
        self.presentation.tick(
            &self.queue,
            rate,
            self.config.pixel_format,
            tick_time_ms,
            rotation,
            packetizer,
        )
    }

    /// The rotation parameters implied by the current configuration, for
    /// convenience at call sites that don't track orientation themselves.
    pub fn rotation_params(&self) -> (VideoSize, u16) {
        (self.config.size, self.config.orientation.degrees())
    }

    pub fn rolling_fps(&self) -> Option<f64> {
        self.presentation.fps_tracker.average()
    }
}

impl Drop for CaptureState {
    fn drop(&mut self) {
        self.stop();
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn setters_apply_while_stopped() {
        let mut state = CaptureState::new(CaptureConfig::new("/dev/does-not-exist-v4l2-source-filter-test"));
        assert!(!state.is_running());
        assert!(state.set_fps(15));
        assert_eq!(state.fps(), 15);
    }

    #[test]
    fn worker_against_missing_device_terminates_without_admitting_frames() {
        let mut state = CaptureState::new(CaptureConfig::new("/dev/does-not-exist-v4l2-source-filter-test"));
        state.start();
        state.stop();
        assert!(!state.is_running());
    }

    #[test]
    fn tick_before_start_is_not_admitted() {
        let mut state = CaptureState::new(CaptureConfig::new("/dev/does-not-exist-v4l2-source-filter-test"));
        assert!(matches!(state.tick(0, None, None), Delivery::NotAdmitted));
    }

    #[test]
    fn select_bitrate_applies_matching_rung() {
        let mut state = CaptureState::new(CaptureConfig::new("/dev/video0"));
        assert!(state.select_bitrate(0));
        assert_eq!(state.bitrate_bps(), VideoConfiguration::for_bitrate(0).required_bitrate);
    }
}
