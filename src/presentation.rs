// SPDX-License-Identifier: GPL-3.0-only

//! The graph-tick-driven consumer step (spec.md §4.6) and its external
//! collaborator traits (spec.md §6).

use crate::buffer_pool::CapturedFrame;
use crate::framer::split_nal_units;
use crate::pixel_format::PixelFormat;
use crate::size::VideoSize;
use std::collections::VecDeque;
use std::sync::Mutex;

/// 90 kHz RTP video clock.
const RTP_CLOCK_HZ: u32 = 90;

/// Hands NAL units off for RTP transport. Implemented outside this
/// crate; spec.md's Non-goals exclude the packetiser's internals.
pub trait RtpPacketizer {
    fn pack(&mut self, nal_units: &[&[u8]], timestamp_90khz: u32);
}

/// Rotates a planar YUV frame by a multiple of 90 degrees. Implemented
/// outside this crate.
pub trait YuvRotator {
    /// Returns `None` on allocation failure; the caller forwards the
    /// original frame unchanged in that case (spec.md §4.6).
    fn rotate(&self, frame: &[u8], size: VideoSize, degrees: u16) -> Option<Vec<u8>>;
}

/// Gates delivery so that `(now - start) * fps >= produced_frames`
/// (spec.md §4.6). This is the "controller" pacing variant the Design
/// Notes call for, as opposed to a start-time accumulator.
pub struct FrameRateController {
    start_ms: u64,
    fps: u32,
    produced_frames: u64,
}

impl FrameRateController {
    pub fn new(start_ms: u64, fps: u32) -> Self {
        FrameRateController {
            start_ms,
            fps,
            produced_frames: 0,
        }
    }

    /// Returns `true` iff a new delivery should be admitted at `now_ms`.
    /// Does not itself advance `produced_frames` — call
    /// [`Self::mark_produced`] once the frame is actually delivered.
    pub fn admit(&self, now_ms: u64) -> bool {
        let elapsed = now_ms.saturating_sub(self.start_ms);
        elapsed * self.fps as u64 >= self.produced_frames * 1000
    }

    pub fn mark_produced(&mut self) {
        self.produced_frames += 1;
    }
}

/// Rolling average of delivered-frame rate, updated on every delivery.
pub struct RollingFps {
    window: VecDeque<u64>,
    capacity: usize,
}

impl RollingFps {
    pub fn new(capacity: usize) -> Self {
        RollingFps {
            window: VecDeque::with_capacity(capacity),
            capacity,
        }
    }

    pub fn record(&mut self, timestamp_ms: u64) {
        if self.window.len() == self.capacity {
            self.window.pop_front();
        }
        self.window.push_back(timestamp_ms);
    }

    /// `None` until at least two samples have been recorded.
    pub fn average(&self) -> Option<f64> {
        let first = *self.window.front()?;
        let last = *self.window.back()?;
        if last <= first || self.window.len() < 2 {
            return None;
        }
        let span_s = (last - first) as f64 / 1000.0;
        Some((self.window.len() - 1) as f64 / span_s)
    }
}

/// The shared queue the capture worker enqueues into and the
/// presentation step drains (spec.md §5). A single `Mutex` guards it;
/// H.264 consumption is FIFO, raw consumption is newest-wins.
pub struct SharedQueue {
    inner: Mutex<VecDeque<CapturedFrame>>,
}

impl SharedQueue {
    pub fn new() -> Self {
        SharedQueue {
            inner: Mutex::new(VecDeque::new()),
        }
    }

    pub fn push(&self, frame: CapturedFrame) {
        self.inner.lock().expect("queue mutex poisoned").push_back(frame);
    }

    /// Pops exactly one frame, FIFO (spec.md §4.6, H.264 branch).
    pub fn pop_front(&self) -> Option<CapturedFrame> {
        self.inner.lock().expect("queue mutex poisoned").pop_front()
    }

    /// Drains the whole queue, keeping only the most recent frame
    /// (spec.md §4.6, raw-video branch: "newest-wins").
    pub fn drain_newest(&self) -> Option<CapturedFrame> {
        let mut guard = self.inner.lock().expect("queue mutex poisoned");
        let last = guard.pop_back();
        guard.clear();
        last
    }
}

impl Default for SharedQueue {
    fn default() -> Self {
        Self::new()
    }
}

/// One fully-delivered output: either a raw frame or an H.264 access
/// unit's NAL units already handed to the packetiser.
pub enum Delivery {
    Raw(CapturedFrame),
    H264Delivered,
    NotAdmitted,
    QueueEmpty,
}

/// Runs one presentation tick (spec.md §4.6): gate on the frame-rate
/// controller, then either pop-and-frame for H.264 or drain-newest for
/// raw video, applying rotation and marker/timestamp stamping.
pub struct PresentationStep {
    pub fps_tracker: RollingFps,
}

impl PresentationStep {
    pub fn new() -> Self {
        PresentationStep {
            fps_tracker: RollingFps::new(30),
        }
    }

    #[allow(clippy::too_many_arguments)]
    pub fn tick(
        &mut self,
        queue: &SharedQueue,
        rate: &mut FrameRateController,
        pix_fmt: PixelFormat,
        tick_time_ms: u64,
        rotation: Option<(&dyn YuvRotator, VideoSize, u16)>,
        packetizer: Option<&mut dyn RtpPacketizer>,
    ) -> Delivery {
        if !rate.admit(tick_time_ms) {
            return Delivery::NotAdmitted;
        }

        let timestamp_90khz = (tick_time_ms as u32).wrapping_mul(RTP_CLOCK_HZ);

        if pix_fmt == PixelFormat::H264 {
            let Some(frame) = queue.pop_front() else {
                return Delivery::QueueEmpty;
            };
            let bytes = frame.bytes();
            let nals = split_nal_units(bytes);
            if let Some(packetizer) = packetizer {
                packetizer.pack(&nals, timestamp_90khz);
            }
            rate.mark_produced();
            self.fps_tracker.record(tick_time_ms);
            return Delivery::H264Delivered;
        }

        let Some(mut frame) = queue.drain_newest() else {
            return Delivery::QueueEmpty;
        };

        if let Some((rotator, size, degrees)) = rotation {
            if degrees != 0 {
                if let Some(rotated) = rotator.rotate(frame.bytes(), size, degrees) {
                    frame = frame.with_owned_bytes(rotated);
                }
                // Allocation failure: forward the original frame unchanged.
            }
        }
        frame.timestamp_90khz = timestamp_90khz;
        frame.marker = true;

        rate.mark_produced();
        self.fps_tracker.record(tick_time_ms);
        Delivery::Raw(frame)
    }
}

impl Default for PresentationStep {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn rate_controller_admits_at_expected_cadence() {
        let mut rate = FrameRateController::new(0, 10); // 10 fps -> 100ms/frame
        assert!(!rate.admit(50));
        assert!(rate.admit(100));
        rate.mark_produced();
        assert!(!rate.admit(150));
        assert!(rate.admit(200));
    }

    #[test]
    fn rolling_fps_is_none_with_fewer_than_two_samples() {
        let mut fps = RollingFps::new(10);
        assert!(fps.average().is_none());
        fps.record(0);
        assert!(fps.average().is_none());
    }

    #[test]
    fn rolling_fps_computes_average_over_window() {
        let mut fps = RollingFps::new(10);
        for t in [0, 100, 200, 300, 400] {
            fps.record(t);
        }
        let avg = fps.average().unwrap();
        assert!((avg - 10.0).abs() < 0.01);
    }
}
