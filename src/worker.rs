// SPDX-License-Identifier: GPL-3.0-only

//! The background capture worker thread (spec.md §4.5).

use crate::buffer_pool::BufferPool;
use crate::capture_config::CaptureConfig;
use crate::device::DeviceHandle;
use crate::loop_controller::{CaptureLoopController, LoopAction};
use crate::negotiator::{FormatNegotiator, NegotiatedFormat};
use crate::pixel_format::PixelFormat;
use crate::presentation::SharedQueue;
use crate::xu::{self, XuUnitId};
use std::sync::Arc;
use tracing::{error, info, warn};

const DRAIN_POLL_TIMEOUT_MS: i32 = 50;

struct WorkerState {
    device: DeviceHandle,
    pool: BufferPool,
    negotiated: NegotiatedFormat,
}

impl Drop for WorkerState {
    fn drop(&mut self) {
        self.pool.teardown(&self.device);
    }
}

fn open_and_negotiate(config: &CaptureConfig) -> Result<WorkerState, crate::error::CaptureError> {
    let device = DeviceHandle::open(&config.device_path)?;
    device.query_capability()?;

    let negotiator = FormatNegotiator::new();
    negotiator.apply_focus_hint(&device, config.focus_hint.map(|h| h.as_str()));

    let negotiated = negotiator.negotiate(
        &device,
        config.pixel_format,
        config.fps,
        config.size,
        config.use_rotation,
    )?;

    if !device.set_frame_interval(config.fps) {
        warn!("S_PARM unsupported or rejected; continuing with driver default frame interval");
    }

    if negotiated.pix_fmt == PixelFormat::H264 {
        if !xu::configure_h264(&device, XuUnitId::default(), config.xu_i_frame_period_ms) {
            warn!("UVC H.264 extension-unit configuration failed; falling back to raw capture");
        }
    }

    let pool = BufferPool::setup(&device, negotiated.picture_size)?;

    info!(
        device = config.device_path.as_str(),
        pix_fmt = ?negotiated.pix_fmt,
        width = negotiated.size.width,
        height = negotiated.size.height,
        "capture worker configured"
    );

    Ok(WorkerState {
        device,
        pool,
        negotiated,
    })
}

/// Starts the background producer loop: lazily opens and negotiates on
/// first iteration, then repeatedly drains the buffer pool and enqueues
/// duplicated frame handles into `queue` (spec.md §4.5). A fatal setup
/// error terminates the loop cleanly; the output queue simply stays
/// empty.
pub fn start(config: CaptureConfig, queue: Arc<SharedQueue>) -> CaptureLoopController {
    CaptureLoopController::start_with_init(
        "v4l2-capture-worker",
        move || open_and_negotiate(&config).map_err(|e| e.to_string()),
        move |state: &mut WorkerState| {
            match state.pool.drain_tick(&state.device, DRAIN_POLL_TIMEOUT_MS) {
                Ok(Some(mut frame)) => {
                    frame.marker = state.negotiated.pix_fmt == PixelFormat::Mjpeg;
                    queue.push(frame);
                }
                Ok(None) => {}
                Err(e) => {
                    error!(error = %e, "capture worker terminating on fatal error");
                    return LoopAction::Stop;
                }
            }
            LoopAction::Continue
        },
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn open_and_negotiate_reports_open_failure_for_missing_device() {
        let config = CaptureConfig::new("/dev/does-not-exist-v4l2-source-filter-test");
        let result = open_and_negotiate(&config);
        assert!(result.is_err());
    }
}
