// SPDX-License-Identifier: GPL-3.0-only

//! UVC H.264 vendor extension unit: probe/commit of the encoder config
//! record (spec.md §4.3, §6).

use crate::device::DeviceHandle;
use bytemuck::{Pod, Zeroable};
use tracing::warn;

const UVC_GET_CUR: u8 = 0x81;
const UVC_GET_LEN: u8 = 0x85;
const UVC_SET_CUR: u8 = 0x01;

const VIDEO_CONFIG_PROBE: u8 = 0x01;
const VIDEO_CONFIG_COMMIT: u8 = 0x02;

const RECORD_LEN: usize = 46;

/// Identifies which UVC extension unit on the device exposes the H.264
/// config controls. Hard-coded to `12` (Logitech C920) by the source
/// this logic is modeled on; real deployments should probe the UVC
/// descriptor tree for the unit exposing the H.264 GUID rather than
/// assume this value (see DESIGN.md's Open Questions).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct XuUnitId(pub u8);

impl Default for XuUnitId {
    fn default() -> Self {
        XuUnitId(12)
    }
}

/// `uvcx_video_config_probe_commit_t`: packed, little-endian, 46 bytes
/// (spec.md §6's field list sums to 46, not the "42 bytes" in its prose).
#[repr(C, packed)]
#[derive(Debug, Clone, Copy, Pod, Zeroable)]
pub struct VideoConfigProbeCommit {
    pub frame_interval: u32,
    pub bit_rate: u32,
    pub hints: u16,
    pub configuration_index: u16,
    pub width: u16,
    pub height: u16,
    pub slice_units: u16,
    pub slice_mode: u16,
    pub profile: u16,
    pub i_frame_period: u16,
    pub estimated_video_delay: u16,
    pub estimated_max_config_delay: u16,
    pub usage_type: u8,
    pub rate_control_mode: u8,
    pub temporal_scale_mode: u8,
    pub spatial_scale_mode: u8,
    pub snr_scale_mode: u8,
    pub stream_mux_option: u8,
    pub stream_format: u8,
    pub entropy_cabac: u8,
    pub timestamp: u8,
    pub num_of_reorder_frames: u8,
    pub preview_flipped: u8,
    pub view: u8,
    pub reserved: [u8; 2],
    pub stream_id: u8,
    /// Fixed-point: upper nibble integer part, lower nibble `/16`.
    pub spatial_layer_ratio: u8,
    pub leaky_bucket_size: u16,
}

const _: () = assert!(std::mem::size_of::<VideoConfigProbeCommit>() == RECORD_LEN);

impl Default for VideoConfigProbeCommit {
    fn default() -> Self {
        bytemuck::Zeroable::zeroed()
    }
}

fn xu_query(
    device: &DeviceHandle,
    unit: XuUnitId,
    selector: u8,
    query: u8,
    record: &mut VideoConfigProbeCommit,
) -> std::io::Result<()> {
    // Learn the control's length first, as the original helper does,
    // before GET_CUR/SET_CUR.
    let mut len_buf = [0u8; 2];
    device.uvc_ctrl_query(unit.0, selector, UVC_GET_LEN, &mut len_buf)?;
    let bytes: &mut [u8; RECORD_LEN] = bytemuck::cast_mut(record);
    device.uvc_ctrl_query(unit.0, selector, query, bytes)
}

/// Probes the current H.264 config, sets the desired I-frame period
/// (default 1000 ms), re-probes to absorb driver rounding, then commits —
/// the sequence spec.md §4.3 specifies. Failures are logged and treated
/// as setup-degradable: capture falls back to whatever raw format the
/// negotiator otherwise obtains.
pub fn configure_h264(device: &DeviceHandle, unit: XuUnitId, i_frame_period_ms: u16) -> bool {
    let mut record = VideoConfigProbeCommit::default();

    if let Err(e) = xu_query(device, unit, VIDEO_CONFIG_PROBE, UVC_GET_CUR, &mut record) {
        warn!(error = %e, "UVC H.264 probe (GET_CUR) failed");
        return false;
    }

    record.i_frame_period = i_frame_period_ms;

    if let Err(e) = xu_query(device, unit, VIDEO_CONFIG_PROBE, UVC_SET_CUR, &mut record) {
        warn!(error = %e, "UVC H.264 probe (SET_CUR) failed");
        return false;
    }

    if let Err(e) = xu_query(device, unit, VIDEO_CONFIG_PROBE, UVC_GET_CUR, &mut record) {
        warn!(error = %e, "UVC H.264 re-probe failed");
        return false;
    }

    if let Err(e) = xu_query(device, unit, VIDEO_CONFIG_COMMIT, UVC_SET_CUR, &mut record) {
        warn!(error = %e, "UVC H.264 commit failed");
        return false;
    }

    true
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn record_is_exactly_46_bytes() {
        assert_eq!(std::mem::size_of::<VideoConfigProbeCommit>(), 46);
    }

    #[test]
    fn default_unit_id_is_twelve() {
        assert_eq!(XuUnitId::default().0, 12);
    }

    #[test]
    fn record_roundtrips_through_byte_cast() {
        let mut record = VideoConfigProbeCommit::default();
        record.i_frame_period = 1000;
        record.width = 1280;
        record.height = 720;
        let bytes: [u8; RECORD_LEN] = bytemuck::cast(record);
        let back: VideoConfigProbeCommit = bytemuck::cast(bytes);
        assert_eq!({ back.i_frame_period }, 1000);
        assert_eq!({ back.width }, 1280);
        assert_eq!({ back.height }, 720);
    }
}
