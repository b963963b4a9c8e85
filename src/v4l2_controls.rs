// SPDX-License-Identifier: GPL-3.0-only

//! V4L2 camera control interface
//!
//! Trimmed to the focus-control subset this crate actually exercises: the
//! `CAM_FOCUS` hint in [`crate::negotiator`] and the lens-actuator discovery
//! in [`crate::discovery`]. Exposure/gain/ISO/metering tuning is out of
//! scope (spec.md §1 Non-goals).
//!
//! Inspired by [cameractrls](https://github.com/soyersoyer/cameractrls).

use std::fs::File;
use std::os::unix::io::AsRawFd;

// ===== V4L2 Control Class Bases =====
const V4L2_CTRL_CLASS_CAMERA: u32 = 0x009a0000;

const V4L2_CID_CAMERA_CLASS_BASE: u32 = V4L2_CTRL_CLASS_CAMERA | 0x900;

// ===== V4L2 Control IDs (Camera Class) =====

/// Focus control (manual focus position)
pub const V4L2_CID_FOCUS_ABSOLUTE: u32 = V4L2_CID_CAMERA_CLASS_BASE + 10;
/// Auto focus enable
pub const V4L2_CID_FOCUS_AUTO: u32 = V4L2_CID_CAMERA_CLASS_BASE + 12;
/// Auto-focus range selection (used by the `CAM_FOCUS` hint)
pub const V4L2_CID_AUTO_FOCUS_RANGE: u32 = V4L2_CID_CAMERA_CLASS_BASE + 18;

// ===== V4L2 Auto Focus Range Menu Values =====

/// Auto-detect the best focus range
pub const V4L2_AUTO_FOCUS_RANGE_AUTO: i32 = 0;
/// Fixed at infinity
pub const V4L2_AUTO_FOCUS_RANGE_INFINITY: i32 = 3;

// ===== V4L2 Control Flags =====
const V4L2_CTRL_FLAG_DISABLED: u32 = 0x0001;

// ===== V4L2 ioctl Numbers =====
// Calculated as: (dir << 30) | (size << 16) | ('V' << 8) | nr
// where dir: 2=READ, 1=WRITE, 3=READ|WRITE

/// Query control info (v4l2_queryctrl: 68 bytes)
const VIDIOC_QUERYCTRL: libc::c_ulong = 0xC0445624;

// ===== V4L2 ioctl Structures =====

/// V4L2 query control structure
#[repr(C)]
struct V4l2Queryctrl {
    id: u32,
    ctrl_type: u32,
    name: [u8; 32],
    minimum: i32,
    maximum: i32,
    step: i32,
    default_value: i32,
    flags: u32,
    reserved: [u32; 2],
}

// ===== Public Types =====

/// Information about a V4L2 control, as returned by `VIDIOC_QUERYCTRL`.
#[derive(Debug, Clone)]
pub struct ControlInfo {
    pub id: u32,
    pub name: String,
    pub minimum: i32,
    pub maximum: i32,
    pub step: i32,
    pub default_value: i32,
    pub flags: u32,
}

impl ControlInfo {
    /// Check if control is disabled
    pub fn is_disabled(&self) -> bool {
        self.flags & V4L2_CTRL_FLAG_DISABLED != 0
    }
}

// ===== Helper Functions =====

/// Extract a null-terminated string from a fixed-size byte array
fn extract_name(bytes: &[u8; 32]) -> String {
    let name_len = bytes.iter().position(|&c| c == 0).unwrap_or(32);
    String::from_utf8_lossy(&bytes[..name_len]).to_string()
}

// ===== Public Functions =====

/// Query if a control exists and get its information
pub fn query_control(device_path: &str, control_id: u32) -> Option<ControlInfo> {
    let file = File::open(device_path).ok()?;
    let fd = file.as_raw_fd();

    let mut qctrl = V4l2Queryctrl {
        id: control_id,
        ctrl_type: 0,
        name: [0; 32],
        minimum: 0,
        maximum: 0,
        step: 0,
        default_value: 0,
        flags: 0,
        reserved: [0; 2],
    };

    let result = unsafe { libc::ioctl(fd, VIDIOC_QUERYCTRL, &mut qctrl as *mut V4l2Queryctrl) };

    if result < 0 {
        return None;
    }

    Some(ControlInfo {
        id: qctrl.id,
        name: extract_name(&qctrl.name),
        minimum: qctrl.minimum,
        maximum: qctrl.maximum,
        step: qctrl.step,
        default_value: qctrl.default_value,
        flags: qctrl.flags,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn focus_control_id_values() {
        assert_eq!(V4L2_CID_FOCUS_ABSOLUTE, 0x009a090a);
        assert_eq!(V4L2_CID_FOCUS_AUTO, 0x009a090c);
        assert_eq!(V4L2_CID_AUTO_FOCUS_RANGE, 0x009a0912);
    }

    #[test]
    fn control_info_is_disabled_checks_the_disabled_flag() {
        let control = ControlInfo {
            id: V4L2_CID_FOCUS_AUTO,
            name: "Focus, Auto".to_string(),
            minimum: 0,
            maximum: 1,
            step: 1,
            default_value: 0,
            flags: V4L2_CTRL_FLAG_DISABLED,
        };
        assert!(control.is_disabled());
    }
}
