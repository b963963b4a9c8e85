// SPDX-License-Identifier: GPL-3.0-only

//! Capture-node and focus-actuator discovery helpers built on top of
//! [`crate::device`]'s raw ioctl wrappers.

use crate::device::DeviceHandle;
use crate::v4l2_controls;
use tracing::debug;

/// Driver name reported by `VIDIOC_QUERYCAP`, or `None` if the node
/// cannot be opened or queried.
pub fn get_v4l2_driver(device_path: &str) -> Option<String> {
    let handle = DeviceHandle::open(device_path).ok()?;
    let driver = handle.driver_name()?;
    debug!(device_path, driver = %driver, "Got V4L2 driver name");
    Some(driver)
}

/// Canonicalizes `device_path` (resolving symlinks), returning the
/// original path unchanged if that fails.
pub fn canonical_device_path(device_path: &str) -> String {
    std::fs::canonicalize(device_path)
        .map(|p| p.to_string_lossy().to_string())
        .unwrap_or_else(|_| device_path.to_string())
}

/// Scans `/dev/v4l-subdev*` for devices exposing `V4L2_CID_FOCUS_ABSOLUTE`
/// — a lens actuator a focus hint (spec.md §4.2, `CAM_FOCUS`) could drive.
/// Returns `(device_path, display_name)` pairs.
pub fn discover_lens_actuators() -> Vec<(String, String)> {
    let mut actuators = Vec::new();

    let entries = match std::fs::read_dir("/dev") {
        Ok(entries) => entries,
        Err(_) => return actuators,
    };

    for entry in entries.flatten() {
        let name = entry.file_name();
        let name_str = name.to_string_lossy();
        if !name_str.starts_with("v4l-subdev") {
            continue;
        }

        let path = format!("/dev/{}", name_str);

        if let Some(info) =
            v4l2_controls::query_control(&path, v4l2_controls::V4L2_CID_FOCUS_ABSOLUTE)
        {
            if info.is_disabled() {
                continue;
            }
            let sysfs_name =
                std::fs::read_to_string(format!("/sys/class/video4linux/{}/name", name_str))
                    .unwrap_or_default()
                    .trim()
                    .to_string();

            let display_name = if sysfs_name.is_empty() {
                name_str.to_string()
            } else {
                sysfs_name
            };

            debug!(
                path = %path,
                name = %display_name,
                range = format!("{}-{}", info.minimum, info.maximum),
                "Discovered lens actuator with focus control"
            );
            actuators.push((path, display_name));
        }
    }

    actuators
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn canonical_device_path_falls_back_on_missing_file() {
        let path = canonical_device_path("/dev/does-not-exist-v4l2-source-filter-test");
        assert_eq!(path, "/dev/does-not-exist-v4l2-source-filter-test");
    }
}
