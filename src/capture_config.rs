// SPDX-License-Identifier: GPL-3.0-only

//! Capture configuration: the single explicit value the core accepts,
//! collecting what used to be ad hoc environment-variable reads
//! (REDESIGN FLAGS' "environment-variable knobs" note, spec.md §6).

use crate::pixel_format::PixelFormat;
use crate::size::VideoSize;
use crate::video_config::VideoConfiguration;
use serde::{Deserialize, Serialize};

/// Focus behaviour requested via `CAM_FOCUS` (spec.md §6).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum FocusHint {
    Auto,
    Infinity,
}

impl FocusHint {
    fn from_env_value(value: &str) -> Option<FocusHint> {
        match value.to_ascii_lowercase().as_str() {
            "auto" => Some(FocusHint::Auto),
            "infinity" => Some(FocusHint::Infinity),
            _ => None,
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            FocusHint::Auto => "auto",
            FocusHint::Infinity => "infinity",
        }
    }
}

/// Device orientation in degrees, always one of the four right angles
/// (spec.md §6).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Orientation {
    Deg0,
    Deg90,
    Deg180,
    Deg270,
}

impl Orientation {
    pub fn degrees(self) -> u16 {
        match self {
            Orientation::Deg0 => 0,
            Orientation::Deg90 => 90,
            Orientation::Deg180 => 180,
            Orientation::Deg270 => 270,
        }
    }
}

/// A single, explicit configuration value produced at initialisation;
/// the core never reads the environment itself afterward.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CaptureConfig {
    pub device_path: String,
    pub fps: u32,
    pub size: VideoSize,
    pub pixel_format: PixelFormat,
    pub orientation: Orientation,
    /// Enables the rotation path; forces `YUV420P` during negotiation.
    pub use_rotation: bool,
    pub bitrate_bps: u32,
    pub focus_hint: Option<FocusHint>,
    /// Mime type the `V4L2_NO_ENCODE` hint suppresses H.264 pass-through
    /// for, if set.
    pub no_encode_mime: Option<String>,
    pub xu_i_frame_period_ms: u16,
}

impl CaptureConfig {
    pub fn new(device_path: impl Into<String>) -> Self {
        CaptureConfig {
            device_path: device_path.into(),
            fps: 25,
            size: VideoSize::new(640, 480),
            pixel_format: PixelFormat::Unknown(0),
            orientation: Orientation::Deg0,
            use_rotation: false,
            bitrate_bps: 384_000,
            focus_hint: None,
            no_encode_mime: None,
            xu_i_frame_period_ms: 1000,
        }
    }

    /// Reads `CAM_FOCUS`, `V4L2_USE_ROTATION`, and `V4L2_NO_ENCODE` once,
    /// folding them onto an otherwise-default configuration. This is the
    /// only place in the crate that touches `std::env`.
    pub fn from_env(device_path: impl Into<String>) -> Self {
        let mut config = Self::new(device_path);
        if let Ok(focus) = std::env::var("CAM_FOCUS") {
            config.focus_hint = FocusHint::from_env_value(&focus);
        }
        if std::env::var("V4L2_USE_ROTATION").as_deref() == Ok("1") {
            config.use_rotation = true;
        }
        if let Ok(mime) = std::env::var("V4L2_NO_ENCODE") {
            config.no_encode_mime = Some(mime);
        }
        config
    }

    /// Applies a ladder rung (spec.md §6 "Configuration surface").
    pub fn apply_rung(&mut self, rung: VideoConfiguration) {
        self.bitrate_bps = rung.required_bitrate;
        self.size = rung.size;
        self.fps = rung.fps;
    }

    /// True if `mime` should not be offered for H.264 pass-through
    /// (spec.md §6 `V4L2_NO_ENCODE`).
    pub fn encode_suppressed_for(&self, mime: &str) -> bool {
        self.no_encode_mime.as_deref() == Some(mime)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn focus_hint_parses_known_values_case_insensitively() {
        assert_eq!(FocusHint::from_env_value("Auto"), Some(FocusHint::Auto));
        assert_eq!(FocusHint::from_env_value("INFINITY"), Some(FocusHint::Infinity));
        assert_eq!(FocusHint::from_env_value("bogus"), None);
    }

    #[test]
    fn apply_rung_updates_bitrate_size_and_fps() {
        let mut config = CaptureConfig::new("/dev/video0");
        config.apply_rung(VideoConfiguration {
            required_bitrate: 128_000,
            bitrate_limit: 160_000,
            size: VideoSize::new(352, 288),
            fps: 18,
            min_cpu_count: 1,
        });
        assert_eq!(config.bitrate_bps, 128_000);
        assert_eq!(config.size, VideoSize::new(352, 288));
        assert_eq!(config.fps, 18);
    }

    #[test]
    fn no_encode_mime_suppression_is_exact_match() {
        let mut config = CaptureConfig::new("/dev/video0");
        config.no_encode_mime = Some("video/h264".to_string());
        assert!(config.encode_suppressed_for("video/h264"));
        assert!(!config.encode_suppressed_for("video/mp4v-es"));
    }
}
