// SPDX-License-Identifier: GPL-3.0-only

//! Error types for device setup, format negotiation, and capture.
//!
//! No `thiserror`/`anyhow` here — plain enums with hand-written `Display`
//! and `From` impls, matching the rest of this crate's style.

use std::fmt;
use std::io;

/// Setup-fatal errors from opening or querying the capture node itself.
#[derive(Debug)]
pub enum DeviceError {
    /// The device node could not be opened.
    Open(io::Error),
    /// `VIDIOC_QUERYCAP` succeeded but the device lacks `VIDEO_CAPTURE`.
    NotACaptureDevice,
    /// `VIDIOC_QUERYCAP` succeeded but the device lacks `STREAMING`.
    NoStreamingSupport,
    /// An ioctl failed; the raw kernel errno is preserved for callers that
    /// want to match on it.
    Ioctl { call: &'static str, source: io::Error },
}

impl fmt::Display for DeviceError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            DeviceError::Open(e) => write!(f, "failed to open capture device: {e}"),
            DeviceError::NotACaptureDevice => {
                write!(f, "device does not report V4L2_CAP_VIDEO_CAPTURE")
            }
            DeviceError::NoStreamingSupport => {
                write!(f, "device does not report V4L2_CAP_STREAMING")
            }
            DeviceError::Ioctl { call, source } => write!(f, "{call} failed: {source}"),
        }
    }
}

impl std::error::Error for DeviceError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            DeviceError::Open(e) | DeviceError::Ioctl { source: e, .. } => Some(e),
            DeviceError::NotACaptureDevice | DeviceError::NoStreamingSupport => None,
        }
    }
}

impl From<io::Error> for DeviceError {
    fn from(e: io::Error) -> Self {
        DeviceError::Open(e)
    }
}

/// Setup-fatal error from format/resolution negotiation.
#[derive(Debug)]
pub enum NegotiationError {
    /// No candidate pixel format was accepted at any size in the
    /// degradation chain, including the final forced-`YUV420P` attempt.
    NoCompatibleFormat,
    /// A device-level error occurred while negotiating.
    Device(DeviceError),
}

impl fmt::Display for NegotiationError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            NegotiationError::NoCompatibleFormat => {
                write!(f, "no compatible (pixel format, size) found after degradation")
            }
            NegotiationError::Device(e) => write!(f, "{e}"),
        }
    }
}

impl std::error::Error for NegotiationError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            NegotiationError::NoCompatibleFormat => None,
            NegotiationError::Device(e) => Some(e),
        }
    }
}

impl From<DeviceError> for NegotiationError {
    fn from(e: DeviceError) -> Self {
        NegotiationError::Device(e)
    }
}

/// The capture worker's terminal error type: wraps the two setup-fatal
/// taxonomies plus runtime-unrecoverable conditions.
#[derive(Debug)]
pub enum CaptureError {
    Device(DeviceError),
    Negotiation(NegotiationError),
    /// `DQBUF` returned an index outside `[0, N)`.
    BufferIndexOutOfRange(u32),
}

impl fmt::Display for CaptureError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            CaptureError::Device(e) => write!(f, "{e}"),
            CaptureError::Negotiation(e) => write!(f, "{e}"),
            CaptureError::BufferIndexOutOfRange(idx) => {
                write!(f, "DQBUF returned out-of-range buffer index {idx}")
            }
        }
    }
}

impl std::error::Error for CaptureError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            CaptureError::Device(e) => Some(e),
            CaptureError::Negotiation(e) => Some(e),
            CaptureError::BufferIndexOutOfRange(_) => None,
        }
    }
}

impl From<DeviceError> for CaptureError {
    fn from(e: DeviceError) -> Self {
        CaptureError::Device(e)
    }
}

impl From<NegotiationError> for CaptureError {
    fn from(e: NegotiationError) -> Self {
        CaptureError::Negotiation(e)
    }
}
