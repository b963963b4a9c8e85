// SPDX-License-Identifier: GPL-3.0-only

//! Recognised pixel formats and their kernel FourCC encodings.

use serde::{Deserialize, Serialize};

/// A recognised V4L2 pixel format.
///
/// The FourCC table here is exactly the five kernel codes the upstream
/// capture filter this crate's negotiation logic is modeled on
/// recognises; anything else the kernel enumerates maps to `Unknown` and
/// is excluded from scoring.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum PixelFormat {
    Yuv420P,
    Yuyv,
    Rgb24,
    Mjpeg,
    H264,
    Unknown(u32),
}

fn fourcc(a: u8, b: u8, c: u8, d: u8) -> u32 {
    (a as u32) | (b as u32) << 8 | (c as u32) << 16 | (d as u32) << 24
}

impl PixelFormat {
    /// The kernel `v4l2_format.fmt.pix.pixelformat` FourCC for this format,
    /// or `None` for `Unknown`.
    pub fn fourcc(self) -> Option<u32> {
        match self {
            PixelFormat::Yuv420P => Some(fourcc(b'Y', b'U', b'1', b'2')),
            PixelFormat::Yuyv => Some(fourcc(b'Y', b'U', b'Y', b'V')),
            PixelFormat::Rgb24 => Some(fourcc(b'R', b'G', b'B', b'3')),
            PixelFormat::Mjpeg => Some(fourcc(b'M', b'J', b'P', b'G')),
            PixelFormat::H264 => Some(fourcc(b'H', b'2', b'6', b'4')),
            PixelFormat::Unknown(_) => None,
        }
    }

    /// Maps a kernel FourCC to a `PixelFormat`, falling back to
    /// `Unknown(fourcc)` for anything not in the recognised set.
    pub fn from_fourcc(code: u32) -> PixelFormat {
        if code == fourcc(b'Y', b'U', b'1', b'2') {
            PixelFormat::Yuv420P
        } else if code == fourcc(b'Y', b'U', b'Y', b'V') {
            PixelFormat::Yuyv
        } else if code == fourcc(b'R', b'G', b'B', b'3') {
            PixelFormat::Rgb24
        } else if code == fourcc(b'M', b'J', b'P', b'G') {
            PixelFormat::Mjpeg
        } else if code == fourcc(b'H', b'2', b'6', b'4') {
            PixelFormat::H264
        } else {
            PixelFormat::Unknown(code)
        }
    }

    /// True for formats whose frame occupies a fixed, computable number of
    /// bytes at a given size (i.e. not `MJPEG`/`H264`/`Unknown`).
    pub fn is_uncompressed(self) -> bool {
        matches!(
            self,
            PixelFormat::Yuv420P | PixelFormat::Yuyv | PixelFormat::Rgb24
        )
    }

    /// Bytes per pixel, multiplied by `w*h`, for uncompressed formats;
    /// `None` for compressed or unknown formats (picture size is 0 there).
    pub fn bytes_for(self, width: u32, height: u32) -> Option<usize> {
        let w = width as usize;
        let h = height as usize;
        match self {
            PixelFormat::Yuv420P => Some(w * h * 3 / 2),
            PixelFormat::Yuyv => Some(w * h * 2),
            PixelFormat::Rgb24 => Some(w * h * 3),
            PixelFormat::Mjpeg | PixelFormat::H264 | PixelFormat::Unknown(_) => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn fourcc_roundtrip_for_recognised_formats() {
        for fmt in [
            PixelFormat::Yuv420P,
            PixelFormat::Yuyv,
            PixelFormat::Rgb24,
            PixelFormat::Mjpeg,
            PixelFormat::H264,
        ] {
            let code = fmt.fourcc().unwrap();
            assert_eq!(PixelFormat::from_fourcc(code), fmt);
        }
    }

    #[test]
    fn unrecognised_fourcc_is_unknown() {
        let code = fourcc(b'B', b'G', b'R', b'4');
        assert_eq!(PixelFormat::from_fourcc(code), PixelFormat::Unknown(code));
    }

    #[test]
    fn picture_size_formulas() {
        assert_eq!(PixelFormat::Yuv420P.bytes_for(640, 480), Some(640 * 480 * 3 / 2));
        assert_eq!(PixelFormat::Yuyv.bytes_for(640, 480), Some(640 * 480 * 2));
        assert_eq!(PixelFormat::Rgb24.bytes_for(640, 480), Some(640 * 480 * 3));
        assert_eq!(PixelFormat::Mjpeg.bytes_for(640, 480), None);
        assert_eq!(PixelFormat::H264.bytes_for(640, 480), None);
    }
}
