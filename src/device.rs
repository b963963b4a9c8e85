// SPDX-License-Identifier: GPL-3.0-only

//! Raw V4L2 ioctl wrappers over an open capture node.
//!
//! Ioctl request numbers are hand-computed from the kernel's
//! `_IOC(dir, type, nr, size)` encoding rather than pulled in from a
//! wrapping crate, in the style of [`crate::v4l2_controls`]. Every
//! wrapper surfaces the underlying `errno` verbatim through
//! `io::Error::last_os_error()` so callers can match on it.

use crate::error::DeviceError;
use crate::pixel_format::PixelFormat;
use crate::size::VideoSize;
use std::fs::{File, OpenOptions};
use std::io;
use std::os::unix::fs::OpenOptionsExt;
use std::os::unix::io::{AsRawFd, RawFd};

// ===== ioctl request numbers =====
// _IOC(dir, 'V', nr, size); dir: 1=write, 2=read, 3=read|write.

const VIDIOC_QUERYCAP: libc::c_ulong = 0x80685600;
const VIDIOC_ENUM_FMT: libc::c_ulong = 0xC0405602;
const VIDIOC_G_FMT: libc::c_ulong = 0xC0CC5604;
const VIDIOC_S_FMT: libc::c_ulong = 0xC0CC5605;
const VIDIOC_TRY_FMT: libc::c_ulong = 0xC0CC5640;
const VIDIOC_REQBUFS: libc::c_ulong = 0xC0145608;
const VIDIOC_QUERYBUF: libc::c_ulong = 0xC0585609;
const VIDIOC_QBUF: libc::c_ulong = 0xC058560F;
const VIDIOC_DQBUF: libc::c_ulong = 0xC0585611;
const VIDIOC_STREAMON: libc::c_ulong = 0x40045612;
const VIDIOC_STREAMOFF: libc::c_ulong = 0x40045613;
const VIDIOC_G_PARM: libc::c_ulong = 0xC0CC5615;
const VIDIOC_S_PARM: libc::c_ulong = 0xC0CC5616;
const VIDIOC_ENUM_FRAMEINTERVALS: libc::c_ulong = 0xC034564B;
const VIDIOC_S_EXT_CTRLS: libc::c_ulong = 0xC0205648;

/// UVCIOC_CTRL_QUERY, defined by `linux/uvcvideo.h`. Not in the `V`
/// namespace (it's `'u'`, 0x75): `_IOWR('u', 0x21, struct uvc_xu_control_query)`.
/// size = sizeof(uvc_xu_control_query) = 1+1+1+2+2+8(ptr) aligned -> 16.
const UVCIOC_CTRL_QUERY: libc::c_ulong = 0xC0107521;

pub const V4L2_CAP_VIDEO_CAPTURE: u32 = 0x0000_0001;
pub const V4L2_CAP_VIDEO_OUTPUT: u32 = 0x0000_0002;
pub const V4L2_CAP_VIDEO_CAPTURE_MPLANE: u32 = 0x0000_1000;
pub const V4L2_CAP_STREAMING: u32 = 0x0400_0000;
pub const V4L2_CAP_DEVICE_CAPS: u32 = 0x8000_0000;

const V4L2_BUF_TYPE_VIDEO_CAPTURE: u32 = 1;
const V4L2_MEMORY_MMAP: u32 = 1;
const V4L2_FMT_FLAG_COMPRESSED: u32 = 0x0001;
const V4L2_FMT_FLAG_EMULATED: u32 = 0x0200;
const V4L2_FRMIVAL_TYPE_DISCRETE: u32 = 1;
const V4L2_FRMIVAL_TYPE_CONTINUOUS: u32 = 2;
const V4L2_FRMIVAL_TYPE_STEPWISE: u32 = 3;
const V4L2_CTRL_CLASS_CAMERA: u32 = 0x009a0000;

#[repr(C)]
struct V4l2Capability {
    driver: [u8; 16],
    card: [u8; 32],
    bus_info: [u8; 32],
    version: u32,
    capabilities: u32,
    device_caps: u32,
    reserved: [u32; 3],
}

#[repr(C)]
struct V4l2Fmtdesc {
    index: u32,
    type_: u32,
    flags: u32,
    description: [u8; 32],
    pixelformat: u32,
    mbus_code: u32,
    reserved: [u32; 3],
}

/// Mirrors `v4l2_format`'s `fmt.pix` variant. The trailing `reserved`
/// pads the union out to the kernel's 200-byte `raw_data` reservation.
#[repr(C)]
struct V4l2Format {
    type_: u32,
    width: u32,
    height: u32,
    pixelformat: u32,
    field: u32,
    bytesperline: u32,
    sizeimage: u32,
    colorspace: u32,
    priv_: u32,
    flags: u32,
    ycbcr_enc: u32,
    quantization: u32,
    xfer_func: u32,
    reserved: [u8; 152],
}

impl V4l2Format {
    fn for_capture(width: u32, height: u32, pixelformat: u32) -> Self {
        V4l2Format {
            type_: V4L2_BUF_TYPE_VIDEO_CAPTURE,
            width,
            height,
            pixelformat,
            field: 0,
            bytesperline: 0,
            sizeimage: 0,
            colorspace: 0,
            priv_: 0,
            flags: 0,
            ycbcr_enc: 0,
            quantization: 0,
            xfer_func: 0,
            reserved: [0; 152],
        }
    }
}

#[repr(C)]
struct V4l2Fract {
    numerator: u32,
    denominator: u32,
}

#[repr(C)]
struct V4l2FrmivalStepwise {
    min: V4l2Fract,
    max: V4l2Fract,
    step: V4l2Fract,
}

#[repr(C)]
union V4l2FrmivalUnion {
    discrete: std::mem::ManuallyDrop<V4l2Fract>,
    stepwise: std::mem::ManuallyDrop<V4l2FrmivalStepwise>,
}

#[repr(C)]
struct V4l2Frmivalenum {
    index: u32,
    pixel_format: u32,
    width: u32,
    height: u32,
    type_: u32,
    union_: V4l2FrmivalUnion,
    reserved: [u32; 2],
}

#[repr(C)]
struct V4l2Buffer {
    index: u32,
    type_: u32,
    bytesused: u32,
    flags: u32,
    field: u32,
    timestamp_sec: i64,
    timestamp_usec: i64,
    timecode_type: u32,
    timecode_flags: u32,
    timecode_frames: u8,
    timecode_seconds: u8,
    timecode_minutes: u8,
    timecode_hours: u8,
    timecode_userbits: [u8; 4],
    sequence: u32,
    memory: u32,
    m_offset: u64,
    length: u32,
    reserved2: u32,
    request_fd: i32,
}

impl V4l2Buffer {
    fn new(index: u32) -> Self {
        V4l2Buffer {
            index,
            type_: V4L2_BUF_TYPE_VIDEO_CAPTURE,
            bytesused: 0,
            flags: 0,
            field: 0,
            timestamp_sec: 0,
            timestamp_usec: 0,
            timecode_type: 0,
            timecode_flags: 0,
            timecode_frames: 0,
            timecode_seconds: 0,
            timecode_minutes: 0,
            timecode_hours: 0,
            timecode_userbits: [0; 4],
            sequence: 0,
            memory: V4L2_MEMORY_MMAP,
            m_offset: 0,
            length: 0,
            reserved2: 0,
            request_fd: 0,
        }
    }
}

#[repr(C)]
struct V4l2RequestBuffers {
    count: u32,
    type_: u32,
    memory: u32,
    capabilities: u32,
    reserved: u32,
}

#[repr(C)]
struct V4l2Streamparm {
    type_: u32,
    capability: u32,
    capturemode: u32,
    timeperframe_numerator: u32,
    timeperframe_denominator: u32,
    extendedmode: u32,
    readbuffers: u32,
    reserved: [u8; 176],
}

#[repr(C)]
struct V4l2ExtControl {
    id: u32,
    size: u32,
    reserved2: [u32; 1],
    value: i32,
}

#[repr(C)]
struct V4l2ExtControls {
    ctrl_class: u32,
    count: u32,
    error_idx: u32,
    request_fd: i32,
    reserved: [u32; 1],
    controls: *mut V4l2ExtControl,
}

/// Result of enumerating one kernel-offered format at the requested
/// geometry (spec.md §3, `FormatDescription`).
#[derive(Debug, Clone, Copy)]
pub struct FormatDescription {
    pub fourcc: u32,
    pub pix_fmt: PixelFormat,
    /// `-1` if frame-interval enumeration found nothing usable.
    pub max_fps: i32,
    pub native: bool,
    pub compressed: bool,
}

fn ioctl_result(ret: libc::c_int, call: &'static str) -> Result<(), DeviceError> {
    if ret < 0 {
        Err(DeviceError::Ioctl {
            call,
            source: io::Error::last_os_error(),
        })
    } else {
        Ok(())
    }
}

/// An open capture node plus the ioctl surface spec.md §4.1 requires:
/// capability query, format enumeration/negotiation, control access,
/// buffer request/mmap bookkeeping, queue/dequeue, and streaming on/off.
pub struct DeviceHandle {
    file: File,
    path: String,
}

impl DeviceHandle {
    /// Opens the node `O_RDWR | O_NONBLOCK`, matching the upstream
    /// filter's open flags.
    pub fn open(path: &str) -> Result<Self, DeviceError> {
        let file = OpenOptions::new()
            .read(true)
            .write(true)
            .custom_flags(libc::O_NONBLOCK)
            .open(path)
            .map_err(DeviceError::Open)?;
        Ok(DeviceHandle {
            file,
            path: path.to_string(),
        })
    }

    pub fn path(&self) -> &str {
        &self.path
    }

    pub fn as_raw_fd(&self) -> RawFd {
        self.file.as_raw_fd()
    }

    /// `VIDIOC_QUERYCAP`'s `driver` field, for logging/diagnostics.
    pub fn driver_name(&self) -> Option<String> {
        let cap = self.query_cap().ok()?;
        let len = cap.driver.iter().position(|&c| c == 0).unwrap_or(16);
        Some(String::from_utf8_lossy(&cap.driver[..len]).to_string())
    }

    fn query_cap(&self) -> Result<V4l2Capability, DeviceError> {
        let mut cap: V4l2Capability = unsafe { std::mem::zeroed() };
        let ret = unsafe { libc::ioctl(self.as_raw_fd(), VIDIOC_QUERYCAP, &mut cap) };
        ioctl_result(ret, "VIDIOC_QUERYCAP")?;
        Ok(cap)
    }

    /// Queries `VIDIOC_QUERYCAP` and asserts `VIDEO_CAPTURE` + `STREAMING`,
    /// per spec.md §6's required-capability list.
    pub fn query_capability(&self) -> Result<(), DeviceError> {
        let cap = self.query_cap()?;
        let effective = if cap.capabilities & V4L2_CAP_DEVICE_CAPS != 0 {
            cap.device_caps
        } else {
            cap.capabilities
        };
        let is_capture =
            effective & (V4L2_CAP_VIDEO_CAPTURE | V4L2_CAP_VIDEO_CAPTURE_MPLANE) != 0;
        if !is_capture {
            return Err(DeviceError::NotACaptureDevice);
        }
        if effective & V4L2_CAP_STREAMING == 0 {
            return Err(DeviceError::NoStreamingSupport);
        }
        Ok(())
    }

    fn enum_fmt(&self, index: u32) -> Option<V4l2Fmtdesc> {
        let mut desc = V4l2Fmtdesc {
            index,
            type_: V4L2_BUF_TYPE_VIDEO_CAPTURE,
            flags: 0,
            description: [0; 32],
            pixelformat: 0,
            mbus_code: 0,
            reserved: [0; 3],
        };
        let ret = unsafe { libc::ioctl(self.as_raw_fd(), VIDIOC_ENUM_FMT, &mut desc) };
        if ret < 0 { None } else { Some(desc) }
    }

    /// Enumerates `max_fps` for a `(pixelformat, width, height)` triple by
    /// walking `VIDIOC_ENUM_FRAMEINTERVALS`, returning the max over
    /// discrete entries or the extremum of a stepwise/continuous entry.
    /// Returns `-1` if the kernel offers nothing (unsupported ioctl or no
    /// matching entries), matching spec.md §4.2's "unknown" sentinel.
    pub fn enum_frame_intervals(&self, pixelformat: u32, width: u32, height: u32) -> i32 {
        let mut best: Option<i32> = None;
        for index in 0..64 {
            let mut ival = V4l2Frmivalenum {
                index,
                pixel_format: pixelformat,
                width,
                height,
                type_: 0,
                union_: V4l2FrmivalUnion {
                    discrete: std::mem::ManuallyDrop::new(V4l2Fract {
                        numerator: 0,
                        denominator: 0,
                    }),
                },
                reserved: [0; 2],
            };
            let ret = unsafe { libc::ioctl(self.as_raw_fd(), VIDIOC_ENUM_FRAMEINTERVALS, &mut ival) };
            if ret < 0 {
                break;
            }
            let fps = unsafe {
                match ival.type_ {
                    V4L2_FRMIVAL_TYPE_DISCRETE => {
                        let f = &ival.union_.discrete;
                        fps_from_interval(f.numerator, f.denominator)
                    }
                    V4L2_FRMIVAL_TYPE_STEPWISE | V4L2_FRMIVAL_TYPE_CONTINUOUS => {
                        let sw = &ival.union_.stepwise;
                        // the lowest interval (min) yields the highest fps
                        fps_from_interval(sw.min.numerator, sw.min.denominator)
                    }
                    _ => None,
                }
            };
            if let Some(fps) = fps {
                best = Some(best.map_or(fps, |b: i32| b.max(fps)));
            }
        }
        best.unwrap_or(-1)
    }

    /// Enumerates kernel-offered formats, returning one [`FormatDescription`]
    /// per candidate `pix_fmt` present, enriched with `max_fps`/native/
    /// compressed flags (spec.md §4.2 "Enrichment").
    pub fn enrich_candidates(
        &self,
        candidates: &[PixelFormat],
        width: u32,
        height: u32,
    ) -> Vec<FormatDescription> {
        let mut offered = Vec::new();
        for index in 0.. {
            let Some(desc) = self.enum_fmt(index) else {
                break;
            };
            offered.push(desc);
        }
        candidates
            .iter()
            .filter_map(|&pix_fmt| {
                let fourcc = pix_fmt.fourcc()?;
                let kernel_desc = offered.iter().find(|d| d.pixelformat == fourcc)?;
                let max_fps = self.enum_frame_intervals(fourcc, width, height);
                tracing::debug!(
                    format = %fmtdesc_name(kernel_desc),
                    fourcc,
                    max_fps,
                    "enriched negotiation candidate"
                );
                Some(FormatDescription {
                    fourcc,
                    pix_fmt,
                    max_fps,
                    native: kernel_desc.flags & V4L2_FMT_FLAG_EMULATED == 0,
                    compressed: kernel_desc.flags & V4L2_FMT_FLAG_COMPRESSED != 0,
                })
            })
            .collect()
    }

    /// `TRY_FMT` followed by `S_FMT`; returns the FourCC the driver
    /// actually accepted, per spec.md §4.2 "accepted" semantics.
    pub fn try_set_format(
        &self,
        fourcc: u32,
        size: VideoSize,
    ) -> Result<(u32, VideoSize), DeviceError> {
        let mut fmt = V4l2Format::for_capture(size.width, size.height, fourcc);
        let ret = unsafe { libc::ioctl(self.as_raw_fd(), VIDIOC_TRY_FMT, &mut fmt) };
        ioctl_result(ret, "VIDIOC_TRY_FMT")?;
        if fmt.pixelformat != fourcc {
            return Ok((fmt.pixelformat, VideoSize::new(fmt.width, fmt.height)));
        }
        let mut fmt = V4l2Format::for_capture(size.width, size.height, fourcc);
        let ret = unsafe { libc::ioctl(self.as_raw_fd(), VIDIOC_S_FMT, &mut fmt) };
        ioctl_result(ret, "VIDIOC_S_FMT")?;
        Ok((fmt.pixelformat, VideoSize::new(fmt.width, fmt.height)))
    }

    /// Fresh `GET_FMT`, used post-programming to learn the driver's final
    /// geometry (spec.md §4.2 "Post-programming").
    pub fn get_format(&self) -> Result<(u32, VideoSize), DeviceError> {
        let mut fmt = V4l2Format::for_capture(0, 0, 0);
        let ret = unsafe { libc::ioctl(self.as_raw_fd(), VIDIOC_G_FMT, &mut fmt) };
        ioctl_result(ret, "VIDIOC_G_FMT")?;
        Ok((fmt.pixelformat, VideoSize::new(fmt.width, fmt.height)))
    }

    /// `VIDIOC_S_PARM` / `VIDIOC_G_PARM`, used to request a target
    /// `timeperframe`. Unsupported drivers return `Ok(false)`; this is a
    /// setup-degradable condition, never fatal (spec.md §7).
    pub fn set_frame_interval(&self, fps: u32) -> bool {
        if fps == 0 {
            return false;
        }
        let mut parm = V4l2Streamparm {
            type_: V4L2_BUF_TYPE_VIDEO_CAPTURE,
            capability: 0,
            capturemode: 0,
            timeperframe_numerator: 1,
            timeperframe_denominator: fps,
            extendedmode: 0,
            readbuffers: 0,
            reserved: [0; 176],
        };
        let ret = unsafe { libc::ioctl(self.as_raw_fd(), VIDIOC_S_PARM, &mut parm) };
        ret >= 0
    }

    pub fn get_frame_interval(&self) -> Option<u32> {
        let mut parm = V4l2Streamparm {
            type_: V4L2_BUF_TYPE_VIDEO_CAPTURE,
            capability: 0,
            capturemode: 0,
            timeperframe_numerator: 0,
            timeperframe_denominator: 0,
            extendedmode: 0,
            readbuffers: 0,
            reserved: [0; 176],
        };
        let ret = unsafe { libc::ioctl(self.as_raw_fd(), VIDIOC_G_PARM, &mut parm) };
        if ret < 0 || parm.timeperframe_numerator == 0 {
            return None;
        }
        Some(parm.timeperframe_denominator / parm.timeperframe_numerator)
    }

    /// Requests `count` MMAP-mode kernel buffers; returns the count the
    /// driver actually allocated (may be less than requested).
    pub fn request_buffers(&self, count: u32) -> Result<u32, DeviceError> {
        let mut req = V4l2RequestBuffers {
            count,
            type_: V4L2_BUF_TYPE_VIDEO_CAPTURE,
            memory: V4L2_MEMORY_MMAP,
            capabilities: 0,
            reserved: 0,
        };
        let ret = unsafe { libc::ioctl(self.as_raw_fd(), VIDIOC_REQBUFS, &mut req) };
        ioctl_result(ret, "VIDIOC_REQBUFS")?;
        Ok(req.count)
    }

    /// Returns `(mmap_offset, length)` for buffer `index`.
    pub fn query_buffer(&self, index: u32) -> Result<(u64, u32), DeviceError> {
        let mut buf = V4l2Buffer::new(index);
        let ret = unsafe { libc::ioctl(self.as_raw_fd(), VIDIOC_QUERYBUF, &mut buf) };
        ioctl_result(ret, "VIDIOC_QUERYBUF")?;
        Ok((buf.m_offset, buf.length))
    }

    pub fn queue_buffer(&self, index: u32) -> Result<(), DeviceError> {
        let mut buf = V4l2Buffer::new(index);
        let ret = unsafe { libc::ioctl(self.as_raw_fd(), VIDIOC_QBUF, &mut buf) };
        ioctl_result(ret, "VIDIOC_QBUF")
    }

    /// Dequeues a filled buffer. Returns `(index, bytesused)` on success;
    /// the raw `io::Error` on failure so callers can match `EAGAIN`/`EIO`
    /// per spec.md §4.4's drain-loop error handling.
    pub fn dequeue_buffer(&self) -> Result<(u32, u32), io::Error> {
        let mut buf = V4l2Buffer::new(0);
        let ret = unsafe { libc::ioctl(self.as_raw_fd(), VIDIOC_DQBUF, &mut buf) };
        if ret < 0 {
            return Err(io::Error::last_os_error());
        }
        Ok((buf.index, buf.bytesused))
    }

    pub fn streamon(&self) -> Result<(), DeviceError> {
        let mut type_: u32 = V4L2_BUF_TYPE_VIDEO_CAPTURE;
        let ret = unsafe { libc::ioctl(self.as_raw_fd(), VIDIOC_STREAMON, &mut type_) };
        ioctl_result(ret, "VIDIOC_STREAMON")
    }

    pub fn streamoff(&self) -> Result<(), DeviceError> {
        let mut type_: u32 = V4L2_BUF_TYPE_VIDEO_CAPTURE;
        let ret = unsafe { libc::ioctl(self.as_raw_fd(), VIDIOC_STREAMOFF, &mut type_) };
        ioctl_result(ret, "VIDIOC_STREAMOFF")
    }

    /// `VIDIOC_S_EXT_CTRLS` against the camera control class, used for
    /// the focus hints in spec.md §4.2. Queries `VIDIOC_QUERYCTRL` first
    /// and silently declines (`false`) on a disabled or absent control —
    /// a setup-degradable condition, not an error.
    pub fn set_camera_feature(&self, ctrl_id: u32, value: i32) -> bool {
        if crate::v4l2_controls::query_control(&self.path, ctrl_id)
            .map(|info| info.is_disabled())
            .unwrap_or(true)
        {
            return false;
        }
        let mut ctl = V4l2ExtControl {
            id: ctrl_id,
            size: 0,
            reserved2: [0; 1],
            value,
        };
        let mut ctls = V4l2ExtControls {
            ctrl_class: V4L2_CTRL_CLASS_CAMERA,
            count: 1,
            error_idx: 0,
            request_fd: 0,
            reserved: [0; 1],
            controls: &mut ctl,
        };
        let ret = unsafe { libc::ioctl(self.as_raw_fd(), VIDIOC_S_EXT_CTRLS, &mut ctls) };
        ret >= 0
    }

    /// `UVCIOC_CTRL_QUERY`, used by [`crate::xu`] to probe/commit the UVC
    /// H.264 extension-unit record.
    pub fn uvc_ctrl_query(
        &self,
        unit: u8,
        selector: u8,
        query: u8,
        data: &mut [u8],
    ) -> io::Result<()> {
        #[repr(C)]
        struct UvcXuControlQuery {
            unit: u8,
            selector: u8,
            query: u8,
            size: u16,
            data: *mut u8,
        }
        let mut q = UvcXuControlQuery {
            unit,
            selector,
            query,
            size: data.len() as u16,
            data: data.as_mut_ptr(),
        };
        let ret = unsafe { libc::ioctl(self.as_raw_fd(), UVCIOC_CTRL_QUERY, &mut q) };
        if ret < 0 {
            Err(io::Error::last_os_error())
        } else {
            Ok(())
        }
    }
}

fn fps_from_interval(numerator: u32, denominator: u32) -> Option<i32> {
    if numerator == 0 {
        return None;
    }
    Some((denominator / numerator) as i32)
}

fn fmtdesc_name(desc: &V4l2Fmtdesc) -> String {
    let len = desc.description.iter().position(|&c| c == 0).unwrap_or(32);
    String::from_utf8_lossy(&desc.description[..len]).to_string()
}

/// Probes `/dev/video0`..`/dev/video9`, keeping nodes whose capabilities
/// include `VIDEO_CAPTURE` (or the multiplanar variant) while excluding
/// `VIDEO_OUTPUT`, using `device_caps` when the driver supports the
/// per-device split (spec.md §6 "Device discovery").
pub fn discover_capture_devices() -> Vec<String> {
    let mut found = Vec::new();
    for index in 0..10 {
        let path = format!("/dev/video{index}");
        let Ok(handle) = DeviceHandle::open(&path) else {
            continue;
        };
        let Ok(cap) = handle.query_cap() else {
            continue;
        };
        let effective = if cap.capabilities & V4L2_CAP_DEVICE_CAPS != 0 {
            cap.device_caps
        } else {
            cap.capabilities
        };
        let is_capture =
            effective & (V4L2_CAP_VIDEO_CAPTURE | V4L2_CAP_VIDEO_CAPTURE_MPLANE) != 0;
        let is_output = effective & V4L2_CAP_VIDEO_OUTPUT != 0;
        if is_capture && !is_output {
            found.push(path);
        }
    }
    found
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn fps_from_interval_computes_reciprocal() {
        assert_eq!(fps_from_interval(1, 30), Some(30));
        assert_eq!(fps_from_interval(1, 25), Some(25));
        assert_eq!(fps_from_interval(0, 30), None);
    }

    #[test]
    fn fmtdesc_name_stops_at_nul() {
        let mut description = [0u8; 32];
        description[..5].copy_from_slice(b"YUYV\0");
        let desc = V4l2Fmtdesc {
            index: 0,
            type_: V4L2_BUF_TYPE_VIDEO_CAPTURE,
            flags: 0,
            description,
            pixelformat: 0,
            mbus_code: 0,
            reserved: [0; 3],
        };
        assert_eq!(fmtdesc_name(&desc), "YUYV");
    }

    #[test]
    fn v4l2_buffer_layout_matches_kernel_size() {
        assert_eq!(std::mem::size_of::<V4l2Buffer>(), 88);
    }

    #[test]
    fn v4l2_format_layout_matches_kernel_size() {
        assert_eq!(std::mem::size_of::<V4l2Format>(), 204);
    }
}
