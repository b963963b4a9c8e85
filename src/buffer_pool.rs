// SPDX-License-Identifier: GPL-3.0-only

//! The mmap'd kernel buffer pool and its drain loop (spec.md §4.4).
//!
//! Per REDESIGN FLAGS' "linked-list reference-counted frames" note, this
//! does not replicate a manual `db_ref` counter on a linked buffer chain.
//! Each [`FrameSlot`]'s mmap region is owned by the [`BufferPool`]; a
//! downstream consumer instead receives a [`CapturedFrame`] — an
//! `Arc`-backed view whose `Drop` returns the slot to "no downstream
//! holder" status. `Arc::strong_count(..) == 1` (pool's own bookkeeping
//! copy, no outstanding share) stands in for the original's "`db_ref==1`"
//! QBUF-eligibility check.

use crate::device::DeviceHandle;
use crate::error::CaptureError;
use std::io;
use std::sync::Arc;
use std::time::{Duration, Instant};
use tracing::{debug, warn};

const BUFFER_COUNT: u32 = 4;
/// Empty-frame driver quirk: frames this small or smaller are dropped.
const MIN_VALID_BYTESUSED: u32 = 30;
const DQBUF_EAGAIN_SLEEP: Duration = Duration::from_millis(20);
const IDLE_SLEEP: Duration = Duration::from_millis(100);
const TEARDOWN_DRAIN_BUDGET: Duration = Duration::from_secs(5);

struct MmapRegion {
    ptr: *mut libc::c_void,
    len: usize,
}

unsafe impl Send for MmapRegion {}

impl Drop for MmapRegion {
    fn drop(&mut self) {
        unsafe {
            libc::munmap(self.ptr, self.len);
        }
    }
}

/// The payload behind a [`CapturedFrame`]: either a shared view into a
/// kernel mmap region, or owned bytes (produced by e.g. the rotation
/// path in [`crate::presentation`], which cannot write back into a
/// kernel-owned slot).
enum FrameData {
    Mmap { region: Arc<MmapRegion>, len: usize },
    Owned(Vec<u8>),
}

impl FrameData {
    pub fn as_slice(&self) -> &[u8] {
        match self {
            FrameData::Mmap { region, len } => unsafe {
                std::slice::from_raw_parts(region.ptr as *const u8, *len)
            },
            FrameData::Owned(bytes) => bytes,
        }
    }
}

/// A downstream-visible handle to one captured frame. Cloning shares the
/// underlying storage; the last clone's drop (of a kernel-backed frame)
/// makes the originating slot QBUF-eligible again.
#[derive(Clone)]
pub struct CapturedFrame {
    pub index: u32,
    pub marker: bool,
    pub timestamp_90khz: u32,
    data: Arc<FrameData>,
    release: Option<Arc<SlotReleaseToken>>,
}

impl CapturedFrame {
    /// Builds a standalone frame backed by owned bytes, with no kernel
    /// slot to release. Useful for feeding synthetic frames into the
    /// presentation step or a packetiser outside of a live capture
    /// session (e.g. test harnesses).
    pub fn synthetic(bytes: Vec<u8>) -> CapturedFrame {
        CapturedFrame {
            index: 0,
            marker: false,
            timestamp_90khz: 0,
            data: Arc::new(FrameData::Owned(bytes)),
            release: None,
        }
    }

    pub fn bytes(&self) -> &[u8] {
        self.data.as_slice()
    }

    /// Returns a copy of this frame with its bytes replaced by an owned
    /// buffer (e.g. the result of rotation). The replacement no longer
    /// holds a slot-release token since it's not kernel-backed.
    pub fn with_owned_bytes(&self, bytes: Vec<u8>) -> CapturedFrame {
        CapturedFrame {
            index: self.index,
            marker: self.marker,
            timestamp_90khz: self.timestamp_90khz,
            data: Arc::new(FrameData::Owned(bytes)),
            release: self.release.clone(),
        }
    }
}

/// Dropped alongside the last `CapturedFrame` clone; flips the slot's
/// "has downstream holder" bit back off.
struct SlotReleaseToken {
    slot_index: usize,
    holder_flag: Arc<std::sync::atomic::AtomicBool>,
}

impl Drop for SlotReleaseToken {
    fn drop(&mut self) {
        self.holder_flag.store(false, std::sync::atomic::Ordering::SeqCst);
        debug!(slot = self.slot_index, "frame handle released, slot free");
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SlotState {
    WithKernel,
    FilledLocal,
    FreeLocal,
}

struct FrameSlot {
    state: SlotState,
    region: Arc<MmapRegion>,
    has_downstream_holder: Arc<std::sync::atomic::AtomicBool>,
}

/// Owns the pool of kernel-mmap'd buffers and drives the per-tick drain
/// loop described in spec.md §4.4.
pub struct BufferPool {
    slots: Vec<FrameSlot>,
    queued_count: usize,
    picture_size: usize,
}

impl BufferPool {
    /// Requests `BUFFER_COUNT` MMAP buffers, maps each, enqueues all to
    /// the kernel, and issues `STREAMON` — the full setup sequence from
    /// spec.md §4.4 "At setup".
    pub fn setup(device: &DeviceHandle, picture_size: usize) -> Result<Self, CaptureError> {
        let count = device.request_buffers(BUFFER_COUNT)?;
        let mut slots = Vec::with_capacity(count as usize);

        for index in 0..count {
            let (offset, length) = device.query_buffer(index)?;
            let ptr = unsafe {
                libc::mmap(
                    std::ptr::null_mut(),
                    length as usize,
                    libc::PROT_READ | libc::PROT_WRITE,
                    libc::MAP_SHARED,
                    device.as_raw_fd(),
                    offset as libc::off_t,
                )
            };
            if ptr == libc::MAP_FAILED {
                return Err(CaptureError::Device(crate::error::DeviceError::Ioctl {
                    call: "mmap",
                    source: io::Error::last_os_error(),
                }));
            }
            slots.push(FrameSlot {
                state: SlotState::FreeLocal,
                region: Arc::new(MmapRegion {
                    ptr,
                    len: length as usize,
                }),
                has_downstream_holder: Arc::new(std::sync::atomic::AtomicBool::new(false)),
            });
        }

        let mut pool = BufferPool {
            slots,
            queued_count: 0,
            picture_size,
        };

        for index in 0..pool.slots.len() {
            device.queue_buffer(index as u32)?;
            pool.slots[index].state = SlotState::WithKernel;
            pool.queued_count += 1;
        }

        device.streamon()?;
        Ok(pool)
    }

    pub fn queued_count(&self) -> usize {
        self.queued_count
    }

    fn slot_is_eligible_for_qbuf(&self, index: usize) -> bool {
        let slot = &self.slots[index];
        slot.state == SlotState::FreeLocal
            && !slot.has_downstream_holder.load(std::sync::atomic::Ordering::SeqCst)
    }

    /// One drain-loop iteration: QBUF every eligible free slot, then poll
    /// and DQBUF if anything is `WithKernel`, else sleep to avoid a hot
    /// spin (spec.md §4.4 "Drain loop").
    pub fn drain_tick(
        &mut self,
        device: &DeviceHandle,
        poll_timeout_ms: i32,
    ) -> Result<Option<CapturedFrame>, CaptureError> {
        let mut any_queued = false;
        for index in 0..self.slots.len() {
            if self.slot_is_eligible_for_qbuf(index) {
                device.queue_buffer(index as u32)?;
                self.slots[index].state = SlotState::WithKernel;
                self.queued_count += 1;
                any_queued = true;
            }
        }

        let any_with_kernel = self.slots.iter().any(|s| s.state == SlotState::WithKernel);
        if !any_with_kernel {
            if !any_queued {
                std::thread::sleep(IDLE_SLEEP);
            }
            return Ok(None);
        }

        let mut pollfd = libc::pollfd {
            fd: device.as_raw_fd(),
            events: libc::POLLIN,
            revents: 0,
        };
        let ready = unsafe { libc::poll(&mut pollfd, 1, poll_timeout_ms) };
        if ready <= 0 {
            return Ok(None);
        }

        match device.dequeue_buffer() {
            Ok((index, bytesused)) => self.on_dequeued(index, bytesused),
            Err(e) => {
                match e.raw_os_error() {
                    Some(libc::EAGAIN) => {
                        warn!("DQBUF returned EAGAIN after a readable poll; driver quirk");
                        std::thread::sleep(DQBUF_EAGAIN_SLEEP);
                    }
                    Some(libc::EIO) => {
                        // Ignored per spec.
                    }
                    _ => warn!(error = %e, "DQBUF failed"),
                }
                Ok(None)
            }
        }
    }

    fn on_dequeued(&mut self, index: u32, bytesused: u32) -> Result<Option<CapturedFrame>, CaptureError> {
        let slot_index = index as usize;
        if slot_index >= self.slots.len() {
            return Err(CaptureError::BufferIndexOutOfRange(index));
        }

        self.slots[slot_index].state = SlotState::FilledLocal;
        self.queued_count = self.queued_count.saturating_sub(1);

        if bytesused <= MIN_VALID_BYTESUSED {
            debug!(index, bytesused, "dropping empty-frame quirk buffer");
            self.slots[slot_index].state = SlotState::FreeLocal;
            return Ok(None);
        }

        let len = if self.picture_size != 0 {
            self.picture_size
        } else {
            bytesused as usize
        };

        let holder_flag = Arc::new(std::sync::atomic::AtomicBool::new(true));
        self.slots[slot_index].has_downstream_holder = Arc::clone(&holder_flag);
        self.slots[slot_index].state = SlotState::FreeLocal;

        let frame = CapturedFrame {
            index,
            marker: false,
            timestamp_90khz: 0,
            data: Arc::new(FrameData::Mmap {
                region: Arc::clone(&self.slots[slot_index].region),
                len,
            }),
            release: Some(Arc::new(SlotReleaseToken {
                slot_index,
                holder_flag,
            })),
        };
        Ok(Some(frame))
    }

    /// `STREAMOFF`, bounded drain of outstanding `WithKernel` slots,
    /// munmap of every region (spec.md §4.4 "Teardown").
    pub fn teardown(&mut self, device: &DeviceHandle) {
        if let Err(e) = device.streamoff() {
            warn!(error = %e, "STREAMOFF failed during teardown");
        }

        let deadline = Instant::now() + TEARDOWN_DRAIN_BUDGET;
        while self.slots.iter().any(|s| s.state == SlotState::WithKernel) && Instant::now() < deadline {
            match device.dequeue_buffer() {
                Ok((index, _)) => {
                    if let Some(slot) = self.slots.get_mut(index as usize) {
                        slot.state = SlotState::FreeLocal;
                    }
                }
                Err(_) => std::thread::sleep(Duration::from_millis(10)),
            }
        }
        // Dropping `self.slots` drops each `Arc<MmapRegion>`; the region
        // unmaps once the pool's own copy and any lingering downstream
        // `CapturedFrame` both release it.
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn release_token_flips_holder_flag_on_drop() {
        let holder_flag = Arc::new(std::sync::atomic::AtomicBool::new(true));
        let token = SlotReleaseToken {
            slot_index: 0,
            holder_flag: Arc::clone(&holder_flag),
        };
        assert!(holder_flag.load(std::sync::atomic::Ordering::SeqCst));
        drop(token);
        assert!(!holder_flag.load(std::sync::atomic::Ordering::SeqCst));
    }

    #[test]
    fn captured_frame_clone_shares_bytes() {
        let region = Arc::new(MmapRegion {
            ptr: unsafe {
                libc::mmap(
                    std::ptr::null_mut(),
                    4096,
                    libc::PROT_READ | libc::PROT_WRITE,
                    libc::MAP_SHARED | libc::MAP_ANONYMOUS,
                    -1,
                    0,
                )
            },
            len: 4096,
        });
        let data = Arc::new(FrameData::Mmap {
            region: Arc::clone(&region),
            len: 128,
        });
        let holder_flag = Arc::new(std::sync::atomic::AtomicBool::new(true));
        let frame = CapturedFrame {
            index: 0,
            marker: false,
            timestamp_90khz: 0,
            data: Arc::clone(&data),
            release: Some(Arc::new(SlotReleaseToken {
                slot_index: 0,
                holder_flag: Arc::clone(&holder_flag),
            })),
        };
        let clone = frame.clone();
        assert_eq!(frame.bytes().len(), clone.bytes().len());
        assert!(holder_flag.load(std::sync::atomic::Ordering::SeqCst));
        drop(frame);
        assert!(holder_flag.load(std::sync::atomic::Ordering::SeqCst), "clone still holds a reference");
        drop(clone);
        assert!(!holder_flag.load(std::sync::atomic::Ordering::SeqCst));
    }
}
