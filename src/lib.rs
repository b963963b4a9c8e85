// SPDX-License-Identifier: GPL-3.0-only

//! V4L2 video-capture source filter
//!
//! Acquires frames from a Linux V4L2 capture device, negotiates a
//! compatible pixel format and resolution, manages the kernel-shared
//! mmap buffer pool, and delivers frames into a real-time media graph.
//! Cameras exposing the UVC H.264 extension are additionally parsed
//! into NAL units for RTP transport.
//!
//! # Architecture
//!
//! - [`device`]: raw ioctl wrappers over an open capture node.
//! - [`negotiator`]: format/resolution negotiation.
//! - [`xu`]: the UVC H.264 vendor extension unit.
//! - [`buffer_pool`]: the mmap'd kernel buffer pool and its drain loop.
//! - [`worker`]: the background producer thread.
//! - [`presentation`]: the graph-tick-driven consumer step.
//! - [`framer`]: H.264 Annex-B NAL-unit splitting.
//! - [`capture_source`]: the public, per-device [`capture_source::CaptureState`]
//!   tying the above together behind a Configuration API.
//! - [`capture_config`]: the explicit configuration value the core accepts.
//! - [`discovery`]: capture-node and focus-actuator enumeration helpers.
//! - [`v4l2_controls`]: generic V4L2 user-control query/get/set helpers.
//! - [`loop_controller`]: background-thread lifecycle management.
//! - [`pixel_format`], [`size`], [`video_config`]: the core data model.
//! - [`error`]: this crate's error taxonomy.

pub mod buffer_pool;
pub mod capture_config;
pub mod capture_source;
pub mod device;
pub mod discovery;
pub mod error;
pub mod framer;
pub mod loop_controller;
pub mod negotiator;
pub mod pixel_format;
pub mod presentation;
pub mod size;
pub mod v4l2_controls;
pub mod video_config;
pub mod worker;
pub mod xu;

pub use capture_config::{CaptureConfig, FocusHint, Orientation};
pub use capture_source::CaptureState;
pub use error::{CaptureError, DeviceError, NegotiationError};
pub use pixel_format::PixelFormat;
pub use presentation::{Delivery, RtpPacketizer, YuvRotator};
pub use size::VideoSize;
pub use video_config::VideoConfiguration;
