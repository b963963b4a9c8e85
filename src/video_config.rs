// SPDX-License-Identifier: GPL-3.0-only

//! Encoder bitrate ladder exposed to external bitrate controllers.

use crate::size::VideoSize;
use serde::{Deserialize, Serialize};

/// One rung of the bitrate ladder: the bitrate external controllers get
/// to pick when they select this rung, the ceiling they shouldn't exceed
/// while on it, the size/fps to run the capture pipeline at, and the
/// minimum CPU count the rung is considered viable on.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct VideoConfiguration {
    pub required_bitrate: u32,
    pub bitrate_limit: u32,
    pub size: VideoSize,
    pub fps: u32,
    pub min_cpu_count: u32,
}

const fn rung(
    required_bitrate: u32,
    bitrate_limit: u32,
    size: VideoSize,
    fps: u32,
    min_cpu_count: u32,
) -> VideoConfiguration {
    VideoConfiguration {
        required_bitrate,
        bitrate_limit,
        size,
        fps,
        min_cpu_count,
    }
}

const UXGA: VideoSize = VideoSize::new(1600, 1200);
const SXGA_MINUS: VideoSize = VideoSize::new(1280, 960);
const HD720: VideoSize = VideoSize::new(1280, 720);
const XGA: VideoSize = VideoSize::new(1024, 768);
const SVGA: VideoSize = VideoSize::new(800, 600);
const VGA: VideoSize = VideoSize::new(640, 480);
const CIF: VideoSize = VideoSize::new(352, 288);
const QVGA: VideoSize = VideoSize::new(320, 240);
const QCIF: VideoSize = VideoSize::new(176, 144);

/// The 13-rung bitrate ladder, descending from 2048 kbps/UXGA/25fps down
/// to `{0, QCIF, 5}` (spec.md §6): the terminal rung's `required_bitrate`
/// is 0, so `for_bitrate` always has a rung to fall back to regardless of
/// how little bitrate is available. Consumers select by available
/// bitrate; see `VideoConfiguration::for_bitrate`.
pub const BITRATE_LADDER: &[VideoConfiguration] = &[
    rung(2_048_000, 2_560_000, UXGA, 25, 4),
    rung(1_024_000, 1_280_000, SXGA_MINUS, 25, 4),
    rung(1_024_000, 1_280_000, HD720, 25, 4),
    rung(768_000, 960_000, XGA, 25, 2),
    rung(512_000, 640_000, SVGA, 25, 2),
    rung(384_000, 480_000, VGA, 30, 2),
    rung(256_000, 320_000, VGA, 25, 1),
    rung(170_000, 212_000, VGA, 15, 1),
    rung(128_000, 160_000, CIF, 18, 1),
    rung(96_000, 120_000, QVGA, 15, 1),
    rung(80_000, 100_000, QVGA, 10, 1),
    rung(64_000, 80_000, QCIF, 12, 1),
    rung(0, 80_000, QCIF, 5, 1),
];

impl VideoConfiguration {
    /// The highest ladder rung whose `required_bitrate` does not exceed
    /// `available_bitrate_bps`, or the lowest rung if none qualify.
    pub fn for_bitrate(available_bitrate_bps: u32) -> VideoConfiguration {
        BITRATE_LADDER
            .iter()
            .copied()
            .find(|rung| rung.required_bitrate <= available_bitrate_bps)
            .unwrap_or(*BITRATE_LADDER.last().expect("ladder is non-empty"))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn ladder_has_thirteen_rungs() {
        assert_eq!(BITRATE_LADDER.len(), 13);
    }

    #[test]
    fn ladder_is_non_increasing_in_required_bitrate() {
        for pair in BITRATE_LADDER.windows(2) {
            assert!(pair[0].required_bitrate >= pair[1].required_bitrate);
        }
    }

    #[test]
    fn high_availability_selects_top_rung() {
        let chosen = VideoConfiguration::for_bitrate(10_000_000);
        assert_eq!(chosen, BITRATE_LADDER[0]);
    }

    #[test]
    fn zero_availability_selects_bottom_rung() {
        let chosen = VideoConfiguration::for_bitrate(0);
        assert_eq!(chosen, *BITRATE_LADDER.last().unwrap());
    }
}
