// SPDX-License-Identifier: GPL-3.0-only

//! Integration tests for the bitrate ladder and geometry degradation chain.

use v4l2_source_filter::size::VideoSize;
use v4l2_source_filter::video_config::VideoConfiguration;

#[test]
fn degradation_chain_from_1920x1080_passes_through_640x480() {
    // S2: requested 1920x1080, kernel only supports 640x480 -> the
    // negotiator's degradation chain must reach it in finitely many steps.
    let mut size = VideoSize::new(1920, 1080);
    let mut reached = false;
    for _ in 0..10 {
        if size == VideoSize::new(640, 480) {
            reached = true;
            break;
        }
        size = size.next_lower();
    }
    assert!(reached, "degradation chain never reaches 640x480");
}

#[test]
fn picture_size_at_640x480_yuv420p_matches_s2() {
    use v4l2_source_filter::PixelFormat;
    let picture_size = PixelFormat::Yuv420P.bytes_for(640, 480).unwrap();
    assert_eq!(picture_size, 640 * 480 * 3 / 2);
}

#[test]
fn every_ladder_rung_has_a_valid_size_and_bitrate_ceiling() {
    for rung in v4l2_source_filter::video_config::BITRATE_LADDER {
        assert!(rung.bitrate_limit >= rung.required_bitrate);
        assert!(!rung.size.is_none());
        assert!(rung.fps > 0);
    }
}

#[test]
fn terminal_rung_has_zero_required_bitrate() {
    // spec.md §6: the ladder runs "down to {0, QCIF, 5}".
    let terminal = v4l2_source_filter::video_config::BITRATE_LADDER.last().unwrap();
    assert_eq!(terminal.required_bitrate, 0);
    assert_eq!(terminal.size, VideoSize::new(176, 144));
    assert_eq!(terminal.fps, 5);
}

#[test]
fn for_bitrate_is_monotonic_in_its_argument() {
    let low = VideoConfiguration::for_bitrate(100_000);
    let high = VideoConfiguration::for_bitrate(5_000_000);
    assert!(high.required_bitrate >= low.required_bitrate);
}
