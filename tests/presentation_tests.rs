// SPDX-License-Identifier: GPL-3.0-only

//! Integration tests for shared-queue delivery semantics and the H.264
//! Annex-B framer, covering spec.md §8 scenarios S4-S6.

use v4l2_source_filter::buffer_pool::CapturedFrame;
use v4l2_source_filter::framer::split_nal_units;
use v4l2_source_filter::presentation::SharedQueue;

#[test]
fn s4_newest_wins_delivers_only_the_last_of_three() {
    let queue = SharedQueue::new();
    queue.push(CapturedFrame::synthetic(vec![1]));
    queue.push(CapturedFrame::synthetic(vec![2]));
    queue.push(CapturedFrame::synthetic(vec![3]));

    let delivered = queue.drain_newest().expect("one frame delivered");
    assert_eq!(delivered.bytes(), &[3]);
    assert!(queue.drain_newest().is_none(), "queue should be empty after drain");
}

#[test]
fn s5_h264_fifo_delivers_three_access_units_in_order() {
    let queue = SharedQueue::new();
    queue.push(CapturedFrame::synthetic(vec![0xAA]));
    queue.push(CapturedFrame::synthetic(vec![0xBB]));
    queue.push(CapturedFrame::synthetic(vec![0xCC]));

    let first = queue.pop_front().unwrap();
    let second = queue.pop_front().unwrap();
    let third = queue.pop_front().unwrap();
    assert_eq!(first.bytes(), &[0xAA]);
    assert_eq!(second.bytes(), &[0xBB]);
    assert_eq!(third.bytes(), &[0xCC]);
    assert!(queue.pop_front().is_none());
}

#[test]
fn s6_annex_b_framer_splits_three_nal_units() {
    let buf = [
        0x00, 0x00, 0x00, 0x01, 0x67, 0xaa, 0x00, 0x00, 0x01, 0x68, 0xbb, 0x00, 0x00, 0x00, 0x01,
        0x65, 0xcc,
    ];
    let nals = split_nal_units(&buf);
    assert_eq!(nals, vec![&[0x67u8, 0xaa][..], &[0x68u8, 0xbb][..], &[0x65u8, 0xcc][..]]);
}
