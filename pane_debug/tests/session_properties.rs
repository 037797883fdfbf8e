// Copyright 2026 the Pane Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! End-to-end protocol properties of a session driven by a scripted
//! compositor.

use pane_core::pixels::{Argb, Pattern};
use pane_core::session::SessionDriver;
use pane_core::trace::TraceSink;
use pane_core::{Serial, SurfaceSize};
use pane_debug::conformance::{self, Violation};
use pane_debug::memory::MemoryRenderer;
use pane_debug::recorder::{RecordedEvent, RecorderSink, decode};
use pane_debug::wire::{Event, ReleasePolicy, Request, ScriptedCompositor, WireEntry};

fn size(w: u32, h: u32) -> SurfaceSize {
    SurfaceSize::new(w, h).unwrap()
}

fn compositor() -> ScriptedCompositor<MemoryRenderer> {
    compositor_with(SessionDriver::new(
        SurfaceSize::DEFAULT,
        Box::new(|size| MemoryRenderer::new(size, Pattern::Solid(Argb::RED))),
    ))
}

fn compositor_with<T: TraceSink>(
    driver: SessionDriver<MemoryRenderer, T>,
) -> ScriptedCompositor<MemoryRenderer, T> {
    let mut wl = ScriptedCompositor::new(driver);
    wl.start().unwrap();
    wl
}

fn position(entries: &[WireEntry], wanted: WireEntry) -> usize {
    entries
        .iter()
        .position(|e| *e == wanted)
        .unwrap_or_else(|| panic!("{wanted:?} not in log"))
}

#[test]
fn first_frame_is_attached_and_committed_after_the_ack() {
    let mut wl = compositor();
    let serial = wl.configure(0, 0).unwrap();

    let entries = wl.log().entries();
    let ack = position(entries, WireEntry::Request(Request::AckConfigure(serial)));
    let tail: Vec<_> = entries[ack + 1..].iter().collect();
    assert!(
        matches!(
            tail.as_slice(),
            [
                WireEntry::Request(Request::Frame { .. }),
                WireEntry::Request(Request::Attach(Some(_))),
                WireEntry::Request(Request::Damage(_)),
                WireEntry::Request(Request::Commit),
            ]
        ),
        "got {tail:?}"
    );
    assert_eq!(wl.log().attach_count(), 1);
    assert_eq!(conformance::check(wl.log()), Ok(()));
}

#[test]
fn ack_always_carries_the_latest_configure_serial() {
    let mut wl = compositor();
    let mut serials = Vec::new();
    for (w, h) in [(0, 0), (800, 600), (800, 600), (0, 0), (1024, 700)] {
        serials.push(wl.configure(w, h).unwrap());
        wl.refresh(16);
    }
    let acks: Vec<Serial> = wl
        .log()
        .requests()
        .filter_map(|r| match r {
            Request::AckConfigure(s) => Some(*s),
            _ => None,
        })
        .collect();
    assert_eq!(acks, serials);
    assert_eq!(conformance::check(wl.log()), Ok(()));
}

#[test]
fn pings_are_answered_immediately_in_every_phase() {
    let driver = SessionDriver::new(
        SurfaceSize::DEFAULT,
        Box::new(|size| MemoryRenderer::new(size, Pattern::default())),
    );
    let mut wl = ScriptedCompositor::new(driver);
    let early = wl.ping();
    wl.start().unwrap();
    let waiting = wl.ping();
    wl.configure(0, 0).unwrap();
    let configured = wl.ping();
    wl.close();
    let closing = wl.ping();

    let entries = wl.log().entries();
    for serial in [early, waiting, configured, closing] {
        let at = position(entries, WireEntry::Event(Event::Ping(serial)));
        assert_eq!(
            entries[at + 1],
            WireEntry::Request(Request::Pong(serial)),
            "pong for {serial:?}"
        );
    }
    assert_eq!(conformance::check(wl.log()), Ok(()));
}

#[test]
fn resize_reaches_the_renderer_before_the_next_frame() {
    let mut wl = compositor();
    wl.configure(0, 0).unwrap();
    wl.configure(300, 200).unwrap();

    let renderer = wl.driver().renderer().unwrap();
    assert_eq!(renderer.resizes(), &[size(300, 200)]);
    assert_eq!(wl.log().attach_count(), 1, "frame still outstanding");

    wl.refresh(16);
    let last_attach = wl
        .log()
        .requests()
        .filter_map(|r| match r {
            Request::Attach(Some(b)) => Some(b.size),
            _ => None,
        })
        .last();
    assert_eq!(last_attach, Some(size(300, 200)));
    assert_eq!(wl.driver().renderer().unwrap().front().len(), 300 * 200 * 4);
    assert_eq!(conformance::check(wl.log()), Ok(()));
}

#[test]
fn zero_dimensions_never_resize() {
    let mut wl = compositor();
    wl.configure(0, 0).unwrap();
    wl.configure(0, 300).unwrap();
    wl.configure(300, 0).unwrap();
    wl.configure(-5, 10).unwrap();
    wl.refresh(16);

    let renderer = wl.driver().renderer().unwrap();
    assert!(renderer.resizes().is_empty(), "{:?}", renderer.resizes());
    assert_eq!(renderer.size(), SurfaceSize::DEFAULT);
    assert_eq!(conformance::check(wl.log()), Ok(()));
}

#[test]
fn close_stops_drawing() {
    let mut wl = compositor();
    wl.configure(0, 0).unwrap();
    wl.refresh(16);
    wl.refresh(16);
    let before = wl.log().attach_count();

    wl.close();
    assert!(!wl.driver().is_running(), "close clears the running flag");
    wl.refresh(16);
    wl.refresh(16);

    assert!(wl.log().attach_count() <= before + 1, "at most one in-flight frame");
    assert_eq!(wl.pending_frames(), 0, "no new frame requests");
    let close = position(wl.log().entries(), WireEntry::Event(Event::Close));
    assert!(
        wl.log().entries()[close + 1..]
            .iter()
            .all(|e| !matches!(e, WireEntry::Request(Request::Frame { .. }))),
        "no frame callbacks after close"
    );
    assert_eq!(conformance::check(wl.log()), Ok(()));
}

#[test]
fn frames_are_only_drawn_on_frame_done() {
    let mut wl = compositor();
    wl.configure(0, 0).unwrap();
    for _ in 0..5 {
        wl.ping();
        wl.configure(0, 0).unwrap();
    }
    assert_eq!(wl.log().attach_count(), 1, "no busy redraw");
    for expected in 2..=6 {
        assert_eq!(wl.refresh(16), 1);
        assert_eq!(wl.log().attach_count(), expected);
    }
    assert_eq!(conformance::check(wl.log()), Ok(()));
}

#[test]
fn failed_presents_keep_the_loop_alive() {
    let mut wl = compositor_with(SessionDriver::new(
        SurfaceSize::DEFAULT,
        Box::new(|size| {
            MemoryRenderer::new(size, Pattern::default()).map(|r| r.failing_every(2))
        }),
    ));
    wl.configure(0, 0).unwrap();
    for _ in 0..6 {
        assert_eq!(wl.refresh(16), 1, "a frame callback is always outstanding");
    }
    assert_eq!(wl.driver().frames_drawn(), 7);
    assert_eq!(wl.log().attach_count(), 4);
    assert_eq!(conformance::check(wl.log()), Ok(()));
}

fn attached_ids(wl: &ScriptedCompositor<MemoryRenderer>) -> Vec<u32> {
    wl.log()
        .requests()
        .filter_map(|r| match r {
            Request::Attach(Some(b)) => Some(b.id),
            _ => None,
        })
        .collect()
}

#[test]
fn held_buffers_wait_for_their_release() {
    let mut wl = compositor().with_release_policy(ReleasePolicy::Manual);
    wl.configure(0, 0).unwrap();
    assert_eq!(wl.refresh(16), 1);
    assert_eq!(wl.held_buffers(), &[1, 2]);

    // Both buffers are held: frames are skipped but still committed, so a
    // frame callback stays outstanding.
    for _ in 0..3 {
        let before = wl.log().entries().len();
        assert_eq!(wl.refresh(16), 1);
        let frame: Vec<_> = wl.log().entries()[before..].iter().collect();
        assert!(
            matches!(
                frame.as_slice(),
                [
                    WireEntry::Event(Event::FrameDone { .. }),
                    WireEntry::Request(Request::Frame { .. }),
                    WireEntry::Request(Request::Commit),
                ]
            ),
            "got {frame:?}"
        );
    }
    assert_eq!(attached_ids(&wl), [1, 2]);
    assert_eq!(wl.driver().frames_drawn(), 5, "skipped frames still count");

    assert!(wl.release(1));
    wl.refresh(16);
    assert_eq!(attached_ids(&wl), [1, 2, 1]);
    assert_eq!(wl.pending_frames(), 1);
    assert_eq!(conformance::check(wl.log()), Ok(()));
}

#[test]
fn default_compositor_releases_replaced_buffers() {
    let mut wl = compositor();
    wl.configure(0, 0).unwrap();
    for _ in 0..4 {
        wl.refresh(16);
    }
    assert_eq!(attached_ids(&wl), [1, 2, 1, 2, 1]);
    assert_eq!(wl.held_buffers(), &[1]);
    assert_eq!(conformance::check(wl.log()), Ok(()));
}

#[test]
fn conformance_catches_a_broken_log() {
    let mut wl = compositor();
    wl.configure(0, 0).unwrap();
    let (_, mut log) = wl.into_parts();
    log.push(WireEntry::Event(Event::SurfaceConfigure(Serial(99))));
    log.push(WireEntry::Request(Request::AckConfigure(Serial(98))));
    assert!(
        matches!(
            conformance::check(&log),
            Err(Violation::AckSerialMismatch { got: Serial(98), .. })
        ),
        "{:?}",
        conformance::check(&log)
    );
}

#[test]
fn recorded_trace_matches_the_session() {
    let mut wl = compositor_with(SessionDriver::with_sink(
        SurfaceSize::DEFAULT,
        Box::new(|size| MemoryRenderer::new(size, Pattern::default())),
        RecorderSink::new(),
    ));
    wl.configure(0, 0).unwrap();
    wl.refresh(16);
    wl.ping();
    wl.close();

    let (driver, _) = wl.into_parts();
    let events: Vec<_> = decode(&driver.into_sink().into_bytes()).collect();
    let names: Vec<&str> = events
        .iter()
        .map(|e| match e {
            RecordedEvent::Ping(_) => "ping",
            RecordedEvent::Configure(_) => "configure",
            RecordedEvent::FrameDone(_) => "frame-done",
            RecordedEvent::Present(_) => "present",
            RecordedEvent::Close(_) => "close",
        })
        .collect();
    assert_eq!(
        names,
        ["configure", "present", "frame-done", "present", "ping", "close"]
    );
}
