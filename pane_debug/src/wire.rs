// Copyright 2026 the Pane Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! A scripted compositor and a request-recording surface.
//!
//! [`ScriptedCompositor`] plays the server side of a session: it issues
//! serials, delivers events to a [`SessionDriver`] and fires frame tokens
//! when told a refresh happened. Everything crossing the "wire" in either
//! direction is appended to one [`WireLog`], in order, so
//! [`conformance::check`](crate::conformance::check) can audit it.
//!
//! ```text
//!   ScriptedCompositor ──Event──▶ SessionDriver ──Request──▶ RecordingSurface
//!            │                                                    │
//!            └──────────────────────▶ WireLog ◀──────────────────┘
//! ```

use pane_core::backend::Renderer;
use pane_core::frame::FrameToken;
use pane_core::session::{SessionDriver, SessionError};
use pane_core::surface::{DamageRect, SurfaceOps};
use pane_core::trace::{NoopSink, TraceSink};
use pane_core::{Serial, SurfaceSize};

/// A buffer as seen on the wire.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct BufferInfo {
    /// Buffer identity, stable across re-attaches.
    pub id: u32,
    /// Buffer dimensions.
    pub size: SurfaceSize,
}

/// Server-to-client messages.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Event {
    /// Liveness probe.
    Ping(Serial),
    /// Suggested toplevel size (0 means "client decides").
    ToplevelConfigure {
        /// Suggested width.
        width: i32,
        /// Suggested height.
        height: i32,
    },
    /// End of a configure sequence.
    SurfaceConfigure(Serial),
    /// A frame callback fired.
    FrameDone {
        /// Token that fired.
        token_id: u64,
        /// Callback timestamp.
        time_ms: u32,
    },
    /// The user asked to close the window.
    Close,
    /// The compositor stopped reading a buffer.
    BufferRelease(u32),
}

/// Client-to-server messages.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Request {
    /// `wl_surface.attach`.
    Attach(Option<BufferInfo>),
    /// `wl_surface.damage_buffer`.
    Damage(DamageRect),
    /// `wl_surface.commit`.
    Commit,
    /// `xdg_surface.ack_configure`.
    AckConfigure(Serial),
    /// `xdg_wm_base.pong`.
    Pong(Serial),
    /// `wl_surface.frame`.
    Frame {
        /// Token the callback will fire.
        token_id: u64,
    },
}

/// One message on the wire.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum WireEntry {
    /// Compositor to client.
    Event(Event),
    /// Client to compositor.
    Request(Request),
}

/// Ordered log of everything exchanged during a session.
#[derive(Clone, Debug, Default)]
pub struct WireLog {
    entries: Vec<WireEntry>,
}

impl WireLog {
    /// Creates an empty log.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Appends an entry.
    pub fn push(&mut self, entry: WireEntry) {
        self.entries.push(entry);
    }

    /// All entries, in order.
    #[must_use]
    pub fn entries(&self) -> &[WireEntry] {
        &self.entries
    }

    /// Requests only, in order.
    pub fn requests(&self) -> impl Iterator<Item = &Request> {
        self.entries.iter().filter_map(|e| match e {
            WireEntry::Request(r) => Some(r),
            WireEntry::Event(_) => None,
        })
    }

    /// Number of attaches of a real buffer.
    #[must_use]
    pub fn attach_count(&self) -> usize {
        self.requests()
            .filter(|r| matches!(r, Request::Attach(Some(_))))
            .count()
    }
}

/// When the compositor hands committed buffers back.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum ReleasePolicy {
    /// A buffer is released as soon as a commit replaces it.
    #[default]
    OnReplace,
    /// Buffers stay held until [`ScriptedCompositor::release`].
    Manual,
}

/// A [`SurfaceOps`] implementation that records every request.
///
/// It also tracks which committed buffers the compositor still holds, so a
/// renderer can check a buffer is free before repainting it.
#[derive(Debug, Default)]
pub struct RecordingSurface {
    log: WireLog,
    frames: Vec<FrameToken>,
    release: ReleasePolicy,
    pending: Option<Option<u32>>,
    current: Option<u32>,
    held: Vec<u32>,
}

impl RecordingSurface {
    /// Creates a surface with an empty log.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// The wire log so far.
    #[must_use]
    pub fn log(&self) -> &WireLog {
        &self.log
    }

    /// Number of frame callbacks requested but not yet fired.
    #[must_use]
    pub fn pending_frames(&self) -> usize {
        self.frames.len()
    }

    /// Changes when committed buffers are released.
    pub fn set_release_policy(&mut self, policy: ReleasePolicy) {
        self.release = policy;
    }

    /// `true` from the commit that attached buffer `id` until its release.
    #[must_use]
    pub fn is_held(&self, id: u32) -> bool {
        self.held.contains(&id)
    }

    /// Ids of the buffers the compositor still holds, in commit order.
    #[must_use]
    pub fn held_buffers(&self) -> &[u32] {
        &self.held
    }

    /// Releases buffer `id`. Returns `false` if it was not held.
    fn release_buffer(&mut self, id: u32) -> bool {
        let Some(at) = self.held.iter().position(|&held| held == id) else {
            return false;
        };
        self.held.remove(at);
        self.record_event(Event::BufferRelease(id));
        true
    }

    fn record_event(&mut self, event: Event) {
        self.log.push(WireEntry::Event(event));
    }

    fn request(&mut self, request: Request) {
        self.log.push(WireEntry::Request(request));
    }

    fn take_frames(&mut self) -> Vec<FrameToken> {
        core::mem::take(&mut self.frames)
    }
}

impl SurfaceOps for RecordingSurface {
    type Buffer = BufferInfo;

    fn attach(&mut self, buffer: Option<&BufferInfo>) {
        self.request(Request::Attach(buffer.copied()));
        self.pending = Some(buffer.map(|b| b.id));
    }

    fn damage(&mut self, rect: DamageRect) {
        self.request(Request::Damage(rect));
    }

    fn commit(&mut self) {
        self.request(Request::Commit);
        let Some(attached) = self.pending.take() else {
            return;
        };
        let previous = core::mem::replace(&mut self.current, attached);
        if let Some(id) = attached
            && !self.held.contains(&id)
        {
            self.held.push(id);
        }
        if self.release == ReleasePolicy::OnReplace
            && let Some(previous) = previous
            && Some(previous) != attached
        {
            self.release_buffer(previous);
        }
    }

    fn ack_configure(&mut self, serial: Serial) {
        self.request(Request::AckConfigure(serial));
    }

    fn pong(&mut self, serial: Serial) {
        self.request(Request::Pong(serial));
    }

    fn request_frame(&mut self, token: FrameToken) {
        self.request(Request::Frame {
            token_id: token.id(),
        });
        self.frames.push(token);
    }
}

/// Plays the compositor side of a session against a [`SessionDriver`].
#[derive(Debug)]
pub struct ScriptedCompositor<R, T = NoopSink> {
    driver: SessionDriver<R, T>,
    surface: RecordingSurface,
    next_serial: u32,
    clock_ms: u32,
}

impl<R, T> ScriptedCompositor<R, T>
where
    R: Renderer<RecordingSurface>,
    T: TraceSink,
{
    /// Wraps `driver`. The session has not started yet.
    #[must_use]
    pub fn new(driver: SessionDriver<R, T>) -> Self {
        Self {
            driver,
            surface: RecordingSurface::new(),
            next_serial: 1,
            clock_ms: 10_000,
        }
    }

    /// Lets the client send its initial bare commit.
    pub fn start(&mut self) -> Result<(), SessionError> {
        self.driver.start(&mut self.surface)
    }

    fn serial(&mut self) -> Serial {
        let serial = Serial(self.next_serial);
        self.next_serial = self.next_serial.wrapping_add(1);
        serial
    }

    /// Sends a ping and returns its serial.
    pub fn ping(&mut self) -> Serial {
        let serial = self.serial();
        self.surface.record_event(Event::Ping(serial));
        self.driver.on_ping(serial, &mut self.surface);
        serial
    }

    /// Sends a toplevel configure with the given suggestion followed by the
    /// surface configure that ends the sequence. Returns the serial.
    pub fn configure(&mut self, width: i32, height: i32) -> Result<Serial, SessionError> {
        self.surface
            .record_event(Event::ToplevelConfigure { width, height });
        self.driver.on_toplevel_configure(width, height);
        let serial = self.serial();
        self.surface.record_event(Event::SurfaceConfigure(serial));
        self.driver.on_surface_configure(serial, &mut self.surface)?;
        Ok(serial)
    }

    /// Advances the clock by `interval_ms` and fires every outstanding frame
    /// callback. Returns how many fired.
    pub fn refresh(&mut self, interval_ms: u32) -> usize {
        self.clock_ms = self.clock_ms.wrapping_add(interval_ms);
        let tokens = self.surface.take_frames();
        for token in &tokens {
            self.surface.record_event(Event::FrameDone {
                token_id: token.id(),
                time_ms: self.clock_ms,
            });
            self.driver
                .on_frame_done(token, self.clock_ms, &mut self.surface);
        }
        tokens.len()
    }

    /// Switches to `policy` for buffers committed from now on.
    #[must_use]
    pub fn with_release_policy(mut self, policy: ReleasePolicy) -> Self {
        self.surface.set_release_policy(policy);
        self
    }

    /// Releases buffer `id`, as `wl_buffer.release` would. Returns `false`
    /// if the buffer was not held.
    pub fn release(&mut self, id: u32) -> bool {
        self.surface.release_buffer(id)
    }

    /// Ids of the buffers still held, in commit order.
    #[must_use]
    pub fn held_buffers(&self) -> &[u32] {
        self.surface.held_buffers()
    }

    /// Sends a close request.
    pub fn close(&mut self) {
        self.surface.record_event(Event::Close);
        self.driver.on_close();
    }

    /// The wire log so far.
    #[must_use]
    pub fn log(&self) -> &WireLog {
        self.surface.log()
    }

    /// The driver under test.
    #[must_use]
    pub fn driver(&self) -> &SessionDriver<R, T> {
        &self.driver
    }

    /// Number of frame callbacks waiting for a refresh.
    #[must_use]
    pub fn pending_frames(&self) -> usize {
        self.surface.pending_frames()
    }

    /// Consumes the compositor, returning the driver and the wire log.
    #[must_use]
    pub fn into_parts(self) -> (SessionDriver<R, T>, WireLog) {
        (self.driver, self.surface.log)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pane_core::backend::{FrameContext, PresentError, Presentation};

    /// Leaves committing to the driver, like the GPU renderers do on error.
    struct Nothing;

    impl Renderer<RecordingSurface> for Nothing {
        fn resize(&mut self, _size: SurfaceSize) {}
        fn render_frame(
            &mut self,
            _target: &mut RecordingSurface,
            _frame: &FrameContext,
        ) -> Result<Presentation, PresentError> {
            Ok(Presentation::Uncommitted)
        }
    }

    #[test]
    fn serials_increase_and_events_are_logged() {
        let driver = SessionDriver::new(SurfaceSize::DEFAULT, Box::new(|_| Ok(Nothing)));
        let mut wl = ScriptedCompositor::new(driver);
        wl.start().unwrap();
        let first = wl.configure(0, 0).unwrap();
        let ping = wl.ping();
        assert!(ping.0 > first.0, "serials grow");

        let entries = wl.log().entries();
        assert_eq!(entries[0], WireEntry::Request(Request::Commit));
        assert_eq!(
            entries[1],
            WireEntry::Event(Event::ToplevelConfigure {
                width: 0,
                height: 0
            })
        );
        assert_eq!(entries[2], WireEntry::Event(Event::SurfaceConfigure(first)));
        assert_eq!(entries[3], WireEntry::Request(Request::AckConfigure(first)));
        assert_eq!(wl.pending_frames(), 1);
        assert_eq!(wl.refresh(16), 1);
        assert_eq!(wl.pending_frames(), 1, "next frame requested");
    }

    #[test]
    fn replaced_buffers_are_released() {
        let size = SurfaceSize::DEFAULT;
        let mut surface = RecordingSurface::new();
        for id in [1, 2] {
            surface.attach(Some(&BufferInfo { id, size }));
            surface.commit();
        }
        assert!(!surface.is_held(1), "replaced by buffer 2");
        assert!(surface.is_held(2));
        assert!(
            surface
                .log()
                .entries()
                .contains(&WireEntry::Event(Event::BufferRelease(1))),
            "release is logged"
        );
    }

    #[test]
    fn manual_policy_holds_until_released() {
        let size = SurfaceSize::DEFAULT;
        let mut surface = RecordingSurface::new();
        surface.set_release_policy(ReleasePolicy::Manual);
        for id in [1, 2] {
            surface.attach(Some(&BufferInfo { id, size }));
            surface.commit();
        }
        assert_eq!(surface.held_buffers(), &[1, 2]);
        assert!(surface.release_buffer(1));
        assert!(!surface.release_buffer(1), "already released");
        assert_eq!(surface.held_buffers(), &[2]);
    }
}
