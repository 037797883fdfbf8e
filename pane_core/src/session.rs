// Copyright 2026 the Pane Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Protocol-agnostic session driver.
//!
//! [`SessionDriver`] turns the compositor's events into the client's
//! requests. A backend owns the connection and calls one `on_*` method per
//! event it dispatches; the driver answers through [`SurfaceOps`] and draws
//! with its [`Renderer`].
//!
//! # Event handling
//!
//! | Event | Driver reaction |
//! |---|---|
//! | ping | `pong` with the same serial, immediately, in every phase |
//! | toplevel configure | remember the suggested size (0 dimensions ignored) |
//! | surface configure | `ack_configure` with that serial; create the renderer on the first one and draw; resize on later ones |
//! | frame done | draw the next frame |
//! | close | stop drawing; the loop exits on its next check |
//!
//! Drawing is signal-driven only: a frame is drawn after the first configure,
//! after a resize while no frame is outstanding, and after each frame-done
//! notification.

use alloc::boxed::Box;

use crate::backend::{BackendError, FrameContext, Presentation, Renderer};
use crate::frame::{FramePacer, FrameToken};
use crate::handshake::{ConfigureKind, Handshake, HandshakeError};
use crate::size::{Serial, SurfaceSize};
use crate::surface::SurfaceOps;
use crate::time::Duration;
use crate::trace::{
    CloseEvent, ConfigureEvent, FrameDoneEvent, NoopSink, PingEvent, PresentEvent,
    PresentOutcome, TraceSink, Tracer,
};

/// Creates a renderer once the first configure has fixed the surface size.
pub type RendererFactory<R> = Box<dyn FnOnce(SurfaceSize) -> Result<R, BackendError>>;

/// Fatal session failure.
#[derive(Clone, Debug, PartialEq, Eq, thiserror::Error)]
pub enum SessionError {
    /// The configure sequence was violated.
    #[error(transparent)]
    Handshake(#[from] HandshakeError),
    /// The renderer could not be created.
    #[error(transparent)]
    Backend(#[from] BackendError),
}

enum RendererSlot<R> {
    Pending(RendererFactory<R>),
    Ready(R),
    Failed,
}

/// Drives one top-level surface from first commit to close.
pub struct SessionDriver<R, T = NoopSink> {
    handshake: Handshake,
    pacer: FramePacer,
    renderer: RendererSlot<R>,
    sink: T,
    running: bool,
    frames_drawn: u64,
    first_callback_ms: Option<u32>,
    elapsed: Duration,
}

impl<R, T> core::fmt::Debug for SessionDriver<R, T> {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        let renderer = match self.renderer {
            RendererSlot::Pending(_) => "pending",
            RendererSlot::Ready(_) => "ready",
            RendererSlot::Failed => "failed",
        };
        f.debug_struct("SessionDriver")
            .field("handshake", &self.handshake)
            .field("pacer", &self.pacer)
            .field("renderer", &renderer)
            .field("running", &self.running)
            .field("frames_drawn", &self.frames_drawn)
            .finish_non_exhaustive()
    }
}

impl<R> SessionDriver<R, NoopSink> {
    /// Creates a driver for a surface that starts at `initial` size.
    ///
    /// `factory` runs once, on the first configure.
    #[must_use]
    pub fn new(initial: SurfaceSize, factory: RendererFactory<R>) -> Self {
        Self::with_sink(initial, factory, NoopSink)
    }
}

impl<R, T: TraceSink> SessionDriver<R, T> {
    /// Creates a driver that reports session events to `sink`.
    #[must_use]
    pub fn with_sink(initial: SurfaceSize, factory: RendererFactory<R>, sink: T) -> Self {
        Self {
            handshake: Handshake::new(initial),
            pacer: FramePacer::new(),
            renderer: RendererSlot::Pending(factory),
            sink,
            running: true,
            frames_drawn: 0,
            first_callback_ms: None,
            elapsed: Duration::ZERO,
        }
    }

    /// Returns `false` once the window was asked to close.
    #[must_use]
    pub const fn is_running(&self) -> bool {
        self.running
    }

    /// Handshake state.
    #[must_use]
    pub const fn handshake(&self) -> &Handshake {
        &self.handshake
    }

    /// Number of frames drawn so far (including failed presents).
    #[must_use]
    pub const fn frames_drawn(&self) -> u64 {
        self.frames_drawn
    }

    /// The renderer, once created.
    #[must_use]
    pub fn renderer(&self) -> Option<&R> {
        match &self.renderer {
            RendererSlot::Ready(renderer) => Some(renderer),
            _ => None,
        }
    }

    /// The trace sink.
    #[must_use]
    pub fn sink(&self) -> &T {
        &self.sink
    }

    /// Consumes the driver, returning the trace sink.
    pub fn into_sink(self) -> T {
        self.sink
    }

    /// Sends the bare initial commit that asks for the first configure.
    pub fn start<S: SurfaceOps>(&mut self, ops: &mut S) -> Result<(), SessionError> {
        self.handshake.request_configure()?;
        ops.commit();
        Ok(())
    }

    /// Answers a ping.
    pub fn on_ping<S: SurfaceOps>(&mut self, serial: Serial, ops: &mut S) {
        ops.pong(serial);
        Tracer::new(&mut self.sink).ping(&PingEvent { serial });
    }

    /// Records the size suggested by a toplevel configure. Returns `false`
    /// when the suggestion was ignored.
    pub fn on_toplevel_configure(&mut self, width: i32, height: i32) -> bool {
        let accepted = self.handshake.suggest_size(width, height);
        if !accepted {
            tracing::trace!(width, height, "ignoring size suggestion");
        }
        accepted
    }

    /// Handles a surface configure.
    pub fn on_surface_configure<S>(
        &mut self,
        serial: Serial,
        ops: &mut S,
    ) -> Result<(), SessionError>
    where
        S: SurfaceOps,
        R: Renderer<S>,
    {
        let configure = match self.handshake.configure(serial) {
            Ok(configure) => configure,
            Err(HandshakeError::Closing(_)) => {
                tracing::debug!(?serial, "configure after close ignored");
                return Ok(());
            }
            Err(err) => return Err(err.into()),
        };
        ops.ack_configure(configure.serial);
        Tracer::new(&mut self.sink).configure(&ConfigureEvent {
            serial: configure.serial,
            size: configure.size,
            kind: configure.kind,
        });

        match configure.kind {
            ConfigureKind::Initial => {
                let slot = core::mem::replace(&mut self.renderer, RendererSlot::Failed);
                let renderer = match slot {
                    RendererSlot::Pending(factory) => factory(configure.size)?,
                    RendererSlot::Ready(renderer) => renderer,
                    RendererSlot::Failed => return Ok(()),
                };
                tracing::debug!(size = %configure.size, "renderer ready");
                self.renderer = RendererSlot::Ready(renderer);
                self.draw(ops);
            }
            ConfigureKind::Resized { previous } => {
                tracing::debug!(from = %previous, to = %configure.size, "resized");
                if let RendererSlot::Ready(renderer) = &mut self.renderer {
                    renderer.resize(configure.size);
                }
                if !self.pacer.is_pending() {
                    self.draw(ops);
                }
            }
            ConfigureKind::Unchanged => {
                if !self.pacer.is_pending() {
                    ops.commit();
                }
            }
        }
        Ok(())
    }

    /// Handles a frame-done notification for `token`.
    pub fn on_frame_done<S>(&mut self, token: &FrameToken, callback_time_ms: u32, ops: &mut S)
    where
        S: SurfaceOps,
        R: Renderer<S>,
    {
        let Some(done) = self.pacer.fire(token, callback_time_ms) else {
            tracing::trace!(token = token.id(), "stale frame token");
            return;
        };
        let first = *self.first_callback_ms.get_or_insert(callback_time_ms);
        self.elapsed = Duration::from_millis(u64::from(callback_time_ms.wrapping_sub(first)));
        Tracer::new(&mut self.sink).frame_done(&FrameDoneEvent {
            token_id: done.token_id,
            callback_time_ms,
        });
        self.draw(ops);
    }

    /// Handles a close request.
    pub fn on_close(&mut self) {
        if !self.running {
            return;
        }
        self.running = false;
        self.handshake.close();
        self.pacer.cancel();
        Tracer::new(&mut self.sink).close(&CloseEvent {
            frames_drawn: self.frames_drawn,
        });
    }

    fn draw<S>(&mut self, ops: &mut S)
    where
        S: SurfaceOps,
        R: Renderer<S>,
    {
        if !self.running {
            return;
        }
        let RendererSlot::Ready(renderer) = &mut self.renderer else {
            return;
        };
        let token = match self.pacer.request() {
            Ok(token) => token,
            Err(err) => {
                tracing::debug!(%err, "draw skipped");
                return;
            }
        };
        ops.request_frame(token);

        let frame = FrameContext {
            frame_index: self.frames_drawn,
            size: self.handshake.size(),
            elapsed: self.elapsed,
        };
        let outcome = match renderer.render_frame(ops, &frame) {
            Ok(Presentation::Committed) => PresentOutcome::Committed,
            Ok(Presentation::Uncommitted) => {
                ops.commit();
                PresentOutcome::Uncommitted
            }
            Err(err) => {
                tracing::warn!(
                    %err,
                    frame = frame.frame_index,
                    "present failed, retrying next frame"
                );
                ops.commit();
                PresentOutcome::Failed
            }
        };
        self.frames_drawn += 1;
        tracing::trace!(frame = frame.frame_index, ?outcome, "frame");
        Tracer::new(&mut self.sink).present(&PresentEvent {
            frame_index: frame.frame_index,
            size: frame.size,
            elapsed_ms: frame.elapsed.as_millis(),
            outcome,
        });
    }
}

#[cfg(test)]
mod tests {
    use alloc::boxed::Box;
    use alloc::string::String;
    use alloc::vec::Vec;

    use super::*;
    use crate::backend::{InitStage, PresentError};
    use crate::surface::DamageRect;

    #[derive(Debug, PartialEq, Eq)]
    enum Req {
        Attach,
        Damage,
        Commit,
        Ack(u32),
        Pong(u32),
        Frame(u64),
    }

    #[derive(Default)]
    struct Surface {
        reqs: Vec<Req>,
        tokens: Vec<FrameToken>,
    }

    impl SurfaceOps for Surface {
        type Buffer = ();
        fn attach(&mut self, _buffer: Option<&()>) {
            self.reqs.push(Req::Attach);
        }
        fn damage(&mut self, _rect: DamageRect) {
            self.reqs.push(Req::Damage);
        }
        fn commit(&mut self) {
            self.reqs.push(Req::Commit);
        }
        fn ack_configure(&mut self, serial: Serial) {
            self.reqs.push(Req::Ack(serial.0));
        }
        fn pong(&mut self, serial: Serial) {
            self.reqs.push(Req::Pong(serial.0));
        }
        fn request_frame(&mut self, token: FrameToken) {
            self.reqs.push(Req::Frame(token.id()));
            self.tokens.push(token);
        }
    }

    #[derive(Default)]
    struct Cpu {
        sizes: Vec<SurfaceSize>,
        fail_next: bool,
    }

    impl Renderer<Surface> for Cpu {
        fn resize(&mut self, size: SurfaceSize) {
            self.sizes.push(size);
        }
        fn render_frame(
            &mut self,
            target: &mut Surface,
            _frame: &FrameContext,
        ) -> Result<Presentation, PresentError> {
            if core::mem::take(&mut self.fail_next) {
                return Err(PresentError::Timeout);
            }
            target.attach(Some(&()));
            target.damage(DamageRect {
                x: 0,
                y: 0,
                width: 1,
                height: 1,
            });
            target.commit();
            Ok(Presentation::Committed)
        }
    }

    fn driver() -> SessionDriver<Cpu> {
        SessionDriver::new(SurfaceSize::DEFAULT, Box::new(|_| Ok(Cpu::default())))
    }

    fn size(w: u32, h: u32) -> SurfaceSize {
        SurfaceSize::new(w, h).expect("non-zero test size")
    }

    #[test]
    fn first_configure_acks_then_draws() {
        let mut d = driver();
        let mut s = Surface::default();
        d.start(&mut s).expect("start");
        d.on_surface_configure(Serial(5), &mut s).expect("configure");

        assert_eq!(
            s.reqs,
            [
                Req::Commit,
                Req::Ack(5),
                Req::Frame(1),
                Req::Attach,
                Req::Damage,
                Req::Commit
            ]
        );
        assert_eq!(d.frames_drawn(), 1);
    }

    #[test]
    fn frame_done_triggers_exactly_one_draw() {
        let mut d = driver();
        let mut s = Surface::default();
        d.start(&mut s).expect("start");
        d.on_surface_configure(Serial(1), &mut s).expect("configure");
        let token = s.tokens.pop().expect("frame requested");

        d.on_frame_done(&token, 100, &mut s);
        d.on_frame_done(&token, 116, &mut s);
        assert_eq!(d.frames_drawn(), 2, "stale token must not draw");
    }

    #[test]
    fn resize_with_outstanding_frame_waits_for_signal() {
        let mut d = driver();
        let mut s = Surface::default();
        d.start(&mut s).expect("start");
        d.on_surface_configure(Serial(1), &mut s).expect("configure");

        assert!(d.on_toplevel_configure(300, 200), "accepted");
        d.on_surface_configure(Serial(2), &mut s).expect("resize");
        assert_eq!(d.frames_drawn(), 1, "no draw while a frame is outstanding");
        assert_eq!(
            d.renderer().map(|r| r.sizes.as_slice()),
            Some(&[size(300, 200)][..])
        );
        assert_eq!(s.reqs.last(), Some(&Req::Ack(2)));
    }

    #[test]
    fn zero_size_suggestion_does_not_resize() {
        let mut d = driver();
        let mut s = Surface::default();
        d.start(&mut s).expect("start");
        d.on_surface_configure(Serial(1), &mut s).expect("configure");

        assert!(!d.on_toplevel_configure(0, 480), "ignored");
        d.on_surface_configure(Serial(2), &mut s).expect("configure");
        assert_eq!(d.renderer().map(|r| r.sizes.len()), Some(0));
        assert_eq!(d.handshake().size(), SurfaceSize::DEFAULT);
    }

    #[test]
    fn ping_is_answered_in_every_phase() {
        let mut d = driver();
        let mut s = Surface::default();
        d.on_ping(Serial(10), &mut s);
        d.start(&mut s).expect("start");
        d.on_close();
        d.on_ping(Serial(11), &mut s);
        assert_eq!(s.reqs, [Req::Pong(10), Req::Commit, Req::Pong(11)]);
    }

    #[test]
    fn close_stops_drawing() {
        let mut d = driver();
        let mut s = Surface::default();
        d.start(&mut s).expect("start");
        d.on_surface_configure(Serial(1), &mut s).expect("configure");
        let token = s.tokens.pop().expect("frame requested");

        d.on_close();
        let before = s.reqs.len();
        d.on_frame_done(&token, 16, &mut s);
        assert!(!d.is_running(), "closed");
        assert_eq!(s.reqs.len(), before, "no requests after close");
        assert_eq!(d.frames_drawn(), 1);
    }

    #[test]
    fn failed_present_still_commits() {
        let mut d = SessionDriver::new(
            SurfaceSize::DEFAULT,
            Box::new(|_| {
                Ok(Cpu {
                    fail_next: true,
                    ..Cpu::default()
                })
            }),
        );
        let mut s = Surface::default();
        d.start(&mut s).expect("start");
        d.on_surface_configure(Serial(1), &mut s).expect("configure");
        assert_eq!(s.reqs, [Req::Commit, Req::Ack(1), Req::Frame(1), Req::Commit]);

        let token = s.tokens.pop().expect("frame requested");
        d.on_frame_done(&token, 16, &mut s);
        assert_eq!(d.frames_drawn(), 2, "loop continues after a failed present");
    }

    #[test]
    fn factory_failure_is_fatal() {
        let mut d: SessionDriver<Cpu> = SessionDriver::new(
            SurfaceSize::DEFAULT,
            Box::new(|_| Err(BackendError::init(InitStage::Context, String::from("no GPU")))),
        );
        let mut s = Surface::default();
        d.start(&mut s).expect("start");
        let err = d
            .on_surface_configure(Serial(1), &mut s)
            .expect_err("factory fails");
        assert!(matches!(err, SessionError::Backend(BackendError::Init { .. })));
        assert_eq!(s.reqs, [Req::Commit, Req::Ack(1)]);
    }

    #[test]
    fn configure_before_start_is_an_error() {
        let mut d = driver();
        let mut s = Surface::default();
        assert_eq!(
            d.on_surface_configure(Serial(1), &mut s),
            Err(SessionError::Handshake(HandshakeError::NotRequested(Serial(1))))
        );
    }
}
