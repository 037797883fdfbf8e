// Copyright 2026 the Pane Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Tracing and diagnostics for the session driver.
//!
//! [`TraceSink`] has one method per event the
//! [`SessionDriver`](crate::session::SessionDriver) observes or produces. All
//! methods default to no-ops, so a sink only implements what it cares about.
//!
//! [`Tracer`] wraps an optional `&mut dyn TraceSink`. Without the `trace`
//! feature every `Tracer` method compiles to nothing; with it, each call is a
//! single `Option` branch.

use crate::handshake::ConfigureKind;
use crate::size::{Serial, SurfaceSize};

/// Emitted when the compositor pings the client.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct PingEvent {
    /// Serial echoed back in the pong.
    pub serial: Serial,
}

/// Emitted after a surface configure was acknowledged.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct ConfigureEvent {
    /// Acknowledged serial.
    pub serial: Serial,
    /// Size after the configure.
    pub size: SurfaceSize,
    /// Transition kind.
    pub kind: ConfigureKind,
}

/// Emitted when a frame token fires.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct FrameDoneEvent {
    /// Token that fired.
    pub token_id: u64,
    /// Compositor timestamp in milliseconds.
    pub callback_time_ms: u32,
}

/// How a present attempt ended.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum PresentOutcome {
    /// The renderer committed the surface.
    Committed,
    /// The driver committed on behalf of the renderer.
    Uncommitted,
    /// The present failed and the frame was skipped.
    Failed,
}

/// Emitted after each draw attempt.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct PresentEvent {
    /// Frame counter.
    pub frame_index: u64,
    /// Size the frame was drawn at.
    pub size: SurfaceSize,
    /// Elapsed session time in milliseconds.
    pub elapsed_ms: u64,
    /// Result.
    pub outcome: PresentOutcome,
}

/// Emitted once when the window starts closing.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct CloseEvent {
    /// Frames drawn before the close.
    pub frames_drawn: u64,
}

/// Receives session events.
pub trait TraceSink {
    /// A ping arrived.
    fn on_ping(&mut self, _e: &PingEvent) {}
    /// A configure was acknowledged.
    fn on_configure(&mut self, _e: &ConfigureEvent) {}
    /// A frame token fired.
    fn on_frame_done(&mut self, _e: &FrameDoneEvent) {}
    /// A frame was drawn (or failed to present).
    fn on_present(&mut self, _e: &PresentEvent) {}
    /// The window started closing.
    fn on_close(&mut self, _e: &CloseEvent) {}
}

/// A sink that ignores everything.
#[derive(Clone, Copy, Debug, Default)]
pub struct NoopSink;

impl TraceSink for NoopSink {}

impl<T: TraceSink + ?Sized> TraceSink for alloc::boxed::Box<T> {
    fn on_ping(&mut self, e: &PingEvent) {
        (**self).on_ping(e);
    }
    fn on_configure(&mut self, e: &ConfigureEvent) {
        (**self).on_configure(e);
    }
    fn on_frame_done(&mut self, e: &FrameDoneEvent) {
        (**self).on_frame_done(e);
    }
    fn on_present(&mut self, e: &PresentEvent) {
        (**self).on_present(e);
    }
    fn on_close(&mut self, e: &CloseEvent) {
        (**self).on_close(e);
    }
}

/// Optional sink wrapper used by instrumented code.
pub struct Tracer<'a> {
    sink: Option<&'a mut dyn TraceSink>,
}

impl core::fmt::Debug for Tracer<'_> {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.debug_struct("Tracer")
            .field("enabled", &self.sink.is_some())
            .finish()
    }
}

impl<'a> Tracer<'a> {
    /// A tracer that drops every event.
    #[must_use]
    pub const fn none() -> Self {
        Self { sink: None }
    }

    /// A tracer forwarding to `sink`.
    #[must_use]
    pub fn new(sink: &'a mut dyn TraceSink) -> Self {
        Self { sink: Some(sink) }
    }

    /// Emits a [`PingEvent`].
    #[inline]
    pub fn ping(&mut self, e: &PingEvent) {
        #[cfg(feature = "trace")]
        if let Some(s) = &mut self.sink {
            s.on_ping(e);
        }
        #[cfg(not(feature = "trace"))]
        {
            _ = e;
        }
    }

    /// Emits a [`ConfigureEvent`].
    #[inline]
    pub fn configure(&mut self, e: &ConfigureEvent) {
        #[cfg(feature = "trace")]
        if let Some(s) = &mut self.sink {
            s.on_configure(e);
        }
        #[cfg(not(feature = "trace"))]
        {
            _ = e;
        }
    }

    /// Emits a [`FrameDoneEvent`].
    #[inline]
    pub fn frame_done(&mut self, e: &FrameDoneEvent) {
        #[cfg(feature = "trace")]
        if let Some(s) = &mut self.sink {
            s.on_frame_done(e);
        }
        #[cfg(not(feature = "trace"))]
        {
            _ = e;
        }
    }

    /// Emits a [`PresentEvent`].
    #[inline]
    pub fn present(&mut self, e: &PresentEvent) {
        #[cfg(feature = "trace")]
        if let Some(s) = &mut self.sink {
            s.on_present(e);
        }
        #[cfg(not(feature = "trace"))]
        {
            _ = e;
        }
    }

    /// Emits a [`CloseEvent`].
    #[inline]
    pub fn close(&mut self, e: &CloseEvent) {
        #[cfg(feature = "trace")]
        if let Some(s) = &mut self.sink {
            s.on_close(e);
        }
        #[cfg(not(feature = "trace"))]
        {
            _ = e;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn noop_sink_accepts_everything() {
        let mut sink = NoopSink;
        sink.on_ping(&PingEvent { serial: Serial(1) });
        sink.on_close(&CloseEvent { frames_drawn: 3 });
    }

    #[test]
    fn tracer_none_does_nothing() {
        let mut tracer = Tracer::none();
        tracer.ping(&PingEvent { serial: Serial(1) });
        tracer.close(&CloseEvent { frames_drawn: 0 });
    }

    #[cfg(feature = "trace")]
    #[test]
    fn tracer_dispatches_to_sink() {
        use alloc::vec::Vec;

        struct Pings(Vec<u32>);
        impl TraceSink for Pings {
            fn on_ping(&mut self, e: &PingEvent) {
                self.0.push(e.serial.0);
            }
        }

        let mut sink = Pings(Vec::new());
        let mut tracer = Tracer::new(&mut sink);
        tracer.ping(&PingEvent { serial: Serial(7) });
        drop(tracer);
        assert_eq!(sink.0, &[7]);
    }
}
