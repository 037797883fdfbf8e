// Copyright 2026 the Pane Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Connection bootstrap and the blocking run loop.

use pane_core::backend::{BackendError, Renderer};
use pane_core::session::{RendererFactory, SessionDriver};
use pane_core::time::Duration;
use pane_core::trace::{NoopSink, TraceSink};
use pane_core::{SurfaceSize, WindowConfig};
use wayland_client::Connection;

use crate::error::WaylandError;
use crate::event_loop::EventLoop;
use crate::globals::Globals;
use crate::state::{Driver, DynRenderer};
use crate::surface::WaylandSurface;
use crate::target::RenderTarget;
use crate::time;

/// Totals reported when [`Session::run`] returns.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct RunSummary {
    /// Frames handed to the renderer, failed presents included.
    pub frames_drawn: u64,
    /// Wall-clock time from the initial commit to the end of the loop.
    pub wall_time: Duration,
}

/// One connection to the compositor with at most one window.
///
/// The calls are made in order: [`connect`](Self::connect),
/// [`discover_globals`](Self::discover_globals),
/// [`create_window`](Self::create_window), [`run`](Self::run).
///
/// Dropping the session destroys the renderer, the window and the bound
/// globals, in that order, before disconnecting.
#[derive(Debug)]
pub struct Session {
    event_loop: EventLoop,
    connection: Connection,
    initial_size: SurfaceSize,
}

impl Session {
    /// Connects to the compositor named by `WAYLAND_DISPLAY` (or
    /// `WAYLAND_SOCKET`).
    pub fn connect() -> Result<Self, WaylandError> {
        let connection = Connection::connect_to_env().inspect_err(|err| {
            tracing::error!(%err, "cannot reach a Wayland compositor");
        })?;
        let event_loop = EventLoop::new(&connection);
        tracing::debug!("connected to compositor");
        Ok(Self {
            event_loop,
            connection,
            initial_size: SurfaceSize::DEFAULT,
        })
    }

    /// The underlying connection.
    #[must_use]
    pub fn connection(&self) -> &Connection {
        &self.connection
    }

    /// Globals bound so far.
    #[must_use]
    pub fn globals(&self) -> &Globals {
        &self.event_loop.state().globals
    }

    /// Enumerates the registry with one round-trip and binds the globals the
    /// session uses.
    pub fn discover_globals(&mut self) -> Result<&Globals, WaylandError> {
        let qh = self.event_loop.queue_handle();
        let registry = self.connection.display().get_registry(&qh, ());
        self.event_loop.state_mut().registry = Some(registry);
        self.event_loop.roundtrip()?;

        let globals = &self.event_loop.state().globals;
        if let Some(interface) = globals.missing() {
            tracing::error!(interface, "required global missing");
            return Err(WaylandError::MissingGlobal { interface });
        }
        tracing::debug!(
            seat = globals.seat.is_some(),
            viewporter = globals.viewporter.is_some(),
            "globals bound"
        );
        Ok(globals)
    }

    /// Creates the top-level window. Nothing is committed until
    /// [`run`](Self::run).
    pub fn create_window(
        &mut self,
        config: &WindowConfig,
    ) -> Result<&WaylandSurface, WaylandError> {
        let qh = self.event_loop.queue_handle();
        let state = self.event_loop.state_mut();
        let (Some(compositor), Some(wm_base)) = (&state.globals.compositor, &state.globals.wm_base)
        else {
            return Err(WaylandError::NotReady("discover_globals"));
        };
        let window = WaylandSurface::new(compositor, wm_base, &qh, config);
        state.set_window(window);
        self.initial_size = config.size;
        tracing::debug!(title = %config.title, app_id = %config.app_id, "window created");
        self.event_loop
            .state()
            .window()
            .ok_or(WaylandError::NotReady("create_window"))
    }

    /// Handles for building a renderer on the window.
    pub fn render_target(&self) -> Result<RenderTarget, WaylandError> {
        let state = self.event_loop.state();
        let window = state.window().ok_or(WaylandError::NotReady("create_window"))?;
        let shm = state
            .globals
            .shm
            .clone()
            .ok_or(WaylandError::NotReady("discover_globals"))?;
        Ok(RenderTarget {
            connection: self.connection.clone(),
            surface: window.wl_surface().clone(),
            shm,
            viewporter: state.globals.viewporter.clone(),
            qh: self.event_loop.queue_handle(),
        })
    }

    /// Runs the window until it is closed.
    ///
    /// `factory` is called once, after the first configure, with the size
    /// the window should take.
    pub fn run<R, F>(&mut self, factory: F) -> Result<RunSummary, WaylandError>
    where
        R: Renderer<WaylandSurface> + 'static,
        F: FnOnce(&RenderTarget, SurfaceSize) -> Result<R, BackendError> + 'static,
    {
        self.run_with_sink(factory, Box::new(NoopSink))
    }

    /// [`run`](Self::run), reporting session events to `sink`.
    ///
    /// Events reach `sink` only when the `trace` feature is enabled.
    pub fn run_with_sink<R, F>(
        &mut self,
        factory: F,
        sink: Box<dyn TraceSink>,
    ) -> Result<RunSummary, WaylandError>
    where
        R: Renderer<WaylandSurface> + 'static,
        F: FnOnce(&RenderTarget, SurfaceSize) -> Result<R, BackendError> + 'static,
    {
        let target = self.render_target()?;
        let factory: RendererFactory<DynRenderer> = Box::new(move |size| {
            factory(&target, size).map(|renderer| Box::new(renderer) as DynRenderer)
        });
        let driver = SessionDriver::with_sink(self.initial_size, factory, sink);

        let started = time::now();
        self.event_loop.state_mut().start(driver)?;
        while self.event_loop.state().is_running() {
            self.event_loop.blocking_dispatch()?;
            if let Some(err) = self.event_loop.state_mut().take_fatal() {
                tracing::error!(%err, "session failed");
                return Err(err);
            }
        }
        self.event_loop.flush()?;

        let summary = RunSummary {
            frames_drawn: self
                .event_loop
                .state()
                .driver()
                .map_or(0, Driver::frames_drawn),
            wall_time: time::now() - started,
        };
        tracing::info!(
            frames = summary.frames_drawn,
            seconds = summary.wall_time.as_secs_f32(),
            "session ended"
        );
        Ok(summary)
    }
}

impl Drop for Session {
    fn drop(&mut self) {
        self.event_loop.state_mut().teardown();
        if let Err(err) = self.event_loop.flush() {
            tracing::debug!(%err, "flush on teardown failed");
        }
    }
}

#[cfg(all(test, feature = "trace"))]
mod tests {
    use std::cell::Cell;
    use std::rc::Rc;

    use pane_core::Serial;
    use pane_core::trace::{PingEvent, TraceSink, Tracer};

    struct CountPings(Rc<Cell<u32>>);

    impl TraceSink for CountPings {
        fn on_ping(&mut self, _e: &PingEvent) {
            self.0.set(self.0.get() + 1);
        }
    }

    #[test]
    fn boxed_sink_receives_events() {
        let pings = Rc::new(Cell::new(0));
        let mut sink: Box<dyn TraceSink> = Box::new(CountPings(Rc::clone(&pings)));
        Tracer::new(&mut sink).ping(&PingEvent { serial: Serial(7) });
        assert_eq!(pings.get(), 1, "trace feature forwards to the sink");
    }
}
