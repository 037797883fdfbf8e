// Copyright 2026 the Pane Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Dispatch state and event handlers.
//!
//! Every compositor event is routed to one typed `Dispatch` impl on
//! [`WaylandState`], which forwards session-relevant ones to the
//! [`SessionDriver`]:
//!
//! | Object | Event | Handling |
//! |---|---|---|
//! | `wl_registry` | `global` | bind if listed in [`GLOBALS`](crate::globals::GLOBALS) |
//! | `wl_registry` | `global_remove` | ignored |
//! | `xdg_wm_base` | `ping` | pong, via the driver once a session runs |
//! | `xdg_toplevel` | `configure` | remember the suggested size |
//! | `xdg_surface` | `configure` | ack, then create/resize the renderer and draw |
//! | `xdg_toplevel` | `close` | stop the session |
//! | `wl_callback` | `done` | draw the next frame |
//! | `wl_keyboard` | `key` | Escape stops the session |
//! | `wl_buffer` | `release` | mark the shared-memory buffer free |
//!
//! A handler cannot return an error, so fatal failures are parked in the
//! state and returned by the event loop after the dispatch that raised them.

use pane_core::Serial;
use pane_core::backend::Renderer;
use pane_core::frame::FrameToken;
use pane_core::session::SessionDriver;
use pane_core::trace::TraceSink;
use wayland_client::protocol::{
    wl_callback, wl_compositor, wl_keyboard, wl_registry, wl_seat, wl_shm, wl_shm_pool,
    wl_surface,
};
use wayland_client::{Connection, Dispatch, Proxy, QueueHandle, WEnum, delegate_noop};
use wayland_protocols::wp::viewporter::client::{wp_viewport, wp_viewporter};
use wayland_protocols::xdg::shell::client::{xdg_surface, xdg_toplevel, xdg_wm_base};

use crate::error::WaylandError;
use crate::globals::Globals;
use crate::surface::WaylandSurface;

/// Evdev code of the Escape key.
pub const KEY_ESC: u32 = 1;

/// Renderer type the session stores.
pub type DynRenderer = Box<dyn Renderer<WaylandSurface>>;

pub(crate) type Driver = SessionDriver<DynRenderer, Box<dyn TraceSink>>;

/// State mutated by the Wayland event handlers.
///
/// Fields drop in declaration order: the renderer before the window before
/// the globals.
#[derive(Debug, Default)]
pub struct WaylandState {
    driver: Option<Driver>,
    window: Option<WaylandSurface>,
    keyboard: Option<wl_keyboard::WlKeyboard>,
    pub(crate) globals: Globals,
    pub(crate) registry: Option<wl_registry::WlRegistry>,
    fatal: Option<WaylandError>,
}

impl WaylandState {
    pub(crate) fn window(&self) -> Option<&WaylandSurface> {
        self.window.as_ref()
    }

    pub(crate) fn set_window(&mut self, window: WaylandSurface) {
        self.window = Some(window);
    }

    pub(crate) fn driver(&self) -> Option<&Driver> {
        self.driver.as_ref()
    }

    /// Installs the driver and sends the bare initial commit.
    pub(crate) fn start(&mut self, mut driver: Driver) -> Result<(), WaylandError> {
        let window = self.window.as_mut().ok_or(WaylandError::NotReady("create_window"))?;
        driver.start(window)?;
        self.driver = Some(driver);
        Ok(())
    }

    /// `true` while a session runs and has not been asked to close.
    pub(crate) fn is_running(&self) -> bool {
        self.driver.as_ref().is_some_and(Driver::is_running)
    }

    pub(crate) fn take_fatal(&mut self) -> Option<WaylandError> {
        self.fatal.take()
    }

    fn active(&mut self) -> Option<(&mut Driver, &mut WaylandSurface)> {
        self.driver.as_mut().zip(self.window.as_mut())
    }

    fn request_close(&mut self) {
        if let Some(driver) = &mut self.driver {
            driver.on_close();
        }
    }

    /// Releases everything in reverse order of creation: renderer, input,
    /// window, globals.
    pub(crate) fn teardown(&mut self) {
        self.driver = None;
        if let Some(keyboard) = self.keyboard.take()
            && keyboard.version() >= 3
        {
            keyboard.release();
        }
        self.window = None;
        self.globals.destroy();
        self.registry = None;
    }
}

impl Dispatch<wl_registry::WlRegistry, ()> for WaylandState {
    fn event(
        state: &mut Self,
        registry: &wl_registry::WlRegistry,
        event: wl_registry::Event,
        _data: &(),
        _conn: &Connection,
        qh: &QueueHandle<Self>,
    ) {
        match event {
            wl_registry::Event::Global {
                name,
                interface,
                version,
            } => {
                if !state.globals.bind(registry, name, &interface, version, qh) {
                    tracing::trace!(interface, version, "skipping global");
                }
            }
            // Nothing bound here is expected to go away during a session.
            wl_registry::Event::GlobalRemove { .. } => {}
            _ => {}
        }
    }
}

impl Dispatch<xdg_wm_base::XdgWmBase, ()> for WaylandState {
    fn event(
        state: &mut Self,
        wm_base: &xdg_wm_base::XdgWmBase,
        event: xdg_wm_base::Event,
        _data: &(),
        _conn: &Connection,
        _qh: &QueueHandle<Self>,
    ) {
        if let xdg_wm_base::Event::Ping { serial } = event {
            match state.active() {
                Some((driver, window)) => driver.on_ping(Serial(serial), window),
                None => wm_base.pong(serial),
            }
        }
    }
}

impl Dispatch<xdg_surface::XdgSurface, ()> for WaylandState {
    fn event(
        state: &mut Self,
        _xdg_surface: &xdg_surface::XdgSurface,
        event: xdg_surface::Event,
        _data: &(),
        _conn: &Connection,
        _qh: &QueueHandle<Self>,
    ) {
        if let xdg_surface::Event::Configure { serial } = event {
            let Some((driver, window)) = state.active() else {
                tracing::debug!(serial, "configure before the session started");
                return;
            };
            if let Err(err) = driver.on_surface_configure(Serial(serial), window) {
                state.fatal = Some(err.into());
            }
        }
    }
}

impl Dispatch<xdg_toplevel::XdgToplevel, ()> for WaylandState {
    fn event(
        state: &mut Self,
        _toplevel: &xdg_toplevel::XdgToplevel,
        event: xdg_toplevel::Event,
        _data: &(),
        _conn: &Connection,
        _qh: &QueueHandle<Self>,
    ) {
        match event {
            xdg_toplevel::Event::Configure { width, height, .. } => {
                if let Some(driver) = &mut state.driver {
                    driver.on_toplevel_configure(width, height);
                }
            }
            xdg_toplevel::Event::Close => {
                tracing::info!("close requested");
                state.request_close();
            }
            _ => {}
        }
    }
}

impl Dispatch<wl_callback::WlCallback, FrameToken> for WaylandState {
    fn event(
        state: &mut Self,
        _callback: &wl_callback::WlCallback,
        event: wl_callback::Event,
        token: &FrameToken,
        _conn: &Connection,
        _qh: &QueueHandle<Self>,
    ) {
        if let wl_callback::Event::Done { callback_data } = event
            && let Some((driver, window)) = state.active()
        {
            driver.on_frame_done(token, callback_data, window);
        }
    }
}

impl Dispatch<wl_seat::WlSeat, ()> for WaylandState {
    fn event(
        state: &mut Self,
        seat: &wl_seat::WlSeat,
        event: wl_seat::Event,
        _data: &(),
        _conn: &Connection,
        qh: &QueueHandle<Self>,
    ) {
        if let wl_seat::Event::Capabilities {
            capabilities: WEnum::Value(capabilities),
        } = event
            && capabilities.contains(wl_seat::Capability::Keyboard)
            && state.keyboard.is_none()
        {
            state.keyboard = Some(seat.get_keyboard(qh, ()));
        }
    }
}

impl Dispatch<wl_keyboard::WlKeyboard, ()> for WaylandState {
    fn event(
        state: &mut Self,
        _keyboard: &wl_keyboard::WlKeyboard,
        event: wl_keyboard::Event,
        _data: &(),
        _conn: &Connection,
        _qh: &QueueHandle<Self>,
    ) {
        if let wl_keyboard::Event::Key {
            key: KEY_ESC,
            state: WEnum::Value(wl_keyboard::KeyState::Pressed),
            ..
        } = event
        {
            tracing::info!("escape pressed");
            state.request_close();
        }
    }
}

delegate_noop!(WaylandState: wl_compositor::WlCompositor);
delegate_noop!(WaylandState: ignore wl_surface::WlSurface);
delegate_noop!(WaylandState: ignore wl_shm::WlShm);
delegate_noop!(WaylandState: wl_shm_pool::WlShmPool);
delegate_noop!(WaylandState: wp_viewporter::WpViewporter);
delegate_noop!(WaylandState: wp_viewport::WpViewport);
