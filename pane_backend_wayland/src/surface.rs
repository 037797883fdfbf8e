// Copyright 2026 the Pane Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! The top-level window: `wl_surface` → `xdg_surface` → `xdg_toplevel`.

use pane_core::frame::FrameToken;
use pane_core::surface::{DamageRect, SurfaceOps};
use pane_core::{Serial, WindowConfig};
use wayland_client::protocol::{wl_buffer, wl_compositor, wl_surface};
use wayland_client::{Proxy, QueueHandle};
use wayland_protocols::xdg::shell::client::{xdg_surface, xdg_toplevel, xdg_wm_base};

use crate::state::WaylandState;

/// A top-level window and the requests a session sends on it.
#[derive(Debug)]
pub struct WaylandSurface {
    surface: wl_surface::WlSurface,
    xdg_surface: xdg_surface::XdgSurface,
    toplevel: xdg_toplevel::XdgToplevel,
    wm_base: xdg_wm_base::XdgWmBase,
    qh: QueueHandle<WaylandState>,
}

impl WaylandSurface {
    /// Creates the surface and gives it the toplevel role. Title and app id
    /// are set once here; nothing is committed.
    pub(crate) fn new(
        compositor: &wl_compositor::WlCompositor,
        wm_base: &xdg_wm_base::XdgWmBase,
        qh: &QueueHandle<WaylandState>,
        config: &WindowConfig,
    ) -> Self {
        let surface = compositor.create_surface(qh, ());
        let xdg_surface = wm_base.get_xdg_surface(&surface, qh, ());
        let toplevel = xdg_surface.get_toplevel(qh, ());
        toplevel.set_title(config.title.clone());
        toplevel.set_app_id(config.app_id.clone());
        Self {
            surface,
            xdg_surface,
            toplevel,
            wm_base: wm_base.clone(),
            qh: qh.clone(),
        }
    }

    /// The underlying `wl_surface`.
    #[must_use]
    pub fn wl_surface(&self) -> &wl_surface::WlSurface {
        &self.surface
    }

    /// Queue handle the surface's objects were created with.
    #[must_use]
    pub fn queue_handle(&self) -> &QueueHandle<WaylandState> {
        &self.qh
    }
}

impl Drop for WaylandSurface {
    fn drop(&mut self) {
        self.toplevel.destroy();
        self.xdg_surface.destroy();
        self.surface.destroy();
    }
}

impl SurfaceOps for WaylandSurface {
    type Buffer = wl_buffer::WlBuffer;

    fn attach(&mut self, buffer: Option<&wl_buffer::WlBuffer>) {
        self.surface.attach(buffer, 0, 0);
    }

    fn damage(&mut self, rect: DamageRect) {
        // wl_surface before v4 only takes surface coordinates.
        if self.surface.version() >= 4 {
            self.surface
                .damage_buffer(rect.x, rect.y, rect.width, rect.height);
        } else {
            self.surface.damage(rect.x, rect.y, rect.width, rect.height);
        }
    }

    fn commit(&mut self) {
        self.surface.commit();
    }

    fn ack_configure(&mut self, serial: Serial) {
        self.xdg_surface.ack_configure(serial.0);
    }

    fn pong(&mut self, serial: Serial) {
        self.wm_base.pong(serial.0);
    }

    fn request_frame(&mut self, token: FrameToken) {
        self.surface.frame(&self.qh, token);
    }
}
