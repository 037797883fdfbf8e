// Copyright 2026 the Pane Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Handles a renderer needs to attach itself to the window.

use wayland_client::protocol::{wl_shm, wl_surface};
use wayland_client::{Connection, QueueHandle};
use wayland_protocols::wp::viewporter::client::wp_viewporter;

use crate::state::WaylandState;

/// What a renderer factory receives once the first configure arrived.
#[derive(Clone, Debug)]
pub struct RenderTarget {
    pub(crate) connection: Connection,
    pub(crate) surface: wl_surface::WlSurface,
    pub(crate) shm: wl_shm::WlShm,
    pub(crate) viewporter: Option<wp_viewporter::WpViewporter>,
    pub(crate) qh: QueueHandle<WaylandState>,
}

impl RenderTarget {
    /// The display connection.
    #[must_use]
    pub fn connection(&self) -> &Connection {
        &self.connection
    }

    /// The window's `wl_surface`.
    #[must_use]
    pub fn surface(&self) -> &wl_surface::WlSurface {
        &self.surface
    }

    /// The bound `wl_shm`.
    #[must_use]
    pub fn shm(&self) -> &wl_shm::WlShm {
        &self.shm
    }

    /// The bound `wp_viewporter`, if the compositor has one.
    #[must_use]
    pub fn viewporter(&self) -> Option<&wp_viewporter::WpViewporter> {
        self.viewporter.as_ref()
    }

    /// Queue handle for objects the renderer creates.
    #[must_use]
    pub fn queue_handle(&self) -> &QueueHandle<WaylandState> {
        &self.qh
    }
}
