// Copyright 2026 the Pane Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Registry binding table.
//!
//! The compositor announces its globals once per registry; [`Globals::bind`]
//! binds the ones listed in [`GLOBALS`] at the lowest of the advertised and
//! supported versions and ignores the rest.
//!
//! | Interface | Version | Required |
//! |---|---|---|
//! | `wl_compositor` | ≤ 4 | yes |
//! | `xdg_wm_base` | 1 | yes |
//! | `wl_shm` | 1 | yes |
//! | `wl_seat` | ≤ 5 | no |
//! | `wp_viewporter` | 1 | no |

use wayland_client::protocol::{wl_compositor, wl_registry, wl_seat, wl_shm};
use wayland_client::{Proxy, QueueHandle};
use wayland_protocols::wp::viewporter::client::wp_viewporter;
use wayland_protocols::xdg::shell::client::xdg_wm_base;

use crate::state::WaylandState;

/// One row of the binding table.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct GlobalSpec {
    /// Interface name as announced by the registry.
    pub interface: &'static str,
    /// Highest version this crate speaks.
    pub max_version: u32,
    /// Whether a session can run without it.
    pub required: bool,
}

/// Globals this crate binds.
pub const GLOBALS: &[GlobalSpec] = &[
    GlobalSpec {
        interface: "wl_compositor",
        max_version: 4,
        required: true,
    },
    GlobalSpec {
        interface: "xdg_wm_base",
        max_version: 1,
        required: true,
    },
    GlobalSpec {
        interface: "wl_shm",
        max_version: 1,
        required: true,
    },
    GlobalSpec {
        interface: "wl_seat",
        max_version: 5,
        required: false,
    },
    GlobalSpec {
        interface: "wp_viewporter",
        max_version: 1,
        required: false,
    },
];

/// Version to bind `interface` at, or `None` if it is not in [`GLOBALS`].
#[must_use]
pub fn negotiate(interface: &str, advertised: u32) -> Option<u32> {
    GLOBALS
        .iter()
        .find(|spec| spec.interface == interface)
        .map(|spec| advertised.min(spec.max_version))
}

/// Bound global objects.
#[derive(Debug, Default)]
pub struct Globals {
    /// `wl_compositor`.
    pub compositor: Option<wl_compositor::WlCompositor>,
    /// `xdg_wm_base`.
    pub wm_base: Option<xdg_wm_base::XdgWmBase>,
    /// `wl_shm`.
    pub shm: Option<wl_shm::WlShm>,
    /// `wl_seat`, if the compositor has input.
    pub seat: Option<wl_seat::WlSeat>,
    /// `wp_viewporter`, if supported.
    pub viewporter: Option<wp_viewporter::WpViewporter>,
}

impl Globals {
    /// Binds one announced global if it is in the table. Returns `true` if
    /// it was bound.
    pub(crate) fn bind(
        &mut self,
        registry: &wl_registry::WlRegistry,
        name: u32,
        interface: &str,
        advertised: u32,
        qh: &QueueHandle<WaylandState>,
    ) -> bool {
        let Some(version) = negotiate(interface, advertised) else {
            return false;
        };
        match interface {
            "wl_compositor" => self.compositor = Some(registry.bind(name, version, qh, ())),
            "xdg_wm_base" => self.wm_base = Some(registry.bind(name, version, qh, ())),
            "wl_shm" => self.shm = Some(registry.bind(name, version, qh, ())),
            "wl_seat" => self.seat = Some(registry.bind(name, version, qh, ())),
            "wp_viewporter" => self.viewporter = Some(registry.bind(name, version, qh, ())),
            _ => return false,
        }
        tracing::debug!(interface, version, "bound global");
        true
    }

    /// Name of the first required global that is not bound.
    #[must_use]
    pub fn missing(&self) -> Option<&'static str> {
        let bound = [
            self.compositor.is_some(),
            self.wm_base.is_some(),
            self.shm.is_some(),
            self.seat.is_some(),
            self.viewporter.is_some(),
        ];
        GLOBALS
            .iter()
            .zip(bound)
            .find(|(spec, bound)| spec.required && !bound)
            .map(|(spec, _)| spec.interface)
    }

    /// Sends the destructor requests of every bound global.
    pub(crate) fn destroy(&mut self) {
        if let Some(viewporter) = self.viewporter.take() {
            viewporter.destroy();
        }
        if let Some(seat) = self.seat.take()
            && seat.version() >= 5
        {
            seat.release();
        }
        self.shm = None;
        if let Some(wm_base) = self.wm_base.take() {
            wm_base.destroy();
        }
        self.compositor = None;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn versions_are_capped() {
        assert_eq!(negotiate("wl_compositor", 6), Some(4));
        assert_eq!(negotiate("wl_compositor", 3), Some(3));
        assert_eq!(negotiate("xdg_wm_base", 6), Some(1));
        assert_eq!(negotiate("wl_seat", 9), Some(5));
    }

    #[test]
    fn unknown_interfaces_are_skipped() {
        assert_eq!(negotiate("wl_output", 4), None);
        assert_eq!(negotiate("zwp_linux_dmabuf_v1", 4), None);
    }

    #[test]
    fn required_globals_are_reported_in_order() {
        assert_eq!(Globals::default().missing(), Some("wl_compositor"));
    }

    #[test]
    fn table_order_matches_missing_check() {
        let names: Vec<_> = GLOBALS.iter().map(|g| g.interface).collect();
        assert_eq!(
            names,
            ["wl_compositor", "xdg_wm_base", "wl_shm", "wl_seat", "wp_viewporter"]
        );
    }
}
