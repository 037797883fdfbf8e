// Copyright 2026 the Pane Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Fatal Wayland session errors.

use pane_core::SessionError;
use wayland_client::{ConnectError, DispatchError};

/// Anything that ends a Wayland session.
#[derive(Debug, thiserror::Error)]
pub enum WaylandError {
    /// No compositor could be reached through `WAYLAND_DISPLAY`/`WAYLAND_SOCKET`.
    #[error("failed to connect to the Wayland compositor: {0}")]
    Connect(#[from] ConnectError),
    /// The connection broke while dispatching or flushing.
    #[error("Wayland connection lost: {0}")]
    Dispatch(#[from] DispatchError),
    /// Flushing outgoing requests failed.
    #[error("Wayland connection lost: {0}")]
    Flush(#[from] wayland_backend::client::WaylandError),
    /// A required global was not advertised.
    #[error("compositor does not advertise {interface}")]
    MissingGlobal {
        /// Interface name, e.g. `xdg_wm_base`.
        interface: &'static str,
    },
    /// An operation needed a step that has not happened yet.
    #[error("{0} must be called first")]
    NotReady(&'static str),
    /// The session driver or renderer failed.
    #[error(transparent)]
    Session(#[from] SessionError),
}
