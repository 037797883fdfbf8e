// Copyright 2026 the Pane Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Wayland backend for pane.
//!
//! Opens one `xdg_toplevel` window and keeps it drawn until the compositor
//! closes it or Escape is pressed:
//!
//! ```no_run
//! use pane_backend_wayland::{Session, ShmOptions, ShmRenderer};
//! use pane_core::WindowConfig;
//!
//! # fn main() -> Result<(), pane_backend_wayland::WaylandError> {
//! let mut session = Session::connect()?;
//! session.discover_globals()?;
//! session.create_window(&WindowConfig::titled("hello"))?;
//! session.run(|target, size| ShmRenderer::new(target, size, ShmOptions::default()))?;
//! # Ok(())
//! # }
//! ```
//!
//! Renderers:
//!
//! - [`ShmRenderer`]: CPU fill into two `wl_shm` buffers.
//! - `EglRenderer` (feature `egl`): OpenGL ES 2 through EGL.
//! - `WgpuRenderer` (feature `wgpu`): wgpu on a raw Wayland surface.
//!
//! The `trace` feature delivers session events to the sink given to
//! [`Session::run_with_sink`].

mod error;
mod event_loop;
mod globals;
mod session;
mod shm;
mod state;
mod surface;
mod target;
mod time;

#[cfg(feature = "egl")]
mod egl;
#[cfg(feature = "wgpu")]
mod wgpu_renderer;

#[cfg(feature = "egl")]
pub use egl::EglRenderer;
#[cfg(feature = "wgpu")]
pub use wgpu_renderer::WgpuRenderer;

pub use error::WaylandError;
pub use globals::{GLOBALS, GlobalSpec, Globals, negotiate};
pub use session::{RunSummary, Session};
pub use shm::{ShmOptions, ShmRenderer};
pub use state::{DynRenderer, KEY_ESC, WaylandState};
pub use surface::WaylandSurface;
pub use target::RenderTarget;
pub use time::now;
