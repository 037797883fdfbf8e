// Copyright 2026 the Pane Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Win32 backend for pane.
//!
//! - [`Window`]: a top-level window and its message pump.
//! - [`D3d11Renderer`]: the static triangle on a flip-model swap chain.
//! - [`DibRenderer`]: CPU patterns in a DIB section, blitted with GDI.
//! - [`run`]: pump, resize, render until the window closes.
//!
//! Only [`message`] is built on other platforms.

pub mod message;

mod frames;

#[cfg(windows)]
mod d3d11;
#[cfg(windows)]
mod dib;
#[cfg(windows)]
mod error;
#[cfg(windows)]
mod run;
#[cfg(windows)]
mod time;
#[cfg(windows)]
mod window;

#[cfg(windows)]
pub use d3d11::D3d11Renderer;
#[cfg(windows)]
pub use dib::DibRenderer;
#[cfg(windows)]
pub use error::Win32Error;
#[cfg(windows)]
pub use run::{RunSummary, run, run_with_sink};
#[cfg(windows)]
pub use time::now;
#[cfg(windows)]
pub use window::Window;
