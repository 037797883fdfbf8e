// Copyright 2026 the Pane Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Draws the triangle with Direct3D 11 in a Win32 window.

use clap::Parser;
use demo_common::WindowArgs;

#[derive(Parser, Debug)]
#[command(about = "Win32 Direct3D 11 demo")]
struct Cli {
    #[command(flatten)]
    window: WindowArgs,
}

#[cfg(windows)]
fn main() -> anyhow::Result<()> {
    use pane_backend_windows::{D3d11Renderer, Window};

    let cli = Cli::parse();
    demo_common::init_logging();

    let mut window = Window::create(&cli.window.config("pane Direct3D 11"))?;
    let size = window.client_size().unwrap_or(pane_core::SurfaceSize::DEFAULT);
    let renderer = D3d11Renderer::new(&window, size)?;
    let summary = pane_backend_windows::run(&mut window, renderer);
    tracing::info!(frames = summary.frames_drawn, "done");
    Ok(())
}

#[cfg(not(windows))]
fn main() -> anyhow::Result<()> {
    let _ = Cli::parse();
    anyhow::bail!("this demo needs Windows")
}
