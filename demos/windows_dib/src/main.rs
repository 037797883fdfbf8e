// Copyright 2026 the Pane Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Paints CPU patterns into a DIB section and blits them into a Win32 window.

use clap::Parser;
use demo_common::{PatternArgs, WindowArgs};

#[derive(Parser, Debug)]
#[command(about = "Win32 GDI DIB demo")]
struct Cli {
    #[command(flatten)]
    window: WindowArgs,
    #[command(flatten)]
    pattern: PatternArgs,
}

#[cfg(windows)]
fn main() -> anyhow::Result<()> {
    use pane_backend_windows::{DibRenderer, Window};

    let cli = Cli::parse();
    demo_common::init_logging();

    let mut window = Window::create(&cli.window.config("pane DIB"))?;
    let size = window.client_size().unwrap_or(pane_core::SurfaceSize::DEFAULT);
    let renderer = DibRenderer::new(size, cli.pattern.pattern())?;
    let summary = pane_backend_windows::run(&mut window, renderer);
    tracing::info!(frames = summary.frames_drawn, "done");
    Ok(())
}

#[cfg(not(windows))]
fn main() -> anyhow::Result<()> {
    let _ = Cli::parse();
    anyhow::bail!("this demo needs Windows")
}
