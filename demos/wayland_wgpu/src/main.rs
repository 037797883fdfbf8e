// Copyright 2026 the Pane Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Draws the triangle with wgpu in a Wayland window.

use anyhow::Context as _;
use clap::{Parser, ValueEnum};
use demo_common::WindowArgs;
use pane_backend_wayland::{Session, WgpuRenderer};

#[derive(ValueEnum, Clone, Copy, Debug, PartialEq, Eq)]
enum PresentMode {
    Fifo,
    Mailbox,
    Immediate,
}

impl From<PresentMode> for wgpu::PresentMode {
    fn from(mode: PresentMode) -> Self {
        match mode {
            PresentMode::Fifo => Self::Fifo,
            PresentMode::Mailbox => Self::Mailbox,
            PresentMode::Immediate => Self::Immediate,
        }
    }
}

#[derive(Parser, Debug)]
#[command(about = "Wayland wgpu demo")]
struct Cli {
    #[command(flatten)]
    window: WindowArgs,
    /// Swap chain present mode; unsupported modes fall back to fifo.
    #[arg(long, value_enum, default_value_t = PresentMode::Fifo)]
    present_mode: PresentMode,
}

fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();
    demo_common::init_logging();

    let present_mode = wgpu::PresentMode::from(cli.present_mode);
    let mut session = Session::connect().context("connecting to the compositor")?;
    session.discover_globals()?;
    session.create_window(&cli.window.config("pane wgpu"))?;
    let summary =
        session.run(move |target, size| WgpuRenderer::new(target, size, present_mode))?;
    tracing::info!(frames = summary.frames_drawn, "done");
    Ok(())
}
