// Copyright 2026 the Pane Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Draws a colour-interpolated triangle with OpenGL ES 2 in a Wayland window.

use anyhow::Context as _;
use clap::Parser;
use demo_common::WindowArgs;
use pane_backend_wayland::{EglRenderer, Session};

#[derive(Parser, Debug)]
#[command(about = "Wayland EGL demo")]
struct Cli {
    #[command(flatten)]
    window: WindowArgs,
}

fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();
    demo_common::init_logging();

    let mut session = Session::connect().context("connecting to the compositor")?;
    session.discover_globals()?;
    session.create_window(&cli.window.config("pane EGL"))?;
    let summary = session.run(EglRenderer::new)?;
    tracing::info!(frames = summary.frames_drawn, "done");
    Ok(())
}
