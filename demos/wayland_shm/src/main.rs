// Copyright 2026 the Pane Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Opens a Wayland window and fills it on the CPU through `wl_shm`.
//!
//! A new frame is drawn each time the compositor reports the previous one
//! displayed. Close the window or press Escape to quit.

use anyhow::Context as _;
use clap::Parser;
use demo_common::{PatternArgs, WindowArgs};
use pane_backend_wayland::{Session, ShmOptions, ShmRenderer};
use pane_core::SurfaceSize;
use pane_core::trace::{NoopSink, TraceSink};
use pane_debug::pretty::PrettyPrintSink;

#[derive(Parser, Debug)]
#[command(about = "Wayland wl_shm demo")]
struct Cli {
    #[command(flatten)]
    window: WindowArgs,
    #[command(flatten)]
    pattern: PatternArgs,
    /// Keep buffers at WIDTHxHEIGHT and let the compositor scale them.
    #[arg(long, value_parser = parse_size)]
    fixed_buffer: Option<SurfaceSize>,
    /// Print every session event to stderr.
    #[arg(long)]
    trace: bool,
}

fn parse_size(s: &str) -> Result<SurfaceSize, String> {
    let (width, height) = s
        .split_once('x')
        .ok_or_else(|| format!("expected WIDTHxHEIGHT, got `{s}`"))?;
    let width = width.parse().map_err(|_| format!("bad width `{width}`"))?;
    let height = height.parse().map_err(|_| format!("bad height `{height}`"))?;
    SurfaceSize::new(width, height).ok_or_else(|| "size must be non-zero".to_owned())
}

fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();
    demo_common::init_logging();

    let config = cli.window.config("pane wl_shm");
    let options = ShmOptions {
        pattern: cli.pattern.pattern(),
        fixed_size: cli.fixed_buffer,
        ..ShmOptions::default()
    };
    let sink: Box<dyn TraceSink> = if cli.trace {
        Box::new(PrettyPrintSink::stderr())
    } else {
        Box::new(NoopSink)
    };

    let mut session = Session::connect().context("connecting to the compositor")?;
    session.discover_globals()?;
    session.create_window(&config)?;
    let summary = session.run_with_sink(
        move |target, size| ShmRenderer::new(target, size, options),
        sink,
    )?;
    tracing::info!(frames = summary.frames_drawn, "done");
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn sizes_parse() {
        assert_eq!(parse_size("320x200"), Ok(SurfaceSize::new(320, 200).unwrap()));
        assert!(parse_size("320").is_err(), "missing height");
        assert!(parse_size("0x10").is_err(), "zero width");
    }
}
