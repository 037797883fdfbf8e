// Copyright 2026 the Pane Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Scripted session that exercises the tracing and diagnostics pipeline.
//!
//! Plays a compositor against a [`SessionDriver`] with an in-memory renderer:
//! first configure, frames, pings, a resize and a close. Session events go to
//! a [`PrettyPrintSink`] on stdout and a [`RecorderSink`]; the recording is
//! exported as a Chrome trace and the wire log is checked for protocol
//! violations.

use std::fs::File;
use std::io::{BufWriter, Write as _};
use std::path::PathBuf;

use anyhow::Context as _;
use clap::Parser;
use demo_common::PatternArgs;
use pane_core::SurfaceSize;
use pane_core::session::SessionDriver;
use pane_core::trace::{
    CloseEvent, ConfigureEvent, FrameDoneEvent, PingEvent, PresentEvent, TraceSink,
};
use pane_debug::chrome;
use pane_debug::conformance;
use pane_debug::memory::MemoryRenderer;
use pane_debug::pretty::PrettyPrintSink;
use pane_debug::recorder::RecorderSink;
use pane_debug::wire::ScriptedCompositor;

/// ≈60 Hz.
const REFRESH_INTERVAL_MS: u32 = 16;

#[derive(Parser, Debug)]
#[command(about = "Headless scripted pane session")]
struct Cli {
    /// Frames to draw before and after the resize.
    #[arg(long, default_value_t = 30)]
    frames: u32,
    /// Every n-th present fails (0 = never).
    #[arg(long, default_value_t = 0)]
    fail_every: u64,
    /// Where to write the Chrome trace JSON.
    #[arg(long, default_value = "pane-trace.json")]
    out: PathBuf,
    #[command(flatten)]
    pattern: PatternArgs,
}

/// Forwards every event to two sinks.
struct Tee<A, B>(A, B);

impl<A: TraceSink, B: TraceSink> TraceSink for Tee<A, B> {
    fn on_ping(&mut self, e: &PingEvent) {
        self.0.on_ping(e);
        self.1.on_ping(e);
    }
    fn on_configure(&mut self, e: &ConfigureEvent) {
        self.0.on_configure(e);
        self.1.on_configure(e);
    }
    fn on_frame_done(&mut self, e: &FrameDoneEvent) {
        self.0.on_frame_done(e);
        self.1.on_frame_done(e);
    }
    fn on_present(&mut self, e: &PresentEvent) {
        self.0.on_present(e);
        self.1.on_present(e);
    }
    fn on_close(&mut self, e: &CloseEvent) {
        self.0.on_close(e);
        self.1.on_close(e);
    }
}

fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();
    demo_common::init_logging();

    let pattern = cli.pattern.pattern();
    let fail_every = cli.fail_every;
    let sink = Tee(
        PrettyPrintSink::with_writer(std::io::stdout()),
        RecorderSink::new(),
    );
    let driver = SessionDriver::with_sink(
        SurfaceSize::DEFAULT,
        Box::new(move |size| {
            MemoryRenderer::new(size, pattern).map(|renderer| match fail_every {
                0 => renderer,
                n => renderer.failing_every(n),
            })
        }),
        sink,
    );
    let mut compositor = ScriptedCompositor::new(driver);

    compositor.start()?;
    compositor.configure(0, 0)?;
    compositor.ping();
    for _ in 0..cli.frames {
        compositor.refresh(REFRESH_INTERVAL_MS);
    }
    compositor.configure(800, 600)?;
    compositor.ping();
    for _ in 0..cli.frames {
        compositor.refresh(REFRESH_INTERVAL_MS);
    }
    compositor.close();
    // The frame in flight at close time still completes.
    compositor.refresh(REFRESH_INTERVAL_MS);

    let (driver, log) = compositor.into_parts();
    let frames = driver.frames_drawn();
    let Tee(pretty, recorder) = driver.into_sink();
    pretty.into_writer().flush()?;

    match conformance::check(&log) {
        Ok(()) => println!(
            "conformance: ok ({} wire entries, {} attaches)",
            log.entries().len(),
            log.attach_count()
        ),
        Err(violation) => anyhow::bail!("conformance: {violation}"),
    }

    let file = File::create(&cli.out)
        .with_context(|| format!("creating {}", cli.out.display()))?;
    let mut writer = BufWriter::new(file);
    chrome::export(recorder.as_bytes(), &mut writer)?;
    writer.flush()?;
    tracing::info!(
        frames,
        bytes = recorder.as_bytes().len(),
        path = %cli.out.display(),
        "wrote Chrome trace"
    );
    Ok(())
}
