// Copyright 2026 the Pane Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! The Win32 render loop.
//!
//! There is no configure handshake or frame callback on Win32: the loop pumps
//! messages, applies non-zero resizes and draws one frame per iteration,
//! paced by the renderer's present (`Present(1, 0)` or `DwmFlush`).

use pane_core::SurfaceSize;
use pane_core::backend::Renderer;
use pane_core::time::Duration;
use pane_core::trace::{CloseEvent, NoopSink, TraceSink};

use crate::frames::FrameLoop;
use crate::message::WindowEvent;
use crate::time;
use crate::window::Window;

/// Totals reported when [`run`] returns.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct RunSummary {
    /// Frames handed to the renderer, failed presents included.
    pub frames_drawn: u64,
    /// Wall-clock time spent in the loop.
    pub wall_time: Duration,
}

/// Draws into `window` until it is closed.
///
/// `renderer` must have been created for the window's current client size.
pub fn run<R: Renderer<Window>>(window: &mut Window, renderer: R) -> RunSummary {
    run_with_sink(window, renderer, &mut NoopSink)
}

/// [`run`], reporting presents and the close to `sink`.
pub fn run_with_sink<R: Renderer<Window>>(
    window: &mut Window,
    mut renderer: R,
    sink: &mut dyn TraceSink,
) -> RunSummary {
    let started = time::now();
    let mut size = window.client_size().unwrap_or(SurfaceSize::DEFAULT);
    let mut frames = FrameLoop::default();

    'frames: loop {
        for event in window.pump() {
            match event {
                WindowEvent::Resized(new) if new != size => {
                    tracing::debug!(width = new.width(), height = new.height(), "resized");
                    size = new;
                    renderer.resize(new);
                }
                WindowEvent::Resized(_) => {}
                WindowEvent::CloseRequested | WindowEvent::Destroyed => {
                    tracing::info!("close requested");
                    break 'frames;
                }
            }
        }

        let elapsed = time::now() - started;
        frames.draw(&mut renderer, window, size, elapsed, sink);
    }

    let frames_drawn = frames.frames_drawn();
    sink.on_close(&CloseEvent { frames_drawn });
    let summary = RunSummary {
        frames_drawn,
        wall_time: time::now() - started,
    };
    tracing::info!(
        frames = summary.frames_drawn,
        seconds = summary.wall_time.as_secs_f32(),
        "session ended"
    );
    summary
}
