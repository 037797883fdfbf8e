// Copyright 2026 the Pane Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Human-readable trace output.
//!
//! [`PrettyPrintSink`] implements [`TraceSink`] and writes one line per event
//! to a [`Write`](std::io::Write) destination (default: stderr).

use std::io::Write;

use pane_core::handshake::ConfigureKind;
use pane_core::trace::{
    CloseEvent, ConfigureEvent, FrameDoneEvent, PingEvent, PresentEvent, PresentOutcome,
    TraceSink,
};

/// Writes human-readable trace lines to a [`Write`](std::io::Write) destination.
pub struct PrettyPrintSink<W: Write = Box<dyn Write>> {
    writer: W,
}

impl<W: Write> std::fmt::Debug for PrettyPrintSink<W> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("PrettyPrintSink").finish_non_exhaustive()
    }
}

impl PrettyPrintSink {
    /// Creates a sink that writes to stderr.
    #[must_use]
    pub fn stderr() -> Self {
        Self {
            writer: Box::new(std::io::stderr()),
        }
    }

    /// Creates a sink that writes to a boxed writer.
    #[must_use]
    pub fn new(writer: Box<dyn Write>) -> Self {
        Self { writer }
    }
}

impl<W: Write> PrettyPrintSink<W> {
    /// Creates a sink that writes to the given destination.
    #[must_use]
    pub fn with_writer(writer: W) -> Self {
        Self { writer }
    }

    /// Consumes the sink, returning the writer.
    pub fn into_writer(self) -> W {
        self.writer
    }
}

fn outcome_name(outcome: PresentOutcome) -> &'static str {
    match outcome {
        PresentOutcome::Committed => "committed",
        PresentOutcome::Uncommitted => "committed-by-driver",
        PresentOutcome::Failed => "FAILED",
    }
}

impl<W: Write> TraceSink for PrettyPrintSink<W> {
    fn on_ping(&mut self, e: &PingEvent) {
        let _ = writeln!(self.writer, "[ping] serial={}", e.serial.0);
    }

    fn on_configure(&mut self, e: &ConfigureEvent) {
        let _ = match e.kind {
            ConfigureKind::Initial => writeln!(
                self.writer,
                "[configure] serial={} size={} initial",
                e.serial.0, e.size,
            ),
            ConfigureKind::Resized { previous } => writeln!(
                self.writer,
                "[configure] serial={} size={} resized from {previous}",
                e.serial.0, e.size,
            ),
            ConfigureKind::Unchanged => writeln!(
                self.writer,
                "[configure] serial={} size={} unchanged",
                e.serial.0, e.size,
            ),
        };
    }

    fn on_frame_done(&mut self, e: &FrameDoneEvent) {
        let _ = writeln!(
            self.writer,
            "[frame-done] token={} t={}ms",
            e.token_id, e.callback_time_ms,
        );
    }

    fn on_present(&mut self, e: &PresentEvent) {
        let _ = writeln!(
            self.writer,
            "[present] frame={} size={} elapsed={}ms {}",
            e.frame_index,
            e.size,
            e.elapsed_ms,
            outcome_name(e.outcome),
        );
    }

    fn on_close(&mut self, e: &CloseEvent) {
        let _ = writeln!(self.writer, "[close] frames={}", e.frames_drawn);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pane_core::{Serial, SurfaceSize};

    #[test]
    fn pretty_print_configure() {
        let mut sink = PrettyPrintSink::with_writer(Vec::<u8>::new());
        sink.on_configure(&ConfigureEvent {
            serial: Serial(7),
            size: SurfaceSize::DEFAULT,
            kind: ConfigureKind::Resized {
                previous: SurfaceSize::new(300, 200).unwrap(),
            },
        });
        let output = String::from_utf8(sink.into_writer()).unwrap();
        assert!(output.contains("[configure]"), "got: {output}");
        assert!(output.contains("serial=7"), "got: {output}");
        assert!(output.contains("resized from 300x200"), "got: {output}");
    }

    #[test]
    fn failed_present_is_loud() {
        let mut sink = PrettyPrintSink::with_writer(Vec::<u8>::new());
        sink.on_present(&PresentEvent {
            frame_index: 3,
            size: SurfaceSize::DEFAULT,
            elapsed_ms: 48,
            outcome: PresentOutcome::Failed,
        });
        let output = String::from_utf8(sink.into_writer()).unwrap();
        assert!(output.contains("frame=3"), "got: {output}");
        assert!(output.contains("FAILED"), "got: {output}");
    }
}
