// Copyright 2026 the Pane Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Chrome Trace Event Format exporter.
//!
//! [`export`] reads recorded bytes from a [`RecorderSink`](super::recorder::RecorderSink)
//! and writes [Chrome Trace Event Format][spec] JSON to the given writer.
//!
//! Session events carry no wall-clock timestamps of their own. The timeline
//! is taken from frame-done callback times (relative to the first one) and
//! present elapsed times; events in between are stamped with the latest
//! known time.
//!
//! [spec]: https://docs.google.com/document/d/1CvAClvFfyA5R-PhYUmn5OOQtYMH4h6I0nSsKchNAySU

use std::io::{self, Write};

use serde_json::{Value, json};

use pane_core::handshake::ConfigureKind;

use crate::recorder::{RecordedEvent, decode};

/// Exports recorded events as Chrome Trace Event Format JSON.
///
/// The output is a complete JSON array of trace event objects, suitable for
/// loading into `chrome://tracing` or [Perfetto](https://ui.perfetto.dev/).
pub fn export(bytes: &[u8], writer: &mut dyn Write) -> io::Result<()> {
    let mut events: Vec<Value> = Vec::new();
    let mut first_callback_ms: Option<u32> = None;
    let mut now_us: u64 = 0;

    for recorded in decode(bytes) {
        match recorded {
            RecordedEvent::Ping(e) => {
                events.push(json!({
                    "ph": "i",
                    "name": "Ping",
                    "cat": "Protocol",
                    "ts": now_us,
                    "pid": 0,
                    "tid": 0,
                    "s": "t",
                    "args": { "serial": e.serial.0 }
                }));
            }
            RecordedEvent::Configure(e) => {
                let kind = match e.kind {
                    ConfigureKind::Initial => "initial".to_owned(),
                    ConfigureKind::Resized { previous } => format!("resized from {previous}"),
                    ConfigureKind::Unchanged => "unchanged".to_owned(),
                };
                events.push(json!({
                    "ph": "i",
                    "name": "Configure",
                    "cat": "Protocol",
                    "ts": now_us,
                    "pid": 0,
                    "tid": 0,
                    "s": "p",
                    "args": {
                        "serial": e.serial.0,
                        "width": e.size.width(),
                        "height": e.size.height(),
                        "kind": kind,
                    }
                }));
            }
            RecordedEvent::FrameDone(e) => {
                let first = *first_callback_ms.get_or_insert(e.callback_time_ms);
                now_us = now_us.max(u64::from(e.callback_time_ms.wrapping_sub(first)) * 1000);
                events.push(json!({
                    "ph": "i",
                    "name": "FrameDone",
                    "cat": "Frame",
                    "ts": now_us,
                    "pid": 0,
                    "tid": 0,
                    "s": "t",
                    "args": {
                        "token": e.token_id,
                        "callback_time_ms": e.callback_time_ms,
                    }
                }));
            }
            RecordedEvent::Present(e) => {
                now_us = now_us.max(e.elapsed_ms * 1000);
                events.push(json!({
                    "ph": "i",
                    "name": "Present",
                    "cat": "Frame",
                    "ts": now_us,
                    "pid": 0,
                    "tid": 1,
                    "s": "t",
                    "args": {
                        "frame_index": e.frame_index,
                        "width": e.size.width(),
                        "height": e.size.height(),
                        "outcome": format!("{:?}", e.outcome),
                    }
                }));
            }
            RecordedEvent::Close(e) => {
                events.push(json!({
                    "ph": "i",
                    "name": "Close",
                    "cat": "Protocol",
                    "ts": now_us,
                    "pid": 0,
                    "tid": 0,
                    "s": "g",
                    "args": { "frames_drawn": e.frames_drawn }
                }));
            }
        }
    }

    serde_json::to_writer_pretty(writer, &events)?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::recorder::RecorderSink;
    use pane_core::trace::{FrameDoneEvent, PingEvent, PresentEvent, PresentOutcome, TraceSink};
    use pane_core::{Serial, SurfaceSize};

    #[test]
    fn export_produces_valid_json() {
        let mut rec = RecorderSink::new();
        rec.on_ping(&PingEvent { serial: Serial(1) });
        rec.on_frame_done(&FrameDoneEvent {
            token_id: 1,
            callback_time_ms: 5000,
        });
        rec.on_frame_done(&FrameDoneEvent {
            token_id: 2,
            callback_time_ms: 5016,
        });
        rec.on_present(&PresentEvent {
            frame_index: 2,
            size: SurfaceSize::DEFAULT,
            elapsed_ms: 16,
            outcome: PresentOutcome::Committed,
        });

        let mut out = Vec::new();
        export(rec.as_bytes(), &mut out).unwrap();
        let json_str = String::from_utf8(out).unwrap();

        let parsed: Vec<Value> = serde_json::from_str(&json_str).unwrap();
        assert_eq!(parsed.len(), 4);

        assert_eq!(parsed[0]["name"], "Ping");
        assert_eq!(parsed[0]["args"]["serial"], 1);

        // Callback times are relative to the first one.
        assert_eq!(parsed[1]["ts"], 0);
        assert_eq!(parsed[2]["ts"], 16_000);

        assert_eq!(parsed[3]["name"], "Present");
        assert_eq!(parsed[3]["args"]["outcome"], "Committed");
    }

    #[test]
    fn export_empty_recording() {
        let mut out = Vec::new();
        export(&[], &mut out).unwrap();
        let json_str = String::from_utf8(out).unwrap();
        let parsed: Vec<Value> = serde_json::from_str(&json_str).unwrap();
        assert!(parsed.is_empty());
    }
}
