// Copyright 2026 the Pane Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Compact binary event recording and decoding.
//!
//! [`RecorderSink`] implements [`TraceSink`] and encodes events into a
//! `Vec<u8>` as fixed-size little-endian records. [`decode`] reads them back
//! as an iterator of [`RecordedEvent`].

use pane_core::handshake::ConfigureKind;
use pane_core::trace::{
    CloseEvent, ConfigureEvent, FrameDoneEvent, PingEvent, PresentEvent, PresentOutcome,
    TraceSink,
};
use pane_core::{Serial, SurfaceSize};

// ---------------------------------------------------------------------------
// Event type discriminants
// ---------------------------------------------------------------------------

const TAG_PING: u8 = 1;
const TAG_CONFIGURE: u8 = 2;
const TAG_FRAME_DONE: u8 = 3;
const TAG_PRESENT: u8 = 4;
const TAG_CLOSE: u8 = 5;

// ---------------------------------------------------------------------------
// RecorderSink
// ---------------------------------------------------------------------------

/// A [`TraceSink`] that encodes events into a compact binary buffer.
#[derive(Debug, Default)]
pub struct RecorderSink {
    buf: Vec<u8>,
}

impl RecorderSink {
    /// Creates an empty recorder.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns a view of the recorded bytes.
    #[must_use]
    pub fn as_bytes(&self) -> &[u8] {
        &self.buf
    }

    /// Consumes the recorder and returns the recorded bytes.
    #[must_use]
    pub fn into_bytes(self) -> Vec<u8> {
        self.buf
    }

    // -- encoding helpers --------------------------------------------------

    fn write_u8(&mut self, v: u8) {
        self.buf.push(v);
    }

    fn write_u32(&mut self, v: u32) {
        self.buf.extend_from_slice(&v.to_le_bytes());
    }

    fn write_u64(&mut self, v: u64) {
        self.buf.extend_from_slice(&v.to_le_bytes());
    }

    fn write_size(&mut self, s: SurfaceSize) {
        self.write_u32(s.width());
        self.write_u32(s.height());
    }

    fn write_kind(&mut self, kind: ConfigureKind) {
        match kind {
            ConfigureKind::Initial => self.write_u8(0),
            ConfigureKind::Resized { previous } => {
                self.write_u8(1);
                self.write_size(previous);
            }
            ConfigureKind::Unchanged => self.write_u8(2),
        }
    }

    fn write_outcome(&mut self, o: PresentOutcome) {
        self.write_u8(match o {
            PresentOutcome::Committed => 0,
            PresentOutcome::Uncommitted => 1,
            PresentOutcome::Failed => 2,
        });
    }
}

impl TraceSink for RecorderSink {
    fn on_ping(&mut self, e: &PingEvent) {
        self.write_u8(TAG_PING);
        self.write_u32(e.serial.0);
    }

    fn on_configure(&mut self, e: &ConfigureEvent) {
        self.write_u8(TAG_CONFIGURE);
        self.write_u32(e.serial.0);
        self.write_size(e.size);
        self.write_kind(e.kind);
    }

    fn on_frame_done(&mut self, e: &FrameDoneEvent) {
        self.write_u8(TAG_FRAME_DONE);
        self.write_u64(e.token_id);
        self.write_u32(e.callback_time_ms);
    }

    fn on_present(&mut self, e: &PresentEvent) {
        self.write_u8(TAG_PRESENT);
        self.write_u64(e.frame_index);
        self.write_size(e.size);
        self.write_u64(e.elapsed_ms);
        self.write_outcome(e.outcome);
    }

    fn on_close(&mut self, e: &CloseEvent) {
        self.write_u8(TAG_CLOSE);
        self.write_u64(e.frames_drawn);
    }
}

// ---------------------------------------------------------------------------
// Decoder
// ---------------------------------------------------------------------------

/// A decoded event from a binary recording.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum RecordedEvent {
    /// A [`PingEvent`].
    Ping(PingEvent),
    /// A [`ConfigureEvent`].
    Configure(ConfigureEvent),
    /// A [`FrameDoneEvent`].
    FrameDone(FrameDoneEvent),
    /// A [`PresentEvent`].
    Present(PresentEvent),
    /// A [`CloseEvent`].
    Close(CloseEvent),
}

/// Decodes a byte slice produced by [`RecorderSink`] into an iterator of
/// [`RecordedEvent`].
///
/// Decoding stops at the first truncated or unknown record.
pub fn decode(bytes: &[u8]) -> DecodeIter<'_> {
    DecodeIter {
        data: bytes,
        pos: 0,
    }
}

/// Iterator over decoded events.
#[derive(Debug)]
pub struct DecodeIter<'a> {
    data: &'a [u8],
    pos: usize,
}

impl DecodeIter<'_> {
    fn read_array<const N: usize>(&mut self) -> Option<[u8; N]> {
        let bytes = self.data.get(self.pos..self.pos + N)?;
        self.pos += N;
        bytes.try_into().ok()
    }

    fn read_u8(&mut self) -> Option<u8> {
        self.read_array::<1>().map(|[v]| v)
    }

    fn read_u32(&mut self) -> Option<u32> {
        self.read_array().map(u32::from_le_bytes)
    }

    fn read_u64(&mut self) -> Option<u64> {
        self.read_array().map(u64::from_le_bytes)
    }

    fn read_size(&mut self) -> Option<SurfaceSize> {
        let width = self.read_u32()?;
        let height = self.read_u32()?;
        SurfaceSize::new(width, height)
    }

    fn read_kind(&mut self) -> Option<ConfigureKind> {
        Some(match self.read_u8()? {
            0 => ConfigureKind::Initial,
            1 => ConfigureKind::Resized {
                previous: self.read_size()?,
            },
            _ => ConfigureKind::Unchanged,
        })
    }

    fn read_outcome(&mut self) -> Option<PresentOutcome> {
        Some(match self.read_u8()? {
            0 => PresentOutcome::Committed,
            1 => PresentOutcome::Uncommitted,
            _ => PresentOutcome::Failed,
        })
    }

    fn decode_configure(&mut self) -> Option<RecordedEvent> {
        Some(RecordedEvent::Configure(ConfigureEvent {
            serial: Serial(self.read_u32()?),
            size: self.read_size()?,
            kind: self.read_kind()?,
        }))
    }

    fn decode_present(&mut self) -> Option<RecordedEvent> {
        Some(RecordedEvent::Present(PresentEvent {
            frame_index: self.read_u64()?,
            size: self.read_size()?,
            elapsed_ms: self.read_u64()?,
            outcome: self.read_outcome()?,
        }))
    }
}

impl Iterator for DecodeIter<'_> {
    type Item = RecordedEvent;

    fn next(&mut self) -> Option<Self::Item> {
        match self.read_u8()? {
            TAG_PING => Some(RecordedEvent::Ping(PingEvent {
                serial: Serial(self.read_u32()?),
            })),
            TAG_CONFIGURE => self.decode_configure(),
            TAG_FRAME_DONE => Some(RecordedEvent::FrameDone(FrameDoneEvent {
                token_id: self.read_u64()?,
                callback_time_ms: self.read_u32()?,
            })),
            TAG_PRESENT => self.decode_present(),
            TAG_CLOSE => Some(RecordedEvent::Close(CloseEvent {
                frames_drawn: self.read_u64()?,
            })),
            _ => None,
        }
    }
}
