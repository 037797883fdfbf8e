// Copyright 2026 the Pane Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Protocol-ordering audit of a [`WireLog`].
//!
//! [`check`] walks the log once and returns the first [`Violation`] of the
//! client's obligations:
//!
//! - every `ack_configure` answers the latest unacknowledged configure;
//! - no buffer is attached before the first `ack_configure`;
//! - no damage is sent before a buffer was ever attached;
//! - attached or damaged state is committed before the next event;
//! - a ping is answered by a pong with its serial before any other request;
//! - after a resize is acknowledged, the next buffer has the new size;
//! - after close, at most one more buffer is attached;
//! - a committed buffer is not attached again until it was released.

use pane_core::{Serial, SurfaceSize};

use crate::wire::{Event, Request, WireEntry, WireLog};

/// First broken rule found in a log. `index` is the offending entry.
#[derive(Clone, Copy, Debug, PartialEq, Eq, thiserror::Error)]
pub enum Violation {
    /// `ack_configure` with a serial other than the pending configure's.
    #[error("entry {index}: ack_configure({got:?}), expected {expected:?}")]
    AckSerialMismatch {
        /// Entry index.
        index: usize,
        /// Pending configure serial, if any.
        expected: Option<Serial>,
        /// Serial sent.
        got: Serial,
    },
    /// A buffer was attached before the first configure was acknowledged.
    #[error("entry {index}: buffer attached before the first ack_configure")]
    AttachBeforeAck {
        /// Entry index.
        index: usize,
    },
    /// Damage was sent with no buffer ever attached.
    #[error("entry {index}: damage before any buffer was attached")]
    DamageBeforeAttach {
        /// Entry index.
        index: usize,
    },
    /// Attach or damage left uncommitted when the next event arrived or the
    /// log ended.
    #[error("entry {index}: attach/damage never committed")]
    Uncommitted {
        /// Index of the first uncommitted request.
        index: usize,
    },
    /// A request other than the matching pong followed a ping.
    #[error("entry {index}: ping {serial:?} not answered before the next request")]
    PingNotAnswered {
        /// Entry index.
        index: usize,
        /// Ping serial.
        serial: Serial,
    },
    /// A buffer after an acknowledged resize had the wrong size.
    #[error("entry {index}: buffer is {actual}, configured size is {expected}")]
    WrongBufferSize {
        /// Entry index.
        index: usize,
        /// Size acknowledged.
        expected: SurfaceSize,
        /// Size attached.
        actual: SurfaceSize,
    },
    /// More than one buffer attached after close.
    #[error("entry {index}: drawing continued after close")]
    DrawAfterClose {
        /// Entry index.
        index: usize,
    },
    /// A buffer the compositor still reads was attached again.
    #[error("entry {index}: buffer {id} attached before its release")]
    AttachWhileHeld {
        /// Entry index.
        index: usize,
        /// Buffer id.
        id: u32,
    },
}

#[derive(Debug, Default)]
struct Audit {
    pending_configure: Option<Serial>,
    acked_once: bool,
    attached_once: bool,
    uncommitted_since: Option<usize>,
    awaiting_pong: Option<Serial>,
    suggested: Option<SurfaceSize>,
    expected_size: Option<SurfaceSize>,
    closed: bool,
    attaches_after_close: usize,
    pending_buffer: Option<u32>,
    held: Vec<u32>,
}

impl Audit {
    fn event(&mut self, event: &Event) -> Result<(), Violation> {
        if let Some(index) = self.uncommitted_since {
            return Err(Violation::Uncommitted { index });
        }
        match *event {
            Event::Ping(serial) => self.awaiting_pong = Some(serial),
            Event::ToplevelConfigure { width, height } => {
                if let Some(size) = SurfaceSize::from_suggested(width, height) {
                    self.suggested = Some(size);
                }
            }
            Event::SurfaceConfigure(serial) => self.pending_configure = Some(serial),
            Event::FrameDone { .. } => {}
            Event::Close => self.closed = true,
            Event::BufferRelease(id) => self.held.retain(|&held| held != id),
        }
        Ok(())
    }

    fn request(&mut self, index: usize, request: &Request) -> Result<(), Violation> {
        if let Some(serial) = self.awaiting_pong.take() {
            if *request != Request::Pong(serial) {
                return Err(Violation::PingNotAnswered { index, serial });
            }
            return Ok(());
        }
        match *request {
            Request::AckConfigure(got) => {
                if self.pending_configure != Some(got) {
                    return Err(Violation::AckSerialMismatch {
                        index,
                        expected: self.pending_configure,
                        got,
                    });
                }
                self.pending_configure = None;
                self.acked_once = true;
                self.expected_size = self.suggested;
            }
            Request::Attach(buffer) => {
                if buffer.is_some() && !self.acked_once {
                    return Err(Violation::AttachBeforeAck { index });
                }
                if let Some(buffer) = buffer {
                    if let Some(expected) = self.expected_size.take()
                        && buffer.size != expected
                    {
                        return Err(Violation::WrongBufferSize {
                            index,
                            expected,
                            actual: buffer.size,
                        });
                    }
                    self.attached_once = true;
                    if self.closed {
                        self.attaches_after_close += 1;
                        if self.attaches_after_close > 1 {
                            return Err(Violation::DrawAfterClose { index });
                        }
                    }
                    if self.held.contains(&buffer.id) {
                        return Err(Violation::AttachWhileHeld {
                            index,
                            id: buffer.id,
                        });
                    }
                }
                self.pending_buffer = buffer.map(|b| b.id);
                self.uncommitted_since.get_or_insert(index);
            }
            Request::Damage(_) => {
                if !self.attached_once {
                    return Err(Violation::DamageBeforeAttach { index });
                }
                self.uncommitted_since.get_or_insert(index);
            }
            Request::Commit => {
                self.uncommitted_since = None;
                if let Some(id) = self.pending_buffer.take() {
                    self.held.push(id);
                }
            }
            Request::Pong(_) | Request::Frame { .. } => {}
        }
        Ok(())
    }
}

/// Returns the first violation in `log`, or `Ok(())`.
pub fn check(log: &WireLog) -> Result<(), Violation> {
    let mut audit = Audit::default();
    for (index, entry) in log.entries().iter().enumerate() {
        match entry {
            WireEntry::Event(event) => audit.event(event)?,
            WireEntry::Request(request) => audit.request(index, request)?,
        }
    }
    match audit.uncommitted_since {
        Some(index) => Err(Violation::Uncommitted { index }),
        None => Ok(()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::wire::BufferInfo;
    use pane_core::surface::DamageRect;

    fn log(entries: &[WireEntry]) -> WireLog {
        let mut log = WireLog::new();
        for e in entries {
            log.push(*e);
        }
        log
    }

    fn ev(e: Event) -> WireEntry {
        WireEntry::Event(e)
    }

    fn req(r: Request) -> WireEntry {
        WireEntry::Request(r)
    }

    fn buffer(w: u32, h: u32) -> Option<BufferInfo> {
        Some(BufferInfo {
            id: 1,
            size: SurfaceSize::new(w, h).unwrap(),
        })
    }

    const DAMAGE: Request = Request::Damage(DamageRect {
        x: 0,
        y: 0,
        width: 1,
        height: 1,
    });

    #[test]
    fn well_ordered_session_passes() {
        let log = log(&[
            req(Request::Commit),
            ev(Event::ToplevelConfigure {
                width: 0,
                height: 0,
            }),
            ev(Event::SurfaceConfigure(Serial(1))),
            req(Request::AckConfigure(Serial(1))),
            req(Request::Frame { token_id: 1 }),
            req(Request::Attach(buffer(640, 480))),
            req(DAMAGE),
            req(Request::Commit),
            ev(Event::Ping(Serial(2))),
            req(Request::Pong(Serial(2))),
        ]);
        assert_eq!(check(&log), Ok(()));
    }

    #[test]
    fn stale_ack_is_reported() {
        let log = log(&[
            ev(Event::SurfaceConfigure(Serial(1))),
            ev(Event::SurfaceConfigure(Serial(2))),
            req(Request::AckConfigure(Serial(1))),
        ]);
        assert_eq!(
            check(&log),
            Err(Violation::AckSerialMismatch {
                index: 2,
                expected: Some(Serial(2)),
                got: Serial(1)
            })
        );
    }

    #[test]
    fn attach_before_ack_is_reported() {
        let log = log(&[
            ev(Event::SurfaceConfigure(Serial(1))),
            req(Request::Attach(buffer(1, 1))),
        ]);
        assert_eq!(check(&log), Err(Violation::AttachBeforeAck { index: 1 }));
    }

    #[test]
    fn late_pong_is_reported() {
        let log = log(&[ev(Event::Ping(Serial(4))), req(Request::Commit)]);
        assert_eq!(
            check(&log),
            Err(Violation::PingNotAnswered {
                index: 1,
                serial: Serial(4)
            })
        );
    }

    #[test]
    fn missing_commit_is_reported() {
        let log = log(&[
            ev(Event::SurfaceConfigure(Serial(1))),
            req(Request::AckConfigure(Serial(1))),
            req(Request::Attach(buffer(1, 1))),
            req(DAMAGE),
        ]);
        assert_eq!(check(&log), Err(Violation::Uncommitted { index: 2 }));
    }

    #[test]
    fn wrong_size_after_resize_is_reported() {
        let log = log(&[
            ev(Event::ToplevelConfigure {
                width: 300,
                height: 200,
            }),
            ev(Event::SurfaceConfigure(Serial(1))),
            req(Request::AckConfigure(Serial(1))),
            req(Request::Attach(buffer(640, 480))),
        ]);
        assert!(
            matches!(check(&log), Err(Violation::WrongBufferSize { index: 3, .. })),
            "{:?}",
            check(&log)
        );
    }

    #[test]
    fn drawing_after_close_is_reported() {
        let mut entries = vec![
            ev(Event::SurfaceConfigure(Serial(1))),
            req(Request::AckConfigure(Serial(1))),
            ev(Event::Close),
        ];
        for _ in 0..2 {
            entries.push(req(Request::Attach(buffer(1, 1))));
            entries.push(req(Request::Commit));
        }
        assert_eq!(
            check(&log(&entries)),
            Err(Violation::DrawAfterClose { index: 5 })
        );
    }

    #[test]
    fn reattaching_a_held_buffer_is_reported() {
        let mut entries = vec![
            ev(Event::SurfaceConfigure(Serial(1))),
            req(Request::AckConfigure(Serial(1))),
            req(Request::Attach(buffer(1, 1))),
            req(Request::Commit),
            req(Request::Attach(buffer(1, 1))),
        ];
        assert_eq!(check(&log(&entries)), Err(Violation::AttachWhileHeld { index: 4, id: 1 }));

        entries.insert(4, ev(Event::BufferRelease(1)));
        entries.push(req(Request::Commit));
        assert_eq!(check(&log(&entries)), Ok(()));
    }
}
