// Copyright 2026 the Pane Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Client requests on a top-level surface.
//!
//! [`SurfaceOps`] is the seam between the protocol-agnostic
//! [`SessionDriver`](crate::session::SessionDriver) and a real connection. The
//! Wayland backend implements it on top of `wl_surface`/`xdg_surface`/
//! `xdg_wm_base`; test doubles record the calls.

use crate::frame::FrameToken;
use crate::size::{Serial, SurfaceSize};

/// A rectangle in buffer coordinates that changed since the last commit.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct DamageRect {
    /// Left edge.
    pub x: i32,
    /// Top edge.
    pub y: i32,
    /// Width.
    pub width: i32,
    /// Height.
    pub height: i32,
}

impl DamageRect {
    /// A rectangle covering a whole buffer of `size`.
    #[must_use]
    pub fn full(size: SurfaceSize) -> Self {
        let (width, height) = size.to_i32();
        Self {
            x: 0,
            y: 0,
            width,
            height,
        }
    }
}

/// Requests a client issues on its surface.
///
/// Ordering contract, enforced by callers rather than implementors:
///
/// - `ack_configure` carries the serial of the configure being answered and
///   precedes any `attach` for that configure.
/// - `damage` precedes the `commit` that should redraw it.
/// - `pong` is sent as soon as a ping is seen, before any other request.
pub trait SurfaceOps {
    /// Server-side buffer handle type.
    type Buffer;

    /// Attaches `buffer` (or detaches, with `None`) at offset (0, 0).
    fn attach(&mut self, buffer: Option<&Self::Buffer>);

    /// Marks a region of the attached buffer as changed.
    fn damage(&mut self, rect: DamageRect);

    /// Atomically applies pending state (buffer, damage, acks, frame
    /// requests).
    fn commit(&mut self);

    /// Acknowledges a configure.
    fn ack_configure(&mut self, serial: Serial);

    /// Answers a liveness ping.
    fn pong(&mut self, serial: Serial);

    /// Asks for a "frame done" notification for the next commit. The
    /// implementation keeps `token` until the notification fires.
    fn request_frame(&mut self, token: FrameToken);
}
