// Copyright 2026 the Pane Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Per-surface configure handshake.
//!
//! A top-level surface goes through these phases:
//!
//! ```text
//!   Created ──commit (no buffer)──► AwaitingConfigure
//!                                        │ configure(serial)
//!                                        ▼
//!                        ┌──────── Configured(size) ◄──┐
//!                        │               │ configure   │
//!                        │               └─────────────┘
//!                        ▼ close (from any phase)
//!                     Closing
//! ```
//!
//! The compositor may suggest a size through the toplevel before the surface
//! configure that completes the sequence. [`Handshake::suggest_size`] stores
//! that suggestion; [`Handshake::configure`] applies it atomically with the
//! serial that has to be acknowledged.

use crate::size::{Serial, SurfaceSize};

/// Where a surface is in the configure handshake.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum SurfacePhase {
    /// The surface exists but the initial bare commit has not happened.
    Created,
    /// The bare commit was sent; waiting for the first configure.
    AwaitingConfigure,
    /// At least one configure was received and acknowledged.
    Configured(SurfaceSize),
    /// The compositor asked the window to close.
    Closing,
}

/// How a configure changed the surface.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum ConfigureKind {
    /// The first configure; the renderer can now be created.
    Initial,
    /// A later configure with a different size.
    Resized {
        /// Size before this configure.
        previous: SurfaceSize,
    },
    /// A later configure that kept the size (state changes, focus, ...).
    Unchanged,
}

/// Result of a surface configure: what to acknowledge and what changed.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct Configure {
    /// Serial that must be passed to `ack_configure`.
    pub serial: Serial,
    /// Surface size after this configure.
    pub size: SurfaceSize,
    /// Transition classification.
    pub kind: ConfigureKind,
}

/// Misuse of the handshake sequence.
#[derive(Clone, Copy, Debug, PartialEq, Eq, thiserror::Error)]
pub enum HandshakeError {
    /// The initial bare commit was already requested.
    #[error("initial configure was already requested")]
    AlreadyRequested,
    /// A configure arrived before the initial bare commit.
    #[error("configure {0:?} received before the initial commit")]
    NotRequested(Serial),
    /// A configure arrived after the window started closing.
    #[error("configure {0:?} received while closing")]
    Closing(Serial),
}

/// Configure handshake state for one surface.
#[derive(Clone, Debug)]
pub struct Handshake {
    phase: SurfacePhase,
    size: SurfaceSize,
    pending_size: Option<SurfaceSize>,
    last_serial: Option<Serial>,
}

impl Handshake {
    /// Creates the handshake for a new surface. `initial` is used as the
    /// surface size until the compositor suggests a different one.
    #[must_use]
    pub const fn new(initial: SurfaceSize) -> Self {
        Self {
            phase: SurfacePhase::Created,
            size: initial,
            pending_size: None,
            last_serial: None,
        }
    }

    /// Current phase.
    #[must_use]
    pub const fn phase(&self) -> SurfacePhase {
        self.phase
    }

    /// The client's current notion of the surface size.
    #[must_use]
    pub const fn size(&self) -> SurfaceSize {
        self.size
    }

    /// Serial of the most recent configure.
    #[must_use]
    pub const fn last_serial(&self) -> Option<Serial> {
        self.last_serial
    }

    /// Returns `true` once the first configure has been handled and the
    /// window has not started closing.
    #[must_use]
    pub const fn is_configured(&self) -> bool {
        matches!(self.phase, SurfacePhase::Configured(_))
    }

    /// Records the bare commit that asks the compositor for the initial
    /// configure.
    pub fn request_configure(&mut self) -> Result<(), HandshakeError> {
        match self.phase {
            SurfacePhase::Created => {
                self.phase = SurfacePhase::AwaitingConfigure;
                Ok(())
            }
            _ => Err(HandshakeError::AlreadyRequested),
        }
    }

    /// Records a size suggested by the toplevel configure.
    ///
    /// Returns `false` (and keeps the previous suggestion) when either
    /// dimension is zero or negative.
    pub fn suggest_size(&mut self, width: i32, height: i32) -> bool {
        match SurfaceSize::from_suggested(width, height) {
            Some(size) => {
                self.pending_size = Some(size);
                true
            }
            None => false,
        }
    }

    /// Handles the surface configure that ends a configure sequence.
    pub fn configure(&mut self, serial: Serial) -> Result<Configure, HandshakeError> {
        let previous = match self.phase {
            SurfacePhase::Created => return Err(HandshakeError::NotRequested(serial)),
            SurfacePhase::Closing => return Err(HandshakeError::Closing(serial)),
            SurfacePhase::AwaitingConfigure => None,
            SurfacePhase::Configured(size) => Some(size),
        };

        if let Some(size) = self.pending_size.take() {
            self.size = size;
        }
        self.last_serial = Some(serial);
        self.phase = SurfacePhase::Configured(self.size);

        let kind = match previous {
            None => ConfigureKind::Initial,
            Some(previous) if previous != self.size => ConfigureKind::Resized { previous },
            Some(_) => ConfigureKind::Unchanged,
        };
        Ok(Configure {
            serial,
            size: self.size,
            kind,
        })
    }

    /// Moves to [`SurfacePhase::Closing`]. Idempotent.
    pub fn close(&mut self) {
        self.phase = SurfacePhase::Closing;
        self.pending_size = None;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn size(w: u32, h: u32) -> SurfaceSize {
        SurfaceSize::new(w, h).expect("non-zero test size")
    }

    #[test]
    fn initial_configure_uses_default_size_without_suggestion() {
        let mut hs = Handshake::new(size(640, 480));
        hs.request_configure().expect("first request");
        assert_eq!(hs.phase(), SurfacePhase::AwaitingConfigure);

        let cfg = hs.configure(Serial(3)).expect("configure after request");
        assert_eq!(cfg.kind, ConfigureKind::Initial);
        assert_eq!(cfg.size, size(640, 480));
        assert_eq!(cfg.serial, Serial(3));
        assert_eq!(hs.phase(), SurfacePhase::Configured(size(640, 480)));
    }

    #[test]
    fn suggested_size_applies_on_surface_configure() {
        let mut hs = Handshake::new(size(640, 480));
        hs.request_configure().expect("first request");
        assert!(hs.suggest_size(1024, 768), "positive suggestion is kept");
        assert_eq!(hs.size(), size(640, 480), "not applied before configure");

        let cfg = hs.configure(Serial(1)).expect("configure");
        assert_eq!(cfg.size, size(1024, 768));
    }

    #[test]
    fn zero_suggestion_is_ignored() {
        let mut hs = Handshake::new(size(640, 480));
        hs.request_configure().expect("first request");
        hs.configure(Serial(1)).expect("initial");

        assert!(!hs.suggest_size(0, 0), "0x0 means client decides");
        assert!(!hs.suggest_size(300, 0), "0 height is ignored");
        let cfg = hs.configure(Serial(2)).expect("second configure");
        assert_eq!(cfg.kind, ConfigureKind::Unchanged);
        assert_eq!(cfg.size, size(640, 480));
    }

    #[test]
    fn resize_reports_previous_size() {
        let mut hs = Handshake::new(size(640, 480));
        hs.request_configure().expect("first request");
        hs.configure(Serial(1)).expect("initial");

        hs.suggest_size(200, 100);
        let cfg = hs.configure(Serial(2)).expect("resize");
        assert_eq!(
            cfg.kind,
            ConfigureKind::Resized {
                previous: size(640, 480)
            }
        );
        assert_eq!(hs.last_serial(), Some(Serial(2)));
    }

    #[test]
    fn configure_before_request_is_rejected() {
        let mut hs = Handshake::new(SurfaceSize::DEFAULT);
        assert_eq!(
            hs.configure(Serial(9)),
            Err(HandshakeError::NotRequested(Serial(9)))
        );
    }

    #[test]
    fn double_request_is_rejected() {
        let mut hs = Handshake::new(SurfaceSize::DEFAULT);
        hs.request_configure().expect("first request");
        assert_eq!(
            hs.request_configure(),
            Err(HandshakeError::AlreadyRequested)
        );
    }

    #[test]
    fn close_is_terminal() {
        let mut hs = Handshake::new(SurfaceSize::DEFAULT);
        hs.request_configure().expect("first request");
        hs.configure(Serial(1)).expect("initial");
        hs.close();
        hs.close();
        assert_eq!(hs.phase(), SurfacePhase::Closing);
        assert!(!hs.is_configured(), "closing windows are not configured");
        assert_eq!(hs.configure(Serial(2)), Err(HandshakeError::Closing(Serial(2))));
    }
}
