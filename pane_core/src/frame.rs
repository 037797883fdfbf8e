// Copyright 2026 the Pane Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Single-fire frame tokens.
//!
//! After each present the client asks the compositor for a "frame done"
//! notification tied to the surface. The notification is the only thing that
//! schedules the next draw. [`FramePacer`] hands out one [`FrameToken`] per
//! request, accepts exactly one firing for it, and never reissues an id.

/// A one-shot "previous frame displayed" notification handle.
///
/// Tokens are neither `Clone` nor `Copy`: the backend moves each one into the
/// platform callback object it belongs to, and the token is dropped together
/// with that object after firing.
#[derive(Debug, PartialEq, Eq, Hash)]
pub struct FrameToken {
    id: u64,
}

impl FrameToken {
    /// Unique id of this token within its pacer.
    #[must_use]
    pub const fn id(&self) -> u64 {
        self.id
    }
}

/// Delivered when the outstanding token fires.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct FrameDone {
    /// Id of the token that fired.
    pub token_id: u64,
    /// Compositor timestamp carried by the notification, in milliseconds with
    /// an undefined base.
    pub callback_time_ms: u32,
}

/// Frame-pacing misuse.
#[derive(Clone, Copy, Debug, PartialEq, Eq, thiserror::Error)]
pub enum FrameError {
    /// A token is already outstanding; wait for it to fire.
    #[error("frame token {0} is still outstanding")]
    AlreadyPending(u64),
}

/// Issues and validates [`FrameToken`]s.
///
/// At most one token is outstanding at a time.
#[derive(Debug, Default)]
pub struct FramePacer {
    next_id: u64,
    pending: Option<u64>,
    fired: u64,
}

impl FramePacer {
    /// Creates a pacer with no outstanding token.
    #[must_use]
    pub const fn new() -> Self {
        Self {
            next_id: 1,
            pending: None,
            fired: 0,
        }
    }

    /// Requests a new token.
    pub fn request(&mut self) -> Result<FrameToken, FrameError> {
        if let Some(id) = self.pending {
            return Err(FrameError::AlreadyPending(id));
        }
        let id = self.next_id.max(1);
        self.next_id = id + 1;
        self.pending = Some(id);
        Ok(FrameToken { id })
    }

    /// Fires `token` if it is the outstanding one.
    ///
    /// Returns `None` for stale tokens (already fired, cancelled, or from a
    /// previous request). The token is invalid afterwards either way.
    pub fn fire(&mut self, token: &FrameToken, callback_time_ms: u32) -> Option<FrameDone> {
        if self.pending != Some(token.id) {
            return None;
        }
        self.pending = None;
        self.fired += 1;
        Some(FrameDone {
            token_id: token.id,
            callback_time_ms,
        })
    }

    /// Returns `true` while a token is outstanding.
    #[must_use]
    pub const fn is_pending(&self) -> bool {
        self.pending.is_some()
    }

    /// Invalidates the outstanding token, if any.
    pub fn cancel(&mut self) {
        self.pending = None;
    }

    /// Number of tokens that have fired.
    #[must_use]
    pub const fn fired_count(&self) -> u64 {
        self.fired
    }
}
