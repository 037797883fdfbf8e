// Copyright 2026 the Pane Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Event-queue ownership for a Wayland session.
//!
//! The session owns one `EventQueue<WaylandState>` together with the state
//! its `Dispatch` impls mutate.
//!
//! ```text
//! Session
//!   EventLoop
//!     EventQueue<WaylandState> ──▶ QueueHandle<WaylandState>
//!     WaylandState { driver, window, globals, fatal }
//! every proxy (registry, globals, surfaces, callbacks, buffers)
//! is created with EventLoop::queue_handle()
//! ```
//!
//! Using any other queue handle causes silent non-delivery of events.

use wayland_client::{Connection, EventQueue, QueueHandle};

use crate::error::WaylandError;
use crate::state::WaylandState;

/// Owned queue plus the state it dispatches into.
#[derive(Debug)]
pub(crate) struct EventLoop {
    event_queue: EventQueue<WaylandState>,
    state: WaylandState,
}

impl EventLoop {
    pub(crate) fn new(connection: &Connection) -> Self {
        Self {
            event_queue: connection.new_event_queue(),
            state: WaylandState::default(),
        }
    }

    /// Queue handle for every backend object.
    pub(crate) fn queue_handle(&self) -> QueueHandle<WaylandState> {
        self.event_queue.handle()
    }

    /// Blocks until the server has processed every request sent so far,
    /// dispatching the events it produced.
    pub(crate) fn roundtrip(&mut self) -> Result<usize, WaylandError> {
        Ok(self.event_queue.roundtrip(&mut self.state)?)
    }

    /// Flushes requests, blocks for new events when needed, and dispatches.
    pub(crate) fn blocking_dispatch(&mut self) -> Result<usize, WaylandError> {
        Ok(self.event_queue.blocking_dispatch(&mut self.state)?)
    }

    /// Flushes pending outgoing requests to the Wayland socket.
    pub(crate) fn flush(&self) -> Result<(), WaylandError> {
        Ok(self.event_queue.flush()?)
    }

    pub(crate) fn state(&self) -> &WaylandState {
        &self.state
    }

    pub(crate) fn state_mut(&mut self) -> &mut WaylandState {
        &mut self.state
    }
}
