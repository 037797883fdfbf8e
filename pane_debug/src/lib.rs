// Copyright 2026 the Pane Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Recording, pretty-printing and headless replay of pane sessions.
//!
//! Trace sinks for [`TraceSink`](pane_core::trace::TraceSink):
//!
//! - [`pretty::PrettyPrintSink`]: one human-readable line per event.
//! - [`recorder::RecorderSink`]: compact binary recording, read back with
//!   [`recorder::decode`].
//! - [`chrome::export`]: Chrome Trace Event Format JSON from recorded bytes.
//!
//! Protocol testing without a compositor:
//!
//! - [`wire::ScriptedCompositor`] feeds scripted events to a
//!   [`SessionDriver`](pane_core::session::SessionDriver) and logs every
//!   event and request on a [`wire::WireLog`].
//! - [`memory::MemoryRenderer`] paints into plain byte buffers.
//! - [`conformance::check`] reports the first protocol-ordering violation in
//!   a log.

pub mod chrome;
pub mod conformance;
pub mod memory;
pub mod pretty;
pub mod recorder;
pub mod wire;
