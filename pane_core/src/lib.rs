// Copyright 2026 the Pane Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Platform-agnostic pieces of a minimal native window session.
//!
//! `pane_core` holds everything about "open a window and draw into it" that
//! does not depend on a particular display server or graphics API. It is
//! `no_std` compatible (with `alloc`), so the state machines can be driven
//! by a real compositor connection or by a scripted one in tests.
//!
//! # Architecture
//!
//! ```text
//!   Backend (display server events)
//!       │ ping / configure / close / frame done
//!       ▼
//!   SessionDriver ──► Handshake (serials, sizes)
//!       │          └─► FramePacer (single-fire frame tokens)
//!       ▼
//!   Renderer::render_frame() ──► SurfaceOps (attach, damage, commit)
//! ```
//!
//! **[`handshake`]**: The per-surface configure state machine. Every
//! configure serial is acknowledged exactly once, before any buffer is
//! attached.
//!
//! **[`frame`]**: One-shot frame tokens. A token is requested per drawn
//! frame, fires once when the compositor reports the frame done, and is never
//! reused.
//!
//! **[`session`]**: [`SessionDriver`](session::SessionDriver) wires the
//! handshake, the pacer and a lazily-created renderer together. Backends feed
//! it protocol events; it issues the protocol requests through
//! [`SurfaceOps`](surface::SurfaceOps).
//!
//! **[`backend`]**: The [`Renderer`](backend::Renderer) trait implemented by
//! the CPU, OpenGL ES, wgpu and Direct3D 11 renderers, plus the fatal and
//! recoverable error types they report.
//!
//! **[`pixels`]**: Shared-memory buffer layout math and CPU fill patterns.
//!
//! **[`geometry`]**: The static triangle every GPU renderer draws.
//!
//! **[`trace`]**: [`TraceSink`](trace::TraceSink) trait and session events,
//! with a zero-overhead [`Tracer`](trace::Tracer) wrapper.
//!
//! # Crate features
//!
//! - `trace` (disabled by default): Enables `Tracer` method bodies (one branch
//!   per call site).

#![no_std]
#![cfg_attr(docsrs, feature(doc_auto_cfg))]

extern crate alloc;

pub mod backend;
pub mod config;
pub mod frame;
pub mod geometry;
pub mod handshake;
pub mod pixels;
pub mod session;
pub mod size;
pub mod surface;
pub mod time;
pub mod trace;

pub use backend::{BackendError, PresentError, Presentation, Renderer};
pub use config::WindowConfig;
pub use handshake::HandshakeError;
pub use session::SessionError;
pub use size::{Serial, SurfaceSize};
