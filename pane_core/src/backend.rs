// Copyright 2026 the Pane Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Renderer contract for graphics backends.
//!
//! Every way of putting pixels into a window implements [`Renderer`]:
//!
//! - **CPU shared memory**: fills an ARGB8888 buffer and attaches it.
//! - **OpenGL ES over EGL**, **wgpu**, **Direct3D 11**: draw the static
//!   [`TRIANGLE`](crate::geometry::TRIANGLE) and present through the API's
//!   swap surface.
//!
//! Renderers are created lazily, after the first configure, by a factory the
//! backend hands to the [`SessionDriver`](crate::session::SessionDriver).
//! Creation failures are fatal ([`BackendError`]); present failures are not
//! ([`PresentError`]) and the loop retries on the next frame.
//!
//! Teardown is `Drop`. Implementations release their resources in reverse
//! acquisition order and must cope with having been only partly built.

use alloc::boxed::Box;
use alloc::string::String;

use crate::size::SurfaceSize;
use crate::time::Duration;

/// Per-frame input handed to [`Renderer::render_frame`].
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct FrameContext {
    /// Zero-based index of the frame being drawn.
    pub frame_index: u64,
    /// Current surface size.
    pub size: SurfaceSize,
    /// Time since the session's first frame.
    pub elapsed: Duration,
}

/// What the present path did to the surface.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Presentation {
    /// The renderer committed the surface itself (attach + commit, swap
    /// buffers, queue present).
    Committed,
    /// Nothing was committed; the caller must commit so that pending requests
    /// (acks, frame callbacks) take effect.
    Uncommitted,
}

/// Initialisation step that failed.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum InitStage {
    /// Obtaining the API display/instance from the native connection.
    Display,
    /// Choosing a framebuffer configuration or adapter.
    Config,
    /// Creating the window-sized drawable (EGL surface, swapchain, ...).
    Surface,
    /// Creating the device/context.
    Context,
    /// Making the context current.
    MakeCurrent,
    /// Allocating shared memory.
    SharedMemory,
}

/// Shader stage, for compile diagnostics.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum ShaderStage {
    /// Vertex stage.
    Vertex,
    /// Fragment/pixel stage.
    Fragment,
}

/// Fatal renderer failure.
#[derive(Clone, Debug, PartialEq, Eq, thiserror::Error)]
pub enum BackendError {
    /// A step of context/device creation failed.
    #[error("{stage:?} initialisation failed: {message}")]
    Init {
        /// Failing step.
        stage: InitStage,
        /// Driver or OS diagnostic.
        message: String,
    },
    /// A shader failed to compile; `log` is the driver's info log.
    #[error("{stage:?} shader failed to compile: {log}")]
    ShaderCompile {
        /// Failing stage.
        stage: ShaderStage,
        /// Compiler diagnostic.
        log: String,
    },
    /// The pipeline/program failed to link.
    #[error("pipeline failed to link: {log}")]
    PipelineLink {
        /// Linker diagnostic.
        log: String,
    },
    /// A GPU or shared-memory resource could not be created.
    #[error("failed to create {what}: {message}")]
    Resource {
        /// What was being created.
        what: &'static str,
        /// Diagnostic.
        message: String,
    },
}

impl BackendError {
    /// Shorthand for [`BackendError::Init`].
    pub fn init(stage: InitStage, message: impl Into<String>) -> Self {
        Self::Init {
            stage,
            message: message.into(),
        }
    }

    /// Shorthand for [`BackendError::Resource`].
    pub fn resource(what: &'static str, message: impl Into<String>) -> Self {
        Self::Resource {
            what,
            message: message.into(),
        }
    }
}

/// Recoverable present failure. The frame is skipped.
#[derive(Clone, Debug, PartialEq, Eq, thiserror::Error)]
pub enum PresentError {
    /// The swap surface no longer matches the window and was reconfigured.
    #[error("swap surface outdated")]
    Outdated,
    /// The swap surface was lost and was recreated.
    #[error("swap surface lost")]
    Lost,
    /// Acquiring the next image timed out.
    #[error("timed out acquiring the next image")]
    Timeout,
    /// Every CPU buffer is still held by the compositor.
    #[error("all buffers are still in use by the compositor")]
    BuffersBusy,
    /// Any other present failure, with the driver diagnostic.
    #[error("present failed: {0}")]
    Failed(String),
}

/// Draws frames into one window surface.
///
/// `S` is the surface type the renderer presents to; GPU renderers that
/// present through their own swap surface accept any `S`.
pub trait Renderer<S: ?Sized> {
    /// Applies a new surface size. Called with non-zero sizes only, before the
    /// next frame is drawn.
    fn resize(&mut self, size: SurfaceSize);

    /// Draws and presents one frame.
    fn render_frame(
        &mut self,
        target: &mut S,
        frame: &FrameContext,
    ) -> Result<Presentation, PresentError>;
}

impl<S: ?Sized, R: Renderer<S> + ?Sized> Renderer<S> for Box<R> {
    fn resize(&mut self, size: SurfaceSize) {
        (**self).resize(size);
    }

    fn render_frame(
        &mut self,
        target: &mut S,
        frame: &FrameContext,
    ) -> Result<Presentation, PresentError> {
        (**self).render_frame(target, frame)
    }
}
