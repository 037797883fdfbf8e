// Copyright 2026 the Pane Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! CPU renderer on `wl_shm`.
//!
//! Each buffer lives in its own anonymous file: an `O_TMPFILE` in
//! `$XDG_RUNTIME_DIR` (or `/tmp`), falling back to `memfd_create` where
//! `O_TMPFILE` is unsupported. The file is sized, mapped into this process,
//! shared with the compositor through a one-shot `wl_shm_pool` and carved into
//! a single `wl_buffer`. The pool is destroyed right after; the buffer keeps
//! the memory alive on the server side and the mapping keeps it alive here.
//!
//! Two buffers are kept. A buffer is only painted after the compositor sent
//! `wl_buffer.release` for it.

#![expect(unsafe_code, reason = "shared buffers are mapped with mmap")]

use std::ffi::OsString;
use std::io;
use std::os::fd::{AsFd, BorrowedFd, OwnedFd};
use std::path::PathBuf;
use std::ptr::{self, NonNull};
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};

use pane_core::SurfaceSize;
use pane_core::backend::{
    BackendError, FrameContext, InitStage, PresentError, Presentation, Renderer,
};
use pane_core::pixels::{BufferLayout, PixelFormat, Pattern, next_free_buffer, paint};
use pane_core::surface::{DamageRect, SurfaceOps};
use rustix::fs::{MemfdFlags, Mode, OFlags};
use rustix::mm::{MapFlags, ProtFlags};
use wayland_client::protocol::{wl_buffer, wl_shm};
use wayland_client::{Connection, Dispatch, QueueHandle};
use wayland_protocols::wp::viewporter::client::wp_viewport;

use crate::state::WaylandState;
use crate::surface::WaylandSurface;
use crate::target::RenderTarget;

/// Directory for `O_TMPFILE` buffers, given the value of `XDG_RUNTIME_DIR`.
fn shm_dir(runtime_dir: Option<OsString>) -> PathBuf {
    runtime_dir
        .filter(|dir| !dir.is_empty())
        .map_or_else(|| PathBuf::from("/tmp"), PathBuf::from)
}

/// Creates an unlinked file of `len` bytes.
fn anonymous_file(len: u64) -> io::Result<OwnedFd> {
    let dir = shm_dir(std::env::var_os("XDG_RUNTIME_DIR"));
    let fd = match rustix::fs::open(
        &dir,
        OFlags::RDWR | OFlags::TMPFILE | OFlags::CLOEXEC,
        Mode::RUSR | Mode::WUSR,
    ) {
        Ok(fd) => fd,
        Err(err) => {
            tracing::debug!(dir = %dir.display(), %err, "O_TMPFILE unavailable, using memfd");
            rustix::fs::memfd_create(c"pane-shm", MemfdFlags::CLOEXEC)?
        }
    };
    rustix::fs::ftruncate(&fd, len)?;
    Ok(fd)
}

/// A shared read/write mapping of a whole file.
#[derive(Debug)]
struct Mapping {
    ptr: NonNull<u8>,
    len: usize,
}

impl Mapping {
    fn new(fd: BorrowedFd<'_>, len: usize) -> io::Result<Self> {
        // SAFETY: a fresh mapping at an address of the kernel's choosing, so
        // no existing Rust object is aliased. The file is at least `len`
        // bytes long.
        let ptr = unsafe {
            rustix::mm::mmap(
                ptr::null_mut(),
                len,
                ProtFlags::READ | ProtFlags::WRITE,
                MapFlags::SHARED,
                fd,
                0,
            )?
        };
        let ptr = NonNull::new(ptr.cast::<u8>())
            .ok_or_else(|| io::Error::other("mmap returned a null pointer"))?;
        Ok(Self { ptr, len })
    }

    fn as_mut_slice(&mut self) -> &mut [u8] {
        // SAFETY: `ptr` is valid for `len` bytes until drop, and the
        // exclusive borrow of `self` prevents a second slice in this process.
        // The compositor only reads the memory while the buffer is busy, and
        // busy buffers are never painted.
        unsafe { std::slice::from_raw_parts_mut(self.ptr.as_ptr(), self.len) }
    }
}

impl Drop for Mapping {
    fn drop(&mut self) {
        // SAFETY: unmaps exactly the range `mmap` returned; no slice into it
        // outlives `self`.
        if let Err(err) = unsafe { rustix::mm::munmap(self.ptr.as_ptr().cast(), self.len) } {
            tracing::warn!(%err, "munmap failed");
        }
    }
}

/// One `wl_buffer` with its mapping and release flag.
#[derive(Debug)]
struct ShmBuffer {
    buffer: wl_buffer::WlBuffer,
    mapping: Mapping,
    layout: BufferLayout,
    busy: Arc<AtomicBool>,
}

impl ShmBuffer {
    fn allocate(
        shm: &wl_shm::WlShm,
        qh: &QueueHandle<WaylandState>,
        layout: BufferLayout,
    ) -> Result<Self, BackendError> {
        let shared = |err: io::Error| BackendError::init(InitStage::SharedMemory, err.to_string());
        let fd = anonymous_file(layout.byte_len() as u64).map_err(shared)?;
        let mapping = Mapping::new(fd.as_fd(), layout.byte_len()).map_err(shared)?;

        let (width, height) = layout.size().to_i32();
        let busy = Arc::new(AtomicBool::new(false));
        let pool = shm.create_pool(fd.as_fd(), layout.byte_len_i32(), qh, ());
        let buffer = pool.create_buffer(
            0,
            width,
            height,
            layout.stride_i32(),
            wl_format(layout.format()),
            qh,
            Arc::clone(&busy),
        );
        pool.destroy();

        tracing::debug!(width, height, bytes = layout.byte_len(), "allocated shm buffer");
        Ok(Self {
            buffer,
            mapping,
            layout,
            busy,
        })
    }

    fn is_busy(&self) -> bool {
        self.busy.load(Ordering::Acquire)
    }
}

impl Drop for ShmBuffer {
    fn drop(&mut self) {
        self.buffer.destroy();
    }
}

fn wl_format(format: PixelFormat) -> wl_shm::Format {
    match format {
        PixelFormat::Argb8888 => wl_shm::Format::Argb8888,
        PixelFormat::Xrgb8888 => wl_shm::Format::Xrgb8888,
    }
}

impl Dispatch<wl_buffer::WlBuffer, Arc<AtomicBool>> for WaylandState {
    fn event(
        _state: &mut Self,
        _buffer: &wl_buffer::WlBuffer,
        event: wl_buffer::Event,
        busy: &Arc<AtomicBool>,
        _conn: &Connection,
        _qh: &QueueHandle<Self>,
    ) {
        if let wl_buffer::Event::Release = event {
            busy.store(false, Ordering::Release);
        }
    }
}

/// Options for [`ShmRenderer`].
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct ShmOptions {
    /// What to paint.
    pub pattern: Pattern,
    /// Pixel format of the buffers.
    pub format: PixelFormat,
    /// Keep buffers at this size and let `wp_viewport` scale them to the
    /// window. Without a viewporter the window takes the buffer size.
    pub fixed_size: Option<SurfaceSize>,
}

/// Double-buffered shared-memory renderer.
#[derive(Debug)]
pub struct ShmRenderer {
    shm: wl_shm::WlShm,
    qh: QueueHandle<WaylandState>,
    viewport: Option<wp_viewport::WpViewport>,
    options: ShmOptions,
    window_size: SurfaceSize,
    buffers: Vec<ShmBuffer>,
    next: usize,
}

impl ShmRenderer {
    /// Number of buffers cycled through.
    pub const BUFFER_COUNT: usize = 2;

    /// Allocates both buffers for a window of `size`.
    pub fn new(
        target: &RenderTarget,
        size: SurfaceSize,
        options: ShmOptions,
    ) -> Result<Self, BackendError> {
        let viewport = match (options.fixed_size, target.viewporter()) {
            (Some(_), Some(viewporter)) => {
                Some(viewporter.get_viewport(target.surface(), target.queue_handle(), ()))
            }
            (Some(fixed), None) => {
                tracing::warn!(
                    width = fixed.width(),
                    height = fixed.height(),
                    "no wp_viewporter; window will match the fixed buffer size"
                );
                None
            }
            (None, _) => None,
        };
        let mut renderer = Self {
            shm: target.shm().clone(),
            qh: target.queue_handle().clone(),
            viewport,
            options,
            window_size: size,
            buffers: Vec::with_capacity(Self::BUFFER_COUNT),
            next: 0,
        };
        renderer.allocate()?;
        renderer.update_viewport();
        Ok(renderer)
    }

    /// Size the buffers are allocated at.
    #[must_use]
    pub fn buffer_size(&self) -> SurfaceSize {
        self.options.fixed_size.unwrap_or(self.window_size)
    }

    fn allocate(&mut self) -> Result<(), BackendError> {
        let layout = BufferLayout::new(self.buffer_size(), self.options.format)
            .map_err(|err| BackendError::init(InitStage::SharedMemory, err.to_string()))?;
        self.buffers.clear();
        for _ in 0..Self::BUFFER_COUNT {
            self.buffers
                .push(ShmBuffer::allocate(&self.shm, &self.qh, layout)?);
        }
        self.next = 0;
        Ok(())
    }

    fn update_viewport(&self) {
        if let Some(viewport) = &self.viewport {
            let (width, height) = self.window_size.to_i32();
            viewport.set_destination(width, height);
        }
    }

    /// Index of a buffer the compositor is not reading, preferring `next`.
    fn free_buffer(&self) -> Option<usize> {
        let busy: [bool; Self::BUFFER_COUNT] = core::array::from_fn(|index| {
            self.buffers.get(index).is_none_or(ShmBuffer::is_busy)
        });
        next_free_buffer(&busy, self.next)
    }
}

impl Drop for ShmRenderer {
    fn drop(&mut self) {
        self.buffers.clear();
        if let Some(viewport) = self.viewport.take() {
            viewport.destroy();
        }
    }
}

impl Renderer<WaylandSurface> for ShmRenderer {
    fn resize(&mut self, size: SurfaceSize) {
        self.window_size = size;
        if self.options.fixed_size.is_some() {
            self.update_viewport();
        } else {
            // Reallocated lazily by the next render.
            self.buffers.clear();
        }
    }

    fn render_frame(
        &mut self,
        target: &mut WaylandSurface,
        frame: &FrameContext,
    ) -> Result<Presentation, PresentError> {
        if self.buffers.is_empty() {
            self.allocate()
                .map_err(|err| PresentError::Failed(err.to_string()))?;
        }
        let index = self.free_buffer().ok_or(PresentError::BuffersBusy)?;
        let buffer = &mut self.buffers[index];

        let layout = buffer.layout;
        paint(buffer.mapping.as_mut_slice(), &layout, &self.options.pattern, frame)
            .map_err(|err| PresentError::Failed(err.to_string()))?;
        buffer.busy.store(true, Ordering::Release);

        target.attach(Some(&buffer.buffer));
        target.damage(DamageRect::full(layout.size()));
        target.commit();

        self.next = (index + 1) % self.buffers.len();
        Ok(Presentation::Committed)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn runtime_dir_is_preferred() {
        assert_eq!(
            shm_dir(Some(OsString::from("/run/user/1000"))),
            PathBuf::from("/run/user/1000")
        );
    }

    #[test]
    fn missing_or_empty_runtime_dir_uses_tmp() {
        assert_eq!(shm_dir(None), PathBuf::from("/tmp"));
        assert_eq!(shm_dir(Some(OsString::new())), PathBuf::from("/tmp"));
    }

    #[test]
    fn anonymous_file_has_requested_size() {
        let fd = anonymous_file(4096).unwrap();
        let stat = rustix::fs::fstat(&fd).unwrap();
        assert_eq!(stat.st_size, 4096, "file should be truncated to size");
    }

    #[test]
    fn mapping_is_shared_with_the_file() {
        let fd = anonymous_file(16).unwrap();
        let mut mapping = Mapping::new(fd.as_fd(), 16).unwrap();
        mapping.as_mut_slice().copy_from_slice(&[0xAB; 16]);

        let mut second = Mapping::new(fd.as_fd(), 16).unwrap();
        assert_eq!(second.as_mut_slice(), &[0xAB; 16], "writes should reach the file");
    }

    #[test]
    fn formats_map_to_wl_shm() {
        assert_eq!(wl_format(PixelFormat::Argb8888), wl_shm::Format::Argb8888);
        assert_eq!(wl_format(PixelFormat::Xrgb8888), wl_shm::Format::Xrgb8888);
    }
}
