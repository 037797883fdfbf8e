// Copyright 2026 the Pane Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! OpenGL ES 2 renderer on a `wl_egl_window`.
//!
//! Setup order is display, config, window, surface, context, make-current,
//! program, vertex buffer. Teardown runs the other way round and skips the
//! steps that never happened.

#![expect(unsafe_code, reason = "EGL and GL calls are foreign functions")]

use std::fmt;

use glow::HasContext;
use khronos_egl as egl;
use pane_core::SurfaceSize;
use pane_core::backend::{
    BackendError, FrameContext, InitStage, PresentError, Presentation, Renderer, ShaderStage,
};
use pane_core::geometry::{
    CLEAR_COLOR, COLOR_OFFSET, POSITION_OFFSET, VERTEX_COUNT, VERTEX_STRIDE, triangle_bytes,
};
use wayland_client::Proxy;
use wayland_egl::WlEglSurface;

use crate::surface::WaylandSurface;
use crate::target::RenderTarget;

const VERTEX_SHADER: &str = "\
attribute vec2 position;
attribute vec3 color;
varying vec3 v_color;
void main() {
    gl_Position = vec4(position, 0.0, 1.0);
    v_color = color;
}
";

const FRAGMENT_SHADER: &str = "\
precision mediump float;
varying vec3 v_color;
void main() {
    gl_FragColor = vec4(v_color, 1.0);
}
";

const CONFIG_ATTRIBS: [egl::Int; 17] = [
    egl::SURFACE_TYPE,
    egl::WINDOW_BIT,
    egl::RED_SIZE,
    8,
    egl::GREEN_SIZE,
    8,
    egl::BLUE_SIZE,
    8,
    egl::ALPHA_SIZE,
    8,
    egl::DEPTH_SIZE,
    24,
    egl::STENCIL_SIZE,
    8,
    egl::RENDERABLE_TYPE,
    egl::OPENGL_ES2_BIT,
    egl::NONE,
];

const CONTEXT_ATTRIBS: [egl::Int; 3] = [egl::CONTEXT_CLIENT_VERSION, 2, egl::NONE];

struct GlObjects {
    gl: glow::Context,
    program: glow::Program,
    vbo: glow::Buffer,
    position: u32,
    color: u32,
}

/// Draws the static triangle with OpenGL ES 2.
pub struct EglRenderer {
    egl: egl::Instance<egl::Static>,
    display: egl::Display,
    window: Option<WlEglSurface>,
    surface: Option<egl::Surface>,
    context: Option<egl::Context>,
    objects: Option<GlObjects>,
    size: SurfaceSize,
}

impl fmt::Debug for EglRenderer {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("EglRenderer")
            .field("display", &self.display)
            .field("size", &self.size)
            .finish_non_exhaustive()
    }
}

impl EglRenderer {
    /// Initialises EGL on the target's connection and builds the GL program.
    pub fn new(target: &RenderTarget, size: SurfaceSize) -> Result<Self, BackendError> {
        let egl = egl::Instance::new(egl::Static);
        let native = target.connection().backend().display_ptr().cast();
        // SAFETY: `native` is the live `wl_display` of a connection the
        // target keeps open for longer than this renderer.
        let display = unsafe { egl.get_display(native) }
            .ok_or_else(|| BackendError::init(InitStage::Display, "eglGetDisplay failed"))?;
        let (major, minor) = egl
            .initialize(display)
            .map_err(|err| egl_error(InitStage::Display, err))?;
        tracing::debug!(major, minor, "EGL initialised");

        // From here on, dropping `renderer` undoes whatever was set up.
        let mut renderer = Self {
            egl,
            display,
            window: None,
            surface: None,
            context: None,
            objects: None,
            size,
        };

        renderer
            .egl
            .bind_api(egl::OPENGL_ES_API)
            .map_err(|err| egl_error(InitStage::Config, err))?;
        let config = renderer
            .egl
            .choose_first_config(display, &CONFIG_ATTRIBS)
            .map_err(|err| egl_error(InitStage::Config, err))?
            .ok_or_else(|| BackendError::init(InitStage::Config, "no matching EGL config"))?;

        let (width, height) = size.to_i32();
        let window = WlEglSurface::new(target.surface().id(), width, height)
            .map_err(|err| BackendError::init(InitStage::Surface, err.to_string()))?;
        // SAFETY: the `wl_egl_window` is stored next to the EGL surface and
        // destroyed only after it.
        let surface = unsafe {
            renderer
                .egl
                .create_window_surface(display, config, window.ptr().cast_mut(), None)
        }
        .map_err(|err| egl_error(InitStage::Surface, err))?;
        renderer.window = Some(window);
        renderer.surface = Some(surface);

        let context = renderer
            .egl
            .create_context(display, config, None, &CONTEXT_ATTRIBS)
            .map_err(|err| egl_error(InitStage::Context, err))?;
        renderer.context = Some(context);
        renderer
            .egl
            .make_current(display, Some(surface), Some(surface), Some(context))
            .map_err(|err| egl_error(InitStage::MakeCurrent, err))?;
        // Frame callbacks pace the loop; swaps must not block on their own.
        if let Err(err) = renderer.egl.swap_interval(display, 0) {
            tracing::warn!(%err, "eglSwapInterval(0) failed");
        }

        // SAFETY: the context created above is current on this thread, so
        // every loaded entry point belongs to it.
        let gl = unsafe {
            glow::Context::from_loader_function(|name| {
                renderer
                    .egl
                    .get_proc_address(name)
                    .map_or(std::ptr::null(), |f| f as *const _)
            })
        };
        renderer.objects = Some(GlObjects::new(gl)?);
        Ok(renderer)
    }
}

fn egl_error(stage: InitStage, err: egl::Error) -> BackendError {
    BackendError::init(stage, err.to_string())
}

impl GlObjects {
    fn new(gl: glow::Context) -> Result<Self, BackendError> {
        // SAFETY: callers make the owning context current first.
        unsafe {
            let vertex = compile(&gl, glow::VERTEX_SHADER, ShaderStage::Vertex, VERTEX_SHADER)?;
            let fragment =
                match compile(&gl, glow::FRAGMENT_SHADER, ShaderStage::Fragment, FRAGMENT_SHADER) {
                    Ok(shader) => shader,
                    Err(err) => {
                        gl.delete_shader(vertex);
                        return Err(err);
                    }
                };
            let program = link(&gl, vertex, fragment);
            gl.delete_shader(vertex);
            gl.delete_shader(fragment);
            let program = program?;

            let attribute = |name: &str| {
                gl.get_attrib_location(program, name).ok_or_else(|| {
                    BackendError::PipelineLink {
                        log: format!("attribute `{name}` not found"),
                    }
                })
            };
            let (position, color) = match (attribute("position"), attribute("color")) {
                (Ok(position), Ok(color)) => (position, color),
                (Err(err), _) | (_, Err(err)) => {
                    gl.delete_program(program);
                    return Err(err);
                }
            };

            let vbo = match gl.create_buffer() {
                Ok(vbo) => vbo,
                Err(message) => {
                    gl.delete_program(program);
                    return Err(BackendError::resource("vertex buffer", message));
                }
            };
            gl.bind_buffer(glow::ARRAY_BUFFER, Some(vbo));
            gl.buffer_data_u8_slice(glow::ARRAY_BUFFER, triangle_bytes(), glow::STATIC_DRAW);

            Ok(Self {
                gl,
                program,
                vbo,
                position,
                color,
            })
        }
    }

    /// # Safety
    ///
    /// The owning context must be current.
    unsafe fn draw(&self, size: SurfaceSize) {
        let gl = &self.gl;
        let (width, height) = size.to_i32();
        let [r, g, b, a] = CLEAR_COLOR;
        // SAFETY: forwarded from the caller.
        unsafe {
            gl.viewport(0, 0, width, height);
            gl.clear_color(r, g, b, a);
            gl.clear(glow::COLOR_BUFFER_BIT);

            gl.use_program(Some(self.program));
            gl.bind_buffer(glow::ARRAY_BUFFER, Some(self.vbo));
            gl.enable_vertex_attrib_array(self.position);
            gl.enable_vertex_attrib_array(self.color);
            gl.vertex_attrib_pointer_f32(
                self.position,
                2,
                glow::FLOAT,
                false,
                VERTEX_STRIDE as i32,
                POSITION_OFFSET as i32,
            );
            gl.vertex_attrib_pointer_f32(
                self.color,
                3,
                glow::FLOAT,
                false,
                VERTEX_STRIDE as i32,
                COLOR_OFFSET as i32,
            );
            gl.draw_arrays(glow::TRIANGLES, 0, VERTEX_COUNT as i32);
            gl.disable_vertex_attrib_array(self.position);
            gl.disable_vertex_attrib_array(self.color);
        }
    }

    /// # Safety
    ///
    /// The owning context must be current.
    unsafe fn delete(self) {
        // SAFETY: forwarded from the caller.
        unsafe {
            self.gl.delete_program(self.program);
            self.gl.delete_buffer(self.vbo);
        }
    }
}

/// # Safety
///
/// A GL context must be current.
unsafe fn compile(
    gl: &glow::Context,
    kind: u32,
    stage: ShaderStage,
    source: &str,
) -> Result<glow::Shader, BackendError> {
    // SAFETY: forwarded from the caller.
    unsafe {
        let shader = gl
            .create_shader(kind)
            .map_err(|message| BackendError::resource("shader", message))?;
        gl.shader_source(shader, source);
        gl.compile_shader(shader);
        if gl.get_shader_compile_status(shader) {
            Ok(shader)
        } else {
            let log = gl.get_shader_info_log(shader);
            gl.delete_shader(shader);
            tracing::error!(?stage, %log, "shader compile failed");
            Err(BackendError::ShaderCompile { stage, log })
        }
    }
}

/// # Safety
///
/// A GL context must be current.
unsafe fn link(
    gl: &glow::Context,
    vertex: glow::Shader,
    fragment: glow::Shader,
) -> Result<glow::Program, BackendError> {
    // SAFETY: forwarded from the caller.
    unsafe {
        let program = gl
            .create_program()
            .map_err(|message| BackendError::resource("program", message))?;
        gl.attach_shader(program, vertex);
        gl.attach_shader(program, fragment);
        gl.link_program(program);
        if gl.get_program_link_status(program) {
            gl.detach_shader(program, vertex);
            gl.detach_shader(program, fragment);
            Ok(program)
        } else {
            let log = gl.get_program_info_log(program);
            gl.delete_program(program);
            tracing::error!(%log, "program link failed");
            Err(BackendError::PipelineLink { log })
        }
    }
}

impl Renderer<WaylandSurface> for EglRenderer {
    fn resize(&mut self, size: SurfaceSize) {
        self.size = size;
        if let Some(window) = &self.window {
            let (width, height) = size.to_i32();
            window.resize(width, height, 0, 0);
        }
    }

    fn render_frame(
        &mut self,
        _target: &mut WaylandSurface,
        _frame: &FrameContext,
    ) -> Result<Presentation, PresentError> {
        let (Some(objects), Some(surface)) = (&self.objects, self.surface) else {
            return Err(PresentError::Failed("renderer not initialised".into()));
        };
        // SAFETY: the context was made current in `new` and nothing else in
        // this process switches contexts.
        unsafe { objects.draw(self.size) };
        // Swapping commits the surface, taking the pending frame request with
        // it.
        self.egl
            .swap_buffers(self.display, surface)
            .map_err(|err| PresentError::Failed(err.to_string()))?;
        Ok(Presentation::Committed)
    }
}

impl Drop for EglRenderer {
    fn drop(&mut self) {
        if let Some(objects) = self.objects.take() {
            // SAFETY: objects exist only after make-current succeeded.
            unsafe { objects.delete() };
        }
        if let Err(err) = self.egl.make_current(self.display, None, None, None) {
            tracing::debug!(%err, "eglMakeCurrent(none) failed");
        }
        if let Some(context) = self.context.take()
            && let Err(err) = self.egl.destroy_context(self.display, context)
        {
            tracing::debug!(%err, "eglDestroyContext failed");
        }
        if let Some(surface) = self.surface.take()
            && let Err(err) = self.egl.destroy_surface(self.display, surface)
        {
            tracing::debug!(%err, "eglDestroySurface failed");
        }
        self.window = None;
        if let Err(err) = self.egl.terminate(self.display) {
            tracing::debug!(%err, "eglTerminate failed");
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn attrib(list: &[egl::Int], key: egl::Int) -> Option<egl::Int> {
        list.chunks_exact(2)
            .find(|pair| pair[0] == key)
            .map(|pair| pair[1])
    }

    #[test]
    fn config_requests_rgba8_depth_stencil_es2() {
        assert_eq!(attrib(&CONFIG_ATTRIBS, egl::RED_SIZE), Some(8), "red bits");
        assert_eq!(attrib(&CONFIG_ATTRIBS, egl::ALPHA_SIZE), Some(8), "alpha bits");
        assert_eq!(attrib(&CONFIG_ATTRIBS, egl::DEPTH_SIZE), Some(24), "depth bits");
        assert_eq!(attrib(&CONFIG_ATTRIBS, egl::STENCIL_SIZE), Some(8), "stencil bits");
        assert_eq!(
            attrib(&CONFIG_ATTRIBS, egl::RENDERABLE_TYPE),
            Some(egl::OPENGL_ES2_BIT),
            "ES2 renderable"
        );
        assert_eq!(CONFIG_ATTRIBS.last(), Some(&egl::NONE), "list terminated");
    }

    #[test]
    fn context_is_es2() {
        assert_eq!(
            attrib(&CONTEXT_ATTRIBS, egl::CONTEXT_CLIENT_VERSION),
            Some(2),
            "client version"
        );
    }

    #[test]
    fn shaders_declare_the_vertex_attributes() {
        assert!(VERTEX_SHADER.contains("attribute vec2 position;"), "position");
        assert!(VERTEX_SHADER.contains("attribute vec3 color;"), "color");
        assert!(
            FRAGMENT_SHADER.starts_with("precision mediump float;"),
            "ES fragment shaders need a default precision"
        );
    }
}
