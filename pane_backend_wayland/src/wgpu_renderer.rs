// Copyright 2026 the Pane Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! wgpu renderer on a raw Wayland surface.

#![expect(unsafe_code, reason = "wgpu surfaces are created from raw Wayland handles")]

use std::ptr::NonNull;

use pane_core::SurfaceSize;
use pane_core::backend::{
    BackendError, FrameContext, InitStage, PresentError, Presentation, Renderer,
};
use pane_core::geometry::{
    CLEAR_COLOR, COLOR_OFFSET, POSITION_OFFSET, VERTEX_COUNT, VERTEX_STRIDE, triangle_bytes,
};
use wayland_client::Proxy;
use wgpu::util::DeviceExt;

use crate::surface::WaylandSurface;
use crate::target::RenderTarget;

const SHADER: &str = "
struct VertexOut {
    @builtin(position) position: vec4<f32>,
    @location(0) color: vec3<f32>,
};

@vertex
fn vs_main(@location(0) position: vec2<f32>, @location(1) color: vec3<f32>) -> VertexOut {
    var out: VertexOut;
    out.position = vec4<f32>(position, 0.0, 1.0);
    out.color = color;
    return out;
}

@fragment
fn fs_main(in: VertexOut) -> @location(0) vec4<f32> {
    return vec4<f32>(in.color, 1.0);
}
";

const ATTRIBUTES: [wgpu::VertexAttribute; 2] = [
    wgpu::VertexAttribute {
        format: wgpu::VertexFormat::Float32x2,
        offset: POSITION_OFFSET as u64,
        shader_location: 0,
    },
    wgpu::VertexAttribute {
        format: wgpu::VertexFormat::Float32x3,
        offset: COLOR_OFFSET as u64,
        shader_location: 1,
    },
];

/// Draws the static triangle with wgpu.
#[derive(Debug)]
pub struct WgpuRenderer {
    surface: wgpu::Surface<'static>,
    device: wgpu::Device,
    queue: wgpu::Queue,
    config: wgpu::SurfaceConfiguration,
    pipeline: wgpu::RenderPipeline,
    vertex_buffer: wgpu::Buffer,
}

impl WgpuRenderer {
    /// Creates the surface, device and pipeline for the target window.
    ///
    /// Falls back to `Fifo` if `present_mode` is unsupported.
    pub fn new(
        target: &RenderTarget,
        size: SurfaceSize,
        present_mode: wgpu::PresentMode,
    ) -> Result<Self, BackendError> {
        let instance = wgpu::Instance::default();
        let surface = create_surface(&instance, target)?;

        let adapter = pollster::block_on(instance.request_adapter(&wgpu::RequestAdapterOptions {
            compatible_surface: Some(&surface),
            ..Default::default()
        }))
        .map_err(|err| BackendError::init(InitStage::Config, err.to_string()))?;
        tracing::debug!(adapter = ?adapter.get_info(), "adapter selected");

        let (device, queue) = pollster::block_on(adapter.request_device(&wgpu::DeviceDescriptor {
            label: Some("pane"),
            ..Default::default()
        }))
        .map_err(|err| BackendError::init(InitStage::Context, err.to_string()))?;

        let caps = surface.get_capabilities(&adapter);
        // Vertex colours are written as-is, like the GL renderer does.
        let format = caps
            .formats
            .iter()
            .copied()
            .find(|format| !format.is_srgb())
            .or_else(|| caps.formats.first().copied())
            .ok_or_else(|| BackendError::init(InitStage::Surface, "surface has no formats"))?;
        let present_mode = if caps.present_modes.contains(&present_mode) {
            present_mode
        } else {
            tracing::warn!(?present_mode, "present mode unsupported, using Fifo");
            wgpu::PresentMode::Fifo
        };
        let config = wgpu::SurfaceConfiguration {
            usage: wgpu::TextureUsages::RENDER_ATTACHMENT,
            format,
            width: size.width(),
            height: size.height(),
            present_mode,
            desired_maximum_frame_latency: 2,
            alpha_mode: caps
                .alpha_modes
                .first()
                .copied()
                .unwrap_or(wgpu::CompositeAlphaMode::Auto),
            view_formats: Vec::new(),
        };
        surface.configure(&device, &config);

        let pipeline = create_pipeline(&device, format)?;
        let vertex_buffer = device.create_buffer_init(&wgpu::util::BufferInitDescriptor {
            label: Some("triangle vertices"),
            contents: triangle_bytes(),
            usage: wgpu::BufferUsages::VERTEX,
        });

        Ok(Self {
            surface,
            device,
            queue,
            config,
            pipeline,
            vertex_buffer,
        })
    }

    fn reconfigure(&self) {
        self.surface.configure(&self.device, &self.config);
    }
}

fn create_surface(
    instance: &wgpu::Instance,
    target: &RenderTarget,
) -> Result<wgpu::Surface<'static>, BackendError> {
    let missing = |what: &str| BackendError::init(InitStage::Surface, format!("null {what}"));
    let display = NonNull::new(target.connection().backend().display_ptr().cast())
        .ok_or_else(|| missing("wl_display"))?;
    let surface = NonNull::new(target.surface().id().as_ptr().cast())
        .ok_or_else(|| missing("wl_surface"))?;
    let raw_display_handle =
        wgpu::rwh::RawDisplayHandle::Wayland(wgpu::rwh::WaylandDisplayHandle::new(display));
    let raw_window_handle =
        wgpu::rwh::RawWindowHandle::Wayland(wgpu::rwh::WaylandWindowHandle::new(surface));
    // SAFETY: both pointers are live proxies. The renderer is dropped before
    // the window and the connection it was created from.
    unsafe {
        instance.create_surface_unsafe(wgpu::SurfaceTargetUnsafe::RawHandle {
            raw_display_handle,
            raw_window_handle,
        })
    }
    .map_err(|err| BackendError::init(InitStage::Surface, err.to_string()))
}

fn create_pipeline(
    device: &wgpu::Device,
    format: wgpu::TextureFormat,
) -> Result<wgpu::RenderPipeline, BackendError> {
    device.push_error_scope(wgpu::ErrorFilter::Validation);
    let shader = device.create_shader_module(wgpu::ShaderModuleDescriptor {
        label: Some("triangle"),
        source: wgpu::ShaderSource::Wgsl(SHADER.into()),
    });
    let layout = device.create_pipeline_layout(&wgpu::PipelineLayoutDescriptor {
        label: Some("triangle"),
        bind_group_layouts: &[],
        push_constant_ranges: &[],
    });
    let pipeline = device.create_render_pipeline(&wgpu::RenderPipelineDescriptor {
        label: Some("triangle"),
        layout: Some(&layout),
        vertex: wgpu::VertexState {
            module: &shader,
            entry_point: Some("vs_main"),
            buffers: &[wgpu::VertexBufferLayout {
                array_stride: u64::from(VERTEX_STRIDE),
                step_mode: wgpu::VertexStepMode::Vertex,
                attributes: &ATTRIBUTES,
            }],
            compilation_options: wgpu::PipelineCompilationOptions::default(),
        },
        fragment: Some(wgpu::FragmentState {
            module: &shader,
            entry_point: Some("fs_main"),
            targets: &[Some(wgpu::ColorTargetState {
                format,
                blend: None,
                write_mask: wgpu::ColorWrites::ALL,
            })],
            compilation_options: wgpu::PipelineCompilationOptions::default(),
        }),
        primitive: wgpu::PrimitiveState::default(),
        depth_stencil: None,
        multisample: wgpu::MultisampleState::default(),
        multiview: None,
        cache: None,
    });
    match pollster::block_on(device.pop_error_scope()) {
        None => Ok(pipeline),
        Some(err) => {
            tracing::error!(%err, "pipeline creation failed");
            Err(BackendError::PipelineLink {
                log: err.to_string(),
            })
        }
    }
}

fn clear_color() -> wgpu::Color {
    let [r, g, b, a] = CLEAR_COLOR.map(f64::from);
    wgpu::Color { r, g, b, a }
}

impl Renderer<WaylandSurface> for WgpuRenderer {
    fn resize(&mut self, size: SurfaceSize) {
        self.config.width = size.width();
        self.config.height = size.height();
        self.reconfigure();
    }

    fn render_frame(
        &mut self,
        _target: &mut WaylandSurface,
        _frame: &FrameContext,
    ) -> Result<Presentation, PresentError> {
        let frame = match self.surface.get_current_texture() {
            Ok(frame) => frame,
            Err(wgpu::SurfaceError::Outdated) => {
                self.reconfigure();
                return Err(PresentError::Outdated);
            }
            Err(wgpu::SurfaceError::Lost) => {
                self.reconfigure();
                return Err(PresentError::Lost);
            }
            Err(wgpu::SurfaceError::Timeout) => return Err(PresentError::Timeout),
            Err(err) => return Err(PresentError::Failed(err.to_string())),
        };
        let view = frame
            .texture
            .create_view(&wgpu::TextureViewDescriptor::default());
        let mut encoder = self
            .device
            .create_command_encoder(&wgpu::CommandEncoderDescriptor {
                label: Some("frame"),
            });
        {
            let mut pass = encoder.begin_render_pass(&wgpu::RenderPassDescriptor {
                label: Some("triangle"),
                color_attachments: &[Some(wgpu::RenderPassColorAttachment {
                    view: &view,
                    depth_slice: None,
                    resolve_target: None,
                    ops: wgpu::Operations {
                        load: wgpu::LoadOp::Clear(clear_color()),
                        store: wgpu::StoreOp::Store,
                    },
                })],
                depth_stencil_attachment: None,
                timestamp_writes: None,
                occlusion_query_set: None,
            });
            pass.set_pipeline(&self.pipeline);
            pass.set_vertex_buffer(0, self.vertex_buffer.slice(..));
            pass.draw(0..VERTEX_COUNT, 0..1);
        }
        self.queue.submit(Some(encoder.finish()));
        // Presenting commits the surface, taking the pending frame request
        // with it.
        frame.present();
        Ok(Presentation::Committed)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn attributes_follow_vertex_layout() {
        assert_eq!(ATTRIBUTES[0].offset, 0, "position first");
        assert_eq!(ATTRIBUTES[1].offset, 8, "color after two floats");
        assert_eq!(
            ATTRIBUTES[1].offset + ATTRIBUTES[1].format.size(),
            u64::from(VERTEX_STRIDE),
            "attributes fill the stride"
        );
    }

    #[test]
    fn shader_has_both_entry_points() {
        assert!(SHADER.contains("fn vs_main"), "vertex entry point");
        assert!(SHADER.contains("fn fs_main"), "fragment entry point");
    }

    #[test]
    fn clear_color_matches_gl() {
        let color = clear_color();
        assert!((color.r - 0.2).abs() < 1e-6, "red");
        assert!((color.a - 1.0).abs() < 1e-6, "alpha");
    }
}
