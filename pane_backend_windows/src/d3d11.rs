// Copyright 2026 the Pane Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Direct3D 11 triangle renderer on a flip-model swap chain.

#![expect(unsafe_code, reason = "Direct3D 11 and DXGI are COM APIs")]

use pane_core::SurfaceSize;
use pane_core::backend::{
    BackendError, FrameContext, InitStage, PresentError, Presentation, Renderer, ShaderStage,
};
use pane_core::geometry::{
    CLEAR_COLOR, COLOR_OFFSET, POSITION_OFFSET, VERTEX_COUNT, VERTEX_STRIDE, triangle_bytes,
};
use windows::Win32::Foundation::HMODULE;
use windows::Win32::Graphics::Direct3D::Fxc::D3DCompile;
use windows::Win32::Graphics::Direct3D::{
    D3D_DRIVER_TYPE_HARDWARE, D3D_FEATURE_LEVEL_11_0, D3D11_PRIMITIVE_TOPOLOGY_TRIANGLELIST,
    ID3DBlob, ID3DInclude,
};
use windows::Win32::Graphics::Direct3D11::{
    D3D11_BIND_VERTEX_BUFFER, D3D11_BUFFER_DESC, D3D11_CREATE_DEVICE_BGRA_SUPPORT,
    D3D11_INPUT_ELEMENT_DESC, D3D11_INPUT_PER_VERTEX_DATA, D3D11_SDK_VERSION,
    D3D11_SUBRESOURCE_DATA, D3D11_USAGE_IMMUTABLE, D3D11_VIEWPORT, D3D11CreateDevice,
    ID3D11Buffer, ID3D11Device, ID3D11DeviceContext, ID3D11InputLayout, ID3D11PixelShader,
    ID3D11RenderTargetView, ID3D11Texture2D, ID3D11VertexShader,
};
use windows::Win32::Graphics::Dxgi::Common::{
    DXGI_ALPHA_MODE_IGNORE, DXGI_FORMAT_B8G8R8A8_UNORM, DXGI_FORMAT_R32G32_FLOAT,
    DXGI_FORMAT_R32G32B32_FLOAT, DXGI_FORMAT_UNKNOWN, DXGI_SAMPLE_DESC,
};
use windows::Win32::Graphics::Dxgi::{
    DXGI_ERROR_DEVICE_REMOVED, DXGI_ERROR_DEVICE_RESET, DXGI_PRESENT, DXGI_SCALING_STRETCH,
    DXGI_SWAP_CHAIN_DESC1, DXGI_SWAP_CHAIN_FLAG, DXGI_SWAP_EFFECT_FLIP_DISCARD,
    DXGI_USAGE_RENDER_TARGET_OUTPUT, IDXGIAdapter, IDXGIDevice, IDXGIFactory2, IDXGISwapChain1,
};
use windows_core::{Interface, PCSTR, s};

use crate::window::Window;

const SHADER: &str = "
struct VsOut {
    float4 position : SV_POSITION;
    float3 color : COLOR;
};

VsOut vs_main(float2 position : POSITION, float3 color : COLOR) {
    VsOut output;
    output.position = float4(position, 0.0, 1.0);
    output.color = color;
    return output;
}

float4 ps_main(VsOut input) : SV_TARGET {
    return float4(input.color, 1.0);
}
";

/// Draws the static triangle with Direct3D 11.
#[derive(Debug)]
pub struct D3d11Renderer {
    device: ID3D11Device,
    context: ID3D11DeviceContext,
    swap_chain: IDXGISwapChain1,
    rtv: Option<ID3D11RenderTargetView>,
    vertex_shader: ID3D11VertexShader,
    pixel_shader: ID3D11PixelShader,
    input_layout: ID3D11InputLayout,
    vertex_buffer: ID3D11Buffer,
    size: SurfaceSize,
}

fn init(stage: InitStage) -> impl FnOnce(windows_core::Error) -> BackendError {
    move |err| BackendError::init(stage, err.message())
}

fn resource(what: &'static str) -> impl FnOnce(windows_core::Error) -> BackendError {
    move |err| BackendError::resource(what, err.message())
}

fn created<T>(what: &'static str, object: Option<T>) -> Result<T, BackendError> {
    object.ok_or_else(|| BackendError::resource(what, "no object returned"))
}

impl D3d11Renderer {
    /// Creates the device, swap chain, shaders and vertex buffer.
    pub fn new(window: &Window, size: SurfaceSize) -> Result<Self, BackendError> {
        // SAFETY: every call receives live COM objects and out-params that
        // are locals of this function; descriptors outlive the calls.
        unsafe {
            let mut device = None;
            let mut context = None;
            D3D11CreateDevice(
                None::<&IDXGIAdapter>,
                D3D_DRIVER_TYPE_HARDWARE,
                HMODULE::default(),
                D3D11_CREATE_DEVICE_BGRA_SUPPORT,
                Some(&[D3D_FEATURE_LEVEL_11_0]),
                D3D11_SDK_VERSION,
                Some(&mut device),
                None,
                Some(&mut context),
            )
            .map_err(init(InitStage::Context))?;
            let device: ID3D11Device = created("device", device)?;
            let context: ID3D11DeviceContext = created("device context", context)?;

            let factory: IDXGIFactory2 = device
                .cast::<IDXGIDevice>()
                .and_then(|dxgi| dxgi.GetAdapter())
                .and_then(|adapter| adapter.GetParent())
                .map_err(init(InitStage::Display))?;
            let desc = DXGI_SWAP_CHAIN_DESC1 {
                Width: size.width(),
                Height: size.height(),
                Format: DXGI_FORMAT_B8G8R8A8_UNORM,
                SampleDesc: DXGI_SAMPLE_DESC {
                    Count: 1,
                    Quality: 0,
                },
                BufferUsage: DXGI_USAGE_RENDER_TARGET_OUTPUT,
                BufferCount: 2,
                Scaling: DXGI_SCALING_STRETCH,
                SwapEffect: DXGI_SWAP_EFFECT_FLIP_DISCARD,
                AlphaMode: DXGI_ALPHA_MODE_IGNORE,
                ..Default::default()
            };
            let swap_chain = factory
                .CreateSwapChainForHwnd(&device, window.hwnd(), &desc, None, None)
                .map_err(init(InitStage::Surface))?;

            let vs_blob = compile(ShaderStage::Vertex, s!("vs_main"), s!("vs_4_0"))?;
            let ps_blob = compile(ShaderStage::Fragment, s!("ps_main"), s!("ps_4_0"))?;
            let vs_bytes = blob_bytes(&vs_blob);
            let ps_bytes = blob_bytes(&ps_blob);

            let mut vertex_shader = None;
            device
                .CreateVertexShader(vs_bytes, None, Some(&mut vertex_shader))
                .map_err(resource("vertex shader"))?;
            let mut pixel_shader = None;
            device
                .CreatePixelShader(ps_bytes, None, Some(&mut pixel_shader))
                .map_err(resource("pixel shader"))?;

            let elements = [
                D3D11_INPUT_ELEMENT_DESC {
                    SemanticName: s!("POSITION"),
                    SemanticIndex: 0,
                    Format: DXGI_FORMAT_R32G32_FLOAT,
                    InputSlot: 0,
                    AlignedByteOffset: POSITION_OFFSET,
                    InputSlotClass: D3D11_INPUT_PER_VERTEX_DATA,
                    InstanceDataStepRate: 0,
                },
                D3D11_INPUT_ELEMENT_DESC {
                    SemanticName: s!("COLOR"),
                    SemanticIndex: 0,
                    Format: DXGI_FORMAT_R32G32B32_FLOAT,
                    InputSlot: 0,
                    AlignedByteOffset: COLOR_OFFSET,
                    InputSlotClass: D3D11_INPUT_PER_VERTEX_DATA,
                    InstanceDataStepRate: 0,
                },
            ];
            let mut input_layout = None;
            device
                .CreateInputLayout(&elements, vs_bytes, Some(&mut input_layout))
                .map_err(|err| BackendError::PipelineLink {
                    log: err.message(),
                })?;

            let bytes = triangle_bytes();
            let buffer_desc = D3D11_BUFFER_DESC {
                ByteWidth: VERTEX_STRIDE * VERTEX_COUNT,
                Usage: D3D11_USAGE_IMMUTABLE,
                BindFlags: D3D11_BIND_VERTEX_BUFFER.0 as u32,
                ..Default::default()
            };
            let initial = D3D11_SUBRESOURCE_DATA {
                pSysMem: bytes.as_ptr().cast(),
                ..Default::default()
            };
            let mut vertex_buffer = None;
            device
                .CreateBuffer(&buffer_desc, Some(&initial), Some(&mut vertex_buffer))
                .map_err(resource("vertex buffer"))?;

            let mut renderer = Self {
                vertex_shader: created("vertex shader", vertex_shader)?,
                pixel_shader: created("pixel shader", pixel_shader)?,
                input_layout: created("input layout", input_layout)?,
                vertex_buffer: created("vertex buffer", vertex_buffer)?,
                device,
                context,
                swap_chain,
                rtv: None,
                size,
            };
            renderer.rtv = Some(renderer.create_rtv().map_err(resource("render target view"))?);
            tracing::debug!(width = size.width(), height = size.height(), "Direct3D 11 ready");
            Ok(renderer)
        }
    }

    fn create_rtv(&self) -> windows_core::Result<ID3D11RenderTargetView> {
        // SAFETY: buffer 0 of a live swap chain; `rtv` is a local out-param.
        unsafe {
            let back: ID3D11Texture2D = self.swap_chain.GetBuffer(0)?;
            let mut rtv = None;
            self.device
                .CreateRenderTargetView(&back, None, Some(&mut rtv))?;
            rtv.ok_or_else(windows_core::Error::empty)
        }
    }
}

/// Compiles one entry point of [`SHADER`], returning the compiler log on
/// failure.
fn compile(stage: ShaderStage, entry: PCSTR, target: PCSTR) -> Result<ID3DBlob, BackendError> {
    let mut code = None;
    let mut errors: Option<ID3DBlob> = None;
    // SAFETY: source pointer and length describe `SHADER`; out-params are
    // locals.
    let result = unsafe {
        D3DCompile(
            SHADER.as_ptr().cast(),
            SHADER.len(),
            PCSTR::null(),
            None,
            None::<&ID3DInclude>,
            entry,
            target,
            0,
            0,
            &mut code,
            Some(&mut errors),
        )
    };
    match (result, code) {
        (Ok(()), Some(code)) => Ok(code),
        (result, _) => {
            let log = errors.as_ref().map_or_else(
                || result.err().map_or_else(String::new, |err| err.message()),
                |blob| String::from_utf8_lossy(blob_bytes(blob)).into_owned(),
            );
            tracing::error!(?stage, %log, "HLSL compile failed");
            Err(BackendError::ShaderCompile { stage, log })
        }
    }
}

fn blob_bytes(blob: &ID3DBlob) -> &[u8] {
    // SAFETY: a blob owns `GetBufferSize` bytes at `GetBufferPointer`, and
    // the slice borrows the blob.
    unsafe {
        std::slice::from_raw_parts(blob.GetBufferPointer().cast::<u8>(), blob.GetBufferSize())
    }
}

impl Renderer<Window> for D3d11Renderer {
    fn resize(&mut self, size: SurfaceSize) {
        self.size = size;
        // The swap chain cannot resize while a view of its buffers exists.
        self.rtv = None;
        // SAFETY: live objects; unbinding targets drops the context's
        // reference to the old back buffer.
        let resized = unsafe {
            self.context.OMSetRenderTargets(None, None);
            self.swap_chain.ResizeBuffers(
                0,
                size.width(),
                size.height(),
                DXGI_FORMAT_UNKNOWN,
                DXGI_SWAP_CHAIN_FLAG(0),
            )
        };
        match resized.and_then(|()| self.create_rtv()) {
            Ok(rtv) => self.rtv = Some(rtv),
            Err(err) => tracing::warn!(%err, "swap chain resize failed"),
        }
    }

    fn render_frame(
        &mut self,
        _target: &mut Window,
        _frame: &FrameContext,
    ) -> Result<Presentation, PresentError> {
        let rtv = self
            .rtv
            .clone()
            .ok_or_else(|| PresentError::Failed("no render target view".into()))?;
        let viewport = D3D11_VIEWPORT {
            TopLeftX: 0.0,
            TopLeftY: 0.0,
            Width: self.size.width() as f32,
            Height: self.size.height() as f32,
            MinDepth: 0.0,
            MaxDepth: 1.0,
        };
        // SAFETY: every bound object is owned by `self` and outlives the draw.
        let presented = unsafe {
            let context = &self.context;
            context.OMSetRenderTargets(Some(&[Some(rtv.clone())]), None);
            context.RSSetViewports(Some(&[viewport]));
            context.ClearRenderTargetView(&rtv, &CLEAR_COLOR);
            context.IASetInputLayout(&self.input_layout);
            context.IASetPrimitiveTopology(D3D11_PRIMITIVE_TOPOLOGY_TRIANGLELIST);
            context.IASetVertexBuffers(
                0,
                1,
                Some(&Some(self.vertex_buffer.clone())),
                Some(&VERTEX_STRIDE),
                Some(&0),
            );
            context.VSSetShader(&self.vertex_shader, None);
            context.PSSetShader(&self.pixel_shader, None);
            context.Draw(VERTEX_COUNT, 0);
            self.swap_chain.Present(1, DXGI_PRESENT(0))
        };
        match presented.ok() {
            Ok(()) => Ok(Presentation::Committed),
            Err(err)
                if err.code() == DXGI_ERROR_DEVICE_REMOVED
                    || err.code() == DXGI_ERROR_DEVICE_RESET =>
            {
                Err(PresentError::Lost)
            }
            Err(err) => Err(PresentError::Failed(err.message())),
        }
    }
}
