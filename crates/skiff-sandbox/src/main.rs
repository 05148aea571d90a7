//! Rotating textured cube exercising the whole device surface: shader
//! program linking, buffers, input layout, vertex array, texture, sampler,
//! pipeline state, per-frame uniform updates, and indexed draws.

use anyhow::Result;
use glam::{Mat4, Vec3};
use winit::dpi::LogicalSize;

use skiff_engine::core::{App, AppControl, FrameCtx, InitCtx};
use skiff_engine::gfx::{
    BufferDesc, BufferHandle, BufferUsage, ClearTarget, CompareFunc, CullMode, DepthStencilDesc,
    IndexBufferDesc, IndexFormat, InputLayoutDesc, InputLayoutHandle, PipelineStateDesc,
    PipelineStateHandle, PrimitiveTopology, ProgramHandle, RasterizerDesc, RenderDevice,
    SamplerDesc, SamplerHandle, ShaderStage, TextureDesc, TextureFilter, TextureFormat,
    TextureHandle, VertexArrayDesc, VertexArrayHandle, VertexAttribType, VertexElement, Viewport,
};
use skiff_engine::input::{InputEvent, Key};
use skiff_engine::logging::{init_logging, LoggingConfig};
use skiff_engine::window::{Runtime, RuntimeConfig};

#[repr(C)]
#[derive(Copy, Clone, bytemuck::Pod, bytemuck::Zeroable)]
struct Vertex {
    position: [f32; 3],
    normal: [f32; 3],
    uv: [f32; 2],
}

const fn v(position: [f32; 3], normal: [f32; 3], uv: [f32; 2]) -> Vertex {
    Vertex {
        position,
        normal,
        uv,
    }
}

/// Four vertices per face so each face gets flat normals and full UVs.
/// Corners run counter-clockwise seen from outside the cube.
#[rustfmt::skip]
const CUBE_VERTICES: [Vertex; 24] = [
    // +Z
    v([-0.5, -0.5,  0.5], [0.0, 0.0, 1.0], [0.0, 1.0]),
    v([ 0.5, -0.5,  0.5], [0.0, 0.0, 1.0], [1.0, 1.0]),
    v([ 0.5,  0.5,  0.5], [0.0, 0.0, 1.0], [1.0, 0.0]),
    v([-0.5,  0.5,  0.5], [0.0, 0.0, 1.0], [0.0, 0.0]),
    // -Z
    v([ 0.5, -0.5, -0.5], [0.0, 0.0, -1.0], [0.0, 1.0]),
    v([-0.5, -0.5, -0.5], [0.0, 0.0, -1.0], [1.0, 1.0]),
    v([-0.5,  0.5, -0.5], [0.0, 0.0, -1.0], [1.0, 0.0]),
    v([ 0.5,  0.5, -0.5], [0.0, 0.0, -1.0], [0.0, 0.0]),
    // +X
    v([ 0.5, -0.5,  0.5], [1.0, 0.0, 0.0], [0.0, 1.0]),
    v([ 0.5, -0.5, -0.5], [1.0, 0.0, 0.0], [1.0, 1.0]),
    v([ 0.5,  0.5, -0.5], [1.0, 0.0, 0.0], [1.0, 0.0]),
    v([ 0.5,  0.5,  0.5], [1.0, 0.0, 0.0], [0.0, 0.0]),
    // -X
    v([-0.5, -0.5, -0.5], [-1.0, 0.0, 0.0], [0.0, 1.0]),
    v([-0.5, -0.5,  0.5], [-1.0, 0.0, 0.0], [1.0, 1.0]),
    v([-0.5,  0.5,  0.5], [-1.0, 0.0, 0.0], [1.0, 0.0]),
    v([-0.5,  0.5, -0.5], [-1.0, 0.0, 0.0], [0.0, 0.0]),
    // +Y
    v([-0.5,  0.5,  0.5], [0.0, 1.0, 0.0], [0.0, 1.0]),
    v([ 0.5,  0.5,  0.5], [0.0, 1.0, 0.0], [1.0, 1.0]),
    v([ 0.5,  0.5, -0.5], [0.0, 1.0, 0.0], [1.0, 0.0]),
    v([-0.5,  0.5, -0.5], [0.0, 1.0, 0.0], [0.0, 0.0]),
    // -Y
    v([-0.5, -0.5, -0.5], [0.0, -1.0, 0.0], [0.0, 1.0]),
    v([ 0.5, -0.5, -0.5], [0.0, -1.0, 0.0], [1.0, 1.0]),
    v([ 0.5, -0.5,  0.5], [0.0, -1.0, 0.0], [1.0, 0.0]),
    v([-0.5, -0.5,  0.5], [0.0, -1.0, 0.0], [0.0, 0.0]),
];

#[rustfmt::skip]
const CUBE_INDICES: [u16; 36] = [
     0,  1,  2,  0,  2,  3,
     4,  5,  6,  4,  6,  7,
     8,  9, 10,  8, 10, 11,
    12, 13, 14, 12, 14, 15,
    16, 17, 18, 16, 18, 19,
    20, 21, 22, 20, 22, 23,
];

const CHECKER_SIZE: u32 = 64;
const CHECKER_CELL: u32 = 8;

/// Matches the `Scene` uniform block in the shaders.
#[repr(C)]
#[derive(Copy, Clone, bytemuck::Pod, bytemuck::Zeroable)]
struct SceneUniforms {
    mvp: [[f32; 4]; 4],
    model: [[f32; 4]; 4],
    light_dir: [f32; 4],
}

struct SceneResources {
    program: ProgramHandle,
    vertex_buffer: BufferHandle,
    index_buffer: BufferHandle,
    layout: InputLayoutHandle,
    vertex_array: VertexArrayHandle,
    texture: TextureHandle,
    sampler: SamplerHandle,
    pipeline: PipelineStateHandle,
    scene_ubo: BufferHandle,
}

#[derive(Default)]
struct SandboxApp {
    angle: f32,
    last_report: f32,
    resources: Option<SceneResources>,
}

impl App for SandboxApp {
    fn init(&mut self, ctx: &mut InitCtx<'_>) -> Result<()> {
        let device = &mut *ctx.device;

        let vs = device.create_shader(include_str!("../shaders/cube_vs.wgsl"), ShaderStage::Vertex)?;
        let fs =
            device.create_shader(include_str!("../shaders/cube_fs.wgsl"), ShaderStage::Fragment)?;
        let program = device.create_shader_program(&[vs, fs])?;
        // Shader objects are only needed for linking.
        device.destroy_shader(vs);
        device.destroy_shader(fs);

        let vertex_buffer = device.create_vertex_buffer(&BufferDesc {
            usage: BufferUsage::Static,
            data: Some(bytemuck::cast_slice(&CUBE_VERTICES)),
            size: 0,
        })?;
        let index_buffer = device.create_index_buffer(&IndexBufferDesc {
            buffer: BufferDesc {
                usage: BufferUsage::Static,
                data: Some(bytemuck::cast_slice(&CUBE_INDICES)),
                size: 0,
            },
            format: IndexFormat::Uint16,
        })?;

        let layout = device.create_input_layout(&InputLayoutDesc {
            elements: &[
                VertexElement {
                    ty: VertexAttribType::Float,
                    components: 3,
                    normalized: false,
                    offset: 0,
                },
                VertexElement {
                    ty: VertexAttribType::Float,
                    components: 3,
                    normalized: false,
                    offset: 12,
                },
                VertexElement {
                    ty: VertexAttribType::Float,
                    components: 2,
                    normalized: false,
                    offset: 24,
                },
            ],
            vertex_stride: std::mem::size_of::<Vertex>() as u64,
        })?;

        let vertex_array = device.create_vertex_array(&VertexArrayDesc {
            vertex_buffer,
            index_buffer: Some(index_buffer),
            layout,
        })?;

        let pixels = checkerboard();
        let texture = device.create_texture_2d(&TextureDesc {
            format: TextureFormat::Rgba8Unorm,
            width: CHECKER_SIZE,
            height: CHECKER_SIZE,
            data: Some(&pixels),
            render_target: false,
        })?;

        let sampler = device.create_sampler_state(&SamplerDesc {
            min_filter: TextureFilter::Nearest,
            mag_filter: TextureFilter::Nearest,
            ..SamplerDesc::default()
        })?;

        let pipeline = device.create_pipeline_state(&PipelineStateDesc {
            rasterizer: RasterizerDesc {
                cull_mode: CullMode::Back,
                ..RasterizerDesc::default()
            },
            depth_stencil: DepthStencilDesc {
                depth_test: true,
                depth_write: true,
                depth_func: CompareFunc::LessEqual,
                ..DepthStencilDesc::default()
            },
            topology: PrimitiveTopology::Triangles,
        })?;

        let scene_ubo = device.create_uniform_buffer(&BufferDesc {
            usage: BufferUsage::Dynamic,
            data: None,
            size: std::mem::size_of::<SceneUniforms>() as u64,
        })?;

        log::info!(
            "sandbox scene ready ({} vertices, {} indices, {}x{} texture)",
            CUBE_VERTICES.len(),
            CUBE_INDICES.len(),
            CHECKER_SIZE,
            CHECKER_SIZE,
        );

        self.resources = Some(SceneResources {
            program,
            vertex_buffer,
            index_buffer,
            layout,
            vertex_array,
            texture,
            sampler,
            pipeline,
            scene_ubo,
        });
        Ok(())
    }

    fn on_event(&mut self, event: &InputEvent) -> AppControl {
        if let InputEvent::KeyDown {
            key: Key::Escape, ..
        } = event
        {
            return AppControl::Exit;
        }
        AppControl::Continue
    }

    fn on_frame(&mut self, ctx: &mut FrameCtx<'_>) -> AppControl {
        let Some(res) = self.resources.as_ref() else {
            return AppControl::Continue;
        };

        self.angle += ctx.time.delta * 0.9;

        let size = ctx.surface_size;
        let aspect = size.width.max(1) as f32 / size.height.max(1) as f32;

        let proj = Mat4::perspective_rh(60f32.to_radians(), aspect, 0.1, 100.0);
        let view = Mat4::look_at_rh(Vec3::new(1.6, 1.4, 2.2), Vec3::ZERO, Vec3::Y);
        let model = Mat4::from_rotation_y(self.angle) * Mat4::from_rotation_x(self.angle * 0.6);

        let uniforms = SceneUniforms {
            mvp: (proj * view * model).to_cols_array_2d(),
            model: model.to_cols_array_2d(),
            light_dir: [-0.5, -1.0, -0.3, 0.0],
        };

        let device = &mut *ctx.device;
        if let Err(err) = device.update_buffer(res.scene_ubo, 0, bytemuck::bytes_of(&uniforms)) {
            log::error!("uniform update failed: {err:#}");
            return AppControl::Exit;
        }

        device.set_viewport(Viewport::new(size.width, size.height));
        device.clear(ClearTarget::COLOR | ClearTarget::DEPTH, [0.08, 0.09, 0.11, 1.0]);

        device.bind_pipeline_state(res.pipeline);
        device.bind_shader_program(res.program);
        device.bind_vertex_array(res.vertex_array);
        device.bind_uniform_buffer(0, res.scene_ubo);
        device.bind_texture(0, res.texture);
        device.bind_sampler_state(0, res.sampler);
        device.draw_indexed(CUBE_INDICES.len() as u32);

        if ctx.time.elapsed - self.last_report >= 5.0 {
            self.last_report = ctx.time.elapsed;
            log::info!(
                "frame {} at t={:.1}s (delta {:.2}ms)",
                ctx.time.frame_index,
                ctx.time.elapsed,
                ctx.time.delta * 1000.0,
            );
        }

        AppControl::Continue
    }

    fn on_exit(&mut self, device: &mut RenderDevice) {
        if let Some(res) = self.resources.take() {
            device.destroy_pipeline_state(res.pipeline);
            device.destroy_sampler_state(res.sampler);
            device.destroy_texture_2d(res.texture);
            device.destroy_vertex_array(res.vertex_array);
            device.destroy_input_layout(res.layout);
            device.destroy_index_buffer(res.index_buffer);
            device.destroy_vertex_buffer(res.vertex_buffer);
            device.destroy_uniform_buffer(res.scene_ubo);
            device.destroy_shader_program(res.program);
        }
    }
}

fn checkerboard() -> Vec<u8> {
    let size = CHECKER_SIZE as usize;
    let mut pixels = Vec::with_capacity(size * size * 4);
    for y in 0..CHECKER_SIZE {
        for x in 0..CHECKER_SIZE {
            let even = ((x / CHECKER_CELL) + (y / CHECKER_CELL)) % 2 == 0;
            let rgb: [u8; 3] = if even { [230, 230, 230] } else { [40, 40, 90] };
            pixels.extend_from_slice(&rgb);
            pixels.push(255);
        }
    }
    pixels
}

fn main() -> Result<()> {
    init_logging(LoggingConfig::default());

    Runtime::run(
        RuntimeConfig {
            title: "skiff sandbox".to_string(),
            initial_size: LogicalSize::new(1024.0, 768.0),
            ..RuntimeConfig::default()
        },
        SandboxApp::default(),
    )
}
