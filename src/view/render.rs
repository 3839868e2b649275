use std::collections::HashMap;
use std::sync::Arc;

use bytemuck::{Pod, Zeroable};
use glam::{Vec2, Vec3};
use wgpu::util::DeviceExt;

use crate::controller::game::{Game, GameState};
use crate::model::animation::sprite_uvs;
use crate::model::camera::Camera;
use crate::model::geometry::Rgba8;
use crate::model::level::{Level, Lighting};
use crate::model::player::Player;
use crate::view::gpu_init::GpuContext;
use crate::view::mesh::{billboard_basis, sprite_corners, Mesh, MeshBuffer, Vertex};

pub const DEPTH_FORMAT: wgpu::TextureFormat = wgpu::TextureFormat::Depth32Float;
pub const SKY_COLOR: wgpu::Color = wgpu::Color { r: 0.5, g: 0.8, b: 1.0, a: 1.0 };
pub const MENU_COLOR: wgpu::Color = wgpu::Color { r: 0.0, g: 0.0, b: 0.0, a: 1.0 };
pub const SHADOW_COLOR: Rgba8 = Rgba8::new(0, 0, 0, 180);
pub const DEBUG_CYLINDER_COLOR: Rgba8 = Rgba8::new(0, 255, 255, 255);

#[repr(C)]
#[derive(Debug, Clone, Copy, Pod, Zeroable)]
pub struct CameraUniform {
    pub view_proj: [[f32; 4]; 4],
}

#[repr(C)]
#[derive(Debug, Clone, Copy, Pod, Zeroable)]
pub struct LightingUniform {
    pub sun_dir: [f32; 3],
    pub sun_intensity: f32,
    pub ambient: f32,
    pub _pad: [f32; 3],
}

impl From<&Lighting> for LightingUniform {
    fn from(lighting: &Lighting) -> Self {
        Self {
            sun_dir: lighting.sun_direction.to_array(),
            sun_intensity: lighting.sun_intensity,
            ambient: lighting.ambient_intensity,
            _pad: [0.0; 3],
        }
    }
}

#[repr(C)]
#[derive(Debug, Clone, Copy, Pod, Zeroable)]
pub struct SpriteParamsUniform {
    pub flags: [f32; 4],
}

impl SpriteParamsUniform {
    pub fn new(lit: bool) -> Self {
        Self { flags: [if lit { 1.0 } else { 0.0 }, 0.0, 0.0, 0.0] }
    }
}

/// egui output for one frame, drawn over the scene
pub struct UiFrame {
    pub primitives: Vec<egui::ClippedPrimitive>,
    pub textures_delta: egui::TexturesDelta,
    pub pixels_per_point: f32,
}

struct SpriteParams {
    buffer: wgpu::Buffer,
    bind_group: wgpu::BindGroup,
}

/// Receives egui's texture changes for a frame
pub trait UiTextureSink {
    fn upload(&mut self, id: egui::TextureId, delta: &egui::epaint::ImageDelta);
    fn free(&mut self, id: egui::TextureId);
}

/// Applies the uploads in `delta`, runs `draw`, then applies the frees.
/// Both happen even when `draw` skips the frame, since egui sends each
/// delta only once and later partial updates need the full upload.
pub fn with_ui_textures<S: UiTextureSink, R>(
    sink: &mut S,
    delta: &egui::TexturesDelta,
    draw: impl FnOnce(&mut S) -> R,
) -> R {
    for (id, image_delta) in &delta.set {
        sink.upload(*id, image_delta);
    }
    let result = draw(sink);
    for id in &delta.free {
        sink.free(*id);
    }
    result
}

pub fn create_depth_texture(device: &wgpu::Device, width: u32, height: u32) -> (wgpu::Texture, wgpu::TextureView) {
    let depth_texture = device.create_texture(&wgpu::TextureDescriptor {
        label: Some("depth_texture"),
        size: wgpu::Extent3d { width: width.max(1), height: height.max(1), depth_or_array_layers: 1 },
        mip_level_count: 1,
        sample_count: 1,
        dimension: wgpu::TextureDimension::D2,
        format: DEPTH_FORMAT,
        usage: wgpu::TextureUsages::RENDER_ATTACHMENT,
        view_formats: &[],
    });
    let depth_view = depth_texture.create_view(&wgpu::TextureViewDescriptor::default());
    (depth_texture, depth_view)
}

fn uniform_entry(binding: u32, visibility: wgpu::ShaderStages) -> wgpu::BindGroupLayoutEntry {
    wgpu::BindGroupLayoutEntry {
        binding,
        visibility,
        ty: wgpu::BindingType::Buffer {
            ty: wgpu::BufferBindingType::Uniform,
            has_dynamic_offset: false,
            min_binding_size: None,
        },
        count: None,
    }
}

struct PipelineDesc<'a> {
    label: &'a str,
    layout: &'a wgpu::PipelineLayout,
    shader: &'a wgpu::ShaderModule,
    fragment_entry: &'a str,
    format: wgpu::TextureFormat,
    topology: wgpu::PrimitiveTopology,
    cull_mode: Option<wgpu::Face>,
    blend: wgpu::BlendState,
}

fn create_pipeline(device: &wgpu::Device, desc: PipelineDesc) -> wgpu::RenderPipeline {
    device.create_render_pipeline(&wgpu::RenderPipelineDescriptor {
        label: Some(desc.label),
        layout: Some(desc.layout),
        vertex: wgpu::VertexState {
            module: desc.shader,
            entry_point: Some("vs_main"),
            buffers: &[Vertex::layout()],
            compilation_options: Default::default(),
        },
        fragment: Some(wgpu::FragmentState {
            module: desc.shader,
            entry_point: Some(desc.fragment_entry),
            targets: &[Some(wgpu::ColorTargetState {
                format: desc.format,
                blend: Some(desc.blend),
                write_mask: wgpu::ColorWrites::ALL,
            })],
            compilation_options: Default::default(),
        }),
        primitive: wgpu::PrimitiveState {
            topology: desc.topology,
            strip_index_format: None,
            front_face: wgpu::FrontFace::Ccw,
            cull_mode: desc.cull_mode,
            polygon_mode: wgpu::PolygonMode::Fill,
            unclipped_depth: false,
            conservative: false,
        },
        depth_stencil: Some(wgpu::DepthStencilState {
            format: DEPTH_FORMAT,
            depth_write_enabled: true,
            depth_compare: wgpu::CompareFunction::LessEqual,
            stencil: wgpu::StencilState::default(),
            bias: wgpu::DepthBiasState::default(),
        }),
        multisample: wgpu::MultisampleState { count: 1, mask: !0, alpha_to_coverage_enabled: false },
        multiview: None,
        cache: None,
    })
}

/// Block colors and the goal sphere for one level
pub fn build_level_mesh(level: &Level) -> Mesh {
    let mut mesh = Mesh::new();
    for block in &level.blocks {
        mesh.add_obb(&block.bounds, block.color);
    }
    if let Some(goal) = &level.end_goal {
        mesh.add_sphere(goal.center, goal.radius, goal.color, 32, 16);
    }
    mesh
}

/// The player's sprite quad as seen from `camera`, or `None` when invisible
pub fn build_player_sprite(player: &Player, camera: &Camera) -> Option<Mesh> {
    let def = player.definition();
    if !def.visible {
        return None;
    }
    let frame = player.sprite_frame(camera.position).unwrap_or(0);
    let (uv_min, uv_max) = sprite_uvs(def.cell_count, frame);
    let basis = billboard_basis(def.billboard, player.basis(), player.position, camera.position, camera.basis());
    let [bl, br, tr, tl] = sprite_corners(player.position, basis, def.sprite_size, def.sprite_pivot);

    let mut mesh = Mesh::new();
    if def.render_rounded {
        mesh.add_rounded_quad(bl, br, tr, tl, Rgba8::WHITE, uv_min, uv_max);
    } else {
        mesh.add_quad(bl, br, tr, tl, Rgba8::WHITE, uv_min, uv_max);
    }
    Some(mesh)
}

/// Flat dark quad lying on the block under an airborne player
pub fn build_shadow(position: Vec3) -> Mesh {
    let mut mesh = Mesh::new();
    let (hx, hy) = (0.5, 0.25);
    mesh.add_quad(
        position + Vec3::new(-hx, -hy, 0.0),
        position + Vec3::new(hx, -hy, 0.0),
        position + Vec3::new(hx, hy, 0.0),
        position + Vec3::new(-hx, hy, 0.0),
        SHADOW_COLOR,
        Vec2::ZERO,
        Vec2::ONE,
    );
    mesh
}

pub struct Renderer {
    device: Arc<wgpu::Device>,
    queue: Arc<wgpu::Queue>,
    depth_view: wgpu::TextureView,
    camera_buffer: wgpu::Buffer,
    lighting_buffer: wgpu::Buffer,
    camera_bind_group: wgpu::BindGroup,
    level_pipeline: wgpu::RenderPipeline,
    line_pipeline: wgpu::RenderPipeline,
    sprite_pipeline: wgpu::RenderPipeline,
    texture_layout: wgpu::BindGroupLayout,
    sampler: wgpu::Sampler,
    white_texture: wgpu::BindGroup,
    /// Sprite sheets by path; failed loads map to the white texture
    sprite_textures: HashMap<String, wgpu::BindGroup>,
    player_params: SpriteParams,
    shadow_params: SpriteParams,
    /// Level index and its uploaded geometry
    level_mesh: Option<(usize, MeshBuffer)>,
    egui_renderer: egui_wgpu::Renderer,
}

impl Renderer {
    pub fn new(gpu: &GpuContext) -> Self {
        let device = gpu.device.as_ref();
        let (_, depth_view) = create_depth_texture(device, gpu.config.width, gpu.config.height);

        let camera_buffer = device.create_buffer(&wgpu::BufferDescriptor {
            label: Some("camera_buffer"),
            size: std::mem::size_of::<CameraUniform>() as u64,
            usage: wgpu::BufferUsages::UNIFORM | wgpu::BufferUsages::COPY_DST,
            mapped_at_creation: false,
        });
        let lighting_buffer = device.create_buffer_init(&wgpu::util::BufferInitDescriptor {
            label: Some("lighting_buffer"),
            contents: bytemuck::bytes_of(&LightingUniform::from(&Lighting::default())),
            usage: wgpu::BufferUsages::UNIFORM | wgpu::BufferUsages::COPY_DST,
        });

        let camera_layout = device.create_bind_group_layout(&wgpu::BindGroupLayoutDescriptor {
            label: Some("camera_bind_group_layout"),
            entries: &[uniform_entry(0, wgpu::ShaderStages::VERTEX), uniform_entry(1, wgpu::ShaderStages::FRAGMENT)],
        });
        let camera_bind_group = device.create_bind_group(&wgpu::BindGroupDescriptor {
            label: Some("camera_bind_group"),
            layout: &camera_layout,
            entries: &[
                wgpu::BindGroupEntry { binding: 0, resource: camera_buffer.as_entire_binding() },
                wgpu::BindGroupEntry { binding: 1, resource: lighting_buffer.as_entire_binding() },
            ],
        });

        let texture_layout = device.create_bind_group_layout(&wgpu::BindGroupLayoutDescriptor {
            label: Some("sprite_texture_layout"),
            entries: &[
                wgpu::BindGroupLayoutEntry {
                    binding: 0,
                    visibility: wgpu::ShaderStages::FRAGMENT,
                    ty: wgpu::BindingType::Texture {
                        sample_type: wgpu::TextureSampleType::Float { filterable: true },
                        view_dimension: wgpu::TextureViewDimension::D2,
                        multisampled: false,
                    },
                    count: None,
                },
                wgpu::BindGroupLayoutEntry {
                    binding: 1,
                    visibility: wgpu::ShaderStages::FRAGMENT,
                    ty: wgpu::BindingType::Sampler(wgpu::SamplerBindingType::Filtering),
                    count: None,
                },
            ],
        });
        let params_layout = device.create_bind_group_layout(&wgpu::BindGroupLayoutDescriptor {
            label: Some("sprite_params_layout"),
            entries: &[uniform_entry(0, wgpu::ShaderStages::FRAGMENT)],
        });

        // Point sampling keeps pixel-art sprite sheets crisp
        let sampler = device.create_sampler(&wgpu::SamplerDescriptor {
            label: Some("sprite_sampler"),
            address_mode_u: wgpu::AddressMode::ClampToEdge,
            address_mode_v: wgpu::AddressMode::ClampToEdge,
            mag_filter: wgpu::FilterMode::Nearest,
            min_filter: wgpu::FilterMode::Nearest,
            ..Default::default()
        });

        let level_shader = device.create_shader_module(wgpu::ShaderModuleDescriptor {
            label: Some("level_shader"),
            source: wgpu::ShaderSource::Wgsl(include_str!("shaders/level.wgsl").into()),
        });
        let sprite_shader = device.create_shader_module(wgpu::ShaderModuleDescriptor {
            label: Some("sprite_shader"),
            source: wgpu::ShaderSource::Wgsl(include_str!("shaders/sprite.wgsl").into()),
        });

        let level_layout = device.create_pipeline_layout(&wgpu::PipelineLayoutDescriptor {
            label: Some("level_pipeline_layout"),
            bind_group_layouts: &[&camera_layout],
            push_constant_ranges: &[],
        });
        let sprite_layout = device.create_pipeline_layout(&wgpu::PipelineLayoutDescriptor {
            label: Some("sprite_pipeline_layout"),
            bind_group_layouts: &[&camera_layout, &texture_layout, &params_layout],
            push_constant_ranges: &[],
        });

        let level_pipeline = create_pipeline(
            device,
            PipelineDesc {
                label: "level_pipeline",
                layout: &level_layout,
                shader: &level_shader,
                fragment_entry: "fs_main",
                format: gpu.format,
                topology: wgpu::PrimitiveTopology::TriangleList,
                cull_mode: Some(wgpu::Face::Back),
                blend: wgpu::BlendState::REPLACE,
            },
        );
        let line_pipeline = create_pipeline(
            device,
            PipelineDesc {
                label: "debug_line_pipeline",
                layout: &level_layout,
                shader: &level_shader,
                fragment_entry: "fs_unlit",
                format: gpu.format,
                topology: wgpu::PrimitiveTopology::LineList,
                cull_mode: None,
                blend: wgpu::BlendState::REPLACE,
            },
        );
        let sprite_pipeline = create_pipeline(
            device,
            PipelineDesc {
                label: "sprite_pipeline",
                layout: &sprite_layout,
                shader: &sprite_shader,
                fragment_entry: "fs_main",
                format: gpu.format,
                topology: wgpu::PrimitiveTopology::TriangleList,
                cull_mode: None,
                blend: wgpu::BlendState::ALPHA_BLENDING,
            },
        );

        let white_texture = create_texture_bind_group(
            device,
            gpu.queue.as_ref(),
            &texture_layout,
            &sampler,
            "white_texture",
            &[255, 255, 255, 255],
            1,
            1,
        );

        let make_params = |lit: bool, label: &str| {
            let buffer = device.create_buffer_init(&wgpu::util::BufferInitDescriptor {
                label: Some(label),
                contents: bytemuck::bytes_of(&SpriteParamsUniform::new(lit)),
                usage: wgpu::BufferUsages::UNIFORM | wgpu::BufferUsages::COPY_DST,
            });
            let bind_group = device.create_bind_group(&wgpu::BindGroupDescriptor {
                label: Some(label),
                layout: &params_layout,
                entries: &[wgpu::BindGroupEntry { binding: 0, resource: buffer.as_entire_binding() }],
            });
            SpriteParams { buffer, bind_group }
        };
        let player_params = make_params(true, "player_sprite_params");
        let shadow_params = make_params(false, "shadow_params");

        let egui_renderer = egui_wgpu::Renderer::new(device, gpu.format, egui_wgpu::RendererOptions::default());

        Self {
            device: Arc::clone(&gpu.device),
            queue: Arc::clone(&gpu.queue),
            depth_view,
            camera_buffer,
            lighting_buffer,
            camera_bind_group,
            level_pipeline,
            line_pipeline,
            sprite_pipeline,
            texture_layout,
            sampler,
            white_texture,
            sprite_textures: HashMap::new(),
            player_params,
            shadow_params,
            level_mesh: None,
            egui_renderer,
        }
    }

    pub fn resize(&mut self, gpu: &GpuContext) {
        let (_, depth_view) = create_depth_texture(gpu.device.as_ref(), gpu.config.width, gpu.config.height);
        self.depth_view = depth_view;
    }

    /// Loads a sprite sheet once; missing or broken files fall back to white
    fn ensure_sprite_texture(&mut self, gpu: &GpuContext, path: &str) {
        if self.sprite_textures.contains_key(path) {
            return;
        }
        let bind_group = match image::open(path) {
            Ok(img) => {
                let rgba = img.to_rgba8();
                let (width, height) = rgba.dimensions();
                tracing::info!("Loaded sprite sheet {} ({}x{})", path, width, height);
                create_texture_bind_group(
                    gpu.device.as_ref(),
                    gpu.queue.as_ref(),
                    &self.texture_layout,
                    &self.sampler,
                    path,
                    rgba.as_raw(),
                    width,
                    height,
                )
            }
            Err(e) => {
                tracing::warn!("Could not load sprite sheet {}: {}", path, e);
                self.white_texture.clone()
            }
        };
        self.sprite_textures.insert(path.to_string(), bind_group);
    }

    fn ensure_level_mesh(&mut self, gpu: &GpuContext, index: usize, level: &Level) {
        if matches!(&self.level_mesh, Some((cached, _)) if *cached == index) {
            return;
        }
        let mesh = build_level_mesh(level);
        tracing::debug!("Uploading level {} mesh ({} vertices)", level.name, mesh.vertices.len());
        self.level_mesh = Some((index, mesh.upload(gpu.device.as_ref(), "level_mesh")));
    }

    pub fn render(&mut self, gpu: &GpuContext, game: &Game, ui: UiFrame) -> Result<(), wgpu::SurfaceError> {
        with_ui_textures(self, &ui.textures_delta, |renderer| renderer.draw_frame(gpu, game, &ui))
    }

    fn draw_frame(&mut self, gpu: &GpuContext, game: &Game, ui: &UiFrame) -> Result<(), wgpu::SurfaceError> {
        let frame = match gpu.surface.get_current_texture() {
            Ok(frame) => frame,
            Err(wgpu::SurfaceError::Lost | wgpu::SurfaceError::Outdated) => {
                gpu.reconfigure();
                return Ok(());
            }
            Err(e) => return Err(e),
        };
        let device = gpu.device.as_ref();
        let queue = gpu.queue.as_ref();
        let view = frame.texture.create_view(&wgpu::TextureViewDescriptor::default());

        // Scene geometry for this frame
        let playing = game.state() == GameState::LevelPlaying;
        let mut sprite_mesh = None;
        let mut shadow_mesh = None;
        let mut debug_mesh = None;
        let mut sprite_sheet = None;
        if let (true, Some(level)) = (playing, game.current_level()) {
            self.ensure_level_mesh(gpu, game.current_level_index(), level);
            queue.write_buffer(&self.lighting_buffer, 0, bytemuck::bytes_of(&LightingUniform::from(&level.lighting)));

            if let Some(player) = game.player() {
                let def = player.definition();
                sprite_mesh = build_player_sprite(player, &game.camera).map(|m| m.upload(device, "player_sprite"));
                shadow_mesh = player.shadow_position(level).map(|p| build_shadow(p).upload(device, "player_shadow"));
                if player.draw_debug {
                    let mut mesh = Mesh::new();
                    mesh.add_z_cylinder_wire(&player.cylinder(), DEBUG_CYLINDER_COLOR, 24);
                    debug_mesh = Some(mesh.upload(device, "debug_cylinder"));
                }
                if let Some(path) = &def.sprite_sheet {
                    self.ensure_sprite_texture(gpu, path);
                    sprite_sheet = Some(path.clone());
                }
                queue.write_buffer(
                    &self.player_params.buffer,
                    0,
                    bytemuck::bytes_of(&SpriteParamsUniform::new(def.render_lit)),
                );
            }
        }
        let camera_uniform = CameraUniform { view_proj: game.camera.view_proj().to_cols_array_2d() };
        queue.write_buffer(&self.camera_buffer, 0, bytemuck::bytes_of(&camera_uniform));

        let screen_descriptor = egui_wgpu::ScreenDescriptor {
            size_in_pixels: [gpu.config.width, gpu.config.height],
            pixels_per_point: ui.pixels_per_point,
        };
        let primitives = &ui.primitives;

        let mut encoder = device.create_command_encoder(&wgpu::CommandEncoderDescriptor { label: Some("render_encoder") });

        self.egui_renderer.update_buffers(device, queue, &mut encoder, primitives, &screen_descriptor);

        {
            let mut rp = encoder.begin_render_pass(&wgpu::RenderPassDescriptor {
                label: Some("scene_pass"),
                color_attachments: &[Some(wgpu::RenderPassColorAttachment {
                    view: &view,
                    resolve_target: None,
                    ops: wgpu::Operations {
                        load: wgpu::LoadOp::Clear(if playing { SKY_COLOR } else { MENU_COLOR }),
                        store: wgpu::StoreOp::Store,
                    },
                    depth_slice: None,
                })],
                depth_stencil_attachment: Some(wgpu::RenderPassDepthStencilAttachment {
                    view: &self.depth_view,
                    depth_ops: Some(wgpu::Operations { load: wgpu::LoadOp::Clear(1.0), store: wgpu::StoreOp::Store }),
                    stencil_ops: None,
                }),
                timestamp_writes: None,
                occlusion_query_set: None,
            });

            if playing {
                rp.set_bind_group(0, &self.camera_bind_group, &[]);

                if let Some((_, mesh)) = self.level_mesh.as_ref().filter(|(_, m)| m.index_count > 0) {
                    rp.set_pipeline(&self.level_pipeline);
                    draw_mesh(&mut rp, mesh);
                }

                rp.set_pipeline(&self.sprite_pipeline);
                if let Some(mesh) = &shadow_mesh {
                    rp.set_bind_group(1, &self.white_texture, &[]);
                    rp.set_bind_group(2, &self.shadow_params.bind_group, &[]);
                    draw_mesh(&mut rp, mesh);
                }
                if let Some(mesh) = &sprite_mesh {
                    let texture = sprite_sheet
                        .as_deref()
                        .and_then(|path| self.sprite_textures.get(path))
                        .unwrap_or(&self.white_texture);
                    rp.set_bind_group(1, texture, &[]);
                    rp.set_bind_group(2, &self.player_params.bind_group, &[]);
                    draw_mesh(&mut rp, mesh);
                }

                if let Some(mesh) = &debug_mesh {
                    rp.set_pipeline(&self.line_pipeline);
                    draw_mesh(&mut rp, mesh);
                }
            }
        }

        {
            let egui_pass = encoder.begin_render_pass(&wgpu::RenderPassDescriptor {
                label: Some("egui_render_pass"),
                color_attachments: &[Some(wgpu::RenderPassColorAttachment {
                    view: &view,
                    resolve_target: None,
                    ops: wgpu::Operations { load: wgpu::LoadOp::Load, store: wgpu::StoreOp::Store },
                    depth_slice: None,
                })],
                depth_stencil_attachment: None,
                timestamp_writes: None,
                occlusion_query_set: None,
            });
            self.egui_renderer.render(&mut egui_pass.forget_lifetime(), primitives, &screen_descriptor);
        }


        queue.submit(std::iter::once(encoder.finish()));
        frame.present();
        Ok(())
    }
}

impl UiTextureSink for Renderer {
    fn upload(&mut self, id: egui::TextureId, delta: &egui::epaint::ImageDelta) {
        self.egui_renderer.update_texture(&self.device, &self.queue, id, delta);
    }

    fn free(&mut self, id: egui::TextureId) {
        self.egui_renderer.free_texture(&id);
    }
}

fn draw_mesh(rp: &mut wgpu::RenderPass<'_>, mesh: &MeshBuffer) {
    rp.set_vertex_buffer(0, mesh.vertex_buffer.slice(..));
    rp.set_index_buffer(mesh.index_buffer.slice(..), wgpu::IndexFormat::Uint32);
    rp.draw_indexed(0..mesh.index_count, 0, 0..1);
}

#[allow(clippy::too_many_arguments)]
fn create_texture_bind_group(
    device: &wgpu::Device,
    queue: &wgpu::Queue,
    layout: &wgpu::BindGroupLayout,
    sampler: &wgpu::Sampler,
    label: &str,
    rgba: &[u8],
    width: u32,
    height: u32,
) -> wgpu::BindGroup {
    let extent = wgpu::Extent3d { width, height, depth_or_array_layers: 1 };
    let texture = device.create_texture(&wgpu::TextureDescriptor {
        label: Some(label),
        size: extent,
        mip_level_count: 1,
        sample_count: 1,
        dimension: wgpu::TextureDimension::D2,
        format: wgpu::TextureFormat::Rgba8UnormSrgb,
        usage: wgpu::TextureUsages::TEXTURE_BINDING | wgpu::TextureUsages::COPY_DST,
        view_formats: &[],
    });
    queue.write_texture(
        texture.as_image_copy(),
        rgba,
        wgpu::TexelCopyBufferLayout { offset: 0, bytes_per_row: Some(4 * width), rows_per_image: Some(height) },
        extent,
    );
    let view = texture.create_view(&wgpu::TextureViewDescriptor::default());
    device.create_bind_group(&wgpu::BindGroupDescriptor {
        label: Some(label),
        layout,
        entries: &[
            wgpu::BindGroupEntry { binding: 0, resource: wgpu::BindingResource::TextureView(&view) },
            wgpu::BindGroupEntry { binding: 1, resource: wgpu::BindingResource::Sampler(sampler) },
        ],
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::definitions::{LevelDefinition, LevelItem, PlayerDefinition, SpawnInfo};
    use crate::model::geometry::EulerAngles;
    use std::rc::Rc;

    #[test]
    fn test_uniform_sizes_match_shaders() {
        assert_eq!(std::mem::size_of::<CameraUniform>(), 64);
        assert_eq!(std::mem::size_of::<LightingUniform>(), 32);
        assert_eq!(std::mem::size_of::<SpriteParamsUniform>(), 16);
    }

    #[test]
    fn test_level_mesh_has_blocks_and_goal() {
        let spawn = |item, center| SpawnInfo {
            item,
            center,
            dimensions: Vec3::ONE,
            orientation: EulerAngles::ZERO,
            radius: 1.0,
            color: Rgba8::WHITE,
        };
        let def = LevelDefinition {
            name: "Test".to_string(),
            spawn_infos: vec![
                spawn(LevelItem::Block, Vec3::ZERO),
                spawn(LevelItem::Block, Vec3::X * 4.0),
                spawn(LevelItem::EndGoal, Vec3::X * 8.0),
            ],
        };
        let mesh = build_level_mesh(&Level::from_definition(&def));
        assert_eq!(mesh.indices.len(), 2 * 36 + 32 * 16 * 6);
    }

    #[test]
    fn test_invisible_player_has_no_sprite() {
        let camera = Camera::new(16, 9);
        let hidden = Player::new(Rc::new(PlayerDefinition::default()), Vec3::ZERO, EulerAngles::ZERO);
        assert!(build_player_sprite(&hidden, &camera).is_none());

        let def = PlayerDefinition { visible: true, render_rounded: true, ..Default::default() };
        let shown = Player::new(Rc::new(def), Vec3::ZERO, EulerAngles::ZERO);
        let mesh = build_player_sprite(&shown, &camera).unwrap();
        assert_eq!(mesh.vertices.len(), 6);
    }

    #[derive(Default)]
    struct RecordingSink {
        events: Vec<String>,
    }

    impl UiTextureSink for RecordingSink {
        fn upload(&mut self, id: egui::TextureId, _delta: &egui::epaint::ImageDelta) {
            self.events.push(format!("upload {:?}", id));
        }

        fn free(&mut self, id: egui::TextureId) {
            self.events.push(format!("free {:?}", id));
        }
    }

    fn font_atlas_delta() -> egui::TexturesDelta {
        let image = egui::ColorImage::from_rgba_unmultiplied([1, 1], &[255, 255, 255, 255]);
        let full = egui::epaint::ImageDelta::full(image, egui::TextureOptions::NEAREST);
        egui::TexturesDelta { set: vec![(egui::TextureId::Managed(0), full)], free: vec![egui::TextureId::Managed(7)] }
    }

    #[test]
    fn test_ui_textures_applied_around_drawn_frame() {
        let mut sink = RecordingSink::default();
        let result = with_ui_textures(&mut sink, &font_atlas_delta(), |sink| {
            sink.events.push("draw".to_string());
            Ok::<(), wgpu::SurfaceError>(())
        });
        assert!(result.is_ok());
        assert_eq!(sink.events, vec!["upload Managed(0)", "draw", "free Managed(7)"]);
    }

    #[test]
    fn test_ui_textures_applied_when_frame_is_skipped() {
        let mut sink = RecordingSink::default();
        let result = with_ui_textures(&mut sink, &font_atlas_delta(), |_| Err::<(), _>(wgpu::SurfaceError::Outdated));
        assert!(matches!(result, Err(wgpu::SurfaceError::Outdated)));
        assert_eq!(sink.events, vec!["upload Managed(0)", "free Managed(7)"]);
    }

    #[test]
    fn test_shadow_is_flat_and_translucent() {
        let mesh = build_shadow(Vec3::new(1.0, 2.0, 0.1));
        assert!(mesh.vertices.iter().all(|v| v.pos[2] == 0.1 && v.normal == [0.0, 0.0, 1.0]));
        assert!((mesh.vertices[0].color[3] - 180.0 / 255.0).abs() < 1e-6);
    }
}
