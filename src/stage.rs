//! The stage: one mounted scene with its camera, GPU resources and frame logic.
//!
//! A [`Stage`] is created once per mount. It assembles the scene, sets up the
//! camera rig, uploads geometry and texture maps, and from then on advances
//! and draws one frame per [`Stage::tick`]. [`Stage::teardown`] gives every
//! GPU resource back.

use std::{collections::HashMap, iter, sync::Arc};

use instant::Duration;
use wgpu::util::DeviceExt;
use winit::{dpi::PhysicalSize, event::WindowEvent, window::Window};

use crate::{
    camera::CameraRig,
    config::{SceneMode, StageSettings},
    context::Context,
    data_structures::{
        animation::Spin,
        model::{Material, Mesh},
        scene_graph::{
            self, Geometry, GeometryId, Gizmo, NodeId, NodeKind, Scene, SceneBuilder, Surface,
            SurfaceId,
        },
    },
    pipelines::light::LightUniform,
    render::{Batches, Instanced, Render},
    resources::{mesh, texture::load_material},
    viewport::{ResizeHandler, Viewport},
};

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
enum DrawKind {
    /// Index into the meshes, plus the surface whose material lights it.
    Standard { mesh: usize, surface: usize },
    Flat { mesh: usize },
    Lines { mesh: usize },
}

/// One scene node as the GPU sees it.
#[derive(Debug)]
struct Drawable {
    node: NodeId,
    kind: DrawKind,
    instance_buffer: wgpu::Buffer,
}

/// GPU copies of the scene's meshes, materials and node transforms.
#[derive(Debug, Default)]
pub struct GpuScene {
    meshes: Vec<Mesh>,
    materials: HashMap<usize, Material>,
    drawables: Vec<Drawable>,
}

impl GpuScene {
    /// Upload every mesh and gizmo of `scene` and load the maps of its lit surfaces.
    pub async fn upload(ctx: &Context, scene: &Scene, asset_root: &str) -> anyhow::Result<Self> {
        let mut gpu = GpuScene::default();

        let material_loads = scene
            .surfaces()
            .iter()
            .enumerate()
            .filter_map(|(index, surface)| match surface {
                Surface::Mapped(maps) => Some((index, maps)),
                Surface::Flat { .. } => None,
            })
            .map(|(index, maps)| async move {
                let name = format!("surface {}", index);
                let material = load_material(
                    asset_root,
                    &name,
                    maps,
                    &ctx.device,
                    &ctx.queue,
                    &ctx.sampler,
                    &ctx.material_layout,
                )
                .await?;
                anyhow::Ok((index, material))
            });
        gpu.materials = futures::future::try_join_all(material_loads)
            .await?
            .into_iter()
            .collect();

        // Lit meshes share one upload per geometry; flat ones also bake in their colour.
        let mut uploaded: HashMap<(GeometryId, Option<SurfaceId>), usize> = HashMap::new();
        for (id, node) in scene.nodes() {
            let kind = match &node.kind {
                NodeKind::Mesh { geometry, surface } => {
                    let Geometry::Cuboid {
                        width,
                        height,
                        depth,
                    } = scene.geometry(*geometry);
                    match scene.surface(*surface) {
                        Surface::Mapped(_) => {
                            let mesh = *uploaded.entry((*geometry, None)).or_insert_with(|| {
                                gpu.push_mesh(
                                    mesh::cuboid(*width, *height, *depth)
                                        .upload(&ctx.device, &node.name),
                                )
                            });
                            DrawKind::Standard {
                                mesh,
                                surface: surface.index(),
                            }
                        }
                        Surface::Flat { colour } => {
                            let mesh = *uploaded
                                .entry((*geometry, Some(*surface)))
                                .or_insert_with(|| {
                                    gpu.push_mesh(
                                        mesh::coloured_cuboid(*width, *height, *depth, *colour)
                                            .upload(&ctx.device, &node.name),
                                    )
                                });
                            DrawKind::Flat { mesh }
                        }
                    }
                }
                NodeKind::Gizmo(Gizmo::Axes { size }) => DrawKind::Lines {
                    mesh: gpu.push_mesh(mesh::axes(*size).upload(&ctx.device, &node.name)),
                },
                NodeKind::Gizmo(Gizmo::RectAreaOutline {
                    width,
                    height,
                    colour,
                }) => DrawKind::Lines {
                    mesh: gpu.push_mesh(
                        mesh::rect_outline(*width, *height, *colour)
                            .upload(&ctx.device, &node.name),
                    ),
                },
                NodeKind::Group | NodeKind::Light(_) => continue,
            };

            let instance_buffer = ctx.device.create_buffer_init(&wgpu::util::BufferInitDescriptor {
                label: Some(&format!("{:?} Instance Buffer", node.name)),
                contents: bytemuck::cast_slice(&[scene.world_transform(id).to_raw()]),
                usage: wgpu::BufferUsages::VERTEX | wgpu::BufferUsages::COPY_DST,
            });
            gpu.drawables.push(Drawable {
                node: id,
                kind,
                instance_buffer,
            });
        }

        log::debug!(
            "uploaded {} meshes, {} materials, {} drawables",
            gpu.meshes.len(),
            gpu.materials.len(),
            gpu.drawables.len()
        );
        Ok(gpu)
    }

    fn push_mesh(&mut self, mesh: Mesh) -> usize {
        self.meshes.push(mesh);
        self.meshes.len() - 1
    }

    pub fn mesh_count(&self) -> usize {
        self.meshes.len()
    }

    pub fn material_count(&self) -> usize {
        self.materials.len()
    }

    pub fn drawable_count(&self) -> usize {
        self.drawables.len()
    }

    /// Copy the current world transform of every drawable to its instance buffer.
    pub fn write_transforms(&self, queue: &wgpu::Queue, scene: &Scene) {
        for drawable in &self.drawables {
            let raw = scene.world_transform(drawable.node).to_raw();
            queue.write_buffer(&drawable.instance_buffer, 0, bytemuck::cast_slice(&[raw]));
        }
    }

    pub fn render(&self) -> Render<'_> {
        Render::Composed(
            self.drawables
                .iter()
                .map(|drawable| {
                    let instanced = |mesh: usize, material| Instanced {
                        instance: &drawable.instance_buffer,
                        mesh: &self.meshes[mesh],
                        material,
                        amount: 1,
                    };
                    match drawable.kind {
                        DrawKind::Standard { mesh, surface } => match self.materials.get(&surface) {
                            Some(material) => Render::Standard(instanced(mesh, Some(material))),
                            None => Render::None,
                        },
                        DrawKind::Flat { mesh } => Render::Flat(instanced(mesh, None)),
                        DrawKind::Lines { mesh } => Render::Lines(instanced(mesh, None)),
                    }
                })
                .collect(),
        )
    }

    pub fn destroy(self) {
        self.meshes.iter().for_each(Mesh::destroy);
        self.materials.values().for_each(Material::destroy);
        self.drawables
            .iter()
            .for_each(|drawable| drawable.instance_buffer.destroy());
    }
}

/// A mounted scene.
#[derive(Debug)]
pub struct Stage {
    ctx: Context,
    settings: StageSettings,
    scene: Scene,
    gpu: GpuScene,
    rig: CameraRig,
    spin: Option<(NodeId, Spin)>,
    resize: ResizeHandler,
    camera_written: bool,
}

impl Stage {
    /// Mount on `window`: validate, open the GPU, then build and upload the scene.
    pub async fn mount(window: Arc<Window>, settings: StageSettings) -> anyhow::Result<Self> {
        settings.validate()?;
        let viewport = Viewport::from_physical(
            window.inner_size(),
            window.scale_factor(),
            settings.max_pixel_ratio,
        );
        let ctx = Context::new(window, viewport.surface_size()).await?;
        Self::new(ctx, settings, viewport).await
    }

    /// Build the scene described by `settings` on an existing context.
    pub async fn new(
        mut ctx: Context,
        settings: StageSettings,
        viewport: Viewport,
    ) -> anyhow::Result<Self> {
        settings.validate()?;
        let scene = SceneBuilder::new(&settings).build();

        let resize = ResizeHandler::new(viewport, settings.max_pixel_ratio);
        let viewport = resize.current();
        let rig =
            CameraRig::for_viewport(settings.mode, &settings.stage, &settings.orbit, &viewport);
        if !viewport.is_empty() {
            let (width, height) = viewport.surface_size();
            if (width, height) != ctx.size {
                ctx.resize(width, height);
            }
        }

        let gpu = GpuScene::upload(&ctx, &scene, &settings.asset_root).await?;
        ctx.light.write(&ctx.queue, LightUniform::from_scene(&scene));
        ctx.clear_colour = settings.background;

        let spin = match settings.mode {
            SceneMode::Cube => scene.find(scene_graph::CUBE).map(|id| {
                (
                    id,
                    Spin::new(settings.cube.rotation_speed_x, settings.cube.rotation_speed_y),
                )
            }),
            SceneMode::Room => None,
        };

        log::info!(
            "mounted {} stage at {}x{} (pixel ratio {})",
            settings.mode,
            viewport.width(),
            viewport.height(),
            viewport.pixel_ratio
        );
        Ok(Self {
            ctx,
            settings,
            scene,
            gpu,
            rig,
            spin,
            resize,
            camera_written: false,
        })
    }

    pub fn settings(&self) -> &StageSettings {
        &self.settings
    }

    pub fn scene(&self) -> &Scene {
        &self.scene
    }

    pub fn gpu_scene(&self) -> &GpuScene {
        &self.gpu
    }

    pub fn rig(&self) -> &CameraRig {
        &self.rig
    }

    pub fn spin(&self) -> Option<&Spin> {
        self.spin.as_ref().map(|(_, spin)| spin)
    }

    pub fn context(&self) -> &Context {
        &self.ctx
    }

    pub fn viewport(&self) -> Viewport {
        self.resize.current()
    }

    pub fn window(&self) -> Option<&Arc<Window>> {
        self.ctx.window()
    }

    pub fn request_redraw(&self) {
        if let Some(window) = self.ctx.window() {
            window.request_redraw();
        }
    }

    /// Advance the animation and camera by one frame and push the result to the GPU.
    pub fn update(&mut self) {
        if let Some((id, spin)) = &mut self.spin {
            spin.advance();
            self.scene.set_rotation(*id, spin.rotation());
        }

        let moved = self.rig.advance();
        if moved || self.rig.projection.is_dirty() || !self.camera_written {
            self.ctx.camera.write(&self.ctx.queue, &self.rig);
            self.rig.projection.mark_clean();
            self.camera_written = true;
        }

        if self.spin.is_some() {
            self.gpu.write_transforms(&self.ctx.queue, &self.scene);
        }
    }

    /// One render loop iteration: update, then draw and present a frame.
    pub fn tick(&mut self, dt: Duration) -> Result<(), wgpu::SurfaceError> {
        log::trace!("frame after {:?}", dt);
        self.update();

        let Some(output) = self.ctx.current_frame()? else {
            return Ok(());
        };
        let view = output
            .texture
            .create_view(&wgpu::TextureViewDescriptor::default());
        let encoder = self.record(&view);
        self.ctx.queue.submit(iter::once(encoder.finish()));
        output.present();
        Ok(())
    }

    fn record(&self, view: &wgpu::TextureView) -> wgpu::CommandEncoder {
        let mut encoder = self
            .ctx
            .device
            .create_command_encoder(&wgpu::CommandEncoderDescriptor {
                label: Some("Render Encoder"),
            });
        {
            let mut render_pass = encoder.begin_render_pass(&wgpu::RenderPassDescriptor {
                label: Some("Render Pass"),
                color_attachments: &[Some(wgpu::RenderPassColorAttachment {
                    view,
                    resolve_target: None,
                    ops: wgpu::Operations {
                        load: wgpu::LoadOp::Clear(self.ctx.clear_colour),
                        store: wgpu::StoreOp::Store,
                    },
                    depth_slice: None,
                })],
                depth_stencil_attachment: Some(wgpu::RenderPassDepthStencilAttachment {
                    view: &self.ctx.depth_texture.view,
                    depth_ops: Some(wgpu::Operations {
                        load: wgpu::LoadOp::Clear(1.0),
                        store: wgpu::StoreOp::Store,
                    }),
                    stencil_ops: None,
                }),
                occlusion_query_set: None,
                timestamp_writes: None,
            });

            let mut batches = Batches::default();
            self.gpu.render().set_pipelines(&mut batches);
            batches.draw(&self.ctx, &mut render_pass);
        }
        encoder
    }

    /// Apply a new viewport. Returns false when it was empty or unchanged.
    pub fn resize(&mut self, viewport: Viewport) -> bool {
        match self.resize.apply(viewport) {
            Some(viewport) => {
                self.apply_viewport(viewport);
                true
            }
            None => false,
        }
    }

    /// Same as [`Stage::resize`] for a window's physical size and scale factor.
    pub fn on_physical_resize(&mut self, size: PhysicalSize<u32>, scale_factor: f64) -> bool {
        match self.resize.on_physical_resize(size, scale_factor) {
            Some(viewport) => {
                self.apply_viewport(viewport);
                true
            }
            None => false,
        }
    }

    fn apply_viewport(&mut self, viewport: Viewport) {
        self.rig.fit(&viewport);
        let (width, height) = viewport.surface_size();
        self.ctx.resize(width, height);
    }

    /// Configure the surface again after it was lost or outdated.
    pub fn reconfigure(&mut self) {
        self.ctx.reconfigure();
    }

    /// Forward pointer input to the camera rig.
    pub fn handle_window_event(&mut self, event: &WindowEvent) -> bool {
        self.rig.handle_window_event(event)
    }

    /// Release geometry, instance buffers, texture maps and uniforms.
    pub fn teardown(self) {
        let Self { ctx, gpu, settings, .. } = self;
        gpu.destroy();
        ctx.destroy();
        log::info!("{} stage torn down", settings.mode);
    }

    /// Draw one frame into an offscreen texture and read it back.
    #[cfg(feature = "integration-tests")]
    pub async fn render_offscreen(&mut self) -> anyhow::Result<image::RgbaImage> {
        use anyhow::Context as _;

        self.update();
        let (width, height) = self.ctx.size;
        let extent = wgpu::Extent3d {
            width,
            height,
            depth_or_array_layers: 1,
        };
        let texture = self.ctx.device.create_texture(&wgpu::TextureDescriptor {
            label: Some("Offscreen Output Texture"),
            size: extent,
            mip_level_count: 1,
            sample_count: 1,
            dimension: wgpu::TextureDimension::D2,
            format: self.ctx.format,
            usage: wgpu::TextureUsages::COPY_SRC | wgpu::TextureUsages::RENDER_ATTACHMENT,
            view_formats: &[],
        });
        let view = texture.create_view(&wgpu::TextureViewDescriptor::default());
        let mut encoder = self.record(&view);

        // Buffer rows have to be a multiple of 256 bytes
        let unpadded_bytes_per_row = 4 * width;
        let align = wgpu::COPY_BYTES_PER_ROW_ALIGNMENT;
        let padded_bytes_per_row = unpadded_bytes_per_row.div_ceil(align) * align;
        let output_buffer = self.ctx.device.create_buffer(&wgpu::BufferDescriptor {
            label: Some("Offscreen Output Buffer"),
            size: (padded_bytes_per_row * height) as wgpu::BufferAddress,
            usage: wgpu::BufferUsages::COPY_DST | wgpu::BufferUsages::MAP_READ,
            mapped_at_creation: false,
        });
        encoder.copy_texture_to_buffer(
            wgpu::TexelCopyTextureInfo {
                aspect: wgpu::TextureAspect::All,
                texture: &texture,
                mip_level: 0,
                origin: wgpu::Origin3d::ZERO,
            },
            wgpu::TexelCopyBufferInfo {
                buffer: &output_buffer,
                layout: wgpu::TexelCopyBufferLayout {
                    offset: 0,
                    bytes_per_row: Some(padded_bytes_per_row),
                    rows_per_image: Some(height),
                },
            },
            extent,
        );
        self.ctx.queue.submit(iter::once(encoder.finish()));

        let pixels = {
            let (tx, rx) = futures_intrusive::channel::shared::oneshot_channel();
            let buffer_slice = output_buffer.slice(..);
            buffer_slice.map_async(wgpu::MapMode::Read, move |result| {
                let _ = tx.send(result);
            });
            self.ctx.device.poll(wgpu::PollType::Wait)?;
            rx.receive()
                .await
                .context("buffer mapping was cancelled")??;
            let data = buffer_slice.get_mapped_range();
            data.chunks(padded_bytes_per_row as usize)
                .flat_map(|row| &row[..unpadded_bytes_per_row as usize])
                .copied()
                .collect::<Vec<u8>>()
        };
        output_buffer.unmap();
        output_buffer.destroy();
        texture.destroy();

        image::RgbaImage::from_raw(width, height, pixels)
            .context("readback does not match the texture size")
    }
}
