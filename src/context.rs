//! GPU context: device, queue, pipelines and the shared camera and light
//! resources, plus the window surface when the stage draws to a window.

use std::sync::Arc;

use anyhow::Context as _;
use winit::window::Window;

use crate::{
    camera::CameraResources,
    data_structures::texture::{self, Texture},
    pipelines::{
        Pipelines,
        light::{LightResources, LightUniform},
    },
    resources::texture::material_layout,
};

/// The window surface a mounted stage presents to.
#[derive(Debug)]
pub struct Canvas {
    pub window: Arc<Window>,
    pub surface: wgpu::Surface<'static>,
    pub config: wgpu::SurfaceConfiguration,
}

#[derive(Debug)]
pub struct Context {
    pub(crate) canvas: Option<Canvas>,
    pub(crate) depth_texture: Texture,
    pub device: wgpu::Device,
    pub queue: wgpu::Queue,
    pub format: wgpu::TextureFormat,
    pub size: (u32, u32),
    pub camera: CameraResources,
    pub light: LightResources,
    pub pipelines: Pipelines,
    pub material_layout: wgpu::BindGroupLayout,
    pub sampler: wgpu::Sampler,
    pub clear_colour: wgpu::Color,
}

fn mk_instance() -> wgpu::Instance {
    // BackendBit::PRIMARY => Vulkan + Metal + DX12 + Browser WebGPU
    wgpu::Instance::new(&wgpu::InstanceDescriptor {
        #[cfg(not(target_arch = "wasm32"))]
        backends: wgpu::Backends::PRIMARY,
        #[cfg(target_arch = "wasm32")]
        backends: wgpu::Backends::GL,
        ..Default::default()
    })
}

async fn request_device(adapter: &wgpu::Adapter) -> anyhow::Result<(wgpu::Device, wgpu::Queue)> {
    let device_and_queue = adapter
        .request_device(&wgpu::DeviceDescriptor {
            label: None,
            required_features: wgpu::Features::empty(),
            // WebGL doesn't support all of wgpu's features, so if
            // we're building for the web we'll have to disable some.
            required_limits: if cfg!(target_arch = "wasm32") {
                wgpu::Limits::downlevel_webgl2_defaults()
            } else {
                wgpu::Limits::default()
            },
            memory_hints: Default::default(),
            trace: wgpu::Trace::Off,
        })
        .await
        .context("failed to open a GPU device")?;
    Ok(device_and_queue)
}

impl Context {
    /// Set up the GPU for `window`, sizing its surface to `size` (physical pixels).
    pub async fn new(window: Arc<Window>, size: (u32, u32)) -> anyhow::Result<Self> {
        log::info!("setting up wgpu for a {}x{} surface", size.0, size.1);
        let instance = mk_instance();
        let surface = instance
            .create_surface(window.clone())
            .context("failed to create a surface for the window")?;

        let adapter = instance
            .request_adapter(&wgpu::RequestAdapterOptions {
                power_preference: wgpu::PowerPreference::default(),
                compatible_surface: Some(&surface),
                force_fallback_adapter: false,
            })
            .await
            .context("no GPU adapter can draw to this window")?;
        let (device, queue) = request_device(&adapter).await?;

        let surface_caps = surface.get_capabilities(&adapter);
        // Shaders write linear colour and rely on an sRGB surface for the encoding.
        let format = surface_caps
            .formats
            .iter()
            .copied()
            .find(|f| f.is_srgb())
            .or_else(|| surface_caps.formats.first().copied())
            .context("the surface reports no texture formats")?;
        let config = wgpu::SurfaceConfiguration {
            usage: wgpu::TextureUsages::RENDER_ATTACHMENT,
            format,
            width: size.0.max(1),
            height: size.1.max(1),
            // Frames are paced by vertical sync
            present_mode: wgpu::PresentMode::AutoVsync,
            alpha_mode: surface_caps
                .alpha_modes
                .first()
                .copied()
                .unwrap_or(wgpu::CompositeAlphaMode::Auto),
            view_formats: vec![],
            desired_maximum_frame_latency: 2,
        };
        surface.configure(&device, &config);

        let canvas = Canvas {
            window,
            surface,
            config,
        };
        Ok(Self::with_device(device, queue, format, size, Some(canvas)))
    }

    /// A context without a window, rendering only to textures.
    #[cfg(feature = "integration-tests")]
    pub async fn headless(width: u32, height: u32) -> anyhow::Result<Self> {
        let instance = mk_instance();
        let adapter = instance
            .request_adapter(&wgpu::RequestAdapterOptions {
                power_preference: wgpu::PowerPreference::default(),
                compatible_surface: None,
                force_fallback_adapter: false,
            })
            .await
            .context("no GPU adapter available")?;
        let (device, queue) = request_device(&adapter).await?;
        Ok(Self::with_device(
            device,
            queue,
            wgpu::TextureFormat::Rgba8UnormSrgb,
            (width, height),
            None,
        ))
    }

    fn with_device(
        device: wgpu::Device,
        queue: wgpu::Queue,
        format: wgpu::TextureFormat,
        size: (u32, u32),
        canvas: Option<Canvas>,
    ) -> Self {
        let camera = CameraResources::new(&device);
        let light = LightResources::new(LightUniform::dark(), &device);
        let material_layout = material_layout(&device);
        let pipelines = Pipelines::new(
            &device,
            format,
            &camera.bind_group_layout,
            &light.bind_group_layout,
            &material_layout,
        );
        let depth_texture =
            Texture::create_depth_texture(&device, [size.0, size.1], "depth_texture");
        let sampler = texture::create_default_sampler(&device);

        Self {
            canvas,
            depth_texture,
            device,
            queue,
            format,
            size,
            camera,
            light,
            pipelines,
            material_layout,
            sampler,
            clear_colour: wgpu::Color::BLACK,
        }
    }

    pub fn window(&self) -> Option<&Arc<Window>> {
        self.canvas.as_ref().map(|canvas| &canvas.window)
    }

    /// Resize the drawing targets to `width` x `height` physical pixels.
    pub fn resize(&mut self, width: u32, height: u32) {
        if width == 0 || height == 0 {
            return;
        }
        self.size = (width, height);
        if let Some(canvas) = &mut self.canvas {
            canvas.config.width = width;
            canvas.config.height = height;
            canvas.surface.configure(&self.device, &canvas.config);
        }
        self.depth_texture.texture.destroy();
        self.depth_texture =
            Texture::create_depth_texture(&self.device, [width, height], "depth_texture");
    }

    /// Configure the surface again with the current size, e.g. after it was lost.
    pub fn reconfigure(&mut self) {
        if let Some(canvas) = &self.canvas {
            canvas.surface.configure(&self.device, &canvas.config);
        }
    }

    pub(crate) fn current_frame(&self) -> Result<Option<wgpu::SurfaceTexture>, wgpu::SurfaceError> {
        match &self.canvas {
            Some(canvas) => canvas.surface.get_current_texture().map(Some),
            None => Ok(None),
        }
    }

    /// Release the context's own GPU memory. Everything created from the
    /// device must have been released before.
    pub fn destroy(self) {
        self.depth_texture.texture.destroy();
        self.camera.buffer.destroy();
        self.light.buffer.destroy();
        log::debug!("context released");
    }
}
