//! Camera model, projection and the rig that ties them to the stage.
//!
//! [`CameraRig`] is the single camera of a stage: a look-at [`Camera`], a
//! perspective [`Projection`] and, in the room scene, an
//! [`OrbitController`]. [`CameraResources`] is its GPU side: the uniform,
//! buffer and bind group shaders read the view-projection from.

pub mod orbit;

use cgmath::{EuclideanSpace, Matrix4, Point3, Rad, Vector3};
use wgpu::util::DeviceExt;
use winit::event::WindowEvent;

pub use orbit::OrbitController;

use crate::{
    config::{OrbitConfig, SceneMode, StageConfig},
    viewport::Viewport,
};

/// cgmath produces OpenGL clip space (z in [-1, 1]); wgpu expects z in [0, 1].
#[rustfmt::skip]
pub const OPENGL_TO_WGPU_MATRIX: Matrix4<f32> = Matrix4::new(
    1.0, 0.0, 0.0, 0.0,
    0.0, 1.0, 0.0, 0.0,
    0.0, 0.0, 0.5, 0.0,
    0.0, 0.0, 0.5, 1.0,
);

/// A camera at `position` looking at `target`.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Camera {
    pub position: Point3<f32>,
    pub target: Point3<f32>,
    pub up: Vector3<f32>,
}

impl Camera {
    pub fn new<P: Into<Point3<f32>>>(position: P, target: P) -> Self {
        Self {
            position: position.into(),
            target: target.into(),
            up: Vector3::unit_y(),
        }
    }

    pub fn calc_matrix(&self) -> Matrix4<f32> {
        Matrix4::look_at_rh(self.position, self.target, self.up)
    }
}

/// Perspective projection; `aspect` always mirrors the last resize.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Projection {
    aspect: f32,
    fovy: Rad<f32>,
    znear: f32,
    zfar: f32,
    dirty: bool,
}

impl Projection {
    pub fn new<F: Into<Rad<f32>>>(width: u32, height: u32, fovy: F, znear: f32, zfar: f32) -> Self {
        Self {
            aspect: width.max(1) as f32 / height.max(1) as f32,
            fovy: fovy.into(),
            znear,
            zfar,
            dirty: true,
        }
    }

    /// Recompute the aspect ratio; a zero-area size is ignored.
    pub fn resize(&mut self, width: u32, height: u32) {
        if width == 0 || height == 0 {
            log::warn!("ignoring projection resize to {}x{}", width, height);
            return;
        }
        let aspect = width as f32 / height as f32;
        if aspect != self.aspect {
            self.aspect = aspect;
            self.dirty = true;
        }
    }

    pub fn aspect(&self) -> f32 {
        self.aspect
    }

    pub fn fovy(&self) -> Rad<f32> {
        self.fovy
    }

    pub fn znear(&self) -> f32 {
        self.znear
    }

    pub fn zfar(&self) -> f32 {
        self.zfar
    }

    pub fn is_dirty(&self) -> bool {
        self.dirty
    }

    /// Clears the dirty flag; call once the new matrix reached the GPU.
    pub fn mark_clean(&mut self) {
        self.dirty = false;
    }

    pub fn calc_matrix(&self) -> Matrix4<f32> {
        OPENGL_TO_WGPU_MATRIX * cgmath::perspective(self.fovy, self.aspect, self.znear, self.zfar)
    }
}

#[repr(C)]
#[derive(Debug, Copy, Clone, bytemuck::Pod, bytemuck::Zeroable)]
pub struct CameraUniform {
    view_position: [f32; 4],
    view_proj: [[f32; 4]; 4],
}

impl CameraUniform {
    pub fn new() -> Self {
        use cgmath::SquareMatrix;
        Self {
            view_position: [0.0; 4],
            view_proj: Matrix4::identity().into(),
        }
    }

    pub fn update_view_proj(&mut self, camera: &Camera, projection: &Projection) {
        self.view_position = camera.position.to_homogeneous().into();
        self.view_proj = (projection.calc_matrix() * camera.calc_matrix()).into();
    }
}

impl Default for CameraUniform {
    fn default() -> Self {
        Self::new()
    }
}

/// The one camera of a stage.
#[derive(Clone, Debug)]
pub struct CameraRig {
    pub camera: Camera,
    pub projection: Projection,
    pub controller: Option<OrbitController>,
}

impl CameraRig {
    /// The cube is seen head-on from `+Z`; the room diagonally from `(d, d, d)`.
    pub fn new(
        mode: SceneMode,
        stage: &StageConfig,
        orbit: &OrbitConfig,
        width: u32,
        height: u32,
    ) -> Self {
        let d = stage.camera_distance;
        let position = match mode {
            SceneMode::Cube => Point3::new(0.0, 0.0, d),
            SceneMode::Room => Point3::new(d, d, d),
        };
        let camera = Camera::new(position, Point3::origin());
        let projection = Projection::new(
            width,
            height,
            cgmath::Deg(stage.field_of_view),
            stage.near_clipping_plane,
            stage.far_clipping_plane,
        );
        let controller = match mode {
            SceneMode::Room if orbit.enabled => Some(OrbitController::new(orbit.clone(), height)),
            _ => None,
        };
        Self {
            camera,
            projection,
            controller,
        }
    }

    /// A rig sized for `viewport`, see [`CameraRig::fit`].
    pub fn for_viewport(
        mode: SceneMode,
        stage: &StageConfig,
        orbit: &OrbitConfig,
        viewport: &Viewport,
    ) -> Self {
        let (width, height) = viewport.surface_size();
        let mut rig = Self::new(mode, stage, orbit, width, height);
        rig.fit(viewport);
        rig
    }

    /// Size the projection and pointer input in pixels of the same unit
    /// as `width` and `height`.
    pub fn resize(&mut self, width: u32, height: u32) {
        self.projection.resize(width, height);
        if let Some(controller) = &mut self.controller {
            controller.set_viewport_height(height);
        }
    }

    /// The projection follows the surface; pointer input, which arrives in
    /// window pixels, is measured against the window's physical height.
    pub fn fit(&mut self, viewport: &Viewport) {
        if viewport.is_empty() {
            return;
        }
        let (width, height) = viewport.surface_size();
        self.projection.resize(width, height);
        if let Some(controller) = &mut self.controller {
            controller.set_viewport_height(viewport.physical_height);
            controller.set_scale_factor(viewport.scale_factor);
        }
    }

    /// Apply pending controller motion. Must run once per frame for damping
    /// to settle; returns whether the camera moved.
    pub fn advance(&mut self) -> bool {
        match &mut self.controller {
            Some(controller) => controller.update(&mut self.camera, self.projection.fovy()),
            None => false,
        }
    }

    pub fn handle_window_event(&mut self, event: &WindowEvent) -> bool {
        match &mut self.controller {
            Some(controller) => controller.handle_window_event(event),
            None => false,
        }
    }

    pub fn view_proj(&self) -> Matrix4<f32> {
        self.projection.calc_matrix() * self.camera.calc_matrix()
    }
}

/// GPU side of the camera.
#[derive(Debug)]
pub struct CameraResources {
    pub uniform: CameraUniform,
    pub buffer: wgpu::Buffer,
    pub bind_group: wgpu::BindGroup,
    pub bind_group_layout: wgpu::BindGroupLayout,
}

impl CameraResources {
    pub fn new(device: &wgpu::Device) -> Self {
        let uniform = CameraUniform::new();
        let buffer = device.create_buffer_init(&wgpu::util::BufferInitDescriptor {
            label: Some("Camera Buffer"),
            contents: bytemuck::cast_slice(&[uniform]),
            usage: wgpu::BufferUsages::UNIFORM | wgpu::BufferUsages::COPY_DST,
        });

        let bind_group_layout = device.create_bind_group_layout(&wgpu::BindGroupLayoutDescriptor {
            entries: &[wgpu::BindGroupLayoutEntry {
                binding: 0,
                visibility: wgpu::ShaderStages::VERTEX | wgpu::ShaderStages::FRAGMENT,
                ty: wgpu::BindingType::Buffer {
                    ty: wgpu::BufferBindingType::Uniform,
                    has_dynamic_offset: false,
                    min_binding_size: None,
                },
                count: None,
            }],
            label: Some("camera_bind_group_layout"),
        });

        let bind_group = device.create_bind_group(&wgpu::BindGroupDescriptor {
            layout: &bind_group_layout,
            entries: &[wgpu::BindGroupEntry {
                binding: 0,
                resource: buffer.as_entire_binding(),
            }],
            label: Some("camera_bind_group"),
        });

        Self {
            uniform,
            buffer,
            bind_group,
            bind_group_layout,
        }
    }

    pub fn write(&mut self, queue: &wgpu::Queue, rig: &CameraRig) {
        self.uniform.update_view_proj(&rig.camera, &rig.projection);
        queue.write_buffer(&self.buffer, 0, bytemuck::cast_slice(&[self.uniform]));
    }
}
